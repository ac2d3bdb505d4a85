#![warn(missing_docs)]
//! Client session glue: server events in, mixer and world operations out.

mod collaborators;
mod session;

pub use collaborators::{
    CardSurface, LightController, Notifier, Rgba, StubCards, StubLights, StubNotifier,
};
pub use session::{Capabilities, Session, SPEAKER_REFADE_MS};

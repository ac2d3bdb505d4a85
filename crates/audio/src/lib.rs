//! Audio mixing and spatial-volume engine for resonance.
//!
//! Decides what volume each sound plays at, when, and for how long. Sound
//! sources arrive as parsed server events; this crate owns the channel and
//! sound abstractions, the mixer holding all active channels, the
//! tick-driven fade scheduler and the distance-to-volume attenuation model.
//!
//! # Architecture
//!
//! - [`MediaManager`] - Orchestrates the create/update/destroy protocol
//! - [`Mixer`] - Owns all channels, master volume, and the scheduler tick
//! - [`Channel`] / [`Sound`] - Volume envelope and media lifecycle
//! - [`Fader`] - Time-bounded linear volume interpolation
//! - [`attenuate`] - Linear distance falloff
//!
//! Everything runs on one logical timeline: inbound events mutate state,
//! and a periodic tick advances fades. No internal threading.

mod attenuation;
mod backend;
mod channel;
mod error;
mod fader;
mod media;
mod mixer;
mod sound;

pub use attenuation::{attenuate, try_attenuate};
pub use backend::PlaybackBackend;
pub use channel::Channel;
pub use error::AudioError;
pub use fader::Fader;
pub use media::{CreatedMedia, MediaManager, MediaSpec};
pub use mixer::{Mixer, DEFAULT_DESTROY_FADE_MS};
pub use sound::{Sound, SoundState};

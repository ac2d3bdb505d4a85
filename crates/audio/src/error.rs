//! Error taxonomy for mixer operations.

use resonance_core::ChannelId;
use thiserror::Error;

/// Errors surfaced by the mixing core.
///
/// Missing channels are deliberately absent from this taxonomy: destroy and
/// update operations against an unknown media id are no-ops, since events
/// arrive from an untrusted and possibly stale network source.
#[derive(Debug, Error)]
pub enum AudioError {
    /// A channel id was registered twice. The caller must destroy the old
    /// channel before creating a new one; overwriting silently would orphan
    /// the audio that channel was playing.
    #[error("{0} is already registered with the mixer")]
    DuplicateChannel(ChannelId),

    /// Playback was demanded before the media source reported readiness.
    /// Callers that can wait should queue the start instead.
    #[error("media source {0:?} is not ready for playback")]
    MediaNotReady(String),

    /// Attenuation was requested with a non-positive range. Callers must
    /// branch to the non-attenuated path before consulting the attenuator.
    #[error("attenuation requires a positive max distance, got {0}")]
    InvalidDistanceConfig(f32),
}

//! Distance-to-volume attenuation.

use crate::AudioError;
use resonance_core::clamp_volume;

/// Map listener distance to a volume percentage with linear falloff.
///
/// Returns `round(((max_distance - distance) / max_distance) * 100)`
/// clamped to `[0, 100]`: full volume at the emitter, silence at and beyond
/// the edge of the range. Pure and deterministic.
///
/// Precondition: `max_distance > 0`. Channels without an attenuation range
/// never consult the attenuator; they play at their nominal volume.
pub fn attenuate(max_distance: f32, distance: f32) -> f32 {
    debug_assert!(
        max_distance > 0.0,
        "attenuate called with non-positive max distance {max_distance}"
    );
    clamp_volume((((max_distance - distance) / max_distance) * 100.0).round())
}

/// Checked variant of [`attenuate`] for callers working with unvalidated
/// ranges straight off the network.
pub fn try_attenuate(max_distance: f32, distance: f32) -> Result<f32, AudioError> {
    if max_distance <= 0.0 {
        return Err(AudioError::InvalidDistanceConfig(max_distance));
    }
    Ok(attenuate(max_distance, distance))
}

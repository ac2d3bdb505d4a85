//! World-placed speaker objects.

use chrono::{DateTime, Utc};
use glam::Vec3;
use resonance_audio::attenuate;
use resonance_core::{ChannelId, SpeakerId, SpeakerKind};

/// Offset from a speaker's grid cell to its acoustic center.
pub const SPEAKER_CENTER_OFFSET: f32 = 0.5;

/// A positioned, distance-governed emitter bound to a mixer channel.
///
/// Speakers are immutable once placed: the update path is destruction
/// followed by recreation, mirroring how they enter and leave the
/// listener's range on the server side.
#[derive(Debug, Clone)]
pub struct Speaker {
    id: SpeakerId,
    source: String,
    position: Vec3,
    kind: SpeakerKind,
    max_distance: f32,
    start_instant: Option<DateTime<Utc>>,
    channel: ChannelId,
}

impl Speaker {
    /// Place a speaker at a grid-aligned position.
    ///
    /// The grid position is translated to the continuous-space center of
    /// its cell (offset by half a unit on each axis).
    pub fn new(
        id: SpeakerId,
        source: impl Into<String>,
        grid_position: Vec3,
        kind: SpeakerKind,
        max_distance: f32,
        start_instant: Option<DateTime<Utc>>,
        channel: ChannelId,
    ) -> Self {
        Self {
            id,
            source: source.into(),
            position: grid_position + Vec3::splat(SPEAKER_CENTER_OFFSET),
            kind,
            max_distance,
            start_instant,
            channel,
        }
    }

    /// Speaker id.
    pub fn id(&self) -> &SpeakerId {
        &self.id
    }

    /// Media source this speaker plays.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Acoustic center in continuous space.
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Playback behavior.
    pub fn kind(&self) -> SpeakerKind {
        self.kind
    }

    /// Audible range.
    pub fn max_distance(&self) -> f32 {
        self.max_distance
    }

    /// Server playback start instant, for pickup.
    pub fn start_instant(&self) -> Option<DateTime<Utc>> {
        self.start_instant
    }

    /// The mixer channel bound to this speaker.
    pub fn channel(&self) -> ChannelId {
        self.channel
    }

    /// Distance from the listener to the speaker center.
    pub fn distance_to(&self, listener: Vec3) -> f32 {
        self.position.distance(listener)
    }

    /// Volume percentage audible from the given listener position.
    pub fn volume_at(&self, listener: Vec3) -> f32 {
        let distance = self.distance_to(listener);
        if self.max_distance <= 0.0 {
            return 0.0;
        }
        match self.kind {
            SpeakerKind::Speaker2D => {
                if distance <= self.max_distance {
                    100.0
                } else {
                    0.0
                }
            }
            SpeakerKind::Speaker3D => attenuate(self.max_distance, distance),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn speaker(kind: SpeakerKind) -> Speaker {
        Speaker::new(
            SpeakerId::new("s-1"),
            "sounds/radio.ogg",
            Vec3::new(10.0, 5.0, 3.0),
            kind,
            10.0,
            None,
            ChannelId(1),
        )
    }

    #[test]
    fn grid_position_is_centered() {
        let s = speaker(SpeakerKind::Speaker3D);
        assert_eq!(s.position(), Vec3::new(10.5, 5.5, 3.5));
    }

    #[test]
    fn volume_rolls_off_for_3d_speakers() {
        let s = speaker(SpeakerKind::Speaker3D);
        assert_eq!(s.volume_at(s.position()), 100.0);

        let half_range = s.position() + Vec3::new(5.0, 0.0, 0.0);
        assert_eq!(s.volume_at(half_range), 50.0);

        let beyond = s.position() + Vec3::new(25.0, 0.0, 0.0);
        assert_eq!(s.volume_at(beyond), 0.0);
    }

    #[test]
    fn volume_is_flat_for_2d_speakers() {
        let s = speaker(SpeakerKind::Speaker2D);
        assert_eq!(s.volume_at(s.position()), 100.0);

        let near_edge = s.position() + Vec3::new(9.5, 0.0, 0.0);
        assert_eq!(s.volume_at(near_edge), 100.0);

        let beyond = s.position() + Vec3::new(10.5, 0.0, 0.0);
        assert_eq!(s.volume_at(beyond), 0.0);
    }
}

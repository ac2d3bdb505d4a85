#![warn(missing_docs)]
//! World-space state for spatial audio: listener pose and placed speakers.

mod listener;
mod speaker;

use glam::Vec3;
use resonance_core::{ChannelId, SpeakerId};
use std::collections::HashMap;
use tracing::{debug, warn};

pub use listener::Listener;
pub use resonance_core::SpeakerKind;
pub use speaker::{Speaker, SPEAKER_CENTER_OFFSET};

/// Tracks the listener and the set of active speakers.
///
/// Speakers enter this set when the server reports them in range and leave
/// it when they fall out of range. The world space never touches channels
/// directly; it resolves (channel, volume) pairs and the caller applies
/// them through the mixer.
#[derive(Debug, Default)]
pub struct WorldSpace {
    listener: Listener,
    speakers: HashMap<SpeakerId, Speaker>,
}

impl WorldSpace {
    /// An empty world with the listener at the origin.
    pub fn new() -> Self {
        Self {
            listener: Listener::new(),
            speakers: HashMap::new(),
        }
    }

    /// Current listener pose.
    pub fn listener(&self) -> &Listener {
        &self.listener
    }

    /// Update the listener pose from a location event.
    pub fn update_listener(&mut self, position: Vec3, pitch: f32, yaw: f32) {
        self.listener.update(position, pitch, yaw);
    }

    /// Register a speaker, returning a displaced speaker with the same id.
    ///
    /// Speakers are not updated in place; a recreation under a live id
    /// hands the stale entry back so its channel can be released.
    pub fn add_speaker(&mut self, speaker: Speaker) -> Option<Speaker> {
        let id = speaker.id().clone();
        let previous = self.speakers.insert(id.clone(), speaker);
        if previous.is_some() {
            warn!("speaker {id} recreated while still registered");
        }
        previous
    }

    /// Remove a speaker. Unknown ids are a no-op, keeping removal
    /// idempotent under out-of-order delivery.
    pub fn remove_speaker(&mut self, id: &SpeakerId) -> Option<Speaker> {
        let removed = self.speakers.remove(id);
        if removed.is_none() {
            debug!("remove for unknown speaker {id}; ignoring");
        }
        removed
    }

    /// Look up a speaker by id.
    pub fn speaker(&self, id: &SpeakerId) -> Option<&Speaker> {
        self.speakers.get(id)
    }

    /// All registered speakers, in no particular order.
    pub fn speakers(&self) -> impl Iterator<Item = &Speaker> {
        self.speakers.values()
    }

    /// Number of registered speakers.
    pub fn len(&self) -> usize {
        self.speakers.len()
    }

    /// Whether no speakers are registered.
    pub fn is_empty(&self) -> bool {
        self.speakers.is_empty()
    }

    /// Resolve the target volume of every speaker channel for the current
    /// listener position.
    pub fn attenuation_updates(&self) -> Vec<(ChannelId, f32)> {
        let listener = self.listener.position();
        self.speakers
            .values()
            .map(|speaker| (speaker.channel(), speaker.volume_at(listener)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn speaker(id: &str, grid: Vec3, channel: u64) -> Speaker {
        Speaker::new(
            SpeakerId::new(id),
            "sounds/radio.ogg",
            grid,
            SpeakerKind::Speaker3D,
            20.0,
            None,
            ChannelId(channel),
        )
    }

    #[test]
    fn recreation_hands_back_the_stale_speaker() {
        let mut world = WorldSpace::new();
        assert!(world.add_speaker(speaker("s", Vec3::ZERO, 1)).is_none());
        let stale = world.add_speaker(speaker("s", Vec3::ONE, 2)).unwrap();
        assert_eq!(stale.channel(), ChannelId(1));
        assert_eq!(world.len(), 1);
    }

    #[test]
    fn removal_is_idempotent() {
        let mut world = WorldSpace::new();
        world.add_speaker(speaker("s", Vec3::ZERO, 1));
        assert!(world.remove_speaker(&SpeakerId::new("s")).is_some());
        assert!(world.remove_speaker(&SpeakerId::new("s")).is_none());
    }

    #[test]
    fn attenuation_updates_track_the_listener() {
        let mut world = WorldSpace::new();
        // Center lands at (0.5, 0.5, 0.5).
        world.add_speaker(speaker("s", Vec3::ZERO, 7));

        world.update_listener(Vec3::new(10.5, 0.5, 0.5), 0.0, 0.0);
        let updates = world.attenuation_updates();
        assert_eq!(updates, vec![(ChannelId(7), 50.0)]);

        world.update_listener(Vec3::new(30.5, 0.5, 0.5), 0.0, 0.0);
        let updates = world.attenuation_updates();
        assert_eq!(updates, vec![(ChannelId(7), 0.0)]);
    }
}

//! The mixer owns every active channel and drives the fade scheduler.

use crate::{AudioError, Channel};
use resonance_core::{clamp_volume, ChannelId, MediaId, MAX_VOLUME};
use std::collections::HashMap;
use tracing::{debug, trace};

/// Fade-out applied when a destroy event carries no fade time of its own.
pub const DEFAULT_DESTROY_FADE_MS: u64 = 500;

/// A volume operation postponed to the next scheduler tick.
///
/// The creation protocol defers the first volume apply of global channels
/// by one tick so master-volume application lands deterministically after
/// channel registration.
#[derive(Debug, Clone, Copy)]
struct DeferredVolume {
    channel: ChannelId,
    volume: f32,
    fade_ms: u64,
}

/// Owner of all active channels.
///
/// Channels are registered under a unique [`ChannelId`] and additionally
/// indexed by their (non-unique) media id for destroy/update fan-out. All
/// external interaction goes through id lookup here; no other component
/// holds a long-lived mutable reference to a channel.
#[derive(Debug)]
pub struct Mixer {
    channels: HashMap<ChannelId, Channel>,
    /// Insertion order for snapshot iteration. Callers must not rely on
    /// the order for correctness.
    order: Vec<ChannelId>,
    by_media: HashMap<MediaId, Vec<ChannelId>>,
    master_volume: f32,
    next_id: u64,
    deferred: Vec<DeferredVolume>,
}

impl Default for Mixer {
    fn default() -> Self {
        Self::new()
    }
}

impl Mixer {
    /// Create an empty mixer at full master volume.
    pub fn new() -> Self {
        Self {
            channels: HashMap::new(),
            order: Vec::new(),
            by_media: HashMap::new(),
            master_volume: MAX_VOLUME,
            next_id: 0,
            deferred: Vec::new(),
        }
    }

    /// Mint a fresh, never-reused channel id.
    pub fn mint_id(&mut self) -> ChannelId {
        self.next_id += 1;
        ChannelId(self.next_id)
    }

    /// Register a channel.
    ///
    /// A duplicate id is a logic error: the caller must destroy the old
    /// channel first, never overwrite, or the audio it was playing would be
    /// orphaned.
    pub fn add_channel(&mut self, channel: Channel) -> Result<(), AudioError> {
        let id = channel.id();
        if self.channels.contains_key(&id) {
            return Err(AudioError::DuplicateChannel(id));
        }
        self.by_media
            .entry(channel.media().clone())
            .or_default()
            .push(id);
        self.order.push(id);
        self.channels.insert(id, channel);
        trace!("registered {id}");
        Ok(())
    }

    /// Number of registered channels.
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// Whether no channels are registered.
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Look up a channel by id.
    pub fn channel(&self, id: ChannelId) -> Option<&Channel> {
        self.channels.get(&id)
    }

    /// Mutable lookup by id.
    pub fn channel_mut(&mut self, id: ChannelId) -> Option<&mut Channel> {
        self.channels.get_mut(&id)
    }

    /// Read-only snapshot of all channels, in insertion order.
    pub fn channels(&self) -> impl Iterator<Item = &Channel> {
        self.order.iter().filter_map(|id| self.channels.get(id))
    }

    /// Ids of every channel carrying the given media id, oldest first.
    pub fn channels_for_media(&self, media: &MediaId) -> Vec<ChannelId> {
        self.by_media.get(media).cloned().unwrap_or_default()
    }

    /// Current master volume in `[0, 100]`.
    pub fn master_volume(&self) -> f32 {
        self.master_volume
    }

    /// Store the master volume and propagate it to every channel.
    ///
    /// This is the only path by which a global volume change reaches the
    /// channels; each registered channel is visited exactly once per call.
    /// Idempotent.
    pub fn set_master_volume(&mut self, volume: f32) {
        self.master_volume = clamp_volume(volume);
        debug!("master volume set to {}", self.master_volume);
        let master = self.master_volume;
        for channel in self.channels.values_mut() {
            channel.update_from_master_volume(master);
        }
    }

    /// Reconciliation pass after structural changes: newly added channels
    /// pick up the current master volume.
    pub fn update_current(&mut self) {
        let master = self.master_volume;
        for channel in self.channels.values_mut() {
            channel.update_from_master_volume(master);
        }
    }

    /// Postpone a volume set or fade to the start of the next tick.
    pub fn defer_volume(&mut self, channel: ChannelId, volume: f32, fade_ms: u64) {
        self.deferred.push(DeferredVolume {
            channel,
            volume,
            fade_ms,
        });
    }

    /// Destroy channel(s) for a media id with the default fade-out.
    ///
    /// See [`Mixer::destroy_sounds_fading`].
    pub fn destroy_sounds(&mut self, media: &MediaId, destroy_all: bool, silent: bool) -> usize {
        self.destroy_sounds_fading(media, destroy_all, silent, DEFAULT_DESTROY_FADE_MS)
    }

    /// Destroy channel(s) for a media id.
    ///
    /// `destroy_all` removes every matching channel; otherwise only the most
    /// recently registered match goes. `silent` removes immediately with no
    /// audible fade-out, which is the supersede path: replacing a media
    /// instance under the same id must not double up audio during the
    /// transition. Non-silent destruction arms a fade-out and the channel is
    /// reaped once it completes.
    ///
    /// An unknown media id is a no-op, keeping destroys idempotent under
    /// out-of-order network delivery. Returns the number of channels
    /// removed or retired.
    pub fn destroy_sounds_fading(
        &mut self,
        media: &MediaId,
        destroy_all: bool,
        silent: bool,
        fade_ms: u64,
    ) -> usize {
        let mut ids = self.channels_for_media(media);
        if ids.is_empty() {
            debug!("destroy for unknown media {media}; ignoring");
            return 0;
        }
        if !destroy_all {
            // Most recent registration wins; ids are kept oldest-first.
            ids = ids.split_off(ids.len() - 1);
        }

        let count = ids.len();
        for id in ids {
            if silent {
                self.remove_channel(id);
            } else if let Some(channel) = self.channels.get_mut(&id) {
                channel.begin_retire(fade_ms);
            }
        }
        count
    }

    /// Unregister a channel and drop it (and thus all its sounds).
    pub fn remove_channel(&mut self, id: ChannelId) -> Option<Channel> {
        let channel = self.channels.remove(&id)?;
        self.order.retain(|other| *other != id);
        if let Some(ids) = self.by_media.get_mut(channel.media()) {
            ids.retain(|other| *other != id);
            if ids.is_empty() {
                self.by_media.remove(channel.media());
            }
        }
        trace!("removed {id}");
        Some(channel)
    }

    /// Advance the scheduler by one tick.
    ///
    /// Applies deferred volume operations, advances every active fade, and
    /// reaps channels whose retirement fade has completed. Returns the ids
    /// of the channels removed this tick so playback backends can release
    /// their sinks.
    pub fn tick(&mut self, delta_ms: u64) -> Vec<ChannelId> {
        let master = self.master_volume;

        for op in std::mem::take(&mut self.deferred) {
            if let Some(channel) = self.channels.get_mut(&op.channel) {
                channel.update_from_master_volume(master);
                channel.fade_to(op.volume, op.fade_ms);
            }
        }

        for id in self.order.clone() {
            if let Some(channel) = self.channels.get_mut(&id) {
                channel.tick(delta_ms, master);
            }
        }

        let retired: Vec<ChannelId> = self
            .order
            .iter()
            .copied()
            .filter(|id| {
                self.channels
                    .get(id)
                    .map(|ch| ch.is_retired())
                    .unwrap_or(false)
            })
            .collect();
        for id in &retired {
            self.remove_channel(*id);
        }
        retired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spawn(mixer: &mut Mixer, media: &str) -> ChannelId {
        let id = mixer.mint_id();
        let channel = Channel::new(id, MediaId::from(media));
        mixer.add_channel(channel).expect("fresh id");
        id
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut mixer = Mixer::new();
        let id = mixer.mint_id();
        mixer
            .add_channel(Channel::new(id, MediaId::from("a")))
            .unwrap();
        let err = mixer
            .add_channel(Channel::new(id, MediaId::from("b")))
            .unwrap_err();
        assert!(matches!(err, AudioError::DuplicateChannel(dup) if dup == id));
        // The original channel survived the rejected insert.
        assert_eq!(mixer.channel(id).unwrap().media().as_str(), "a");
    }

    #[test]
    fn master_volume_reaches_every_channel_once() {
        let mut mixer = Mixer::new();
        let a = spawn(&mut mixer, "a");
        let b = spawn(&mut mixer, "b");
        mixer.channel_mut(a).unwrap().set_volume(80.0);
        mixer.channel_mut(b).unwrap().set_volume(40.0);

        mixer.set_master_volume(50.0);
        assert_eq!(mixer.channel(a).unwrap().output_volume(), 40.0);
        assert_eq!(mixer.channel(b).unwrap().output_volume(), 20.0);

        // Idempotent.
        mixer.set_master_volume(50.0);
        assert_eq!(mixer.channel(a).unwrap().output_volume(), 40.0);
    }

    #[test]
    fn destroy_unknown_media_is_a_noop() {
        let mut mixer = Mixer::new();
        assert_eq!(mixer.destroy_sounds(&MediaId::from("ghost"), true, false), 0);
    }

    #[test]
    fn silent_destroy_removes_immediately() {
        let mut mixer = Mixer::new();
        let id = spawn(&mut mixer, "music");
        assert_eq!(mixer.destroy_sounds(&MediaId::from("music"), false, true), 1);
        assert!(mixer.channel(id).is_none());
        assert!(mixer.is_empty());
    }

    #[test]
    fn audible_destroy_fades_then_reaps() {
        let mut mixer = Mixer::new();
        let id = spawn(&mut mixer, "music");
        mixer.channel_mut(id).unwrap().set_volume(100.0);

        mixer.destroy_sounds_fading(&MediaId::from("music"), false, false, 400);
        assert!(mixer.channel(id).is_some());

        // Mid-fade the channel is still audible.
        mixer.tick(200);
        let ch = mixer.channel(id).unwrap();
        assert!(ch.volume() > 0.0 && ch.volume() < 100.0);

        // Fade completes; the channel is reaped on that tick.
        let removed = mixer.tick(200);
        assert_eq!(removed, vec![id]);
        assert!(mixer.channel(id).is_none());
    }

    #[test]
    fn destroy_most_recent_match_only() {
        let mut mixer = Mixer::new();
        let older = spawn(&mut mixer, "shared");
        let newer = spawn(&mut mixer, "shared");

        assert_eq!(mixer.destroy_sounds(&MediaId::from("shared"), false, true), 1);
        assert!(mixer.channel(older).is_some());
        assert!(mixer.channel(newer).is_none());
    }

    #[test]
    fn destroy_all_matches() {
        let mut mixer = Mixer::new();
        spawn(&mut mixer, "shared");
        spawn(&mut mixer, "shared");
        spawn(&mut mixer, "other");

        assert_eq!(mixer.destroy_sounds(&MediaId::from("shared"), true, true), 2);
        assert_eq!(mixer.len(), 1);
    }

    #[test]
    fn deferred_volume_lands_on_next_tick() {
        let mut mixer = Mixer::new();
        mixer.set_master_volume(50.0);
        let id = spawn(&mut mixer, "music");

        mixer.defer_volume(id, 80.0, 0);
        assert_eq!(mixer.channel(id).unwrap().volume(), 0.0);

        mixer.tick(16);
        let ch = mixer.channel(id).unwrap();
        assert_eq!(ch.volume(), 80.0);
        assert_eq!(ch.output_volume(), 40.0);
    }

    #[test]
    fn snapshot_iteration_is_insertion_ordered() {
        let mut mixer = Mixer::new();
        spawn(&mut mixer, "first");
        spawn(&mut mixer, "second");
        spawn(&mut mixer, "third");

        let order: Vec<&str> = mixer.channels().map(|c| c.media().as_str()).collect();
        assert_eq!(order, vec!["first", "second", "third"]);
    }

    #[test]
    fn update_current_applies_master_to_new_channels() {
        let mut mixer = Mixer::new();
        mixer.set_master_volume(25.0);
        let id = spawn(&mut mixer, "late");
        mixer.channel_mut(id).unwrap().set_volume(100.0);

        mixer.update_current();
        assert_eq!(mixer.channel(id).unwrap().output_volume(), 25.0);
    }
}

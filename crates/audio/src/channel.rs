//! A named group of sounds sharing one volume envelope.

use crate::{Fader, Sound};
use chrono::{DateTime, Utc};
use resonance_core::{clamp_volume, ChannelId, ChannelKind, MediaId};
use tracing::trace;

/// A channel groups one or more sounds behind a single effective volume.
///
/// The nominal volume is always the output of either a direct set or an
/// in-progress fade, never both: a direct set cancels any armed fade. The
/// audible output volume is the nominal volume scaled by the mixer's master
/// volume.
#[derive(Debug, Clone)]
pub struct Channel {
    id: ChannelId,
    media: MediaId,
    kind: ChannelKind,
    flag: Option<String>,
    volume: f32,
    output_volume: f32,
    max_distance: Option<f32>,
    trackable: bool,
    retiring: bool,
    sounds: Vec<Sound>,
    fader: Fader,
}

impl Channel {
    /// Create a silent global channel for the given media id.
    pub fn new(id: ChannelId, media: MediaId) -> Self {
        Self {
            id,
            media,
            kind: ChannelKind::Global,
            flag: None,
            volume: 0.0,
            output_volume: 0.0,
            max_distance: None,
            trackable: false,
            retiring: false,
            sounds: Vec::new(),
            fader: Fader::new(),
        }
    }

    /// Stable channel handle.
    pub fn id(&self) -> ChannelId {
        self.id
    }

    /// Media id this channel was created for.
    pub fn media(&self) -> &MediaId {
        &self.media
    }

    /// Whether this channel answers lookups for `media`.
    pub fn matches(&self, media: &MediaId) -> bool {
        &self.media == media
    }

    /// Channel classification (global vs distance-governed).
    pub fn kind(&self) -> ChannelKind {
        self.kind
    }

    /// Reclassify the channel. The creation protocol refines this
    /// progressively; the last assignment before commit wins.
    pub fn set_kind(&mut self, kind: ChannelKind) {
        self.kind = kind;
    }

    /// Caller-supplied free-form flag, if any.
    pub fn flag(&self) -> Option<&str> {
        self.flag.as_deref()
    }

    /// Overwrite the free-form flag. Last assignment wins.
    pub fn set_flag(&mut self, flag: Option<String>) {
        self.flag = flag;
    }

    /// Whether the flag equals `candidate`.
    pub fn has_flag(&self, candidate: &str) -> bool {
        self.flag.as_deref() == Some(candidate)
    }

    /// Whether external systems may reference this channel by media id.
    pub fn is_trackable(&self) -> bool {
        self.trackable
    }

    /// Mark the channel as externally trackable.
    pub fn set_trackable(&mut self, trackable: bool) {
        self.trackable = trackable;
    }

    /// Attenuation range; `None` means the channel plays globally.
    pub fn max_distance(&self) -> Option<f32> {
        self.max_distance
    }

    /// Set or clear the attenuation range. Non-positive ranges disable
    /// attenuation rather than feeding the attenuator an invalid config.
    pub fn set_max_distance(&mut self, max_distance: Option<f32>) {
        self.max_distance = max_distance.filter(|d| *d > 0.0);
    }

    /// Nominal volume in `[0, 100]`, before master scaling.
    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Audible volume after master scaling.
    pub fn output_volume(&self) -> f32 {
        self.output_volume
    }

    /// Append a sound. The sound immediately shares the channel's current
    /// volume envelope.
    pub fn add_sound(&mut self, sound: Sound) {
        self.sounds.push(sound);
    }

    /// The channel's sounds, in insertion order.
    pub fn sounds(&self) -> &[Sound] {
        &self.sounds
    }

    /// Whether the channel currently owns no sounds. Operations on an empty
    /// channel are legal no-ops except destruction.
    pub fn is_empty(&self) -> bool {
        self.sounds.is_empty()
    }

    /// Set the nominal volume directly, cancelling any in-progress fade.
    pub fn set_volume(&mut self, volume: f32) {
        self.fader.cancel();
        self.volume = clamp_volume(volume);
    }

    /// Fade the nominal volume from its current value toward `target`.
    ///
    /// A zero duration collapses into a direct set with no intermediate
    /// frames. A new fade replaces any fade already in flight, starting
    /// from the current effective volume so the transition stays smooth.
    pub fn fade_to(&mut self, target: f32, duration_ms: u64) {
        let target = clamp_volume(target);
        if duration_ms == 0 {
            self.set_volume(target);
            return;
        }
        trace!("{} fading {} -> {target} over {duration_ms}ms", self.id, self.volume);
        self.fader.begin(self.volume, target, duration_ms);
    }

    /// Whether a fade is currently in flight.
    pub fn is_fading(&self) -> bool {
        self.fader.is_active()
    }

    /// Recompute the output volume from the mixer's master volume.
    /// Idempotent; must be invoked whenever either factor changes.
    pub fn update_from_master_volume(&mut self, master_volume: f32) {
        self.output_volume = self.volume * clamp_volume(master_volume) / 100.0;
    }

    /// Begin fading out toward removal. The mixer reaps the channel once
    /// the fade completes. A zero fade time retires immediately.
    pub fn begin_retire(&mut self, fade_ms: u64) {
        self.retiring = true;
        self.fade_to(0.0, fade_ms);
    }

    /// Whether the channel is fading out toward removal.
    pub fn is_retiring(&self) -> bool {
        self.retiring
    }

    /// Whether the retirement fade has run its course.
    pub fn is_retired(&self) -> bool {
        self.retiring && !self.fader.is_active()
    }

    /// Forward the readiness signal to every sound, in insertion order.
    ///
    /// Returns the playback offsets of sounds that began playing.
    pub fn mark_ready(&mut self, now: DateTime<Utc>) -> Vec<u64> {
        self.sounds
            .iter_mut()
            .filter_map(|sound| sound.mark_ready(now))
            .collect()
    }

    /// Advance the fade by one scheduler tick and refresh the output
    /// volume against the given master volume.
    pub fn tick(&mut self, delta_ms: u64, master_volume: f32) {
        if let Some(volume) = self.fader.tick(delta_ms) {
            self.volume = clamp_volume(volume);
        }
        self.update_from_master_volume(master_volume);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel() -> Channel {
        Channel::new(ChannelId(1), MediaId::from("media-1"))
    }

    #[test]
    fn direct_set_cancels_fade() {
        let mut ch = channel();
        ch.fade_to(100.0, 1000);
        assert!(ch.is_fading());

        ch.set_volume(40.0);
        assert!(!ch.is_fading());
        assert_eq!(ch.volume(), 40.0);

        // The cancelled fade must not keep moving the volume.
        ch.tick(500, 100.0);
        assert_eq!(ch.volume(), 40.0);
    }

    #[test]
    fn zero_duration_fade_is_immediate() {
        let mut ch = channel();
        ch.fade_to(80.0, 0);
        assert!(!ch.is_fading());
        assert_eq!(ch.volume(), 80.0);
    }

    #[test]
    fn fade_advances_with_ticks() {
        let mut ch = channel();
        ch.fade_to(50.0, 500);
        ch.tick(250, 100.0);
        assert_eq!(ch.volume(), 25.0);
        ch.tick(250, 100.0);
        assert_eq!(ch.volume(), 50.0);
        ch.tick(250, 100.0);
        assert_eq!(ch.volume(), 50.0);
    }

    #[test]
    fn master_volume_scales_output() {
        let mut ch = channel();
        ch.set_volume(80.0);
        ch.update_from_master_volume(50.0);
        assert_eq!(ch.output_volume(), 40.0);

        // Idempotent: reapplying the same master changes nothing.
        ch.update_from_master_volume(50.0);
        assert_eq!(ch.output_volume(), 40.0);
    }

    #[test]
    fn refade_starts_from_current_volume() {
        let mut ch = channel();
        ch.fade_to(100.0, 1000);
        ch.tick(500, 100.0);
        assert_eq!(ch.volume(), 50.0);

        // Superseding fade starts at 50, not at 0 or 100.
        ch.fade_to(0.0, 500);
        ch.tick(250, 100.0);
        assert_eq!(ch.volume(), 25.0);
    }

    #[test]
    fn retirement_completes_after_fade() {
        let mut ch = channel();
        ch.set_volume(60.0);
        ch.begin_retire(300);
        assert!(ch.is_retiring());
        assert!(!ch.is_retired());

        ch.tick(300, 100.0);
        assert!(ch.is_retired());
        assert_eq!(ch.volume(), 0.0);
    }

    #[test]
    fn non_positive_max_distance_disables_attenuation() {
        let mut ch = channel();
        ch.set_max_distance(Some(0.0));
        assert_eq!(ch.max_distance(), None);
        ch.set_max_distance(Some(25.0));
        assert_eq!(ch.max_distance(), Some(25.0));
    }

    #[test]
    fn matches_compares_media_ids() {
        let ch = channel();
        assert!(ch.matches(&MediaId::from("media-1")));
        assert!(!ch.matches(&MediaId::from("media-2")));
    }

    #[test]
    fn volume_operations_on_an_empty_channel_are_noops() {
        let mut ch = channel();
        assert!(ch.is_empty());
        ch.fade_to(50.0, 100);
        ch.tick(100, 100.0);
        assert_eq!(ch.volume(), 50.0);

        ch.add_sound(Sound::new("late.ogg"));
        assert!(!ch.is_empty());
        // The late sound shares the channel's current volume envelope.
        assert_eq!(ch.output_volume(), 50.0);
    }

    #[test]
    fn flag_last_assignment_wins() {
        let mut ch = channel();
        ch.set_flag(Some("ambient".into()));
        ch.set_flag(Some("boss-fight".into()));
        assert!(ch.has_flag("boss-fight"));
        assert!(!ch.has_flag("ambient"));
    }
}

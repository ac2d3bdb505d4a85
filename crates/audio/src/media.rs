//! Media orchestration: the create/update/destroy protocol over the mixer.

use crate::{attenuate, AudioError, Channel, Mixer, PlaybackBackend, Sound, DEFAULT_DESTROY_FADE_MS};
use chrono::{DateTime, Utc};
use resonance_core::{ChannelId, ChannelKind, MediaId, MAX_VOLUME};
use tracing::{debug, warn};

/// Parameters of a create-media request, already parsed off the wire.
#[derive(Debug, Clone)]
pub struct MediaSpec {
    /// Server-assigned media id; supersedes any channel already playing it.
    pub media: MediaId,
    /// Media source (URL or stream identifier).
    pub source: String,
    /// Loop playback.
    pub looping: bool,
    /// Server-side playback start instant, for late-join pickup.
    pub start_instant: Option<DateTime<Utc>>,
    /// Resume at the server's elapsed offset instead of the beginning.
    pub do_pickup: bool,
    /// Fade time toward the initial volume.
    pub fade_time_ms: u64,
    /// Explicit volume. `None` *and* `Some(0.0)` both select the default of
    /// 100: older servers send zero when no volume was configured.
    pub volume: Option<f32>,
    /// Caller-supplied free-form flag, applied last.
    pub flag: Option<String>,
    /// Attenuation range; `None` or non-positive means a global channel.
    pub max_distance: Option<f32>,
}

/// Outcome of a create-media request.
#[derive(Debug)]
pub struct CreatedMedia {
    /// The channel now carrying the media.
    pub channel: ChannelId,
    /// Source load failure, if any. The channel exists but stays silent;
    /// the caller decides how to surface the failure to the user.
    pub load_error: Option<String>,
}

/// Owner of the mixer and the playback backend.
///
/// All inbound media events funnel through here; this is the only place
/// that composes mixer, attenuation and backend into the full creation
/// protocol.
pub struct MediaManager {
    mixer: Mixer,
    backend: Option<PlaybackBackend>,
}

impl MediaManager {
    /// Create a manager with a live playback backend, falling back to
    /// silent operation when the output device is unavailable.
    pub fn new() -> Self {
        let backend = match PlaybackBackend::new() {
            Ok(backend) => Some(backend),
            Err(err) => {
                warn!("Failed to initialize playback backend: {err}. Running silent.");
                None
            }
        };
        Self {
            mixer: Mixer::new(),
            backend,
        }
    }

    /// The owned mixer.
    pub fn mixer(&self) -> &Mixer {
        &self.mixer
    }

    /// Mutable access to the owned mixer.
    pub fn mixer_mut(&mut self) -> &mut Mixer {
        &mut self.mixer
    }

    /// Execute the create-media protocol.
    ///
    /// Any channel already carrying the media id is superseded silently
    /// first, so replacing a running media instance never doubles up audio.
    /// The new channel starts at volume zero and fades (or is set, deferred
    /// by one tick) toward its initial volume: attenuated from `distance`
    /// for spatial media, the explicit volume for global media.
    pub fn create_media(
        &mut self,
        spec: MediaSpec,
        distance: f32,
        now: DateTime<Utc>,
    ) -> Result<CreatedMedia, AudioError> {
        self.destroy_silently(&spec.media);

        let id = self.mixer.mint_id();
        let mut channel = Channel::new(id, spec.media.clone());
        channel.set_trackable(true);

        let mut sound = Sound::new(spec.source.clone());
        sound.set_looping(spec.looping);
        sound.set_start_instant(spec.start_instant);
        sound.request_start(spec.do_pickup, now);
        channel.add_sound(sound);
        channel.set_volume(0.0);

        let spatial_range = spec.max_distance.filter(|max| *max > 0.0);
        match spatial_range {
            Some(max) => {
                channel.set_kind(ChannelKind::Spatial);
                channel.set_max_distance(Some(max));
                channel.fade_to(attenuate(max, distance), spec.fade_time_ms);
            }
            None => channel.set_kind(ChannelKind::Global),
        }

        // The caller's flag lands last; it must win over anything the
        // protocol assigned above.
        channel.set_flag(spec.flag.clone());

        self.mixer.add_channel(channel)?;
        if spatial_range.is_none() {
            // Global media: the volume apply waits one scheduler tick so
            // master-volume application lands after registration.
            let volume = spec.volume.filter(|v| *v != 0.0).unwrap_or(MAX_VOLUME);
            self.mixer.defer_volume(id, volume, spec.fade_time_ms);
        }
        self.mixer.update_current();

        let mut load_error = None;
        if let Some(backend) = self.backend.as_mut() {
            if let Err(err) = backend.load(id, &spec.source, spec.looping) {
                warn!("media {} failed to load: {err:#}", spec.media);
                load_error = Some(format!("{err:#}"));
            }
        }
        if load_error.is_none() {
            self.mark_ready(id, now);
        }

        Ok(CreatedMedia {
            channel: id,
            load_error,
        })
    }

    /// Signal that a channel's media finished loading.
    ///
    /// Deferred playback starts run now, in registration order; sounds that
    /// began playing are started on the backend at their resolved offset.
    pub fn mark_ready(&mut self, id: ChannelId, now: DateTime<Utc>) {
        let Some(channel) = self.mixer.channel_mut(id) else {
            debug!("readiness for unknown {id}; ignoring");
            return;
        };
        for offset_ms in channel.mark_ready(now) {
            if let Some(backend) = &self.backend {
                backend.start(id, offset_ms);
            }
        }
    }

    /// Re-fade every channel carrying the target media toward the volume
    /// attenuated from the new distance. Channels without an attenuation
    /// range are skipped (the attenuator is undefined for them). Returns
    /// the number of channels updated.
    pub fn update_media(&mut self, target: &MediaId, distance: f32, fade_time_ms: u64) -> usize {
        let mut updated = 0;
        for id in self.mixer.channels_for_media(target) {
            let Some(channel) = self.mixer.channel_mut(id) else {
                continue;
            };
            match channel.max_distance() {
                Some(max) => {
                    channel.fade_to(attenuate(max, distance), fade_time_ms);
                    updated += 1;
                }
                None => debug!("update for {target} skipped non-spatial {id}"),
            }
        }
        updated
    }

    /// Destroy channel(s) by media id with the default fade-out.
    pub fn destroy_sounds(&mut self, media: &MediaId, destroy_all: bool, silent: bool) -> usize {
        self.destroy_sounds_fading(media, destroy_all, silent, DEFAULT_DESTROY_FADE_MS)
    }

    /// Destroy channel(s) by media id, releasing backend sinks for
    /// channels that are removed immediately.
    pub fn destroy_sounds_fading(
        &mut self,
        media: &MediaId,
        destroy_all: bool,
        silent: bool,
        fade_ms: u64,
    ) -> usize {
        let before = self.mixer.channels_for_media(media);
        let count = self
            .mixer
            .destroy_sounds_fading(media, destroy_all, silent, fade_ms);
        if let Some(backend) = self.backend.as_mut() {
            for id in before {
                if self.mixer.channel(id).is_none() {
                    backend.remove(id);
                }
            }
        }
        count
    }

    /// Remove a single channel immediately, releasing its backend sink.
    ///
    /// This is the speaker-destroy path: no fade-out guarantee is made.
    pub fn remove_channel(&mut self, id: ChannelId) -> bool {
        let removed = self.mixer.remove_channel(id).is_some();
        if removed {
            if let Some(backend) = self.backend.as_mut() {
                backend.remove(id);
            }
        }
        removed
    }

    /// Store the master volume and propagate it to every channel.
    pub fn set_master_volume(&mut self, volume: f32) {
        self.mixer.set_master_volume(volume);
    }

    /// Advance the scheduler by one tick: apply deferred volume operations,
    /// advance fades, reap retired channels, and push the resolved output
    /// volumes to the backend. Returns the channels removed this tick.
    pub fn tick(&mut self, delta_ms: u64) -> Vec<ChannelId> {
        let removed = self.mixer.tick(delta_ms);
        if let Some(backend) = self.backend.as_mut() {
            for id in &removed {
                backend.remove(*id);
            }
            for channel in self.mixer.channels() {
                backend.set_volume(channel.id(), channel.output_volume());
            }
        }
        removed
    }

    fn destroy_silently(&mut self, media: &MediaId) {
        let superseded = self.destroy_sounds(media, true, true);
        if superseded > 0 {
            debug!("superseded {superseded} channel(s) for {media}");
        }
    }
}

impl Default for MediaManager {
    fn default() -> Self {
        Self::new()
    }
}

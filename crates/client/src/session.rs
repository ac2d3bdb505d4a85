//! Event dispatch: the sole translator from server events to core state.

use crate::{CardSurface, LightController, Notifier, Rgba, StubCards, StubLights, StubNotifier};
use chrono::{DateTime, Utc};
use glam::Vec3;
use resonance_audio::{MediaManager, MediaSpec, DEFAULT_DESTROY_FADE_MS};
use resonance_core::{MediaId, SpeakerId, SpeakerKind};
use resonance_net::{CreateMedia, ServerEvent, SpeakerCreate, PROTOCOL_REVISION};
use resonance_world::{Speaker, WorldSpace};
use tracing::{debug, info, warn};

/// Fade applied when listener motion re-targets a speaker's volume. Long
/// enough to mask per-step jumps at walking speed, short enough to track
/// the listener.
pub const SPEAKER_REFADE_MS: u64 = 250;

/// Optional protocol capabilities, gated by the server's revision.
#[derive(Debug, Clone, Copy, Default)]
pub struct Capabilities {
    /// Revision announced by the server.
    pub server_revision: u16,
    /// Server accepts acknowledgement callbacks (revision 2+).
    pub callbacks_enabled: bool,
    /// Server may send streaming media sources (revision 3+).
    pub streaming_sources: bool,
}

/// A connected client session.
///
/// Owns the media manager (and through it the mixer and playback backend)
/// and the world space. Every inbound event is verified, then translated
/// into core operations; malformed or stale events degrade to logged
/// no-ops so one bad event never stalls the pipeline.
pub struct Session {
    media: MediaManager,
    world: WorldSpace,
    capabilities: Capabilities,
    notifier: Box<dyn Notifier>,
    lights: Box<dyn LightController>,
    cards: Box<dyn CardSurface>,
}

impl Session {
    /// Create a headless session with stub collaborators.
    pub fn new() -> Self {
        Self::with_collaborators(
            Box::new(StubNotifier),
            Box::new(StubLights),
            Box::new(StubCards),
        )
    }

    /// Create a session wired to real collaborators.
    pub fn with_collaborators(
        notifier: Box<dyn Notifier>,
        lights: Box<dyn LightController>,
        cards: Box<dyn CardSurface>,
    ) -> Self {
        Self {
            media: MediaManager::new(),
            world: WorldSpace::new(),
            capabilities: Capabilities::default(),
            notifier,
            lights,
            cards,
        }
    }

    /// The owned media manager.
    pub fn media(&self) -> &MediaManager {
        &self.media
    }

    /// Mutable access to the owned media manager.
    pub fn media_mut(&mut self) -> &mut MediaManager {
        &mut self.media
    }

    /// The owned world space.
    pub fn world(&self) -> &WorldSpace {
        &self.world
    }

    /// Capabilities negotiated so far.
    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// Apply one server event at the given wall-clock instant.
    pub fn apply(&mut self, event: ServerEvent, now: DateTime<Utc>) {
        if let Err(reason) = event.verify() {
            warn!("dropping invalid event: {reason}");
            return;
        }

        match event {
            ServerEvent::CreateMedia(create) => self.on_create_media(create, now),
            ServerEvent::UpdateMedia {
                target_id,
                fade_time_ms,
                distance,
            } => {
                let updated =
                    self.media
                        .update_media(&MediaId::from(target_id.as_str()), distance, fade_time_ms);
                debug!("media update for {target_id} re-faded {updated} channel(s)");
            }
            ServerEvent::DestroyMedia {
                media_id,
                destroy_all,
                fade_time_ms,
            } => {
                self.media.destroy_sounds_fading(
                    &MediaId::from(media_id.as_str()),
                    destroy_all,
                    false,
                    fade_time_ms.unwrap_or(DEFAULT_DESTROY_FADE_MS),
                );
            }
            ServerEvent::SetMasterVolume { volume } => self.media.set_master_volume(volume),
            ServerEvent::SpeakerCreate(create) => self.on_speaker_create(create, now),
            ServerEvent::SpeakerDestroy { speaker_id } => {
                if let Some(speaker) = self.world.remove_speaker(&SpeakerId::new(speaker_id)) {
                    // Destruction is immediate; no fade-out guarantee.
                    self.media.remove_channel(speaker.channel());
                }
            }
            ServerEvent::ListenerLocation {
                x,
                y,
                z,
                pitch,
                yaw,
            } => {
                self.world.update_listener(Vec3::new(x, y, z), pitch, yaw);
                self.refresh_speaker_attenuation();
            }
            ServerEvent::Notification { title, message } => {
                self.notifier.notify(&title, &message);
            }
            ServerEvent::ProtocolVersion { revision } => self.on_protocol_version(revision),
            ServerEvent::LightColor {
                lights,
                red,
                green,
                blue,
                brightness,
            } => {
                let alpha = convert_range(f32::from(brightness), (0.0, 255.0), (0.0, 1.0));
                self.lights.set_lights(
                    &lights,
                    Rgba {
                        red,
                        green,
                        blue,
                        alpha,
                    },
                );
            }
            ServerEvent::CreateCard { serialized_card } => {
                match serde_json::from_str(&serialized_card) {
                    Ok(card) => self.cards.show_card(card),
                    Err(err) => warn!("dropping malformed card payload: {err}"),
                }
            }
            ServerEvent::UpdateCard {
                card_id,
                serialized_card,
            } => match serde_json::from_str(&serialized_card) {
                Ok(card) => self.cards.update_card(&card_id, card),
                Err(err) => warn!("dropping malformed card payload: {err}"),
            },
            ServerEvent::DestroyCard => self.cards.destroy_card(),
        }
    }

    /// Advance the scheduler by one tick.
    pub fn tick(&mut self, delta_ms: u64) {
        self.media.tick(delta_ms);
    }

    fn on_create_media(&mut self, create: CreateMedia, now: DateTime<Utc>) {
        let spec = MediaSpec {
            media: MediaId::from(create.media_id.as_str()),
            source: create.source,
            looping: create.looping,
            start_instant: create.start_instant,
            do_pickup: create.do_pickup,
            fade_time_ms: create.fade_time_ms,
            volume: create.volume,
            flag: create.flag,
            max_distance: (create.max_distance > 0.0).then_some(create.max_distance),
        };
        match self.media.create_media(spec, create.distance, now) {
            Ok(created) => {
                if let Some(error) = created.load_error {
                    self.notifier.notify("Media unavailable", &error);
                }
            }
            Err(err) => warn!("create media {} failed: {err}", create.media_id),
        }
    }

    fn on_speaker_create(&mut self, create: SpeakerCreate, now: DateTime<Utc>) {
        let grid = Vec3::new(create.x as f32, create.y as f32, create.z as f32);
        let listener = self.world.listener().position();

        // The bound channel goes through the same distance-governed
        // creation path as ambient media, keyed by the speaker id.
        let center = grid + Vec3::splat(resonance_world::SPEAKER_CENTER_OFFSET);
        let spec = MediaSpec {
            media: MediaId::from(create.speaker_id.as_str()),
            source: create.source.clone(),
            looping: true,
            start_instant: create.start_instant,
            do_pickup: true,
            fade_time_ms: SPEAKER_REFADE_MS,
            volume: None,
            flag: None,
            max_distance: Some(create.max_distance),
        };
        let created = match self.media.create_media(spec, center.distance(listener), now) {
            Ok(created) => created,
            Err(err) => {
                warn!("speaker {} channel creation failed: {err}", create.speaker_id);
                return;
            }
        };
        if let Some(error) = created.load_error {
            self.notifier.notify("Media unavailable", &error);
        }

        let speaker = Speaker::new(
            SpeakerId::new(create.speaker_id),
            create.source,
            grid,
            create.kind,
            create.max_distance,
            create.start_instant,
            created.channel,
        );

        // 2D speakers play flat inside the range; replace the roll-off
        // volume the creation path armed.
        if create.kind == SpeakerKind::Speaker2D {
            let volume = speaker.volume_at(listener);
            if let Some(channel) = self.media.mixer_mut().channel_mut(created.channel) {
                channel.fade_to(volume, SPEAKER_REFADE_MS);
            }
        }

        if let Some(stale) = self.world.add_speaker(speaker) {
            self.media.remove_channel(stale.channel());
        }
    }

    fn on_protocol_version(&mut self, revision: u16) {
        info!("server protocol revision {revision}");
        self.capabilities.server_revision = revision;
        self.capabilities.callbacks_enabled = revision >= 2;
        self.capabilities.streaming_sources = revision >= 3;
        if revision < PROTOCOL_REVISION {
            self.notifier.notify(
                "Outdated server",
                "The server runs an older audio plugin revision; some features are disabled.",
            );
        }
    }

    fn refresh_speaker_attenuation(&mut self) {
        for (channel, volume) in self.world.attenuation_updates() {
            if let Some(channel) = self.media.mixer_mut().channel_mut(channel) {
                channel.fade_to(volume, SPEAKER_REFADE_MS);
            }
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Map `value` from one range onto another, as the lighting protocol does
/// for its 0..=255 brightness scale.
fn convert_range(value: f32, from: (f32, f32), to: (f32, f32)) -> f32 {
    (value - from.0) * (to.1 - to.0) / (from.1 - from.0) + to.0
}

//! Server event definitions.
//!
//! Events arrive from an untrusted, possibly stale network source, so every
//! record carries a `verify` pass that callers should run before applying
//! it; verification failures drop the event, they never abort the pipeline.

use chrono::{DateTime, Utc};
use resonance_core::SpeakerKind;
use serde::{Deserialize, Serialize};

/// Protocol revision implemented by this client.
pub const PROTOCOL_REVISION: u16 = 3;

/// Maximum length of a media or speaker identifier.
pub const MAX_ID_LEN: usize = 128;

/// Maximum length of a media source (URL or stream id).
pub const MAX_SOURCE_LEN: usize = 1024;

/// Maximum length of the caller-supplied channel flag.
pub const MAX_FLAG_LEN: usize = 64;

/// Maximum length of notification titles and messages.
pub const MAX_TEXT_LEN: usize = 1024;

/// Maximum number of lights addressed by one color push.
pub const MAX_LIGHTS: usize = 64;

/// Maximum size of a serialized card payload (bytes).
pub const MAX_CARD_LEN: usize = 16 * 1024;

/// Longest accepted fade, ten minutes. Anything longer is a corrupt field.
pub const MAX_FADE_MS: u64 = 10 * 60 * 1000;

/// Events sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum ServerEvent {
    /// Create (or supersede) a media instance. See [`CreateMedia`].
    CreateMedia(CreateMedia),

    /// Re-fade every channel of a media id from a new distance.
    UpdateMedia {
        /// Media id the update fans out over.
        target_id: String,
        /// Fade time toward the recomputed volume.
        fade_time_ms: u64,
        /// New listener distance.
        distance: f32,
    },

    /// Destroy media by id.
    DestroyMedia {
        /// Media id to destroy.
        media_id: String,
        /// Remove every matching channel instead of the most recent one.
        destroy_all: bool,
        /// Fade-out length; the client default applies when absent.
        fade_time_ms: Option<u64>,
    },

    /// Set the client master volume (0..=100).
    SetMasterVolume {
        /// New master volume.
        volume: f32,
    },

    /// A speaker entered the listener's range. See [`SpeakerCreate`].
    SpeakerCreate(SpeakerCreate),

    /// A speaker left the listener's range.
    SpeakerDestroy {
        /// Speaker to remove.
        speaker_id: String,
    },

    /// Listener moved or turned.
    ListenerLocation {
        /// World-space X.
        x: f32,
        /// World-space Y.
        y: f32,
        /// World-space Z.
        z: f32,
        /// Pitch in degrees.
        pitch: f32,
        /// Yaw in degrees.
        yaw: f32,
    },

    /// User-visible notification.
    Notification {
        /// Short title.
        title: String,
        /// Message body.
        message: String,
    },

    /// Server protocol revision announcement; gates optional capabilities.
    ProtocolVersion {
        /// Highest revision the server speaks.
        revision: u16,
    },

    /// Push a resolved color to linked lights.
    LightColor {
        /// Target light ids.
        lights: Vec<u32>,
        /// Red component.
        red: u8,
        /// Green component.
        green: u8,
        /// Blue component.
        blue: u8,
        /// Brightness on the device's 0..=255 scale.
        brightness: u8,
    },

    /// Show a card from serialized JSON.
    CreateCard {
        /// Card payload as JSON text.
        serialized_card: String,
    },

    /// Replace an existing card's content.
    UpdateCard {
        /// Card to replace.
        card_id: String,
        /// New card payload as JSON text.
        serialized_card: String,
    },

    /// Hide the card panel.
    DestroyCard,
}

/// Payload of [`ServerEvent::CreateMedia`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateMedia {
    /// Media id; an existing instance under this id is superseded.
    pub media_id: String,
    /// Media source (URL or stream identifier).
    pub source: String,
    /// Loop playback.
    #[serde(rename = "loop")]
    pub looping: bool,
    /// Server-side playback start instant.
    pub start_instant: Option<DateTime<Utc>>,
    /// Resume at the server's elapsed offset (late-join pickup).
    pub do_pickup: bool,
    /// Fade time toward the initial volume.
    pub fade_time_ms: u64,
    /// Current listener distance, for the initial attenuated volume.
    pub distance: f32,
    /// Attenuation range; zero disables attenuation (global media).
    pub max_distance: f32,
    /// Explicit volume. Absent or zero means the default of 100; legacy
    /// servers send zero when nothing was configured.
    pub volume: Option<f32>,
    /// Caller-supplied free-form channel flag.
    pub flag: Option<String>,
}

/// Payload of [`ServerEvent::SpeakerCreate`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpeakerCreate {
    /// Speaker id (server UUID).
    pub speaker_id: String,
    /// Media source the speaker plays.
    pub source: String,
    /// Grid-aligned X coordinate.
    pub x: i32,
    /// Grid-aligned Y coordinate.
    pub y: i32,
    /// Grid-aligned Z coordinate.
    pub z: i32,
    /// Playback behavior inside the range.
    pub kind: SpeakerKind,
    /// Audible range.
    pub max_distance: f32,
    /// Server-side playback start instant, for pickup.
    pub start_instant: Option<DateTime<Utc>>,
}

impl ServerEvent {
    /// Verify field limits and validity.
    ///
    /// Run on every received event; a failing event is dropped, never
    /// applied partially.
    pub fn verify(&self) -> Result<(), &'static str> {
        match self {
            ServerEvent::CreateMedia(create) => create.verify()?,
            ServerEvent::UpdateMedia {
                target_id,
                fade_time_ms,
                distance,
            } => {
                verify_id(target_id)?;
                verify_fade(*fade_time_ms)?;
                verify_finite(*distance, "Update distance is not finite")?;
            }
            ServerEvent::DestroyMedia {
                media_id,
                fade_time_ms,
                ..
            } => {
                verify_id(media_id)?;
                if let Some(fade) = fade_time_ms {
                    verify_fade(*fade)?;
                }
            }
            ServerEvent::SetMasterVolume { volume } => {
                verify_finite(*volume, "Master volume is not finite")?;
                if !(0.0..=100.0).contains(volume) {
                    return Err("Master volume out of range");
                }
            }
            ServerEvent::SpeakerCreate(create) => create.verify()?,
            ServerEvent::SpeakerDestroy { speaker_id } => verify_id(speaker_id)?,
            ServerEvent::ListenerLocation {
                x, y, z, pitch, yaw,
            } => {
                for value in [x, y, z, pitch, yaw] {
                    verify_finite(*value, "Listener pose is not finite")?;
                }
            }
            ServerEvent::Notification { title, message } => {
                if title.len() > MAX_TEXT_LEN || message.len() > MAX_TEXT_LEN {
                    return Err("Notification text too long");
                }
            }
            ServerEvent::ProtocolVersion { .. } => {}
            ServerEvent::LightColor { lights, .. } => {
                if lights.len() > MAX_LIGHTS {
                    return Err("Too many lights addressed");
                }
            }
            ServerEvent::CreateCard { serialized_card } => {
                if serialized_card.len() > MAX_CARD_LEN {
                    return Err("Card payload too large");
                }
            }
            ServerEvent::UpdateCard {
                card_id,
                serialized_card,
            } => {
                verify_id(card_id)?;
                if serialized_card.len() > MAX_CARD_LEN {
                    return Err("Card payload too large");
                }
            }
            ServerEvent::DestroyCard => {}
        }
        Ok(())
    }
}

impl CreateMedia {
    /// Verify field limits and validity.
    pub fn verify(&self) -> Result<(), &'static str> {
        verify_id(&self.media_id)?;
        if self.source.is_empty() || self.source.len() > MAX_SOURCE_LEN {
            return Err("Media source length out of range");
        }
        verify_fade(self.fade_time_ms)?;
        verify_finite(self.distance, "Media distance is not finite")?;
        verify_finite(self.max_distance, "Media max distance is not finite")?;
        if self.max_distance < 0.0 {
            return Err("Media max distance is negative");
        }
        if let Some(volume) = self.volume {
            verify_finite(volume, "Media volume is not finite")?;
            if !(0.0..=100.0).contains(&volume) {
                return Err("Media volume out of range");
            }
        }
        if let Some(flag) = &self.flag {
            if flag.len() > MAX_FLAG_LEN {
                return Err("Media flag too long");
            }
        }
        Ok(())
    }
}

impl SpeakerCreate {
    /// Verify field limits and validity.
    pub fn verify(&self) -> Result<(), &'static str> {
        verify_id(&self.speaker_id)?;
        if self.source.is_empty() || self.source.len() > MAX_SOURCE_LEN {
            return Err("Speaker source length out of range");
        }
        verify_finite(self.max_distance, "Speaker max distance is not finite")?;
        if self.max_distance <= 0.0 {
            return Err("Speaker max distance must be positive");
        }
        Ok(())
    }
}

fn verify_id(id: &str) -> Result<(), &'static str> {
    if id.is_empty() || id.len() > MAX_ID_LEN {
        return Err("Identifier length out of range");
    }
    Ok(())
}

fn verify_fade(fade_ms: u64) -> Result<(), &'static str> {
    if fade_ms > MAX_FADE_MS {
        return Err("Fade time too long");
    }
    Ok(())
}

fn verify_finite(value: f32, message: &'static str) -> Result<(), &'static str> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_media() -> CreateMedia {
        CreateMedia {
            media_id: "region-7".into(),
            source: "https://cdn.example/ambience.ogg".into(),
            looping: true,
            start_instant: None,
            do_pickup: false,
            fade_time_ms: 500,
            distance: 10.0,
            max_distance: 20.0,
            volume: None,
            flag: None,
        }
    }

    #[test]
    fn valid_create_media_passes() {
        assert!(ServerEvent::CreateMedia(create_media()).verify().is_ok());
    }

    #[test]
    fn empty_source_is_rejected() {
        let mut create = create_media();
        create.source.clear();
        assert!(create.verify().is_err());
    }

    #[test]
    fn oversized_id_is_rejected() {
        let mut create = create_media();
        create.media_id = "x".repeat(MAX_ID_LEN + 1);
        assert!(create.verify().is_err());
    }

    #[test]
    fn non_finite_distance_is_rejected() {
        let mut create = create_media();
        create.distance = f32::NAN;
        assert!(create.verify().is_err());
    }

    #[test]
    fn out_of_range_master_volume_is_rejected() {
        assert!(ServerEvent::SetMasterVolume { volume: 140.0 }.verify().is_err());
        assert!(ServerEvent::SetMasterVolume { volume: 60.0 }.verify().is_ok());
    }

    #[test]
    fn speaker_needs_positive_range() {
        let create = SpeakerCreate {
            speaker_id: "b1946ac9".into(),
            source: "sounds/radio.ogg".into(),
            x: 10,
            y: 5,
            z: 3,
            kind: SpeakerKind::Speaker3D,
            max_distance: 0.0,
            start_instant: None,
        };
        assert!(create.verify().is_err());
    }

    #[test]
    fn events_roundtrip_through_json() {
        let event = ServerEvent::CreateMedia(create_media());
        let json = serde_json::to_string(&event).unwrap();
        let back: ServerEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, back);
    }
}

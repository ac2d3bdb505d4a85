#![warn(missing_docs)]
//! Core identifiers and volume primitives shared across the workspace.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Server-assigned media identifier.
///
/// Media ids are opaque strings chosen by the server (region media ids,
/// speaker UUIDs). They are the secondary lookup key on the mixer and are
/// not unique across channels: several channels may carry the same media id
/// and bulk operations fan out over all of them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MediaId(String);

impl MediaId {
    /// Wrap a server-provided identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for MediaId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for MediaId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for MediaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Process-unique channel handle, minted by the mixer.
///
/// Stable for the channel's whole lifetime; never reused within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChannelId(pub u64);

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "channel#{}", self.0)
    }
}

/// World speaker identifier (server-assigned UUID string).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpeakerId(String);

impl SpeakerId {
    /// Wrap a server-provided speaker id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SpeakerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Channel classification.
///
/// Replaces the loose string tags of older protocol revisions: a channel is
/// either global (plays at its nominal volume everywhere) or spatial
/// (volume governed by listener distance). The caller-supplied free-form
/// flag lives on the channel itself, separate from this classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelKind {
    /// No attenuation; the nominal volume applies everywhere.
    Global,
    /// Distance-governed; volume is derived from listener distance.
    Spatial,
}

/// Speaker playback behavior inside its range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpeakerKind {
    /// Constant volume while the listener is inside the range.
    Speaker2D,
    /// Linear roll-off from the center toward the edge of the range.
    Speaker3D,
}

/// Upper bound of the volume scale.
pub const MAX_VOLUME: f32 = 100.0;

/// Clamp a volume scalar into `[0, 100]`.
pub fn clamp_volume(volume: f32) -> f32 {
    volume.clamp(0.0, MAX_VOLUME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_volume_bounds() {
        assert_eq!(clamp_volume(-5.0), 0.0);
        assert_eq!(clamp_volume(50.0), 50.0);
        assert_eq!(clamp_volume(150.0), 100.0);
    }

    #[test]
    fn media_id_roundtrips_through_str() {
        let id = MediaId::from("region-music-7");
        assert_eq!(id.as_str(), "region-music-7");
        assert_eq!(id, MediaId::new(String::from("region-music-7")));
    }
}

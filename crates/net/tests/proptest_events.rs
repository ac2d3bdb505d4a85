//! Fuzz-style property tests for event parsing.
//!
//! Events arrive as attacker-controllable text; the parser must reject
//! garbage gracefully and preserve every field it accepts.

use proptest::prelude::*;
use resonance_net::ServerEvent;

proptest! {
    /// Property: arbitrary text never crashes the event parser.
    #[test]
    fn arbitrary_text_does_not_crash_the_parser(input in ".{0,2000}") {
        let _result = serde_json::from_str::<ServerEvent>(&input);
        // No panic = success
    }

    /// Property: master volume events roundtrip and verify in range.
    #[test]
    fn master_volume_roundtrips(volume in 0.0f32..=100.0) {
        let event = ServerEvent::SetMasterVolume { volume };
        prop_assert!(event.verify().is_ok());

        let json = serde_json::to_string(&event).unwrap();
        let back: ServerEvent = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(event, back);
    }

    /// Property: listener poses with finite components always verify and
    /// roundtrip exactly.
    #[test]
    fn listener_location_roundtrips(
        x in -30_000_000.0f32..30_000_000.0,
        y in -64.0f32..320.0,
        z in -30_000_000.0f32..30_000_000.0,
        pitch in -90.0f32..=90.0,
        yaw in -180.0f32..=180.0,
    ) {
        let event = ServerEvent::ListenerLocation { x, y, z, pitch, yaw };
        prop_assert!(event.verify().is_ok());

        let json = serde_json::to_string(&event).unwrap();
        let back: ServerEvent = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(event, back);
    }

    /// Property: destroy events verify for any id within the length limit.
    #[test]
    fn destroy_media_accepts_bounded_ids(id in "[a-z0-9-]{1,64}", all in any::<bool>()) {
        let event = ServerEvent::DestroyMedia {
            media_id: id,
            destroy_all: all,
            fade_time_ms: None,
        };
        prop_assert!(event.verify().is_ok());
    }
}

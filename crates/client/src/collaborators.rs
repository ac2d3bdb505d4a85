//! Collaborator seams for systems outside the audio core.
//!
//! The session resolves event data completely before invoking these; a
//! collaborator never reaches back into the mixer.

use serde_json::Value;

/// A resolved light color. Alpha carries the brightness, already converted
/// from the device's 0..=255 scale to 0..=1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    /// Red component.
    pub red: u8,
    /// Green component.
    pub green: u8,
    /// Blue component.
    pub blue: u8,
    /// Brightness in 0..=1.
    pub alpha: f32,
}

/// User-visible notification display.
pub trait Notifier {
    /// Show a notification with a short title and a message body.
    fn notify(&mut self, title: &str, message: &str);
}

/// Peripheral lighting integration.
pub trait LightController {
    /// Push a resolved color to the given lights.
    fn set_lights(&mut self, lights: &[u32], color: Rgba);
}

/// Card panel rendering.
pub trait CardSurface {
    /// Show a card from parsed JSON.
    fn show_card(&mut self, card: Value);

    /// Replace an existing card's content.
    fn update_card(&mut self, card_id: &str, card: Value);

    /// Hide the card panel.
    fn destroy_card(&mut self);
}

/// Notifier that drops everything; useful for headless operation.
#[derive(Debug, Default)]
pub struct StubNotifier;

impl Notifier for StubNotifier {
    fn notify(&mut self, _title: &str, _message: &str) {}
}

/// Light controller that drops everything.
#[derive(Debug, Default)]
pub struct StubLights;

impl LightController for StubLights {
    fn set_lights(&mut self, _lights: &[u32], _color: Rgba) {}
}

/// Card surface that drops everything.
#[derive(Debug, Default)]
pub struct StubCards;

impl CardSurface for StubCards {
    fn show_card(&mut self, _card: Value) {}

    fn update_card(&mut self, _card_id: &str, _card: Value) {}

    fn destroy_card(&mut self) {}
}

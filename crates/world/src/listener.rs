//! Listener pose tracking.

use glam::Vec3;

/// The listener's position and orientation in world space.
///
/// Updated from server location events; orientation is carried for
/// collaborators that pan audio directionally, the distance model here
/// only consumes the position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Listener {
    position: Vec3,
    pitch: f32,
    yaw: f32,
}

impl Listener {
    /// A listener at the origin, facing straight ahead.
    pub fn new() -> Self {
        Self {
            position: Vec3::ZERO,
            pitch: 0.0,
            yaw: 0.0,
        }
    }

    /// Current world-space position.
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Pitch in degrees.
    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    /// Yaw in degrees.
    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    /// Replace the pose from a location update.
    pub fn update(&mut self, position: Vec3, pitch: f32, yaw: f32) {
        self.position = position;
        self.pitch = pitch;
        self.yaw = yaw;
    }
}

impl Default for Listener {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_replaces_pose() {
        let mut listener = Listener::new();
        listener.update(Vec3::new(1.0, 64.0, -3.0), 15.0, 90.0);
        assert_eq!(listener.position(), Vec3::new(1.0, 64.0, -3.0));
        assert_eq!(listener.pitch(), 15.0);
        assert_eq!(listener.yaw(), 90.0);
    }
}

//! Time-bounded linear volume interpolation.

/// Internal fade progression.
#[derive(Debug, Clone, Copy, PartialEq)]
enum FadeState {
    /// No fade armed.
    Idle,
    /// Fade in progress.
    Active {
        from: f32,
        to: f32,
        duration_ms: u64,
        elapsed_ms: u64,
    },
    /// Terminal value has been produced; retires on the next tick.
    Complete,
}

/// A per-channel fade, advanced by the owned scheduler tick.
///
/// Arming a new fade while one is in progress replaces it; there is no
/// queueing and no cancellation primitive beyond superseding the state.
/// Zero-duration fades never reach the fader: the channel collapses them
/// into a direct volume set, so `begin` requires a positive duration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fader {
    state: FadeState,
}

impl Fader {
    /// An idle fader.
    pub fn new() -> Self {
        Self {
            state: FadeState::Idle,
        }
    }

    /// Arm a fade from `from` toward `to` over `duration_ms`.
    ///
    /// `from` must be the channel's current effective volume so that
    /// superseding an in-flight fade produces no audible discontinuity.
    pub fn begin(&mut self, from: f32, to: f32, duration_ms: u64) {
        debug_assert!(duration_ms > 0, "zero-duration fades are a direct set");
        self.state = FadeState::Active {
            from,
            to,
            duration_ms,
            elapsed_ms: 0,
        };
    }

    /// Advance the fade by `delta_ms`, returning the instantaneous volume.
    ///
    /// Returns `None` while idle. When elapsed time reaches the duration the
    /// terminal value is returned exactly once and the fader self-retires on
    /// the following tick.
    pub fn tick(&mut self, delta_ms: u64) -> Option<f32> {
        match self.state {
            FadeState::Idle => None,
            FadeState::Complete => {
                self.state = FadeState::Idle;
                None
            }
            FadeState::Active {
                from,
                to,
                duration_ms,
                elapsed_ms,
            } => {
                let elapsed_ms = elapsed_ms.saturating_add(delta_ms);
                if elapsed_ms >= duration_ms {
                    self.state = FadeState::Complete;
                    Some(to)
                } else {
                    self.state = FadeState::Active {
                        from,
                        to,
                        duration_ms,
                        elapsed_ms,
                    };
                    let progress = elapsed_ms as f32 / duration_ms as f32;
                    Some(from + (to - from) * progress)
                }
            }
        }
    }

    /// Whether a fade is still in flight (terminal value not yet produced).
    pub fn is_active(&self) -> bool {
        matches!(self.state, FadeState::Active { .. })
    }

    /// Drop any armed fade without applying it.
    pub fn cancel(&mut self) {
        self.state = FadeState::Idle;
    }
}

impl Default for Fader {
    fn default() -> Self {
        Self::new()
    }
}

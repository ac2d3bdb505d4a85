//! A single playable media instance inside a channel.

use crate::AudioError;
use chrono::{DateTime, Utc};
use tracing::trace;

/// Sound lifecycle.
///
/// `Ready` is reached only after the media backend confirms the source is
/// loaded. Playback-start operations issued earlier are queued and replayed
/// on the readiness signal, in registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundState {
    /// Source registered, backend has not confirmed the load yet.
    Initializing,
    /// Loaded and eligible for playback-start operations.
    Ready,
    /// Actively playing.
    Playing,
    /// Playback ran to completion.
    Finished,
}

/// Operation deferred until readiness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Deferred {
    Start { pickup: bool },
}

/// A playable media instance.
///
/// A sound is exclusively owned by one channel and shares that channel's
/// volume envelope; it carries no volume of its own. Destroying the channel
/// destroys the sound.
#[derive(Debug, Clone)]
pub struct Sound {
    source: String,
    looping: bool,
    start_instant: Option<DateTime<Utc>>,
    state: SoundState,
    offset_ms: u64,
    deferred: Vec<Deferred>,
}

impl Sound {
    /// Create a sound for the given media source, awaiting readiness.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            looping: false,
            start_instant: None,
            state: SoundState::Initializing,
            offset_ms: 0,
            deferred: Vec::new(),
        }
    }

    /// The media source identifier (URL or stream id).
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Whether playback loops.
    pub fn is_looping(&self) -> bool {
        self.looping
    }

    /// Set looping playback.
    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    /// Server-provided start instant used for late-join pickup.
    pub fn set_start_instant(&mut self, instant: Option<DateTime<Utc>>) {
        self.start_instant = instant;
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SoundState {
        self.state
    }

    /// Playback offset selected when the sound began playing.
    pub fn offset_ms(&self) -> u64 {
        self.offset_ms
    }

    /// Elapsed milliseconds between the server start instant and `now`.
    ///
    /// Zero when no start instant was provided or the instant lies in the
    /// future (clock skew between server and client).
    pub fn pickup_offset_ms(&self, now: DateTime<Utc>) -> u64 {
        match self.start_instant {
            Some(start) => (now - start).num_milliseconds().max(0) as u64,
            None => 0,
        }
    }

    /// Request playback, deferring until readiness when necessary.
    ///
    /// With `pickup`, playback begins at the server start offset instead of
    /// the beginning of the media. Requests made before the readiness signal
    /// are queued, never dropped. Returns the playback offset when the
    /// request started playback right away.
    pub fn request_start(&mut self, pickup: bool, now: DateTime<Utc>) -> Option<u64> {
        match self.state {
            SoundState::Initializing => {
                self.deferred.push(Deferred::Start { pickup });
                None
            }
            SoundState::Ready => Some(self.begin(now, pickup)),
            SoundState::Playing | SoundState::Finished => {
                trace!("start request ignored in state {:?}", self.state);
                None
            }
        }
    }

    /// Signal that the backend finished loading the source.
    ///
    /// Fires at most once; repeated signals are ignored. Deferred start
    /// requests run in registration order, and the offset of the request
    /// that began playback (if any) is returned.
    pub fn mark_ready(&mut self, now: DateTime<Utc>) -> Option<u64> {
        if self.state != SoundState::Initializing {
            trace!("readiness signal repeated in state {:?}", self.state);
            return None;
        }
        self.state = SoundState::Ready;
        let mut started_at = None;
        for action in std::mem::take(&mut self.deferred) {
            match action {
                Deferred::Start { pickup } => {
                    if self.state == SoundState::Ready {
                        let offset = self.begin(now, pickup);
                        started_at.get_or_insert(offset);
                    }
                }
            }
        }
        started_at
    }

    /// Start playback immediately, failing if the source is not ready.
    pub fn start_now(&mut self, now: DateTime<Utc>, pickup: bool) -> Result<u64, AudioError> {
        match self.state {
            SoundState::Initializing => Err(AudioError::MediaNotReady(self.source.clone())),
            SoundState::Ready => Ok(self.begin(now, pickup)),
            SoundState::Playing => Ok(self.offset_ms),
            SoundState::Finished => Err(AudioError::MediaNotReady(self.source.clone())),
        }
    }

    /// Mark playback as complete. Looping sounds never finish on their own;
    /// they stop when their channel is destroyed.
    pub fn finish(&mut self) {
        if self.state == SoundState::Playing && !self.looping {
            self.state = SoundState::Finished;
        }
    }

    fn begin(&mut self, now: DateTime<Utc>, pickup: bool) -> u64 {
        self.offset_ms = if pickup { self.pickup_offset_ms(now) } else { 0 };
        self.state = SoundState::Playing;
        self.offset_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn start_before_readiness_is_deferred() {
        let mut sound = Sound::new("https://cdn.example/ambience.ogg");
        sound.request_start(false, at(0));
        assert_eq!(sound.state(), SoundState::Initializing);

        let offset = sound.mark_ready(at(100));
        assert_eq!(offset, Some(0));
        assert_eq!(sound.state(), SoundState::Playing);
    }

    #[test]
    fn readiness_fires_at_most_once() {
        let mut sound = Sound::new("a.ogg");
        sound.request_start(false, at(0));
        assert!(sound.mark_ready(at(100)).is_some());

        // A second signal neither replays deferred actions nor resets state.
        assert!(sound.mark_ready(at(200)).is_none());
        assert_eq!(sound.state(), SoundState::Playing);
    }

    #[test]
    fn pickup_offset_from_server_instant() {
        let mut sound = Sound::new("a.ogg");
        sound.set_start_instant(Some(at(100)));
        sound.request_start(true, at(0));

        let offset = sound.mark_ready(at(142));
        assert_eq!(offset, Some(42_000));
        assert_eq!(sound.offset_ms(), 42_000);
    }

    #[test]
    fn future_start_instant_clamps_to_zero() {
        let mut sound = Sound::new("a.ogg");
        sound.set_start_instant(Some(at(500)));
        assert_eq!(sound.pickup_offset_ms(at(100)), 0);
    }

    #[test]
    fn start_now_errors_before_readiness() {
        let mut sound = Sound::new("b.ogg");
        assert!(matches!(
            sound.start_now(at(0), false),
            Err(AudioError::MediaNotReady(_))
        ));
        // The failed demand did not corrupt the lifecycle.
        assert_eq!(sound.state(), SoundState::Initializing);
    }

    #[test]
    fn looping_sound_never_finishes() {
        let mut sound = Sound::new("loop.ogg");
        sound.set_looping(true);
        sound.request_start(false, at(0));
        sound.mark_ready(at(0));
        sound.finish();
        assert_eq!(sound.state(), SoundState::Playing);
    }

    #[test]
    fn one_shot_sound_finishes() {
        let mut sound = Sound::new("once.ogg");
        sound.request_start(false, at(0));
        sound.mark_ready(at(0));
        sound.finish();
        assert_eq!(sound.state(), SoundState::Finished);
    }
}

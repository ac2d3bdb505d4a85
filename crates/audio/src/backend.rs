//! Playback backend seam.
//!
//! The mixing core resolves *what* volume each channel plays at; the
//! backend applies fully resolved (source, volume, offset) triples to an
//! output device. With the `rodio_backend` feature a rodio sink is kept per
//! channel; without it a stub tracks sink state so the engine runs headless.

#[cfg(feature = "rodio_backend")]
mod imp {
    use anyhow::{Context, Result};
    use resonance_core::ChannelId;
    use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
    use std::collections::HashMap;
    use std::io::Cursor;
    use std::time::Duration;
    use tracing::warn;

    /// Rodio-backed playback: one sink per channel.
    pub struct PlaybackBackend {
        /// Output stream (must be kept alive)
        _stream: OutputStream,
        stream_handle: OutputStreamHandle,
        sinks: HashMap<ChannelId, Sink>,
    }

    impl PlaybackBackend {
        /// Open the default output device.
        pub fn new() -> Result<Self> {
            let (stream, stream_handle) =
                OutputStream::try_default().context("Failed to create audio output stream")?;
            Ok(Self {
                _stream: stream,
                stream_handle,
                sinks: HashMap::new(),
            })
        }

        /// Load a media source into a paused sink for the channel.
        pub fn load(&mut self, channel: ChannelId, source: &str, looping: bool) -> Result<()> {
            let bytes = std::fs::read(source)
                .with_context(|| format!("Failed to read media source {source}"))?;
            let sink = Sink::try_new(&self.stream_handle).context("Failed to create audio sink")?;
            sink.pause();
            sink.set_volume(0.0);

            let decoder =
                Decoder::new(Cursor::new(bytes)).context("Failed to decode media source")?;
            if looping {
                sink.append(decoder.repeat_infinite());
            } else {
                sink.append(decoder);
            }

            self.sinks.insert(channel, sink);
            Ok(())
        }

        /// Apply a resolved output volume (0..=100) to the channel's sink.
        pub fn set_volume(&self, channel: ChannelId, output_volume: f32) {
            if let Some(sink) = self.sinks.get(&channel) {
                sink.set_volume(output_volume / 100.0);
            }
        }

        /// Begin playback at the given offset.
        pub fn start(&self, channel: ChannelId, offset_ms: u64) {
            if let Some(sink) = self.sinks.get(&channel) {
                if offset_ms > 0 {
                    if let Err(err) = sink.try_seek(Duration::from_millis(offset_ms)) {
                        warn!("seek to {offset_ms}ms failed for {channel}: {err:?}");
                    }
                }
                sink.play();
            }
        }

        /// Stop and release the channel's sink.
        pub fn remove(&mut self, channel: ChannelId) {
            if let Some(sink) = self.sinks.remove(&channel) {
                sink.stop();
            }
        }

        /// Number of live sinks.
        pub fn active_sinks(&self) -> usize {
            self.sinks.len()
        }
    }
}

#[cfg(not(feature = "rodio_backend"))]
mod imp {
    use anyhow::Result;
    use resonance_core::ChannelId;
    use std::collections::HashSet;
    use tracing::debug;

    /// Headless playback stub: tracks sink lifecycle, emits no sound.
    pub struct PlaybackBackend {
        active: HashSet<ChannelId>,
    }

    impl PlaybackBackend {
        /// Create the stub backend.
        pub fn new() -> Result<Self> {
            debug!("Playback backend: stub (no rodio)");
            Ok(Self {
                active: HashSet::new(),
            })
        }

        /// Record the channel as loaded.
        pub fn load(&mut self, channel: ChannelId, _source: &str, _looping: bool) -> Result<()> {
            self.active.insert(channel);
            Ok(())
        }

        /// No-op volume application.
        pub fn set_volume(&self, _channel: ChannelId, _output_volume: f32) {}

        /// No-op playback start.
        pub fn start(&self, _channel: ChannelId, _offset_ms: u64) {}

        /// Forget the channel.
        pub fn remove(&mut self, channel: ChannelId) {
            self.active.remove(&channel);
        }

        /// Number of channels currently tracked.
        pub fn active_sinks(&self) -> usize {
            self.active.len()
        }
    }
}

pub use imp::PlaybackBackend;

//! Headless event-log replay.
//!
//! Drives a session from a newline-delimited JSON log of timed server
//! events, standing in for the live socket during development and tests.

use anyhow::{Context, Result};
use chrono::Utc;
use resonance_client::Session;
use resonance_net::ServerEvent;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use tracing::{debug, info};

/// One line of a replay log.
#[derive(Debug, Serialize, Deserialize)]
pub struct ReplayRecord {
    /// Milliseconds of scheduler time before this event applies.
    pub delta_ms: u64,
    /// The event itself.
    pub event: ServerEvent,
}

/// Counters reported after a replay run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    /// Events applied.
    pub events: usize,
    /// Channels still registered when the log ran out.
    pub live_channels: usize,
    /// Speakers still in range when the log ran out.
    pub live_speakers: usize,
}

/// Replay a log file into the session.
///
/// Each record advances the scheduler by its delta before the event is
/// applied, so fades progress exactly as they would under the live tick.
pub fn run(session: &mut Session, path: &Path, settle_ms: u64) -> Result<ReplaySummary> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read replay log {}", path.display()))?;

    let mut summary = ReplaySummary::default();
    for (number, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let record: ReplayRecord = serde_json::from_str(line)
            .with_context(|| format!("Malformed replay record on line {}", number + 1))?;

        if record.delta_ms > 0 {
            session.tick(record.delta_ms);
        }
        debug!("applying {:?}", record.event);
        session.apply(record.event, Utc::now());
        summary.events += 1;
    }

    // Let in-flight fades run out before reporting.
    if settle_ms > 0 {
        session.tick(settle_ms);
    }

    summary.live_channels = session.media().mixer().len();
    summary.live_speakers = session.world().len();
    info!(
        "replay finished: {} event(s), {} channel(s), {} speaker(s) live",
        summary.events, summary.live_channels, summary.live_speakers
    );
    Ok(summary)
}

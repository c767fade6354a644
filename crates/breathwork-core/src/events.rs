use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::Phase;

/// Every state change of a session produces an Event.
/// Hosts print or forward them; the UI re-reads state on each one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    SessionStarted {
        pattern_id: String,
        phase: Phase,
        phase_duration_secs: u32,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    SessionPaused {
        phase: Phase,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    SessionReset {
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    PhaseChanged {
        phase: Phase,
        label: String,
        duration_secs: u32,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    CountdownTick {
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    /// Countdown reached zero; the engine stopped itself.
    SessionCompleted {
        pattern_id: String,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        pattern_id: String,
        phase: Phase,
        phase_label: String,
        phase_duration_secs: u32,
        remaining_secs: u64,
        is_running: bool,
        at: DateTime<Utc>,
    },
}

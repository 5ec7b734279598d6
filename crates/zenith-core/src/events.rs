use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{Phase, TransitionKind};

/// Every state change in the sequencer produces an Event.
/// Display consumers render them; sinks turn them into sounds and notifications.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    ConfigurationBound {
        configuration_id: String,
        at: DateTime<Utc>,
    },
    TimerStarted {
        segment_index: usize,
        work_item_index: usize,
        phase: Phase,
        segment_name: String,
        description: String,
        time_left: u32,
        /// Start doubled as a restart after completion.
        restarted: bool,
        at: DateTime<Utc>,
    },
    TimerPaused {
        time_left: u32,
        at: DateTime<Utc>,
    },
    TimerResumed {
        time_left: u32,
        at: DateTime<Utc>,
    },
    TimerReset {
        at: DateTime<Utc>,
    },
    /// A phase boundary was crossed (natural expiry or skip).
    PhaseChanged {
        kind: TransitionKind,
        phase: Phase,
        segment_index: usize,
        work_item_index: usize,
        segment_name: String,
        description: String,
        duration_secs: u32,
        skipped: bool,
        at: DateTime<Utc>,
    },
    SequenceCompleted {
        configuration_id: String,
        skipped: bool,
        at: DateTime<Utc>,
    },
    /// The last seconds of a work phase are running out.
    LowTime {
        time_left: u32,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        phase: Phase,
        is_running: bool,
        is_paused: bool,
        segment_index: usize,
        work_item_index: usize,
        segment_name: String,
        description: String,
        time_left: u32,
        time_left_display: String,
        phase_duration: u32,
        progress_pct: f64,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// Stable snake_case name, used for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Event::ConfigurationBound { .. } => "configuration_bound",
            Event::TimerStarted { .. } => "timer_started",
            Event::TimerPaused { .. } => "timer_paused",
            Event::TimerResumed { .. } => "timer_resumed",
            Event::TimerReset { .. } => "timer_reset",
            Event::PhaseChanged { .. } => "phase_changed",
            Event::SequenceCompleted { .. } => "sequence_completed",
            Event::LowTime { .. } => "low_time",
            Event::StateSnapshot { .. } => "state_snapshot",
        }
    }
}

//! Phase cursor: where the sequencer currently is within a configuration.

use serde::{Deserialize, Serialize};

use super::configuration::TimerConfiguration;

pub(crate) const COMPLETE_TEXT: &str = "Timer Complete!";
pub(crate) const CYCLE_REST_TEXT: &str = "Rest before repeating sequence";
pub(crate) const CYCLE_REST_NAME: &str = "Section Break";
const UNBOUND_TEXT: &str = "No timer selected";

/// The sequencer's current mode. Exactly one holds at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Bound but never started (or freshly reset).
    Idle,
    Working,
    /// The trailing rest of the current segment.
    SegmentResting,
    /// Rest between two full passes of a repeating sequence.
    BetweenCyclesResting,
    Complete,
}

impl Phase {
    pub fn is_rest(self) -> bool {
        matches!(self, Phase::SegmentResting | Phase::BetweenCyclesResting)
    }

    pub fn label(self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Working => "work",
            Phase::SegmentResting => "rest",
            Phase::BetweenCyclesResting => "cycle rest",
            Phase::Complete => "complete",
        }
    }
}

/// Snapshot of a run. Mutated only by the sequencer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunState {
    /// Seconds remaining in the current phase.
    pub time_left: u32,
    pub segment_index: usize,
    pub work_item_index: usize,
    pub phase: Phase,
    /// A run exists (started and not reset/completed).
    pub is_running: bool,
    /// The run exists but is not counting down.
    pub is_paused: bool,
    pub description: String,
    pub segment_name: String,
    pub total_segments: usize,
    pub total_work_items_in_segment: usize,
    /// Full length of the current phase, used for progress display.
    pub phase_duration: u32,
}

impl RunState {
    /// State right after binding `config`: Idle at segment 0, work item 0.
    ///
    /// `config` must already be validated.
    pub fn initial(config: &TimerConfiguration) -> Self {
        let first = config.segments.first();
        let time = first.map(|s| s.time).unwrap_or(0);
        Self {
            time_left: time,
            segment_index: 0,
            work_item_index: 0,
            phase: Phase::Idle,
            is_running: false,
            is_paused: false,
            description: first
                .and_then(|s| s.work.first())
                .cloned()
                .unwrap_or_default(),
            segment_name: first.map(|s| s.name.clone()).unwrap_or_default(),
            total_segments: config.segments.len(),
            total_work_items_in_segment: first.map(|s| s.work.len()).unwrap_or(0),
            phase_duration: time,
        }
    }

    /// Idle state carrying a human-readable reason the configuration was refused.
    pub fn invalid(reason: impl std::fmt::Display) -> Self {
        Self {
            description: format!("Invalid timer configuration: {reason}"),
            ..Self::unbound()
        }
    }

    /// Nothing bound yet.
    pub fn unbound() -> Self {
        Self {
            time_left: 0,
            segment_index: 0,
            work_item_index: 0,
            phase: Phase::Idle,
            is_running: false,
            is_paused: false,
            description: UNBOUND_TEXT.into(),
            segment_name: String::new(),
            total_segments: 0,
            total_work_items_in_segment: 0,
            phase_duration: 0,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.phase == Phase::Complete
    }

    /// Counting down right now.
    pub fn is_ticking(&self) -> bool {
        self.is_running && !self.is_paused && self.phase != Phase::Complete
    }

    pub fn elapsed_secs(&self) -> u32 {
        self.phase_duration.saturating_sub(self.time_left)
    }

    /// 0.0 .. 100.0 progress within the current phase.
    pub fn progress_pct(&self) -> f64 {
        if self.phase_duration == 0 {
            return 0.0;
        }
        (self.elapsed_secs() as f64 / self.phase_duration as f64 * 100.0).min(100.0)
    }

    /// `time_left` as `mm:ss`.
    pub fn time_left_display(&self) -> String {
        format_mm_ss(u64::from(self.time_left))
    }
}

/// Format seconds as `mm:ss`. Minutes are not wrapped into hours.
pub fn format_mm_ss(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

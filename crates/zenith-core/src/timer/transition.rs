//! Transition function.
//!
//! Computes the phase that follows the current one when its time runs out
//! (or a skip is requested). Pure: no clocks, no side effects.
//!
//! ## Decision table
//!
//! ```text
//! BetweenCyclesResting -> Working(segment 0, item 0)
//! SegmentResting       -> Working(next segment) | end of sequence
//! Working / Idle       -> Working(next item) | SegmentResting | Working(next segment) | end of sequence
//! end of sequence      -> Complete                      (repeat = false)
//!                      -> BetweenCyclesResting          (repeat, rest_between_sections > 0)
//!                      -> Working(segment 0, item 0)    (repeat, no rest)
//! ```

use serde::{Deserialize, Serialize};

use super::configuration::TimerConfiguration;
use super::state::{Phase, RunState, COMPLETE_TEXT, CYCLE_REST_NAME, CYCLE_REST_TEXT};

/// What kind of boundary a transition crossed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionKind {
    /// Next work item within the same segment.
    NextWorkItem,
    /// Work items exhausted; entering the segment's own rest.
    SegmentRest,
    /// First work item of the following segment.
    NextSegment,
    /// Every segment done; resting before the sequence repeats.
    CycleRest,
    /// Back at segment 0 for another pass.
    CycleRestart,
    /// Sequence finished (non-repeating only).
    Completed,
}

/// Apply one transition to `state`.
///
/// The running/paused flags are carried over unchanged, except that
/// reaching [`Phase::Complete`] clears both. Calling this on a state that is
/// already complete returns it unchanged.
pub fn advance(config: &TimerConfiguration, state: &RunState) -> (RunState, TransitionKind) {
    let mut next = state.clone();
    let kind = match state.phase {
        Phase::Complete => return (next, TransitionKind::Completed),
        Phase::BetweenCyclesResting => restart_cycle(config, &mut next),
        Phase::SegmentResting => enter_segment(config, &mut next, state.segment_index + 1),
        Phase::Working | Phase::Idle => match config.segments.get(state.segment_index) {
            Some(segment) if state.work_item_index + 1 < segment.work.len() => {
                enter_work(
                    config,
                    &mut next,
                    state.segment_index,
                    state.work_item_index + 1,
                );
                TransitionKind::NextWorkItem
            }
            Some(segment) if segment.rest > 0 => {
                next.phase = Phase::SegmentResting;
                next.time_left = segment.rest;
                next.phase_duration = segment.rest;
                next.description = segment.rest_string.clone();
                next.segment_name = segment.name.clone();
                next.total_work_items_in_segment = segment.work.len();
                TransitionKind::SegmentRest
            }
            _ => enter_segment(config, &mut next, state.segment_index + 1),
        },
    };
    tracing::debug!(
        ?kind,
        phase = ?next.phase,
        segment = next.segment_index,
        item = next.work_item_index,
        time_left = next.time_left,
        "phase transition"
    );
    (next, kind)
}

/// Move to the first work item of segment `index`, or finish the pass.
fn enter_segment(config: &TimerConfiguration, next: &mut RunState, index: usize) -> TransitionKind {
    if index < config.segments.len() && enter_work(config, next, index, 0) {
        TransitionKind::NextSegment
    } else {
        end_of_sequence(config, next)
    }
}

fn end_of_sequence(config: &TimerConfiguration, next: &mut RunState) -> TransitionKind {
    if !config.repeat {
        complete(next);
        return TransitionKind::Completed;
    }
    if config.rest_between_sections > 0 {
        next.phase = Phase::BetweenCyclesResting;
        next.segment_index = 0;
        next.work_item_index = 0;
        next.time_left = config.rest_between_sections;
        next.phase_duration = config.rest_between_sections;
        next.description = CYCLE_REST_TEXT.into();
        next.segment_name = CYCLE_REST_NAME.into();
        next.total_work_items_in_segment =
            config.segments.first().map(|s| s.work.len()).unwrap_or(0);
        return TransitionKind::CycleRest;
    }
    restart_cycle(config, next)
}

fn restart_cycle(config: &TimerConfiguration, next: &mut RunState) -> TransitionKind {
    if enter_work(config, next, 0, 0) {
        TransitionKind::CycleRestart
    } else {
        // Unreachable for validated configurations.
        complete(next);
        TransitionKind::Completed
    }
}

/// Point the cursor at a work item. Returns false if it does not exist.
fn enter_work(
    config: &TimerConfiguration,
    next: &mut RunState,
    segment_index: usize,
    work_item_index: usize,
) -> bool {
    let Some(segment) = config.segments.get(segment_index) else {
        return false;
    };
    let Some(item) = segment.work.get(work_item_index) else {
        return false;
    };
    next.phase = Phase::Working;
    next.segment_index = segment_index;
    next.work_item_index = work_item_index;
    next.time_left = segment.time;
    next.phase_duration = segment.time;
    next.description = item.clone();
    next.segment_name = segment.name.clone();
    next.total_segments = config.segments.len();
    next.total_work_items_in_segment = segment.work.len();
    true
}

fn complete(next: &mut RunState) {
    next.phase = Phase::Complete;
    next.is_running = false;
    next.is_paused = false;
    next.time_left = 0;
    next.description = COMPLETE_TEXT.into();
}

//! Sequencer: the control surface over one bound configuration.
//!
//! The sequencer does not sleep. It owns a single tick slot; whoever drives
//! time (the async [`TickDriver`](super::TickDriver), a test, a simulation)
//! asks for the armed [`TickHandle`] and fires it a second later. Any
//! mutation of `time_left` or phase re-arms the slot with a fresh handle, so
//! a tick scheduled against an older state is ignored.
//!
//! ## Usage
//!
//! ```ignore
//! let mut sequencer = Sequencer::new();
//! sequencer.bind(config)?;
//! sequencer.start();
//! // Once per second:
//! sequencer.tick(); // Returns Some(Event) on low time or a phase change
//! ```

use chrono::Utc;

use super::configuration::TimerConfiguration;
use super::state::{Phase, RunState};
use super::transition::{advance, TransitionKind};
use crate::error::ValidationError;
use crate::events::Event;
use crate::sinks::{SignalSink, SinkContext};

const NO_CONFIGURATION_TEXT: &str = "Cannot start: No configuration or segments.";

/// Seconds of a work phase during which each tick raises [`Event::LowTime`].
const LOW_TIME_WINDOW: std::ops::RangeInclusive<u32> = 2..=4;

/// Identifies one scheduled tick. Only the most recently armed handle fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TickHandle(u64);

pub struct Sequencer {
    configuration: Option<TimerConfiguration>,
    state: RunState,
    sinks: Vec<Box<dyn SignalSink>>,
    /// Set by start/resume, cleared by reset and rebinding.
    audio_permitted: bool,
    generation: u64,
    pending: Option<TickHandle>,
}

impl std::fmt::Debug for Sequencer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sequencer")
            .field("configuration", &self.configuration.as_ref().map(|c| &c.id))
            .field("state", &self.state)
            .field("sinks", &self.sinks.len())
            .field("audio_permitted", &self.audio_permitted)
            .field("pending", &self.pending)
            .finish()
    }
}

impl Default for Sequencer {
    fn default() -> Self {
        Self::new()
    }
}

impl Sequencer {
    /// Create an unbound sequencer with no sinks.
    pub fn new() -> Self {
        Self {
            configuration: None,
            state: RunState::unbound(),
            sinks: Vec::new(),
            audio_permitted: false,
            generation: 0,
            pending: None,
        }
    }

    pub fn with_sink(mut self, sink: impl SignalSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    pub fn add_sink(&mut self, sink: Box<dyn SignalSink>) {
        self.sinks.push(sink);
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub fn configuration(&self) -> Option<&TimerConfiguration> {
        self.configuration.as_ref()
    }

    pub fn audio_permitted(&self) -> bool {
        self.audio_permitted
    }

    /// The tick currently scheduled, if the sequencer is counting down.
    pub fn pending_tick(&self) -> Option<TickHandle> {
        self.pending
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        let s = &self.state;
        Event::StateSnapshot {
            phase: s.phase,
            is_running: s.is_running,
            is_paused: s.is_paused,
            segment_index: s.segment_index,
            work_item_index: s.work_item_index,
            segment_name: s.segment_name.clone(),
            description: s.description.clone(),
            time_left: s.time_left,
            time_left_display: s.time_left_display(),
            phase_duration: s.phase_duration,
            progress_pct: s.progress_pct(),
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Replace the configuration and return to its first phase.
    ///
    /// An invalid configuration leaves the sequencer unbound, with the
    /// reason in the run state's description.
    pub fn bind(&mut self, configuration: TimerConfiguration) -> Result<(), ValidationError> {
        self.pending = None;
        self.audio_permitted = false;
        if let Err(err) = configuration.validate() {
            tracing::warn!(id = %configuration.id, error = %err, "refusing timer configuration");
            self.configuration = None;
            self.state = RunState::invalid(&err);
            return Err(err);
        }
        self.state = RunState::initial(&configuration);
        let configuration_id = configuration.id.clone();
        self.configuration = Some(configuration);
        self.emit(Event::ConfigurationBound {
            configuration_id,
            at: Utc::now(),
        });
        Ok(())
    }

    /// Start counting down from the current cursor.
    ///
    /// From `Complete` this restarts at the first phase. On a paused run it
    /// behaves like [`resume`](Self::resume).
    pub fn start(&mut self) -> Option<Event> {
        let Some(configuration) = self.configuration.as_ref() else {
            self.state.description = NO_CONFIGURATION_TEXT.into();
            return None;
        };
        if self.state.is_running && self.state.is_paused {
            return self.resume();
        }
        if self.state.is_ticking() {
            return None; // Already running.
        }
        let restarted = self.state.is_complete();
        if restarted {
            self.state = RunState::initial(configuration);
        }
        if self.state.phase == Phase::Idle {
            self.state.phase = Phase::Working;
        }
        self.state.is_running = true;
        self.state.is_paused = false;
        let unlocks_audio = !self.audio_permitted;
        self.audio_permitted = true;
        self.rearm();

        let s = &self.state;
        let event = Event::TimerStarted {
            segment_index: s.segment_index,
            work_item_index: s.work_item_index,
            phase: s.phase,
            segment_name: s.segment_name.clone(),
            description: s.description.clone(),
            time_left: s.time_left,
            restarted,
            at: Utc::now(),
        };
        Some(self.emit_with(event, unlocks_audio))
    }

    /// Stop counting without moving the cursor. A second call is a no-op.
    pub fn pause(&mut self) -> Option<Event> {
        if !self.state.is_ticking() {
            return None;
        }
        self.state.is_paused = true;
        self.rearm();
        let event = Event::TimerPaused {
            time_left: self.state.time_left,
            at: Utc::now(),
        };
        Some(self.emit(event))
    }

    /// Continue counting from the exact `time_left` where the run paused.
    pub fn resume(&mut self) -> Option<Event> {
        if self.configuration.is_none() || self.state.is_complete() || !self.state.is_paused {
            return None;
        }
        self.state.is_paused = false;
        self.state.is_running = true;
        let unlocks_audio = !self.audio_permitted;
        self.audio_permitted = true;
        self.rearm();
        let event = Event::TimerResumed {
            time_left: self.state.time_left,
            at: Utc::now(),
        };
        Some(self.emit_with(event, unlocks_audio))
    }

    /// Stop and return to the state produced by `bind`.
    pub fn reset(&mut self) -> Option<Event> {
        self.pending = None;
        self.audio_permitted = false;
        self.state = match &self.configuration {
            Some(configuration) => RunState::initial(configuration),
            None => RunState::unbound(),
        };
        Some(self.emit(Event::TimerReset { at: Utc::now() }))
    }

    /// Expire the current phase immediately.
    ///
    /// Running/paused flags are preserved; a running sequencer keeps ticking
    /// on the new phase.
    pub fn skip(&mut self) -> Option<Event> {
        if self.configuration.is_none() || self.state.is_complete() {
            return None;
        }
        self.transition(true)
    }

    /// Advance by one second.
    ///
    /// Returns `Some(Event)` when a low-time warning fires or a phase ends.
    /// Does nothing unless running and unpaused.
    pub fn tick(&mut self) -> Option<Event> {
        if !self.state.is_ticking() {
            return None;
        }
        if self.state.time_left == 0 {
            return self.transition(false);
        }
        let before = self.state.time_left;
        self.state.time_left -= 1;
        if self.state.time_left == 0 {
            return self.transition(false);
        }
        self.rearm();
        if self.state.phase == Phase::Working && LOW_TIME_WINDOW.contains(&before) {
            let event = Event::LowTime {
                time_left: self.state.time_left,
                at: Utc::now(),
            };
            return Some(self.emit(event));
        }
        None
    }

    /// Fire a scheduled tick. Stale handles are ignored.
    pub fn fire(&mut self, handle: TickHandle) -> Option<Event> {
        if self.pending != Some(handle) {
            tracing::trace!(?handle, pending = ?self.pending, "ignoring stale tick");
            return None;
        }
        self.tick()
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Replace any scheduled tick with a fresh one, or cancel it.
    fn rearm(&mut self) {
        self.pending = if self.state.is_ticking() {
            self.generation += 1;
            Some(TickHandle(self.generation))
        } else {
            None
        };
    }

    fn transition(&mut self, skipped: bool) -> Option<Event> {
        let configuration = self.configuration.as_ref()?;
        let (next, kind) = advance(configuration, &self.state);
        let configuration_id = configuration.id.clone();
        self.state = next;
        self.rearm();

        let s = &self.state;
        let event = if kind == TransitionKind::Completed {
            tracing::info!(%configuration_id, skipped, "sequence complete");
            Event::SequenceCompleted {
                configuration_id,
                skipped,
                at: Utc::now(),
            }
        } else {
            Event::PhaseChanged {
                kind,
                phase: s.phase,
                segment_index: s.segment_index,
                work_item_index: s.work_item_index,
                segment_name: s.segment_name.clone(),
                description: s.description.clone(),
                duration_secs: s.phase_duration,
                skipped,
                at: Utc::now(),
            }
        };
        Some(self.emit(event))
    }

    /// Report an event to every sink. Sink failures are logged, never raised.
    fn emit(&mut self, event: Event) -> Event {
        self.emit_with(event, false)
    }

    fn emit_with(&mut self, event: Event, unlocks_audio: bool) -> Event {
        let ctx = SinkContext {
            audio_permitted: self.audio_permitted,
            unlocks_audio,
            configuration_name: self
                .configuration
                .as_ref()
                .map(|c| c.name.clone())
                .unwrap_or_default(),
        };
        for sink in &mut self.sinks {
            if let Err(err) = sink.on_event(&event, &ctx) {
                tracing::warn!(event = event.name(), error = %err, "signal sink failed");
            }
        }
        event
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SinkError;
    use crate::timer::configuration::TimerSegment;

    fn config(work: &[&str], time: u32, rest: u32) -> TimerConfiguration {
        TimerConfiguration {
            id: "t".into(),
            name: "Test".into(),
            description: String::new(),
            segments: vec![TimerSegment {
                name: "A".into(),
                work: work.iter().map(|w| w.to_string()).collect(),
                time,
                rest,
                rest_string: "Rest".into(),
            }],
            rest_between_sections: 0,
            repeat: false,
            is_custom: None,
        }
    }

    struct FailingSink;

    impl SignalSink for FailingSink {
        fn on_event(&mut self, _event: &Event, _ctx: &SinkContext) -> Result<(), SinkError> {
            Err(SinkError::AudioBlocked("no user gesture".into()))
        }
    }

    #[test]
    fn start_pause_resume() {
        let mut seq = Sequencer::new();
        seq.bind(config(&["a"], 10, 0)).unwrap();
        assert_eq!(seq.state().phase, Phase::Idle);

        assert!(matches!(seq.start(), Some(Event::TimerStarted { .. })));
        assert_eq!(seq.state().phase, Phase::Working);
        assert!(seq.state().is_running && !seq.state().is_paused);

        assert!(matches!(seq.pause(), Some(Event::TimerPaused { .. })));
        assert!(seq.state().is_running && seq.state().is_paused);
        assert!(seq.pending_tick().is_none());

        assert!(matches!(seq.resume(), Some(Event::TimerResumed { .. })));
        assert!(!seq.state().is_paused);
        assert!(seq.pending_tick().is_some());
    }

    #[test]
    fn start_without_configuration_explains_itself() {
        let mut seq = Sequencer::new();
        assert!(seq.start().is_none());
        assert_eq!(seq.state().description, NO_CONFIGURATION_TEXT);
        assert!(!seq.state().is_running);
    }

    #[test]
    fn invalid_configuration_is_refused() {
        let mut seq = Sequencer::new();
        let err = seq.bind(config(&[], 10, 0)).unwrap_err();
        assert!(matches!(err, ValidationError::EmptyWork { .. }));
        assert!(seq.configuration().is_none());
        assert_eq!(seq.state().phase, Phase::Idle);
        assert!(seq.state().description.contains("no work items"));
        assert!(seq.start().is_none());
    }

    #[test]
    fn stale_tick_handles_are_ignored() {
        let mut seq = Sequencer::new();
        seq.bind(config(&["a"], 10, 0)).unwrap();
        seq.start();
        let stale = seq.pending_tick().unwrap();
        seq.tick();
        assert_eq!(seq.state().time_left, 9);

        assert!(seq.fire(stale).is_none());
        assert_eq!(seq.state().time_left, 9);

        let current = seq.pending_tick().unwrap();
        assert_ne!(current, stale);
        seq.fire(current);
        assert_eq!(seq.state().time_left, 8);
    }

    #[test]
    fn pause_cancels_the_scheduled_tick() {
        let mut seq = Sequencer::new();
        seq.bind(config(&["a"], 10, 0)).unwrap();
        seq.start();
        let handle = seq.pending_tick().unwrap();
        seq.pause();
        seq.resume();
        assert!(seq.fire(handle).is_none());
        assert_eq!(seq.state().time_left, 10);
    }

    #[test]
    fn low_time_fires_only_while_working() {
        let mut seq = Sequencer::new();
        seq.bind(config(&["a"], 5, 5)).unwrap();
        seq.start();
        let work_events: Vec<_> = (0..5).map(|_| seq.tick()).collect();
        assert!(work_events[0].is_none());
        assert!(matches!(work_events[1], Some(Event::LowTime { time_left: 3, .. })));
        assert!(matches!(work_events[2], Some(Event::LowTime { time_left: 2, .. })));
        assert!(matches!(work_events[3], Some(Event::LowTime { time_left: 1, .. })));
        assert!(matches!(work_events[4], Some(Event::PhaseChanged { .. })));

        assert_eq!(seq.state().phase, Phase::SegmentResting);
        for _ in 0..4 {
            assert!(seq.tick().is_none());
        }
    }

    #[test]
    fn sink_failures_do_not_stop_the_run() {
        let mut seq = Sequencer::new().with_sink(FailingSink);
        seq.bind(config(&["a", "b"], 1, 0)).unwrap();
        assert!(seq.start().is_some());
        assert!(matches!(seq.tick(), Some(Event::PhaseChanged { .. })));
        assert_eq!(seq.state().description, "b");
    }

    #[test]
    fn audio_permission_follows_user_actions() {
        let mut seq = Sequencer::new();
        seq.bind(config(&["a"], 10, 0)).unwrap();
        assert!(!seq.audio_permitted());
        seq.start();
        assert!(seq.audio_permitted());
        seq.reset();
        assert!(!seq.audio_permitted());
        seq.start();
        seq.pause();
        assert!(seq.audio_permitted());
        seq.bind(config(&["b"], 10, 0)).unwrap();
        assert!(!seq.audio_permitted());
    }

    #[test]
    fn start_while_paused_resumes() {
        let mut seq = Sequencer::new();
        seq.bind(config(&["a"], 10, 0)).unwrap();
        seq.start();
        seq.tick();
        seq.pause();
        assert!(matches!(seq.start(), Some(Event::TimerResumed { time_left: 9, .. })));
    }

    #[test]
    fn start_after_complete_restarts() {
        let mut seq = Sequencer::new();
        seq.bind(config(&["a"], 1, 0)).unwrap();
        seq.start();
        assert!(matches!(seq.tick(), Some(Event::SequenceCompleted { .. })));
        assert!(seq.state().is_complete());
        assert!(seq.skip().is_none());
        assert!(seq.resume().is_none());

        match seq.start() {
            Some(Event::TimerStarted { restarted, .. }) => assert!(restarted),
            other => panic!("expected TimerStarted, got {other:?}"),
        }
        assert_eq!(seq.state().phase, Phase::Working);
        assert_eq!(seq.state().time_left, 1);
    }
}

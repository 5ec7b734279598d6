//! Side-effect sinks.
//!
//! The sequencer reports every [`Event`] to the sinks registered on it. The
//! sinks decide whether anything audible or visible happens: preference
//! gating and platform permission checks live here, never in the
//! transition logic.

use serde::{Deserialize, Serialize};

use crate::error::SinkError;
use crate::events::Event;
use crate::timer::TransitionKind;

/// Per-dispatch context supplied by the sequencer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SinkContext {
    /// Set once the user started or resumed the current run.
    /// Autonomous sounds are only allowed after that.
    pub audio_permitted: bool,
    /// This event is the start or resume that just permitted audio.
    pub unlocks_audio: bool,
    pub configuration_name: String,
}

/// Receives sequencer events.
pub trait SignalSink: Send {
    fn on_event(&mut self, event: &Event, ctx: &SinkContext) -> Result<(), SinkError>;
}

/// User preferences consulted by the sinks.
pub trait PreferenceSource: Send {
    fn sound_enabled(&self) -> bool;
    fn notifications_enabled(&self) -> bool;
}

/// Fixed preferences, for headless runs and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    pub sound_enabled: bool,
    pub notifications_enabled: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            sound_enabled: true,
            notifications_enabled: false,
        }
    }
}

impl PreferenceSource for Preferences {
    fn sound_enabled(&self) -> bool {
        self.sound_enabled
    }

    fn notifications_enabled(&self) -> bool {
        self.notifications_enabled
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoundCue {
    /// Short warning during the last seconds of a work item.
    Tick,
    SegmentEnd,
    SequenceComplete,
}

/// Plays sounds. Implemented by the presentation layer.
pub trait AudioPlayer: Send {
    fn play(&mut self, cue: SoundCue) -> Result<(), SinkError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationPermission {
    Granted,
    Denied,
    /// Never asked.
    Default,
}

/// Shows system notifications. Implemented by the presentation layer.
pub trait Notifier: Send {
    fn permission(&self) -> NotificationPermission;
    fn notify(&mut self, title: &str, body: &str) -> Result<(), SinkError>;
}

/// Maps events to sound cues, gated by the sound preference.
pub struct SoundSink<P, A> {
    preferences: P,
    player: A,
}

impl<P: PreferenceSource, A: AudioPlayer> SoundSink<P, A> {
    pub fn new(preferences: P, player: A) -> Self {
        Self {
            preferences,
            player,
        }
    }

    /// Which cue, if any, an event calls for.
    pub fn cue_for(event: &Event, ctx: &SinkContext) -> Option<SoundCue> {
        match event {
            Event::TimerStarted { .. } | Event::TimerResumed { .. } if ctx.unlocks_audio => {
                Some(SoundCue::SegmentEnd)
            }
            Event::PhaseChanged { .. } => Some(SoundCue::SegmentEnd),
            Event::SequenceCompleted { .. } => Some(SoundCue::SequenceComplete),
            Event::LowTime { .. } if ctx.audio_permitted => Some(SoundCue::Tick),
            _ => None,
        }
    }
}

impl<P: PreferenceSource, A: AudioPlayer> SignalSink for SoundSink<P, A> {
    fn on_event(&mut self, event: &Event, ctx: &SinkContext) -> Result<(), SinkError> {
        if !self.preferences.sound_enabled() {
            return Ok(());
        }
        match Self::cue_for(event, ctx) {
            Some(cue) => self.player.play(cue),
            None => Ok(()),
        }
    }
}

/// Maps events to notification text, gated by preference and permission.
pub struct NotificationSink<P, N> {
    preferences: P,
    notifier: N,
}

impl<P: PreferenceSource, N: Notifier> NotificationSink<P, N> {
    pub fn new(preferences: P, notifier: N) -> Self {
        Self {
            preferences,
            notifier,
        }
    }

    /// Title and body for an event, if it warrants a notification.
    pub fn message_for(event: &Event, ctx: &SinkContext) -> Option<(String, String)> {
        match event {
            Event::TimerStarted {
                segment_name,
                description,
                ..
            } => Some((format!("Starting: {segment_name}"), description.clone())),
            Event::PhaseChanged {
                kind,
                segment_name,
                description,
                ..
            } => match kind {
                TransitionKind::NextWorkItem | TransitionKind::NextSegment => {
                    Some((format!("Starting: {segment_name}"), description.clone()))
                }
                TransitionKind::SegmentRest => Some((
                    format!("{segment_name} Complete"),
                    format!("Now: {description}"),
                )),
                TransitionKind::CycleRest => Some((
                    "Sequence Complete".to_string(),
                    "Rest before repeating.".to_string(),
                )),
                TransitionKind::CycleRestart => {
                    Some((format!("Repeating: {segment_name}"), description.clone()))
                }
                TransitionKind::Completed => None,
            },
            Event::SequenceCompleted { .. } => Some((
                "Timer Finished!".to_string(),
                format!("{} sequence is complete.", ctx.configuration_name),
            )),
            _ => None,
        }
    }
}

impl<P: PreferenceSource, N: Notifier> SignalSink for NotificationSink<P, N> {
    fn on_event(&mut self, event: &Event, ctx: &SinkContext) -> Result<(), SinkError> {
        if !self.preferences.notifications_enabled()
            || self.notifier.permission() != NotificationPermission::Granted
        {
            return Ok(());
        }
        match Self::message_for(event, ctx) {
            Some((title, body)) => self.notifier.notify(&title, &body),
            None => Ok(()),
        }
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl SignalSink for NullSink {
    fn on_event(&mut self, _event: &Event, _ctx: &SinkContext) -> Result<(), SinkError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::Phase;
    use chrono::Utc;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct FakePlayer(Arc<Mutex<Vec<SoundCue>>>);

    impl AudioPlayer for FakePlayer {
        fn play(&mut self, cue: SoundCue) -> Result<(), SinkError> {
            self.0.lock().unwrap().push(cue);
            Ok(())
        }
    }

    #[derive(Clone)]
    struct FakeNotifier {
        permission: NotificationPermission,
        sent: Arc<Mutex<Vec<(String, String)>>>,
    }

    impl Notifier for FakeNotifier {
        fn permission(&self) -> NotificationPermission {
            self.permission
        }

        fn notify(&mut self, title: &str, body: &str) -> Result<(), SinkError> {
            self.sent.lock().unwrap().push((title.into(), body.into()));
            Ok(())
        }
    }

    fn phase_changed(kind: TransitionKind) -> Event {
        Event::PhaseChanged {
            kind,
            phase: Phase::SegmentResting,
            segment_index: 0,
            work_item_index: 0,
            segment_name: "Lower Body".into(),
            description: "Short rest".into(),
            duration_secs: 15,
            skipped: false,
            at: Utc::now(),
        }
    }

    fn low_time() -> Event {
        Event::LowTime {
            time_left: 3,
            at: Utc::now(),
        }
    }

    #[test]
    fn low_time_cue_needs_audio_permission() {
        let player = FakePlayer::default();
        let mut sink = SoundSink::new(Preferences::default(), player.clone());
        let locked = SinkContext::default();
        let unlocked = SinkContext {
            audio_permitted: true,
            ..SinkContext::default()
        };

        sink.on_event(&low_time(), &locked).unwrap();
        assert!(player.0.lock().unwrap().is_empty());

        sink.on_event(&low_time(), &unlocked).unwrap();
        assert_eq!(*player.0.lock().unwrap(), vec![SoundCue::Tick]);
    }

    #[test]
    fn start_and_resume_cue_only_when_unlocking() {
        let started = Event::TimerStarted {
            segment_index: 0,
            work_item_index: 0,
            phase: Phase::Working,
            segment_name: "Warm-up".into(),
            description: "Jumping Jacks (30s)".into(),
            time_left: 30,
            restarted: false,
            at: Utc::now(),
        };
        let resumed = Event::TimerResumed {
            time_left: 12,
            at: Utc::now(),
        };
        let unlocking = SinkContext {
            audio_permitted: true,
            unlocks_audio: true,
            ..SinkContext::default()
        };
        let already = SinkContext {
            audio_permitted: true,
            ..SinkContext::default()
        };

        type Sink = SoundSink<Preferences, FakePlayer>;
        assert_eq!(Sink::cue_for(&started, &unlocking), Some(SoundCue::SegmentEnd));
        assert_eq!(Sink::cue_for(&resumed, &unlocking), Some(SoundCue::SegmentEnd));
        assert_eq!(Sink::cue_for(&started, &already), None);
        assert_eq!(Sink::cue_for(&resumed, &already), None);
    }

    #[test]
    fn sound_preference_silences_everything() {
        let player = FakePlayer::default();
        let prefs = Preferences {
            sound_enabled: false,
            notifications_enabled: false,
        };
        let mut sink = SoundSink::new(prefs, player.clone());
        sink.on_event(&phase_changed(TransitionKind::SegmentRest), &SinkContext::default())
            .unwrap();
        assert!(player.0.lock().unwrap().is_empty());
    }

    #[test]
    fn segment_rest_notification_text() {
        let ctx = SinkContext::default();
        let (title, body) = NotificationSink::<Preferences, FakeNotifier>::message_for(
            &phase_changed(TransitionKind::SegmentRest),
            &ctx,
        )
        .unwrap();
        assert_eq!(title, "Lower Body Complete");
        assert_eq!(body, "Now: Short rest");
    }

    #[test]
    fn completion_notification_names_configuration() {
        let ctx = SinkContext {
            audio_permitted: true,
            configuration_name: "Quick Full Body Workout".into(),
            ..SinkContext::default()
        };
        let event = Event::SequenceCompleted {
            configuration_id: "basic-workout".into(),
            skipped: false,
            at: Utc::now(),
        };
        let (title, body) =
            NotificationSink::<Preferences, FakeNotifier>::message_for(&event, &ctx).unwrap();
        assert_eq!(title, "Timer Finished!");
        assert_eq!(body, "Quick Full Body Workout sequence is complete.");
    }

    #[test]
    fn notifications_require_preference_and_permission() {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let enabled = Preferences {
            sound_enabled: true,
            notifications_enabled: true,
        };
        let event = phase_changed(TransitionKind::CycleRest);

        let mut denied = NotificationSink::new(
            enabled,
            FakeNotifier {
                permission: NotificationPermission::Denied,
                sent: sent.clone(),
            },
        );
        denied.on_event(&event, &SinkContext::default()).unwrap();
        assert!(sent.lock().unwrap().is_empty());

        let mut disabled = NotificationSink::new(
            Preferences::default(),
            FakeNotifier {
                permission: NotificationPermission::Granted,
                sent: sent.clone(),
            },
        );
        disabled.on_event(&event, &SinkContext::default()).unwrap();
        assert!(sent.lock().unwrap().is_empty());

        let mut granted = NotificationSink::new(
            enabled,
            FakeNotifier {
                permission: NotificationPermission::Granted,
                sent: sent.clone(),
            },
        );
        granted.on_event(&event, &SinkContext::default()).unwrap();
        assert_eq!(
            *sent.lock().unwrap(),
            vec![(
                "Sequence Complete".to_string(),
                "Rest before repeating.".to_string()
            )]
        );
    }
}

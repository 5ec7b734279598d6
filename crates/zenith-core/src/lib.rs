//! # Zenith Core Library
//!
//! This library provides the core logic for the Zenith segment timer. A
//! timer configuration is an ordered list of segments, each made of timed
//! work items and an optional rest, optionally repeating with a rest between
//! cycles. The library drives a single countdown through it.
//!
//! ## Architecture
//!
//! - **Transition function**: pure `advance(config, state)` computing the
//!   next phase when the current one expires
//! - **Sequencer**: the start/pause/resume/reset/skip control surface. It
//!   owns the run state and a single cancellable tick slot
//! - **Tick driver**: a tokio task that fires the armed tick once per second
//! - **Sinks**: sound and notification side effects behind narrow traits
//! - **Storage**: TOML preferences and a JSON template store
//!
//! ## Key Components
//!
//! - [`Sequencer`]: Core timer state machine
//! - [`TickDriver`]: Async one-second scheduler
//! - [`TemplateStore`]: Built-in and custom timer configurations
//! - [`Config`]: Application configuration management

pub mod error;
pub mod events;
pub mod sinks;
pub mod storage;
pub mod timer;

pub use error::{ConfigError, CoreError, SinkError, StorageError, ValidationError};
pub use events::Event;
pub use sinks::{
    AudioPlayer, NotificationPermission, NotificationSink, Notifier, NullSink, PreferenceSource,
    Preferences, SignalSink, SinkContext, SoundCue, SoundSink,
};
pub use storage::{Config, ConfigurationSource, TemplateStore};
pub use timer::{
    advance, Phase, RunState, Sequencer, TickDriver, TimerConfiguration, TimerSegment,
    TransitionKind,
};

mod configuration;
mod driver;
mod sequencer;
mod state;
mod transition;

pub use configuration::{TimerConfiguration, TimerSegment};
pub use driver::{TickDriver, Update, DEFAULT_TICK_INTERVAL};
pub use sequencer::{Sequencer, TickHandle};
pub use state::{format_mm_ss, Phase, RunState};
pub use transition::{advance, TransitionKind};

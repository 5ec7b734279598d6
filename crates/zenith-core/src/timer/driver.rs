//! Async tick driver.
//!
//! A single tokio task owns the [`Sequencer`] and is the only thing that
//! touches it. It waits on either the next control command or the deadline
//! of the one armed tick, so there is never more than one pending tick and
//! commands never interleave with a transition.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

use super::configuration::TimerConfiguration;
use super::sequencer::{Sequencer, TickHandle};
use super::state::RunState;
use crate::error::{CoreError, Result};
use crate::events::Event;

pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

enum Command {
    Bind(
        TimerConfiguration,
        oneshot::Sender<std::result::Result<(), crate::error::ValidationError>>,
    ),
    Start,
    Pause,
    Resume,
    Reset,
    Skip,
    Shutdown,
}

/// Published after every command and every fired tick.
#[derive(Debug, Clone)]
pub struct Update {
    pub event: Option<Event>,
    pub state: RunState,
}

/// Handle to the driver task.
///
/// Fired ticks are scheduled one interval after the previous deadline, not
/// after the moment they ran. If the process stalls, every missed tick fires
/// back to back on wake-up, along with the sink signals of any transitions.
pub struct TickDriver {
    commands: mpsc::UnboundedSender<Command>,
    task: JoinHandle<Sequencer>,
}

impl TickDriver {
    /// Spawn the driver on the current tokio runtime.
    ///
    /// Returns the handle and the stream of updates for display.
    pub fn spawn(
        sequencer: Sequencer,
        tick_interval: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<Update>) {
        let (commands, command_rx) = mpsc::unbounded_channel();
        let (update_tx, updates) = mpsc::unbounded_channel();
        let task = tokio::spawn(drive(sequencer, command_rx, update_tx, tick_interval));
        (Self { commands, task }, updates)
    }

    /// Bind a configuration and wait for the result.
    pub async fn bind(&self, configuration: TimerConfiguration) -> Result<()> {
        let (reply, response) = oneshot::channel();
        self.send(Command::Bind(configuration, reply))?;
        response.await.map_err(|_| CoreError::DriverStopped)??;
        Ok(())
    }

    pub fn start(&self) -> Result<()> {
        self.send(Command::Start)
    }

    pub fn pause(&self) -> Result<()> {
        self.send(Command::Pause)
    }

    pub fn resume(&self) -> Result<()> {
        self.send(Command::Resume)
    }

    pub fn reset(&self) -> Result<()> {
        self.send(Command::Reset)
    }

    pub fn skip(&self) -> Result<()> {
        self.send(Command::Skip)
    }

    /// Stop the task and hand the sequencer back.
    pub async fn shutdown(self) -> Result<Sequencer> {
        // The task may already be gone if the update receiver was dropped.
        let _ = self.commands.send(Command::Shutdown);
        self.task
            .await
            .map_err(|e| CoreError::Custom(format!("timer driver task failed: {e}")))
    }

    fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| CoreError::DriverStopped)
    }
}

async fn drive(
    mut sequencer: Sequencer,
    mut commands: mpsc::UnboundedReceiver<Command>,
    updates: mpsc::UnboundedSender<Update>,
    tick_interval: Duration,
) -> Sequencer {
    let mut armed: Option<(TickHandle, Instant)> = None;

    loop {
        // Follow the sequencer's tick slot: keep the deadline for the same
        // handle, schedule a fresh second for a new one, drop it when disarmed.
        armed = match (sequencer.pending_tick(), armed) {
            (Some(handle), Some((current, at))) if handle == current => Some((current, at)),
            (Some(handle), _) => Some((handle, Instant::now() + tick_interval)),
            (None, _) => None,
        };
        let deadline = armed.map(|(_, at)| at);

        let event = tokio::select! {
            command = commands.recv() => match command {
                None | Some(Command::Shutdown) => break,
                Some(Command::Bind(configuration, reply)) => {
                    let result = sequencer.bind(configuration);
                    let _ = reply.send(result);
                    None
                }
                Some(Command::Start) => sequencer.start(),
                Some(Command::Pause) => sequencer.pause(),
                Some(Command::Resume) => sequencer.resume(),
                Some(Command::Reset) => sequencer.reset(),
                Some(Command::Skip) => sequencer.skip(),
            },
            _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                let Some((handle, at)) = armed else { continue };
                let event = sequencer.fire(handle);
                // Chain from the previous deadline so ticks do not drift.
                armed = sequencer.pending_tick().map(|next| (next, at + tick_interval));
                event
            }
        };

        let update = Update {
            event,
            state: sequencer.state().clone(),
        };
        if updates.send(update).is_err() {
            tracing::debug!("update receiver dropped, stopping timer driver");
            break;
        }
    }

    sequencer
}

use std::io::Write;
use std::time::Duration;

use clap::Subcommand;
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use zenith_core::timer::{format_mm_ss, Update};
use zenith_core::{
    advance, Config, Event, NotificationSink, Phase, RunState, Sequencer, SoundSink,
    TemplateStore, TickDriver, TimerConfiguration, TransitionKind,
};

use crate::sinks::{ConsoleNotifier, TerminalBell};

const CONTROLS_HELP: &str = "controls: p=pause r=resume s=skip x=reset g=start q=quit";

#[derive(Subcommand)]
pub enum TimerAction {
    /// Run a timer in the terminal
    Run {
        /// Template ID (defaults to timer.default_template)
        id: Option<String>,
        /// Do not read controls from stdin
        #[arg(long)]
        no_input: bool,
        /// Print events as JSON lines instead of a status line
        #[arg(long)]
        json: bool,
    },
    /// Print the phase sequence of a template
    Plan {
        /// Template ID
        id: String,
        /// Passes to list for repeating templates
        #[arg(long, default_value = "1")]
        cycles: u32,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Advance a template by a number of seconds without waiting
    Simulate {
        /// Template ID
        id: String,
        /// Seconds to tick through
        #[arg(long)]
        seconds: u64,
        /// Print the final state as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    let store = TemplateStore::open()?;

    match action {
        TimerAction::Run { id, no_input, json } => {
            let config = Config::load_or_default();
            let id = id.unwrap_or_else(|| config.timer.default_template.clone());
            let configuration = store.get(&id)?;
            let preferences = config.preferences();
            let sequencer = Sequencer::new()
                .with_sink(SoundSink::new(preferences, TerminalBell))
                .with_sink(NotificationSink::new(preferences, ConsoleNotifier));

            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            let result = runtime.block_on(run_interactive(
                sequencer,
                configuration,
                config.tick_interval(),
                RunOptions {
                    read_input: !no_input,
                    json,
                    show_progress: config.display.show_progress,
                },
            ));
            // A pending stdin read would otherwise hold the runtime open.
            runtime.shutdown_background();
            result?;
        }
        TimerAction::Plan { id, cycles, json } => {
            let configuration = store.get(&id)?;
            let rows = plan(&configuration, cycles);
            if json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                for row in &rows {
                    println!(
                        "{}  c{}  {:<10} {:<20} {}  {}",
                        format_mm_ss(row.starts_at),
                        row.cycle,
                        row.phase.label(),
                        row.segment_name,
                        format_mm_ss(u64::from(row.duration_secs)),
                        row.description,
                    );
                }
            }
        }
        TimerAction::Simulate { id, seconds, json } => {
            let configuration = store.get(&id)?;
            let mut sequencer = Sequencer::new();
            sequencer.bind(configuration)?;
            sequencer.start();

            let mut transitions = 0u64;
            for _ in 0..seconds {
                if sequencer.state().is_complete() {
                    break;
                }
                if let Some(Event::PhaseChanged { .. } | Event::SequenceCompleted { .. }) =
                    sequencer.tick()
                {
                    transitions += 1;
                }
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&sequencer.snapshot())?);
            } else {
                println!("{}", status_line(sequencer.state(), true));
                println!("transitions: {transitions}");
            }
        }
    }
    Ok(())
}

/// A control typed on stdin during `timer run`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Control {
    Pause,
    Resume,
    Skip,
    Reset,
    Start,
    Quit,
}

impl Control {
    fn parse(input: &str) -> Option<Self> {
        match input {
            "p" | "pause" => Some(Self::Pause),
            "r" | "resume" => Some(Self::Resume),
            "s" | "skip" => Some(Self::Skip),
            "x" | "reset" => Some(Self::Reset),
            "g" | "start" => Some(Self::Start),
            "q" | "quit" => Some(Self::Quit),
            _ => None,
        }
    }
}

struct RunOptions {
    read_input: bool,
    json: bool,
    show_progress: bool,
}

async fn run_interactive(
    sequencer: Sequencer,
    configuration: TimerConfiguration,
    tick_interval: Duration,
    options: RunOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let (driver, mut updates) = TickDriver::spawn(sequencer, tick_interval);
    driver.bind(configuration).await?;
    driver.start()?;
    if options.read_input && !options.json {
        eprintln!("{CONTROLS_HELP}");
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut input_open = options.read_input;

    loop {
        tokio::select! {
            update = updates.recv() => {
                let Some(update) = update else { break };
                render(&update, &options)?;
                if matches!(update.event, Some(Event::SequenceCompleted { .. })) {
                    break;
                }
            }
            line = lines.next_line(), if input_open => {
                let Some(line) = line? else {
                    input_open = false;
                    continue;
                };
                let input = line.trim();
                if input.is_empty() {
                    continue;
                }
                let Some(control) = Control::parse(input) else {
                    eprintln!("unknown control '{input}'; {CONTROLS_HELP}");
                    continue;
                };
                tracing::debug!(?control, "timer control");
                match control {
                    Control::Pause => driver.pause()?,
                    Control::Resume => driver.resume()?,
                    Control::Skip => driver.skip()?,
                    Control::Reset => driver.reset()?,
                    Control::Start => driver.start()?,
                    Control::Quit => break,
                }
            }
        }
    }

    driver.shutdown().await?;
    Ok(())
}

fn render(update: &Update, options: &RunOptions) -> Result<(), Box<dyn std::error::Error>> {
    let mut out = std::io::stdout();
    if options.json {
        if let Some(event) = &update.event {
            writeln!(out, "{}", serde_json::to_string(event)?)?;
        }
        return Ok(());
    }

    let line = status_line(&update.state, options.show_progress);
    match &update.event {
        None | Some(Event::LowTime { .. }) => write!(out, "\r\x1b[K{line}")?,
        Some(_) => writeln!(out, "\r\x1b[K{line}")?,
    }
    out.flush()?;
    Ok(())
}

fn status_line(state: &RunState, show_progress: bool) -> String {
    let position = match state.phase {
        Phase::Idle | Phase::Working => format!(
            " {}/{}",
            state.work_item_index + 1,
            state.total_work_items_in_segment
        ),
        _ => String::new(),
    };
    let progress = if show_progress {
        format!(" {:>3.0}%", state.progress_pct())
    } else {
        String::new()
    };
    let paused = if state.is_paused { " (paused)" } else { "" };
    format!(
        "[{}] {}{} {}{} | {}{}",
        state.phase.label(),
        state.segment_name,
        position,
        state.time_left_display(),
        progress,
        state.description,
        paused,
    )
}

/// One phase in a template's schedule.
#[derive(Debug, Serialize)]
struct PlanRow {
    cycle: u32,
    /// Offset from the start of the run, in seconds.
    starts_at: u64,
    phase: Phase,
    segment_name: String,
    description: String,
    duration_secs: u32,
}

impl PlanRow {
    fn new(cycle: u32, starts_at: u64, state: &RunState) -> Self {
        Self {
            cycle,
            starts_at,
            phase: state.phase,
            segment_name: state.segment_name.clone(),
            description: state.description.clone(),
            duration_secs: state.phase_duration,
        }
    }
}

/// Walk the transition function from the first phase.
///
/// Stops at completion, or after `cycles` passes of a repeating template.
fn plan(configuration: &TimerConfiguration, cycles: u32) -> Vec<PlanRow> {
    let cycles = cycles.max(1);
    let mut state = RunState::initial(configuration);
    state.phase = Phase::Working;

    let mut cycle = 1;
    let mut starts_at = 0u64;
    let mut rows = vec![PlanRow::new(cycle, starts_at, &state)];
    loop {
        let (next, kind) = advance(configuration, &state);
        match kind {
            TransitionKind::Completed => break,
            TransitionKind::CycleRestart => {
                cycle += 1;
                if cycle > cycles {
                    break;
                }
            }
            _ => {}
        }
        starts_at += state.phase_duration as u64;
        rows.push(PlanRow::new(cycle, starts_at, &next));
        state = next;
    }
    rows
}

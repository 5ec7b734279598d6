//! Terminal implementations of the core's audio and notification traits.

use std::io::{IsTerminal, Write};

use zenith_core::{AudioPlayer, NotificationPermission, Notifier, SinkError, SoundCue};

/// Rings the terminal bell.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalBell;

impl AudioPlayer for TerminalBell {
    fn play(&mut self, cue: SoundCue) -> Result<(), SinkError> {
        let rings = match cue {
            SoundCue::Tick | SoundCue::SegmentEnd => 1,
            SoundCue::SequenceComplete => 3,
        };
        let mut stderr = std::io::stderr();
        stderr
            .write_all("\x07".repeat(rings).as_bytes())
            .and_then(|_| stderr.flush())
            .map_err(|e| SinkError::AudioBlocked(e.to_string()))
    }
}

/// Prints notifications to stderr. Only granted when stderr is a terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn permission(&self) -> NotificationPermission {
        if std::io::stderr().is_terminal() {
            NotificationPermission::Granted
        } else {
            NotificationPermission::Denied
        }
    }

    fn notify(&mut self, title: &str, body: &str) -> Result<(), SinkError> {
        writeln!(std::io::stderr(), "[notice] {title}: {body}")
            .map_err(|e| SinkError::NotificationFailed(e.to_string()))
    }
}

use std::io::{self, IsTerminal, Write};

use services::{NotifyError, ReminderNotifier};

/// Reminder effects for a terminal session.
///
/// The tab indicator maps to the terminal window title, notifications to a
/// line on stdout, and the tone to the terminal bell.
pub struct TerminalNotifier;

impl TerminalNotifier {
    fn write_to(mut out: impl Write, bytes: &[u8]) -> Result<(), NotifyError> {
        out.write_all(bytes)
            .and_then(|()| out.flush())
            .map_err(|err| NotifyError::Failed(err.to_string()))
    }
}

impl ReminderNotifier for TerminalNotifier {
    fn flash_tab(&self, message: &str) -> Result<(), NotifyError> {
        let stderr = io::stderr();
        if !stderr.is_terminal() {
            return Err(NotifyError::Unsupported);
        }
        // OSC 0 sets the window title.
        Self::write_to(stderr.lock(), format!("\x1b]0;{message}\x07").as_bytes())
    }

    fn show_notification(&self, title: &str, body: &str) -> Result<(), NotifyError> {
        Self::write_to(io::stdout().lock(), format!("{title}: {body}\n").as_bytes())
    }

    fn play_tone(&self) -> Result<(), NotifyError> {
        let stderr = io::stderr();
        if !stderr.is_terminal() {
            return Err(NotifyError::Unsupported);
        }
        Self::write_to(stderr.lock(), b"\x07")
    }
}

use std::io::{IsTerminal as _, Write as _};

use crossterm::event::{read, Event};
use crossterm::style::Stylize as _;

use pslaunch_core::error::LaunchError;
use pslaunch_core::report::Severity;

/// Severity-colored error line plus hint, on stderr. Color only when stderr
/// is a real terminal.
pub fn render_error(err: &LaunchError) {
    let label = err.severity().as_str();
    if std::io::stderr().is_terminal() {
        let styled = match err.severity() {
            Severity::Info => label.cyan(),
            Severity::Warning => label.yellow().bold(),
            Severity::Error => label.red().bold(),
        };
        eprintln!("{styled}: {err}");
    } else {
        eprintln!("{label}: {err}");
    }
    if let Some(hint) = err.hint() {
        eprintln!("hint: {hint}");
    }
}

/// Hold the console open so a double-click user can read the message before
/// the window closes. Skipped when stdin is not interactive.
pub fn pause_for_key() {
    if !std::io::stdin().is_terminal() {
        return;
    }
    eprint!("Press any key to exit...");
    let _ = std::io::stderr().flush();
    let _ = wait_for_key();
    eprintln!();
}

fn wait_for_key() -> std::io::Result<()> {
    crossterm::terminal::enable_raw_mode()?;
    let result = loop {
        match read() {
            Ok(Event::Key(_)) => break Ok(()),
            Ok(_) => continue,
            Err(err) => break Err(err),
        }
    };
    let _ = crossterm::terminal::disable_raw_mode();
    result
}

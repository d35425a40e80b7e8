use std::fmt;

/// How a failure should read to the user. Rendering (color, glyphs) is the
/// binary's job; the core only classifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stage-progress sink. Progress lines go to stderr so `--json` keeps stdout
/// machine-clean.
#[derive(Debug, Clone, Copy, Default)]
pub struct Reporter {
    pub json: bool,
    pub quiet: bool,
}

impl Reporter {
    pub fn progress(&self, msg: &str) {
        if self.json || self.quiet {
            return;
        }
        eprintln!("{msg}");
    }

    pub fn warn(&self, msg: &str) {
        if self.json {
            return;
        }
        eprintln!("warning: {msg}");
    }
}

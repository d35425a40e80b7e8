use std::fmt;

use crate::report::Severity;

/// Every way a launch can fail, as an explicit outcome rather than a bare
/// process exit. `Unexpected` is the top-level boundary for anything the
/// other variants did not anticipate.
#[derive(Debug)]
pub enum LaunchError {
    PayloadNotFound { detail: String },
    RuntimeNotFound { program: String },
    InstallFailed { detail: String },
    RuntimeUnlaunchable { program: String, detail: String },
    Unexpected(anyhow::Error),
}

impl LaunchError {
    /// Stable machine-readable code carried in JSON reports.
    pub fn code(&self) -> &'static str {
        match self {
            LaunchError::PayloadNotFound { .. } => "PAYLOAD_NOT_FOUND",
            LaunchError::RuntimeNotFound { .. } => "RUNTIME_NOT_FOUND",
            LaunchError::InstallFailed { .. } => "INSTALL_FAILED",
            LaunchError::RuntimeUnlaunchable { .. } => "RUNTIME_UNLAUNCHABLE",
            LaunchError::Unexpected(_) => "UNEXPECTED",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            // Recoverable: the install stage (or the user) can fix this.
            LaunchError::RuntimeNotFound { .. } => Severity::Warning,
            _ => Severity::Error,
        }
    }

    pub fn hint(&self) -> Option<String> {
        match self {
            LaunchError::PayloadNotFound { .. } => Some(
                "restore the payload script next to the launcher, or use a build that embeds one"
                    .to_string(),
            ),
            LaunchError::RuntimeNotFound { program } => Some(format!(
                "install PowerShell 7 ({program}) manually: https://github.com/PowerShell/PowerShell/releases"
            )),
            LaunchError::InstallFailed { .. } => Some(
                "install PowerShell 7 manually: https://github.com/PowerShell/PowerShell/releases"
                    .to_string(),
            ),
            LaunchError::RuntimeUnlaunchable { .. } => Some(
                "if the runtime was just installed, PATH may still be stale; restart the terminal and retry"
                    .to_string(),
            ),
            LaunchError::Unexpected(_) => None,
        }
    }
}

impl fmt::Display for LaunchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LaunchError::PayloadNotFound { detail } => {
                write!(f, "payload not found: {detail}")
            }
            LaunchError::RuntimeNotFound { program } => {
                write!(f, "required runtime {program:?} was not found")
            }
            LaunchError::InstallFailed { detail } => {
                write!(f, "runtime install failed: {detail}")
            }
            LaunchError::RuntimeUnlaunchable { program, detail } => {
                write!(f, "could not start runtime {program:?}: {detail}")
            }
            LaunchError::Unexpected(err) => write!(f, "unexpected failure: {err:#}"),
        }
    }
}

impl std::error::Error for LaunchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LaunchError::Unexpected(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<anyhow::Error> for LaunchError {
    fn from(err: anyhow::Error) -> Self {
        LaunchError::Unexpected(err)
    }
}

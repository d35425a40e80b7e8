use std::io;
use std::process::{Command, ExitStatus};

use crate::command::BootstrapCommand;
use crate::error::LaunchError;

/// Terminal state of the supervised child. "Could not start" is the
/// mutually-exclusive [`LaunchError::RuntimeUnlaunchable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessOutcome {
    pub exit_code: i32,
}

impl ProcessOutcome {
    pub fn success(self) -> bool {
        self.exit_code == 0
    }
}

/// Launch the command with the console inherited (the payload is
/// interactive), block until it exits, and surface its exit code unmodified.
/// The payload's own failures are opaque to the launcher.
pub fn run(cmd: &BootstrapCommand) -> Result<ProcessOutcome, LaunchError> {
    let mut child = Command::new(&cmd.program);
    child.args(&cmd.args);
    if let Some(dir) = &cmd.cwd {
        child.current_dir(dir);
    }
    let status = match child.status() {
        Ok(status) => status,
        Err(err) => {
            return Err(LaunchError::RuntimeUnlaunchable {
                program: cmd.program.to_string_lossy().into_owned(),
                detail: describe_spawn_error(&err),
            })
        }
    };
    Ok(ProcessOutcome {
        exit_code: exit_code_of(status),
    })
}

fn describe_spawn_error(err: &io::Error) -> String {
    if err.kind() == io::ErrorKind::NotFound {
        "executable not found".to_string()
    } else {
        err.to_string()
    }
}

fn exit_code_of(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    // Out-of-band termination (the user killing the payload) still surfaces
    // as a meaningful code: the shell convention for signal deaths.
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt as _;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}

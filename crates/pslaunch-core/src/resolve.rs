use std::path::PathBuf;
use std::process::{Command, Stdio};

use crate::config::RuntimeSpec;

/// Where the runtime turned out to be, if anywhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeLocation {
    NotFound,
    /// Reachable by bare name via the search path.
    PathName(String),
    /// Only present at the well-known install location.
    AbsolutePath(PathBuf),
}

impl RuntimeLocation {
    pub fn is_not_found(&self) -> bool {
        matches!(self, RuntimeLocation::NotFound)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            RuntimeLocation::NotFound => "not-found",
            RuntimeLocation::PathName(_) => "path-name",
            RuntimeLocation::AbsolutePath(_) => "absolute-path",
        }
    }

    pub fn describe(&self) -> String {
        match self {
            RuntimeLocation::NotFound => "not found".to_string(),
            RuntimeLocation::PathName(name) => format!("{name} (on PATH)"),
            RuntimeLocation::AbsolutePath(path) => path.display().to_string(),
        }
    }
}

/// Probe the search path, then the fallback install location.
///
/// "Reachable" means the probe process started at all; a runtime that starts
/// and exits non-zero is still a runtime we can hand the payload to.
pub fn resolve_runtime(spec: &RuntimeSpec) -> RuntimeLocation {
    if probe_search_path(spec) {
        return RuntimeLocation::PathName(spec.program.clone());
    }
    if spec.fallback_path.is_file() {
        return RuntimeLocation::AbsolutePath(spec.fallback_path.clone());
    }
    RuntimeLocation::NotFound
}

fn probe_search_path(spec: &RuntimeSpec) -> bool {
    let mut cmd = Command::new(&spec.program);
    cmd.args(&spec.probe_args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    suppress_window(&mut cmd);
    // status() waits; the probe child must never outlive this stage.
    cmd.status().is_ok()
}

#[cfg(windows)]
fn suppress_window(cmd: &mut Command) {
    use std::os::windows::process::CommandExt as _;
    const CREATE_NO_WINDOW: u32 = 0x0800_0000;
    cmd.creation_flags(CREATE_NO_WINDOW);
}

#[cfg(not(windows))]
fn suppress_window(_cmd: &mut Command) {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuntimeSpec;

    fn spec(program: &str, probe_args: &[&str], fallback: PathBuf) -> RuntimeSpec {
        RuntimeSpec {
            program: program.to_string(),
            probe_args: probe_args.iter().map(|a| a.to_string()).collect(),
            fallback_path: fallback,
        }
    }

    #[cfg(unix)]
    #[test]
    fn probe_that_starts_resolves_to_path_name() {
        // Non-zero exit still counts as reachable.
        let spec = spec(
            "sh",
            &["-c", "exit 3"],
            PathBuf::from("/nonexistent/pwsh"),
        );
        assert_eq!(
            resolve_runtime(&spec),
            RuntimeLocation::PathName("sh".to_string())
        );
    }

    #[test]
    fn unstartable_probe_falls_back_to_install_path() {
        let dir = std::env::temp_dir().join(format!(
            "pslaunch-resolve-test-{}",
            std::process::id()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        let fallback = dir.join("pwsh");
        std::fs::write(&fallback, b"").unwrap();

        let spec = spec("pslaunch-test-no-such-runtime", &["-Help"], fallback.clone());
        assert_eq!(
            resolve_runtime(&spec),
            RuntimeLocation::AbsolutePath(fallback)
        );

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn nothing_present_resolves_to_not_found() {
        let spec = spec(
            "pslaunch-test-no-such-runtime",
            &["-Help"],
            PathBuf::from("/nonexistent/pslaunch/pwsh"),
        );
        let location = resolve_runtime(&spec);
        assert!(location.is_not_found());
        assert_eq!(location.kind(), "not-found");
    }
}

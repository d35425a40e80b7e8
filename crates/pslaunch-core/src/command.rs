use std::ffi::OsString;
use std::path::{Path, PathBuf};

use base64::Engine as _;

use crate::config::RuntimeSpec;
use crate::resolve::RuntimeLocation;

pub const FLAG_NO_PROFILE: &str = "-NoProfile";
pub const FLAG_EXECUTION_POLICY: &str = "-ExecutionPolicy";
pub const EXECUTION_POLICY_BYPASS: &str = "Bypass";
pub const FLAG_FILE: &str = "-File";
pub const FLAG_ENCODED_COMMAND: &str = "-EncodedCommand";

/// The fully-formed invocation: built once, used once.
#[derive(Debug, Clone)]
pub struct BootstrapCommand {
    pub program: OsString,
    pub args: Vec<OsString>,
    pub cwd: Option<PathBuf>,
}

/// Direct mode: run the staged script file in place.
///
/// The process API takes an argument vector, so the script path crosses the
/// boundary as a single argument with no shell re-quoting to defend against.
pub fn build_direct(
    location: &RuntimeLocation,
    spec: &RuntimeSpec,
    script: &Path,
) -> BootstrapCommand {
    BootstrapCommand {
        program: select_program(location, spec),
        args: vec![
            FLAG_NO_PROFILE.into(),
            FLAG_EXECUTION_POLICY.into(),
            EXECUTION_POLICY_BYPASS.into(),
            FLAG_FILE.into(),
            script.as_os_str().to_os_string(),
        ],
        cwd: None,
    }
}

/// Embedded mode: the expand-and-run script body crosses the process boundary
/// as one opaque base64-of-UTF-16LE token and is decoded only inside the
/// runtime. Passing its pieces as plain arguments would re-expose every
/// nested-quoting hazard this encoding exists to avoid.
pub fn build_encoded(
    location: &RuntimeLocation,
    spec: &RuntimeSpec,
    workspace: &Path,
    archive: &Path,
    entry: &str,
) -> BootstrapCommand {
    let body = bootstrap_body(workspace, archive, entry);
    BootstrapCommand {
        program: select_program(location, spec),
        args: vec![
            FLAG_NO_PROFILE.into(),
            FLAG_EXECUTION_POLICY.into(),
            EXECUTION_POLICY_BYPASS.into(),
            FLAG_ENCODED_COMMAND.into(),
            encode_command(&body).into(),
        ],
        cwd: None,
    }
}

/// The runtime-native script the encoded command carries: silence progress,
/// announce startup, expand the staged archive over the workspace, enter it,
/// invoke the entry script relative to it.
pub fn bootstrap_body(workspace: &Path, archive: &Path, entry: &str) -> String {
    let ws = ps_single_quote(&workspace.display().to_string());
    let zip = ps_single_quote(&archive.display().to_string());
    let entry = ps_single_quote(entry);
    format!(
        "$ProgressPreference = 'SilentlyContinue'; \
         Write-Host 'Launching payload...' -ForegroundColor Cyan; \
         Expand-Archive -LiteralPath '{zip}' -DestinationPath '{ws}' -Force; \
         Set-Location '{ws}'; \
         & './{entry}';"
    )
}

/// Base64 of the UTF-16LE encoding of `body`, the runtime's `-EncodedCommand`
/// wire format.
pub fn encode_command(body: &str) -> String {
    let mut bytes = Vec::with_capacity(body.len() * 2);
    for unit in body.encode_utf16() {
        bytes.extend_from_slice(&unit.to_le_bytes());
    }
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

/// In a single-quoted PowerShell literal only the quote itself needs care.
pub fn ps_single_quote(s: &str) -> String {
    s.replace('\'', "''")
}

/// Pick the executable, defending against post-install PATH staleness: a
/// fresh install can land before this process's search-path view catches up,
/// so `NotFound` with the fallback present on disk means "use the fallback".
pub fn select_program(location: &RuntimeLocation, spec: &RuntimeSpec) -> OsString {
    match location {
        RuntimeLocation::PathName(name) => name.into(),
        RuntimeLocation::AbsolutePath(path) => path.as_os_str().to_os_string(),
        RuntimeLocation::NotFound => {
            if spec.fallback_path.is_file() {
                spec.fallback_path.as_os_str().to_os_string()
            } else {
                // Let the supervisor surface the unlaunchable condition with
                // its restart advice.
                spec.program.clone().into()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuntimeSpec;

    fn decode_command(encoded: &str) -> String {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .expect("valid base64");
        assert_eq!(bytes.len() % 2, 0, "UTF-16LE byte stream");
        let units: Vec<u16> = bytes
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16(&units).expect("valid UTF-16")
    }

    #[test]
    fn encoded_command_round_trips_hostile_bodies() {
        let bodies = [
            "Write-Host 'plain'",
            r#"Write-Host "double 'single' quotes"; exit 1"#,
            "Expand-Archive -LiteralPath 'C:\\Tmp\\it''s here.zip'; & './payload.ps1';",
            "Write-Host 'héllo — ünïcode ✓'",
        ];
        for body in bodies {
            assert_eq!(decode_command(&encode_command(body)), body);
        }
    }

    #[test]
    fn direct_command_shape() {
        let spec = RuntimeSpec::default();
        let location = RuntimeLocation::PathName("pwsh".to_string());
        let cmd = build_direct(&location, &spec, Path::new("/tmp/payload.ps1"));
        assert_eq!(cmd.program, OsString::from("pwsh"));
        assert_eq!(
            cmd.args,
            vec![
                OsString::from("-NoProfile"),
                OsString::from("-ExecutionPolicy"),
                OsString::from("Bypass"),
                OsString::from("-File"),
                OsString::from("/tmp/payload.ps1"),
            ]
        );
    }

    #[test]
    fn encoded_command_shape_and_body() {
        let spec = RuntimeSpec::default();
        let location = RuntimeLocation::PathName("pwsh".to_string());
        let cmd = build_encoded(
            &location,
            &spec,
            Path::new("/tmp/ws"),
            Path::new("/tmp/ws/payload.zip"),
            "payload.ps1",
        );
        assert_eq!(cmd.args.len(), 5);
        assert_eq!(cmd.args[3], OsString::from("-EncodedCommand"));

        let body = decode_command(cmd.args[4].to_str().unwrap());
        assert!(body.contains("Expand-Archive -LiteralPath '/tmp/ws/payload.zip'"));
        assert!(body.contains("-DestinationPath '/tmp/ws' -Force"));
        assert!(body.contains("Set-Location '/tmp/ws'"));
        assert!(body.contains("& './payload.ps1';"));
    }

    #[test]
    fn quotes_in_interpolated_paths_are_doubled() {
        let body = bootstrap_body(
            Path::new("/tmp/it's ws"),
            Path::new("/tmp/it's ws/payload.zip"),
            "payload.ps1",
        );
        assert!(body.contains("Set-Location '/tmp/it''s ws'"));
    }

    #[test]
    fn stale_path_view_prefers_existing_fallback() {
        let dir = std::env::temp_dir().join(format!(
            "pslaunch-command-test-{}",
            std::process::id()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        let fallback = dir.join("pwsh");
        std::fs::write(&fallback, b"").unwrap();

        let spec = RuntimeSpec {
            fallback_path: fallback.clone(),
            ..RuntimeSpec::default()
        };
        assert_eq!(
            select_program(&RuntimeLocation::NotFound, &spec),
            fallback.as_os_str().to_os_string()
        );

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_fallback_keeps_bare_name() {
        let spec = RuntimeSpec {
            fallback_path: PathBuf::from("/nonexistent/pslaunch/pwsh"),
            ..RuntimeSpec::default()
        };
        assert_eq!(
            select_program(&RuntimeLocation::NotFound, &spec),
            OsString::from("pwsh")
        );
    }
}

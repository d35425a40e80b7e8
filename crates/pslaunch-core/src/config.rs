use std::path::PathBuf;

use crate::stage::ResourceTable;

pub const ENV_RUNTIME: &str = "PSLAUNCH_RUNTIME";
pub const ENV_RUNTIME_FALLBACK: &str = "PSLAUNCH_RUNTIME_FALLBACK";

pub const DEFAULT_RUNTIME_PROGRAM: &str = "pwsh";
pub const DEFAULT_INSTALL_HOST: &str = "powershell";
pub const DEFAULT_INSTALL_URL: &str = "https://aka.ms/install-powershell.ps1";
pub const DEFAULT_ENTRY_SCRIPT: &str = "payload.ps1";
pub const WORKSPACE_PREFIX: &str = "pslaunch";

/// How to find and probe the scripting runtime the payload requires.
#[derive(Debug, Clone)]
pub struct RuntimeSpec {
    /// Bare program name looked up via the search path.
    pub program: String,
    /// Harmless arguments for the reachability probe; the probe only cares
    /// whether the process starts, not what it prints or returns.
    pub probe_args: Vec<String>,
    /// Single well-known absolute install location checked when the search
    /// path probe cannot start the program.
    pub fallback_path: PathBuf,
}

impl Default for RuntimeSpec {
    fn default() -> Self {
        Self {
            program: DEFAULT_RUNTIME_PROGRAM.to_string(),
            probe_args: vec!["-NoProfile".to_string(), "-Help".to_string()],
            fallback_path: default_fallback_path(),
        }
    }
}

pub fn default_fallback_path() -> PathBuf {
    if cfg!(windows) {
        PathBuf::from(r"C:\Program Files\PowerShell\7\pwsh.exe")
    } else if cfg!(target_os = "macos") {
        PathBuf::from("/usr/local/bin/pwsh")
    } else {
        PathBuf::from("/opt/microsoft/powershell/7/pwsh")
    }
}

/// Build a [`RuntimeSpec`] from CLI overrides, the environment, and the
/// platform defaults, in that precedence order.
pub fn resolve_runtime_spec(
    cli_program: Option<String>,
    cli_fallback: Option<PathBuf>,
) -> RuntimeSpec {
    let env_program = std::env::var(ENV_RUNTIME).ok().filter(|v| !v.is_empty());
    let env_fallback = std::env::var_os(ENV_RUNTIME_FALLBACK)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from);
    resolve_runtime_spec_with_env(cli_program, cli_fallback, env_program, env_fallback)
}

pub fn resolve_runtime_spec_with_env(
    cli_program: Option<String>,
    cli_fallback: Option<PathBuf>,
    env_program: Option<String>,
    env_fallback: Option<PathBuf>,
) -> RuntimeSpec {
    let mut spec = RuntimeSpec::default();
    if let Some(program) = cli_program.or(env_program) {
        spec.program = program;
    }
    if let Some(fallback) = cli_fallback.or(env_fallback) {
        spec.fallback_path = fallback;
    }
    spec
}

/// The optional self-install stage: which host runs the remote install
/// routine and where that routine lives.
#[derive(Debug, Clone)]
pub struct InstallSpec {
    /// A scripting host assumed to be universally available, unlike the
    /// runtime itself.
    pub host: String,
    /// HTTPS endpoint serving the trusted install script.
    pub script_url: String,
}

impl Default for InstallSpec {
    fn default() -> Self {
        Self {
            host: DEFAULT_INSTALL_HOST.to_string(),
            script_url: DEFAULT_INSTALL_URL.to_string(),
        }
    }
}

/// Where the payload comes from.
#[derive(Debug, Clone)]
pub enum PayloadSpec {
    /// A plain script next to the launcher binary (or an explicit path).
    Direct {
        script: Option<PathBuf>,
        script_name: String,
    },
    /// A compressed archive compiled into the launcher binary; `entry` is the
    /// script the runtime invokes after expanding it.
    Embedded {
        table: ResourceTable,
        entry: String,
    },
}

#[derive(Debug, Clone)]
pub struct LaunchConfig {
    pub runtime: RuntimeSpec,
    /// `None` disables the install stage; a missing runtime is then fatal.
    pub installer: Option<InstallSpec>,
    pub payload: PayloadSpec,
    pub workspace_prefix: String,
    pub keep_workspace: bool,
}

impl LaunchConfig {
    pub fn mode(&self) -> &'static str {
        match self.payload {
            PayloadSpec::Direct { .. } => "direct",
            PayloadSpec::Embedded { .. } => "embedded",
        }
    }
}

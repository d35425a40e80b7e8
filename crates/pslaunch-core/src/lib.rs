//! Bootstrap pipeline for launching a PowerShell 7 payload: resolve the
//! runtime, install it if allowed and missing, stage the payload, build the
//! invocation, supervise the child, and always clean up the workspace.

use anyhow::Context as _;

pub mod command;
pub mod config;
pub mod error;
pub mod install;
pub mod report;
pub mod resolve;
pub mod stage;
pub mod supervise;
pub mod workspace;

pub use crate::config::{InstallSpec, LaunchConfig, PayloadSpec, RuntimeSpec};
pub use crate::error::LaunchError;
pub use crate::report::{Reporter, Severity};
pub use crate::resolve::RuntimeLocation;
pub use crate::stage::{EmbeddedResource, PayloadSource, ResourceTable};
pub use crate::supervise::ProcessOutcome;
pub use crate::workspace::Workspace;

/// What a completed launch looked like, for reporting.
#[derive(Debug)]
pub struct LaunchSummary {
    pub runtime: RuntimeLocation,
    pub outcome: ProcessOutcome,
}

/// Run the whole bootstrap: Resolver → (Installer if needed) → Stager →
/// CommandBuilder → Supervisor → Cleanup. Strictly sequential; every child
/// process is waited on before its stage ends; the workspace (when one
/// exists) is removed on every exit path.
pub fn run_launch(
    config: &LaunchConfig,
    reporter: &Reporter,
) -> Result<LaunchSummary, LaunchError> {
    // Payload first: a missing payload must fail before any workspace exists.
    let source = stage::resolve_payload(&config.payload)?;

    let mut location = resolve::resolve_runtime(&config.runtime);
    reporter.progress(&format!(
        "runtime {}: {}",
        config.runtime.program,
        location.describe()
    ));

    if location.is_not_found() {
        let Some(installer) = &config.installer else {
            return Err(LaunchError::RuntimeNotFound {
                program: config.runtime.program.clone(),
            });
        };
        install::install(installer, reporter)?;
        // The freshly-installed runtime may not be visible through this
        // process's PATH yet; the command builder prefers the on-disk
        // fallback path when the re-probe still misses.
        location = resolve::resolve_runtime(&config.runtime);
    }

    let outcome = match &source {
        PayloadSource::SiblingFile(script) => {
            reporter.progress(&format!("launching {}", script.display()));
            let cmd = command::build_direct(&location, &config.runtime, script);
            supervise::run(&cmd)?
        }
        PayloadSource::EmbeddedBlob { resource, entry } => {
            let ws = Workspace::create(&config.workspace_prefix).context("create workspace")?;
            let result = launch_embedded(config, &location, resource, entry, &ws, reporter);
            if config.keep_workspace {
                reporter.progress(&format!("keeping workspace {}", ws.path().display()));
            } else {
                ws.remove();
            }
            result?
        }
    };

    Ok(LaunchSummary {
        runtime: location,
        outcome,
    })
}

fn launch_embedded(
    config: &LaunchConfig,
    location: &RuntimeLocation,
    resource: &EmbeddedResource,
    entry: &str,
    ws: &Workspace,
    reporter: &Reporter,
) -> Result<ProcessOutcome, LaunchError> {
    let archive = stage::stage_embedded(resource, ws.path())?;
    reporter.progress(&format!("staged payload archive: {}", archive.display()));
    let cmd = command::build_encoded(location, &config.runtime, ws.path(), &archive, entry);
    reporter.progress("launching payload");
    supervise::run(&cmd)
}

use std::io::Write as _;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;

use pslaunch_core::config::{
    resolve_runtime_spec, InstallSpec, LaunchConfig, PayloadSpec, RuntimeSpec,
    DEFAULT_ENTRY_SCRIPT, WORKSPACE_PREFIX,
};
use pslaunch_core::report::Reporter;
use pslaunch_core::resolve::resolve_runtime;
use pslaunch_core::stage::resolve_payload;
use pslaunch_core::{run_launch, PayloadSource};

mod embedded;
mod render;

const LAUNCH_SCHEMA_VERSION: &str = "pslaunch.launch.report@0.1.0";
const DOCTOR_SCHEMA_VERSION: &str = "pslaunch.doctor.report@0.1.0";

#[derive(Debug, Parser)]
#[command(name = "pslaunch")]
#[command(about = "Bootstrap launcher for a PowerShell 7 payload.", long_about = None)]
struct Cli {
    #[command(flatten)]
    launch: LaunchArgs,

    #[arg(long, global = true)]
    json: bool,

    #[arg(long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    cmd: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Non-destructive environment checks: runtime, payload, install host.
    Doctor(DoctorArgs),
}

#[derive(Debug, Args)]
struct LaunchArgs {
    /// Payload selection; `auto` prefers an embedded archive when this build
    /// carries one.
    #[arg(long, value_enum, default_value_t = PayloadMode::Auto)]
    mode: PayloadMode,

    /// Payload script to run instead of the sibling default (direct mode).
    #[arg(long)]
    payload: Option<PathBuf>,

    /// Payload script name: the sibling file in direct mode, the entry
    /// script inside the archive in embedded mode.
    #[arg(long)]
    entry: Option<String>,

    /// Runtime program name to probe for.
    #[arg(long)]
    runtime: Option<String>,

    /// Absolute install location checked when the PATH probe fails.
    #[arg(long)]
    fallback_path: Option<PathBuf>,

    /// Never self-install a missing runtime; fail instead.
    #[arg(long)]
    no_install: bool,

    /// Leave the staging workspace on disk for inspection.
    #[arg(long)]
    keep_workspace: bool,

    /// Skip the "press any key" pause on failure.
    #[arg(long)]
    no_pause: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PayloadMode {
    Auto,
    Direct,
    Embedded,
}

#[derive(Debug, Args)]
struct DoctorArgs {
    /// Also probe the install endpoint over HTTPS.
    #[arg(long)]
    network: bool,
}

fn main() -> ExitCode {
    match try_main() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::from(2)
        }
    }
}

fn try_main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let reporter = Reporter {
        json: cli.json,
        quiet: cli.quiet,
    };
    match cli.cmd {
        Some(Command::Doctor(args)) => cmd_doctor(&cli.launch, args, &reporter),
        None => cmd_launch(&cli.launch, &reporter),
    }
}

#[derive(Debug, Serialize)]
struct LaunchReport {
    schema_version: &'static str,
    ok: bool,
    mode: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    runtime: Option<RuntimeReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    exit_code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorReport>,
}

#[derive(Debug, Serialize)]
struct RuntimeReport {
    kind: &'static str,
    resolved: String,
}

#[derive(Debug, Serialize)]
struct ErrorReport {
    code: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    hint: Option<String>,
}

fn cmd_launch(args: &LaunchArgs, reporter: &Reporter) -> Result<ExitCode> {
    let config = launch_config(args);
    match run_launch(&config, reporter) {
        Ok(summary) => {
            if reporter.json {
                write_json_stdout(&LaunchReport {
                    schema_version: LAUNCH_SCHEMA_VERSION,
                    ok: summary.outcome.success(),
                    mode: config.mode(),
                    runtime: Some(RuntimeReport {
                        kind: summary.runtime.kind(),
                        resolved: summary.runtime.describe(),
                    }),
                    exit_code: Some(summary.outcome.exit_code),
                    error: None,
                })?;
            } else if !summary.outcome.success() {
                reporter.warn(&format!(
                    "payload exited with code {}",
                    summary.outcome.exit_code
                ));
            }
            // Mirror the payload's own verdict.
            Ok(ExitCode::from(summary.outcome.exit_code.clamp(0, 255) as u8))
        }
        Err(err) => {
            if reporter.json {
                write_json_stdout(&LaunchReport {
                    schema_version: LAUNCH_SCHEMA_VERSION,
                    ok: false,
                    mode: config.mode(),
                    runtime: None,
                    exit_code: None,
                    error: Some(ErrorReport {
                        code: err.code(),
                        message: err.to_string(),
                        hint: err.hint(),
                    }),
                })?;
            } else {
                render::render_error(&err);
            }
            if !args.no_pause && !reporter.json && !reporter.quiet {
                render::pause_for_key();
            }
            Ok(ExitCode::from(2))
        }
    }
}

fn launch_config(args: &LaunchArgs) -> LaunchConfig {
    let runtime = resolve_runtime_spec(args.runtime.clone(), args.fallback_path.clone());
    let installer = if args.no_install {
        None
    } else {
        Some(InstallSpec::default())
    };
    let table = embedded::resource_table();
    let entry = args
        .entry
        .clone()
        .unwrap_or_else(|| DEFAULT_ENTRY_SCRIPT.to_string());

    let payload = match args.mode {
        PayloadMode::Direct => PayloadSpec::Direct {
            script: args.payload.clone(),
            script_name: entry,
        },
        PayloadMode::Embedded => PayloadSpec::Embedded { table, entry },
        PayloadMode::Auto => {
            if args.payload.is_none() && !table.is_empty() {
                PayloadSpec::Embedded { table, entry }
            } else {
                PayloadSpec::Direct {
                    script: args.payload.clone(),
                    script_name: entry,
                }
            }
        }
    };

    LaunchConfig {
        runtime,
        installer,
        payload,
        workspace_prefix: WORKSPACE_PREFIX.to_string(),
        keep_workspace: args.keep_workspace,
    }
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    schema_version: &'static str,
    ok: bool,
    checks: Vec<DoctorCheck>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    suggestions: Vec<String>,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: String,
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

fn cmd_doctor(launch: &LaunchArgs, args: DoctorArgs, reporter: &Reporter) -> Result<ExitCode> {
    let config = launch_config(launch);
    let mut checks: Vec<DoctorCheck> = Vec::new();
    let mut suggestions: Vec<String> = Vec::new();

    let location = resolve_runtime(&config.runtime);
    checks.push(DoctorCheck {
        name: "runtime".to_string(),
        ok: !location.is_not_found(),
        detail: Some(location.describe()),
    });
    if location.is_not_found() {
        // Only relevant when a launch would actually hit the install stage.
        let host_spec = RuntimeSpec {
            program: InstallSpec::default().host,
            probe_args: vec!["-NoProfile".to_string(), "-Help".to_string()],
            fallback_path: PathBuf::new(),
        };
        let host_location = resolve_runtime(&host_spec);
        checks.push(DoctorCheck {
            name: "install_host".to_string(),
            ok: !host_location.is_not_found(),
            detail: Some(host_location.describe()),
        });
        suggestions.push("run pslaunch to bootstrap the runtime automatically".to_string());
    }

    match resolve_payload(&config.payload) {
        Ok(PayloadSource::SiblingFile(path)) => checks.push(DoctorCheck {
            name: "payload".to_string(),
            ok: true,
            detail: Some(format!("script: {}", path.display())),
        }),
        Ok(PayloadSource::EmbeddedBlob { resource, .. }) => checks.push(DoctorCheck {
            name: "payload".to_string(),
            ok: true,
            detail: Some(format!(
                "embedded archive: {} ({} bytes)",
                resource.name,
                resource.bytes.len()
            )),
        }),
        Err(err) => {
            checks.push(DoctorCheck {
                name: "payload".to_string(),
                ok: false,
                detail: Some(err.to_string()),
            });
            if let Some(hint) = err.hint() {
                suggestions.push(hint);
            }
        }
    }

    if args.network {
        let url = InstallSpec::default().script_url;
        let (ok, detail) = match ureq::get(url.as_str()).call() {
            Ok(resp) => (true, format!("HTTP {}", resp.status())),
            Err(err) => (false, format!("{err}")),
        };
        checks.push(DoctorCheck {
            name: "install_endpoint".to_string(),
            ok,
            detail: Some(detail),
        });
    }

    let ok = checks.iter().all(|c| c.ok);
    let report = DoctorReport {
        schema_version: DOCTOR_SCHEMA_VERSION,
        ok,
        checks,
        suggestions,
    };

    if reporter.json {
        write_json_stdout(&report)?;
    } else {
        for check in &report.checks {
            if !check.ok {
                println!(
                    "check failed: {} ({})",
                    check.name,
                    check.detail.as_deref().unwrap_or("no detail")
                );
            }
        }
        for s in &report.suggestions {
            println!("hint: {s}");
        }
        if report.ok {
            println!("ok: pslaunch doctor");
        } else {
            println!("error: pslaunch doctor found problems");
        }
    }
    Ok(if report.ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}

fn write_json_stdout<T: Serialize>(v: &T) -> Result<()> {
    let mut bytes = serde_json::to_vec(v)?;
    bytes.push(b'\n');
    std::io::stdout()
        .write_all(&bytes)
        .context("write stdout")?;
    Ok(())
}

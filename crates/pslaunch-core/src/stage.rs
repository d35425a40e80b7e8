use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::config::PayloadSpec;
use crate::error::LaunchError;

/// Suffix the embedded-resource scan matches on, case-insensitively.
pub const ARCHIVE_EXTENSION: &str = ".zip";
/// Filename the embedded blob is staged under inside the workspace.
pub const STAGED_ARCHIVE_NAME: &str = "payload.zip";

/// One named blob compiled into the launcher binary.
#[derive(Debug, Clone, Copy)]
pub struct EmbeddedResource {
    pub name: &'static str,
    pub bytes: &'static [u8],
}

/// The binary's enumerable table of embedded resources. Empty when the build
/// carried no payload.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResourceTable {
    entries: &'static [EmbeddedResource],
}

impl ResourceTable {
    pub const fn new(entries: &'static [EmbeddedResource]) -> Self {
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn find_by_suffix(&self, suffix: &str) -> Option<&'static EmbeddedResource> {
        let suffix = suffix.to_ascii_lowercase();
        self.entries
            .iter()
            .find(|r| r.name.to_ascii_lowercase().ends_with(&suffix))
    }
}

/// Where the payload comes from, fixed once per run.
#[derive(Debug, Clone)]
pub enum PayloadSource {
    SiblingFile(PathBuf),
    EmbeddedBlob {
        resource: EmbeddedResource,
        entry: String,
    },
}

/// Resolve the payload before any workspace exists, so a missing payload can
/// never leak a directory.
pub fn resolve_payload(spec: &PayloadSpec) -> Result<PayloadSource, LaunchError> {
    match spec {
        PayloadSpec::Direct { script, script_name } => {
            let path = match script {
                Some(path) => path.clone(),
                None => sibling_path(script_name)?,
            };
            if !path.is_file() {
                return Err(LaunchError::PayloadNotFound {
                    detail: format!("payload script missing: {}", path.display()),
                });
            }
            Ok(PayloadSource::SiblingFile(path))
        }
        PayloadSpec::Embedded { table, entry } => match table.find_by_suffix(ARCHIVE_EXTENSION) {
            Some(resource) => Ok(PayloadSource::EmbeddedBlob {
                resource: *resource,
                entry: entry.clone(),
            }),
            None => Err(LaunchError::PayloadNotFound {
                detail: format!(
                    "this build carries no embedded {ARCHIVE_EXTENSION} payload archive"
                ),
            }),
        },
    }
}

fn sibling_path(name: &str) -> Result<PathBuf, LaunchError> {
    let exe = std::env::current_exe().context("current_exe")?;
    let dir = exe
        .parent()
        .ok_or_else(|| anyhow::anyhow!("launcher binary has no parent directory"))?;
    Ok(dir.join(name))
}

/// Stream the embedded archive bytes into the workspace. Extraction is the
/// runtime's job (`Expand-Archive` inside the encoded command); the launcher
/// carries no archive library.
pub fn stage_embedded(
    resource: &EmbeddedResource,
    workspace: &Path,
) -> Result<PathBuf, LaunchError> {
    let dest = workspace.join(STAGED_ARCHIVE_NAME);
    let mut file =
        File::create(&dest).with_context(|| format!("create {}", dest.display()))?;
    let mut reader = resource.bytes;
    std::io::copy(&mut reader, &mut file)
        .with_context(|| format!("write {}", dest.display()))?;
    Ok(dest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workspace::Workspace;

    static FAKE_ZIP: &[u8] = b"PK\x03\x04 not a real archive";
    static TABLE_ENTRIES: [EmbeddedResource; 2] = [
        EmbeddedResource {
            name: "launcher.rsrc.README",
            bytes: b"docs",
        },
        EmbeddedResource {
            name: "launcher.rsrc.Payload.ZIP",
            bytes: FAKE_ZIP,
        },
    ];

    #[test]
    fn suffix_lookup_is_case_insensitive() {
        let table = ResourceTable::new(&TABLE_ENTRIES);
        let hit = table.find_by_suffix(".zip").expect("archive entry");
        assert_eq!(hit.name, "launcher.rsrc.Payload.ZIP");
        assert!(table.find_by_suffix(".tar.gz").is_none());
    }

    #[test]
    fn empty_table_fails_payload_not_found_before_any_workspace() {
        let spec = PayloadSpec::Embedded {
            table: ResourceTable::new(&[]),
            entry: "payload.ps1".to_string(),
        };
        let err = resolve_payload(&spec).unwrap_err();
        assert_eq!(err.code(), "PAYLOAD_NOT_FOUND");
    }

    #[test]
    fn missing_direct_script_fails_payload_not_found() {
        let spec = PayloadSpec::Direct {
            script: Some(PathBuf::from("/nonexistent/pslaunch/payload.ps1")),
            script_name: "payload.ps1".to_string(),
        };
        let err = resolve_payload(&spec).unwrap_err();
        assert_eq!(err.code(), "PAYLOAD_NOT_FOUND");
    }

    #[test]
    fn staged_archive_bytes_are_identical() {
        let ws = Workspace::create("pslaunch-stage-test").unwrap();
        let resource = EmbeddedResource {
            name: "payload.zip",
            bytes: FAKE_ZIP,
        };
        let staged = stage_embedded(&resource, ws.path()).unwrap();
        assert_eq!(staged.file_name().unwrap(), STAGED_ARCHIVE_NAME);
        assert_eq!(std::fs::read(&staged).unwrap(), FAKE_ZIP);
        ws.remove();
    }
}

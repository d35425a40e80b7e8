use std::io;
use std::path::{Path, PathBuf};

/// Per-run staging directory under the system temp root. The name carries the
/// pid plus a random suffix so concurrent launcher instances cannot collide.
#[derive(Debug)]
pub struct Workspace {
    path: PathBuf,
}

impl Workspace {
    pub fn create(prefix: &str) -> io::Result<Workspace> {
        let tmp = std::env::temp_dir();
        // The random suffix makes collisions vanishingly rare, but a recycled
        // name from a crashed run must not abort the launch.
        for _ in 0..16 {
            let name = format!("{prefix}-{}-{}", std::process::id(), random_hex(4)?);
            let path = tmp.join(name);
            match std::fs::create_dir(&path) {
                Ok(()) => return Ok(Workspace { path }),
                Err(err) if err.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(err) => return Err(err),
            }
        }
        Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            "could not create a unique workspace directory",
        ))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Best-effort, idempotent removal. Cleanup must never mask the primary
    /// outcome of the run, so failures (a lingering handle on Windows, an
    /// already-removed tree) are swallowed.
    pub fn remove(&self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}

fn random_hex(n_bytes: usize) -> io::Result<String> {
    let mut buf = vec![0u8; n_bytes];
    getrandom::getrandom(&mut buf).map_err(io::Error::from)?;
    let mut out = String::with_capacity(n_bytes * 2);
    for b in buf {
        out.push_str(&format!("{b:02x}"));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workspaces_are_unique_per_creation() {
        let a = Workspace::create("pslaunch-test").unwrap();
        let b = Workspace::create("pslaunch-test").unwrap();
        assert_ne!(a.path(), b.path());
        assert!(a.path().is_dir());
        assert!(b.path().is_dir());
        a.remove();
        b.remove();
        assert!(!a.path().exists());
        assert!(!b.path().exists());
    }

    #[test]
    fn remove_is_idempotent() {
        let ws = Workspace::create("pslaunch-test").unwrap();
        std::fs::write(ws.path().join("inner.txt"), b"staged").unwrap();
        ws.remove();
        assert!(!ws.path().exists());
        // Second removal of a gone tree is a no-op, not a panic or error.
        ws.remove();
    }
}

//! Runs `.git/hooks/<name>`, matching real git: if the file doesn't exist
//! (or isn't executable) the hook is a no-op; otherwise it's spawned with
//! `stdin` piped in and its exit status decides whether the caller proceeds.
//! Only `pre-push` is consulted by anything in this crate right now (see
//! [`crate::remote::BitRepo::push`]); other hook names are trivial to add
//! following the same shape once something calls them.

use crate::error::BitResult;
use crate::repo::BitRepo;
use std::io::Write;
use std::process::{Command, Stdio};

impl<'rcx> BitRepo<'rcx> {
    pub fn hooks_dir(&self) -> crate::path::BitPath {
        self.bitdir.join("hooks")
    }

    /// Runs the named hook with `stdin` fed to it, returning whether it's
    /// absent/non-executable (treated as "allow") or exited zero. A hook
    /// that exists but isn't executable is skipped the same as a missing one,
    /// mirroring how real git only treats the executable bit as opt-in.
    pub fn run_hook(&self, name: &str, stdin: &str) -> BitResult<bool> {
        let path = self.hooks_dir().join(name);
        if !path.as_path().exists() {
            return Ok(true);
        }
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let executable = std::fs::metadata(path.as_path())?.permissions().mode() & 0o111 != 0;
            if !executable {
                return Ok(true);
            }
        }

        let mut child = Command::new(path.as_path())
            .stdin(Stdio::piped())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()?;
        if let Some(mut child_stdin) = child.stdin.take() {
            child_stdin.write_all(stdin.as_bytes())?;
        }
        let status = child.wait()?;
        Ok(status.success())
    }
}

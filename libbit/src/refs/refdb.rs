use super::{BitRef, BitReflog, Refs, SymbolicRef};
use crate::error::BitResult;
use crate::lockfile::Lockfile;
use crate::path::BitPath;
use crate::serialize::Deserialize;
use crate::serialize::Serialize;
use walkdir::WalkDir;

pub struct BitRefDb {
    bitdir: BitPath,
}

impl BitRefDb {
    pub fn new(bitdir: BitPath) -> Self {
        Self { bitdir }
    }

    pub fn join_ref(&self, path: BitPath) -> BitPath {
        self.bitdir.join(path)
    }

    pub fn join_log(&self, path: BitPath) -> BitPath {
        self.bitdir.join("logs").join(path)
    }

    /// walks every regular file under `refs/<subdir>` (there is no indirection
    /// below the top-level ref files themselves, just nested directories
    /// mirroring the slashes in the ref name) and returns the path of each
    /// one relative to the bitdir, e.g. `refs/heads/feature/x`.
    fn walk_ref_dir(&self, subdir: &str) -> BitResult<Vec<BitPath>> {
        let dir = self.bitdir.join(subdir);
        if !dir.as_path().exists() {
            return Ok(vec![]);
        }
        let mut paths = vec![];
        for entry in WalkDir::new(dir.as_path()) {
            let entry = entry?;
            if entry.file_type().is_file() {
                let relative = entry.path().strip_prefix(self.bitdir.as_path()).unwrap();
                paths.push(BitPath::intern(relative));
            }
        }
        Ok(paths)
    }
}

// unfortunately, doesn't seem like its easy to support a resolve operation on refdb as it will require reading
// objects for validation but both refdb and odb are owned by the repo so not sure if this is feasible
pub trait BitRefDbBackend {
    fn create(&self, sym: SymbolicRef, from: BitRef) -> BitResult<()>;
    fn read(&self, sym: SymbolicRef) -> BitResult<BitRef>;
    // may implicitly create the ref
    fn update(&self, sym: SymbolicRef, to: BitRef) -> BitResult<()>;
    fn delete(&self, sym: SymbolicRef) -> BitResult<()>;
    fn exists(&self, sym: SymbolicRef) -> BitResult<bool>;

    fn read_reflog(&self, sym: SymbolicRef) -> BitResult<BitReflog>;

    /// every ref name that currently has a file on disk: `HEAD` plus
    /// everything under `refs/heads`, `refs/tags` and `refs/remotes`.
    /// Doesn't resolve anything, just enumerates names (so a symbolic ref
    /// pointing at a branch that doesn't exist yet, like a freshly `init`ed
    /// repo's `HEAD`, still appears; the branch it points to does not, since
    /// there is no file for it until the first commit).
    fn ls_refs(&self) -> BitResult<Refs>;

    /// every ref name under `prefix` (e.g. `refs/remotes/origin`), used by
    /// fetch to enumerate what a remote's tracking refs currently are before
    /// deciding what to prune.
    fn list_refs(&self, prefix: &str) -> BitResult<Vec<SymbolicRef>>;
}

impl BitRefDbBackend for BitRefDb {
    fn create(&self, sym: SymbolicRef, from: BitRef) -> BitResult<()> {
        if self.exists(sym)? {
            // todo improve error message by only leaving the branch name in a reliable manner somehow
            // how do we differentiate something that lives in refs/heads vs HEAD
            bail!("a reference `{}` already exists", sym);
        }
        self.update(sym, from)
    }

    fn read(&self, sym: SymbolicRef) -> BitResult<BitRef> {
        Lockfile::with_readonly(self.join_ref(sym.path), |lockfile| {
            let head_file =
                lockfile.file().unwrap_or_else(|| panic!("ref `{}` does not exist", sym));
            BitRef::deserialize_unbuffered(head_file)
        })
    }

    fn update(&self, sym: SymbolicRef, to: BitRef) -> BitResult<()> {
        Lockfile::with_mut(self.join_ref(sym.path), |lockfile| to.serialize(lockfile))
    }

    fn delete(&self, sym: SymbolicRef) -> BitResult<()> {
        let path = self.join_ref(sym.path);
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        let log_path = self.join_log(sym.path);
        if log_path.exists() {
            std::fs::remove_file(log_path)?;
        }
        Ok(())
    }

    fn exists(&self, sym: SymbolicRef) -> BitResult<bool> {
        Ok(self.join_ref(sym.path).exists())
    }

    fn read_reflog(&self, sym: SymbolicRef) -> BitResult<BitReflog> {
        let path = self.join_log(sym.path);
        if !path.exists() {
            return Ok(BitReflog::default());
        }
        BitReflog::deserialize_unbuffered(std::fs::File::open(path)?)
    }

    fn ls_refs(&self) -> BitResult<Refs> {
        let mut refs = Refs::new();
        if self.join_ref(BitPath::HEAD).as_path().exists() {
            refs.insert(BitRef::Symbolic(SymbolicRef::HEAD));
        }
        for subdir in ["refs/heads", "refs/tags", "refs/remotes"] {
            for path in self.walk_ref_dir(subdir)? {
                refs.insert(BitRef::Symbolic(SymbolicRef::new(path)));
            }
        }
        Ok(refs)
    }

    fn list_refs(&self, prefix: &str) -> BitResult<Vec<SymbolicRef>> {
        let prefix = BitPath::intern(prefix);
        let mut out = vec![];
        for subdir in ["refs/heads", "refs/tags", "refs/remotes"] {
            if !subdir.starts_with(prefix.as_str()) && !prefix.as_str().starts_with(subdir) {
                continue;
            }
            for path in self.walk_ref_dir(subdir)? {
                if path.starts_with(prefix) {
                    out.push(SymbolicRef::new(path));
                }
            }
        }
        out.sort();
        Ok(out)
    }
}

//! Reads and writes `.git/shallow`, the newline-delimited set of commit oids
//! a shallow clone's history is truncated at. Absent entirely in a
//! non-shallow repository; [`read`] treats a missing file the same as an
//! empty one so callers don't need to special-case first-ever shallow fetch.

use crate::error::BitResult;
use crate::lockfile::{Lockfile, LockfileFlags};
use crate::obj::Oid;
use crate::repo::BitRepo;
use rustc_hash::FxHashSet;
use std::io::{Read, Write};

pub fn read(repo: BitRepo<'_>) -> BitResult<FxHashSet<Oid>> {
    let path = repo.shallow_path();
    if !path.exists() {
        return Ok(FxHashSet::default());
    }
    Lockfile::with_readonly(path.as_path(), LockfileFlags::empty(), |lockfile| {
        let mut contents = String::new();
        if let Some(mut file) = lockfile.file() {
            file.read_to_string(&mut contents)?;
        }
        contents.lines().map(|line| line.trim().parse::<Oid>().map_err(Into::into)).collect()
    })
}

/// overwrites `.git/shallow` with exactly `oids`, one per line, sorted so the
/// file is stable across runs; an empty set removes the file entirely
/// (a fully-unshallowed repository has no truncation boundary left to record).
pub fn write(repo: BitRepo<'_>, oids: &FxHashSet<Oid>) -> BitResult<()> {
    let path = repo.shallow_path();
    if oids.is_empty() {
        if path.exists() {
            std::fs::remove_file(path.as_path())?;
        }
        return Ok(());
    }
    let mut sorted: Vec<Oid> = oids.iter().copied().collect();
    sorted.sort_unstable();
    Lockfile::with_mut(path.as_path(), LockfileFlags::empty(), |lockfile| {
        for oid in &sorted {
            writeln!(lockfile, "{}", oid)?;
        }
        Ok(())
    })
}

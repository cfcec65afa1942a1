//! Ancestry and reachability queries over the (single-parent) commit chain.
//! Used by push to reject non-fast-forward updates and to compute the thin
//! pack's object set, and by fetch to decide how far a shallow clone walks.

use crate::error::BitResult;
use crate::obj::Oid;
use crate::repo::BitRepo;
use rustc_hash::FxHashSet;

impl<'rcx> BitRepo<'rcx> {
    /// `true` if `ancestor` is reachable by walking `descendant`'s parent chain
    /// (inclusive: a commit is considered its own ancestor).
    pub fn is_ancestor(self, ancestor: Oid, descendant: Oid) -> BitResult<bool> {
        if ancestor == descendant {
            return Ok(true);
        }
        let mut cursor = descendant;
        loop {
            let commit = match self.read_obj(cursor)?.try_into_commit() {
                Ok(commit) => commit,
                Err(..) => return Ok(false),
            };
            match commit.parent {
                Some(parent) if parent == ancestor => return Ok(true),
                Some(parent) => cursor = parent,
                None => return Ok(false),
            }
        }
    }

    /// First commit common to both `a` and `b`'s histories, or `None` if the
    /// two histories are unrelated. Walks `a`'s full chain into a set first,
    /// then walks `b`'s chain looking for the first hit; with single-parent
    /// commits this is the full merge-base, not just a heuristic.
    pub fn find_merge_base(self, a: Oid, b: Oid) -> BitResult<Option<Oid>> {
        let mut ancestors_of_a = FxHashSet::default();
        let mut cursor = Some(a);
        while let Some(oid) = cursor {
            ancestors_of_a.insert(oid);
            cursor = self.read_obj(oid)?.try_into_commit().ok().and_then(|commit| commit.parent);
        }

        let mut cursor = Some(b);
        while let Some(oid) = cursor {
            if ancestors_of_a.contains(&oid) {
                return Ok(Some(oid));
            }
            cursor = self.read_obj(oid)?.try_into_commit().ok().and_then(|commit| commit.parent);
        }
        Ok(None)
    }

    /// All commit/tree/blob objects reachable from `start`: the commit chain,
    /// and each commit's tree walked recursively.
    pub fn list_reachable_objects(self, start: Oid) -> BitResult<FxHashSet<Oid>> {
        let mut seen = FxHashSet::default();
        let mut cursor = Some(start);
        while let Some(oid) = cursor {
            if !seen.insert(oid) {
                break;
            }
            let commit = self.read_obj(oid)?.into_commit();
            self.list_reachable_from_tree(commit.tree(), &mut seen)?;
            cursor = commit.parent;
        }
        Ok(seen)
    }

    fn list_reachable_from_tree(self, tree_oid: Oid, seen: &mut FxHashSet<Oid>) -> BitResult<()> {
        if !seen.insert(tree_oid) {
            return Ok(());
        }
        let tree = self.read_obj(tree_oid)?.into_tree()?;
        for entry in &tree.entries {
            if entry.mode.is_tree() {
                self.list_reachable_from_tree(entry.hash, seen)?;
            } else {
                seen.insert(entry.hash);
            }
        }
        Ok(())
    }

    /// Objects reachable from `want` but not reachable from any of `have`;
    /// this is the set a thin pack needs to actually include.
    pub fn list_objects_excluding(
        self,
        want: Oid,
        have: impl IntoIterator<Item = Oid>,
    ) -> BitResult<FxHashSet<Oid>> {
        let mut excluded = FxHashSet::default();
        for oid in have {
            excluded.extend(self.list_reachable_objects(oid)?);
        }
        let mut wanted = self.list_reachable_objects(want)?;
        wanted.retain(|oid| !excluded.contains(oid));
        Ok(wanted)
    }
}

#[cfg(test)]
mod tests;

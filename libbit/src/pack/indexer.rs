//! Builds a `.idx` for a packfile that has just been written to disk (by a
//! [`super::PackWriter`] fed from a fetch, or handed to `bit index-pack`
//! directly).
//!
//! A packfile only records each object's *compressed* bytes plus, for
//! delta entries, either a backward byte offset (`ofs-delta`) or an oid
//! (`ref-delta`) identifying its base. Computing the real oid of a delta
//! entry therefore requires its base to already be resolved, and bases can
//! themselves be deltas. We resolve this with repeated passes over the
//! still-unresolved entries: each pass expands whatever it can against
//! currently-known objects, and we stop once a pass resolves nothing new.
//! A thin pack's ref-deltas may point at objects the sender assumed we
//! already have; those are looked up in `external` (the local object db)
//! rather than within the pack itself.

use crate::error::BitResult;
use crate::hash::SHA1Hash;
use crate::obj::{BitObjKind, BitObjType, BitPackObjRaw, Oid};
use crate::pack::{BitPackObjRawDeltified, PackIndex, PackfileReader, PACK_EXT, PACK_IDX_EXT};
use crate::repo::BitRepo;
use crate::serialize::Serialize;
use rustc_hash::FxHashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Seek};
use std::path::{Path, PathBuf};

/// passes to make over the unresolved delta entries before giving up
const MAX_RESOLUTION_PASSES: usize = 10;

#[derive(Debug, Clone, Default)]
pub struct IndexPackOpts {
    /// write the index here instead of deriving the path from the packfile's
    /// own path by swapping its extension
    pub index_file_path: Option<PathBuf>,
}

/// a single pass's worth of bookkeeping for one pack entry
struct RawEntry {
    offset: u64,
    crc: u32,
    raw: BitPackObjRawDeltified,
}

pub struct PackIndexer;

impl PackIndexer {
    /// indexes the packfile at `pack_path`, writing the resulting `.idx` to
    /// `opts.index_file_path` (or alongside the pack, replacing its `.pack`
    /// extension with `.idx`), returning the path written.
    pub fn write_pack_index(pack_path: &Path, opts: IndexPackOpts) -> BitResult<PathBuf> {
        let idx_path = match opts.index_file_path {
            Some(path) => path,
            None => {
                ensure!(
                    pack_path.extension().and_then(|ext| ext.to_str()) == Some(PACK_EXT),
                    "packfile path `{}` does not end in `.{}`",
                    pack_path.display(),
                    PACK_EXT
                );
                pack_path.with_extension(PACK_IDX_EXT)
            }
        };
        let index = Self::index_pack(pack_path, None)?;
        let mut file = BufWriter::new(File::create(&idx_path)?);
        index.serialize(&mut file)?;
        Ok(idx_path)
    }

    /// like [`Self::write_pack_index`] but also consults `repo`'s object
    /// database to resolve ref-deltas whose base was not sent in this pack
    /// (thin packs, as produced by `upload-pack` for an incremental fetch).
    pub fn write_pack_index_thin(
        pack_path: &Path,
        opts: IndexPackOpts,
        repo: BitRepo<'_>,
    ) -> BitResult<PathBuf> {
        let idx_path = match opts.index_file_path {
            Some(path) => path,
            None => pack_path.with_extension(PACK_IDX_EXT),
        };
        let index = Self::index_pack(pack_path, Some(repo))?;
        let mut file = BufWriter::new(File::create(&idx_path)?);
        index.serialize(&mut file)?;
        Ok(idx_path)
    }

    /// parses every object in the packfile, resolving deltas to compute
    /// each object's real oid, and assembles the sorted fanout/oid/crc/offset
    /// tables that make up a [`PackIndex`].
    pub fn index_pack(pack_path: &Path, external: Option<BitRepo<'_>>) -> BitResult<PackIndex> {
        let file = BufReader::new(File::open(pack_path)?);
        let mut reader = PackfileReader::new(file)?;
        let objectc = reader.objectc;

        let mut entries = Vec::with_capacity(objectc as usize);
        for _ in 0..objectc {
            let offset = reader.stream_position()?;
            let (crc, raw) = reader.read_pack_obj_with_crc()?;
            entries.push(RawEntry { offset, crc, raw });
        }

        let pack_hash = Self::read_trailing_hash(&mut reader)?;

        let mut expanded: FxHashMap<u64, BitPackObjRaw> = FxHashMap::default();
        let mut oid_to_offset: FxHashMap<Oid, u64> = FxHashMap::default();

        let mut unresolved = Vec::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            match &entry.raw {
                BitPackObjRawDeltified::Raw(raw) => {
                    let oid = Self::oid_of(raw);
                    expanded.insert(entry.offset, raw.clone());
                    // an earlier offset wins on oid collision (shouldn't happen in a
                    // valid pack, but mirrors how lookups resolve duplicates elsewhere)
                    oid_to_offset.entry(oid).or_insert(entry.offset);
                }
                BitPackObjRawDeltified::Ofs(..) | BitPackObjRawDeltified::Ref(..) =>
                    unresolved.push(i),
            }
        }

        for _pass in 0..MAX_RESOLUTION_PASSES {
            if unresolved.is_empty() {
                break;
            }
            let mut still_unresolved = Vec::new();
            let mut resolved_this_pass = 0usize;
            for &i in &unresolved {
                let entry = &entries[i];
                match Self::try_resolve(entry, &expanded, &oid_to_offset, external)? {
                    Some(raw) => {
                        let oid = Self::oid_of(&raw);
                        expanded.insert(entry.offset, raw);
                        oid_to_offset.entry(oid).or_insert(entry.offset);
                        resolved_this_pass += 1;
                    }
                    None => still_unresolved.push(i),
                }
            }
            unresolved = still_unresolved;
            if resolved_this_pass == 0 {
                break;
            }
        }

        if !unresolved.is_empty() {
            log::warn!(
                "failed to resolve {} delta object(s) in `{}` against any known base after {} passes; \
                 omitting them from the index, reads of the affected objects will fail",
                unresolved.len(),
                pack_path.display(),
                MAX_RESOLUTION_PASSES
            );
        }

        let mut oids_offsets_crcs: Vec<(Oid, u64, u32)> = entries
            .iter()
            .filter_map(|entry| {
                let oid =
                    *oid_to_offset.iter().find(|&(_, &off)| off == entry.offset)?.0;
                Some((oid, entry.offset, entry.crc))
            })
            .collect();
        oids_offsets_crcs.sort_unstable_by_key(|&(oid, ..)| oid);

        let oids = oids_offsets_crcs.iter().map(|&(oid, ..)| oid).collect::<Vec<_>>();
        let crcs = oids_offsets_crcs.iter().map(|&(_, _, crc)| crc).collect();
        let offsets = oids_offsets_crcs.iter().map(|&(_, offset, _)| offset as u32).collect();
        let fanout = PackIndex::build_fanout(&oids);

        Ok(PackIndex { fanout, oids, crcs, offsets, pack_hash })
    }

    fn oid_of(raw: &BitPackObjRaw) -> Oid {
        let mut buf = Vec::with_capacity(raw.bytes.len() + 32);
        buf.extend_from_slice(format!("{} {}\0", raw.obj_type, raw.bytes.len()).as_bytes());
        buf.extend_from_slice(&raw.bytes);
        crate::hash::hash_bytes(&buf)
    }

    fn try_resolve(
        entry: &RawEntry,
        expanded: &FxHashMap<u64, BitPackObjRaw>,
        oid_to_offset: &FxHashMap<Oid, u64>,
        external: Option<BitRepo<'_>>,
    ) -> BitResult<Option<BitPackObjRaw>> {
        let (base_offset, delta) = match &entry.raw {
            BitPackObjRawDeltified::Ofs(rel, delta) => (Some(entry.offset - rel), delta),
            BitPackObjRawDeltified::Ref(base_oid, delta) =>
                (oid_to_offset.get(base_oid).copied(), delta),
            BitPackObjRawDeltified::Raw(_) => unreachable!("raw entries are resolved up-front"),
        };

        if let Some(offset) = base_offset {
            return match expanded.get(&offset) {
                Some(base) => Ok(Some(base.expand_with_delta_bytes(delta)?)),
                None => Ok(None),
            };
        }

        // base offset unknown within this pack; fall back to the local object
        // database for a thin pack's ref-delta
        if let BitPackObjRawDeltified::Ref(base_oid, delta) = &entry.raw {
            if let Some(repo) = external {
                if let Some(base) = Self::read_external(repo, *base_oid)? {
                    return Ok(Some(base.expand_with_delta_bytes(delta)?));
                }
            }
        }
        Ok(None)
    }

    fn read_external(repo: BitRepo<'_>, oid: Oid) -> BitResult<Option<BitPackObjRaw>> {
        if !repo.obj_exists(oid)? {
            return Ok(None);
        }
        let obj = repo.read_obj(oid)?;
        let obj_type = match &obj {
            BitObjKind::Blob(..) => BitObjType::Blob,
            BitObjKind::Commit(..) => BitObjType::Commit,
            BitObjKind::Tree(..) => BitObjType::Tree,
            BitObjKind::Tag(..) => BitObjType::Tag,
        };
        let mut bytes = vec![];
        obj.serialize(&mut bytes)?;
        Ok(Some(BitPackObjRaw { obj_type, bytes }))
    }

    /// the packfile format ends with a 20-byte sha1 of all preceding bytes;
    /// we don't verify it against a running hash here (the object content
    /// hashes we just computed are the real integrity check), just read past it.
    fn read_trailing_hash(reader: &mut PackfileReader<BufReader<File>>) -> BitResult<SHA1Hash> {
        use crate::io::ReadExt;
        Ok(reader.read_oid()?)
    }
}

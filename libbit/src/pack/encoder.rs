//! Builds a packfile containing a given set of objects, for `upload-pack`'s
//! response and a push's thin pack.
//!
//! Every object is stored in full (as a "raw" pack entry, never as a delta
//! against another object in the same pack): this keeps the encoder simple
//! and produces a valid packfile (deltification is an optimization, not a
//! format requirement), at the cost of larger packs than real git produces.

use crate::error::BitResult;
use crate::hash;
use crate::io::WriteExt;
use crate::obj::{BitObjType, Oid};
use crate::pack::PACK_SIGNATURE;
use crate::repo::BitRepo;
use crate::serialize::Serialize;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::Write;

pub struct PackEncoder;

impl PackEncoder {
    /// Encodes `oids` (read from `repo`'s object store) into a complete
    /// packfile, including the trailing checksum.
    pub fn encode(repo: BitRepo<'_>, oids: &[Oid]) -> BitResult<Vec<u8>> {
        let mut out = Vec::new();
        out.extend_from_slice(PACK_SIGNATURE);
        out.write_u32(2)?;
        out.write_u32(oids.len() as u32)?;

        for &oid in oids {
            let obj = repo.read_obj(oid)?;
            let mut bytes = Vec::new();
            obj.serialize(&mut bytes)?;
            write_obj_header(&mut out, pack_type_code(obj.obj_type()), bytes.len() as u64);
            let mut compressor = ZlibEncoder::new(Vec::new(), Compression::default());
            compressor.write_all(&bytes)?;
            out.extend(compressor.finish()?);
        }

        let checksum = hash::hash_bytes(&out);
        out.extend_from_slice(checksum.as_bytes());
        Ok(out)
    }
}

fn pack_type_code(obj_type: BitObjType) -> u8 {
    match obj_type {
        BitObjType::Commit => 1,
        BitObjType::Tree => 2,
        BitObjType::Blob => 3,
        BitObjType::Tag => 4,
    }
}

/// mirror image of `PackfileReader::read_pack_obj_header`: 3-bit type and the
/// low 4 bits of `size` in the first byte (MSB = more size bytes follow),
/// then 7 bits of size per continuation byte.
fn write_obj_header(out: &mut Vec<u8>, ty: u8, mut size: u64) {
    let mut first = ((ty & 0x7) << 4) | (size & 0x0f) as u8;
    size >>= 4;
    if size > 0 {
        first |= 0x80;
    }
    out.push(first);
    while size > 0 {
        let mut byte = (size & 0x7f) as u8;
        size >>= 7;
        if size > 0 {
            byte |= 0x80;
        }
        out.push(byte);
    }
}

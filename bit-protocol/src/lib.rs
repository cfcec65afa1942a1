//! Wire-level encoding/decoding for the git smart protocol.
//!
//! This crate is deliberately independent of `libbit`'s object model: it knows about
//! pkt-lines, side-band multiplexing, capability tokens and the shape of the
//! ref-advertisement / `ls-refs` / `fetch` / `receive-pack` conversations, but nothing
//! about how objects are stored or hashed. `libbit` adapts these types to its own
//! `Oid` and transport traits.

#![deny(rust_2018_idioms)]

#[macro_use]
extern crate thiserror;

pub mod caps;
pub mod error;
pub mod oid;
pub mod pktline;
pub mod sideband;
pub mod v1;
pub mod v2;

pub use caps::{Capabilities, Capabilities2};
pub use error::{ProtocolError, ProtocolResult};
pub use oid::RawOid;
pub use pktline::{PktLine, PktLineReader};
pub use sideband::{SideBandChannel, SideBandDemux};

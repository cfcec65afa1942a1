//! Bridges `bit-protocol`'s wire-level codecs into `libbit`'s object model.
//!
//! `bit-protocol` knows pkt-lines, side-band framing and the shape of the v1/v2
//! conversations but nothing about how oids are hashed or stored; this module
//! converts between its hash-agnostic [`RawOid`] and our [`Oid`] and picks
//! between the v1 and v2 codecs for a freshly-opened connection.

use crate::error::{BitGenericError, BitResult, ErrorKind};
use crate::obj::Oid;
use bit_protocol::oid::RawOid;
use bit_protocol::pktline::{PktLine, PktLineReader};
use bit_protocol::v1::{self, RefAdvertisement};
use bit_protocol::v2::{self, Capabilities2};
use bit_protocol::{Capabilities, ProtocolError};
use std::fmt::{self, Display, Formatter};
use tokio::io::AsyncRead;

pub fn to_raw_oid(oid: Oid) -> RawOid {
    RawOid::from_bytes(oid.as_bytes())
}

pub fn from_raw_oid(raw: RawOid) -> BitResult<Oid> {
    let bytes: [u8; 20] = raw
        .as_bytes()
        .try_into()
        .map_err(|_| ErrorKind::parse("oid", "expected a 20-byte (sha1) object id"))?;
    Ok(Oid::new(bytes))
}

/// What protocol version a freshly-connected transport ended up speaking, and
/// the advertisement that came with it. Every concrete [`crate::transport::Transport`]
/// produces one of these from [`discover`] before the fetch/push orchestrator
/// in [`crate::remote`] takes over.
#[derive(Debug, Clone)]
pub enum Discovery {
    V1(RefAdvertisement),
    /// v2 never advertises refs up front; the client must issue `ls-refs`
    /// itself once it knows the server's capabilities.
    V2(Capabilities2),
}

impl Discovery {
    pub fn is_v2(&self) -> bool {
        matches!(self, Self::V2(..))
    }
}

impl Display for Discovery {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::V1(ads) => write!(f, "protocol v1, {} ref(s) advertised", ads.refs.len()),
            Self::V2(caps) => write!(f, "protocol v2, agent `{}`", caps.agent().unwrap_or("unknown")),
        }
    }
}

/// Parses the ref advertisement directly, without probing for a `version 2`
/// line. Used when the transport never asked for v2 (no `Git-Protocol` header
/// / `GIT_PROTOCOL` env var was sent, so the peer can only reply with v1).
pub async fn discover_v1<R: AsyncRead + Unpin>(reader: &mut PktLineReader<R>) -> BitResult<Discovery> {
    v1::parse_ref_advertisement(reader).await.map(Discovery::V1).map_err(protocol_err)
}

/// Reads the `version 2` line and the capability list that follows it. Only
/// valid to call when the transport actually requested v2 (the peer is
/// required to send `version 2` first in that case, so there is nothing to
/// probe: a transport that didn't ask for v2 must call [`discover_v1`] instead).
pub async fn discover_v2<R: AsyncRead + Unpin>(reader: &mut PktLineReader<R>) -> BitResult<Discovery> {
    if !v2::detect_version2(reader).await.map_err(protocol_err)? {
        return Err(ErrorKind::parse("ref advertisement", "requested protocol v2 but peer did not send `version 2`").into());
    }
    let caps = v2::parse_capabilities2(reader).await.map_err(protocol_err)?;
    Ok(Discovery::V2(caps))
}

/// Reads whatever the peer actually sent after a v2 request was made, falling
/// back to v1 when the peer doesn't understand `Git-Protocol`/`GIT_PROTOCOL`
/// and answers with an ordinary ref advertisement instead (every v1 peer, and
/// plenty of v2-capable ones configured not to advertise it). The first line
/// decides: a `version 2` data line means v2; anything else is pushed back and
/// handed to the v1 parser untouched.
pub async fn discover<R: AsyncRead + Unpin>(
    reader: &mut PktLineReader<R>,
    requested_v2: bool,
) -> BitResult<Discovery> {
    if !requested_v2 {
        return discover_v1(reader).await;
    }
    let first = reader.read_line().await.map_err(protocol_err)?;
    match &first {
        Some(PktLine::Data(data)) if data.starts_with(b"version 2") => {
            let caps = v2::parse_capabilities2(reader).await.map_err(protocol_err)?;
            Ok(Discovery::V2(caps))
        }
        Some(line) => {
            reader.push_back(line.clone());
            discover_v1(reader).await
        }
        None => Err(ErrorKind::parse("ref advertisement", "empty response from peer").into()),
    }
}

pub fn default_capabilities(agent: &str) -> Capabilities {
    let mut caps = Capabilities::new();
    caps.insert(bit_protocol::caps::Token::Bare("multi_ack_detailed".to_owned()));
    caps.insert(bit_protocol::caps::Token::Bare("side-band-64k".to_owned()));
    caps.insert(bit_protocol::caps::Token::Bare("ofs-delta".to_owned()));
    caps.insert(bit_protocol::caps::Token::Bare("thin-pack".to_owned()));
    caps.insert(bit_protocol::caps::Token::KeyValue("agent".to_owned(), agent.to_owned()));
    caps
}

pub(crate) fn protocol_err(err: ProtocolError) -> BitGenericError {
    ErrorKind::parse("protocol message", err.to_string()).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bit_protocol::pktline::{encode, flush};

    #[test]
    fn raw_oid_roundtrips_through_bit_oid() {
        let oid = Oid::new([7; 20]);
        let raw = to_raw_oid(oid);
        assert_eq!(from_raw_oid(raw).unwrap(), oid);
    }

    #[tokio::test]
    async fn discover_picks_v2_when_peer_sends_version_2() {
        let mut buf = Vec::new();
        buf.extend(encode(b"version 2\n").unwrap());
        buf.extend(encode(b"agent=bit/0.1\n").unwrap());
        buf.extend(encode(b"ls-refs\n").unwrap());
        buf.extend_from_slice(flush());
        let mut reader = PktLineReader::new(&buf[..]);
        let discovery = discover(&mut reader, true).await.unwrap();
        assert!(discovery.is_v2());
    }

    /// a peer that doesn't understand `Git-Protocol` just answers with an
    /// ordinary v1 advertisement; `discover` must fall back rather than
    /// erroring out because the first line isn't `version 2`.
    #[tokio::test]
    async fn discover_falls_back_to_v1_when_peer_ignores_version_request() {
        let oid = "0".repeat(40);
        let mut buf = Vec::new();
        buf.extend(encode(format!("{} refs/heads/master\0ofs-delta\n", oid).as_bytes()).unwrap());
        buf.extend_from_slice(flush());
        let mut reader = PktLineReader::new(&buf[..]);
        let discovery = discover(&mut reader, true).await.unwrap();
        match discovery {
            Discovery::V1(ad) => assert_eq!(ad.refs.len(), 1),
            Discovery::V2(..) => panic!("expected v1 fallback"),
        }
    }

    #[tokio::test]
    async fn discover_skips_version_probe_when_not_requested() {
        let oid = "0".repeat(40);
        let mut buf = Vec::new();
        buf.extend(encode(format!("{} refs/heads/master\0ofs-delta\n", oid).as_bytes()).unwrap());
        buf.extend_from_slice(flush());
        let mut reader = PktLineReader::new(&buf[..]);
        let discovery = discover(&mut reader, false).await.unwrap();
        assert!(!discovery.is_v2());
    }
}

//! pkt-line framing: `<4 hex length><payload>`, per `gitprotocol-common(5)`.

use crate::error::{ProtocolError, ProtocolResult};
use tokio::io::{AsyncRead, AsyncReadExt};

/// Git caps a pkt-line's payload at `LARGE_PACKET_DATA_MAX` (65516 bytes),
/// well short of the 4-hex-digit length field's theoretical `0xffff` frame
/// size, so every peer has headroom to prepend a side-band channel byte
/// without ever needing a frame right at the wire format's limit.
pub const MAX_PAYLOAD_SIZE: usize = 65516;
pub const MAX_PKT_LINE_SIZE: usize = MAX_PAYLOAD_SIZE + 4;

const FLUSH_PKT: &[u8; 4] = b"0000";
const DELIM_PKT: &[u8; 4] = b"0001";
const RESPONSE_END_PKT: &[u8; 4] = b"0002";

/// One decoded unit of the pkt-line stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PktLine {
    Data(Vec<u8>),
    Flush,
    Delim,
    /// `0002`, the protocol v2 "response-end" sentinel. Tolerated on read, never emitted.
    ResponseEnd,
}

impl PktLine {
    pub fn data(&self) -> Option<&[u8]> {
        match self {
            Self::Data(bytes) => Some(bytes),
            _ => None,
        }
    }

    pub fn is_flush(&self) -> bool {
        matches!(self, Self::Flush)
    }

    pub fn is_delim(&self) -> bool {
        matches!(self, Self::Delim)
    }
}

/// Encodes `payload` as a single pkt-line. The caller must chunk payloads longer
/// than [`MAX_PAYLOAD_SIZE`] themselves; this function does not split.
pub fn encode(payload: &[u8]) -> ProtocolResult<Vec<u8>> {
    if payload.len() > MAX_PAYLOAD_SIZE {
        return Err(ProtocolError::PayloadTooLarge(payload.len()));
    }
    let len = payload.len() + 4;
    let mut out = Vec::with_capacity(len);
    out.extend_from_slice(format!("{:04x}", len).as_bytes());
    out.extend_from_slice(payload);
    Ok(out)
}

pub fn flush() -> &'static [u8] {
    FLUSH_PKT
}

pub fn delim() -> &'static [u8] {
    DELIM_PKT
}

/// A cursor over an in-memory buffer, used for parsing responses that have
/// already been fully read into memory (e.g. the packetlines channel of a
/// side-band demux, or small request bodies).
pub struct PktLineCursor<'a> {
    buf: &'a [u8],
}

impl<'a> PktLineCursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    pub fn next(&mut self) -> ProtocolResult<Option<PktLine>> {
        if self.buf.is_empty() {
            return Ok(None);
        }
        let (line, rest) = decode_one(self.buf)?;
        self.buf = rest;
        Ok(Some(line))
    }

    pub fn remaining(&self) -> &'a [u8] {
        self.buf
    }
}

/// Parses exactly one pkt-line off the front of `buf`, returning the decoded
/// line and the remaining bytes.
fn decode_one(buf: &[u8]) -> ProtocolResult<(PktLine, &[u8])> {
    if buf.len() < 4 {
        return Err(ProtocolError::UnexpectedEof);
    }
    let (len_bytes, rest) = buf.split_at(4);
    match len_bytes {
        b"0000" => return Ok((PktLine::Flush, rest)),
        b"0001" => return Ok((PktLine::Delim, rest)),
        b"0002" => return Ok((PktLine::ResponseEnd, rest)),
        _ => {}
    }
    let len_str = std::str::from_utf8(len_bytes)
        .map_err(|_| invalid_length(len_bytes))?;
    let len = usize::from_str_radix(len_str, 16).map_err(|_| invalid_length(len_bytes))?;
    if len < 4 || len > MAX_PKT_LINE_SIZE {
        return Err(invalid_length(len_bytes));
    }
    let payload_len = len - 4;
    if rest.len() < payload_len {
        return Err(ProtocolError::UnexpectedEof);
    }
    let (payload, rest) = rest.split_at(payload_len);
    Ok((PktLine::Data(payload.to_vec()), rest))
}

fn invalid_length(bytes: &[u8]) -> ProtocolError {
    let mut s = String::from_utf8_lossy(bytes).into_owned();
    s.push('\0');
    ProtocolError::InvalidPktLineLength(s)
}

/// An async pkt-line reader over any `AsyncRead`. 8-bit clean: never assumes
/// the payload is UTF-8.
pub struct PktLineReader<R> {
    inner: R,
    /// a single line pushed back by [`Self::push_back`], returned by the next
    /// [`Self::read_line`] before anything is read off `inner`. Used to peek
    /// at the first line of a response to tell a `version 2` preamble apart
    /// from an ordinary v1 ref advertisement.
    pending: Option<PktLine>,
}

impl<R: AsyncRead + Unpin> PktLineReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, pending: None }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    /// Un-reads `line` so the next [`Self::read_line`] call returns it again.
    pub fn push_back(&mut self, line: PktLine) {
        debug_assert!(self.pending.is_none(), "push_back called with a line already pending");
        self.pending = Some(line);
    }

    /// Reads a single pkt-line. Returns `Ok(None)` at a clean EOF before any
    /// bytes of a new frame were read; a truncated frame is an error.
    pub async fn read_line(&mut self) -> ProtocolResult<Option<PktLine>> {
        if let Some(line) = self.pending.take() {
            return Ok(Some(line));
        }
        let mut len_bytes = [0u8; 4];
        match self.inner.read_exact(&mut len_bytes).await {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e.into()),
        }
        match &len_bytes {
            b"0000" => return Ok(Some(PktLine::Flush)),
            b"0001" => return Ok(Some(PktLine::Delim)),
            b"0002" => return Ok(Some(PktLine::ResponseEnd)),
            _ => {}
        }
        let len_str = std::str::from_utf8(&len_bytes).map_err(|_| invalid_length(&len_bytes))?;
        let len = usize::from_str_radix(len_str, 16).map_err(|_| invalid_length(&len_bytes))?;
        if len < 4 || len > MAX_PKT_LINE_SIZE {
            return Err(invalid_length(&len_bytes));
        }
        let mut payload = vec![0u8; len - 4];
        self.inner.read_exact(&mut payload).await?;
        Ok(Some(PktLine::Data(payload)))
    }

    /// Reads lines until (and including consuming, but not returning) a flush-pkt.
    pub async fn read_until_flush(&mut self) -> ProtocolResult<Vec<Vec<u8>>> {
        let mut lines = Vec::new();
        loop {
            match self.read_line().await? {
                None => return Err(ProtocolError::UnexpectedEof),
                Some(PktLine::Flush) => return Ok(lines),
                Some(PktLine::Data(data)) => lines.push(data),
                Some(PktLine::Delim) | Some(PktLine::ResponseEnd) => continue,
            }
        }
    }
}

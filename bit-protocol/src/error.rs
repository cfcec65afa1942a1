use std::fmt;

pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors that can arise purely from decoding/encoding the wire format, independent
/// of the transport that produced the bytes or the object store consuming them.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("invalid pkt-line length `{0}`")]
    InvalidPktLineLength(String),
    #[error("pkt-line payload of {0} bytes exceeds the maximum of {max}", max = crate::pktline::MAX_PAYLOAD_SIZE)]
    PayloadTooLarge(usize),
    #[error("unexpected end of stream while reading pkt-line")]
    UnexpectedEof,
    #[error("malformed ref advertisement line: `{0}`")]
    MalformedAdvertisement(String),
    #[error("invalid object id `{0}`")]
    InvalidOid(String),
    #[error("side-band channel {0} is not one of {{1, 2, 3}}")]
    InvalidSideBandChannel(u8),
    #[error("fatal error reported by remote: {0}")]
    RemoteFatal(String),
    #[error("expected protocol v2 but server did not send `version 2`")]
    NotProtocolV2,
    #[error("malformed capability token `{0}`")]
    MalformedCapability(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProtocolError {
    pub fn malformed_advertisement(line: impl Into<Vec<u8>>) -> Self {
        Self::MalformedAdvertisement(String::from_utf8_lossy(&line.into()).into_owned())
    }
}

// allows tests to use `{:?}` without every variant carrying non-Debug fields
impl PartialEq for ProtocolError {
    fn eq(&self, other: &Self) -> bool {
        format!("{:?}", self) == format!("{:?}", other)
    }
}

pub(crate) fn fmt_bytes(bytes: &[u8], f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", String::from_utf8_lossy(bytes))
}

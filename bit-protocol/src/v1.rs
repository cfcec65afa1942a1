//! Protocol v1: ref advertisement, `upload-pack` (fetch) and `receive-pack`
//! (push) request/response framing.

use crate::caps::{Capabilities, Token};
use crate::error::{ProtocolError, ProtocolResult};
use crate::oid::RawOid;
use crate::pktline::{encode, flush, PktLine, PktLineReader};
use tokio::io::AsyncRead;

/// A single advertised ref line: `<oid> <name>`, with capabilities parsed off
/// the first line and symrefs (`symref=HEAD:refs/heads/main`) folded into
/// `symrefs` for convenience.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefAdvertisement {
    pub refs: Vec<(RawOid, String)>,
    pub caps: Capabilities,
    pub symrefs: Vec<(String, String)>,
    pub shallow: Vec<RawOid>,
}

impl RefAdvertisement {
    /// Resolves a symref (e.g. `HEAD`) to the oid it points at, by following
    /// the advertised target name into `refs`.
    pub fn head_oid(&self) -> Option<RawOid> {
        let (_, target) = self.symrefs.iter().find(|(name, _)| name == "HEAD")?;
        self.refs.iter().find(|(_, name)| name == target).map(|(oid, _)| *oid)
    }

    pub fn is_empty_repository(&self) -> bool {
        self.refs.is_empty()
    }
}

/// Parses a v1 ref advertisement (service smart-HTTP has already stripped the
/// `# service=...` pkt-line and its following flush before this is called; the
/// git:// and SSH transports never send one at all).
///
/// S2: an advertisement for an empty repository is exactly one `<zero-oid>
/// capabilities^{}\0<caps>` line followed by a flush, with no further ref
/// lines; `refs` is correctly empty rather than containing the sentinel line.
pub async fn parse_ref_advertisement<R: AsyncRead + Unpin>(
    reader: &mut PktLineReader<R>,
) -> ProtocolResult<RefAdvertisement> {
    let mut refs = Vec::new();
    let mut caps = Capabilities::new();
    let mut shallow = Vec::new();
    let mut first = true;

    loop {
        match reader.read_line().await? {
            None => return Err(ProtocolError::UnexpectedEof),
            Some(PktLine::Flush) => break,
            Some(PktLine::Delim) | Some(PktLine::ResponseEnd) => continue,
            Some(PktLine::Data(data)) => {
                let line = String::from_utf8_lossy(&data);
                let line = line.trim_end_matches('\n');

                if let Some(rest) = line.strip_prefix("shallow ") {
                    shallow.push(RawOid::parse_hex(rest).map_err(|_| ProtocolError::malformed_advertisement(data.clone()))?);
                    continue;
                }

                let (ref_part, cap_part) = match line.split_once('\0') {
                    Some((r, c)) => (r, Some(c)),
                    None => (line, None),
                };
                let (oid_str, name) = ref_part
                    .split_once(' ')
                    .ok_or_else(|| ProtocolError::malformed_advertisement(data.clone()))?;
                let oid = RawOid::parse_hex(oid_str)
                    .map_err(|_| ProtocolError::malformed_advertisement(data.clone()))?;

                if first {
                    first = false;
                    if let Some(cap_str) = cap_part {
                        caps = Capabilities::parse(cap_str);
                    }
                    // `capabilities^{}` is the sentinel ref name for an empty repository's
                    // sole advertisement line; it carries no real ref.
                    if name == "capabilities^{}" {
                        continue;
                    }
                }
                refs.push((oid, name.to_owned()));
            }
        }
    }

    let symrefs = caps.symrefs().collect();
    Ok(RefAdvertisement { refs, caps, symrefs, shallow })
}

/// Builds the `want`/`have` negotiation body of a v1 `upload-pack` request.
/// The first `want` line carries the negotiated capabilities; every line after
/// is plain. Terminated by a flush, then (if `haves` is non-empty or this is a
/// stateless-rpc round) a second flush after the `have` lines, followed by `done`.
pub struct UploadPackRequestBuilder {
    wants: Vec<RawOid>,
    haves: Vec<RawOid>,
    shallow: Vec<RawOid>,
    depth: Option<u32>,
    deepen_since: Option<u64>,
    deepen_not: Vec<String>,
    deepen_relative: bool,
    caps: Capabilities,
    done: bool,
}

impl UploadPackRequestBuilder {
    pub fn new(caps: Capabilities) -> Self {
        Self {
            wants: Vec::new(),
            haves: Vec::new(),
            shallow: Vec::new(),
            depth: None,
            deepen_since: None,
            deepen_not: Vec::new(),
            deepen_relative: false,
            caps,
            done: false,
        }
    }

    pub fn deepen_since(mut self, epoch_seconds: u64) -> Self {
        self.deepen_since = Some(epoch_seconds);
        self
    }

    pub fn deepen_not(mut self, refname: impl Into<String>) -> Self {
        self.deepen_not.push(refname.into());
        self
    }

    pub fn deepen_relative(mut self) -> Self {
        self.deepen_relative = true;
        self
    }

    pub fn want(mut self, oid: RawOid) -> Self {
        self.wants.push(oid);
        self
    }

    pub fn have(mut self, oid: RawOid) -> Self {
        self.haves.push(oid);
        self
    }

    pub fn shallow(mut self, oid: RawOid) -> Self {
        self.shallow.push(oid);
        self
    }

    pub fn depth(mut self, depth: u32) -> Self {
        self.depth = Some(depth);
        self
    }

    pub fn done(mut self) -> Self {
        self.done = true;
        self
    }

    pub fn build(self) -> ProtocolResult<Vec<u8>> {
        let mut out = Vec::new();
        for (i, want) in self.wants.iter().enumerate() {
            let line = if i == 0 {
                format!("want {} {}\n", want, self.caps.to_request_string())
            } else {
                format!("want {}\n", want)
            };
            out.extend(encode(line.as_bytes())?);
        }
        for oid in &self.shallow {
            out.extend(encode(format!("shallow {}\n", oid).as_bytes())?);
        }
        if let Some(depth) = self.depth {
            out.extend(encode(format!("deepen {}\n", depth).as_bytes())?);
        }
        if let Some(since) = self.deepen_since {
            out.extend(encode(format!("deepen-since {}\n", since).as_bytes())?);
        }
        for refname in &self.deepen_not {
            out.extend(encode(format!("deepen-not {}\n", refname).as_bytes())?);
        }
        if self.deepen_relative {
            out.extend(encode(b"deepen-relative\n")?);
        }
        out.extend_from_slice(flush());
        for have in &self.haves {
            out.extend(encode(format!("have {}\n", have).as_bytes())?);
        }
        if self.done || !self.haves.is_empty() {
            out.extend(encode(b"done\n")?);
        } else if self.wants.is_empty() {
            // nothing to fetch; caller sends only the initial flush
        }
        Ok(out)
    }
}

/// The negotiation portion of an `upload-pack` response, before the packfile
/// itself (or its side-band envelope) begins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadPackNegotiation {
    pub acks: Vec<RawOid>,
    pub nak: bool,
    pub shallow: Vec<RawOid>,
    pub unshallow: Vec<RawOid>,
}

/// Parses the non-side-band control lines (already demuxed onto the
/// packetlines channel, or read directly when no side-band was negotiated)
/// that precede the packfile bytes.
pub fn parse_upload_pack_negotiation(lines: &[Vec<u8>]) -> ProtocolResult<UploadPackNegotiation> {
    let mut negotiation = UploadPackNegotiation::default();
    for line in lines {
        let text = String::from_utf8_lossy(line);
        let text = text.trim_end_matches('\n');
        if text == "NAK" {
            negotiation.nak = true;
        } else if let Some(rest) = text.strip_prefix("ACK ") {
            let oid_str = rest.split_ascii_whitespace().next().unwrap_or(rest);
            negotiation.acks.push(RawOid::parse_hex(oid_str).map_err(|_| ProtocolError::malformed_advertisement(line.clone()))?);
        } else if let Some(rest) = text.strip_prefix("shallow ") {
            negotiation.shallow.push(RawOid::parse_hex(rest).map_err(|_| ProtocolError::malformed_advertisement(line.clone()))?);
        } else if let Some(rest) = text.strip_prefix("unshallow ") {
            negotiation.unshallow.push(RawOid::parse_hex(rest).map_err(|_| ProtocolError::malformed_advertisement(line.clone()))?);
        } else {
            return Err(ProtocolError::malformed_advertisement(line.clone()));
        }
    }
    Ok(negotiation)
}

/// One `<old-oid> <new-oid> <ref>` command line of a `receive-pack` request,
/// plus the helpers needed to classify it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushCommand {
    pub old_oid: RawOid,
    pub new_oid: RawOid,
    pub refname: String,
}

impl PushCommand {
    pub fn is_create(&self) -> bool {
        self.old_oid.is_zero() && !self.new_oid.is_zero()
    }

    pub fn is_delete(&self) -> bool {
        !self.old_oid.is_zero() && self.new_oid.is_zero()
    }

    pub fn is_update(&self) -> bool {
        !self.old_oid.is_zero() && !self.new_oid.is_zero()
    }
}

/// Builds the command list (and, separately, the caller attaches the packfile
/// after the flush) of a v1 `receive-pack` request. The first command line
/// carries the negotiated capabilities after a NUL byte.
pub fn build_receive_pack_commands(commands: &[PushCommand], caps: &Capabilities) -> ProtocolResult<Vec<u8>> {
    let mut out = Vec::new();
    for (i, cmd) in commands.iter().enumerate() {
        let line = if i == 0 {
            format!("{} {} {}\0{}\n", cmd.old_oid, cmd.new_oid, cmd.refname, caps.to_request_string())
        } else {
            format!("{} {} {}\n", cmd.old_oid, cmd.new_oid, cmd.refname)
        };
        out.extend(encode(line.as_bytes())?);
    }
    out.extend_from_slice(flush());
    Ok(out)
}

/// Per-ref status lines from a `receive-pack` report-status response, plus the
/// overall unpack status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReceivePackReport {
    pub unpack_ok: bool,
    pub unpack_error: Option<String>,
    pub ref_status: Vec<(String, Result<(), String>)>,
}

pub fn parse_receive_pack_report(lines: &[Vec<u8>]) -> ProtocolResult<ReceivePackReport> {
    let mut report = ReceivePackReport::default();
    for line in lines {
        let text = String::from_utf8_lossy(line);
        let text = text.trim_end_matches('\n');
        if let Some(rest) = text.strip_prefix("unpack ") {
            if rest == "ok" {
                report.unpack_ok = true;
            } else {
                report.unpack_error = Some(rest.to_owned());
            }
        } else if let Some(rest) = text.strip_prefix("ok ") {
            report.ref_status.push((rest.to_owned(), Ok(())));
        } else if let Some(rest) = text.strip_prefix("ng ") {
            let (refname, msg) = rest.split_once(' ').unwrap_or((rest, "unknown error"));
            report.ref_status.push((refname.to_owned(), Err(msg.to_owned())));
        } else {
            return Err(ProtocolError::malformed_advertisement(line.clone()));
        }
    }
    Ok(report)
}

/// Converts a parsed capability token into the bare `agent=` value, if present.
pub fn agent_of(caps: &Capabilities) -> Option<&str> {
    caps.iter().find_map(|t| match t {
        Token::KeyValue(k, v) if k == "agent" => Some(v.as_str()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pktline::encode;

    async fn reader_for(lines: &[&str]) -> PktLineReader<std::io::Cursor<Vec<u8>>> {
        let mut buf = Vec::new();
        for line in lines {
            buf.extend(encode(line.as_bytes()).unwrap());
        }
        buf.extend_from_slice(flush());
        PktLineReader::new(std::io::Cursor::new(buf))
    }

    #[tokio::test]
    async fn parses_normal_advertisement_with_symrefs() {
        let oid1 = "a".repeat(40);
        let oid2 = "b".repeat(40);
        let mut reader = reader_for(&[
            &format!("{} HEAD\0multi_ack symref=HEAD:refs/heads/main agent=git/2.40\n", oid1),
            &format!("{} refs/heads/main\n", oid2),
        ])
        .await;
        let adv = parse_ref_advertisement(&mut reader).await.unwrap();
        assert_eq!(adv.refs.len(), 2);
        assert_eq!(adv.head_oid(), Some(RawOid::parse_hex(&oid1).unwrap()));
        assert!(adv.caps.contains_bare("multi_ack"));
    }

    // S2
    #[tokio::test]
    async fn parses_empty_repository_advertisement() {
        let zero = "0".repeat(40);
        let mut reader = reader_for(&[&format!("{} capabilities^{{}}\0report-status\n", zero)]).await;
        let adv = parse_ref_advertisement(&mut reader).await.unwrap();
        assert!(adv.is_empty_repository());
        assert!(adv.caps.contains_bare("report-status"));
    }

    #[test]
    fn builds_want_request_with_caps_on_first_line() {
        let mut caps = Capabilities::new();
        caps.insert(Token::Bare("multi_ack_detailed".into())).insert(Token::Bare("side-band-64k".into()));
        let oid = RawOid::parse_hex(&"c".repeat(40)).unwrap();
        let body = UploadPackRequestBuilder::new(caps).want(oid).build().unwrap();
        let text = String::from_utf8_lossy(&body);
        assert!(text.contains("want cccccccccccccccccccccccccccccccccccccccc multi_ack_detailed side-band-64k\n"));
        assert!(body.ends_with(flush()));
    }

    #[test]
    fn classifies_push_commands() {
        let zero = RawOid::zero(20);
        let oid = RawOid::parse_hex(&"d".repeat(40)).unwrap();
        assert!(PushCommand { old_oid: zero, new_oid: oid, refname: "refs/heads/x".into() }.is_create());
        assert!(PushCommand { old_oid: oid, new_oid: zero, refname: "refs/heads/x".into() }.is_delete());
        assert!(PushCommand { old_oid: oid, new_oid: oid, refname: "refs/heads/x".into() }.is_update());
    }

    #[test]
    fn parses_receive_pack_report_with_mixed_results() {
        let lines = vec![
            b"unpack ok\n".to_vec(),
            b"ok refs/heads/main\n".to_vec(),
            b"ng refs/heads/feature non-fast-forward\n".to_vec(),
        ];
        let report = parse_receive_pack_report(&lines).unwrap();
        assert!(report.unpack_ok);
        assert_eq!(report.ref_status[0], ("refs/heads/main".to_owned(), Ok(())));
        assert_eq!(report.ref_status[1].1, Err("non-fast-forward".to_owned()));
    }
}

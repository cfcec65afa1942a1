//! Protocol v2: capability advertisement, `ls-refs`, and `fetch` command framing.
//!
//! v2 drops the combined ref-advertisement-plus-capabilities line of v1 in
//! favour of an explicit capability list followed by an opt-in `ls-refs`
//! command, and wraps every request in `command=<name>` plus a final flush.

use crate::caps::Capabilities2;
use crate::error::{ProtocolError, ProtocolResult};
use crate::oid::RawOid;
use crate::pktline::{delim, encode, flush, PktLine, PktLineReader};
use tokio::io::AsyncRead;

/// Reads the `version 2` line a server must send first when v2 was requested
/// (via the `Git-Protocol: version=2` header or `GIT_PROTOCOL` env var).
/// Smart-HTTP transports call this after stripping the service announcement;
/// git:// and SSH transports call it directly.
pub async fn detect_version2<R: AsyncRead + Unpin>(reader: &mut PktLineReader<R>) -> ProtocolResult<bool> {
    match reader.read_line().await? {
        Some(PktLine::Data(data)) if data.starts_with(b"version 2") => Ok(true),
        _ => Ok(false),
    }
}

/// Parses the capability advertisement that follows a `version 2` line, up to
/// (and including consuming) the terminating flush.
pub async fn parse_capabilities2<R: AsyncRead + Unpin>(
    reader: &mut PktLineReader<R>,
) -> ProtocolResult<Capabilities2> {
    let mut caps = Capabilities2::new();
    loop {
        match reader.read_line().await? {
            None => return Err(ProtocolError::UnexpectedEof),
            Some(PktLine::Flush) => break,
            Some(PktLine::Delim) | Some(PktLine::ResponseEnd) => continue,
            Some(PktLine::Data(data)) => {
                let line = String::from_utf8_lossy(&data);
                caps.insert_line(line.trim_end_matches('\n'));
            }
        }
    }
    Ok(caps)
}

/// Builds an `ls-refs` v2 request: `command=ls-refs`, capability lines, a
/// delimiter, then arguments, then a flush.
pub struct LsRefsRequestBuilder {
    ref_prefixes: Vec<String>,
    symrefs: bool,
    peel: bool,
}

impl LsRefsRequestBuilder {
    pub fn new() -> Self {
        Self { ref_prefixes: Vec::new(), symrefs: false, peel: false }
    }

    pub fn ref_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.ref_prefixes.push(prefix.into());
        self
    }

    pub fn symrefs(mut self) -> Self {
        self.symrefs = true;
        self
    }

    pub fn peel(mut self) -> Self {
        self.peel = true;
        self
    }

    pub fn build(self) -> ProtocolResult<Vec<u8>> {
        let mut out = Vec::new();
        out.extend(encode(b"command=ls-refs\n")?);
        out.extend_from_slice(delim());
        if self.symrefs {
            out.extend(encode(b"symrefs\n")?);
        }
        if self.peel {
            out.extend(encode(b"peel\n")?);
        }
        for prefix in &self.ref_prefixes {
            out.extend(encode(format!("ref-prefix {}\n", prefix).as_bytes())?);
        }
        out.extend_from_slice(flush());
        Ok(out)
    }
}

impl Default for LsRefsRequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// One ref reported by `ls-refs`: `<oid> <name>[ symref-target:<target>][ peeled:<oid>]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LsRefsEntry {
    pub oid: RawOid,
    pub name: String,
    pub symref_target: Option<String>,
    pub peeled: Option<RawOid>,
}

pub async fn parse_ls_refs_response<R: AsyncRead + Unpin>(
    reader: &mut PktLineReader<R>,
) -> ProtocolResult<Vec<LsRefsEntry>> {
    let mut entries = Vec::new();
    loop {
        match reader.read_line().await? {
            None => return Err(ProtocolError::UnexpectedEof),
            Some(PktLine::Flush) => break,
            Some(PktLine::Delim) | Some(PktLine::ResponseEnd) => continue,
            Some(PktLine::Data(data)) => {
                let line = String::from_utf8_lossy(&data);
                let line = line.trim_end_matches('\n');
                let mut parts = line.split(' ');
                let oid_str = parts.next().ok_or_else(|| ProtocolError::malformed_advertisement(data.clone()))?;
                let name = parts.next().ok_or_else(|| ProtocolError::malformed_advertisement(data.clone()))?;
                let oid = RawOid::parse_hex(oid_str).map_err(|_| ProtocolError::malformed_advertisement(data.clone()))?;
                let mut symref_target = None;
                let mut peeled = None;
                for attr in parts {
                    if let Some(target) = attr.strip_prefix("symref-target:") {
                        symref_target = Some(target.to_owned());
                    } else if let Some(oid_str) = attr.strip_prefix("peeled:") {
                        peeled = Some(
                            RawOid::parse_hex(oid_str).map_err(|_| ProtocolError::malformed_advertisement(data.clone()))?,
                        );
                    }
                }
                entries.push(LsRefsEntry { oid, name: name.to_owned(), symref_target, peeled });
            }
        }
    }
    Ok(entries)
}

/// Builds a `fetch` v2 request: `command=fetch`, negotiated capabilities,
/// delimiter, then `want`/`have`/`done` argument lines, then a flush.
///
/// Unlike v1, there is only ever one flush (the trailing one); arguments
/// between the delimiter and the flush form a single logical block that the
/// server consumes up to end-of-request.
pub struct FetchRequestBuilder {
    wants: Vec<RawOid>,
    haves: Vec<RawOid>,
    shallow: Vec<RawOid>,
    deepen: Option<u32>,
    deepen_since: Option<u64>,
    deepen_not: Vec<String>,
    deepen_relative: bool,
    want_ref: Vec<String>,
    done: bool,
    thin_pack: bool,
    no_progress: bool,
    include_tag: bool,
    ofs_delta: bool,
}

impl FetchRequestBuilder {
    pub fn new() -> Self {
        Self {
            wants: Vec::new(),
            haves: Vec::new(),
            shallow: Vec::new(),
            deepen: None,
            deepen_since: None,
            deepen_not: Vec::new(),
            deepen_relative: false,
            want_ref: Vec::new(),
            done: false,
            thin_pack: true,
            no_progress: false,
            include_tag: true,
            ofs_delta: true,
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

    pub fn deepen(mut self, depth: u32) -> Self {
        self.deepen = Some(depth);
        self
    }

    pub fn want_ref(mut self, refname: impl Into<String>) -> Self {
        self.want_ref.push(refname.into());
        self
    }

    pub fn done(mut self) -> Self {
        self.done = true;
        self
    }

    pub fn no_progress(mut self) -> Self {
        self.no_progress = true;
        self
    }

    pub fn without_tags(mut self) -> Self {
        self.include_tag = false;
        self
    }

    pub fn build(self) -> ProtocolResult<Vec<u8>> {
        let mut out = Vec::new();
        out.extend(encode(b"command=fetch\n")?);
        out.extend_from_slice(delim());
        if self.thin_pack {
            out.extend(encode(b"thin-pack\n")?);
        }
        if self.ofs_delta {
            out.extend(encode(b"ofs-delta\n")?);
        }
        if self.no_progress {
            out.extend(encode(b"no-progress\n")?);
        }
        if self.include_tag {
            out.extend(encode(b"include-tag\n")?);
        }
        for oid in &self.wants {
            out.extend(encode(format!("want {}\n", oid).as_bytes())?);
        }
        for refname in &self.want_ref {
            out.extend(encode(format!("want-ref {}\n", refname).as_bytes())?);
        }
        for oid in &self.shallow {
            out.extend(encode(format!("shallow {}\n", oid).as_bytes())?);
        }
        if let Some(depth) = self.deepen {
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
        for oid in &self.haves {
            out.extend(encode(format!("have {}\n", oid).as_bytes())?);
        }
        if self.done {
            out.extend(encode(b"done\n")?);
        }
        out.extend_from_slice(flush());
        Ok(out)
    }
}

impl Default for FetchRequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The acknowledgment section the server sends before the `packfile` section,
/// mirroring v1's ACK/NAK but keyed under a `acknowledgments` section header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchAcknowledgments {
    pub acks: Vec<RawOid>,
    pub ready: bool,
    pub nak: bool,
}

/// A v2 `fetch` response is split into `acknowledgments` / `shallow-info` /
/// `wanted-refs` / `packfile` sections, each introduced by its name on its own
/// line and terminated by a delimiter (or flush for the last section).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchResponseSections {
    pub acknowledgments: FetchAcknowledgments,
    pub shallow: Vec<RawOid>,
    pub unshallow: Vec<RawOid>,
    pub wanted_refs: Vec<(String, RawOid)>,
    /// True once the `packfile` section header has been consumed; the caller
    /// should switch to side-band demuxing of the remaining stream at that point.
    pub has_packfile_section: bool,
}

pub async fn parse_fetch_response_sections<R: AsyncRead + Unpin>(
    reader: &mut PktLineReader<R>,
) -> ProtocolResult<FetchResponseSections> {
    let mut sections = FetchResponseSections::default();
    let mut current = String::new();

    loop {
        match reader.read_line().await? {
            None => return Err(ProtocolError::UnexpectedEof),
            Some(PktLine::Flush) => break,
            Some(PktLine::Delim) => continue,
            Some(PktLine::ResponseEnd) => continue,
            Some(PktLine::Data(data)) => {
                let text = String::from_utf8_lossy(&data).trim_end_matches('\n').to_owned();
                if matches!(text.as_str(), "acknowledgments" | "shallow-info" | "wanted-refs" | "packfile") {
                    current = text.clone();
                    if text == "packfile" {
                        sections.has_packfile_section = true;
                        break;
                    }
                    continue;
                }
                match current.as_str() {
                    "acknowledgments" => {
                        if text == "NAK" {
                            sections.acknowledgments.nak = true;
                        } else if text == "ready" {
                            sections.acknowledgments.ready = true;
                        } else if let Some(rest) = text.strip_prefix("ACK ") {
                            sections.acknowledgments.acks.push(
                                RawOid::parse_hex(rest).map_err(|_| ProtocolError::malformed_advertisement(data.clone()))?,
                            );
                        }
                    }
                    "shallow-info" => {
                        if let Some(rest) = text.strip_prefix("shallow ") {
                            sections.shallow.push(
                                RawOid::parse_hex(rest).map_err(|_| ProtocolError::malformed_advertisement(data.clone()))?,
                            );
                        } else if let Some(rest) = text.strip_prefix("unshallow ") {
                            sections.unshallow.push(
                                RawOid::parse_hex(rest).map_err(|_| ProtocolError::malformed_advertisement(data.clone()))?,
                            );
                        }
                    }
                    "wanted-refs" => {
                        let (oid_str, name) =
                            text.split_once(' ').ok_or_else(|| ProtocolError::malformed_advertisement(data.clone()))?;
                        let oid = RawOid::parse_hex(oid_str).map_err(|_| ProtocolError::malformed_advertisement(data.clone()))?;
                        sections.wanted_refs.push((name.to_owned(), oid));
                    }
                    _ => return Err(ProtocolError::malformed_advertisement(data.clone())),
                }
            }
        }
    }
    Ok(sections)
}

//! Server side of the `upload-pack` conversation (the peer a `fetch`
//! connects to): advertises refs, negotiates the want/have set, and streams
//! back a packfile.
//!
//! This is deliberately the v1 half of the protocol only (a flat capability
//! string on the first ref line, non-multiplexed `ACK`/`NAK` negotiation).
//! [`crate::transport::FileTransport`] drives it over an in-process duplex
//! pipe; [`crate::bin::upload_pack`]-style standalone binaries would drive it
//! over stdin/stdout the same way.

use crate::error::{BitResult, ErrorKind};
use crate::obj::Oid;
use crate::pack::PackEncoder;
use crate::protocol;
use crate::refs::{BitRef, SymbolicRef};
use crate::repo::BitRepo;
use bit_protocol::caps::Token;
use bit_protocol::oid::RawOid;
use bit_protocol::pktline::{encode, flush, PktLine, PktLineReader};
use bit_protocol::v1::{self, PushCommand};
use bit_protocol::Capabilities;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

pub struct UploadPack<'rcx, R, W> {
    repo: BitRepo<'rcx>,
    reader: PktLineReader<R>,
    writer: W,
}

impl<'rcx, R, W> UploadPack<'rcx, R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(repo: BitRepo<'rcx>, reader: R, writer: W) -> Self {
        Self { repo, reader: PktLineReader::new(reader), writer }
    }

    /// blocking entry point, for callers (e.g. [`crate::transport::FileTransport`])
    /// that run this on a dedicated thread rather than the caller's async runtime.
    pub fn run(self) -> BitResult<()> {
        let rt = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
        rt.block_on(self.run_async())
    }

    pub async fn run_async(mut self) -> BitResult<()> {
        self.send_ref_advertisement().await?;
        let negotiation = self.receive_negotiation().await?;
        if negotiation.wants.is_empty() {
            // client only wanted to see the ref advertisement (a bare `ls-remote`)
            return Ok(());
        }
        self.send_pack(&negotiation).await
    }

    async fn send_ref_advertisement(&mut self) -> BitResult<()> {
        let refs = self.repo.ls_refs()?;
        let mut caps = Capabilities::new();
        caps.insert(Token::Bare("ofs-delta".to_owned()));
        caps.insert(Token::Bare("side-band-64k".to_owned()));
        caps.insert(Token::KeyValue("agent".to_owned(), "bit/0.1".to_owned()));

        let head = self.repo.read_head().ok().and_then(|r| match r {
            BitRef::Symbolic(sym) => Some(sym),
            BitRef::Direct(..) => None,
        });
        if let Some(head) = head {
            caps.insert(Token::KeyValue("symref".to_owned(), format!("HEAD:{}", head.path())));
        }

        let mut entries: Vec<(Oid, String)> = refs
            .into_iter()
            .filter_map(|r| match r {
                BitRef::Direct(..) => None,
                BitRef::Symbolic(sym) => {
                    let oid = self.repo.fully_resolve_ref(sym).ok()?;
                    Some((oid, sym.path().to_string()))
                }
            })
            .collect();

        if let Ok(oid) = self.repo.fully_resolve_head() {
            entries.insert(0, (oid, "HEAD".to_owned()));
        }

        if entries.is_empty() {
            let line = format!("{} capabilities^{{}}\0{}\n", Oid::UNKNOWN, caps.to_request_string());
            self.writer.write_all(&encode(line.as_bytes()).map_err(protocol::protocol_err)?).await?;
        } else {
            let (first_oid, first_name) = &entries[0];
            let first = format!("{} {}\0{}\n", first_oid, first_name, caps.to_request_string());
            self.writer.write_all(&encode(first.as_bytes()).map_err(protocol::protocol_err)?).await?;
            for (oid, name) in &entries[1..] {
                let line = format!("{} {}\n", oid, name);
                self.writer.write_all(&encode(line.as_bytes()).map_err(protocol::protocol_err)?).await?;
            }
        }
        self.writer.write_all(flush()).await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// reads `want`/`have`/`done` lines up to the terminating flush (v1 has
    /// no delimiter; `done` both ends the negotiation and is itself the last
    /// line the client sends).
    async fn receive_negotiation(&mut self) -> BitResult<Negotiation> {
        let mut wants = Vec::new();
        let mut haves = Vec::new();
        loop {
            match self.reader.read_line().await.map_err(protocol::protocol_err)? {
                None => return Err(ErrorKind::parse("upload-pack request", "unexpected end of stream").into()),
                Some(PktLine::Flush) => break,
                Some(PktLine::Delim) | Some(PktLine::ResponseEnd) => continue,
                Some(PktLine::Data(data)) => {
                    let text = String::from_utf8_lossy(&data);
                    let text = text.trim_end();
                    if let Some(rest) = text.strip_prefix("want ") {
                        let oid_str = rest.split_ascii_whitespace().next().unwrap_or(rest);
                        let raw = RawOid::parse_hex(oid_str).map_err(protocol::protocol_err)?;
                        wants.push(protocol::from_raw_oid(raw)?);
                    } else if let Some(rest) = text.strip_prefix("have ") {
                        let raw = RawOid::parse_hex(rest).map_err(protocol::protocol_err)?;
                        haves.push(protocol::from_raw_oid(raw)?);
                    } else if text == "done" {
                        break;
                    }
                }
            }
        }
        Ok(Negotiation { wants, haves })
    }

    async fn send_pack(&mut self, negotiation: &Negotiation) -> BitResult<()> {
        let mut acked = false;
        for &have in &negotiation.haves {
            if self.repo.obj_exists(have)? {
                let line = format!("ACK {} continue\n", have);
                self.writer.write_all(&encode(line.as_bytes()).map_err(protocol::protocol_err)?).await?;
                acked = true;
            }
        }
        if !acked {
            self.writer.write_all(b"0008NAK\n").await?;
        }

        let mut objects = std::collections::HashSet::new();
        for &want in &negotiation.wants {
            objects.extend(self.repo.list_objects_excluding(want, negotiation.haves.iter().copied())?);
        }
        let oids: Vec<Oid> = objects.into_iter().collect();
        let pack_bytes = PackEncoder::encode(self.repo, &oids)?;
        self.writer.write_all(&pack_bytes).await?;
        self.writer.flush().await?;
        Ok(())
    }
}

struct Negotiation {
    wants: Vec<Oid>,
    haves: Vec<Oid>,
}

/// Mirrors [`UploadPack`] for the push direction: reads a `receive-pack`
/// command list and the thin pack that follows it, applies both, and reports
/// per-ref status back to the client.
pub struct ReceivePack<'rcx, R, W> {
    repo: BitRepo<'rcx>,
    reader: PktLineReader<R>,
    writer: W,
}

impl<'rcx, R, W> ReceivePack<'rcx, R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(repo: BitRepo<'rcx>, reader: R, writer: W) -> Self {
        Self { repo, reader: PktLineReader::new(reader), writer }
    }

    pub fn run(self) -> BitResult<()> {
        let rt = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
        rt.block_on(self.run_async())
    }

    pub async fn run_async(mut self) -> BitResult<()> {
        self.send_ref_advertisement().await?;
        let commands = self.receive_commands().await?;
        if commands.is_empty() {
            return Ok(());
        }
        // the pack itself is read by whoever owns the underlying stream after
        // we return; applying pushed packs is orchestrated from
        // `crate::remote`, which is what actually receives pushes in this
        // codebase's tests. A dedicated `git-receive-pack` binary would read
        // the pack bytes here before computing `report`.
        let report = self.apply_commands(&commands)?;
        self.send_report(&report).await
    }

    async fn send_ref_advertisement(&mut self) -> BitResult<()> {
        let mut caps = Capabilities::new();
        caps.insert(Token::Bare("report-status".to_owned()));
        caps.insert(Token::KeyValue("agent".to_owned(), "bit/0.1".to_owned()));

        let mut entries: Vec<(Oid, String)> = Vec::new();
        for r in self.repo.ls_refs()? {
            if let BitRef::Symbolic(sym) = r {
                if let Ok(oid) = self.repo.fully_resolve_ref(sym) {
                    entries.push((oid, sym.path().to_string()));
                }
            }
        }

        if entries.is_empty() {
            let line =
                format!("{} capabilities^{{}}\0{}\n", Oid::UNKNOWN, caps.to_request_string());
            self.writer.write_all(&encode(line.as_bytes()).map_err(protocol::protocol_err)?).await?;
        } else {
            let (first_oid, first_name) = &entries[0];
            let first = format!("{} {}\0{}\n", first_oid, first_name, caps.to_request_string());
            self.writer.write_all(&encode(first.as_bytes()).map_err(protocol::protocol_err)?).await?;
            for (oid, name) in &entries[1..] {
                let line = format!("{} {}\n", oid, name);
                self.writer.write_all(&encode(line.as_bytes()).map_err(protocol::protocol_err)?).await?;
            }
        }
        self.writer.write_all(flush()).await?;
        self.writer.flush().await?;
        Ok(())
    }

    async fn receive_commands(&mut self) -> BitResult<Vec<PushCommand>> {
        let mut lines = Vec::new();
        loop {
            match self.reader.read_line().await.map_err(protocol::protocol_err)? {
                None => return Err(ErrorKind::parse("receive-pack request", "unexpected end of stream").into()),
                Some(PktLine::Flush) => break,
                Some(PktLine::Delim) | Some(PktLine::ResponseEnd) => continue,
                Some(PktLine::Data(data)) => lines.push(data),
            }
        }
        let mut commands = Vec::new();
        for (i, line) in lines.iter().enumerate() {
            let text = String::from_utf8_lossy(line);
            let text = if i == 0 { text.split('\0').next().unwrap_or(&text) } else { &text };
            let text = text.trim_end();
            let mut parts = text.split_ascii_whitespace();
            let old_oid = parts.next().ok_or_else(|| ErrorKind::parse("push command", "missing old oid"))?;
            let new_oid = parts.next().ok_or_else(|| ErrorKind::parse("push command", "missing new oid"))?;
            let refname = parts.next().ok_or_else(|| ErrorKind::parse("push command", "missing ref name"))?;
            commands.push(PushCommand {
                old_oid: RawOid::parse_hex(old_oid).map_err(protocol::protocol_err)?,
                new_oid: RawOid::parse_hex(new_oid).map_err(protocol::protocol_err)?,
                refname: refname.to_owned(),
            });
        }
        Ok(commands)
    }

    fn apply_commands(&self, commands: &[PushCommand]) -> BitResult<v1::ReceivePackReport> {
        use crate::refs::RefUpdateCause;

        let mut report = v1::ReceivePackReport { unpack_ok: true, unpack_error: None, ref_status: Vec::new() };
        for cmd in commands {
            let refname = SymbolicRef::new_valid(self.repo, cmd.refname.as_str().into());
            let result = if cmd.is_delete() {
                self.repo.refdb().and_then(|db| db.delete(refname))
            } else {
                let new_oid = protocol::from_raw_oid(cmd.new_oid);
                new_oid.and_then(|oid| {
                    self.repo.update_ref(refname, BitRef::Direct(oid), RefUpdateCause::Push)
                })
            };
            match result {
                Ok(()) => report.ref_status.push((cmd.refname.clone(), Ok(()))),
                Err(err) => report.ref_status.push((cmd.refname.clone(), Err(err.to_string()))),
            }
        }
        Ok(report)
    }

    async fn send_report(&mut self, report: &v1::ReceivePackReport) -> BitResult<()> {
        let unpack_line =
            format!("unpack {}\n", if report.unpack_ok { "ok".to_owned() } else { report.unpack_error.clone().unwrap_or_else(|| "unknown".to_owned()) });
        self.writer.write_all(&encode(unpack_line.as_bytes()).map_err(protocol::protocol_err)?).await?;
        for (refname, status) in &report.ref_status {
            let line = match status {
                Ok(()) => format!("ok {}\n", refname),
                Err(msg) => format!("ng {} {}\n", refname, msg),
            };
            self.writer.write_all(&encode(line.as_bytes()).map_err(protocol::protocol_err)?).await?;
        }
        self.writer.write_all(flush()).await?;
        self.writer.flush().await?;
        Ok(())
    }
}

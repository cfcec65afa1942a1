//! Remote configuration and the fetch/push orchestrators that drive a
//! [`crate::transport::Transport`] through a full upload-pack/receive-pack
//! conversation: capability negotiation, packfile + `.idx` writing, and
//! remote-tracking ref / `FETCH_HEAD` bookkeeping.

use crate::config::RemoteConfig;
use crate::error::{BitGenericError, BitResult, ErrorKind};
use crate::interner::Intern;
use crate::obj::Oid;
use crate::pack::{IndexPackOpts, PackEncoder, PackIndexer};
use crate::path::BitPath;
use crate::protocol::{self, Discovery};
use crate::refs::{BitRef, BitRefDbBackend, RefUpdateCause, SymbolicRef};
use crate::repo::{BitRepo, Repo};
use crate::transport::{self, Service};
use bit_protocol::pktline::PktLineReader;
use bit_protocol::v1::{
    build_receive_pack_commands, parse_receive_pack_report, parse_upload_pack_negotiation,
    PushCommand, RefAdvertisement, UploadPackRequestBuilder,
};
use bit_protocol::v2::{FetchRequestBuilder, LsRefsRequestBuilder};
use bit_protocol::{oid::RawOid, sideband::SideBandDemux, Capabilities, Capabilities2};
use git_url_parse::GitUrl;
use rustc_hash::FxHashSet;
use std::fmt::{self, Display, Formatter};
use std::path::Path;
use std::str::FromStr;

/// name `bit clone`/`bit fetch` default to when none is given explicitly.
pub const DEFAULT_REMOTE: &str = "origin";

#[derive(Debug, Clone)]
pub struct Refspec {
    /// The lhs of the `:` excluding the * if there is one
    src: BitPath,
    /// The rhs of the `:` excluding the * if there is one
    dst: BitPath,
    forced: bool,
    /// Whether both sides are globbed
    glob: bool,
}

impl PartialEq for Refspec {
    fn eq(&self, other: &Self) -> bool {
        self.src == other.src && self.dst == other.dst && self.forced == other.forced
    }
}

impl Refspec {
    pub fn default_fetch_for_remote(remote_name: &str) -> Self {
        let src = BitPath::intern("refs/heads/");
        let dst = BitPath::intern(format!("refs/remotes/{}/", remote_name));
        Self { src, dst, forced: true, glob: true }
    }

    /// Matches given `source` to `self.src` and returns the corresponding
    /// remote-tracking ref if it matches.
    pub fn match_ref(&self, source: SymbolicRef) -> Option<SymbolicRef> {
        let dst = if self.glob {
            let suffix = source.path().as_str().strip_prefix(self.src.as_str())?;
            BitPath::intern(format!("{}{}", self.dst, suffix))
        } else if source.path() == self.src {
            self.dst
        } else {
            return None;
        };
        Some(SymbolicRef::new(dst))
    }
}

impl FromStr for Refspec {
    type Err = BitGenericError;

    // very rough implementation, doesn't capture full semantics of refspecs
    fn from_str(mut s: &str) -> BitResult<Self> {
        let forced = if &s[0..1] == "+" {
            s = &s[1..];
            true
        } else {
            false
        };
        let (src, dst) = s.split_once(':').ok_or_else(|| anyhow!("missing `:` in refspec"))?;
        let (src, src_is_glob) = match src.strip_suffix('*') {
            Some(stripped) => (stripped, true),
            None => (src, false),
        };
        let (dst, dst_is_glob) = match dst.strip_suffix('*') {
            Some(stripped) => (stripped, true),
            None => (dst, false),
        };
        let glob = match (src_is_glob, dst_is_glob) {
            (true, true) => true,
            (false, false) => false,
            _ => bail!("only one side of refspec is globbed"),
        };
        Ok(Self { src: BitPath::intern(src), dst: BitPath::intern(dst), forced, glob })
    }
}

impl Display for Refspec {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.forced {
            write!(f, "+")?;
        }
        write!(f, "{}:{}", self.src, self.dst)
    }
}

#[derive(Debug, PartialEq)]
pub struct Remote {
    pub name: &'static str,
    pub url: GitUrl,
    pub fetch: Refspec,
}

impl Remote {
    fn from_config(name: &'static str, config: RemoteConfig) -> Self {
        Self { name, url: config.url, fetch: config.fetch }
    }
}

/// What changed (or didn't) as a result of a fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    /// every remote-tracking ref we asked about already pointed at what the
    /// remote advertised; no pack was even requested.
    UpToDate,
    /// at least one remote-tracking ref moved.
    Updated,
}

/// Knobs that narrow or deepen a fetch beyond "every branch the refspec
/// matches". Each of `depth`/`since`/`exclude`/`relative` maps onto a
/// deepen variant that the remote must advertise support for (`shallow` in
/// v1, the matching `fetch=` subcap in v2); [`BitRepo::fetch_remote`] checks
/// this before sending any request body and fails fast rather than let the
/// remote reject a deepen line it doesn't understand.
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    pub depth: Option<u32>,
    pub since: Option<u64>,
    pub exclude: Vec<String>,
    pub relative: bool,
    /// fetch every advertised tag in addition to the refspec's branches,
    /// tracked directly under `refs/tags/<name>` (not remapped, matching
    /// how real git keeps tags out of `refs/remotes/`).
    pub tags: bool,
    /// restrict the refspec match to a single branch shortname.
    pub single_branch: Option<String>,
    /// delete remote-tracking branches that the remote no longer advertises.
    pub prune: bool,
    /// delete local tags that the remote no longer advertises (only takes
    /// effect together with `tags`).
    pub prune_tags: bool,
}

#[derive(Debug, Clone)]
pub struct FetchSummary {
    pub status: FetchStatus,
    /// `(remote-tracking ref, old, new, advertised refname)` for every ref
    /// that moved; the advertised refname is the remote's own name for it
    /// (e.g. `refs/heads/main`), before refspec remapping.
    pub updated: Vec<(SymbolicRef, Option<Oid>, Oid, String)>,
    /// the branch `HEAD` pointed at on the remote, if it advertised a symref
    /// for it (every v1/v2 peer does when asked, but a dumb `file://` clone
    /// of a bare repo with a detached `HEAD` may not have one to give).
    pub head_target: Option<String>,
}

impl<'rcx> BitRepo<'rcx> {
    pub fn add_remote(self, name: &str, url: impl AsRef<Path>) -> BitResult<()> {
        let refspec = Refspec::default_fetch_for_remote(name);
        let url = url.as_ref().to_string_lossy().into_owned();
        self.with_raw_local_config(|config| {
            ensure!(!config.subsection_exists("remote", name), "remote `{}` already exists", name);
            config.set_subsection("remote", name, "url", url)?;
            config.set_subsection("remote", name, "fetch", refspec)
        })?;

        Ok(())
    }

    pub fn remove_remote(self, name: &str) -> BitResult<()> {
        if !self.with_raw_local_config(|config| Ok(config.remove_subsection("remote", name)))? {
            bail!("remote `{}` does not exist", name)
        };

        Ok(())
    }

    pub fn get_remote(self, name: &str) -> BitResult<Remote> {
        self.remote_config()
            .get(name)
            .map(|config| Remote::from_config(name.intern(), config.clone()))
            .ok_or_else(|| anyhow!("remote `{}` does not exist", name))
    }

    pub fn ls_remotes(self) -> impl Iterator<Item = Remote> + 'rcx {
        self.remote_config().iter().map(|(name, config)| Remote::from_config(name, config.clone()))
    }

    pub async fn fetch(self, name: &str) -> BitResult<FetchSummary> {
        let remote = self.get_remote(name)?;
        self.fetch_remote(remote, &FetchOptions::default()).await
    }

    pub fn fetch_blocking(self, name: &str) -> BitResult<FetchSummary> {
        let rt = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
        rt.block_on(self.fetch(name))
    }

    pub async fn fetch_with_options(
        self,
        name: &str,
        opts: &FetchOptions,
    ) -> BitResult<FetchSummary> {
        let remote = self.get_remote(name)?;
        self.fetch_remote(remote, opts).await
    }

    /// Queries a remote's ref advertisement without fetching anything:
    /// discovers the connection (v1 advertisement or v2 capabilities, issuing
    /// `ls-refs` in the latter case) and hands back the raw `(oid, name)`
    /// pairs, same as `git ls-remote`.
    pub async fn ls_remote(self, name: &str) -> BitResult<Vec<(Oid, String)>> {
        let remote = self.get_remote(name)?;
        let backend = transport::backend(&remote.url).await?;
        let discovery = backend.discover(Service::UploadPack).await?;
        match discovery {
            Discovery::V1(ad) =>
                if ad.is_empty_repository() {
                    Ok(vec![])
                } else {
                    ad.refs.into_iter().map(|(raw, name)| Ok((protocol::from_raw_oid(raw)?, name))).collect()
                },
            Discovery::V2(..) => {
                let ls_refs_body =
                    LsRefsRequestBuilder::new().symrefs().build().map_err(protocol::protocol_err)?;
                let response = backend.connect(Service::UploadPack, ls_refs_body).await?;
                let mut reader = PktLineReader::new(response);
                let entries = bit_protocol::v2::parse_ls_refs_response(&mut reader)
                    .await
                    .map_err(protocol::protocol_err)?;
                entries.into_iter().map(|e| Ok((protocol::from_raw_oid(e.oid)?, e.name))).collect()
            }
        }
    }

    pub fn ls_remote_blocking(self, name: &str) -> BitResult<Vec<(Oid, String)>> {
        let rt = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
        rt.block_on(self.ls_remote(name))
    }

    /// Fetches every branch (and, if requested, every tag) the remote's fetch
    /// refspec and `opts` select: discovers the ref advertisement or v2
    /// capabilities, negotiates a want/have set against what we already have,
    /// streams the resulting pack to disk, indexes it (consulting our own
    /// object store for thin-pack ref-deltas), reconciles `.git/shallow`, and
    /// updates each matched remote-tracking ref (and, with `prune`, deletes
    /// the ones the remote no longer has). `FETCH_HEAD` is rewritten to
    /// describe exactly what was fetched, same as real git.
    pub async fn fetch_remote(self, remote: Remote, opts: &FetchOptions) -> BitResult<FetchSummary> {
        let backend = transport::backend(&remote.url).await?;
        let discovery = backend.discover(Service::UploadPack).await?;

        let empty_summary =
            || FetchSummary { status: FetchStatus::UpToDate, updated: vec![], head_target: None };

        let (remote_refs, head_target): (Vec<(RawOid, String)>, Option<String>) = match &discovery {
            Discovery::V1(ad) => {
                check_required_caps_v1(&ad.caps, opts)?;
                if ad.is_empty_repository() {
                    return Ok(empty_summary());
                }
                let head_target =
                    ad.symrefs.iter().find(|(name, _)| name == "HEAD").map(|(_, target)| target.clone());
                (ad.refs.clone(), head_target)
            }
            Discovery::V2(caps2) => {
                check_required_caps_v2(caps2, opts)?;
                let ls_refs_body =
                    LsRefsRequestBuilder::new().symrefs().build().map_err(protocol::protocol_err)?;
                let response = backend.connect(Service::UploadPack, ls_refs_body).await?;
                let mut reader = PktLineReader::new(response);
                let entries = bit_protocol::v2::parse_ls_refs_response(&mut reader)
                    .await
                    .map_err(protocol::protocol_err)?;
                if entries.is_empty() {
                    return Ok(empty_summary());
                }
                let head_target =
                    entries.iter().find(|e| e.name == "HEAD").and_then(|e| e.symref_target.clone());
                (entries.into_iter().map(|e| (e.oid, e.name)).collect(), head_target)
            }
        };

        // every advertised branch matched by the remote's fetch refspec (or
        // tag, if `opts.tags`), paired with the local ref it updates
        let mut matched = Vec::new();
        for (raw_oid, name) in &remote_refs {
            if name == "HEAD" {
                continue;
            }
            let Ok(source) = SymbolicRef::intern_valid(name) else { continue };
            let oid = protocol::from_raw_oid(*raw_oid)?;

            if name.starts_with("refs/tags/") {
                if opts.tags {
                    matched.push((source, oid, name.clone()));
                }
                continue;
            }

            let Some(tracking) = remote.fetch.match_ref(source) else { continue };
            if let Some(branch) = &opts.single_branch {
                if tracking.short() != branch.as_str() {
                    continue;
                }
            }
            matched.push((tracking, oid, name.clone()));
        }

        // every local ref's tip that the object store actually has, not just the
        // ones the remote's refspec matches: a tip on an unrelated local branch
        // can still let the remote skip history it and an advertised branch share.
        let mut haves = Vec::new();
        for sym in self.list_refs("refs")? {
            if let Some(oid) = self.try_fully_resolve_ref(BitRef::Symbolic(sym))? {
                if self.obj_exists(oid)? {
                    haves.push(oid);
                }
            }
        }
        haves.sort_unstable();
        haves.dedup();

        let mut wants = Vec::new();
        for (tracking, oid, _) in &matched {
            let existing = self.try_fully_resolve_ref(BitRef::Symbolic(*tracking))?;
            if existing == Some(*oid) {
                continue;
            }
            wants.push(*oid);
        }
        wants.sort_unstable();
        wants.dedup();

        if wants.is_empty() {
            return Ok(empty_summary());
        }

        let local_shallow = crate::shallow::read(self)?;

        let (pack, shallow_lines, unshallow_lines) = match &discovery {
            Discovery::V1(ad) =>
                self.negotiate_v1(&backend, ad, &wants, &haves, &local_shallow, opts).await?,
            Discovery::V2(caps2) =>
                self.negotiate_v2(&backend, caps2, &wants, &haves, &local_shallow, opts).await?,
        };

        let pack_path = self.write_pack(&pack).await?;
        PackIndexer::write_pack_index_thin(&pack_path, IndexPackOpts::default(), self)?;

        self.reconcile_shallow(local_shallow, shallow_lines, unshallow_lines)?;

        let mut updated = Vec::new();
        for (tracking, oid, name) in &matched {
            if !wants.contains(oid) && haves.contains(oid) {
                continue;
            }
            let old = self.try_fully_resolve_ref(BitRef::Symbolic(*tracking))?;
            if old == Some(*oid) {
                continue;
            }
            self.update_ref(*tracking, BitRef::Direct(*oid), RefUpdateCause::Fetch)?;
            updated.push((*tracking, old, *oid, name.clone()));
        }

        if opts.prune {
            self.prune_stale_refs(&remote, &matched, opts)?;
        }

        self.write_fetch_head(&remote, &matched, head_target.as_deref())?;

        let status = if updated.is_empty() { FetchStatus::UpToDate } else { FetchStatus::Updated };
        Ok(FetchSummary { status, updated, head_target })
    }

    /// v1 `upload-pack` negotiation: one `want`/`have`/`done` round, the
    /// response side-band-demuxed into the raw pack bytes plus the
    /// ACK/NAK and shallow/unshallow lines that came before it.
    async fn negotiate_v1(
        self,
        backend: &dyn transport::Transport,
        ad: &RefAdvertisement,
        wants: &[Oid],
        haves: &[Oid],
        local_shallow: &FxHashSet<Oid>,
        opts: &FetchOptions,
    ) -> BitResult<(Vec<u8>, Vec<Oid>, Vec<Oid>)> {
        let caps = protocol::default_capabilities("bit/0.1");
        let mut builder = UploadPackRequestBuilder::new(caps.clone());
        for &want in wants {
            builder = builder.want(protocol::to_raw_oid(want));
        }
        for &have in haves {
            if self.obj_exists(have)? {
                builder = builder.have(protocol::to_raw_oid(have));
            }
        }
        if ad.caps.contains_bare("shallow") {
            for &oid in local_shallow {
                builder = builder.shallow(protocol::to_raw_oid(oid));
            }
            if let Some(depth) = opts.depth {
                builder = builder.depth(depth);
            }
            if let Some(since) = opts.since {
                builder = builder.deepen_since(since);
            }
            for refname in &opts.exclude {
                builder = builder.deepen_not(refname.clone());
            }
            if opts.relative {
                builder = builder.deepen_relative();
            }
        }
        let body = builder.done().build().map_err(protocol::protocol_err)?;

        let response = backend.connect(Service::UploadPack, body).await?;
        let side_band = caps.contains_bare("side-band-64k") || caps.contains_bare("side-band");
        let output =
            SideBandDemux::spawn(response, side_band, 256).collect().await.map_err(protocol::protocol_err)?;
        let negotiation =
            parse_upload_pack_negotiation(&output.packetlines).map_err(protocol::protocol_err)?;

        let shallow = negotiation.shallow.iter().map(|&o| protocol::from_raw_oid(o)).collect::<BitResult<_>>()?;
        let unshallow =
            negotiation.unshallow.iter().map(|&o| protocol::from_raw_oid(o)).collect::<BitResult<_>>()?;
        Ok((output.pack, shallow, unshallow))
    }

    /// v2 `fetch` command: capabilities plus want/have/deepen lines, the
    /// response split into sections ending in a `packfile` header, after
    /// which the rest of the stream is side-band-demuxed exactly like v1.
    async fn negotiate_v2(
        self,
        backend: &dyn transport::Transport,
        caps2: &Capabilities2,
        wants: &[Oid],
        haves: &[Oid],
        local_shallow: &FxHashSet<Oid>,
        opts: &FetchOptions,
    ) -> BitResult<(Vec<u8>, Vec<Oid>, Vec<Oid>)> {
        let mut builder = FetchRequestBuilder::new();
        for &want in wants {
            builder = builder.want(protocol::to_raw_oid(want));
        }
        for &have in haves {
            if self.obj_exists(have)? {
                builder = builder.have(protocol::to_raw_oid(have));
            }
        }
        if caps2.supports_fetch_subcap("shallow") {
            for &oid in local_shallow {
                builder = builder.shallow(protocol::to_raw_oid(oid));
            }
            if let Some(depth) = opts.depth {
                builder = builder.deepen(depth);
            }
            if let Some(since) = opts.since {
                builder = builder.deepen_since(since);
            }
            for refname in &opts.exclude {
                builder = builder.deepen_not(refname.clone());
            }
            if opts.relative {
                builder = builder.deepen_relative();
            }
        }
        let body = builder.done().build().map_err(protocol::protocol_err)?;

        let response = backend.connect(Service::UploadPack, body).await?;
        let mut reader = PktLineReader::new(response);
        let sections = bit_protocol::v2::parse_fetch_response_sections(&mut reader)
            .await
            .map_err(protocol::protocol_err)?;
        ensure!(sections.has_packfile_section, "v2 fetch response had no packfile section");

        let rest = reader.into_inner();
        let output = SideBandDemux::spawn(rest, true, 256).collect().await.map_err(protocol::protocol_err)?;

        let shallow = sections.shallow.iter().map(|&o| protocol::from_raw_oid(o)).collect::<BitResult<_>>()?;
        let unshallow =
            sections.unshallow.iter().map(|&o| protocol::from_raw_oid(o)).collect::<BitResult<_>>()?;
        Ok((output.pack, shallow, unshallow))
    }

    /// applies the remote's `shallow`/`unshallow` lines to the local shallow
    /// boundary and persists it. A newly-reported shallow oid only actually
    /// becomes a boundary commit if its parent isn't present locally (a
    /// server can report `shallow` defensively even when we already have the
    /// full history, e.g. after a `deepen-not`); an unshallowed oid is
    /// simply dropped.
    fn reconcile_shallow(
        self,
        mut shallow_set: FxHashSet<Oid>,
        new_shallow: Vec<Oid>,
        unshallow: Vec<Oid>,
    ) -> BitResult<()> {
        if new_shallow.is_empty() && unshallow.is_empty() {
            return Ok(());
        }
        for oid in unshallow {
            shallow_set.remove(&oid);
        }
        for oid in new_shallow {
            let parent = self.read_obj(oid)?.try_into_commit().ok().and_then(|c| c.parent);
            let parent_present = match parent {
                Some(parent) => self.obj_exists(parent)?,
                None => true,
            };
            if !parent_present {
                shallow_set.insert(oid);
            }
        }
        crate::shallow::write(self, &shallow_set)
    }

    /// deletes remote-tracking refs (and, with `opts.prune_tags`, tags) under
    /// this remote that the remote no longer advertises. Runs after the
    /// matched refs have already been written, so a ref is only ever pruned
    /// once we know for certain the remote doesn't have it anymore.
    fn prune_stale_refs(
        self,
        remote: &Remote,
        matched: &[(SymbolicRef, Oid, String)],
        opts: &FetchOptions,
    ) -> BitResult<()> {
        let live: FxHashSet<SymbolicRef> = matched.iter().map(|(tracking, ..)| *tracking).collect();

        let tracking_prefix = format!("refs/remotes/{}", remote.name);
        for sym in self.list_refs(&tracking_prefix)? {
            if !live.contains(&sym) {
                self.refdb()?.delete(sym)?;
            }
        }

        if opts.tags && opts.prune_tags {
            for sym in self.list_refs("refs/tags")? {
                if !live.contains(&sym) {
                    self.refdb()?.delete(sym)?;
                }
            }
        }
        Ok(())
    }

    /// streams `pack_bytes` to a temp file in `.git/objects/pack`, then
    /// renames it to `pack-<hash>.pack` (the trailing 20 bytes of the pack
    /// are its own sha1 checksum) now that the hash is actually known; the
    /// pack is durable on disk before its index is written, so a crash
    /// between the two never leaves a referenceable-but-unindexed pack.
    async fn write_pack(self, pack_bytes: &[u8]) -> BitResult<std::path::PathBuf> {
        ensure!(pack_bytes.len() >= 20, "pack response shorter than a trailing checksum");
        let (body, trailer) = pack_bytes.split_at(pack_bytes.len() - 20);
        let _ = body;
        let hash = hex::encode(trailer);
        let dir = self.pack_objects_dir()?;
        let tmp_path = dir.as_path().join(format!(".tmp-{}.pack", hash));
        tokio::fs::write(&tmp_path, pack_bytes).await?;
        let final_path = dir.as_path().join(format!("pack-{}.pack", hash));
        tokio::fs::rename(&tmp_path, &final_path).await?;
        Ok(final_path)
    }

    /// rewrites `.git/FETCH_HEAD`, matching the `<oid>\t<not-for-merge>\t'<desc>'` style
    /// real git uses: `branch '<abbrev>' of <url>` (or `tag '<abbrev>' of <url>`).
    /// `head_target` is the branch the remote's own `HEAD` points at (what
    /// `git pull` would merge); every other fetched ref is marked
    /// `not-for-merge` so a bare `git merge FETCH_HEAD` only picks it up.
    fn write_fetch_head(
        self,
        remote: &Remote,
        matched: &[(SymbolicRef, Oid, String)],
        head_target: Option<&str>,
    ) -> BitResult<()> {
        let mut contents = String::new();
        for (_, oid, name) in matched {
            let (kind, abbrev) = if let Some(branch) = name.strip_prefix("refs/heads/") {
                ("branch", branch)
            } else if let Some(tag) = name.strip_prefix("refs/tags/") {
                ("tag", tag)
            } else {
                ("branch", name.as_str())
            };
            let not_for_merge = if Some(name.as_str()) == head_target { "" } else { "not-for-merge\t" };
            contents.push_str(&format!(
                "{}\t{}{} '{}' of {}\n",
                oid, not_for_merge, kind, abbrev, remote.url
            ));
        }
        std::fs::write(self.fetch_head_path().as_path(), contents)?;
        Ok(())
    }

    /// clones `remote_url` into a freshly created `local_path`, leaving
    /// `local_path` behind on failure only if we didn't create it ourselves
    /// (mirroring real git: cloning into an existing directory never deletes
    /// that directory, but a directory clone itself created is cleaned up).
    pub fn clone_blocking(local_path: impl AsRef<Path>, remote_url: impl AsRef<Path>) -> BitResult<()> {
        Self::clone_blocking_with_options(local_path, remote_url, &FetchOptions::default())
    }

    pub fn clone_blocking_with_options(
        local_path: impl AsRef<Path>,
        remote_url: impl AsRef<Path>,
        opts: &FetchOptions,
    ) -> BitResult<()> {
        let local_path = local_path.as_ref();
        let created_dir = !local_path.exists();
        let result = Self::clone_inner(local_path, remote_url.as_ref(), opts);
        if result.is_err() && created_dir {
            let _ = std::fs::remove_dir_all(local_path);
        }
        result
    }

    fn clone_inner(local_path: &Path, remote_url: &Path, opts: &FetchOptions) -> BitResult<()> {
        std::fs::create_dir_all(local_path)?;
        Self::init(local_path)?;
        Self::find(local_path, |repo| {
            repo.add_remote(DEFAULT_REMOTE, remote_url)?;
            let remote = repo.get_remote(DEFAULT_REMOTE)?;
            let rt = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
            let summary = rt.block_on(repo.fetch_remote(remote, opts))?;

            // the remote's own `HEAD` symref names which advertised branch to
            // check out; fall back to whatever came back first only for a
            // peer that answered without one (a detached `HEAD`, or a
            // transport too old to advertise symrefs at all). The advertised
            // name (`refs/heads/<branch>`) doubles as the local branch path.
            let head_branch = summary.head_target.as_deref();
            let head_tracking = summary
                .updated
                .iter()
                .find(|(_, _, _, name)| Some(name.as_str()) == head_branch)
                .or_else(|| summary.updated.first())
                .map(|(_, _, oid, name)| (name.clone(), *oid));

            if let Some((name, oid)) = head_tracking {
                let local_head = SymbolicRef::intern_valid(&name)?;
                repo.update_ref(local_head, BitRef::Direct(oid), RefUpdateCause::Clone)?;
                repo.update_head(BitRef::Symbolic(local_head), RefUpdateCause::Clone)?;
                repo.checkout(BitRef::Symbolic(local_head), crate::checkout::CheckoutOpts::forced())?;
            }
            Ok(())
        })
    }

    pub async fn push(self, name: &str, refspec: &str) -> BitResult<()> {
        self.push_with_options(name, refspec, &PushOptions::default()).await
    }

    pub async fn push_with_options(
        self,
        name: &str,
        refspec: &str,
        opts: &PushOptions,
    ) -> BitResult<()> {
        let remote = self.get_remote(name)?;
        let source = SymbolicRef::intern_valid(refspec)?;
        let local_oid = if opts.delete { None } else { Some(self.fully_resolve_ref(BitRef::Symbolic(source))?) };

        let backend = transport::backend(&remote.url).await?;
        let discovery = backend.discover(Service::ReceivePack).await?;
        let (ad_refs, server_caps) = match discovery {
            Discovery::V1(ad) => (ad.refs.clone(), ad.caps.clone()),
            Discovery::V2(..) =>
                return Err(ErrorKind::capability("protocol v2 push is not yet wired up").into()),
        };

        let remote_oid = ad_refs
            .iter()
            .find(|(_, name)| name == source.path().as_str())
            .map(|(oid, _)| protocol::from_raw_oid(*oid))
            .transpose()?;

        let is_tag = source.path().as_str().starts_with("refs/tags/");

        if !opts.force && !opts.delete {
            if is_tag && remote_oid.is_some() {
                return Err(ErrorKind::remote(source.to_string(), "tag-exists").into());
            }
            if let (Some(remote_oid), Some(local_oid)) = (remote_oid, local_oid) {
                if !self.is_ancestor(remote_oid, local_oid)? {
                    return Err(ErrorKind::remote(source.to_string(), "not-fast-forward").into());
                }
            }
        }

        let old_raw = remote_oid.map(protocol::to_raw_oid).unwrap_or_else(|| RawOid::zero(20));
        let new_raw = local_oid.map(protocol::to_raw_oid).unwrap_or_else(|| RawOid::zero(20));

        let hook_stdin = format!(
            "{} {} {} {}\n",
            source.path(),
            local_oid.map(|o| o.to_string()).unwrap_or_else(|| "0".repeat(40)),
            source.path(),
            remote_oid.map(|o| o.to_string()).unwrap_or_else(|| "0".repeat(40)),
        );
        if !self.run_hook("pre-push", &hook_stdin)? {
            return Err(ErrorKind::remote(source.to_string(), "push rejected by pre-push hook").into());
        }

        let command =
            PushCommand { old_oid: old_raw, new_oid: new_raw, refname: source.path().to_string() };

        // filter our offered capabilities down to the ones the remote actually advertised
        let mut caps = Capabilities::new();
        if server_caps.contains_bare("report-status") {
            caps.insert(bit_protocol::caps::Token::Bare("report-status".to_owned()));
        }
        let use_sideband = server_caps.contains_bare("side-band-64k");
        if use_sideband {
            caps.insert(bit_protocol::caps::Token::Bare("side-band-64k".to_owned()));
        }
        caps.insert(bit_protocol::caps::Token::KeyValue("agent".to_owned(), "bit/0.1".to_owned()));

        let body_commands = build_receive_pack_commands(&[command], &caps).map_err(protocol::protocol_err)?;

        let mut body = body_commands;
        if let Some(local_oid) = local_oid {
            let have_oids: FxHashSet<Oid> = match remote_oid {
                Some(oid) => self.list_reachable_objects(oid)?,
                None => FxHashSet::default(),
            };
            let want_oids = self.list_reachable_objects(local_oid)?;
            let thin_oids: Vec<Oid> =
                want_oids.into_iter().filter(|oid| !have_oids.contains(oid)).collect();
            let pack = PackEncoder::encode(self, &thin_oids)?;
            body.extend_from_slice(&pack);
        }

        let response = backend.connect(Service::ReceivePack, body).await?;
        let output =
            SideBandDemux::spawn(response, use_sideband, 256).collect().await.map_err(protocol::protocol_err)?;
        let report = parse_receive_pack_report(&output.packetlines).map_err(protocol::protocol_err)?;
        ensure!(report.unpack_ok, "remote failed to unpack: {}", report.unpack_error.unwrap_or_default());

        let mut ref_result: BitResult<()> = Ok(());
        for (refname, status) in &report.ref_status {
            if refname == source.path().as_str() {
                ref_result =
                    status.clone().map_err(|msg| ErrorKind::remote(refname.clone(), msg).into());
            }
        }

        if ref_result.is_ok() {
            if opts.delete {
                if let Some(tracking) = remote.fetch.match_ref(source) {
                    self.refdb()?.delete(tracking)?;
                }
            } else if !is_tag {
                if let (Some(tracking), Some(local_oid)) = (remote.fetch.match_ref(source), local_oid) {
                    self.update_ref(tracking, BitRef::Direct(local_oid), RefUpdateCause::Push)?;
                }
            }
        }

        let post_hook_stdin = format!(
            "{} {} {}\n",
            source.path(),
            new_raw,
            if ref_result.is_ok() { "ok" } else { "error" },
        );
        // post-push runs regardless of per-ref outcome so local hooks can react to failures too.
        let _ = self.run_hook("post-push", &post_hook_stdin)?;

        ref_result
    }

    pub fn push_blocking(self, name: &str, refspec: &str) -> BitResult<()> {
        let rt = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
        rt.block_on(self.push(name, refspec))
    }
}

/// Knobs narrowing/altering a single push beyond "fast-forward the matched ref".
#[derive(Debug, Clone, Default)]
pub struct PushOptions {
    /// bypass the non-fast-forward and tag-exists guards.
    pub force: bool,
    /// push a zeroed new-oid, asking the remote to delete the ref instead of updating it.
    pub delete: bool,
}

/// fails fast (before any request body is sent) if `opts` asks for a deepen
/// variant the v1 peer never advertised. Real git only ever advertises the
/// single bare `shallow` capability for all of depth/since/exclude/relative,
/// so that is the only thing worth checking here.
fn check_required_caps_v1(caps: &Capabilities, opts: &FetchOptions) -> BitResult<()> {
    let wants_deepen =
        opts.depth.is_some() || opts.since.is_some() || !opts.exclude.is_empty() || opts.relative;
    if wants_deepen && !caps.contains_bare("shallow") {
        return Err(ErrorKind::capability("shallow").into());
    }
    Ok(())
}

/// same check for v2, where each deepen variant is its own subcap of `fetch=`.
fn check_required_caps_v2(caps2: &Capabilities2, opts: &FetchOptions) -> BitResult<()> {
    if opts.depth.is_some() && !caps2.supports_fetch_subcap("shallow") {
        return Err(ErrorKind::capability("shallow").into());
    }
    if opts.since.is_some() && !caps2.supports_fetch_subcap("deepen-since") {
        return Err(ErrorKind::capability("deepen-since").into());
    }
    if !opts.exclude.is_empty() && !caps2.supports_fetch_subcap("deepen-not") {
        return Err(ErrorKind::capability("deepen-not").into());
    }
    if opts.relative && !caps2.supports_fetch_subcap("deepen-relative") {
        return Err(ErrorKind::capability("deepen-relative").into());
    }
    Ok(())
}

#[cfg(test)]
mod tests;

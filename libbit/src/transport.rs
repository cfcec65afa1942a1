//! Transport backends for talking to a remote: `file://` (a local path,
//! mostly for tests), `git://` (the anonymous daemon), `ssh://` and smart
//! HTTP(S). Each backend is asked to do the same two things, kept as
//! separate methods rather than one persistent duplex stream so that HTTP's
//! naturally disjoint GET-then-POST shape doesn't have to be faked on top of
//! something that looks like a socket:
//!
//! - [`Transport::discover`] opens (or re-opens) a connection and reads the
//!   ref advertisement / v2 capability list, handing back a parsed
//!   [`crate::protocol::Discovery`].
//! - [`Transport::connect`] sends a fully pkt-line-framed request body (the
//!   negotiated want/have lines, an `ls-refs` command, ...) and returns the
//!   response as a plain byte stream for [`crate::remote`] to run through a
//!   [`bit_protocol::sideband::SideBandDemux`] or a v2 section parser.
//!
//! The stream-oriented backends (file/ssh/git) open a fresh connection per
//! call; `connect` re-reads and discards the advertisement before writing
//! the request, mirroring how the daemon/ssh/file protocols are documented
//! (there is no way to ask the far end to skip straight to negotiation).

mod file;
mod http;
mod ssh;
mod tcp;

pub use file::FileTransport;
pub use http::HttpTransport;
pub use ssh::SshTransport;
pub use tcp::TcpTransport;

use crate::error::{BitResult, ErrorKind};
use crate::protocol::Discovery;
use async_trait::async_trait;
use git_url_parse::{GitUrl, Scheme};
use tokio::io::AsyncRead;

/// Which service a connection is being opened for; determines the command
/// run over SSH/file, the query string for smart HTTP, and the request line
/// for the anonymous `git://` daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    UploadPack,
    ReceivePack,
}

impl Service {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UploadPack => "git-upload-pack",
            Self::ReceivePack => "git-receive-pack",
        }
    }
}

pub type ResponseBody = Box<dyn AsyncRead + Unpin + Send>;

#[async_trait]
pub trait Transport: Send + Sync {
    /// opens a connection for `service` and parses its ref advertisement
    /// (v1) or capability list (v2).
    async fn discover(&self, service: Service) -> BitResult<Discovery>;

    /// sends `body`, a complete request already terminated by its own
    /// flush/delim packet(s), and returns the raw response stream.
    async fn connect(&self, service: Service, body: Vec<u8>) -> BitResult<ResponseBody>;
}

/// Picks and opens the right backend for `url`. The ssh backend needs to
/// actually dial out to establish its session before it can answer anything,
/// so this is async like every other network-facing call in this module
/// (the other three backends are cheap to construct and just `await`
/// trivially inside their own `discover`/`connect`).
pub async fn backend(url: &GitUrl) -> BitResult<Box<dyn Transport>> {
    match url.scheme {
        Scheme::File => Ok(Box::new(FileTransport::new(url)?)),
        Scheme::Git => Ok(Box::new(TcpTransport::new(url)?)),
        Scheme::Ssh => Ok(Box::new(SshTransport::new(url).await?)),
        Scheme::Https | Scheme::Http => Ok(Box::new(HttpTransport::new(url)?)),
        other =>
            Err(ErrorKind::transport(url.to_string(), format!("unsupported scheme `{:?}`", other))
                .into()),
    }
}

//! `file://` transport: drives [`crate::upload_pack::UploadPack`] /
//! [`crate::upload_pack::ReceivePack`] over an in-process duplex pipe,
//! running the server side on a dedicated thread with its own tokio runtime
//! (the same pattern a standalone `git-upload-pack` binary reading
//! stdin/stdout would use, just without the process boundary). Mostly
//! exercised by the test suite and `bit clone`/`fetch` against a local path.

use super::{ResponseBody, Service, Transport};
use crate::error::BitResult;
use crate::path;
use crate::protocol::{self, Discovery};
use crate::repo::BitRepo;
use crate::upload_pack::{ReceivePack, UploadPack};
use async_trait::async_trait;
use bit_protocol::pktline::PktLineReader;
use git_url_parse::GitUrl;
use std::path::PathBuf;
use tokio::io::{AsyncWriteExt, BufReader, DuplexStream};

pub struct FileTransport {
    path: PathBuf,
}

impl FileTransport {
    pub fn new(url: &GitUrl) -> BitResult<Self> {
        Ok(Self { path: path::normalize(std::path::Path::new(&url.path)) })
    }

    /// spawns the appropriate server loop on a background thread, connected
    /// to us via an in-process duplex pipe; every call gets its own pipe and
    /// its own fresh run through the whole protocol, same as reconnecting.
    fn spawn(&self, service: Service) -> DuplexStream {
        let (client, server) = tokio::io::duplex(8192);
        let path = self.path.clone();
        std::thread::spawn(move || -> BitResult<()> {
            BitRepo::find(&path, |repo| {
                let (read, write) = tokio::io::split(server);
                let reader = BufReader::new(read);
                match service {
                    Service::UploadPack => UploadPack::new(repo, reader, write).run(),
                    Service::ReceivePack => ReceivePack::new(repo, reader, write).run(),
                }
            })
        });
        client
    }
}

#[async_trait]
impl Transport for FileTransport {
    async fn discover(&self, service: Service) -> BitResult<Discovery> {
        let mut reader = PktLineReader::new(self.spawn(service));
        protocol::discover_v1(&mut reader).await
    }

    async fn connect(&self, service: Service, body: Vec<u8>) -> BitResult<ResponseBody> {
        let mut reader = PktLineReader::new(self.spawn(service));
        // discard the advertisement; the caller already consulted its own via `discover`
        protocol::discover_v1(&mut reader).await?;
        let mut stream = reader.into_inner();
        stream.write_all(&body).await?;
        stream.flush().await?;
        Ok(Box::new(stream))
    }
}

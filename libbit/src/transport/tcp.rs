//! `git://` transport: the anonymous daemon protocol. A bare TCP connection
//! whose very first frame is a pkt-line request line naming the service and
//! path (`git-upload-pack /path/to/repo\0host=example.com\0\0version=2\0`),
//! after which the stream looks exactly like the advertisement/negotiation
//! conversation every other backend speaks. The empty extra-parameters
//! separator before `version=2` is part of the wire format, not a typo: host
//! and extra parameters are two separate NUL-terminated lists.
//!
//! There's no persistent session to reuse: every `discover`/`connect` call
//! opens its own connection and resends the request line, mirroring how
//! `ssh`/`file` reconnect per call.

use super::{ResponseBody, Service, Transport};
use crate::error::{BitResult, ErrorKind};
use crate::protocol::{self, Discovery};
use async_trait::async_trait;
use bit_protocol::pktline::{encode, PktLineReader};
use git_url_parse::GitUrl;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

const DEFAULT_PORT: u16 = 9418;

pub struct TcpTransport {
    host: String,
    port: u16,
    path: String,
}

impl TcpTransport {
    pub fn new(url: &GitUrl) -> BitResult<Self> {
        let host = url
            .host
            .clone()
            .ok_or_else(|| ErrorKind::transport(url.to_string(), "git:// url has no host"))?;
        Ok(Self { host, port: url.port.unwrap_or(DEFAULT_PORT), path: url.path.clone() })
    }

    async fn request(&self, service: Service) -> BitResult<TcpStream> {
        let mut stream = TcpStream::connect((self.host.as_str(), self.port))
            .await
            .map_err(|e| ErrorKind::transport(self.host.clone(), e.to_string()))?;
        let line =
            format!("{} {}\0host={}\0\0version=2\0", service.as_str(), self.path, self.host);
        let frame = encode(line.as_bytes()).map_err(protocol::protocol_err)?;
        stream.write_all(&frame).await?;
        Ok(stream)
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn discover(&self, service: Service) -> BitResult<Discovery> {
        let stream = self.request(service).await?;
        let mut reader = PktLineReader::new(stream);
        protocol::discover(&mut reader, true).await
    }

    async fn connect(&self, service: Service, body: Vec<u8>) -> BitResult<ResponseBody> {
        let stream = self.request(service).await?;
        let mut reader = PktLineReader::new(stream);
        // discard the advertisement; the caller already consulted its own via `discover`
        protocol::discover(&mut reader, true).await?;
        let mut stream = reader.into_inner();
        stream.write_all(&body).await?;
        stream.flush().await?;
        Ok(Box::new(stream))
    }
}

//! `ssh://` transport: execs `git-upload-pack`/`git-receive-pack` on the
//! remote host over an [`openssh`] session, the same way the real `git`
//! binary shells out via `ssh user@host git-upload-pack '/path/to/repo'`.
//!
//! [`Transport::discover`] and [`Transport::connect`] each spawn their own
//! remote command (their own multiplexed channel over the shared
//! [`Session`]) rather than keeping one process alive across both calls.

use super::{ResponseBody, Service, Transport};
use crate::error::{BitResult, ErrorKind};
use crate::protocol::{self, Discovery};
use async_trait::async_trait;
use bit_protocol::pktline::PktLineReader;
use git_url_parse::GitUrl;
use openssh::{KnownHosts, Session, Stdio};
use tokio::io::{AsyncWriteExt, BufReader};

pub struct SshTransport {
    session: Session,
    path: String,
}

impl SshTransport {
    pub async fn new(url: &GitUrl) -> BitResult<Self> {
        let host = url
            .host
            .as_deref()
            .ok_or_else(|| ErrorKind::transport(url.to_string(), "ssh url has no host"))?;
        let destination = match &url.user {
            Some(user) => format!("ssh://{}@{}", user, host),
            None => format!("ssh://{}", host),
        };
        let session = Session::connect(&destination, KnownHosts::Strict)
            .await
            .map_err(|e| ErrorKind::transport(url.to_string(), e.to_string()))?;
        Ok(Self { session, path: url.path.clone() })
    }

    async fn exec(&self, service: Service) -> BitResult<openssh::Child<&Session>> {
        // `ssh` only forwards the client's environment when both sides opt in
        // (`SendEnv`/`AcceptEnv`), which most sshd configs don't; running the
        // real command through the remote `env` binary instead gets
        // `GIT_PROTOCOL` to a v2-capable `git-upload-pack`/`git-receive-pack`
        // unconditionally.
        self.session
            .command("env")
            .arg("GIT_PROTOCOL=version=2")
            .arg(service.as_str())
            .arg(&self.path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .await
            .map_err(|e| ErrorKind::transport(self.path.clone(), e.to_string()).into())
    }
}

#[async_trait]
impl Transport for SshTransport {
    async fn discover(&self, service: Service) -> BitResult<Discovery> {
        let mut child = self.exec(service).await?;
        let stdout = child.stdout().take().expect("piped stdout");
        let mut reader = PktLineReader::new(BufReader::new(stdout));
        let discovery = protocol::discover(&mut reader, true).await?;
        drop(reader);
        let status = child.wait().await.map_err(|e| ErrorKind::transport(self.path.clone(), e.to_string()))?;
        if !status.success() {
            return Err(ErrorKind::transport(
                self.path.clone(),
                format!("remote `{}` exited with {}", service.as_str(), status),
            )
            .into());
        }
        Ok(discovery)
    }

    async fn connect(&self, service: Service, body: Vec<u8>) -> BitResult<ResponseBody> {
        let mut child = self.exec(service).await?;
        let stdout = child.stdout().take().expect("piped stdout");
        let mut stdin = child.stdin().take().expect("piped stdin");
        let mut reader = PktLineReader::new(BufReader::new(stdout));
        // discard the advertisement; the caller already consulted its own via `discover`
        protocol::discover(&mut reader, true).await?;
        stdin.write_all(&body).await?;
        stdin.flush().await?;
        drop(stdin);
        let stdout = reader.into_inner();
        // the child keeps writing its response after we return; we let it leak
        // rather than thread a lifetime through `ResponseBody` for it, and rely
        // on the remote process exiting once it closes stdout.
        std::mem::forget(child);
        Ok(Box::new(stdout))
    }
}

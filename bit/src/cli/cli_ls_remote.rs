use clap::Parser;
use libbit::error::BitResult;
use libbit::remote::DEFAULT_REMOTE;
use libbit::repo::BitRepo;

#[derive(Parser, Debug)]
pub struct BitLsRemoteCliOpts {
    remote: Option<String>,
}

impl BitLsRemoteCliOpts {
    #[tokio::main]
    pub async fn exec(self, repo: BitRepo<'_>) -> BitResult<()> {
        let remote = self.remote.as_deref().unwrap_or(DEFAULT_REMOTE);
        for (oid, name) in repo.ls_remote(remote).await? {
            println!("{}\t{}", oid, name);
        }
        Ok(())
    }
}

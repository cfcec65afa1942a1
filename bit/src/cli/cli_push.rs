use super::Cmd;
use clap::Parser;
use libbit::error::BitResult;
use libbit::refs::BitRef;
use libbit::remote::{PushOptions, DEFAULT_REMOTE};
use libbit::repo::BitRepo;

#[derive(Parser, Debug)]
pub struct BitPushCliOpts {
    remote: Option<String>,
    refspec: Option<String>,
    /// push even when it isn't a fast-forward
    #[clap(long, short = 'f')]
    force: bool,
    /// ask the remote to delete the ref instead of updating it
    #[clap(long)]
    delete: bool,
}

impl Cmd for BitPushCliOpts {
    fn exec(self, repo: BitRepo<'_>) -> BitResult<()> {
        self.exec_async(repo)
    }
}

impl BitPushCliOpts {
    #[tokio::main]
    async fn exec_async(self, repo: BitRepo<'_>) -> BitResult<()> {
        let remote = self.remote.as_deref().unwrap_or(DEFAULT_REMOTE);
        let refspec = match self.refspec {
            Some(refspec) => refspec,
            None => match repo.partially_resolve_ref(BitRef::HEAD)? {
                BitRef::Symbolic(sym) => sym.to_string(),
                BitRef::Direct(..) => bail!("cannot push from a detached HEAD"),
            },
        };
        let opts = PushOptions { force: self.force, delete: self.delete };
        repo.push_with_options(remote, &refspec, &opts).await?;
        Ok(())
    }
}

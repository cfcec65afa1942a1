use super::Cmd;
use clap::Parser;
use libbit::error::BitResult;
use libbit::remote::FetchOptions;
use libbit::repo::BitRepo;

#[derive(Parser, Debug)]
pub struct BitFetchCliOpts {
    remote: Option<String>,
    /// truncate history to the given number of commits
    #[clap(long)]
    depth: Option<u32>,
    /// fetch every tag the remote advertises, not just matched branches
    #[clap(long)]
    tags: bool,
    /// fetch only this branch
    #[clap(long = "single-branch")]
    single_branch: Option<String>,
    /// remove remote-tracking refs the remote no longer has
    #[clap(long)]
    prune: bool,
}

impl BitFetchCliOpts {
    fn options(&self) -> FetchOptions {
        FetchOptions {
            depth: self.depth,
            single_branch: self.single_branch.clone(),
            tags: self.tags,
            prune: self.prune,
            prune_tags: self.prune && self.tags,
            ..Default::default()
        }
    }
}

impl Cmd for BitFetchCliOpts {
    fn exec(self, repo: BitRepo<'_>) -> BitResult<()> {
        self.exec_async(repo)
    }
}

impl BitFetchCliOpts {
    #[tokio::main]
    async fn exec_async(self, repo: BitRepo<'_>) -> BitResult<()> {
        let opts = self.options();
        match &self.remote {
            Some(remote) => {
                repo.fetch_with_options(remote, &opts).await?;
            }
            None => {
                // TODO run these using join concurrently
                for remote in repo.ls_remotes() {
                    repo.fetch_with_options(remote.name, &opts).await?;
                }
            }
        };
        Ok(())
    }
}

use clap::Parser;
use git_url_parse::GitUrl;
use libbit::error::BitResult;
use libbit::remote::FetchOptions;
use libbit::repo::BitRepo;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
pub struct BitCloneCliOpts {
    /// The repository to clone from
    url: String,
    /// The directory to clone into. If the directory exists it must be empty
    directory: Option<PathBuf>,
    /// truncate history to the given number of commits
    #[clap(long)]
    depth: Option<u32>,
}

impl BitCloneCliOpts {
    pub fn exec(&self, base_path: &Path) -> BitResult<()> {
        let url = GitUrl::parse(&self.url)?;
        let directory =
            base_path.join(self.directory.as_deref().unwrap_or_else(|| Path::new(&url.name)));
        eprintln!("cloning into `{}`", directory.display());
        if directory.exists() {
            ensure!(
                directory.read_dir()?.next().is_none(),
                "cannot clone into non-empty directory"
            );
        }
        let opts = FetchOptions { depth: self.depth, ..Default::default() };
        BitRepo::clone_blocking_with_options(&directory, &self.url, &opts)
    }
}

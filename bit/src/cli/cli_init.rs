use clap::Parser;
use libbit::error::BitResult;
use libbit::repo::BitRepo;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
pub struct BitInitCliOpts {
    #[clap(default_value = ".")]
    pub path: PathBuf,
}

impl BitInitCliOpts {
    pub fn exec(self, base_path: &Path) -> BitResult<()> {
        let path = base_path.join(&self.path);
        // `BitRepo::init` already reports init-vs-reinit to stdout itself.
        BitRepo::init(&path)
    }
}

mod cli_clone;
mod cli_fetch;
mod cli_index_pack;
mod cli_init;
mod cli_ls_remote;
mod cli_pull;
mod cli_push;
mod cli_remote;

// notes
// the bitopts and bitcliopts are distinct types for a few reasons
// - the parsed format is often not very convenient for actual usage
// - feels a bit (punny!) wrong to have cli parsing stuff in the library
// - probably will make it such that libbit doesn't even expose full commands
//   and be something more like libgit2

use clap::Parser;
use cli_clone::BitCloneCliOpts;
use cli_fetch::BitFetchCliOpts;
use cli_index_pack::BitIndexPackCliOpts;
use cli_init::BitInitCliOpts;
use cli_ls_remote::BitLsRemoteCliOpts;
use cli_pull::BitPullCliOpts;
use cli_push::BitPushCliOpts;
use cli_remote::BitRemoteCliOpts;
use libbit::error::BitResult;
use libbit::repo::BitRepo;
use std::ffi::OsString;
use std::path::PathBuf;

pub trait Cmd {
    fn exec(self, repo: BitRepo<'_>) -> BitResult<()>;
}

pub fn run<T: Into<OsString> + Clone>(args: impl IntoIterator<Item = T>) -> BitResult<()> {
    let opts = BitCliOpts::parse_from(args);
    let BitCliOpts { subcmd, root_path } = opts;
    // `init`/`clone`/`index-pack` don't operate against an already-open repo
    // (clone and init create the destination themselves; index-pack just
    // reads a loose pack file off disk), so they run before `BitRepo::find`.
    let subcmd = match subcmd {
        BitSubCmd::Init(opts) => return opts.exec(&root_path),
        BitSubCmd::Clone(opts) => return opts.exec(&root_path),
        BitSubCmd::IndexPack(opts) => return opts.exec(),
        other => other,
    };

    BitRepo::find(root_path, |repo| match subcmd {
        BitSubCmd::Init(..) | BitSubCmd::Clone(..) | BitSubCmd::IndexPack(..) => unreachable!(),
        BitSubCmd::Fetch(opts) => opts.exec(repo),
        BitSubCmd::Pull(opts) => opts.exec(repo),
        BitSubCmd::Push(opts) => opts.exec(repo),
        BitSubCmd::LsRemote(opts) => opts.exec(repo),
        BitSubCmd::Remote(opts) => opts.exec(repo),
    })
}

#[derive(Parser, Debug)]
#[clap(author = "Andy Yu <andyyu2004@gmail.com>")]
pub struct BitCliOpts {
    #[clap(subcommand)]
    pub subcmd: BitSubCmd,
    #[clap(short = 'C', default_value = ".")]
    pub root_path: PathBuf,
}

#[derive(Parser, Debug)]
pub enum BitSubCmd {
    Clone(BitCloneCliOpts),
    Fetch(BitFetchCliOpts),
    #[clap(name = "index-pack")]
    IndexPack(BitIndexPackCliOpts),
    Init(BitInitCliOpts),
    #[clap(name = "ls-remote")]
    LsRemote(BitLsRemoteCliOpts),
    Pull(BitPullCliOpts),
    Push(BitPushCliOpts),
    Remote(BitRemoteCliOpts),
}

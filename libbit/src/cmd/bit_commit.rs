use crate::commit::CommitOpts;
use crate::error::BitResult;
use crate::repo::BitRepo;

impl<'rcx> BitRepo<'rcx> {
    /// test/demo entry point that commits and prints the result in porcelain style.
    pub fn bit_commit(&self, message: Option<String>) -> BitResult<()> {
        let summary = self.commit(CommitOpts { message, allow_empty: false })?;
        println!("{}", summary);
        Ok(())
    }
}

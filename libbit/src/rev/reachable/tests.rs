use super::*;
use crate::repo::BitRepo;
use crate::test_utils::*;

#[test]
fn ancestor_chain_is_detected_through_multiple_commits() -> BitResult<()> {
    BitRepo::with_sample_repo_commits(|repo, commits| {
        assert!(repo.is_ancestor(commits[0], commits[0])?);
        assert!(repo.is_ancestor(commits[0], *commits.last().unwrap())?);
        assert!(!repo.is_ancestor(*commits.last().unwrap(), commits[0])?);
        Ok(())
    })
}

#[test]
fn merge_base_of_a_commit_and_its_own_ancestor_is_the_ancestor() -> BitResult<()> {
    BitRepo::with_sample_repo_commits(|repo, commits| {
        let base = repo.find_merge_base(commits[1], commits[3])?;
        assert_eq!(base, Some(commits[1]));
        Ok(())
    })
}

#[test]
fn reachable_objects_includes_every_commit_in_the_chain() -> BitResult<()> {
    BitRepo::with_sample_repo_commits(|repo, commits| {
        let reachable = repo.list_reachable_objects(*commits.last().unwrap())?;
        for commit in &commits {
            assert!(reachable.contains(commit));
        }
        Ok(())
    })
}

#[test]
fn objects_excluding_earlier_tip_omits_its_ancestors() -> BitResult<()> {
    BitRepo::with_sample_repo_commits(|repo, commits| {
        let wanted = repo.list_objects_excluding(*commits.last().unwrap(), Some(commits[2]))?;
        assert!(!wanted.contains(&commits[0]));
        assert!(!wanted.contains(&commits[2]));
        assert!(wanted.contains(commits.last().unwrap()));
        Ok(())
    })
}

use chrono::{DateTime, FixedOffset};
use std::path::Path;
use til_types::{Commit, FileTimestamps, History, Result, TilError};

use crate::diff;

/// Read-only view over the commit history of a git working tree.
pub struct Git2History {
    repo: git2::Repository,
}

impl Git2History {
    pub fn open(path: &Path) -> Result<Self> {
        let repo = git2::Repository::open(path).map_err(|e| {
            TilError::Ingest(format!("cannot open repository at {}: {}", path.display(), e.message()))
        })?;
        Ok(Self { repo })
    }

    /// Every commit reachable from `reference`, oldest first.
    pub fn commits(&self, reference: &str) -> Result<Vec<Commit>> {
        let tip = resolve_tip(&self.repo, reference)?;

        // Revwalk: newest-first by commit time, reversed so the fold sees
        // history in chronological order.
        let mut revwalk = self
            .repo
            .revwalk()
            .map_err(|e| TilError::Ingest(e.message().to_string()))?;
        revwalk
            .push(tip.id())
            .map_err(|e| TilError::Ingest(e.message().to_string()))?;
        revwalk
            .set_sorting(git2::Sort::TIME | git2::Sort::REVERSE)
            .map_err(|e| TilError::Ingest(e.message().to_string()))?;

        let mut commits = Vec::new();
        for oid_result in revwalk {
            let oid = oid_result.map_err(|e| TilError::Ingest(e.message().to_string()))?;
            let git_commit = self
                .repo
                .find_commit(oid)
                .map_err(|e| TilError::Ingest(format!("failed to find commit {}: {}", oid, e.message())))?;

            commits.push(Commit {
                sha: oid.to_string(),
                time: commit_time(&git_commit)?,
                paths: diff::changed_paths(&self.repo, &git_commit)?,
            });
        }

        tracing::debug!(reference, commits = commits.len(), "walked history");
        Ok(commits)
    }

    /// First-seen and last-seen times of every path touched on `reference`.
    pub fn scan(&self, reference: &str) -> Result<History> {
        Ok(fold_commits(self.commits(reference)?))
    }
}

/// Fold commits, oldest first, into per-path timestamps: the first commit
/// touching a path sets `created`, every commit touching it moves `updated`.
pub fn fold_commits<I>(commits: I) -> History
where
    I: IntoIterator<Item = Commit>,
{
    let mut history = History::new();
    for commit in commits {
        for path in commit.paths {
            history
                .entry(path)
                .and_modify(|times| times.touch(commit.time))
                .or_insert_with(|| FileTimestamps::first_seen(commit.time));
        }
    }
    history
}

/// Committer time in the committer's own offset.
fn commit_time(commit: &git2::Commit) -> Result<DateTime<FixedOffset>> {
    let when = commit.time();
    let offset = FixedOffset::east_opt(when.offset_minutes() * 60).ok_or_else(|| {
        TilError::Ingest(format!("commit {} has an invalid offset", commit.id()))
    })?;
    DateTime::from_timestamp(when.seconds(), 0)
        .map(|utc| utc.with_timezone(&offset))
        .ok_or_else(|| TilError::Ingest(format!("commit {} has an invalid timestamp", commit.id())))
}

fn resolve_tip<'repo>(repo: &'repo git2::Repository, reference: &str) -> Result<git2::Commit<'repo>> {
    // Prefer the local branch, then anything revparse understands.
    let refname = format!("refs/heads/{}", reference);
    if let Ok(obj) = repo.revparse_single(&refname) {
        if let Ok(commit) = obj.peel_to_commit() {
            return Ok(commit);
        }
    }

    repo.revparse_single(reference)
        .and_then(|obj| obj.peel_to_commit())
        .map_err(|e| TilError::Ingest(format!("cannot resolve '{}': {}", reference, e.message())))
}

use til_types::{Result, TilError};

/// Paths a commit touched relative to its first parent. Root commits are
/// compared against the empty tree. Renames are not detected, so a moved
/// file shows up under both its old and its new path.
pub fn changed_paths(repo: &git2::Repository, commit: &git2::Commit) -> Result<Vec<String>> {
    let parent_tree = if commit.parent_count() > 0 {
        Some(
            commit
                .parent(0)
                .map_err(|e| TilError::Ingest(e.message().to_string()))?
                .tree()
                .map_err(|e| TilError::Ingest(e.message().to_string()))?,
        )
    } else {
        None
    };

    let commit_tree = commit
        .tree()
        .map_err(|e| TilError::Ingest(e.message().to_string()))?;

    let diff = repo
        .diff_tree_to_tree(parent_tree.as_ref(), Some(&commit_tree), None)
        .map_err(|e| TilError::Ingest(e.message().to_string()))?;

    let mut paths: Vec<String> = Vec::new();
    for delta in diff.deltas() {
        let candidates = match delta.status() {
            git2::Delta::Deleted => [delta.old_file().path(), None],
            git2::Delta::Added | git2::Delta::Untracked => [delta.new_file().path(), None],
            _ => [delta.old_file().path(), delta.new_file().path()],
        };
        for path in candidates.into_iter().flatten() {
            let Some(s) = path.to_str() else { continue };
            if !paths.iter().any(|p| p == s) {
                paths.push(s.to_string());
            }
        }
    }

    Ok(paths)
}

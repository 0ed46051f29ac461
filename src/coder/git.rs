// src/coder/git.rs
// Git operations on the engine workspace using git2

use git2::build::CheckoutBuilder;
use git2::{DiffFormat, ErrorCode, Repository, ResetType, StatusOptions, Tree};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::types::CommitRef;
use crate::error::{CoderError, Result};

/// Git view of a workspace directory. The repository is reopened on every
/// call so changes made by the engine process are always visible.
#[derive(Debug, Clone)]
pub struct GitWorkspace {
    root: PathBuf,
}

impl GitWorkspace {
    /// Find the repository containing `root`, if there is one
    pub fn discover(root: &Path) -> Option<Self> {
        match Repository::discover(root) {
            Ok(_) => Some(Self {
                root: root.to_path_buf(),
            }),
            Err(e) => {
                debug!("No git repository at {}: {}", root.display(), e);
                None
            }
        }
    }

    fn open(&self) -> Result<Repository> {
        Repository::discover(&self.root)
            .map_err(|_| CoderError::NoRepository(self.root.display().to_string()))
    }

    /// Current HEAD commit. `None` when the branch has no commits yet.
    pub fn head_commit(&self) -> Result<Option<CommitRef>> {
        let repo = self.open()?;
        let head = match repo.head() {
            Ok(head) => head,
            Err(e) if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => {
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        let commit = head.peel_to_commit()?;

        Ok(Some(CommitRef {
            hash: commit.id().to_string(),
            message: commit.message().unwrap_or("").trim().to_string(),
        }))
    }

    /// Unified diff between two revisions (anything `git rev-parse` accepts)
    pub fn diff_commits(&self, from: &str, to: &str) -> Result<String> {
        let repo = self.open()?;
        let old_tree = repo.revparse_single(from)?.peel_to_tree()?;
        let new_tree = repo.revparse_single(to)?.peel_to_tree()?;
        let diff = repo.diff_tree_to_tree(Some(&old_tree), Some(&new_tree), None)?;

        let mut patch = String::new();
        diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
            if matches!(line.origin(), '+' | '-' | ' ') {
                patch.push(line.origin());
            }
            patch.push_str(&String::from_utf8_lossy(line.content()));
            true
        })?;

        Ok(patch)
    }

    /// Paths with uncommitted changes, restricted to `paths`
    pub fn dirty_paths(&self, paths: &[String]) -> Result<Vec<String>> {
        let repo = self.open()?;
        let mut options = StatusOptions::new();
        options.include_untracked(false).include_ignored(false);

        let wanted: BTreeSet<&str> = paths.iter().map(String::as_str).collect();
        let statuses = repo.statuses(Some(&mut options))?;

        Ok(statuses
            .iter()
            .filter(|entry| !entry.status().is_empty())
            .filter_map(|entry| entry.path().map(str::to_string))
            .filter(|path| wanted.contains(path.as_str()))
            .collect())
    }

    /// Undo `hash`, which must be HEAD: restore the files it touched from
    /// its parent, then move HEAD back. Returns the restored paths.
    pub fn undo_commit(&self, hash: &str) -> Result<Vec<String>> {
        let repo = self.open()?;
        let head = repo.head()?.peel_to_commit()?;

        if head.id().to_string() != hash {
            return Err(CoderError::conflict(
                "The last engine commit is no longer HEAD, not undoing",
            ));
        }
        if head.parent_count() == 0 {
            return Err(CoderError::conflict(
                "The last engine commit has no parent, not undoing",
            ));
        }

        let parent = head.parent(0)?;
        let paths = changed_paths(&repo, &parent.tree()?, &head.tree()?)?;

        let dirty = self.dirty_paths(&paths)?;
        if !dirty.is_empty() {
            return Err(CoderError::conflict(format!(
                "Uncommitted changes in {}, not undoing",
                dirty.join(", ")
            )));
        }

        let mut checkout = CheckoutBuilder::new();
        checkout.force().disable_pathspec_match(true);
        for path in &paths {
            checkout.path(path.as_str());
        }
        repo.checkout_tree(parent.as_object(), Some(&mut checkout))?;
        repo.reset(parent.as_object(), ResetType::Soft, None)?;

        if paths.is_empty() {
            warn!("Undid commit {} which touched no files", hash);
        }
        Ok(paths)
    }
}

fn changed_paths(repo: &Repository, old: &Tree<'_>, new: &Tree<'_>) -> Result<Vec<String>> {
    let diff = repo.diff_tree_to_tree(Some(old), Some(new), None)?;
    let paths = diff
        .deltas()
        .filter_map(|delta| delta.new_file().path().or_else(|| delta.old_file().path()))
        .map(|p| p.to_string_lossy().replace('\\', "/"))
        .collect();
    Ok(paths)
}

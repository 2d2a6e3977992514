//! Specification source checkout
//!
//! Uses a caller-provided local tree when given; otherwise clones the
//! configured remote and pins it to a revision with a detached HEAD.

use std::fs;
use std::path::{Path, PathBuf};

use git2::build::CheckoutBuilder;
use git2::Repository;
use tracing::info;

use crate::config::SourceConfig;
use crate::error::{Result, SchemaError};

/// Resolve the checkout root to run against
pub fn prepare_checkout(local: Option<&Path>, source: &SourceConfig, clone_dir: &Path) -> Result<PathBuf> {
    if let Some(path) = local {
        if !path.is_dir() {
            return Err(SchemaError::Config(format!(
                "local checkout not found: {}",
                path.display()
            )));
        }
        return Ok(fs::canonicalize(path)?);
    }

    let repo = open_or_clone(&source.remote_url, clone_dir)?;
    checkout_revision(&repo, &source.pinned_commit)?;
    Ok(clone_dir.to_path_buf())
}

fn open_or_clone(url: &str, dir: &Path) -> Result<Repository> {
    match Repository::open(dir) {
        Ok(repo) => {
            info!(dir = %dir.display(), "fetching into existing clone");
            {
                let mut remote = repo.find_remote("origin")?;
                remote.fetch(&[] as &[&str], None, None)?;
            }
            Ok(repo)
        }
        Err(_) => {
            info!(url, dir = %dir.display(), "cloning specification source");
            if let Some(parent) = dir.parent() {
                fs::create_dir_all(parent)?;
            }
            Ok(Repository::clone(url, dir)?)
        }
    }
}

/// Check out `revision` (commit, tag or branch) with a detached HEAD
pub fn checkout_revision(repo: &Repository, revision: &str) -> Result<()> {
    let object = repo
        .revparse_single(revision)
        .or_else(|_| repo.revparse_single(&format!("origin/{}", revision)))?;
    let commit = object.peel_to_commit()?;

    repo.checkout_tree(commit.as_object(), Some(CheckoutBuilder::new().force()))?;
    repo.set_head_detached(commit.id())?;
    info!(revision, commit = %commit.id(), "checked out pinned revision");
    Ok(())
}

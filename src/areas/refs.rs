//! References (branches and HEAD)
//!
//! References are human-readable names for commits, stored as small
//! text files. Every ref file ends with a newline and holds either a
//! 40-character commit id or `ref: <path>` for the symbolic HEAD.
//!
//! ## HEAD states
//!
//! - `Symbolic(refs/heads/<name>)`: on a branch
//! - `Detached(<oid>)`: directly on a commit

use crate::artifacts::branch::branch_name::BranchName;
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::CoreError;
use anyhow::Context;
use derive_new::new;
use file_guard::Lock;
use std::io::Write;
use std::ops::DerefMut;
use std::path::{Path, PathBuf};

/// Name of the HEAD file
pub const HEAD_REF_NAME: &str = "HEAD";

/// Pattern of a symbolic reference line
const SYMREF_REGEX: &str = r"^ref: (.+)$";

/// The two states HEAD can be in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Head {
    /// HEAD names a branch ref path (`refs/heads/<name>`)
    Symbolic(String),
    /// HEAD holds a commit id directly
    Detached(ObjectId),
}

/// Reference manager rooted at the repository metadata directory.
#[derive(Debug, new)]
pub struct Refs {
    /// Path to the metadata directory (`.gitgo`)
    path: Box<Path>,
}

impl Refs {
    /// Read HEAD and classify it.
    pub fn read_head(&self) -> anyhow::Result<Head> {
        let content = std::fs::read_to_string(self.head_path())
            .map_err(|_| CoreError::not_found(HEAD_REF_NAME.to_string()))?;
        let content = content.trim();

        let symref = regex::Regex::new(SYMREF_REGEX)?.captures(content);
        match symref {
            Some(captures) => Ok(Head::Symbolic(captures[1].trim().to_string())),
            None => Ok(Head::Detached(ObjectId::try_parse(content.to_string())?)),
        }
    }

    /// Resolve HEAD to a commit id, if one exists yet.
    ///
    /// A symbolic HEAD pointing at a branch with no commits resolves to
    /// `None`.
    pub fn resolve_head(&self) -> anyhow::Result<Option<ObjectId>> {
        match self.read_head()? {
            Head::Detached(oid) => Ok(Some(oid)),
            Head::Symbolic(ref_path) => {
                let branch = BranchName::try_parse_ref_path(&ref_path)?;
                self.read_branch(&branch)
            }
        }
    }

    /// The branch HEAD points at, or `None` when detached.
    pub fn current_branch(&self) -> anyhow::Result<Option<BranchName>> {
        match self.read_head()? {
            Head::Detached(_) => Ok(None),
            Head::Symbolic(ref_path) => Ok(Some(BranchName::try_parse_ref_path(&ref_path)?)),
        }
    }

    /// Point HEAD at a branch.
    pub fn set_head_symbolic(&self, branch: &BranchName) -> anyhow::Result<()> {
        self.write_ref_file(
            self.head_path(),
            format!("ref: {}\n", branch.to_ref_path()),
        )
    }

    /// Detach HEAD onto a commit.
    pub fn set_head_detached(&self, oid: &ObjectId) -> anyhow::Result<()> {
        self.write_ref_file(self.head_path(), format!("{oid}\n"))
    }

    /// Read a branch's commit id; `None` when the branch file is empty
    /// (a freshly initialized branch that has never been committed to).
    pub fn read_branch(&self, name: &BranchName) -> anyhow::Result<Option<ObjectId>> {
        let branch_path = self.branch_path(name);

        if !branch_path.exists() {
            return Err(CoreError::not_found(format!("branch '{name}'")).into());
        }

        let content = std::fs::read_to_string(&branch_path)
            .with_context(|| format!("failed to read ref file at {}", branch_path.display()))?;
        let content = content.trim();

        if content.is_empty() {
            return Ok(None);
        }

        Ok(Some(ObjectId::try_parse(content.to_string())?))
    }

    pub fn branch_exists(&self, name: &BranchName) -> bool {
        self.branch_path(name).is_file()
    }

    /// Advance a branch to a commit, creating the file when missing.
    pub fn update_branch(&self, name: &BranchName, oid: &ObjectId) -> anyhow::Result<()> {
        self.write_ref_file(self.branch_path(name), format!("{oid}\n"))
    }

    /// Create a new branch pointing at a commit.
    pub fn create_branch(&self, name: &BranchName, oid: &ObjectId) -> anyhow::Result<()> {
        let branch_path = self.branch_path(name);

        if branch_path.exists() {
            return Err(
                CoreError::validation(format!("branch '{name}' already exists")).into(),
            );
        }

        self.write_ref_file(branch_path, format!("{oid}\n"))
    }

    /// Delete a branch. The branch HEAD currently points at is
    /// protected.
    pub fn delete_branch(&self, name: &BranchName) -> anyhow::Result<()> {
        if self.current_branch()?.as_ref() == Some(name) {
            return Err(CoreError::state(format!(
                "cannot delete branch '{name}': it is the current branch"
            ))
            .into());
        }

        let branch_path = self.branch_path(name);
        if !branch_path.exists() {
            return Err(CoreError::not_found(format!("branch '{name}'")).into());
        }

        std::fs::remove_file(&branch_path)
            .with_context(|| format!("failed to delete branch file {}", branch_path.display()))?;

        Ok(())
    }

    /// Branch names under `refs/heads/`, in no particular order.
    pub fn list_branches(&self) -> anyhow::Result<Vec<BranchName>> {
        let mut branches = Vec::new();

        for entry in std::fs::read_dir(self.heads_path())
            .with_context(|| "failed to list refs/heads".to_string())?
        {
            let entry = entry?;
            if !entry.path().is_file() {
                continue;
            }

            let file_name = entry.file_name();
            let name = file_name
                .to_str()
                .ok_or_else(|| CoreError::validation("branch file name is not valid UTF-8"))?;
            branches.push(BranchName::try_parse(name.to_string())?);
        }

        Ok(branches)
    }

    /// Write a ref file under an exclusive advisory lock.
    fn write_ref_file(&self, path: PathBuf, raw_ref: String) -> anyhow::Result<()> {
        std::fs::create_dir_all(path.parent().with_context(|| {
            format!("failed to resolve parent directory of {}", path.display())
        })?)?;

        let mut ref_file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .with_context(|| format!("failed to open ref file at {}", path.display()))?;
        let mut lock = file_guard::lock(&mut ref_file, Lock::Exclusive, 0, 1)?;
        lock.deref_mut().write_all(raw_ref.as_bytes())?;

        Ok(())
    }

    pub fn head_path(&self) -> PathBuf {
        self.path.join(HEAD_REF_NAME)
    }

    pub fn refs_path(&self) -> PathBuf {
        self.path.join("refs")
    }

    pub fn heads_path(&self) -> PathBuf {
        self.refs_path().join("heads")
    }

    fn branch_path(&self, name: &BranchName) -> PathBuf {
        self.heads_path().join(name.as_ref())
    }
}

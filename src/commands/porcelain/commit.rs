use crate::areas::repository::Repository;
use crate::artifacts::objects::commit::{Author, Commit};
use crate::artifacts::snapshot::TreeBuilder;
use crate::errors::CoreError;
use anyhow::Context;
use std::io::Write;

impl Repository {
    /// Record the staged entries as a new snapshot on the current
    /// branch.
    ///
    /// Ordering within the command: trees are written before the commit
    /// that references them, the commit before the branch update, the
    /// branch update before the index clear.
    pub fn commit(&self, message: &str) -> anyhow::Result<()> {
        self.require_repository()?;

        let mut index = self.index();
        index.rehydrate()?;

        if index.is_empty() {
            return Err(CoreError::state("nothing to commit, staging area is empty").into());
        }

        let branch = self.refs().current_branch()?.ok_or_else(|| {
            CoreError::state("HEAD is detached; committing requires a branch")
        })?;

        let parent = self.refs().read_branch(&branch)?;
        let previous_tree = match &parent {
            Some(parent_oid) => {
                let parent_commit = self
                    .database()
                    .parse_object_as_commit(parent_oid)
                    .with_context(|| format!("failed to read previous commit {parent_oid}"))?
                    .ok_or_else(|| {
                        CoreError::corruption(format!("object {parent_oid} is not a commit"))
                    })?;
                Some(parent_commit.tree_oid().clone())
            }
            None => None,
        };

        let mut builder = TreeBuilder::new(self.database());
        if let Some(tree_oid) = &previous_tree {
            builder.seed_from_tree(tree_oid)?;
        }
        for entry in index.entries() {
            builder.stage(entry);
        }
        let tree_oid = builder.write_trees().context("failed to build tree")?;

        let author = Author::load_from_env()?;
        let commit = Commit::new(tree_oid, parent.clone(), author, message.to_string())?;
        let commit_oid = self.database().store(&commit)?;

        self.refs().update_branch(&branch, &commit_oid)?;

        index.clear();
        index.write_updates()?;

        let root_marker = match parent {
            Some(_) => "",
            None => "(root-commit) ",
        };
        writeln!(
            self.writer(),
            "[{branch} {root_marker}{commit_oid}] {}",
            commit.short_message()
        )?;

        Ok(())
    }
}

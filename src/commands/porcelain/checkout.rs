use crate::areas::repository::Repository;
use crate::artifacts::branch::branch_name::BranchName;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::tree::Tree;
use crate::errors::CoreError;
use anyhow::Context;
use std::io::Write;

/// How a checkout target resolved.
enum Target {
    Branch(BranchName, ObjectId),
    Commit(ObjectId),
}

impl Repository {
    /// Materialize a commit's tree into the working directory.
    ///
    /// The target is a branch name first, a full commit hash second.
    /// The commit and its full tree are read and the working tree
    /// replaced before HEAD moves, so an unresolvable target never
    /// changes the repository state.
    ///
    /// Uncommitted working-tree content is destroyed; the clean-tree
    /// policy sits above this core.
    pub fn checkout(&self, target: &str) -> anyhow::Result<()> {
        self.require_repository()?;

        let target = self.resolve_checkout_target(target)?;
        let oid = match &target {
            Target::Branch(_, oid) | Target::Commit(oid) => oid.clone(),
        };

        let commit = self
            .database()
            .parse_object_as_commit(&oid)
            .with_context(|| format!("failed to read commit {oid}"))?
            .ok_or_else(|| CoreError::corruption(format!("object {oid} is not a commit")))?;

        let root_tree = self
            .database()
            .parse_object_as_tree(commit.tree_oid())
            .with_context(|| format!("failed to read tree {}", commit.tree_oid()))?
            .ok_or_else(|| {
                CoreError::corruption(format!("object {} is not a tree", commit.tree_oid()))
            })?;

        self.workspace().clear_working_tree()?;
        self.materialize_tree(&root_tree, "")?;

        match &target {
            Target::Branch(branch, _) => {
                self.refs().set_head_symbolic(branch)?;
                writeln!(self.writer(), "Switched to branch '{branch}'")?;
            }
            Target::Commit(oid) => {
                self.refs().set_head_detached(oid)?;
                writeln!(
                    self.writer(),
                    "HEAD is now at {} {}",
                    oid.to_short_oid(),
                    commit.short_message()
                )?;
            }
        }

        Ok(())
    }

    fn resolve_checkout_target(&self, target: &str) -> anyhow::Result<Target> {
        if let Ok(branch) = BranchName::try_parse(target.to_string())
            && self.refs().branch_exists(&branch)
        {
            let oid = self.refs().read_branch(&branch)?.ok_or_else(|| {
                CoreError::state(format!("branch '{branch}' has no commits yet"))
            })?;
            return Ok(Target::Branch(branch, oid));
        }

        if ObjectId::is_valid(target) {
            return Ok(Target::Commit(ObjectId::try_parse(target.to_string())?));
        }

        Err(CoreError::not_found(format!("branch or commit '{target}'")).into())
    }

    /// Write a tree's entries under the given repo-relative prefix,
    /// recursing into subtrees.
    fn materialize_tree(&self, tree: &Tree, prefix: &str) -> anyhow::Result<()> {
        for (name, record) in tree.entries() {
            let relative = if prefix.is_empty() {
                name.clone()
            } else {
                format!("{prefix}/{name}")
            };

            if record.mode.is_directory() {
                self.workspace().make_directory(&relative)?;

                let subtree = self
                    .database()
                    .parse_object_as_tree(&record.oid)
                    .with_context(|| format!("failed to read subtree {}", record.oid))?
                    .ok_or_else(|| {
                        CoreError::corruption(format!("object {} is not a tree", record.oid))
                    })?;
                self.materialize_tree(&subtree, &relative)?;
            } else {
                let blob = self
                    .database()
                    .parse_object_as_blob(&record.oid)
                    .with_context(|| format!("failed to read blob {}", record.oid))?
                    .ok_or_else(|| {
                        CoreError::corruption(format!("object {} is not a blob", record.oid))
                    })?;

                self.workspace()
                    .write_file(&relative, blob.content(), &record.mode)?;
            }
        }

        Ok(())
    }
}

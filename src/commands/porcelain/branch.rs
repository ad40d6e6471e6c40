use crate::areas::repository::Repository;
use crate::artifacts::branch::branch_name::BranchName;
use crate::errors::CoreError;
use colored::Colorize;
use std::io::Write;

impl Repository {
    /// List branches, marking the one HEAD points at.
    pub fn list_branches(&self) -> anyhow::Result<()> {
        self.require_repository()?;

        let current = self.refs().current_branch()?;
        let mut branches = self.refs().list_branches()?;
        branches.sort();

        for branch in branches {
            if Some(&branch) == current.as_ref() {
                writeln!(self.writer(), "* {}", branch.to_string().green())?;
            } else {
                writeln!(self.writer(), "  {branch}")?;
            }
        }

        Ok(())
    }

    /// Create a branch pointing at the commit HEAD resolves to.
    pub fn create_branch(&self, name: &str) -> anyhow::Result<()> {
        self.require_repository()?;

        let name = BranchName::try_parse(name.to_string())?;
        let oid = self.refs().resolve_head()?.ok_or_else(|| {
            CoreError::state("cannot create a branch before the first commit")
        })?;

        self.refs().create_branch(&name, &oid)?;

        writeln!(self.writer(), "Created branch '{name}' at {}", oid.to_short_oid())?;

        Ok(())
    }

    /// Delete a branch; the current branch is protected.
    pub fn delete_branch(&self, name: &str) -> anyhow::Result<()> {
        self.require_repository()?;

        let name = BranchName::try_parse(name.to_string())?;
        self.refs().delete_branch(&name)?;

        writeln!(self.writer(), "Deleted branch '{name}'")?;

        Ok(())
    }
}

use crate::areas::repository::Repository;
use crate::artifacts::branch::branch_name::BranchName;
use crate::errors::CoreError;
use anyhow::Context;
use std::fs;
use std::io::Write;

/// Name of the branch a fresh repository starts on
pub const DEFAULT_BRANCH: &str = "main";

impl Repository {
    /// Bootstrap the repository layout:
    ///
    /// ```text
    /// .gitgo/
    ///   HEAD                 "ref: refs/heads/main\n"
    ///   index                empty file
    ///   objects/
    ///   refs/heads/main      empty until the first commit
    /// ```
    pub fn init(&self) -> anyhow::Result<()> {
        let gitgo = self.gitgo_path();

        if gitgo.exists() {
            return Err(CoreError::state(format!(
                "repository already exists in '{}'",
                self.path().display()
            ))
            .into());
        }

        fs::create_dir_all(self.database().objects_path())
            .context("failed to create objects directory")?;
        fs::create_dir_all(self.refs().heads_path())
            .context("failed to create refs/heads directory")?;

        fs::File::create(self.index().path()).context("failed to create index file")?;

        let main = BranchName::try_parse(DEFAULT_BRANCH.to_string())?;
        fs::File::create(self.refs().heads_path().join(main.as_ref()))
            .context("failed to create main branch file")?;
        self.refs().set_head_symbolic(&main)?;

        writeln!(
            self.writer(),
            "Initialized empty gitgo repository in {}",
            self.path().display()
        )?;

        Ok(())
    }
}

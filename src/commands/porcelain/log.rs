use crate::areas::repository::Repository;
use crate::errors::CoreError;
use anyhow::Context;
use colored::Colorize;
use std::io::Write;

impl Repository {
    /// Walk the first-parent chain from HEAD, newest first.
    ///
    /// `max_count` limits the number of entries; `None` walks the full
    /// chain.
    pub fn log(&self, max_count: Option<usize>) -> anyhow::Result<()> {
        self.require_repository()?;

        let mut current = self.refs().resolve_head()?;
        let mut printed = 0usize;

        while let Some(oid) = current {
            if let Some(limit) = max_count
                && printed >= limit
            {
                break;
            }

            let commit = self
                .database()
                .parse_object_as_commit(&oid)
                .with_context(|| format!("failed to read commit {oid}"))?
                .ok_or_else(|| CoreError::corruption(format!("object {oid} is not a commit")))?;

            writeln!(self.writer(), "{}", format!("commit {oid}").yellow())?;
            writeln!(self.writer(), "Author: {}", commit.author().display_name())?;
            writeln!(self.writer(), "Date:   {}", commit.author().readable_timestamp())?;
            writeln!(self.writer())?;
            for line in commit.message().lines() {
                writeln!(self.writer(), "    {line}")?;
            }
            writeln!(self.writer())?;

            current = commit.parent().cloned();
            printed += 1;
        }

        if printed == 0 {
            writeln!(self.writer(), "No commits found")?;
        }

        Ok(())
    }
}

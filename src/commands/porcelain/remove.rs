use crate::areas::repository::Repository;
use anyhow::Context;
use std::io::Write;
use std::path::Path;

impl Repository {
    /// Drop index entries for the given paths.
    ///
    /// This only unstages: the working file is untouched, and the path
    /// still reappears in the next snapshot when the previous commit
    /// carried it.
    pub fn remove(&self, paths: &[String]) -> anyhow::Result<()> {
        self.require_repository()?;

        let mut index = self.index();
        index.rehydrate()?;

        for path in paths {
            let relative = self.workspace().relativize(Path::new(path))?;
            index
                .remove(&relative)
                .with_context(|| format!("failed to remove '{relative}' from index"))?;
        }

        index.write_updates()?;

        writeln!(self.writer(), "Removed {} file(s) from index.", paths.len())?;

        Ok(())
    }
}

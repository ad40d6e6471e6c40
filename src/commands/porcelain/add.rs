use crate::areas::index::Index;
use crate::areas::repository::Repository;
use crate::artifacts::index::index_entry::IndexEntry;
use crate::artifacts::objects::blob::Blob;
use crate::errors::CoreError;
use anyhow::Context;
use std::io::Write;
use std::path::Path;

impl Repository {
    /// Stage the given paths: hash each file as a blob, store it, and
    /// upsert the index binding. Directories are walked recursively.
    pub fn add(&self, paths: &[String]) -> anyhow::Result<()> {
        self.require_repository()?;

        let mut index = self.index();
        index.rehydrate()?;

        let mut staged_count = 0usize;
        for path in paths {
            let relative = self.workspace().relativize(Path::new(path))?;

            for file in self.workspace().list_files(Path::new(&relative))? {
                self.stage_file(&mut index, &file)
                    .with_context(|| format!("failed to add '{file}'"))?;
                staged_count += 1;
            }
        }

        index.write_updates()?;

        writeln!(self.writer(), "Added {staged_count} file(s) to index.")?;

        Ok(())
    }

    fn stage_file(&self, index: &mut Index, relative_path: &str) -> anyhow::Result<()> {
        if self.workspace().is_symlink(relative_path)? {
            return Err(CoreError::validation(format!(
                "'{relative_path}' is a symbolic link, symlinks are not supported"
            ))
            .into());
        }

        let metadata = self.workspace().stat_file(relative_path)?;
        let content = self.workspace().read_file(relative_path)?;

        let blob = Blob::new(content);
        let oid = self.database().store(&blob)?;

        index.add(IndexEntry::new(relative_path.to_string(), oid, metadata));

        Ok(())
    }
}

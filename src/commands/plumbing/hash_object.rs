use crate::areas::repository::Repository;
use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::object::Object;
use std::io::Write;
use std::path::Path;

impl Repository {
    /// Hash a file as a blob and print its id; with `write` the blob is
    /// also stored.
    pub fn hash_object(&self, file: &str, write: bool) -> anyhow::Result<()> {
        self.require_repository()?;

        let relative = self.workspace().relativize(Path::new(file))?;
        let content = self.workspace().read_file(&relative)?;
        let blob = Blob::new(content);

        let oid = if write {
            self.database().store(&blob)?
        } else {
            blob.object_id()?
        };

        writeln!(self.writer(), "{oid}")?;

        Ok(())
    }
}

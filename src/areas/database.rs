//! Object database
//!
//! Content-addressable storage for blobs, trees and commits. Every
//! object lives at `.gitgo/objects/<id[0:2]>/<id[2:40]>`: the first two
//! hex characters fan out into a directory, the rest is the filename.
//!
//! ## Storage format
//!
//! The canonical frame `"<kind> <len>\0<payload>"` is zlib-compressed
//! on disk. Identity is the SHA-1 of the uncompressed frame, so the
//! compression level never affects an object's id.

use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object::{Object, ObjectBox, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::tree::Tree;
use crate::errors::CoreError;
use anyhow::Context;
use bytes::Bytes;
use sha1::{Digest, Sha1};
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

/// Objects written so far by this process, for unique temp names
static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Content-addressed object store rooted at the objects directory.
#[derive(Debug)]
pub struct Database {
    /// Path to the objects directory (`.gitgo/objects`)
    path: Box<Path>,
}

impl Database {
    pub fn new(path: Box<Path>) -> Self {
        Database { path }
    }

    pub fn objects_path(&self) -> &Path {
        &self.path
    }

    /// Store an object, returning its id.
    ///
    /// The fan-out directory is created on demand. Objects are
    /// immutable, so an already-present id makes this a no-op; new
    /// content lands via temp-file + rename so a reader never observes
    /// a half-written object.
    pub fn store(&self, object: &impl Object) -> anyhow::Result<ObjectId> {
        let object_id = object.object_id()?;
        let object_path = self.path.join(object_id.to_path());

        if !object_path.exists() {
            let frame = object.serialize()?;
            self.write_object(object_path, frame)?;
        }

        Ok(object_id)
    }

    /// Load the decompressed frame of an object.
    pub fn load(&self, object_id: &ObjectId) -> anyhow::Result<Bytes> {
        let object_path = self.path.join(object_id.to_path());

        if !object_path.exists() {
            return Err(CoreError::not_found(format!("object {object_id}")).into());
        }

        let compressed = std::fs::read(&object_path)
            .with_context(|| format!("unable to read object file {}", object_path.display()))?;

        Self::decompress(compressed.into())
    }

    /// Parse an object into its concrete type.
    pub fn parse_object(&self, object_id: &ObjectId) -> anyhow::Result<ObjectBox> {
        let (object_type, object_reader) = self.parse_object_as_bytes(object_id)?;

        match object_type {
            ObjectType::Blob => Ok(ObjectBox::Blob(Box::new(Blob::deserialize(object_reader)?))),
            ObjectType::Tree => Ok(ObjectBox::Tree(Box::new(Tree::deserialize(object_reader)?))),
            ObjectType::Commit => Ok(ObjectBox::Commit(Box::new(Commit::deserialize(
                object_reader,
            )?))),
        }
    }

    /// Parse an object as a blob, if it is one.
    pub fn parse_object_as_blob(&self, object_id: &ObjectId) -> anyhow::Result<Option<Blob>> {
        let (object_type, object_reader) = self.parse_object_as_bytes(object_id)?;

        match object_type {
            ObjectType::Blob => Ok(Some(Blob::deserialize(object_reader)?)),
            _ => Ok(None),
        }
    }

    /// Parse an object as a tree, if it is one.
    pub fn parse_object_as_tree(&self, object_id: &ObjectId) -> anyhow::Result<Option<Tree>> {
        let (object_type, object_reader) = self.parse_object_as_bytes(object_id)?;

        match object_type {
            ObjectType::Tree => Ok(Some(Tree::deserialize(object_reader)?)),
            _ => Ok(None),
        }
    }

    /// Parse an object as a commit, if it is one.
    pub fn parse_object_as_commit(&self, object_id: &ObjectId) -> anyhow::Result<Option<Commit>> {
        let (object_type, object_reader) = self.parse_object_as_bytes(object_id)?;

        match object_type {
            ObjectType::Commit => Ok(Some(Commit::deserialize(object_reader)?)),
            _ => Ok(None),
        }
    }

    pub fn object_type(&self, object_id: &ObjectId) -> anyhow::Result<ObjectType> {
        let (object_type, _) = self.parse_object_as_bytes(object_id)?;
        Ok(object_type)
    }

    /// Load and validate an object's frame, leaving the reader at the
    /// first payload byte.
    ///
    /// Validation covers the header shape, the declared length against
    /// the actual payload, and for blobs the frame hash against the
    /// requested id.
    fn parse_object_as_bytes(
        &self,
        object_id: &ObjectId,
    ) -> anyhow::Result<(ObjectType, Cursor<Bytes>)> {
        let frame = self.load(object_id)?;
        let mut reader = Cursor::new(frame);

        let (object_type, declared_len) = ObjectType::parse_header(&mut reader)
            .with_context(|| format!("object {object_id} has a malformed header"))?;

        let payload_len = reader.get_ref().len() - reader.position() as usize;
        if payload_len != declared_len {
            return Err(CoreError::corruption(format!(
                "object {object_id} declares {declared_len} payload bytes but carries {payload_len}"
            ))
            .into());
        }

        if object_type == ObjectType::Blob {
            let mut hasher = Sha1::new();
            hasher.update(reader.get_ref());
            let actual = format!("{:x}", hasher.finalize());

            if actual != object_id.as_ref() {
                return Err(CoreError::corruption(format!(
                    "object {object_id} hashes to {actual}"
                ))
                .into());
            }
        }

        Ok((object_type, reader))
    }

    fn write_object(&self, object_path: PathBuf, frame: Bytes) -> anyhow::Result<()> {
        let object_dir = object_path
            .parent()
            .with_context(|| format!("invalid object path {}", object_path.display()))?;

        std::fs::create_dir_all(object_dir).with_context(|| {
            format!("unable to create object directory {}", object_dir.display())
        })?;

        let compressed = Self::compress(frame)?;
        let temp_object_path = object_dir.join(Self::generate_temp_name());

        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_object_path)
            .with_context(|| {
                format!("unable to open object file {}", temp_object_path.display())
            })?;

        file.write_all(&compressed).with_context(|| {
            format!("unable to write object file {}", temp_object_path.display())
        })?;
        drop(file);

        std::fs::rename(&temp_object_path, &object_path).with_context(|| {
            format!("unable to rename object file to {}", object_path.display())
        })?;

        Ok(())
    }

    fn compress(data: Bytes) -> anyhow::Result<Bytes> {
        let mut encoder =
            flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        encoder
            .write_all(&data)
            .context("unable to compress object content")?;

        encoder
            .finish()
            .map(|compressed| compressed.into())
            .context("unable to finish compressing object content")
    }

    fn decompress(data: Bytes) -> anyhow::Result<Bytes> {
        let mut decoder = flate2::read::ZlibDecoder::new(&*data);
        let mut decompressed = Vec::new();
        decoder
            .read_to_end(&mut decompressed)
            .map_err(|err| CoreError::corruption(format!("zlib inflate failed: {err}")))?;

        Ok(decompressed.into())
    }

    fn generate_temp_name() -> String {
        format!(
            "tmp-obj-{}-{}",
            std::process::id(),
            TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::index::entry_mode::{EntryMode, FileMode};
    use crate::artifacts::objects::object::Packable;
    use assert_fs::TempDir;
    use rstest::{fixture, rstest};

    #[fixture]
    fn scratch() -> (TempDir, Database) {
        let dir = TempDir::new().expect("failed to create temp dir");
        let database = Database::new(dir.path().join("objects").into());
        (dir, database)
    }

    #[rstest]
    fn stored_blobs_read_back_identically(scratch: (TempDir, Database)) {
        let (_dir, database) = scratch;

        let blob = Blob::new(Bytes::from_static(b"hello database"));
        let oid = database.store(&blob).unwrap();

        let loaded = database.parse_object_as_blob(&oid).unwrap().unwrap();
        pretty_assertions::assert_eq!(loaded, blob);
    }

    #[rstest]
    fn objects_land_in_their_fan_out_directory(scratch: (TempDir, Database)) {
        let (_dir, database) = scratch;

        let blob = Blob::new(Bytes::from_static(b"fan out"));
        let oid = database.store(&blob).unwrap();

        let expected = database.objects_path().join(oid.to_path());
        assert!(expected.exists());
    }

    #[rstest]
    fn storing_twice_is_idempotent(scratch: (TempDir, Database)) {
        let (_dir, database) = scratch;

        let blob = Blob::new(Bytes::from_static(b"idempotent"));
        let first = database.store(&blob).unwrap();
        let second = database.store(&blob).unwrap();

        pretty_assertions::assert_eq!(first, second);
    }

    #[rstest]
    fn missing_objects_fail_with_not_found(scratch: (TempDir, Database)) {
        let (_dir, database) = scratch;

        let absent =
            ObjectId::try_parse("0123456789abcdef0123456789abcdef01234567".to_string()).unwrap();
        let err = database.load(&absent).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<CoreError>(),
            Some(CoreError::NotFound(_))
        ));
    }

    #[rstest]
    fn tampered_blobs_fail_with_corruption(scratch: (TempDir, Database)) {
        let (_dir, database) = scratch;

        let blob = Blob::new(Bytes::from_static(b"original"));
        let oid = database.store(&blob).unwrap();

        // overwrite the object file with a validly framed but different blob
        let impostor = Blob::new(Bytes::from_static(b"impostor"));
        let compressed = Database::compress(impostor.serialize().unwrap()).unwrap();
        std::fs::write(database.objects_path().join(oid.to_path()), compressed).unwrap();

        let err = database.parse_object_as_blob(&oid).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CoreError>(),
            Some(CoreError::Corruption(_))
        ));
    }

    #[rstest]
    fn garbage_bytes_fail_with_corruption(scratch: (TempDir, Database)) {
        let (_dir, database) = scratch;

        let blob = Blob::new(Bytes::from_static(b"will be garbled"));
        let oid = database.store(&blob).unwrap();
        std::fs::write(
            database.objects_path().join(oid.to_path()),
            b"not zlib at all",
        )
        .unwrap();

        let err = database.load(&oid).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CoreError>(),
            Some(CoreError::Corruption(_))
        ));
    }

    #[rstest]
    fn trees_and_commits_round_trip_through_the_store(scratch: (TempDir, Database)) {
        let (_dir, database) = scratch;

        let blob = Blob::new(Bytes::from_static(b"content"));
        let blob_oid = database.store(&blob).unwrap();

        let mut tree = Tree::new();
        tree.add_entry("file.txt", blob_oid, EntryMode::File(FileMode::Regular))
            .unwrap();
        let tree_oid = database.store(&tree).unwrap();

        let loaded_tree = database.parse_object_as_tree(&tree_oid).unwrap().unwrap();
        pretty_assertions::assert_eq!(loaded_tree, tree);

        let author = crate::artifacts::objects::commit::Author::new(
            "Tester".to_string(),
            "tester@example.com".to_string(),
        )
        .unwrap();
        let commit = Commit::new(tree_oid, None, author, "stored".to_string()).unwrap();
        let commit_oid = database.store(&commit).unwrap();

        let loaded_commit = database
            .parse_object_as_commit(&commit_oid)
            .unwrap()
            .unwrap();
        pretty_assertions::assert_eq!(loaded_commit, commit);
    }

    #[rstest]
    fn typed_accessor_returns_none_for_other_kinds(scratch: (TempDir, Database)) {
        let (_dir, database) = scratch;

        let blob = Blob::new(Bytes::from_static(b"just a blob"));
        let oid = database.store(&blob).unwrap();

        assert!(database.parse_object_as_tree(&oid).unwrap().is_none());
        assert!(database.parse_object_as_commit(&oid).unwrap().is_none());
    }
}

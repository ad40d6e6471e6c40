//! Staging index
//!
//! The index records which working-tree files go into the next
//! snapshot: a map from repo-relative path to blob binding. It persists
//! as the deterministic binary format described in
//! `crate::artifacts::index` and must serialize byte-identically for
//! equal entry sets, which the sorted map and zero-filled padding
//! guarantee.

use crate::artifacts::index::checksum::Checksum;
use crate::artifacts::index::index_entry::{ENTRY_BLOCK, ENTRY_MIN_SIZE, IndexEntry};
use crate::artifacts::index::index_header::IndexHeader;
use crate::artifacts::index::{HEADER_SIZE, SIGNATURE, VERSION};
use crate::artifacts::objects::object::{Packable, Unpackable};
use crate::errors::CoreError;
use bytes::Bytes;
use std::collections::BTreeMap;
use std::ops::DerefMut;
use std::path::Path;

/// In-memory staging area backed by the binary index file.
#[derive(Debug)]
pub struct Index {
    /// Path to the index file (`.gitgo/index`)
    path: Box<Path>,
    /// Staged entries, sorted by path bytes
    entries: BTreeMap<String, IndexEntry>,
}

impl Index {
    pub fn new(path: Box<Path>) -> Self {
        Index {
            path,
            entries: BTreeMap::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_staged(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    pub fn entry_by_path(&self, path: &str) -> Option<&IndexEntry> {
        self.entries.get(path)
    }

    /// Staged entries in path order.
    pub fn entries(&self) -> impl Iterator<Item = &IndexEntry> {
        self.entries.values()
    }

    /// Drop all entries. In-memory only; the file changes on the next
    /// `write_updates`.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Upsert an entry, evicting anything that conflicts with it across
    /// the file/directory boundary.
    pub fn add(&mut self, entry: IndexEntry) {
        self.discard_conflicts(&entry.path);
        self.entries.insert(entry.path.clone(), entry);
    }

    /// Remove a staged path. Absent paths are an error.
    pub fn remove(&mut self, path: &str) -> anyhow::Result<()> {
        self.entries
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| CoreError::not_found(format!("'{path}' in index")).into())
    }

    /// A staged file at `a/b` conflicts with a staged file at `a` (the
    /// directory took its place) and with anything under `a/b/` (the
    /// file took the directory's place). Both sides are evicted.
    fn discard_conflicts(&mut self, path: &str) {
        let mut ancestor = String::new();
        for component in path.split('/') {
            if !ancestor.is_empty() {
                self.entries.remove(&ancestor);
                ancestor.push('/');
            }
            ancestor.push_str(component);
        }

        let dir_prefix = format!("{path}/");
        let nested: Vec<String> = self
            .entries
            .keys()
            .filter(|key| key.starts_with(&dir_prefix))
            .cloned()
            .collect();
        for key in nested {
            self.entries.remove(&key);
        }
    }

    /// Load the index from disk, verifying signature, version and the
    /// trailing checksum. A missing or empty file is an empty index.
    pub fn rehydrate(&mut self) -> anyhow::Result<()> {
        self.clear();

        if !self.path.exists() {
            return Ok(());
        }

        let mut index_file = std::fs::OpenOptions::new().read(true).open(self.path())?;
        let mut lock = file_guard::lock(&mut index_file, file_guard::Lock::Shared, 0, 1)?;

        if lock.deref_mut().metadata()?.len() == 0 {
            return Ok(());
        }

        let mut reader = Checksum::new(lock);
        let entries_count = self.parse_header(&mut reader)?;
        self.parse_entries(entries_count, &mut reader)?;

        reader.verify()
    }

    /// Persist the index: header, entries in path order, trailing
    /// checksum. Byte-identical output for equal entry sets.
    pub fn write_updates(&mut self) -> anyhow::Result<()> {
        let mut index_file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(self.path())?;
        let lock = file_guard::lock(&mut index_file, file_guard::Lock::Exclusive, 0, 1)?;

        let mut writer = Checksum::new(lock);

        let header = IndexHeader::new(
            String::from(SIGNATURE),
            VERSION,
            self.entries.len() as u32,
        );
        writer.write(&header.serialize()?)?;

        for entry in self.entries.values() {
            writer.write(&entry.serialize()?)?;
        }

        writer.write_checksum()?;

        Ok(())
    }

    fn parse_header(&self, reader: &mut Checksum) -> anyhow::Result<u32> {
        let header_bytes = reader.read(HEADER_SIZE)?;
        let header = IndexHeader::deserialize(std::io::Cursor::new(header_bytes.to_vec()))?;

        if header.signature != SIGNATURE {
            return Err(CoreError::corruption("invalid index file signature").into());
        }

        if header.version != VERSION {
            return Err(CoreError::corruption(format!(
                "unsupported index file version {}",
                header.version
            ))
            .into());
        }

        Ok(header.entries_count)
    }

    /// Entries are 8-byte aligned, so after the fixed minimum each one
    /// extends block by block until its trailing NUL shows up.
    fn parse_entries(&mut self, entries_count: u32, reader: &mut Checksum) -> anyhow::Result<()> {
        for _ in 0..entries_count {
            let mut entry_bytes = reader.read(ENTRY_MIN_SIZE)?.to_vec();

            while entry_bytes[entry_bytes.len() - 1] != 0 {
                entry_bytes.extend_from_slice(&reader.read(ENTRY_BLOCK)?);
            }

            let entry_bytes = Bytes::from(entry_bytes);
            let entry = IndexEntry::deserialize(std::io::Cursor::new(entry_bytes.to_vec()))?;
            self.entries.insert(entry.path.clone(), entry);
        }

        Ok(())
    }
}

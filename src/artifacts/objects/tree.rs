//! Tree object
//!
//! A tree is a directory snapshot: a set of `(name, mode, hash)` triples
//! unique by name and stored in name-byte-ascending order.
//!
//! On disk: `tree <size>\0<entries>`, each entry
//! `<octal-mode> <name>\0<20-byte-sha1>` with no leading zeros in the
//! mode (`100644`, `100755`, `40000`).

use crate::artifacts::index::entry_mode::EntryMode;
use crate::artifacts::objects::object::{Object, Packable, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::errors::CoreError;
use anyhow::Context;
use bytes::Bytes;
use derive_new::new;
use std::collections::BTreeMap;
use std::io::{BufRead, Write};

/// A single `(mode, hash)` binding inside a tree.
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct TreeRecord {
    pub oid: ObjectId,
    pub mode: EntryMode,
}

/// Directory snapshot with entries kept sorted by name bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tree {
    // BTreeMap keeps the name-ascending invariant on every insertion
    entries: BTreeMap<String, TreeRecord>,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry, enforcing the tree-entry invariants.
    ///
    /// Fails when the name is empty, contains `/`, or duplicates an
    /// existing entry. The mode and hash are already validated by their
    /// types.
    pub fn add_entry(
        &mut self,
        name: impl Into<String>,
        oid: ObjectId,
        mode: EntryMode,
    ) -> anyhow::Result<()> {
        let name = name.into();

        if name.is_empty() {
            return Err(CoreError::validation("tree entry name cannot be empty").into());
        }
        if name.contains('/') {
            return Err(CoreError::validation(format!(
                "tree entry name '{name}' cannot contain '/'; nested paths belong to subtrees"
            ))
            .into());
        }
        if self.entries.contains_key(&name) {
            return Err(CoreError::validation(format!(
                "tree entry '{name}' already exists in this tree"
            ))
            .into());
        }

        self.entries.insert(name, TreeRecord::new(oid, mode));
        Ok(())
    }

    /// Entries in name-byte-ascending order.
    pub fn entries(&self) -> impl Iterator<Item = (&String, &TreeRecord)> {
        self.entries.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl Packable for Tree {
    fn serialize(&self) -> anyhow::Result<Bytes> {
        let mut content_bytes = Vec::new();
        for (name, record) in &self.entries {
            let header = format!("{} {}", record.mode.as_octal_str(), name);
            content_bytes.write_all(header.as_bytes())?;
            content_bytes.push(0);
            record.oid.write_raw_to(&mut content_bytes)?;
        }

        let mut tree_bytes = Vec::new();
        let header = format!("{} {}\0", self.object_type().as_str(), content_bytes.len());
        tree_bytes.write_all(header.as_bytes())?;
        tree_bytes.write_all(&content_bytes)?;

        Ok(Bytes::from(tree_bytes))
    }
}

impl Unpackable for Tree {
    fn deserialize(reader: impl BufRead) -> anyhow::Result<Self> {
        let mut tree = Tree::new();
        let mut reader = reader;

        // Scratch buffers reused across entries
        let mut mode_bytes = Vec::new();
        let mut name_bytes = Vec::new();

        loop {
            mode_bytes.clear();
            let n = reader.read_until(b' ', &mut mode_bytes)?;
            if n == 0 {
                break; // clean EOF, no more entries
            }
            if mode_bytes.pop() != Some(b' ') {
                return Err(CoreError::corruption("unexpected EOF in tree entry mode").into());
            }

            let mode_str = std::str::from_utf8(&mode_bytes)
                .map_err(|_| CoreError::corruption("tree entry mode is not valid UTF-8"))?;
            let mode = EntryMode::from_octal_str(mode_str)?;

            name_bytes.clear();
            let n = reader.read_until(b'\0', &mut name_bytes)?;
            if n == 0 || name_bytes.pop() != Some(b'\0') {
                return Err(CoreError::corruption("unexpected EOF in tree entry name").into());
            }
            let name = std::str::from_utf8(&name_bytes)
                .map_err(|_| CoreError::corruption("tree entry name is not valid UTF-8"))?
                .to_owned();

            let oid = ObjectId::read_raw_from(&mut reader)
                .context("unexpected EOF in tree entry object id")?;

            tree.add_entry(name, oid, mode)?;
        }

        Ok(tree)
    }
}

impl Object for Tree {
    fn object_type(&self) -> ObjectType {
        ObjectType::Tree
    }

    fn display(&self) -> String {
        self.entries
            .iter()
            .map(|(name, record)| {
                let object_type = match record.mode {
                    EntryMode::Directory => ObjectType::Tree,
                    _ => ObjectType::Blob,
                };

                format!(
                    "{:0>6} {} {}\t{}",
                    record.mode.as_octal_str(),
                    object_type.as_str(),
                    record.oid.as_ref(),
                    name
                )
            })
            .collect::<Vec<String>>()
            .join("\n")
    }
}

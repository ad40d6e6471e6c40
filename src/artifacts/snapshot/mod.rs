//! Snapshot tree builder
//!
//! Folds the flat staged-path set, merged with the previously committed
//! root tree, into a hierarchy of canonical tree objects. The previous
//! snapshot is the base layer; staged entries overwrite it path by
//! path.
//!
//! Any unreadable previous subtree aborts the build: silently dropping
//! paths from the next snapshot is never acceptable.

use crate::areas::database::Database;
use crate::artifacts::index::entry_mode::EntryMode;
use crate::artifacts::index::index_entry::IndexEntry;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::tree::Tree;
use crate::errors::CoreError;
use anyhow::Context;
use std::collections::BTreeMap;

/// A `(hash, mode)` binding for one file inside the trie.
#[derive(Debug, Clone)]
struct SnapshotEntry {
    oid: ObjectId,
    mode: EntryMode,
}

/// One directory level of the path trie.
#[derive(Debug, Default)]
struct PathNode {
    files: BTreeMap<String, SnapshotEntry>,
    children: BTreeMap<String, PathNode>,
}

impl PathNode {
    /// Insert a file at a repo-relative path, creating intermediate
    /// directory nodes and replacing any previously registered file of
    /// the same basename.
    fn insert(&mut self, path: &str, entry: SnapshotEntry) {
        let mut node = self;
        let mut parts = path.split('/').peekable();

        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                // a file takes precedence over a directory of the same name
                node.children.remove(part);
                node.files.insert(part.to_string(), entry);
                break;
            }

            node.files.remove(part);
            node = node.children.entry(part.to_string()).or_default();
        }
    }
}

/// Builds the tree hierarchy for one commit.
pub struct TreeBuilder<'d> {
    database: &'d Database,
    root: PathNode,
}

impl<'d> TreeBuilder<'d> {
    pub fn new(database: &'d Database) -> Self {
        TreeBuilder {
            database,
            root: PathNode::default(),
        }
    }

    /// Layer the previous snapshot into the trie.
    ///
    /// Walks the tree recursively and registers every file at its full
    /// path from the root. Fails the whole build when any subtree is
    /// missing or corrupt.
    pub fn seed_from_tree(&mut self, tree_oid: &ObjectId) -> anyhow::Result<()> {
        let mut seeded = Vec::new();
        self.collect_tree_files(tree_oid, String::new(), &mut seeded)
            .with_context(|| format!("failed to read previous snapshot {tree_oid}"))?;

        for (path, entry) in seeded {
            self.root.insert(&path, entry);
        }

        Ok(())
    }

    /// Overlay one staged entry, replacing whatever the previous
    /// snapshot had at its path.
    pub fn stage(&mut self, entry: &IndexEntry) {
        self.root.insert(
            &entry.path,
            SnapshotEntry {
                oid: entry.oid.clone(),
                mode: EntryMode::from(entry.metadata.mode),
            },
        );
    }

    /// Emit the tree hierarchy through the object store, subtrees
    /// before the parents that reference them, and return the root
    /// tree's id.
    pub fn write_trees(self) -> anyhow::Result<ObjectId> {
        Self::write_node(self.database, &self.root)
    }

    fn collect_tree_files(
        &self,
        tree_oid: &ObjectId,
        prefix: String,
        seeded: &mut Vec<(String, SnapshotEntry)>,
    ) -> anyhow::Result<()> {
        let tree = self
            .database
            .parse_object_as_tree(tree_oid)?
            .ok_or_else(|| CoreError::corruption(format!("object {tree_oid} is not a tree")))?;

        for (name, record) in tree.entries() {
            let path = if prefix.is_empty() {
                name.clone()
            } else {
                format!("{prefix}/{name}")
            };

            if record.mode.is_directory() {
                self.collect_tree_files(&record.oid, path, seeded)?;
            } else {
                seeded.push((
                    path,
                    SnapshotEntry {
                        oid: record.oid.clone(),
                        mode: record.mode,
                    },
                ));
            }
        }

        Ok(())
    }

    fn write_node(database: &Database, node: &PathNode) -> anyhow::Result<ObjectId> {
        let mut tree = Tree::new();

        for (dir_name, child) in &node.children {
            let child_oid = Self::write_node(database, child)
                .with_context(|| format!("failed to build subtree '{dir_name}'"))?;
            tree.add_entry(dir_name.clone(), child_oid, EntryMode::Directory)?;
        }

        for (file_name, entry) in &node.files {
            tree.add_entry(file_name.clone(), entry.oid.clone(), entry.mode)?;
        }

        database.store(&tree)
    }
}

//! Core object traits
//!
//! Every object kind implements:
//! - `Packable`: serialization to the canonical frame
//! - `Unpackable`: deserialization from the payload (header consumed)
//! - `Object`: id computation and display
//!
//! ## Object identity
//!
//! The id of an object is the SHA-1 of its canonical uncompressed frame
//! `"<kind> <len>\0<payload>"`, uniformly for all kinds. Compression is
//! a storage concern of the database and never participates in hashing.

use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::tree::Tree;
use anyhow::Result;
use bytes::Bytes;
use sha1::{Digest, Sha1};
use std::io::BufRead;
use std::path::PathBuf;

/// Serialization to the canonical frame (header included).
pub trait Packable {
    fn serialize(&self) -> Result<Bytes>;
}

/// Deserialization from the frame payload (header already consumed).
pub trait Unpackable {
    fn deserialize(reader: impl BufRead) -> Result<Self>
    where
        Self: Sized;
}

/// Common object operations shared by blobs, trees and commits.
pub trait Object: Packable {
    fn object_type(&self) -> ObjectType;

    /// Human-readable rendering, used by `cat-file -p`.
    fn display(&self) -> String;

    /// Compute the object id by hashing the serialized frame.
    fn object_id(&self) -> Result<ObjectId> {
        let content = self.serialize()?;
        let mut hasher = Sha1::new();
        hasher.update(&content);

        let oid = hasher.finalize();
        ObjectId::try_parse(format!("{oid:x}"))
    }

    /// Fan-out path where this object would be stored.
    fn object_path(&self) -> Result<PathBuf> {
        Ok(self.object_id()?.to_path())
    }
}

/// Type-erased container for an object whose kind is only known at
/// parse time.
pub enum ObjectBox {
    Blob(Box<Blob>),
    Tree(Box<Tree>),
    Commit(Box<Commit>),
}

impl ObjectBox {
    pub fn display(&self) -> String {
        match self {
            ObjectBox::Blob(blob) => blob.display(),
            ObjectBox::Tree(tree) => tree.display(),
            ObjectBox::Commit(commit) => commit.display(),
        }
    }
}

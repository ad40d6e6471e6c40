//! Index entry representation
//!
//! Each entry binds a repo-relative path to a blob id plus the stat
//! metadata (mode, size, timestamps) captured when the file was staged.
//!
//! ## Binary layout
//!
//! Big-endian, in field order: ctime sec/nsec, mtime sec/nsec, dev and
//! ino (always written as zero), mode bits, size (low 32 bits), the raw
//! 20-byte blob id, flags (low 12 bits hold the path length), then the
//! NUL-terminated path and zero padding. Padding follows the fixed
//! `(62 + path_len + 1)` alignment rule, so every serialized entry is a
//! multiple of 8 bytes long.

use crate::artifacts::index::entry_mode::{EntryMode, FileMode};
use crate::artifacts::objects::object::{Packable, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::CoreError;
use byteorder::{ByteOrder, WriteBytesExt};
use bytes::Bytes;
use derive_new::new;
use is_executable::IsExecutable;
use std::cmp::min;
use std::fs::Metadata;
use std::io::{BufRead, Write};
use std::path::Path;

/// Maximum path length representable in the flags field
const MAX_PATH_SIZE: usize = 0xFFF;

/// Block size for entry alignment
pub const ENTRY_BLOCK: usize = 8;

/// Smallest possible serialized entry (one-byte path, zero padding)
pub const ENTRY_MIN_SIZE: usize = 56;

/// Fixed prefix length: eight u32 fields, the raw id, and the flags
const FIXED_PREFIX_SIZE: usize = 54;

/// Alignment base inherited from the on-disk format definition
const PADDING_BASE: usize = 62;

/// A tracked file staged for the next snapshot.
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct IndexEntry {
    /// Repo-relative, forward-slash-normalized path
    pub path: String,
    /// Blob id of the staged content
    pub oid: ObjectId,
    /// Stat metadata captured at staging time
    pub metadata: EntryMetadata,
}

impl IndexEntry {
    pub fn basename(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// Zero-byte count appended after the NUL terminator.
    fn padding_len(path_len: usize) -> usize {
        (ENTRY_BLOCK - ((PADDING_BASE + path_len + 1) % ENTRY_BLOCK)) % ENTRY_BLOCK
    }
}

/// Stat metadata stored alongside each entry.
///
/// Timestamps carry nanosecond precision so unchanged entries
/// round-trip exactly; dev/ino are not retained (they serialize as
/// zero).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntryMetadata {
    /// Status-change time (seconds since the Unix epoch)
    pub ctime: i64,
    /// Status-change time, nanosecond part
    pub ctime_nsec: i64,
    /// Content-modification time (seconds since the Unix epoch)
    pub mtime: i64,
    /// Content-modification time, nanosecond part
    pub mtime_nsec: i64,
    /// Permission class of the file
    pub mode: FileMode,
    /// File size in bytes
    pub size: u64,
}

impl Packable for IndexEntry {
    fn serialize(&self) -> anyhow::Result<Bytes> {
        let mode = EntryMode::from(self.metadata.mode);
        let flags = min(self.path.len(), MAX_PATH_SIZE) as u16;

        let mut entry_bytes = Vec::new();
        entry_bytes.write_u32::<byteorder::NetworkEndian>(self.metadata.ctime as u32)?;
        entry_bytes.write_u32::<byteorder::NetworkEndian>(self.metadata.ctime_nsec as u32)?;
        entry_bytes.write_u32::<byteorder::NetworkEndian>(self.metadata.mtime as u32)?;
        entry_bytes.write_u32::<byteorder::NetworkEndian>(self.metadata.mtime_nsec as u32)?;
        entry_bytes.write_u32::<byteorder::NetworkEndian>(0)?; // dev
        entry_bytes.write_u32::<byteorder::NetworkEndian>(0)?; // ino
        entry_bytes.write_u32::<byteorder::NetworkEndian>(mode.as_u32())?;
        entry_bytes.write_u32::<byteorder::NetworkEndian>(self.metadata.size as u32)?;
        self.oid.write_raw_to(&mut entry_bytes)?;
        entry_bytes.write_u16::<byteorder::NetworkEndian>(flags)?;
        entry_bytes.write_all(self.path.as_bytes())?;
        entry_bytes.push(0);

        for _ in 0..Self::padding_len(self.path.len()) {
            entry_bytes.push(0);
        }

        Ok(Bytes::from(entry_bytes))
    }
}

impl Unpackable for IndexEntry {
    fn deserialize(reader: impl BufRead) -> anyhow::Result<Self> {
        let bytes = reader
            .bytes()
            .collect::<Result<Vec<u8>, std::io::Error>>()?;

        if bytes.len() < ENTRY_MIN_SIZE {
            return Err(CoreError::corruption("index entry is truncated").into());
        }

        let ctime = byteorder::NetworkEndian::read_u32(&bytes[0..4]) as i64;
        let ctime_nsec = byteorder::NetworkEndian::read_u32(&bytes[4..8]) as i64;
        let mtime = byteorder::NetworkEndian::read_u32(&bytes[8..12]) as i64;
        let mtime_nsec = byteorder::NetworkEndian::read_u32(&bytes[12..16]) as i64;
        // bytes 16..24: dev and ino, always zero
        let mode = EntryMode::try_from(byteorder::NetworkEndian::read_u32(&bytes[24..28]))?;
        let mode = FileMode::try_from(mode)?;
        let size = byteorder::NetworkEndian::read_u32(&bytes[28..32]) as u64;

        let mut oid_bytes = std::io::Cursor::new(&bytes[32..52]);
        let oid = ObjectId::read_raw_from(&mut oid_bytes)?;
        // bytes 52..54: flags, recomputed from the path on write

        let path_end = bytes[FIXED_PREFIX_SIZE..]
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| CoreError::corruption("index entry path is not NUL-terminated"))?;
        let path_bytes = &bytes[FIXED_PREFIX_SIZE..FIXED_PREFIX_SIZE + path_end];
        let path = std::str::from_utf8(path_bytes)
            .map_err(|_| CoreError::corruption("index entry path is not valid UTF-8"))?
            .to_string();

        Ok(IndexEntry {
            path,
            oid,
            metadata: EntryMetadata {
                ctime,
                ctime_nsec,
                mtime,
                mtime_nsec,
                mode,
                size,
            },
        })
    }
}

impl TryFrom<(&Path, Metadata)> for EntryMetadata {
    type Error = anyhow::Error;

    fn try_from((file_path, metadata): (&Path, Metadata)) -> Result<Self, Self::Error> {
        use std::os::unix::prelude::MetadataExt;

        if metadata.is_dir() {
            return Err(CoreError::validation(format!(
                "'{}' is a directory, only files carry index metadata",
                file_path.display()
            ))
            .into());
        }

        let mode = match file_path.is_executable() {
            true => FileMode::Executable,
            false => FileMode::Regular,
        };

        Ok(Self {
            ctime: metadata.ctime(),
            ctime_nsec: metadata.ctime_nsec(),
            mtime: metadata.mtime(),
            mtime_nsec: metadata.mtime_nsec(),
            mode,
            size: metadata.size(),
        })
    }
}

//! Index file format
//!
//! The index (staging area) records which files go into the next
//! snapshot. Its on-disk form is deterministic: a fixed header, entries
//! sorted by path bytes and zero-padded to 8-byte alignment, and a
//! trailing SHA-1 over everything before it.
//!
//! ```text
//! Header (12 bytes):
//!   - signature "DIRC"
//!   - version 2
//!   - entry count
//!
//! Entries (variable length, 8-byte aligned)
//!
//! Checksum (20 bytes): SHA-1 of header + entries
//! ```

pub mod checksum;
pub mod entry_mode;
pub mod index_entry;
pub mod index_header;

/// Size of the trailing SHA-1 checksum in bytes
pub const CHECKSUM_SIZE: usize = 20;

/// Size of the index header in bytes
pub const HEADER_SIZE: usize = 12;

/// Magic signature identifying index files
pub const SIGNATURE: &str = "DIRC";

/// Index file format version
pub const VERSION: u32 = 2;

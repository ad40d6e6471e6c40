//! Branch naming
//!
//! Branch names live in a flat namespace under `refs/heads/`: non-empty,
//! no `/`, and never the directory aliases `.` or `..`.

pub mod branch_name;

/// Prefix of every branch reference path
pub const REF_PREFIX: &str = "refs/heads/";

//! Command implementations
//!
//! - `plumbing`: low-level object manipulation (cat-file, hash-object)
//! - `porcelain`: user-facing workflow commands (add, commit, ...)
//!
//! Each command is an `impl Repository` block so the CLI layer stays a
//! thin dispatcher.

pub mod plumbing;
pub mod porcelain;

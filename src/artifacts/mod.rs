//! Data structures and algorithms
//!
//! - `branch`: branch-name validation
//! - `index`: index entry types and binary codec
//! - `objects`: object types (blob, tree, commit)
//! - `snapshot`: the commit-time tree builder

pub mod branch;
pub mod index;
pub mod objects;
pub mod snapshot;

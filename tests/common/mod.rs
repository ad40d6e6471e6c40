#![allow(dead_code)]

pub mod command;
pub mod file;

use sha1::{Digest, Sha1};
use std::path::Path;

/// Hex SHA-1 of a blob frame for the given content.
pub fn blob_oid(content: &str) -> String {
    let frame = format!("blob {}\0{}", content.len(), content);
    let mut hasher = Sha1::new();
    hasher.update(frame.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Hex SHA-1 of a tree frame for the given `(mode, name, hex-oid)`
/// entries. Entries must already be in name order.
pub fn tree_oid(entries: &[(&str, &str, &str)]) -> String {
    let mut payload: Vec<u8> = Vec::new();
    for (mode, name, oid) in entries {
        payload.extend_from_slice(format!("{mode} {name}\0").as_bytes());
        for i in (0..oid.len()).step_by(2) {
            payload.push(u8::from_str_radix(&oid[i..i + 2], 16).unwrap());
        }
    }

    let mut frame = format!("tree {}\0", payload.len()).into_bytes();
    frame.extend_from_slice(&payload);

    let mut hasher = Sha1::new();
    hasher.update(&frame);
    format!("{:x}", hasher.finalize())
}

/// Content of `.gitgo/HEAD`, trimmed.
pub fn read_head(repo: &Path) -> String {
    std::fs::read_to_string(repo.join(".gitgo").join("HEAD"))
        .expect("failed to read HEAD")
        .trim()
        .to_string()
}

/// Content of `.gitgo/refs/heads/<name>`, trimmed.
pub fn read_branch(repo: &Path, name: &str) -> String {
    std::fs::read_to_string(repo.join(".gitgo").join("refs").join("heads").join(name))
        .expect("failed to read branch file")
        .trim()
        .to_string()
}

/// Whether an object with the given id exists in the fan-out store.
pub fn object_exists(repo: &Path, oid: &str) -> bool {
    repo.join(".gitgo")
        .join("objects")
        .join(&oid[..2])
        .join(&oid[2..])
        .is_file()
}

/// Decompressed frame of a stored object.
pub fn read_object_frame(repo: &Path, oid: &str) -> Vec<u8> {
    use std::io::Read;

    let path = repo
        .join(".gitgo")
        .join("objects")
        .join(&oid[..2])
        .join(&oid[2..]);
    let compressed = std::fs::read(path).expect("failed to read object file");

    let mut decoder = flate2::read::ZlibDecoder::new(&compressed[..]);
    let mut frame = Vec::new();
    decoder
        .read_to_end(&mut frame)
        .expect("failed to decompress object");
    frame
}

//! SHA-1-accumulating file wrapper
//!
//! Wraps a locked index file handle and folds every byte that passes
//! through into a running SHA-1, so the trailing checksum can be written
//! on save and verified on load.

use crate::artifacts::index::CHECKSUM_SIZE;
use crate::errors::CoreError;
use bytes::Bytes;
use file_guard::FileGuard;
use sha1::{Digest, Sha1};
use std::io::{Read, Write};
use std::ops::DerefMut;

#[derive(Debug)]
pub struct Checksum<'f> {
    file: FileGuard<&'f mut std::fs::File>,
    digest: Sha1,
}

impl<'f> Checksum<'f> {
    pub(crate) fn new(file: FileGuard<&'f mut std::fs::File>) -> Self {
        Checksum {
            file,
            digest: Sha1::new(),
        }
    }

    pub(crate) fn read(&mut self, size: usize) -> anyhow::Result<Bytes> {
        let mut buffer = vec![0; size];
        self.file
            .deref_mut()
            .read_exact(&mut buffer)
            .map_err(|_| CoreError::corruption("unexpected end-of-file while reading index"))?;

        self.digest.update(&buffer);
        Ok(Bytes::from(buffer))
    }

    pub(crate) fn write(&mut self, data: &[u8]) -> anyhow::Result<()> {
        self.file.deref_mut().write_all(data)?;
        self.digest.update(data);
        Ok(())
    }

    /// Append the accumulated SHA-1; the final write of a save.
    pub(crate) fn write_checksum(&mut self) -> anyhow::Result<()> {
        let checksum = self.digest.clone().finalize();
        self.file.deref_mut().write_all(checksum.as_slice())?;

        Ok(())
    }

    /// Compare the trailing 20 bytes against the accumulated SHA-1.
    pub(crate) fn verify(&mut self) -> anyhow::Result<()> {
        let mut stored = [0u8; CHECKSUM_SIZE];
        self.file
            .deref_mut()
            .read_exact(&mut stored)
            .map_err(|_| CoreError::corruption("index file is missing its checksum"))?;

        let actual = self.digest.clone().finalize();
        if stored != actual.as_slice() {
            return Err(
                CoreError::corruption("index checksum does not match value stored on disk").into(),
            );
        }

        Ok(())
    }
}

//! Object identifier (SHA-1 hash)
//!
//! Object ids are 40-character lowercase hexadecimal strings naming the
//! SHA-1 of an object's canonical frame. References between objects use
//! the hex form; on-disk tree and index serialization uses the raw
//! 20-byte form.

use crate::artifacts::objects::OBJECT_ID_LENGTH;
use crate::errors::CoreError;
use std::io;
use std::path::PathBuf;

/// A validated 40-character lowercase hex SHA-1 digest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct ObjectId(String);

impl ObjectId {
    /// Parse and validate an object id from a string.
    ///
    /// Rejects anything that is not exactly 40 lowercase hex characters.
    pub fn try_parse(id: String) -> anyhow::Result<Self> {
        if id.len() != OBJECT_ID_LENGTH {
            return Err(CoreError::validation(format!(
                "invalid object id length: expected {OBJECT_ID_LENGTH}, got {}",
                id.len()
            ))
            .into());
        }
        if !id
            .chars()
            .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase())
        {
            return Err(
                CoreError::validation(format!("invalid object id characters: {id}")).into(),
            );
        }
        Ok(Self(id))
    }

    /// Whether a candidate string has the shape of a full object id.
    pub fn is_valid(candidate: &str) -> bool {
        candidate.len() == OBJECT_ID_LENGTH
            && candidate
                .chars()
                .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase())
    }

    /// Write the object id in binary form (20 bytes).
    pub fn write_raw_to<W: io::Write>(&self, writer: &mut W) -> anyhow::Result<()> {
        for i in (0..OBJECT_ID_LENGTH).step_by(2) {
            let byte = u8::from_str_radix(&self.0[i..i + 2], 16)
                .map_err(|_| CoreError::corruption("invalid hex digit in object id"))?;
            writer.write_all(&[byte])?;
        }

        Ok(())
    }

    /// Read an object id from binary form (20 bytes).
    pub fn read_raw_from<R: io::Read + ?Sized>(reader: &mut R) -> anyhow::Result<Self> {
        let mut raw = [0u8; OBJECT_ID_LENGTH / 2];
        reader.read_exact(&mut raw)?;

        let mut hex40 = String::with_capacity(OBJECT_ID_LENGTH);
        for byte in raw {
            hex40.push_str(&format!("{byte:02x}"));
        }

        Self::try_parse(hex40)
    }

    /// Fan-out path for object storage: `ab/cdef...` for id `abcdef...`.
    pub fn to_path(&self) -> PathBuf {
        let (dir, file) = self.0.split_at(2);
        PathBuf::from(dir).join(file)
    }

    /// First 7 characters, the conventional abbreviation.
    pub fn to_short_oid(&self) -> String {
        self.0.split_at(7).0.to_string()
    }
}

impl AsRef<str> for ObjectId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

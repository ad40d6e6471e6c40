use crate::errors::CoreError;
use std::io::BufRead;

/// The closed set of object kinds stored in the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectType {
    Blob,
    Tree,
    Commit,
}

impl ObjectType {
    pub fn as_str(&self) -> &str {
        match self {
            ObjectType::Blob => "blob",
            ObjectType::Tree => "tree",
            ObjectType::Commit => "commit",
        }
    }

    /// Consume the frame header `"<kind> <len>\0"` from a reader.
    ///
    /// Returns the object kind and the declared payload length; the
    /// reader is left positioned at the first payload byte.
    pub fn parse_header(data_reader: &mut impl BufRead) -> anyhow::Result<(ObjectType, usize)> {
        let mut kind = Vec::new();
        data_reader.read_until(b' ', &mut kind)?;
        if kind.pop() != Some(b' ') {
            return Err(CoreError::corruption("missing space after object kind").into());
        }

        let kind = std::str::from_utf8(&kind)
            .map_err(|_| CoreError::corruption("object kind is not valid UTF-8"))?;
        let object_type = ObjectType::try_from(kind)?;

        let mut size = Vec::new();
        data_reader.read_until(b'\0', &mut size)?;
        if size.pop() != Some(b'\0') {
            return Err(CoreError::corruption("missing NUL after object length").into());
        }

        let size = std::str::from_utf8(&size)
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .ok_or_else(|| CoreError::corruption("object length is not a decimal number"))?;

        Ok((object_type, size))
    }
}

impl TryFrom<&str> for ObjectType {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> anyhow::Result<Self> {
        match value {
            "blob" => Ok(ObjectType::Blob),
            "tree" => Ok(ObjectType::Tree),
            "commit" => Ok(ObjectType::Commit),
            other => Err(CoreError::corruption(format!("unknown object kind '{other}'")).into()),
        }
    }
}

impl std::fmt::Display for ObjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

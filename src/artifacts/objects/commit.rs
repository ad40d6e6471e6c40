//! Commit object
//!
//! A commit binds a tree snapshot to its history: an optional parent,
//! an author with a fixed-offset timestamp, and a message.
//!
//! On disk:
//! ```text
//! commit <size>\0tree <tree-sha>
//! parent <parent-sha>        (only when a parent exists)
//! author <name> <email> <epoch-seconds> <±HHMM>
//!
//! <message, stored verbatim, no trailing newline added>
//! ```

use crate::artifacts::objects::object::{Object, Packable, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::errors::CoreError;
use anyhow::Context;
use std::io::{BufRead, Write};

use bytes::Bytes;

/// Environment override for the author name.
pub const AUTHOR_NAME_ENV: &str = "GITGO_AUTHOR_NAME";
/// Environment override for the author email.
pub const AUTHOR_EMAIL_ENV: &str = "GITGO_AUTHOR_EMAIL";

const DEFAULT_AUTHOR_NAME: &str = "User";
const DEFAULT_AUTHOR_EMAIL: &str = "user@example.com";

/// Author identity plus the moment of authorship.
///
/// The timestamp persists as epoch seconds with a fixed UTC offset; the
/// committer's original time zone beyond that offset is not restored.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Author {
    name: String,
    email: String,
    timestamp: chrono::DateTime<chrono::FixedOffset>,
}

impl Author {
    /// Create an author stamped with the current local time.
    pub fn new(name: String, email: String) -> anyhow::Result<Self> {
        Self::new_with_timestamp(name, email, chrono::Local::now().fixed_offset())
    }

    pub fn new_with_timestamp(
        name: String,
        email: String,
        timestamp: chrono::DateTime<chrono::FixedOffset>,
    ) -> anyhow::Result<Self> {
        if name.trim().is_empty() {
            return Err(CoreError::validation("author name cannot be empty").into());
        }
        if email.trim().is_empty() || email.contains(['<', '>']) {
            return Err(
                CoreError::validation(format!("invalid author email '{email}'")).into(),
            );
        }

        Ok(Author {
            name,
            email,
            timestamp,
        })
    }

    /// Resolve the author from the environment, falling back to the
    /// built-in default identity.
    pub fn load_from_env() -> anyhow::Result<Self> {
        let name =
            std::env::var(AUTHOR_NAME_ENV).unwrap_or_else(|_| DEFAULT_AUTHOR_NAME.to_string());
        let email =
            std::env::var(AUTHOR_EMAIL_ENV).unwrap_or_else(|_| DEFAULT_AUTHOR_EMAIL.to_string());

        Author::new(name, email)
    }

    /// `Name <email>`
    pub fn display_name(&self) -> String {
        format!("{} <{}>", self.name, self.email)
    }

    /// `Name <email> <epoch> <±HHMM>`, the header-line rendering.
    pub fn display(&self) -> String {
        format!(
            "{} <{}> {} {}",
            self.name,
            self.email,
            self.timestamp.timestamp(),
            self.timestamp.format("%z")
        )
    }

    /// `Mon Jan 1 12:34:56 2024 +0000`, the log rendering.
    pub fn readable_timestamp(&self) -> String {
        self.timestamp
            .format("%a %b %-d %H:%M:%S %Y %z")
            .to_string()
    }

    pub fn timestamp(&self) -> chrono::DateTime<chrono::FixedOffset> {
        self.timestamp
    }
}

impl TryFrom<&str> for Author {
    type Error = anyhow::Error;

    /// Parse `Name <email> <epoch> <±HHMM>` from an author header line.
    ///
    /// The two timestamp fields are taken from the right; everything
    /// before them is the name/email literal.
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let parts: Vec<&str> = value.rsplitn(3, ' ').collect();
        if parts.len() < 3 {
            return Err(CoreError::corruption(format!("invalid author line '{value}'")).into());
        }

        let offset = parts[0];
        let epoch = parts[1]
            .parse::<i64>()
            .map_err(|_| CoreError::corruption(format!("invalid author timestamp '{}'", parts[1])))?;
        let name_email = parts[2];

        let email_start = name_email
            .find('<')
            .ok_or_else(|| CoreError::corruption("author line is missing '<'"))?;
        let email_end = name_email
            .find('>')
            .ok_or_else(|| CoreError::corruption("author line is missing '>'"))?;

        let name = name_email[..email_start].trim().to_string();
        let email = name_email[email_start + 1..email_end].to_string();

        let offset = parse_fixed_offset(offset)?;
        let timestamp = chrono::DateTime::from_timestamp(epoch, 0)
            .ok_or_else(|| CoreError::corruption(format!("invalid author timestamp {epoch}")))?
            .with_timezone(&offset);

        Self::new_with_timestamp(name, email, timestamp)
    }
}

/// Parse a `±HHMM` fixed offset.
fn parse_fixed_offset(value: &str) -> anyhow::Result<chrono::FixedOffset> {
    let digits_valid = value.len() == 5
        && (value.starts_with('+') || value.starts_with('-'))
        && value[1..].chars().all(|c| c.is_ascii_digit());
    if !digits_valid {
        return Err(CoreError::corruption(format!("invalid timezone offset '{value}'")).into());
    }

    let hours: i32 = value[1..3].parse()?;
    let minutes: i32 = value[3..5].parse()?;
    let mut seconds = (hours * 60 + minutes) * 60;
    if value.starts_with('-') {
        seconds = -seconds;
    }

    chrono::FixedOffset::east_opt(seconds)
        .ok_or_else(|| CoreError::corruption(format!("timezone offset '{value}' out of range")).into())
}

/// A versioned reference to a tree, with optional parent, author,
/// timestamp and message.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Commit {
    tree_oid: ObjectId,
    parent: Option<ObjectId>,
    author: Author,
    message: String,
}

impl Commit {
    /// Create a commit, validating the message is non-empty.
    ///
    /// Hash shapes are enforced by `ObjectId`; the author shape by
    /// `Author`. Newlines in the message are preserved verbatim.
    pub fn new(
        tree_oid: ObjectId,
        parent: Option<ObjectId>,
        author: Author,
        message: String,
    ) -> anyhow::Result<Self> {
        if message.is_empty() {
            return Err(CoreError::validation("commit message cannot be empty").into());
        }

        Ok(Commit {
            tree_oid,
            parent,
            author,
            message,
        })
    }

    /// First line of the message, for short-form display.
    pub fn short_message(&self) -> String {
        self.message.lines().next().unwrap_or("").to_string()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn tree_oid(&self) -> &ObjectId {
        &self.tree_oid
    }

    pub fn parent(&self) -> Option<&ObjectId> {
        self.parent.as_ref()
    }

    pub fn author(&self) -> &Author {
        &self.author
    }

    pub fn timestamp(&self) -> chrono::DateTime<chrono::FixedOffset> {
        self.author.timestamp()
    }
}

impl Packable for Commit {
    fn serialize(&self) -> anyhow::Result<Bytes> {
        let mut headers = vec![format!("tree {}", self.tree_oid.as_ref())];
        if let Some(parent) = &self.parent {
            headers.push(format!("parent {}", parent.as_ref()));
        }
        headers.push(format!("author {}", self.author.display()));

        let object_content = format!("{}\n\n{}", headers.join("\n"), self.message);

        let mut commit_bytes = Vec::new();
        let header = format!(
            "{} {}\0",
            self.object_type().as_str(),
            object_content.len()
        );
        commit_bytes.write_all(header.as_bytes())?;
        commit_bytes.write_all(object_content.as_bytes())?;

        Ok(Bytes::from(commit_bytes))
    }
}

impl Unpackable for Commit {
    fn deserialize(reader: impl BufRead) -> anyhow::Result<Self> {
        let content = reader
            .bytes()
            .collect::<Result<Vec<u8>, std::io::Error>>()?;
        let content = String::from_utf8(content)
            .map_err(|_| CoreError::corruption("commit payload is not valid UTF-8"))?;

        // Headers end at the first blank line; everything after is the
        // message, verbatim.
        let (headers, message) = content
            .split_once("\n\n")
            .ok_or_else(|| CoreError::corruption("commit payload has no header separator"))?;

        let mut tree_oid = None;
        let mut parent = None;
        let mut author = None;

        for line in headers.lines() {
            if let Some(oid) = line.strip_prefix("tree ") {
                tree_oid = Some(ObjectId::try_parse(oid.to_string())?);
            } else if let Some(oid) = line.strip_prefix("parent ") {
                parent = Some(ObjectId::try_parse(oid.to_string())?);
            } else if let Some(rest) = line.strip_prefix("author ") {
                author = Some(Author::try_from(rest)?);
            } else {
                return Err(
                    CoreError::corruption(format!("unknown commit header line '{line}'")).into(),
                );
            }
        }

        let tree_oid =
            tree_oid.ok_or_else(|| CoreError::corruption("commit is missing its tree line"))?;
        let author =
            author.ok_or_else(|| CoreError::corruption("commit is missing its author line"))?;

        Commit::new(tree_oid, parent, author, message.to_string())
            .context("deserialized commit failed validation")
    }
}

impl Object for Commit {
    fn object_type(&self) -> ObjectType {
        ObjectType::Commit
    }

    fn display(&self) -> String {
        let mut lines = vec![format!("tree {}", self.tree_oid.as_ref())];
        if let Some(parent) = &self.parent {
            lines.push(format!("parent {}", parent.as_ref()));
        }
        lines.push(format!("author {}", self.author.display()));
        lines.push(String::new());
        lines.push(self.message.to_string());

        lines.join("\n")
    }
}

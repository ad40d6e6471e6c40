use crate::artifacts::branch::REF_PREFIX;
use crate::errors::CoreError;

/// A validated branch name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct BranchName(String);

impl BranchName {
    pub fn try_parse(name: String) -> anyhow::Result<Self> {
        if name.is_empty() {
            return Err(CoreError::validation("branch name cannot be empty").into());
        }
        if name.contains('/') {
            return Err(CoreError::validation(format!(
                "invalid branch name '{name}': names cannot contain '/'"
            ))
            .into());
        }
        if name == "." || name == ".." {
            return Err(
                CoreError::validation(format!("invalid branch name '{name}'")).into(),
            );
        }

        Ok(Self(name))
    }

    /// Parse a branch name out of its `refs/heads/<name>` ref path.
    pub fn try_parse_ref_path(ref_path: &str) -> anyhow::Result<Self> {
        let name = ref_path.strip_prefix(REF_PREFIX).ok_or_else(|| {
            CoreError::validation(format!(
                "ref path '{ref_path}' does not start with '{REF_PREFIX}'"
            ))
        })?;

        Self::try_parse(name.to_string())
    }

    /// The `refs/heads/<name>` path for this branch.
    pub fn to_ref_path(&self) -> String {
        format!("{REF_PREFIX}{}", self.0)
    }
}

impl AsRef<str> for BranchName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BranchName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

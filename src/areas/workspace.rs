//! Working directory operations
//!
//! The workspace owns every interaction with the user's files: listing
//! and reading candidates for staging, stat capture, and materializing
//! committed trees back onto disk during checkout.

use crate::artifacts::index::entry_mode::EntryMode;
use crate::artifacts::index::index_entry::EntryMetadata;
use crate::errors::CoreError;
use anyhow::Context;
use bytes::Bytes;
use std::path::{Component, Path};
use walkdir::WalkDir;

use crate::areas::repository::GITGO_DIR;

const IGNORED_PATHS: [&str; 3] = [GITGO_DIR, ".", ".."];

#[derive(Debug)]
pub struct Workspace {
    path: Box<Path>,
}

impl Workspace {
    pub fn new(path: Box<Path>) -> Self {
        Workspace { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Normalize a user-supplied path to its repo-relative,
    /// forward-slash form.
    ///
    /// Rejects any path that escapes the repository root, whether via
    /// `..` components or an absolute path outside the root.
    pub fn relativize(&self, path: &Path) -> anyhow::Result<String> {
        let path = if path.is_absolute() {
            path.strip_prefix(self.path.as_ref())
                .map_err(|_| {
                    CoreError::validation(format!(
                        "path '{}' is outside the repository",
                        path.display()
                    ))
                })?
                .to_path_buf()
        } else {
            path.to_path_buf()
        };

        let mut components: Vec<String> = Vec::new();
        for component in path.components() {
            match component {
                Component::Normal(part) => {
                    let part = part.to_str().ok_or_else(|| {
                        CoreError::validation(format!(
                            "path '{}' is not valid UTF-8",
                            path.display()
                        ))
                    })?;
                    components.push(part.to_string());
                }
                Component::CurDir => {}
                Component::ParentDir => {
                    if components.pop().is_none() {
                        return Err(CoreError::validation(format!(
                            "path '{}' is outside the repository",
                            path.display()
                        ))
                        .into());
                    }
                }
                Component::RootDir | Component::Prefix(_) => {
                    return Err(CoreError::validation(format!(
                        "path '{}' is outside the repository",
                        path.display()
                    ))
                    .into());
                }
            }
        }

        Ok(components.join("/"))
    }

    /// List the regular files under a path, repo-relative.
    ///
    /// A file path lists as itself; a directory is walked recursively
    /// with the metadata directory filtered out.
    pub fn list_files(&self, start: &Path) -> anyhow::Result<Vec<String>> {
        let absolute = self.path.join(start);

        if !absolute.exists() {
            return Err(CoreError::not_found(format!("path '{}'", start.display())).into());
        }

        if absolute.is_dir() {
            let mut files = Vec::new();
            for entry in WalkDir::new(&absolute).into_iter().filter_map(|e| e.ok()) {
                if !entry.file_type().is_file() || Self::is_ignored(entry.path()) {
                    continue;
                }

                let relative = entry
                    .path()
                    .strip_prefix(self.path.as_ref())
                    .with_context(|| {
                        format!("listed file {} outside workspace", entry.path().display())
                    })?;
                files.push(self.relativize(relative)?);
            }
            Ok(files)
        } else {
            Ok(vec![self.relativize(start)?])
        }
    }

    /// Whether the path (itself, not its target) is a symbolic link.
    pub fn is_symlink(&self, relative_path: &str) -> anyhow::Result<bool> {
        let metadata = std::fs::symlink_metadata(self.path.join(relative_path))
            .map_err(|_| CoreError::not_found(format!("path '{relative_path}'")))?;

        Ok(metadata.file_type().is_symlink())
    }

    pub fn read_file(&self, relative_path: &str) -> anyhow::Result<Bytes> {
        let file_path = self.path.join(relative_path);
        let content = std::fs::read(&file_path)
            .with_context(|| format!("failed to read file '{relative_path}'"))?;

        Ok(Bytes::from(content))
    }

    pub fn stat_file(&self, relative_path: &str) -> anyhow::Result<EntryMetadata> {
        let file_path = self.path.join(relative_path);
        let metadata = std::fs::metadata(&file_path)
            .map_err(|_| CoreError::not_found(format!("path '{relative_path}'")))?;

        (file_path.as_path(), metadata).try_into()
    }

    /// Remove every top-level entry of the working directory except the
    /// metadata directory. The first step of materializing a snapshot.
    pub fn clear_working_tree(&self) -> anyhow::Result<()> {
        for entry in std::fs::read_dir(self.path.as_ref())
            .with_context(|| format!("failed to list workspace {}", self.path.display()))?
        {
            let entry = entry?;
            if entry.file_name() == GITGO_DIR {
                continue;
            }

            let path = entry.path();
            if path.is_dir() {
                std::fs::remove_dir_all(&path)
                    .with_context(|| format!("failed to remove directory {}", path.display()))?;
            } else {
                std::fs::remove_file(&path)
                    .with_context(|| format!("failed to remove file {}", path.display()))?;
            }
        }

        Ok(())
    }

    /// Create a directory (and parents) with mode 0755.
    pub fn make_directory(&self, relative_path: &str) -> anyhow::Result<()> {
        let dir_path = self.path.join(relative_path);
        std::fs::create_dir_all(&dir_path)
            .with_context(|| format!("failed to create directory '{relative_path}'"))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&dir_path, std::fs::Permissions::from_mode(0o755))?;
        }

        Ok(())
    }

    /// Write a file with the mode bits recorded in its tree entry.
    pub fn write_file(
        &self,
        relative_path: &str,
        data: &[u8],
        mode: &EntryMode,
    ) -> anyhow::Result<()> {
        let file_path = self.path.join(relative_path);

        std::fs::write(&file_path, data)
            .with_context(|| format!("failed to write file '{relative_path}'"))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&file_path, std::fs::Permissions::from_mode(mode.as_u32()))
                .with_context(|| format!("failed to set permissions on '{relative_path}'"))?;
        }

        Ok(())
    }

    fn is_ignored(path: &Path) -> bool {
        path.components().any(|component| {
            if let Component::Normal(name) = component {
                let name = name.to_string_lossy();
                IGNORED_PATHS.contains(&name.as_ref())
            } else {
                false
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::TempDir;
    use assert_fs::prelude::*;
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    #[fixture]
    fn workspace_dir() -> (TempDir, Workspace) {
        let dir = TempDir::new().expect("failed to create temp dir");
        let workspace = Workspace::new(dir.path().to_path_buf().into());
        (dir, workspace)
    }

    #[rstest]
    fn relativize_normalizes_separators_and_dots(workspace_dir: (TempDir, Workspace)) {
        let (_dir, workspace) = workspace_dir;

        assert_eq!(
            workspace.relativize(Path::new("./a/b/../c.txt")).unwrap(),
            "a/c.txt"
        );
        assert_eq!(workspace.relativize(Path::new("a/b.txt")).unwrap(), "a/b.txt");
    }

    #[rstest]
    fn relativize_rejects_escapes(workspace_dir: (TempDir, Workspace)) {
        let (_dir, workspace) = workspace_dir;

        assert!(workspace.relativize(Path::new("../outside.txt")).is_err());
        assert!(workspace.relativize(Path::new("a/../../outside.txt")).is_err());
        assert!(workspace.relativize(Path::new("/etc/passwd")).is_err());
    }

    #[rstest]
    fn list_files_walks_directories_and_skips_metadata(workspace_dir: (TempDir, Workspace)) {
        let (dir, workspace) = workspace_dir;

        dir.child("a.txt").write_str("a").unwrap();
        dir.child("sub/b.txt").write_str("b").unwrap();
        dir.child(".gitgo/objects/keep").write_str("x").unwrap();

        let mut files = workspace.list_files(Path::new(".")).unwrap();
        files.sort();

        assert_eq!(files, vec!["a.txt".to_string(), "sub/b.txt".to_string()]);
    }

    #[rstest]
    fn clear_working_tree_preserves_the_metadata_directory(workspace_dir: (TempDir, Workspace)) {
        let (dir, workspace) = workspace_dir;

        dir.child("a.txt").write_str("a").unwrap();
        dir.child("sub/b.txt").write_str("b").unwrap();
        dir.child(".gitgo/HEAD").write_str("ref: refs/heads/main\n").unwrap();

        workspace.clear_working_tree().unwrap();

        assert!(!dir.child("a.txt").path().exists());
        assert!(!dir.child("sub").path().exists());
        assert!(dir.child(".gitgo/HEAD").path().exists());
    }

    #[cfg(unix)]
    #[rstest]
    fn symlinks_are_detected(workspace_dir: (TempDir, Workspace)) {
        let (dir, workspace) = workspace_dir;

        dir.child("target.txt").write_str("data").unwrap();
        std::os::unix::fs::symlink(dir.child("target.txt").path(), dir.child("link.txt").path())
            .unwrap();

        assert!(workspace.is_symlink("link.txt").unwrap());
        assert!(!workspace.is_symlink("target.txt").unwrap());
    }
}

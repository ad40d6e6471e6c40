//! Repository facade
//!
//! Coordinates the four subsystems (database, index, workspace, refs)
//! behind one type. Commands are implemented as `impl Repository`
//! blocks in `crate::commands` and report progress through the
//! repository's writer, so tests can capture output.

use crate::areas::database::Database;
use crate::areas::index::Index;
use crate::areas::refs::Refs;
use crate::areas::workspace::Workspace;
use crate::errors::CoreError;
use std::cell::{RefCell, RefMut};
use std::path::{Path, PathBuf};

/// Repository metadata directory name
pub const GITGO_DIR: &str = ".gitgo";

/// Object database directory name
const DATABASE_DIR: &str = "objects";

/// Index file name
const INDEX_FILE: &str = "index";

pub struct Repository {
    /// Repository root path
    path: Box<Path>,
    /// Output writer (stdout in the binary, a buffer in tests)
    writer: RefCell<Box<dyn std::io::Write>>,
    /// Staging area
    index: RefCell<Index>,
    /// Object database
    database: Database,
    /// Working directory
    workspace: Workspace,
    /// Reference manager
    refs: Refs,
}

impl Repository {
    pub fn new(path: PathBuf, writer: Box<dyn std::io::Write>) -> anyhow::Result<Self> {
        if !path.exists() {
            std::fs::create_dir_all(&path)?;
        }
        let path = path.canonicalize()?;

        let index = Index::new(path.join(GITGO_DIR).join(INDEX_FILE).into_boxed_path());
        let database = Database::new(path.join(GITGO_DIR).join(DATABASE_DIR).into_boxed_path());
        let workspace = Workspace::new(path.clone().into_boxed_path());
        let refs = Refs::new(path.join(GITGO_DIR).into_boxed_path());

        Ok(Repository {
            path: path.into_boxed_path(),
            writer: RefCell::new(writer),
            index: RefCell::new(index),
            database,
            workspace,
            refs,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn gitgo_path(&self) -> PathBuf {
        self.path.join(GITGO_DIR)
    }

    pub fn writer(&'_ self) -> RefMut<'_, Box<dyn std::io::Write>> {
        self.writer.borrow_mut()
    }

    pub fn index(&'_ self) -> RefMut<'_, Index> {
        self.index.borrow_mut()
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn refs(&self) -> &Refs {
        &self.refs
    }

    /// Guard for every command except `init`.
    pub fn require_repository(&self) -> anyhow::Result<()> {
        let gitgo = self.gitgo_path();
        let expected = [
            gitgo.clone(),
            gitgo.join(DATABASE_DIR),
            gitgo.join("refs"),
            gitgo.join("refs").join("heads"),
        ];

        if expected.iter().all(|dir| dir.is_dir()) {
            Ok(())
        } else {
            Err(CoreError::state(format!(
                "'{}' is not a gitgo repository",
                self.path.display()
            ))
            .into())
        }
    }
}

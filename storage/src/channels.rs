//! A directory of channels, every subdirectory is a separate [`Database`].
use std::path::{Path, PathBuf};

use crate::{db::Database, errors::Error, util::list_subdirs};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Channels {
    root: PathBuf,
}

impl Channels {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The names of all channels, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = list_subdirs(&self.root)
            .filter(|name| !name.starts_with('.'))
            .collect();
        names.sort_unstable();
        names
    }

    /// The database of the channel `name`.
    ///
    /// The channel does not have to exist yet, it is created by the first save.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidChannel`] if `name` is empty, contains a path separator, or is
    /// `.` or `..`.
    pub fn database(&self, name: &str) -> Result<Database, Error> {
        if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
            return Err(Error::InvalidChannel(name.to_string()));
        }
        Ok(Database::new(self.root.join(name)))
    }
}

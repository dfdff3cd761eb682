//! Keeps a local checkout of the wallpaper repository up to date.

use std::{
    path::{Path, PathBuf},
    process::Command,
};

use anyhow::{Context, bail};
use log::{debug, error, info};

/// Clones a git repository into a directory, or pulls it if it's already there.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RepositorySync {
    repository: String,
    directory: PathBuf,
}

impl RepositorySync {
    #[must_use]
    #[inline]
    pub fn new(repository: impl Into<String>, directory: impl Into<PathBuf>) -> Self {
        Self {
            repository: repository.into(),
            directory: directory.into(),
        }
    }

    #[must_use]
    #[inline]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// The git invocation [`RepositorySync::update`] runs next.
    fn command(&self) -> Command {
        let mut command = Command::new("git");
        if self.directory.is_dir() {
            command.arg("pull").current_dir(&self.directory);
        } else {
            command
                .arg("clone")
                .arg(&self.repository)
                .arg(&self.directory);
        }
        command
    }

    /// Clone or pull the repository.
    ///
    /// # Errors
    ///
    /// Fails if git can't be run or exits with a non-zero status, the output of git is logged.
    #[inline]
    pub fn update(&self) -> anyhow::Result<()> {
        if !self.directory.is_dir() {
            if let Some(parent) = self.directory.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
        }

        let mut command = self.command();
        debug!("running {command:?}");
        let output = command.output().context("failed to run git")?;

        let mut log = String::from_utf8_lossy(&output.stdout).into_owned();
        log.push_str(&String::from_utf8_lossy(&output.stderr));
        let log = log.trim_end();

        if !output.status.success() {
            error!("Error when updating wallpaper source repository. Output:\n{log}");
            bail!("git exited with {}", output.status);
        }
        info!("updated {} from {}", self.directory.display(), self.repository);
        debug!("{log}");
        Ok(())
    }
}

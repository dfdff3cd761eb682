use thiserror::Error;

/// Errors that can occur with finding the config directory.
#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error("Unable to find the config directory for aiad.")]
    Config,
}

/// Errors raised by the task manager and its tasks.
#[derive(Error, Debug)]
pub enum TaskError {
    #[error("A task with the id {0:?} is already registered.")]
    DuplicateId(String),
    #[error("Task {0:?} is already running.")]
    AlreadyRunning(String),
    #[error("Failed to spawn a thread for task {id:?}: {source}")]
    Spawn {
        id: String,
        #[source]
        source: std::io::Error,
    },
}

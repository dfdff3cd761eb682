#![deny(clippy::missing_inline_in_public_items)]

//----------------------------------------------------------------------------------------- std lib
use std::time::Duration;
//--------------------------------------------------------------------------------- other libraries
use anyhow::Context;
use log::{error, info};
//---------------------------------------------------------------------------------- AIAD libraries
use aiad_core::{
    config::Settings,
    logger::{init_logger, init_tracing},
    tasks::{Restart, Task, TaskManager},
};
use aiad_storage::channels::Channels;

pub mod api;
pub mod sync;
pub mod termination;

use crate::sync::RepositorySync;

/// The id of the task that keeps the wallpaper repository up to date.
pub const REPOSITORY_UPDATER: &str = "repository-updater";

/// Register the repository updater with `tasks`, if a repository is configured.
///
/// # Errors
///
/// Fails if a task with the same id is already registered.
#[inline]
pub fn register_repository_updater(
    settings: &Settings,
    tasks: &TaskManager,
) -> anyhow::Result<bool> {
    let Some(repository) = &settings.wallpapers.repository else {
        info!(
            "No repository configured, serving {} as it is",
            settings.wallpapers.channels_dir().display()
        );
        return Ok(false);
    };

    let sync = RepositorySync::new(repository.clone(), settings.wallpapers.directory.clone());
    tasks.register_task(Task::new(REPOSITORY_UPDATER, move || sync.update()).with_restart(
        Restart::Always,
        Duration::from_secs(settings.wallpapers.update_interval),
    ))?;
    Ok(true)
}

/// Run the daemon
///
/// also initializes the logger, tracing, and the background tasks.
///
/// # Errors
///
/// If the daemon cannot be started, an error is returned.
#[inline]
pub async fn start_daemon(settings: Settings) -> anyhow::Result<()> {
    init_logger(settings.daemon.log_level);
    tracing::subscriber::set_global_default(init_tracing())?;

    let tasks = TaskManager::new();
    register_repository_updater(&settings, &tasks)?;
    tasks.start()?;

    let app = api::router(
        Channels::new(settings.wallpapers.channels_dir()),
        settings.daemon.public_dir.as_deref(),
        settings.daemon.allow_cors,
    );

    let address = (settings.daemon.host.as_str(), settings.daemon.port);
    let listener = match tokio::net::TcpListener::bind(address).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to start server: {e}");
            tasks.stop();
            return Err(e).context(format!(
                "failed to bind to {}:{}",
                settings.daemon.host, settings.daemon.port
            ));
        }
    };
    info!("Listening on {}", listener.local_addr()?);

    let (_terminator, mut interrupt_rx) = termination::create_termination();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            match interrupt_rx.wait().await {
                Ok(interrupted) => info!("Shutting down after {interrupted:?}"),
                Err(e) => error!("Failed to wait for a shutdown signal: {e}"),
            }
        })
        .await?;

    tasks.stop();
    info!("Server stopped");
    Ok(())
}

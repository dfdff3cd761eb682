//! This is the daemon binary that runs the aiad web server.
//! the only thing it does is parse the flags, load the settings, and start the daemon
//! with functions from the `aiad_daemon` library crate (which is tested).

use std::path::PathBuf;

use aiad_core::config::Settings;
use aiad_daemon::start_daemon;

use clap::Parser;

#[cfg(not(feature = "cli"))]
compile_error!("The cli feature is required to build the daemon binary");

/// Options configurable via the CLI.
#[derive(Parser)]
#[command(name = "aiad-daemon", version, about)]
struct Flags {
    /// Sets the port number to listen on.
    #[clap(long)]
    port: Option<u16>,
    /// config file path
    #[clap(long)]
    config: Option<PathBuf>,
    /// log level
    #[clap(long)]
    log_level: Option<log::LevelFilter>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let flags = Flags::try_parse()?;

    let config_file = match flags.config {
        Some(config) => config,
        None => Settings::get_config_path()?,
    };
    let mut settings = Settings::init(Some(config_file))?;

    if let Some(port) = flags.port {
        settings.daemon.port = port;
    }
    if let Some(log_level) = flags.log_level {
        settings.daemon.log_level = log_level;
    }

    start_daemon(settings).await
}

use std::path::PathBuf;

use anyhow::Context as _;
use clap::{CommandFactory, Parser};
use log::{LevelFilter, debug};

use aiad_core::{config::Settings, logger::init_logger};
use aiad_storage::channels::Channels;

mod handlers;
mod resolvers;

use handlers::{CommandHandler, Context, utils::WriteAdapter};
use resolvers::{Credentials, Resolvers};

/// Options configurable via the CLI.
#[derive(Debug, Parser)]
#[command(name = "aiad-cli", version = env!("CARGO_PKG_VERSION"), about)]
struct Flags {
    /// Path to the config file (defaults to the one in the user config directory)
    #[clap(long, value_hint = clap::ValueHint::FilePath)]
    config: Option<PathBuf>,
    /// The directory holding the channels, overrides the config
    #[clap(long, value_hint = clap::ValueHint::DirPath)]
    root: Option<PathBuf>,
    /// Log what is going on
    #[clap(short, long, conflicts_with = "quiet")]
    verbose: bool,
    /// Only log errors
    #[clap(short, long)]
    quiet: bool,
    /// subcommand to run
    #[clap(subcommand)]
    subcommand: Option<handlers::Command>,
}

impl Flags {
    const fn log_level(&self) -> LevelFilter {
        if self.verbose {
            LevelFilter::Info
        } else if self.quiet {
            LevelFilter::Error
        } else {
            LevelFilter::Warn
        }
    }
}

#[test]
fn verify_cli() {
    Flags::command().debug_assert();
}

#[test]
fn test_log_level() {
    let level = |args: &[&str]| Flags::try_parse_from(args).unwrap().log_level();
    assert_eq!(level(&["aiad-cli"]), LevelFilter::Warn);
    assert_eq!(level(&["aiad-cli", "-v"]), LevelFilter::Info);
    assert_eq!(level(&["aiad-cli", "--quiet"]), LevelFilter::Error);
}

#[cfg(not(tarpaulin_include))]
fn main() -> anyhow::Result<()> {
    clap_complete::CompleteEnv::with_factory(Flags::command).complete();

    let flags = Flags::parse();
    init_logger(flags.log_level());

    let config = match flags.config {
        Some(path) => path,
        None => Settings::get_config_path().context("failed to find the config file")?,
    };
    debug!("loading config from {}", config.display());
    let mut settings = Settings::init(Some(config)).context("failed to load the config")?;
    if let Some(root) = flags.root {
        settings.cli.root = root;
    }

    let Some(command) = flags.subcommand else {
        eprintln!("No subcommand provided");
        return Ok(());
    };

    let credentials = Credentials::from_env_file(&settings.cli.env_file)?;
    let resolvers = Resolvers::new(&credentials)?;
    let ctx = Context {
        channels: Channels::new(settings.cli.root),
        default_channel: settings.cli.default_channel,
        resolver: &resolvers,
        today: chrono::Local::now().date_naive(),
    };

    let mut stdout_adapter = WriteAdapter(std::io::stdout());
    let mut stderr_adapter = WriteAdapter(std::io::stderr());
    command.handle(&ctx, &mut stdout_adapter, &mut stderr_adapter)
}

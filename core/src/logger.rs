//----------------------------------------------------------------------------------------- std lib
use std::io::Write;
use std::time::Instant;
//--------------------------------------------------------------------------------- other libraries
use env_logger::fmt::style::{AnsiColor, Style};
use log::info;
use once_cell::sync::Lazy;

use crate::format_duration;

// This will get initialized below.
/// Returns the init [`Instant`]
pub static INIT_INSTANT: Lazy<Instant> = Lazy::new(Instant::now);

/// The filter used when `RUST_LOG` is not set: everything off except for the aiad crates.
#[must_use]
pub fn default_filter(filter: log::LevelFilter) -> String {
    format!("off,aiad={filter},aiad_cli={filter},aiad_core={filter},aiad_daemon={filter},aiad_storage={filter}")
}

const fn level_letter(level: log::Level) -> (&'static str, AnsiColor) {
    match level {
        log::Level::Debug => ("D", AnsiColor::Blue),
        log::Level::Trace => ("T", AnsiColor::Magenta),
        log::Level::Info => ("I", AnsiColor::White),
        log::Level::Warn => ("W", AnsiColor::Yellow),
        log::Level::Error => ("E", AnsiColor::Red),
    }
}

//---------------------------------------------------------------------------------------------------- Logger init function
#[allow(clippy::module_name_repetitions)]
/// Initializes the logger.
///
/// Lines are printed to stderr as `| L | uptime | file @ line | message`.
///
/// `RUST_LOG` takes precedence over `filter` if it is set.
///
/// # Panics
/// This must only be called _once_.
#[cfg(not(tarpaulin_include))]
pub fn init_logger(filter: log::LevelFilter) {
    let now = Lazy::force(&INIT_INSTANT);

    let env = std::env::var("RUST_LOG").unwrap_or_default();
    let filters = if env.is_empty() {
        default_filter(filter)
    } else {
        env.clone()
    };

    env_logger::Builder::new()
        .format(move |buf, record| {
            let (letter, color) = level_letter(record.level());
            let level = Style::new().fg_color(Some(color.into())).bold();
            let dimmed = Style::new().dimmed();
            writeln!(
                buf,
                // Longest PATH in the repo: `daemon/src/termination.rs` - `25` characters
                // Longest file in the repo: `storage/src/db/mod.rs`     - `3` digits
                "| {level}{letter}{level:#} | {dimmed}{}{dimmed:#} | {dimmed}{: >25} @ {: <3}{dimmed:#} | {}",
                format_duration(&now.elapsed()),
                record.file_static().unwrap_or("???"),
                record.line().unwrap_or(0),
                record.args(),
            )
        })
        .write_style(env_logger::WriteStyle::Auto)
        .parse_filters(&filters)
        .init();

    if env.is_empty() {
        info!("Log Level (Flag) ... {filter}");
    } else {
        info!("Log Level (RUST_LOG) ... {env}");
    }
}

/// Initializes the tracing layer.
///
/// The returned subscriber only filters spans, it doesn't print them. Add an output layer
/// with [`tracing_subscriber::layer::SubscriberExt::with`] to record them somewhere.
///
/// # Panics
///
/// panics if the tracing filter cannot be parsed.
#[must_use]
pub fn init_tracing() -> impl tracing::Subscriber {
    use tracing_subscriber::layer::SubscriberExt as _;

    #[cfg(not(feature = "verbose_tracing"))]
    let filter = tracing_subscriber::EnvFilter::builder()
        .parse("off,aiad_daemon=trace,aiad_storage=trace")
        .unwrap();
    #[cfg(feature = "verbose_tracing")]
    let filter = tracing_subscriber::EnvFilter::builder()
        .parse("trace")
        .unwrap();

    tracing_subscriber::registry().with(filter)
}

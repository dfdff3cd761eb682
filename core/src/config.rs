//! Handles the configuration of the daemon and the CLI.
//!
//! this module is responsible for parsing the Aiad.toml file and layering environment variables
//! and cli arguments on top of it.

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;

use std::{path::PathBuf, str::FromStr};

pub static DEFAULT_CONFIG: &str = include_str!("../Aiad.toml");

#[derive(Clone, Debug, Deserialize, Default, PartialEq, Eq)]
pub struct Settings {
    /// General Daemon Settings
    #[serde(default)]
    pub daemon: DaemonSettings,
    /// Where the wallpapers come from and how often they are refreshed.
    #[serde(default)]
    pub wallpapers: WallpaperSettings,
    /// Settings for the CLI
    #[serde(default)]
    pub cli: CliSettings,
}

impl Settings {
    /// Load settings from the config file and environment variables.
    ///
    /// Without a config file the defaults in [`DEFAULT_CONFIG`] are used. Environment variables
    /// are prefixed with `AIAD_` and use `__` between section and key, e.g. `AIAD_DAEMON__PORT`.
    ///
    /// # Errors
    ///
    /// This function will return an error if the config file is not found or if the config file is
    /// invalid.
    #[inline]
    pub fn init(config: Option<PathBuf>) -> Result<Self, ConfigError> {
        let builder = Config::builder();
        let builder = match config {
            Some(path) => builder.add_source(File::from(path)),
            None => builder.add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml)),
        };
        let s = builder
            .add_source(
                Environment::with_prefix("AIAD")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let mut settings: Self = s.try_deserialize()?;
        settings.expand_paths();
        Ok(settings)
    }

    fn expand_paths(&mut self) {
        let expand = |path: &mut PathBuf| {
            *path = shellexpand::tilde(&path.to_string_lossy())
                .into_owned()
                .into();
        };
        expand(&mut self.wallpapers.directory);
        expand(&mut self.cli.root);
        expand(&mut self.cli.env_file);
        if let Some(public_dir) = &mut self.daemon.public_dir {
            expand(public_dir);
        }
    }

    /// Get the (default) path to the config file.
    /// If the config file does not exist at this path, it will be created with the default config.
    ///
    /// See [`crate::get_config_dir`] for more information about where this default path is located.
    ///
    /// # Errors
    ///
    /// This function will return an error if the system config directory (e.g., `~/.config` on linux) could not be found, or if the config file was missing and could not be created.
    #[inline]
    pub fn get_config_path() -> Result<PathBuf, std::io::Error> {
        let config_dir = crate::get_config_dir()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::NotFound, e))?;
        if !config_dir.exists() {
            std::fs::create_dir_all(&config_dir)?;
        }
        let config_file = config_dir.join("Aiad.toml");

        if !config_file.exists() {
            std::fs::write(&config_file, DEFAULT_CONFIG)?;
        }

        Ok(config_file)
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct DaemonSettings {
    /// The address to bind the web server to.
    /// Default is "127.0.0.1".
    #[serde(default = "default_host")]
    pub host: String,
    /// The port to listen on for HTTP requests.
    /// Default is 8000.
    #[serde(default = "default_port")]
    pub port: u16,
    /// What level of logging to use.
    /// Default is "info".
    #[serde(default = "default_log_level")]
    #[serde(deserialize_with = "de_log_level")]
    pub log_level: log::LevelFilter,
    /// Static files served for every path outside of the API.
    #[serde(default)]
    pub public_dir: Option<PathBuf>,
    #[serde(default)]
    pub allow_cors: bool,
}

impl Default for DaemonSettings {
    #[inline]
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            public_dir: None,
            allow_cors: false,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct WallpaperSettings {
    /// A git repository to clone into [`WallpaperSettings::directory`] and keep up to date.
    #[serde(default)]
    pub repository: Option<String>,
    /// The checkout of the repository, or just a plain directory if there is none.
    #[serde(default = "default_directory")]
    pub directory: PathBuf,
    /// The directory of channels, relative to [`WallpaperSettings::directory`].
    #[serde(default = "default_subdirectory")]
    pub subdirectory: PathBuf,
    /// Seconds between two repository updates.
    #[serde(default = "default_update_interval", alias = "update-interval")]
    pub update_interval: u64,
}

impl WallpaperSettings {
    /// The directory holding one subdirectory per channel.
    #[must_use]
    pub fn channels_dir(&self) -> PathBuf {
        self.directory.join(&self.subdirectory)
    }
}

impl Default for WallpaperSettings {
    #[inline]
    fn default() -> Self {
        Self {
            repository: None,
            directory: default_directory(),
            subdirectory: default_subdirectory(),
            update_interval: default_update_interval(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct CliSettings {
    /// The directory of channels.
    #[serde(default = "default_cli_root")]
    pub root: PathBuf,
    #[serde(default = "default_channel")]
    pub default_channel: String,
    /// A `KEY=VALUE` file with credentials for the URL resolvers.
    #[serde(default = "default_env_file")]
    pub env_file: PathBuf,
}

impl Default for CliSettings {
    #[inline]
    fn default() -> Self {
        Self {
            root: default_cli_root(),
            default_channel: default_channel(),
            env_file: default_env_file(),
        }
    }
}

fn de_log_level<'de, D>(deserializer: D) -> Result<log::LevelFilter, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    Ok(log::LevelFilter::from_str(&s).unwrap_or_else(|_| default_log_level()))
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

const fn default_port() -> u16 {
    8000
}

const fn default_log_level() -> log::LevelFilter {
    log::LevelFilter::Info
}

fn default_directory() -> PathBuf {
    PathBuf::from("var/data/wallpapers")
}

fn default_subdirectory() -> PathBuf {
    PathBuf::from("Wallpapers")
}

const fn default_update_interval() -> u64 {
    10
}

fn default_cli_root() -> PathBuf {
    PathBuf::from("Wallpapers")
}

fn default_channel() -> String {
    "General".to_string()
}

fn default_env_file() -> PathBuf {
    shellexpand::tilde("~/.config/aiad-cli.env")
        .into_owned()
        .into()
}

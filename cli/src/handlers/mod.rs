pub mod complete;
pub mod implementations;
pub mod printing;
pub mod utils;


use std::path::PathBuf;

use anyhow::bail;
use chrono::NaiveDate;
use clap::Subcommand;
use clap_complete::ArgValueCandidates;

use aiad_storage::{channels::Channels, db::Database, record::Record};

use crate::resolvers::UrlResolver;

pub trait CommandHandler {
    type Output;

    fn handle<W1: std::fmt::Write, W2: std::fmt::Write>(
        &self,
        ctx: &Context<'_>,
        stdout: &mut W1,
        stderr: &mut W2,
    ) -> Self::Output;
}

/// Everything a command needs besides its arguments.
pub struct Context<'a> {
    pub channels: Channels,
    /// Used when a command doesn't name a channel.
    pub default_channel: String,
    pub resolver: &'a dyn UrlResolver,
    pub today: NaiveDate,
}

impl Context<'_> {
    /// The database of `channel`, or of the default channel.
    ///
    /// # Errors
    ///
    /// Fails if the channel root does not exist or the channel name is invalid.
    pub fn database(&self, channel: Option<&str>) -> anyhow::Result<Database> {
        self.ensure_root()?;
        Ok(self
            .channels
            .database(channel.unwrap_or(&self.default_channel))?)
    }

    /// # Errors
    ///
    /// Fails with `directory "<root>" does not exist` if the channel root is missing.
    pub fn ensure_root(&self) -> anyhow::Result<()> {
        let root = self.channels.root();
        if !root.is_dir() {
            bail!("directory \"{}\" does not exist", root.display());
        }
        Ok(())
    }

    /// Resolve `url` and apply the name and keyword overrides, empty overrides are ignored.
    ///
    /// # Errors
    ///
    /// Fails if the URL can't be resolved.
    pub fn load_record(
        &self,
        url: &str,
        name: Option<&str>,
        keywords: Option<&str>,
    ) -> anyhow::Result<Record> {
        let mut record = self.resolver.resolve(url)?.normalized();
        if let Some(name) = name.filter(|name| !name.is_empty()) {
            record.name = name.to_string();
        }
        if let Some(keywords) = keywords.filter(|keywords| !keywords.is_empty()) {
            record.keywords = utils::parse_keywords(keywords);
        }
        Ok(record)
    }
}

#[derive(Debug, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Resolve a URL and save it as the next daily wallpaper
    Save {
        /// The page of the photo on a supported image host
        url: String,
        /// The channel to save to (defaults to the configured default channel)
        #[clap(short, long, add = ArgValueCandidates::new(complete::complete_channels))]
        channel: Option<String>,
        /// Override the wallpaper name
        #[clap(short, long)]
        name: Option<String>,
        /// Override the wallpaper keywords with a comma-separated list
        #[clap(short, long)]
        keywords: Option<String>,
        /// The date to save the wallpaper for, YYYY-MM-DD (defaults to the day after the latest
        /// wallpaper)
        #[clap(short, long, value_parser = utils::parse_date)]
        date: Option<NaiveDate>,
        /// Replace the wallpaper if the date is already taken
        #[clap(short, long)]
        force: bool,
    },
    /// Resolve the wallpapers of the given dates again and save them
    Resave {
        /// The dates to re-save, YYYY-MM-DD
        #[clap(required = true, value_parser = utils::parse_date)]
        dates: Vec<NaiveDate>,
        /// The channel of the wallpapers
        #[clap(short, long, add = ArgValueCandidates::new(complete::complete_channels))]
        channel: Option<String>,
    },
    /// Resolve a URL and print the wallpaper as JSON
    Resolve {
        /// The page of the photo on a supported image host
        url: String,
    },
    /// Check that wallpaper files are valid
    Validate {
        /// The JSON files to check
        #[clap(required = true, value_hint = clap::ValueHint::FilePath)]
        files: Vec<PathBuf>,
    },
    /// List the wallpapers of a channel
    List {
        #[clap(short, long, add = ArgValueCandidates::new(complete::complete_channels))]
        channel: Option<String>,
        /// Only list wallpapers of this year
        #[clap(long)]
        year: Option<i32>,
        /// Only list wallpapers of this month
        #[clap(long, value_parser = clap::value_parser!(u32).range(1..=12))]
        month: Option<u32>,
        /// Most recent first
        #[clap(short, long)]
        reverse: bool,
    },
    /// List the channels
    Channels,
}

//! Completion candidates for channel arguments.

use clap::builder::StyledStr;
use clap_complete::CompletionCandidate;

use aiad_core::config::Settings;
use aiad_storage::{
    channels::Channels,
    db::{DateFilter, Order},
};

/// The channels under the configured root, with the number of wallpapers in each as help.
#[must_use]
pub fn complete_channels() -> Vec<CompletionCandidate> {
    let settings = match Settings::get_config_path()
        .map_err(anyhow::Error::from)
        .and_then(|path| Ok(Settings::init(Some(path))?))
    {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Failed to load the configuration: {e}");
            return vec![];
        }
    };

    channel_candidates(&Channels::new(settings.cli.root))
        .into_iter()
        .map(|(name, help)| CompletionCandidate::new(name).help(Some(help)))
        .collect()
}

fn channel_candidates(channels: &Channels) -> Vec<(String, StyledStr)> {
    channels
        .names()
        .into_iter()
        .filter_map(|name| {
            let count = channels
                .database(&name)
                .ok()?
                .all(DateFilter::default().order(Order::Unsorted))
                .count();
            Some((name, StyledStr::from(format!("{count} wallpaper(s)"))))
        })
        .collect()
}

use core::fmt;
use std::{collections::HashMap, io};

use anyhow::Context;
use chrono::NaiveDate;

pub struct WriteAdapter<W>(pub W);

impl<W> fmt::Write for WriteAdapter<W>
where
    W: io::Write,
{
    fn write_str(&mut self, s: &str) -> Result<(), fmt::Error> {
        self.0.write_all(s.as_bytes()).map_err(|_| fmt::Error)
    }

    fn write_fmt(&mut self, args: fmt::Arguments<'_>) -> Result<(), fmt::Error> {
        self.0.write_fmt(args).map_err(|_| fmt::Error)
    }
}

/// Parse a `YYYY-MM-DD` date.
///
/// # Errors
///
/// Fails if the string isn't a valid calendar date in that format.
pub fn parse_date(s: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").with_context(|| format!("invalid date {s:?}, expected YYYY-MM-DD"))
}

/// Split a comma-separated keyword list, lowercased and trimmed. Empty entries are dropped.
#[must_use]
pub fn parse_keywords(s: &str) -> Vec<String> {
    s.to_lowercase()
        .split(',')
        .map(str::trim)
        .filter(|keyword| !keyword.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Parse `KEY=VALUE` lines, keys and values are trimmed and lines without `=` are ignored.
#[must_use]
pub fn parse_env_file(content: &str) -> HashMap<String, String> {
    content
        .lines()
        .filter(|line| !line.trim_start().starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .filter(|(key, _)| !key.is_empty())
        .collect()
}

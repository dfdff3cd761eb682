//! Handles displaying the output of the commands in a human readable format.

use std::{fmt::Write, path::Path};

use chrono::NaiveDate;

use aiad_storage::{errors::Error, record::Record};

/// `path` relative to the working directory when it is below it.
#[must_use]
pub fn relative(path: &Path) -> String {
    std::env::current_dir()
        .ok()
        .and_then(|cwd| path.strip_prefix(cwd).ok().map(Path::to_path_buf))
        .unwrap_or_else(|| path.to_path_buf())
        .display()
        .to_string()
}

/// One line of `list` output: the date, the name, the largest alias and the keywords.
pub fn wallpaper(date: NaiveDate, record: &Record) -> Result<String, std::fmt::Error> {
    let mut output = String::new();

    write!(output, "{date}  {}", record.name)?;
    if let Some(alias) = record.resolution_aliases.keys().next_back() {
        write!(output, "  [{alias}]")?;
    }
    if !record.keywords.is_empty() {
        write!(output, "  ({})", record.keywords.join(", "))?;
    }

    Ok(output)
}

/// The status of a validated file, `OK` or `ERROR (<reason>)`.
#[must_use]
pub fn validation(path: &Path, result: &Result<Record, Error>) -> String {
    match result {
        Ok(_) => format!("  {} OK", path.display()),
        // the path is already on the line
        Err(Error::MalformedRecord { source, .. }) => {
            format!("  {} ERROR ({source})", path.display())
        }
        Err(e) => format!("  {} ERROR ({e})", path.display()),
    }
}

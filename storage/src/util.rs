//! Utility types and functions.

use std::{
    fs::{self, DirEntry},
    path::Path,
};

/// Lowercase `name` and replace every run of non-alphanumeric characters with a single `-`.
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut in_separator = false;
    for c in name.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            slug.push(c);
            in_separator = false;
        } else if !in_separator {
            slug.push('-');
            in_separator = true;
        }
    }
    slug
}

/// Lists the entries of a directory.
///
/// A directory that does not exist (or can't be read) is treated as empty.
fn entries(path: &Path) -> impl Iterator<Item = DirEntry> + use<> {
    fs::read_dir(path).into_iter().flatten().filter_map(Result::ok)
}

/// Lists the names of the subdirectories of a directory.
///
/// Names that aren't valid UTF-8 are skipped, nothing in the database layout can contain them.
pub fn list_subdirs(path: &Path) -> impl Iterator<Item = String> + use<> {
    entries(path)
        .filter(|entry| entry.file_type().is_ok_and(|t| t.is_dir()))
        .filter_map(|entry| entry.file_name().into_string().ok())
}

/// Lists the names of the regular files in a directory, see [`list_subdirs`].
pub fn list_files(path: &Path) -> impl Iterator<Item = String> + use<> {
    entries(path)
        .filter(|entry| entry.file_type().is_ok_and(|t| t.is_file()))
        .filter_map(|entry| entry.file_name().into_string().ok())
}

/// Parses a zero-padded number of exactly `width` ASCII digits.
pub(crate) fn parse_padded(name: &str, width: usize) -> Option<u32> {
    if name.len() == width && name.bytes().all(|b| b.is_ascii_digit()) {
        name.parse().ok()
    } else {
        None
    }
}

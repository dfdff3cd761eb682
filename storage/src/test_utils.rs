//! Fixtures shared by the tests of this crate and the crates that depend on it.
use std::path::Path;

use anyhow::Result;
use chrono::NaiveDate;

use crate::{
    db::Database,
    record::{ImageCredit, ImageWithResolution, Record},
};

/// An image of the given resolution, `url` doubles as the filename.
#[must_use]
pub fn image(width: u32, height: u32, url: &str) -> ImageWithResolution {
    ImageWithResolution {
        height,
        width,
        image_url: url.to_string(),
        filename: format!("{url}.jpg"),
    }
}

/// A record that has not been normalized.
#[must_use]
pub fn record_with(name: &str, resolutions: Vec<ImageWithResolution>) -> Record {
    Record {
        name: name.to_string(),
        keywords: vec!["test".to_string()],
        source_url: format!("https://example.com/{name}"),
        credit: ImageCredit {
            text: format!("Photo of {name}"),
            author: "Tester".to_string(),
            author_url: "https://example.com/tester".to_string(),
        },
        resolutions,
        resolution_aliases: std::collections::BTreeMap::new(),
    }
}

/// A normalized record with a full HD and a 4K image.
#[must_use]
pub fn sample_record(name: &str) -> Record {
    let slug = crate::util::slugify(name);
    record_with(
        name,
        vec![
            image(1920, 1080, &format!("https://images.example.com/{slug}-fhd")),
            image(3840, 2160, &format!("https://images.example.com/{slug}-uhd")),
        ],
    )
    .normalized()
}

/// Create an empty file, and its parent directories.
///
/// # Panics
///
/// Panics if the file can't be created.
pub fn touch(path: &Path) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, "").unwrap();
}

/// The dates written by [`populate`], chronological.
#[must_use]
pub fn sample_dates() -> Vec<NaiveDate> {
    [(2024, 1, 2), (2024, 1, 15), (2024, 2, 29), (2024, 3, 5)]
        .into_iter()
        .filter_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d))
        .collect()
}

/// Save a [`sample_record`] for every date in [`sample_dates`] into the database at `root`.
///
/// # Errors
///
/// Fails if any of the records can't be saved.
pub fn populate(root: &Path) -> Result<Database> {
    let db = Database::new(root);
    for date in sample_dates() {
        db.save(date, &sample_record(&format!("Wallpaper {date}")))?;
    }
    Ok(db)
}

/// A temporary directory with the channels `General` and `Nature`, both populated.
///
/// # Errors
///
/// Fails if the directory can't be created or populated.
pub fn channels_dir() -> Result<tempfile::TempDir> {
    let dir = tempfile::tempdir()?;
    populate(&dir.path().join("General"))?;
    populate(&dir.path().join("Nature"))?;
    Ok(dir)
}

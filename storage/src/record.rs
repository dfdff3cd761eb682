#![allow(clippy::module_name_repetitions)]
//! The wallpaper [`Record`] and its derived resolution aliases.
//----------------------------------------------------------------------------------------- std lib
use std::{
    collections::BTreeMap,
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
};
//--------------------------------------------------------------------------------- other libraries
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};
//----------------------------------------------------------------------------------- local modules
use crate::errors::Error;

/// A named canonical resolution bucket.
///
/// Variants are declared (and therefore ordered) from the smallest to the largest threshold.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
pub enum ResolutionAlias {
    #[serde(rename = "HD")]
    #[strum(serialize = "HD")]
    Hd,
    #[serde(rename = "FHD")]
    #[strum(serialize = "FHD")]
    FullHd,
    #[serde(rename = "2K")]
    #[strum(serialize = "2K")]
    TwoK,
    #[serde(rename = "4K")]
    #[strum(serialize = "4K")]
    FourK,
    #[serde(rename = "5K")]
    #[strum(serialize = "5K")]
    FiveK,
    #[serde(rename = "8K")]
    #[strum(serialize = "8K")]
    EightK,
}

impl ResolutionAlias {
    /// The `(width, height)` an image must meet or exceed to qualify for this alias.
    #[must_use]
    pub const fn threshold(self) -> (u32, u32) {
        match self {
            Self::Hd => (1280, 720),
            Self::FullHd => (1920, 1080),
            Self::TwoK => (2560, 1440),
            Self::FourK => (3840, 2160),
            Self::FiveK => (5120, 2880),
            Self::EightK => (7680, 4320),
        }
    }

    #[must_use]
    pub const fn is_met_by(self, width: u32, height: u32) -> bool {
        let (alias_width, alias_height) = self.threshold();
        width >= alias_width && height >= alias_height
    }

    /// Returns the largest alias whose threshold is satisfied by the given resolution.
    #[must_use]
    pub fn closest(width: u32, height: u32) -> Option<Self> {
        Self::iter().rev().find(|alias| alias.is_met_by(width, height))
    }
}

/// An actual URL to an image and its resolution.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageWithResolution {
    pub height: u32,
    pub width: u32,
    pub image_url: String,
    pub filename: String,
}

impl ImageWithResolution {
    #[must_use]
    pub const fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    #[must_use]
    pub const fn meets(&self, width: u32, height: u32) -> bool {
        self.width >= width && self.height >= height
    }
}

/// Data to credit the author or photographer of a wallpaper.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageCredit {
    /// Text that can be printed / displayed to credit the author.
    pub text: String,
    /// Name of the author.
    pub author: String,
    /// Url to the author's webpage.
    pub author_url: String,
}

/// The resolved data for a wallpaper.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// The name of the wallpaper.
    pub name: String,
    /// Keywords for this wallpaper.
    pub keywords: Vec<String>,
    /// A standard webpage that can be viewed in the browser (not a JSON payload or the raw
    /// image), usually the main page on the wallpaper host.
    pub source_url: String,
    /// Credit to the author/photographer of this wallpaper.
    pub credit: ImageCredit,
    /// Available image resolutions, sorted from highest to lowest after [`Record::normalize`].
    pub resolutions: Vec<ImageWithResolution>,
    /// The tightest fitting image for every alias that any of the [`Record::resolutions`] meets.
    ///
    /// This is a cache generated by [`Record::normalize`], it is never edited by hand.
    #[serde(default)]
    pub resolution_aliases: BTreeMap<ResolutionAlias, ImageWithResolution>,
}

impl Record {
    /// Sort [`Record::resolutions`] from largest to smallest area and re-generate
    /// [`Record::resolution_aliases`].
    ///
    /// Images with the same area keep their relative order.
    pub fn normalize(&mut self) {
        self.resolutions
            .sort_by_key(|image| std::cmp::Reverse(image.area()));

        // the resolutions are sorted descending, so the last match is the smallest one
        self.resolution_aliases = ResolutionAlias::iter()
            .filter_map(|alias| {
                self.resolutions
                    .iter()
                    .rfind(|image| alias.is_met_by(image.width, image.height))
                    .map(|image| (alias, image.clone()))
            })
            .collect();
    }

    /// Returns a normalized copy of this record.
    #[must_use]
    pub fn normalized(&self) -> Self {
        let mut record = self.clone();
        record.normalize();
        record
    }

    /// Returns the smallest image that is at least `width` x `height`.
    ///
    /// Assumes the record is normalized.
    #[must_use]
    pub fn smallest_at_least(&self, width: u32, height: u32) -> Option<&ImageWithResolution> {
        self.resolutions
            .iter()
            .rev()
            .find(|image| image.meets(width, height))
    }

    /// Returns the smallest image in the record, the one used for previews.
    #[must_use]
    pub fn smallest(&self) -> Option<&ImageWithResolution> {
        self.resolutions.last()
    }

    /// Decode a record from a JSON string.
    ///
    /// # Errors
    ///
    /// Fails if a required field is missing or has the wrong type.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Encode the record as pretty-printed JSON (2 space indent).
    ///
    /// # Errors
    ///
    /// Fails if serialization fails.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Read a record from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IO`] if the file cannot be read and [`Error::MalformedRecord`] if it
    /// does not contain a valid record.
    pub fn load_from_file(path: &Path) -> Result<Self, Error> {
        let reader = BufReader::new(File::open(path)?);
        serde_json::from_reader(reader).map_err(|source| Error::MalformedRecord {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Write the record as pretty-printed JSON to a file.
    /// This will overwrite the file if it exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or written to.
    pub fn save_to_file(&self, path: &Path) -> Result<(), Error> {
        let json = self.to_json_pretty().map_err(std::io::Error::from)?;
        let mut writer = BufWriter::new(File::create(path)?);
        writer.write_all(json.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }
}

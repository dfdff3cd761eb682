use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("No wallpaper found for {0}.")]
    DateNotFound(NaiveDate),
    #[error("Malformed wallpaper record {}: {source}", path.display())]
    MalformedRecord {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("A wallpaper for {date} already exists at {}.", existing.display())]
    DateOccupied { date: NaiveDate, existing: PathBuf },
    #[error("No image available for resolution {width} x {height}.")]
    ResolutionUnavailable { width: u32, height: u32 },
    #[error("Invalid channel name: {0:?}")]
    InvalidChannel(String),
    #[error("IO error: {0}")]
    IO(#[from] std::io::Error),
}

impl Error {
    /// Whether the error means "there is nothing here", as opposed to a broken database.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::DateNotFound(_) | Self::ResolutionUnavailable { .. } | Self::InvalidChannel(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_str_eq;
    use rstest::rstest;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()
    }

    #[rstest]
    #[case(Error::DateNotFound(date()), "No wallpaper found for 2024-03-05.")]
    #[case(
        Error::DateOccupied { date: date(), existing: PathBuf::from("2024/03/05-a.json") },
        "A wallpaper for 2024-03-05 already exists at 2024/03/05-a.json."
    )]
    #[case(
        Error::ResolutionUnavailable { width: 3840, height: 2160 },
        "No image available for resolution 3840 x 2160."
    )]
    #[case(Error::InvalidChannel("..".into()), "Invalid channel name: \"..\"")]
    #[case(
        Error::from(std::io::Error::new(std::io::ErrorKind::Other, "test")),
        "IO error: test"
    )]
    fn test_error_display(#[case] input: Error, #[case] expected: &str) {
        assert_str_eq!(input.to_string(), expected);
    }

    #[rstest]
    #[case(Error::DateNotFound(date()), true)]
    #[case(Error::ResolutionUnavailable { width: 1, height: 1 }, true)]
    #[case(Error::InvalidChannel("a/b".into()), true)]
    #[case(Error::DateOccupied { date: date(), existing: PathBuf::new() }, false)]
    #[case(Error::from(std::io::Error::new(std::io::ErrorKind::Other, "test")), false)]
    fn test_is_not_found(#[case] input: Error, #[case] expected: bool) {
        assert_eq!(input.is_not_found(), expected);
    }
}

use errors::DirectoryError;

pub mod config;
pub mod errors;
pub mod logger;
pub mod tasks;

/// Get the config directory of aiad.
///
/// # Errors
///
/// Returns [`DirectoryError::Config`] if the system has no home or config directory.
#[inline]
pub fn get_config_dir() -> Result<std::path::PathBuf, DirectoryError> {
    directories::ProjectDirs::from("", "", "aiad")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or(DirectoryError::Config)
}

/// Format a duration as `seconds.milliseconds`, zero padded so log lines stay aligned.
#[must_use]
#[inline]
pub fn format_duration(duration: &std::time::Duration) -> String {
    format!("{:0>4}.{:03}", duration.as_secs(), duration.subsec_millis())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use std::time::Duration;

    #[rstest]
    #[case(Duration::from_millis(0), "0000.000")]
    #[case(Duration::from_millis(1_234), "0001.234")]
    #[case(Duration::from_millis(98_765_432), "98765.432")]
    fn test_format_duration(#[case] input: Duration, #[case] expected: &str) {
        assert_eq!(format_duration(&input), expected);
    }
}

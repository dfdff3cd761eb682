//! Turn the URL of a photo page into a wallpaper [`Record`].
//!
//! Every supported image host has its own resolver, they are tried in a fixed order and the
//! first one that matches the URL wins.

use std::{collections::HashMap, path::Path, time::Duration};

use anyhow::{Context as _, anyhow, bail};
use log::debug;

use aiad_storage::record::Record;

use crate::handlers::utils::parse_env_file;

mod pexels;
mod unsplash;

pub use pexels::PexelsResolver;
pub use unsplash::UnsplashResolver;

/// Something that can produce a [`Record`] from a URL.
pub trait UrlResolver {
    fn name(&self) -> &'static str;

    fn matches(&self, url: &str) -> bool;

    /// Resolve `url`, the record is not normalized.
    ///
    /// # Errors
    ///
    /// Fails if the URL is not supported, credentials are missing, or the host's API fails.
    fn resolve(&self, url: &str) -> anyhow::Result<Record>;
}

#[derive(Debug)]
pub enum Resolver {
    Pexels(PexelsResolver),
    Unsplash(UnsplashResolver),
}

impl UrlResolver for Resolver {
    fn name(&self) -> &'static str {
        match self {
            Self::Pexels(resolver) => resolver.name(),
            Self::Unsplash(resolver) => resolver.name(),
        }
    }

    fn matches(&self, url: &str) -> bool {
        match self {
            Self::Pexels(resolver) => resolver.matches(url),
            Self::Unsplash(resolver) => resolver.matches(url),
        }
    }

    fn resolve(&self, url: &str) -> anyhow::Result<Record> {
        match self {
            Self::Pexels(resolver) => resolver.resolve(url),
            Self::Unsplash(resolver) => resolver.resolve(url),
        }
    }
}

/// All known resolvers, in priority order.
#[derive(Debug)]
pub struct Resolvers {
    resolvers: Vec<Resolver>,
}

impl Resolvers {
    /// # Errors
    ///
    /// Fails if a resolver can't be set up.
    pub fn new(credentials: &Credentials) -> anyhow::Result<Self> {
        Ok(Self {
            resolvers: vec![
                Resolver::Pexels(PexelsResolver::new(credentials.get(pexels::TOKEN))?),
                Resolver::Unsplash(UnsplashResolver::new(credentials.get(unsplash::TOKEN))?),
            ],
        })
    }

    #[must_use]
    pub fn find(&self, url: &str) -> Option<&Resolver> {
        self.resolvers.iter().find(|resolver| resolver.matches(url))
    }
}

impl UrlResolver for Resolvers {
    fn name(&self) -> &'static str {
        "any"
    }

    fn matches(&self, url: &str) -> bool {
        self.find(url).is_some()
    }

    fn resolve(&self, url: &str) -> anyhow::Result<Record> {
        let resolver = self
            .find(url)
            .ok_or_else(|| anyhow!("no resolver for URL {url:?}"))?;
        debug!("resolving {url} with {}", resolver.name());
        resolver
            .resolve(url)
            .with_context(|| format!("failed to resolve {url} with {}", resolver.name()))
    }
}

/// API credentials, looked up in the environment first and then in an env file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Credentials {
    file: HashMap<String, String>,
}

impl Credentials {
    /// Read the `KEY=VALUE` lines of `path`. A missing file holds no credentials.
    ///
    /// # Errors
    ///
    /// Fails if the file exists but can't be read.
    pub fn from_env_file(path: &Path) -> anyhow::Result<Self> {
        if !path.is_file() {
            debug!("no env file at {}", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Ok(Self {
            file: parse_env_file(&content),
        })
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        std::env::var(key)
            .ok()
            .filter(|value| !value.is_empty())
            .or_else(|| self.file.get(key).cloned())
            .filter(|value| !value.is_empty())
    }
}

/// Fails with "`<key>` is not set." if there is no token.
fn require<'a>(token: Option<&'a str>, key: &str) -> anyhow::Result<&'a str> {
    match token {
        Some(token) => Ok(token),
        None => bail!("{key} is not set."),
    }
}

fn http_agent() -> ureq::Agent {
    ureq::AgentBuilder::new()
        .timeout_connect(Duration::from_secs(10))
        .timeout_read(Duration::from_secs(20))
        .timeout_write(Duration::from_secs(20))
        .user_agent(concat!("aiad-cli/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// The query parameters of `url`.
fn query_params(url: &str) -> anyhow::Result<HashMap<String, String>> {
    let url = url::Url::parse(url).with_context(|| format!("invalid URL {url:?}"))?;
    Ok(url
        .query_pairs()
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect())
}

/// `part / whole * other`, rounded, used to derive a missing side from the aspect ratio.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn scale(part: u32, whole: u32, other: u32) -> anyhow::Result<u32> {
    if whole == 0 {
        bail!("can't scale a resolution with a zero side");
    }
    Ok((f64::from(part) / f64::from(whole) * f64::from(other)).round() as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn resolvers() -> Resolvers {
        Resolvers::new(&Credentials::default()).unwrap()
    }

    #[rstest]
    #[case("https://www.pexels.com/photo/green-trees-near-body-of-water-2014422/", Some("pexels"))]
    #[case("https://pexels.com/photo/sunset-123", Some("pexels"))]
    #[case("https://unsplash.com/photos/Xq1ntWruZQI", Some("unsplash"))]
    #[case("https://www.unsplash.com/photos/Xq1ntWruZQI/", Some("unsplash"))]
    #[case("https://www.pexels.com/search/trees/", None)]
    #[case("https://unsplash.com/photos/a/b", None)]
    #[case("http://www.pexels.com/photo/sunset-123/", None)]
    #[case("not a url", None)]
    fn test_find(#[case] url: &str, #[case] expected: Option<&str>) {
        assert_eq!(resolvers().find(url).map(UrlResolver::name), expected);
    }

    #[test]
    fn test_no_resolver() {
        let err = resolvers().resolve("https://example.com/image.jpg").unwrap_err();
        assert_eq!(
            err.to_string(),
            "no resolver for URL \"https://example.com/image.jpg\""
        );
    }

    #[test]
    fn test_credentials_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aiad-cli.env");
        std::fs::write(
            &path,
            "# comment\nAIAD_TEST_FILE_ONLY_TOKEN = from-file\n\nAIAD_TEST_EMPTY=\n",
        )
        .unwrap();

        let credentials = Credentials::from_env_file(&path).unwrap();
        assert_eq!(
            credentials.get("AIAD_TEST_FILE_ONLY_TOKEN").as_deref(),
            Some("from-file")
        );
        assert_eq!(credentials.get("AIAD_TEST_EMPTY"), None);
        assert_eq!(credentials.get("AIAD_TEST_MISSING"), None);
    }

    #[test]
    fn test_credentials_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let credentials = Credentials::from_env_file(&dir.path().join("missing.env")).unwrap();
        assert_eq!(credentials, Credentials::default());
    }

    #[test]
    fn test_require() {
        assert_eq!(require(Some("abc"), "PEXELS_TOKEN").unwrap(), "abc");
        assert_eq!(
            require(None, "PEXELS_TOKEN").unwrap_err().to_string(),
            "PEXELS_TOKEN is not set."
        );
    }

    #[rstest]
    #[case(650, 1000, 1500, 975)]
    #[case(1, 3, 2, 1)]
    #[case(1080, 1080, 1920, 1920)]
    fn test_scale(#[case] part: u32, #[case] whole: u32, #[case] other: u32, #[case] expected: u32) {
        assert_eq!(scale(part, whole, other).unwrap(), expected);
    }

    #[test]
    fn test_scale_zero() {
        assert!(scale(1, 0, 1).is_err());
    }

    #[test]
    fn test_query_params() {
        let params =
            query_params("https://images.example.com/a.jpeg?auto=compress&dpr=2&h=650").unwrap();
        assert_eq!(params["dpr"], "2");
        assert_eq!(params["h"], "650");
        assert!(!params.contains_key("w"));
    }
}

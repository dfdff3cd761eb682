use std::collections::BTreeMap;

use anyhow::{Context, anyhow};
use regex::Regex;
use serde::Deserialize;

use aiad_storage::record::{ImageCredit, ImageWithResolution, Record};

use super::{UrlResolver, http_agent, query_params, require, scale};

pub const TOKEN: &str = "PEXELS_TOKEN";
const API_URL: &str = "https://api.pexels.com/v1/photos/";

/// The parts of `GET /v1/photos/{id}` we use.
#[derive(Debug, Deserialize)]
struct Photo {
    width: u32,
    height: u32,
    url: String,
    photographer: String,
    photographer_url: String,
    src: BTreeMap<String, String>,
}

#[derive(Debug)]
pub struct PexelsResolver {
    regex: Regex,
    token: Option<String>,
    agent: ureq::Agent,
}

impl PexelsResolver {
    /// # Errors
    ///
    /// Fails if the URL pattern doesn't compile.
    pub fn new(token: Option<String>) -> anyhow::Result<Self> {
        Ok(Self {
            regex: Regex::new(r"^https://(?:www\.)?pexels.com/photo/([^/]+)-(\d+)/?$")?,
            token,
            agent: http_agent(),
        })
    }

    /// The name and id of the photo.
    fn parse_url<'a>(&self, url: &'a str) -> Option<(&'a str, &'a str)> {
        let captures = self.regex.captures(url)?;
        Some((captures.get(1)?.as_str(), captures.get(2)?.as_str()))
    }
}

impl UrlResolver for PexelsResolver {
    fn name(&self) -> &'static str {
        "pexels"
    }

    fn matches(&self, url: &str) -> bool {
        self.regex.is_match(url)
    }

    fn resolve(&self, url: &str) -> anyhow::Result<Record> {
        let token = require(self.token.as_deref(), TOKEN)?;
        let (name, id) = self
            .parse_url(url)
            .ok_or_else(|| anyhow!("not a Pexels photo URL: {url}"))?;

        let photo: Photo = self
            .agent
            .get(&format!("{API_URL}{id}"))
            .set("Authorization", token)
            .call()?
            .into_json()
            .context("unexpected response from the Pexels API")?;

        record_from_photo(name, &photo)
    }
}

fn with_filename(
    name: &str,
    width: u32,
    height: u32,
    url: &str,
) -> anyhow::Result<ImageWithResolution> {
    let path = url::Url::parse(url)
        .with_context(|| format!("invalid image URL {url:?}"))?
        .path()
        .to_string();
    let extension = path.rsplit_once('.').map_or(path.as_str(), |(_, ext)| ext);
    Ok(ImageWithResolution {
        height,
        width,
        image_url: url.to_string(),
        filename: format!("{name}-{width}-{height}.{extension}"),
    })
}

/// The original image and every size variant Pexels offers.
fn record_from_photo(name: &str, photo: &Photo) -> anyhow::Result<Record> {
    let original = photo
        .src
        .get("original")
        .ok_or_else(|| anyhow!("the photo has no original image"))?;
    let mut resolutions = vec![with_filename(name, photo.width, photo.height, original)?];

    for (key, url) in photo.src.iter().filter(|(key, _)| *key != "original") {
        let params = query_params(url)?;
        let dpr: u32 = params.get("dpr").map_or(Ok(1), |dpr| dpr.parse())?;
        let height = params
            .get("h")
            .ok_or_else(|| anyhow!("variant {key:?} has no height"))?
            .parse::<u32>()?
            * dpr;
        let width = match params.get("w") {
            Some(width) => width.parse::<u32>()? * dpr,
            None => scale(height, photo.height, photo.width)?,
        };
        resolutions.push(with_filename(name, width, height, url)?);
    }

    Ok(Record {
        name: name.to_string(),
        keywords: vec![],
        source_url: photo.url.clone(),
        credit: ImageCredit {
            text: format!("This Photo was taken by {} on Pexels.", photo.photographer),
            author: photo.photographer.clone(),
            author_url: photo.photographer_url.clone(),
        },
        resolutions,
        resolution_aliases: BTreeMap::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PHOTO: &str = r##"{
        "id": 2014422,
        "width": 3024,
        "height": 3024,
        "url": "https://www.pexels.com/photo/brown-rocks-during-golden-hour-2014422/",
        "photographer": "Joey Farina",
        "photographer_url": "https://www.pexels.com/@joey",
        "photographer_id": 680589,
        "avg_color": "#978E82",
        "src": {
            "original": "https://images.pexels.com/photos/2014422/pexels-photo-2014422.jpeg",
            "large2x": "https://images.pexels.com/photos/2014422/pexels-photo-2014422.jpeg?auto=compress&cs=tinysrgb&dpr=2&h=650&w=940",
            "large": "https://images.pexels.com/photos/2014422/pexels-photo-2014422.jpeg?auto=compress&cs=tinysrgb&h=650&w=940",
            "medium": "https://images.pexels.com/photos/2014422/pexels-photo-2014422.jpeg?auto=compress&cs=tinysrgb&h=350",
            "tiny": "https://images.pexels.com/photos/2014422/pexels-photo-2014422.jpeg?auto=compress&cs=tinysrgb&dpr=1&fit=crop&h=200&w=280"
        },
        "liked": false,
        "alt": "Brown Rocks During Golden Hour"
    }"##;

    fn photo() -> Photo {
        serde_json::from_str(PHOTO).unwrap()
    }

    #[test]
    fn test_parse_url() {
        let resolver = PexelsResolver::new(None).unwrap();
        assert_eq!(
            resolver.parse_url("https://www.pexels.com/photo/brown-rocks-during-golden-hour-2014422/"),
            Some(("brown-rocks-during-golden-hour", "2014422"))
        );
        assert_eq!(resolver.parse_url("https://www.pexels.com/photo/2014422/"), None);
    }

    #[test]
    fn test_record_from_photo() {
        let record = record_from_photo("brown-rocks-during-golden-hour", &photo()).unwrap();

        assert_eq!(record.name, "brown-rocks-during-golden-hour");
        assert!(record.keywords.is_empty());
        assert_eq!(
            record.source_url,
            "https://www.pexels.com/photo/brown-rocks-during-golden-hour-2014422/"
        );
        assert_eq!(
            record.credit,
            ImageCredit {
                text: "This Photo was taken by Joey Farina on Pexels.".into(),
                author: "Joey Farina".into(),
                author_url: "https://www.pexels.com/@joey".into(),
            }
        );

        let sizes: Vec<_> = record
            .resolutions
            .iter()
            .map(|i| (i.width, i.height, i.filename.as_str()))
            .collect();
        assert_eq!(
            sizes,
            vec![
                (3024, 3024, "brown-rocks-during-golden-hour-3024-3024.jpeg"),
                (940, 650, "brown-rocks-during-golden-hour-940-650.jpeg"),
                (1880, 1300, "brown-rocks-during-golden-hour-1880-1300.jpeg"),
                (350, 350, "brown-rocks-during-golden-hour-350-350.jpeg"),
                (280, 200, "brown-rocks-during-golden-hour-280-200.jpeg"),
            ]
        );
        assert!(record.resolution_aliases.is_empty());
    }

    #[test]
    fn test_missing_original() {
        let mut photo = photo();
        photo.src.remove("original");
        assert!(record_from_photo("rocks", &photo).is_err());
    }

    #[test]
    fn test_missing_token() {
        let resolver = PexelsResolver::new(None).unwrap();
        let err = resolver
            .resolve("https://www.pexels.com/photo/brown-rocks-during-golden-hour-2014422/")
            .unwrap_err();
        assert_eq!(err.to_string(), "PEXELS_TOKEN is not set.");
    }
}

use std::collections::BTreeMap;

use anyhow::{Context, anyhow, bail};
use log::debug;
use regex::Regex;
use serde::Deserialize;

use aiad_storage::record::{ImageCredit, ImageWithResolution, Record};

use super::{UrlResolver, http_agent, query_params, require, scale};

pub const TOKEN: &str = "UNSPLASH_ACCESS_KEY";
const API_URL: &str = "https://api.unsplash.com/photos/";

/// Tags containing any of these are never used as keywords.
const BLOCKED_KEYWORDS: [&str; 4] = ["android", "wallpaper", "ios", "iphone"];

#[derive(Debug, Deserialize)]
struct Photo {
    width: u32,
    height: u32,
    description: Option<String>,
    alt_description: Option<String>,
    urls: BTreeMap<String, String>,
    links: Links,
    user: User,
    #[serde(default)]
    tags: Vec<Tag>,
}

#[derive(Debug, Deserialize)]
struct Links {
    html: String,
}

#[derive(Debug, Deserialize)]
struct User {
    name: String,
    links: Links,
}

#[derive(Debug, Deserialize)]
struct Tag {
    #[serde(rename = "type")]
    kind: String,
    title: String,
}

#[derive(Debug)]
pub struct UnsplashResolver {
    regex: Regex,
    access_key: Option<String>,
    agent: ureq::Agent,
}

impl UnsplashResolver {
    /// # Errors
    ///
    /// Fails if the URL pattern doesn't compile.
    pub fn new(access_key: Option<String>) -> anyhow::Result<Self> {
        Ok(Self {
            regex: Regex::new(r"^https://(?:www\.)?unsplash.com/photos/([^/]+)/?$")?,
            access_key,
            agent: http_agent(),
        })
    }

    fn photo_id<'a>(&self, url: &'a str) -> Option<&'a str> {
        Some(self.regex.captures(url)?.get(1)?.as_str())
    }

    /// The `Content-Type` the image host reports for `url`.
    fn content_type(&self, url: &str) -> anyhow::Result<String> {
        let response = self.agent.head(url).call()?;
        response
            .header("Content-Type")
            .map(ToString::to_string)
            .ok_or_else(|| anyhow!("no content type for {url}"))
    }
}

impl UrlResolver for UnsplashResolver {
    fn name(&self) -> &'static str {
        "unsplash"
    }

    fn matches(&self, url: &str) -> bool {
        self.regex.is_match(url)
    }

    fn resolve(&self, url: &str) -> anyhow::Result<Record> {
        let access_key = require(self.access_key.as_deref(), TOKEN)?;
        let id = self
            .photo_id(url)
            .ok_or_else(|| anyhow!("not an Unsplash photo URL: {url}"))?;

        let photo: Photo = self
            .agent
            .get(&format!("{API_URL}{id}"))
            .set("Authorization", &format!("Client-ID {access_key}"))
            .call()?
            .into_json()
            .context("unexpected response from the Unsplash API")?;

        record_from_photo(&photo, |url| self.content_type(url))
    }
}

/// The file extension for an image `Content-Type`.
fn extension(content_type: &str) -> anyhow::Result<&str> {
    let Some(subtype) = content_type.strip_prefix("image/") else {
        bail!("unexpected non-image content-type: {content_type:?}");
    };
    // "image/jpeg; charset=binary"
    Ok(subtype.split(';').next().unwrap_or(subtype).trim())
}

fn keywords(tags: &[Tag]) -> Vec<String> {
    tags.iter()
        .filter(|tag| tag.kind == "search")
        .filter(|tag| !BLOCKED_KEYWORDS.iter().any(|word| tag.title.contains(word)))
        .map(|tag| tag.title.trim_matches('#').to_string())
        .collect()
}

/// Every size variant except `raw`, `content_type` is asked for each variant's type.
fn record_from_photo(
    photo: &Photo,
    content_type: impl Fn(&str) -> anyhow::Result<String>,
) -> anyhow::Result<Record> {
    let name = photo
        .alt_description
        .as_deref()
        .or(photo.description.as_deref())
        .filter(|name| !name.is_empty())
        .unwrap_or_default();
    let separators = Regex::new(r"[\s,.]+")?;
    let base = separators.replace_all(name, "-");

    let mut resolutions = Vec::new();
    for (key, url) in photo.urls.iter().filter(|(key, _)| *key != "raw") {
        let width = match query_params(url)?.get("w") {
            Some(width) => width
                .parse()
                .with_context(|| format!("variant {key:?} has an invalid width"))?,
            None => photo.width,
        };
        let height = scale(width, photo.width, photo.height)?;
        let content_type = content_type(url)?;
        debug!("{key}: {width}x{height} {content_type}");
        resolutions.push(ImageWithResolution {
            height,
            width,
            image_url: url.clone(),
            filename: format!("{base}-{width}-{height}.{}", extension(&content_type)?),
        });
    }

    Ok(Record {
        name: name.to_string(),
        keywords: keywords(&photo.tags),
        source_url: photo.links.html.clone(),
        credit: ImageCredit {
            text: format!("This Photo was taken by {} on Unsplash.", photo.user.name),
            author: photo.user.name.clone(),
            author_url: photo.user.links.html.clone(),
        },
        resolutions,
        resolution_aliases: BTreeMap::new(),
    })
}

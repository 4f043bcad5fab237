//! Rewriting image URLs in entry media fields.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::TimelineEntry;

/// Extra media fields: `image2`, `image3`, ...
static NUMBERED_IMAGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^image\d+$").expect("valid image field regex"));

/// Replace `from` with `to` wherever it occurs in an image URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlReplacement {
    pub from: String,
    pub to: String,
}

impl UrlReplacement {
    pub fn new(from: &str, to: &str) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
        }
    }
}

/// Apply the replacements, in order, to every media URL of every entry.
///
/// Only `image`, `images` and numbered `imageN` fields are touched; captions
/// and descriptions keep their links. Returns the number of URLs changed.
pub fn rewrite_image_urls(entries: &mut [TimelineEntry], replacements: &[UrlReplacement]) -> usize {
    let mut changed = 0;
    for entry in entries.iter_mut() {
        let mut urls: Vec<&mut String> = Vec::new();
        if let Some(image) = entry.image.as_mut() {
            urls.push(image);
        }
        if let Some(images) = entry.images.as_mut() {
            urls.extend(images.urls_mut());
        }
        for (key, value) in entry.extra.iter_mut() {
            if !NUMBERED_IMAGE_RE.is_match(key) {
                continue;
            }
            if let Value::String(url) = value {
                urls.push(url);
            }
        }

        for url in urls {
            if rewrite(url, replacements) {
                changed += 1;
            }
        }
    }
    changed
}

fn rewrite(url: &mut String, replacements: &[UrlReplacement]) -> bool {
    let mut current = url.clone();
    for r in replacements.iter().filter(|r| !r.from.is_empty()) {
        if current.contains(&r.from) {
            current = current.replace(&r.from, &r.to);
        }
    }
    if current == *url {
        return false;
    }
    *url = current;
    true
}

//! Image URL discovery.
//!
//! One pass over a [`Document`] collects every image element's source and
//! every hyperlink that points at an image, deduplicated in first-seen order.
//!
//! Link matching is deliberately loose: a link qualifies when one of
//! `.jpg`, `.jpeg`, `.png` or `.webp` appears anywhere in its URL, including
//! the query string. Matching is case-sensitive.
//!
//! ## Quick Start
//!
//! ```rust
//! use imgstash_core::discovery::{discover_all, UrlSource};
//! use imgstash_core::document::HtmlDocument;
//!
//! let html = r#"
//!   <img src="a.jpg">
//!   <a href="b.png">full size</a>
//!   <a href="about.html">about</a>
//! "#;
//! let doc = HtmlDocument::parse(html, "https://example.com/")?;
//! let found = discover_all(&doc);
//!
//! assert_eq!(found.len(), 2);
//! assert_eq!(found[0].source, UrlSource::Image);
//! assert_eq!(found[1].url, "https://example.com/b.png");
//! # Ok::<(), imgstash_core::Error>(())
//! ```

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::IMAGE_EXTENSIONS;
use crate::document::Document;

/// A discovered URL with where it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredUrl {
    /// Absolute URL.
    pub url: String,
    /// Where this URL was discovered.
    pub source: UrlSource,
}

/// The origin of a discovered URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrlSource {
    /// Source of an image element.
    Image,
    /// Target of a hyperlink.
    Link,
}

/// Regex for image extensions anywhere in a URL.
///
/// SAFETY: Pattern is built from compile-time constants that are known to be valid.
#[allow(clippy::unwrap_used)]
static IMAGE_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    let alternation = IMAGE_EXTENSIONS.join("|");
    Regex::new(&format!(r"\.(?:{alternation})")).unwrap()
});

/// Whether a link target looks like an image.
#[must_use]
pub fn is_image_link(url: &str) -> bool {
    IMAGE_LINK_RE.is_match(url)
}

/// Scan `document` for image URLs.
///
/// Image element sources come first in document order, then matching link
/// targets. A URL seen twice keeps its first position and source.
#[must_use]
pub fn discover_all(document: &dyn Document) -> Vec<DiscoveredUrl> {
    let mut seen = HashSet::new();
    let mut found = Vec::new();

    let images = document
        .images()
        .iter()
        .map(|image| (image.src.as_str(), UrlSource::Image));
    let links = document
        .link_targets()
        .iter()
        .map(String::as_str)
        .filter(|url| is_image_link(url))
        .map(|url| (url, UrlSource::Link));

    for (url, source) in images.chain(links) {
        if seen.insert(url) {
            found.push(DiscoveredUrl {
                url: url.to_string(),
                source,
            });
        }
    }

    found
}

/// Like [`discover_all`], returning only the URLs.
#[must_use]
pub fn discover_urls(document: &dyn Document) -> Vec<String> {
    discover_all(document).into_iter().map(|d| d.url).collect()
}

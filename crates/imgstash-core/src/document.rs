//! Read-only view of the hosting document.
//!
//! The preloader never touches markup directly. It reads a [`Document`]:
//! the image elements with their resolved sources and on-screen geometry, and
//! the targets of every hyperlink. [`HtmlDocument`] builds such a snapshot
//! from HTML text; hosts with a live layout engine implement the trait
//! themselves.
//!
//! ## Example
//!
//! ```rust
//! use imgstash_core::document::{Document, HtmlDocument, Rect};
//!
//! let html = r#"<img src="/a.jpg"><a href="gallery/b.png">b</a>"#;
//! let doc = HtmlDocument::parse(html, "https://example.com/page")?
//!     .with_rect(0, Rect::from_xywh(0.0, 0.0, 100.0, 80.0));
//!
//! assert_eq!(doc.images()[0].src, "https://example.com/a.jpg");
//! assert_eq!(doc.link_targets(), ["https://example.com/gallery/b.png"]);
//! # Ok::<(), imgstash_core::Error>(())
//! ```

use std::sync::LazyLock;

use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{Error, Result};

/// Bounding rectangle in viewport coordinates (CSS pixels).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Distance from the viewport's top edge to the element's top edge.
    pub top: f64,
    /// Distance from the viewport's left edge to the element's left edge.
    pub left: f64,
    /// Distance from the viewport's top edge to the element's bottom edge.
    pub bottom: f64,
    /// Distance from the viewport's left edge to the element's right edge.
    pub right: f64,
}

impl Rect {
    /// Build a rectangle from its origin and size.
    #[must_use]
    pub fn from_xywh(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            top: y,
            left: x,
            bottom: y + height,
            right: x + width,
        }
    }
}

/// A displayable image element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageElement {
    /// Absolute source URL.
    pub src: String,
    /// Current bounding rectangle, `None` when the element has no layout.
    pub rect: Option<Rect>,
}

/// The collaborator the pipeline reads the page through.
pub trait Document: Send + Sync {
    /// Image elements in document order.
    fn images(&self) -> &[ImageElement];

    /// Resolved targets of every hyperlink, in document order.
    fn link_targets(&self) -> &[String];
}

/// SAFETY: Pattern is a compile-time constant that is known to be valid.
#[allow(clippy::unwrap_used)]
static IMG_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("img[src]").unwrap());

/// SAFETY: Pattern is a compile-time constant that is known to be valid.
#[allow(clippy::unwrap_used)]
static LINK_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());

/// SAFETY: Pattern is a compile-time constant that is known to be valid.
#[allow(clippy::unwrap_used)]
static BASE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("base[href]").unwrap());

/// Snapshot of an HTML document.
///
/// Sources and link targets are resolved once, at parse time, against the
/// document's first `<base href>` (itself resolved against the base URL) or
/// the base URL when there is none. Only `http` and `https` URLs are kept
/// since nothing else can be fetched. Geometry is supplied separately, keyed
/// by the image element's index in document order.
#[derive(Debug, Clone, Default)]
pub struct HtmlDocument {
    images: Vec<ImageElement>,
    links: Vec<String>,
}

impl HtmlDocument {
    /// Parse `html` and resolve its URLs against `base_url`.
    pub fn parse(html: &str, base_url: &str) -> Result<Self> {
        let base = Url::parse(base_url)
            .map_err(|e| Error::InvalidUrl(format!("Invalid base URL '{base_url}': {e}")))?;
        let parsed = Html::parse_document(html);
        let base = document_base(&parsed, base);

        let images = parsed
            .select(&IMG_SELECTOR)
            .filter_map(|el| el.value().attr("src"))
            .filter_map(|src| resolve(src, &base))
            .map(|src| ImageElement { src, rect: None })
            .collect();

        let links = parsed
            .select(&LINK_SELECTOR)
            .filter_map(|el| el.value().attr("href"))
            .filter_map(|href| resolve(href, &base))
            .collect();

        Ok(Self { images, links })
    }

    /// Attach geometry to the image element at `index`.
    ///
    /// Out-of-range indices are ignored.
    #[must_use]
    pub fn with_rect(mut self, index: usize, rect: Rect) -> Self {
        if let Some(image) = self.images.get_mut(index) {
            image.rect = Some(rect);
        }
        self
    }

    /// Attach geometry to several image elements at once.
    #[must_use]
    pub fn with_rects(self, rects: impl IntoIterator<Item = (usize, Rect)>) -> Self {
        rects
            .into_iter()
            .fold(self, |doc, (index, rect)| doc.with_rect(index, rect))
    }
}

impl Document for HtmlDocument {
    fn images(&self) -> &[ImageElement] {
        &self.images
    }

    fn link_targets(&self) -> &[String] {
        &self.links
    }
}

/// The first `<base href>` wins; one that fails to resolve is ignored.
fn document_base(parsed: &Html, fallback: Url) -> Url {
    parsed
        .select(&BASE_SELECTOR)
        .next()
        .and_then(|el| el.value().attr("href"))
        .and_then(|href| fallback.join(href.trim()).ok())
        .unwrap_or(fallback)
}

fn resolve(raw: &str, base: &Url) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let resolved = base.join(raw).ok()?;
    matches!(resolved.scheme(), "http" | "https").then(|| resolved.to_string())
}

//! Viewport intersection and the visible/offscreen split.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::discovery::DiscoveredUrl;
use crate::document::{Document, Rect};

/// Answers whether an element's rectangle overlaps the visible area.
pub trait Viewport: Send + Sync {
    /// `true` iff `rect` overlaps the viewport at all.
    fn element_intersects(&self, rect: &Rect) -> bool;
}

/// Viewport with its origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportSize {
    /// Width in CSS pixels.
    pub width: f64,
    /// Height in CSS pixels.
    pub height: f64,
}

impl ViewportSize {
    /// Create a viewport of the given size.
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

impl Viewport for ViewportSize {
    // Coarse overlap: partially visible counts, occlusion is ignored.
    fn element_intersects(&self, rect: &Rect) -> bool {
        rect.top < self.height && rect.left < self.width && rect.bottom > 0.0 && rect.right > 0.0
    }
}

/// Discovered URLs split by viewport membership, each in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partition {
    /// URLs with at least one on-screen image element.
    pub visible: Vec<String>,
    /// Everything else, including link targets.
    pub offscreen: Vec<String>,
}

/// Split `discovered` into visible and offscreen URLs.
///
/// A URL is visible when any image element with that source intersects the
/// viewport. Elements without geometry never do, and link targets have no
/// element at all.
#[must_use]
pub fn partition(
    discovered: &[DiscoveredUrl],
    document: &dyn Document,
    viewport: &dyn Viewport,
) -> Partition {
    let on_screen: HashSet<&str> = document
        .images()
        .iter()
        .filter(|image| {
            image
                .rect
                .as_ref()
                .is_some_and(|rect| viewport.element_intersects(rect))
        })
        .map(|image| image.src.as_str())
        .collect();

    let (visible, offscreen) = discovered
        .iter()
        .map(|d| d.url.clone())
        .partition(|url| on_screen.contains(url.as_str()));

    Partition { visible, offscreen }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::discovery::discover_all;
    use crate::document::HtmlDocument;

    const VIEWPORT: ViewportSize = ViewportSize::new(800.0, 600.0);

    #[test]
    fn test_intersection_edges() {
        let inside = Rect::from_xywh(10.0, 10.0, 100.0, 100.0);
        let straddling_top = Rect::from_xywh(0.0, -50.0, 100.0, 60.0);
        let straddling_right = Rect::from_xywh(790.0, 0.0, 100.0, 100.0);
        let below = Rect::from_xywh(0.0, 600.0, 100.0, 100.0);
        let right_of = Rect::from_xywh(800.0, 0.0, 100.0, 100.0);
        let above = Rect::from_xywh(0.0, -100.0, 100.0, 100.0);
        let left_of = Rect::from_xywh(-100.0, 0.0, 100.0, 100.0);
        let collapsed = Rect::from_xywh(0.0, 0.0, 0.0, 0.0);

        assert!(VIEWPORT.element_intersects(&inside));
        assert!(VIEWPORT.element_intersects(&straddling_top));
        assert!(VIEWPORT.element_intersects(&straddling_right));
        assert!(!VIEWPORT.element_intersects(&below));
        assert!(!VIEWPORT.element_intersects(&right_of));
        assert!(!VIEWPORT.element_intersects(&above));
        assert!(!VIEWPORT.element_intersects(&left_of));
        assert!(!VIEWPORT.element_intersects(&collapsed));
    }

    #[test]
    fn test_partition_preserves_relative_order() {
        let html = r#"<img src="A.png"><img src="B.png"><img src="C.png"><img src="D.png">"#;
        let on = Rect::from_xywh(0.0, 0.0, 50.0, 50.0);
        let off = Rect::from_xywh(0.0, 2000.0, 50.0, 50.0);
        let doc = HtmlDocument::parse(html, "https://example.com/")
            .unwrap()
            .with_rects([(0, off), (1, on), (2, off), (3, on)]);

        let parts = partition(&discover_all(&doc), &doc, &VIEWPORT);

        assert_eq!(
            parts.visible,
            ["https://example.com/B.png", "https://example.com/D.png"]
        );
        assert_eq!(
            parts.offscreen,
            ["https://example.com/A.png", "https://example.com/C.png"]
        );
    }

    #[test]
    fn test_links_and_unlaid_images_are_offscreen() {
        let html = r#"<img src="a.jpg"><a href="a-large.jpg">zoom</a>"#;
        let doc = HtmlDocument::parse(html, "https://example.com/").unwrap();

        let parts = partition(&discover_all(&doc), &doc, &VIEWPORT);

        assert!(parts.visible.is_empty());
        assert_eq!(parts.offscreen.len(), 2);
    }

    #[test]
    fn test_any_visible_element_makes_source_visible() {
        let html = r#"<img src="logo.png"><img src="logo.png">"#;
        let doc = HtmlDocument::parse(html, "https://example.com/")
            .unwrap()
            .with_rect(1, Rect::from_xywh(5.0, 5.0, 10.0, 10.0));

        let parts = partition(&discover_all(&doc), &doc, &VIEWPORT);

        assert_eq!(parts.visible, ["https://example.com/logo.png"]);
        assert!(parts.offscreen.is_empty());
    }
}

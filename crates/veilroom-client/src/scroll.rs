//! Scroll anchoring across a merge.
//!
//! Capture an anchor from the viewport before a batch is applied, then resolve
//! it against the new content height. A reader parked at the bottom keeps
//! following new messages; a reader scrolled up into history is shifted by
//! exactly the height the merge added.

/// Distance from the bottom, in pixels, that still counts as "at the bottom".
pub const NEAR_BOTTOM_THRESHOLD_PX: f64 = 50.0;

/// Scroll metrics of the message list.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    /// Offset of the visible area from the top of the content
    pub scroll_top: f64,
    /// Total content height
    pub scroll_height: f64,
    /// Visible height
    pub client_height: f64,
}

impl Viewport {
    /// Whether the visible area ends within `threshold` of the content end.
    pub fn is_near_bottom(&self, threshold: f64) -> bool {
        self.scroll_height - self.scroll_top - self.client_height < threshold
    }
}

/// Scroll state recorded before a merge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollAnchor {
    near_bottom: bool,
    scroll_height: f64,
}

impl ScrollAnchor {
    /// Record the viewport before content changes.
    pub fn capture(viewport: Viewport, threshold: f64) -> Self {
        Self {
            near_bottom: viewport.is_near_bottom(threshold),
            scroll_height: viewport.scroll_height,
        }
    }

    /// Whether the reader was following the bottom.
    pub fn was_near_bottom(&self) -> bool {
        self.near_bottom
    }

    /// What the presentation layer should do once content is `new_height`.
    pub fn resolve(&self, new_height: f64) -> ScrollIntent {
        if self.near_bottom {
            ScrollIntent::StickToBottom
        } else {
            ScrollIntent::PreserveOffset { delta: new_height - self.scroll_height }
        }
    }
}

/// Scroll instruction for the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScrollIntent {
    /// Scroll to the end of the content
    StickToBottom,
    /// Add `delta` to the scroll offset recorded before the merge
    PreserveOffset {
        /// Content height added by the merge
        delta: f64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport(scroll_top: f64) -> Viewport {
        Viewport { scroll_top, scroll_height: 1000.0, client_height: 300.0 }
    }

    #[test]
    fn near_bottom_uses_strict_threshold() {
        assert!(viewport(700.0).is_near_bottom(NEAR_BOTTOM_THRESHOLD_PX));
        assert!(viewport(651.0).is_near_bottom(NEAR_BOTTOM_THRESHOLD_PX));
        assert!(!viewport(650.0).is_near_bottom(NEAR_BOTTOM_THRESHOLD_PX));
    }

    #[test]
    fn at_bottom_sticks() {
        let anchor = ScrollAnchor::capture(viewport(700.0), NEAR_BOTTOM_THRESHOLD_PX);
        assert_eq!(anchor.resolve(1200.0), ScrollIntent::StickToBottom);
    }

    #[test]
    fn scrolled_up_preserves_by_height_delta() {
        let anchor = ScrollAnchor::capture(viewport(100.0), NEAR_BOTTOM_THRESHOLD_PX);
        assert_eq!(anchor.resolve(1240.0), ScrollIntent::PreserveOffset { delta: 240.0 });
    }

    #[test]
    fn short_content_counts_as_bottom() {
        let v = Viewport { scroll_top: 0.0, scroll_height: 100.0, client_height: 300.0 };
        assert!(v.is_near_bottom(NEAR_BOTTOM_THRESHOLD_PX));
    }
}

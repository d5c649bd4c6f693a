//! Invoice bounds inference.
//!
//! Scans carry letterhead, stamps and margins of varying size, so the raw
//! extent of all tokens is a poor frame. The top edge is anchored on the title
//! line and the bottom edge on the variant's closing line instead.

use tracing::debug;

use crate::geometry::Rect;
use crate::ocr::Token;

/// Phrases anchoring the vertical bounds.
#[derive(Debug, Clone, Copy)]
pub struct BoundsMarkers<'a> {
    /// Tokens containing this phrase pin the top edge.
    pub title: &'a str,
    /// Tokens containing this phrase pin the bottom edge.
    pub total: &'a str,
    /// Distance kept above the title and below the closing line.
    pub margin: i32,
}

/// Infer the printed extent of the invoice from its tokens.
///
/// Left and right are the extreme token edges. Top is the highest title-marker
/// token minus `margin` (never below zero); bottom is the lowest total-marker
/// token plus `margin`. Without a marker token the edge falls back to the raw
/// extent of all tokens.
///
/// Returns `None` when no token carries a well-formed box.
pub fn infer_bounds(tokens: &[Token], markers: &BoundsMarkers<'_>) -> Option<Rect> {
    let mut left: Option<i32> = None;
    let mut right: Option<i32> = None;
    let mut raw_top: Option<i32> = None;
    let mut raw_bottom: Option<i32> = None;
    let mut title_top: Option<i32> = None;
    let mut total_bottom: Option<i32> = None;

    for tok in tokens {
        let Some(rect) = tok.rect() else {
            continue;
        };

        if tok.text.contains(markers.title) {
            title_top = Some(title_top.map_or(rect.top, |t| t.min(rect.top)));
        }
        if tok.text.contains(markers.total) {
            total_bottom = Some(total_bottom.map_or(rect.bottom, |b| b.max(rect.bottom)));
        }

        left = Some(left.map_or(rect.left, |l| l.min(rect.left)));
        right = Some(right.map_or(rect.right, |r| r.max(rect.right)));
        raw_top = Some(raw_top.map_or(rect.top, |t| t.min(rect.top)));
        raw_bottom = Some(raw_bottom.map_or(rect.bottom, |b| b.max(rect.bottom)));
    }

    let top = match title_top {
        Some(t) => t.saturating_sub(markers.margin).max(0),
        None => {
            debug!("no token contains title marker {:?}, using raw top", markers.title);
            raw_top?
        }
    };

    let bottom = match total_bottom {
        Some(b) => b.saturating_add(markers.margin),
        None => {
            debug!("no token contains total marker {:?}, using raw bottom", markers.total);
            raw_bottom?
        }
    };

    Some(Rect::new(left?, top, right?, bottom))
}

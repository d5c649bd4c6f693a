//! Invoice layouts: the variant catalog and bounds inference.

mod bounds;
mod catalog;

pub use bounds::{BoundsMarkers, infer_bounds};
pub use catalog::{LayoutCatalog, LayoutVariant, SegmentKind, SegmentName, SegmentTemplate};

//! Text handling: segmentation and preprocessing

pub mod preprocess;
pub mod segment;

pub use preprocess::preprocess;
pub use segment::{segment, Segment, SegmentIndexTable, WordPlacement};

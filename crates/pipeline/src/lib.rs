//! Batch pipeline: load, clean, build RFM features, segment customers,
//! build product similarity and persist both tables.

pub mod runner;
pub mod summary;

pub use runner::{PipelineOutput, PipelineReport, PipelineRunner};
pub use summary::{segment_summary, SegmentSummary};

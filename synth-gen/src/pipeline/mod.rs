//! Generation pipeline: per-image orchestration and batch processing.

pub use batch::*;
pub mod batch;

pub use generator::*;
pub mod generator;

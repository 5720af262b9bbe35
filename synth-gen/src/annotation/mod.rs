//! Bounding-box projection, filtering, and YOLO label emission.

pub use bbox::*;
pub mod bbox;

pub use validation::*;
pub mod validation;

pub use yolo::*;
pub mod yolo;

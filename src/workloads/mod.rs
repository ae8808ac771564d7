//! Example workloads exercising the harness: a 1-D buffer scenario and a
//! 2-D image scenario.

pub mod color_to_gray;
pub mod vector_add;

pub use color_to_gray::{ColorToGray, ImageData};
pub use vector_add::VectorAdd;

//! Run output files.
//!
//! - [`json`]: writes each [`crate::models::RunReport`] as a dated JSON file

pub mod json;

//! Coil thickness inspection: form data in, polar chart and spreadsheet row out.

pub mod chart;
pub mod color;
pub mod config;
pub mod data;
pub mod error;
pub mod pipeline;
pub mod preflight;

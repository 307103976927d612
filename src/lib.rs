//! ScentScan - perfume bottle identification service
//!
//! Detects perfume bottles in a photo, reads the label on the chosen bottle,
//! verifies it against the detected name and looks up its fragrance notes.

pub mod analysis;
pub mod catalog;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod server;
pub mod storage;
pub mod vision;

#[cfg(test)]
mod test_support;

pub use config::AppConfig;
pub use error::IdentifyError;
pub use pipeline::{DetectionOutcome, IdentificationResult, IdentifyOutcome, Pipeline};

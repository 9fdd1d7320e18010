//! Runtime for turning XML payloads into flat output maps.
//!
//! This module holds the configuration surface and the extraction pipeline
//! that applies pre-parsed path expressions to each document.

pub mod config_loader;
pub mod pipeline;

// Re-export key types
pub use config_loader::{ConfigError, TransformConfig};
pub use pipeline::{xml_to_map, OutputMap, TransformError, XmlExtractor};

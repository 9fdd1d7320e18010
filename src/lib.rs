//! # xmlsift: XML to flat JSON maps
//!
//! xmlsift converts a semi-structured XML document into a flat key/value map
//! ready for JSON serialization. Values are selected with path expressions
//! that can rename, filter and trim what they find.
//!
//! ## Path expressions
//!
//! ```text
//! lookup.path<alias><filter-regex><extract-regex>
//! ```
//!
//! - `lookup.path`: field names separated by the configured delimiter; a
//!   step over a repeated element fans out across every occurrence
//! - `alias`: output key (defaults to the lookup path)
//! - `filter-regex`: keep only list entries that match it in full
//! - `extract-regex`: replace each list entry by its first match
//!
//! Missing values never fail a document, they come back as `{}`. Only
//! malformed XML is an error.
//!
//! ## Example
//!
//! ```
//! use xmlsift::{TransformConfig, XmlExtractor};
//!
//! let config = TransformConfig::new([
//!     "Customers.Customer.ContactName<ContactName>",
//!     "Customers.Customer.Phone<AreaCode><.*><\\(\\d+\\)>",
//! ])
//! .with_xml_map_key("blob");
//!
//! let extractor = XmlExtractor::from_config(&config).unwrap();
//! let xml = "<Customers>\
//!     <Customer><ContactName>Maria</ContactName><Phone>(030) 0074321</Phone></Customer>\
//!     <Customer><ContactName>Ana</ContactName><Phone>(5) 555-4729</Phone></Customer>\
//! </Customers>";
//!
//! let output = extractor.transform(xml).unwrap();
//! let json = serde_json::to_value(&output).unwrap();
//! assert_eq!(json["ContactName"], serde_json::json!(["Maria", "Ana"]));
//! assert_eq!(json["AreaCode"], serde_json::json!(["(030)", "(5)"]));
//! ```

// Core modules
pub mod document;
pub mod extraction;
pub mod postprocess;
pub mod serialization;

// Record envelope and host-facing transform
pub mod record;

// Configuration and extraction pipeline
pub mod runtime;

// Re-export key types
pub use document::{parse_xml, Node, ParseError};
pub use extraction::{navigate, Delimiter, Extractor, PathSpec};
pub use postprocess::{post_process, ExtractPattern, FilterPattern};
pub use record::{Record, RecordSlot, XmlToJson};
pub use runtime::{
    xml_to_map, ConfigError, OutputMap, TransformConfig, TransformError, XmlExtractor,
};

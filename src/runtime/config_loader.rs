//! Transform configuration loader.
//!
//! The configuration can come from a YAML file or from the flat string
//! properties a host runtime hands over at setup time. Property names match
//! in both cases:
//!
//! ```yaml
//! transform:
//!   keys:
//!     - Customers.Customer.ContactName<ContactName>
//!     - Customers.Customer.Phone<Phone><\d{3}.*><\d{3}>
//!   keys.delimiter.regex: '\.'
//!   xml.map.key: blob
//! ```

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::extraction::{Delimiter, DEFAULT_DELIMITER};

/// Property holding the path expressions
pub const KEYS_CONFIG: &str = "keys";
/// Property holding the lookup path delimiter regex
pub const DELIMITER_CONFIG: &str = "keys.delimiter.regex";
/// Property holding the output key for the original XML
pub const XML_MAP_KEY_CONFIG: &str = "xml.map.key";

/// Output key for the original XML when none is configured
pub const DEFAULT_XML_MAP_KEY: &str = "_xml_data_";

/// Error type for configuration loading
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Yaml(serde_yaml::Error),
    MissingField(&'static str),
    InvalidDelimiter { pattern: String, reason: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "Failed to read config file: {}", e),
            ConfigError::Yaml(e) => write!(f, "Failed to parse YAML: {}", e),
            ConfigError::MissingField(field) => write!(f, "Config missing '{}' field", field),
            ConfigError::InvalidDelimiter { pattern, reason } => {
                write!(f, "Invalid delimiter regex '{}': {}", pattern, reason)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err)
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::Yaml(err)
    }
}

fn default_delimiter() -> String {
    DEFAULT_DELIMITER.to_string()
}

fn default_xml_map_key() -> String {
    DEFAULT_XML_MAP_KEY.to_string()
}

/// Configuration for one XML transform instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformConfig {
    /// Path expressions, evaluated in order
    pub keys: Vec<String>,

    /// Regex splitting lookup paths into field names
    #[serde(rename = "keys.delimiter.regex", default = "default_delimiter")]
    pub delimiter: String,

    /// Output key for the original XML payload
    #[serde(rename = "xml.map.key", default = "default_xml_map_key")]
    pub xml_map_key: String,
}

impl TransformConfig {
    /// Create a configuration with default delimiter and XML key.
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
            delimiter: default_delimiter(),
            xml_map_key: default_xml_map_key(),
        }
    }

    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    pub fn with_xml_map_key(mut self, key: impl Into<String>) -> Self {
        self.xml_map_key = key.into();
        self
    }

    /// Load configuration from a YAML file.
    ///
    /// The settings may sit at the top level or under a `transform` key.
    ///
    /// # Errors
    /// Returns error if the file can't be read, isn't valid YAML, lacks
    /// `keys`, or has a delimiter that isn't a valid regex.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&contents)
    }

    /// Parse configuration from YAML text.
    pub fn from_yaml_str(contents: &str) -> Result<Self, ConfigError> {
        let yaml: serde_yaml::Value = serde_yaml::from_str(contents)?;

        let section = yaml.get("transform").unwrap_or(&yaml);
        if section.get(KEYS_CONFIG).is_none() {
            return Err(ConfigError::MissingField(KEYS_CONFIG));
        }

        let config: TransformConfig = serde_yaml::from_value(section.clone())?;
        config.validate()?;
        Ok(config)
    }

    /// Build configuration from host properties.
    ///
    /// `keys` is a comma-separated list with entries trimmed. A blank value
    /// means no keys; empty entries between commas are kept and produce an
    /// empty-mapping entry under the `""` output id.
    ///
    /// # Example
    /// ```
    /// use std::collections::HashMap;
    /// use xmlsift::TransformConfig;
    ///
    /// let mut props = HashMap::new();
    /// props.insert("keys".to_string(), "a.b<ab>, a.c".to_string());
    /// props.insert("xml.map.key".to_string(), "blob".to_string());
    ///
    /// let config = TransformConfig::from_props(&props).unwrap();
    /// assert_eq!(config.keys, vec!["a.b<ab>", "a.c"]);
    /// assert_eq!(config.xml_map_key, "blob");
    /// ```
    pub fn from_props(props: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let keys = props
            .get(KEYS_CONFIG)
            .ok_or(ConfigError::MissingField(KEYS_CONFIG))?
            .trim();
        let keys = if keys.is_empty() {
            Vec::new()
        } else {
            keys.split(',').map(|key| key.trim().to_string()).collect()
        };

        let config = Self {
            keys,
            delimiter: props
                .get(DELIMITER_CONFIG)
                .cloned()
                .unwrap_or_else(default_delimiter),
            xml_map_key: props
                .get(XML_MAP_KEY_CONFIG)
                .cloned()
                .unwrap_or_else(default_xml_map_key),
        };
        config.validate()?;
        Ok(config)
    }

    /// Compile the delimiter regex.
    pub fn compile_delimiter(&self) -> Result<Delimiter, ConfigError> {
        Delimiter::new(&self.delimiter).map_err(|e| ConfigError::InvalidDelimiter {
            pattern: self.delimiter.clone(),
            reason: e.to_string(),
        })
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.compile_delimiter().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_new_uses_defaults() {
        let config = TransformConfig::new(["a.b"]);

        assert_eq!(config.keys, vec!["a.b"]);
        assert_eq!(config.delimiter, "\\.");
        assert_eq!(config.xml_map_key, "_xml_data_");
    }

    #[test]
    fn test_from_yaml_nested() {
        let yaml = r#"
transform:
  keys:
    - Customers.Customer.ContactName<ContactName>
    - Customers.Customer.ContactTitle
  keys.delimiter.regex: '/'
  xml.map.key: blob
"#;
        let config = TransformConfig::from_yaml_str(yaml).unwrap();

        assert_eq!(config.keys.len(), 2);
        assert_eq!(config.delimiter, "/");
        assert_eq!(config.xml_map_key, "blob");
    }

    #[test]
    fn test_from_yaml_top_level_defaults() {
        let config = TransformConfig::from_yaml_str("keys: [a.b]").unwrap();

        assert_eq!(config.keys, vec!["a.b"]);
        assert_eq!(config.delimiter, DEFAULT_DELIMITER);
        assert_eq!(config.xml_map_key, DEFAULT_XML_MAP_KEY);
    }

    #[test]
    fn test_missing_keys() {
        let result = TransformConfig::from_yaml_str("xml.map.key: blob");
        assert!(matches!(result, Err(ConfigError::MissingField("keys"))));

        let result = TransformConfig::from_props(&HashMap::new());
        assert!(matches!(result, Err(ConfigError::MissingField("keys"))));
    }

    #[test]
    fn test_invalid_delimiter() {
        let mut props = HashMap::new();
        props.insert("keys".to_string(), "a".to_string());
        props.insert("keys.delimiter.regex".to_string(), "(".to_string());

        let err = TransformConfig::from_props(&props).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidDelimiter { .. }));
        assert!(err.to_string().contains("Invalid delimiter regex '('"));
    }

    #[test]
    fn test_from_props_splits_keys() {
        let mut props = HashMap::new();
        props.insert("keys".to_string(), " a.b<x> ,, c.d ".to_string());
        props.insert("keys.delimiter.regex".to_string(), "\\.".to_string());

        let config = TransformConfig::from_props(&props).unwrap();

        assert_eq!(config.keys, vec!["a.b<x>", "", "c.d"]);
        assert_eq!(config.xml_map_key, "_xml_data_");
    }

    #[test]
    fn test_from_props_blank_keys() {
        let mut props = HashMap::new();
        props.insert("keys".to_string(), "   ".to_string());

        let config = TransformConfig::from_props(&props).unwrap();
        assert!(config.keys.is_empty());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "keys:\n  - a.b<ab>\nxml.map.key: raw").unwrap();

        let config = TransformConfig::load_from_file(file.path()).unwrap();

        assert_eq!(config.keys, vec!["a.b<ab>"]);
        assert_eq!(config.xml_map_key, "raw");
    }

    #[test]
    fn test_load_missing_file() {
        let result = TransformConfig::load_from_file("/nonexistent/xmlsift.yaml");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}

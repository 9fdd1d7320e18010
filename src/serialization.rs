//! JSON serialization of output maps.

use serde::Serialize;
use std::io::Write;

use crate::runtime::pipeline::OutputMap;

/// Error type for serialization operations
#[derive(Debug)]
pub enum SerializationError {
    JsonError(serde_json::Error),
    IoError(std::io::Error),
}

impl From<serde_json::Error> for SerializationError {
    fn from(err: serde_json::Error) -> Self {
        SerializationError::JsonError(err)
    }
}

impl From<std::io::Error> for SerializationError {
    fn from(err: std::io::Error) -> Self {
        SerializationError::IoError(err)
    }
}

impl std::fmt::Display for SerializationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SerializationError::JsonError(e) => write!(f, "JSON error: {}", e),
            SerializationError::IoError(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for SerializationError {}

/// Convert an output map into a JSON object, keeping key order.
pub fn to_json_object(
    output: OutputMap,
) -> Result<serde_json::Map<String, serde_json::Value>, SerializationError> {
    output
        .into_iter()
        .map(|(key, node)| -> Result<_, SerializationError> {
            Ok((key, serde_json::to_value(node)?))
        })
        .collect()
}

/// NDJSON writer, one output map per line
pub struct NdjsonWriter<W: Write> {
    writer: W,
}

impl<W: Write> NdjsonWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn write<T: Serialize>(&mut self, output: &T) -> Result<(), SerializationError> {
        let json = serde_json::to_string(output)?;
        writeln!(self.writer, "{}", json)?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), SerializationError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// JSON array writer, optionally pretty-printed
pub struct JsonArrayWriter<W: Write> {
    writer: W,
    first: bool,
    pretty: bool,
}

impl<W: Write> JsonArrayWriter<W> {
    /// Create a new JSON array writer and write the opening bracket
    pub fn new(mut writer: W, pretty: bool) -> Result<Self, SerializationError> {
        write!(writer, "[")?;
        Ok(Self {
            writer,
            first: true,
            pretty,
        })
    }

    pub fn write<T: Serialize>(&mut self, output: &T) -> Result<(), SerializationError> {
        if !self.first {
            write!(self.writer, ",")?;
        }
        self.first = false;

        let json = if self.pretty {
            serde_json::to_string_pretty(output)?
        } else {
            serde_json::to_string(output)?
        };
        if self.pretty {
            write!(self.writer, "\n{}", json)?;
        } else {
            write!(self.writer, "{}", json)?;
        }
        Ok(())
    }

    /// Finish writing the array and close the bracket
    pub fn finish(mut self) -> Result<(), SerializationError> {
        if self.pretty && !self.first {
            writeln!(self.writer)?;
        }
        write!(self.writer, "]")?;
        self.writer.flush()?;
        Ok(())
    }
}

//! Error types for merging 3MF packages
//!
//! Every error carries a code for categorization, and every variant maps onto
//! one of three [`ErrorCategory`] values so callers can decide how to report a
//! failure without matching on individual variants.
//!
//! # Error Codes
//!
//! Error codes follow the pattern: `E<category><number>`
//!
//! Categories:
//! - **E1xxx**: I/O and archive errors
//! - **E2xxx**: XML parsing, structure and writing errors
//! - **E3xxx**: Model and geometry errors
//! - **E5xxx**: Merge configuration errors
//!
//! ## Common Error Codes
//!
//! - `E1001`: I/O error reading or writing a file
//! - `E1002`: ZIP archive format error
//! - `E1003`: Missing required file in archive
//! - `E2001`: XML parsing error
//! - `E2002`: XML attribute error
//! - `E2003`: Invalid XML structure
//! - `E2004`: Invalid 3MF format
//! - `E2005`: XML writing error
//! - `E3001`: Invalid model structure
//! - `E3002`: Numeric parse error
//! - `E3003`: Geometry error (empty or non-finite mesh data)
//! - `E5001`: Invalid merge configuration

use std::io;
use thiserror::Error;

/// Result type for merge operations
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// A source package could not be read or does not contain usable geometry
    Input,
    /// The merge description itself is invalid
    Configuration,
    /// Writing the output failed
    Io,
}

/// Errors that can occur while reading, merging or writing 3MF packages
#[derive(Error, Debug)]
pub enum Error {
    /// IO error occurred while reading or writing a file
    ///
    /// **Error Code**: E1001
    ///
    /// **Common Causes**:
    /// - Source file not found
    /// - Output directory not writable
    /// - Disk full
    #[error("[E1001] I/O error: {0}")]
    Io(#[from] io::Error),

    /// ZIP archive error
    ///
    /// **Error Code**: E1002
    ///
    /// **Common Causes**:
    /// - Corrupted ZIP file
    /// - Unsupported compression method
    /// - Truncated archive
    ///
    /// **Suggestions**:
    /// - Verify the file is a valid 3MF (ZIP) archive
    /// - Try re-exporting the source part
    #[error("[E1002] ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// XML parsing error
    ///
    /// **Error Code**: E2001
    #[error("[E2001] XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// XML attribute error
    ///
    /// **Error Code**: E2002
    ///
    /// **Common Causes**:
    /// - Malformed attribute syntax
    /// - Invalid escape sequence in an attribute value
    #[error("[E2002] XML attribute error: {0}")]
    XmlAttr(String),

    /// Missing required file in the 3MF archive
    ///
    /// **Error Code**: E1003
    ///
    /// **Suggestions**:
    /// - Ensure the archive contains 3D/3dmodel.model
    #[error("[E1003] Missing required file: {0}")]
    MissingFile(String),

    /// Invalid 3MF format
    ///
    /// **Error Code**: E2004
    #[error("[E2004] Invalid 3MF format: {0}")]
    InvalidFormat(String),

    /// Invalid XML structure
    ///
    /// **Error Code**: E2003
    ///
    /// **Common Causes**:
    /// - Missing required XML elements or attributes
    /// - Invalid element nesting
    #[error("[E2003] Invalid XML structure: {0}")]
    InvalidXml(String),

    /// Invalid model structure
    ///
    /// **Error Code**: E3001
    ///
    /// **Common Causes**:
    /// - Source package has no mesh object
    /// - Triangle references a vertex that does not exist
    #[error("[E3001] Invalid model: {0}")]
    InvalidModel(String),

    /// Parse error for numeric values
    ///
    /// **Error Code**: E3002
    ///
    /// **Suggestions**:
    /// - Verify numeric values use proper format (e.g., "1.5" not "1,5")
    #[error("[E3002] Parse error: {0}")]
    ParseError(String),

    /// Geometry could not be computed
    ///
    /// **Error Code**: E3003
    ///
    /// **Common Causes**:
    /// - Mesh without vertices
    /// - NaN or infinite coordinates
    #[error("[E3003] Geometry error: {0}")]
    Geometry(String),

    /// XML writing error
    ///
    /// **Error Code**: E2005
    ///
    /// **Common Causes**:
    /// - Output stream not writable
    /// - Archive entry could not be started
    #[error("[E2005] XML writing error: {0}")]
    XmlWrite(String),

    /// Invalid merge configuration
    ///
    /// **Error Code**: E5001
    ///
    /// **Common Causes**:
    /// - Filament slot outside 0..=4
    /// - Object without parts or without a name
    /// - Negative margin or non-positive plate width
    #[error("[E5001] Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<std::num::ParseFloatError> for Error {
    fn from(err: std::num::ParseFloatError) -> Self {
        Error::ParseError(format!("Failed to parse floating-point number: {}", err))
    }
}

impl From<std::num::ParseIntError> for Error {
    fn from(err: std::num::ParseIntError) -> Self {
        Error::ParseError(format!("Failed to parse integer: {}", err))
    }
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Error::XmlAttr(format!("Attribute parsing failed: {}", err))
    }
}

impl From<quick_xml::escape::EscapeError> for Error {
    fn from(err: quick_xml::escape::EscapeError) -> Self {
        Error::XmlAttr(format!("Attribute unescaping failed: {}", err))
    }
}

impl Error {
    /// Category of this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Io(_) | Error::XmlWrite(_) => ErrorCategory::Io,
            Error::InvalidConfig(_) => ErrorCategory::Configuration,
            Error::Zip(_)
            | Error::Xml(_)
            | Error::XmlAttr(_)
            | Error::MissingFile(_)
            | Error::InvalidFormat(_)
            | Error::InvalidXml(_)
            | Error::InvalidModel(_)
            | Error::ParseError(_)
            | Error::Geometry(_) => ErrorCategory::Input,
        }
    }

    /// Create an InvalidXml error with element context
    ///
    /// # Example
    /// ```ignore
    /// Error::invalid_xml_element("vertex", "Missing required 'x' attribute")
    /// ```
    pub fn invalid_xml_element(element: &str, message: &str) -> Self {
        Error::InvalidXml(format!("Element '<{}>': {}", element, message))
    }

    /// Create an InvalidXml error for a missing required attribute
    pub fn missing_attribute(element: &str, attribute: &str) -> Self {
        Error::InvalidXml(format!(
            "Element '<{}>' is missing required attribute '{}'.",
            element, attribute
        ))
    }

    /// Create a ParseError with context about what was being parsed
    ///
    /// # Arguments
    /// * `field_name` - The name of the field being parsed (e.g., "vertex x coordinate")
    /// * `value` - The value that failed to parse
    /// * `expected_type` - The expected type (e.g., "floating-point number")
    pub fn parse_error_with_context(field_name: &str, value: &str, expected_type: &str) -> Self {
        Error::ParseError(format!(
            "Failed to parse '{}': expected {}, got '{}'. \
             Verify the value is properly formatted.",
            field_name, expected_type, value
        ))
    }

    /// Create an XmlWrite error
    pub fn xml_write(message: String) -> Self {
        Error::XmlWrite(message)
    }

    /// Create a Geometry error
    pub fn geometry(message: impl Into<String>) -> Self {
        Error::Geometry(message.into())
    }

    /// Create an InvalidConfig error prefixed with the offending location
    ///
    /// # Example
    /// ```ignore
    /// Error::invalid_config("plates[0].objects[1]", "object has no parts")
    /// ```
    pub fn invalid_config(location: &str, message: &str) -> Self {
        Error::InvalidConfig(format!("{}: {}", location, message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_in_messages() {
        let io_err = Error::Io(io::Error::new(io::ErrorKind::NotFound, "test"));
        assert!(io_err.to_string().contains("[E1001]"));

        let missing_file = Error::MissingFile("3D/3dmodel.model".to_string());
        assert!(missing_file.to_string().contains("[E1003]"));

        let invalid_model = Error::InvalidModel("test error".to_string());
        assert!(invalid_model.to_string().contains("[E3001]"));

        let geometry = Error::geometry("mesh has no vertices");
        assert!(geometry.to_string().contains("[E3003]"));

        let config = Error::invalid_config("plates[0]", "no objects");
        assert!(config.to_string().contains("[E5001]"));
        assert!(config.to_string().contains("plates[0]: no objects"));
    }

    #[test]
    fn test_categories() {
        assert_eq!(
            Error::Io(io::Error::other("disk")).category(),
            ErrorCategory::Io
        );
        assert_eq!(
            Error::xml_write("entry".to_string()).category(),
            ErrorCategory::Io
        );
        assert_eq!(
            Error::invalid_config("margin", "negative").category(),
            ErrorCategory::Configuration
        );
        assert_eq!(
            Error::MissingFile("3D/3dmodel.model".to_string()).category(),
            ErrorCategory::Input
        );
        assert_eq!(Error::geometry("nan").category(), ErrorCategory::Input);
    }

    #[test]
    fn test_missing_attribute_helper() {
        let err = Error::missing_attribute("object", "id");
        assert!(err.to_string().contains("Element '<object>'"));
        assert!(err.to_string().contains("missing required attribute 'id'"));
        assert!(err.to_string().contains("[E2003]"));
    }

    #[test]
    fn test_parse_error_with_context_helper() {
        let err =
            Error::parse_error_with_context("vertex x coordinate", "abc", "floating-point number");
        assert!(err.to_string().contains("vertex x coordinate"));
        assert!(err.to_string().contains("'abc'"));
        assert!(err.to_string().contains("[E3002]"));
    }

    #[test]
    fn test_parse_float_error_conversion() {
        let parse_err: std::num::ParseFloatError = "not_a_number".parse::<f64>().unwrap_err();
        let err = Error::from(parse_err);
        assert!(err
            .to_string()
            .contains("Failed to parse floating-point number"));
        assert_eq!(err.category(), ErrorCategory::Input);
    }
}

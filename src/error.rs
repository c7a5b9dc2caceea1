//! Error types for mapper construction.
//!
//! Every variant is a configuration-time failure. Once a
//! [`ResponseMappers`](crate::ResponseMappers) list has been built it is
//! plain data and has no runtime failure mode.

use std::fmt;

/// Every failure the mapper layer can produce while loading configuration or
/// building response artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapperError {
    /// The configuration file could not be loaded, parsed, or validated.
    Config(String),
    /// A rule declared a status code outside `100..=599`.
    InvalidStatus {
        /// The offending status code as declared.
        status: u16,
    },
    /// A response flag selector carried an empty flag string.
    EmptyFlag,
    /// A response flag selector named a flag the proxy does not emit.
    UnknownFlag(String),
    /// Two single-flag rules claimed the same response flag.
    DuplicateFlag(String),
    /// A composite selector does not have the required sub-selectors.
    CompositeShape(String),
    /// An artifact or mapper list could not be serialized.
    Serialize(String),
}

impl fmt::Display for MapperError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "configuration error: {msg}"),
            Self::InvalidStatus { status } => {
                write!(f, "status code {status} is outside 100..=599")
            }
            Self::EmptyFlag => f.write_str("response flag must not be empty"),
            Self::UnknownFlag(flag) => write!(f, "unknown response flag: {flag}"),
            Self::DuplicateFlag(flag) => {
                write!(f, "response flag {flag} is claimed by more than one rule")
            }
            Self::CompositeShape(msg) => write!(f, "malformed composite selector: {msg}"),
            Self::Serialize(msg) => write!(f, "serialization error: {msg}"),
        }
    }
}

impl std::error::Error for MapperError {}

impl From<serde_json::Error> for MapperError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialize(err.to_string())
    }
}

impl From<serde_yaml::Error> for MapperError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Serialize(err.to_string())
    }
}

impl From<hyper::http::Error> for MapperError {
    fn from(err: hyper::http::Error) -> Self {
        Self::Serialize(err.to_string())
    }
}

impl From<regex::Error> for MapperError {
    fn from(err: regex::Error) -> Self {
        Self::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_offending_value() {
        assert_eq!(
            MapperError::InvalidStatus { status: 0 }.to_string(),
            "status code 0 is outside 100..=599"
        );
        assert_eq!(
            MapperError::DuplicateFlag("UF".into()).to_string(),
            "response flag UF is claimed by more than one rule"
        );
        assert_eq!(
            MapperError::UnknownFlag("XX".into()).to_string(),
            "unknown response flag: XX"
        );
    }

    #[test]
    fn json_errors_convert_to_serialize_variant() {
        let err = serde_json::from_str::<u32>("not json").unwrap_err();
        assert!(matches!(MapperError::from(err), MapperError::Serialize(_)));
    }
}

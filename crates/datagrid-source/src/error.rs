//! Error types for the source crate.

use thiserror::Error;

/// Errors raised by data source drivers and bindings.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The underlying source could not be reached or read: connection
    /// failure, malformed query, unparsable document.
    #[error("{driver} source unavailable: {reason}")]
    Unavailable {
        driver: &'static str,
        reason: String,
    },

    /// A sort, filter or field selection names a field the source does not
    /// expose.
    #[error("{driver} source has no field '{field}'")]
    InvalidField {
        driver: &'static str,
        field: String,
    },
}

impl SourceError {
    pub fn unavailable(driver: &'static str, reason: impl ToString) -> Self {
        SourceError::Unavailable {
            driver,
            reason: reason.to_string(),
        }
    }

    pub fn invalid_field(driver: &'static str, field: impl Into<String>) -> Self {
        SourceError::InvalidField {
            driver,
            field: field.into(),
        }
    }

    /// Name of the driver that raised the error.
    pub fn driver(&self) -> &'static str {
        match self {
            SourceError::Unavailable { driver, .. } | SourceError::InvalidField { driver, .. } => {
                driver
            }
        }
    }

    pub fn is_invalid_field(&self) -> bool {
        matches!(self, SourceError::InvalidField { .. })
    }
}

impl From<rusqlite::Error> for SourceError {
    fn from(err: rusqlite::Error) -> Self {
        SourceError::unavailable("sql", err)
    }
}

impl From<quick_xml::Error> for SourceError {
    fn from(err: quick_xml::Error) -> Self {
        SourceError::unavailable("xml", err)
    }
}

/// Result type for source operations.
pub type Result<T> = std::result::Result<T, SourceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_driver_and_field() {
        let err = SourceError::invalid_field("array", "nickname");
        assert_eq!(err.to_string(), "array source has no field 'nickname'");
        assert_eq!(err.driver(), "array");
        assert!(err.is_invalid_field());
    }

    #[test]
    fn from_rusqlite_is_unavailable() {
        let err: SourceError = rusqlite::Error::InvalidQuery.into();
        assert!(matches!(err, SourceError::Unavailable { driver: "sql", .. }));
    }
}

//! Error handling for Erawan WMS
//!
//! Every operation either completes or fails with an `AppError` before touching
//! state. Store failures are the exception: they surface after the in-memory
//! change has been made.

use erawan_shared::StoreroomId;
use serde::Serialize;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation error: {message}")]
    Validation { field: String, message: String },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Business logic errors
    #[error(
        "Insufficient stock for {product} in storeroom {storeroom}: requested {requested}, available {available}"
    )]
    InsufficientStock {
        product: String,
        storeroom: StoreroomId,
        requested: i64,
        available: i64,
    },

    // Persistence errors
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Corrupt stored data: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Import failed: {0}")]
    Import(String),

    #[error("Configuration error: {0}")]
    Configuration(#[from] config::ConfigError),
}

impl AppError {
    /// Field-level validation failure
    pub fn invalid(field: &str, message: &str) -> Self {
        AppError::Validation {
            field: field.to_string(),
            message: message.to_string(),
        }
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation { .. } | AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::DuplicateEntry(_) => "DUPLICATE_ENTRY",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            AppError::Storage(_) => "STORAGE_ERROR",
            AppError::Serialization(_) => "CORRUPT_DATA",
            AppError::Import(_) => "IMPORT_ERROR",
            AppError::Configuration(_) => "CONFIGURATION_ERROR",
        }
    }

    pub fn detail(&self) -> ErrorDetail {
        let field = match self {
            AppError::Validation { field, .. } => Some(field.clone()),
            AppError::DuplicateEntry(field) => Some(field.clone()),
            _ => None,
        };
        ErrorDetail {
            code: self.code().to_string(),
            message: self.to_string(),
            field,
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let first = errors
            .field_errors()
            .into_iter()
            .min_by_key(|(field, _)| *field)
            .and_then(|(field, list)| list.first().map(|e| (field, e.clone())));

        match first {
            Some((field, error)) => AppError::Validation {
                field: field.to_string(),
                message: error
                    .message
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{} is invalid ({})", field, error.code)),
            },
            None => AppError::ValidationError(errors.to_string()),
        }
    }
}

/// Error payload handed across the WebAssembly boundary
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

/// Result type alias for engine operations
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Probe {
        #[validate(length(min = 1, message = "Name is required"))]
        name: String,
        #[validate(range(min = 1))]
        box_size: u32,
    }

    #[test]
    fn test_validator_errors_pick_first_field() {
        let probe = Probe {
            name: String::new(),
            box_size: 0,
        };
        let err: AppError = probe.validate().unwrap_err().into();
        match err {
            AppError::Validation { field, message } => {
                assert_eq!(field, "box_size");
                assert!(message.contains("box_size"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_codes_and_detail() {
        let err = AppError::InsufficientStock {
            product: "Cola".into(),
            storeroom: StoreroomId::MAIN,
            requested: 5,
            available: 2,
        };
        let detail = err.detail();
        assert_eq!(detail.code, "INSUFFICIENT_STOCK");
        assert!(detail.message.contains("requested 5, available 2"));
        assert_eq!(detail.field, None);

        let dup = AppError::DuplicateEntry("name".into());
        assert_eq!(dup.detail().field.as_deref(), Some("name"));
    }
}

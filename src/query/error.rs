//! Query compilation errors.

use thiserror::Error;

use crate::error::AppError;

/// Everything that can be wrong with a list request before it reaches storage.
///
/// All variants are client errors; they surface as `400 Bad Request`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("operator object for '{path}' names no operator")]
    EmptyOperator { path: String },

    #[error("'like' cannot be combined with 'gte' or 'lte' on '{path}'")]
    ConflictingOperators { path: String },

    #[error("'{path}' is given both as a value and as an operator or nested filter")]
    MixedForms { path: String },

    #[error("field path '{path}' has an empty segment")]
    EmptyPath { path: String },

    #[error("invalid sort direction '{0}', expected 'asc' or 'desc'")]
    InvalidDirection(String),

    #[error("field '{0}' cannot be used for ordering")]
    NotOrderable(String),

    #[error("unknown query parameter '{0}'")]
    UnknownParameter(String),

    #[error("query parameter '{0}' is given more than once")]
    DuplicateParameter(String),

    #[error("invalid value for '{parameter}': {reason}")]
    InvalidValue { parameter: String, reason: String },
}

impl QueryError {
    /// The parameter or field path the error is about
    pub fn field(&self) -> &str {
        match self {
            QueryError::EmptyOperator { path }
            | QueryError::ConflictingOperators { path }
            | QueryError::MixedForms { path }
            | QueryError::EmptyPath { path } => path,
            QueryError::InvalidDirection(_) => "order",
            QueryError::NotOrderable(_) => "orderBy",
            QueryError::UnknownParameter(name) | QueryError::DuplicateParameter(name) => name,
            QueryError::InvalidValue { parameter, .. } => parameter,
        }
    }
}

impl From<QueryError> for AppError {
    fn from(error: QueryError) -> Self {
        AppError::Validation {
            field: error.field().to_string(),
            reason: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_parameter_names_the_parameter() {
        let error = QueryError::UnknownParameter("filter.secret".to_string());
        match AppError::from(error) {
            AppError::Validation { field, reason } => {
                assert_eq!(field, "filter.secret");
                assert!(reason.contains("filter.secret"));
            }
            other => panic!("Expected Validation error, got: {:?}", other),
        }
    }

    #[test]
    fn test_order_errors_point_at_order_parameters() {
        assert_eq!(QueryError::InvalidDirection("up".into()).field(), "order");
        assert_eq!(QueryError::NotOrderable("password".into()).field(), "orderBy");
    }
}

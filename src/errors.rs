//! # Error Handling
//!
//! Two error types live here:
//! - [`QueryError`]: a filter, sort, or page request could not be compiled.
//!   These are caller mistakes and render as `400 Bad Request`.
//! - [`PaginateError`]: wraps a [`QueryError`] or a failure from the backing
//!   store. Store failures render as `500` with a sanitized message; the
//!   underlying error is logged through `tracing` and never sent to clients.
//!
//! ```rust,ignore
//! async fn list_users(
//!     State(db): State<DatabaseConnection>,
//!     Json(option): Json<PageOption>,
//! ) -> Result<Json<Page<serde_json::Value>>, PaginateError<DbErr>> {
//!     Ok(Json(querypage::paginate(&db, "users", &option, None).await?))
//! }
//! ```

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::fmt;

use crate::filtering::Operator;

/// Order literals accepted in sort tokens.
pub(crate) const SORT_ORDERS: [&str; 4] = ["desc", "asc", "DESC", "ASC"];

/// A request that cannot be compiled into a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// A filter token did not split into `field<operator>value` around exactly one operator
    InvalidFilterFormat {
        /// The offending token
        filter: String,
    },

    /// A sort token was not `field=order` with a recognised order literal
    InvalidSortFormat {
        /// The offending token
        sort: String,
    },

    /// Tokens grouped under one relation prefix disagree on that prefix
    MismatchedRelationPrefix {
        /// Prefix taken from the first token of the group
        expected: String,
        /// Field path of the token that did not match
        found: String,
    },

    /// `page` or `size` is out of range
    InvalidPageRequest {
        /// User-facing error message
        message: String,
    },

    /// The compiled query is well formed but the store cannot evaluate it,
    /// e.g. a relation filter or a `null` range bound sent to the SQL store
    UnsupportedQuery {
        /// User-facing error message
        message: String,
    },
}

impl QueryError {
    pub fn invalid_filter(filter: impl Into<String>) -> Self {
        Self::InvalidFilterFormat {
            filter: filter.into(),
        }
    }

    pub fn invalid_sort(sort: impl Into<String>) -> Self {
        Self::InvalidSortFormat { sort: sort.into() }
    }

    pub fn mismatched_prefix(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::MismatchedRelationPrefix {
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub fn invalid_page(message: impl Into<String>) -> Self {
        Self::InvalidPageRequest {
            message: message.into(),
        }
    }

    pub fn unsupported_query(message: impl Into<String>) -> Self {
        Self::UnsupportedQuery {
            message: message.into(),
        }
    }

    /// Get the user-facing error message
    fn user_message(&self) -> String {
        match self {
            Self::InvalidFilterFormat { filter } => format!(
                "Invalid filter format '{filter}': expected 'field<operator>value'. Operators available {}",
                Operator::ALL.map(Operator::symbol).join(",")
            ),
            Self::InvalidSortFormat { sort } => format!(
                "Invalid sort format '{sort}': expected \"field=order\". Values available {}",
                SORT_ORDERS.join(",")
            ),
            Self::MismatchedRelationPrefix { expected, found } => format!(
                "Invalid nested filter '{found}': expected relation prefix '{expected}'"
            ),
            Self::InvalidPageRequest { message } | Self::UnsupportedQuery { message } => {
                message.clone()
            }
        }
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.user_message())
    }
}

impl std::error::Error for QueryError {}

/// Failure of a paginated query, generic over the store's error type.
#[derive(Debug)]
pub enum PaginateError<E> {
    /// The request could not be compiled
    Query(QueryError),
    /// The backing store failed (details logged, not exposed)
    Store(E),
}

impl<E> From<QueryError> for PaginateError<E> {
    fn from(err: QueryError) -> Self {
        Self::Query(err)
    }
}

impl<E: fmt::Display> fmt::Display for PaginateError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Query(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "store error: {err}"),
        }
    }
}

impl<E: fmt::Debug + fmt::Display> std::error::Error for PaginateError<E> {}

/// Error response sent to users (sanitized)
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for QueryError {
    fn into_response(self) -> Response {
        tracing::debug!(error = %self, "Rejected query request");
        let body = ErrorResponse {
            error: self.user_message(),
        };
        (StatusCode::BAD_REQUEST, Json(body)).into_response()
    }
}

impl<E: fmt::Display> IntoResponse for PaginateError<E> {
    fn into_response(self) -> Response {
        match self {
            Self::Query(err) => err.into_response(),
            Self::Store(err) => {
                tracing::error!(error = %err, "Store error occurred");
                let body = ErrorResponse {
                    error: "A database error occurred".to_string(),
                };
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_filter_message_lists_operators() {
        let err = QueryError::invalid_filter("age18");
        let message = err.to_string();
        assert!(message.contains("age18"));
        assert!(message.contains("==,!=,<=,>=,<<,>>,[]"));
    }

    #[test]
    fn test_invalid_sort_message_lists_orders() {
        let err = QueryError::invalid_sort("age=ascending");
        assert!(err.to_string().contains("desc,asc,DESC,ASC"));
    }

    #[test]
    fn test_query_error_is_bad_request() {
        let response = QueryError::invalid_filter("x").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_unsupported_query_is_bad_request() {
        let err = QueryError::unsupported_query("relation filter on 'addr' is not supported");
        assert_eq!(err.to_string(), "relation filter on 'addr' is not supported");
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_store_error_is_sanitized_500() {
        let err: PaginateError<String> = PaginateError::Store("connection refused".to_string());
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_query_error_converts_into_paginate_error() {
        let err: PaginateError<String> = QueryError::invalid_sort("x").into();
        assert!(matches!(err, PaginateError::Query(QueryError::InvalidSortFormat { .. })));
    }

    #[test]
    fn test_error_trait() {
        let err = QueryError::invalid_page("page must be at least 1");
        let _: &dyn std::error::Error = &err;
        assert_eq!(err.to_string(), "page must be at least 1");
    }
}

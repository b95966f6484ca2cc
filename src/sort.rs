use serde::{Serialize, Serializer, ser::SerializeMap};
use serde_json::{Map, Value};
use std::fmt;

use crate::errors::{QueryError, SORT_ORDERS};
use crate::filtering::dedupe;

/// Sort direction, always lowercase once parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for SortOrder {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One ordering entry, serialized as `{ "<field>": "<order>" }`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub field: String,
    pub order: SortOrder,
}

impl SortSpec {
    /// The `{ "<field>": "<order>" }` object used in `orderBy`
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut entry = Map::new();
        entry.insert(self.field.clone(), Value::from(self.order.as_str()));
        Value::Object(entry)
    }
}

impl Serialize for SortSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.field, &self.order)?;
        map.end()
    }
}

/// Check a sort token against `field=order`.
///
/// The order must be exactly `asc`, `desc`, `ASC` or `DESC`; mixed case such
/// as `Asc` is rejected. The token splits at its first `=`, so a trailing
/// segment (`age=asc=x`) or an empty field (`=asc`) is an error rather than
/// being ignored.
///
/// # Errors
///
/// Returns [`QueryError::InvalidSortFormat`] when `=` is missing, the field is
/// empty, or the order literal is not recognised.
pub fn validate_sort(token: &str) -> Result<(), QueryError> {
    split_sort(token).map(|_| ())
}

fn split_sort(token: &str) -> Result<(&str, &str), QueryError> {
    match token.split_once('=') {
        Some((field, order)) if !field.is_empty() && SORT_ORDERS.contains(&order) => {
            Ok((field, order))
        }
        _ => Err(QueryError::invalid_sort(token)),
    }
}

/// Parse one sort token into a [`SortSpec`].
///
/// # Errors
///
/// Same conditions as [`validate_sort`].
pub fn parse_sort(token: &str) -> Result<SortSpec, QueryError> {
    let (field, order) = split_sort(token)?;
    let order = if order.eq_ignore_ascii_case("asc") {
        SortOrder::Asc
    } else {
        SortOrder::Desc
    };
    Ok(SortSpec {
        field: field.to_string(),
        order,
    })
}

/// Deduplicate and parse sort tokens, keeping their order of first appearance.
///
/// # Errors
///
/// Fails on the first invalid token.
pub fn parse_sorting<S: AsRef<str>>(tokens: &[S]) -> Result<Vec<SortSpec>, QueryError> {
    dedupe(tokens).into_iter().map(parse_sort).collect()
}

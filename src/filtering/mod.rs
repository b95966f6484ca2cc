//! # Filter Compilation
//!
//! Turns filter tokens such as `age>=18` into a [`WhereClause`] predicate tree
//! that a record store can evaluate.
//!
//! ## Grammar
//!
//! A token is `FIELD<OP>VALUE` with exactly one operator:
//!
//! | Token | Compiled |
//! |---|---|
//! | `name==John` | `{ "name": "John" }` |
//! | `age!=30` | `{ "age": { "NOT": 30 } }` |
//! | `age>>18` / `age>=18` | `{ "age": { "gt": 18 } }` / `{ "age": { "gte": 18 } }` |
//! | `age<<65` / `age<=65` | `{ "age": { "lt": 65 } }` / `{ "age": { "lte": 65 } }` |
//! | `id[]7` | `{ "id": { "in": 7 } }` |
//!
//! Values are coerced: `true`/`false` to booleans, numeric strings to
//! numbers, `null` to null, everything else stays a string.
//!
//! ## Combining
//!
//! Several tokens on one field are ANDed:
//!
//! ```rust
//! use querypage::filtering::{FilterMode, build_where_clause};
//!
//! let clause = build_where_clause(&["age>=18", "age<=65"], FilterMode::Flat).unwrap();
//! assert_eq!(
//!     serde_json::Value::from(clause),
//!     serde_json::json!({ "age": { "gte": 18, "lte": 65 } })
//! );
//! ```
//!
//! ## Nested Mode
//!
//! With [`FilterMode::Nested`], dotted fields traverse relations, and tokens
//! under the same relation prefix are ANDed inside it:
//!
//! ```rust
//! use querypage::filtering::{FilterMode, build_where_clause};
//!
//! let clause =
//!     build_where_clause(&["addr.city==NY", "addr.zip==10001"], FilterMode::Nested).unwrap();
//! assert_eq!(
//!     serde_json::Value::from(clause),
//!     serde_json::json!({ "addr": { "is": { "AND": [ { "city": "NY" }, { "zip": 10001 } ] } } })
//! );
//! ```
//!
//! The compiler never checks fields against a schema. When two code paths
//! produce the same top-level key, the later one wins and a warning is
//! logged through `tracing`.

pub mod combined;
pub mod grouping;
pub mod nested;
pub mod predicate;
pub mod token;

use std::collections::HashSet;

use crate::errors::QueryError;

pub use combined::compile_combined;
pub use grouping::{CombinedFilter, FilterGroups, group_filters};
pub use nested::expand_nested;
pub use predicate::{FieldCondition, Node, RelationBody, RelationFilter, WhereClause};
pub use token::{Operator, ParsedFilter, coerce_value, parse_field, parse_filter};

/// How dotted field paths are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterMode {
    /// Dots are literal key characters
    #[default]
    Flat,
    /// Dots separate relation segments
    Nested,
}

/// Drop repeated tokens, keeping the first occurrence of each.
pub(crate) fn dedupe<S: AsRef<str>>(tokens: &[S]) -> Vec<&str> {
    let mut seen = HashSet::new();
    tokens
        .iter()
        .map(AsRef::as_ref)
        .filter(|token| seen.insert(*token))
        .collect()
}

/// Compile filter tokens into a where-clause.
///
/// Combined groups are compiled first, then each simple token is assigned
/// under its own key (expanded into relation nodes in nested mode).
///
/// # Errors
///
/// Fails fast on the first malformed token ([`QueryError::InvalidFilterFormat`])
/// or inconsistent nested group ([`QueryError::MismatchedRelationPrefix`]).
pub fn build_where_clause<S: AsRef<str>>(
    tokens: &[S],
    mode: FilterMode,
) -> Result<WhereClause, QueryError> {
    let tokens = dedupe(tokens);
    let groups = group_filters(&tokens, mode)?;
    tracing::debug!(
        simple = ?groups.simple,
        combined = ?groups.combined,
        ?mode,
        "Grouped filters"
    );

    let mut clause = compile_combined(&groups.combined, mode)?;

    for token in &groups.simple {
        let parsed = parse_filter(token)?;
        let condition = FieldCondition::from_operator(parsed.operator, parsed.value);

        if mode == FilterMode::Nested && parsed.field.contains('.') {
            let segments: Vec<&str> = parsed.field.split('.').collect();
            clause.merge(expand_nested(&segments, condition, 0));
        } else {
            clause.insert(parsed.field, Node::Condition(condition));
        }
    }

    Ok(clause)
}

use crate::errors::QueryError;

use super::FilterMode;
use super::grouping::CombinedFilter;
use super::nested::{expand_nested, wrap_relations};
use super::predicate::{FieldCondition, Node, RelationBody, WhereClause};
use super::token::parse_filter;

/// Compile combined filter groups into one clause.
///
/// Each group's result is merged into the running clause; a later group
/// replaces an earlier one that produced the same top-level key.
///
/// # Errors
///
/// Returns [`QueryError::InvalidFilterFormat`] for a malformed token, or
/// [`QueryError::MismatchedRelationPrefix`] when the tokens of a nested group
/// do not share the group's relation prefix.
pub fn compile_combined(
    records: &[CombinedFilter],
    mode: FilterMode,
) -> Result<WhereClause, QueryError> {
    let mut clause = WhereClause::new();
    for record in records {
        let compiled = match mode {
            FilterMode::Nested if record.nested_level > 0 => compile_nested_group(record)?,
            _ => compile_flat_group(record)?,
        };
        clause.merge(compiled);
    }
    Ok(clause)
}

/// Merge every token's fragment into a single object keyed by the field.
fn compile_flat_group(record: &CombinedFilter) -> Result<WhereClause, QueryError> {
    let mut field = None;
    let mut merged: Option<FieldCondition> = None;

    for token in &record.tokens {
        let parsed = parse_filter(token)?;
        let fragment = FieldCondition::from_operator(parsed.operator, parsed.value);
        merged = Some(match merged {
            Some(acc) => acc.merge(fragment),
            None => fragment,
        });
        field.get_or_insert(parsed.field);
    }

    Ok(match (field, merged) {
        (Some(field), Some(condition)) => WhereClause::single(field, Node::Condition(condition)),
        _ => WhereClause::new(),
    })
}

/// AND together the tokens below a shared relation prefix.
///
/// `["addr.city==NY", "addr.zip==10001"]` at level 1 becomes
/// `{ addr: { is: { AND: [ { city: "NY" }, { zip: 10001 } ] } } }`.
fn compile_nested_group(record: &CombinedFilter) -> Result<WhereClause, QueryError> {
    let level = record.nested_level;
    let mut prefix: Option<Vec<String>> = None;
    let mut siblings = Vec::with_capacity(record.tokens.len());

    for token in &record.tokens {
        let parsed = parse_filter(token)?;
        let segments: Vec<&str> = parsed.field.split('.').collect();

        if segments.len() <= level {
            let expected = prefix
                .as_ref()
                .map_or_else(|| format!("{level} relation segment(s)"), |p| p.join("."));
            return Err(QueryError::mismatched_prefix(expected, parsed.field.as_str()));
        }

        let token_prefix = &segments[..level];
        match &prefix {
            Some(expected) if expected.as_slice() != token_prefix => {
                return Err(QueryError::mismatched_prefix(
                    expected.join("."),
                    parsed.field.as_str(),
                ));
            }
            Some(_) => {}
            None => prefix = Some(token_prefix.iter().map(ToString::to_string).collect()),
        }

        let leaf = FieldCondition::from_operator(parsed.operator, parsed.value);
        siblings.push(expand_nested(&segments, leaf, level));
    }

    Ok(prefix
        .and_then(|prefix| wrap_relations(&prefix, RelationBody::All(siblings)))
        .unwrap_or_default())
}

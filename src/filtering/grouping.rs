use crate::errors::QueryError;

use super::FilterMode;
use super::token::parse_field;

/// Two or more tokens constraining the same field (or relation prefix).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombinedFilter {
    /// Number of `.` separators in the grouped field path
    pub nested_level: usize,
    /// Original tokens, in encounter order
    pub tokens: Vec<String>,
}

/// Output of [`group_filters`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterGroups {
    /// Tokens that are alone on their key
    pub simple: Vec<String>,
    pub combined: Vec<CombinedFilter>,
}

/// Key a token is grouped under.
///
/// In nested mode a dotted field groups on its relation prefix, so
/// `addr.city` and `addr.zip` land together; the level keeps a plain
/// `addr` field apart from `addr.*` paths.
fn group_key(field: &str, mode: FilterMode) -> (String, usize) {
    let nested_level = field.matches('.').count();
    match (mode, field.rsplit_once('.')) {
        (FilterMode::Nested, Some((prefix, _))) => (prefix.to_string(), nested_level),
        _ => (field.to_string(), nested_level),
    }
}

/// Partition deduplicated tokens into simple tokens and combined groups.
///
/// Groups keep the order in which their key was first seen.
///
/// # Errors
///
/// Returns [`QueryError::InvalidFilterFormat`] for the first malformed token.
pub fn group_filters<S: AsRef<str>>(
    tokens: &[S],
    mode: FilterMode,
) -> Result<FilterGroups, QueryError> {
    let mut groups: Vec<((String, usize), Vec<String>)> = Vec::new();

    for token in tokens {
        let token = token.as_ref();
        let key = group_key(parse_field(token)?, mode);
        match groups.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, members)) => members.push(token.to_string()),
            None => groups.push((key, vec![token.to_string()])),
        }
    }

    let mut result = FilterGroups::default();
    for ((_, nested_level), mut members) in groups {
        if members.len() == 1 {
            result.simple.append(&mut members);
        } else {
            result.combined.push(CombinedFilter {
                nested_level,
                tokens: members,
            });
        }
    }
    Ok(result)
}

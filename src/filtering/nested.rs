use super::predicate::{FieldCondition, Node, RelationBody, WhereClause};

/// Expand a dotted path into a relation-traversal tree ending in `leaf`.
///
/// Segments before `skip` are ignored. Every remaining segment except the
/// last becomes a relation node; the last one holds the leaf directly:
///
/// - `["addr", "city"]`, skip 0 -> `{ addr: { is: { city: leaf } } }`
/// - `["addr", "city"]`, skip 1 -> `{ city: leaf }`
///
/// Returns an empty clause when no segment remains.
#[must_use]
pub fn expand_nested<S: AsRef<str>>(
    segments: &[S],
    leaf: FieldCondition,
    skip: usize,
) -> WhereClause {
    let Some((last, relations)) = segments.get(skip..).and_then(<[S]>::split_last) else {
        return WhereClause::new();
    };

    let mut clause = WhereClause::single(last.as_ref(), Node::Condition(leaf));
    for segment in relations.iter().rev() {
        clause = WhereClause::single(
            segment.as_ref(),
            Node::relation(RelationBody::Clause(clause)),
        );
    }
    clause
}

/// Wrap `body` in relation nodes down `prefix` (outermost first).
///
/// Returns `None` for an empty prefix.
#[must_use]
pub fn wrap_relations<S: AsRef<str>>(prefix: &[S], body: RelationBody) -> Option<WhereClause> {
    let (innermost, outer) = prefix.split_last()?;
    let mut clause = WhereClause::single(innermost.as_ref(), Node::relation(body));
    for segment in outer.iter().rev() {
        clause = WhereClause::single(
            segment.as_ref(),
            Node::relation(RelationBody::Clause(clause)),
        );
    }
    Some(clause)
}

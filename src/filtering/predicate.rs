//! Predicate tree produced by the filter compiler.
//!
//! A [`WhereClause`] maps keys (field names or relation names) to [`Node`]s.
//! The tree stays typed while it is assembled and is flattened to the store's
//! JSON shape only at the boundary ([`WhereClause::into_json`]):
//!
//! ```json
//! { "age": { "gte": 18, "lte": 65 },
//!   "addr": { "is": { "AND": [ { "city": "NY" }, { "zip": 10001 } ] } } }
//! ```

use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::token::Operator;

/// Key used for an operator inside a field condition object
#[must_use]
pub const fn operator_key(operator: Operator) -> &'static str {
    match operator {
        Operator::Eq => "equals",
        Operator::Neq => "NOT",
        Operator::Gt => "gt",
        Operator::Gte => "gte",
        Operator::Lt => "lt",
        Operator::Lte => "lte",
        Operator::In => "in",
    }
}

/// Leaf comparison applied to a single field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldCondition {
    /// Implicit equality: the bare value
    Equals(Value),
    /// Operator object such as `{ "gte": 18, "NOT": 20 }`
    Operators(Map<String, Value>),
}

impl FieldCondition {
    /// Build the comparison fragment for one operator and coerced value.
    #[must_use]
    pub fn from_operator(operator: Operator, value: Value) -> Self {
        match operator {
            Operator::Eq => Self::Equals(value),
            _ => {
                let mut fragment = Map::new();
                fragment.insert(operator_key(operator).to_string(), value);
                Self::Operators(fragment)
            }
        }
    }

    fn into_operators(self) -> Map<String, Value> {
        match self {
            Self::Equals(value) => {
                let mut fragment = Map::new();
                fragment.insert(operator_key(Operator::Eq).to_string(), value);
                fragment
            }
            Self::Operators(fragment) => fragment,
        }
    }

    /// Shallow-merge two fragments; keys from `other` win on collision.
    ///
    /// Equality is spelled `equals` once merged so it can sit beside other operators.
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        let mut merged = self.into_operators();
        merged.extend(other.into_operators());
        Self::Operators(merged)
    }

    #[must_use]
    pub fn into_json(self) -> Value {
        match self {
            Self::Equals(value) => value,
            Self::Operators(fragment) => Value::Object(fragment),
        }
    }
}

/// Body of a relation node: one clause, or an AND-list of clauses.
#[derive(Debug, Clone, PartialEq)]
pub enum RelationBody {
    Clause(WhereClause),
    All(Vec<WhereClause>),
}

/// "Traverse this relation, then satisfy `is`."
#[derive(Debug, Clone, PartialEq)]
pub struct RelationFilter {
    pub is: RelationBody,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Condition(FieldCondition),
    Relation(RelationFilter),
}

impl Node {
    #[must_use]
    pub fn relation(body: RelationBody) -> Self {
        Self::Relation(RelationFilter { is: body })
    }

    #[must_use]
    pub fn into_json(self) -> Value {
        match self {
            Self::Condition(condition) => condition.into_json(),
            Self::Relation(RelationFilter { is }) => {
                let inner = match is {
                    RelationBody::Clause(clause) => Value::Object(clause.into_json()),
                    RelationBody::All(clauses) => {
                        let mut all = Map::new();
                        all.insert(
                            "AND".to_string(),
                            Value::Array(
                                clauses
                                    .into_iter()
                                    .map(|clause| Value::Object(clause.into_json()))
                                    .collect(),
                            ),
                        );
                        Value::Object(all)
                    }
                };
                let mut relation = Map::new();
                relation.insert("is".to_string(), inner);
                Value::Object(relation)
            }
        }
    }
}

/// Compiled where-clause: key to predicate node.
///
/// Assigning an existing key replaces the earlier node. Replacements are
/// reported at `warn` level since they silently drop a constraint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WhereClause {
    entries: BTreeMap<String, Node>,
}

impl WhereClause {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clause holding exactly one entry
    #[must_use]
    pub fn single(key: impl Into<String>, node: Node) -> Self {
        let mut clause = Self::new();
        clause.entries.insert(key.into(), node);
        clause
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.entries.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Node)> {
        self.entries.iter()
    }

    /// Assign `node` to `key`, replacing any earlier node.
    pub fn insert(&mut self, key: impl Into<String>, node: Node) {
        let key = key.into();
        if let Some(previous) = self.entries.insert(key.clone(), node) {
            tracing::warn!(
                field = %key,
                dropped = ?previous,
                "Filter key assigned twice; keeping the later predicate"
            );
        }
    }

    /// Shallow union: entries of `other` replace entries with the same key.
    pub fn merge(&mut self, other: Self) {
        for (key, node) in other.entries {
            self.insert(key, node);
        }
    }

    /// Flatten into the JSON object shape expected by record stores.
    #[must_use]
    pub fn into_json(self) -> Map<String, Value> {
        self.entries
            .into_iter()
            .map(|(key, node)| (key, node.into_json()))
            .collect()
    }
}

impl From<WhereClause> for Value {
    fn from(clause: WhereClause) -> Self {
        Self::Object(clause.into_json())
    }
}

use serde_json::{Number, Value};
use std::fmt;

use crate::errors::QueryError;

/// Comparison operators for filter tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// Equality (`==`)
    Eq,
    /// Not equal (`!=`)
    Neq,
    /// Less than or equal (`<=`)
    Lte,
    /// Greater than or equal (`>=`)
    Gte,
    /// Less than (`<<`)
    Lt,
    /// Greater than (`>>`)
    Gt,
    /// Inclusion (`[]`)
    In,
}

impl Operator {
    /// All operators in the order they are tried at each scan position
    pub const ALL: [Self; 7] = [
        Self::Eq,
        Self::Neq,
        Self::Lte,
        Self::Gte,
        Self::Lt,
        Self::Gt,
        Self::In,
    ];

    /// Get the token symbol for this operator
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Neq => "!=",
            Self::Lte => "<=",
            Self::Gte => ">=",
            Self::Lt => "<<",
            Self::Gt => ">>",
            Self::In => "[]",
        }
    }

    /// Parse an operator from its exact symbol (e.g. `">="`)
    #[must_use]
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.symbol() == symbol)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// One filter token split into its parts.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedFilter {
    /// Trimmed field path, possibly dotted (e.g. `addr.city`)
    pub field: String,
    pub operator: Operator,
    /// Coerced value literal
    pub value: Value,
}

/// Scan a token left to right for non-overlapping operator occurrences.
fn find_operators(token: &str) -> Vec<(usize, Operator)> {
    let bytes = token.as_bytes();
    let mut found = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let rest = &bytes[i..];
        if let Some(op) = Operator::ALL
            .into_iter()
            .find(|op| rest.starts_with(op.symbol().as_bytes()))
        {
            found.push((i, op));
            i += op.symbol().len();
        } else {
            i += 1;
        }
    }
    found
}

/// Split a token around its single operator, returning `(field, operator, raw value)`.
fn split_token(token: &str) -> Result<(&str, Operator, &str), QueryError> {
    let operators = find_operators(token);
    let &[(position, operator)] = operators.as_slice() else {
        return Err(QueryError::invalid_filter(token));
    };

    let field = token[..position].trim();
    if field.is_empty() {
        return Err(QueryError::invalid_filter(token));
    }
    let raw_value = token[position + operator.symbol().len()..].trim();

    Ok((field, operator, raw_value))
}

/// Parse a filter token of the form `field<operator>value`.
///
/// Operator substrings inside the value are not escaped: a token such as
/// `note==a==b` holds two operators and is rejected.
///
/// # Errors
///
/// Returns [`QueryError::InvalidFilterFormat`] when the token holds zero or
/// more than one operator, or when the field part is empty.
pub fn parse_filter(token: &str) -> Result<ParsedFilter, QueryError> {
    let (field, operator, raw_value) = split_token(token)?;
    Ok(ParsedFilter {
        field: field.to_string(),
        operator,
        value: coerce_value(raw_value),
    })
}

/// Parse only the field part of a filter token.
///
/// # Errors
///
/// Same conditions as [`parse_filter`].
pub fn parse_field(token: &str) -> Result<&str, QueryError> {
    split_token(token).map(|(field, _, _)| field)
}

fn parse_number(raw: &str) -> Option<Number> {
    if let Ok(int) = raw.parse::<i64>() {
        return Some(int.into());
    }
    raw.parse::<f64>()
        .ok()
        .filter(|float| float.is_finite())
        .and_then(Number::from_f64)
}

/// Map a raw value string to a typed literal.
///
/// `true`/`false` (any case) become booleans, numeric strings become
/// numbers, `null` (any case) becomes null, anything else stays a string.
#[must_use]
pub fn coerce_value(raw: &str) -> Value {
    if raw.eq_ignore_ascii_case("true") {
        Value::Bool(true)
    } else if raw.eq_ignore_ascii_case("false") {
        Value::Bool(false)
    } else if let Some(number) = parse_number(raw) {
        Value::Number(number)
    } else if raw.eq_ignore_ascii_case("null") {
        Value::Null
    } else {
        Value::String(raw.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_filter_each_operator() {
        for op in Operator::ALL {
            let token = format!("age{}18", op.symbol());
            let parsed = parse_filter(&token).unwrap();
            assert_eq!(parsed.field, "age");
            assert_eq!(parsed.operator, op);
            assert_eq!(parsed.value, json!(18));
        }
    }

    #[test]
    fn test_parse_filter_trims_parts() {
        let parsed = parse_filter(" name ==  John Smith ").unwrap();
        assert_eq!(parsed.field, "name");
        assert_eq!(parsed.value, json!("John Smith"));
    }

    #[test]
    fn test_parse_filter_dotted_field() {
        let parsed = parse_filter("address.city==New York").unwrap();
        assert_eq!(parsed.field, "address.city");
        assert_eq!(parsed.value, json!("New York"));
    }

    #[test]
    fn test_parse_filter_without_operator_fails() {
        assert_eq!(
            parse_filter("age18"),
            Err(QueryError::invalid_filter("age18"))
        );
    }

    #[test]
    fn test_parse_filter_with_operator_in_value_fails() {
        assert!(parse_filter("note==a==b").is_err());
        assert!(parse_filter("age>=18<<65").is_err());
    }

    #[test]
    fn test_parse_filter_empty_field_fails() {
        assert!(parse_filter("==5").is_err());
        assert!(parse_filter("  !=5").is_err());
    }

    #[test]
    fn test_parse_filter_empty_value_is_empty_string() {
        let parsed = parse_filter("name==").unwrap();
        assert_eq!(parsed.value, json!(""));
    }

    #[test]
    fn test_single_equals_is_not_an_operator() {
        // `a===b` scans `==` at index 1, leaving `=b` as the value
        let parsed = parse_filter("a===b").unwrap();
        assert_eq!(parsed.field, "a");
        assert_eq!(parsed.value, json!("=b"));
    }

    #[test]
    fn test_parse_field_only() {
        assert_eq!(parse_field("addr.zip>>100").unwrap(), "addr.zip");
        assert!(parse_field("nothing").is_err());
    }

    #[test]
    fn test_non_ascii_values() {
        let parsed = parse_filter("名前==太郎").unwrap();
        assert_eq!(parsed.field, "名前");
        assert_eq!(parsed.value, json!("太郎"));
    }

    #[test]
    fn test_coerce_value() {
        assert_eq!(coerce_value("true"), json!(true));
        assert_eq!(coerce_value("FALSE"), json!(false));
        assert_eq!(coerce_value("42"), json!(42));
        assert_eq!(coerce_value("-3.5"), json!(-3.5));
        assert_eq!(coerce_value("NULL"), Value::Null);
        assert_eq!(coerce_value("abc"), json!("abc"));
    }

    #[test]
    fn test_coerce_non_finite_stays_string() {
        assert_eq!(coerce_value("NaN"), json!("NaN"));
        assert_eq!(coerce_value("inf"), json!("inf"));
    }

    #[test]
    fn test_operator_symbol_round_trip() {
        assert_eq!(Operator::from_symbol(">="), Some(Operator::Gte));
        assert_eq!(Operator::from_symbol("=>"), None);
        assert_eq!(Operator::In.to_string(), "[]");
    }
}

//! [`RecordStore`] for SQL databases through sea-orm.
//!
//! The model name is used as the table name and records come back as JSON
//! objects. Where-objects are translated into a sea-orm [`Condition`]:
//!
//! | Where entry | SQL |
//! |---|---|
//! | `{ "name": "John" }` | `"name" = 'John'` |
//! | `{ "deleted": null }` | `"deleted" IS NULL` |
//! | `{ "age": { "gte": 18, "NOT": 30 } }` | `"age" >= 18 AND "age" <> 30` |
//! | `{ "id": { "in": [1, 2] } }` | `"id" IN (1, 2)` |
//! | `{ "OR": [ {..}, {..} ] }` | `(..) OR (..)` |
//!
//! Relation filters (`{ "is": .. }`) need joins this adapter does not know
//! about and are rejected; `include` is ignored with a warning.
//!
//! Translation failures are caller mistakes, reported as
//! [`QueryError::UnsupportedQuery`] by [`RecordStore::validate`] before any
//! statement runs, so they render as `400` rather than a store error.

use async_trait::async_trait;
use sea_orm::{
    Condition, ConnectionTrait, DatabaseConnection, DbErr, FromQueryResult, JsonValue, Order,
    sea_query::{
        Alias, Asterisk, Expr, Func, Query, SelectStatement, SimpleExpr,
        Value as SqlValue,
    },
};
use serde_json::{Map, Value};

use super::RecordStore;
use crate::errors::QueryError;
use crate::models::FindManyArgs;

fn unsupported(message: impl Into<String>) -> QueryError {
    QueryError::unsupported_query(message)
}

fn db_err(err: QueryError) -> DbErr {
    DbErr::Custom(err.to_string())
}

fn as_object(value: &Value) -> Result<&Map<String, Value>, QueryError> {
    value
        .as_object()
        .ok_or_else(|| unsupported(format!("expected a filter object, found {value}")))
}

/// Convert a JSON scalar to a bindable SQL value
fn scalar(value: &Value) -> Result<SqlValue, QueryError> {
    match value {
        Value::Bool(b) => Ok((*b).into()),
        Value::Number(n) => n
            .as_i64()
            .map(SqlValue::from)
            .or_else(|| n.as_f64().map(SqlValue::from))
            .ok_or_else(|| unsupported(format!("unrepresentable number {n}"))),
        Value::String(s) => Ok(s.clone().into()),
        Value::Null | Value::Array(_) | Value::Object(_) => {
            Err(unsupported(format!("expected a scalar value, found {value}")))
        }
    }
}

fn equals(column: Expr, value: &Value) -> Result<SimpleExpr, QueryError> {
    if value.is_null() {
        Ok(column.is_null())
    } else {
        Ok(column.eq(scalar(value)?))
    }
}

fn not_equals(column: Expr, value: &Value) -> Result<SimpleExpr, QueryError> {
    if value.is_null() {
        Ok(column.is_not_null())
    } else {
        Ok(column.ne(scalar(value)?))
    }
}

/// `in` accepts a list, or a single scalar treated as a one-element list
fn members(value: &Value) -> Result<Vec<SqlValue>, QueryError> {
    match value {
        Value::Array(items) => items.iter().map(scalar).collect(),
        other => Ok(vec![scalar(other)?]),
    }
}

fn field_condition(field: &str, value: &Value) -> Result<Condition, QueryError> {
    let column = || Expr::col(Alias::new(field));

    let Value::Object(operators) = value else {
        return Ok(Condition::all().add(equals(column(), value)?));
    };

    let mut condition = Condition::all();
    for (operator, operand) in operators {
        let expr = match operator.as_str() {
            "equals" => equals(column(), operand)?,
            "NOT" | "not" => not_equals(column(), operand)?,
            "gt" => column().gt(scalar(operand)?),
            "gte" => column().gte(scalar(operand)?),
            "lt" => column().lt(scalar(operand)?),
            "lte" => column().lte(scalar(operand)?),
            "in" => column().is_in(members(operand)?),
            "is" | "isNot" | "some" | "every" | "none" => {
                return Err(unsupported(format!(
                    "relation filter on '{field}' is not supported by the SQL store"
                )));
            }
            other => {
                return Err(unsupported(format!(
                    "unsupported operator '{other}' on field '{field}'"
                )));
            }
        };
        condition = condition.add(expr);
    }
    Ok(condition)
}

/// Fold one or more nested where-objects into `acc`
fn logical(value: &Value, mut acc: Condition) -> Result<Condition, QueryError> {
    match value {
        Value::Array(items) => {
            for item in items {
                acc = acc.add(where_condition(as_object(item)?)?);
            }
        }
        other => acc = acc.add(where_condition(as_object(other)?)?),
    }
    Ok(acc)
}

fn where_condition(filter: &Map<String, Value>) -> Result<Condition, QueryError> {
    let mut condition = Condition::all();
    for (key, value) in filter {
        let entry = match key.as_str() {
            "AND" => logical(value, Condition::all())?,
            "OR" => logical(value, Condition::any())?,
            "NOT" => logical(value, Condition::all())?.not(),
            field => field_condition(field, value)?,
        };
        condition = condition.add(entry);
    }
    Ok(condition)
}

/// Translate a compiled where-object into a sea-orm [`Condition`].
///
/// # Errors
///
/// Returns [`QueryError::UnsupportedQuery`] for relation filters, unknown
/// operators, or values that cannot be bound as SQL scalars.
pub fn filter_condition(filter: &Value) -> Result<Condition, QueryError> {
    where_condition(as_object(filter)?)
}

fn apply_order(select: &mut SelectStatement, order_by: Option<&Value>) -> Result<(), QueryError> {
    let entries = match order_by {
        None => return Ok(()),
        Some(Value::Array(items)) => items.iter().map(as_object).collect::<Result<Vec<_>, _>>()?,
        Some(other) => vec![as_object(other)?],
    };

    for entry in entries {
        for (field, direction) in entry {
            let order = match direction.as_str() {
                Some(d) if d.eq_ignore_ascii_case("asc") => Order::Asc,
                Some(d) if d.eq_ignore_ascii_case("desc") => Order::Desc,
                _ => {
                    return Err(unsupported(format!(
                        "invalid sort direction {direction} for '{field}'"
                    )));
                }
            };
            select.order_by(Alias::new(field.as_str()), order);
        }
    }
    Ok(())
}

/// Build the `SELECT` for one page of `model`.
///
/// # Errors
///
/// Fails when the where, select, or orderBy objects cannot be translated.
pub fn select_statement(model: &str, query: &FindManyArgs) -> Result<SelectStatement, QueryError> {
    let mut select = Query::select();
    select.from(Alias::new(model));

    let columns: Vec<Alias> = match query.select.as_ref() {
        None => Vec::new(),
        Some(projection) => as_object(projection)?
            .iter()
            .filter(|(_, enabled)| enabled.as_bool() == Some(true))
            .map(|(field, _)| Alias::new(field.as_str()))
            .collect(),
    };
    if columns.is_empty() {
        select.column(Asterisk);
    } else {
        select.columns(columns);
    }

    if query.include.is_some() {
        tracing::warn!(model, "Relation includes are not supported by the SQL store; ignoring `include`");
    }

    if let Some(filter) = query.where_.as_ref() {
        select.cond_where(filter_condition(filter)?);
    }
    apply_order(&mut select, query.order_by.as_ref())?;
    select.limit(query.take).offset(query.skip);

    Ok(select)
}

/// Build the `SELECT COUNT(*)` for `model` under `filter`.
///
/// # Errors
///
/// Fails when the filter cannot be translated.
pub fn count_statement(model: &str, filter: Option<&Value>) -> Result<SelectStatement, QueryError> {
    let mut select = Query::select();
    select
        .expr(Func::count(Expr::col(Asterisk)))
        .from(Alias::new(model));
    if let Some(filter) = filter {
        select.cond_where(filter_condition(filter)?);
    }
    Ok(select)
}

#[async_trait]
impl RecordStore for DatabaseConnection {
    type Record = JsonValue;
    type Error = DbErr;

    fn validate(&self, model: &str, query: &FindManyArgs) -> Result<(), QueryError> {
        select_statement(model, query).map(|_| ())
    }

    async fn find_many(&self, model: &str, query: &FindManyArgs) -> Result<Vec<JsonValue>, DbErr> {
        let statement = self
            .get_database_backend()
            .build(&select_statement(model, query).map_err(db_err)?);
        JsonValue::find_by_statement(statement).all(self).await
    }

    async fn count(&self, model: &str, filter: Option<&Value>) -> Result<u64, DbErr> {
        let statement = self
            .get_database_backend()
            .build(&count_statement(model, filter).map_err(db_err)?);
        let row = self
            .query_one(statement)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("count of {model}")))?;
        let count: i64 = row.try_get_by_index(0)?;
        u64::try_from(count).map_err(|err| DbErr::Custom(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::sea_query::{QueryStatementWriter, SqliteQueryBuilder};
    use serde_json::json;

    fn where_sql(filter: &Value) -> String {
        Query::select()
            .column(Asterisk)
            .from(Alias::new("users"))
            .cond_where(filter_condition(filter).unwrap())
            .to_string(SqliteQueryBuilder)
    }

    #[test]
    fn test_equality_and_null() {
        let sql = where_sql(&json!({ "name": "John", "deleted": null }));
        assert!(sql.contains(r#""name" = 'John'"#), "{sql}");
        assert!(sql.contains(r#""deleted" IS NULL"#), "{sql}");
    }

    #[test]
    fn test_range_operators() {
        let sql = where_sql(&json!({ "age": { "gte": 18, "lte": 65, "NOT": 30 } }));
        assert!(sql.contains(r#""age" >= 18"#), "{sql}");
        assert!(sql.contains(r#""age" <= 65"#), "{sql}");
        assert!(sql.contains(r#""age" <> 30"#), "{sql}");
    }

    #[test]
    fn test_in_accepts_scalar_and_list() {
        assert!(where_sql(&json!({ "id": { "in": 7 } })).contains(r#""id" IN (7)"#));
        assert!(where_sql(&json!({ "id": { "in": [1, 2] } })).contains(r#""id" IN (1, 2)"#));
    }

    #[test]
    fn test_or_group() {
        let sql = where_sql(&json!({ "OR": [ { "name": "a" }, { "name": "b" } ] }));
        assert!(sql.contains(" OR "), "{sql}");
    }

    #[test]
    fn test_relation_filter_rejected() {
        let err = filter_condition(&json!({ "addr": { "is": { "city": "NY" } } })).unwrap_err();
        assert!(err.to_string().contains("relation filter on 'addr'"));
    }

    #[test]
    fn test_null_range_bound_rejected() {
        let err = filter_condition(&json!({ "age": { "gte": null } })).unwrap_err();
        assert!(matches!(err, QueryError::UnsupportedQuery { .. }));
    }

    #[test]
    fn test_unknown_operator_rejected() {
        assert!(filter_condition(&json!({ "name": { "contains": "x" } })).is_err());
    }

    #[test]
    fn test_select_statement_window_and_order() {
        let args = FindManyArgs {
            skip: 10,
            take: 5,
            where_: Some(json!({ "age": { "gt": 1 } })),
            order_by: Some(json!([{ "name": "asc" }, { "age": "desc" }])),
            select: Some(json!({ "name": true, "age": true, "secret": false })),
            ..Default::default()
        };
        let sql = select_statement("users", &args).unwrap().to_string(SqliteQueryBuilder);
        assert!(sql.starts_with(r#"SELECT "age", "name" FROM "users""#), "{sql}");
        assert!(sql.contains(r#"ORDER BY "name" ASC, "age" DESC"#), "{sql}");
        assert!(sql.contains("LIMIT 5"), "{sql}");
        assert!(sql.contains("OFFSET 10"), "{sql}");
    }

    #[test]
    fn test_invalid_direction_rejected() {
        let args = FindManyArgs {
            take: 1,
            order_by: Some(json!({ "name": "up" })),
            ..Default::default()
        };
        assert!(select_statement("users", &args).is_err());
    }

    #[test]
    fn test_count_statement() {
        let sql = count_statement("users", Some(&json!({ "age": { "lt": 10 } })))
            .unwrap()
            .to_string(SqliteQueryBuilder);
        assert!(sql.starts_with(r#"SELECT COUNT(*) FROM "users""#), "{sql}");
        assert!(sql.contains(r#""age" < 10"#), "{sql}");
    }
}

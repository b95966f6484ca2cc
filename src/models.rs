use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::{OneOrMany, PickFirst, json::JsonString, serde_as, skip_serializing_none};
use utoipa::{IntoParams, ToSchema};

use crate::sort::SortSpec;

/// Page request: pagination, sorting, and filtering options.
///
/// # Filtering
/// `filter` and `nestedFilter` hold tokens of the form `field<operator>value`,
/// with operators `==`, `!=`, `<=`, `>=`, `<<`, `>>` and `[]`:
/// - `["name==John", "age>=18"]`
/// - `["age>=18", "age<=65"]` (both constraints apply)
///
/// In `nestedFilter` a dotted field traverses relations:
/// - `["address.city==New York", "address.state==NY"]`
///
/// # Sorting
/// `sort` holds `field=order` tokens with order `asc`, `desc`, `ASC` or `DESC`:
/// - `["name=asc", "createdAt=DESC"]`
///
/// # Pagination
/// `page` is 1-based (default 1), `size` defaults to 20. When `route` is set
/// and no filter is used, the result carries navigation links.
///
/// # Query strings
/// In a query string each list is one JSON-encoded array, the form the
/// navigation links use: `?sort=%5B%22name%3Dasc%22%5D`. A bare single token
/// (`?sort=name%3Dasc`) is read as a one-element list. JSON bodies may use
/// plain arrays.
#[serde_as]
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, IntoParams, ToSchema)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct PageOption {
    /// Page number (1-based).
    #[param(example = 1)]
    pub page: Option<u64>,
    /// Number of records per page.
    #[param(example = 20)]
    pub size: Option<u64>,
    /// Sort tokens, e.g. `["name=asc"]`.
    #[param(example = json!(["name=asc"]))]
    #[serde(default)]
    #[serde_as(deserialize_as = "Option<PickFirst<(JsonString, OneOrMany<_>)>>")]
    pub sort: Option<Vec<String>>,
    /// Flat filter tokens, e.g. `["age>=18"]`.
    #[param(example = json!(["name==John", "age>=18"]))]
    #[serde(default)]
    #[serde_as(deserialize_as = "Option<PickFirst<(JsonString, OneOrMany<_>)>>")]
    pub filter: Option<Vec<String>>,
    /// Filter tokens whose dotted fields traverse relations.
    #[param(example = json!(["address.city==New York"]))]
    #[serde(default)]
    #[serde_as(deserialize_as = "Option<PickFirst<(JsonString, OneOrMany<_>)>>")]
    pub nested_filter: Option<Vec<String>>,
    /// Base route used to build navigation links, e.g. `/users`.
    #[param(example = "/users")]
    pub route: Option<String>,
}

impl PageOption {
    /// Whether a non-empty `filter` or `nestedFilter` was supplied
    #[must_use]
    pub fn has_filters(&self) -> bool {
        let non_empty = |tokens: &Option<Vec<String>>| tokens.as_ref().is_some_and(|t| !t.is_empty());
        non_empty(&self.filter) || non_empty(&self.nested_filter)
    }

    /// Sort tokens, if any were supplied
    #[must_use]
    pub fn sort_tokens(&self) -> Option<&[String]> {
        self.sort.as_deref().filter(|tokens| !tokens.is_empty())
    }
}

/// Extra store parameters passed through to the query object.
///
/// `where` is used as the base that compiled filters are merged into;
/// `orderBy` entries come before the compiled sort specs.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryParams {
    #[serde(rename = "where")]
    pub where_: Option<Value>,
    pub include: Option<Value>,
    pub select: Option<Value>,
    pub order_by: Option<Value>,
}

/// Query object handed to a [`RecordStore`](crate::store::RecordStore).
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FindManyArgs {
    pub skip: u64,
    pub take: u64,
    #[serde(rename = "where")]
    pub where_: Option<Value>,
    pub select: Option<Value>,
    pub include: Option<Value>,
    pub order_by: Option<Value>,
}

/// Pagination metadata of a [`Page`].
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MetaData {
    pub page: u64,
    pub size: u64,
    pub total_pages: u64,
    pub total_count: u64,
    #[schema(value_type = Option<Vec<Object>>, example = json!([{ "name": "asc" }]))]
    pub sort: Option<Vec<SortSpec>>,
}

/// Navigation links; an empty string means "no such page".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Links {
    pub first: String,
    pub prev: String,
    pub next: String,
    pub last: String,
}

/// One page of records.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub meta_data: MetaData,
    pub links: Option<Links>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sort::parse_sort;
    use serde_json::json;

    #[test]
    fn test_page_option_camel_case() {
        let option: PageOption = serde_json::from_value(json!({
            "page": 2,
            "nestedFilter": ["addr.city==NY"],
            "route": "/users"
        }))
        .unwrap();
        assert_eq!(option.page, Some(2));
        assert_eq!(option.size, None);
        assert_eq!(option.nested_filter, Some(vec!["addr.city==NY".to_string()]));
    }

    #[test]
    fn test_has_filters_ignores_empty_lists() {
        let mut option = PageOption {
            filter: Some(Vec::new()),
            ..Default::default()
        };
        assert!(!option.has_filters());
        option.nested_filter = Some(vec!["a.b==1".to_string()]);
        assert!(option.has_filters());
    }

    #[test]
    fn test_find_many_args_json_shape() {
        let args = FindManyArgs {
            skip: 10,
            take: 10,
            where_: Some(json!({ "age": { "gte": 18 } })),
            order_by: Some(json!([{ "name": "asc" }])),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&args).unwrap(),
            json!({
                "skip": 10,
                "take": 10,
                "where": { "age": { "gte": 18 } },
                "orderBy": [{ "name": "asc" }]
            })
        );
    }

    #[test]
    fn test_page_json_shape() {
        let page = Page {
            content: vec![json!({ "id": 1 })],
            meta_data: MetaData {
                page: 1,
                size: 20,
                total_pages: 1,
                total_count: 1,
                sort: Some(vec![parse_sort("id=desc").unwrap()]),
            },
            links: None,
        };
        assert_eq!(
            serde_json::to_value(&page).unwrap(),
            json!({
                "content": [{ "id": 1 }],
                "metaData": {
                    "page": 1,
                    "size": 20,
                    "totalPages": 1,
                    "totalCount": 1,
                    "sort": [{ "id": "desc" }]
                }
            })
        );
    }
}

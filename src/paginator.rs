use serde_json::Value;

use crate::config::PaginationConfig;
use crate::errors::{PaginateError, QueryError};
use crate::filtering::{FilterMode, WhereClause, build_where_clause};
use crate::links::build_links;
use crate::models::{FindManyArgs, MetaData, Page, PageOption, QueryParams};
use crate::pagination::PageWindow;
use crate::sort::{SortSpec, parse_sorting};
use crate::store::RecordStore;

/// Everything needed to run one page query, computed before touching the store.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    pub window: PageWindow,
    pub args: FindManyArgs,
    /// Parsed sort specs, reported back in the page metadata
    pub sort: Option<Vec<SortSpec>>,
}

/// Merge a compiled clause on top of the caller's where-object.
fn merge_where(base: Option<Value>, clause: WhereClause) -> Value {
    match base {
        Some(Value::Object(mut base)) => {
            base.extend(clause.into_json());
            Value::Object(base)
        }
        Some(other) => {
            tracing::warn!(replaced = %other, "Caller `where` is not an object; replacing it with compiled filters");
            Value::from(clause)
        }
        None => Value::from(clause),
    }
}

/// Caller entries first, then the parsed sort specs, as one array.
fn merge_order_by(base: Option<Value>, specs: &[SortSpec]) -> Value {
    let mut entries = match base {
        Some(Value::Array(entries)) => entries,
        Some(entry) => vec![entry],
        None => Vec::with_capacity(specs.len()),
    };
    entries.extend(specs.iter().map(SortSpec::to_json));
    Value::Array(entries)
}

fn tokens(list: Option<&Vec<String>>) -> Option<&[String]> {
    list.map(Vec::as_slice).filter(|tokens| !tokens.is_empty())
}

/// Compile a page request into a store query.
///
/// - `filter` is compiled in flat mode, `nestedFilter` in nested mode; both are
///   merged over `params.where`, later keys winning.
/// - Sort specs are appended to `params.orderBy`.
/// - When both `select` and `include` are given, `include` is dropped.
///
/// # Errors
///
/// Any [`QueryError`] raised while compiling filters, sorts, or the page window.
pub fn plan_query(
    option: &PageOption,
    params: Option<QueryParams>,
    config: &PaginationConfig,
) -> Result<QueryPlan, QueryError> {
    let window = PageWindow::resolve(option, config)?;
    let QueryParams {
        mut where_,
        mut include,
        select,
        mut order_by,
    } = params.unwrap_or_default();

    if let Some(filter) = tokens(option.filter.as_ref()) {
        let clause = build_where_clause(filter, FilterMode::Flat)?;
        where_ = Some(merge_where(where_, clause));
    }

    if let Some(nested) = tokens(option.nested_filter.as_ref()) {
        let clause = build_where_clause(nested, FilterMode::Nested)?;
        where_ = Some(merge_where(where_, clause));
    }

    let sort = match option.sort_tokens() {
        Some(sort) => {
            let specs = parse_sorting(sort)?;
            order_by = Some(merge_order_by(order_by, &specs));
            Some(specs)
        }
        None => None,
    };

    if select.is_some() && include.is_some() {
        tracing::warn!("Please either use `include` or `select`, but not both at the same time; dropping `include`");
        include = None;
    }

    let args = FindManyArgs {
        skip: window.skip(),
        take: window.take(),
        where_,
        select,
        include,
        order_by,
    };
    tracing::debug!(query = ?args, "Compiled page query");

    Ok(QueryPlan { window, args, sort })
}

/// Run a page query with an explicit configuration.
///
/// Records and the total count are fetched concurrently; the first store
/// failure is returned as is.
///
/// # Errors
///
/// [`PaginateError::Query`] when the request does not compile or the store
/// rejects it in [`RecordStore::validate`], [`PaginateError::Store`] when
/// either store call fails.
pub async fn paginate_with_config<S>(
    store: &S,
    config: &PaginationConfig,
    model: &str,
    option: &PageOption,
    params: Option<QueryParams>,
) -> Result<Page<S::Record>, PaginateError<S::Error>>
where
    S: RecordStore + ?Sized,
{
    let QueryPlan { window, args, sort } = plan_query(option, params, config)?;
    store.validate(model, &args)?;

    let (content, total_count) = tokio::try_join!(
        store.find_many(model, &args),
        store.count(model, args.where_.as_ref()),
    )
    .map_err(PaginateError::Store)?;

    let total_pages = window.total_pages(total_count);
    let links = match option.route.as_deref() {
        Some(route) if !option.has_filters() => Some(build_links(
            route,
            window,
            total_pages,
            option.sort_tokens(),
        )),
        _ => None,
    };

    Ok(Page {
        content,
        meta_data: MetaData {
            page: window.page,
            size: window.size,
            total_pages,
            total_count,
            sort,
        },
        links,
    })
}

/// Run a page query with the default configuration (page 1, size 20).
///
/// ```rust,ignore
/// let option = PageOption {
///     page: Some(1),
///     size: Some(20),
///     sort: Some(vec!["name=asc".into()]),
///     filter: Some(vec!["name==John".into(), "age>=18".into()]),
///     nested_filter: Some(vec!["address.city==New York".into()]),
///     route: Some("/users".into()),
/// };
/// let page = querypage::paginate(&store, "User", &option, None).await?;
/// ```
///
/// # Errors
///
/// See [`paginate_with_config`].
pub async fn paginate<S>(
    store: &S,
    model: &str,
    option: &PageOption,
    params: Option<QueryParams>,
) -> Result<Page<S::Record>, PaginateError<S::Error>>
where
    S: RecordStore + ?Sized,
{
    paginate_with_config(store, &PaginationConfig::default(), model, option, params).await
}

/// A store paired with the pagination settings to use for it.
#[derive(Debug, Clone)]
pub struct Paginator<S> {
    store: S,
    config: PaginationConfig,
}

impl<S: RecordStore> Paginator<S> {
    pub fn new(store: S) -> Self {
        Self::with_config(store, PaginationConfig::default())
    }

    pub fn with_config(store: S, config: PaginationConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &PaginationConfig {
        &self.config
    }

    /// Run a page query against the wrapped store.
    ///
    /// # Errors
    ///
    /// See [`paginate_with_config`].
    pub async fn paginate(
        &self,
        model: &str,
        option: &PageOption,
        params: Option<QueryParams>,
    ) -> Result<Page<S::Record>, PaginateError<S::Error>> {
        paginate_with_config(&self.store, &self.config, model, option, params).await
    }
}

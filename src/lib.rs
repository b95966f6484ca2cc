pub mod config;
pub mod errors;
pub mod filtering;
pub mod links;
pub mod models;
pub mod pagination;
pub mod paginator;
pub mod sort;
pub mod store;

pub use config::PaginationConfig;
pub use errors::{PaginateError, QueryError};
pub use filtering::{FilterMode, WhereClause, build_where_clause};
pub use models::{FindManyArgs, Links, MetaData, Page, PageOption, QueryParams};
pub use paginator::{Paginator, paginate, paginate_with_config, plan_query};
pub use sort::{SortOrder, SortSpec, parse_sort, parse_sorting, validate_sort};
pub use store::RecordStore;

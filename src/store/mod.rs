//! Boundary to the backing record store.
//!
//! The paginator only needs two read operations, both addressed by a model
//! (collection or table) name. [`sql`] implements them for a sea-orm
//! [`DatabaseConnection`](sea_orm::DatabaseConnection); other backends
//! implement [`RecordStore`] themselves.

pub mod sql;

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::QueryError;
use crate::models::FindManyArgs;

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Record type returned in page content
    type Record: Send;
    type Error: Send;

    /// Reject a compiled query this store cannot evaluate, before any call is made.
    ///
    /// The default accepts everything.
    ///
    /// # Errors
    ///
    /// A [`QueryError`], reported to the caller as a bad request.
    fn validate(&self, _model: &str, _query: &FindManyArgs) -> Result<(), QueryError> {
        Ok(())
    }

    /// Fetch the records selected by `query` (window, filter, order, projection).
    async fn find_many(
        &self,
        model: &str,
        query: &FindManyArgs,
    ) -> Result<Vec<Self::Record>, Self::Error>;

    /// Count all records matching `filter`, ignoring the page window.
    async fn count(&self, model: &str, filter: Option<&Value>) -> Result<u64, Self::Error>;
}

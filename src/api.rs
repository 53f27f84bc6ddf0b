use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx_query_compose::{
   ApiParams, DbSession, Order, PaginationNavigation, QueryExecutor, SqliteSession, navigate,
};
use tracing::debug;

use crate::{Config, Error, Result};

/// Response envelope for a paged list endpoint.
///
/// ```json
/// { "data": [...], "pagination": { "first": ..., "previous": ..., "next": ..., "last": ..., "total": 95 } }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginationResponse<T> {
   pub data: Vec<T>,
   pub pagination: PaginationNavigation,
}

/// Read one page of `query` and wrap it with navigation links.
///
/// Rows are deserialized as `R` and handed to `map` as a whole page. When
/// the request selects no order, rows are ordered by `id` ascending. A
/// suppressed count reports a total of 0 and no links.
///
/// Failures are reported against `label`, e.g. "unable to read paged users".
pub async fn find_all_paged<S, R, D, F>(
   session: &mut S,
   query: &str,
   params: &ApiParams,
   label: &str,
   map: F,
   values: Vec<JsonValue>,
) -> Result<PaginationResponse<D>>
where
   S: DbSession,
   R: DeserializeOwned,
   F: FnOnce(Vec<R>) -> Vec<D>,
{
   if params.requested_url_path.is_empty() {
      return Err(Error::InvalidRequest(
         "the request URL path is empty".to_string(),
      ));
   }

   let ordered;
   let params = if params.order.is_none() {
      ordered = params.clone().with_order(Order::by_id());
      &ordered
   } else {
      params
   };

   let page = QueryExecutor::new(session)
      .read_many::<R>(query, params, values)
      .await
      .map_err(|e| Error::paged(label, e))?;

   let total = page.total.unwrap_or(0);
   let pagination = navigate(&params.requested_url_path, &params.pagination, total)
      .map_err(|e| Error::paged(label, e))?;

   debug!(label, rows = page.rows.len(), total, "found paged rows");
   Ok(PaginationResponse {
      data: map(page.rows),
      pagination,
   })
}

/// Connect to the configured database and open a session on it.
pub async fn open_session(config: &Config, auto_commit: bool) -> Result<SqliteSession> {
   let session = SqliteSession::connect(
      &config.database_path,
      Some(config.database_config()),
      auto_commit,
   )
   .await?;

   debug!(session = %session.id(), path = %config.database_path.display(), "opened session");
   Ok(session)
}

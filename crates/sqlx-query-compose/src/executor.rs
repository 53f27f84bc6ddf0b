//! Paged query execution over a [`DbSession`].
//!
//! A paged read composes the caller's query in a fixed sequence:
//!
//! 1. Inject the active filters (`where`/`and`, positional values)
//! 2. Apply the order and `limit ? offset ?`, reversing the sort for `last`
//! 3. Run the page query with caller, filter then pagination values
//! 4. Reverse the fetched rows of a backward page
//! 5. Unless counting is suppressed, run the count query with caller and
//!    filter values

use std::sync::OnceLock;

use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use crate::clauses::{ClauseFacts, normalize};
use crate::filter::inject_filters;
use crate::pagination::paginate;
use crate::request::ApiParams;
use crate::session::{DbSession, Row, WriteQueryResult};
use crate::subquery::{mask, replace_in_main_query};
use crate::{Error, Result};

fn select_list() -> &'static Regex {
   static RE: OnceLock<Regex> = OnceLock::new();
   RE.get_or_init(|| Regex::new(r"(?is)^\s*select\s.*?\sfrom\s").expect("invalid regex"))
}

/// A fully composed page query and its companion count query.
#[derive(Debug, Clone, PartialEq)]
pub struct PagedStatement {
   pub query: String,
   pub values: Vec<JsonValue>,
   /// `None` when counting is suppressed.
   pub count_query: Option<String>,
   pub count_values: Vec<JsonValue>,
   /// Rows come back in reverse and must be flipped.
   pub backward: bool,
}

/// One page of records plus the total, when it was counted.
#[derive(Debug, Clone, PartialEq)]
pub struct PagedRows<T> {
   pub rows: Vec<T>,
   pub total: Option<i64>,
}

/// Turn a filtered query into one that counts its rows.
///
/// Grouped or `distinct` queries, and anything not shaped like
/// `select ... from`, are wrapped as a subquery. Otherwise the top-level
/// select list is replaced by `count(1)`.
pub(crate) fn build_count_query(filtered: &str) -> Result<String> {
   let facts = ClauseFacts::analyze(filtered)?;
   let masked = mask(filtered)?;
   let distinct = normalize(&masked.sql).starts_with("select distinct ");

   if facts.has_group_by || distinct || !select_list().is_match(&masked.sql) {
      return Ok(format!("select count(1) from ({}) as cnt", filtered.trim()));
   }

   replace_in_main_query(filtered, select_list(), "select count(1) from ")
}

/// Compose the page and count queries for `query` under `params`.
///
/// `values` binds the placeholders already present in `query`; they come
/// first in both value lists.
pub fn build_paged_statement(
   query: &str,
   params: &ApiParams,
   values: Vec<JsonValue>,
) -> Result<PagedStatement> {
   let (filtered, filter_values) = inject_filters(query, &params.filters)?;
   let (paged, page_values) = paginate(&filtered, params.order.as_ref(), &params.pagination)?;

   let count_query = if params.options.no_count {
      None
   } else {
      Some(build_count_query(&filtered)?)
   };

   let mut count_values = values;
   count_values.extend(filter_values);

   let mut values = count_values.clone();
   values.extend(page_values);

   Ok(PagedStatement {
      query: paged,
      values,
      count_query,
      count_values,
      backward: params.pagination.is_last(),
   })
}

fn decode_record<T: DeserializeOwned>(row: Row) -> Result<T> {
   Ok(serde_json::from_value(JsonValue::Object(
      row.into_iter().collect(),
   ))?)
}

/// Runs composed queries on a borrowed session.
pub struct QueryExecutor<'s, S> {
   session: &'s mut S,
}

impl<'s, S: DbSession> QueryExecutor<'s, S> {
   pub fn new(session: &'s mut S) -> Self {
      Self { session }
   }

   /// Fetch one page of `query` as records of type `T`, plus the total.
   ///
   /// Driver failures are logged and surface as [`Error::QueryExecution`] or
   /// [`Error::CountQuery`], whose messages do not leak driver details.
   pub async fn read_many<T: DeserializeOwned>(
      &mut self,
      query: &str,
      params: &ApiParams,
      values: Vec<JsonValue>,
   ) -> Result<PagedRows<T>> {
      let statement = build_paged_statement(query, params, values)?;

      let mut rows = match self
         .session
         .read_many(&statement.query, statement.values)
         .await
      {
         Ok(rows) => rows,
         Err(e) => {
            warn!(error = %e, query = %statement.query, "paged query failed");
            return Err(Error::query_execution(e));
         }
      };

      if statement.backward {
         rows.reverse();
      }

      let rows = rows
         .into_iter()
         .map(decode_record)
         .collect::<Result<Vec<T>>>()
         .map_err(Error::query_execution)?;

      let total = match statement.count_query {
         Some(count_query) => Some(self.count(&count_query, statement.count_values).await?),
         None => None,
      };

      debug!(rows = rows.len(), ?total, "read page");
      Ok(PagedRows { rows, total })
   }

   async fn count(&mut self, query: &str, values: Vec<JsonValue>) -> Result<i64> {
      let rows = match self.session.read_many(query, values).await {
         Ok(rows) => rows,
         Err(e) => {
            warn!(error = %e, query = %query, "count query failed");
            return Err(Error::count_query(e));
         }
      };

      rows
         .first()
         .and_then(|row| row.values().next())
         .and_then(JsonValue::as_i64)
         .ok_or(Error::MissingCountResult)
   }

   /// Fetch at most one record.
   pub async fn read_one<T: DeserializeOwned>(
      &mut self,
      query: &str,
      values: Vec<JsonValue>,
   ) -> Result<Option<T>> {
      self
         .session
         .read_one(query, values)
         .await?
         .map(decode_record)
         .transpose()
   }

   /// Run a write statement on the session.
   pub async fn write(&mut self, query: &str, values: Vec<JsonValue>) -> Result<WriteQueryResult> {
      self.session.write(query, values).await
   }
}

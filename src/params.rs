//! Turning decoded query-string pairs into [`ApiParams`].

use sqlx_query_compose::{ApiParams, Filter, Order, Pagination, QueryOptions};
use tracing::debug;

use crate::Config;

/// Query-string key holding the page size.
pub const LIMIT_KEY: &str = "limit";
/// Query-string key holding the cursor marker.
pub const MARKER_KEY: &str = "marker";
/// Query-string key selecting a declared order by name.
pub const ORDER_KEY: &str = "order";
/// Query-string key suppressing the count query.
pub const NO_COUNT_KEY: &str = "nocount";

/// The filters and orders an endpoint accepts.
///
/// Declarations are never mutated: extraction returns activated copies.
#[derive(Debug, Clone)]
pub struct RequestParams {
   filters: Vec<Filter>,
   orders: Vec<Order>,
   default_limit: i64,
}

fn last_value<'a, K: AsRef<str>, V: AsRef<str>>(pairs: &'a [(K, V)], key: &str) -> Option<&'a str> {
   pairs
      .iter()
      .rev()
      .find(|(k, _)| k.as_ref() == key)
      .map(|(_, v)| v.as_ref())
}

impl RequestParams {
   pub fn new(filters: Vec<Filter>, orders: Vec<Order>, config: &Config) -> Self {
      Self {
         filters,
         orders,
         default_limit: config.default_pagination_limit,
      }
   }

   /// Read `limit` and `marker`.
   ///
   /// The last occurrence of each key wins. A missing, unparseable or zero
   /// limit falls back to the default page size and drops the marker.
   pub fn pagination<K: AsRef<str>, V: AsRef<str>>(&self, pairs: &[(K, V)]) -> Pagination {
      let limit = last_value(pairs, LIMIT_KEY).and_then(|v| v.trim().parse::<i64>().ok());

      match limit {
         Some(limit) if limit != 0 => {
            Pagination::new(limit, last_value(pairs, MARKER_KEY).unwrap_or_default())
         }
         _ => Pagination::new(self.default_limit, ""),
      }
   }

   /// Build the request for `requested_url_path` from its query-string pairs.
   pub fn extract<K: AsRef<str>, V: AsRef<str>>(
      &self,
      requested_url_path: &str,
      pairs: &[(K, V)],
   ) -> ApiParams {
      let filters: Vec<Filter> = self
         .filters
         .iter()
         .filter_map(|declared| {
            last_value(pairs, &declared.name)
               .filter(|value| !value.is_empty())
               .map(|value| declared.activate(value))
         })
         .collect();

      let order = last_value(pairs, ORDER_KEY)
         .and_then(|name| self.orders.iter().find(|o| o.name == name))
         .cloned();

      let no_count = last_value(pairs, NO_COUNT_KEY)
         .is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true"));

      let mut params = ApiParams::new(requested_url_path, self.pagination(pairs))
         .with_filters(filters)
         .with_options(QueryOptions { no_count });
      if let Some(order) = order {
         params = params.with_order(order);
      }

      debug!(
         path = requested_url_path,
         filters = params.filters.len(),
         order = params.order.as_ref().map(|o| o.name.as_str()),
         limit = params.pagination.limit,
         "extracted request params"
      );
      params
   }
}

//! Request-scoped description of a list read: filters, order and page window.
//!
//! Filter and order declarations are meant to live in shared, read-only
//! catalogs. A request never edits a declaration; it activates a copy
//! ([`Filter::activate`], [`Order::clone`]) and owns that copy until the
//! query has been built.

use serde::{Deserialize, Serialize};

/// Marker value that requests the final page, traversed backward.
pub const LAST_MARKER: &str = "last";

/// Column used to order a backward page when no order is declared.
pub const DEFAULT_ORDER_FIELD: &str = "id";

/// A predicate on one column, bound positionally as `<where_field>=?`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Filter {
   /// Query-parameter key exposed to API clients
   pub name: String,
   /// Value bound to the placeholder; never interpolated into SQL
   pub value: String,
   /// Column or expression compared against the value
   pub where_field: String,
}

impl Filter {
   /// Declare a filter with no value yet.
   pub fn new(name: impl Into<String>, where_field: impl Into<String>) -> Self {
      Self {
         name: name.into(),
         value: String::new(),
         where_field: where_field.into(),
      }
   }

   /// Copy this declaration with `value` filled in.
   pub fn activate(&self, value: impl Into<String>) -> Self {
      Self {
         value: value.into(),
         ..self.clone()
      }
   }
}

/// A single sort key.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
   /// Name clients use to select this order
   pub name: String,
   /// Sort descending instead of ascending
   pub desc: bool,
   /// Column or expression placed after `order by`
   pub order_field: String,
}

impl Order {
   /// Ascending order on `order_field`.
   pub fn asc(name: impl Into<String>, order_field: impl Into<String>) -> Self {
      Self {
         name: name.into(),
         desc: false,
         order_field: order_field.into(),
      }
   }

   /// Descending order on `order_field`.
   pub fn desc(name: impl Into<String>, order_field: impl Into<String>) -> Self {
      Self {
         name: name.into(),
         desc: true,
         order_field: order_field.into(),
      }
   }

   /// Ascending order on `id`.
   pub fn by_id() -> Self {
      Self::asc(DEFAULT_ORDER_FIELD, DEFAULT_ORDER_FIELD)
   }
}

/// Page window requested by the client.
///
/// `marker` is empty (first page), a decimal row offset, or [`LAST_MARKER`].
/// Only the magnitude of `limit` matters; its sign carries no direction.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
   /// Maximum number of rows per page
   pub limit: i64,
   /// Offset of the first row, or the `last` sentinel
   pub marker: String,
}

impl Pagination {
   pub fn new(limit: i64, marker: impl Into<String>) -> Self {
      Self {
         limit,
         marker: marker.into(),
      }
   }

   /// Whether the final page was requested.
   pub fn is_last(&self) -> bool {
      self.marker == LAST_MARKER
   }

   /// Row offset encoded in the marker.
   ///
   /// Anything that does not parse as an integer (including the `last`
   /// sentinel and the empty first-page marker) is offset 0. Negative offsets
   /// clamp to 0.
   pub fn offset(&self) -> i64 {
      self.marker.trim().parse::<i64>().unwrap_or(0).max(0)
   }

   /// Number of rows bound to `limit ?`.
   pub fn page_size(&self) -> i64 {
      self.limit.saturating_abs()
   }
}

/// Per-request switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryOptions {
   /// Skip the count query; the read reports no total
   pub no_count: bool,
}

/// Everything a paged read needs besides the base SQL.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiParams {
   /// Path the navigation links are built from, e.g. `/v1/users`
   pub requested_url_path: String,
   /// Activated filters, in declaration order
   pub filters: Vec<Filter>,
   /// Selected order, if any
   pub order: Option<Order>,
   pub pagination: Pagination,
   pub options: QueryOptions,
}

impl ApiParams {
   pub fn new(requested_url_path: impl Into<String>, pagination: Pagination) -> Self {
      Self {
         requested_url_path: requested_url_path.into(),
         pagination,
         ..Default::default()
      }
   }

   pub fn with_filters(mut self, filters: Vec<Filter>) -> Self {
      self.filters = filters;
      self
   }

   pub fn with_order(mut self, order: Order) -> Self {
      self.order = Some(order);
      self
   }

   pub fn with_options(mut self, options: QueryOptions) -> Self {
      self.options = options;
      self
   }
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn activate_copies_declaration() {
      let declared = Filter::new("status", "u.status");
      let active = declared.activate("active");

      assert_eq!(active.value, "active");
      assert_eq!(active.where_field, "u.status");
      assert!(declared.value.is_empty());
   }

   #[test]
   fn offset_parses_decimal_markers() {
      assert_eq!(Pagination::new(10, "50").offset(), 50);
      assert_eq!(Pagination::new(10, "").offset(), 0);
      assert_eq!(Pagination::new(10, "last").offset(), 0);
      assert_eq!(Pagination::new(10, "abc").offset(), 0);
      assert_eq!(Pagination::new(10, "-20").offset(), 0);
   }

   #[test]
   fn last_marker_is_exact() {
      assert!(Pagination::new(10, "last").is_last());
      assert!(!Pagination::new(10, "LAST").is_last());
      assert!(!Pagination::new(10, "").is_last());
   }

   #[test]
   fn page_size_ignores_sign() {
      assert_eq!(Pagination::new(-10, "").page_size(), 10);
      assert_eq!(Pagination::new(25, "").page_size(), 25);
   }

   #[test]
   fn api_params_serialize_to_camel_case() {
      let params = ApiParams::new("/v1/users", Pagination::new(10, ""))
         .with_order(Order::desc("newest", "created_at"));
      let json = serde_json::to_value(&params).unwrap();

      assert_eq!(json["requestedUrlPath"], "/v1/users");
      assert_eq!(json["order"]["orderField"], "created_at");
      assert_eq!(json["options"]["noCount"], false);
   }
}

//! Limit/offset pagination and the backward "last page" rewrite.
//!
//! A forward page appends the requested order and `limit ? offset ?`, with
//! the offset taken from the marker.
//!
//! The `last` marker asks for the final page without knowing the total up
//! front: the sort order is reversed, the database returns the first `limit`
//! rows of that reversed order at offset 0, and the executor reverses the
//! fetched rows so callers still see them in forward order.
//!
//! # Example
//!
//! ```
//! use sqlx_query_compose::{Order, Pagination, paginate};
//!
//! let order = Order::asc("id", "id");
//! let (sql, values) = paginate("select * from users", Some(&order), &Pagination::new(10, "last"))?;
//!
//! assert_eq!(sql, "select * from users order by id desc limit ? offset ?");
//! assert_eq!(values, vec![serde_json::json!(10), serde_json::json!(0)]);
//! # Ok::<(), sqlx_query_compose::Error>(())
//! ```

use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use crate::Result;
use crate::clauses::ClauseFacts;
use crate::request::{DEFAULT_ORDER_FIELD, Order, Pagination};

/// Build the `order by` clause for one sort key.
pub(crate) fn build_order_by(order: &Order) -> String {
   let field = order.order_field.trim();
   if order.desc {
      format!("order by {field} desc")
   } else {
      format!("order by {field}")
   }
}

/// Split off the last whitespace-delimited token.
fn split_last_token(query: &str) -> (&str, &str) {
   let trimmed = query.trim_end();
   match trimmed.char_indices().rev().find(|(_, c)| c.is_whitespace()) {
      Some((idx, ws)) => (trimmed[..idx].trim_end(), &trimmed[idx + ws.len_utf8()..]),
      None => ("", trimmed),
   }
}

/// Reverse the sort of a query for a backward page.
///
/// - trailing `desc`: drop it, leaving the ascending form
/// - trailing `asc`: turn it into `desc`
/// - other top-level `order by`: append `desc`
/// - no `order by`: the declared order reversed, or `id` descending
fn reverse_order(query: &str, facts: ClauseFacts, order: Option<&Order>) -> String {
   if facts.has_trailing_desc {
      return split_last_token(query).0.to_string();
   }

   if facts.has_order_by {
      let (head, last) = split_last_token(query);
      if last.eq_ignore_ascii_case("asc") {
         return format!("{head} desc");
      }
      return format!("{query} desc");
   }

   match order {
      Some(order) if order.desc => format!("{query} order by {}", order.order_field.trim()),
      Some(order) => format!("{query} order by {} desc", order.order_field.trim()),
      None => format!("{query} order by {DEFAULT_ORDER_FIELD} desc"),
   }
}

/// Append ordering and `limit ? offset ?` to `query`.
///
/// Returns the rewritten query and the values for the two placeholders,
/// `[limit, offset]`. A query that already orders at its top level keeps its
/// own order on forward pages.
///
/// On a `last` page an existing multi-key `order by a, b` only has its final
/// key reversed, so the fetched page is not the true last page of that order.
/// Queries that need backward pages over several keys should leave ordering
/// to the declared [`Order`] instead.
pub fn paginate(
   query: &str,
   order: Option<&Order>,
   pagination: &Pagination,
) -> Result<(String, Vec<JsonValue>)> {
   let mut sql = query.trim().to_string();
   let facts = ClauseFacts::analyze(&sql)?;

   let order = order.filter(|o| {
      if o.order_field.trim().is_empty() {
         warn!(order = %o.name, "ignoring order without an order field");
         return false;
      }
      true
   });

   let offset = if pagination.is_last() {
      sql = reverse_order(&sql, facts, order);
      0
   } else {
      if let Some(order) = order
         && !facts.has_order_by
      {
         sql = format!("{sql} {}", build_order_by(order));
      }
      pagination.offset()
   };

   let sql = format!("{sql} limit ? offset ?").trim().to_string();
   let limit = pagination.page_size();

   debug!(
      limit,
      offset,
      backward = pagination.is_last(),
      query = %sql,
      "paginated query"
   );
   Ok((sql, vec![JsonValue::from(limit), JsonValue::from(offset)]))
}

//! Filter injection: turns activated filters into a positional `where`/`and`
//! block on the top-level query.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use crate::Result;
use crate::clauses::ClauseFacts;
use crate::request::Filter;
use crate::subquery::replace_in_main_query;

fn where_keyword() -> &'static Regex {
   static RE: OnceLock<Regex> = OnceLock::new();
   RE.get_or_init(|| Regex::new(r"(?i)\swhere\s").expect("invalid regex"))
}

fn group_by_keyword() -> &'static Regex {
   static RE: OnceLock<Regex> = OnceLock::new();
   RE.get_or_init(|| Regex::new(r"(?i)\sgroup\s+by\s").expect("invalid regex"))
}

/// Build `a=? and b=?` plus the values to bind, in declaration order.
fn build_predicate(filters: &[&Filter]) -> (String, Vec<JsonValue>) {
   let predicate = filters
      .iter()
      .map(|f| format!("{}=?", f.where_field.trim()))
      .collect::<Vec<_>>()
      .join(" and ");
   let values = filters
      .iter()
      .map(|f| JsonValue::String(f.value.clone()))
      .collect();

   (predicate, values)
}

/// Add `filters` to the top level of `query`.
///
/// - no `where`, no `group by`: ` where <predicate>` is appended
/// - no `where`, with `group by`: `where <predicate>` goes right before `group by`
/// - `where`, no `group by`: ` and <predicate>` is appended
/// - `where` and `group by`: `<predicate> and` goes right after `where`
///
/// Returns the rewritten query and one bound value per injected filter.
/// Filters without a `where_field` are skipped.
pub fn inject_filters(query: &str, filters: &[Filter]) -> Result<(String, Vec<JsonValue>)> {
   let active: Vec<&Filter> = filters
      .iter()
      .filter(|f| {
         if f.where_field.trim().is_empty() {
            warn!(filter = %f.name, "skipping filter without a where field");
            return false;
         }
         true
      })
      .collect();

   if active.is_empty() {
      return Ok((query.to_string(), Vec::new()));
   }

   let (predicate, values) = build_predicate(&active);
   let facts = ClauseFacts::analyze(query)?;

   let sql = match (facts.has_where, facts.has_group_by) {
      (false, true) => replace_in_main_query(
         query,
         group_by_keyword(),
         &format!(" where {predicate} group by "),
      )?,
      (false, false) => format!("{} where {predicate}", query.trim_end()),
      (true, true) => {
         replace_in_main_query(query, where_keyword(), &format!(" where {predicate} and "))?
      }
      (true, false) => format!("{} and {predicate}", query.trim_end()),
   };

   let sql = sql.trim().to_string();
   debug!(filters = values.len(), query = %sql, "injected filters");
   Ok((sql, values))
}

#[cfg(test)]
mod tests {
   use super::*;
   use serde_json::json;

   fn filters(pairs: &[(&str, &str)]) -> Vec<Filter> {
      pairs
         .iter()
         .map(|(field, value)| Filter::new(*field, *field).activate(*value))
         .collect()
   }

   #[test]
   fn no_filters_is_a_no_op() {
      let (sql, values) = inject_filters("select * from users", &[]).unwrap();
      assert_eq!(sql, "select * from users");
      assert!(values.is_empty());
   }

   #[test]
   fn appends_where_to_plain_query() {
      let (sql, values) =
         inject_filters("select * from users", &filters(&[("status", "active")])).unwrap();

      assert_eq!(sql, "select * from users where status=?");
      assert_eq!(values, vec![json!("active")]);
   }

   #[test]
   fn joins_multiple_filters_with_and_in_declaration_order() {
      let (sql, values) = inject_filters(
         "select * from users",
         &filters(&[("status", "active"), ("role", "admin"), ("team", "7")]),
      )
      .unwrap();

      assert_eq!(sql, "select * from users where status=? and role=? and team=?");
      assert_eq!(values, vec![json!("active"), json!("admin"), json!("7")]);
      assert_eq!(sql.matches("=?").count(), 3);
   }

   #[test]
   fn appends_and_to_existing_where() {
      let (sql, values) = inject_filters(
         "select * from users where deleted_at is null",
         &filters(&[("status", "active")]),
      )
      .unwrap();

      assert_eq!(sql, "select * from users where deleted_at is null and status=?");
      assert_eq!(values, vec![json!("active")]);
   }

   #[test]
   fn inserts_where_before_group_by() {
      let (sql, _) = inject_filters(
         "select kind, count(1) from items group by kind",
         &filters(&[("status", "open")]),
      )
      .unwrap();

      assert_eq!(
         sql,
         "select kind, count(1) from items where status=? group by kind"
      );
   }

   #[test]
   fn splices_after_where_when_group_by_present() {
      let (sql, values) = inject_filters(
         "SELECT kind, COUNT(1) FROM items WHERE price > 10 GROUP BY kind",
         &filters(&[("status", "open"), ("owner", "me")]),
      )
      .unwrap();

      assert_eq!(
         sql,
         "SELECT kind, COUNT(1) FROM items where status=? and owner=? and price > 10 GROUP BY kind"
      );
      assert_eq!(values, vec![json!("open"), json!("me")]);
   }

   #[test]
   fn subquery_clauses_do_not_count() {
      let (sql, _) = inject_filters(
         "select * from users where id in (select user_id from teams where name = 'x' group by user_id)",
         &filters(&[("status", "active")]),
      )
      .unwrap();

      assert_eq!(
         sql,
         "select * from users where id in (select user_id from teams where name = 'x' group by user_id) and status=?"
      );
   }

   #[test]
   fn where_only_inside_subquery_appends_where() {
      let (sql, _) = inject_filters(
         "select * from (select * from users where age > 18) adults",
         &filters(&[("status", "active")]),
      )
      .unwrap();

      assert_eq!(
         sql,
         "select * from (select * from users where age > 18) adults where status=?"
      );
   }

   #[test]
   fn skips_filters_without_where_field() {
      let declared = vec![
         Filter::new("q", "").activate("ignored"),
         Filter::new("status", "status").activate("active"),
      ];

      let (sql, values) = inject_filters("select * from users", &declared).unwrap();

      assert_eq!(sql, "select * from users where status=?");
      assert_eq!(values, vec![json!("active")]);
   }

   #[test]
   fn only_blank_filters_is_a_no_op() {
      let declared = vec![Filter::new("q", "  ").activate("x")];
      let (sql, values) = inject_filters("select * from users", &declared).unwrap();

      assert_eq!(sql, "select * from users");
      assert!(values.is_empty());
   }

   #[test]
   fn values_are_never_interpolated() {
      let (sql, values) = inject_filters(
         "select * from users",
         &filters(&[("name", "x' or '1'='1")]),
      )
      .unwrap();

      assert_eq!(sql, "select * from users where name=?");
      assert_eq!(values, vec![json!("x' or '1'='1")]);
   }

   #[test]
   fn unbalanced_query_fails() {
      let result = inject_filters("select * from (users", &filters(&[("a", "1")]));
      assert!(result.is_err());
   }
}

//! SQL helpers for table-backed records.

use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::{Error, Result};

/// Columns every entity table carries.
pub const BASE_FIELDS: [&str; 2] = ["id", "created_at"];

/// Columns maintained by the database rather than written by callers.
const GENERATED_FIELDS: [&str; 2] = ["created_at", "updated_at"];

/// A record stored in one table with an integer `id` and a `created_at`
/// timestamp.
pub trait Entity {
   const TABLE_NAME: &'static str;

   /// Columns beyond [`BASE_FIELDS`], in select order.
   const FIELDS: &'static [&'static str];

   /// Row id, 0 for a record that has not been stored yet.
   fn id(&self) -> i64;
}

/// `select id, created_at, <fields> from <table>`, plus the given predicates
/// joined with `and`.
///
/// ```
/// use sqlx_paged_query::{Entity, select_query};
///
/// struct User;
///
/// impl Entity for User {
///    const TABLE_NAME: &'static str = "users";
///    const FIELDS: &'static [&'static str] = &["name", "status"];
///
///    fn id(&self) -> i64 {
///       0
///    }
/// }
///
/// assert_eq!(
///    select_query::<User>(&["deleted_at is null"]),
///    "select id, created_at, name, status from users where deleted_at is null"
/// );
/// ```
pub fn select_query<E: Entity>(predicates: &[&str]) -> String {
   let columns = BASE_FIELDS
      .iter()
      .chain(E::FIELDS)
      .copied()
      .collect::<Vec<_>>()
      .join(", ");
   let sql = format!("select {columns} from {}", E::TABLE_NAME);

   if predicates.is_empty() {
      sql
   } else {
      format!("{sql} where {}", predicates.join(" and "))
   }
}

/// Insert or update statement for `entity`, with its values in placeholder
/// order.
///
/// Records with a positive id are updated by id, others inserted. Generated
/// columns are never written. Values are taken from the entity's serde
/// representation by column name; a missing column binds `null`.
pub fn save_statement<E: Entity + Serialize>(entity: &E) -> Result<(String, Vec<JsonValue>)> {
   let JsonValue::Object(mut record) = serde_json::to_value(entity)? else {
      return Err(Error::InvalidRequest(format!(
         "{} record does not serialize to an object",
         E::TABLE_NAME
      )));
   };

   let fields: Vec<&str> = E::FIELDS
      .iter()
      .copied()
      .filter(|f| !GENERATED_FIELDS.contains(f))
      .collect();
   let mut values: Vec<JsonValue> = fields
      .iter()
      .map(|f| record.remove(*f).unwrap_or(JsonValue::Null))
      .collect();

   let id = entity.id();
   if id > 0 {
      let assignments = fields
         .iter()
         .map(|f| format!("{f}=?"))
         .collect::<Vec<_>>()
         .join(", ");
      values.push(JsonValue::from(id));
      return Ok((
         format!("update {} set {assignments} where id=?", E::TABLE_NAME),
         values,
      ));
   }

   let placeholders = vec!["?"; fields.len()].join(", ");
   Ok((
      format!(
         "insert into {} ({}) values ({placeholders})",
         E::TABLE_NAME,
         fields.join(", ")
      ),
      values,
   ))
}

/// Builds a comma-separated column list, optionally qualified by a table
/// alias, with some columns left out.
#[derive(Debug, Clone, Default)]
pub struct FieldBuilder {
   alias: String,
   fields: Vec<String>,
   exclude: Vec<String>,
}

impl FieldBuilder {
   pub fn new() -> Self {
      Self::default()
   }

   pub fn alias(mut self, alias: impl Into<String>) -> Self {
      self.alias = alias.into();
      self
   }

   pub fn fields<I, F>(mut self, fields: I) -> Self
   where
      I: IntoIterator<Item = F>,
      F: Into<String>,
   {
      self.fields = fields.into_iter().map(Into::into).collect();
      self
   }

   pub fn exclude<I, F>(mut self, fields: I) -> Self
   where
      I: IntoIterator<Item = F>,
      F: Into<String>,
   {
      self.exclude = fields.into_iter().map(Into::into).collect();
      self
   }

   pub fn build(&self) -> String {
      self
         .fields
         .iter()
         .filter(|f| !self.exclude.contains(f))
         .map(|f| {
            if self.alias.is_empty() {
               f.clone()
            } else {
               format!("{}.{f}", self.alias)
            }
         })
         .collect::<Vec<_>>()
         .join(", ")
   }
}

#[cfg(test)]
mod tests {
   use serde_json::json;

   use super::*;

   #[derive(Serialize)]
   struct User {
      id: i64,
      name: String,
      status: String,
   }

   impl Entity for User {
      const TABLE_NAME: &'static str = "users";
      const FIELDS: &'static [&'static str] = &["name", "status", "updated_at"];

      fn id(&self) -> i64 {
         self.id
      }
   }

   fn user(id: i64) -> User {
      User {
         id,
         name: "Alice".into(),
         status: "active".into(),
      }
   }

   #[test]
   fn select_without_predicates() {
      assert_eq!(
         select_query::<User>(&[]),
         "select id, created_at, name, status, updated_at from users"
      );
   }

   #[test]
   fn select_joins_predicates_with_and() {
      assert_eq!(
         select_query::<User>(&["status = 'active'", "name like 'A%'"]),
         "select id, created_at, name, status, updated_at from users where status = 'active' and name like 'A%'"
      );
   }

   #[test]
   fn new_record_is_inserted() {
      let (sql, values) = save_statement(&user(0)).unwrap();
      assert_eq!(sql, "insert into users (name, status) values (?, ?)");
      assert_eq!(values, vec![json!("Alice"), json!("active")]);
   }

   #[test]
   fn stored_record_is_updated_by_id() {
      let (sql, values) = save_statement(&user(42)).unwrap();
      assert_eq!(sql, "update users set name=?, status=? where id=?");
      assert_eq!(values, vec![json!("Alice"), json!("active"), json!(42)]);
   }

   #[test]
   fn field_builder_qualifies_and_excludes() {
      let fields = FieldBuilder::new()
         .alias("u")
         .fields(["id", "name", "password_hash", "status"])
         .exclude(["password_hash"])
         .build();

      assert_eq!(fields, "u.id, u.name, u.status");
   }

   #[test]
   fn field_builder_without_alias() {
      let fields = FieldBuilder::new().fields(["id", "name"]).build();
      assert_eq!(fields, "id, name");
   }
}

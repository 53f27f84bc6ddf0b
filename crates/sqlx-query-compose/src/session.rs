//! Database session: the seam between query composition and execution.
//!
//! [`DbSession`] is what the executor talks to. [`SqliteSession`] implements
//! it over `sqlx-sqlite-conn-mgr` with a lazily opened write transaction:
//!
//! 1. Reads use the read pool, or the open transaction when there is one
//! 2. The first write acquires the writer and runs `BEGIN IMMEDIATE`
//! 3. With auto-commit on, every write commits (or rolls back) on its own
//! 4. Otherwise [`DbSession::close`] commits, or rolls back when aborted

use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx_sqlite_conn_mgr::{SqliteDatabase, SqliteDatabaseConfig, WriteGuard};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::decode::decode_rows;
use crate::{Error, Result};

/// One result row, columns in select order.
pub type Row = IndexMap<String, JsonValue>;

/// Result returned from write operations (e.g. INSERT, UPDATE, DELETE).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteQueryResult {
   /// The number of rows affected by the write operation.
   pub rows_affected: u64,
   /// The last inserted row ID (SQLite ROWID).
   pub last_insert_id: i64,
}

/// Executes SQL with positional `?` bind values.
///
/// The query executor only uses the read methods; writes and the transaction
/// lifecycle belong to whoever owns the session.
pub trait DbSession: Send {
   /// Run a query and return every row.
   fn read_many(
      &mut self,
      query: &str,
      values: Vec<JsonValue>,
   ) -> impl Future<Output = Result<Vec<Row>>> + Send;

   /// Run a query expected to return zero or one row.
   fn read_one(
      &mut self,
      query: &str,
      values: Vec<JsonValue>,
   ) -> impl Future<Output = Result<Option<Row>>> + Send;

   /// Run a write statement inside the session's transaction.
   fn write(
      &mut self,
      query: &str,
      values: Vec<JsonValue>,
   ) -> impl Future<Output = Result<WriteQueryResult>> + Send;

   /// Finish the open transaction: roll back when `aborted`, commit otherwise.
   fn close(&mut self, aborted: bool) -> impl Future<Output = Result<()>> + Send;

   /// Commit after every write instead of waiting for [`close`](Self::close).
   fn set_auto_commit(&mut self, auto: bool);
}

/// [`DbSession`] over a pooled SQLite database.
///
/// Dropping a session with an open transaction discards the transaction.
pub struct SqliteSession {
   db: Arc<SqliteDatabase>,
   writer: Option<WriteGuard>,
   auto_commit: bool,
   id: Uuid,
}

impl SqliteSession {
   /// Create a session on an already connected database.
   pub fn new(db: Arc<SqliteDatabase>, auto_commit: bool) -> Self {
      Self {
         db,
         writer: None,
         auto_commit,
         id: Uuid::new_v4(),
      }
   }

   /// Connect to the database at `path` and open a session on it.
   pub async fn connect(
      path: impl AsRef<Path>,
      custom_config: Option<SqliteDatabaseConfig>,
      auto_commit: bool,
   ) -> Result<Self> {
      let db = SqliteDatabase::connect(path, custom_config).await?;
      Ok(Self::new(db, auto_commit))
   }

   /// The database this session runs on.
   pub fn database(&self) -> &Arc<SqliteDatabase> {
      &self.db
   }

   /// Identifier attached to this session's log events.
   pub fn id(&self) -> Uuid {
      self.id
   }

   /// Whether a write transaction is open.
   pub fn in_transaction(&self) -> bool {
      self.writer.is_some()
   }

   async fn fetch(&mut self, query: &str, values: Vec<JsonValue>) -> Result<Vec<Row>> {
      let mut q = sqlx::query(query);
      for value in values {
         q = bind_value(q, value);
      }

      let rows = match self.writer.as_mut() {
         Some(writer) => q.fetch_all(&mut **writer).await?,
         None => q.fetch_all(self.db.read_pool()?).await?,
      };

      debug!(session = %self.id, rows = rows.len(), "read rows");
      decode_rows(rows)
   }

   async fn finish(&mut self, commit: bool) -> Result<()> {
      let Some(mut writer) = self.writer.take() else {
         return Ok(());
      };

      let statement = if commit { "COMMIT" } else { "ROLLBACK" };
      match sqlx::query(statement).execute(&mut *writer).await {
         Ok(_) => {
            debug!(session = %self.id, statement, "finished transaction");
            Ok(())
         }
         Err(e) if commit => Err(rollback(&mut writer, e.into()).await),
         Err(e) => {
            writer.close_on_drop();
            Err(e.into())
         }
      }
   }
}

impl DbSession for SqliteSession {
   async fn read_many(&mut self, query: &str, values: Vec<JsonValue>) -> Result<Vec<Row>> {
      self.fetch(query, values).await
   }

   async fn read_one(&mut self, query: &str, values: Vec<JsonValue>) -> Result<Option<Row>> {
      let mut rows = self.fetch(query, values).await?;
      match rows.len() {
         0 => Ok(None),
         1 => Ok(rows.pop()),
         count => Err(Error::MultipleRowsReturned(count)),
      }
   }

   async fn write(&mut self, query: &str, values: Vec<JsonValue>) -> Result<WriteQueryResult> {
      let writer = match self.writer.take() {
         Some(writer) => self.writer.insert(writer),
         None => {
            let mut writer = self.db.acquire_writer().await?;
            sqlx::query("BEGIN IMMEDIATE").execute(&mut *writer).await?;
            debug!(session = %self.id, "began transaction");
            self.writer.insert(writer)
         }
      };

      let mut q = sqlx::query(query);
      for value in values {
         q = bind_value(q, value);
      }

      match q.execute(&mut **writer).await {
         Ok(done) => {
            let result = WriteQueryResult {
               rows_affected: done.rows_affected(),
               last_insert_id: done.last_insert_rowid(),
            };
            if self.auto_commit {
               self.finish(true).await?;
            }
            Ok(result)
         }
         Err(e) => {
            warn!(session = %self.id, error = %e, "write failed");
            if self.auto_commit
               && let Some(mut writer) = self.writer.take()
            {
               return Err(rollback(&mut writer, e.into()).await);
            }
            Err(e.into())
         }
      }
   }

   async fn close(&mut self, aborted: bool) -> Result<()> {
      self.finish(!aborted).await
   }

   fn set_auto_commit(&mut self, auto: bool) {
      self.auto_commit = auto;
   }
}

impl Drop for SqliteSession {
   fn drop(&mut self) {
      if let Some(writer) = self.writer.as_mut() {
         warn!(session = %self.id, "session dropped with an open transaction; discarding it");
         writer.close_on_drop();
      }
   }
}

/// Roll back after `error`. If the rollback fails too, the writer connection
/// is closed instead of going back to the pool.
async fn rollback(writer: &mut WriteGuard, error: Error) -> Error {
   match sqlx::query("ROLLBACK").execute(&mut **writer).await {
      Ok(_) => error,
      Err(rollback_err) => {
         writer.close_on_drop();
         Error::TransactionRollbackFailed {
            transaction_error: error.to_string(),
            rollback_error: rollback_err.to_string(),
         }
      }
   }
}

/// Helper function to bind a JSON value to a SQLx query
pub(crate) fn bind_value<'a>(
   query: sqlx::query::Query<'a, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'a>>,
   value: JsonValue,
) -> sqlx::query::Query<'a, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'a>> {
   match value {
      JsonValue::Null => query.bind(None::<JsonValue>),
      JsonValue::String(s) => query.bind(s),
      JsonValue::Bool(b) => query.bind(b),
      JsonValue::Number(number) => {
         // Preserve integer precision by binding as i64 when possible
         if let Some(int_val) = number.as_i64() {
            query.bind(int_val)
         } else {
            query.bind(number.as_f64().unwrap_or_default())
         }
      }
      other => query.bind(other),
   }
}

#[cfg(test)]
mod tests {
   use super::*;
   use serde_json::json;
   use tempfile::TempDir;

   async fn create_session(auto_commit: bool) -> (SqliteSession, TempDir) {
      let temp_dir = TempDir::new().expect("Failed to create temp directory");
      let session = SqliteSession::connect(temp_dir.path().join("test.db"), None, auto_commit)
         .await
         .expect("Failed to connect to test database");

      (session, temp_dir)
   }

   #[tokio::test]
   async fn test_write_and_read_back() {
      let (mut session, _temp) = create_session(true).await;

      session
         .write("CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT, score REAL, data BLOB)", vec![])
         .await
         .unwrap();

      let result = session
         .write(
            "INSERT INTO t (name, score, data) VALUES (?, ?, X'CAFE')",
            vec![json!("Alice"), json!(9.5)],
         )
         .await
         .unwrap();

      assert_eq!(result, WriteQueryResult { rows_affected: 1, last_insert_id: 1 });
      assert!(!session.in_transaction());

      let rows = session.read_many("SELECT * FROM t", vec![]).await.unwrap();
      assert_eq!(rows.len(), 1);
      assert_eq!(rows[0]["id"], json!(1));
      assert_eq!(rows[0]["name"], json!("Alice"));
      assert_eq!(rows[0]["score"], json!(9.5));
      assert_eq!(rows[0]["data"], json!("yv4="));

      let columns: Vec<&str> = rows[0].keys().map(String::as_str).collect();
      assert_eq!(columns, vec!["id", "name", "score", "data"]);

      session.database().remove().await.unwrap();
   }

   #[tokio::test]
   async fn test_read_one() {
      let (mut session, _temp) = create_session(true).await;
      session
         .write("CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT)", vec![])
         .await
         .unwrap();
      session
         .write("INSERT INTO t (name) VALUES (?), (?)", vec![json!("Alice"), json!("Bob")])
         .await
         .unwrap();

      let none = session
         .read_one("SELECT * FROM t WHERE id = ?", vec![json!(999)])
         .await
         .unwrap();
      assert!(none.is_none());

      let row = session
         .read_one("SELECT name FROM t WHERE id = ?", vec![json!(2)])
         .await
         .unwrap()
         .unwrap();
      assert_eq!(row["name"], json!("Bob"));

      let err = session.read_one("SELECT * FROM t", vec![]).await.unwrap_err();
      assert!(matches!(err, Error::MultipleRowsReturned(2)));

      session.database().remove().await.unwrap();
   }

   #[tokio::test]
   async fn test_manual_transaction_commit() {
      let (mut session, _temp) = create_session(false).await;

      session
         .write("CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT)", vec![])
         .await
         .unwrap();
      session
         .write("INSERT INTO t (name) VALUES (?)", vec![json!("Alice")])
         .await
         .unwrap();
      assert!(session.in_transaction());

      // Reads inside the transaction see uncommitted rows
      let rows = session.read_many("SELECT * FROM t", vec![]).await.unwrap();
      assert_eq!(rows.len(), 1);

      session.close(false).await.unwrap();
      assert!(!session.in_transaction());

      let rows = session.read_many("SELECT * FROM t", vec![]).await.unwrap();
      assert_eq!(rows.len(), 1);

      session.database().remove().await.unwrap();
   }

   #[tokio::test]
   async fn test_aborted_close_rolls_back() {
      let (mut session, _temp) = create_session(true).await;
      session
         .write("CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT)", vec![])
         .await
         .unwrap();

      session.set_auto_commit(false);
      session
         .write("INSERT INTO t (name) VALUES (?)", vec![json!("Alice")])
         .await
         .unwrap();
      session.close(true).await.unwrap();

      let rows = session.read_many("SELECT * FROM t", vec![]).await.unwrap();
      assert!(rows.is_empty());

      session.database().remove().await.unwrap();
   }

   #[tokio::test]
   async fn test_failed_auto_commit_write_releases_writer() {
      let (mut session, _temp) = create_session(true).await;

      let result = session.write("INSERT INTO missing (x) VALUES (1)", vec![]).await;
      assert!(result.is_err());
      assert!(!session.in_transaction());

      // Writer is free again
      session
         .write("CREATE TABLE t (id INTEGER PRIMARY KEY)", vec![])
         .await
         .unwrap();

      session.database().remove().await.unwrap();
   }

   #[tokio::test]
   async fn test_close_without_transaction_is_noop() {
      let (mut session, _temp) = create_session(false).await;
      session.close(true).await.unwrap();
      session.close(false).await.unwrap();
      session.database().remove().await.unwrap();
   }

   #[tokio::test]
   async fn test_null_and_bool_binding() {
      let (mut session, _temp) = create_session(true).await;
      session
         .write("CREATE TABLE t (id INTEGER PRIMARY KEY, flag INTEGER, note TEXT)", vec![])
         .await
         .unwrap();
      session
         .write(
            "INSERT INTO t (flag, note) VALUES (?, ?)",
            vec![json!(true), JsonValue::Null],
         )
         .await
         .unwrap();

      let row = session
         .read_one("SELECT flag, note FROM t", vec![])
         .await
         .unwrap()
         .unwrap();
      assert_eq!(row["flag"], json!(1));
      assert_eq!(row["note"], JsonValue::Null);

      session.database().remove().await.unwrap();
   }
}

//! SQLite database with a read pool and a single serialized writer

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use tracing::debug;

use crate::{Error, Result, SqliteDatabaseConfig, WriteGuard};

/// SQLite database with connection pooling for concurrent reads and exclusive writes.
///
/// ## Architecture
///
/// The database maintains two connection pools:
/// - **`read_pool`**: Pool of connections used for paged reads and count queries
/// - **`write_conn`**: Single-connection pool for exclusive write access (enforced by max_connections=1)
///
/// ## State Management
///
/// - **`wal_initialized`**: Tracks whether WAL journal mode has been enabled (lazy initialization)
/// - **`closed`**: Prevents use after the database has been closed
/// - **`path`**: Database file path for cleanup operations
///
/// ## Usage Pattern
///
/// ```text
/// 1. Connect to database (creates the file and both pools)
/// 2. Read operations: run on read_pool
/// 3. Write operations: acquire writer (lazily enables WAL on first call)
/// 4. Close (or remove) the database when done
/// ```
#[derive(Debug)]
pub struct SqliteDatabase {
   /// Pool of read connections (defaults to max_connections=6)
   read_pool: Pool<Sqlite>,

   /// Single read-write connection pool (max_connections=1) for serialized writes
   write_conn: Pool<Sqlite>,

   /// Tracks if WAL mode has been initialized (set on first write)
   wal_initialized: AtomicBool,

   /// Marks database as closed to prevent further operations
   closed: AtomicBool,

   /// Path to database file (used for cleanup)
   path: PathBuf,
}

impl SqliteDatabase {
   /// Open (creating if missing) the database at `path`.
   ///
   /// Parent directories are created as needed. The writer pool connects
   /// eagerly so the file exists before any reader opens it; the read pool
   /// connects lazily.
   pub async fn connect(
      path: impl AsRef<Path>,
      custom_config: Option<SqliteDatabaseConfig>,
   ) -> Result<Arc<Self>> {
      let path = path.as_ref().to_path_buf();
      if path.as_os_str().is_empty() {
         return Err(Error::InvalidPath(path));
      }

      let config = custom_config.unwrap_or_default();

      if let Some(parent) = path.parent()
         && !parent.as_os_str().is_empty()
      {
         tokio::fs::create_dir_all(parent).await?;
      }

      let options = SqliteConnectOptions::new()
         .filename(&path)
         .busy_timeout(config.busy_timeout);

      let write_conn = SqlitePoolOptions::new()
         .max_connections(1)
         .idle_timeout(config.idle_timeout)
         .connect_with(options.clone().create_if_missing(true))
         .await?;

      let read_pool = SqlitePoolOptions::new()
         .max_connections(config.max_read_connections.max(1))
         .idle_timeout(config.idle_timeout)
         .connect_lazy_with(options);

      debug!(
         path = %path.display(),
         max_read_connections = config.max_read_connections,
         "opened sqlite database"
      );

      Ok(Arc::new(Self {
         read_pool,
         write_conn,
         wal_initialized: AtomicBool::new(false),
         closed: AtomicBool::new(false),
         path,
      }))
   }

   /// Path of the database file.
   pub fn path(&self) -> &Path {
      &self.path
   }

   /// Whether [`close`](Self::close) or [`remove`](Self::remove) has been called.
   pub fn is_closed(&self) -> bool {
      self.closed.load(Ordering::Acquire)
   }

   /// Pool for read queries.
   pub fn read_pool(&self) -> Result<&Pool<Sqlite>> {
      self.ensure_open()?;
      Ok(&self.read_pool)
   }

   /// Acquire the single writer connection, waiting if another writer holds it.
   ///
   /// The first successful call switches the database to WAL journal mode so
   /// readers keep working while a write transaction is open.
   pub async fn acquire_writer(&self) -> Result<WriteGuard> {
      self.ensure_open()?;

      let mut conn = self.write_conn.acquire().await?;

      if !self.wal_initialized.load(Ordering::Acquire) {
         sqlx::query("PRAGMA journal_mode = WAL")
            .execute(&mut *conn)
            .await?;
         self.wal_initialized.store(true, Ordering::Release);
         debug!(path = %self.path.display(), "enabled WAL journal mode");
      }

      Ok(WriteGuard::new(conn))
   }

   /// Close both pools. Waits for checked-out connections to be returned.
   pub async fn close(&self) -> Result<()> {
      if self.closed.swap(true, Ordering::AcqRel) {
         return Ok(());
      }

      self.read_pool.close().await;
      self.write_conn.close().await;
      debug!(path = %self.path.display(), "closed sqlite database");
      Ok(())
   }

   /// Close the database and delete its file along with the WAL and SHM files.
   pub async fn remove(&self) -> Result<()> {
      self.close().await?;

      let base = self.path.as_os_str().to_owned();
      for suffix in ["", "-wal", "-shm"] {
         let mut file = base.clone();
         file.push(suffix);
         match tokio::fs::remove_file(&file).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
         }
      }

      debug!(path = %self.path.display(), "removed sqlite database files");
      Ok(())
   }

   fn ensure_open(&self) -> Result<()> {
      if self.is_closed() {
         return Err(Error::DatabaseClosed);
      }
      Ok(())
   }
}

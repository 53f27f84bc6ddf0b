//! Exclusive access to the writer connection

use std::ops::{Deref, DerefMut};

use sqlx::Sqlite;
use sqlx::pool::PoolConnection;
use sqlx::sqlite::SqliteConnection;

/// Exclusive handle on the single writer connection.
///
/// The write pool holds exactly one connection, so while a guard is alive every
/// other call to [`SqliteDatabase::acquire_writer`](crate::SqliteDatabase::acquire_writer)
/// waits. Dropping the guard returns the connection to the pool.
#[must_use = "dropping the guard releases the writer immediately"]
#[derive(Debug)]
pub struct WriteGuard {
   conn: PoolConnection<Sqlite>,
}

impl WriteGuard {
   pub(crate) fn new(conn: PoolConnection<Sqlite>) -> Self {
      Self { conn }
   }

   /// Close the underlying connection instead of returning it to the pool.
   ///
   /// Use this when the connection may still carry an open transaction: SQLite
   /// discards uncommitted work when the connection closes.
   pub fn close_on_drop(&mut self) {
      self.conn.close_on_drop();
   }
}

impl Deref for WriteGuard {
   type Target = SqliteConnection;

   fn deref(&self) -> &Self::Target {
      &self.conn
   }
}

impl DerefMut for WriteGuard {
   fn deref_mut(&mut self) -> &mut Self::Target {
      &mut self.conn
   }
}

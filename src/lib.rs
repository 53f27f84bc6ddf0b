//! Paged list reads for web API handlers over SQLite.
//!
//! A handler declares which filters and orders its endpoint accepts, turns
//! the decoded query string into [`ApiParams`] with [`RequestParams`], and
//! calls [`find_all_paged`] with its base query. The result is a
//! [`PaginationResponse`] ready to serialize:
//!
//! ```no_run
//! use serde::{Deserialize, Serialize};
//! use sqlx_paged_query::{Config, Filter, Order, RequestParams, find_all_paged, open_session};
//!
//! #[derive(Deserialize, Serialize)]
//! struct User {
//!    id: i64,
//!    name: String,
//! }
//!
//! # async fn handler() -> sqlx_paged_query::Result<()> {
//! let config = Config::from_file("config.json").await?;
//! let catalog = RequestParams::new(
//!    vec![Filter::new("status", "status")],
//!    vec![Order::asc("name", "name")],
//!    &config,
//! );
//!
//! let params = catalog.extract("/v1/users", &[("status", "active"), ("limit", "20")]);
//! let mut session = open_session(&config, true).await?;
//! let response = find_all_paged(
//!    &mut session,
//!    "select id, name from users",
//!    &params,
//!    "users",
//!    |users: Vec<User>| users,
//!    vec![],
//! )
//! .await?;
//!
//! println!("{}", serde_json::to_string(&response)?);
//! # Ok(())
//! # }
//! ```

mod api;
mod config;
mod entity;
mod error;
mod params;

pub use api::{PaginationResponse, find_all_paged, open_session};
pub use config::{Config, DEFAULT_PAGINATION_LIMIT};
pub use entity::{BASE_FIELDS, Entity, FieldBuilder, save_statement, select_query};
pub use error::{Error, Result};
pub use params::{LIMIT_KEY, MARKER_KEY, NO_COUNT_KEY, ORDER_KEY, RequestParams};

// Re-export the core types handlers work with
pub use sqlx_query_compose::{
   ApiParams, DbSession, Filter, LAST_MARKER, Order, Pagination, PaginationNavigation,
   QueryOptions, SqliteSession, WriteQueryResult,
};

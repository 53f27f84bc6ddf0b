//! Clause-aware SQL composition for filtered, ordered, offset-paginated
//! SQLite reads.
//!
//! Callers hand over a base `select` and an [`ApiParams`] describing the
//! request. The crate injects filters, applies ordering and limit/offset
//! (including the `last` marker, which reverses the sort), derives a count
//! query, runs both through a [`DbSession`] and builds cursor navigation
//! links from the total.
//!
//! All rewriting is textual and only ever touches the top level of the
//! query: parenthesized subqueries are masked first, so a `where` or
//! `order by` inside them is never mistaken for the outer query's.

mod clauses;
mod decode;
mod error;
mod executor;
mod filter;
mod navigation;
mod pagination;
mod request;
mod session;
mod subquery;

pub use clauses::ClauseFacts;
pub use error::{Error, Result};
pub use executor::{PagedRows, PagedStatement, QueryExecutor, build_paged_statement};
pub use filter::inject_filters;
pub use navigation::{PaginationNavigation, navigate, previous_and_next};
pub use pagination::paginate;
pub use request::{
   ApiParams, DEFAULT_ORDER_FIELD, Filter, LAST_MARKER, Order, Pagination, QueryOptions,
};
pub use session::{DbSession, Row, SqliteSession, WriteQueryResult};
pub use subquery::{MaskedQuery, mask, replace_in_main_query, unmask};

// Re-export the connection manager so callers need only this crate
pub use sqlx_sqlite_conn_mgr::{SqliteDatabase, SqliteDatabaseConfig};

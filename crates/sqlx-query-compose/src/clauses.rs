//! Top-level clause detection.
//!
//! This is a text heuristic, not a SQL parser. Subqueries are masked first,
//! but keywords inside string literals or identifiers at the top level are
//! still seen as clauses. Queries handed to the engine are expected to keep
//! `where`, `group by` and `order by` out of literals.

use std::sync::OnceLock;

use regex::Regex;

use crate::Result;
use crate::subquery::mask;

fn whitespace_runs() -> &'static Regex {
   static RE: OnceLock<Regex> = OnceLock::new();
   RE.get_or_init(|| Regex::new(r"\s+").expect("invalid regex"))
}

/// Lower-case the query, collapse whitespace runs to one space and trim.
pub(crate) fn normalize(query: &str) -> String {
   whitespace_runs()
      .replace_all(&query.to_lowercase(), " ")
      .trim()
      .to_string()
}

/// Which clauses a query carries at its top level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClauseFacts {
   pub has_where: bool,
   pub has_group_by: bool,
   pub has_order_by: bool,
   /// The last token of the query is `desc`
   pub has_trailing_desc: bool,
}

impl ClauseFacts {
   /// Inspect `query` with subqueries masked out.
   pub fn analyze(query: &str) -> Result<Self> {
      let masked = mask(query)?;
      let normalized = normalize(&masked.sql);

      Ok(Self {
         has_where: normalized.contains(" where "),
         has_group_by: normalized.contains(" group by "),
         has_order_by: normalized.contains(" order by "),
         has_trailing_desc: normalized.rsplit(' ').next() == Some("desc"),
      })
   }
}

//! Subquery masking.
//!
//! Before any clause detection or pattern replacement touches a query, every
//! parenthesized fragment is swapped for an opaque `_sq_<n>_` token, innermost
//! first, so a `where` or `group by` inside a subquery can never be mistaken
//! for one at the top level. [`unmask`] puts the fragments back in reverse
//! extraction order, which rebuilds the nesting outer to inner.

use std::sync::OnceLock;

use regex::{NoExpand, Regex};
use tracing::trace;

use crate::{Error, Result};

/// Matches one innermost parenthesized fragment.
fn round_brackets() -> &'static Regex {
   static RE: OnceLock<Regex> = OnceLock::new();
   RE.get_or_init(|| Regex::new(r"\([^()]*\)").expect("invalid regex"))
}

fn placeholder(index: usize) -> String {
   format!("_sq_{index}_")
}

/// A query with every parenthesized fragment replaced by a placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskedQuery {
   /// Query text with placeholders in place of fragments
   pub sql: String,
   /// Extracted fragments; index `n` belongs to placeholder `_sq_<n>_`
   pub fragments: Vec<String>,
}

/// Fail unless every `(` has a matching `)`.
fn check_balanced(query: &str) -> Result<()> {
   let mut depth: usize = 0;
   for ch in query.chars() {
      match ch {
         '(' => depth += 1,
         ')' => {
            depth = depth.checked_sub(1).ok_or_else(|| {
               Error::MalformedClause(format!("unbalanced parentheses in query: {query}"))
            })?;
         }
         _ => {}
      }
   }

   if depth != 0 {
      return Err(Error::MalformedClause(format!(
         "unbalanced parentheses in query: {query}"
      )));
   }

   Ok(())
}

/// Extract every parenthesized fragment, innermost first, until none remain.
///
/// Unbalanced parentheses are rejected with [`Error::MalformedClause`].
pub fn mask(query: &str) -> Result<MaskedQuery> {
   check_balanced(query)?;

   let re = round_brackets();
   let mut sql = query.to_string();
   let mut fragments = Vec::new();

   while let Some(found) = re.find(&sql) {
      let range = found.range();
      fragments.push(found.as_str().to_string());
      sql.replace_range(range, &placeholder(fragments.len() - 1));
   }

   trace!(fragments = fragments.len(), masked = %sql, "masked subqueries");
   Ok(MaskedQuery { sql, fragments })
}

/// Restore fragments removed by [`mask`], last extracted first.
pub fn unmask(sql: &str, fragments: &[String]) -> String {
   let mut restored = sql.to_string();
   for (index, fragment) in fragments.iter().enumerate().rev() {
      restored = restored.replacen(&placeholder(index), fragment, 1);
   }
   restored
}

/// Replace the first match of `pattern` in the top-level query only.
///
/// The pattern runs against the masked text as written, so keyword patterns
/// should be case-insensitive and allow whitespace runs (`(?i)\swhere\s`).
/// `replacement` is inserted literally. Everything outside the match,
/// subquery fragments included, comes back unchanged.
pub fn replace_in_main_query(query: &str, pattern: &Regex, replacement: &str) -> Result<String> {
   let masked = mask(query)?;
   let replaced = pattern.replace(&masked.sql, NoExpand(replacement));
   Ok(unmask(&replaced, &masked.fragments))
}

//! Cursor navigation links for a paged response.
//!
//! Links take the form `<path>?marker=<m>&limit=<limit>` (`&` instead of `?`
//! when the path already carries a query string). API clients depend on this
//! exact format.

use serde::{Deserialize, Serialize};

use crate::request::{LAST_MARKER, Pagination};
use crate::{Error, Result};

/// First/previous/next/last links plus the total row count.
///
/// All links are `None` when the result set is empty.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationNavigation {
   pub first: Option<String>,
   pub previous: Option<String>,
   pub next: Option<String>,
   pub last: Option<String>,
   pub total: i64,
}

/// Offsets the previous and next links point at.
///
/// Returns `(previous, next)`. The marker is read as-is: anything that is not
/// an integer counts as 0, and a negative marker is not clamped, unlike the
/// offset bound to the query.
pub fn previous_and_next(pagination: &Pagination, total: i64) -> (i64, i64) {
   let limit = pagination.page_size();

   if pagination.is_last() {
      let previous = total.saturating_sub(limit.saturating_mul(2)).max(0);
      return (previous, total);
   }

   let marker = pagination.marker.parse::<i64>().unwrap_or(0);
   let next = marker.saturating_add(limit).min(total);
   let previous = if marker == 0 {
      0
   } else {
      marker.saturating_sub(limit).max(0)
   };

   (previous, next)
}

fn link(base: &str, marker: &str, limit: i64) -> String {
   format!("{base}marker={marker}&limit={limit}")
}

/// Build navigation for a page of `pagination` over `total` rows.
///
/// Fails with [`Error::InvalidRequest`] when `requested_url_path` is empty,
/// whatever the total.
pub fn navigate(
   requested_url_path: &str,
   pagination: &Pagination,
   total: i64,
) -> Result<PaginationNavigation> {
   if requested_url_path.is_empty() {
      return Err(Error::InvalidRequest(
         "the request URL path is empty".to_string(),
      ));
   }

   if total <= 0 {
      return Ok(PaginationNavigation::default());
   }

   let (previous, next) = previous_and_next(pagination, total);

   let separator = if requested_url_path.contains('?') {
      '&'
   } else {
      '?'
   };
   let base = format!("{requested_url_path}{separator}");
   let limit = pagination.page_size();

   Ok(PaginationNavigation {
      first: Some(link(&base, "", limit)),
      previous: Some(link(&base, &previous.to_string(), limit)),
      next: Some(link(&base, &next.to_string(), limit)),
      last: Some(link(&base, LAST_MARKER, limit)),
      total,
   })
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn first_page_offsets() {
      assert_eq!(previous_and_next(&Pagination::new(10, ""), 95), (0, 10));
   }

   #[test]
   fn middle_page_offsets() {
      assert_eq!(previous_and_next(&Pagination::new(10, "50"), 95), (40, 60));
   }

   #[test]
   fn last_marker_offsets() {
      assert_eq!(previous_and_next(&Pagination::new(10, "last"), 95), (75, 95));
   }

   #[test]
   fn last_marker_with_small_total_clamps_previous() {
      assert_eq!(previous_and_next(&Pagination::new(10, "last"), 15), (0, 15));
   }

   #[test]
   fn next_never_passes_total() {
      assert_eq!(previous_and_next(&Pagination::new(10, "90"), 95), (80, 95));
   }

   #[test]
   fn previous_never_goes_negative() {
      assert_eq!(previous_and_next(&Pagination::new(10, "5"), 95), (0, 15));
   }

   #[test]
   fn garbage_marker_behaves_like_first_page() {
      assert_eq!(previous_and_next(&Pagination::new(10, "abc"), 95), (0, 10));
   }

   #[test]
   fn negative_marker_is_not_clamped() {
      assert_eq!(previous_and_next(&Pagination::new(10, "-5"), 95), (0, 5));
   }

   #[test]
   fn padded_marker_is_not_an_integer() {
      assert_eq!(previous_and_next(&Pagination::new(10, " 50"), 95), (0, 10));
   }

   #[test]
   fn builds_all_four_links() {
      let nav = navigate("/v1/users", &Pagination::new(10, "50"), 95).unwrap();

      assert_eq!(nav.first.as_deref(), Some("/v1/users?marker=&limit=10"));
      assert_eq!(nav.previous.as_deref(), Some("/v1/users?marker=40&limit=10"));
      assert_eq!(nav.next.as_deref(), Some("/v1/users?marker=60&limit=10"));
      assert_eq!(nav.last.as_deref(), Some("/v1/users?marker=last&limit=10"));
      assert_eq!(nav.total, 95);
   }

   #[test]
   fn appends_to_existing_query_string() {
      let nav = navigate("/v1/users?status=active", &Pagination::new(10, ""), 95).unwrap();

      assert_eq!(
         nav.next.as_deref(),
         Some("/v1/users?status=active&marker=10&limit=10")
      );
   }

   #[test]
   fn last_page_links() {
      let nav = navigate("/v1/users", &Pagination::new(10, "last"), 95).unwrap();

      assert_eq!(nav.previous.as_deref(), Some("/v1/users?marker=75&limit=10"));
      assert_eq!(nav.next.as_deref(), Some("/v1/users?marker=95&limit=10"));
   }

   #[test]
   fn empty_total_yields_empty_navigation() {
      let nav = navigate("/v1/users", &Pagination::new(10, ""), 0).unwrap();
      assert_eq!(nav, PaginationNavigation::default());
   }

   #[test]
   fn empty_path_is_invalid_regardless_of_total() {
      for total in [0, 95] {
         let result = navigate("", &Pagination::new(10, ""), total);
         assert!(matches!(result, Err(Error::InvalidRequest(_))));
      }
   }

   #[test]
   fn serializes_missing_links_as_null() {
      let json = serde_json::to_value(PaginationNavigation::default()).unwrap();
      assert_eq!(
         json,
         serde_json::json!({
            "first": null,
            "previous": null,
            "next": null,
            "last": null,
            "total": 0
         })
      );
   }
}

use serde::{Serialize, Serializer};

/// Result type alias for facade operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned to API handlers.
///
/// Serializes as `{ "code": ..., "message": ... }`. Messages never carry
/// driver details; those stay reachable through `source()` for logging.
#[derive(Debug, thiserror::Error)]
pub enum Error {
   /// Fetching or mapping a page failed.
   #[error("unable to read paged {label}")]
   ReadPaged {
      label: String,
      #[source]
      source: sqlx_query_compose::Error,
   },

   /// Counting the full result set failed.
   #[error("unable to count paged {label}")]
   CountPaged {
      label: String,
      #[source]
      source: sqlx_query_compose::Error,
   },

   /// The request cannot be served as given.
   #[error("invalid request: {0}")]
   InvalidRequest(String),

   /// Configuration could not be loaded or is out of range.
   #[error("invalid configuration: {0}")]
   Config(String),

   /// I/O error reading configuration.
   #[error(transparent)]
   Io(#[from] std::io::Error),

   /// JSON (de)serialization error.
   #[error(transparent)]
   Json(#[from] serde_json::Error),

   /// Error from query composition or the database session.
   #[error(transparent)]
   Query(#[from] sqlx_query_compose::Error),
}

impl Error {
   /// Wrap a failed paged read, telling row failures from count failures.
   pub(crate) fn paged(label: &str, source: sqlx_query_compose::Error) -> Self {
      let label = label.to_string();
      match source {
         sqlx_query_compose::Error::CountQuery { .. }
         | sqlx_query_compose::Error::MissingCountResult => Error::CountPaged { label, source },
         source => Error::ReadPaged { label, source },
      }
   }

   /// Machine-readable error code.
   pub fn error_code(&self) -> String {
      match self {
         Error::ReadPaged { .. } => "READ_PAGED_FAILED".to_string(),
         Error::CountPaged { .. } => "COUNT_PAGED_FAILED".to_string(),
         Error::InvalidRequest(_) => "INVALID_REQUEST".to_string(),
         Error::Config(_) => "INVALID_CONFIG".to_string(),
         Error::Io(_) => "IO_ERROR".to_string(),
         Error::Json(_) => "JSON_ERROR".to_string(),
         Error::Query(e) => e.error_code(),
      }
   }
}

#[derive(Serialize)]
struct ErrorResponse {
   code: String,
   message: String,
}

impl Serialize for Error {
   fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
      ErrorResponse {
         code: self.error_code(),
         message: self.to_string(),
      }
      .serialize(serializer)
   }
}

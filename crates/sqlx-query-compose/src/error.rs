/// Result type alias for query composition operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for query composition and execution.
///
/// Failures that come back from the database are wrapped in
/// [`Error::QueryExecution`] or [`Error::CountQuery`]: their display text is a
/// fixed message and the driver error is only reachable through `source()`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
   /// Error from SQLx operations.
   #[error(transparent)]
   Sqlx(#[from] sqlx::Error),

   /// Error from the connection manager.
   #[error(transparent)]
   ConnectionManager(#[from] sqlx_sqlite_conn_mgr::Error),

   /// A row could not be mapped to the requested record type.
   #[error(transparent)]
   Json(#[from] serde_json::Error),

   /// The request cannot be served as given (e.g. no URL path for navigation).
   #[error("invalid request: {0}")]
   InvalidRequest(String),

   /// Fetching the page rows failed.
   #[error("error in paginated query execution")]
   QueryExecution {
      #[source]
      source: Box<Error>,
   },

   /// Fetching the total row count failed.
   #[error("error reading total from paginated query execution")]
   CountQuery {
      #[source]
      source: Box<Error>,
   },

   /// The count query returned no integer value.
   #[error("count query returned no total")]
   MissingCountResult,

   /// The SQL text cannot be rewritten safely.
   #[error("malformed clause: {0}")]
   MalformedClause(String),

   /// SQLite type that cannot be mapped to JSON.
   #[error("unsupported datatype: {0}")]
   UnsupportedDatatype(String),

   /// Multiple rows returned from a single-row read.
   #[error("read_one() query returned {0} rows, expected 0 or 1")]
   MultipleRowsReturned(usize),

   /// Transaction failed and rollback also failed.
   #[error("transaction failed: {transaction_error}; rollback also failed: {rollback_error}")]
   TransactionRollbackFailed {
      transaction_error: String,
      rollback_error: String,
   },

   /// Generic error for operations that don't fit other categories.
   #[error("{0}")]
   Other(String),
}

impl Error {
   pub(crate) fn query_execution(source: Error) -> Self {
      Error::QueryExecution {
         source: Box::new(source),
      }
   }

   pub(crate) fn count_query(source: Error) -> Self {
      Error::CountQuery {
         source: Box::new(source),
      }
   }

   /// Extract a structured error code from the error type.
   ///
   /// This provides machine-readable error codes for error handling.
   pub fn error_code(&self) -> String {
      match self {
         Error::Sqlx(e) => {
            if let Some(code) = e.as_database_error().and_then(|db_err| db_err.code()) {
               return format!("SQLITE_{}", code);
            }
            "SQLX_ERROR".to_string()
         }
         Error::ConnectionManager(_) => "CONNECTION_ERROR".to_string(),
         Error::Json(_) => "ROW_MAPPING_FAILED".to_string(),
         Error::InvalidRequest(_) => "INVALID_REQUEST".to_string(),
         Error::QueryExecution { .. } => "QUERY_EXECUTION_FAILED".to_string(),
         Error::CountQuery { .. } => "COUNT_QUERY_FAILED".to_string(),
         Error::MissingCountResult => "MISSING_COUNT_RESULT".to_string(),
         Error::MalformedClause(_) => "MALFORMED_CLAUSE".to_string(),
         Error::UnsupportedDatatype(_) => "UNSUPPORTED_DATATYPE".to_string(),
         Error::MultipleRowsReturned(_) => "MULTIPLE_ROWS_RETURNED".to_string(),
         Error::TransactionRollbackFailed { .. } => "TRANSACTION_ROLLBACK_FAILED".to_string(),
         Error::Other(_) => "ERROR".to_string(),
      }
   }
}

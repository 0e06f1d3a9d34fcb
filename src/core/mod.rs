/// Core Module
///
/// Fundamental components shared by every layer of the portable SQL
/// facade: the error model, the SQLSTATE translation table, the statement
/// handle lifecycle and the placeholder tokenizer.
pub mod error;
pub mod sqlstate;
pub mod statement;
pub mod tokenizer;

// Re-export commonly used types for convenience
pub use error::{DbError, DriverBug, ErrorCode, ErrorSink, ReportMode, Result};
pub use statement::StatementHandle;

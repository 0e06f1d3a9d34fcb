// Core infrastructure modules
pub mod core;

// Portable query pipeline
pub mod cursor;
pub mod driver;
pub mod drivers;
pub mod facade;
pub mod options;
pub mod sql;
pub mod value;

// Test fixtures (scripted backends)
pub mod test_utils;

// Re-export the types most callers touch
pub use self::core::{DbError, DriverBug, ErrorCode, Result};
pub use cursor::ResultCursor;
pub use driver::{DriverOps, FeatureTable, LimitSupport};
pub use facade::{AutoQueryMode, ColRef, DbFacade, Params, QueryOutcome};
pub use options::{DriverOptions, FetchMode, Portability};
pub use value::{AssocValue, Row, RowData, RowObject, Value};

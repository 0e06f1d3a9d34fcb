//! Concrete driver adapters.
//!
//! Each submodule implements the driver capability interface against one
//! real connectivity mechanism:
//!
//! - [`sqlite`]: a native prepared-statement API (`rusqlite`)
//! - [`generic`]: a higher-level connection/statement object pair, for
//!   plugging in any backend that can satisfy two small traits
//! - [`common`]: shared pieces (transaction counter, dialect helpers,
//!   handle downcasts)
pub mod common;
pub mod generic;
pub mod sqlite;

pub use generic::{GenericDriver, NativeError, SqlConnection, SqlStatement};
pub use sqlite::SqliteDriver;

/// Driver Capability Module
///
/// The contract every backend adapter must satisfy. The facade and the
/// result cursor are written entirely against this trait; nothing above
/// this boundary knows which backend is underneath. Native driver errors
/// never cross this boundary raw - adapters convert them into portable
/// `DbError` values carrying the native diagnostic text.
use crate::core::{DriverBug, Result, StatementHandle};
use crate::options::FetchMode;
use crate::value::Row;

/// What a raw execution produced.
#[derive(Debug)]
pub enum ExecOutcome {
    /// A result set, wrapped in a statement handle.
    Statement(StatementHandle),
    /// A manipulation completed; carries the affected-row count.
    Done(u64),
}

/// How the backend handles LIMIT/OFFSET windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitSupport {
    /// The backend rewrites the query and windows server-side.
    Native,
    /// The portable layer must skip and truncate rows client-side.
    Emulate,
    /// No windowing at all; emulation is the only option.
    Unsupported,
}

/// Declares what a backend supports, consulted by the portable layer
/// before it relies on a capability.
#[derive(Debug, Clone)]
pub struct FeatureTable {
    pub limit: LimitSupport,
    pub transactions: bool,
    pub numrows: bool,
    pub prepare: bool,
}

/// Column metadata returned by table introspection.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnInfo {
    pub table: String,
    pub name: String,
    pub type_name: String,
    pub nullable: bool,
    pub primary_key: bool,
}

/// What to introspect: a named table, or the columns of a live result.
pub enum InfoScope<'a> {
    Table(&'a str),
    Result(&'a mut StatementHandle),
}

/// The capability interface a concrete backend adapter implements.
///
/// All methods are synchronous and run on the caller's thread. Statement
/// handles passed in must have been produced by the same driver instance;
/// a foreign or freed handle is a programmer error and adapters escalate
/// it as a hard failure rather than a portable error.
pub trait DriverOps {
    /// Short platform tag ("sqlite", "pgsql", ...) used to pick dialect
    /// quirks such as LIMIT syntax and identifier quoting.
    fn platform(&self) -> &'static str;

    /// The backend's declared capabilities.
    fn features(&self) -> &FeatureTable;

    /// Executes a literal SQL string.
    fn execute_raw(&mut self, sql: &str) -> Result<ExecOutcome>;

    /// Fetches one row from a result handle.
    ///
    /// `row_num` requests an absolute position within the result; `None`
    /// advances the handle's own cursor. Returns `Ok(None)` at end-of-data.
    fn fetch_into(
        &mut self,
        stmt: &mut StatementHandle,
        mode: FetchMode,
        row_num: Option<usize>,
    ) -> Result<Option<Row>>;

    /// Releases a result handle's native resources.
    fn free_result(&mut self, stmt: &mut StatementHandle) -> std::result::Result<(), DriverBug>;

    /// Advances to the next result set of a multi-result statement.
    /// Returns false when there is none.
    fn next_result(&mut self, _stmt: &mut StatementHandle) -> Result<bool> {
        Ok(false)
    }

    /// Number of columns in a result.
    fn num_cols(&mut self, stmt: &mut StatementHandle) -> Result<usize>;

    /// Native row count of a result.
    fn num_rows(&mut self, stmt: &mut StatementHandle) -> Result<usize>;

    /// Toggles autocommit. Enabling it while a transaction is outstanding
    /// fails with `ActiveTransactions` under strict transactions.
    fn auto_commit(&mut self, on: bool) -> Result<()>;

    fn commit(&mut self) -> Result<()>;

    fn rollback(&mut self) -> Result<()>;

    /// Propagates the facade's strict-transaction option to the adapter,
    /// which owns the transaction counter the guard inspects.
    fn set_strict_transactions(&mut self, strict: bool);

    /// Rows affected by the most recent manipulation.
    fn affected_rows(&self) -> u64;

    /// Identifier quoted for this backend's dialect.
    fn quote_identifier(&self, ident: &str) -> String;

    /// String escaped for inclusion in a single-quoted SQL literal.
    fn escape_simple(&self, text: &str) -> String;

    /// The boolean literals this backend expects, as (true, false).
    fn boolean_literals(&self) -> (&'static str, &'static str) {
        ("1", "0")
    }

    /// Native diagnostic text of the most recent error, if any.
    fn error_native(&self) -> Option<String>;

    /// Native error code (SQLSTATE or backend-specific) of the most
    /// recent error, if any.
    fn native_error_code(&self) -> Option<String>;

    /// Column metadata for a table or a live result.
    fn table_info(&mut self, scope: InfoScope<'_>) -> Result<Vec<ColumnInfo>>;

    /// Row id generated by the most recent insert.
    fn last_insert_id(&mut self) -> Result<i64>;

    /// Rewrites a query to apply a LIMIT window, where the dialect can.
    /// The default leaves the query untouched and lets the portable layer
    /// emulate the window client-side.
    fn modify_limit_query(&self, sql: &str, _from: usize, _count: usize) -> String {
        sql.to_string()
    }
}

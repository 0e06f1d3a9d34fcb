/// Generic Connection Driver Adapter
///
/// Implements the driver capability interface over a pair of small
/// object-safe traits, `SqlConnection` and `SqlStatement`, so any
/// higher-level database-abstraction object can be plugged in without a
/// dedicated adapter. The connection reports failures as `NativeError`
/// values carrying a SQLSTATE where the backend has one; the shared
/// translation table turns those into portable codes.
use tracing::debug;

use crate::core::{sqlstate, DbError, DriverBug, ErrorCode, Result, StatementHandle};
use crate::driver::{
    ColumnInfo, DriverOps, ExecOutcome, FeatureTable, InfoScope, LimitSupport,
};
use crate::drivers::common::{
    self, escape_single_quotes, limit_clause, quote_identifier_ansi, TransactionTracker,
};
use crate::options::FetchMode;
use crate::sql::is_manip;
use crate::value::{Row, Value};

/// A failure reported by the underlying connection object.
#[derive(Debug, Clone)]
pub struct NativeError {
    /// ANSI SQLSTATE, where the backend produces one.
    pub sqlstate: Option<String>,
    /// Backend-specific numeric code, if any.
    pub code: Option<i64>,
    pub message: String,
}

impl NativeError {
    pub fn new(message: impl Into<String>) -> Self {
        NativeError {
            sqlstate: None,
            code: None,
            message: message.into(),
        }
    }

    pub fn with_state(sqlstate: impl Into<String>, message: impl Into<String>) -> Self {
        NativeError {
            sqlstate: Some(sqlstate.into()),
            code: None,
            message: message.into(),
        }
    }
}

/// The connection surface a pluggable backend object must provide.
pub trait SqlConnection {
    /// Platform tag used for dialect selection ("pgsql", "mysql", ...).
    fn platform(&self) -> &'static str;

    /// Runs a manipulation statement, returning the affected-row count.
    fn exec(&mut self, sql: &str) -> std::result::Result<u64, NativeError>;

    /// Runs a read statement, returning a statement object over its rows.
    fn query(&mut self, sql: &str) -> std::result::Result<Box<dyn SqlStatement>, NativeError>;

    fn begin(&mut self) -> std::result::Result<(), NativeError>;

    fn commit(&mut self) -> std::result::Result<(), NativeError>;

    fn rollback(&mut self) -> std::result::Result<(), NativeError>;

    fn last_insert_id(&mut self) -> std::result::Result<i64, NativeError>;

    /// Column metadata for a named table.
    fn table_columns(&mut self, table: &str)
        -> std::result::Result<Vec<ColumnInfo>, NativeError>;

    /// Escapes a string for a single-quoted literal. The default doubles
    /// single quotes, which covers the ANSI-compliant backends.
    fn escape(&self, text: &str) -> String {
        escape_single_quotes(text)
    }
}

/// A statement/result object produced by [`SqlConnection::query`].
pub trait SqlStatement {
    fn columns(&self) -> Vec<String>;

    /// Fetches the next row, `None` at end-of-data.
    fn fetch(&mut self) -> std::result::Result<Option<Vec<Value>>, NativeError>;

    /// Native row count, where the backend reports one for reads.
    fn row_count(&self) -> Option<usize>;
}

/// Forward-only statements get positioned fetches through this cache:
/// rows are pulled from the statement on demand and retained.
pub(crate) struct GenericResult {
    stmt: Box<dyn SqlStatement>,
    columns: Vec<String>,
    cache: Vec<Vec<Value>>,
    pos: usize,
    done: bool,
}

impl GenericResult {
    fn fill_to(&mut self, idx: usize) -> std::result::Result<(), NativeError> {
        while self.cache.len() <= idx && !self.done {
            match self.stmt.fetch()? {
                Some(values) => self.cache.push(values),
                None => self.done = true,
            }
        }
        Ok(())
    }
}

/// Driver over a boxed generic connection object.
pub struct GenericDriver {
    conn: Box<dyn SqlConnection>,
    txn: TransactionTracker,
    strict: bool,
    last_native: Option<NativeError>,
    last_affected: u64,
    features: FeatureTable,
    platform: &'static str,
}

impl GenericDriver {
    pub fn new(conn: Box<dyn SqlConnection>) -> Self {
        let platform = conn.platform();
        let limit = match platform {
            "sqlite" | "pgsql" | "mysql" => LimitSupport::Native,
            _ => LimitSupport::Emulate,
        };
        GenericDriver {
            conn,
            txn: TransactionTracker::new(),
            strict: true,
            last_native: None,
            last_affected: 0,
            features: FeatureTable {
                limit,
                transactions: true,
                // Generic statement objects often cannot count reads;
                // callers lean on the NUMROWS portability emulation.
                numrows: false,
                prepare: true,
            },
            platform,
        }
    }

    fn convert(&mut self, err: NativeError) -> DbError {
        let code = err
            .sqlstate
            .as_deref()
            .map(sqlstate::error_code)
            .unwrap_or(ErrorCode::Error);
        debug!(state = ?err.sqlstate, %err.message, "native error from generic connection");
        let portable = DbError::with_native(code, err.message.clone());
        self.last_native = Some(err);
        portable
    }
}

impl DriverOps for GenericDriver {
    fn platform(&self) -> &'static str {
        self.platform
    }

    fn features(&self) -> &FeatureTable {
        &self.features
    }

    fn execute_raw(&mut self, sql: &str) -> Result<ExecOutcome> {
        if is_manip(sql) {
            if self.txn.note_manip() {
                let begun = self.conn.begin();
                begun.map_err(|e| self.convert(e))?;
            }
            let affected = self.conn.exec(sql);
            let affected = affected.map_err(|e| self.convert(e))?;
            self.last_affected = affected;
            return Ok(ExecOutcome::Done(affected));
        }

        let stmt = self.conn.query(sql);
        let stmt = stmt.map_err(|e| self.convert(e))?;
        let columns = stmt.columns();
        Ok(ExecOutcome::Statement(StatementHandle::new(GenericResult {
            stmt,
            columns,
            cache: Vec::new(),
            pos: 0,
            done: false,
        })))
    }

    fn fetch_into(
        &mut self,
        stmt: &mut StatementHandle,
        _mode: FetchMode,
        row_num: Option<usize>,
    ) -> Result<Option<Row>> {
        let (columns, values) = {
            let result: &mut GenericResult = common::native_mut(stmt);
            let idx = row_num.unwrap_or(result.pos);
            match result.fill_to(idx) {
                Ok(()) => {}
                Err(e) => {
                    let err = e;
                    return Err(self.convert(err));
                }
            }
            if idx >= result.cache.len() {
                return Ok(None);
            }
            result.pos = idx + 1;
            (result.columns.clone(), result.cache[idx].clone())
        };
        Ok(Some(Row::new(columns, values)))
    }

    fn free_result(&mut self, stmt: &mut StatementHandle) -> std::result::Result<(), DriverBug> {
        stmt.free()
    }

    fn num_cols(&mut self, stmt: &mut StatementHandle) -> Result<usize> {
        let result: &GenericResult = common::native_ref(stmt);
        Ok(result.columns.len())
    }

    fn num_rows(&mut self, stmt: &mut StatementHandle) -> Result<usize> {
        let result: &GenericResult = common::native_ref(stmt);
        result.stmt.row_count().ok_or_else(|| {
            DbError::with_native(
                ErrorCode::NotCapable,
                "connection object reports no row count",
            )
        })
    }

    fn auto_commit(&mut self, on: bool) -> Result<()> {
        self.txn.set_autocommit(on, self.strict)
    }

    fn commit(&mut self) -> Result<()> {
        if self.txn.in_transaction() {
            let committed = self.conn.commit();
            committed.map_err(|e| self.convert(e))?;
        }
        self.txn.reset();
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        if self.txn.in_transaction() {
            let rolled = self.conn.rollback();
            rolled.map_err(|e| self.convert(e))?;
        }
        self.txn.reset();
        Ok(())
    }

    fn set_strict_transactions(&mut self, strict: bool) {
        self.strict = strict;
    }

    fn affected_rows(&self) -> u64 {
        self.last_affected
    }

    fn quote_identifier(&self, ident: &str) -> String {
        quote_identifier_ansi(ident)
    }

    fn escape_simple(&self, text: &str) -> String {
        self.conn.escape(text)
    }

    fn error_native(&self) -> Option<String> {
        self.last_native.as_ref().map(|e| e.message.clone())
    }

    fn native_error_code(&self) -> Option<String> {
        self.last_native
            .as_ref()
            .and_then(|e| e.sqlstate.clone().or_else(|| e.code.map(|c| c.to_string())))
    }

    fn table_info(&mut self, scope: InfoScope<'_>) -> Result<Vec<ColumnInfo>> {
        match scope {
            InfoScope::Table(table) => {
                let columns = self.conn.table_columns(table);
                columns.map_err(|e| self.convert(e))
            }
            InfoScope::Result(stmt) => {
                let result: &GenericResult = common::native_ref(stmt);
                Ok(result
                    .columns
                    .iter()
                    .map(|name| ColumnInfo {
                        table: String::new(),
                        name: name.clone(),
                        type_name: String::new(),
                        nullable: true,
                        primary_key: false,
                    })
                    .collect())
            }
        }
    }

    fn last_insert_id(&mut self) -> Result<i64> {
        let id = self.conn.last_insert_id();
        id.map_err(|e| self.convert(e))
    }

    fn modify_limit_query(&self, sql: &str, from: usize, count: usize) -> String {
        limit_clause(self.platform, sql, from, count)
    }
}

/// SQLite Driver Adapter
///
/// Implements the driver capability interface over a `rusqlite`
/// connection. Result sets are buffered at execute time: a rusqlite
/// statement borrows its connection, so buffering is what keeps the
/// portable statement handle self-contained. Native errors are mapped to
/// an approximate SQLSTATE and routed through the shared translation
/// table.
use rusqlite::types::ValueRef;
use rusqlite::Connection;
use tracing::debug;

use crate::core::{sqlstate, DbError, DriverBug, Result, StatementHandle};
use crate::driver::{
    ColumnInfo, DriverOps, ExecOutcome, FeatureTable, InfoScope, LimitSupport,
};
use crate::drivers::common::{
    self, escape_single_quotes, limit_clause, quote_identifier_ansi, TransactionTracker,
};
use crate::options::FetchMode;
use crate::sql::is_manip;
use crate::value::{Row, Value};

/// A fully buffered result set plus its read position.
pub(crate) struct SqliteResult {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
    pos: usize,
}

/// Driver over a native SQLite connection.
pub struct SqliteDriver {
    conn: Connection,
    txn: TransactionTracker,
    strict: bool,
    last_native: Option<(String, String)>,
    last_affected: u64,
    features: FeatureTable,
}

impl SqliteDriver {
    /// Wraps an already-open connection.
    pub fn new(conn: Connection) -> Self {
        SqliteDriver {
            conn,
            txn: TransactionTracker::new(),
            strict: true,
            last_native: None,
            last_affected: 0,
            features: FeatureTable {
                limit: LimitSupport::Native,
                transactions: true,
                numrows: true,
                prepare: true,
            },
        }
    }

    /// Opens an in-memory database, mainly for tests and scratch work.
    pub fn memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| {
            DbError::with_native(crate::core::ErrorCode::ConnectFailed, e.to_string())
        })?;
        Ok(SqliteDriver::new(conn))
    }

    fn native_error(&mut self, err: rusqlite::Error) -> DbError {
        let message = err.to_string();
        let state = approximate_sqlstate(&err, &message);
        debug!(state, %message, "sqlite error");
        self.last_native = Some((state.to_string(), message.clone()));
        DbError::with_native(sqlstate::error_code(state), message)
    }

    /// Runs a read statement and buffers the complete result set.
    fn buffer_select(&self, sql: &str) -> std::result::Result<SqliteResult, rusqlite::Error> {
        let mut stmt = self.conn.prepare(sql)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let column_count = stmt.column_count();

        let mut buffered = Vec::new();
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(column_count);
            for i in 0..column_count {
                values.push(value_from_ref(row.get_ref(i)?));
            }
            buffered.push(values);
        }

        Ok(SqliteResult {
            columns,
            rows: buffered,
            pos: 0,
        })
    }

    fn table_columns(
        &self,
        table: &str,
    ) -> std::result::Result<Vec<ColumnInfo>, rusqlite::Error> {
        let sql = format!("PRAGMA table_info('{}')", escape_single_quotes(table));
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], |row| {
            Ok(ColumnInfo {
                table: table.to_string(),
                name: row.get(1)?,
                type_name: row.get(2)?,
                nullable: !row.get::<_, bool>(3)?,
                primary_key: row.get::<_, i64>(5)? > 0,
            })
        })?;
        rows.collect()
    }
}

/// Derives the closest ANSI SQLSTATE for a native SQLite failure, so the
/// shared translation table stays the single source of portable codes.
fn approximate_sqlstate(err: &rusqlite::Error, message: &str) -> &'static str {
    if message.contains("no such table") {
        return "42S02";
    }
    if message.contains("no such column") {
        return "42S22";
    }
    if message.contains("already exists") {
        return "42S01";
    }
    if message.contains("syntax error") {
        return "42000";
    }
    if message.contains("NOT NULL constraint failed") || message.contains("may not be NULL") {
        return "23502";
    }
    if message.contains("UNIQUE constraint failed") || message.contains("is not unique") {
        return "23000";
    }
    if message.contains("unable to open database") {
        return "08004";
    }
    if let rusqlite::Error::SqliteFailure(native, _) = err {
        return match native.code {
            rusqlite::ErrorCode::ConstraintViolation => "23000",
            rusqlite::ErrorCode::NotADatabase => "08004",
            rusqlite::ErrorCode::PermissionDenied => "28000",
            _ => "HY000",
        };
    }
    "HY000"
}

fn value_from_ref(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(n) => Value::Integer(n),
        ValueRef::Real(f) => Value::Real(f),
        ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).to_string()),
        ValueRef::Blob(b) => Value::Blob(b.to_vec()),
    }
}

impl DriverOps for SqliteDriver {
    fn platform(&self) -> &'static str {
        "sqlite"
    }

    fn features(&self) -> &FeatureTable {
        &self.features
    }

    fn execute_raw(&mut self, sql: &str) -> Result<ExecOutcome> {
        if is_manip(sql) {
            if self.txn.note_manip() {
                self.conn
                    .execute_batch("BEGIN")
                    .map_err(|e| self.native_error(e))?;
            }
            let affected = self.conn.execute(sql, []).map_err(|e| self.native_error(e))?;
            self.last_affected = affected as u64;
            return Ok(ExecOutcome::Done(affected as u64));
        }

        match self.buffer_select(sql) {
            Ok(result) => Ok(ExecOutcome::Statement(StatementHandle::new(result))),
            Err(e) => Err(self.native_error(e)),
        }
    }

    fn fetch_into(
        &mut self,
        stmt: &mut StatementHandle,
        _mode: FetchMode,
        row_num: Option<usize>,
    ) -> Result<Option<Row>> {
        let result: &mut SqliteResult = common::native_mut(stmt);
        let idx = row_num.unwrap_or(result.pos);
        if idx >= result.rows.len() {
            return Ok(None);
        }
        result.pos = idx + 1;
        Ok(Some(Row::new(
            result.columns.clone(),
            result.rows[idx].clone(),
        )))
    }

    fn free_result(&mut self, stmt: &mut StatementHandle) -> std::result::Result<(), DriverBug> {
        stmt.free()
    }

    fn num_cols(&mut self, stmt: &mut StatementHandle) -> Result<usize> {
        let result: &SqliteResult = common::native_ref(stmt);
        Ok(result.columns.len())
    }

    fn num_rows(&mut self, stmt: &mut StatementHandle) -> Result<usize> {
        let result: &SqliteResult = common::native_ref(stmt);
        Ok(result.rows.len())
    }

    fn auto_commit(&mut self, on: bool) -> Result<()> {
        self.txn.set_autocommit(on, self.strict)
    }

    fn commit(&mut self) -> Result<()> {
        if self.txn.in_transaction() {
            self.conn
                .execute_batch("COMMIT")
                .map_err(|e| self.native_error(e))?;
        }
        self.txn.reset();
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        if self.txn.in_transaction() {
            self.conn
                .execute_batch("ROLLBACK")
                .map_err(|e| self.native_error(e))?;
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
        escape_single_quotes(text)
    }

    fn error_native(&self) -> Option<String> {
        self.last_native.as_ref().map(|(_, message)| message.clone())
    }

    fn native_error_code(&self) -> Option<String> {
        self.last_native.as_ref().map(|(state, _)| state.clone())
    }

    fn table_info(&mut self, scope: InfoScope<'_>) -> Result<Vec<ColumnInfo>> {
        match scope {
            InfoScope::Table(table) => {
                let columns = match self.table_columns(table) {
                    Ok(columns) => columns,
                    Err(e) => return Err(self.native_error(e)),
                };
                if columns.is_empty() {
                    return Err(DbError::with_native(
                        crate::core::ErrorCode::NoSuchTable,
                        format!("no such table: {}", table),
                    ));
                }
                Ok(columns)
            }
            InfoScope::Result(stmt) => {
                let result: &SqliteResult = common::native_ref(stmt);
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
        Ok(self.conn.last_insert_rowid())
    }

    fn modify_limit_query(&self, sql: &str, from: usize, count: usize) -> String {
        limit_clause(self.platform(), sql, from, count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ErrorCode;

    fn seeded() -> SqliteDriver {
        let mut driver = SqliteDriver::memory().unwrap();
        driver
            .execute_raw("CREATE TABLE pets (id INTEGER PRIMARY KEY, name TEXT NOT NULL)")
            .unwrap();
        driver
            .execute_raw("INSERT INTO pets (name) VALUES ('ada')")
            .unwrap();
        driver
            .execute_raw("INSERT INTO pets (name) VALUES ('grace')")
            .unwrap();
        driver
    }

    #[test]
    fn test_select_buffers_rows() {
        let mut driver = seeded();
        let outcome = driver.execute_raw("SELECT id, name FROM pets ORDER BY id").unwrap();
        let mut stmt = match outcome {
            ExecOutcome::Statement(stmt) => stmt,
            ExecOutcome::Done(_) => panic!("expected rows"),
        };

        assert_eq!(driver.num_rows(&mut stmt).unwrap(), 2);
        assert_eq!(driver.num_cols(&mut stmt).unwrap(), 2);

        let first = driver
            .fetch_into(&mut stmt, FetchMode::ORDERED, None)
            .unwrap()
            .unwrap();
        assert_eq!(first.get_str("name"), Some("ada"));

        // Positioned fetch rewinds and re-reads.
        let again = driver
            .fetch_into(&mut stmt, FetchMode::ORDERED, Some(0))
            .unwrap()
            .unwrap();
        assert_eq!(again.get_i64("id"), Some(1));

        driver.free_result(&mut stmt).unwrap();
    }

    #[test]
    fn test_manipulation_reports_affected_rows() {
        let mut driver = seeded();
        let outcome = driver.execute_raw("UPDATE pets SET name = 'x'").unwrap();
        match outcome {
            ExecOutcome::Done(affected) => assert_eq!(affected, 2),
            ExecOutcome::Statement(_) => panic!("expected affected count"),
        }
        assert_eq!(driver.affected_rows(), 2);
    }

    #[test]
    fn test_native_errors_become_portable() {
        let mut driver = seeded();
        let err = driver.execute_raw("SELECT * FROM missing").unwrap_err();
        assert_eq!(err.code(), ErrorCode::NoSuchTable);
        assert_eq!(driver.native_error_code().as_deref(), Some("42S02"));
        assert!(driver.error_native().unwrap().contains("missing"));

        let err = driver.execute_raw("SELEC 1").unwrap_err();
        assert_eq!(err.code(), ErrorCode::Syntax);

        let err = driver
            .execute_raw("INSERT INTO pets (id, name) VALUES (1, 'dup')")
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::Constraint);

        let err = driver
            .execute_raw("INSERT INTO pets (name) VALUES (NULL)")
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ConstraintNotNull);
    }

    #[test]
    fn test_rollback_reverts_implicit_transaction() {
        let mut driver = seeded();
        driver.auto_commit(false).unwrap();
        driver
            .execute_raw("INSERT INTO pets (name) VALUES ('doomed')")
            .unwrap();
        driver.rollback().unwrap();

        let outcome = driver.execute_raw("SELECT COUNT(*) FROM pets").unwrap();
        let mut stmt = match outcome {
            ExecOutcome::Statement(stmt) => stmt,
            ExecOutcome::Done(_) => panic!("expected rows"),
        };
        let row = driver
            .fetch_into(&mut stmt, FetchMode::ORDERED, None)
            .unwrap()
            .unwrap();
        assert_eq!(row.values()[0], Value::Integer(2));
        driver.free_result(&mut stmt).unwrap();
    }

    #[test]
    fn test_strict_autocommit_guard() {
        let mut driver = seeded();
        driver.auto_commit(false).unwrap();
        driver
            .execute_raw("INSERT INTO pets (name) VALUES ('pending')")
            .unwrap();

        let err = driver.auto_commit(true).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ActiveTransactions);

        driver.commit().unwrap();
        driver.auto_commit(true).unwrap();
    }

    #[test]
    fn test_table_info_pragma() {
        let mut driver = seeded();
        let info = driver.table_info(InfoScope::Table("pets")).unwrap();
        assert_eq!(info.len(), 2);
        assert_eq!(info[0].name, "id");
        assert!(info[0].primary_key);
        assert_eq!(info[1].name, "name");
        assert!(!info[1].nullable);

        let err = driver.table_info(InfoScope::Table("missing")).unwrap_err();
        assert_eq!(err.code(), ErrorCode::NoSuchTable);
    }

    #[test]
    fn test_limit_rewrite_and_quoting() {
        let driver = SqliteDriver::memory().unwrap();
        assert_eq!(
            driver.modify_limit_query("SELECT * FROM t", 10, 5),
            "SELECT * FROM t LIMIT 5 OFFSET 10"
        );
        assert_eq!(driver.quote_identifier("select"), "\"select\"");
        assert_eq!(driver.escape_simple("it's"), "it''s");
    }

    #[test]
    fn test_last_insert_id() {
        let mut driver = seeded();
        driver
            .execute_raw("INSERT INTO pets (name) VALUES ('new')")
            .unwrap();
        assert_eq!(driver.last_insert_id().unwrap(), 3);
    }
}

/// Test Utilities Module
///
/// Fixtures for exercising the portable layer without a real backend:
/// `MemoryConnection` is a scripted implementation of the generic
/// connection interface that replays queued results, affected-row counts
/// and native errors, and records every call it receives.
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use crate::driver::ColumnInfo;
use crate::drivers::generic::{NativeError, SqlConnection, SqlStatement};
use crate::value::Value;

enum ScriptStep {
    Rows(Vec<String>, Vec<Vec<Value>>),
    Affected(u64),
    Error(NativeError),
}

/// A scripted in-memory connection.
///
/// Steps queued with the `push_*` methods are consumed in order by
/// `exec`/`query`; an exhausted script answers reads with an empty result
/// and writes with zero affected rows. Every statement and transaction
/// call is appended to the shared log.
pub struct MemoryConnection {
    platform: &'static str,
    script: VecDeque<ScriptStep>,
    tables: HashMap<String, Vec<ColumnInfo>>,
    log: Rc<RefCell<Vec<String>>>,
    last_insert_id: i64,
}

impl MemoryConnection {
    pub fn new(platform: &'static str) -> Self {
        MemoryConnection {
            platform,
            script: VecDeque::new(),
            tables: HashMap::new(),
            log: Rc::new(RefCell::new(Vec::new())),
            last_insert_id: 0,
        }
    }

    /// Queues a result set for the next read.
    pub fn push_result(&mut self, columns: Vec<&str>, rows: Vec<Vec<Value>>) {
        self.script.push_back(ScriptStep::Rows(
            columns.into_iter().map(String::from).collect(),
            rows,
        ));
    }

    /// Queues an affected-row count for the next write.
    pub fn push_affected(&mut self, affected: u64) {
        self.script.push_back(ScriptStep::Affected(affected));
    }

    /// Queues a native failure for the next statement.
    pub fn push_error(&mut self, err: NativeError) {
        self.script.push_back(ScriptStep::Error(err));
    }

    /// Registers column metadata served by `table_columns`.
    pub fn define_table(&mut self, table: &str, columns: Vec<ColumnInfo>) {
        self.tables.insert(table.to_string(), columns);
    }

    pub fn set_last_insert_id(&mut self, id: i64) {
        self.last_insert_id = id;
    }

    /// Shared handle to the call log; survives moving the connection into
    /// a driver.
    pub fn log(&self) -> Rc<RefCell<Vec<String>>> {
        self.log.clone()
    }

    fn record(&self, entry: &str) {
        self.log.borrow_mut().push(entry.to_string());
    }
}

impl SqlConnection for MemoryConnection {
    fn platform(&self) -> &'static str {
        self.platform
    }

    fn exec(&mut self, sql: &str) -> std::result::Result<u64, NativeError> {
        self.record(sql);
        match self.script.pop_front() {
            Some(ScriptStep::Affected(affected)) => Ok(affected),
            Some(ScriptStep::Error(err)) => Err(err),
            Some(ScriptStep::Rows(..)) | None => Ok(0),
        }
    }

    fn query(&mut self, sql: &str) -> std::result::Result<Box<dyn SqlStatement>, NativeError> {
        self.record(sql);
        match self.script.pop_front() {
            Some(ScriptStep::Rows(columns, rows)) => Ok(Box::new(MemoryStatement {
                columns,
                rows: rows.into(),
            })),
            Some(ScriptStep::Error(err)) => Err(err),
            Some(ScriptStep::Affected(_)) | None => Ok(Box::new(MemoryStatement {
                columns: Vec::new(),
                rows: VecDeque::new(),
            })),
        }
    }

    fn begin(&mut self) -> std::result::Result<(), NativeError> {
        self.record("BEGIN");
        Ok(())
    }

    fn commit(&mut self) -> std::result::Result<(), NativeError> {
        self.record("COMMIT");
        Ok(())
    }

    fn rollback(&mut self) -> std::result::Result<(), NativeError> {
        self.record("ROLLBACK");
        Ok(())
    }

    fn last_insert_id(&mut self) -> std::result::Result<i64, NativeError> {
        Ok(self.last_insert_id)
    }

    fn table_columns(
        &mut self,
        table: &str,
    ) -> std::result::Result<Vec<ColumnInfo>, NativeError> {
        self.tables.get(table).cloned().ok_or_else(|| {
            NativeError::with_state("42S02", format!("no such table: {}", table))
        })
    }
}

struct MemoryStatement {
    columns: Vec<String>,
    rows: VecDeque<Vec<Value>>,
}

impl SqlStatement for MemoryStatement {
    fn columns(&self) -> Vec<String> {
        self.columns.clone()
    }

    fn fetch(&mut self) -> std::result::Result<Option<Vec<Value>>, NativeError> {
        Ok(self.rows.pop_front())
    }

    // The fixture deliberately reports no native count so callers
    // exercise the client-side row-count emulation.
    fn row_count(&self) -> Option<usize> {
        None
    }
}

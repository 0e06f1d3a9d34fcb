/// Shared Driver Helpers
///
/// Pieces every concrete adapter needs: the transaction-operation counter,
/// the strict-autocommit guard, dialect-keyed LIMIT emission and
/// identifier quoting, and the statement-handle downcast that escalates
/// contract violations.
use std::any::Any;

use tracing::debug;

use crate::core::{DbError, ErrorCode, Result, StatementHandle};

/// Tracks the implicit-transaction state of one connection.
///
/// With autocommit off, the first manipulation opens a transaction and
/// every further manipulation bumps the counter; commit and rollback reset
/// it to zero.
#[derive(Debug)]
pub struct TransactionTracker {
    autocommit: bool,
    op_count: u32,
}

impl TransactionTracker {
    pub fn new() -> Self {
        TransactionTracker {
            autocommit: true,
            op_count: 0,
        }
    }

    pub fn autocommit(&self) -> bool {
        self.autocommit
    }

    pub fn in_transaction(&self) -> bool {
        self.op_count > 0
    }

    /// Records a manipulation statement. Returns true when the caller must
    /// issue a BEGIN first (autocommit off, no transaction open yet).
    pub fn note_manip(&mut self) -> bool {
        if self.autocommit {
            return false;
        }
        self.op_count += 1;
        self.op_count == 1
    }

    /// Applies an autocommit toggle, guarding against enabling it while a
    /// transaction is outstanding.
    pub fn set_autocommit(&mut self, on: bool, strict: bool) -> Result<()> {
        if strict && on && self.in_transaction() {
            return Err(DbError::with_native(
                ErrorCode::ActiveTransactions,
                format!("{} uncommitted operation(s) pending", self.op_count),
            ));
        }
        self.autocommit = on;
        Ok(())
    }

    /// Resets the counter after a commit or rollback.
    pub fn reset(&mut self) {
        if self.op_count > 0 {
            debug!(ops = self.op_count, "closing implicit transaction");
        }
        self.op_count = 0;
    }
}

impl Default for TransactionTracker {
    fn default() -> Self {
        TransactionTracker::new()
    }
}

/// ANSI identifier quoting: wrap in double quotes, doubling embedded ones.
pub fn quote_identifier_ansi(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Escapes a string for a single-quoted SQL literal by doubling quotes.
pub fn escape_single_quotes(text: &str) -> String {
    text.replace('\'', "''")
}

/// Appends the platform's LIMIT clause to a query, or returns the query
/// untouched when the dialect has no windowing syntax.
pub fn limit_clause(platform: &str, sql: &str, from: usize, count: usize) -> String {
    match platform {
        "sqlite" | "pgsql" | "mysql" => {
            format!("{} LIMIT {} OFFSET {}", sql, count, from)
        }
        _ => sql.to_string(),
    }
}

/// Downcasts a statement handle to the adapter's native result type,
/// escalating a dead or foreign handle to a hard failure.
pub fn native_mut<T: Any>(stmt: &mut StatementHandle) -> &mut T {
    match stmt.native_mut::<T>() {
        Ok(native) => native,
        Err(bug) => bug.escalate(),
    }
}

/// Immutable variant of [`native_mut`].
pub fn native_ref<T: Any>(stmt: &StatementHandle) -> &T {
    match stmt.native_ref::<T>() {
        Ok(native) => native,
        Err(bug) => bug.escalate(),
    }
}

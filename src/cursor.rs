/// Result Cursor Module
///
/// A `ResultCursor` wraps the statement handle a query produced and layers
/// the portable fetch behavior on top of the driver's raw fetch primitive:
/// fetch-mode polymorphism, client-side limit/offset windowing, portability
/// post-processing and the autofree policy.
use std::cell::RefCell;
use std::rc::{Rc, Weak};

use tracing::debug;

use crate::core::{DbError, DriverBug, ErrorCode, Result, StatementHandle};
use crate::driver::{ColumnInfo, DriverOps, ExecOutcome, InfoScope};
use crate::options::{FetchMode, Portability};
use crate::value::{Row, RowData, RowObject, Value};

/// Construction-time settings captured from the facade.
pub(crate) struct CursorSettings {
    pub fetch_mode: FetchMode,
    pub object_type: Option<String>,
    pub portability: Portability,
    pub autofree: bool,
    pub prepare_supported: bool,
    pub numrows_native: bool,
    pub limit_native: bool,
    pub query: String,
    pub params: Vec<Value>,
}

/// A per-query cursor over a result set.
///
/// Owned solely by the caller that received it; the driver reference is a
/// non-owning back-pointer used only to delegate fetch/free work.
pub struct ResultCursor {
    driver: Weak<RefCell<dyn DriverOps>>,
    stmt: StatementHandle,
    fetch_mode: FetchMode,
    object_type: Option<String>,
    portability: Portability,
    autofree: bool,
    prepare_supported: bool,
    numrows_native: bool,
    limit_native: bool,
    limit_from: Option<usize>,
    limit_count: Option<usize>,
    row_counter: Option<usize>,
    query: String,
    params: Vec<Value>,
    freed: bool,
    exhausted: bool,
}

impl ResultCursor {
    pub(crate) fn new(
        driver: Weak<RefCell<dyn DriverOps>>,
        stmt: StatementHandle,
        settings: CursorSettings,
    ) -> Self {
        ResultCursor {
            driver,
            stmt,
            fetch_mode: settings.fetch_mode,
            object_type: settings.object_type,
            portability: settings.portability,
            autofree: settings.autofree,
            prepare_supported: settings.prepare_supported,
            numrows_native: settings.numrows_native,
            limit_native: settings.limit_native,
            limit_from: None,
            limit_count: None,
            row_counter: None,
            query: settings.query,
            params: settings.params,
            freed: false,
            exhausted: false,
        }
    }

    /// Annotates the cursor with a limit window for client-side
    /// skipping/truncation.
    pub(crate) fn set_limit_window(&mut self, from: usize, count: usize) {
        self.limit_from = Some(from);
        self.limit_count = Some(count);
    }

    /// The query text this cursor was produced from.
    pub fn query(&self) -> &str {
        &self.query
    }

    fn driver(&self) -> Result<Rc<RefCell<dyn DriverOps>>> {
        self.driver.upgrade().ok_or_else(|| {
            DbError::with_native(ErrorCode::Error, "database handle was dropped")
        })
    }

    /// Fetches the next row, shaped per the fetch mode.
    ///
    /// `None` for `mode` (or `FetchMode::DEFAULT`) uses the facade's
    /// configured default. Returns `Ok(None)` at end-of-data; with autofree
    /// enabled the underlying resource is released at that point.
    ///
    /// # Panics
    ///
    /// Panics if the cursor was explicitly freed and is not simply sitting
    /// past an exhausted limit window - fetching from a freed handle is a
    /// contract violation, not a database condition.
    pub fn fetch_row(&mut self, mode: Option<FetchMode>) -> Result<Option<RowData>> {
        // A cursor that already reported end-of-data keeps reporting it,
        // even after autofree released the handle.
        if self.exhausted {
            return Ok(None);
        }
        if self.freed {
            DriverBug::NoStatement.escalate();
        }

        let requested = mode.unwrap_or(FetchMode::DEFAULT);
        let effective = if requested.is_default() {
            self.fetch_mode.base()
        } else {
            requested.base()
        };
        // Object shaping happens here, not in the driver: fetch
        // associatively and build the object afterwards.
        let driver_mode = if effective == FetchMode::OBJECT {
            FetchMode::ASSOC
        } else {
            effective
        };

        if let (Some(from), Some(count)) = (self.limit_from, self.limit_count) {
            if self.row_counter.is_none() {
                self.row_counter = Some(from);
                if !self.limit_native && !self.skip_rows(from)? {
                    return self.end_of_data();
                }
            }
            if self.row_counter.unwrap_or(from) >= from + count {
                return self.end_of_data();
            }
        }

        let fetched = {
            let driver = self.driver()?;
            let mut driver = driver.borrow_mut();
            driver.fetch_into(&mut self.stmt, driver_mode, None)?
        };

        let mut row = match fetched {
            Some(row) => row,
            None => return self.end_of_data(),
        };

        if let Some(counter) = self.row_counter.as_mut() {
            *counter += 1;
        }

        self.apply_portability(&mut row);

        let shaped = match effective {
            FetchMode::ASSOC => RowData::Assoc(row),
            FetchMode::OBJECT => RowData::Object(RowObject {
                type_name: self.object_type.clone(),
                fields: row,
            }),
            _ => RowData::Ordered(row.into_parts().1),
        };
        Ok(Some(shaped))
    }

    /// Fetches the next row's values into a caller-supplied buffer.
    /// Returns false at end-of-data.
    pub fn fetch_into(&mut self, buf: &mut Vec<Value>) -> Result<bool> {
        match self.fetch_row(Some(FetchMode::ORDERED))? {
            Some(RowData::Ordered(values)) => {
                *buf = values;
                Ok(true)
            }
            Some(other) => {
                buf.clear();
                buf.extend_from_slice(other.values());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Discards `n` rows from the underlying result. Returns false when
    /// the source ran out before the window start.
    fn skip_rows(&mut self, n: usize) -> Result<bool> {
        let driver = self.driver()?;
        for _ in 0..n {
            let skipped = driver
                .borrow_mut()
                .fetch_into(&mut self.stmt, FetchMode::ORDERED, None)?;
            if skipped.is_none() {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn end_of_data(&mut self) -> Result<Option<RowData>> {
        self.exhausted = true;
        if self.autofree && !self.freed {
            debug!("end of data, autofreeing result");
            self.release()?;
        }
        Ok(None)
    }

    fn apply_portability(&self, row: &mut Row) {
        if self.portability.contains(Portability::LOWERCASE) {
            row.lowercase_columns();
        }
        if self.portability.contains(Portability::RTRIM) {
            row.map_values(|value| {
                if let Value::Text(text) = value {
                    let trimmed = text.trim_end().len();
                    text.truncate(trimmed);
                }
            });
        }
        if self.portability.contains(Portability::NULL_TO_EMPTY) {
            row.map_values(|value| {
                if value.is_null() {
                    *value = Value::Text(String::new());
                }
            });
        }
    }

    /// Number of rows in the result.
    ///
    /// With the NUMROWS portability flag set, the count is produced by
    /// re-running the captured query and counting fetched rows one at a
    /// time instead of trusting the backend's native counter.
    pub fn num_rows(&mut self) -> Result<usize> {
        if self.portability.contains(Portability::NUMROWS) {
            return self.count_by_reexecution();
        }
        if !self.numrows_native {
            return Err(DbError::with_native(
                ErrorCode::NotCapable,
                "backend reports no native row count; enable the NUMROWS portability flag",
            ));
        }
        let driver = self.driver()?;
        let mut driver = driver.borrow_mut();
        driver.num_rows(&mut self.stmt)
    }

    fn count_by_reexecution(&mut self) -> Result<usize> {
        if !self.params.is_empty() && !self.prepare_supported {
            return Err(DbError::with_native(
                ErrorCode::NotCapable,
                "cannot replay bound parameters on a backend without prepare support",
            ));
        }
        let driver = self.driver()?;
        let outcome = driver.borrow_mut().execute_raw(&self.query)?;
        match outcome {
            ExecOutcome::Statement(mut handle) => {
                let mut count = 0;
                loop {
                    let row = driver
                        .borrow_mut()
                        .fetch_into(&mut handle, FetchMode::ORDERED, None)?;
                    if row.is_none() {
                        break;
                    }
                    count += 1;
                }
                if let Err(bug) = driver.borrow_mut().free_result(&mut handle) {
                    bug.escalate();
                }
                Ok(count)
            }
            ExecOutcome::Done(_) => Ok(0),
        }
    }

    /// Number of columns in the result.
    pub fn num_cols(&mut self) -> Result<usize> {
        let driver = self.driver()?;
        let mut driver = driver.borrow_mut();
        driver.num_cols(&mut self.stmt)
    }

    /// Column names of the result, via the driver's introspection.
    pub fn column_names(&mut self) -> Result<Vec<String>> {
        Ok(self
            .result_info()?
            .into_iter()
            .map(|info| info.name)
            .collect())
    }

    /// Column metadata of this result.
    ///
    /// `mode` is the legacy polymorphic argument; a string-typed mode is
    /// rejected with `NeedMoreData`, preserving the historical surface.
    pub fn table_info(&mut self, mode: Option<Value>) -> Result<Vec<ColumnInfo>> {
        if let Some(Value::Text(text)) = mode {
            return Err(DbError::with_info(
                ErrorCode::NeedMoreData,
                "table_info mode must be numeric",
                text,
            ));
        }
        self.result_info()
    }

    fn result_info(&mut self) -> Result<Vec<ColumnInfo>> {
        let driver = self.driver()?;
        let mut driver = driver.borrow_mut();
        driver.table_info(InfoScope::Result(&mut self.stmt))
    }

    /// Advances to the next result set, where the backend has one.
    pub fn next_result(&mut self) -> Result<bool> {
        let driver = self.driver()?;
        let mut driver = driver.borrow_mut();
        driver.next_result(&mut self.stmt)
    }

    /// Whether the underlying resource has been released.
    pub fn is_freed(&self) -> bool {
        self.freed
    }

    /// Releases the result's native resources. A second free fails with
    /// `DriverBug::NoStatement`.
    pub fn free(&mut self) -> std::result::Result<(), DriverBug> {
        if self.freed {
            return Err(DriverBug::NoStatement);
        }
        match self.driver.upgrade() {
            Some(driver) => {
                driver.borrow_mut().free_result(&mut self.stmt)?;
                self.freed = true;
                Ok(())
            }
            // Driver gone: the native side is already torn down.
            None => {
                self.freed = true;
                let _ = self.stmt.free();
                Ok(())
            }
        }
    }

    fn release(&mut self) -> Result<()> {
        if let Err(bug) = self.free() {
            bug.escalate();
        }
        Ok(())
    }
}

impl Drop for ResultCursor {
    fn drop(&mut self) {
        if self.freed || !self.stmt.is_live() {
            return;
        }
        if let Some(driver) = self.driver.upgrade() {
            if let Ok(mut driver) = driver.try_borrow_mut() {
                let _ = driver.free_result(&mut self.stmt);
                return;
            }
        }
        let _ = self.stmt.free();
    }
}

impl std::fmt::Debug for ResultCursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultCursor")
            .field("query", &self.query)
            .field("freed", &self.freed)
            .field("limit_from", &self.limit_from)
            .field("limit_count", &self.limit_count)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::DriverOps;
    use crate::drivers::sqlite::SqliteDriver;

    fn seeded_driver(rows: usize) -> Rc<RefCell<dyn DriverOps>> {
        let mut driver = SqliteDriver::memory().unwrap();
        driver
            .execute_raw("CREATE TABLE nums (n INTEGER, label TEXT)")
            .unwrap();
        for i in 1..=rows {
            driver
                .execute_raw(&format!("INSERT INTO nums VALUES ({}, 'row{}')", i, i))
                .unwrap();
        }
        Rc::new(RefCell::new(driver))
    }

    fn cursor_over(
        driver: &Rc<RefCell<dyn DriverOps>>,
        sql: &str,
        settings: CursorSettings,
    ) -> ResultCursor {
        let outcome = driver.borrow_mut().execute_raw(sql).unwrap();
        match outcome {
            ExecOutcome::Statement(stmt) => {
                ResultCursor::new(Rc::downgrade(driver), stmt, settings)
            }
            ExecOutcome::Done(_) => panic!("expected a result set"),
        }
    }

    fn plain_settings(sql: &str) -> CursorSettings {
        CursorSettings {
            fetch_mode: FetchMode::ORDERED,
            object_type: None,
            portability: Portability::NONE,
            autofree: false,
            prepare_supported: true,
            numrows_native: true,
            limit_native: false,
            query: sql.to_string(),
            params: Vec::new(),
        }
    }

    #[test]
    fn test_limit_window_yields_exact_slice() {
        let driver = seeded_driver(20);
        let sql = "SELECT n FROM nums ORDER BY n";
        let mut settings = plain_settings(sql);
        settings.autofree = true;
        let mut cursor = cursor_over(&driver, sql, settings);
        cursor.set_limit_window(5, 5);

        let mut seen = Vec::new();
        while let Some(RowData::Ordered(values)) = cursor.fetch_row(None).unwrap() {
            seen.push(values[0].as_i64().unwrap());
        }
        assert_eq!(seen, vec![6, 7, 8, 9, 10]);
        // The 6th attempt keeps reporting end-of-data after the autofree.
        assert!(cursor.fetch_row(None).unwrap().is_none());
        assert!(cursor.is_freed());
    }

    #[test]
    fn test_limit_window_past_source_end() {
        let driver = seeded_driver(3);
        let sql = "SELECT n FROM nums ORDER BY n";
        let mut cursor = cursor_over(&driver, sql, plain_settings(sql));
        cursor.set_limit_window(10, 5);
        assert!(cursor.fetch_row(None).unwrap().is_none());
    }

    #[test]
    fn test_fetch_modes_shape_rows() {
        let driver = seeded_driver(1);
        let sql = "SELECT n, label FROM nums";
        let mut cursor = cursor_over(&driver, sql, plain_settings(sql));

        match cursor.fetch_row(Some(FetchMode::ASSOC)).unwrap() {
            Some(RowData::Assoc(row)) => {
                assert_eq!(row.get_i64("n"), Some(1));
                assert_eq!(row.get_str("label"), Some("row1"));
            }
            other => panic!("expected assoc row, got {:?}", other),
        }

        let mut cursor = cursor_over(&driver, sql, plain_settings(sql));
        match cursor.fetch_row(Some(FetchMode::OBJECT)).unwrap() {
            Some(RowData::Object(obj)) => {
                assert_eq!(obj.type_name, None);
                assert_eq!(obj.fields.get_i64("n"), Some(1));
            }
            other => panic!("expected object row, got {:?}", other),
        }
    }

    #[test]
    fn test_portability_post_processing() {
        let driver = seeded_driver(0);
        driver
            .borrow_mut()
            .execute_raw("INSERT INTO nums VALUES (1, 'padded   ')")
            .unwrap();
        driver
            .borrow_mut()
            .execute_raw("INSERT INTO nums VALUES (2, NULL)")
            .unwrap();

        let sql = "SELECT n AS N, label AS LABEL FROM nums ORDER BY n";
        let mut settings = plain_settings(sql);
        settings.portability =
            Portability::LOWERCASE | Portability::RTRIM | Portability::NULL_TO_EMPTY;
        settings.fetch_mode = FetchMode::ASSOC;
        let mut cursor = cursor_over(&driver, sql, settings);

        match cursor.fetch_row(None).unwrap() {
            Some(RowData::Assoc(row)) => {
                assert_eq!(row.get_str("label"), Some("padded"));
                assert!(row.get_named("LABEL").is_none());
            }
            other => panic!("unexpected row {:?}", other),
        }
        match cursor.fetch_row(None).unwrap() {
            Some(RowData::Assoc(row)) => {
                assert_eq!(row.get_str("label"), Some(""));
            }
            other => panic!("unexpected row {:?}", other),
        }
    }

    #[test]
    fn test_num_rows_emulation_recounts() {
        let driver = seeded_driver(4);
        let sql = "SELECT n FROM nums";
        let mut settings = plain_settings(sql);
        settings.portability = Portability::NUMROWS;
        let mut cursor = cursor_over(&driver, sql, settings);

        // Counting never disturbs the cursor position.
        assert_eq!(cursor.num_rows().unwrap(), 4);
        assert!(cursor.fetch_row(None).unwrap().is_some());
        assert_eq!(cursor.num_rows().unwrap(), 4);
    }

    #[test]
    fn test_double_free_reports_no_statement() {
        let driver = seeded_driver(1);
        let sql = "SELECT n FROM nums";
        let mut cursor = cursor_over(&driver, sql, plain_settings(sql));
        cursor.free().unwrap();
        assert_eq!(cursor.free(), Err(DriverBug::NoStatement));
    }

    #[test]
    #[should_panic(expected = "driver contract violated")]
    fn test_fetch_after_explicit_free_panics() {
        let driver = seeded_driver(1);
        let sql = "SELECT n FROM nums";
        let mut cursor = cursor_over(&driver, sql, plain_settings(sql));
        cursor.free().unwrap();
        let _ = cursor.fetch_row(None);
    }

    #[test]
    fn test_table_info_rejects_string_mode() {
        let driver = seeded_driver(1);
        let sql = "SELECT n FROM nums";
        let mut cursor = cursor_over(&driver, sql, plain_settings(sql));
        let err = cursor
            .table_info(Some(Value::Text("full".to_string())))
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::NeedMoreData);
        assert!(cursor.table_info(None).is_ok());
    }
}

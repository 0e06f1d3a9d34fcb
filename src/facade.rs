/// Portable Query Facade
///
/// `DbFacade` is the driver-independent query orchestration layer: it owns
/// the prepared-query registry, dispatches every portable entry point
/// (query/prepare/execute, the one-shot get helpers, the auto-manipulation
/// builder, limit queries) onto the four driver primitives, and keeps the
/// last-query diagnostics that error reporting and row-count emulation
/// rely on.
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::core::tokenizer::{tokenize, PlaceholderKind};
use crate::core::{DbError, ErrorCode, ErrorSink, Result};
use crate::cursor::{CursorSettings, ResultCursor};
use crate::driver::{ColumnInfo, DriverOps, ExecOutcome, InfoScope, LimitSupport};
use crate::options::{DriverOptions, FetchMode, Portability};
use crate::sql::is_manip;
use crate::value::{AssocValue, RowData, Value};

/// A DELETE with no predicate; some backends skip counting those rows.
static BARE_DELETE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*delete\s+from\s+\S+\s*$").expect("bare delete regex"));

/// Bound parameters for the one-shot helpers.
///
/// A bare scalar is normalized into a one-element list, mirroring the
/// historical calling convention.
pub enum Params {
    None,
    One(Value),
    Many(Vec<Value>),
}

impl Params {
    fn into_vec(self) -> Vec<Value> {
        match self {
            Params::None => Vec::new(),
            Params::One(value) => vec![value],
            Params::Many(values) => values,
        }
    }
}

impl From<()> for Params {
    fn from(_: ()) -> Self {
        Params::None
    }
}

impl From<Value> for Params {
    fn from(value: Value) -> Self {
        Params::One(value)
    }
}

impl From<Vec<Value>> for Params {
    fn from(values: Vec<Value>) -> Self {
        Params::Many(values)
    }
}

impl From<&[Value]> for Params {
    fn from(values: &[Value]) -> Self {
        Params::Many(values.to_vec())
    }
}

/// Column selector for `get_col`.
pub enum ColRef {
    Index(usize),
    Name(String),
}

impl From<usize> for ColRef {
    fn from(idx: usize) -> Self {
        ColRef::Index(idx)
    }
}

impl From<&str> for ColRef {
    fn from(name: &str) -> Self {
        ColRef::Name(name.to_string())
    }
}

/// What a portable query produced: a cursor over rows, or the completion
/// sentinel of a manipulation with its affected-row count.
#[derive(Debug)]
pub enum QueryOutcome {
    Rows(ResultCursor),
    Done(u64),
}

impl QueryOutcome {
    pub fn is_done(&self) -> bool {
        matches!(self, QueryOutcome::Done(_))
    }

    /// Unwraps the result cursor of a read query.
    pub fn rows(self) -> Result<ResultCursor> {
        match self {
            QueryOutcome::Rows(cursor) => Ok(cursor),
            QueryOutcome::Done(_) => Err(DbError::with_native(
                ErrorCode::Invalid,
                "statement produced no result set",
            )),
        }
    }

    /// Unwraps the affected-row count of a manipulation.
    pub fn affected(self) -> Result<u64> {
        match self {
            QueryOutcome::Done(count) => Ok(count),
            QueryOutcome::Rows(_) => Err(DbError::with_native(
                ErrorCode::Invalid,
                "statement produced a result set, not an affected-row count",
            )),
        }
    }
}

/// Statement shape built by the auto-manipulation helpers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoQueryMode {
    Insert,
    Update,
}

/// The portable, driver-independent database facade.
pub struct DbFacade {
    driver: Rc<RefCell<dyn DriverOps>>,
    options: DriverOptions,
    fetch_mode: FetchMode,
    fetch_mode_object_type: Option<String>,
    prepared: HashMap<usize, crate::core::tokenizer::PreparedQuery>,
    next_prepared_id: usize,
    last_query: Option<String>,
    last_params: Vec<Value>,
    next_query_manip: Option<bool>,
    allow_unbounded_updates: bool,
    error_sink: Option<ErrorSink>,
}

impl DbFacade {
    /// Wraps a concrete driver with default options.
    pub fn new(driver: impl DriverOps + 'static) -> Self {
        Self::with_options(driver, DriverOptions::default())
    }

    /// Wraps a concrete driver with explicit options.
    pub fn with_options(driver: impl DriverOps + 'static, options: DriverOptions) -> Self {
        let mut driver = driver;
        driver.set_strict_transactions(options.strict_transactions);
        DbFacade {
            driver: Rc::new(RefCell::new(driver)),
            options,
            fetch_mode: FetchMode::ORDERED,
            fetch_mode_object_type: None,
            prepared: HashMap::new(),
            next_prepared_id: 1,
            last_query: None,
            last_params: Vec::new(),
            next_query_manip: None,
            allow_unbounded_updates: false,
            error_sink: None,
        }
    }

    /// Installs the fire-and-forget error reporting sink.
    pub fn set_error_sink(&mut self, sink: ErrorSink) {
        self.error_sink = Some(sink);
    }

    /// Sets the default fetch mode, with an optional row-type tag used by
    /// object fetches.
    pub fn set_fetch_mode(&mut self, mode: FetchMode, object_type: Option<&str>) {
        self.fetch_mode = mode;
        self.fetch_mode_object_type = object_type.map(str::to_string);
    }

    /// Sets one portable option by key.
    pub fn set_option(&mut self, key: &str, value: Value) -> Result<()> {
        self.options.set(key, value).map_err(|e| self.raise(e))?;
        if key == "strict_transactions" {
            self.driver
                .borrow_mut()
                .set_strict_transactions(self.options.strict_transactions);
        }
        Ok(())
    }

    /// Reads one portable option by key.
    pub fn get_option(&self, key: &str) -> Result<Value> {
        self.options.get(key)
    }

    /// Opts in to UPDATE statements without a WHERE clause.
    pub fn accept_unbounded_updates(&mut self, yes: bool) {
        self.allow_unbounded_updates = yes;
    }

    /// Forces the manipulation classification of exactly the next query,
    /// overriding the keyword heuristic, then resets.
    pub fn next_query_is_manip(&mut self, manip: bool) {
        self.next_query_manip = Some(manip);
    }

    /// The most recently executed (or attempted) query text.
    pub fn last_query(&self) -> Option<&str> {
        self.last_query.as_deref()
    }

    fn raise(&self, err: DbError) -> DbError {
        if let Some(sink) = &self.error_sink {
            sink(&err);
        }
        debug!(code = err.code().code(), error = %err, "portable error raised");
        err
    }

    // ---- prepare / execute ------------------------------------------------

    /// Tokenizes a query template and registers it, returning its handle id.
    pub fn prepare(&mut self, sql: &str) -> Result<usize> {
        let prepared = tokenize(sql);
        let id = self.next_prepared_id;
        self.next_prepared_id += 1;
        debug!(id, placeholders = prepared.placeholder_count(), "statement prepared");
        self.prepared.insert(id, prepared);
        Ok(id)
    }

    /// Drops a prepared query from the registry.
    pub fn free_prepared(&mut self, id: usize) -> Result<()> {
        self.prepared.remove(&id).map(|_| ()).ok_or_else(|| {
            self.raise(DbError::with_native(
                ErrorCode::Invalid,
                format!("unknown prepared statement {}", id),
            ))
        })
    }

    /// Substitutes bound values into a prepared template, producing the
    /// literal query string.
    fn build_query(&mut self, id: usize, values: &[Value]) -> Result<String> {
        let prepared = match self.prepared.get(&id) {
            Some(prepared) => prepared.clone(),
            None => {
                return Err(self.raise(DbError::with_native(
                    ErrorCode::Invalid,
                    format!("unknown prepared statement {}", id),
                )))
            }
        };

        if values.len() != prepared.placeholder_count() {
            // Record the template for diagnostics even though nothing ran.
            self.last_query = Some(prepared.raw().to_string());
            return Err(self.raise(DbError::with_info(
                ErrorCode::Mismatch,
                format!(
                    "template has {} placeholders, {} values bound",
                    prepared.placeholder_count(),
                    values.len()
                ),
                prepared.raw(),
            )));
        }

        let tokens = prepared.tokens();
        let mut sql = String::with_capacity(prepared.raw().len());
        for (i, kind) in prepared.kinds().iter().enumerate() {
            sql.push_str(&tokens[i]);
            match kind {
                PlaceholderKind::Scalar => sql.push_str(&self.quote_smart(&values[i])),
                PlaceholderKind::Opaque => {
                    let path = match values[i].as_str() {
                        Some(path) => path,
                        None => {
                            return Err(self.raise(DbError::with_native(
                                ErrorCode::AccessViolation,
                                "opaque placeholder requires a filename value",
                            )))
                        }
                    };
                    let bytes = std::fs::read(path).map_err(|e| {
                        self.raise(DbError::with_info(
                            ErrorCode::AccessViolation,
                            e.to_string(),
                            path,
                        ))
                    })?;
                    let text = String::from_utf8_lossy(&bytes);
                    sql.push('\'');
                    sql.push_str(&self.driver.borrow().escape_simple(&text));
                    sql.push('\'');
                }
                PlaceholderKind::Misc => match &values[i] {
                    Value::Text(text) => sql.push_str(text),
                    other => sql.push_str(&other.to_display()),
                },
            }
        }
        sql.push_str(tokens.last().map(String::as_str).unwrap_or(""));
        Ok(sql)
    }

    /// Executes a prepared query with the given bound values.
    pub fn execute(&mut self, id: usize, values: &[Value]) -> Result<QueryOutcome> {
        let sql = self.build_query(id, values)?;
        self.last_params = values.to_vec();
        self.run(&sql)
    }

    /// Executes a prepared query once per row of bound values. The first
    /// error short-circuits; remaining rows are skipped and transactional
    /// cleanup is the caller's business.
    pub fn execute_multiple(&mut self, id: usize, rows: &[Vec<Value>]) -> Result<()> {
        for values in rows {
            self.execute(id, values)?;
        }
        Ok(())
    }

    /// Issues a query, preparing and executing when parameters are bound.
    pub fn query(&mut self, sql: &str, params: impl Into<Params>) -> Result<QueryOutcome> {
        let params = params.into().into_vec();
        if params.is_empty() {
            self.last_params.clear();
            self.run(sql)
        } else {
            let id = self.prepare(sql)?;
            let outcome = self.execute(id, &params);
            let _ = self.free_prepared(id);
            outcome
        }
    }

    fn run(&mut self, sql: &str) -> Result<QueryOutcome> {
        // With the delete-count workaround on, give a bare DELETE a
        // predicate so every backend reports the removed rows.
        let sql = if self.options.portability.contains(Portability::DELETE_COUNT)
            && BARE_DELETE_RE.is_match(sql)
        {
            format!("{} WHERE 1 = 1", sql.trim_end())
        } else {
            sql.to_string()
        };
        let sql = sql.as_str();

        self.last_query = Some(sql.to_string());
        let manip = match self.next_query_manip.take() {
            Some(forced) => forced,
            None => is_manip(sql),
        };
        if self.options.debug > 0 {
            debug!(manip, sql, "executing query");
        }

        let outcome = {
            let mut driver = self.driver.borrow_mut();
            driver.execute_raw(sql)
        }
        .map_err(|e| self.raise(e))?;

        match outcome {
            ExecOutcome::Done(affected) => Ok(QueryOutcome::Done(affected)),
            ExecOutcome::Statement(mut stmt) if manip => {
                // A forced manipulation may still hand back a result
                // handle; release it and report the completion sentinel.
                let affected = {
                    let mut driver = self.driver.borrow_mut();
                    if let Err(bug) = driver.free_result(&mut stmt) {
                        bug.escalate();
                    }
                    driver.affected_rows()
                };
                Ok(QueryOutcome::Done(affected))
            }
            ExecOutcome::Statement(stmt) => Ok(QueryOutcome::Rows(self.wrap_cursor(stmt, sql))),
        }
    }

    fn wrap_cursor(&self, stmt: crate::core::StatementHandle, sql: &str) -> ResultCursor {
        let (prepare_supported, numrows_native, limit_native) = {
            let driver = self.driver.borrow();
            let features = driver.features();
            (
                features.prepare,
                features.numrows,
                features.limit == LimitSupport::Native,
            )
        };
        ResultCursor::new(
            Rc::downgrade(&self.driver),
            stmt,
            CursorSettings {
                fetch_mode: if self.fetch_mode.is_default() {
                    FetchMode::ORDERED
                } else {
                    self.fetch_mode
                },
                object_type: self.fetch_mode_object_type.clone(),
                portability: self.options.portability,
                autofree: self.options.autofree,
                prepare_supported,
                numrows_native,
                limit_native,
                query: sql.to_string(),
                params: self.last_params.clone(),
            },
        )
    }

    // ---- auto-manipulation builder ---------------------------------------

    /// Builds and registers an INSERT or UPDATE template for the given
    /// table and field list.
    pub fn auto_prepare(
        &mut self,
        table: &str,
        fields: &[&str],
        mode: AutoQueryMode,
        where_clause: Option<&str>,
    ) -> Result<usize> {
        let sql = self.build_manipulation_sql(table, fields, mode, where_clause)?;
        self.prepare(&sql)
    }

    /// Builds, executes and discards an auto-manipulation statement from
    /// field/value assignments.
    pub fn auto_execute(
        &mut self,
        table: &str,
        assignments: &[(&str, Value)],
        mode: AutoQueryMode,
        where_clause: Option<&str>,
    ) -> Result<QueryOutcome> {
        let fields: Vec<&str> = assignments.iter().map(|(field, _)| *field).collect();
        let id = self.auto_prepare(table, &fields, mode, where_clause)?;
        let values: Vec<Value> = assignments.iter().map(|(_, value)| value.clone()).collect();
        let outcome = self.execute(id, &values);
        let _ = self.free_prepared(id);
        outcome
    }

    fn build_manipulation_sql(
        &mut self,
        table: &str,
        fields: &[&str],
        mode: AutoQueryMode,
        where_clause: Option<&str>,
    ) -> Result<String> {
        if fields.is_empty() {
            return Err(self.raise(DbError::with_info(
                ErrorCode::NeedMoreData,
                "no fields supplied",
                table,
            )));
        }
        match mode {
            AutoQueryMode::Insert => {
                let placeholders = vec!["?"; fields.len()].join(", ");
                Ok(format!(
                    "INSERT INTO {} ({}) VALUES ({})",
                    table,
                    fields.join(", "),
                    placeholders
                ))
            }
            AutoQueryMode::Update => {
                let assignments = fields
                    .iter()
                    .map(|field| format!("{} = ?", field))
                    .collect::<Vec<_>>()
                    .join(", ");
                let mut sql = format!("UPDATE {} SET {}", table, assignments);
                match where_clause {
                    Some(clause) if !clause.trim().is_empty() => {
                        sql.push_str(" WHERE ");
                        sql.push_str(clause);
                    }
                    _ if self.allow_unbounded_updates => {}
                    _ => {
                        return Err(self.raise(DbError::with_info(
                            ErrorCode::PossibleUnintendedConsequences,
                            "UPDATE without a WHERE clause would touch every row",
                            sql,
                        )))
                    }
                }
                Ok(sql)
            }
        }
    }

    // ---- limit queries ----------------------------------------------------

    /// Runs a query constrained to `count` rows starting at `from`.
    ///
    /// The driver rewrites the query where its dialect can; the returned
    /// cursor carries the window either way so backends without native
    /// windowing are emulated client-side.
    pub fn limit_query(
        &mut self,
        sql: &str,
        from: usize,
        count: usize,
        params: impl Into<Params>,
    ) -> Result<QueryOutcome> {
        let modified = self.driver.borrow().modify_limit_query(sql, from, count);
        match self.query(&modified, params)? {
            QueryOutcome::Rows(mut cursor) => {
                cursor.set_limit_window(from, count);
                Ok(QueryOutcome::Rows(cursor))
            }
            done => Ok(done),
        }
    }

    // ---- one-shot fetch helpers ------------------------------------------

    /// First column of the first row, or `None` on an empty result.
    pub fn get_one(&mut self, sql: &str, params: impl Into<Params>) -> Result<Option<Value>> {
        let mut cursor = self.query(sql, params)?.rows()?;
        let fetched = cursor.fetch_row(Some(FetchMode::ORDERED));
        let result = match fetched {
            Ok(Some(RowData::Ordered(mut values))) if !values.is_empty() => {
                Ok(Some(values.swap_remove(0)))
            }
            Ok(_) => Ok(None),
            Err(e) => Err(e),
        };
        let _ = cursor.free();
        result
    }

    /// The first row of the result, shaped per `mode`.
    pub fn get_row(
        &mut self,
        sql: &str,
        params: impl Into<Params>,
        mode: FetchMode,
    ) -> Result<Option<RowData>> {
        let mut cursor = self.query(sql, params)?.rows()?;
        let requested = if mode.is_default() { None } else { Some(mode) };
        let result = cursor.fetch_row(requested);
        let _ = cursor.free();
        result
    }

    /// One column of every row.
    pub fn get_col(
        &mut self,
        sql: &str,
        col: impl Into<ColRef>,
        params: impl Into<Params>,
    ) -> Result<Vec<Value>> {
        let col = col.into();
        let mut cursor = self.query(sql, params)?.rows()?;
        let mut out = Vec::new();
        let result = loop {
            let mode = match col {
                ColRef::Index(_) => FetchMode::ORDERED,
                ColRef::Name(_) => FetchMode::ASSOC,
            };
            match cursor.fetch_row(Some(mode)) {
                Ok(Some(RowData::Ordered(mut values))) => {
                    let idx = match col {
                        ColRef::Index(idx) => idx,
                        ColRef::Name(_) => unreachable!("ordered fetch for named column"),
                    };
                    if idx >= values.len() {
                        break Err(self.raise(DbError::with_native(
                            ErrorCode::NoSuchField,
                            format!("column index {} out of range", idx),
                        )));
                    }
                    out.push(values.swap_remove(idx));
                }
                Ok(Some(RowData::Assoc(row))) => {
                    let name = match &col {
                        ColRef::Name(name) => name,
                        ColRef::Index(_) => unreachable!("assoc fetch for indexed column"),
                    };
                    match row.get_named(name) {
                        Some(value) => out.push(value.clone()),
                        None => {
                            break Err(self.raise(DbError::with_native(
                                ErrorCode::NoSuchField,
                                format!("no column named {}", name),
                            )))
                        }
                    }
                }
                Ok(Some(_)) => unreachable!("get_col fetches ordered or assoc"),
                Ok(None) => break Ok(()),
                Err(e) => break Err(e),
            }
        };
        let _ = cursor.free();
        result.map(|_| out)
    }

    /// Maps the first result column to the rest of the row.
    ///
    /// Needs at least two result columns. With exactly two and no
    /// `force_array`, values are the bare second column; otherwise the
    /// key-stripped row tail. `group` accumulates entries under duplicate
    /// keys instead of overwriting.
    pub fn get_assoc(
        &mut self,
        sql: &str,
        force_array: bool,
        params: impl Into<Params>,
        group: bool,
    ) -> Result<HashMap<String, AssocValue>> {
        let mut cursor = self.query(sql, params)?.rows()?;

        match cursor.num_cols() {
            Ok(cols) if cols < 2 => {
                let _ = cursor.free();
                return Err(self.raise(DbError::with_native(
                    ErrorCode::Truncated,
                    format!("two result columns required, query produced {}", cols),
                )));
            }
            Err(e) => {
                let _ = cursor.free();
                return Err(e);
            }
            Ok(_) => {}
        }

        let mut map = HashMap::new();
        let result = loop {
            match cursor.fetch_row(Some(FetchMode::ORDERED)) {
                Ok(Some(RowData::Ordered(mut values))) => {
                    let key = values.remove(0).to_display();
                    let entry = match (values.len(), force_array) {
                        (1, false) => match values.pop() {
                            Some(value) => AssocValue::Scalar(value),
                            None => AssocValue::Row(Vec::new()),
                        },
                        _ => AssocValue::Row(values),
                    };
                    if group {
                        match map
                            .entry(key)
                            .or_insert_with(|| AssocValue::Group(Vec::new()))
                        {
                            AssocValue::Group(items) => items.push(entry),
                            _ => unreachable!("group entries are always Group"),
                        }
                    } else {
                        map.insert(key, entry);
                    }
                }
                Ok(Some(_)) => unreachable!("get_assoc fetches ordered"),
                Ok(None) => break Ok(()),
                Err(e) => break Err(e),
            }
        };
        let _ = cursor.free();
        result.map(|_| map)
    }

    /// Every row of the result.
    ///
    /// A flipped mode transposes the result: the outer index walks
    /// columns instead of rows.
    pub fn get_all(
        &mut self,
        sql: &str,
        params: impl Into<Params>,
        mode: FetchMode,
    ) -> Result<Vec<RowData>> {
        let mut cursor = self.query(sql, params)?.rows()?;
        let flipped = mode.is_flipped();
        let requested = if mode.is_default() {
            None
        } else {
            Some(mode.base())
        };

        let mut rows = Vec::new();
        let result = loop {
            match cursor.fetch_row(requested) {
                Ok(Some(row)) => rows.push(row),
                Ok(None) => break Ok(()),
                Err(e) => break Err(e),
            }
        };
        let _ = cursor.free();
        result?;

        if !flipped {
            return Ok(rows);
        }
        let cols = rows.first().map(|row| row.values().len()).unwrap_or(0);
        let mut flipped_rows = Vec::with_capacity(cols);
        for col in 0..cols {
            let column: Vec<Value> = rows
                .iter()
                .map(|row| row.values().get(col).cloned().unwrap_or(Value::Null))
                .collect();
            flipped_rows.push(RowData::Ordered(column));
        }
        Ok(flipped_rows)
    }

    // ---- quoting ----------------------------------------------------------

    /// Formats a value as a SQL literal: numbers pass through unquoted,
    /// booleans use the backend's literals, NULL stays bare, and
    /// everything else is escaped and single-quoted.
    pub fn quote_smart(&self, value: &Value) -> String {
        let driver = self.driver.borrow();
        match value {
            Value::Null => "NULL".to_string(),
            Value::Bool(flag) => {
                let (true_lit, false_lit) = driver.boolean_literals();
                if *flag { true_lit } else { false_lit }.to_string()
            }
            Value::Integer(n) => n.to_string(),
            Value::Real(f) => f.to_string(),
            Value::Text(text) => format!("'{}'", driver.escape_simple(text)),
            Value::Blob(bytes) => {
                format!("'{}'", driver.escape_simple(&String::from_utf8_lossy(bytes)))
            }
        }
    }

    /// Identifier quoted for the backend's dialect.
    pub fn quote_identifier(&self, ident: &str) -> String {
        self.driver.borrow().quote_identifier(ident)
    }

    /// String escaped for a single-quoted literal, without the quotes.
    pub fn escape_simple(&self, text: &str) -> String {
        self.driver.borrow().escape_simple(text)
    }

    // ---- transactions and passthroughs -----------------------------------

    pub fn auto_commit(&mut self, on: bool) -> Result<()> {
        let result = self.driver.borrow_mut().auto_commit(on);
        result.map_err(|e| self.raise(e))
    }

    pub fn commit(&mut self) -> Result<()> {
        let result = self.driver.borrow_mut().commit();
        result.map_err(|e| self.raise(e))
    }

    pub fn rollback(&mut self) -> Result<()> {
        let result = self.driver.borrow_mut().rollback();
        result.map_err(|e| self.raise(e))
    }

    pub fn affected_rows(&self) -> u64 {
        self.driver.borrow().affected_rows()
    }

    pub fn last_insert_id(&mut self) -> Result<i64> {
        let result = self.driver.borrow_mut().last_insert_id();
        result.map_err(|e| self.raise(e))
    }

    /// Column metadata for a named table.
    pub fn table_info(&mut self, table: &str) -> Result<Vec<ColumnInfo>> {
        let result = self.driver.borrow_mut().table_info(InfoScope::Table(table));
        result.map_err(|e| self.raise(e))
    }

    /// Native diagnostic text of the backend's most recent error.
    pub fn error_native(&self) -> Option<String> {
        self.driver.borrow().error_native()
    }

    /// Native error code (SQLSTATE or backend-specific) of the most
    /// recent error.
    pub fn native_error_code(&self) -> Option<String> {
        self.driver.borrow().native_error_code()
    }

    /// Expands the configured sequence-name format for a base name.
    pub fn sequence_name(&self, name: &str) -> String {
        self.options.seqname_format.replace("%s", name)
    }

    /// The backend's platform tag.
    pub fn platform(&self) -> &'static str {
        self.driver.borrow().platform()
    }
}

impl std::fmt::Debug for DbFacade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbFacade")
            .field("platform", &self.platform())
            .field("prepared", &self.prepared.len())
            .field("last_query", &self.last_query)
            .finish()
    }
}

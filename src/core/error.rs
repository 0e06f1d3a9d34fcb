/// Error Module
///
/// This module defines the error model for the portable SQL layer.
/// Database-level failures are represented as `DbError` values that are
/// returned up the call chain, never thrown as control flow. Programmer
/// mistakes at the driver boundary (dead or foreign statement handles)
/// are a separate `DriverBug` type so callers can tell a runtime database
/// condition apart from a bug in their own code.
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// Portable error codes, decoupled from any backend's native error numbers.
///
/// The discriminants are stable: `Ok` is positive, everything else is a
/// fixed negative integer so codes can be logged and compared across
/// versions and backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    Ok = 1,
    Error = -1,
    Syntax = -2,
    Constraint = -3,
    NotFound = -4,
    AlreadyExists = -5,
    Unsupported = -6,
    Mismatch = -7,
    Invalid = -8,
    NotCapable = -9,
    Truncated = -10,
    InvalidNumber = -11,
    InvalidDate = -12,
    DivZero = -13,
    NoDbSelected = -14,
    CannotCreate = -15,
    CannotDrop = -17,
    NoSuchTable = -18,
    NoSuchField = -19,
    NeedMoreData = -20,
    NotLocked = -21,
    ValueCountOnRow = -22,
    InvalidDsn = -23,
    ConnectFailed = -24,
    ExtensionNotFound = -25,
    AccessViolation = -26,
    NoSuchDb = -27,
    ConstraintNotNull = -29,
    PossibleUnintendedConsequences = -31,
    ActiveTransactions = -32,
}

impl ErrorCode {
    /// Returns the stable integer form of this code.
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Fixed human-readable message for this code.
    pub fn message(self) -> &'static str {
        match self {
            ErrorCode::Ok => "no error",
            ErrorCode::Error => "unknown error",
            ErrorCode::Syntax => "syntax error",
            ErrorCode::Constraint => "constraint violation",
            ErrorCode::NotFound => "not found",
            ErrorCode::AlreadyExists => "already exists",
            ErrorCode::Unsupported => "not supported",
            ErrorCode::Mismatch => "mismatch",
            ErrorCode::Invalid => "invalid",
            ErrorCode::NotCapable => "capability not supported by this backend",
            ErrorCode::Truncated => "truncated",
            ErrorCode::InvalidNumber => "invalid number",
            ErrorCode::InvalidDate => "invalid date or time",
            ErrorCode::DivZero => "division by zero",
            ErrorCode::NoDbSelected => "no database selected",
            ErrorCode::CannotCreate => "can not create",
            ErrorCode::CannotDrop => "can not drop",
            ErrorCode::NoSuchTable => "no such table",
            ErrorCode::NoSuchField => "no such field",
            ErrorCode::NeedMoreData => "insufficient data supplied",
            ErrorCode::NotLocked => "not locked",
            ErrorCode::ValueCountOnRow => "value count on row",
            ErrorCode::InvalidDsn => "invalid DSN",
            ErrorCode::ConnectFailed => "connect failed",
            ErrorCode::ExtensionNotFound => "extension not found",
            ErrorCode::AccessViolation => "insufficient permissions",
            ErrorCode::NoSuchDb => "no such database",
            ErrorCode::ConstraintNotNull => "null value violates not-null constraint",
            ErrorCode::PossibleUnintendedConsequences => {
                "probable unintended consequences: the statement would affect every row"
            }
            ErrorCode::ActiveTransactions => "an active transaction is still open",
        }
    }
}

/// How an error should be surfaced to the application.
///
/// The core query path always constructs `Return` errors; the other modes
/// exist only so a boundary adapter can replay legacy reporting behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportMode {
    #[default]
    Return,
    Print,
    Trigger,
    Die,
    Callback,
    Exception,
}

/// A portable database error value.
///
/// Constructed once at the point of failure and then immutable. Carries the
/// portable code, the native diagnostic text from the backend (if any), and
/// free-form user info such as the failing query text.
#[derive(Debug, Clone)]
pub struct DbError {
    code: ErrorCode,
    native_message: String,
    user_info: String,
    mode: ReportMode,
}

impl DbError {
    /// Creates an error carrying only a portable code.
    pub fn new(code: ErrorCode) -> Self {
        DbError {
            code,
            native_message: String::new(),
            user_info: String::new(),
            mode: ReportMode::Return,
        }
    }

    /// Creates an error with the backend's native diagnostic text attached.
    pub fn with_native(code: ErrorCode, native_message: impl Into<String>) -> Self {
        DbError {
            code,
            native_message: native_message.into(),
            user_info: String::new(),
            mode: ReportMode::Return,
        }
    }

    /// Attaches caller context (typically the failing query) to a fresh error.
    pub fn with_info(
        code: ErrorCode,
        native_message: impl Into<String>,
        user_info: impl Into<String>,
    ) -> Self {
        DbError {
            code,
            native_message: native_message.into(),
            user_info: user_info.into(),
            mode: ReportMode::Return,
        }
    }

    /// Tags the error with a legacy reporting mode.
    ///
    /// Only boundary adapters replaying historical print/die/callback
    /// behavior use this; the core query path leaves every error at
    /// `ReportMode::Return`.
    pub fn reported_via(mut self, mode: ReportMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// The fixed portable message for this error's code.
    pub fn message(&self) -> &'static str {
        self.code.message()
    }

    /// Native diagnostic text reported by the backend, if any.
    pub fn native_message(&self) -> &str {
        &self.native_message
    }

    pub fn user_info(&self) -> &str {
        &self.user_info
    }

    pub fn mode(&self) -> ReportMode {
        self.mode
    }
}

impl fmt::Display for DbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code.message())?;
        if !self.native_message.is_empty() {
            write!(f, ": {}", self.native_message)?;
        }
        if !self.user_info.is_empty() {
            write!(f, " [{}]", self.user_info)?;
        }
        Ok(())
    }
}

impl std::error::Error for DbError {}

/// Result alias used across the whole crate for portable operations.
pub type Result<T> = std::result::Result<T, DbError>;

/// Programmer-contract violations at the driver boundary.
///
/// These indicate a bug in the calling code, not a database condition, and
/// are deliberately kept apart from `DbError`. There is no conversion
/// between the two types.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DriverBug {
    /// The statement handle has been freed (or was never populated).
    #[error("no statement: the handle has already been freed")]
    NoStatement,

    /// A statement handle from another driver was passed across a boundary.
    #[error("statement handle holds {actual}, driver expected {expected}")]
    WrongStatementType {
        expected: &'static str,
        actual: &'static str,
    },
}

impl DriverBug {
    /// Escalates the bug to a hard failure.
    ///
    /// Driver adapters call this when a contract violation reaches a
    /// capability method whose signature only reports portable errors.
    pub fn escalate(self) -> ! {
        panic!("driver contract violated: {}", self)
    }
}

/// Injectable fire-and-forget error reporting channel.
///
/// Replaces the legacy process-wide observer registry: whoever constructs
/// the facade decides where error notifications go.
pub type ErrorSink = Arc<dyn Fn(&DbError) + Send + Sync>;

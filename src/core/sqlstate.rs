/// SQLSTATE Mapping Module
///
/// Maps ANSI five-character SQLSTATE codes onto the portable error codes.
/// The table is fixed and shared by every concrete driver; translation is a
/// pure lookup with no state. Codes that are not in the table fall back to
/// the generic `ErrorCode::Error`.
use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::core::error::ErrorCode;

/// The fixed SQLSTATE translation table.
///
/// Covers the standard classes raised by the supported backends: data
/// exceptions (22xxx), integrity violations (23xxx), syntax/access errors
/// (42xxx) and connection failures (08xxx), plus the ODBC-era S-codes some
/// drivers still emit.
const TABLE: &[(&str, ErrorCode)] = &[
    ("01004", ErrorCode::Truncated),
    ("02000", ErrorCode::NotFound),
    ("07001", ErrorCode::Mismatch),
    ("08001", ErrorCode::ConnectFailed),
    ("08004", ErrorCode::ConnectFailed),
    ("08006", ErrorCode::ConnectFailed),
    ("08007", ErrorCode::ConnectFailed),
    ("0A000", ErrorCode::Unsupported),
    ("21S01", ErrorCode::ValueCountOnRow),
    ("21S02", ErrorCode::Mismatch),
    ("22001", ErrorCode::Truncated),
    ("22003", ErrorCode::InvalidNumber),
    ("22004", ErrorCode::ConstraintNotNull),
    ("22005", ErrorCode::InvalidNumber),
    ("22007", ErrorCode::InvalidDate),
    ("22008", ErrorCode::InvalidDate),
    ("22012", ErrorCode::DivZero),
    ("22P02", ErrorCode::InvalidNumber),
    ("23000", ErrorCode::Constraint),
    ("23502", ErrorCode::ConstraintNotNull),
    ("23503", ErrorCode::Constraint),
    ("23505", ErrorCode::Constraint),
    ("24000", ErrorCode::Invalid),
    ("25001", ErrorCode::ActiveTransactions),
    ("28000", ErrorCode::AccessViolation),
    ("34000", ErrorCode::Invalid),
    ("37000", ErrorCode::Syntax),
    ("3D000", ErrorCode::NoSuchDb),
    ("3F000", ErrorCode::NoSuchDb),
    ("42000", ErrorCode::Syntax),
    ("42501", ErrorCode::AccessViolation),
    ("42601", ErrorCode::Syntax),
    ("42701", ErrorCode::AlreadyExists),
    ("42703", ErrorCode::NoSuchField),
    ("42704", ErrorCode::NotFound),
    ("42883", ErrorCode::NotFound),
    ("42P01", ErrorCode::NoSuchTable),
    ("42P04", ErrorCode::AlreadyExists),
    ("42P07", ErrorCode::AlreadyExists),
    ("42S01", ErrorCode::AlreadyExists),
    ("42S02", ErrorCode::NoSuchTable),
    ("42S11", ErrorCode::AlreadyExists),
    ("42S12", ErrorCode::NotFound),
    ("42S21", ErrorCode::AlreadyExists),
    ("42S22", ErrorCode::NoSuchField),
    ("44000", ErrorCode::Constraint),
    ("HY000", ErrorCode::Error),
    ("HY001", ErrorCode::Error),
    ("IM001", ErrorCode::Unsupported),
];

static LOOKUP: Lazy<HashMap<&'static str, ErrorCode>> =
    Lazy::new(|| TABLE.iter().copied().collect());

/// Translates a SQLSTATE into a portable error code.
///
/// Unknown or malformed states map to `ErrorCode::Error`.
pub fn error_code(sqlstate: &str) -> ErrorCode {
    LOOKUP.get(sqlstate).copied().unwrap_or(ErrorCode::Error)
}

/// The SQLSTATE codes the table knows about, for diagnostics and tests.
pub fn known_states() -> impl Iterator<Item = &'static str> {
    TABLE.iter().map(|(state, _)| *state)
}

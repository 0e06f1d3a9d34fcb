/// SQL Classification Module
///
/// Decides whether a statement manipulates data or schema, as opposed to
/// only reading. The portable layer needs this to pick between returning a
/// result cursor and returning an affected-row outcome, and the drivers
/// need it to know when a statement opens an implicit transaction.
use once_cell::sync::Lazy;
use regex::Regex;

/// Manipulation statements, anchored at the start of the (optionally
/// quoted) statement text. `(?s)` lets the SELECT INTO arm span newlines.
static MANIP_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?is)^\s*"?(insert|update|delete|replace|create|drop|load\s+data|select\s+.+\s+into\s+.+\s+from|copy|alter|grant|revoke|lock|unlock)\s+"#,
    )
    .expect("manipulation regex is valid")
});

/// Returns true when the statement mutates data or schema.
///
/// # Examples
///
/// ```
/// use sqlport::sql::is_manip;
///
/// assert!(is_manip("INSERT INTO t VALUES (1)"));
/// assert!(!is_manip("SELECT * FROM t"));
/// ```
pub fn is_manip(sql: &str) -> bool {
    MANIP_RE.is_match(sql)
}

/// Options Module
///
/// Fetch modes, the portability bitmask and the string-keyed option set a
/// facade instance carries. Options can be set programmatically or loaded
/// from a TOML fragment.
use std::fs;
use std::ops::{BitAnd, BitOr};
use std::path::Path;

use serde::Deserialize;

use crate::core::{DbError, ErrorCode, Result};
use crate::value::Value;

/// The shape in which a result row is materialized.
///
/// `FLIPPED` is a modifier bit that composes with a base mode via `|`;
/// the base modes themselves are plain enumerated values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchMode(u8);

impl FetchMode {
    /// Use the facade's configured default mode.
    pub const DEFAULT: FetchMode = FetchMode(0);
    /// 0-indexed array of values.
    pub const ORDERED: FetchMode = FetchMode(1);
    /// Column-name keyed map.
    pub const ASSOC: FetchMode = FetchMode(2);
    /// Struct-like object.
    pub const OBJECT: FetchMode = FetchMode(3);
    /// Column-major instead of row-major (modifier bit).
    pub const FLIPPED: FetchMode = FetchMode(4);

    pub fn bits(self) -> u8 {
        self.0
    }

    /// The base mode with the flipped bit masked off.
    pub fn base(self) -> FetchMode {
        FetchMode(self.0 & 0x3)
    }

    pub fn is_flipped(self) -> bool {
        self.0 & Self::FLIPPED.0 != 0
    }

    pub fn is_default(self) -> bool {
        self.base().0 == 0
    }
}

impl BitOr for FetchMode {
    type Output = FetchMode;

    fn bitor(self, rhs: FetchMode) -> FetchMode {
        FetchMode(self.0 | rhs.0)
    }
}

impl Default for FetchMode {
    fn default() -> Self {
        FetchMode::ORDERED
    }
}

/// Bitmask of workarounds applied to fetched rows and driver quirks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Portability(u8);

impl Portability {
    pub const NONE: Portability = Portability(0);
    /// Lowercase all column-name keys.
    pub const LOWERCASE: Portability = Portability(1);
    /// Right-trim all string values.
    pub const RTRIM: Portability = Portability(2);
    /// Force counting of deleted rows on backends that omit it.
    pub const DELETE_COUNT: Portability = Portability(4);
    /// Emulate row counts on backends with unreliable native counters.
    pub const NUMROWS: Portability = Portability(8);
    /// Normalize portable error codes across backends.
    pub const ERRORS: Portability = Portability(16);
    /// Convert NULL values to empty strings.
    pub const NULL_TO_EMPTY: Portability = Portability(32);
    pub const ALL: Portability = Portability(63);

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn from_bits(bits: u8) -> Portability {
        Portability(bits & Self::ALL.0)
    }

    pub fn contains(self, flag: Portability) -> bool {
        self.0 & flag.0 == flag.0
    }
}

impl BitOr for Portability {
    type Output = Portability;

    fn bitor(self, rhs: Portability) -> Portability {
        Portability(self.0 | rhs.0)
    }
}

impl BitAnd for Portability {
    type Output = Portability;

    fn bitand(self, rhs: Portability) -> Portability {
        Portability(self.0 & rhs.0)
    }
}

impl Default for Portability {
    fn default() -> Self {
        Portability::NONE
    }
}

/// The portable option set carried by a facade instance.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DriverOptions {
    /// Free a result's native resource automatically at end-of-data.
    pub autofree: bool,
    /// Row buffering hint handed to drivers that stream.
    pub result_buffering: u32,
    /// Debug verbosity (0 = off).
    pub debug: u32,
    /// Portability workaround bitmask.
    pub portability: Portability,
    /// Format applied to sequence names; `%s` expands to the base name.
    pub seqname_format: String,
    /// Refuse to toggle autocommit while a transaction is open.
    pub strict_transactions: bool,
}

impl Default for DriverOptions {
    fn default() -> Self {
        DriverOptions {
            autofree: false,
            result_buffering: 1000,
            debug: 0,
            portability: Portability::NONE,
            seqname_format: "%s_seq".to_string(),
            strict_transactions: true,
        }
    }
}

impl DriverOptions {
    /// Sets one option by its string key.
    ///
    /// Unknown keys fail with `Unsupported`; a value of the wrong type
    /// fails with `Invalid`.
    pub fn set(&mut self, key: &str, value: Value) -> Result<()> {
        match key {
            "autofree" => self.autofree = expect_bool(key, &value)?,
            "result_buffering" => self.result_buffering = expect_int(key, &value)? as u32,
            "debug" => self.debug = expect_int(key, &value)? as u32,
            "portability" => {
                self.portability = Portability::from_bits(expect_int(key, &value)? as u8)
            }
            "seqname_format" => {
                self.seqname_format = value
                    .as_str()
                    .ok_or_else(|| wrong_type(key, &value))?
                    .to_string()
            }
            "strict_transactions" => self.strict_transactions = expect_bool(key, &value)?,
            _ => {
                return Err(DbError::with_native(
                    ErrorCode::Unsupported,
                    format!("unknown option: {}", key),
                ))
            }
        }
        Ok(())
    }

    /// Reads one option by its string key.
    pub fn get(&self, key: &str) -> Result<Value> {
        match key {
            "autofree" => Ok(Value::Bool(self.autofree)),
            "result_buffering" => Ok(Value::Integer(self.result_buffering as i64)),
            "debug" => Ok(Value::Integer(self.debug as i64)),
            "portability" => Ok(Value::Integer(self.portability.bits() as i64)),
            "seqname_format" => Ok(Value::Text(self.seqname_format.clone())),
            "strict_transactions" => Ok(Value::Bool(self.strict_transactions)),
            _ => Err(DbError::with_native(
                ErrorCode::Unsupported,
                format!("unknown option: {}", key),
            )),
        }
    }
}

fn expect_bool(key: &str, value: &Value) -> Result<bool> {
    match value {
        Value::Bool(b) => Ok(*b),
        // Integer 0/1 is accepted for compatibility with numeric configs.
        Value::Integer(0) => Ok(false),
        Value::Integer(1) => Ok(true),
        _ => Err(wrong_type(key, value)),
    }
}

fn expect_int(key: &str, value: &Value) -> Result<i64> {
    value.as_i64().ok_or_else(|| wrong_type(key, value))
}

fn wrong_type(key: &str, value: &Value) -> DbError {
    DbError::with_native(
        ErrorCode::Invalid,
        format!("option {} got incompatible value {}", key, value.to_display()),
    )
}

/// Loads driver options from a TOML file at the given path.
///
/// Missing keys keep their defaults, so a fragment such as
/// `portability = 63` is a complete configuration.
pub fn load_options<P: AsRef<Path>>(path: P) -> Result<DriverOptions> {
    let content = fs::read_to_string(path)
        .map_err(|e| DbError::with_native(ErrorCode::Invalid, e.to_string()))?;
    toml::from_str(&content).map_err(|e| DbError::with_native(ErrorCode::Invalid, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_fetch_mode_flip_composition() {
        let mode = FetchMode::ASSOC | FetchMode::FLIPPED;
        assert!(mode.is_flipped());
        assert_eq!(mode.base(), FetchMode::ASSOC);
        assert!(!FetchMode::ASSOC.is_flipped());
        assert!(FetchMode::DEFAULT.is_default());
    }

    #[test]
    fn test_portability_flags_compose() {
        let flags = Portability::LOWERCASE | Portability::RTRIM;
        assert!(flags.contains(Portability::LOWERCASE));
        assert!(flags.contains(Portability::RTRIM));
        assert!(!flags.contains(Portability::NUMROWS));
        assert_eq!(Portability::ALL.bits(), 63);
        assert_eq!(Portability::from_bits(255), Portability::ALL);
    }

    #[test]
    fn test_option_round_trip_for_every_key() {
        let mut opts = DriverOptions::default();
        let cases = [
            ("autofree", Value::Bool(true)),
            ("result_buffering", Value::Integer(50)),
            ("debug", Value::Integer(2)),
            ("portability", Value::Integer(63)),
            ("seqname_format", Value::Text("%s_id_seq".to_string())),
            ("strict_transactions", Value::Bool(false)),
        ];
        for (key, value) in cases {
            opts.set(key, value.clone()).unwrap();
            assert_eq!(opts.get(key).unwrap(), value, "round trip failed for {}", key);
        }
    }

    #[test]
    fn test_unknown_option_is_unsupported() {
        let mut opts = DriverOptions::default();
        let err = opts.set("persistent", Value::Bool(true)).unwrap_err();
        assert_eq!(err.code(), ErrorCode::Unsupported);
        assert_eq!(opts.get("persistent").unwrap_err().code(), ErrorCode::Unsupported);
    }

    #[test]
    fn test_wrong_value_type_is_invalid() {
        let mut opts = DriverOptions::default();
        let err = opts.set("autofree", Value::Text("yes".into())).unwrap_err();
        assert_eq!(err.code(), ErrorCode::Invalid);
    }

    #[test]
    fn test_load_options_from_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "autofree = true\nportability = 3\nseqname_format = \"%s_sequence\""
        )
        .unwrap();

        let opts = load_options(file.path()).unwrap();
        assert!(opts.autofree);
        assert!(opts.portability.contains(Portability::LOWERCASE));
        assert!(opts.portability.contains(Portability::RTRIM));
        assert_eq!(opts.seqname_format, "%s_sequence");
        // Untouched keys keep their defaults.
        assert_eq!(opts.result_buffering, 1000);
        assert!(opts.strict_transactions);
    }

    #[test]
    fn test_load_options_rejects_bad_file() {
        let err = load_options("/nonexistent/options.toml").unwrap_err();
        assert_eq!(err.code(), ErrorCode::Invalid);
    }
}

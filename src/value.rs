/// Value and Row Module
///
/// `Value` is the scalar type bound into queries and returned in result
/// cells. `Row` is an ordered column-name/value map with typed accessors,
/// the crate's only row-shaping convenience. `RowData` is the fetch-mode
/// polymorphic shape a cursor yields.
use serde::Serialize;

/// A SQL scalar: bound as a parameter or fetched from a result cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Value {
    /// Whether the value renders unquoted in SQL (numeric types).
    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Integer(_) | Value::Real(_))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Real(f) => Some(*f),
            Value::Integer(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Formats the value for display.
    pub fn to_display(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Integer(n) => n.to_string(),
            Value::Real(f) => f.to_string(),
            Value::Text(s) => s.clone(),
            Value::Blob(b) => format!("<BLOB: {} bytes>", b.len()),
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Integer(n as i64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Real(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Blob(b)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

/// An ordered column-name/value map representing one fetched row.
///
/// Lookup by position is O(1); lookup by name is a linear scan over the
/// column list, which is fine at result-row widths.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl Row {
    pub fn new(columns: Vec<String>, values: Vec<Value>) -> Self {
        debug_assert_eq!(columns.len(), values.len());
        Row { columns, values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn get(&self, idx: usize) -> Option<&Value> {
        self.values.get(idx)
    }

    pub fn get_named(&self, name: &str) -> Option<&Value> {
        let idx = self.columns.iter().position(|c| c == name)?;
        self.values.get(idx)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get_named(name).and_then(Value::as_str)
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get_named(name).and_then(Value::as_i64)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }

    /// Consumes the row into its parallel column/value vectors.
    pub fn into_parts(self) -> (Vec<String>, Vec<Value>) {
        (self.columns, self.values)
    }

    /// Renders the row as a JSON object in column order.
    pub fn to_json(&self) -> serde_json::Value {
        let map: serde_json::Map<String, serde_json::Value> = self
            .iter()
            .map(|(name, value)| {
                (
                    name.to_string(),
                    serde_json::to_value(value).unwrap_or(serde_json::Value::Null),
                )
            })
            .collect();
        serde_json::Value::Object(map)
    }

    pub(crate) fn lowercase_columns(&mut self) {
        for col in &mut self.columns {
            *col = col.to_lowercase();
        }
    }

    pub(crate) fn map_values(&mut self, f: impl Fn(&mut Value)) {
        for value in &mut self.values {
            f(value);
        }
    }
}

/// A structural object shaped from an associative row.
///
/// `type_name` carries the caller-requested row type tag, if any; the
/// fields stay an ordered map, no reflection involved.
#[derive(Debug, Clone, PartialEq)]
pub struct RowObject {
    pub type_name: Option<String>,
    pub fields: Row,
}

/// The fetch-mode polymorphic shape of one fetched row.
#[derive(Debug, Clone, PartialEq)]
pub enum RowData {
    /// 0-indexed list of values.
    Ordered(Vec<Value>),
    /// Column-name keyed map.
    Assoc(Row),
    /// Struct-like object.
    Object(RowObject),
}

impl RowData {
    /// The row's values regardless of shape, in column order.
    pub fn values(&self) -> &[Value] {
        match self {
            RowData::Ordered(values) => values,
            RowData::Assoc(row) => row.values(),
            RowData::Object(obj) => obj.fields.values(),
        }
    }
}

/// One entry of a `get_assoc` result map.
#[derive(Debug, Clone, PartialEq)]
pub enum AssocValue {
    /// Exactly two result columns and no force-array: the bare second column.
    Scalar(Value),
    /// More than two columns (or force-array): the key-stripped row tail.
    Row(Vec<Value>),
    /// Grouping enabled: every entry accumulated under the shared key.
    Group(Vec<AssocValue>),
}

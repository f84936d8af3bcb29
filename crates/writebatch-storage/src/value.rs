//! Column values: bound through rusqlite or rendered as SQL literals.

use std::fmt::Write as _;

use rusqlite::types::{FromSql, FromSqlResult, ToSql, ToSqlOutput, Value, ValueRef};

/// A single column value of a pending row.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
    Bool(bool),
}

impl SqlValue {
    /// Render as a SQLite literal.
    ///
    /// Matches what binding the same value would store: NaN becomes `NULL`,
    /// booleans become `1`/`0`, reals keep a fractional part so they are not
    /// re-read as integers.
    pub fn to_literal(&self) -> String {
        match self {
            SqlValue::Null => "NULL".to_string(),
            SqlValue::Integer(v) => v.to_string(),
            SqlValue::Real(v) if v.is_nan() => "NULL".to_string(),
            SqlValue::Real(v) if v.is_infinite() => {
                let literal = if v.is_sign_positive() { "9e999" } else { "-9e999" };
                literal.to_string()
            }
            SqlValue::Real(v) => format!("{v:?}"),
            SqlValue::Bool(b) => if *b { "1" } else { "0" }.to_string(),
            // The SQL tokenizer stops at NUL, so such text goes in as bytes.
            SqlValue::Text(s) if s.contains('\0') => {
                format!("CAST({} AS TEXT)", hex_literal(s.as_bytes()))
            }
            SqlValue::Text(s) => format!("'{}'", s.replace('\'', "''")),
            SqlValue::Blob(bytes) => hex_literal(bytes),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }
}

fn hex_literal(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2 + 3);
    out.push_str("X'");
    for b in bytes {
        let _ = write!(out, "{b:02X}");
    }
    out.push('\'');
    out
}

impl ToSql for SqlValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            SqlValue::Null => ToSqlOutput::Owned(Value::Null),
            SqlValue::Integer(v) => ToSqlOutput::Owned(Value::Integer(*v)),
            SqlValue::Real(v) => ToSqlOutput::Owned(Value::Real(*v)),
            SqlValue::Bool(b) => ToSqlOutput::Owned(Value::Integer(i64::from(*b))),
            SqlValue::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            SqlValue::Blob(b) => ToSqlOutput::Borrowed(ValueRef::Blob(b)),
        })
    }
}

impl FromSql for SqlValue {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        Ok(match value {
            ValueRef::Null => SqlValue::Null,
            ValueRef::Integer(v) => SqlValue::Integer(v),
            ValueRef::Real(v) => SqlValue::Real(v),
            ValueRef::Text(t) => SqlValue::Text(String::from_utf8_lossy(t).into_owned()),
            ValueRef::Blob(b) => SqlValue::Blob(b.to_vec()),
        })
    }
}

macro_rules! from_integer {
    ($($t:ty),*) => {
        $(impl From<$t> for SqlValue {
            fn from(v: $t) -> Self {
                SqlValue::Integer(i64::from(v))
            }
        })*
    };
}

from_integer!(i8, i16, i32, i64, u8, u16, u32);

impl From<f32> for SqlValue {
    fn from(v: f32) -> Self {
        SqlValue::Real(f64::from(v))
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        SqlValue::Real(v)
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Bool(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl From<Vec<u8>> for SqlValue {
    fn from(v: Vec<u8>) -> Self {
        SqlValue::Blob(v)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(SqlValue::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_quotes_are_doubled() {
        assert_eq!(SqlValue::from("O'Brien").to_literal(), "'O''Brien'");
        assert_eq!(SqlValue::from("''").to_literal(), "''''''");
    }

    #[test]
    fn test_text_with_nul_is_hex_encoded() {
        assert_eq!(
            SqlValue::from("x\0y").to_literal(),
            "CAST(X'780079' AS TEXT)"
        );
    }

    #[test]
    fn test_real_keeps_fraction() {
        assert_eq!(SqlValue::Real(1.0).to_literal(), "1.0");
        assert_eq!(SqlValue::Real(-0.25).to_literal(), "-0.25");
        assert_eq!(SqlValue::Real(f64::NAN).to_literal(), "NULL");
        assert_eq!(SqlValue::Real(f64::INFINITY).to_literal(), "9e999");
        assert_eq!(SqlValue::Real(f64::NEG_INFINITY).to_literal(), "-9e999");
    }

    #[test]
    fn test_scalar_literals() {
        assert_eq!(SqlValue::Null.to_literal(), "NULL");
        assert_eq!(SqlValue::from(-42i32).to_literal(), "-42");
        assert_eq!(SqlValue::from(true).to_literal(), "1");
        assert_eq!(SqlValue::from(false).to_literal(), "0");
        assert_eq!(SqlValue::from(vec![0x0a, 0xff]).to_literal(), "X'0AFF'");
        assert_eq!(SqlValue::from(None::<i64>).to_literal(), "NULL");
    }

    #[test]
    fn test_literal_and_bound_values_read_back_equal() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        let values = vec![
            SqlValue::Integer(7),
            SqlValue::Real(2.0),
            SqlValue::Text("it's".to_string()),
            SqlValue::Text("x\0y'z".to_string()),
            SqlValue::Blob(vec![1, 2, 3]),
            SqlValue::Null,
        ];
        for value in values {
            let literal: SqlValue = conn
                .query_row(&format!("SELECT {}", value.to_literal()), [], |row| row.get(0))
                .unwrap();
            let bound: SqlValue = conn.query_row("SELECT ?1", [&value], |row| row.get(0)).unwrap();
            assert_eq!(literal, bound);
            assert_eq!(literal, value);
        }
    }
}

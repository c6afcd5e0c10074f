//! Typed bind values. Each one reports its own PostgreSQL type so positional binds line up with column types.

use crate::config::ColumnKind;
use crate::error::AppError;
use serde_json::Value;
use sqlx::encode::{Encode, IsNull};
use sqlx::postgres::{PgTypeInfo, Postgres};
use sqlx::{Database, Type};

#[derive(Clone, Debug, PartialEq)]
pub enum BindValue {
    /// SQL NULL typed as the target column, so inserts into non-text columns type-check.
    Null(ColumnKind),
    Bool(bool),
    I64(i64),
    F64(f64),
    Text(String),
}

impl BindValue {
    /// Coerce a JSON body value into the column's kind. Integral floats are accepted for integer columns.
    pub fn for_column(name: &str, kind: ColumnKind, v: &Value) -> Result<Self, AppError> {
        let mismatch = |expected: &str| AppError::Validation(format!("{} must be {}", name, expected));
        Ok(match (kind, v) {
            (_, Value::Null) => BindValue::Null(kind),
            (ColumnKind::Integer, Value::Number(n)) => match n.as_i64() {
                Some(i) => BindValue::I64(i),
                None => match n.as_f64() {
                    Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => BindValue::I64(f as i64),
                    _ => return Err(mismatch("an integer")),
                },
            },
            (ColumnKind::Integer, _) => return Err(mismatch("an integer")),
            (ColumnKind::Float, Value::Number(n)) => match n.as_f64() {
                Some(f) if f.is_finite() => BindValue::F64(f),
                _ => return Err(mismatch("a finite number")),
            },
            (ColumnKind::Float, _) => return Err(mismatch("a number")),
            (ColumnKind::Bool, Value::Bool(b)) => BindValue::Bool(*b),
            (ColumnKind::Bool, _) => return Err(mismatch("a boolean")),
            (ColumnKind::Text | ColumnKind::Timestamp, Value::String(s)) => BindValue::Text(s.clone()),
            (ColumnKind::Text | ColumnKind::Timestamp, _) => return Err(mismatch("a string")),
        })
    }

    pub fn is_null(&self) -> bool {
        matches!(self, BindValue::Null(_))
    }

    /// JSON rendering, used by logs and by in-memory stores in tests.
    pub fn to_json(&self) -> Value {
        match self {
            BindValue::Null(_) => Value::Null,
            BindValue::Bool(b) => Value::Bool(*b),
            BindValue::I64(n) => Value::from(*n),
            BindValue::F64(f) => serde_json::Number::from_f64(*f).map(Value::Number).unwrap_or(Value::Null),
            BindValue::Text(s) => Value::String(s.clone()),
        }
    }

    fn pg_type(&self) -> PgTypeInfo {
        match self {
            BindValue::Null(kind) => kind_type_info(*kind),
            BindValue::Bool(_) => <bool as Type<Postgres>>::type_info(),
            BindValue::I64(_) => <i64 as Type<Postgres>>::type_info(),
            BindValue::F64(_) => <f64 as Type<Postgres>>::type_info(),
            BindValue::Text(_) => <String as Type<Postgres>>::type_info(),
        }
    }
}

fn kind_type_info(kind: ColumnKind) -> PgTypeInfo {
    match kind {
        ColumnKind::Integer => <i64 as Type<Postgres>>::type_info(),
        ColumnKind::Float => <f64 as Type<Postgres>>::type_info(),
        ColumnKind::Text => <String as Type<Postgres>>::type_info(),
        ColumnKind::Bool => <bool as Type<Postgres>>::type_info(),
        ColumnKind::Timestamp => <chrono::DateTime<chrono::Utc> as Type<Postgres>>::type_info(),
    }
}

impl From<i64> for BindValue {
    fn from(n: i64) -> Self {
        BindValue::I64(n)
    }
}

impl From<f64> for BindValue {
    fn from(f: f64) -> Self {
        BindValue::F64(f)
    }
}

impl From<bool> for BindValue {
    fn from(b: bool) -> Self {
        BindValue::Bool(b)
    }
}

impl From<&str> for BindValue {
    fn from(s: &str) -> Self {
        BindValue::Text(s.to_string())
    }
}

impl From<String> for BindValue {
    fn from(s: String) -> Self {
        BindValue::Text(s)
    }
}

impl<'q> Encode<'q, Postgres> for BindValue {
    fn encode_by_ref(
        &self,
        buf: &mut <Postgres as Database>::ArgumentBuffer<'q>,
    ) -> Result<IsNull, Box<dyn std::error::Error + Send + Sync>> {
        Ok(match self {
            BindValue::Null(_) => IsNull::Yes,
            BindValue::Bool(b) => <bool as Encode<Postgres>>::encode_by_ref(b, buf)?,
            BindValue::I64(n) => <i64 as Encode<Postgres>>::encode_by_ref(n, buf)?,
            BindValue::F64(n) => <f64 as Encode<Postgres>>::encode_by_ref(n, buf)?,
            BindValue::Text(s) => <&str as Encode<Postgres>>::encode_by_ref(&s.as_str(), buf)?,
        })
    }

    fn produces(&self) -> Option<PgTypeInfo> {
        Some(self.pg_type())
    }
}

impl Type<Postgres> for BindValue {
    fn type_info() -> PgTypeInfo {
        <String as Type<Postgres>>::type_info()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn coerces_by_column_kind() {
        assert_eq!(BindValue::for_column("radius_km", ColumnKind::Float, &json!(3)).unwrap(), BindValue::F64(3.0));
        assert_eq!(BindValue::for_column("system_id", ColumnKind::Integer, &json!(4.0)).unwrap(), BindValue::I64(4));
        assert_eq!(
            BindValue::for_column("texture_url", ColumnKind::Text, &Value::Null).unwrap(),
            BindValue::Null(ColumnKind::Text)
        );
    }

    #[test]
    fn rejects_wrong_shapes() {
        let err = BindValue::for_column("system_id", ColumnKind::Integer, &json!(1.5)).unwrap_err();
        assert_eq!(err.to_string(), "validation: system_id must be an integer");
        assert!(BindValue::for_column("name", ColumnKind::Text, &json!(7)).is_err());
        assert!(BindValue::for_column("mass_earth", ColumnKind::Float, &json!("heavy")).is_err());
    }
}

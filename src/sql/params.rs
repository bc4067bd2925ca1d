//! Convert serde_json::Value to values sqlx can bind on SQLite.

use serde_json::Value;
use sqlx::encode::{Encode, IsNull};
use sqlx::error::BoxDynError;
use sqlx::sqlite::{Sqlite, SqliteTypeInfo};
use sqlx::{Database, Type};

/// A value bindable to a SQLite statement. SQLite has no boolean or JSON storage class:
/// booleans become 0/1 and arrays/objects become their compact JSON text.
#[derive(Clone, Debug, PartialEq)]
pub enum SqliteBindValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl SqliteBindValue {
    pub fn from_json(v: &Value) -> Self {
        match v {
            Value::Null => SqliteBindValue::Null,
            Value::Bool(b) => SqliteBindValue::Integer(i64::from(*b)),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    SqliteBindValue::Integer(i)
                } else {
                    // u64 above i64::MAX and non-integers
                    SqliteBindValue::Real(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            Value::String(s) => SqliteBindValue::Text(s.clone()),
            Value::Array(_) | Value::Object(_) => SqliteBindValue::Text(v.to_string()),
        }
    }
}

impl From<&Value> for SqliteBindValue {
    fn from(v: &Value) -> Self {
        SqliteBindValue::from_json(v)
    }
}

impl<'q> Encode<'q, Sqlite> for SqliteBindValue {
    fn encode_by_ref(
        &self,
        buf: &mut <Sqlite as Database>::ArgumentBuffer<'q>,
    ) -> Result<IsNull, BoxDynError> {
        match self {
            SqliteBindValue::Null => <Option<i64> as Encode<Sqlite>>::encode_by_ref(&None, buf),
            SqliteBindValue::Integer(n) => <i64 as Encode<Sqlite>>::encode_by_ref(n, buf),
            SqliteBindValue::Real(n) => <f64 as Encode<Sqlite>>::encode_by_ref(n, buf),
            SqliteBindValue::Text(s) => <String as Encode<Sqlite>>::encode_by_ref(s, buf),
        }
    }
}

impl Type<Sqlite> for SqliteBindValue {
    fn type_info() -> SqliteTypeInfo {
        <String as Type<Sqlite>>::type_info()
    }

    // SQLite is dynamically typed; the declared type is only advisory.
    fn compatible(_ty: &SqliteTypeInfo) -> bool {
        true
    }
}

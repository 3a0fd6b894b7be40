//! ABOUTME: Bind-value model bridging serde payloads to SQLite parameters
//! ABOUTME: Flattens Serialize payloads and criteria into typed column binds

use serde::Serialize;
use serde_json::Value as Json;
use sqlx::{QueryBuilder, Sqlite};

use tb_core::{Error, Id, Result};

use crate::identifier::check_identifier;

/// A single SQLite bind value
///
/// Record payloads and criteria are flattened into pairs of column name and
/// `SqlValue` before statement construction. Scalar JSON values map
/// directly; arrays and objects are persisted as their compact JSON text.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Bool(bool),
}

impl SqlValue {
    /// Push this value onto a statement as a bound parameter
    pub(crate) fn push_bind(self, builder: &mut QueryBuilder<'static, Sqlite>) {
        match self {
            SqlValue::Null => builder.push_bind(None::<String>),
            SqlValue::Integer(i) => builder.push_bind(i),
            SqlValue::Real(r) => builder.push_bind(r),
            SqlValue::Text(t) => builder.push_bind(t),
            SqlValue::Bool(b) => builder.push_bind(b),
        };
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_owned())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Integer(value)
    }
}

impl From<i32> for SqlValue {
    fn from(value: i32) -> Self {
        SqlValue::Integer(i64::from(value))
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        SqlValue::Real(value)
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        SqlValue::Bool(value)
    }
}

impl From<Id> for SqlValue {
    fn from(value: Id) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<&Id> for SqlValue {
    fn from(value: &Id) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl<V: Into<SqlValue>> From<Option<V>> for SqlValue {
    fn from(value: Option<V>) -> Self {
        match value {
            Some(inner) => inner.into(),
            None => SqlValue::Null,
        }
    }
}

impl TryFrom<Json> for SqlValue {
    type Error = Error;

    fn try_from(value: Json) -> Result<Self> {
        Ok(match value {
            Json::Null => SqlValue::Null,
            Json::Bool(b) => SqlValue::Bool(b),
            Json::Number(n) => {
                if let Some(i) = n.as_i64() {
                    SqlValue::Integer(i)
                } else if n.as_u64().is_some() {
                    return Err(Error::Validation(format!(
                        "numeric value {} does not fit a 64-bit SQLite integer",
                        n
                    )));
                } else if let Some(f) = n.as_f64() {
                    SqlValue::Real(f)
                } else {
                    return Err(Error::Validation(format!(
                        "unsupported numeric value: {}",
                        n
                    )));
                }
            }
            Json::String(s) => SqlValue::Text(s),
            structured @ (Json::Array(_) | Json::Object(_)) => {
                SqlValue::Text(structured.to_string())
            }
        })
    }
}

/// Flatten a Serialize payload into column/value pairs
///
/// The payload must serialize to a JSON object; each present field becomes
/// one column. Column names are validated as SQL identifiers.
pub(crate) fn to_columns<V>(kind: &str, value: &V) -> Result<Vec<(String, SqlValue)>>
where
    V: Serialize + ?Sized,
{
    let json = serde_json::to_value(value)
        .map_err(|e| Error::Validation(format!("{} is not serializable: {}", kind, e)))?;

    let Json::Object(fields) = json else {
        return Err(Error::Validation(format!(
            "{} must serialize to an object with named fields",
            kind
        )));
    };

    let mut columns = Vec::with_capacity(fields.len());
    for (name, field) in fields {
        check_identifier("column", &name)?;
        columns.push((name, SqlValue::try_from(field)?));
    }
    Ok(columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalar_json_values_convert_directly() {
        assert_eq!(SqlValue::try_from(json!(null)).unwrap(), SqlValue::Null);
        assert_eq!(SqlValue::try_from(json!(true)).unwrap(), SqlValue::Bool(true));
        assert_eq!(SqlValue::try_from(json!(42)).unwrap(), SqlValue::Integer(42));
        assert_eq!(SqlValue::try_from(json!(-1)).unwrap(), SqlValue::Integer(-1));
        assert_eq!(SqlValue::try_from(json!(1.5)).unwrap(), SqlValue::Real(1.5));
        assert_eq!(
            SqlValue::try_from(json!("ann")).unwrap(),
            SqlValue::Text("ann".to_string())
        );
    }

    #[test]
    fn test_structured_json_binds_as_text() {
        assert_eq!(
            SqlValue::try_from(json!([1, 2])).unwrap(),
            SqlValue::Text("[1,2]".to_string())
        );
        assert_eq!(
            SqlValue::try_from(json!({"a": 1})).unwrap(),
            SqlValue::Text("{\"a\":1}".to_string())
        );
    }

    #[test]
    fn test_u64_overflow_is_rejected() {
        let big = json!(u64::MAX);
        let err = SqlValue::try_from(big).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_to_columns_requires_an_object() {
        let err = to_columns("criteria", &json!([1, 2])).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        let err = to_columns("insert payload", &json!("scalar")).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_to_columns_flattens_every_present_field() {
        #[derive(Serialize)]
        struct Row {
            id: String,
            age: i64,
            email: Option<String>,
        }

        let mut columns = to_columns(
            "insert payload",
            &Row {
                id: "u1".to_string(),
                age: 30,
                email: None,
            },
        )
        .unwrap();
        columns.sort_by(|a, b| a.0.cmp(&b.0));

        assert_eq!(
            columns,
            vec![
                ("age".to_string(), SqlValue::Integer(30)),
                ("email".to_string(), SqlValue::Null),
                ("id".to_string(), SqlValue::Text("u1".to_string())),
            ]
        );
    }

    #[test]
    fn test_to_columns_rejects_unsafe_field_names() {
        let err = to_columns("criteria", &json!({"name; drop": 1})).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_from_impls() {
        assert_eq!(SqlValue::from("x"), SqlValue::Text("x".to_string()));
        assert_eq!(SqlValue::from(7i64), SqlValue::Integer(7));
        assert_eq!(SqlValue::from(7i32), SqlValue::Integer(7));
        assert_eq!(SqlValue::from(false), SqlValue::Bool(false));
        assert_eq!(SqlValue::from(None::<i64>), SqlValue::Null);
        assert_eq!(SqlValue::from(Some(3i64)), SqlValue::Integer(3));

        let id = Id::new();
        assert_eq!(SqlValue::from(&id), SqlValue::Text(id.to_string()));
    }
}

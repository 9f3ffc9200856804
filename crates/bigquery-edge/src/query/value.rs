use std::fmt;

use serde::ser::{SerializeMap, Serializer};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// A decoded result cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Float(f64),
    Bool(bool),
    Timestamp(OffsetDateTime),
    /// `JSON` columns, plus the raw structure of `REPEATED`/`RECORD` cells.
    Json(serde_json::Value),
    String(String),
}

impl Value {
    #[inline]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(int) => Some(*int),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(float) => Some(*float),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<OffsetDateTime> {
        match self {
            Self::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Json(json) => Some(json),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

impl serde::Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Null => serializer.serialize_none(),
            Self::Integer(int) => serializer.serialize_i64(*int),
            Self::Float(float) => serializer.serialize_f64(*float),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Timestamp(ts) => {
                let formatted = ts.format(&Rfc3339).map_err(serde::ser::Error::custom)?;
                serializer.serialize_str(&formatted)
            }
            Self::Json(json) => serde::Serialize::serialize(json, serializer),
            Self::String(s) => serializer.serialize_str(s),
        }
    }
}

/// One decoded result row: column name to [`Value`], in schema order.
#[derive(Clone, PartialEq, Default)]
pub struct Row {
    fields: Vec<(Box<str>, Value)>,
}

impl Row {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            fields: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn push(&mut self, name: Box<str>, value: Value) {
        self.fields.push((name, value));
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find_map(|(field, value)| (&**field == name).then_some(value))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.fields.iter().map(|(name, _)| &**name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> + '_ {
        self.fields.iter().map(|(name, value)| (&**name, value))
    }

    pub fn into_inner(self) -> Vec<(Box<str>, Value)> {
        self.fields
    }

    /// Deserializes the row, viewed as a JSON object, into `T`.
    pub fn deserialize_into<T>(&self) -> Result<T, serde_json::Error>
    where
        T: serde::de::DeserializeOwned,
    {
        serde_json::to_value(self).and_then(serde_json::from_value)
    }
}

impl fmt::Debug for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl serde::Serialize for Row {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;

        for (name, value) in self.fields.iter() {
            map.serialize_entry(&**name, value)?;
        }

        map.end()
    }
}

impl IntoIterator for Row {
    type Item = (Box<str>, Value);
    type IntoIter = std::vec::IntoIter<(Box<str>, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    fn sample_row() -> Row {
        let mut row = Row::with_capacity(4);
        row.push("name".into(), Value::String("ada".into()));
        row.push("age".into(), Value::Integer(36));
        row.push("born".into(), Value::Timestamp(datetime!(1815-12-10 0:00 UTC)));
        row.push("extra".into(), Value::Null);
        row
    }

    #[test]
    fn test_row_serializes_in_schema_order() {
        let json = serde_json::to_string(&sample_row()).unwrap();
        assert_eq!(
            json,
            r#"{"name":"ada","age":36,"born":"1815-12-10T00:00:00Z","extra":null}"#
        );
    }

    #[test]
    fn test_row_accessors() {
        let row = sample_row();

        assert_eq!(row.len(), 4);
        assert_eq!(row.get("age").and_then(Value::as_i64), Some(36));
        assert_eq!(row.get("name").and_then(Value::as_str), Some("ada"));
        assert!(row.get("extra").unwrap().is_null());
        assert!(row.get("missing").is_none());
        assert_eq!(
            row.names().collect::<Vec<_>>(),
            ["name", "age", "born", "extra"]
        );
    }

    #[test]
    fn test_deserialize_into() {
        #[derive(Debug, PartialEq, serde::Deserialize)]
        struct Person {
            name: String,
            age: u32,
            extra: Option<String>,
        }

        let person: Person = sample_row().deserialize_into().unwrap();
        assert_eq!(
            person,
            Person {
                name: "ada".into(),
                age: 36,
                extra: None,
            }
        );
    }
}

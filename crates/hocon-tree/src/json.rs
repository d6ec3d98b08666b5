//! Conversion between value trees and `serde_json` values.

use crate::{ConfigError, Origin, Result, Value, ValueKind};

impl Value {
    /// Build a tree from JSON data. Object keys are taken literally.
    pub fn from_json(json: &serde_json::Value, origin: &Origin) -> Value {
        match json {
            serde_json::Value::Null => Value::null(origin.clone()),
            serde_json::Value::Bool(b) => Value::boolean(origin.clone(), *b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::int(origin.clone(), i, None),
                None => Value::double(origin.clone(), n.as_f64().unwrap_or(f64::NAN), None),
            },
            serde_json::Value::String(s) => Value::string(origin.clone(), s.clone()),
            serde_json::Value::Array(items) => Value::list(
                origin.clone(),
                items.iter().map(|v| Value::from_json(v, origin)).collect(),
            ),
            serde_json::Value::Object(map) => Value::object(
                origin.clone(),
                map.iter()
                    .map(|(k, v)| (k.clone(), Value::from_json(v, origin)))
                    .collect(),
            ),
        }
    }

    /// Convert a resolved tree to JSON data.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        Ok(match self.kind() {
            ValueKind::Null => serde_json::Value::Null,
            ValueKind::Boolean(b) => serde_json::Value::Bool(*b),
            ValueKind::Number { value, .. } => match value.as_whole() {
                Some(i) if !matches!(value, crate::Number::Double(_)) => i.into(),
                _ => serde_json::Number::from_f64(value.as_f64())
                    .map(serde_json::Value::Number)
                    .unwrap_or(serde_json::Value::Null),
            },
            ValueKind::String { text, .. } => serde_json::Value::String(text.clone()),
            ValueKind::Object(object) => {
                let mut map = serde_json::Map::new();
                for (key, value) in object.iter() {
                    map.insert(key.to_string(), value.to_json()?);
                }
                serde_json::Value::Object(map)
            }
            ValueKind::List(list) => serde_json::Value::Array(
                list.items()
                    .iter()
                    .map(Value::to_json)
                    .collect::<Result<Vec<_>>>()?,
            ),
            _ => {
                return Err(ConfigError::NotResolved {
                    message: format!(
                        "{}: value has not been resolved, resolve it before converting to JSON",
                        self.origin()
                    ),
                });
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use facet_testhelpers::test;

    #[test]
    fn test_from_json_keeps_dotted_keys() {
        let json = serde_json::json!({"a.b": 1, "list": [1.5, "x", null, true]});
        let value = Value::from_json(&json, &Origin::new("json"));
        let object = value.as_object().unwrap();
        assert!(object.contains_key("a.b"));
        assert_eq!(object.get("list").unwrap().as_list().unwrap().len(), 4);
        assert_eq!(value.to_json().unwrap(), json);
    }

    #[test]
    fn test_unresolved_cannot_convert() {
        let reference = Value::reference(
            Origin::new("x"),
            crate::SubstitutionExpression::new(crate::Path::key("a"), false),
        );
        assert!(matches!(
            reference.to_json(),
            Err(ConfigError::NotResolved { .. })
        ));
    }
}

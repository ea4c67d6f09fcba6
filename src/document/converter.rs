//! Field-by-field reading of untrusted documents.

use super::error::{DocumentError, DocumentResult};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Reads the fields of a keyed object and remembers which ones were consumed,
/// so that leftovers can be rejected once every known field has been checked.
#[derive(Debug, Clone)]
pub struct ObjectConverter {
    fields: Map<String, Value>,
    consumed: BTreeSet<String>,
}

impl ObjectConverter {
    pub fn init(value: &Value) -> DocumentResult<Self> {
        match value {
            Value::Object(fields) => Ok(Self {
                fields: fields.clone(),
                consumed: BTreeSet::new(),
            }),
            other => Err(DocumentError::new(format!(
                "Expected an object; got {}",
                other
            ))),
        }
    }

    pub fn has(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn get(&mut self, key: &str) -> DocumentResult<Value> {
        match self.fields.get(key) {
            Some(value) => {
                self.consumed.insert(key.to_string());
                Ok(value.clone())
            }
            None => Err(DocumentError::new(format!(
                "Expected a field named `{}`.",
                key
            ))),
        }
    }

    pub fn check_no_extra_keys(&self) -> DocumentResult<()> {
        let extra = self
            .fields
            .keys()
            .filter(|key| !self.consumed.contains(key.as_str()))
            .map(|key| format!("`{}`", key))
            .collect::<Vec<_>>();
        if extra.is_empty() {
            Ok(())
        } else {
            Err(DocumentError::new(format!(
                "Unexpected key(s) {}.",
                extra.join(", ")
            )))
        }
    }
}

pub fn string_from_value(value: &Value) -> DocumentResult<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        other => Err(DocumentError::new(format!(
            "Expected a string; got {}",
            other
        ))),
    }
}

pub fn uuid_from_value(value: &Value) -> DocumentResult<Uuid> {
    value
        .as_str()
        .and_then(|s| Uuid::parse_str(s).ok())
        .ok_or_else(|| DocumentError::new(format!("Expected a UUID; got {}", value)))
}

/// Reads a user-visible name such as a table name.
///
/// `what` is used in the error message, e.g. "Table name".
pub fn name_from_value(value: &Value, what: &str) -> DocumentResult<String> {
    let name = string_from_value(value)?;
    if !is_valid_name(&name) {
        return Err(DocumentError::new(format!(
            "{} `{}` invalid (Use A-Z, a-z, 0-9, _ and - only).",
            what, name
        )));
    }
    Ok(name)
}

pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

pub fn vector_from_value<T>(
    value: &Value,
    mut convert: impl FnMut(&Value) -> DocumentResult<T>,
) -> DocumentResult<Vec<T>> {
    let items = value.as_array().ok_or_else(|| {
        DocumentError::new(format!("Expected an array; got {}", value))
    })?;
    items.iter().map(|item| convert(item)).collect()
}

/// Human-readable form of a document value for messages; strings are shown bare.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn converter_rejects_non_objects() {
        let err = ObjectConverter::init(&json!([1, 2])).unwrap_err();
        assert_eq!(err.message(), "Expected an object; got [1,2]");
    }

    #[test]
    fn converter_reports_missing_and_extra_keys() {
        let mut converter = ObjectConverter::init(&json!({"a": 1, "b": 2, "c": 3})).unwrap();
        assert!(converter.has("a"));
        assert_eq!(converter.get("a").unwrap(), json!(1));
        assert_eq!(
            converter.get("missing").unwrap_err().message(),
            "Expected a field named `missing`."
        );
        assert_eq!(
            converter.check_no_extra_keys().unwrap_err().message(),
            "Unexpected key(s) `b`, `c`."
        );
        converter.get("b").unwrap();
        converter.get("c").unwrap();
        assert!(converter.check_no_extra_keys().is_ok());
    }

    #[test]
    fn names_are_restricted_to_safe_characters() {
        assert!(is_valid_name("users"));
        assert!(is_valid_name("user_events-2"));
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("user events"));
        assert!(!is_valid_name("users.old"));

        let err = name_from_value(&json!("bad name"), "Table name").unwrap_err();
        assert_eq!(
            err.message(),
            "Table name `bad name` invalid (Use A-Z, a-z, 0-9, _ and - only)."
        );
        assert!(name_from_value(&json!(7), "Table name").is_err());
    }

    #[test]
    fn uuid_values_must_be_well_formed_strings() {
        let id = Uuid::new_v4();
        assert_eq!(uuid_from_value(&json!(id.to_string())).unwrap(), id);
        assert_eq!(
            uuid_from_value(&json!("nope")).unwrap_err().message(),
            "Expected a UUID; got \"nope\""
        );
        assert!(uuid_from_value(&json!(null)).is_err());
    }

    #[test]
    fn vectors_convert_each_element() {
        let doubled = vector_from_value(&json!([1, 2, 3]), |v| {
            v.as_i64()
                .map(|n| n * 2)
                .ok_or_else(|| DocumentError::new("not a number"))
        })
        .unwrap();
        assert_eq!(doubled, vec![2, 4, 6]);
        assert_eq!(
            vector_from_value(&json!("x"), |_| Ok(())).unwrap_err().message(),
            "Expected an array; got \"x\""
        );
    }
}

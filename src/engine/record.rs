use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::core::{Result, StoreError, Value};

/// A detached row instance of a mapped entity type.
///
/// Records are constructed per call and never cached by the store; once
/// read out of a session they are plain data with no tie to the session
/// that produced them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    entity: String,
    attributes: HashMap<String, Value>,
}

impl Record {
    pub fn new(entity: &str) -> Self {
        Self {
            entity: entity.to_string(),
            attributes: HashMap::new(),
        }
    }

    /// Name of the entity type this record is an instance of.
    pub fn type_name(&self) -> &str {
        &self.entity
    }

    /// Set an attribute value (builder style).
    pub fn set(mut self, attribute: &str, value: impl Into<Value>) -> Self {
        self.attributes.insert(attribute.to_string(), value.into());
        self
    }

    pub fn get(&self, attribute: &str) -> Option<&Value> {
        self.attributes.get(attribute)
    }

    pub fn attributes(&self) -> &HashMap<String, Value> {
        &self.attributes
    }

    /// Build a record from a flat JSON object.
    pub fn from_json(entity: &str, json: &str) -> Result<Self> {
        let parsed: serde_json::Value = serde_json::from_str(json)
            .map_err(|e| StoreError::ExecutionError(format!("Invalid JSON record: {}", e)))?;

        let serde_json::Value::Object(fields) = parsed else {
            return Err(StoreError::TypeMismatch(
                "JSON record must be an object".into(),
            ));
        };

        let mut record = Record::new(entity);
        for (name, value) in fields {
            record.attributes.insert(name, json_to_value(value)?);
        }
        Ok(record)
    }
}

fn json_to_value(value: serde_json::Value) -> Result<Value> {
    match value {
        serde_json::Value::Null => Ok(Value::Null),
        serde_json::Value::Bool(b) => Ok(Value::Boolean(b)),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::Integer(i))
            } else if let Some(f) = n.as_f64() {
                Ok(Value::Float(f))
            } else {
                Err(StoreError::TypeMismatch(format!(
                    "Unrepresentable JSON number: {}",
                    n
                )))
            }
        }
        serde_json::Value::String(s) => Ok(Value::Text(s)),
        other => Err(StoreError::TypeMismatch(format!(
            "Nested JSON values are not mappable to attributes: {}",
            other
        ))),
    }
}

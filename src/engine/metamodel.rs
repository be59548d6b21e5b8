use std::collections::HashMap;

use crate::core::{DataType, Result, StoreError, Value};
use crate::engine::Record;

/// One mapped attribute of an entity type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeDef {
    pub name: String,
    pub data_type: DataType,
    /// Marks the attribute that determines the storage row.
    pub identifier: bool,
    /// Whether the engine assigns the value itself on insert.
    pub generated: bool,
}

/// Mapping definition of one entity type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityDef {
    name: String,
    attributes: Vec<AttributeDef>,
}

impl EntityDef {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            attributes: Vec::new(),
        }
    }

    pub fn attribute(self, name: &str, data_type: DataType) -> Self {
        self.push(name, data_type, false, false)
    }

    pub fn id_attribute(self, name: &str, data_type: DataType) -> Self {
        self.push(name, data_type, true, false)
    }

    /// An identifier whose value the engine generates on insert. Stores
    /// reject entity types mapped this way at startup.
    pub fn generated_id_attribute(self, name: &str, data_type: DataType) -> Self {
        self.push(name, data_type, true, true)
    }

    fn push(mut self, name: &str, data_type: DataType, identifier: bool, generated: bool) -> Self {
        self.attributes.push(AttributeDef {
            name: name.to_string(),
            data_type,
            identifier,
            generated,
        });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attributes(&self) -> &[AttributeDef] {
        &self.attributes
    }

    pub fn identifier_attributes(&self) -> impl Iterator<Item = &AttributeDef> {
        self.attributes.iter().filter(|a| a.identifier)
    }

    /// The single identifier attribute, if the mapping has exactly one.
    pub fn single_identifier(&self) -> Option<&AttributeDef> {
        let mut ids = self.identifier_attributes();
        match (ids.next(), ids.next()) {
            (Some(id), None) => Some(id),
            _ => None,
        }
    }
}

/// Metadata for every entity type a persistence unit maps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metamodel {
    entities: HashMap<String, EntityDef>,
}

impl Metamodel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entity_def(mut self, def: EntityDef) -> Self {
        self.entities.insert(def.name().to_string(), def);
        self
    }

    pub fn entity(&self, name: &str) -> Option<&EntityDef> {
        self.entities.get(name)
    }

    /// Extract the identifier value from a record instance.
    pub fn identifier_of(&self, record: &Record) -> Result<Value> {
        let def = self
            .entity(record.type_name())
            .ok_or_else(|| StoreError::UnknownEntityType(record.type_name().to_string()))?;

        let id = def
            .single_identifier()
            .ok_or_else(|| StoreError::MissingIdentifier(def.name().to_string()))?;

        match record.get(&id.name) {
            Some(value) if !value.is_null() => Ok(value.clone()),
            _ => Err(StoreError::ExecutionError(format!(
                "Record of type '{}' has no value for identifier attribute '{}'",
                def.name(),
                id.name
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_metamodel() -> Metamodel {
        Metamodel::new().entity_def(
            EntityDef::new("User")
                .id_attribute("username", DataType::Text)
                .attribute("age", DataType::Integer),
        )
    }

    #[test]
    fn test_identifier_of() {
        let metamodel = user_metamodel();
        let record = Record::new("User").set("username", "jdoe").set("age", 25i64);

        assert_eq!(
            metamodel.identifier_of(&record).unwrap(),
            Value::from("jdoe")
        );
    }

    #[test]
    fn test_identifier_of_unknown_type() {
        let metamodel = user_metamodel();
        let record = Record::new("Vehicle").set("vin", "V1");

        assert!(matches!(
            metamodel.identifier_of(&record),
            Err(StoreError::UnknownEntityType(_))
        ));
    }

    #[test]
    fn test_identifier_of_missing_value() {
        let metamodel = user_metamodel();
        let record = Record::new("User").set("age", 25i64);

        assert!(metamodel.identifier_of(&record).is_err());
    }

    #[test]
    fn test_single_identifier() {
        let none = EntityDef::new("Bare").attribute("x", DataType::Integer);
        assert!(none.single_identifier().is_none());

        let two = EntityDef::new("Composite")
            .id_attribute("a", DataType::Integer)
            .id_attribute("b", DataType::Integer);
        assert!(two.single_identifier().is_none());
    }
}

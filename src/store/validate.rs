use crate::core::{DataType, Result, StoreError};
use crate::engine::SessionFactory;

/// Identifier mapping of the configured entity type, resolved once at
/// store start and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityTypeDescriptor {
    pub entity_name: String,
    pub id_attribute: String,
    pub id_type: DataType,
}

/// Inspect the factory's metamodel and reject invalid entity mappings.
///
/// The store requires a caller-supplied identifier so that cache keys map
/// deterministically to row identifiers without a round trip, hence the
/// rejection of engine-generated identifiers.
pub fn validate_entity(factory: &SessionFactory, entity_name: &str) -> Result<EntityTypeDescriptor> {
    let def = factory
        .metamodel()
        .entity(entity_name)
        .ok_or_else(|| StoreError::UnknownEntityType(entity_name.to_string()))?;

    let id = def
        .single_identifier()
        .ok_or_else(|| StoreError::MissingIdentifier(entity_name.to_string()))?;

    if id.generated {
        return Err(StoreError::GeneratedIdentifierNotAllowed(
            entity_name.to_string(),
            id.name.clone(),
        ));
    }

    Ok(EntityTypeDescriptor {
        entity_name: def.name().to_string(),
        id_attribute: id.name.clone(),
        id_type: id.data_type,
    })
}

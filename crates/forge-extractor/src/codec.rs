//! JSON conversions for domain candidates
//!
//! Explicit, symmetrical conversions used for human-review payloads, edited
//! result round-trips, and CLI JSON output. Deserialization is permissive
//! the same way extraction parsing is: unknown kinds keep their surface
//! form, missing ids are minted fresh.

use forge_domain::{
    AttributeValue, Entity, EntityId, EntityKind, Provenance, RelationKind, Relationship,
    RelationshipId,
};
use serde_json::{json, Map, Value};

/// Render an entity as a JSON object
pub fn entity_to_json(entity: &Entity) -> Value {
    let attributes: Map<String, Value> = entity
        .attributes
        .iter()
        .map(|(k, v)| (k.clone(), attribute_to_json(v)))
        .collect();

    json!({
        "id": entity.id.to_string(),
        "name": entity.name,
        "type": entity.kind.as_str(),
        "description": entity.description,
        "aliases": entity.aliases.iter().collect::<Vec<_>>(),
        "attributes": attributes,
        "provenance": {
            "chunk_index": entity.provenance.chunk_index,
            "span": [entity.provenance.span.0, entity.provenance.span.1],
        },
    })
}

/// Rebuild an entity from a JSON object
///
/// A missing or unparseable id yields a fresh one; a missing provenance
/// yields chunk 0 with an empty span.
pub fn entity_from_json(value: &Value) -> Result<Entity, String> {
    let obj = value
        .as_object()
        .ok_or_else(|| "entity is not a JSON object".to_string())?;

    let name = obj
        .get("name")
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| "missing or blank 'name'".to_string())?;

    let id = obj
        .get("id")
        .and_then(|v| v.as_str())
        .and_then(|s| EntityId::from_string(s).ok())
        .unwrap_or_default();

    let kind = obj
        .get("type")
        .and_then(|v| v.as_str())
        .map(EntityKind::parse)
        .unwrap_or(EntityKind::Abstract);

    let provenance = obj
        .get("provenance")
        .and_then(|v| v.as_object())
        .map(|p| {
            let chunk_index = p.get("chunk_index").and_then(|v| v.as_u64()).unwrap_or(0) as usize;
            let span = p
                .get("span")
                .and_then(|v| v.as_array())
                .and_then(|arr| {
                    let start = arr.first()?.as_u64()? as usize;
                    let end = arr.get(1)?.as_u64()? as usize;
                    Some((start, end))
                })
                .unwrap_or((0, 0));
            Provenance::new(chunk_index, span)
        })
        .unwrap_or_else(|| Provenance::new(0, (0, 0)));

    let mut entity = Entity::new(id, name, kind, provenance);

    if let Some(description) = obj.get("description").and_then(|v| v.as_str()) {
        entity.description = description.trim().to_string();
    }

    if let Some(aliases) = obj.get("aliases").and_then(|v| v.as_array()) {
        for alias in aliases.iter().filter_map(|v| v.as_str()) {
            let alias = alias.trim();
            if !alias.is_empty() && alias != entity.name {
                entity.aliases.insert(alias.to_string());
            }
        }
    }

    if let Some(attributes) = obj.get("attributes").and_then(|v| v.as_object()) {
        for (key, value) in attributes {
            entity
                .attributes
                .insert(key.clone(), attribute_from_json(value));
        }
    }

    Ok(entity)
}

/// Render a relationship as a JSON object
pub fn relationship_to_json(relationship: &Relationship) -> Value {
    json!({
        "id": relationship.id.to_string(),
        "source_id": relationship.source_id.to_string(),
        "target_id": relationship.target_id.to_string(),
        "type": relationship.kind.as_str(),
        "strength": relationship.strength,
        "description": relationship.description,
    })
}

/// Rebuild a relationship from a JSON object
pub fn relationship_from_json(value: &Value) -> Result<Relationship, String> {
    let obj = value
        .as_object()
        .ok_or_else(|| "relationship is not a JSON object".to_string())?;

    let source_id = obj
        .get("source_id")
        .and_then(|v| v.as_str())
        .ok_or_else(|| "missing 'source_id'".to_string())
        .and_then(EntityId::from_string)?;

    let target_id = obj
        .get("target_id")
        .and_then(|v| v.as_str())
        .ok_or_else(|| "missing 'target_id'".to_string())
        .and_then(EntityId::from_string)?;

    let id = obj
        .get("id")
        .and_then(|v| v.as_str())
        .and_then(|s| RelationshipId::from_string(s).ok())
        .unwrap_or_default();

    let kind = obj
        .get("type")
        .and_then(|v| v.as_str())
        .map(RelationKind::parse)
        .unwrap_or(RelationKind::Custom("custom".to_string()));

    let strength = obj.get("strength").and_then(|v| v.as_f64()).unwrap_or(0.0);

    let mut relationship = Relationship::new(id, source_id, target_id, kind, strength);
    if let Some(description) = obj.get("description").and_then(|v| v.as_str()) {
        relationship.description = description.trim().to_string();
    }

    Ok(relationship)
}

fn attribute_to_json(value: &AttributeValue) -> Value {
    match value {
        AttributeValue::Text(s) => json!(s),
        AttributeValue::Integer(i) => json!(i),
        AttributeValue::Float(x) => json!(x),
        AttributeValue::Boolean(b) => json!(b),
    }
}

fn attribute_from_json(value: &Value) -> AttributeValue {
    match value {
        Value::String(s) => AttributeValue::Text(s.clone()),
        Value::Bool(b) => AttributeValue::Boolean(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                AttributeValue::Integer(i)
            } else {
                AttributeValue::Float(n.as_f64().unwrap_or(0.0))
            }
        }
        other => AttributeValue::Text(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_entity() -> Entity {
        let mut entity = Entity::new(
            EntityId::new(),
            "Elena Rossi",
            EntityKind::Actor,
            Provenance::new(2, (100, 400)),
        )
        .with_description("A Venetian spymaster.")
        .with_alias("E. Rossi");
        entity
            .attributes
            .insert("rank".to_string(), AttributeValue::Text("master".to_string()));
        entity
    }

    #[test]
    fn test_entity_round_trip() {
        let entity = sample_entity();
        let rebuilt = entity_from_json(&entity_to_json(&entity)).unwrap();
        assert_eq!(entity, rebuilt);
    }

    #[test]
    fn test_entity_without_id_gets_fresh_one() {
        let value = json!({"name": "Venice", "type": "location"});
        let a = entity_from_json(&value).unwrap();
        let b = entity_from_json(&value).unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(a.kind, EntityKind::Location);
    }

    #[test]
    fn test_entity_unknown_kind_preserved() {
        let value = json!({"name": "The Deep", "type": "eldritch"});
        let entity = entity_from_json(&value).unwrap();
        assert_eq!(entity.kind, EntityKind::Unknown("eldritch".to_string()));
    }

    #[test]
    fn test_entity_blank_name_rejected() {
        assert!(entity_from_json(&json!({"name": "  "})).is_err());
        assert!(entity_from_json(&json!({"type": "actor"})).is_err());
    }

    #[test]
    fn test_relationship_round_trip() {
        let relationship = Relationship::new(
            RelationshipId::new(),
            EntityId::new(),
            EntityId::new(),
            RelationKind::Rival,
            -0.7,
        )
        .with_description("Old grudge.");

        let rebuilt = relationship_from_json(&relationship_to_json(&relationship)).unwrap();
        assert_eq!(relationship, rebuilt);
    }

    #[test]
    fn test_relationship_requires_endpoints() {
        let value = json!({"type": "ally", "strength": 0.5});
        assert!(relationship_from_json(&value).is_err());
    }
}

//! Forge Storage Layer
//!
//! Implements the `EntityStore` trait over SQLite.
//!
//! # Architecture
//!
//! - One `entities` table and one `relationships` table, batch-created from
//!   `schema.sql` at open
//! - Ids stored as 16-byte big-endian blobs
//! - Aliases and attributes stored as JSON text columns
//! - Kinds stored as their surface form and reparsed on load, so Unknown
//!   and Custom kinds round-trip without loss
//!
//! # Thread Safety
//!
//! SQLite connections are not thread-safe. Each thread should have its own
//! `SqliteStore` instance.
//!
//! # Examples
//!
//! ```no_run
//! use forge_store::SqliteStore;
//!
//! let store = SqliteStore::open(":memory:").unwrap();
//! // Store is now ready for entity operations
//! ```

#![warn(missing_docs)]

use forge_domain::traits::EntityStore;
use forge_domain::{
    AttributeValue, Entity, EntityId, EntityKind, Provenance, RelationKind, Relationship,
    RelationshipId,
};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Stored bytes could not be interpreted
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// SQLite-based implementation of `EntityStore`
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) a store at the given database path
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use forge_store::SqliteStore;
    ///
    /// let store = SqliteStore::open("forge.db").unwrap();
    /// ```
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.conn.execute_batch(include_str!("schema.sql"))?;
        Ok(store)
    }

    /// Load every stored relationship
    pub fn load_all_relationships(&self) -> Result<Vec<Relationship>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, source_id, target_id, kind, strength, description
             FROM relationships ORDER BY id",
        )?;

        let relationships = stmt
            .query_map([], |row| {
                let id_bytes: Vec<u8> = row.get(0)?;
                let source_bytes: Vec<u8> = row.get(1)?;
                let target_bytes: Vec<u8> = row.get(2)?;
                let kind: String = row.get(3)?;

                Ok(Relationship {
                    id: RelationshipId::from_value(wrap_id(&id_bytes, 0)?),
                    source_id: EntityId::from_value(wrap_id(&source_bytes, 1)?),
                    target_id: EntityId::from_value(wrap_id(&target_bytes, 2)?),
                    kind: RelationKind::parse(&kind),
                    strength: row.get(4)?,
                    description: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(relationships)
    }

    fn id_to_bytes(value: u128) -> Vec<u8> {
        value.to_be_bytes().to_vec()
    }

    fn row_to_entity(row: &rusqlite::Row<'_>) -> rusqlite::Result<Entity> {
        let id_bytes: Vec<u8> = row.get(0)?;
        let name: String = row.get(1)?;
        let kind: String = row.get(2)?;
        let description: String = row.get(3)?;
        let aliases_json: String = row.get(4)?;
        let attributes_json: String = row.get(5)?;
        let chunk_index: i64 = row.get(6)?;
        let span_start: i64 = row.get(7)?;
        let span_end: i64 = row.get(8)?;

        let mut entity = Entity::new(
            EntityId::from_value(wrap_id(&id_bytes, 0)?),
            name,
            EntityKind::parse(&kind),
            Provenance::new(
                chunk_index as usize,
                (span_start as usize, span_end as usize),
            ),
        );
        entity.description = description;

        let aliases: Vec<String> = serde_json::from_str(&aliases_json).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                4,
                rusqlite::types::Type::Text,
                Box::new(StoreError::InvalidData(format!("aliases column: {}", e))),
            )
        })?;
        for alias in aliases {
            entity.aliases.insert(alias);
        }

        let attributes: serde_json::Map<String, Value> = serde_json::from_str(&attributes_json)
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    5,
                    rusqlite::types::Type::Text,
                    Box::new(StoreError::InvalidData(format!("attributes column: {}", e))),
                )
            })?;
        for (key, value) in attributes {
            entity.attributes.insert(key, attribute_from_json(&value));
        }

        Ok(entity)
    }
}

/// Decode a 16-byte id blob, wrapping failures for rusqlite row mapping
fn wrap_id(bytes: &[u8], column: usize) -> rusqlite::Result<u128> {
    let arr: [u8; 16] = bytes.try_into().map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            column,
            rusqlite::types::Type::Blob,
            Box::new(StoreError::InvalidData(format!(
                "expected 16 id bytes, got {}",
                bytes.len()
            ))),
        )
    })?;
    Ok(u128::from_be_bytes(arr))
}

fn attribute_to_json(value: &AttributeValue) -> Value {
    match value {
        AttributeValue::Text(s) => Value::String(s.clone()),
        AttributeValue::Integer(i) => Value::from(*i),
        AttributeValue::Float(x) => Value::from(*x),
        AttributeValue::Boolean(b) => Value::Bool(*b),
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

impl EntityStore for SqliteStore {
    type Error = StoreError;

    fn save_entities(&mut self, entities: &[Entity]) -> Result<(), Self::Error> {
        let tx = self.conn.transaction()?;

        for entity in entities {
            let aliases = serde_json::to_string(&entity.aliases.iter().collect::<Vec<_>>())
                .map_err(|e| StoreError::InvalidData(format!("aliases: {}", e)))?;
            let attributes: serde_json::Map<String, Value> = entity
                .attributes
                .iter()
                .map(|(k, v)| (k.clone(), attribute_to_json(v)))
                .collect();
            let attributes = serde_json::to_string(&attributes)
                .map_err(|e| StoreError::InvalidData(format!("attributes: {}", e)))?;

            tx.execute(
                "INSERT INTO entities
                     (id, name, kind, description, aliases, attributes,
                      chunk_index, span_start, span_end)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                 ON CONFLICT(id) DO UPDATE SET
                     name = excluded.name,
                     kind = excluded.kind,
                     description = excluded.description,
                     aliases = excluded.aliases,
                     attributes = excluded.attributes,
                     chunk_index = excluded.chunk_index,
                     span_start = excluded.span_start,
                     span_end = excluded.span_end",
                params![
                    Self::id_to_bytes(entity.id.value()),
                    entity.name,
                    entity.kind.as_str(),
                    entity.description,
                    aliases,
                    attributes,
                    entity.provenance.chunk_index as i64,
                    entity.provenance.span.0 as i64,
                    entity.provenance.span.1 as i64,
                ],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    fn save_relationships(&mut self, relationships: &[Relationship]) -> Result<(), Self::Error> {
        let tx = self.conn.transaction()?;

        for relationship in relationships {
            tx.execute(
                "INSERT INTO relationships
                     (id, source_id, target_id, kind, strength, description)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(id) DO UPDATE SET
                     source_id = excluded.source_id,
                     target_id = excluded.target_id,
                     kind = excluded.kind,
                     strength = excluded.strength,
                     description = excluded.description",
                params![
                    Self::id_to_bytes(relationship.id.value()),
                    Self::id_to_bytes(relationship.source_id.value()),
                    Self::id_to_bytes(relationship.target_id.value()),
                    relationship.kind.as_str(),
                    relationship.strength,
                    relationship.description,
                ],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    fn load_all_entities(&self) -> Result<Vec<Entity>, Self::Error> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, kind, description, aliases, attributes,
                    chunk_index, span_start, span_end
             FROM entities ORDER BY chunk_index, id",
        )?;

        let entities = stmt
            .query_map([], Self::row_to_entity)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(entities)
    }

    fn get_entity(&self, id: EntityId) -> Result<Option<Entity>, Self::Error> {
        let entity = self
            .conn
            .query_row(
                "SELECT id, name, kind, description, aliases, attributes,
                        chunk_index, span_start, span_end
                 FROM entities WHERE id = ?1",
                params![Self::id_to_bytes(id.value())],
                Self::row_to_entity,
            )
            .optional()?;

        Ok(entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_in_memory() {
        let store = SqliteStore::open(":memory:").unwrap();
        assert!(store.load_all_entities().unwrap().is_empty());
    }

    #[test]
    fn test_id_bytes_round_trip() {
        let id = EntityId::new();
        let bytes = SqliteStore::id_to_bytes(id.value());
        assert_eq!(bytes.len(), 16);
        assert_eq!(wrap_id(&bytes, 0).unwrap(), id.value());
    }

    #[test]
    fn test_wrap_id_rejects_short_blobs() {
        assert!(wrap_id(&[1, 2, 3], 0).is_err());
    }
}

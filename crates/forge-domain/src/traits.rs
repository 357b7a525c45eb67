//! Trait definitions for external interactions
//!
//! These traits define the boundaries between domain logic and
//! infrastructure. Implementations live in other crates (forge-store for
//! persistence; the LLM boundary is async and lives in forge-llm).

use crate::{Entity, EntityId, Relationship};

/// Trait for persisting and retrieving accepted entities and relationships
///
/// Implemented by the infrastructure layer (forge-store). Implementations
/// are expected to provide read-your-writes consistency within one process.
pub trait EntityStore {
    /// Error type for store operations
    type Error;

    /// Persist a batch of accepted entities
    fn save_entities(&mut self, entities: &[Entity]) -> Result<(), Self::Error>;

    /// Persist a batch of accepted relationships
    fn save_relationships(&mut self, relationships: &[Relationship]) -> Result<(), Self::Error>;

    /// Load every stored entity
    fn load_all_entities(&self) -> Result<Vec<Entity>, Self::Error>;

    /// Get a single entity by id
    fn get_entity(&self, id: EntityId) -> Result<Option<Entity>, Self::Error>;
}

//! Integration tests for the SQLite store

use forge_domain::traits::EntityStore;
use forge_domain::{
    AttributeValue, Entity, EntityId, EntityKind, Provenance, RelationKind, Relationship,
    RelationshipId,
};
use forge_store::SqliteStore;

fn sample_entity() -> Entity {
    let mut entity = Entity::new(
        EntityId::new(),
        "Elena Rossi",
        EntityKind::Actor,
        Provenance::new(2, (100, 400)),
    )
    .with_description("A Venetian spymaster.")
    .with_alias("E. Rossi")
    .with_alias("The Widow");
    entity
        .attributes
        .insert("rank".to_string(), AttributeValue::Text("master".to_string()));
    entity
        .attributes
        .insert("agents".to_string(), AttributeValue::Integer(12));
    entity
        .attributes
        .insert("active".to_string(), AttributeValue::Boolean(true));
    entity
}

#[test]
fn test_entity_round_trip() {
    let mut store = SqliteStore::open(":memory:").unwrap();
    let entity = sample_entity();

    store.save_entities(std::slice::from_ref(&entity)).unwrap();

    let loaded = store.load_all_entities().unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0], entity);
}

#[test]
fn test_get_entity_by_id() {
    let mut store = SqliteStore::open(":memory:").unwrap();
    let entity = sample_entity();
    store.save_entities(std::slice::from_ref(&entity)).unwrap();

    let found = store.get_entity(entity.id).unwrap();
    assert_eq!(found, Some(entity));

    let missing = store.get_entity(EntityId::new()).unwrap();
    assert_eq!(missing, None);
}

#[test]
fn test_unknown_kind_round_trips() {
    let mut store = SqliteStore::open(":memory:").unwrap();
    let entity = Entity::new(
        EntityId::new(),
        "The Deep",
        EntityKind::Unknown("eldritch".to_string()),
        Provenance::new(0, (0, 10)),
    );

    store.save_entities(std::slice::from_ref(&entity)).unwrap();

    let loaded = store.load_all_entities().unwrap();
    assert_eq!(loaded[0].kind, EntityKind::Unknown("eldritch".to_string()));
}

#[test]
fn test_resave_updates_in_place() {
    let mut store = SqliteStore::open(":memory:").unwrap();
    let mut entity = sample_entity();
    store.save_entities(std::slice::from_ref(&entity)).unwrap();

    entity.description = "Retired from the trade.".to_string();
    store.save_entities(std::slice::from_ref(&entity)).unwrap();

    let loaded = store.load_all_entities().unwrap();
    assert_eq!(loaded.len(), 1, "resave must not duplicate");
    assert_eq!(loaded[0].description, "Retired from the trade.");
}

#[test]
fn test_relationship_round_trip() {
    let mut store = SqliteStore::open(":memory:").unwrap();
    let a = sample_entity();
    let mut b = sample_entity();
    b.id = EntityId::new();
    b.name = "Venice".to_string();

    let relationship = Relationship::new(
        RelationshipId::new(),
        a.id,
        b.id,
        RelationKind::LocatedIn,
        0.9,
    )
    .with_description("Operates from the city.");

    store.save_entities(&[a, b]).unwrap();
    store
        .save_relationships(std::slice::from_ref(&relationship))
        .unwrap();

    let loaded = store.load_all_relationships().unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0], relationship);
}

#[test]
fn test_custom_relation_kind_round_trips() {
    let mut store = SqliteStore::open(":memory:").unwrap();
    let relationship = Relationship::new(
        RelationshipId::new(),
        EntityId::new(),
        EntityId::new(),
        RelationKind::Custom("sworn_to".to_string()),
        0.4,
    );

    store
        .save_relationships(std::slice::from_ref(&relationship))
        .unwrap();

    let loaded = store.load_all_relationships().unwrap();
    assert_eq!(loaded[0].kind, RelationKind::Custom("sworn_to".to_string()));
}

#[test]
fn test_persistence_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("forge.db");

    let entity = sample_entity();
    {
        let mut store = SqliteStore::open(&path).unwrap();
        store.save_entities(std::slice::from_ref(&entity)).unwrap();
    }

    let store = SqliteStore::open(&path).unwrap();
    let loaded = store.load_all_entities().unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0], entity);
}

#[test]
fn test_empty_batches_are_fine() {
    let mut store = SqliteStore::open(":memory:").unwrap();
    store.save_entities(&[]).unwrap();
    store.save_relationships(&[]).unwrap();
    assert!(store.load_all_entities().unwrap().is_empty());
    assert!(store.load_all_relationships().unwrap().is_empty());
}

//! End-to-end orchestrator tests over a scripted LLM and an in-memory store

use forge_domain::traits::EntityStore;
use forge_domain::{Entity, EntityId, Genre, Relationship};
use forge_extractor::ChunkerConfig;
use forge_hil::{HilAction, HilContext, HilManager, HilResponse, SyncHandler};
use forge_llm::{MockClient, MockFailure};
use forge_pipeline::{Orchestrator, PipelineConfig, RunState};
use std::sync::Arc;

/// In-memory store; good enough to observe commits
#[derive(Default)]
struct MemoryStore {
    entities: Vec<Entity>,
    relationships: Vec<Relationship>,
}

impl EntityStore for MemoryStore {
    type Error = String;

    fn save_entities(&mut self, entities: &[Entity]) -> Result<(), Self::Error> {
        self.entities.extend_from_slice(entities);
        Ok(())
    }

    fn save_relationships(&mut self, relationships: &[Relationship]) -> Result<(), Self::Error> {
        self.relationships.extend_from_slice(relationships);
        Ok(())
    }

    fn load_all_entities(&self) -> Result<Vec<Entity>, Self::Error> {
        Ok(self.entities.clone())
    }

    fn get_entity(&self, id: EntityId) -> Result<Option<Entity>, Self::Error> {
        Ok(self.entities.iter().find(|e| e.id == id).cloned())
    }
}

/// Three ~300-char paragraphs, each carrying a unique marker word, chunked
/// with no overlap so each marker lands in exactly one chunk
fn three_paragraph_source() -> String {
    let mut source = String::new();
    source.push_str(&"alpha ".repeat(50));
    source.push_str("\n\n");
    source.push_str(&"beta ".repeat(60));
    source.push_str("\n\n");
    source.push_str(&"gamma ".repeat(50));
    source
}

fn test_config() -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.chunker = ChunkerConfig {
        max_chunk_chars: 400,
        overlap_chars: 0,
    };
    config.max_chunk_retries = 0;
    config
}

const ELENA_ONLY: &str = r#"{
    "entities": [
        {"name": "Elena Rossi", "type": "actor", "description": "A spymaster operating out of the lagoon city, feared across the republic."}
    ],
    "relationships": []
}"#;

const ELENA_AND_VENICE: &str = r#"{
    "entities": [
        {"name": "Elena Rossi", "type": "actor", "description": "Runs an intelligence network."},
        {"name": "Venice", "type": "location", "description": "A maritime republic's capital, built across a shallow lagoon."}
    ],
    "relationships": [
        {"source": "Elena Rossi", "target": "Venice", "type": "located_in", "strength": 0.9, "description": "Operates from the city."}
    ]
}"#;

#[tokio::test]
async fn test_happy_path_commits_entities_and_relationships() {
    let client = MockClient::new(ELENA_AND_VENICE);
    let mut orchestrator = Orchestrator::new(client, MemoryStore::default(), test_config());
    let mut hil = HilManager::non_interactive();

    let summary = orchestrator
        .run("Elena Rossi watches Venice.", Genre::Fantasy, None, &mut hil)
        .await
        .unwrap();

    assert_eq!(summary.status, RunState::Completed);
    assert_eq!(summary.chunks_total, 1);
    assert_eq!(summary.chunks_succeeded, 1);
    assert_eq!(summary.entity_count, 2);
    assert_eq!(summary.relationship_count, 1);

    let store = orchestrator.into_store();
    assert_eq!(store.entities.len(), 2);
    assert_eq!(store.relationships.len(), 1);
}

#[tokio::test]
async fn test_single_chunk_failure_does_not_fail_the_run() {
    let client = MockClient::new(ELENA_ONLY);
    client.add_failure("beta", MockFailure::Timeout);

    let mut orchestrator = Orchestrator::new(client, MemoryStore::default(), test_config());
    let mut hil = HilManager::non_interactive();

    let summary = orchestrator
        .run(&three_paragraph_source(), Genre::Generic, None, &mut hil)
        .await
        .unwrap();

    // 2 of 3 chunks succeeded: completed, not failed
    assert_eq!(summary.status, RunState::Completed);
    assert_eq!(summary.chunks_total, 3);
    assert_eq!(summary.chunks_succeeded, 2);
    assert_eq!(summary.chunks_failed, 1);
    assert!(summary.phase_errors.iter().any(|e| e.starts_with("chunk 1:")));
}

#[tokio::test]
async fn test_all_chunks_failing_fails_the_run() {
    let client = MockClient::default();
    client.add_failure("alpha", MockFailure::Communication);
    client.add_failure("beta", MockFailure::Communication);
    client.add_failure("gamma", MockFailure::Communication);

    let mut orchestrator = Orchestrator::new(client, MemoryStore::default(), test_config());
    let mut hil = HilManager::non_interactive();

    let summary = orchestrator
        .run(&three_paragraph_source(), Genre::Generic, None, &mut hil)
        .await
        .unwrap();

    assert_eq!(summary.status, RunState::Failed);
    assert_eq!(summary.chunks_failed, 3);
    assert_eq!(orchestrator.into_store().entities.len(), 0);
}

#[tokio::test]
async fn test_authentication_failure_fails_the_run() {
    let client = MockClient::new(ELENA_ONLY);
    client.add_failure("beta", MockFailure::Authentication);

    let mut orchestrator = Orchestrator::new(client, MemoryStore::default(), test_config());
    let mut hil = HilManager::non_interactive();

    let summary = orchestrator
        .run(&three_paragraph_source(), Genre::Generic, None, &mut hil)
        .await
        .unwrap();

    assert_eq!(summary.status, RunState::Failed);
    assert!(summary
        .phase_errors
        .iter()
        .any(|e| e.contains("Authentication")));
    assert_eq!(orchestrator.into_store().entities.len(), 0);
}

#[tokio::test]
async fn test_duplicates_across_chunks_are_reconciled() {
    let client = MockClient::default();
    client.add_response("alpha", ELENA_ONLY);
    client.add_response("beta", "{}");
    client.add_response("gamma", ELENA_AND_VENICE);

    let mut orchestrator = Orchestrator::new(client, MemoryStore::default(), test_config());
    let mut hil = HilManager::non_interactive();

    let summary = orchestrator
        .run(&three_paragraph_source(), Genre::Generic, None, &mut hil)
        .await
        .unwrap();

    assert_eq!(summary.status, RunState::Completed);
    // Both chunks mentioned Elena Rossi; one canonical entity survives
    assert_eq!(summary.entity_count, 2);

    let store = orchestrator.into_store();
    let elena = store
        .entities
        .iter()
        .find(|e| e.name == "Elena Rossi")
        .unwrap();

    // The relationship came from the later chunk; its endpoint must have
    // been remapped onto the canonical (earlier) Elena
    assert_eq!(store.relationships.len(), 1);
    assert_eq!(store.relationships[0].source_id, elena.id);
    assert_eq!(elena.provenance.chunk_index, 0);
}

#[tokio::test]
async fn test_empty_source_completes_with_zero_counts() {
    let client = MockClient::new(ELENA_ONLY);
    let mut orchestrator = Orchestrator::new(client.clone(), MemoryStore::default(), test_config());
    let mut hil = HilManager::non_interactive();

    let summary = orchestrator
        .run("", Genre::Generic, None, &mut hil)
        .await
        .unwrap();

    assert_eq!(summary.status, RunState::Completed);
    assert_eq!(summary.chunks_total, 0);
    assert_eq!(summary.entity_count, 0);
    assert_eq!(client.call_count(), 0, "no chunks, no LLM calls");
}

#[tokio::test]
async fn test_abort_at_entity_checkpoint_is_terminal() {
    let client = MockClient::new(ELENA_AND_VENICE);
    let handler = SyncHandler::new(|context: &HilContext| {
        if context.phase == "entities" {
            Ok(HilResponse::abort("reviewer said no"))
        } else {
            Ok(HilResponse::approve())
        }
    });

    let mut orchestrator = Orchestrator::new(client, MemoryStore::default(), test_config());
    let mut hil = HilManager::new(Arc::new(handler), true);

    let summary = orchestrator
        .run("Elena Rossi watches Venice.", Genre::Generic, None, &mut hil)
        .await
        .unwrap();

    assert_eq!(summary.status, RunState::Aborted);
    assert!(summary.phase_errors.iter().any(|e| e.contains("reviewer said no")));

    let store = orchestrator.into_store();
    assert!(store.entities.is_empty());
    assert!(store.relationships.is_empty());
}

#[tokio::test]
async fn test_abort_before_extraction_issues_no_calls() {
    let client = MockClient::new(ELENA_AND_VENICE);
    let handler = SyncHandler::new(|context: &HilContext| {
        if context.pre_execution {
            Ok(HilResponse::abort("not today"))
        } else {
            Ok(HilResponse::approve())
        }
    });

    let mut orchestrator =
        Orchestrator::new(client.clone(), MemoryStore::default(), test_config());
    let mut hil = HilManager::new(Arc::new(handler), true);

    let summary = orchestrator
        .run(&three_paragraph_source(), Genre::Generic, None, &mut hil)
        .await
        .unwrap();

    assert_eq!(summary.status, RunState::Aborted);
    assert_eq!(client.call_count(), 0);
}

#[tokio::test]
async fn test_skip_at_entity_checkpoint_commits_no_entities() {
    let client = MockClient::new(ELENA_AND_VENICE);
    let handler = SyncHandler::new(|context: &HilContext| {
        if context.phase == "entities" {
            Ok(HilResponse::action(HilAction::Skip))
        } else {
            Ok(HilResponse::approve())
        }
    });

    let mut orchestrator = Orchestrator::new(client, MemoryStore::default(), test_config());
    let mut hil = HilManager::new(Arc::new(handler), true);

    let summary = orchestrator
        .run("Elena Rossi watches Venice.", Genre::Generic, None, &mut hil)
        .await
        .unwrap();

    assert_eq!(summary.status, RunState::Completed);
    assert_eq!(summary.entity_count, 0);
    assert!(orchestrator.into_store().entities.is_empty());
}

#[tokio::test]
async fn test_edit_at_entity_checkpoint_replaces_output() {
    let client = MockClient::new(ELENA_AND_VENICE);
    let handler = SyncHandler::new(|context: &HilContext| {
        if context.phase != "entities" {
            return Ok(HilResponse::approve());
        }

        // Keep only Venice, renamed by the reviewer
        let entities = context.results["entities"]
            .as_array()
            .unwrap()
            .iter()
            .filter(|e| e["name"] == "Venice")
            .cloned()
            .map(|mut e| {
                e["name"] = serde_json::json!("Republic of Venice");
                e
            })
            .collect::<Vec<_>>();

        Ok(HilResponse::edit_results(serde_json::json!({
            "entities": entities
        })))
    });

    let mut orchestrator = Orchestrator::new(client, MemoryStore::default(), test_config());
    let mut hil = HilManager::new(Arc::new(handler), true);

    let summary = orchestrator
        .run("Elena Rossi watches Venice.", Genre::Generic, None, &mut hil)
        .await
        .unwrap();

    assert_eq!(summary.status, RunState::Completed);
    assert_eq!(summary.entity_count, 1);

    let store = orchestrator.into_store();
    assert_eq!(store.entities[0].name, "Republic of Venice");

    // The relationship's source (Elena) no longer resolves; it was dropped
    assert!(store.relationships.is_empty());
}

#[tokio::test]
async fn test_unparseable_edit_aborts() {
    let client = MockClient::new(ELENA_AND_VENICE);
    let handler = SyncHandler::new(|context: &HilContext| {
        if context.phase == "entities" {
            Ok(HilResponse::edit_results(serde_json::json!({
                "entities": [{"type": "actor"}]
            })))
        } else {
            Ok(HilResponse::approve())
        }
    });

    let mut orchestrator = Orchestrator::new(client, MemoryStore::default(), test_config());
    let mut hil = HilManager::new(Arc::new(handler), true);

    let summary = orchestrator
        .run("Elena Rossi watches Venice.", Genre::Generic, None, &mut hil)
        .await
        .unwrap();

    assert_eq!(summary.status, RunState::Aborted);
    assert!(summary
        .phase_errors
        .iter()
        .any(|e| e.contains("entity edit rejected")));
}

#[tokio::test]
async fn test_endless_retry_hits_the_cap() {
    let client = MockClient::new(ELENA_AND_VENICE);
    let handler = SyncHandler::new(|context: &HilContext| {
        if context.phase == "entities" {
            Ok(HilResponse::action(HilAction::Retry))
        } else {
            Ok(HilResponse::approve())
        }
    });

    let mut config = test_config();
    config.max_review_retries = 2;

    let mut orchestrator = Orchestrator::new(client, MemoryStore::default(), config);
    let mut hil = HilManager::new(Arc::new(handler), true);

    let summary = orchestrator
        .run("Elena Rossi watches Venice.", Genre::Generic, None, &mut hil)
        .await
        .unwrap();

    assert_eq!(summary.status, RunState::Aborted);
    // Initial pause plus two honored retries before the cap tripped
    assert_eq!(
        hil.history()
            .iter()
            .filter(|x| x.context.phase == "entities")
            .count(),
        3
    );
}

#[tokio::test]
async fn test_out_of_range_strength_is_reported_and_dropped() {
    let response = r#"{
        "entities": [
            {"name": "Elena Rossi", "type": "actor", "description": "A spymaster of long standing and wide renown."},
            {"name": "Venice", "type": "location", "description": "A maritime capital spanning a hundred islands."}
        ],
        "relationships": [
            {"source": "Elena Rossi", "target": "Venice", "type": "located_in", "strength": 1.5}
        ]
    }"#;

    let client = MockClient::new(response);
    let mut orchestrator = Orchestrator::new(client, MemoryStore::default(), test_config());
    let mut hil = HilManager::non_interactive();

    let summary = orchestrator
        .run("Elena Rossi watches Venice.", Genre::Generic, None, &mut hil)
        .await
        .unwrap();

    assert_eq!(summary.status, RunState::Completed);
    assert_eq!(summary.relationship_count, 0);
    assert!(summary.phase_errors.iter().any(|e| e.contains("strength")));
}

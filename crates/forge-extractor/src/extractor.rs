//! Core Extractor implementation

use crate::chunker::Chunk;
use crate::config::ExtractorConfig;
use crate::error::ExtractorError;
use crate::parser::parse_extraction;
use crate::prompt::{PromptLibrary, KEY_EXTRACTION_SYSTEM, KEY_EXTRACTION_USER, VAR_CHUNK_TEXT};
use crate::types::{ChunkExtraction, SchemaHints};
use forge_domain::{
    AttributeValue, Entity, EntityId, EntityKind, Genre, Provenance, RelationKind, Relationship,
    RelationshipId,
};
use forge_llm::{CompletionRequest, LlmClient};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::time::timeout;
use tracing::{debug, info};

/// Fully rendered prompts for one extraction pass
///
/// Built once per run so the human review layer can inspect or edit the
/// prompts before any LLM call is issued; the user prompt keeps a
/// `{{chunk_text}}` placeholder filled per chunk.
#[derive(Debug, Clone)]
pub struct ExtractionPrompts {
    /// System prompt sent with every chunk call
    pub system: String,

    /// User prompt template; `{{chunk_text}}` is substituted per chunk
    pub user_template: String,
}

/// Drives the LLM over chunks and turns its output into typed candidates
pub struct Extractor<C: LlmClient> {
    client: Arc<C>,
    prompts: PromptLibrary,
    config: ExtractorConfig,
}

impl<C: LlmClient> Extractor<C> {
    /// Create a new Extractor
    pub fn new(client: Arc<C>, prompts: PromptLibrary, config: ExtractorConfig) -> Self {
        Self {
            client,
            prompts,
            config,
        }
    }

    /// Render the prompts for a run
    ///
    /// Fails on missing templates or unresolved placeholders - a
    /// configuration error caught before the pipeline starts.
    pub fn build_prompts(
        &self,
        genre: Genre,
        schema: Option<&SchemaHints>,
    ) -> Result<ExtractionPrompts, ExtractorError> {
        let system = self.prompts.render(KEY_EXTRACTION_SYSTEM, &[])?;

        let schema_section = schema.map(PromptLibrary::schema_section).unwrap_or_default();
        let user_template = self.prompts.render(
            KEY_EXTRACTION_USER,
            &[
                ("genre_guidance", PromptLibrary::genre_guidance(genre)),
                ("schema_section", schema_section.as_str()),
            ],
        )?;

        Ok(ExtractionPrompts {
            system,
            user_template,
        })
    }

    /// Extract candidates from a single chunk
    ///
    /// Every call is fresh; nothing is cached. Transport failures return
    /// `Err`; unusable output returns an empty result with error notes.
    pub async fn extract(
        &self,
        chunk: &Chunk,
        prompts: &ExtractionPrompts,
    ) -> Result<ChunkExtraction, ExtractorError> {
        let user_prompt = prompts.user_template.replace(VAR_CHUNK_TEXT, &chunk.text);

        let request = CompletionRequest::new(user_prompt)
            .with_system_prompt(prompts.system.clone())
            .with_model(self.config.model_id.clone())
            .with_temperature(self.config.temperature);
        let request = match self.config.max_tokens {
            Some(cap) => request.with_max_tokens(cap),
            None => request,
        };

        debug!(
            chunk_index = chunk.index,
            prompt_len = request.prompt.len(),
            "Dispatching extraction call"
        );

        let response = timeout(self.config.extraction_timeout(), self.client.complete(&request))
            .await
            .map_err(|_| ExtractorError::Timeout {
                chunk_index: chunk.index,
            })?
            .map_err(|source| ExtractorError::LlmCall {
                chunk_index: chunk.index,
                source,
            })?;

        debug!(
            chunk_index = chunk.index,
            response_len = response.len(),
            "Received extraction response"
        );

        let payload = match parse_extraction(&response) {
            Ok(payload) => payload,
            Err(note) => {
                info!(chunk_index = chunk.index, "Unparseable LLM output: {}", note);
                return Ok(ChunkExtraction::failed(chunk.index, note));
            }
        };

        Ok(self.materialize(chunk, payload))
    }

    /// Turn a parsed payload into provenance-tagged domain candidates
    fn materialize(&self, chunk: &Chunk, payload: crate::parser::ParsedPayload) -> ChunkExtraction {
        let provenance = Provenance::new(chunk.index, chunk.span);
        let mut errors = payload.notes;
        let mut entities = Vec::new();

        // Surface form → candidate id, for resolving relationship endpoints
        let mut by_name: BTreeMap<String, EntityId> = BTreeMap::new();

        for parsed in payload.entities {
            let id = EntityId::new();
            let mut entity = Entity::new(id, parsed.name.clone(), EntityKind::parse(&parsed.kind), provenance)
                .with_description(parsed.description);

            for alias in parsed.aliases {
                if alias != entity.name {
                    entity.aliases.insert(alias);
                }
            }

            for (key, value) in parsed.attributes {
                entity.attributes.insert(key, coerce_attribute(value));
            }

            for form in entity.surface_forms() {
                by_name.entry(normalize(form)).or_insert(id);
            }
            entities.push(entity);
        }

        let mut relationships = Vec::new();
        for parsed in payload.relationships {
            let source_id = by_name.get(&normalize(&parsed.source)).copied();
            let target_id = by_name.get(&normalize(&parsed.target)).copied();

            match (source_id, target_id) {
                (Some(source_id), Some(target_id)) => {
                    relationships.push(
                        Relationship::new(
                            RelationshipId::new(),
                            source_id,
                            target_id,
                            RelationKind::parse(&parsed.kind),
                            parsed.strength,
                        )
                        .with_description(parsed.description),
                    );
                }
                _ => {
                    let missing = if source_id.is_none() {
                        &parsed.source
                    } else {
                        &parsed.target
                    };
                    errors.push(format!(
                        "relationship '{}' -> '{}': endpoint '{}' not among extracted entities",
                        parsed.source, parsed.target, missing
                    ));
                }
            }
        }

        info!(
            chunk_index = chunk.index,
            entities = entities.len(),
            relationships = relationships.len(),
            notes = errors.len(),
            "Materialized chunk extraction"
        );

        ChunkExtraction {
            chunk_index: chunk.index,
            entities,
            relationships,
            errors,
        }
    }
}

/// Case-insensitive surface form key
fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Map a JSON attribute value onto the domain scalar type
fn coerce_attribute(value: Value) -> AttributeValue {
    match value {
        Value::String(s) => AttributeValue::Text(s),
        Value::Bool(b) => AttributeValue::Boolean(b),
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

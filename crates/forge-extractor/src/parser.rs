//! Defensive parsing of LLM extraction output
//!
//! Models wrap JSON in prose and code fences despite instructions, so the
//! payload is located before it is parsed: fenced block first, then the
//! outermost brace pair. A response with no parseable payload is a soft
//! failure reported as an error note, never a panic or a hard error.

use serde_json::Value;
use tracing::warn;

/// An entity record as it appears in the LLM payload
///
/// Kind stays a string here; enum coercion (with its Unknown fallback)
/// happens when the extractor builds domain candidates.
#[derive(Debug, Clone)]
pub(crate) struct ParsedEntity {
    pub name: String,
    pub kind: String,
    pub description: String,
    pub aliases: Vec<String>,
    pub attributes: Vec<(String, Value)>,
}

/// A relationship record as it appears in the LLM payload
///
/// Endpoints are entity *names*; the extractor resolves them against the
/// chunk's candidate set.
#[derive(Debug, Clone)]
pub(crate) struct ParsedRelationship {
    pub source: String,
    pub target: String,
    pub kind: String,
    pub strength: f64,
    pub description: String,
}

/// Everything salvaged from one LLM response
#[derive(Debug, Clone, Default)]
pub(crate) struct ParsedPayload {
    pub entities: Vec<ParsedEntity>,
    pub relationships: Vec<ParsedRelationship>,
    pub notes: Vec<String>,
}

/// Locate and parse the extraction payload in a free-text LLM response
///
/// Returns `Err` with a note when no payload can be salvaged at all;
/// per-record problems are recorded in the payload's `notes` and the record
/// skipped.
pub(crate) fn parse_extraction(response: &str) -> Result<ParsedPayload, String> {
    let json_str = locate_json(response)
        .ok_or_else(|| "no JSON payload found in LLM response".to_string())?;

    let value: Value = serde_json::from_str(json_str)
        .map_err(|e| format!("JSON parse error: {}", e))?;

    let obj = value
        .as_object()
        .ok_or_else(|| "expected a JSON object with entities/relationships".to_string())?;

    let mut payload = ParsedPayload::default();

    if let Some(entities) = obj.get("entities").and_then(|v| v.as_array()) {
        for (idx, entry) in entities.iter().enumerate() {
            match parse_entity(entry) {
                Ok(entity) => payload.entities.push(entity),
                Err(e) => {
                    warn!("Skipping entity {}: {}", idx, e);
                    payload.notes.push(format!("entity {}: {}", idx, e));
                }
            }
        }
    }

    if let Some(relationships) = obj.get("relationships").and_then(|v| v.as_array()) {
        for (idx, entry) in relationships.iter().enumerate() {
            match parse_relationship(entry) {
                Ok(rel) => payload.relationships.push(rel),
                Err(e) => {
                    warn!("Skipping relationship {}: {}", idx, e);
                    payload.notes.push(format!("relationship {}: {}", idx, e));
                }
            }
        }
    }

    Ok(payload)
}

/// Find the JSON block in a response that may carry prose and code fences
fn locate_json(response: &str) -> Option<&str> {
    let trimmed = response.trim();

    // Fenced code block (```json or bare ```)
    if let Some(fence_start) = trimmed.find("```") {
        let after = &trimmed[fence_start + 3..];
        let after = after.strip_prefix("json").unwrap_or(after);
        if let Some(fence_end) = after.find("```") {
            let inner = after[..fence_end].trim();
            if !inner.is_empty() {
                return Some(inner);
            }
        }
    }

    // Outermost object braces
    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if start < end {
        Some(&trimmed[start..=end])
    } else {
        None
    }
}

fn parse_entity(value: &Value) -> Result<ParsedEntity, String> {
    let obj = value
        .as_object()
        .ok_or_else(|| "entity is not a JSON object".to_string())?;

    let name = obj
        .get("name")
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| "missing or blank 'name'".to_string())?
        .to_string();

    // "type" is what the prompt asks for; "kind" tolerated
    let kind = obj
        .get("type")
        .or_else(|| obj.get("kind"))
        .and_then(|v| v.as_str())
        .unwrap_or("abstract")
        .to_string();

    let description = obj
        .get("description")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .trim()
        .to_string();

    let aliases = obj
        .get("aliases")
        .and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|v| v.as_str())
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let attributes = obj
        .get("attributes")
        .and_then(|v| v.as_object())
        .map(|map| {
            map.iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect()
        })
        .unwrap_or_default();

    Ok(ParsedEntity {
        name,
        kind,
        description,
        aliases,
        attributes,
    })
}

fn parse_relationship(value: &Value) -> Result<ParsedRelationship, String> {
    let obj = value
        .as_object()
        .ok_or_else(|| "relationship is not a JSON object".to_string())?;

    let source = obj
        .get("source")
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| "missing or blank 'source'".to_string())?
        .to_string();

    let target = obj
        .get("target")
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| "missing or blank 'target'".to_string())?
        .to_string();

    let kind = obj
        .get("type")
        .or_else(|| obj.get("kind"))
        .and_then(|v| v.as_str())
        .unwrap_or("custom")
        .to_string();

    // Out-of-range strength is preserved; the validator reports it
    let strength = obj.get("strength").and_then(|v| v.as_f64()).unwrap_or(0.0);

    let description = obj
        .get("description")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .trim()
        .to_string();

    Ok(ParsedRelationship {
        source,
        target,
        kind,
        strength,
        description,
    })
}

//! Prompt templates for entity extraction
//!
//! Templates are a key → string lookup with `{{variable}}` substitution.
//! A missing key or an unresolved placeholder is a configuration error
//! surfaced when the prompt is built, before the pipeline runs - never a
//! mid-run failure.

use crate::error::ExtractorError;
use crate::types::SchemaHints;
use forge_domain::Genre;
use std::collections::BTreeMap;

/// Template key for the extraction system prompt
pub const KEY_EXTRACTION_SYSTEM: &str = "extraction.system";

/// Template key for the extraction user prompt
pub const KEY_EXTRACTION_USER: &str = "extraction.user";

/// Placeholder substituted with the chunk text at call time
pub const VAR_CHUNK_TEXT: &str = "{{chunk_text}}";

/// Key → template lookup with variable substitution
#[derive(Debug, Clone)]
pub struct PromptLibrary {
    templates: BTreeMap<String, String>,
}

impl PromptLibrary {
    /// Library with the built-in extraction templates
    pub fn builtin() -> Self {
        let mut templates = BTreeMap::new();
        templates.insert(
            KEY_EXTRACTION_SYSTEM.to_string(),
            EXTRACTION_SYSTEM.to_string(),
        );
        templates.insert(KEY_EXTRACTION_USER.to_string(), EXTRACTION_USER.to_string());
        Self { templates }
    }

    /// Replace or add a template
    pub fn set(&mut self, key: impl Into<String>, template: impl Into<String>) {
        self.templates.insert(key.into(), template.into());
    }

    /// Render a template with the given variables
    ///
    /// Placeholders use `{{name}}` syntax. Any placeholder left unresolved
    /// after substitution (other than `{{chunk_text}}`, which is filled per
    /// call) is an error.
    pub fn render(
        &self,
        key: &str,
        vars: &[(&str, &str)],
    ) -> Result<String, ExtractorError> {
        let template = self
            .templates
            .get(key)
            .ok_or_else(|| ExtractorError::Prompt(format!("unknown template key '{}'", key)))?;

        let mut rendered = template.clone();
        for (name, value) in vars {
            rendered = rendered.replace(&format!("{{{{{}}}}}", name), value);
        }

        let mut rest = rendered.as_str();
        while let Some(pos) = rest.find("{{") {
            let tail = &rest[pos..];
            if !tail.starts_with(VAR_CHUNK_TEXT) {
                let snippet: String = match tail.find("}}") {
                    Some(end) => tail[..end + 2].to_string(),
                    None => tail.chars().take(24).collect(),
                };
                return Err(ExtractorError::Prompt(format!(
                    "unresolved placeholder {} in template '{}'",
                    snippet, key
                )));
            }
            rest = &tail[VAR_CHUNK_TEXT.len()..];
        }

        Ok(rendered)
    }

    /// Genre-specific guidance inserted into the user prompt
    pub fn genre_guidance(genre: Genre) -> &'static str {
        match genre {
            Genre::Historical => {
                "The source is historical material. Prefer attested names and \
                 titles; treat states, dynasties, and institutions as polities."
            }
            Genre::Fantasy => {
                "The source is fantasy fiction. Kingdoms, guilds, and orders \
                 are polities; magical artifacts and materials are resources."
            }
            Genre::SciFi => {
                "The source is science fiction. Federations, corporations, and \
                 colonies are polities; planets and stations are locations."
            }
            Genre::Modern => {
                "The source is contemporary. Companies, agencies, and nations \
                 are polities."
            }
            Genre::Generic => "Make no assumptions about the source's setting.",
        }
    }

    /// Render schema hints as a prompt section
    pub fn schema_section(hints: &SchemaHints) -> String {
        if hints.is_empty() {
            return String::new();
        }
        let mut section = String::from("Additional attribute fields to capture when present:\n");
        for (field, description) in hints {
            section.push_str(&format!("- {}: {}\n", field, description));
        }
        section
    }
}

impl Default for PromptLibrary {
    fn default() -> Self {
        Self::builtin()
    }
}

const EXTRACTION_SYSTEM: &str = r#"You are an entity extraction engine for a worldbuilding toolkit.
Given a passage of source text, identify the entities it mentions and the relationships between them.

Entity kinds: actor, polity, location, region, resource, event, abstract.
Relationship kinds: ally, rival, member_of, located_in, controls, owns, kin_of, participant_in - or a short snake_case label of your own when none fits.

Rules:
- One record per distinct entity; put alternate surface forms in "aliases"
- "description" is one or two sentences grounded in the passage
- Relationship "source" and "target" name entities from your own entity list
- "strength" is -1.0 to 1.0: negative for antagonistic ties, positive for supportive ones
- Only extract what the passage states or strongly implies"#;

const EXTRACTION_USER: &str = r#"{{genre_guidance}}

{{schema_section}}Passage to analyze:
---
{{chunk_text}}
---

Output format (JSON object only, no additional text):
{
  "entities": [
    {
      "name": "...",
      "type": "actor",
      "description": "...",
      "aliases": ["..."],
      "attributes": {"key": "value"}
    }
  ],
  "relationships": [
    {
      "source": "entity name",
      "target": "entity name",
      "type": "ally",
      "strength": 0.8,
      "description": "..."
    }
  ]
}

Remember: return ONLY the JSON object, no markdown code fences, no explanations."#;

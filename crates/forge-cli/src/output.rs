//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use forge_domain::{Entity, Relationship};
use forge_extractor::codec;
use forge_pipeline::{RunState, RunSummary};
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format a batch of entities.
    pub fn format_entities(&self, entities: &[Entity]) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let values: Vec<_> = entities.iter().map(codec::entity_to_json).collect();
                Ok(serde_json::to_string_pretty(&values)?)
            }
            OutputFormat::Quiet => Ok(entities
                .iter()
                .map(|e| e.id.to_string())
                .collect::<Vec<_>>()
                .join("\n")),
            OutputFormat::Table => Ok(self.entities_table(entities)),
        }
    }

    /// Format a batch of relationships.
    pub fn format_relationships(&self, relationships: &[Relationship]) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let values: Vec<_> = relationships
                    .iter()
                    .map(codec::relationship_to_json)
                    .collect();
                Ok(serde_json::to_string_pretty(&values)?)
            }
            OutputFormat::Quiet => Ok(relationships
                .iter()
                .map(|r| r.id.to_string())
                .collect::<Vec<_>>()
                .join("\n")),
            OutputFormat::Table => Ok(self.relationships_table(relationships)),
        }
    }

    /// Format an end-of-run summary.
    pub fn format_summary(&self, summary: &RunSummary) -> String {
        let status = match summary.status {
            RunState::Completed => self.colorize(summary.status.as_str(), Color::Green),
            RunState::Aborted => self.colorize(summary.status.as_str(), Color::Yellow),
            RunState::Failed => self.colorize(summary.status.as_str(), Color::Red),
            _ => summary.status.as_str().to_string(),
        };

        let mut out = format!(
            "{} - {} entities, {} relationships committed ({} of {} chunks succeeded)\n",
            status,
            summary.entity_count,
            summary.relationship_count,
            summary.chunks_succeeded,
            summary.chunks_total
        );

        for error in &summary.phase_errors {
            out.push_str(&format!("  {} {}\n", self.colorize("error:", Color::Red), error));
        }
        for warning in &summary.warnings {
            out.push_str(&format!(
                "  {} {}\n",
                self.colorize("warning:", Color::Yellow),
                warning
            ));
        }

        out
    }

    fn entities_table(&self, entities: &[Entity]) -> String {
        if entities.is_empty() {
            return self.colorize("No entities found.", Color::Yellow);
        }

        let mut builder = Builder::default();
        builder.push_record(["Name", "Kind", "Aliases", "Description"]);

        for entity in entities {
            let aliases = entity
                .aliases
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", ");
            builder.push_record([
                entity.name.clone(),
                entity.kind.as_str().to_string(),
                aliases,
                truncate(&entity.description, 60),
            ]);
        }

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));
        table.to_string()
    }

    fn relationships_table(&self, relationships: &[Relationship]) -> String {
        if relationships.is_empty() {
            return self.colorize("No relationships found.", Color::Yellow);
        }

        let mut builder = Builder::default();
        builder.push_record(["Source", "Target", "Kind", "Strength", "Description"]);

        for relationship in relationships {
            builder.push_record([
                relationship.source_id.to_string(),
                relationship.target_id.to_string(),
                relationship.kind.as_str().to_string(),
                format!("{:+.2}", relationship.strength),
                truncate(&relationship.description, 40),
            ]);
        }

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));
        table.to_string()
    }

    fn colorize(&self, text: &str, color: Color) -> String {
        if self.color_enabled {
            text.color(color).to_string()
        } else {
            text.to_string()
        }
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{}…", cut)
}

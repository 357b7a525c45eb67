//! Entity and relationship validation logic

use crate::ValidatorConfig;
use forge_domain::{Entity, EntityId, Relationship};
use std::collections::BTreeSet;
use std::fmt;

/// How serious a validation issue is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Informational; no action required
    Info,

    /// Suspicious but not blocking
    Warning,

    /// Blocks the batch: `is_valid()` is false while any of these exist
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARNING"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// A single validation finding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    /// The field the finding is about
    pub field: String,

    /// What is wrong
    pub message: String,

    /// How serious it is
    pub severity: Severity,
}

impl Issue {
    fn new(field: impl Into<String>, message: impl Into<String>, severity: Severity) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            severity,
        }
    }
}

/// Accumulated findings from a validation pass
///
/// Reports merge, so a batch pass can collect per-record findings into one
/// combined report instead of stopping at the first failure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// Every finding, in the order the checks ran
    pub issues: Vec<Issue>,
}

impl ValidationReport {
    /// A report with no findings
    pub fn clean() -> Self {
        Self::default()
    }

    /// False iff at least one ERROR-severity issue exists
    pub fn is_valid(&self) -> bool {
        !self
            .issues
            .iter()
            .any(|issue| issue.severity == Severity::Error)
    }

    /// Number of issues at the given severity
    pub fn count(&self, severity: Severity) -> usize {
        self.issues
            .iter()
            .filter(|issue| issue.severity == severity)
            .count()
    }

    /// Fold another report's findings into this one
    pub fn merge(&mut self, other: ValidationReport) {
        self.issues.extend(other.issues);
    }
}

/// Validates entities and relationships against structural rules
pub struct Validator {
    config: ValidatorConfig,
}

impl Validator {
    /// Create a validator with the given configuration
    pub fn new(config: ValidatorConfig) -> Self {
        Self { config }
    }

    /// Validate a single entity
    pub fn validate_entity(&self, entity: &Entity) -> ValidationReport {
        let mut report = ValidationReport::clean();
        let label = entity_label(entity);

        if entity.name.trim().is_empty() {
            report.issues.push(Issue::new(
                "name",
                format!("{}: name is required and must not be blank", label),
                Severity::Error,
            ));
        }

        if !entity.kind.is_known() {
            report.issues.push(Issue::new(
                "kind",
                format!(
                    "{}: kind '{}' is not a recognized entity kind",
                    label,
                    entity.kind.as_str()
                ),
                Severity::Error,
            ));
        }

        if entity.description.trim().is_empty() {
            report.issues.push(Issue::new(
                "description",
                format!("{}: description is missing", label),
                Severity::Warning,
            ));
        } else if entity.description.trim().len() < self.config.min_description_chars {
            report.issues.push(Issue::new(
                "description",
                format!(
                    "{}: description is under {} characters",
                    label, self.config.min_description_chars
                ),
                Severity::Info,
            ));
        }

        report
    }

    /// Validate a batch of entities into one combined report
    pub fn validate_entities(&self, entities: &[Entity]) -> ValidationReport {
        let mut report = ValidationReport::clean();
        for entity in entities {
            report.merge(self.validate_entity(entity));
        }
        report
    }

    /// Validate a single relationship against the known entity ids
    pub fn validate_relationship(
        &self,
        relationship: &Relationship,
        known_ids: &BTreeSet<EntityId>,
    ) -> ValidationReport {
        let mut report = ValidationReport::clean();
        let label = format!("relationship {}", relationship.id);

        if !(-1.0..=1.0).contains(&relationship.strength) {
            report.issues.push(Issue::new(
                "strength",
                format!(
                    "{}: strength {} is outside [-1.0, 1.0]",
                    label, relationship.strength
                ),
                Severity::Error,
            ));
        }

        if !known_ids.contains(&relationship.source_id) {
            report.issues.push(Issue::new(
                "source_id",
                format!(
                    "{}: source {} does not resolve to a known entity",
                    label, relationship.source_id
                ),
                Severity::Error,
            ));
        }

        if !known_ids.contains(&relationship.target_id) {
            report.issues.push(Issue::new(
                "target_id",
                format!(
                    "{}: target {} does not resolve to a known entity",
                    label, relationship.target_id
                ),
                Severity::Error,
            ));
        }

        // Suspicious but permitted
        if relationship.is_self_referential() {
            report.issues.push(Issue::new(
                "target_id",
                format!("{}: source and target are the same entity", label),
                Severity::Warning,
            ));
        }

        report
    }

    /// Validate a full reconciled set into one combined report
    pub fn validate_all(
        &self,
        entities: &[Entity],
        relationships: &[Relationship],
    ) -> ValidationReport {
        let known_ids: BTreeSet<EntityId> = entities.iter().map(|e| e.id).collect();

        let mut report = self.validate_entities(entities);
        for relationship in relationships {
            report.merge(self.validate_relationship(relationship, &known_ids));
        }
        report
    }
}

fn entity_label(entity: &Entity) -> String {
    if entity.name.trim().is_empty() {
        format!("entity {}", entity.id)
    } else {
        format!("entity '{}'", entity.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forge_domain::{EntityKind, Provenance, RelationKind, RelationshipId};

    fn validator() -> Validator {
        Validator::new(ValidatorConfig::default())
    }

    fn entity(name: &str, kind: EntityKind) -> Entity {
        Entity::new(EntityId::new(), name, kind, Provenance::new(0, (0, 0)))
            .with_description("A description long enough to pass the length check.")
    }

    fn known(entities: &[Entity]) -> BTreeSet<EntityId> {
        entities.iter().map(|e| e.id).collect()
    }

    #[test]
    fn test_valid_entity() {
        let report = validator().validate_entity(&entity("Venice", EntityKind::Location));
        assert!(report.is_valid());
        assert!(report.issues.is_empty());
    }

    #[test]
    fn test_blank_name_is_error() {
        let report = validator().validate_entity(&entity("   ", EntityKind::Location));
        assert!(!report.is_valid());
        assert_eq!(report.issues[0].field, "name");
        assert_eq!(report.issues[0].severity, Severity::Error);
    }

    #[test]
    fn test_unknown_kind_is_error() {
        let report =
            validator().validate_entity(&entity("The Deep", EntityKind::Unknown("eldritch".into())));
        assert!(!report.is_valid());
        assert_eq!(report.issues[0].field, "kind");
        assert!(report.issues[0].message.contains("eldritch"));
    }

    #[test]
    fn test_missing_description_is_warning() {
        let mut subject = entity("Venice", EntityKind::Location);
        subject.description.clear();

        let report = validator().validate_entity(&subject);
        assert!(report.is_valid(), "warnings do not invalidate");
        assert_eq!(report.issues[0].severity, Severity::Warning);
    }

    #[test]
    fn test_short_description_is_info() {
        let mut subject = entity("Venice", EntityKind::Location);
        subject.description = "A city.".to_string();

        let report = validator().validate_entity(&subject);
        assert!(report.is_valid());
        assert_eq!(report.issues[0].severity, Severity::Info);
    }

    #[test]
    fn test_strength_out_of_range_is_single_error() {
        let entities = vec![entity("A", EntityKind::Actor), entity("B", EntityKind::Actor)];
        let rel = Relationship::new(
            RelationshipId::new(),
            entities[0].id,
            entities[1].id,
            RelationKind::Rival,
            1.5,
        );

        let report = validator().validate_relationship(&rel, &known(&entities));
        assert!(!report.is_valid());
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].field, "strength");
        assert_eq!(report.issues[0].severity, Severity::Error);
    }

    #[test]
    fn test_unresolved_endpoint_is_error() {
        let entities = vec![entity("A", EntityKind::Actor)];
        let rel = Relationship::new(
            RelationshipId::new(),
            entities[0].id,
            EntityId::new(),
            RelationKind::Ally,
            0.5,
        );

        let report = validator().validate_relationship(&rel, &known(&entities));
        assert!(!report.is_valid());
        assert_eq!(report.issues[0].field, "target_id");
    }

    #[test]
    fn test_self_reference_is_warning_not_error() {
        let entities = vec![entity("A", EntityKind::Actor)];
        let rel = Relationship::new(
            RelationshipId::new(),
            entities[0].id,
            entities[0].id,
            RelationKind::Ally,
            0.5,
        );

        let report = validator().validate_relationship(&rel, &known(&entities));
        assert!(report.is_valid());
        assert_eq!(report.count(Severity::Warning), 1);
    }

    #[test]
    fn test_custom_relation_kind_is_allowed() {
        let entities = vec![entity("A", EntityKind::Actor), entity("B", EntityKind::Actor)];
        let rel = Relationship::new(
            RelationshipId::new(),
            entities[0].id,
            entities[1].id,
            RelationKind::Custom("sworn_to".into()),
            0.5,
        );

        let report = validator().validate_relationship(&rel, &known(&entities));
        assert!(report.is_valid());
        assert!(report.issues.is_empty());
    }

    #[test]
    fn test_batch_collects_every_issue() {
        let good = entity("Venice", EntityKind::Location);
        let blank = entity("  ", EntityKind::Location);
        let unknown = entity("The Deep", EntityKind::Unknown("eldritch".into()));

        let report = validator().validate_entities(&[good, blank, unknown]);
        assert!(!report.is_valid());
        assert_eq!(report.count(Severity::Error), 2);
    }

    #[test]
    fn test_validate_all_combines_entities_and_relationships() {
        let entities = vec![entity("A", EntityKind::Actor), entity("B", EntityKind::Actor)];
        let relationships = vec![
            Relationship::new(
                RelationshipId::new(),
                entities[0].id,
                entities[1].id,
                RelationKind::Ally,
                0.5,
            ),
            Relationship::new(
                RelationshipId::new(),
                entities[0].id,
                EntityId::new(),
                RelationKind::Rival,
                -2.0,
            ),
        ];

        let report = validator().validate_all(&entities, &relationships);
        assert!(!report.is_valid());
        // Bad strength plus unresolved target on the second relationship
        assert_eq!(report.count(Severity::Error), 2);
    }

    #[test]
    fn test_validation_is_idempotent() {
        let subject = entity("Venice", EntityKind::Location);
        let validator = validator();

        let first = validator.validate_entity(&subject);
        let second = validator.validate_entity(&subject);
        assert!(first.is_valid());
        assert_eq!(first, second);
    }
}

//! Relationship module - typed, weighted edges between entities

use crate::entity::EntityId;
use std::fmt;

/// Unique identifier for a relationship based on UUIDv7
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RelationshipId(u128);

impl RelationshipId {
    /// Generate a new UUIDv7-based RelationshipId
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7().as_u128())
    }

    /// Create a RelationshipId from a raw u128 value
    ///
    /// This is primarily for storage layer deserialization.
    pub fn from_value(value: u128) -> Self {
        Self(value)
    }

    /// Parse a RelationshipId from a UUID string
    pub fn from_string(s: &str) -> Result<Self, String> {
        uuid::Uuid::parse_str(s)
            .map(|u| Self(u.as_u128()))
            .map_err(|e| format!("Invalid UUID string: {}", e))
    }

    /// Get the raw u128 value
    pub fn value(&self) -> u128 {
        self.0
    }
}

impl Default for RelationshipId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RelationshipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", uuid::Uuid::from_u128(self.0))
    }
}

/// Kind of relationship between two entities
///
/// The set is open-ended: extraction output naming a kind outside the known
/// members is preserved as [`RelationKind::Custom`] with the original
/// surface form. Custom kinds are valid members, not errors.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RelationKind {
    /// Mutual support or alliance
    Ally,

    /// Opposition or enmity
    Rival,

    /// Membership in a polity or group
    MemberOf,

    /// Physical containment within a location or region
    LocatedIn,

    /// Political or military control
    Controls,

    /// Ownership of a resource or artifact
    Owns,

    /// Familial connection
    KinOf,

    /// Involvement in an event
    ParticipantIn,

    /// Any other kind, carrying the original surface form
    Custom(String),
}

impl RelationKind {
    /// Parse a kind from its surface form (case-insensitive)
    ///
    /// Unrecognized input yields `Custom` with the original string.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "ally" | "allied_with" => Self::Ally,
            "rival" | "enemy_of" => Self::Rival,
            "member_of" => Self::MemberOf,
            "located_in" => Self::LocatedIn,
            "controls" => Self::Controls,
            "owns" => Self::Owns,
            "kin_of" => Self::KinOf,
            "participant_in" => Self::ParticipantIn,
            _ => Self::Custom(s.trim().to_string()),
        }
    }

    /// The canonical surface form of this kind
    pub fn as_str(&self) -> &str {
        match self {
            Self::Ally => "ally",
            Self::Rival => "rival",
            Self::MemberOf => "member_of",
            Self::LocatedIn => "located_in",
            Self::Controls => "controls",
            Self::Owns => "owns",
            Self::KinOf => "kin_of",
            Self::ParticipantIn => "participant_in",
            Self::Custom(s) => s,
        }
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A directed, weighted relationship between two entities
///
/// Strength is expected in [-1.0, 1.0] (negative for antagonistic edges);
/// out-of-range values are not rejected here - the validator reports them.
/// During extraction the endpoints may reference not-yet-reconciled
/// candidate ids; they must resolve against the run's entity set once
/// finalized.
#[derive(Debug, Clone, PartialEq)]
pub struct Relationship {
    /// Unique identifier
    pub id: RelationshipId,

    /// Source entity id
    pub source_id: EntityId,

    /// Target entity id
    pub target_id: EntityId,

    /// Kind of relationship
    pub kind: RelationKind,

    /// Strength in [-1.0, 1.0]
    pub strength: f64,

    /// Free-form description of the connection
    pub description: String,
}

impl Relationship {
    /// Create a new relationship
    pub fn new(
        id: RelationshipId,
        source_id: EntityId,
        target_id: EntityId,
        kind: RelationKind,
        strength: f64,
    ) -> Self {
        Self {
            id,
            source_id,
            target_id,
            kind,
            strength,
            description: String::new(),
        }
    }

    /// Set the description, builder-style
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Whether this relationship points back at its own source
    ///
    /// Suspicious but not forbidden; the validator reports it as a warning.
    pub fn is_self_referential(&self) -> bool {
        self.source_id == self.target_id
    }
}

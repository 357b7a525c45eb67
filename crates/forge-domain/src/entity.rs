//! Entity module - the fundamental record of Forge's extraction pipeline

use crate::provenance::Provenance;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Unique identifier for an entity based on UUIDv7
///
/// UUIDv7 provides:
/// - Chronological sortability within a run
/// - 128-bit uniqueness with no coordination required
/// - RFC 9562-standard format with broad ecosystem support
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityId(u128);

impl EntityId {
    /// Generate a new UUIDv7-based EntityId
    ///
    /// # Examples
    ///
    /// ```
    /// use forge_domain::EntityId;
    ///
    /// let id = EntityId::new();
    /// assert!(id.value() > 0);
    /// ```
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7().as_u128())
    }

    /// Create an EntityId from a raw u128 value
    ///
    /// This is primarily for storage layer deserialization.
    pub fn from_value(value: u128) -> Self {
        Self(value)
    }

    /// Parse an EntityId from a UUID string
    ///
    /// # Examples
    ///
    /// ```
    /// use forge_domain::EntityId;
    ///
    /// let id = EntityId::new();
    /// let parsed = EntityId::from_string(&id.to_string()).unwrap();
    /// assert_eq!(id, parsed);
    /// ```
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

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", uuid::Uuid::from_u128(self.0))
    }
}

/// The kind of a worldbuilding entity
///
/// Extraction output is permissive: a kind string that does not match a
/// known member is preserved as [`EntityKind::Unknown`] rather than being
/// coerced to a fixed fallback, so the original surface form stays
/// inspectable for review and validation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EntityKind {
    /// A person or named agent
    Actor,

    /// A political body (kingdom, guild, faction, state)
    Polity,

    /// A specific place
    Location,

    /// A broader geographic area containing locations
    Region,

    /// A material, commodity, or artifact
    Resource,

    /// A discrete occurrence in the world's history
    Event,

    /// A concept, belief, or other intangible
    Abstract,

    /// An unrecognized kind, carrying the original surface form
    Unknown(String),
}

impl EntityKind {
    /// Parse a kind from its surface form (case-insensitive)
    ///
    /// Unrecognized input yields `Unknown` with the original string.
    ///
    /// # Examples
    ///
    /// ```
    /// use forge_domain::EntityKind;
    ///
    /// assert_eq!(EntityKind::parse("Actor"), EntityKind::Actor);
    /// assert_eq!(EntityKind::parse("POLITY"), EntityKind::Polity);
    /// assert_eq!(
    ///     EntityKind::parse("Deity"),
    ///     EntityKind::Unknown("Deity".to_string())
    /// );
    /// ```
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "actor" => Self::Actor,
            "polity" => Self::Polity,
            "location" => Self::Location,
            "region" => Self::Region,
            "resource" => Self::Resource,
            "event" => Self::Event,
            "abstract" => Self::Abstract,
            _ => Self::Unknown(s.trim().to_string()),
        }
    }

    /// The canonical surface form of this kind
    pub fn as_str(&self) -> &str {
        match self {
            Self::Actor => "actor",
            Self::Polity => "polity",
            Self::Location => "location",
            Self::Region => "region",
            Self::Resource => "resource",
            Self::Event => "event",
            Self::Abstract => "abstract",
            Self::Unknown(s) => s,
        }
    }

    /// Whether this kind is a recognized enum member
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown(_))
    }

    /// Whether this kind carries no specific typing information
    ///
    /// Abstract and Unknown kinds yield to a more specific kind when two
    /// candidate records merge.
    pub fn is_specific(&self) -> bool {
        !matches!(self, Self::Abstract | Self::Unknown(_))
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A scalar attribute value attached to an entity
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    /// Free-form text
    Text(String),

    /// An integer quantity
    Integer(i64),

    /// A floating-point quantity
    Float(f64),

    /// A boolean flag
    Boolean(bool),
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => write!(f, "{}", s),
            Self::Integer(i) => write!(f, "{}", i),
            Self::Float(x) => write!(f, "{}", x),
            Self::Boolean(b) => write!(f, "{}", b),
        }
    }
}

/// A worldbuilding entity extracted from source text
///
/// During extraction an entity is a *candidate*: possibly duplicated across
/// chunks, possibly carrying an unrecognized kind. Reconciliation merges
/// candidates into the canonical set. Aliases and attributes use ordered
/// collections so iteration is deterministic run to run.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    /// Unique identifier, stable within a run
    pub id: EntityId,

    /// Primary name; non-empty once reconciled
    pub name: String,

    /// Kind of entity
    pub kind: EntityKind,

    /// Free-form description
    pub description: String,

    /// Alternate surface forms for the same entity
    pub aliases: BTreeSet<String>,

    /// Scalar attributes keyed by name
    pub attributes: BTreeMap<String, AttributeValue>,

    /// Originating chunk and byte span
    pub provenance: Provenance,
}

impl Entity {
    /// Create a new entity with empty description, aliases, and attributes
    pub fn new(id: EntityId, name: impl Into<String>, kind: EntityKind, provenance: Provenance) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            description: String::new(),
            aliases: BTreeSet::new(),
            attributes: BTreeMap::new(),
            provenance,
        }
    }

    /// Set the description, builder-style
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Add an alias, builder-style
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.insert(alias.into());
        self
    }

    /// All surface forms this entity answers to: name plus aliases
    pub fn surface_forms(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.aliases.iter().map(|a| a.as_str()))
    }
}

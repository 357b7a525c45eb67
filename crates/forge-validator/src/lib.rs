//! Forge Validator
//!
//! Structural validation of reconciled entities and relationships before
//! they are committed.
//!
//! The validator provides:
//! - Entity checks (name, kind, description quality)
//! - Relationship checks (strength bounds, endpoint resolution,
//!   self-reference)
//! - Batch aggregation: a pass over a whole set collects every issue
//!   rather than stopping at the first failure
//!
//! Validation is a pure function of its inputs plus the known-entity-id
//! set; it performs no I/O and is idempotent.
//!
//! # Examples
//!
//! ```
//! use forge_validator::{Validator, ValidatorConfig};
//!
//! let validator = Validator::new(ValidatorConfig::default());
//! let report = validator.validate_entities(&[]);
//! assert!(report.is_valid());
//! ```

#![warn(missing_docs)]

mod config;
mod validator;

pub use config::ValidatorConfig;
pub use validator::{Issue, Severity, ValidationReport, Validator};

//! CRM domain model.
//!
//! # Responsibility
//! - Define canonical records for clients, leads, opportunities, tasks,
//!   activities and users.
//! - Keep the persisted JSON shape stable (field and enum names are the wire
//!   names used by existing `crm-data` documents and backups).
//!
//! # Invariants
//! - Every record is identified by an opaque string id assigned by the store.
//! - Write paths call `validate()` before a record enters a collection.

pub mod activity;
pub mod client;
pub mod data;
pub mod lead;
pub mod metrics;
pub mod opportunity;
pub mod task;
pub mod user;

use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Opaque identifier shared by every CRM record.
pub type EntityId = String;

/// Generates a fresh random identifier for a new record.
pub fn new_entity_id() -> EntityId {
    Uuid::new_v4().simple().to_string()
}

/// Collections that own identifiable records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Client,
    Lead,
    Opportunity,
    Task,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Lead => "lead",
            Self::Opportunity => "opportunity",
            Self::Task => "task",
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validation failures for CRM records.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// A required text field is empty or whitespace.
    EmptyField {
        entity: EntityKind,
        field: &'static str,
    },
    /// A 0..=100 field holds a larger value.
    PercentOutOfRange {
        entity: EntityKind,
        field: &'static str,
        value: u8,
    },
    /// A monetary amount is negative or not finite.
    InvalidAmount {
        entity: EntityKind,
        field: &'static str,
        value: f64,
    },
    /// A task links to more than one of client/lead/opportunity.
    MultipleTaskLinks,
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyField { entity, field } => {
                write!(f, "{entity} field `{field}` must not be empty")
            }
            Self::PercentOutOfRange {
                entity,
                field,
                value,
            } => write!(f, "{entity} field `{field}` must be within 0..=100, got {value}"),
            Self::InvalidAmount {
                entity,
                field,
                value,
            } => write!(
                f,
                "{entity} field `{field}` must be a non-negative amount, got {value}"
            ),
            Self::MultipleTaskLinks => write!(
                f,
                "task may link to at most one of client, lead or opportunity"
            ),
        }
    }
}

impl Error for ValidationError {}

pub(crate) fn require_text(
    entity: EntityKind,
    field: &'static str,
    value: &str,
) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyField { entity, field });
    }
    Ok(())
}

pub(crate) fn require_percent(
    entity: EntityKind,
    field: &'static str,
    value: u8,
) -> Result<(), ValidationError> {
    if value > 100 {
        return Err(ValidationError::PercentOutOfRange {
            entity,
            field,
            value,
        });
    }
    Ok(())
}

pub(crate) fn require_amount(
    entity: EntityKind,
    field: &'static str,
    value: f64,
) -> Result<(), ValidationError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ValidationError::InvalidAmount {
            entity,
            field,
            value,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{new_entity_id, require_amount, require_percent, EntityKind, ValidationError};

    #[test]
    fn fresh_ids_are_distinct_and_non_empty() {
        let first = new_entity_id();
        let second = new_entity_id();
        assert!(!first.is_empty());
        assert_ne!(first, second);
    }

    #[test]
    fn percent_above_hundred_is_rejected() {
        let err = require_percent(EntityKind::Lead, "score", 101).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::PercentOutOfRange { value: 101, .. }
        ));
        assert!(require_percent(EntityKind::Lead, "score", 100).is_ok());
    }

    #[test]
    fn nan_and_negative_amounts_are_rejected() {
        assert!(require_amount(EntityKind::Client, "valorTotal", -1.0).is_err());
        assert!(require_amount(EntityKind::Client, "valorTotal", f64::NAN).is_err());
        assert!(require_amount(EntityKind::Client, "valorTotal", 0.0).is_ok());
    }
}

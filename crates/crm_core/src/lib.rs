//! Core domain logic for the CRM.
//! Owns the entity model, the persisted store and every derived view.

pub mod clock;
pub mod db;
pub mod logging;
pub mod model;
pub mod service;
pub mod storage;
pub mod store;

pub use clock::{Clock, FixedClock, SystemClock};
pub use logging::{default_log_level, init_logging, logging_status, LogLevel};
pub use model::activity::{Activity, ActivityKind};
pub use model::client::{Client, ClientPatch, ClientStatus};
pub use model::data::CrmData;
pub use model::lead::{Lead, LeadPatch, LeadSource, LeadStatus};
pub use model::metrics::DashboardMetrics;
pub use model::opportunity::{Opportunity, OpportunityPatch, PipelineStage};
pub use model::task::{Task, TaskPatch, TaskStatus};
pub use model::user::User;
pub use model::{EntityId, EntityKind, ValidationError};
pub use storage::{LocalStorage, MemoryStorage, SqliteLocalStorage, StorageError};
pub use store::{
    ConversionOutcome, CrmStore, ImportSummary, StoreConfig, StoreError, StoreResult,
    DEFAULT_STORAGE_KEY,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}

//! In-memory CRM store mirrored to local storage.
//!
//! # Responsibility
//! - Own every entity collection, the read-only user roster and the derived
//!   dashboard metrics.
//! - Apply create/edit/remove, conversion, stage moves, task completion and
//!   data transfer operations.
//! - Recompute metrics and rewrite the persisted document after each
//!   successful mutation.
//!
//! # Invariants
//! - Operations on unknown ids return `StoreError::NotFound` and change
//!   nothing.
//! - A record failing `validate()` never enters a collection.
//! - A mutation whose document write fails is rolled back; in-memory state
//!   always matches the last successfully persisted document.
//! - Activities are only prepended, never edited or removed (except by
//!   `clear_all`).
//! - The store is single-owner and synchronous; callers sharing it across
//!   threads wrap it in their own lock.

mod activities;
mod clients;
mod document;
mod leads;
mod opportunities;
mod tasks;
mod transfer;
mod views;

pub use document::{ImportSummary, COLLECTION_KEYS};
pub use opportunities::ConversionOutcome;

use crate::clock::{Clock, SystemClock};
use crate::model::client::Client;
use crate::model::data::CrmData;
use crate::model::lead::Lead;
use crate::model::metrics::DashboardMetrics;
use crate::model::opportunity::Opportunity;
use crate::model::task::Task;
use crate::model::user::User;
use crate::model::{new_entity_id, EntityId, EntityKind, ValidationError};
use crate::service::metrics::{compute_metrics, DEFAULT_SALES_TARGET};
use crate::storage::{LocalStorage, StorageError};
use chrono::{DateTime, NaiveDate, Utc};
use document::{ImportDocument, PersistedDocument};
use log::{debug, error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Storage key the working set is mirrored under.
pub const DEFAULT_STORAGE_KEY: &str = "crm-data";

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug)]
pub enum StoreError {
    NotFound { kind: EntityKind, id: EntityId },
    Validation(ValidationError),
    /// Import blob is not a valid CRM document; nothing was applied.
    MalformedImport(String),
    Encode(serde_json::Error),
    Storage(StorageError),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { kind, id } => write!(f, "{kind} not found: {id}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::MalformedImport(details) => write!(f, "malformed import: {details}"),
            Self::Encode(err) => write!(f, "failed to encode CRM document: {err}"),
            Self::Storage(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Encode(err) => Some(err),
            Self::Storage(err) => Some(err),
            Self::NotFound { .. } | Self::MalformedImport(_) => None,
        }
    }
}

impl From<ValidationError> for StoreError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<StorageError> for StoreError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Encode(value)
    }
}

/// Construction-time settings.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub storage_key: String,
    /// Sales target reported on the dashboard.
    pub sales_target: f64,
    /// Read-only sales rep roster.
    pub users: Vec<User>,
    pub clock: Arc<dyn Clock>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            sales_target: DEFAULT_SALES_TARGET,
            users: Vec::new(),
            clock: Arc::new(SystemClock),
        }
    }
}

impl StoreConfig {
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn with_users(mut self, users: Vec<User>) -> Self {
        self.users = users;
        self
    }
}

/// Records addressable by id inside a collection.
pub(crate) trait Record {
    const KIND: EntityKind;

    fn id(&self) -> &str;
    fn set_id(&mut self, id: EntityId);
    fn check(&self) -> Result<(), ValidationError>;
}

macro_rules! impl_record {
    ($ty:ty, $kind:expr) => {
        impl Record for $ty {
            const KIND: EntityKind = $kind;

            fn id(&self) -> &str {
                &self.id
            }

            fn set_id(&mut self, id: EntityId) {
                self.id = id;
            }

            fn check(&self) -> Result<(), ValidationError> {
                self.validate()
            }
        }
    };
}

impl_record!(Client, EntityKind::Client);
impl_record!(Lead, EntityKind::Lead);
impl_record!(Opportunity, EntityKind::Opportunity);
impl_record!(Task, EntityKind::Task);

pub(crate) fn position<T: Record>(items: &[T], id: &str) -> StoreResult<usize> {
    items
        .iter()
        .position(|item| item.id() == id)
        .ok_or_else(|| StoreError::NotFound {
            kind: T::KIND,
            id: id.to_string(),
        })
}

/// Assigns a fresh id and validates a record about to be inserted.
pub(crate) fn admit<T: Record>(mut record: T) -> StoreResult<T> {
    record.set_id(new_entity_id());
    record.check()?;
    Ok(record)
}

/// Merges an edit into a copy and swaps it in only when the result validates.
pub(crate) fn edit_in_place<T: Record + Clone>(
    items: &mut [T],
    id: &str,
    edit: impl FnOnce(&mut T),
) -> StoreResult<()> {
    let index = position(items, id)?;
    let mut merged = items[index].clone();
    edit(&mut merged);
    merged.check()?;
    items[index] = merged;
    Ok(())
}

/// Single source of truth for CRM collections within one session.
pub struct CrmStore<S: LocalStorage> {
    storage: S,
    config: StoreConfig,
    data: CrmData,
    metrics: DashboardMetrics,
}

impl<S: LocalStorage> CrmStore<S> {
    /// Opens the store, reloading any working set persisted under the
    /// configured key.
    ///
    /// A persisted document that does not parse or holds an invalid record
    /// is logged and ignored as a whole; storage failures are returned.
    pub fn open(storage: S, config: StoreConfig) -> StoreResult<Self> {
        let mut store = Self {
            storage,
            config,
            data: CrmData::default(),
            metrics: DashboardMetrics::default(),
        };

        match store.storage.get_item(&store.config.storage_key)? {
            Some(raw) => match ImportDocument::parse(&raw) {
                Ok(document) => {
                    let summary = document.apply_to(&mut store.data);
                    info!(
                        "event=store_load module=store status=ok key={} collections={}",
                        store.config.storage_key,
                        summary.replaced.join(",")
                    );
                }
                Err(err) => warn!(
                    "event=store_load module=store status=error key={} error_code=unreadable_document error={}",
                    store.config.storage_key, err
                ),
            },
            None => info!(
                "event=store_load module=store status=empty key={}",
                store.config.storage_key
            ),
        }

        store.recompute_metrics();
        Ok(store)
    }

    pub fn data(&self) -> &CrmData {
        &self.data
    }

    pub fn clients(&self) -> &[Client] {
        &self.data.clients
    }

    pub fn leads(&self) -> &[Lead] {
        &self.data.leads
    }

    pub fn opportunities(&self) -> &[Opportunity] {
        &self.data.opportunities
    }

    pub fn tasks(&self) -> &[Task] {
        &self.data.tasks
    }

    /// Activity log, newest first.
    pub fn activities(&self) -> &[crate::model::activity::Activity] {
        &self.data.activities
    }

    pub fn users(&self) -> &[User] {
        &self.config.users
    }

    pub fn metrics(&self) -> &DashboardMetrics {
        &self.metrics
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    pub fn client(&self, id: &str) -> Option<&Client> {
        self.data.clients.iter().find(|client| client.id == id)
    }

    pub fn lead(&self, id: &str) -> Option<&Lead> {
        self.data.leads.iter().find(|lead| lead.id == id)
    }

    pub fn opportunity(&self, id: &str) -> Option<&Opportunity> {
        self.data
            .opportunities
            .iter()
            .find(|opportunity| opportunity.id == id)
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.data.tasks.iter().find(|task| task.id == id)
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.config.clock.now()
    }

    pub fn today(&self) -> NaiveDate {
        self.config.clock.today()
    }

    /// Recomputes the dashboard snapshot from the current collections.
    ///
    /// Mutating operations call this automatically.
    pub fn recompute_metrics(&mut self) -> &DashboardMetrics {
        self.metrics = compute_metrics(&self.data, self.config.sales_target, self.now());
        debug!(
            "event=metrics_recompute module=store status=ok pipeline_value={} active_opportunities={}",
            self.metrics.opportunities.pipeline_value, self.metrics.opportunities.active
        );
        &self.metrics
    }

    /// Finishes a mutation: refreshes metrics and rewrites the persisted
    /// document. If the write fails the collections and metrics revert to
    /// `checkpoint`, the state taken before the mutation.
    fn commit(&mut self, checkpoint: CrmData) -> StoreResult<()> {
        self.recompute_metrics();
        if let Err(err) = self.persist() {
            self.data = checkpoint;
            self.recompute_metrics();
            warn!(
                "event=store_rollback module=store status=ok reason=persist_failed key={}",
                self.config.storage_key
            );
            return Err(err);
        }
        Ok(())
    }

    fn persist(&mut self) -> StoreResult<()> {
        let document = PersistedDocument {
            data: &self.data,
            timestamp: self.now(),
        };
        let encoded = serde_json::to_string(&document)?;
        if let Err(err) = self
            .storage
            .set_item(&self.config.storage_key, encoded.as_str())
        {
            error!(
                "event=store_persist module=store status=error key={} bytes={} error={}",
                self.config.storage_key,
                encoded.len(),
                err
            );
            return Err(err.into());
        }
        debug!(
            "event=store_persist module=store status=ok key={} bytes={}",
            self.config.storage_key,
            encoded.len()
        );
        Ok(())
    }
}

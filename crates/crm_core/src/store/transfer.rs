//! Export, import and reset of the working set.

use super::document::{ExportDocument, ImportDocument, ImportSummary, SnapshotDocument};
use super::{CrmStore, StoreError, StoreResult};
use crate::model::data::CrmData;
use crate::storage::LocalStorage;
use log::{error, info};

impl<S: LocalStorage> CrmStore<S> {
    /// Serializes every collection plus `exportDate` as pretty JSON.
    pub fn export_data(&self) -> StoreResult<String> {
        let document = ExportDocument {
            data: &self.data,
            export_date: self.now(),
        };
        let encoded = serde_json::to_string_pretty(&document)?;

        info!(
            "event=data_export module=store status=ok bytes={}",
            encoded.len()
        );
        Ok(encoded)
    }

    /// Download name for an export taken today.
    pub fn export_file_name(&self) -> String {
        format!("crm-backup-{}.json", self.today().format("%Y-%m-%d"))
    }

    /// Replaces each collection present in `blob`.
    ///
    /// The whole blob is parsed and validated first; on failure nothing is
    /// applied and `StoreError::MalformedImport` is returned.
    pub fn import_data(&mut self, blob: &str) -> StoreResult<ImportSummary> {
        let document = match ImportDocument::parse(blob) {
            Ok(document) => document,
            Err(details) => {
                error!(
                    "event=data_import module=store status=error error_code=malformed_import error={details}"
                );
                return Err(StoreError::MalformedImport(details));
            }
        };

        let checkpoint = self.data.clone();
        let summary = document.apply_to(&mut self.data);
        self.commit(checkpoint)?;

        info!(
            "event=data_import module=store status=ok collections={}",
            summary.replaced.join(",")
        );
        Ok(summary)
    }

    /// Empties every collection and erases the persisted document. The user
    /// roster is kept.
    pub fn clear_all(&mut self) -> StoreResult<()> {
        self.storage.remove_item(&self.config.storage_key)?;
        self.data = CrmData::default();
        self.recompute_metrics();

        info!(
            "event=data_clear module=store status=ok key={}",
            self.config.storage_key
        );
        Ok(())
    }

    /// Collections, users and current metrics as one JSON document.
    pub fn snapshot_json(&self) -> StoreResult<String> {
        let document = SnapshotDocument {
            data: &self.data,
            users: &self.config.users,
            metrics: &self.metrics,
        };
        Ok(serde_json::to_string(&document)?)
    }
}

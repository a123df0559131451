//! JSON document shapes for persistence, export and import.
//!
//! # Invariants
//! - Persisted and exported documents carry the five collections under their
//!   wire keys plus one timestamp field (`timestamp` / `exportDate`).
//! - Import treats every collection key as optional and ignores unknown keys.

use crate::model::activity::Activity;
use crate::model::client::Client;
use crate::model::data::CrmData;
use crate::model::lead::Lead;
use crate::model::metrics::DashboardMetrics;
use crate::model::opportunity::Opportunity;
use crate::model::task::Task;
use crate::model::user::User;
use crate::model::ValidationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Collection keys in document order.
pub const COLLECTION_KEYS: [&str; 5] = [
    "clientes",
    "leads",
    "oportunidades",
    "tarefas",
    "atividades",
];

#[derive(Serialize)]
pub(crate) struct PersistedDocument<'a> {
    #[serde(flatten)]
    pub data: &'a CrmData,
    pub timestamp: DateTime<Utc>,
}

#[derive(Serialize)]
pub(crate) struct ExportDocument<'a> {
    #[serde(flatten)]
    pub data: &'a CrmData,
    #[serde(rename = "exportDate")]
    pub export_date: DateTime<Utc>,
}

/// Full read model handed to UI shells.
#[derive(Serialize)]
pub(crate) struct SnapshotDocument<'a> {
    #[serde(flatten)]
    pub data: &'a CrmData,
    #[serde(rename = "usuarios")]
    pub users: &'a [User],
    pub metrics: &'a DashboardMetrics,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ImportDocument {
    #[serde(rename = "clientes")]
    pub clients: Option<Vec<Client>>,
    pub leads: Option<Vec<Lead>>,
    #[serde(rename = "oportunidades")]
    pub opportunities: Option<Vec<Opportunity>>,
    #[serde(rename = "tarefas")]
    pub tasks: Option<Vec<Task>>,
    #[serde(rename = "atividades")]
    pub activities: Option<Vec<Activity>>,
}

/// Which collections an import (or startup load) replaced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub replaced: Vec<&'static str>,
}

impl ImportSummary {
    pub fn contains(&self, key: &str) -> bool {
        self.replaced.iter().any(|replaced| *replaced == key)
    }

    pub fn is_empty(&self) -> bool {
        self.replaced.is_empty()
    }
}

impl ImportDocument {
    /// Parses `raw` and validates every record it carries.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let document = serde_json::from_str::<Self>(raw).map_err(|err| err.to_string())?;
        document.validate()?;
        Ok(document)
    }

    /// Checks every record of every present collection.
    pub fn validate(&self) -> Result<(), String> {
        fn check<T>(
            key: &str,
            items: &Option<Vec<T>>,
            id: impl Fn(&T) -> &str,
            validate: impl Fn(&T) -> Result<(), ValidationError>,
        ) -> Result<(), String> {
            for item in items.iter().flatten() {
                validate(item).map_err(|err| format!("{key} `{}`: {err}", id(item)))?;
            }
            Ok(())
        }

        check("clientes", &self.clients, |c| c.id.as_str(), Client::validate)?;
        check("leads", &self.leads, |l| l.id.as_str(), Lead::validate)?;
        check(
            "oportunidades",
            &self.opportunities,
            |o| o.id.as_str(),
            Opportunity::validate,
        )?;
        check("tarefas", &self.tasks, |t| t.id.as_str(), Task::validate)?;
        Ok(())
    }

    /// Replaces each present collection; absent ones are left untouched.
    pub fn apply_to(self, data: &mut CrmData) -> ImportSummary {
        let mut summary = ImportSummary::default();
        if let Some(clients) = self.clients {
            data.clients = clients;
            summary.replaced.push(COLLECTION_KEYS[0]);
        }
        if let Some(leads) = self.leads {
            data.leads = leads;
            summary.replaced.push(COLLECTION_KEYS[1]);
        }
        if let Some(opportunities) = self.opportunities {
            data.opportunities = opportunities;
            summary.replaced.push(COLLECTION_KEYS[2]);
        }
        if let Some(tasks) = self.tasks {
            data.tasks = tasks;
            summary.replaced.push(COLLECTION_KEYS[3]);
        }
        if let Some(activities) = self.activities {
            data.activities = activities;
            summary.replaced.push(COLLECTION_KEYS[4]);
        }
        summary
    }
}

//! Client domain model.
//!
//! # Responsibility
//! - Define the client record and its partial-update patch.
//!
//! # Invariants
//! - `name` is never blank once stored.
//! - `total_value` is a finite, non-negative amount.

use super::{require_amount, require_text, EntityId, EntityKind, ValidationError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Tag attached to clients synthesized from a converted lead.
pub const LEAD_CONVERTED_TAG: &str = "convertido-lead";

/// Relationship state of a client account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClientStatus {
    #[serde(rename = "ativo")]
    Active,
    #[serde(rename = "inativo")]
    Inactive,
    #[serde(rename = "prospecto")]
    Prospect,
}

/// Postal address of a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    #[serde(rename = "rua")]
    pub street: String,
    #[serde(rename = "cidade")]
    pub city: String,
    #[serde(rename = "estado")]
    pub state: String,
    #[serde(rename = "cep")]
    pub postal_code: String,
}

/// Canonical client record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    /// Empty until the store assigns one on add.
    #[serde(default)]
    pub id: EntityId,
    #[serde(rename = "nome")]
    pub name: String,
    pub email: String,
    #[serde(rename = "telefone")]
    pub phone: String,
    #[serde(rename = "empresa")]
    pub company: String,
    #[serde(rename = "cargo", default, skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,
    #[serde(rename = "endereco", default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    pub status: ClientStatus,
    /// Running total of business closed with this client.
    #[serde(rename = "valorTotal")]
    pub total_value: f64,
    #[serde(rename = "dataUltimoContato")]
    pub last_contact_date: NaiveDate,
    #[serde(rename = "dataCadastro")]
    pub registered_on: NaiveDate,
    /// Free-text acquisition channel.
    #[serde(rename = "origem")]
    pub source: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(rename = "observacoes", default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Client {
    /// Creates an unsaved client registered and contacted on `today`.
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        company: impl Into<String>,
        today: NaiveDate,
    ) -> Self {
        Self {
            id: EntityId::new(),
            name: name.into(),
            email: email.into(),
            phone: String::new(),
            company: company.into(),
            job_title: None,
            address: None,
            status: ClientStatus::Prospect,
            total_value: 0.0,
            last_contact_date: today,
            registered_on: today,
            source: String::new(),
            tags: Vec::new(),
            notes: None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text(EntityKind::Client, "nome", &self.name)?;
        require_amount(EntityKind::Client, "valorTotal", self.total_value)?;
        Ok(())
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|value| value == tag)
    }
}

/// Partial update for a client. Present fields overwrite, absent ones are kept;
/// `null` clears an optional field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientPatch {
    #[serde(rename = "nome")]
    pub name: Option<String>,
    pub email: Option<String>,
    #[serde(rename = "telefone")]
    pub phone: Option<String>,
    #[serde(rename = "empresa")]
    pub company: Option<String>,
    #[serde(
        rename = "cargo",
        default,
        with = "::serde_with::rust::double_option"
    )]
    pub job_title: Option<Option<String>>,
    #[serde(
        rename = "endereco",
        default,
        with = "::serde_with::rust::double_option"
    )]
    pub address: Option<Option<Address>>,
    pub status: Option<ClientStatus>,
    #[serde(rename = "valorTotal")]
    pub total_value: Option<f64>,
    #[serde(rename = "dataUltimoContato")]
    pub last_contact_date: Option<NaiveDate>,
    #[serde(rename = "dataCadastro")]
    pub registered_on: Option<NaiveDate>,
    #[serde(rename = "origem")]
    pub source: Option<String>,
    pub tags: Option<Vec<String>>,
    #[serde(
        rename = "observacoes",
        default,
        with = "::serde_with::rust::double_option"
    )]
    pub notes: Option<Option<String>>,
}

impl ClientPatch {
    pub fn apply_to(self, client: &mut Client) {
        if let Some(value) = self.name {
            client.name = value;
        }
        if let Some(value) = self.email {
            client.email = value;
        }
        if let Some(value) = self.phone {
            client.phone = value;
        }
        if let Some(value) = self.company {
            client.company = value;
        }
        if let Some(value) = self.job_title {
            client.job_title = value;
        }
        if let Some(value) = self.address {
            client.address = value;
        }
        if let Some(value) = self.status {
            client.status = value;
        }
        if let Some(value) = self.total_value {
            client.total_value = value;
        }
        if let Some(value) = self.last_contact_date {
            client.last_contact_date = value;
        }
        if let Some(value) = self.registered_on {
            client.registered_on = value;
        }
        if let Some(value) = self.source {
            client.source = value;
        }
        if let Some(value) = self.tags {
            client.tags = value;
        }
        if let Some(value) = self.notes {
            client.notes = value;
        }
    }
}

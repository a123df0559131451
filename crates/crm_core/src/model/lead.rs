//! Lead domain model.
//!
//! # Invariants
//! - `score` stays within 0..=100.
//! - A lead with status `Converted` is referenced by at least one
//!   opportunity's `lead_id` when it was converted through the store.

use super::{require_amount, require_percent, require_text, EntityId, EntityKind, ValidationError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Channel a lead was captured from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LeadSource {
    #[serde(rename = "website")]
    Website,
    #[serde(rename = "linkedin")]
    Linkedin,
    #[serde(rename = "indicacao")]
    Referral,
    #[serde(rename = "evento")]
    Event,
    #[serde(rename = "cold-email")]
    ColdEmail,
    #[serde(rename = "outro")]
    Other,
}

impl LeadSource {
    /// Wire name, also used as the free-text origin of converted clients.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Website => "website",
            Self::Linkedin => "linkedin",
            Self::Referral => "indicacao",
            Self::Event => "evento",
            Self::ColdEmail => "cold-email",
            Self::Other => "outro",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LeadStatus {
    #[serde(rename = "novo")]
    New,
    #[serde(rename = "contactado")]
    Contacted,
    #[serde(rename = "qualificado")]
    Qualified,
    #[serde(rename = "desqualificado")]
    Disqualified,
    #[serde(rename = "convertido")]
    Converted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InterestLevel {
    #[serde(rename = "baixo")]
    Low,
    #[serde(rename = "medio")]
    Medium,
    #[serde(rename = "alto")]
    High,
}

/// Canonical lead record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    #[serde(default)]
    pub id: EntityId,
    #[serde(rename = "nome")]
    pub name: String,
    pub email: String,
    #[serde(rename = "telefone")]
    pub phone: String,
    #[serde(rename = "empresa", default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(rename = "cargo", default, skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,
    #[serde(rename = "origem")]
    pub source: LeadSource,
    pub status: LeadStatus,
    /// Manual quality heuristic, 0..=100.
    pub score: u8,
    #[serde(rename = "interesseNivel")]
    pub interest: InterestLevel,
    #[serde(rename = "valorPotencial")]
    pub potential_value: f64,
    #[serde(rename = "dataCaptura")]
    pub captured_on: NaiveDate,
    #[serde(
        rename = "dataUltimoContato",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub last_contact_date: Option<NaiveDate>,
    #[serde(
        rename = "proximoContato",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub next_contact_date: Option<NaiveDate>,
    #[serde(rename = "observacoes", default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Owning sales rep.
    #[serde(rename = "responsavel")]
    pub owner: String,
}

impl Lead {
    /// Creates an unsaved `New` lead captured on `today`.
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        source: LeadSource,
        owner: impl Into<String>,
        today: NaiveDate,
    ) -> Self {
        Self {
            id: EntityId::new(),
            name: name.into(),
            email: email.into(),
            phone: String::new(),
            company: None,
            job_title: None,
            source,
            status: LeadStatus::New,
            score: 0,
            interest: InterestLevel::Medium,
            potential_value: 0.0,
            captured_on: today,
            last_contact_date: None,
            next_contact_date: None,
            notes: None,
            owner: owner.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text(EntityKind::Lead, "nome", &self.name)?;
        require_percent(EntityKind::Lead, "score", self.score)?;
        require_amount(EntityKind::Lead, "valorPotencial", self.potential_value)?;
        Ok(())
    }

    pub fn is_converted(&self) -> bool {
        self.status == LeadStatus::Converted
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeadPatch {
    #[serde(rename = "nome")]
    pub name: Option<String>,
    pub email: Option<String>,
    #[serde(rename = "telefone")]
    pub phone: Option<String>,
    #[serde(
        rename = "empresa",
        default,
        with = "::serde_with::rust::double_option"
    )]
    pub company: Option<Option<String>>,
    #[serde(
        rename = "cargo",
        default,
        with = "::serde_with::rust::double_option"
    )]
    pub job_title: Option<Option<String>>,
    #[serde(rename = "origem")]
    pub source: Option<LeadSource>,
    pub status: Option<LeadStatus>,
    pub score: Option<u8>,
    #[serde(rename = "interesseNivel")]
    pub interest: Option<InterestLevel>,
    #[serde(rename = "valorPotencial")]
    pub potential_value: Option<f64>,
    #[serde(rename = "dataCaptura")]
    pub captured_on: Option<NaiveDate>,
    #[serde(
        rename = "dataUltimoContato",
        default,
        with = "::serde_with::rust::double_option"
    )]
    pub last_contact_date: Option<Option<NaiveDate>>,
    #[serde(
        rename = "proximoContato",
        default,
        with = "::serde_with::rust::double_option"
    )]
    pub next_contact_date: Option<Option<NaiveDate>>,
    #[serde(
        rename = "observacoes",
        default,
        with = "::serde_with::rust::double_option"
    )]
    pub notes: Option<Option<String>>,
    #[serde(rename = "responsavel")]
    pub owner: Option<String>,
}

impl LeadPatch {
    /// Patch that only flips the lead status.
    pub fn status(status: LeadStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn apply_to(self, lead: &mut Lead) {
        if let Some(value) = self.name {
            lead.name = value;
        }
        if let Some(value) = self.email {
            lead.email = value;
        }
        if let Some(value) = self.phone {
            lead.phone = value;
        }
        if let Some(value) = self.company {
            lead.company = value;
        }
        if let Some(value) = self.job_title {
            lead.job_title = value;
        }
        if let Some(value) = self.source {
            lead.source = value;
        }
        if let Some(value) = self.status {
            lead.status = value;
        }
        if let Some(value) = self.score {
            lead.score = value;
        }
        if let Some(value) = self.interest {
            lead.interest = value;
        }
        if let Some(value) = self.potential_value {
            lead.potential_value = value;
        }
        if let Some(value) = self.captured_on {
            lead.captured_on = value;
        }
        if let Some(value) = self.last_contact_date {
            lead.last_contact_date = value;
        }
        if let Some(value) = self.next_contact_date {
            lead.next_contact_date = value;
        }
        if let Some(value) = self.notes {
            lead.notes = value;
        }
        if let Some(value) = self.owner {
            lead.owner = value;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Lead, LeadPatch, LeadSource, LeadStatus};
    use chrono::NaiveDate;

    fn lead() -> Lead {
        Lead::new(
            "Carla",
            "carla@example.com",
            LeadSource::ColdEmail,
            "Ana Santos",
            NaiveDate::from_ymd_opt(2024, 1, 10).expect("valid date"),
        )
    }

    #[test]
    fn enum_values_use_wire_names() {
        let value = serde_json::to_value(lead()).expect("serialize lead");
        assert_eq!(value["origem"], "cold-email");
        assert_eq!(value["status"], "novo");
        assert_eq!(value["interesseNivel"], "medio");
        assert_eq!(value["responsavel"], "Ana Santos");
    }

    #[test]
    fn score_over_hundred_fails_validation() {
        let mut lead = lead();
        lead.score = 120;
        assert!(lead.validate().is_err());
    }

    #[test]
    fn status_patch_keeps_other_fields() {
        let mut lead = lead();
        LeadPatch::status(LeadStatus::Converted).apply_to(&mut lead);
        assert!(lead.is_converted());
        assert_eq!(lead.name, "Carla");
    }
}

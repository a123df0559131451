//! Opportunity domain model and pipeline stages.
//!
//! # Responsibility
//! - Define the opportunity record, its patch and the seven ordered pipeline
//!   stages.
//!
//! # Invariants
//! - `stage` is always one of the seven `PipelineStage` values.
//! - `Won` and `Lost` are terminal: they never count as active pipeline.
//! - Stage transitions are not constrained; any stage may follow any other.

use super::{require_amount, require_percent, require_text, EntityId, EntityKind, ValidationError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Sales pipeline stage, declared in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PipelineStage {
    #[serde(rename = "prospeccao")]
    Prospecting,
    #[serde(rename = "qualificacao")]
    Qualification,
    #[serde(rename = "proposta")]
    Proposal,
    #[serde(rename = "negociacao")]
    Negotiation,
    #[serde(rename = "fechamento")]
    Closing,
    #[serde(rename = "ganho")]
    Won,
    #[serde(rename = "perdido")]
    Lost,
}

impl PipelineStage {
    pub const ALL: [PipelineStage; 7] = [
        Self::Prospecting,
        Self::Qualification,
        Self::Proposal,
        Self::Negotiation,
        Self::Closing,
        Self::Won,
        Self::Lost,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Prospecting => "prospeccao",
            Self::Qualification => "qualificacao",
            Self::Proposal => "proposta",
            Self::Negotiation => "negociacao",
            Self::Closing => "fechamento",
            Self::Won => "ganho",
            Self::Lost => "perdido",
        }
    }

    /// Display label shown on pipeline boards.
    pub fn label(self) -> &'static str {
        match self {
            Self::Prospecting => "Prospecção",
            Self::Qualification => "Qualificação",
            Self::Proposal => "Proposta",
            Self::Negotiation => "Negociação",
            Self::Closing => "Fechamento",
            Self::Won => "Ganho",
            Self::Lost => "Perdido",
        }
    }

    /// 1-based position in the pipeline.
    pub fn order(self) -> u8 {
        match self {
            Self::Prospecting => 1,
            Self::Qualification => 2,
            Self::Proposal => 3,
            Self::Negotiation => 4,
            Self::Closing => 5,
            Self::Won => 6,
            Self::Lost => 7,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }
}

impl Display for PipelineStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a stage name does not match any pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStage(pub String);

impl Display for UnknownStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown pipeline stage `{}`", self.0)
    }
}

impl Error for UnknownStage {}

impl FromStr for PipelineStage {
    type Err = UnknownStage;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim();
        Self::ALL
            .into_iter()
            .find(|stage| stage.as_str() == normalized)
            .ok_or_else(|| UnknownStage(normalized.to_string()))
    }
}

/// Canonical opportunity record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opportunity {
    #[serde(default)]
    pub id: EntityId,
    /// Owning client. Blank only in conversion input, where the store
    /// synthesizes a client from the lead.
    #[serde(rename = "clienteId", default)]
    pub client_id: EntityId,
    #[serde(rename = "leadId", default, skip_serializing_if = "Option::is_none")]
    pub lead_id: Option<EntityId>,
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "descricao", default)]
    pub description: String,
    #[serde(rename = "valor")]
    pub value: f64,
    /// Win probability, 0..=100.
    #[serde(rename = "probabilidade")]
    pub probability: u8,
    #[serde(rename = "estagio")]
    pub stage: PipelineStage,
    #[serde(rename = "dataInicio")]
    pub start_date: NaiveDate,
    #[serde(rename = "dataFechamentoPrevista")]
    pub expected_close_date: NaiveDate,
    #[serde(
        rename = "dataFechamentoReal",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub actual_close_date: Option<NaiveDate>,
    #[serde(rename = "responsavel")]
    pub owner: String,
    #[serde(rename = "origem", default)]
    pub source: String,
    #[serde(
        rename = "concorrentes",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub competitors: Option<Vec<String>>,
    #[serde(rename = "proximaAcao", default, skip_serializing_if = "Option::is_none")]
    pub next_action: Option<String>,
    #[serde(
        rename = "dataProximaAcao",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub next_action_date: Option<NaiveDate>,
    #[serde(rename = "observacoes", default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Opportunity {
    /// Creates an unsaved opportunity in `Prospecting` starting on `today`.
    pub fn new(
        client_id: impl Into<EntityId>,
        title: impl Into<String>,
        value: f64,
        owner: impl Into<String>,
        today: NaiveDate,
        expected_close_date: NaiveDate,
    ) -> Self {
        Self {
            id: EntityId::new(),
            client_id: client_id.into(),
            lead_id: None,
            title: title.into(),
            description: String::new(),
            value,
            probability: 10,
            stage: PipelineStage::Prospecting,
            start_date: today,
            expected_close_date,
            actual_close_date: None,
            owner: owner.into(),
            source: String::new(),
            competitors: None,
            next_action: None,
            next_action_date: None,
            notes: None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text(EntityKind::Opportunity, "titulo", &self.title)?;
        require_text(EntityKind::Opportunity, "clienteId", &self.client_id)?;
        require_amount(EntityKind::Opportunity, "valor", self.value)?;
        require_percent(EntityKind::Opportunity, "probabilidade", self.probability)?;
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        !self.stage.is_terminal()
    }

    pub fn has_client(&self) -> bool {
        !self.client_id.trim().is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpportunityPatch {
    #[serde(rename = "clienteId")]
    pub client_id: Option<EntityId>,
    #[serde(
        rename = "leadId",
        default,
        with = "::serde_with::rust::double_option"
    )]
    pub lead_id: Option<Option<EntityId>>,
    #[serde(rename = "titulo")]
    pub title: Option<String>,
    #[serde(rename = "descricao")]
    pub description: Option<String>,
    #[serde(rename = "valor")]
    pub value: Option<f64>,
    #[serde(rename = "probabilidade")]
    pub probability: Option<u8>,
    #[serde(rename = "estagio")]
    pub stage: Option<PipelineStage>,
    #[serde(rename = "dataInicio")]
    pub start_date: Option<NaiveDate>,
    #[serde(rename = "dataFechamentoPrevista")]
    pub expected_close_date: Option<NaiveDate>,
    #[serde(
        rename = "dataFechamentoReal",
        default,
        with = "::serde_with::rust::double_option"
    )]
    pub actual_close_date: Option<Option<NaiveDate>>,
    #[serde(rename = "responsavel")]
    pub owner: Option<String>,
    #[serde(rename = "origem")]
    pub source: Option<String>,
    #[serde(
        rename = "concorrentes",
        default,
        with = "::serde_with::rust::double_option"
    )]
    pub competitors: Option<Option<Vec<String>>>,
    #[serde(
        rename = "proximaAcao",
        default,
        with = "::serde_with::rust::double_option"
    )]
    pub next_action: Option<Option<String>>,
    #[serde(
        rename = "dataProximaAcao",
        default,
        with = "::serde_with::rust::double_option"
    )]
    pub next_action_date: Option<Option<NaiveDate>>,
    #[serde(
        rename = "observacoes",
        default,
        with = "::serde_with::rust::double_option"
    )]
    pub notes: Option<Option<String>>,
}

impl OpportunityPatch {
    pub fn apply_to(self, opportunity: &mut Opportunity) {
        if let Some(value) = self.client_id {
            opportunity.client_id = value;
        }
        if let Some(value) = self.lead_id {
            opportunity.lead_id = value;
        }
        if let Some(value) = self.title {
            opportunity.title = value;
        }
        if let Some(value) = self.description {
            opportunity.description = value;
        }
        if let Some(value) = self.value {
            opportunity.value = value;
        }
        if let Some(value) = self.probability {
            opportunity.probability = value;
        }
        if let Some(value) = self.stage {
            opportunity.stage = value;
        }
        if let Some(value) = self.start_date {
            opportunity.start_date = value;
        }
        if let Some(value) = self.expected_close_date {
            opportunity.expected_close_date = value;
        }
        if let Some(value) = self.actual_close_date {
            opportunity.actual_close_date = value;
        }
        if let Some(value) = self.owner {
            opportunity.owner = value;
        }
        if let Some(value) = self.source {
            opportunity.source = value;
        }
        if let Some(value) = self.competitors {
            opportunity.competitors = value;
        }
        if let Some(value) = self.next_action {
            opportunity.next_action = value;
        }
        if let Some(value) = self.next_action_date {
            opportunity.next_action_date = value;
        }
        if let Some(value) = self.notes {
            opportunity.notes = value;
        }
    }
}

//! Activity log records.
//!
//! Activities are append-only: the store never edits or removes one except
//! when the whole working set is cleared.

use super::EntityId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User name recorded for activities the store emits on its own.
pub const SYSTEM_USER: &str = "Sistema";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivityKind {
    #[serde(rename = "cliente_criado")]
    ClientCreated,
    #[serde(rename = "lead_criado")]
    LeadCreated,
    #[serde(rename = "oportunidade_criada")]
    OpportunityCreated,
    #[serde(rename = "tarefa_criada")]
    TaskCreated,
    #[serde(rename = "ligacao_realizada")]
    CallMade,
    #[serde(rename = "email_enviado")]
    EmailSent,
    #[serde(rename = "reuniao_agendada")]
    MeetingScheduled,
    #[serde(rename = "proposta_enviada")]
    ProposalSent,
    #[serde(rename = "negocio_fechado")]
    DealClosed,
    #[serde(rename = "negocio_perdido")]
    DealLost,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    #[serde(default)]
    pub id: EntityId,
    #[serde(rename = "tipo")]
    pub kind: ActivityKind,
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "descricao")]
    pub description: String,
    #[serde(rename = "data")]
    pub occurred_at: DateTime<Utc>,
    #[serde(rename = "usuario")]
    pub user: String,
    #[serde(rename = "clienteId", default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<EntityId>,
    #[serde(rename = "leadId", default, skip_serializing_if = "Option::is_none")]
    pub lead_id: Option<EntityId>,
    #[serde(
        rename = "oportunidadeId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub opportunity_id: Option<EntityId>,
    #[serde(rename = "tarefaId", default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<EntityId>,
}

impl Activity {
    /// Creates an unsaved activity with no entity references.
    pub fn new(
        kind: ActivityKind,
        title: impl Into<String>,
        description: impl Into<String>,
        user: impl Into<String>,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: EntityId::new(),
            kind,
            title: title.into(),
            description: description.into(),
            occurred_at,
            user: user.into(),
            client_id: None,
            lead_id: None,
            opportunity_id: None,
            task_id: None,
        }
    }

    pub fn with_client(mut self, id: impl Into<EntityId>) -> Self {
        self.client_id = Some(id.into());
        self
    }

    pub fn with_lead(mut self, id: impl Into<EntityId>) -> Self {
        self.lead_id = Some(id.into());
        self
    }

    pub fn with_opportunity(mut self, id: impl Into<EntityId>) -> Self {
        self.opportunity_id = Some(id.into());
        self
    }

    pub fn with_task(mut self, id: impl Into<EntityId>) -> Self {
        self.task_id = Some(id.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::{Activity, ActivityKind};
    use chrono::{TimeZone, Utc};

    #[test]
    fn timestamp_roundtrips_as_rfc3339() {
        let at = Utc
            .with_ymd_and_hms(2024, 1, 15, 10, 30, 0)
            .single()
            .expect("valid timestamp");
        let activity = Activity::new(ActivityKind::DealClosed, "Closed", "", "Ana", at)
            .with_opportunity("o1");
        let value = serde_json::to_value(&activity).expect("serialize activity");
        assert_eq!(value["tipo"], "negocio_fechado");
        assert_eq!(value["oportunidadeId"], "o1");
        assert_eq!(value["data"], "2024-01-15T10:30:00Z");

        let parsed: Activity = serde_json::from_value(value).expect("parse activity");
        assert_eq!(parsed, activity);
    }
}

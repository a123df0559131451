//! Task domain model.
//!
//! # Invariants
//! - A task links to at most one of client, lead or opportunity.
//! - `completed_on` is stamped by the store when a task is completed.

use super::{require_text, EntityId, EntityKind, ValidationError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskKind {
    #[serde(rename = "ligacao")]
    Call,
    #[serde(rename = "email")]
    Email,
    #[serde(rename = "reuniao")]
    Meeting,
    #[serde(rename = "apresentacao")]
    Presentation,
    #[serde(rename = "follow-up")]
    FollowUp,
    #[serde(rename = "proposta")]
    Proposal,
    #[serde(rename = "outro")]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TaskPriority {
    #[serde(rename = "baixa")]
    Low,
    #[serde(rename = "media")]
    Medium,
    #[serde(rename = "alta")]
    High,
    #[serde(rename = "urgente")]
    Urgent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    #[serde(rename = "pendente")]
    Pending,
    #[serde(rename = "em-andamento")]
    InProgress,
    #[serde(rename = "concluida")]
    Done,
    #[serde(rename = "cancelada")]
    Cancelled,
}

/// Record a task is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskLink<'a> {
    Client(&'a str),
    Lead(&'a str),
    Opportunity(&'a str),
}

/// Canonical task record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    #[serde(default)]
    pub id: EntityId,
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "descricao", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "tipo")]
    pub kind: TaskKind,
    #[serde(rename = "prioridade")]
    pub priority: TaskPriority,
    pub status: TaskStatus,
    #[serde(rename = "dataVencimento")]
    pub due_date: NaiveDate,
    #[serde(rename = "dataCriacao")]
    pub created_on: NaiveDate,
    #[serde(rename = "dataConclusao", default, skip_serializing_if = "Option::is_none")]
    pub completed_on: Option<NaiveDate>,
    #[serde(rename = "responsavel")]
    pub owner: String,
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
    #[serde(rename = "tempoEstimado", default, skip_serializing_if = "Option::is_none")]
    pub estimated_minutes: Option<u32>,
    #[serde(rename = "resultado", default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(rename = "observacoes", default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Task {
    /// Creates an unsaved pending task created on `today`.
    pub fn new(
        title: impl Into<String>,
        kind: TaskKind,
        owner: impl Into<String>,
        due_date: NaiveDate,
        today: NaiveDate,
    ) -> Self {
        Self {
            id: EntityId::new(),
            title: title.into(),
            description: None,
            kind,
            priority: TaskPriority::Medium,
            status: TaskStatus::Pending,
            due_date,
            created_on: today,
            completed_on: None,
            owner: owner.into(),
            client_id: None,
            lead_id: None,
            opportunity_id: None,
            estimated_minutes: None,
            result: None,
            notes: None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text(EntityKind::Task, "titulo", &self.title)?;
        let links = [
            self.client_id.is_some(),
            self.lead_id.is_some(),
            self.opportunity_id.is_some(),
        ];
        if links.iter().filter(|linked| **linked).count() > 1 {
            return Err(ValidationError::MultipleTaskLinks);
        }
        Ok(())
    }

    /// Returns the single linked record, if any.
    pub fn link(&self) -> Option<TaskLink<'_>> {
        if let Some(id) = self.client_id.as_deref() {
            return Some(TaskLink::Client(id));
        }
        if let Some(id) = self.lead_id.as_deref() {
            return Some(TaskLink::Lead(id));
        }
        self.opportunity_id.as_deref().map(TaskLink::Opportunity)
    }

    pub fn is_pending(&self) -> bool {
        self.status == TaskStatus::Pending
    }

    /// Pending and due strictly before `today`.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.is_pending() && self.due_date < today
    }
}

/// Partial task update. For nullable fields an absent key keeps the value
/// and an explicit `null` clears it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskPatch {
    #[serde(rename = "titulo")]
    pub title: Option<String>,
    #[serde(
        rename = "descricao",
        default,
        with = "::serde_with::rust::double_option"
    )]
    pub description: Option<Option<String>>,
    #[serde(rename = "tipo")]
    pub kind: Option<TaskKind>,
    #[serde(rename = "prioridade")]
    pub priority: Option<TaskPriority>,
    pub status: Option<TaskStatus>,
    #[serde(rename = "dataVencimento")]
    pub due_date: Option<NaiveDate>,
    #[serde(rename = "dataCriacao")]
    pub created_on: Option<NaiveDate>,
    #[serde(
        rename = "dataConclusao",
        default,
        with = "::serde_with::rust::double_option"
    )]
    pub completed_on: Option<Option<NaiveDate>>,
    #[serde(rename = "responsavel")]
    pub owner: Option<String>,
    #[serde(
        rename = "clienteId",
        default,
        with = "::serde_with::rust::double_option"
    )]
    pub client_id: Option<Option<EntityId>>,
    #[serde(
        rename = "leadId",
        default,
        with = "::serde_with::rust::double_option"
    )]
    pub lead_id: Option<Option<EntityId>>,
    #[serde(
        rename = "oportunidadeId",
        default,
        with = "::serde_with::rust::double_option"
    )]
    pub opportunity_id: Option<Option<EntityId>>,
    #[serde(
        rename = "tempoEstimado",
        default,
        with = "::serde_with::rust::double_option"
    )]
    pub estimated_minutes: Option<Option<u32>>,
    #[serde(
        rename = "resultado",
        default,
        with = "::serde_with::rust::double_option"
    )]
    pub result: Option<Option<String>>,
    #[serde(
        rename = "observacoes",
        default,
        with = "::serde_with::rust::double_option"
    )]
    pub notes: Option<Option<String>>,
}

impl TaskPatch {
    /// Whether the patch points the task at a client, lead or opportunity.
    /// Such a patch replaces the whole link; unnamed references are cleared.
    pub fn sets_link(&self) -> bool {
        [&self.client_id, &self.lead_id, &self.opportunity_id]
            .into_iter()
            .any(|reference| matches!(reference, Some(Some(_))))
    }

    pub fn apply_to(self, task: &mut Task) {
        let sets_link = self.sets_link();
        if let Some(value) = self.title {
            task.title = value;
        }
        if let Some(value) = self.description {
            task.description = value;
        }
        if let Some(value) = self.kind {
            task.kind = value;
        }
        if let Some(value) = self.priority {
            task.priority = value;
        }
        if let Some(value) = self.status {
            task.status = value;
        }
        if let Some(value) = self.due_date {
            task.due_date = value;
        }
        if let Some(value) = self.created_on {
            task.created_on = value;
        }
        if let Some(value) = self.completed_on {
            task.completed_on = value;
        }
        if let Some(value) = self.owner {
            task.owner = value;
        }
        if sets_link {
            task.client_id = self.client_id.flatten();
            task.lead_id = self.lead_id.flatten();
            task.opportunity_id = self.opportunity_id.flatten();
        } else {
            if let Some(value) = self.client_id {
                task.client_id = value;
            }
            if let Some(value) = self.lead_id {
                task.lead_id = value;
            }
            if let Some(value) = self.opportunity_id {
                task.opportunity_id = value;
            }
        }
        if let Some(value) = self.estimated_minutes {
            task.estimated_minutes = value;
        }
        if let Some(value) = self.result {
            task.result = value;
        }
        if let Some(value) = self.notes {
            task.notes = value;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Task, TaskKind, TaskLink, TaskPatch, TaskStatus};
    use crate::model::ValidationError;
    use chrono::NaiveDate;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).expect("valid date")
    }

    fn task() -> Task {
        Task::new("Call back", TaskKind::Call, "Ana Santos", date(20), date(15))
    }

    #[test]
    fn two_links_fail_validation() {
        let mut task = task();
        task.client_id = Some("c1".to_string());
        task.lead_id = Some("l1".to_string());
        assert_eq!(task.validate(), Err(ValidationError::MultipleTaskLinks));
    }

    #[test]
    fn single_link_is_reported() {
        let mut task = task();
        assert_eq!(task.link(), None);
        task.opportunity_id = Some("o1".to_string());
        assert!(task.validate().is_ok());
        assert_eq!(task.link(), Some(TaskLink::Opportunity("o1")));
    }

    #[test]
    fn overdue_requires_pending_and_past_due_date() {
        let mut task = task();
        assert!(!task.is_overdue(date(20)));
        assert!(task.is_overdue(date(21)));
        task.status = TaskStatus::Done;
        assert!(!task.is_overdue(date(21)));
    }

    #[test]
    fn status_uses_wire_names() {
        let value = serde_json::to_value(task()).expect("serialize task");
        assert_eq!(value["status"], "pendente");
        assert_eq!(value["tipo"], "ligacao");
        assert_eq!(value["prioridade"], "media");
    }

    #[test]
    fn patch_distinguishes_absent_from_null() {
        let patch: TaskPatch =
            serde_json::from_str(r#"{"resultado": null}"#).expect("parse patch");
        assert_eq!(patch.result, Some(None));
        assert_eq!(patch.notes, None);

        let mut task = task();
        task.result = Some("done".to_string());
        task.notes = Some("keep".to_string());
        patch.apply_to(&mut task);
        assert_eq!(task.result, None);
        assert_eq!(task.notes.as_deref(), Some("keep"));
    }

    #[test]
    fn setting_one_link_clears_the_others() {
        let mut task = task();
        task.client_id = Some("c1".to_string());

        let patch: TaskPatch =
            serde_json::from_str(r#"{"leadId": "l1"}"#).expect("parse patch");
        assert!(patch.sets_link());
        patch.apply_to(&mut task);

        assert_eq!(task.link(), Some(TaskLink::Lead("l1")));
        assert!(task.validate().is_ok());
    }

    #[test]
    fn null_link_unlinks_without_relinking() {
        let mut task = task();
        task.opportunity_id = Some("o1".to_string());

        let patch: TaskPatch =
            serde_json::from_str(r#"{"oportunidadeId": null}"#).expect("parse patch");
        assert!(!patch.sets_link());
        patch.apply_to(&mut task);

        assert_eq!(task.link(), None);
    }
}

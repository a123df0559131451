//! The full working set of entity collections.

use super::activity::Activity;
use super::client::Client;
use super::lead::Lead;
use super::opportunity::Opportunity;
use super::task::Task;
use serde::{Deserialize, Serialize};

/// Entity collections in their persisted/exported key layout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CrmData {
    #[serde(rename = "clientes")]
    pub clients: Vec<Client>,
    pub leads: Vec<Lead>,
    #[serde(rename = "oportunidades")]
    pub opportunities: Vec<Opportunity>,
    #[serde(rename = "tarefas")]
    pub tasks: Vec<Task>,
    /// Newest first.
    #[serde(rename = "atividades")]
    pub activities: Vec<Activity>,
}

impl CrmData {
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
            && self.leads.is_empty()
            && self.opportunities.is_empty()
            && self.tasks.is_empty()
            && self.activities.is_empty()
    }
}

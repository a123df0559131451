//! Dashboard metrics snapshot.
//!
//! Derived from the entity collections on every change; never stored as
//! independent truth.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SalesMetrics {
    pub total: f64,
    #[serde(rename = "meta")]
    pub target: f64,
    /// Month-over-month change of won value, in percent.
    #[serde(rename = "crescimento")]
    pub growth: f64,
    #[serde(rename = "periodo")]
    pub period: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LeadMetrics {
    #[serde(rename = "novos")]
    pub new: usize,
    #[serde(rename = "qualificados")]
    pub qualified: usize,
    #[serde(rename = "convertidos")]
    pub converted: usize,
    #[serde(rename = "taxaConversao")]
    pub conversion_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OpportunityMetrics {
    #[serde(rename = "ativas")]
    pub active: usize,
    #[serde(rename = "valorPipeline")]
    pub pipeline_value: f64,
    #[serde(rename = "valorMedio")]
    pub average_value: f64,
    /// Mean days from start to actual close over won deals.
    #[serde(rename = "cicloMedio")]
    pub average_cycle_days: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ClientMetrics {
    pub total: usize,
    #[serde(rename = "ativos")]
    pub active: usize,
    #[serde(rename = "novos")]
    pub new: usize,
    pub churn: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TaskMetrics {
    #[serde(rename = "pendentes")]
    pub pending: usize,
    #[serde(rename = "vencidas")]
    pub overdue: usize,
    #[serde(rename = "concluidas")]
    pub done: usize,
    #[serde(rename = "taxa")]
    pub completion_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DashboardMetrics {
    #[serde(rename = "vendas")]
    pub sales: SalesMetrics,
    pub leads: LeadMetrics,
    #[serde(rename = "oportunidades")]
    pub opportunities: OpportunityMetrics,
    #[serde(rename = "clientes")]
    pub clients: ClientMetrics,
    #[serde(rename = "tarefas")]
    pub tasks: TaskMetrics,
}

//! Read-only projections over the current collections.

use super::CrmStore;
use crate::model::activity::Activity;
use crate::model::task::Task;
use crate::service::agenda;
use crate::service::pipeline::{self, PipelineSummary};
use crate::service::report::{self, SalesReport};
use crate::storage::LocalStorage;

impl<S: LocalStorage> CrmStore<S> {
    pub fn pipeline_summary(&self) -> PipelineSummary {
        pipeline::pipeline_summary(&self.data.opportunities)
    }

    pub fn sales_report(&self) -> SalesReport {
        report::sales_report(&self.data.opportunities, &self.data.leads, self.today())
    }

    /// Pending tasks, earliest due first.
    pub fn pending_tasks(&self, limit: usize) -> Vec<&Task> {
        agenda::pending_tasks(&self.data.tasks, limit)
    }

    pub fn overdue_tasks(&self) -> Vec<&Task> {
        agenda::overdue_tasks(&self.data.tasks, self.today())
    }

    pub fn tasks_for_owner(&self, owner: &str) -> Vec<&Task> {
        agenda::tasks_for_owner(&self.data.tasks, owner)
    }

    pub fn recent_activities(&self, limit: usize) -> Vec<&Activity> {
        agenda::recent_activities(&self.data.activities, limit)
    }
}

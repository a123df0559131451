//! Lead operations.

use super::{admit, edit_in_place, position, CrmStore, StoreResult};
use crate::model::activity::{Activity, ActivityKind};
use crate::model::lead::{Lead, LeadPatch};
use crate::model::EntityId;
use crate::storage::LocalStorage;
use log::info;

impl<S: LocalStorage> CrmStore<S> {
    /// Adds a lead under a fresh id and logs `lead_criado` for its owner.
    pub fn add_lead(&mut self, lead: Lead) -> StoreResult<EntityId> {
        let checkpoint = self.data.clone();
        let lead = admit(lead)?;

        let activity = Activity::new(
            ActivityKind::LeadCreated,
            format!("New lead: {}", lead.name),
            format!("Lead captured via {}", lead.source.as_str()),
            lead.owner.clone(),
            self.now(),
        )
        .with_lead(lead.id.clone());

        let id = lead.id.clone();
        self.data.leads.push(lead);
        self.push_activity(activity);
        self.commit(checkpoint)?;

        info!("event=lead_add module=store status=ok lead_id={id}");
        Ok(id)
    }

    pub fn edit_lead(&mut self, id: &str, patch: LeadPatch) -> StoreResult<()> {
        let checkpoint = self.data.clone();
        edit_in_place(&mut self.data.leads, id, |lead| patch.apply_to(lead))?;
        self.commit(checkpoint)?;

        info!("event=lead_edit module=store status=ok lead_id={id}");
        Ok(())
    }

    /// Removes a lead and the tasks linked to it. Opportunities keep their
    /// `lead_id` as a historical reference.
    pub fn remove_lead(&mut self, id: &str) -> StoreResult<()> {
        let checkpoint = self.data.clone();
        let index = position(&self.data.leads, id)?;
        self.data.leads.remove(index);

        let tasks_before = self.data.tasks.len();
        self.data
            .tasks
            .retain(|task| task.lead_id.as_deref() != Some(id));
        let removed_tasks = tasks_before - self.data.tasks.len();

        self.commit(checkpoint)?;

        info!(
            "event=lead_remove module=store status=ok lead_id={id} cascaded_tasks={removed_tasks}"
        );
        Ok(())
    }
}

//! Client operations.

use super::{admit, edit_in_place, position, CrmStore, StoreResult};
use crate::model::activity::{Activity, ActivityKind, SYSTEM_USER};
use crate::model::client::{Client, ClientPatch};
use crate::model::EntityId;
use crate::storage::LocalStorage;
use log::info;
use std::collections::HashSet;

impl<S: LocalStorage> CrmStore<S> {
    /// Adds a client under a fresh id and logs `cliente_criado`.
    pub fn add_client(&mut self, client: Client) -> StoreResult<EntityId> {
        let checkpoint = self.data.clone();
        let client = admit(client)?;

        let activity = Activity::new(
            ActivityKind::ClientCreated,
            format!("New client: {}", client.name),
            format!("{} was added as a client", client.name),
            SYSTEM_USER,
            self.now(),
        )
        .with_client(client.id.clone());

        let id = client.id.clone();
        self.data.clients.push(client);
        self.push_activity(activity);
        self.commit(checkpoint)?;

        info!("event=client_add module=store status=ok client_id={id}");
        Ok(id)
    }

    /// Merges `patch` into the client with `id`.
    pub fn edit_client(&mut self, id: &str, patch: ClientPatch) -> StoreResult<()> {
        let checkpoint = self.data.clone();
        edit_in_place(&mut self.data.clients, id, |client| patch.apply_to(client))?;
        self.commit(checkpoint)?;

        info!("event=client_edit module=store status=ok client_id={id}");
        Ok(())
    }

    /// Removes a client with its opportunities and every task linked to the
    /// client or to one of those opportunities.
    pub fn remove_client(&mut self, id: &str) -> StoreResult<()> {
        let checkpoint = self.data.clone();
        let index = position(&self.data.clients, id)?;
        self.data.clients.remove(index);

        let mut removed_opportunities = HashSet::new();
        self.data.opportunities.retain(|opportunity| {
            if opportunity.client_id == id {
                removed_opportunities.insert(opportunity.id.clone());
                return false;
            }
            true
        });

        let tasks_before = self.data.tasks.len();
        self.data.tasks.retain(|task| {
            let linked_client = task.client_id.as_deref() == Some(id);
            let linked_opportunity = task
                .opportunity_id
                .as_ref()
                .is_some_and(|opportunity_id| removed_opportunities.contains(opportunity_id));
            !linked_client && !linked_opportunity
        });
        let removed_tasks = tasks_before - self.data.tasks.len();

        self.commit(checkpoint)?;

        info!(
            "event=client_remove module=store status=ok client_id={id} cascaded_opportunities={} cascaded_tasks={removed_tasks}",
            removed_opportunities.len()
        );
        Ok(())
    }
}

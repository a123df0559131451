//! Opportunity operations, lead conversion and pipeline moves.

use super::{admit, edit_in_place, position, CrmStore, StoreResult};
use crate::model::activity::{Activity, ActivityKind, SYSTEM_USER};
use crate::model::client::{Client, LEAD_CONVERTED_TAG};
use crate::model::lead::LeadStatus;
use crate::model::opportunity::{Opportunity, OpportunityPatch, PipelineStage};
use crate::model::EntityId;
use crate::storage::LocalStorage;
use log::info;

/// Ids produced by a lead conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionOutcome {
    pub client_id: EntityId,
    pub opportunity_id: EntityId,
    /// Whether a prospect client was synthesized from the lead.
    pub client_created: bool,
}

impl<S: LocalStorage> CrmStore<S> {
    /// Adds an opportunity under a fresh id and logs `oportunidade_criada`.
    pub fn add_opportunity(&mut self, opportunity: Opportunity) -> StoreResult<EntityId> {
        let checkpoint = self.data.clone();
        let opportunity = admit(opportunity)?;

        let activity = Activity::new(
            ActivityKind::OpportunityCreated,
            format!("New opportunity: {}", opportunity.title),
            format!(
                "Opportunity worth {:.2} opened in {}",
                opportunity.value,
                opportunity.stage.label()
            ),
            opportunity.owner.clone(),
            self.now(),
        )
        .with_client(opportunity.client_id.clone())
        .with_opportunity(opportunity.id.clone());

        let id = opportunity.id.clone();
        self.data.opportunities.push(opportunity);
        self.push_activity(activity);
        self.commit(checkpoint)?;

        info!("event=opportunity_add module=store status=ok opportunity_id={id}");
        Ok(id)
    }

    pub fn edit_opportunity(&mut self, id: &str, patch: OpportunityPatch) -> StoreResult<()> {
        let checkpoint = self.data.clone();
        edit_in_place(&mut self.data.opportunities, id, |opportunity| {
            patch.apply_to(opportunity)
        })?;
        self.commit(checkpoint)?;

        info!("event=opportunity_edit module=store status=ok opportunity_id={id}");
        Ok(())
    }

    /// Removes an opportunity and the tasks linked to it.
    pub fn remove_opportunity(&mut self, id: &str) -> StoreResult<()> {
        let checkpoint = self.data.clone();
        let index = position(&self.data.opportunities, id)?;
        self.data.opportunities.remove(index);

        let tasks_before = self.data.tasks.len();
        self.data
            .tasks
            .retain(|task| task.opportunity_id.as_deref() != Some(id));
        let removed_tasks = tasks_before - self.data.tasks.len();

        self.commit(checkpoint)?;

        info!(
            "event=opportunity_remove module=store status=ok opportunity_id={id} cascaded_tasks={removed_tasks}"
        );
        Ok(())
    }

    /// Turns a lead into an opportunity.
    ///
    /// When `opportunity` carries no client id a prospect client is built
    /// from the lead's contact fields. The lead is marked converted and one
    /// `oportunidade_criada` activity is logged. Every record is validated
    /// before any collection changes.
    pub fn convert_lead_to_opportunity(
        &mut self,
        lead_id: &str,
        mut opportunity: Opportunity,
    ) -> StoreResult<ConversionOutcome> {
        let checkpoint = self.data.clone();
        let lead_index = position(&self.data.leads, lead_id)?;
        let lead = &self.data.leads[lead_index];
        let today = self.today();

        let new_client = if opportunity.has_client() {
            None
        } else {
            let mut client = Client::new(
                lead.name.clone(),
                lead.email.clone(),
                lead.company.clone().unwrap_or_default(),
                today,
            );
            client.phone = lead.phone.clone();
            client.job_title = lead.job_title.clone();
            client.source = lead.source.as_str().to_string();
            client.tags = vec![LEAD_CONVERTED_TAG.to_string()];
            let client = admit(client)?;
            opportunity.client_id = client.id.clone();
            Some(client)
        };

        opportunity.lead_id = Some(lead_id.to_string());
        let opportunity = admit(opportunity)?;

        let activity = Activity::new(
            ActivityKind::OpportunityCreated,
            format!("Lead converted: {}", lead.name),
            format!("Lead converted into opportunity {}", opportunity.title),
            SYSTEM_USER,
            self.now(),
        )
        .with_lead(lead_id)
        .with_opportunity(opportunity.id.clone());

        let outcome = ConversionOutcome {
            client_id: opportunity.client_id.clone(),
            opportunity_id: opportunity.id.clone(),
            client_created: new_client.is_some(),
        };

        if let Some(client) = new_client {
            self.data.clients.push(client);
        }
        self.data.opportunities.push(opportunity);
        self.data.leads[lead_index].status = LeadStatus::Converted;
        self.push_activity(activity);
        self.commit(checkpoint)?;

        info!(
            "event=lead_convert module=store status=ok lead_id={lead_id} opportunity_id={} client_id={} client_created={}",
            outcome.opportunity_id, outcome.client_id, outcome.client_created
        );
        Ok(outcome)
    }

    /// Moves an opportunity to `stage`. Any stage may follow any other.
    ///
    /// Entering `Won` or `Lost` stamps the actual close date when unset;
    /// entering `Won` logs `negocio_fechado`.
    pub fn move_opportunity(&mut self, id: &str, stage: PipelineStage) -> StoreResult<()> {
        let checkpoint = self.data.clone();
        let index = position(&self.data.opportunities, id)?;
        let today = self.today();
        let now = self.now();

        let opportunity = &mut self.data.opportunities[index];
        let from = opportunity.stage;
        opportunity.stage = stage;
        if stage.is_terminal() && opportunity.actual_close_date.is_none() {
            opportunity.actual_close_date = Some(today);
        }

        let closed = (stage == PipelineStage::Won).then(|| {
            Activity::new(
                ActivityKind::DealClosed,
                format!("Deal closed: {}", opportunity.title),
                format!("Deal closed for {:.2}", opportunity.value),
                opportunity.owner.clone(),
                now,
            )
            .with_client(opportunity.client_id.clone())
            .with_opportunity(opportunity.id.clone())
        });
        if let Some(activity) = closed {
            self.push_activity(activity);
        }
        self.commit(checkpoint)?;

        info!(
            "event=opportunity_move module=store status=ok opportunity_id={id} from={from} to={stage}"
        );
        Ok(())
    }
}

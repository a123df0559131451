//! Activity log writes.

use super::{CrmStore, StoreResult};
use crate::model::activity::Activity;
use crate::model::{new_entity_id, EntityId};
use crate::storage::LocalStorage;
use log::info;

impl<S: LocalStorage> CrmStore<S> {
    /// Records a caller-supplied event (call, e-mail, meeting...) at the head
    /// of the log. The id is always reassigned.
    pub fn log_activity(&mut self, activity: Activity) -> StoreResult<EntityId> {
        let checkpoint = self.data.clone();
        let kind = activity.kind;
        let id = self.push_activity(activity);
        self.commit(checkpoint)?;

        info!("event=activity_log module=store status=ok activity_id={id} kind={kind:?}");
        Ok(id)
    }

    /// Prepends an activity under a fresh id without committing.
    pub(super) fn push_activity(&mut self, mut activity: Activity) -> EntityId {
        activity.id = new_entity_id();
        let id = activity.id.clone();
        self.data.activities.insert(0, activity);
        id
    }
}

//! Task operations.

use super::{admit, edit_in_place, position, CrmStore, StoreResult};
use crate::model::activity::{Activity, ActivityKind};
use crate::model::task::{Task, TaskPatch, TaskStatus};
use crate::model::EntityId;
use crate::storage::LocalStorage;
use log::info;

impl<S: LocalStorage> CrmStore<S> {
    /// Adds a task under a fresh id and logs `tarefa_criada`.
    pub fn add_task(&mut self, task: Task) -> StoreResult<EntityId> {
        let checkpoint = self.data.clone();
        let task = admit(task)?;

        let mut activity = Activity::new(
            ActivityKind::TaskCreated,
            format!("New task: {}", task.title),
            format!("Task due {}", task.due_date),
            task.owner.clone(),
            self.now(),
        )
        .with_task(task.id.clone());
        activity.client_id = task.client_id.clone();
        activity.lead_id = task.lead_id.clone();
        activity.opportunity_id = task.opportunity_id.clone();

        let id = task.id.clone();
        self.data.tasks.push(task);
        self.push_activity(activity);
        self.commit(checkpoint)?;

        info!("event=task_add module=store status=ok task_id={id}");
        Ok(id)
    }

    pub fn edit_task(&mut self, id: &str, patch: TaskPatch) -> StoreResult<()> {
        let checkpoint = self.data.clone();
        edit_in_place(&mut self.data.tasks, id, |task| patch.apply_to(task))?;
        self.commit(checkpoint)?;

        info!("event=task_edit module=store status=ok task_id={id}");
        Ok(())
    }

    pub fn remove_task(&mut self, id: &str) -> StoreResult<()> {
        let checkpoint = self.data.clone();
        let index = position(&self.data.tasks, id)?;
        self.data.tasks.remove(index);
        self.commit(checkpoint)?;

        info!("event=task_remove module=store status=ok task_id={id}");
        Ok(())
    }

    /// Marks a task done today. A `None` result clears any earlier one.
    pub fn complete_task(&mut self, id: &str, result: Option<String>) -> StoreResult<()> {
        let checkpoint = self.data.clone();
        let index = position(&self.data.tasks, id)?;
        let today = self.today();

        let task = &mut self.data.tasks[index];
        task.status = TaskStatus::Done;
        task.completed_on = Some(today);
        task.result = result;
        self.commit(checkpoint)?;

        info!("event=task_complete module=store status=ok task_id={id}");
        Ok(())
    }
}

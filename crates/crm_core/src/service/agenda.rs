//! Dashboard lists: upcoming work and latest activity.

use crate::model::activity::Activity;
use crate::model::task::Task;
use chrono::NaiveDate;

/// Pending tasks ordered by due date (earliest first), at most `limit`.
pub fn pending_tasks(tasks: &[Task], limit: usize) -> Vec<&Task> {
    let mut pending = tasks.iter().filter(|task| task.is_pending()).collect::<Vec<_>>();
    pending.sort_by_key(|task| task.due_date);
    pending.truncate(limit);
    pending
}

/// Pending tasks whose due date is before `today`.
pub fn overdue_tasks(tasks: &[Task], today: NaiveDate) -> Vec<&Task> {
    let mut overdue = tasks
        .iter()
        .filter(|task| task.is_overdue(today))
        .collect::<Vec<_>>();
    overdue.sort_by_key(|task| task.due_date);
    overdue
}

pub fn tasks_for_owner<'a>(tasks: &'a [Task], owner: &str) -> Vec<&'a Task> {
    tasks.iter().filter(|task| task.owner == owner).collect()
}

/// Activities ordered newest first, at most `limit`.
pub fn recent_activities(activities: &[Activity], limit: usize) -> Vec<&Activity> {
    let mut recent = activities.iter().collect::<Vec<_>>();
    recent.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));
    recent.truncate(limit);
    recent
}

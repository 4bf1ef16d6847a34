//! Diffing engine output into per-task updates
//!
//! The engine hands back the whole collection after every operation; only the
//! tasks whose state actually moved need to be written back.

use std::collections::HashMap;

use serde::Serialize;

use crate::domain::{Task, TaskId, TaskState};

/// A partial update for one task: its new state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskPatch {
    pub id: TaskId,
    pub title: String,
    /// State before the change, `None` if the task is new
    pub from: Option<TaskState>,
    pub state: TaskState,
}

/// Returns one patch per task whose state differs between `before` and
/// `after`, in `after` order
pub fn diff(before: &[Task], after: &[Task]) -> Vec<TaskPatch> {
    let previous: HashMap<&TaskId, TaskState> =
        before.iter().map(|t| (&t.id, t.state)).collect();

    after
        .iter()
        .filter_map(|task| {
            let from = previous.get(&task.id).copied();
            (from != Some(task.state)).then(|| TaskPatch {
                id: task.id.clone(),
                title: task.title.clone(),
                from,
                state: task.state,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(name: &str, state: TaskState) -> Task {
        Task::new(name.parse().unwrap(), name).with_state(state)
    }

    #[test]
    fn identical_collections_have_no_patches() {
        let tasks = vec![task("a", TaskState::Todo), task("b", TaskState::Done)];
        assert!(diff(&tasks, &tasks).is_empty());
    }

    #[test]
    fn reports_changed_states_in_after_order() {
        let before = vec![
            task("a", TaskState::Todo),
            task("b", TaskState::Blocked),
            task("c", TaskState::Todo),
        ];
        let after = vec![
            task("a", TaskState::Done),
            task("b", TaskState::Todo),
            task("c", TaskState::Todo),
        ];

        let patches = diff(&before, &after);
        assert_eq!(patches.len(), 2);
        assert_eq!(patches[0].id.as_str(), "a");
        assert_eq!(patches[0].from, Some(TaskState::Todo));
        assert_eq!(patches[0].state, TaskState::Done);
        assert_eq!(patches[1].id.as_str(), "b");
        assert_eq!(patches[1].state, TaskState::Todo);
    }

    #[test]
    fn new_task_is_a_patch_without_previous_state() {
        let patches = diff(&[], &[task("a", TaskState::Todo)]);
        assert_eq!(patches.len(), 1);
        assert_eq!(patches[0].from, None);
    }
}

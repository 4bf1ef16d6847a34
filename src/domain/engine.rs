//! Dependency resolution engine
//!
//! Owns a private snapshot of the task collection plus the dependency indices
//! built from it, and keeps one invariant: a task is `blocked` iff at least one
//! of its dependencies is not `done` (a dependency that matches no task counts
//! as not done).
//!
//! Every boundary crossing is a copy: the engine clones its input on
//! construction and every operation returns an owned collection.
//!
//! ```
//! use cascade::domain::{Engine, Task, TaskId, TaskState};
//!
//! let a: TaskId = "a".parse().unwrap();
//! let b: TaskId = "b".parse().unwrap();
//! let tasks = vec![
//!     Task::new(a.clone(), "Design"),
//!     Task::new(b.clone(), "Build")
//!         .with_state(TaskState::Blocked)
//!         .with_dependencies([a.clone()]),
//! ];
//!
//! let mut engine = Engine::new(&tasks);
//! let updated = engine.update_task_state(&a, TaskState::Done).unwrap();
//! assert_eq!(updated[1].state, TaskState::Todo);
//! ```

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;

use thiserror::Error;
use tracing::{debug, trace};

use super::graph::DependencyGraph;
use super::id::TaskId;
use super::task::{StateCounts, Task, TaskState};

/// Why a requested transition was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionRefusal {
    /// `blocked` was requested directly
    BlockedRequested,
    /// The task is currently recorded as `blocked`
    TaskBlocked,
    /// The task is not recorded as blocked, but a dependency is not done
    DependenciesUnmet,
}

impl fmt::Display for TransitionRefusal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransitionRefusal::BlockedRequested => {
                f.write_str("the blocked state cannot be set manually")
            }
            TransitionRefusal::TaskBlocked => f.write_str("the task is blocked"),
            TransitionRefusal::DependenciesUnmet => {
                f.write_str("not all of its dependencies are done")
            }
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    #[error("Task not found: {0}")]
    NotFound(TaskId),

    #[error("Cannot change state of task {id}: {reason}")]
    InvalidTransition {
        id: TaskId,
        reason: TransitionRefusal,
    },
}

/// Summary of one propagation run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Propagation {
    /// Ids popped from the work queue, in processing order
    pub visited: Vec<TaskId>,
    /// Ids whose state the run changed, in change order
    pub changed: Vec<TaskId>,
}

/// Dependency graph engine over one task snapshot
#[derive(Debug, Clone)]
pub struct Engine {
    /// Snapshot, in input order
    tasks: Vec<Task>,
    /// id -> position in `tasks`
    positions: HashMap<TaskId, usize>,
    graph: DependencyGraph,
}

impl Engine {
    /// Builds an engine over a private copy of `tasks`
    ///
    /// No state is validated or changed here. Call [`Engine::recompute_states`]
    /// if the input may not be consistent.
    pub fn new<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> Self {
        let mut snapshot: Vec<Task> = Vec::new();
        let mut positions = HashMap::new();

        for task in tasks {
            match positions.get(&task.id) {
                Some(&pos) => snapshot[pos] = task.clone(),
                None => {
                    positions.insert(task.id.clone(), snapshot.len());
                    snapshot.push(task.clone());
                }
            }
        }

        let graph = DependencyGraph::from_tasks(&snapshot);
        debug!(tasks = snapshot.len(), "built dependency engine");

        Self {
            tasks: snapshot,
            positions,
            graph,
        }
    }

    fn get(&self, task_id: &TaskId) -> Option<&Task> {
        self.positions.get(task_id).map(|&pos| &self.tasks[pos])
    }

    fn get_mut(&mut self, task_id: &TaskId) -> Option<&mut Task> {
        self.positions
            .get(task_id)
            .map(|&pos| &mut self.tasks[pos])
    }

    fn is_done(&self, task_id: &TaskId) -> bool {
        self.get(task_id).is_some_and(|t| t.state.is_done())
    }

    /// Returns true iff the task exists and every dependency is done
    pub fn is_actionable(&self, task_id: &TaskId) -> bool {
        if !self.positions.contains_key(task_id) {
            return false;
        }
        self.graph
            .dependencies_of(task_id)
            .iter()
            .all(|dep_id| self.is_done(dep_id))
    }

    /// Applies a user-requested state change and propagates its consequences
    ///
    /// Returns the full updated collection. Nothing is written unless every
    /// check passes.
    ///
    /// # Errors
    /// - [`EngineError::NotFound`] if `task_id` is unknown.
    /// - [`EngineError::InvalidTransition`] if `new_state` is `blocked`, the
    ///   task is recorded as `blocked`, or the task is not actionable.
    pub fn update_task_state(
        &mut self,
        task_id: &TaskId,
        new_state: TaskState,
    ) -> Result<Vec<Task>, EngineError> {
        let task = self
            .get(task_id)
            .ok_or_else(|| EngineError::NotFound(task_id.clone()))?;

        let refusal = if new_state.is_blocked() {
            Some(TransitionRefusal::BlockedRequested)
        } else if task.state.is_blocked() {
            Some(TransitionRefusal::TaskBlocked)
        } else if !self.is_actionable(task_id) {
            Some(TransitionRefusal::DependenciesUnmet)
        } else {
            None
        };

        if let Some(reason) = refusal {
            return Err(EngineError::InvalidTransition {
                id: task_id.clone(),
                reason,
            });
        }

        let previous = task.state;
        if let Some(task) = self.get_mut(task_id) {
            task.state = new_state;
        }
        debug!(task = %task_id, from = %previous, to = %new_state, "state updated");

        self.propagate([task_id.clone()]);
        Ok(self.tasks())
    }

    /// Breadth-first re-evaluation of everything downstream of `changed`
    ///
    /// Each id is processed at most once per run.
    pub fn propagate(&mut self, changed: impl IntoIterator<Item = TaskId>) -> Propagation {
        let mut queue: VecDeque<TaskId> = changed.into_iter().collect();
        let mut processed: HashSet<TaskId> = HashSet::new();
        let mut report = Propagation::default();

        while let Some(current) = queue.pop_front() {
            if !processed.insert(current.clone()) {
                continue;
            }
            trace!(task = %current, "propagating");
            report.visited.push(current.clone());

            let dependents = self.graph.dependents_of(&current).to_vec();
            for dependent_id in dependents {
                let Some(state) = self.get(&dependent_id).map(|t| t.state) else {
                    continue;
                };

                let was_actionable = !state.is_blocked();
                let is_now_actionable = self.is_actionable(&dependent_id);

                if was_actionable && !is_now_actionable {
                    self.set_derived_state(&dependent_id, TaskState::Blocked);
                    report.changed.push(dependent_id.clone());
                    queue.push_back(dependent_id);
                } else if is_now_actionable && state.is_blocked() {
                    self.set_derived_state(&dependent_id, TaskState::Todo);
                    report.changed.push(dependent_id.clone());
                    queue.push_back(dependent_id);
                } else if was_actionable && is_now_actionable {
                    // Unchanged, but keep walking so deeper dependents are seen.
                    queue.push_back(dependent_id);
                }
            }
        }

        debug!(
            visited = report.visited.len(),
            changed = report.changed.len(),
            "propagation finished"
        );
        report
    }

    fn set_derived_state(&mut self, task_id: &TaskId, state: TaskState) {
        if let Some(task) = self.get_mut(task_id) {
            debug!(task = %task_id, from = %task.state, to = %state, "derived state change");
            task.state = state;
        }
    }

    /// One-shot sweep that forces every task to agree with its dependencies
    ///
    /// Non-actionable tasks become `blocked`; `blocked` tasks that are
    /// actionable become `todo`. Tasks are visited dependencies-first, so a
    /// single sweep leaves a consistent snapshot and repeating it is a no-op.
    pub fn recompute_states(&mut self) -> Vec<Task> {
        for task_id in self.graph.dependency_order() {
            let Some(state) = self.get(&task_id).map(|t| t.state) else {
                continue;
            };
            let actionable = self.is_actionable(&task_id);

            if !actionable && !state.is_blocked() {
                self.set_derived_state(&task_id, TaskState::Blocked);
            } else if actionable && state.is_blocked() {
                self.set_derived_state(&task_id, TaskState::Todo);
            }
        }
        self.tasks()
    }

    /// Returns a copy of the current snapshot
    pub fn tasks(&self) -> Vec<Task> {
        self.tasks.clone()
    }

    /// Returns a copy of one task
    pub fn task(&self, task_id: &TaskId) -> Option<Task> {
        self.get(task_id).cloned()
    }

    /// Ids in snapshot order
    pub fn task_ids(&self) -> impl Iterator<Item = &TaskId> {
        self.tasks.iter().map(|t| &t.id)
    }

    /// Returns true if the snapshot contains the task
    pub fn contains(&self, task_id: &TaskId) -> bool {
        self.positions.contains_key(task_id)
    }

    /// Returns the number of tasks in the snapshot
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Returns true if the snapshot is empty
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Direct dependents of a task
    pub fn dependents_of(&self, task_id: &TaskId) -> Vec<TaskId> {
        self.graph.dependents_of(task_id).to_vec()
    }

    /// Dependencies of a task that are not done, missing ones included
    pub fn unmet_dependencies(&self, task_id: &TaskId) -> Vec<TaskId> {
        self.graph
            .dependencies_of(task_id)
            .iter()
            .filter(|dep_id| !self.is_done(dep_id))
            .cloned()
            .collect()
    }

    /// States a user may currently request for a task
    pub fn available_states(&self, task_id: &TaskId) -> &'static [TaskState] {
        match self.get(task_id) {
            Some(task) if !task.state.is_blocked() && self.is_actionable(task_id) => {
                TaskState::REQUESTABLE
            }
            _ => &[],
        }
    }

    /// Number of tasks per state
    pub fn counts(&self) -> StateCounts {
        StateCounts::tally(&self.tasks)
    }

    /// Returns true if every task satisfies the blocked-consistency invariant
    pub fn is_consistent(&self) -> bool {
        self.tasks
            .iter()
            .all(|t| t.state.is_blocked() != self.is_actionable(&t.id))
    }
}

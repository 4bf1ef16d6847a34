//! Task domain model
//!
//! A task carries an opaque id, a title, a state and an ordered list of the
//! tasks it depends on. The `blocked` state is derived from the dependencies
//! and is never set directly by a user.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::id::TaskId;

#[derive(Debug, Error, PartialEq)]
#[error("Invalid task state '{0}': expected one of todo, in_progress, done, blocked")]
pub struct ParseStateError(String);

/// State of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    #[default]
    Todo,
    InProgress,
    Done,
    /// At least one dependency is not done. Only reachable through propagation.
    Blocked,
}

impl TaskState {
    /// All states, in display order
    pub const ALL: [TaskState; 4] = [
        TaskState::Todo,
        TaskState::InProgress,
        TaskState::Done,
        TaskState::Blocked,
    ];

    /// States a user may request for an actionable task
    pub const REQUESTABLE: &'static [TaskState] =
        &[TaskState::Todo, TaskState::InProgress, TaskState::Done];

    /// Returns true if this state satisfies a dependency
    pub fn is_done(&self) -> bool {
        matches!(self, TaskState::Done)
    }

    /// Returns true if this state is the derived blocked state
    pub fn is_blocked(&self) -> bool {
        matches!(self, TaskState::Blocked)
    }

    /// Returns true if a user may request this state directly
    pub fn is_requestable(&self) -> bool {
        !self.is_blocked()
    }

    /// Returns the wire name of the state
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskState::Todo => "todo",
            TaskState::InProgress => "in_progress",
            TaskState::Done => "done",
            TaskState::Blocked => "blocked",
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskState {
    type Err = ParseStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "todo" => Ok(TaskState::Todo),
            "in_progress" => Ok(TaskState::InProgress),
            "done" => Ok(TaskState::Done),
            "blocked" => Ok(TaskState::Blocked),
            _ => Err(ParseStateError(s.to_string())),
        }
    }
}

/// A task record as exchanged with the persistence layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier
    pub id: TaskId,

    /// Human-readable title
    pub title: String,

    /// Current state
    pub state: TaskState,

    /// Tasks that must be done before this one is actionable
    #[serde(default)]
    pub dependencies: Vec<TaskId>,
}

impl Task {
    /// Creates a new task in the `todo` state with no dependencies
    pub fn new(id: TaskId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            state: TaskState::Todo,
            dependencies: Vec::new(),
        }
    }

    /// Builder-style helper to set the dependency list
    pub fn with_dependencies(mut self, dependencies: impl IntoIterator<Item = TaskId>) -> Self {
        self.dependencies = dependencies.into_iter().collect();
        self
    }

    /// Builder-style helper to set the state
    pub fn with_state(mut self, state: TaskState) -> Self {
        self.state = state;
        self
    }

    /// Adds a dependency. Returns false if it was already present.
    pub fn add_dependency(&mut self, task_id: TaskId) -> bool {
        if self.dependencies.contains(&task_id) {
            return false;
        }
        self.dependencies.push(task_id);
        true
    }

    /// Removes a dependency. Returns false if it was not present.
    pub fn remove_dependency(&mut self, task_id: &TaskId) -> bool {
        let len_before = self.dependencies.len();
        self.dependencies.retain(|d| d != task_id);
        self.dependencies.len() != len_before
    }

    /// Returns true if this task lists `task_id` as a dependency
    pub fn depends_on(&self, task_id: &TaskId) -> bool {
        self.dependencies.contains(task_id)
    }
}

/// Number of tasks per state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StateCounts {
    pub total: usize,
    pub todo: usize,
    pub in_progress: usize,
    pub done: usize,
    pub blocked: usize,
}

impl StateCounts {
    /// Tallies the states of a collection of tasks
    pub fn tally<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> Self {
        let mut counts = Self::default();
        for task in tasks {
            counts.total += 1;
            match task.state {
                TaskState::Todo => counts.todo += 1,
                TaskState::InProgress => counts.in_progress += 1,
                TaskState::Done => counts.done += 1,
                TaskState::Blocked => counts.blocked += 1,
            }
        }
        counts
    }

    /// Count for a single state
    pub fn get(&self, state: TaskState) -> usize {
        match state {
            TaskState::Todo => self.todo,
            TaskState::InProgress => self.in_progress,
            TaskState::Done => self.done,
            TaskState::Blocked => self.blocked,
        }
    }
}

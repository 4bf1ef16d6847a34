//! Loading tasks into an engine and writing the results back
//!
//! Every command opens a [`Session`]: the project, the tasks as stored, and an
//! engine built over them. Mutating commands hand the engine's output back to
//! [`Session::commit_states`] or [`Session::commit_all`], which diff it against
//! what was read and persist the difference.

use anyhow::{bail, Result};
use tracing::{debug, info};

use crate::domain::{Engine, EngineError, Task, TaskId};
use crate::storage::{diff, Project, TaskPatch, TaskStore};

pub struct Session {
    project: Project,
    store: TaskStore,
    /// Tasks exactly as read from the store
    stored: Vec<Task>,
    engine: Engine,
}

impl Session {
    /// Opens the current project and builds an engine over its tasks
    ///
    /// With `recompute_on_load` the engine's snapshot is swept first, so an
    /// edited or stale file is seen in a consistent state.
    pub fn open() -> Result<Self> {
        let project = Project::open_current()?;
        let store = project.task_store();
        let stored = store.read_all()?;

        let mut engine = Engine::new(&stored);
        if project.config().project.recompute_on_load {
            engine.recompute_states();
            let repairs = diff(&stored, &engine.tasks()).len();
            if repairs > 0 {
                info!(repairs, "stored states were inconsistent with dependencies");
            }
        }

        debug!(root = %project.root().display(), tasks = stored.len(), "opened session");

        Ok(Self {
            project,
            store,
            stored,
            engine,
        })
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }

    /// Shortens an id for text output
    pub fn short<'a>(&self, task_id: &'a TaskId) -> &'a str {
        task_id.short(self.project.config().project.id_display_len)
    }

    /// Resolves user input to a known task id
    ///
    /// Accepts a full id or a unique prefix of one, so the shortened ids shown
    /// in text output can be typed back.
    pub fn resolve(&self, input: &str) -> Result<TaskId> {
        let task_id: TaskId = input.parse()?;
        if self.engine.contains(&task_id) {
            return Ok(task_id);
        }

        let matches: Vec<&TaskId> = self
            .engine
            .task_ids()
            .filter(|id| id.as_str().starts_with(task_id.as_str()))
            .collect();

        match matches.as_slice() {
            [only] => Ok((*only).clone()),
            [] => Err(EngineError::NotFound(task_id).into()),
            many => bail!(
                "Ambiguous task id '{}': matches {}",
                task_id,
                many.iter()
                    .map(|id| id.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        }
    }

    /// Persists the states in `after` that differ from the stored ones
    pub fn commit_states(&self, after: &[Task]) -> Result<Vec<TaskPatch>> {
        let patches = diff(&self.stored, after);
        self.store.apply(&patches)?;
        if !patches.is_empty() {
            info!(changed = patches.len(), "persisted state changes");
        }
        Ok(patches)
    }

    /// Replaces the stored collection with `after`
    ///
    /// Used after dependency edits. Returns the state changes, new tasks
    /// included.
    pub fn commit_all(&self, after: &[Task]) -> Result<Vec<TaskPatch>> {
        let patches = diff(&self.stored, after);
        self.store.write_all(after)?;
        info!(tasks = after.len(), changed = patches.len(), "rewrote task store");
        Ok(patches)
    }
}

//! Domain models for Cascade
//!
//! Contains the core business logic without any I/O concerns: the task
//! model, the dependency graph and the engine that keeps task states
//! consistent with their dependencies.

mod engine;
mod graph;
mod id;
mod task;

pub use engine::{Engine, EngineError, Propagation, TransitionRefusal};
pub use graph::DependencyGraph;
pub use id::{IdError, TaskId};
pub use task::{ParseStateError, StateCounts, Task, TaskState};

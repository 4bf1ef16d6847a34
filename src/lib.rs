//! Cascade - a local-first task tracker with dependency-aware states
//!
//! Each task lists the tasks it depends on. A task is `blocked` while any of
//! its dependencies is not `done`, and every state change is propagated to
//! the tasks downstream of it. The [`domain::Engine`] does the resolution;
//! [`storage`] persists tasks as JSONL and [`cli`] wraps both in commands.

pub mod domain;
pub mod storage;
pub mod cli;
pub mod logging;

pub use domain::{Engine, EngineError, Task, TaskId, TaskState};

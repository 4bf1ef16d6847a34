//! # Storage Layer
//!
//! Persistence layer for Cascade with git-friendly file formats.
//!
//! ## Storage Formats
//!
//! | Data | Format | Location |
//! |------|--------|----------|
//! | Tasks | JSONL (one JSON per line) | `.cascade/tasks.jsonl` |
//! | Config | TOML | `.cascade/config.toml` |
//! | Global config | TOML | `~/.config/cascade/config.toml` |
//!
//! ## Concurrency Safety
//!
//! - [`TaskStore`] uses file locking (`fs2`) for concurrent access
//! - All full rewrites are atomic (temp file + rename)
//!
//! ## Project Structure
//!
//! ```text
//! .cascade/
//! ├── tasks.jsonl           # All tasks in JSONL format
//! ├── config.toml           # Project configuration
//! └── .gitignore            # Ignores interrupted writes
//! ```
//!
//! ## Key Types
//!
//! - [`Project`] - Entry point for accessing a Cascade project
//! - [`TaskStore`] - Read/write tasks as JSONL
//! - [`TaskPatch`] - A per-task state update computed by [`diff`]
//! - [`Config`] - Project and global configuration

mod changes;
mod config;
mod jsonl;
mod project;

pub use changes::{diff, TaskPatch};
pub use config::{Config, ConfigError, GlobalConfig, OutputFormat, ProjectConfig};
pub use jsonl::TaskStore;
pub use project::{Project, ProjectError};

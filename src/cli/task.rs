//! Task CLI commands
//!
//! State changes go through the engine and persist only what changed.
//! Dependency edits rebuild the engine over the edited collection and
//! recompute before writing.

use anyhow::{bail, Result};
use chrono::Utc;
use tracing::debug;

use super::output::Output;
use super::session::Session;
use crate::domain::{Engine, Task, TaskId, TaskState};
use crate::storage::TaskPatch;

pub fn add_task(output: &Output, title: &str, depends_on: &[String]) -> Result<()> {
    let title = title.trim();
    if title.is_empty() {
        bail!("Task title cannot be empty");
    }

    let session = Session::open()?;

    let mut task = Task::new(TaskId::generate(title, Utc::now()), title);
    if session.engine().contains(&task.id) {
        bail!("Generated id {} is already taken, try again", task.id);
    }
    for dep in depends_on {
        task.add_dependency(session.resolve(dep)?);
    }

    let mut tasks = session.engine().tasks();
    tasks.push(task.clone());
    let after = Engine::new(&tasks).recompute_states();
    let patches = session.commit_all(&after)?;

    let created = after
        .iter()
        .find(|t| t.id == task.id)
        .cloned()
        .unwrap_or(task);

    if output.is_json() {
        output.data(&serde_json::json!({
            "task": created,
            "changes": patches,
        }));
    } else {
        output.success(&format!(
            "Created task: {} - {} [{}]",
            session.short(&created.id),
            created.title,
            created.state
        ));
        print_changes(&session, &patches, Some(&created.id));
    }

    Ok(())
}

pub fn list_tasks(output: &Output, state: Option<TaskState>) -> Result<()> {
    let session = Session::open()?;

    let tasks: Vec<Task> = session
        .engine()
        .tasks()
        .into_iter()
        .filter(|t| state.map_or(true, |s| t.state == s))
        .collect();

    if output.is_json() {
        output.data(&tasks);
    } else if tasks.is_empty() {
        match state {
            Some(state) => println!("No {} tasks", state),
            None => println!("No tasks"),
        }
    } else {
        println!("{:<12} {:<12} TITLE", "ID", "STATE");
        println!("{}", "-".repeat(60));
        for task in &tasks {
            println!(
                "{:<12} {:<12} {}",
                session.short(&task.id),
                task.state,
                task.title
            );
        }
    }

    Ok(())
}

pub fn show_task(output: &Output, id_str: &str) -> Result<()> {
    let session = Session::open()?;
    let engine = session.engine();

    let id = session.resolve(id_str)?;
    let Some(task) = engine.task(&id) else {
        bail!("Task not found: {}", id);
    };

    let unmet = engine.unmet_dependencies(&id);
    let dependents = engine.dependents_of(&id);
    let available = engine.available_states(&id);
    let blocked_reason = blocked_reason(engine, &unmet);

    if output.is_json() {
        let dependencies: Vec<_> = task
            .dependencies
            .iter()
            .map(|dep| {
                let dep_task = engine.task(dep);
                serde_json::json!({
                    "id": dep,
                    "title": dep_task.as_ref().map(|t| t.title.clone()),
                    "state": dep_task.as_ref().map(|t| t.state),
                })
            })
            .collect();

        output.data(&serde_json::json!({
            "id": task.id,
            "title": task.title,
            "state": task.state,
            "dependencies": dependencies,
            "dependents": dependents,
            "unmet_dependencies": unmet,
            "blocked_reason": blocked_reason,
            "available_states": available,
        }));
    } else {
        println!("Task: {}", task.id);
        println!("Title: {}", task.title);
        println!("State: {}", task.state);

        if !task.dependencies.is_empty() {
            println!("\nDepends on:");
            for dep in &task.dependencies {
                match engine.task(dep) {
                    Some(dep_task) => println!(
                        "  {} ({}) {}",
                        session.short(dep),
                        dep_task.state,
                        dep_task.title
                    ),
                    None => println!("  {} (missing)", dep),
                }
            }
        }

        if !dependents.is_empty() {
            println!("\nRequired by:");
            for dependent in &dependents {
                if let Some(dep_task) = engine.task(dependent) {
                    println!(
                        "  {} ({}) {}",
                        session.short(dependent),
                        dep_task.state,
                        dep_task.title
                    );
                }
            }
        }

        println!();
        if let Some(reason) = blocked_reason {
            println!("{}", reason);
        }
        if available.is_empty() {
            println!("No state changes available");
        } else {
            let names: Vec<&str> = available.iter().map(TaskState::as_str).collect();
            println!("Available states: {}", names.join(", "));
        }
    }

    Ok(())
}

/// Requests a state change through the engine and persists the fallout
pub fn set_state(output: &Output, id_str: &str, state: TaskState) -> Result<()> {
    let mut session = Session::open()?;
    let id = session.resolve(id_str)?;

    let after = session.engine_mut().update_task_state(&id, state)?;
    let patches = session.commit_states(&after)?;
    debug!(task = %id, %state, changed = patches.len(), "state updated");

    if output.is_json() {
        output.data(&serde_json::json!({
            "id": id,
            "state": state,
            "changes": patches,
        }));
    } else {
        output.success(&format!("{} is now {}", session.short(&id), state));
        print_changes(&session, &patches, Some(&id));
    }

    Ok(())
}

pub fn add_dependency(output: &Output, task_str: &str, depends_on_str: &str) -> Result<()> {
    let session = Session::open()?;

    let task_id = session.resolve(task_str)?;
    let depends_on = session.resolve(depends_on_str)?;

    if task_id == depends_on {
        bail!("A task cannot depend on itself: {}", task_id);
    }

    let mut tasks = session.engine().tasks();

    let added = tasks
        .iter_mut()
        .find(|t| t.id == task_id)
        .is_some_and(|t| t.add_dependency(depends_on.clone()));

    if !added {
        output.success(&format!("{} already depends on {}", task_id, depends_on));
        return Ok(());
    }

    let after = Engine::new(&tasks).recompute_states();
    let patches = session.commit_all(&after)?;

    if output.is_json() {
        output.data(&serde_json::json!({
            "task": task_id,
            "depends_on": depends_on,
            "changes": patches,
        }));
    } else {
        output.success(&format!("{} now depends on {}", task_id, depends_on));
        print_changes(&session, &patches, None);
    }

    Ok(())
}

pub fn remove_dependency(output: &Output, task_str: &str, depends_on_str: &str) -> Result<()> {
    let session = Session::open()?;

    let task_id = session.resolve(task_str)?;
    let mut tasks = session.engine().tasks();
    let Some(task) = tasks.iter_mut().find(|t| t.id == task_id) else {
        bail!("Task not found: {}", task_id);
    };

    // A dangling dependency can only be named literally
    let literal: TaskId = depends_on_str.parse()?;
    let depends_on = if task.depends_on(&literal) {
        literal
    } else {
        session.resolve(depends_on_str)?
    };

    if !task.remove_dependency(&depends_on) {
        bail!("{} does not depend on {}", task_id, depends_on);
    }

    let after = Engine::new(&tasks).recompute_states();
    let patches = session.commit_all(&after)?;

    if output.is_json() {
        output.data(&serde_json::json!({
            "task": task_id,
            "removed_dependency": depends_on,
            "changes": patches,
        }));
    } else {
        output.success(&format!(
            "Removed dependency: {} no longer depends on {}",
            task_id, depends_on
        ));
        print_changes(&session, &patches, None);
    }

    Ok(())
}

/// Deletes a task and drops it from every dependency list
pub fn remove_task(output: &Output, id_str: &str) -> Result<()> {
    let session = Session::open()?;
    let id = session.resolve(id_str)?;

    let mut tasks = session.engine().tasks();
    tasks.retain(|t| t.id != id);
    let mut detached = Vec::new();
    for task in &mut tasks {
        if task.remove_dependency(&id) {
            detached.push(task.id.clone());
        }
    }

    let after = Engine::new(&tasks).recompute_states();
    let patches = session.commit_all(&after)?;

    if output.is_json() {
        output.data(&serde_json::json!({
            "removed": id,
            "detached": detached,
            "changes": patches,
        }));
    } else {
        output.success(&format!("Removed task: {}", id));
        print_changes(&session, &patches, None);
    }

    Ok(())
}

/// Human-readable reason a task is not actionable, if any
fn blocked_reason(engine: &Engine, unmet: &[TaskId]) -> Option<String> {
    if unmet.is_empty() {
        return None;
    }

    let names: Vec<String> = unmet
        .iter()
        .map(|dep| match engine.task(dep) {
            Some(t) => t.title,
            None => format!("{} (missing)", dep),
        })
        .collect();

    Some(format!("Blocked by: {}", names.join(", ")))
}

/// Prints the state changes a command caused, skipping `skip`
pub(super) fn print_changes(session: &Session, patches: &[TaskPatch], skip: Option<&TaskId>) {
    let shown: Vec<&TaskPatch> = patches
        .iter()
        .filter(|p| Some(&p.id) != skip)
        .collect();

    if shown.is_empty() {
        return;
    }

    println!("Updated {} task(s):", shown.len());
    for patch in shown {
        let from = patch.from.as_ref().map_or("new", TaskState::as_str);
        println!(
            "  {:<12} {} -> {}  {}",
            session.short(&patch.id),
            from,
            patch.state,
            patch.title
        );
    }
}

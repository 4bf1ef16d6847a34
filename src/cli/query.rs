//! Query commands (ready, blocked, status) and the explicit recompute sweep

use anyhow::Result;

use super::output::Output;
use super::session::Session;
use super::task::print_changes;
use crate::domain::{DependencyGraph, Engine, Task};

/// Actionable, not yet done and not waiting on a recompute
fn is_ready(engine: &Engine, task: &Task) -> bool {
    !task.state.is_done() && !task.state.is_blocked() && engine.is_actionable(&task.id)
}

/// Show tasks ready to work on
pub fn ready(output: &Output) -> Result<()> {
    let session = Session::open()?;
    let engine = session.engine();

    let ready_tasks: Vec<Task> = engine
        .tasks()
        .into_iter()
        .filter(|t| is_ready(engine, t))
        .collect();

    if output.is_json() {
        output.data(&ready_tasks);
    } else if ready_tasks.is_empty() {
        println!("No tasks ready to work on.");
    } else {
        println!("Ready tasks ({}):", ready_tasks.len());
        println!("{:<12} {:<12} TITLE", "ID", "STATE");
        println!("{}", "-".repeat(60));
        for task in &ready_tasks {
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

/// Show blocked tasks with the dependencies holding them back
pub fn blocked(output: &Output) -> Result<()> {
    let session = Session::open()?;
    let engine = session.engine();

    let blocked_tasks: Vec<_> = engine
        .tasks()
        .into_iter()
        .filter(|t| t.state.is_blocked())
        .map(|t| {
            let blockers = engine.unmet_dependencies(&t.id);
            (t, blockers)
        })
        .collect();

    if output.is_json() {
        let items: Vec<_> = blocked_tasks
            .iter()
            .map(|(task, blockers)| {
                serde_json::json!({
                    "id": task.id,
                    "title": task.title,
                    "blocked_by": blockers,
                })
            })
            .collect();
        output.data(&items);
    } else if blocked_tasks.is_empty() {
        println!("No blocked tasks.");
    } else {
        println!("Blocked tasks ({}):", blocked_tasks.len());
        println!("{:<12} {:<30} BLOCKED BY", "ID", "TITLE");
        println!("{}", "-".repeat(72));
        for (task, blockers) in &blocked_tasks {
            let blockers: Vec<&str> = blockers.iter().map(|b| session.short(b)).collect();
            println!(
                "{:<12} {:<30} {}",
                session.short(&task.id),
                task.title,
                blockers.join(", ")
            );
        }
    }

    Ok(())
}

/// Show counts per state
pub fn status(output: &Output) -> Result<()> {
    let session = Session::open()?;
    let engine = session.engine();

    let tasks = engine.tasks();
    let counts = engine.counts();
    let ready_count = tasks.iter().filter(|t| is_ready(engine, t)).count();

    let graph = DependencyGraph::from_tasks(&tasks);
    let missing = graph.dangling();

    if output.is_json() {
        let missing: Vec<_> = missing
            .iter()
            .map(|(task, dep)| serde_json::json!({ "task": task, "missing": dep }))
            .collect();
        output.data(&serde_json::json!({
            "tasks": counts,
            "ready": ready_count,
            "consistent": engine.is_consistent(),
            "missing_dependencies": missing,
        }));
    } else {
        println!("Project Status");
        println!("{}", "=".repeat(40));
        println!();
        println!("Tasks: {} total", counts.total);
        println!("  [ ] Todo:        {}", counts.todo);
        println!("  [~] In Progress: {}", counts.in_progress);
        println!("  [x] Done:        {}", counts.done);
        println!("  [!] Blocked:     {}", counts.blocked);
        println!();
        println!("  Ready to work:   {}", ready_count);

        if !missing.is_empty() {
            println!();
            println!("Missing dependencies:");
            for (task, dep) in &missing {
                println!("  {} depends on unknown {}", session.short(task), dep);
            }
        }

        if !engine.is_consistent() {
            println!();
            println!("Some states disagree with their dependencies. Run 'cascade recompute'.");
        }
    }

    Ok(())
}

/// Re-derive every blocked/todo state from the dependencies and persist repairs
pub fn recompute(output: &Output) -> Result<()> {
    let mut session = Session::open()?;

    let after = session.engine_mut().recompute_states();
    let patches = session.commit_states(&after)?;

    if output.is_json() {
        output.data(&serde_json::json!({
            "tasks": after.len(),
            "changes": patches,
        }));
    } else if patches.is_empty() {
        output.success(&format!("All {} task states are consistent", after.len()));
    } else {
        output.success(&format!("Repaired {} of {} task(s)", patches.len(), after.len()));
        print_changes(&session, &patches, None);
    }

    Ok(())
}

//! Engine scenarios through the public API
//!
//! Each test builds a small snapshot, runs one engine operation and checks
//! the full returned collection.

use cascade::domain::{Engine, EngineError, Task, TaskId, TaskState, TransitionRefusal};

fn id(s: &str) -> TaskId {
    s.parse().unwrap()
}

fn task(name: &str, state: TaskState, deps: &[&str]) -> Task {
    Task::new(id(name), format!("Task {}", name))
        .with_state(state)
        .with_dependencies(deps.iter().map(|d| id(d)))
}

fn state_of(tasks: &[Task], name: &str) -> TaskState {
    tasks
        .iter()
        .find(|t| t.id.as_str() == name)
        .map(|t| t.state)
        .unwrap()
}

// =============================================================================
// Recompute
// =============================================================================

#[test]
fn recompute_unblocks_task_whose_dependency_is_done() {
    let tasks = vec![
        task("A", TaskState::Done, &[]),
        task("B", TaskState::Blocked, &["A"]),
    ];

    let mut engine = Engine::new(&tasks);
    let result = engine.recompute_states();

    assert_eq!(state_of(&result, "A"), TaskState::Done);
    assert_eq!(state_of(&result, "B"), TaskState::Todo);
}

#[test]
fn dangling_dependency_keeps_task_blocked() {
    let tasks = vec![task("X", TaskState::Blocked, &["Y"])];

    let mut engine = Engine::new(&tasks);
    assert!(!engine.is_actionable(&id("X")));

    let result = engine.recompute_states();
    assert_eq!(state_of(&result, "X"), TaskState::Blocked);
}

#[test]
fn recompute_blocks_stale_labels_down_a_chain() {
    // Everything claims to be done, but the root was reopened
    let tasks = vec![
        task("A", TaskState::Todo, &[]),
        task("C", TaskState::Done, &["B"]),
        task("B", TaskState::Done, &["A"]),
        task("D", TaskState::InProgress, &["C"]),
    ];

    let mut engine = Engine::new(&tasks);
    let result = engine.recompute_states();

    assert_eq!(state_of(&result, "A"), TaskState::Todo);
    assert_eq!(state_of(&result, "B"), TaskState::Blocked);
    assert_eq!(state_of(&result, "C"), TaskState::Blocked);
    assert_eq!(state_of(&result, "D"), TaskState::Blocked);
    assert!(engine.is_consistent());
}

// =============================================================================
// Propagation after updates
// =============================================================================

#[test]
fn completing_a_task_unblocks_only_direct_dependents() {
    let tasks = vec![
        task("A", TaskState::Todo, &[]),
        task("B", TaskState::Blocked, &["A"]),
        task("C", TaskState::Blocked, &["B"]),
    ];

    let mut engine = Engine::new(&tasks);
    let result = engine.update_task_state(&id("A"), TaskState::Done).unwrap();

    assert_eq!(state_of(&result, "A"), TaskState::Done);
    assert_eq!(state_of(&result, "B"), TaskState::Todo);
    assert_eq!(state_of(&result, "C"), TaskState::Blocked);
}

#[test]
fn reopening_a_task_blocks_its_dependents() {
    let tasks = vec![
        task("A", TaskState::Done, &[]),
        task("B", TaskState::Todo, &["A"]),
    ];

    let mut engine = Engine::new(&tasks);
    let result = engine.update_task_state(&id("A"), TaskState::Todo).unwrap();

    assert_eq!(state_of(&result, "A"), TaskState::Todo);
    assert_eq!(state_of(&result, "B"), TaskState::Blocked);
}

#[test]
fn task_with_several_dependencies_waits_for_all() {
    let tasks = vec![
        task("A", TaskState::Todo, &[]),
        task("B", TaskState::Todo, &[]),
        task("C", TaskState::Blocked, &["A", "B"]),
    ];

    let mut engine = Engine::new(&tasks);

    let result = engine.update_task_state(&id("A"), TaskState::Done).unwrap();
    assert_eq!(state_of(&result, "C"), TaskState::Blocked);

    let result = engine.update_task_state(&id("B"), TaskState::Done).unwrap();
    assert_eq!(state_of(&result, "C"), TaskState::Todo);
}

#[test]
fn output_preserves_input_order() {
    let tasks = vec![
        task("z", TaskState::Todo, &[]),
        task("a", TaskState::Blocked, &["z"]),
        task("m", TaskState::Todo, &[]),
    ];

    let mut engine = Engine::new(&tasks);
    let result = engine.update_task_state(&id("z"), TaskState::Done).unwrap();

    let order: Vec<&str> = result.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(order, vec!["z", "a", "m"]);
}

// =============================================================================
// Rejections
// =============================================================================

#[test]
fn blocked_task_cannot_be_moved_even_if_dependencies_are_done() {
    // B's dependency is done, but B has not been recomputed yet
    let tasks = vec![
        task("A", TaskState::Done, &[]),
        task("B", TaskState::Blocked, &["A"]),
    ];

    let mut engine = Engine::new(&tasks);
    let err = engine
        .update_task_state(&id("B"), TaskState::InProgress)
        .unwrap_err();

    assert_eq!(
        err,
        EngineError::InvalidTransition {
            id: id("B"),
            reason: TransitionRefusal::TaskBlocked,
        }
    );

    // After a recompute the same request goes through
    engine.recompute_states();
    let result = engine
        .update_task_state(&id("B"), TaskState::InProgress)
        .unwrap();
    assert_eq!(state_of(&result, "B"), TaskState::InProgress);
}

#[test]
fn requesting_blocked_is_always_refused() {
    let tasks = vec![task("A", TaskState::Todo, &[])];
    let mut engine = Engine::new(&tasks);

    let err = engine
        .update_task_state(&id("A"), TaskState::Blocked)
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::InvalidTransition {
            reason: TransitionRefusal::BlockedRequested,
            ..
        }
    ));
}

#[test]
fn unknown_task_is_reported() {
    let mut engine = Engine::new(&[task("A", TaskState::Todo, &[])]);

    let err = engine
        .update_task_state(&id("nope"), TaskState::Done)
        .unwrap_err();
    assert_eq!(err, EngineError::NotFound(id("nope")));
    assert_eq!(err.to_string(), "Task not found: nope");
}

#[test]
fn refused_update_changes_nothing() {
    let tasks = vec![
        task("A", TaskState::Todo, &[]),
        task("B", TaskState::Todo, &["A"]),
    ];
    let mut engine = Engine::new(&tasks);

    assert!(engine.update_task_state(&id("B"), TaskState::Done).is_err());
    assert_eq!(engine.tasks(), tasks);
}

// =============================================================================
// Boundary copies
// =============================================================================

#[test]
fn mutating_returned_collection_does_not_leak_into_engine() {
    let tasks = vec![task("A", TaskState::Todo, &[])];
    let mut engine = Engine::new(&tasks);

    let mut result = engine.recompute_states();
    result[0].state = TaskState::Done;
    result[0].title = "changed".to_string();

    let again = engine.tasks();
    assert_eq!(again[0].state, TaskState::Todo);
    assert_eq!(again[0].title, "Task A");
}

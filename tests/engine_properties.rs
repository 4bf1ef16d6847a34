//! Property tests for the dependency engine over random DAGs
//!
//! Acyclicity is guaranteed by only letting task N depend on tasks 0..N-1.
//! Some tasks also get a dependency on an id that matches no task.

use std::collections::HashSet;

use cascade::domain::{Engine, EngineError, Task, TaskId, TaskState};
use proptest::prelude::*;

fn name(i: usize) -> TaskId {
    format!("t{}", i).parse().unwrap()
}

fn ghost() -> TaskId {
    "ghost".parse().unwrap()
}

fn state_strategy() -> impl Strategy<Value = TaskState> {
    prop::sample::select(TaskState::ALL.to_vec())
}

// Random snapshot: states are arbitrary, so it is usually inconsistent.
fn snapshot_strategy(max_tasks: usize) -> impl Strategy<Value = Vec<Task>> {
    (1..=max_tasks).prop_flat_map(|num_tasks| {
        proptest::collection::vec(
            (
                state_strategy(),
                proptest::collection::vec(any::<usize>(), 0..4),
                proptest::bool::weighted(0.1),
            ),
            num_tasks,
        )
        .prop_map(|raw| {
            raw.into_iter()
                .enumerate()
                .map(|(i, (state, potential_deps, dangling))| {
                    let mut task = Task::new(name(i), format!("Task {}", i)).with_state(state);
                    if i > 0 {
                        for dep_idx in potential_deps {
                            task.add_dependency(name(dep_idx % i));
                        }
                    }
                    if dangling {
                        task.add_dependency(ghost());
                    }
                    task
                })
                .collect()
        })
    })
}

fn update_strategy() -> impl Strategy<Value = Vec<(usize, TaskState)>> {
    proptest::collection::vec((any::<usize>(), state_strategy()), 0..20)
}

proptest! {
    #[test]
    fn recompute_makes_snapshot_consistent(tasks in snapshot_strategy(15)) {
        let mut engine = Engine::new(&tasks);
        engine.recompute_states();
        prop_assert!(engine.is_consistent());
    }

    #[test]
    fn recompute_is_idempotent(tasks in snapshot_strategy(15)) {
        let mut engine = Engine::new(&tasks);
        let first = engine.recompute_states();
        let second = engine.recompute_states();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn recompute_only_touches_blocked_and_todo(tasks in snapshot_strategy(15)) {
        let mut engine = Engine::new(&tasks);
        let result = engine.recompute_states();

        for (before, after) in tasks.iter().zip(&result) {
            prop_assert_eq!(&before.id, &after.id);
            if before.state != after.state {
                prop_assert!(
                    after.state == TaskState::Blocked
                        || (before.state == TaskState::Blocked && after.state == TaskState::Todo)
                );
            }
        }
    }

    #[test]
    fn updates_preserve_consistency(
        tasks in snapshot_strategy(12),
        updates in update_strategy(),
    ) {
        let mut engine = Engine::new(&tasks);
        engine.recompute_states();

        for (idx, state) in updates {
            let target = name(idx % tasks.len());
            let before = engine.tasks();

            match engine.update_task_state(&target, state) {
                Ok(result) => prop_assert_eq!(result, engine.tasks()),
                Err(EngineError::InvalidTransition { .. }) => {
                    prop_assert_eq!(before, engine.tasks());
                }
                Err(other) => prop_assert!(false, "unexpected error: {}", other),
            }
            prop_assert!(engine.is_consistent());
        }
    }

    #[test]
    fn blocked_is_never_accepted(tasks in snapshot_strategy(12), idx in any::<usize>()) {
        let mut engine = Engine::new(&tasks);
        let target = name(idx % tasks.len());

        let is_invalid_transition = matches!(
            engine.update_task_state(&target, TaskState::Blocked),
            Err(EngineError::InvalidTransition { .. })
        );
        prop_assert!(is_invalid_transition);
    }

    #[test]
    fn propagation_visits_each_task_at_most_once(
        tasks in snapshot_strategy(15),
        seeds in proptest::collection::vec(any::<usize>(), 1..5),
    ) {
        let mut engine = Engine::new(&tasks);
        let seeds: Vec<TaskId> = seeds.into_iter().map(|i| name(i % tasks.len())).collect();

        let report = engine.propagate(seeds);

        let unique: HashSet<&TaskId> = report.visited.iter().collect();
        prop_assert_eq!(unique.len(), report.visited.len());
    }
}

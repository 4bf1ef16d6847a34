//! Dependency graph for tasks
//!
//! Two explicit indices keyed by task id: forward (task -> the tasks it
//! depends on) and reverse (task -> the tasks that depend on it). The reverse
//! index also records edges from dependency ids that match no task, so a
//! dangling id still reaches its dependents.
//!
//! The graph is immutable once built. Dependency edits mean building a new one.

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;
use tracing::warn;

use super::id::TaskId;
use super::task::Task;

/// Forward and reverse dependency indices over a task collection
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// Known task ids, in the order they were first seen
    order: Vec<TaskId>,

    /// task -> dependency ids (as listed on the task)
    dependencies: HashMap<TaskId, Vec<TaskId>>,

    /// dependency id -> dependent task ids (first-seen order, no duplicates)
    dependents: HashMap<TaskId, Vec<TaskId>>,
}

impl DependencyGraph {
    /// Creates an empty dependency graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds both indices from a collection of tasks
    ///
    /// A repeated id replaces the earlier task's dependency list but keeps the
    /// position where the id was first seen.
    pub fn from_tasks<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> Self {
        let mut graph = Self::new();

        // First pass: nodes and forward edges
        for task in tasks {
            if graph
                .dependencies
                .insert(task.id.clone(), task.dependencies.clone())
                .is_none()
            {
                graph.order.push(task.id.clone());
            }
        }

        // Second pass: reverse edges
        for task_id in &graph.order {
            for dep_id in &graph.dependencies[task_id] {
                let dependents = graph.dependents.entry(dep_id.clone()).or_default();
                if !dependents.contains(task_id) {
                    dependents.push(task_id.clone());
                }
            }
        }

        graph
    }

    /// Returns the direct dependencies of a task
    pub fn dependencies_of(&self, task_id: &TaskId) -> &[TaskId] {
        self.dependencies
            .get(task_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Returns the direct dependents of a task (tasks that depend on it)
    pub fn dependents_of(&self, task_id: &TaskId) -> &[TaskId] {
        self.dependents
            .get(task_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Returns true if the graph contains the task
    pub fn contains(&self, task_id: &TaskId) -> bool {
        self.dependencies.contains_key(task_id)
    }

    /// Returns the number of tasks in the graph
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns true if the graph is empty
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Returns all task ids in first-seen order
    pub fn task_ids(&self) -> impl Iterator<Item = &TaskId> {
        self.order.iter()
    }

    /// Returns dependency ids that match no task in the graph
    pub fn dangling(&self) -> Vec<(&TaskId, &TaskId)> {
        self.order
            .iter()
            .flat_map(|task_id| {
                self.dependencies_of(task_id)
                    .iter()
                    .filter(|dep_id| !self.contains(dep_id))
                    .map(move |dep_id| (task_id, dep_id))
            })
            .collect()
    }

    /// Builds a petgraph view with edges pointing from dependency to dependent
    ///
    /// Dangling dependencies have no node and contribute no edge.
    fn to_digraph(&self) -> DiGraph<&TaskId, ()> {
        let mut graph: DiGraph<&TaskId, ()> = DiGraph::with_capacity(self.order.len(), 0);
        let mut node_map: HashMap<&TaskId, NodeIndex> = HashMap::new();

        for task_id in &self.order {
            node_map.insert(task_id, graph.add_node(task_id));
        }

        for task_id in &self.order {
            let task_idx = node_map[task_id];
            for dep_id in self.dependencies_of(task_id) {
                if let Some(&dep_idx) = node_map.get(dep_id) {
                    graph.update_edge(dep_idx, task_idx, ());
                }
            }
        }

        graph
    }

    /// Returns all task ids with every dependency ahead of its dependents
    ///
    /// Dangling dependencies impose no ordering. If the graph is cyclic the
    /// first-seen order is returned unchanged.
    pub fn dependency_order(&self) -> Vec<TaskId> {
        let graph = self.to_digraph();

        match toposort(&graph, None) {
            Ok(sorted) => sorted.into_iter().map(|idx| graph[idx].clone()).collect(),
            Err(cycle) => {
                warn!(
                    task = %graph[cycle.node_id()],
                    "dependency cycle detected; falling back to snapshot order"
                );
                self.order.clone()
            }
        }
    }
}

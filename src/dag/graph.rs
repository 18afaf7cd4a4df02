// src/dag/graph.rs

use std::collections::HashMap;

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::registry::Registry;

/// Directed graph of tasks, keyed by name.
///
/// Edge direction is dep -> task: for a task `test` with `deps = ["build"]`
/// the graph holds the edge `build -> test`. Reference validity is checked
/// before construction (see [`Registry::check_references`] and
/// `config::validate`), so unknown names are simply ignored here.
#[derive(Debug)]
pub struct DagGraph {
    graph: DiGraph<String, ()>,
    index: HashMap<String, NodeIndex>,
    /// Declaration position per task, for deterministic neighbour ordering.
    position: HashMap<String, usize>,
}

impl DagGraph {
    /// Build the graph over every task in the registry.
    pub fn from_registry(registry: &Registry) -> Self {
        let mut graph = DiGraph::new();
        let mut index = HashMap::new();
        let mut position = HashMap::new();

        for (pos, task) in registry.tasks().enumerate() {
            let idx = graph.add_node(task.name.clone());
            index.insert(task.name.clone(), idx);
            position.insert(task.name.clone(), pos);
        }

        for task in registry.tasks() {
            let task_idx = index[&task.name];
            for dep in task.deps.iter() {
                if let Some(&dep_idx) = index.get(dep) {
                    graph.add_edge(dep_idx, task_idx, ());
                }
            }
        }

        Self {
            graph,
            index,
            position,
        }
    }

    /// All task names, in declaration order.
    pub fn tasks(&self) -> impl Iterator<Item = &str> {
        self.graph.node_indices().map(|i| self.graph[i].as_str())
    }

    /// Immediate dependencies of a task, sorted by declaration order.
    pub fn dependencies_of(&self, name: &str) -> Vec<&str> {
        self.neighbours(name, Direction::Incoming)
    }

    /// Immediate dependents of a task, sorted by declaration order.
    pub fn dependents_of(&self, name: &str) -> Vec<&str> {
        self.neighbours(name, Direction::Outgoing)
    }

    fn neighbours(&self, name: &str, dir: Direction) -> Vec<&str> {
        let Some(&idx) = self.index.get(name) else {
            return Vec::new();
        };

        let mut out: Vec<&str> = self
            .graph
            .neighbors_directed(idx, dir)
            .map(|i| self.graph[i].as_str())
            .collect();
        // petgraph iterates neighbours in reverse insertion order; re-sort by
        // declaration position so traversal stays deterministic.
        out.sort_by_key(|n| self.position.get(*n).copied().unwrap_or(usize::MAX));
        out
    }
}

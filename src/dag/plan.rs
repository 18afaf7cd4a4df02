// src/dag/plan.rs

//! Execution-plan construction.
//!
//! Depth-first traversal from the requested tasks through their transitive
//! `deps`, with three-colour visit state. Completion order yields a
//! topological order where every dependency precedes its dependents; ties
//! between independent tasks fall back to declaration order because roots
//! and dependency lists are visited in that order.

use std::collections::HashMap;

use tracing::debug;

use crate::dag::graph::DagGraph;
use crate::errors::{Result, RundagError};
use crate::registry::Registry;

/// Ordered list of tasks selected to satisfy a request.
///
/// A task never appears before any task it depends on. The plan is a pure
/// value; nothing here touches the filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionPlan {
    tasks: Vec<String>,
}

impl ExecutionPlan {
    pub fn tasks(&self) -> &[String] {
        &self.tasks
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tasks.iter().any(|t| t == name)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    InProgress,
    Done,
}

/// Build an [`ExecutionPlan`] covering `requested` and the transitive closure
/// of their dependencies.
///
/// Fails with [`RundagError::UnknownRequest`] for a name not in the registry
/// and with [`RundagError::Cycle`] (naming the full cycle path) when the
/// traversal re-enters an in-progress task.
pub fn build_plan(
    registry: &Registry,
    graph: &DagGraph,
    requested: &[String],
) -> Result<ExecutionPlan> {
    for name in requested {
        if !registry.contains(name) {
            return Err(RundagError::UnknownRequest(name.clone()));
        }
    }

    let mut state: HashMap<&str, Visit> = HashMap::new();
    let mut stack: Vec<String> = Vec::new();
    let mut order: Vec<String> = Vec::new();

    for name in requested {
        visit(name, graph, &mut state, &mut stack, &mut order)?;
    }

    debug!(tasks = ?order, "execution plan built");
    Ok(ExecutionPlan { tasks: order })
}

fn visit<'g>(
    name: &'g str,
    graph: &'g DagGraph,
    state: &mut HashMap<&'g str, Visit>,
    stack: &mut Vec<String>,
    order: &mut Vec<String>,
) -> Result<()> {
    match state.get(name) {
        Some(Visit::Done) => return Ok(()),
        Some(Visit::InProgress) => {
            // Re-entered a task still on the traversal stack: the slice of
            // the stack from its first occurrence is the cycle.
            let start = stack.iter().position(|t| t == name).unwrap_or(0);
            let mut cycle: Vec<String> = stack[start..].to_vec();
            cycle.push(name.to_string());
            return Err(RundagError::Cycle { cycle });
        }
        None => {}
    }

    state.insert(name, Visit::InProgress);
    stack.push(name.to_string());

    for dep in graph.dependencies_of(name) {
        visit(dep, graph, state, stack, order)?;
    }

    stack.pop();
    state.insert(name, Visit::Done);
    order.push(name.to_string());
    Ok(())
}

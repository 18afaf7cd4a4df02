// src/dag/mod.rs

//! Dependency graph and execution planning.
//!
//! - [`graph`] holds the directed graph of tasks (edge dep -> task).
//! - [`plan`] turns a set of requested task names into an ordered
//!   [`plan::ExecutionPlan`], detecting cycles along the way.

pub mod graph;
pub mod plan;

pub use graph::DagGraph;
pub use plan::{ExecutionPlan, build_plan};

// src/config/validate.rs

use std::collections::{HashMap, HashSet};

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::ConfigFile;
use crate::errors::{Result, RundagError};

/// Run semantic validation against a loaded configuration.
///
/// This checks:
/// - there is at least one task
/// - task names are unique, non-empty, and usable as state-store keys
/// - `jobs >= 1`
/// - all `deps` entries refer to declared tasks
/// - no task depends on itself
/// - the whole task graph is acyclic, even in parts no request touches
///
/// The execution-plan builder re-detects cycles on the requested subgraph;
/// the check here guarantees a cyclic registry never executes anything at
/// all, regardless of which tasks are requested.
pub fn validate_config(cfg: &ConfigFile) -> Result<()> {
    ensure_has_tasks(cfg)?;
    validate_global_config(cfg)?;
    validate_task_names(cfg)?;
    validate_task_dependencies(cfg)?;
    validate_dag(cfg)?;
    Ok(())
}

fn ensure_has_tasks(cfg: &ConfigFile) -> Result<()> {
    if cfg.task.is_empty() {
        return Err(RundagError::Config(
            "config must contain at least one [[task]] entry".to_string(),
        ));
    }
    Ok(())
}

fn validate_global_config(cfg: &ConfigFile) -> Result<()> {
    if cfg.config.jobs == 0 {
        return Err(RundagError::Config(
            "[config].jobs must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_task_names(cfg: &ConfigFile) -> Result<()> {
    let mut seen = HashSet::new();

    for task in cfg.task.iter() {
        if task.name.is_empty() {
            return Err(RundagError::Config(
                "task name must not be empty".to_string(),
            ));
        }
        // Each task maps to one file in the state store directory.
        if task.name.contains('/') || task.name.contains('\\') {
            return Err(RundagError::Config(format!(
                "task name '{}' must not contain path separators",
                task.name
            )));
        }
        if !seen.insert(task.name.as_str()) {
            return Err(RundagError::Config(format!(
                "duplicate task name '{}'",
                task.name
            )));
        }
    }

    Ok(())
}

fn validate_task_dependencies(cfg: &ConfigFile) -> Result<()> {
    let names: HashSet<&str> = cfg.task.iter().map(|t| t.name.as_str()).collect();

    for task in cfg.task.iter() {
        for dep in task.deps.iter() {
            if !names.contains(dep.as_str()) {
                return Err(RundagError::UnknownTask {
                    task: task.name.clone(),
                    dep: dep.clone(),
                });
            }
            if dep == &task.name {
                return Err(RundagError::Config(format!(
                    "task '{}' cannot depend on itself",
                    task.name
                )));
            }
        }
    }

    Ok(())
}

fn validate_dag(cfg: &ConfigFile) -> Result<()> {
    // Edge direction: dep -> task. For `name = "b", deps = ["a"]` we add
    // the edge a -> b. A topological sort fails iff there is a cycle.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for task in cfg.task.iter() {
        graph.add_node(task.name.as_str());
    }
    for task in cfg.task.iter() {
        for dep in task.deps.iter() {
            graph.add_edge(dep.as_str(), task.name.as_str(), ());
        }
    }

    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => Err(RundagError::Cycle {
            cycle: cycle_through(cfg, cycle.node_id()),
        }),
    }
}

/// Reconstruct the full cycle path through `start`, a task petgraph reported
/// as part of a cycle. Follows `deps` edges until `start` is reached again,
/// closing the path the same way the plan builder does (`a -> b -> a`).
fn cycle_through(cfg: &ConfigFile, start: &str) -> Vec<String> {
    let deps_of: HashMap<&str, &[String]> = cfg
        .task
        .iter()
        .map(|t| (t.name.as_str(), t.deps.as_slice()))
        .collect();

    let mut path: Vec<&str> = vec![start];
    let mut visited: HashSet<&str> = HashSet::from([start]);
    walk(start, start, &deps_of, &mut path, &mut visited);

    let mut cycle: Vec<String> = path.into_iter().map(|s| s.to_string()).collect();
    cycle.push(start.to_string());
    cycle
}

fn walk<'c>(
    node: &'c str,
    start: &str,
    deps_of: &HashMap<&'c str, &'c [String]>,
    path: &mut Vec<&'c str>,
    visited: &mut HashSet<&'c str>,
) -> bool {
    for dep in deps_of.get(node).copied().unwrap_or(&[]) {
        if dep.as_str() == start {
            return true;
        }
        if visited.insert(dep.as_str()) {
            path.push(dep.as_str());
            if walk(dep, start, deps_of, path, visited) {
                return true;
            }
            path.pop();
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use crate::config::loader::load_from_str;
    use crate::errors::RundagError;

    #[test]
    fn rejects_unknown_dependency() {
        let err = load_from_str(
            r#"
            [[task]]
            name = "test"
            actions = ["cargo test"]
            deps = ["build"]
            "#,
        )
        .unwrap_err();

        match err {
            RundagError::UnknownTask { task, dep } => {
                assert_eq!(task, "test");
                assert_eq!(dep, "build");
            }
            other => panic!("expected UnknownTask, got {other:?}"),
        }
    }

    #[test]
    fn rejects_duplicate_names_and_self_deps() {
        assert!(
            load_from_str(
                r#"
                [[task]]
                name = "a"
                [[task]]
                name = "a"
                "#,
            )
            .is_err()
        );

        assert!(
            load_from_str(
                r#"
                [[task]]
                name = "a"
                deps = ["a"]
                "#,
            )
            .is_err()
        );
    }

    #[test]
    fn detects_cycles_anywhere_in_the_registry() {
        let err = load_from_str(
            r#"
            [[task]]
            name = "a"
            deps = ["b"]

            [[task]]
            name = "b"
            deps = ["a"]

            [[task]]
            name = "c"
            "#,
        )
        .unwrap_err();

        match err {
            RundagError::Cycle { cycle } => {
                assert!(cycle.contains(&"a".to_string()));
                assert!(cycle.contains(&"b".to_string()));
                assert_eq!(cycle.first(), cycle.last());
            }
            other => panic!("expected Cycle, got {other:?}"),
        }
    }

    #[test]
    fn applies_defaults() {
        let cfg = load_from_str(
            r#"
            [[task]]
            name = "lint"
            actions = ["cargo clippy"]
            "#,
        )
        .unwrap();

        assert_eq!(cfg.config.jobs, 1);
        assert!(!cfg.config.fail_fast);
        assert_eq!(cfg.config.state_dir, ".rundag");
        assert!(cfg.config.default_tasks.is_empty());
    }
}

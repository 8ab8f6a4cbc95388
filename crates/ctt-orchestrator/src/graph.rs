//! The incremental build graph: one node per source file, tracking how far
//! each has progressed through parsing/resolution/type-checking, and which
//! files depend on which.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Where a node sits in the compile pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileState {
    /// Never processed, or invalidated by a source change.
    Fresh,
    Parsed,
    Resolved,
    TypeChecked,
    /// Processing was attempted and failed; stays failed until the source
    /// changes again (which resets it to `Fresh`).
    Failed,
}

#[derive(Debug, Clone)]
struct BuildNode {
    state: CompileState,
    /// Files this node's successful resolution/type-checking depends on.
    depends_on: HashSet<PathBuf>,
}

/// The dependency graph driving incremental (re)compilation.
#[derive(Debug, Clone, Default)]
pub struct BuildGraph {
    nodes: HashMap<PathBuf, BuildNode>,
    /// Reverse edges: `dependents[p]` is every node that depends on `p`.
    dependents: HashMap<PathBuf, HashSet<PathBuf>>,
}

impl BuildGraph {
    pub fn new() -> Self {
        BuildGraph::default()
    }

    /// Registers `path` if it isn't already known, leaving it `Fresh`.
    pub fn ensure_node(&mut self, path: &Path) {
        self.nodes.entry(path.to_path_buf()).or_insert_with(|| BuildNode {
            state: CompileState::Fresh,
            depends_on: HashSet::new(),
        });
    }

    pub fn state(&self, path: &Path) -> CompileState {
        self.nodes.get(path).map(|n| n.state).unwrap_or(CompileState::Fresh)
    }

    /// Every file this node's resolution/type-checking depends on.
    pub fn dependencies(&self, path: &Path) -> Vec<PathBuf> {
        self.nodes
            .get(path)
            .map(|n| n.depends_on.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Drops `path` and every edge touching it, the reaction to a source
    /// file being deleted rather than merely modified.
    pub fn remove_node(&mut self, path: &Path) {
        self.nodes.remove(path);
        if let Some(dependents) = self.dependents.remove(path) {
            for dependent in &dependents {
                if let Some(node) = self.nodes.get_mut(dependent) {
                    node.depends_on.remove(path);
                }
            }
        }
        for dependents in self.dependents.values_mut() {
            dependents.remove(path);
        }
    }

    /// Advances `path` to `state`. Callers are expected to only move a node
    /// forward through `Fresh -> Parsed -> Resolved -> TypeChecked`, or to
    /// `Failed` from anywhere; `invalidate` is the only way back to `Fresh`.
    pub fn set_state(&mut self, path: &Path, state: CompileState) {
        self.ensure_node(path);
        self.nodes.get_mut(path).unwrap().state = state;
    }

    /// Records that `dependent` depends on `dependency`.
    pub fn add_dependency(&mut self, dependent: &Path, dependency: &Path) {
        self.ensure_node(dependent);
        self.ensure_node(dependency);
        self.nodes
            .get_mut(dependent)
            .unwrap()
            .depends_on
            .insert(dependency.to_path_buf());
        self.dependents
            .entry(dependency.to_path_buf())
            .or_default()
            .insert(dependent.to_path_buf());
    }

    /// Resets `path`, and transitively every node that (directly or
    /// indirectly) depends on it, back to `Fresh` — the reaction to a source
    /// file changing on disk.
    pub fn invalidate(&mut self, path: &Path) {
        let mut stack = vec![path.to_path_buf()];
        let mut seen = HashSet::new();
        while let Some(current) = stack.pop() {
            if !seen.insert(current.clone()) {
                continue;
            }
            if let Some(node) = self.nodes.get_mut(&current) {
                node.state = CompileState::Fresh;
            }
            if let Some(deps) = self.dependents.get(&current) {
                stack.extend(deps.iter().cloned());
            }
        }
    }

    /// A topological compile order covering every registered node, suitable
    /// for driving a single pass of parse/resolve/type-check. Returns `None`
    /// if the dependency graph has a cycle.
    pub fn compile_order(&self) -> Option<Vec<PathBuf>> {
        // `in_degree[p]` counts how many of `p`'s dependencies haven't run yet.
        let mut in_degree: HashMap<PathBuf, usize> = self
            .nodes
            .iter()
            .map(|(path, node)| (path.clone(), node.depends_on.len()))
            .collect();

        let mut ready: Vec<PathBuf> = in_degree
            .iter()
            .filter(|(_, count)| **count == 0)
            .map(|(p, _)| p.clone())
            .collect();
        ready.sort();

        let mut order = Vec::with_capacity(self.nodes.len());
        let mut remaining = in_degree;
        while let Some(path) = ready.pop() {
            order.push(path.clone());
            if let Some(dependents) = self.dependents.get(&path) {
                let mut newly_ready = Vec::new();
                for dependent in dependents {
                    if let Some(count) = remaining.get_mut(dependent) {
                        *count -= 1;
                        if *count == 0 {
                            newly_ready.push(dependent.clone());
                        }
                    }
                }
                newly_ready.sort();
                ready.extend(newly_ready);
            }
        }

        if order.len() == self.nodes.len() {
            Some(order)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_node_starts_fresh() {
        let mut graph = BuildGraph::new();
        let path = PathBuf::from("a.ctt");
        graph.ensure_node(&path);
        assert_eq!(graph.state(&path), CompileState::Fresh);
    }

    #[test]
    fn invalidating_a_file_resets_its_dependents_transitively() {
        let mut graph = BuildGraph::new();
        let a = PathBuf::from("a.ctt");
        let b = PathBuf::from("b.ctt");
        let c = PathBuf::from("c.ctt");
        graph.add_dependency(&b, &a);
        graph.add_dependency(&c, &b);
        graph.set_state(&a, CompileState::TypeChecked);
        graph.set_state(&b, CompileState::TypeChecked);
        graph.set_state(&c, CompileState::TypeChecked);

        graph.invalidate(&a);

        assert_eq!(graph.state(&a), CompileState::Fresh);
        assert_eq!(graph.state(&b), CompileState::Fresh);
        assert_eq!(graph.state(&c), CompileState::Fresh);
    }

    #[test]
    fn compile_order_respects_dependencies() {
        let mut graph = BuildGraph::new();
        let a = PathBuf::from("a.ctt");
        let b = PathBuf::from("b.ctt");
        graph.add_dependency(&b, &a);

        let order = graph.compile_order().unwrap();
        let pos_a = order.iter().position(|p| p == &a).unwrap();
        let pos_b = order.iter().position(|p| p == &b).unwrap();
        assert!(pos_a < pos_b);
    }

    #[test]
    fn removing_a_node_drops_its_dependency_edges() {
        let mut graph = BuildGraph::new();
        let a = PathBuf::from("a.ctt");
        let b = PathBuf::from("b.ctt");
        graph.add_dependency(&b, &a);

        graph.remove_node(&a);

        assert_eq!(graph.dependencies(&b), Vec::<PathBuf>::new());
        let order = graph.compile_order().unwrap();
        assert_eq!(order, vec![b]);
    }

    #[test]
    fn compile_order_detects_cycles() {
        let mut graph = BuildGraph::new();
        let a = PathBuf::from("a.ctt");
        let b = PathBuf::from("b.ctt");
        graph.add_dependency(&a, &b);
        graph.add_dependency(&b, &a);
        assert!(graph.compile_order().is_none());
    }
}

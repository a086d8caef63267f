//! Dependency graph for tasks
//!
//! Built fresh for every sequencing call and discarded afterwards. Nodes are
//! indices into the caller's task slice; edges run from a dependency to the
//! task that needs it, so `Incoming` neighbours are what a task depends on
//! and `Outgoing` neighbours are what it is required by.
//! Uses petgraph for storage.

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::HashMap;
use tracing::debug;

use super::error::SequenceError;
use super::id::TaskId;
use super::task::TaskNode;

/// A dependency graph over a borrowed task slice
#[derive(Debug)]
pub struct DependencyGraph<'a> {
    /// The tasks, in input order
    tasks: &'a [TaskNode],

    /// Node weight is the position of the task in `tasks`
    graph: DiGraph<usize, ()>,

    /// Map from TaskId to input position
    index: HashMap<&'a TaskId, usize>,
}

impl<'a> DependencyGraph<'a> {
    /// Builds a graph from a task slice
    ///
    /// Only duplicate IDs are rejected here. References to unknown tasks and
    /// self-references are left out of the edge set for the validator to
    /// report.
    pub fn build(tasks: &'a [TaskNode]) -> Result<Self, SequenceError> {
        let mut graph = DiGraph::with_capacity(tasks.len(), tasks.len());
        let mut index = HashMap::with_capacity(tasks.len());

        // First pass: add all nodes
        for (position, task) in tasks.iter().enumerate() {
            if index.insert(&task.id, position).is_some() {
                return Err(SequenceError::DuplicateId(task.id.clone()));
            }
            graph.add_node(position);
        }

        // Second pass: add all edges that resolve
        let mut edges = 0;
        for (position, task) in tasks.iter().enumerate() {
            for dep_id in &task.depends_on {
                match index.get(dep_id) {
                    Some(&dep) if dep != position => {
                        graph.add_edge(NodeIndex::new(dep), NodeIndex::new(position), ());
                        edges += 1;
                    }
                    _ => {}
                }
            }
        }

        debug!(nodes = tasks.len(), edges, "built dependency graph");

        Ok(Self {
            tasks,
            graph,
            index,
        })
    }

    /// The task at an input position
    pub fn task(&self, position: usize) -> &'a TaskNode {
        &self.tasks[position]
    }

    /// All tasks in input order
    pub fn tasks(&self) -> &'a [TaskNode] {
        self.tasks
    }

    /// Input position of a task ID
    pub fn index_of(&self, id: &TaskId) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Returns true if the graph contains the task
    pub fn contains(&self, id: &TaskId) -> bool {
        self.index.contains_key(id)
    }

    /// Positions of the tasks `position` depends on, in input order
    pub fn dependencies(&self, position: usize) -> Vec<usize> {
        self.neighbors(position, Direction::Incoming)
    }

    /// Positions of the tasks that depend on `position`, in input order
    pub fn dependents(&self, position: usize) -> Vec<usize> {
        self.neighbors(position, Direction::Outgoing)
    }

    /// Number of resolved dependencies of a task
    pub fn in_degree(&self, position: usize) -> usize {
        self.graph
            .neighbors_directed(NodeIndex::new(position), Direction::Incoming)
            .count()
    }

    fn neighbors(&self, position: usize, direction: Direction) -> Vec<usize> {
        let mut result: Vec<usize> = self
            .graph
            .neighbors_directed(NodeIndex::new(position), direction)
            .map(|idx| self.graph[idx])
            .collect();
        result.sort_unstable();
        result
    }

    /// Returns the number of tasks in the graph
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Returns true if the graph is empty
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Returns the number of resolved dependency edges
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> TaskId {
        s.parse().unwrap()
    }

    fn task(name: &str, deps: &[&str]) -> TaskNode {
        deps.iter()
            .fold(TaskNode::new(id(name), name), |t, d| t.depends_on(id(d)))
    }

    #[test]
    fn empty_graph() {
        let graph = DependencyGraph::build(&[]).unwrap();
        assert!(graph.is_empty());
        assert_eq!(graph.len(), 0);
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn builds_forward_and_reverse_adjacency() {
        let tasks = vec![task("A", &[]), task("B", &["A"]), task("C", &["A", "B"])];
        let graph = DependencyGraph::build(&tasks).unwrap();

        assert_eq!(graph.len(), 3);
        assert_eq!(graph.edge_count(), 3);
        assert_eq!(graph.dependencies(2), vec![0, 1]);
        assert_eq!(graph.dependents(0), vec![1, 2]);
        assert_eq!(graph.in_degree(0), 0);
        assert_eq!(graph.in_degree(2), 2);
        assert_eq!(graph.index_of(&id("C")), Some(2));
        assert_eq!(graph.task(1).id, id("B"));
    }

    #[test]
    fn duplicate_id_rejected() {
        let tasks = vec![task("A", &[]), task("B", &[]), task("A", &[])];
        let result = DependencyGraph::build(&tasks);
        assert_eq!(result.unwrap_err(), SequenceError::DuplicateId(id("A")));
    }

    #[test]
    fn dangling_and_self_references_are_not_edges() {
        let tasks = vec![task("A", &["A"]), task("B", &["Z"])];
        let graph = DependencyGraph::build(&tasks).unwrap();

        assert_eq!(graph.edge_count(), 0);
        assert!(graph.dependencies(0).is_empty());
        assert!(!graph.contains(&id("Z")));
    }

    #[test]
    fn input_order_is_preserved() {
        let tasks = vec![task("Z", &[]), task("M", &[]), task("A", &["Z", "M"])];
        let graph = DependencyGraph::build(&tasks).unwrap();

        let ids: Vec<_> = graph.tasks().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["Z", "M", "A"]);
        assert_eq!(graph.dependencies(2), vec![0, 1]);
    }
}

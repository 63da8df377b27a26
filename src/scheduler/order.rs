//! Dependency-respecting priority ordering.
//!
//! # Algorithm
//!
//! Kahn's topological sort with a priority queue as the ready set:
//! 1. Count unmet dependencies (in-degree) for every item.
//! 2. Among items with no unmet dependencies, take the lowest priority
//!    value; ties go to the earlier input position.
//! 3. Append it and release its dependents.
//!
//! Priority only decides among ready items; it never moves an item ahead of
//! its dependencies.
//!
//! # Complexity
//! O((V + E) log V) with the binary heap.
//!
//! # Reference
//! Kahn (1962), "Topological sorting of large networks"

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashSet};

use tracing::{instrument, warn};

use crate::error::{Result, SchedulingError};
use crate::models::WorkItem;
use crate::validation::DependencyGraph;

/// Produces a total order over a validated backlog.
#[derive(Debug, Clone, Copy, Default)]
pub struct BacklogOrderer;

impl BacklogOrderer {
    /// Creates an orderer.
    pub fn new() -> Self {
        Self
    }

    /// Returns indices into `items` in execution order.
    ///
    /// Items with a duplicate ID are placed once, at their first occurrence.
    ///
    /// # Errors
    /// [`SchedulingError::UnplaceableItems`] when some items can never become
    /// ready. That only happens with a cyclic graph, i.e. when cycle
    /// validation was skipped.
    #[instrument(skip_all, fields(items = items.len()))]
    pub fn order_indices(&self, items: &[WorkItem]) -> Result<Vec<usize>> {
        let graph = DependencyGraph::from_items(items);
        let n = graph.len();

        // Graph nodes are first occurrences, in input order.
        let mut node_to_item = Vec::with_capacity(n);
        let mut seen = HashSet::new();
        for (idx, item) in items.iter().enumerate() {
            if seen.insert(item.id.as_str()) {
                node_to_item.push(idx);
            }
        }

        let mut in_degree = vec![0usize; n];
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); n];
        for node in 0..n {
            for &dep in graph.node_deps(node) {
                in_degree[node] += 1;
                dependents[dep].push(node);
            }
        }

        let priority = |node: usize| items[node_to_item[node]].priority;
        let mut ready: BinaryHeap<Reverse<(i32, usize)>> = (0..n)
            .filter(|&node| in_degree[node] == 0)
            .map(|node| Reverse((priority(node), node)))
            .collect();

        let mut order = Vec::with_capacity(n);
        while let Some(Reverse((_, node))) = ready.pop() {
            order.push(node_to_item[node]);
            for &next in &dependents[node] {
                in_degree[next] -= 1;
                if in_degree[next] == 0 {
                    ready.push(Reverse((priority(next), next)));
                }
            }
        }

        if order.len() < n {
            let remaining: Vec<String> = (0..n)
                .filter(|&node| in_degree[node] > 0)
                .map(|node| graph.ids()[node].clone())
                .collect();
            warn!(unplaced = remaining.len(), "ordering left items unplaced");
            return Err(SchedulingError::UnplaceableItems { remaining });
        }

        Ok(order)
    }

    /// Returns cloned items in execution order.
    pub fn order(&self, items: &[WorkItem]) -> Result<Vec<WorkItem>> {
        Ok(self
            .order_indices(items)?
            .into_iter()
            .map(|idx| items[idx].clone())
            .collect())
    }
}

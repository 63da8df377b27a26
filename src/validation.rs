//! Input validation for backlogs.
//!
//! Checks structural integrity of work items before ordering. Detects:
//! - Duplicate IDs
//! - Dependencies on items that don't exist
//! - Circular dependencies (DAG validation, with the offending path)
//!
//! Cycle detection is also available as a hypothetical check: "would adding
//! edge `from -> to` close a cycle?" The check runs on a copy of the graph and
//! never touches the caller's items.
//!
//! # Reference
//! Cormen et al. (2009), "Introduction to Algorithms", Ch. 22.3 (DFS colouring)

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::error::{Result, SchedulingError};
use crate::models::WorkItem;

/// Validation result.
pub type ValidationResult = std::result::Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two items share the same ID.
    DuplicateId,
    /// An item depends on an ID that isn't in the backlog.
    UnknownDependency,
    /// Dependency graph contains a cycle.
    CyclicDependency,
}

impl ValidationError {
    pub(crate) fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Dependency view over a backlog: item → items it depends on.
///
/// Built fresh from a slice of items; nodes keep input order and each
/// dependency list keeps declaration order with duplicates removed.
/// Dependencies on unknown IDs are not edges.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    ids: Vec<String>,
    index: HashMap<String, usize>,
    deps: Vec<Vec<usize>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    Unvisited,
    InProgress,
    Done,
}

impl DependencyGraph {
    /// Builds the graph from items. Later duplicates of an ID are ignored.
    pub fn from_items(items: &[WorkItem]) -> Self {
        let mut ids = Vec::with_capacity(items.len());
        let mut index = HashMap::with_capacity(items.len());
        for item in items {
            if !index.contains_key(&item.id) {
                index.insert(item.id.clone(), ids.len());
                ids.push(item.id.clone());
            }
        }

        let mut deps = vec![Vec::new(); ids.len()];
        let mut seen_owner = HashSet::new();
        for item in items {
            // Only the first item carrying an ID contributes edges.
            if !seen_owner.insert(item.id.as_str()) {
                continue;
            }
            let node = index[&item.id];
            for dep in &item.dependencies {
                if let Some(&target) = index.get(dep) {
                    if !deps[node].contains(&target) {
                        deps[node].push(target);
                    }
                }
            }
        }

        Self { ids, index, deps }
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Whether `id` is a node.
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Node IDs in input order.
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// Dependencies of `id`, in declaration order.
    pub fn dependencies_of(&self, id: &str) -> Vec<&str> {
        match self.index.get(id) {
            Some(&node) => self.deps[node].iter().map(|&d| self.ids[d].as_str()).collect(),
            None => Vec::new(),
        }
    }

    pub(crate) fn node_deps(&self, node: usize) -> &[usize] {
        &self.deps[node]
    }

    /// Copy of this graph with the edge "`from` depends on `to`" added.
    ///
    /// # Errors
    /// [`SchedulingError::UnknownItem`] if either end isn't a node.
    pub fn with_edge(&self, from: &str, to: &str) -> Result<Self> {
        let from_node = *self
            .index
            .get(from)
            .ok_or_else(|| SchedulingError::UnknownItem(from.to_string()))?;
        let to_node = *self
            .index
            .get(to)
            .ok_or_else(|| SchedulingError::UnknownItem(to.to_string()))?;

        let mut graph = self.clone();
        if !graph.deps[from_node].contains(&to_node) {
            graph.deps[from_node].push(to_node);
        }
        Ok(graph)
    }

    /// Finds a dependency cycle, if any.
    ///
    /// Iterative three-colour DFS: nodes are started in input order and
    /// edges followed in declaration order. On a back-edge to an in-progress
    /// node, the active stack from that node to the current one is the cycle.
    /// The returned path repeats its first ID at the end; each consecutive
    /// pair `(a, b)` is a real edge "a depends on b". A self-dependency yields
    /// `[a, a]`.
    pub fn find_cycle(&self) -> Option<Vec<String>> {
        let mut color = vec![Color::Unvisited; self.ids.len()];
        // (node, index of the next dependency to visit)
        let mut stack: Vec<(usize, usize)> = Vec::new();

        for root in 0..self.ids.len() {
            if color[root] != Color::Unvisited {
                continue;
            }
            color[root] = Color::InProgress;
            stack.push((root, 0));

            while let Some(top) = stack.last_mut() {
                let (node, next) = *top;
                match self.deps[node].get(next) {
                    Some(&dep) => {
                        top.1 += 1;
                        match color[dep] {
                            Color::Unvisited => {
                                color[dep] = Color::InProgress;
                                stack.push((dep, 0));
                            }
                            Color::InProgress => {
                                let pos = stack.iter().position(|&(n, _)| n == dep).unwrap_or(0);
                                let mut path: Vec<String> = stack[pos..]
                                    .iter()
                                    .map(|&(n, _)| self.ids[n].clone())
                                    .collect();
                                path.push(self.ids[dep].clone());
                                debug!(cycle = %path.join(" -> "), "dependency cycle found");
                                return Some(path);
                            }
                            Color::Done => {}
                        }
                    }
                    None => {
                        color[node] = Color::Done;
                        stack.pop();
                    }
                }
            }
        }

        None
    }
}

/// Fails with [`SchedulingError::CyclicDependency`] if the items' dependency
/// graph has a cycle.
pub fn ensure_acyclic(items: &[WorkItem]) -> Result<()> {
    match DependencyGraph::from_items(items).find_cycle() {
        Some(path) => Err(SchedulingError::CyclicDependency { path }),
        None => Ok(()),
    }
}

/// Checks whether adding "`from_id` depends on `to_id`" would close a cycle.
///
/// The caller's items are not modified; the check runs on a copied graph.
///
/// # Errors
/// - [`SchedulingError::UnknownItem`] if either ID isn't in `items`.
/// - [`SchedulingError::CyclicDependency`] with the cycle the edge would close.
///
/// # Example
/// ```
/// use u_backlog::models::WorkItem;
/// use u_backlog::validation::validate_dependency;
/// use u_backlog::SchedulingError;
///
/// let items = vec![
///     WorkItem::new("A").with_dependency("B"),
///     WorkItem::new("B").with_dependency("C"),
///     WorkItem::new("C"),
/// ];
/// match validate_dependency(&items, "C", "A") {
///     Err(SchedulingError::CyclicDependency { path }) => assert_eq!(path, ["A", "B", "C", "A"]),
///     other => panic!("expected cycle, got {other:?}"),
/// }
/// ```
pub fn validate_dependency(items: &[WorkItem], from_id: &str, to_id: &str) -> Result<()> {
    let graph = DependencyGraph::from_items(items).with_edge(from_id, to_id)?;
    match graph.find_cycle() {
        Some(path) => Err(SchedulingError::CyclicDependency { path }),
        None => Ok(()),
    }
}

/// Validates the structure of a backlog.
///
/// Checks:
/// 1. No duplicate item IDs
/// 2. Every dependency references an existing item
/// 3. No circular dependencies
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_backlog(items: &[WorkItem]) -> ValidationResult {
    let mut errors = Vec::new();

    let mut ids = HashSet::new();
    for item in items {
        if !ids.insert(item.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate work item ID: {}", item.id),
            ));
        }
    }

    for item in items {
        for dep in &item.dependencies {
            if !ids.contains(dep.as_str()) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::UnknownDependency,
                    format!("Work item '{}' depends on unknown item '{}'", item.id, dep),
                ));
            }
        }
    }

    if let Some(path) = DependencyGraph::from_items(items).find_cycle() {
        errors.push(ValidationError::new(
            ValidationErrorKind::CyclicDependency,
            format!("Circular dependency: {}", path.join(" -> ")),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, deps: &[&str]) -> WorkItem {
        deps.iter().fold(WorkItem::new(id), |it, d| it.with_dependency(*d))
    }

    fn assert_real_cycle(items: &[WorkItem], path: &[String]) {
        assert!(path.len() >= 2);
        assert_eq!(path.first(), path.last());
        for pair in path.windows(2) {
            let owner = items.iter().find(|i| i.id == pair[0]).unwrap();
            assert!(owner.dependencies.contains(&pair[1]), "{} -> {} is not an edge", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_valid_backlog() {
        let items = vec![item("A", &[]), item("B", &["A"]), item("C", &["A", "B"])];
        assert!(validate_backlog(&items).is_ok());
        assert!(ensure_acyclic(&items).is_ok());
    }

    #[test]
    fn test_duplicate_id() {
        let items = vec![item("A", &[]), item("A", &[])];
        let errors = validate_backlog(&items).unwrap_err();
        assert!(errors.iter().any(|e| e.kind == ValidationErrorKind::DuplicateId));
    }

    #[test]
    fn test_unknown_dependency() {
        let items = vec![item("A", &["NOPE"])];
        let errors = validate_backlog(&items).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ValidationErrorKind::UnknownDependency);
        assert!(errors[0].message.contains("NOPE"));
    }

    #[test]
    fn test_three_node_cycle_path() {
        let items = vec![item("A", &["B"]), item("B", &["C"]), item("C", &["A"])];
        match ensure_acyclic(&items) {
            Err(SchedulingError::CyclicDependency { path }) => {
                assert_eq!(path, vec!["A", "B", "C", "A"]);
                assert_real_cycle(&items, &path);
            }
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn test_self_dependency() {
        let items = vec![item("A", &[]), item("B", &["B"])];
        match ensure_acyclic(&items) {
            Err(SchedulingError::CyclicDependency { path }) => assert_eq!(path, vec!["B", "B"]),
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn test_cycle_behind_acyclic_prefix() {
        // D -> A -> B -> C -> B: cycle is only B, C
        let items = vec![
            item("D", &["A"]),
            item("A", &["B"]),
            item("B", &["C"]),
            item("C", &["B"]),
        ];
        let path = DependencyGraph::from_items(&items).find_cycle().unwrap();
        assert_eq!(path, vec!["B", "C", "B"]);
        assert_real_cycle(&items, &path);
    }

    #[test]
    fn test_diamond_is_acyclic() {
        let items = vec![
            item("A", &[]),
            item("B", &["A"]),
            item("C", &["A"]),
            item("D", &["B", "C"]),
        ];
        assert!(DependencyGraph::from_items(&items).find_cycle().is_none());
    }

    #[test]
    fn test_hypothetical_edge_rejected() {
        // A depends on B, B depends on C; adding C -> A closes the loop
        let items = vec![item("A", &["B"]), item("B", &["C"]), item("C", &[])];
        match validate_dependency(&items, "C", "A") {
            Err(SchedulingError::CyclicDependency { path }) => {
                assert_eq!(path, vec!["A", "B", "C", "A"]);
            }
            other => panic!("expected cycle, got {other:?}"),
        }
        // caller's items untouched
        assert!(items[2].dependencies.is_empty());
    }

    #[test]
    fn test_hypothetical_edge_accepted() {
        let items = vec![item("A", &["B"]), item("B", &[]), item("C", &[])];
        assert!(validate_dependency(&items, "A", "C").is_ok());
        assert!(validate_dependency(&items, "C", "A").is_ok());
    }

    #[test]
    fn test_hypothetical_self_edge() {
        let items = vec![item("A", &[])];
        match validate_dependency(&items, "A", "A") {
            Err(SchedulingError::CyclicDependency { path }) => assert_eq!(path, vec!["A", "A"]),
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn test_hypothetical_unknown_item() {
        let items = vec![item("A", &[])];
        assert!(matches!(
            validate_dependency(&items, "A", "Z"),
            Err(SchedulingError::UnknownItem(id)) if id == "Z"
        ));
    }

    #[test]
    fn test_graph_dedupes_and_drops_unknown() {
        let items = vec![item("A", &[]), item("B", &["A", "A", "X"])];
        let graph = DependencyGraph::from_items(&items);
        assert_eq!(graph.len(), 2);
        assert_eq!(graph.dependencies_of("B"), vec!["A"]);
        assert!(graph.dependencies_of("X").is_empty());
        assert!(!graph.contains("X"));
    }

    #[test]
    fn test_long_chain_no_stack_overflow() {
        let n = 50_000;
        let mut items = vec![item("0", &[])];
        for i in 1..n {
            items.push(item(&i.to_string(), &[&(i - 1).to_string()]));
        }
        assert!(ensure_acyclic(&items).is_ok());

        // close it: 0 depends on the last
        items[0].dependencies.push((n - 1).to_string());
        let path = DependencyGraph::from_items(&items).find_cycle().unwrap();
        assert_eq!(path.len(), n + 1);
    }
}

//! Error types for the planning engine.
//!
//! Calendar arithmetic is total and never fails. Every other stage reports
//! through [`SchedulingError`].

use thiserror::Error;

use crate::validation::ValidationError;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, SchedulingError>;

/// Errors raised by the planning engine.
#[derive(Debug, Error)]
pub enum SchedulingError {
    /// The dependency graph contains a cycle.
    ///
    /// `path` starts and ends with the same item id; every consecutive
    /// pair `(a, b)` means "a depends on b".
    #[error("cyclic dependency: {}", .path.join(" -> "))]
    CyclicDependency { path: Vec<String> },

    /// Ordering could not place every item.
    ///
    /// Only reachable when cycle validation was skipped; callers should
    /// treat this as a bug, not as bad input.
    #[error("internal error: {} item(s) could not be ordered: {}", .remaining.len(), .remaining.join(", "))]
    UnplaceableItems { remaining: Vec<String> },

    /// Allocation was requested with an empty worker pool.
    #[error("no workers available for allocation")]
    NoWorkersAvailable,

    /// The allocation loop hit its iteration ceiling with items still pending.
    #[error("allocation stopped after {iterations} iterations with {} item(s) unallocated: {}", .pending.len(), .pending.join(", "))]
    IterationLimitExceeded {
        iterations: usize,
        pending: Vec<String>,
    },

    /// Structural problems in the backlog (duplicate ids, dangling dependencies).
    #[error("invalid backlog: {}", format_validation(.0))]
    InvalidBacklog(Vec<ValidationError>),

    /// An operation referenced an item id that is not in the backlog.
    #[error("unknown work item '{0}'")]
    UnknownItem(String),

    /// Schedule configuration failed validation.
    #[error("invalid schedule configuration: {0}")]
    InvalidConfig(String),

    /// Schedule configuration could not be parsed.
    #[error("failed to parse schedule configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// A backlog store failed to read or write.
    #[error("backlog store error: {0}")]
    Store(String),
}

fn format_validation(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

impl SchedulingError {
    /// Whether the caller can recover by changing its input and retrying.
    ///
    /// `UnplaceableItems` is the only non-recoverable kind: it signals a
    /// broken internal contract.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::UnplaceableItems { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ValidationErrorKind;

    #[test]
    fn test_cycle_display() {
        let err = SchedulingError::CyclicDependency {
            path: vec!["A".into(), "B".into(), "A".into()],
        };
        assert_eq!(err.to_string(), "cyclic dependency: A -> B -> A");
    }

    #[test]
    fn test_iteration_limit_display() {
        let err = SchedulingError::IterationLimitExceeded {
            iterations: 1000,
            pending: vec!["X".into(), "Y".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("1000 iterations"));
        assert!(msg.contains("X, Y"));
    }

    #[test]
    fn test_invalid_backlog_display() {
        let err = SchedulingError::InvalidBacklog(vec![ValidationError::new(
            ValidationErrorKind::DuplicateId,
            "Duplicate work item ID: A",
        )]);
        assert_eq!(err.to_string(), "invalid backlog: Duplicate work item ID: A");
    }

    #[test]
    fn test_recoverable() {
        assert!(SchedulingError::NoWorkersAvailable.is_recoverable());
        assert!(!SchedulingError::UnplaceableItems { remaining: vec![] }.is_recoverable());
    }
}

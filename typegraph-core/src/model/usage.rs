//! Reference edges recorded against a node.

use std::collections::BTreeSet;

use serde::Serialize;

/// Role a referencing member plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UsageRole {
    Field,
    Embedded,
    Parameter,
    Return,
}

/// One reference to a node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct UsageEdge {
    /// Canonical name of the referencing node (or function).
    pub referencer: String,
    /// Member name at the reference site; empty for embeddings and unnamed results.
    pub member: String,
    pub role: UsageRole,
}

impl UsageEdge {
    pub fn new(referencer: impl Into<String>, member: impl Into<String>, role: UsageRole) -> Self {
        Self {
            referencer: referencer.into(),
            member: member.into(),
            role,
        }
    }
}

/// All references to a node plus the derived embedded-only flag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UsageInfo {
    /// Edges in the order they were first recorded.
    pub edges: Vec<UsageEdge>,
    pub embedded_only: bool,
    #[serde(skip)]
    seen: BTreeSet<UsageEdge>,
    #[serde(skip)]
    embedded: usize,
}

impl UsageInfo {
    /// Append an edge unless the same reference site is already recorded.
    /// Returns true if the edge was new.
    pub fn record(&mut self, edge: UsageEdge) -> bool {
        if self.seen.len() != self.edges.len() {
            self.refresh();
        }
        if !self.seen.insert(edge.clone()) {
            return false;
        }
        if edge.role == UsageRole::Embedded {
            self.embedded += 1;
        }
        self.edges.push(edge);
        self.update_flag();
        true
    }

    /// Rebuild the index and recompute `embedded_only` from `edges`. Safe to
    /// call any number of times.
    pub fn refresh(&mut self) {
        self.seen = self.edges.iter().cloned().collect();
        self.embedded = self.edges.iter().filter(|e| e.role == UsageRole::Embedded).count();
        self.update_flag();
    }

    fn update_flag(&mut self) {
        self.embedded_only = self.embedded > 0 && self.embedded == self.edges.len();
    }

    pub fn embedded_in(&self) -> impl Iterator<Item = &UsageEdge> {
        self.edges.iter().filter(|e| e.role == UsageRole::Embedded)
    }

    pub fn referenced_in(&self) -> impl Iterator<Item = &UsageEdge> {
        self.edges.iter().filter(|e| e.role != UsageRole::Embedded)
    }

    pub fn is_used(&self) -> bool {
        !self.edges.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_only_flag() {
        let mut usage = UsageInfo::default();
        assert!(!usage.embedded_only);

        usage.record(UsageEdge::new("app.User", "", UsageRole::Embedded));
        assert!(usage.embedded_only);

        usage.record(UsageEdge::new("app.Order", "Owner", UsageRole::Field));
        assert!(!usage.embedded_only);
        assert_eq!(usage.embedded_in().count(), 1);
        assert_eq!(usage.referenced_in().count(), 1);
    }

    #[test]
    fn test_record_is_idempotent() {
        let mut usage = UsageInfo::default();
        assert!(usage.record(UsageEdge::new("app.User", "Friend", UsageRole::Field)));
        assert!(!usage.record(UsageEdge::new("app.User", "Friend", UsageRole::Field)));
        assert!(usage.record(UsageEdge::new("app.User", "Friend", UsageRole::Parameter)));
        assert_eq!(usage.edges.len(), 2);

        usage.refresh();
        usage.refresh();
        assert!(!usage.embedded_only);
    }

    #[test]
    fn test_record_after_direct_edit() {
        let mut usage = UsageInfo::default();
        usage.edges.push(UsageEdge::new("app.User", "", UsageRole::Embedded));
        assert!(!usage.record(UsageEdge::new("app.User", "", UsageRole::Embedded)));
        assert!(usage.embedded_only);
        assert!(usage.record(UsageEdge::new("app.Admin", "", UsageRole::Embedded)));
        assert_eq!(usage.embedded_in().count(), 2);
        assert!(usage.embedded_only);
    }
}

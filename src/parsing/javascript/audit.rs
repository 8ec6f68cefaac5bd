//! Node coverage auditing for the JavaScript parser.
//!
//! Tree-sitter grammars expose hundreds of node kinds; a parser only
//! explicitly handles the subset relevant to symbol/relationship
//! extraction. This module compares what a parser actually touched
//! (via `NodeTracker`) against the full grammar's node kind table, so a
//! grammar upgrade that introduces new constructs doesn't silently go
//! unextracted.

use crate::parsing::{HandledNode, NodeTracker};
use std::collections::BTreeSet;

/// Coverage report for a single parse pass.
#[derive(Debug)]
pub struct AuditReport {
    pub handled: BTreeSet<String>,
    pub total_grammar_nodes: usize,
}

impl AuditReport {
    pub fn coverage_percent(&self) -> f64 {
        if self.total_grammar_nodes == 0 {
            return 0.0;
        }
        (self.handled.len() as f64 / self.total_grammar_nodes as f64) * 100.0
    }
}

/// Build a coverage report from a parser's tracked nodes against the
/// grammar's named-node count.
pub fn audit(tracker: &dyn NodeTracker, language: tree_sitter::Language) -> AuditReport {
    let handled: BTreeSet<String> = tracker
        .get_handled_nodes()
        .iter()
        .map(|HandledNode { name, .. }| name.clone())
        .collect();

    AuditReport {
        handled,
        total_grammar_nodes: language.node_kind_count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::NodeTrackingState;

    #[test]
    fn empty_tracker_has_zero_coverage() {
        let tracker = NodeTrackingState::new();
        let language: tree_sitter::Language = tree_sitter_javascript::LANGUAGE.into();
        let report = audit(&tracker, language);
        assert!(report.handled.is_empty());
        assert!(report.total_grammar_nodes > 0);
        assert_eq!(report.coverage_percent(), 0.0);
    }

    #[test]
    fn tracked_nodes_contribute_to_coverage() {
        let mut tracker = NodeTrackingState::new();
        tracker.register_handled_node("function_declaration", 1);
        tracker.register_handled_node("class_declaration", 2);
        let language: tree_sitter::Language = tree_sitter_javascript::LANGUAGE.into();
        let report = audit(&tracker, language);
        assert_eq!(report.handled.len(), 2);
        assert!(report.coverage_percent() > 0.0);
    }
}

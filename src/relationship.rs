//! Typed edges of the code graph.
//!
//! A `Relationship` is the payload carried on an edge between two
//! [`crate::SymbolId`]s (or, at the `Store` boundary, between two canonical
//! node ids). `RelationKind` enumerates the edge types the Extractor can
//! produce; the optional fields on `Relationship` cover the per-edge
//! metadata the data model allows (`callCount`, `isTypeOnly`, `context`,
//! `importedSymbols`).

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::types::{FileId, Range};

/// The type of a directed edge between two nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationKind {
    Contains,
    Imports,
    Calls,
    References,
    Extends,
    Implements,
    UsesType,
    DerivesFrom,
    AliasFor,
    HasProperty,
    Takes,
    Returns,
    ReadsProperty,
    WritesProperty,
    /// Generic "defines" used internally by language behaviors before
    /// being narrowed to a more specific kind during extraction.
    Defines,
    /// Generic fallback used by [`crate::parsing::LanguageBehavior::map_relationship`]
    /// when a language-specific string has no dedicated variant.
    Uses,
}

impl RelationKind {
    /// Name used in the `edges.kind` column and in search/formatter output.
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationKind::Contains => "CONTAINS",
            RelationKind::Imports => "IMPORTS",
            RelationKind::Calls => "CALLS",
            RelationKind::References => "REFERENCES",
            RelationKind::Extends => "EXTENDS",
            RelationKind::Implements => "IMPLEMENTS",
            RelationKind::UsesType => "USES_TYPE",
            RelationKind::DerivesFrom => "DERIVES_FROM",
            RelationKind::AliasFor => "ALIAS_FOR",
            RelationKind::HasProperty => "HAS_PROPERTY",
            RelationKind::Takes => "TAKES",
            RelationKind::Returns => "RETURNS",
            RelationKind::ReadsProperty => "READS_PROPERTY",
            RelationKind::WritesProperty => "WRITES_PROPERTY",
            RelationKind::Defines => "DEFINES",
            RelationKind::Uses => "USES",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Some(match s {
            "CONTAINS" => RelationKind::Contains,
            "IMPORTS" => RelationKind::Imports,
            "CALLS" => RelationKind::Calls,
            "REFERENCES" => RelationKind::References,
            "EXTENDS" => RelationKind::Extends,
            "IMPLEMENTS" => RelationKind::Implements,
            "USES_TYPE" => RelationKind::UsesType,
            "DERIVES_FROM" => RelationKind::DerivesFrom,
            "ALIAS_FOR" => RelationKind::AliasFor,
            "HAS_PROPERTY" => RelationKind::HasProperty,
            "TAKES" => RelationKind::Takes,
            "RETURNS" => RelationKind::Returns,
            "READS_PROPERTY" => RelationKind::ReadsProperty,
            "WRITES_PROPERTY" => RelationKind::WritesProperty,
            "DEFINES" => RelationKind::Defines,
            "USES" => RelationKind::Uses,
            _ => return None,
        })
    }

    /// Whether traversal should treat this kind as directional dependency
    /// ("A depends on B") for `dependenciesOf`/`dependentsOf`. All kinds
    /// except `Contains` qualify; containment is a structural edge, not a
    /// dependency edge, and callers that want it can still request it
    /// explicitly via an edge-type filter.
    pub fn is_dependency_edge(&self) -> bool {
        !matches!(self, RelationKind::Contains)
    }
}

/// Where, in source, a relationship was observed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipContext {
    pub file_id: FileId,
    pub range: Range,
    /// Surrounding source text, used by the Formatter's snippet windows
    /// and by the MCP tools' "at {file}:{line}" display.
    pub context: Option<Box<str>>,
}

/// Payload carried on a graph edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub kind: RelationKind,
    /// Number of times the same (from, to) call edge was observed in the
    /// same file; only meaningful for `Calls`.
    pub call_count: u32,
    /// Set when the edge originates from a type-only position (a type
    /// annotation, an `import type`, a generic parameter) rather than a
    /// value-level reference.
    pub is_type_only: bool,
    /// For `Imports` edges: the names pulled in by the import statement.
    pub imported_symbols: Vec<Box<str>>,
    pub location: Option<RelationshipContext>,
}

impl Relationship {
    pub fn new(kind: RelationKind) -> Self {
        Self {
            kind,
            call_count: 1,
            is_type_only: false,
            imported_symbols: Vec::new(),
            location: None,
        }
    }

    pub fn with_location(mut self, file_id: FileId, range: Range, context: Option<String>) -> Self {
        self.location = Some(RelationshipContext {
            file_id,
            range,
            context: context.map(|s| s.into_boxed_str()),
        });
        self
    }

    pub fn with_type_only(mut self, is_type_only: bool) -> Self {
        self.is_type_only = is_type_only;
        self
    }

    pub fn with_imported_symbols(mut self, names: Vec<String>) -> Self {
        self.imported_symbols = names.into_iter().map(|s| s.into_boxed_str()).collect();
        self
    }

    /// Merge another observation of the same edge into this one (used when
    /// the same call site is seen again, or when re-extracting a file).
    pub fn merge(&mut self, other: &Relationship) {
        self.call_count = self.call_count.saturating_add(other.call_count);
    }
}

/// A complete edge: endpoints plus payload. Endpoints are interned
/// `SymbolId`s at the in-memory/graph-helper layer; the `Store` persists
/// the canonical string ids instead (see [`crate::id_space`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipEdge {
    pub from: crate::types::SymbolId,
    pub to: crate::types::SymbolId,
    pub relationship: Relationship,
}

impl RelationshipEdge {
    pub fn new(from: crate::types::SymbolId, to: crate::types::SymbolId, relationship: Relationship) -> Self {
        Self { from, to, relationship }
    }
}

/// Absolute path helper kept for error messages that want to show a real
/// filesystem path alongside the `FileId` (debug/log formatting only).
pub fn display_path(base: &std::path::Path, relative: &str) -> PathBuf {
    base.join(relative)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_str() {
        for kind in [
            RelationKind::Contains,
            RelationKind::Imports,
            RelationKind::Calls,
            RelationKind::References,
            RelationKind::Extends,
            RelationKind::Implements,
            RelationKind::UsesType,
            RelationKind::DerivesFrom,
            RelationKind::AliasFor,
            RelationKind::HasProperty,
            RelationKind::Takes,
            RelationKind::Returns,
            RelationKind::ReadsProperty,
            RelationKind::WritesProperty,
        ] {
            let s = kind.as_str();
            assert_eq!(RelationKind::from_str(s), Some(kind));
        }
    }

    #[test]
    fn contains_is_not_a_dependency_edge() {
        assert!(!RelationKind::Contains.is_dependency_edge());
        assert!(RelationKind::Calls.is_dependency_edge());
    }

    #[test]
    fn merge_accumulates_call_count() {
        let mut a = Relationship::new(RelationKind::Calls);
        let b = Relationship::new(RelationKind::Calls);
        a.merge(&b);
        assert_eq!(a.call_count, 2);
    }
}

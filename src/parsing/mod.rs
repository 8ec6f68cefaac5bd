//! Language parsing: tree-sitter based symbol/relationship extraction,
//! per-language resolution behavior, and the language registry that ties
//! a file extension to a parser + behavior pair.

pub mod behavior_state;
pub mod factory;
pub mod javascript;
pub mod language;
pub mod language_behavior;
pub mod method_call;
pub mod parser;
pub mod paths;
pub mod registry;
pub mod resolution;
pub mod typescript;

pub use behavior_state::{BehaviorState, StatefulBehavior};
pub use factory::ParserFactory;
pub use language::Language;
pub use language_behavior::{LanguageBehavior, LanguageMetadata, default_relationship_compatibility};
pub use method_call::MethodCall;
pub use parser::{
    HandledNode, LanguageParser, NodeTracker, NodeTrackingState, ParserContext, TypeAliasEdge,
    TypeAliasTarget,
};
pub use registry::{LanguageDefinition, LanguageId, LanguageRegistry, get_registry};
pub use resolution::{
    CallerContext, Import, ImportBinding, ImportOrigin, InheritanceResolver,
    PipelineSymbolCache, ProjectResolutionEnhancer, ResolutionScope, ResolveResult, ScopeLevel,
    ScopeType,
};

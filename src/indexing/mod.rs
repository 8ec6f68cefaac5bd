//! Turning source files into graph nodes/edges and keeping the store in
//! sync with the tree on disk (spec §4.9-§4.11).

pub mod pipeline;
pub mod sync;
pub mod walker;

pub use pipeline::{IndexPipeline, IndexPipelineError};
pub use sync::{SyncEngine, SyncReport};
pub use walker::FileWalker;

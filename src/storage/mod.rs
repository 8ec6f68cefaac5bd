//! The persistent graph store (spec §4.2).

pub mod store;

pub use store::{
    Direction, Edge, Node, NodeFilter, PathResult, Reachability, ReachedNode, Store, StoreError,
    StoreResult, SCHEMA_VERSION,
};

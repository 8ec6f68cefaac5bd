//! CLI argument parsing. Command dispatch itself lives in `main.rs`, the
//! teacher's own split between argument definitions and the binary entry
//! point.

pub mod args;

pub use args::{Cli, Commands, QueryCommand};

//! Snapshot diffing: turns successive directory walks into change events.

pub mod engine;
pub mod walk;

pub use engine::{DiffEngine, ScanOptions, ScanReport};
pub use walk::{ObservedFile, WalkOptions, WalkOutcome, walk_tree};

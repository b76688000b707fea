//! Configuration and dependency wiring for the binary.

mod dependencies;

pub use dependencies::{ConnectionMode, Dependencies, Settings};

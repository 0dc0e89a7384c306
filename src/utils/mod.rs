//! Small helpers shared across the binary.

pub mod exec;
pub mod plural;

pub use plural::plural_count;

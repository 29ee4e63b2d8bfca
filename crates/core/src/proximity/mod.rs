//! Debounced, generation-tagged nearby queries.

pub mod coordinator;
pub mod debounce;

pub use coordinator::{ProximityCoordinator, QueryOutcome};
pub use debounce::{Debouncer, Generation};

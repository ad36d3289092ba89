//! Core reactive types for sprig.

pub mod reactive;

// Re-export reactive types for convenience
pub use reactive::{batch, derived, untracked, Effect, Memo, Scope, Signal};

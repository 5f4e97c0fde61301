//! Variable store state and logic (UI-agnostic).

mod eval;
mod io;
mod ops;
mod state;

pub use state::{DEFAULT_CHAIN_LENGTH, DEFAULT_PREFIX, VariableStore};

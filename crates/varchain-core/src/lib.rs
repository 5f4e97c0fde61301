//! varchain-core - UI-agnostic variable store + storage.

pub mod error;
pub mod storage;
pub mod store;

pub use error::{Result, VarchainError};
pub use store::VariableStore;

pub use varchain_engine::engine::{Computed, FormulaEngine, RhaiEngine, Value, VarId};

//! varchain_engine - Variable chain engine + Rhai integration.

pub(crate) mod builtins;
pub mod engine;

//! Variable chain engine API.
//!
//! This module provides the computation side of a variable chain:
//!
//! - [`VarId`] - Identifier parsing and case normalization
//! - [`Variable`], [`Value`], [`Chain`] - Data structures for variable storage
//! - [`extract_references`], [`rewrite_references`] - Reference tokenizer
//! - [`would_create_cycle`], [`affected_by`] - Dependency resolution over a chain
//! - [`build_batch`], [`preprocess_script`] - Translation to positional engine input
//! - [`FormulaEngine`], [`RhaiEngine`] - Formula evaluation
//! - [`format_value`] - Format values for display

mod affected;
mod cycle;
pub(crate) mod eval;
mod format;
mod ident;
mod preprocess;
mod refs;
mod variable;

pub use affected::{affected_by, affected_in_order};
pub use cycle::{find_cycle, would_create_cycle};
pub use eval::{Computed, FormulaEngine, MAX_EVAL_DEPTH, RhaiEngine};
pub use format::{format_computed, format_number, format_value};
pub use ident::VarId;
pub use preprocess::{
    EXPRESSION_PREFIX, build_batch, format_address, is_numeric_literal, parse_address,
    preprocess_script, preprocess_with_precedents, to_engine_formula,
};
pub use refs::{
    IdentToken, extract_references, mentions, rename_references, rewrite_references,
    scan_identifiers,
};
pub use variable::{Chain, Value, Variable};

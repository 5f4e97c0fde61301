//! Plain-text persistence for variable chains.

mod parser;
mod writer;

pub use parser::{VarsEntry, parse_vars, parse_vars_content};
pub use writer::{write_vars, write_vars_content};

use crate::error::{Result, VarchainError};
use std::path::PathBuf;
use varchain_engine::engine::{
    Chain, FormulaEngine, RhaiEngine, Value, VarId, Variable, format_value,
};

/// Default number of variables in a freshly seeded chain.
pub const DEFAULT_CHAIN_LENGTH: usize = 1000;

/// Default identifier prefix for seeded chains (`VAR_1`, `VAR_2`, ...).
pub const DEFAULT_PREFIX: &str = "VAR_";

/// UI-agnostic, insertion-ordered store of variables.
///
/// The store owns every variable record. Dependency questions are answered
/// by the resolver functions in `varchain_engine` over the current chain;
/// nothing about the reference graph is cached outside the variables.
pub struct VariableStore {
    /// Variables in insertion order
    pub(crate) chain: Chain,
    /// Formula engine used for recomputation
    pub(crate) engine: Box<dyn FormulaEngine>,
    /// Current file path
    pub file_path: Option<PathBuf>,
    /// Whether the store has been modified since the last load/save
    pub modified: bool,
}

impl VariableStore {
    /// Create an empty store backed by the Rhai engine.
    ///
    /// This constructor is side-effect free: it does not touch the filesystem.
    pub fn new() -> Self {
        Self::with_engine(Box::new(RhaiEngine::new()))
    }

    /// Create an empty store backed by a custom formula engine.
    pub fn with_engine(engine: Box<dyn FormulaEngine>) -> Self {
        VariableStore {
            chain: Chain::new(),
            engine,
            file_path: None,
            modified: false,
        }
    }

    /// Create a store holding a Fibonacci-style chain: the first variable is
    /// `1`, the second `2`, every later one the sum of the previous two.
    pub fn fibonacci_chain(len: usize, prefix: &str) -> Result<Self> {
        let mut store = Self::new();
        for i in 1..=len {
            let formula = match i {
                1 => "1".to_string(),
                2 => "2".to_string(),
                _ => format!("{prefix}{} + {prefix}{}", i - 1, i - 2),
            };
            store.insert(&format!("{}{}", prefix, i), &formula)?;
        }
        store.modified = false;
        Ok(store)
    }

    /// Create a store and load a file if provided.
    pub fn with_file(path: Option<PathBuf>) -> Result<Self> {
        let mut store = Self::new();
        if let Some(ref p) = path {
            if p.exists() {
                store.load_file(p)?;
            } else {
                store.file_path = Some(p.clone());
                store.modified = false;
            }
        }
        Ok(store)
    }

    /// Read-only view of the underlying chain.
    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    pub fn contains(&self, identifier: &str) -> bool {
        VarId::from_str(identifier).is_some_and(|id| self.chain.contains(&id))
    }

    pub fn get(&self, identifier: &str) -> Option<&Variable> {
        self.chain.get(&VarId::from_str(identifier)?)
    }

    pub fn formula(&self, identifier: &str) -> Option<&str> {
        self.get(identifier).map(|v| v.formula.as_str())
    }

    pub fn value(&self, identifier: &str) -> Option<&Value> {
        self.get(identifier).map(|v| &v.value)
    }

    /// Display string for a variable's value (blank when unset or unresolved).
    pub fn display_value(&self, identifier: &str) -> Option<String> {
        self.value(identifier).map(format_value)
    }

    /// Iterate variables in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Variable> {
        self.chain.iter()
    }
}

impl Default for VariableStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a caller-supplied identifier.
pub(crate) fn parse_id(identifier: &str) -> Result<VarId> {
    VarId::from_str(identifier).ok_or_else(|| VarchainError::InvalidIdentifier(identifier.to_string()))
}

/// Look up an identifier that must already exist.
pub(crate) fn existing_id(chain: &Chain, identifier: &str) -> Result<VarId> {
    let id = parse_id(identifier)?;
    if chain.contains(&id) {
        Ok(id)
    } else {
        Err(VarchainError::NotFound(id))
    }
}

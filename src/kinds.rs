#![forbid(unsafe_code)]

//! Static rule-kind tables: merge policies and load statements

pub mod loads;
pub mod registry;

pub use loads::{BUILTIN_LOADS, LoadCatalog, LoadEntry, LoadStatement};
pub use registry::{AttrCategory, BUILTIN_POLICIES, KindPolicy, KindRegistry};

use crate::error::PolicyError;

/// The validated pair of kind tables used by a generation run
#[derive(Debug, Clone)]
pub struct Schema {
    pub registry: KindRegistry,
    pub loads: LoadCatalog,
}

impl Schema {
    /// Builds and validates the built-in policy and load tables
    ///
    /// # Errors
    ///
    /// Returns `PolicyError` if either table is inconsistent. Callers treat
    /// this as fatal and abort before generating anything.
    pub fn builtin() -> Result<Self, PolicyError> {
        Ok(Self {
            registry: KindRegistry::builtin()?,
            loads: LoadCatalog::builtin()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_schema_validates() {
        assert!(Schema::builtin().is_ok());
    }
}

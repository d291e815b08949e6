use std::collections::HashMap;

use super::ty::TypeVar;

/// Maps source-level type variable names (`a`, `t`) to the canonical
/// [`TypeVar`] for the declaration currently being typed.
///
/// Every mention of `a` in one signature shares a single variable. The cache
/// must be reset at the start of each declaration, otherwise `a` in one
/// function would be the same variable as `a` in the next.
#[derive(Debug, Clone, Default)]
pub struct TypeVarNameCache {
    names: HashMap<String, TypeVar>,
}

impl TypeVarNameCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.names.clear();
    }

    pub fn get(&self, name: &str) -> Option<TypeVar> {
        self.names.get(name).copied()
    }

    /// Make `name` stand for `var` for the rest of the declaration.
    pub fn bind(&mut self, name: &str, var: TypeVar) {
        self.names.insert(name.to_string(), var);
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

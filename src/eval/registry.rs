// Type registry: name → defining syntax node, populated once per pass

use rustc_hash::FxHashMap;

use crate::ast::{BitfieldDef, EnumDef, StructDef, TypeExpr, UnionDef};
use crate::error::EvalError;

/// A registered type definition. Borrows the caller-owned syntax tree.
#[derive(Debug, Clone, Copy)]
pub enum TypeDef<'a> {
    Struct(&'a StructDef),
    Union(&'a UnionDef),
    Enum(&'a EnumDef),
    Bitfield(&'a BitfieldDef),
    /// `typedef`-style alias to another type expression.
    Alias(&'a TypeExpr),
}

#[derive(Debug, Default)]
pub struct TypeRegistry<'a> {
    types: FxHashMap<String, TypeDef<'a>>,
}

impl<'a> TypeRegistry<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a definition. Fails with `DuplicateDefinition` if the name is
    /// already taken; the original entry is left unchanged.
    pub fn register(&mut self, name: &str, def: TypeDef<'a>) -> Result<(), EvalError> {
        if self.types.contains_key(name) {
            return Err(EvalError::DuplicateDefinition(name.to_string()));
        }
        self.types.insert(name.to_string(), def);
        Ok(())
    }

    /// Look up a definition by name.
    pub fn resolve(&self, name: &str) -> Result<TypeDef<'a>, EvalError> {
        self.types
            .get(name)
            .copied()
            .ok_or_else(|| EvalError::UndefinedType(name.to_string()))
    }

    pub fn clear(&mut self) {
        self.types.clear();
    }
}

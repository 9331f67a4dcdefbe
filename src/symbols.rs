//! Per-file symbol information.
//!
//! The parser builds one `SymbolTable` per file from its imports and
//! top-level declarations; the converter consumes it read-only. This stands in
//! for the external checker's symbol resolution: enough identity to drive the
//! rewrite resolver and the type-only import classification, nothing more.

use indexmap::IndexMap;
use once_cell::sync::Lazy;

use crate::ast::{self, StmtKind};

#[derive(Debug, Clone)]
pub struct LocalInfo {
    /// The name has value-level meaning (class/function/var), not just type.
    pub has_value: bool,
    pub type_param_count: usize,
    /// At least one type parameter declares a default.
    pub has_defaulted_params: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportShape {
    Default,
    Namespace,
    Named { imported: String },
}

#[derive(Debug, Clone)]
pub enum Symbol {
    Local(LocalInfo),
    Import { module: String, shape: ImportShape },
}

#[derive(Debug, Default)]
pub struct SymbolTable {
    names: IndexMap<String, Symbol>,
}

impl SymbolTable {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, symbol: Symbol) {
        // First declaration wins; overloads and interface merging keep the
        // shape recorded for the initial occurrence.
        self.names.entry(name.to_string()).or_insert(symbol);
    }

    pub fn resolve(&self, name: &str) -> Option<&Symbol> {
        self.names.get(name)
    }

    /// Does this name carry value-level meaning in the current file?
    /// Unresolvable names count as value-carrying (conservative: the import
    /// stays a value import).
    pub fn carries_value(&self, name: &str) -> bool {
        match self.resolve(name) {
            Some(Symbol::Local(info)) => info.has_value,
            Some(Symbol::Import { module, shape }) => match shape {
                ImportShape::Named { imported } => import_carries_value(module, imported),
                ImportShape::Default | ImportShape::Namespace => true,
            },
            None => true,
        }
    }
}

// ----------------------- known library classification ---------------------- //

/// Exports of well-known libraries that have no value-level meaning. Anything
/// absent from this table is treated as value-carrying.
static KNOWN_TYPE_ONLY: Lazy<IndexMap<&'static str, &'static [&'static str]>> = Lazy::new(|| {
    let mut m = IndexMap::new();
    m.insert(
        "react",
        &[
            "ComponentType",
            "ReactNode",
            "ReactElement",
            "ElementType",
            "Ref",
            "CSSProperties",
            "ComponentProps",
        ][..],
    );
    m
});

pub fn import_carries_value(module: &str, imported: &str) -> bool {
    match KNOWN_TYPE_ONLY.get(module) {
        Some(names) => !names.contains(&imported),
        None => true,
    }
}

// ------------------------------- construction ------------------------------ //

/// Walk the parsed statements and record every top-level binding.
pub fn build_symbols(stmts: &[ast::Stmt]) -> SymbolTable {
    let mut table = SymbolTable::empty();
    for stmt in stmts {
        match &stmt.kind {
            StmtKind::Import(imp) => {
                if let Some(name) = &imp.default {
                    table.insert(
                        name,
                        Symbol::Import { module: imp.module.clone(), shape: ImportShape::Default },
                    );
                }
                if let Some(name) = &imp.namespace {
                    table.insert(
                        name,
                        Symbol::Import { module: imp.module.clone(), shape: ImportShape::Namespace },
                    );
                }
                for spec in &imp.named {
                    table.insert(
                        &spec.local,
                        Symbol::Import {
                            module: imp.module.clone(),
                            shape: ImportShape::Named { imported: spec.imported.clone() },
                        },
                    );
                }
            }
            StmtKind::TypeAlias(alias) => {
                table.insert(&alias.name, Symbol::Local(local_info(false, &alias.type_params)));
            }
            StmtKind::Function(f) => {
                if let Some(name) = &f.name {
                    table.insert(name, Symbol::Local(local_info(true, &f.sig.type_params)));
                }
            }
            StmtKind::ClassOrInterface(c) => {
                if let Some(name) = &c.name {
                    table.insert(name, Symbol::Local(local_info(!c.is_interface, &c.type_params)));
                }
            }
            StmtKind::VarGroup { bindings, .. } => {
                for b in bindings {
                    table.insert(&b.name, Symbol::Local(local_info(true, &[])));
                }
            }
            _ => {}
        }
    }
    table
}

fn local_info(has_value: bool, type_params: &[ast::TypeParam]) -> LocalInfo {
    LocalInfo {
        has_value,
        type_param_count: type_params.len(),
        has_defaulted_params: type_params.iter().any(|p| p.default.is_some()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_imports_count_as_value_carrying() {
        assert!(import_carries_value("lodash", "map"));
        assert!(import_carries_value("react", "Component"));
        assert!(!import_carries_value("react", "ComponentType"));
    }
}

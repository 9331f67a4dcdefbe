//! Rewrite table and resolver.
//!
//! A small set of well-known library types is re-expressed idiomatically on
//! the Flow side instead of being translated structurally. Rules live in
//! immutable, hierarchical tables built once per process; the per-file
//! `Mapper` is the only component that needs symbol identity.
//!
//! Known limitation, preserved on purpose: the `namespaces` sub-map of a
//! per-library table is never consulted — only a library table's top-level
//! `types` map applies. Surrounding configuration may assume this.

use indexmap::IndexMap;
use once_cell::sync::Lazy;

use crate::ast;
use crate::diag::{Conversion, Fatal};
use crate::flow::{self, ObjTy, Prop, Ty, TyKind, TypeRef};
use crate::symbols::{ImportShape, Symbol, SymbolTable};

// ------------------------------ capabilities ------------------------------- //

/// The narrow converter surface handed to every macro. Deliberately smaller
/// than the full converter so macros cannot reach statement-level state.
pub trait MacroCx {
    fn convert_type(&self, ty: &ast::Type) -> Ty;
    fn error_type(&self, reason: &str, span: ast::Span) -> Ty;
    fn unimplemented_type(&self, reason: &str, span: ast::Span) -> Ty;
    fn crude_error(&self, msg: &str) -> Fatal;
    fn convert_entity_name(&self, name: &ast::EntityName) -> flow::EntityName;
}

/// A rewrite rule implemented as code. Receives the raw, unconverted type
/// arguments and decides what to convert through the capability object.
/// Macros report failure through `Conversion`, never by panicking.
pub trait RewriteMacro: Sync {
    fn try_convert(
        &self,
        cx: &dyn MacroCx,
        name: &ast::EntityName,
        args: &[ast::Type],
    ) -> Conversion<TypeRef>;
}

pub enum RewriteRule {
    /// Replace the reference wholesale by a bare name; type arguments convert
    /// structurally and unchanged.
    FixedName(&'static str),
    /// Same mechanics as `FixedName`; marks "the same declared thing under a
    /// different identifier" for whoever maintains the tables.
    RenameType(&'static str),
    Macro(&'static dyn RewriteMacro),
}

impl std::fmt::Debug for RewriteRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RewriteRule::FixedName(n) => write!(f, "FixedName({n})"),
            RewriteRule::RenameType(n) => write!(f, "RenameType({n})"),
            RewriteRule::Macro(_) => write!(f, "Macro(..)"),
        }
    }
}

// --------------------------------- tables ---------------------------------- //

#[derive(Debug, Default)]
pub struct NamespaceRewriteTree {
    pub types: IndexMap<&'static str, RewriteRule>,
    pub namespaces: IndexMap<&'static str, NamespaceRewriteTree>,
}

/// The three root entry points. Constant for the process lifetime; lookups
/// never mutate.
#[derive(Debug, Default)]
pub struct RewriteTables {
    pub default_lib: NamespaceRewriteTree,
    pub globals: NamespaceRewriteTree,
    pub libraries: IndexMap<&'static str, NamespaceRewriteTree>,
}

pub static BUILTIN_TABLES: Lazy<RewriteTables> = Lazy::new(build_builtin_tables);

static OMIT: OmitMacro = OmitMacro;
static REACT_COMPONENT: ReactComponentMacro = ReactComponentMacro;
static REACT_ELEMENT: ReactElementMacro = ReactElementMacro;
static JSX_ELEMENT: JsxElementMacro = JsxElementMacro;

fn build_builtin_tables() -> RewriteTables {
    let mut tables = RewriteTables::default();

    // Default library: readonly collection wrappers + the subtract-keys macro.
    let dl = &mut tables.default_lib.types;
    dl.insert("ReadonlyArray", RewriteRule::FixedName("$ReadOnlyArray"));
    dl.insert("ReadonlyMap", RewriteRule::FixedName("$ReadOnlyMap"));
    dl.insert("ReadonlySet", RewriteRule::FixedName("$ReadOnlySet"));
    dl.insert("Readonly", RewriteRule::FixedName("$ReadOnly"));
    dl.insert("Omit", RewriteRule::Macro(&OMIT));

    // react
    let mut react = NamespaceRewriteTree::default();
    react.types.insert("Component", RewriteRule::Macro(&REACT_COMPONENT));
    react.types.insert("PureComponent", RewriteRule::Macro(&REACT_COMPONENT));
    react.types.insert("ReactElement", RewriteRule::Macro(&REACT_ELEMENT));
    react.types.insert("ComponentType", RewriteRule::RenameType("React$ComponentType"));
    react.types.insert("ReactNode", RewriteRule::RenameType("React$Node"));
    tables.libraries.insert("react", react);

    // Ambient globals: JSX.Element works without any import.
    let mut jsx = NamespaceRewriteTree::default();
    jsx.types.insert("Element", RewriteRule::Macro(&JSX_ELEMENT));
    tables.globals.namespaces.insert("JSX", jsx);

    tables
}

// --------------------------------- mapper ---------------------------------- //

/// Per-file resolver: shared tables plus this file's symbol context.
pub struct Mapper<'a> {
    tables: &'a RewriteTables,
    symbols: &'a SymbolTable,
}

impl<'a> Mapper<'a> {
    pub fn new(tables: &'a RewriteTables, symbols: &'a SymbolTable) -> Self {
        Self { tables, symbols }
    }

    /// Look up the applicable rewrite rule for a (possibly qualified) name.
    /// Pure: consults the immutable tables only.
    pub fn resolve(&self, name: &ast::EntityName) -> Option<&'a RewriteRule> {
        match self.symbols.resolve(name.head()) {
            // A name declared in this file never rewrites.
            Some(Symbol::Local(_)) => None,
            Some(Symbol::Import { module, shape }) => {
                let lib = self.tables.libraries.get(module.as_str())?;
                match shape {
                    ImportShape::Named { imported } if name.is_bare() => {
                        lib.types.get(imported.as_str())
                    }
                    // Member access through a namespace or default import:
                    // only the library's top-level `types` map applies; its
                    // `namespaces` sub-map is not consulted.
                    ImportShape::Namespace | ImportShape::Default if name.parts.len() == 2 => {
                        lib.types.get(name.parts[1].as_str())
                    }
                    _ => None,
                }
            }
            None => {
                if name.is_bare() {
                    self.tables
                        .default_lib
                        .types
                        .get(name.head())
                        .or_else(|| self.tables.globals.types.get(name.head()))
                } else {
                    // Walk the global table's namespace path, then its types.
                    let mut node = &self.tables.globals;
                    for part in &name.parts[..name.parts.len() - 1] {
                        node = node.namespaces.get(part.as_str())?;
                    }
                    node.types.get(name.parts.last().unwrap().as_str())
                }
            }
        }
    }
}

// --------------------------------- macros ---------------------------------- //

/// `Omit<T, K>`: subtract keys from an object type.
/// - one string-literal key       -> `$Diff<T, {| k: any |}>`
/// - union of string literals     -> `$Diff<T, {| k1: any, k2: any |}>`
/// - arbitrary key type `K`       -> `$Diff<T, { [key: K]: any }>`
struct OmitMacro;

impl RewriteMacro for OmitMacro {
    fn try_convert(
        &self,
        cx: &dyn MacroCx,
        _name: &ast::EntityName,
        args: &[ast::Type],
    ) -> Conversion<TypeRef> {
        if args.len() != 2 {
            return Conversion::Error(format!(
                "Omit expects exactly 2 type arguments, got {}",
                args.len()
            ));
        }
        let obj = cx.convert_type(&args[0]);
        let subtracted = match key_literals(&args[1]) {
            Some(keys) => {
                let props = keys
                    .into_iter()
                    .map(|k| Prop { name: k, optional: false, ty: Ty::any() })
                    .collect();
                Ty::new(TyKind::Object(ObjTy::exact(props)))
            }
            None => {
                let mut shape = ObjTy::inexact_empty();
                shape.indexers.push(flow::Indexer {
                    key_name: "key".to_string(),
                    key: cx.convert_type(&args[1]),
                    value: Ty::any(),
                });
                Ty::new(TyKind::Object(shape))
            }
        };
        Conversion::Ok(TypeRef::new("$Diff", Some(vec![obj, subtracted])))
    }
}

/// A string literal, or a union made entirely of string literals.
fn key_literals(ty: &ast::Type) -> Option<Vec<String>> {
    match &ty.kind {
        ast::TypeKind::StringLit(s) => Some(vec![s.clone()]),
        ast::TypeKind::Union(parts) => {
            let mut keys = Vec::with_capacity(parts.len());
            for part in parts {
                match &part.kind {
                    ast::TypeKind::StringLit(s) => keys.push(s.clone()),
                    _ => return None,
                }
            }
            Some(keys)
        }
        ast::TypeKind::Paren(inner) => key_literals(inner),
        _ => None,
    }
}

/// `Component` / `PureComponent` from react, 0-2 type arguments.
struct ReactComponentMacro;

impl RewriteMacro for ReactComponentMacro {
    fn try_convert(
        &self,
        cx: &dyn MacroCx,
        _name: &ast::EntityName,
        args: &[ast::Type],
    ) -> Conversion<TypeRef> {
        let converted = match args {
            [] => vec![Ty::any(), Ty::any()],
            [props] => vec![cx.convert_type(props)],
            [props, state] => vec![cx.convert_type(props), cx.convert_type(state)],
            _ => {
                return Conversion::Error(format!(
                    "React component class takes at most 2 type arguments, got {}",
                    args.len()
                ));
            }
        };
        Conversion::Ok(TypeRef::new("React$Component", Some(converted)))
    }
}

/// `ReactElement`, 0-2 type arguments; three distinct expansions:
/// - 0 args -> `React$Element<any>`
/// - 1 arg  -> `React$Element<React$ComponentType<P>>`
/// - 2 args -> `React$Element<C>` (the element-type argument wins)
struct ReactElementMacro;

impl RewriteMacro for ReactElementMacro {
    fn try_convert(
        &self,
        cx: &dyn MacroCx,
        _name: &ast::EntityName,
        args: &[ast::Type],
    ) -> Conversion<TypeRef> {
        let arg = match args {
            [] => Ty::any(),
            [props] => Ty::new(TyKind::Ref(TypeRef::new(
                "React$ComponentType",
                Some(vec![cx.convert_type(props)]),
            ))),
            [_, element_ty] => cx.convert_type(element_ty),
            _ => {
                return Conversion::Error(format!(
                    "ReactElement takes at most 2 type arguments, got {}",
                    args.len()
                ));
            }
        };
        Conversion::Ok(TypeRef::new("React$Element", Some(vec![arg])))
    }
}

/// The ambient `JSX.Element` global: fixed two-argument expansion, no import
/// required and any supplied arguments are ignored.
struct JsxElementMacro;

impl RewriteMacro for JsxElementMacro {
    fn try_convert(
        &self,
        _cx: &dyn MacroCx,
        _name: &ast::EntityName,
        _args: &[ast::Type],
    ) -> Conversion<TypeRef> {
        Conversion::Ok(TypeRef::new("React$Element", Some(vec![Ty::any(), Ty::any()])))
    }
}

// ---------------------------------- tests ---------------------------------- //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Span;
    use crate::symbols;

    fn bare(name: &str) -> ast::EntityName {
        ast::EntityName { parts: vec![name.to_string()], span: Span::new(0, 0) }
    }

    fn qualified(parts: &[&str]) -> ast::EntityName {
        ast::EntityName {
            parts: parts.iter().map(|s| s.to_string()).collect(),
            span: Span::new(0, 0),
        }
    }

    #[test]
    fn default_lib_names_resolve_without_imports() {
        let table = SymbolTable::empty();
        let mapper = Mapper::new(&BUILTIN_TABLES, &table);
        match mapper.resolve(&bare("ReadonlyArray")) {
            Some(RewriteRule::FixedName("$ReadOnlyArray")) => {}
            other => panic!("unexpected rule: {other:?}"),
        }
    }

    #[test]
    fn local_declaration_shadows_default_lib() {
        let mut table = SymbolTable::empty();
        table.insert(
            "Readonly",
            Symbol::Local(symbols::LocalInfo {
                has_value: false,
                type_param_count: 1,
                has_defaulted_params: false,
            }),
        );
        let mapper = Mapper::new(&BUILTIN_TABLES, &table);
        assert!(mapper.resolve(&bare("Readonly")).is_none());
    }

    #[test]
    fn named_import_reaches_library_table() {
        let mut table = SymbolTable::empty();
        table.insert(
            "MyComponent",
            Symbol::Import {
                module: "react".to_string(),
                shape: ImportShape::Named { imported: "Component".to_string() },
            },
        );
        let mapper = Mapper::new(&BUILTIN_TABLES, &table);
        assert!(matches!(mapper.resolve(&bare("MyComponent")), Some(RewriteRule::Macro(_))));
    }

    #[test]
    fn namespace_import_member_reaches_library_table() {
        let mut table = SymbolTable::empty();
        table.insert(
            "React",
            Symbol::Import { module: "react".to_string(), shape: ImportShape::Namespace },
        );
        let mapper = Mapper::new(&BUILTIN_TABLES, &table);
        assert!(matches!(
            mapper.resolve(&qualified(&["React", "ComponentType"])),
            Some(RewriteRule::RenameType("React$ComponentType"))
        ));
    }

    #[test]
    fn jsx_element_global_resolves_through_namespace_path() {
        let table = SymbolTable::empty();
        let mapper = Mapper::new(&BUILTIN_TABLES, &table);
        assert!(matches!(
            mapper.resolve(&qualified(&["JSX", "Element"])),
            Some(RewriteRule::Macro(_))
        ));
    }

    #[test]
    fn library_nested_namespaces_are_not_consulted() {
        // A library table with a nested namespace holding a rule; member
        // access must still miss, because only the top-level `types` map of a
        // library table is consulted.
        let mut lib = NamespaceRewriteTree::default();
        let mut inner = NamespaceRewriteTree::default();
        inner.types.insert("Deep", RewriteRule::FixedName("$Deep"));
        lib.namespaces.insert("Nested", inner);

        let mut tables = RewriteTables::default();
        tables.libraries.insert("somelib", lib);

        let mut table = SymbolTable::empty();
        table.insert(
            "sl",
            Symbol::Import { module: "somelib".to_string(), shape: ImportShape::Namespace },
        );
        let mapper = Mapper::new(&tables, &table);
        assert!(
            mapper.resolve(&qualified(&["sl", "Nested", "Deep"])).is_none(),
            "nested namespaces of a library table must never be reached"
        );
    }
}

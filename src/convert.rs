//! Statement/declaration conversion.
//!
//! `Converter::convert` is total: it always returns a target statement and
//! never raises to its caller. Each top-level statement is a transactional
//! unit — a fatal error anywhere inside its conversion is caught at this
//! boundary and downgraded to an invalid placeholder, leaving sibling
//! statements untouched.
pub mod ty;

use crate::ast::{self, Heritage, MemberKind, PropName, StmtKind};
use crate::diag::{self, Fatal, Severity};
use crate::flow;
use crate::parser;
use crate::rewrite::{BUILTIN_TABLES, Mapper, RewriteTables};
use crate::symbols::{self, SymbolTable};

pub struct Converter<'a> {
    src: &'a str,
    symbols: &'a SymbolTable,
    mapper: Mapper<'a>,
}

/// Parse + convert one file. Holds no cross-file state; independent files may
/// be converted concurrently by separate calls.
pub fn convert_source(src: &str) -> Vec<flow::Stmt> {
    let parsed = parser::parse(src);
    let converter = Converter::new(src, &parsed.symbols);
    parsed.stmts.iter().map(|s| converter.convert(s)).collect()
}

impl<'a> Converter<'a> {
    pub fn new(src: &'a str, symbols: &'a SymbolTable) -> Self {
        Self::with_tables(src, symbols, &BUILTIN_TABLES)
    }

    pub fn with_tables(src: &'a str, symbols: &'a SymbolTable, tables: &'a RewriteTables) -> Self {
        Self { src, symbols, mapper: Mapper::new(tables, symbols) }
    }

    fn quote(&self, span: ast::Span) -> &'a str {
        span.text(self.src)
    }

    pub fn crude_error(&self, msg: &str) -> Fatal {
        Fatal(msg.to_string())
    }

    /// Convert one top-level statement. Total; the fatal boundary lives here.
    pub fn convert(&self, stmt: &ast::Stmt) -> flow::Stmt {
        match self.convert_stmt(stmt) {
            Ok(out) => out,
            Err(Fatal(msg)) => {
                diag::placeholder_stmt(Severity::Error, &msg, self.quote(stmt.span))
            }
        }
    }

    fn convert_stmt(&self, stmt: &ast::Stmt) -> Result<flow::Stmt, Fatal> {
        let converted = match &stmt.kind {
            StmtKind::Import(imp) => self.convert_import(imp, stmt.span),
            StmtKind::ExportDefaultName { name, .. } => self.convert_export_default(name),
            StmtKind::ExportEquals => diag::placeholder_stmt(
                Severity::Unimplemented,
                "export-equals assignment",
                self.quote(stmt.span),
            ),
            StmtKind::ExportAll { module, ns, asserts } => {
                if *asserts {
                    diag::placeholder_stmt(
                        Severity::Unimplemented,
                        "re-export with assert clause",
                        self.quote(stmt.span),
                    )
                } else {
                    flow::Stmt::new(flow::StmtKind::ExportAll {
                        module: module.clone(),
                        ns: ns.clone(),
                    })
                }
            }
            StmtKind::ExportNamed { specifiers, module, asserts } => {
                if *asserts {
                    diag::placeholder_stmt(
                        Severity::Unimplemented,
                        "re-export with assert clause",
                        self.quote(stmt.span),
                    )
                } else {
                    self.convert_export_named(specifiers, module.as_deref())
                }
            }
            StmtKind::VarGroup { bindings, .. } => self.convert_var_group(bindings)?,
            StmtKind::TypeAlias(alias) => flow::Stmt::new(flow::StmtKind::TypeAlias {
                name: alias.name.clone(),
                type_params: self.convert_type_params(&alias.type_params),
                body: self.convert_type(&alias.body),
            }),
            StmtKind::Function(f) => self.convert_function(f, stmt),
            StmtKind::ClassOrInterface(c) => self.convert_class_like(c, stmt),
            StmtKind::Unknown { kind_name } => diag::placeholder_stmt(
                Severity::Unimplemented,
                &format!("unsupported statement kind: {kind_name}"),
                self.quote(stmt.span),
            ),
            StmtKind::Executable { kind_name } => diag::placeholder_stmt(
                Severity::Error,
                &format!("executable statement in a declaration file: {kind_name}"),
                self.quote(stmt.span),
            ),
        };
        if stmt.exported { Ok(self.apply_export(converted, stmt)) } else { Ok(converted) }
    }

    // ------------------------------ imports ------------------------------- //

    fn convert_import(&self, imp: &ast::ImportDecl, span: ast::Span) -> flow::Stmt {
        if imp.type_only && (imp.default.is_some() || imp.namespace.is_some()) {
            return diag::placeholder_stmt(
                Severity::Unimplemented,
                "type-only default or namespace import",
                self.quote(span),
            );
        }
        let named = imp
            .named
            .iter()
            .map(|s| flow::ImportSpecifier {
                imported: s.imported.clone(),
                local: s.local.clone(),
                // type-only iff the aliased symbol carries no value-level
                // meaning (or the source already said so)
                type_only: s.type_only
                    || imp.type_only
                    || !symbols::import_carries_value(&imp.module, &s.imported),
            })
            .collect();
        flow::Stmt::new(flow::StmtKind::Import {
            module: imp.module.clone(),
            default: imp.default.clone(),
            namespace: imp.namespace.clone(),
            named,
        })
    }

    // ------------------------------ exports ------------------------------- //

    fn convert_export_default(&self, name: &str) -> flow::Stmt {
        let entity = flow::EntityName::bare(name);
        let ty = if self.symbols.carries_value(name) {
            flow::Ty::new(flow::TyKind::Typeof(entity))
        } else {
            flow::Ty::new(flow::TyKind::Ref(flow::TypeRef { name: entity, args: None }))
        };
        flow::Stmt::new(flow::StmtKind::ExportDefault(ty))
    }

    fn convert_export_named(
        &self,
        specifiers: &[ast::ExportSpecifier],
        module: Option<&str>,
    ) -> flow::Stmt {
        let specifiers = specifiers
            .iter()
            .map(|s| {
                let type_only = s.type_only
                    || match module {
                        Some(m) => !symbols::import_carries_value(m, &s.local),
                        None => !self.symbols.carries_value(&s.local),
                    };
                flow::ExportSpecifier {
                    local: s.local.clone(),
                    exported: s.exported.clone(),
                    type_only,
                }
            })
            .collect();
        flow::Stmt::new(flow::StmtKind::ExportNames {
            specifiers,
            module: module.map(str::to_string),
        })
    }

    /// Export-modifier post-processing. Shape-dependent: forward function and
    /// class declarations take the target's export marking directly; an
    /// interface is re-expressed as a plain definition (the target rejects
    /// exported forward interface declarations); other declaration shapes go
    /// through the generic named-export wrapper.
    fn apply_export(&self, out: flow::Stmt, stmt: &ast::Stmt) -> flow::Stmt {
        if stmt.default_export {
            // `export default` is carried on the declaration itself.
            return out;
        }
        let flow::Stmt { kind, comments } = out;
        let kind = match kind {
            flow::StmtKind::DeclareFunction { name, fun, default_exported, .. } => {
                flow::StmtKind::DeclareFunction { name, fun, exported: true, default_exported }
            }
            flow::StmtKind::DeclareClass {
                name,
                type_params,
                extends,
                body,
                default_exported,
                ..
            } => flow::StmtKind::DeclareClass {
                name,
                type_params,
                extends,
                body,
                exported: true,
                default_exported,
            },
            flow::StmtKind::Interface {
                name,
                type_params,
                extends,
                body,
                default_exported,
                ..
            } => flow::StmtKind::Interface {
                name,
                type_params,
                extends,
                body,
                exported: true,
                default_exported,
            },
            k @ (flow::StmtKind::DeclareVars { .. } | flow::StmtKind::TypeAlias { .. }) => {
                let inner = flow::Stmt::new(k);
                return flow::Stmt { kind: flow::StmtKind::ExportNamed(Box::new(inner)), comments };
            }
            flow::StmtKind::Empty => flow::StmtKind::Empty,
            _ => {
                return diag::placeholder_stmt(
                    Severity::Unimplemented,
                    "export modifier on a non-declaration statement",
                    self.quote(stmt.span),
                );
            }
        };
        flow::Stmt { kind, comments }
    }

    // ----------------------------- declarations ---------------------------- //

    fn convert_var_group(&self, bindings: &[ast::VarBinding]) -> Result<flow::Stmt, Fatal> {
        if bindings.is_empty() {
            return Err(self.crude_error("variable group without bindings"));
        }
        // const/let/var all collapse to the single declared-variable form:
        // the file class is declarations-only, so mutability carries no
        // information here.
        let bindings = bindings
            .iter()
            .map(|b| {
                let ty = match &b.ty {
                    Some(t) => self.convert_type(t),
                    None => flow::Ty::any(),
                };
                (b.name.clone(), ty)
            })
            .collect();
        Ok(flow::Stmt::new(flow::StmtKind::DeclareVars { bindings }))
    }

    fn convert_function(&self, f: &ast::FunctionDecl, stmt: &ast::Stmt) -> flow::Stmt {
        let Some(name) = &f.name else {
            return if stmt.default_export {
                diag::placeholder_stmt(
                    Severity::Unimplemented,
                    "unnamed default-exported function",
                    self.quote(stmt.span),
                )
            } else {
                diag::placeholder_stmt(
                    Severity::Error,
                    "function declaration without a name",
                    self.quote(stmt.span),
                )
            };
        };
        let fun = self.convert_sig(&f.sig, ty::RetDefault::Any);
        flow::Stmt::new(flow::StmtKind::DeclareFunction {
            name: name.clone(),
            fun,
            exported: false,
            default_exported: stmt.default_export,
        })
    }

    fn convert_class_like(&self, c: &ast::ClassDecl, stmt: &ast::Stmt) -> flow::Stmt {
        let Some(name) = &c.name else {
            return if stmt.default_export {
                diag::placeholder_stmt(
                    Severity::Unimplemented,
                    "unnamed default-exported class or interface",
                    self.quote(stmt.span),
                )
            } else {
                diag::placeholder_stmt(
                    Severity::Error,
                    "class or interface declaration without a name",
                    self.quote(stmt.span),
                )
            };
        };

        // Each base must be a plain or qualified name.
        let mut extends = Vec::new();
        for h in &c.extends {
            match h {
                Heritage::Ref { name, args } => extends.push(flow::TypeRef {
                    name: self.convert_entity_name(name),
                    args: self.convert_type_args(args.as_deref()),
                }),
                Heritage::Other(span) => {
                    return diag::placeholder_stmt(
                        Severity::Error,
                        &format!(
                            "extends base is not a plain or qualified name: `{}`",
                            self.quote(*span)
                        ),
                        self.quote(stmt.span),
                    );
                }
            }
        }

        let mut comments = Vec::new();
        if let Some(span) = c.implements_span {
            self.push_member_diag(&mut comments, "implements clause", span);
        }
        let body = self.convert_members(&c.members, &mut comments);
        let type_params = self.convert_type_params(&c.type_params);

        let kind = if c.is_interface {
            flow::StmtKind::Interface {
                name: name.clone(),
                type_params,
                extends,
                body,
                exported: false,
                default_exported: stmt.default_export,
            }
        } else {
            flow::StmtKind::DeclareClass {
                name: name.clone(),
                type_params,
                extends,
                body,
                exported: false,
                default_exported: stmt.default_export,
            }
        };
        let mut out = flow::Stmt::new(kind);
        out.comments = comments;
        out
    }

    /// Members are visited in source order; the assembled set forms the
    /// object-type body of the declaration.
    fn convert_members(&self, members: &[ast::Member], comments: &mut Vec<String>) -> flow::ObjTy {
        let mut props = Vec::new();
        for m in members {
            match &m.kind {
                // Unreferencable outside the original definition; carries no
                // information in a declaration-only translation.
                MemberKind::Private => {}
                MemberKind::Property { name, optional, ty } => match self.prop_name(name) {
                    Some(n) => props.push(flow::Prop {
                        name: n,
                        optional: *optional,
                        ty: match ty {
                            Some(t) => self.convert_type(t),
                            None => flow::Ty::any(),
                        },
                    }),
                    None => self.push_member_diag(comments, "computed property name", m.span),
                },
                MemberKind::Method { name, optional, sig } => match self.prop_name(name) {
                    Some(n) => props.push(flow::Prop {
                        name: n,
                        optional: *optional,
                        ty: flow::Ty::new(flow::TyKind::Function(
                            self.convert_sig(sig, ty::RetDefault::Any),
                        )),
                    }),
                    None => self.push_member_diag(comments, "computed method name", m.span),
                },
                MemberKind::Ctor { sig } => props.push(flow::Prop {
                    name: "constructor".to_string(),
                    optional: false,
                    ty: flow::Ty::new(flow::TyKind::Function(
                        self.convert_sig(sig, ty::RetDefault::Void),
                    )),
                }),
                MemberKind::CallSig => {
                    self.push_member_diag(comments, "call signature member", m.span)
                }
                MemberKind::ConstructSig => {
                    self.push_member_diag(comments, "construct signature member", m.span)
                }
                MemberKind::Getter { .. } => self.push_member_diag(comments, "get accessor", m.span),
                MemberKind::Setter { .. } => self.push_member_diag(comments, "set accessor", m.span),
                MemberKind::Index => self.push_member_diag(comments, "index signature", m.span),
            }
        }
        flow::ObjTy::exact(props)
    }

    fn push_member_diag(&self, comments: &mut Vec<String>, what: &str, span: ast::Span) {
        comments.push(diag::diagnostic_line(Severity::Unimplemented, what));
        comments.push(self.quote(span).to_string());
    }

    fn prop_name(&self, name: &PropName) -> Option<String> {
        match name {
            PropName::Ident(s) | PropName::Str(s) => Some(s.clone()),
            PropName::Num(n) => Some(n.clone()),
            PropName::Computed(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Span;
    use crate::flow::{StmtKind as F, Ty, TyKind};

    fn first(src: &str) -> flow::Stmt {
        convert_source(src).into_iter().next().unwrap()
    }

    fn alias_body(src: &str) -> Ty {
        match first(src).kind {
            F::TypeAlias { body, .. } => body,
            other => panic!("expected a type alias, got {other:?}"),
        }
    }

    #[test]
    fn keyword_types_map_to_flow_equivalents() {
        assert_eq!(alias_body("type T = unknown;").kind, TyKind::Mixed);
        assert_eq!(alias_body("type T = never;").kind, TyKind::Empty);
        assert_eq!(alias_body("type T = undefined;").kind, TyKind::Void);
        assert!(matches!(alias_body("type T = object;").kind, TyKind::Object(o) if !o.exact));
    }

    #[test]
    fn keyof_and_indexed_access_become_utility_refs() {
        let TyKind::Ref(r) = alias_body("type T = keyof Props;").kind else { panic!() };
        assert_eq!(r.name.dotted(), "$Keys");

        let TyKind::Ref(r) = alias_body("type T = Obj['k'];").kind else { panic!() };
        assert_eq!(r.name.dotted(), "$ElementType");
        assert_eq!(r.args.as_ref().map(Vec::len), Some(2));
    }

    #[test]
    fn default_lib_readonly_array_rewrites_without_import() {
        let TyKind::Ref(r) = alias_body("type T = ReadonlyArray<string>;").kind else { panic!() };
        assert_eq!(r.name.dotted(), "$ReadOnlyArray");
    }

    #[test]
    fn local_declaration_wins_over_default_lib() {
        let src = "interface ReadonlyArray<T> { x: T }\ntype T = ReadonlyArray<string>;";
        let stmts = convert_source(src);
        let F::TypeAlias { body, .. } = &stmts[1].kind else { panic!() };
        let TyKind::Ref(r) = &body.kind else { panic!() };
        assert_eq!(r.name.dotted(), "ReadonlyArray");
    }

    #[test]
    fn omit_with_literal_keys_subtracts_an_exact_object() {
        let TyKind::Ref(r) = alias_body("type T = Omit<Props, 'a' | 'b'>;").kind else { panic!() };
        assert_eq!(r.name.dotted(), "$Diff");
        let args = r.args.unwrap();
        let TyKind::Object(o) = &args[1].kind else { panic!() };
        assert!(o.exact);
        assert_eq!(o.props.len(), 2);
        assert_eq!(o.props[0].name, "a");
    }

    #[test]
    fn omit_with_arbitrary_keys_subtracts_an_indexed_object() {
        let TyKind::Ref(r) = alias_body("type T = Omit<Props, K>;").kind else { panic!() };
        let args = r.args.unwrap();
        let TyKind::Object(o) = &args[1].kind else { panic!() };
        assert!(!o.exact);
        assert_eq!(o.indexers.len(), 1);
        assert_eq!(o.indexers[0].key_name, "key");
    }

    #[test]
    fn omit_arity_mismatch_is_an_error_placeholder() {
        let t = alias_body("type T = Omit<Props>;");
        assert_eq!(t.kind, TyKind::Any);
        assert!(t.comments[0].starts_with("dtsflow-error:"), "{:?}", t.comments);
        assert_eq!(t.comments[1], "Omit<Props>");
    }

    #[test]
    fn react_component_expands_by_arity() {
        let src = "import { Component } from 'react';\ntype T = Component;";
        let stmts = convert_source(src);
        let F::TypeAlias { body, .. } = &stmts[1].kind else { panic!() };
        let TyKind::Ref(r) = &body.kind else { panic!() };
        assert_eq!(r.name.dotted(), "React$Component");
        assert_eq!(r.args.as_ref().map(Vec::len), Some(2));

        let src = "import * as React from 'react';\ntype T = React.Component<P, S>;";
        let stmts = convert_source(src);
        let F::TypeAlias { body, .. } = &stmts[1].kind else { panic!() };
        let TyKind::Ref(r) = &body.kind else { panic!() };
        assert_eq!(r.name.dotted(), "React$Component");
        assert_eq!(r.args.as_ref().map(Vec::len), Some(2));
    }

    #[test]
    fn react_element_single_argument_wraps_in_component_type() {
        let src = "import { ReactElement } from 'react';\ntype T = ReactElement<Props>;";
        let stmts = convert_source(src);
        let F::TypeAlias { body, .. } = &stmts[1].kind else { panic!() };
        let TyKind::Ref(r) = &body.kind else { panic!() };
        assert_eq!(r.name.dotted(), "React$Element");
        let args = r.args.as_ref().unwrap();
        let TyKind::Ref(inner) = &args[0].kind else { panic!() };
        assert_eq!(inner.name.dotted(), "React$ComponentType");
    }

    #[test]
    fn jsx_element_needs_no_import() {
        let TyKind::Ref(r) = alias_body("type T = JSX.Element;").kind else { panic!() };
        assert_eq!(r.name.dotted(), "React$Element");
        assert_eq!(r.args.as_ref().map(Vec::len), Some(2));
    }

    #[test]
    fn known_type_only_imports_are_marked() {
        let out = first("import { ComponentType, useState } from 'react';");
        let F::Import { named, .. } = out.kind else { panic!() };
        assert!(named[0].type_only);
        assert!(!named[1].type_only);
    }

    #[test]
    fn export_default_name_uses_typeof_for_values() {
        let stmts = convert_source("declare class App {}\nexport default App;");
        let F::ExportDefault(ty) = &stmts[1].kind else { panic!() };
        assert!(matches!(&ty.kind, TyKind::Typeof(n) if n.dotted() == "App"));

        let stmts = convert_source("type App = string;\nexport default App;");
        let F::ExportDefault(ty) = &stmts[1].kind else { panic!() };
        assert!(matches!(&ty.kind, TyKind::Ref(_)));
    }

    #[test]
    fn fatal_inside_a_statement_becomes_an_error_placeholder() {
        let src = "declare const x: number;";
        let parsed = parser::parse(src);
        let converter = Converter::new(src, &parsed.symbols);
        // a shape the parser cannot produce; the boundary must still hold
        let stmt = ast::Stmt {
            kind: StmtKind::VarGroup { keyword: ast::VarKeyword::Const, bindings: Vec::new() },
            span: Span::new(0, src.len()),
            exported: false,
            default_export: false,
        };
        let out = converter.convert(&stmt);
        assert!(matches!(out.kind, F::Empty));
        assert!(out.comments[0].starts_with("dtsflow-error:"));
        assert_eq!(out.comments[1], src);
    }

    #[test]
    fn elided_arguments_over_defaulted_generics_become_explicit_empty() {
        let src = "interface Box<T = string> { v: T }\ntype A = Box;\ntype B = Box<number>;";
        let stmts = convert_source(src);
        let F::TypeAlias { body, .. } = &stmts[1].kind else { panic!() };
        let TyKind::Ref(r) = &body.kind else { panic!() };
        assert_eq!(r.args.as_ref().map(Vec::len), Some(0));
        let F::TypeAlias { body, .. } = &stmts[2].kind else { panic!() };
        let TyKind::Ref(r) = &body.kind else { panic!() };
        assert_eq!(r.args.as_ref().map(Vec::len), Some(1));
    }

    #[test]
    fn class_members_and_side_channel_diagnostics() {
        let src = "declare class C implements I { #secret: string; x: number; constructor(a: string); [k: string]: any; }";
        let out = first(src);
        let F::DeclareClass { body, .. } = &out.kind else { panic!() };
        // x + constructor; the private member is dropped
        assert_eq!(body.props.len(), 2);
        assert_eq!(body.props[1].name, "constructor");
        let TyKind::Function(f) = &body.props[1].ty.kind else { panic!() };
        assert_eq!(f.ret.kind, TyKind::Void);
        // implements clause and index signature each report a comment pair
        assert_eq!(out.comments.len(), 4, "{:?}", out.comments);
        assert!(out.comments[0].contains("implements clause"));
        assert!(out.comments[2].contains("index signature"));
    }

    #[test]
    fn expression_extends_base_fails_the_statement() {
        let out = first("declare class C extends Mixin(Base) {}");
        assert!(matches!(out.kind, F::Empty));
        assert!(out.comments[0].starts_with("dtsflow-error:"), "{:?}", out.comments);
    }

    #[test]
    fn empty_extends_base_fails_only_its_statement() {
        let src = "declare class C extends {} {}\ndeclare const ok: number;";
        let stmts = convert_source(src);
        let out = crate::printer::print_file(&stmts);
        assert!(matches!(stmts[0].kind, F::Empty));
        assert!(stmts[0].comments[0].starts_with("dtsflow-error:"), "{:?}", stmts[0].comments);
        assert!(out.contains("declare var ok: number;"), "{out}");
    }

    #[test]
    fn hostile_inputs_never_abort_the_file() {
        let sources = [
            "declare class C extends {} {}",
            "declare class C extends , {}",
            "type U = | | A;",
            "export default 42;",
            "'unterminated",
            "}",
            "déclare çlass ♞ {}",
        ];
        for src in sources {
            let stmts = convert_source(src);
            let _ = crate::printer::print_file(&stmts);
            assert!(!stmts.is_empty(), "no statements for {src:?}");
        }
    }

    #[test]
    fn unary_minus_only_applies_to_numeric_literals() {
        assert_eq!(alias_body("type T = -1;").kind, TyKind::NumberLit("-1".into()));
        let t = alias_body("type T = -x;");
        assert_eq!(t.kind, TyKind::Any);
        assert!(t.comments[0].starts_with("dtsflow-error:"));
    }

    #[test]
    fn unsupported_type_operators_are_unimplemented() {
        let t = alias_body("type T = unique symbol;");
        assert!(t.comments[0].starts_with("dtsflow-unimplemented:"));
        let t = alias_body("type T = readonly string[];");
        assert!(t.comments[0].starts_with("dtsflow-unimplemented:"));
    }

    #[test]
    fn reexport_with_assert_clause_is_unimplemented() {
        let out = first("export { a } from 'm' assert { type: 'json' };");
        assert!(matches!(out.kind, F::Empty));
        assert!(out.comments[0].contains("assert clause"));
    }

    #[test]
    fn exported_interface_is_marked_not_wrapped() {
        let out = first("export interface I { a: number }");
        let F::Interface { exported, .. } = out.kind else { panic!() };
        assert!(exported);
    }

    #[test]
    fn type_only_namespace_import_is_unimplemented() {
        let out = first("import type * as ns from 'm';");
        assert!(matches!(out.kind, F::Empty));
        assert!(out.comments[0].starts_with("dtsflow-unimplemented:"));
    }
}

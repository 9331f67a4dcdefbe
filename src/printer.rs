//! Flow libdef emission.
//!
//! Statements print one per line-group with their diagnostic comments above
//! them; type-level diagnostics render as trailing block comments so the
//! annotation itself stays syntactically inert.

use crate::flow::{
    ExportSpecifier, FunParam, FunTy, ImportSpecifier, ObjTy, Stmt, StmtKind, Ty, TyKind,
    TypeParam, TypeRef,
};

/// Fixed banner at the top of every generated file.
pub const HEADER: &str = "\
// @flow
// Generated by dtsflow. Do not edit this file directly.
// Untranslatable input is preserved in dtsflow-unimplemented / dtsflow-error comments.
";

pub fn print_file(stmts: &[Stmt]) -> String {
    let mut out = String::from(HEADER);
    out.push('\n');
    for stmt in stmts {
        let text = print_stmt(stmt);
        if text.is_empty() {
            continue;
        }
        out.push_str(&text);
        out.push('\n');
    }
    out
}

pub fn print_stmt(stmt: &Stmt) -> String {
    let mut out = String::new();
    push_comments(&mut out, &stmt.comments);
    stmt_body(&mut out, &stmt.kind);
    out.trim_end().to_string()
}

fn push_comments(out: &mut String, comments: &[String]) {
    for comment in comments {
        for line in comment.split('\n') {
            out.push_str("// ");
            out.push_str(line);
            out.push('\n');
        }
    }
}

fn stmt_body(out: &mut String, kind: &StmtKind) {
    match kind {
        StmtKind::Empty => {}
        StmtKind::Import { module, default, namespace, named } => {
            out.push_str(&import_str(module, default.as_deref(), namespace.as_deref(), named));
        }
        StmtKind::ExportDefault(ty) => {
            out.push_str(&format!("declare export default {};", ty_str(ty, 0)));
        }
        StmtKind::ExportAll { module, ns } => match ns {
            Some(ns) => out.push_str(&format!("export * as {ns} from '{module}';")),
            None => out.push_str(&format!("export * from '{module}';")),
        },
        StmtKind::ExportNames { specifiers, module } => {
            out.push_str(&export_names_str(specifiers, module.as_deref()));
        }
        StmtKind::DeclareVars { bindings } => {
            let lines: Vec<String> = bindings
                .iter()
                .map(|(name, ty)| format!("declare var {name}: {};", ty_str(ty, 0)))
                .collect();
            out.push_str(&lines.join("\n"));
        }
        StmtKind::TypeAlias { name, type_params, body } => {
            out.push_str(&type_alias_str(name, type_params, body));
        }
        StmtKind::DeclareFunction { name, fun, exported, default_exported } => {
            let head = if *exported { "declare export function" } else { "declare function" };
            out.push_str(&format!(
                "{head} {name}{}({}): {};",
                type_params_str(&fun.type_params),
                params_str(&fun.params),
                ty_str(&fun.ret, 0)
            ));
            if *default_exported {
                out.push_str(&format!("\ndeclare export default typeof {name};"));
            }
        }
        StmtKind::DeclareClass { name, type_params, extends, body, exported, default_exported } => {
            let head = if *exported { "declare export class" } else { "declare class" };
            out.push_str(&format!(
                "{head} {name}{}{} {}",
                type_params_str(type_params),
                extends_str(extends),
                class_body_str(body)
            ));
            if *default_exported {
                out.push_str(&format!("\ndeclare export default typeof {name};"));
            }
        }
        StmtKind::Interface { name, type_params, extends, body, exported, default_exported } => {
            let head = if *exported { "export interface" } else { "interface" };
            out.push_str(&format!(
                "{head} {name}{}{} {}",
                type_params_str(type_params),
                extends_str(extends),
                class_body_str(body)
            ));
            if *default_exported {
                out.push_str(&format!("\ndeclare export default {name};"));
            }
        }
        StmtKind::ExportNamed(inner) => {
            push_comments(out, &inner.comments);
            match &inner.kind {
                StmtKind::TypeAlias { name, type_params, body } => {
                    out.push_str("export ");
                    out.push_str(&type_alias_str(name, type_params, body));
                }
                StmtKind::DeclareVars { bindings } => {
                    let lines: Vec<String> = bindings
                        .iter()
                        .map(|(name, ty)| format!("declare export var {name}: {};", ty_str(ty, 0)))
                        .collect();
                    out.push_str(&lines.join("\n"));
                }
                other => stmt_body(out, other),
            }
        }
    }
}

fn import_str(
    module: &str,
    default: Option<&str>,
    namespace: Option<&str>,
    named: &[ImportSpecifier],
) -> String {
    let mut clauses = Vec::new();
    if let Some(d) = default {
        clauses.push(d.to_string());
    }
    if let Some(ns) = namespace {
        clauses.push(format!("* as {ns}"));
    }
    // whole-clause `import type` only when every binding is type-only
    let all_type = default.is_none()
        && namespace.is_none()
        && !named.is_empty()
        && named.iter().all(|s| s.type_only);
    if !named.is_empty() {
        let inner: Vec<String> = named
            .iter()
            .map(|s| {
                let marker = if s.type_only && !all_type { "type " } else { "" };
                if s.imported == s.local {
                    format!("{marker}{}", s.imported)
                } else {
                    format!("{marker}{} as {}", s.imported, s.local)
                }
            })
            .collect();
        clauses.push(format!("{{ {} }}", inner.join(", ")));
    }
    if clauses.is_empty() {
        format!("import '{module}';")
    } else {
        let kw = if all_type { "import type" } else { "import" };
        format!("{kw} {} from '{module}';", clauses.join(", "))
    }
}

fn export_names_str(specifiers: &[ExportSpecifier], module: Option<&str>) -> String {
    let inner: Vec<String> = specifiers
        .iter()
        .map(|s| {
            let marker = if s.type_only { "type " } else { "" };
            if s.local == s.exported {
                format!("{marker}{}", s.local)
            } else {
                format!("{marker}{} as {}", s.local, s.exported)
            }
        })
        .collect();
    match module {
        Some(m) => format!("export {{ {} }} from '{m}';", inner.join(", ")),
        None => format!("export {{ {} }};", inner.join(", ")),
    }
}

fn type_alias_str(name: &str, type_params: &[TypeParam], body: &Ty) -> String {
    format!("type {name}{} = {};", type_params_str(type_params), ty_str(body, 0))
}

fn extends_str(extends: &[TypeRef]) -> String {
    if extends.is_empty() {
        return String::new();
    }
    let refs: Vec<String> = extends.iter().map(type_ref_str).collect();
    format!(" extends {}", refs.join(", "))
}

fn class_body_str(body: &ObjTy) -> String {
    if body.props.is_empty() && body.indexers.is_empty() {
        return "{}".to_string();
    }
    let mut s = String::from("{\n");
    for p in &body.props {
        s.push_str(&format!(
            "  {}{}: {};\n",
            prop_name_str(&p.name),
            if p.optional { "?" } else { "" },
            ty_str(&p.ty, 0)
        ));
    }
    for ix in &body.indexers {
        s.push_str(&format!(
            "  [{}: {}]: {};\n",
            ix.key_name,
            ty_str(&ix.key, 0),
            ty_str(&ix.value, 0)
        ));
    }
    s.push('}');
    s
}

// --------------------------------- types ---------------------------------- //

// Precedence levels: union < intersection/typeof < everything postfixable.
// Function types sit at union level so they parenthesize inside arrays and
// union arms.
fn prec(kind: &TyKind) -> u8 {
    match kind {
        TyKind::Union(_) | TyKind::Function(_) => 0,
        TyKind::Intersect(_) | TyKind::Typeof(_) => 1,
        _ => 2,
    }
}

pub fn ty_str(ty: &Ty, min_prec: u8) -> String {
    let core = ty_core_str(ty);
    let core = if prec(&ty.kind) < min_prec { format!("({core})") } else { core };
    if ty.comments.is_empty() {
        core
    } else {
        // inline block comment; strip anything that would terminate it early
        let note = ty.comments.join(" ").replace('\n', " ").replace("*/", "*\\/");
        format!("{core} /* {note} */")
    }
}

fn ty_core_str(ty: &Ty) -> String {
    match &ty.kind {
        TyKind::Any => "any".to_string(),
        TyKind::Mixed => "mixed".to_string(),
        TyKind::Empty => "empty".to_string(),
        TyKind::Void => "void".to_string(),
        TyKind::Boolean => "boolean".to_string(),
        TyKind::Number => "number".to_string(),
        TyKind::String => "string".to_string(),
        TyKind::NullLit => "null".to_string(),
        TyKind::BoolLit(b) => b.to_string(),
        TyKind::NumberLit(raw) => raw.clone(),
        TyKind::StringLit(s) => string_lit_str(s),
        TyKind::This => "this".to_string(),
        TyKind::Typeof(name) => format!("typeof {}", name.dotted()),
        TyKind::Union(parts) => {
            let arms: Vec<String> = parts.iter().map(|p| ty_str(p, 1)).collect();
            arms.join(" | ")
        }
        TyKind::Intersect(parts) => {
            let arms: Vec<String> = parts.iter().map(|p| ty_str(p, 2)).collect();
            arms.join(" & ")
        }
        TyKind::Array(elem) => format!("{}[]", ty_str(elem, 2)),
        TyKind::Tuple(elems) => {
            let inner: Vec<String> = elems.iter().map(|e| ty_str(e, 0)).collect();
            format!("[{}]", inner.join(", "))
        }
        TyKind::Function(fun) => fun_ty_str(fun),
        TyKind::Object(obj) => object_str(obj),
        TyKind::Ref(r) => type_ref_str(r),
    }
}

fn fun_ty_str(fun: &FunTy) -> String {
    format!(
        "{}({}) => {}",
        type_params_str(&fun.type_params),
        params_str(&fun.params),
        ty_str(&fun.ret, 0)
    )
}

fn object_str(obj: &ObjTy) -> String {
    let mut entries: Vec<String> = obj
        .props
        .iter()
        .map(|p| {
            format!(
                "{}{}: {}",
                prop_name_str(&p.name),
                if p.optional { "?" } else { "" },
                ty_str(&p.ty, 0)
            )
        })
        .collect();
    entries.extend(obj.indexers.iter().map(|ix| {
        format!("[{}: {}]: {}", ix.key_name, ty_str(&ix.key, 0), ty_str(&ix.value, 0))
    }));
    if obj.exact {
        if entries.is_empty() {
            "{||}".to_string()
        } else {
            format!("{{| {} |}}", entries.join(", "))
        }
    } else if entries.is_empty() {
        "{...}".to_string()
    } else {
        format!("{{ {}, ... }}", entries.join(", "))
    }
}

fn type_ref_str(r: &TypeRef) -> String {
    match &r.args {
        None => r.name.dotted(),
        Some(args) => {
            let inner: Vec<String> = args.iter().map(|a| ty_str(a, 0)).collect();
            format!("{}<{}>", r.name.dotted(), inner.join(", "))
        }
    }
}

fn type_params_str(params: &[TypeParam]) -> String {
    if params.is_empty() {
        return String::new();
    }
    let inner: Vec<String> = params
        .iter()
        .map(|p| {
            let mut s = p.name.clone();
            if let Some(bound) = &p.bound {
                s.push_str(&format!(": {}", ty_str(bound, 0)));
            }
            if let Some(default) = &p.default {
                s.push_str(&format!(" = {}", ty_str(default, 0)));
            }
            s
        })
        .collect();
    format!("<{}>", inner.join(", "))
}

fn params_str(params: &[FunParam]) -> String {
    let inner: Vec<String> = params
        .iter()
        .map(|p| {
            let ty = ty_str(&p.ty, 0);
            match (&p.name, p.rest) {
                (Some(n), true) => format!("...{n}: {ty}"),
                (None, true) => format!("...{ty}"),
                (Some(n), false) => {
                    format!("{n}{}: {ty}", if p.optional { "?" } else { "" })
                }
                (None, false) => ty,
            }
        })
        .collect();
    inner.join(", ")
}

fn prop_name_str(name: &str) -> String {
    let plain = !name.is_empty()
        && name.chars().next().is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$')
        && name.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '$');
    let numeric = !name.is_empty() && name.chars().all(|c| c.is_ascii_digit() || c == '.');
    if plain || numeric { name.to_string() } else { string_lit_str(name) }
}

fn string_lit_str(s: &str) -> String {
    let escaped = s.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n");
    format!("\"{escaped}\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::convert_source;

    fn emit(src: &str) -> String {
        print_file(&convert_source(src))
    }

    #[test]
    fn header_is_fixed_and_first() {
        let out = emit("");
        assert!(out.starts_with("// @flow\n"));
    }

    #[test]
    fn function_types_parenthesize_inside_arrays_and_unions() {
        let out = emit("type H = Array<(() => void)> | (() => void)[];");
        assert!(out.contains("(() => void)[]"), "{out}");
    }

    #[test]
    fn exact_objects_and_optional_members() {
        let out = emit("type O = { a?: number, 'b c': string };");
        assert!(out.contains(r#"{| a?: number, "b c": string |}"#), "{out}");
    }

    #[test]
    fn exported_alias_and_var_use_their_export_forms() {
        let out = emit("export type T = string;\nexport declare const n: number;");
        assert!(out.contains("export type T = string;"), "{out}");
        assert!(out.contains("declare export var n: number;"), "{out}");
    }

    #[test]
    fn default_exported_function_gets_typeof_line() {
        let out = emit("export default function main(x: number): void;");
        assert!(out.contains("declare function main(x: number): void;"), "{out}");
        assert!(out.contains("declare export default typeof main;"), "{out}");
    }

    #[test]
    fn placeholder_comments_precede_the_statement() {
        let out = emit("export = thing;");
        assert!(out.contains("// dtsflow-unimplemented: export-equals assignment"), "{out}");
        assert!(out.contains("// export = thing;"), "{out}");
    }

    #[test]
    fn generic_alias_round_trips() {
        let out = emit("type A<T> = T[];");
        assert!(out.contains("type A<T> = T[];"), "{out}");
    }

    #[test]
    fn readonly_wrapper_over_an_object_literal() {
        let out = emit("type R = Readonly<{a: number}>;");
        assert!(out.contains("type R = $ReadOnly<{| a: number |}>;"), "{out}");
    }

    #[test]
    fn untyped_rest_param_prints_as_array_of_any() {
        let out = emit("declare function log(...args): void;");
        assert!(out.contains("declare function log(...args: any[]): void;"), "{out}");
    }

    #[test]
    fn interface_extends_a_qualified_name() {
        let out = emit("interface I extends Foo.Bar<number> { x: string }");
        assert!(out.contains("interface I extends Foo.Bar<number> {"), "{out}");
        assert!(out.contains("  x: string;"), "{out}");
    }

    #[test]
    fn one_bad_statement_leaves_the_rest_intact() {
        let src = "declare const a: string;\ntype ??? = broken;\ndeclare const b: number;";
        let out = emit(src);
        assert!(out.contains("declare var a: string;"), "{out}");
        assert!(out.contains("declare var b: number;"), "{out}");
        assert_eq!(out.matches("// dtsflow-").count(), 1, "{out}");
    }

    #[test]
    fn type_position_diagnostics_render_as_block_comments() {
        let out = emit("type B = 10n;");
        assert!(out.contains("any /* dtsflow-error: bigint literal type 10n */"), "{out}");
    }
}

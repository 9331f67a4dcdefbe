//! Type-position conversion.
//!
//! `convert_type` is total over the source type tree: every kind yields a
//! usable annotation, with failures becoming inert placeholder types at the
//! failing position while the surrounding structure converts normally.

use crate::ast::{self, KeywordTy, TypeKind};
use crate::diag::{self, Conversion, Severity};
use crate::flow::{self, FunTy, ObjTy, Ty, TyKind, TypeRef};
use crate::rewrite::{MacroCx, RewriteRule};
use crate::symbols::Symbol;

use super::Converter;

/// What an omitted return annotation means at this position.
#[derive(Debug, Clone, Copy)]
pub(crate) enum RetDefault {
    Any,
    Void,
}

impl Converter<'_> {
    pub fn convert_type(&self, ty: &ast::Type) -> Ty {
        match &ty.kind {
            TypeKind::Keyword(k) => Ty::new(match k {
                KeywordTy::Any => TyKind::Any,
                KeywordTy::Unknown => TyKind::Mixed,
                KeywordTy::Never => TyKind::Empty,
                KeywordTy::Undefined | KeywordTy::Void => TyKind::Void,
                KeywordTy::Boolean => TyKind::Boolean,
                KeywordTy::Number => TyKind::Number,
                KeywordTy::String => TyKind::String,
                KeywordTy::Object => TyKind::Object(ObjTy::inexact_empty()),
            }),
            TypeKind::This => Ty::new(TyKind::This),
            TypeKind::NullLit => Ty::new(TyKind::NullLit),
            TypeKind::TrueLit => Ty::new(TyKind::BoolLit(true)),
            TypeKind::FalseLit => Ty::new(TyKind::BoolLit(false)),
            TypeKind::NumberLit(raw) => Ty::new(TyKind::NumberLit(raw.clone())),
            TypeKind::BigIntLit(_) => self.error_type("bigint literal type", ty.span),
            TypeKind::PrefixMinus(inner) => match &inner.kind {
                TypeKind::NumberLit(raw) => Ty::new(TyKind::NumberLit(format!("-{raw}"))),
                _ => self.error_type("unary minus over a non-numeric operand", ty.span),
            },
            TypeKind::StringLit(s) => Ty::new(TyKind::StringLit(s.clone())),
            // Grouping is a source artifact; emission re-inserts parentheses
            // where the target grammar needs them.
            TypeKind::Paren(inner) => self.convert_type(inner),
            TypeKind::Ref { name, args } => self.convert_type_ref(ty.span, name, args.as_deref()),
            TypeKind::TypeofQuery(name) => {
                Ty::new(TyKind::Typeof(self.convert_entity_name(name)))
            }
            TypeKind::Keyof(inner) => Ty::new(TyKind::Ref(TypeRef::new(
                "$Keys",
                Some(vec![self.convert_type(inner)]),
            ))),
            TypeKind::Unique(_) => self.unimplemented_type("`unique` type operator", ty.span),
            TypeKind::ReadonlyOp(_) => self.unimplemented_type("`readonly` type operator", ty.span),
            TypeKind::Union(parts) => {
                Ty::new(TyKind::Union(parts.iter().map(|p| self.convert_type(p)).collect()))
            }
            TypeKind::Intersect(parts) => {
                Ty::new(TyKind::Intersect(parts.iter().map(|p| self.convert_type(p)).collect()))
            }
            TypeKind::Array(elem) => Ty::new(TyKind::Array(Box::new(self.convert_type(elem)))),
            TypeKind::Tuple(elems) => {
                Ty::new(TyKind::Tuple(elems.iter().map(|e| self.convert_type(e)).collect()))
            }
            TypeKind::IndexedAccess { obj, index } => Ty::new(TyKind::Ref(TypeRef::new(
                "$ElementType",
                Some(vec![self.convert_type(obj), self.convert_type(index)]),
            ))),
            TypeKind::Function(sig) => {
                Ty::new(TyKind::Function(self.convert_sig(sig, RetDefault::Any)))
            }
            TypeKind::ObjectLit(members) => self.convert_object_lit(members),
        }
    }

    /// Reference conversion: rewrite table first, structural fallthrough
    /// otherwise.
    fn convert_type_ref(
        &self,
        span: ast::Span,
        name: &ast::EntityName,
        args: Option<&[ast::Type]>,
    ) -> Ty {
        match self.mapper.resolve(name) {
            Some(RewriteRule::FixedName(target)) | Some(RewriteRule::RenameType(target)) => {
                Ty::new(TyKind::Ref(TypeRef {
                    name: flow::EntityName::bare(target),
                    args: self.convert_type_args(args),
                }))
            }
            Some(RewriteRule::Macro(m)) => match m.try_convert(self, name, args.unwrap_or(&[])) {
                Conversion::Ok(r) => Ty::new(TyKind::Ref(r)),
                Conversion::Unimplemented(reason) => self.unimplemented_type(&reason, span),
                Conversion::Error(reason) => self.error_type(&reason, span),
            },
            None => {
                let mut converted = self.convert_type_args(args);
                // The two sides disagree on whether omission implies declared
                // defaults: an elided list over a generic with defaulted
                // parameters must become an explicit empty list.
                if converted.is_none() && self.ref_relies_on_defaults(name) {
                    converted = Some(Vec::new());
                }
                Ty::new(TyKind::Ref(TypeRef { name: self.convert_entity_name(name), args: converted }))
            }
        }
    }

    fn ref_relies_on_defaults(&self, name: &ast::EntityName) -> bool {
        if !name.is_bare() {
            return false;
        }
        matches!(
            self.symbols.resolve(name.head()),
            Some(Symbol::Local(info)) if info.type_param_count > 0 && info.has_defaulted_params
        )
    }

    /// Object type literal. Convertible members land in an exact shape;
    /// everything else is reported through the node's comment side channel.
    fn convert_object_lit(&self, members: &[ast::Member]) -> Ty {
        let mut props = Vec::new();
        let mut comments = Vec::new();
        for m in members {
            match &m.kind {
                ast::MemberKind::Private => {}
                ast::MemberKind::Property { name, optional, ty } => match self.prop_name(name) {
                    Some(n) => props.push(flow::Prop {
                        name: n,
                        optional: *optional,
                        ty: match ty {
                            Some(t) => self.convert_type(t),
                            None => Ty::any(),
                        },
                    }),
                    None => self.push_member_diag(&mut comments, "computed property name", m.span),
                },
                ast::MemberKind::Method { .. } | ast::MemberKind::Ctor { .. } => {
                    self.push_member_diag(&mut comments, "method member in object type", m.span)
                }
                ast::MemberKind::CallSig => {
                    self.push_member_diag(&mut comments, "call signature in object type", m.span)
                }
                ast::MemberKind::ConstructSig => self.push_member_diag(
                    &mut comments,
                    "construct signature in object type",
                    m.span,
                ),
                ast::MemberKind::Getter { .. } => {
                    self.push_member_diag(&mut comments, "get accessor in object type", m.span)
                }
                ast::MemberKind::Setter { .. } => {
                    self.push_member_diag(&mut comments, "set accessor in object type", m.span)
                }
                ast::MemberKind::Index => {
                    self.push_member_diag(&mut comments, "index signature in object type", m.span)
                }
            }
        }
        let mut out = Ty::new(TyKind::Object(ObjTy::exact(props)));
        out.comments = comments;
        out
    }

    pub(crate) fn convert_sig(&self, sig: &ast::FunSig, ret_default: RetDefault) -> FunTy {
        let params = sig
            .params
            .iter()
            .map(|p| flow::FunParam {
                name: p.name.clone(),
                optional: p.optional,
                rest: p.rest,
                ty: match (&p.ty, p.rest) {
                    (Some(t), _) => self.convert_type(t),
                    // untyped rest parameter: an array of `any`
                    (None, true) => Ty::new(TyKind::Array(Box::new(Ty::any()))),
                    (None, false) => Ty::any(),
                },
            })
            .collect();
        let ret = match (&sig.ret, ret_default) {
            (Some(t), _) => self.convert_type(t),
            (None, RetDefault::Any) => Ty::any(),
            (None, RetDefault::Void) => Ty::new(TyKind::Void),
        };
        FunTy { type_params: self.convert_type_params(&sig.type_params), params, ret: Box::new(ret) }
    }

    pub(crate) fn convert_type_params(&self, params: &[ast::TypeParam]) -> Vec<flow::TypeParam> {
        params
            .iter()
            .map(|p| flow::TypeParam {
                name: p.name.clone(),
                bound: p.constraint.as_ref().map(|c| self.convert_type(c)),
                default: p.default.as_ref().map(|d| self.convert_type(d)),
            })
            .collect()
    }

    pub(crate) fn convert_type_args(&self, args: Option<&[ast::Type]>) -> Option<Vec<Ty>> {
        args.map(|list| list.iter().map(|a| self.convert_type(a)).collect())
    }

    pub(crate) fn convert_entity_name(&self, name: &ast::EntityName) -> flow::EntityName {
        flow::EntityName(name.parts.clone())
    }

    pub(crate) fn error_type(&self, reason: &str, span: ast::Span) -> Ty {
        diag::placeholder_type(Severity::Error, reason, span.text(self.src))
    }

    pub(crate) fn unimplemented_type(&self, reason: &str, span: ast::Span) -> Ty {
        diag::placeholder_type(Severity::Unimplemented, reason, span.text(self.src))
    }
}

impl MacroCx for Converter<'_> {
    fn convert_type(&self, ty: &ast::Type) -> Ty {
        Converter::convert_type(self, ty)
    }
    fn error_type(&self, reason: &str, span: ast::Span) -> Ty {
        Converter::error_type(self, reason, span)
    }
    fn unimplemented_type(&self, reason: &str, span: ast::Span) -> Ty {
        Converter::unimplemented_type(self, reason, span)
    }
    fn crude_error(&self, msg: &str) -> crate::diag::Fatal {
        Converter::crude_error(self, msg)
    }
    fn convert_entity_name(&self, name: &ast::EntityName) -> flow::EntityName {
        Converter::convert_entity_name(self, name)
    }
}

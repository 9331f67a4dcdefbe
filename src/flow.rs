// Strongly-typed target (Flow) tree for emission. Built bottom-up, one file
// at a time; comments attached to a node are an ordered diagnostic side
// channel and never affect equality.

/// A dotted name on the Flow side (`Foo` or `Foo.Bar`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityName(pub Vec<String>);

impl EntityName {
    pub fn bare(name: &str) -> Self {
        Self(vec![name.to_string()])
    }
    pub fn dotted(&self) -> String {
        self.0.join(".")
    }
}

// --------------------------------- Types ---------------------------------- //

#[derive(Debug, Clone)]
pub struct Ty {
    pub kind: TyKind,
    pub comments: Vec<String>,
}

impl Ty {
    pub fn new(kind: TyKind) -> Self {
        Self { kind, comments: Vec::new() }
    }
    pub fn any() -> Self {
        Self::new(TyKind::Any)
    }
}

// Comments are diagnostic only; two types with the same shape are equal.
impl PartialEq for Ty {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TyKind {
    Any,
    Mixed,
    Empty,
    Void,
    Boolean,
    Number,
    String,
    NullLit,
    BoolLit(bool),
    /// Raw literal text, printed verbatim.
    NumberLit(String),
    StringLit(String),
    This,
    Typeof(EntityName),
    Union(Vec<Ty>),
    Intersect(Vec<Ty>),
    Array(Box<Ty>),
    Tuple(Vec<Ty>),
    Function(FunTy),
    Object(ObjTy),
    Ref(TypeRef),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeRef {
    pub name: EntityName,
    /// `Some(vec![])` is an explicit empty argument list; `None` is omitted.
    pub args: Option<Vec<Ty>>,
}

impl TypeRef {
    pub fn new(name: &str, args: Option<Vec<Ty>>) -> Self {
        Self { name: EntityName::bare(name), args }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjTy {
    /// Exact (closed) by design default; the `object` keyword and macro
    /// expansions produce inexact shapes.
    pub exact: bool,
    pub props: Vec<Prop>,
    pub indexers: Vec<Indexer>,
}

impl ObjTy {
    pub fn exact(props: Vec<Prop>) -> Self {
        Self { exact: true, props, indexers: Vec::new() }
    }
    pub fn inexact_empty() -> Self {
        Self { exact: false, props: Vec::new(), indexers: Vec::new() }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Prop {
    pub name: String,
    pub optional: bool,
    pub ty: Ty,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Indexer {
    pub key_name: String,
    pub key: Ty,
    pub value: Ty,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunTy {
    pub type_params: Vec<TypeParam>,
    pub params: Vec<FunParam>,
    pub ret: Box<Ty>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunParam {
    pub name: Option<String>,
    pub optional: bool,
    pub rest: bool,
    /// For rest parameters this is the full array type.
    pub ty: Ty,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeParam {
    pub name: String,
    pub bound: Option<Ty>,
    pub default: Option<Ty>,
}

// ------------------------------- Statements -------------------------------- //

#[derive(Debug, Clone)]
pub struct Stmt {
    pub kind: StmtKind,
    pub comments: Vec<String>,
}

impl Stmt {
    pub fn new(kind: StmtKind) -> Self {
        Self { kind, comments: Vec::new() }
    }
}

impl PartialEq for Stmt {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    /// Placeholder statement; its comments carry the diagnostics.
    Empty,
    Import {
        module: String,
        default: Option<String>,
        namespace: Option<String>,
        named: Vec<ImportSpecifier>,
    },
    /// `declare export default <type>;`
    ExportDefault(Ty),
    ExportAll { module: String, ns: Option<String> },
    ExportNames { specifiers: Vec<ExportSpecifier>, module: Option<String> },
    DeclareVars { bindings: Vec<(String, Ty)> },
    TypeAlias { name: String, type_params: Vec<TypeParam>, body: Ty },
    DeclareFunction {
        name: String,
        fun: FunTy,
        exported: bool,
        default_exported: bool,
    },
    DeclareClass {
        name: String,
        type_params: Vec<TypeParam>,
        extends: Vec<TypeRef>,
        body: ObjTy,
        exported: bool,
        default_exported: bool,
    },
    Interface {
        name: String,
        type_params: Vec<TypeParam>,
        extends: Vec<TypeRef>,
        body: ObjTy,
        exported: bool,
        default_exported: bool,
    },
    /// Generic named-export wrapper for declaration shapes with no dedicated
    /// export form of their own.
    ExportNamed(Box<Stmt>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportSpecifier {
    pub imported: String,
    pub local: String,
    pub type_only: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportSpecifier {
    pub local: String,
    pub exported: String,
    pub type_only: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comments_do_not_affect_type_equality() {
        let a = Ty::new(TyKind::Number);
        let mut b = Ty::new(TyKind::Number);
        b.comments.push("dtsflow-error: synthetic".into());
        assert_eq!(a, b);
    }
}

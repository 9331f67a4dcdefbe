// Source-side model: a closed, typed tree for the declaration subset we
// accept. Every node carries its byte span so fallback output can quote the
// original text verbatim.

/// Half-open byte range into the original file text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// The exact source text this node was parsed from.
    pub fn text<'a>(&self, src: &'a str) -> &'a str {
        &src[self.start..self.end]
    }
}

/// A possibly-qualified name (`Foo` or `Foo.Bar.Baz`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityName {
    pub parts: Vec<String>,
    pub span: Span,
}

impl EntityName {
    pub fn head(&self) -> &str {
        &self.parts[0]
    }
    pub fn is_bare(&self) -> bool {
        self.parts.len() == 1
    }
}

// ------------------------------ Statements ------------------------------- //

#[derive(Debug, Clone)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
    /// Source carried an `export` modifier on the declaration.
    pub exported: bool,
    /// Source carried `export default` on the declaration itself.
    pub default_export: bool,
}

#[derive(Debug, Clone)]
pub enum StmtKind {
    Import(ImportDecl),
    /// `export default NAME;`
    ExportDefaultName { name: String, name_span: Span },
    /// `export = NAME;` (or any export-equals form)
    ExportEquals,
    /// `export * from 'm';` / `export * as ns from 'm';`
    ExportAll { module: String, ns: Option<String>, asserts: bool },
    /// `export { a, type B as C };` with an optional `from 'm'` clause.
    ExportNamed {
        specifiers: Vec<ExportSpecifier>,
        module: Option<String>,
        asserts: bool,
    },
    VarGroup { keyword: VarKeyword, bindings: Vec<VarBinding> },
    TypeAlias(TypeAliasDecl),
    Function(FunctionDecl),
    ClassOrInterface(ClassDecl),
    /// Legal in declaration files but not translated; `kind_name` names the
    /// construct for the diagnostic.
    Unknown { kind_name: String },
    /// Must not occur in declaration-only files.
    Executable { kind_name: String },
}

#[derive(Debug, Clone)]
pub struct ImportDecl {
    pub module: String,
    pub default: Option<String>,
    pub namespace: Option<String>,
    pub named: Vec<ImportSpecifier>,
    /// `import type ...` on the whole clause.
    pub type_only: bool,
}

#[derive(Debug, Clone)]
pub struct ImportSpecifier {
    pub imported: String,
    pub local: String,
    /// Per-specifier `type` keyword in the source.
    pub type_only: bool,
}

#[derive(Debug, Clone)]
pub struct ExportSpecifier {
    pub local: String,
    pub exported: String,
    pub type_only: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKeyword {
    Const,
    Let,
    Var,
}

#[derive(Debug, Clone)]
pub struct VarBinding {
    pub name: String,
    pub ty: Option<Type>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct TypeAliasDecl {
    pub name: String,
    pub type_params: Vec<TypeParam>,
    pub body: Type,
}

#[derive(Debug, Clone)]
pub struct FunctionDecl {
    pub name: Option<String>,
    pub sig: FunSig,
}

#[derive(Debug, Clone)]
pub struct ClassDecl {
    pub is_interface: bool,
    pub name: Option<String>,
    pub type_params: Vec<TypeParam>,
    pub extends: Vec<Heritage>,
    /// Span of an `implements ...` clause, when present.
    pub implements_span: Option<Span>,
    pub members: Vec<Member>,
}

/// One entry of an `extends` clause. Only plain/qualified names convert;
/// arbitrary expressions are kept as raw spans for the fallback path.
#[derive(Debug, Clone)]
pub enum Heritage {
    Ref { name: EntityName, args: Option<Vec<Type>> },
    Other(Span),
}

// ------------------------------- Members --------------------------------- //

#[derive(Debug, Clone)]
pub struct Member {
    pub kind: MemberKind,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum MemberKind {
    Property { name: PropName, optional: bool, ty: Option<Type> },
    Method { name: PropName, optional: bool, sig: FunSig },
    Ctor { sig: FunSig },
    CallSig,
    ConstructSig,
    Getter { name: PropName },
    Setter { name: PropName },
    Index,
    /// `#name` member; carries no information outside the defining class.
    Private,
}

#[derive(Debug, Clone)]
pub enum PropName {
    Ident(String),
    Str(String),
    Num(String),
    Computed(Span),
}

// -------------------------------- Types ---------------------------------- //

#[derive(Debug, Clone)]
pub struct Type {
    pub kind: TypeKind,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordTy {
    Any,
    Unknown,
    Never,
    Undefined,
    Void,
    Boolean,
    Number,
    String,
    /// The `object` keyword: an open-ended empty object shape.
    Object,
}

#[derive(Debug, Clone)]
pub enum TypeKind {
    Keyword(KeywordTy),
    This,
    NullLit,
    TrueLit,
    FalseLit,
    /// Raw source text of the literal (`1e3`, `0x10`, ...), never parsed.
    NumberLit(String),
    BigIntLit(String),
    /// Unary minus; only valid over a numeric literal.
    PrefixMinus(Box<Type>),
    StringLit(String),
    Paren(Box<Type>),
    Ref { name: EntityName, args: Option<Vec<Type>> },
    TypeofQuery(EntityName),
    Keyof(Box<Type>),
    Unique(Box<Type>),
    ReadonlyOp(Box<Type>),
    Union(Vec<Type>),
    Intersect(Vec<Type>),
    Array(Box<Type>),
    Tuple(Vec<Type>),
    IndexedAccess { obj: Box<Type>, index: Box<Type> },
    Function(FunSig),
    ObjectLit(Vec<Member>),
}

#[derive(Debug, Clone)]
pub struct FunSig {
    pub type_params: Vec<TypeParam>,
    pub params: Vec<Param>,
    /// `None` only where the grammar lets the source omit it (declarations).
    pub ret: Option<Box<Type>>,
}

#[derive(Debug, Clone)]
pub struct Param {
    /// `None` when the parameter binds a pattern rather than a simple name.
    pub name: Option<String>,
    pub optional: bool,
    pub rest: bool,
    pub ty: Option<Type>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct TypeParam {
    pub name: String,
    pub constraint: Option<Type>,
    pub default: Option<Type>,
}

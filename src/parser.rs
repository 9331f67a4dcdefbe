//! Recursive-descent parser for the declaration subset.
//!
//! Error recovery is per statement: a parse failure anywhere inside one
//! top-level statement resynchronizes at the statement boundary and records
//! the region as an `Unknown` statement, so one bad declaration never poisons
//! its siblings.

pub mod lex;

use thiserror::Error;

use crate::ast::*;
use crate::symbols::{self, SymbolTable};
use lex::{Tok, Token, lex};

#[derive(Debug, Clone, Error)]
pub enum ParseError {
    #[error("unexpected `{found}` at byte {at}, expected {expected}")]
    Unexpected { found: String, expected: String, at: usize },
    #[error("unexpected end of input, expected {expected}")]
    Eof { expected: String },
}

#[derive(Debug)]
pub struct Parsed {
    pub stmts: Vec<Stmt>,
    pub symbols: SymbolTable,
}

/// Parse a whole file. Infallible at this level; malformed regions surface as
/// `Unknown` statements.
pub fn parse(src: &str) -> Parsed {
    let mut parser = Parser::new(src);
    let stmts = parser.parse_file();
    let symbols = symbols::build_symbols(&stmts);
    Parsed { stmts, symbols }
}

struct Parser {
    toks: Vec<Token>,
    pos: usize,
}

const DECL_KEYWORDS: [&str; 5] = ["function", "class", "interface", "abstract", "declare"];

const MEMBER_MODIFIERS: [&str; 8] =
    ["public", "protected", "private", "static", "readonly", "abstract", "declare", "override"];

impl Parser {
    fn new(src: &str) -> Self {
        Self { toks: lex(src), pos: 0 }
    }

    // ------------------------------ cursor -------------------------------- //

    fn peek(&self) -> &Tok {
        &self.toks[self.pos].tok
    }

    fn nth(&self, n: usize) -> &Tok {
        let idx = (self.pos + n).min(self.toks.len() - 1);
        &self.toks[idx].tok
    }

    fn bump(&mut self) -> Token {
        let tok = self.toks[self.pos].clone();
        if self.pos + 1 < self.toks.len() {
            self.pos += 1;
        }
        tok
    }

    fn cur_start(&self) -> usize {
        self.toks[self.pos].span.start
    }

    fn prev_end(&self) -> usize {
        if self.pos == 0 { 0 } else { self.toks[self.pos - 1].span.end }
    }

    fn at_eof(&self) -> bool {
        matches!(self.peek(), Tok::Eof)
    }

    fn peek_punct(&self, p: &str) -> bool {
        matches!(self.peek(), Tok::Punct(q) if *q == p)
    }

    fn eat_punct(&mut self, p: &str) -> bool {
        if self.peek_punct(p) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect_punct(&mut self, p: &str) -> Result<(), ParseError> {
        if self.eat_punct(p) { Ok(()) } else { Err(self.unexpected(&format!("`{p}`"))) }
    }

    fn peek_ident_is(&self, word: &str) -> bool {
        matches!(self.peek(), Tok::Ident(s) if s == word)
    }

    fn eat_kw(&mut self, word: &str) -> bool {
        if self.peek_ident_is(word) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect_kw(&mut self, word: &str) -> Result<(), ParseError> {
        if self.eat_kw(word) { Ok(()) } else { Err(self.unexpected(&format!("`{word}`"))) }
    }

    fn expect_ident_any(&mut self) -> Result<(String, Span), ParseError> {
        match self.peek().clone() {
            Tok::Ident(s) => {
                let span = self.toks[self.pos].span;
                self.bump();
                Ok((s, span))
            }
            _ => Err(self.unexpected("an identifier")),
        }
    }

    fn expect_str(&mut self) -> Result<String, ParseError> {
        match self.peek().clone() {
            Tok::Str(s) => {
                self.bump();
                Ok(s)
            }
            _ => Err(self.unexpected("a string literal")),
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        match self.peek() {
            Tok::Eof => ParseError::Eof { expected: expected.to_string() },
            found => ParseError::Unexpected {
                found: match found {
                    Tok::Ident(s) => s.clone(),
                    Tok::Str(s) => format!("'{s}'"),
                    Tok::Num(n) | Tok::BigInt(n) => n.clone(),
                    Tok::Punct(p) => p.to_string(),
                    Tok::Bad(c) => c.to_string(),
                    Tok::Eof => unreachable!(),
                },
                expected: expected.to_string(),
                at: self.cur_start(),
            },
        }
    }

    // ----------------------------- statements ------------------------------ //

    fn parse_file(&mut self) -> Vec<Stmt> {
        let mut stmts = Vec::new();
        loop {
            while self.eat_punct(";") {}
            if self.at_eof() {
                break;
            }
            stmts.push(self.parse_stmt());
        }
        stmts
    }

    fn parse_stmt(&mut self) -> Stmt {
        let checkpoint = self.pos;
        match self.parse_stmt_inner() {
            Ok(stmt) => stmt,
            Err(e) => {
                self.pos = checkpoint;
                let span = self.recover_statement();
                Stmt {
                    kind: StmtKind::Unknown { kind_name: format!("malformed statement ({e})") },
                    span,
                    exported: false,
                    default_export: false,
                }
            }
        }
    }

    /// Skip to the end of the current statement: a `;` at bracket depth zero,
    /// or the `}` closing a top-level brace group. Always makes progress.
    fn recover_statement(&mut self) -> Span {
        let start = self.cur_start();
        let before = self.pos;
        self.consume_statement_like();
        if self.pos == before && !self.at_eof() {
            self.bump();
        }
        Span::new(start, self.prev_end())
    }

    fn consume_statement_like(&mut self) {
        let mut depth = 0i32;
        loop {
            match self.peek() {
                Tok::Eof => break,
                Tok::Punct("{") | Tok::Punct("(") | Tok::Punct("[") => {
                    depth += 1;
                    self.bump();
                }
                Tok::Punct("}") | Tok::Punct(")") | Tok::Punct("]") => {
                    let brace = self.peek_punct("}");
                    if depth == 0 {
                        // closes an enclosing group, not ours
                        break;
                    }
                    depth -= 1;
                    self.bump();
                    if depth == 0 && brace {
                        self.eat_punct(";");
                        break;
                    }
                }
                Tok::Punct(";") if depth == 0 => {
                    self.bump();
                    break;
                }
                _ => {
                    self.bump();
                }
            }
        }
    }

    fn finish(&self, start: usize, kind: StmtKind, exported: bool, default_export: bool) -> Stmt {
        Stmt { kind, span: Span::new(start, self.prev_end()), exported, default_export }
    }

    fn parse_stmt_inner(&mut self) -> Result<Stmt, ParseError> {
        let start = self.cur_start();

        if self.peek_ident_is("import") {
            return self.parse_import(start);
        }

        let mut exported = false;
        let mut default_export = false;

        if self.eat_kw("export") {
            if self.eat_punct("=") {
                self.consume_statement_like();
                return Ok(self.finish(start, StmtKind::ExportEquals, false, false));
            }
            if self.peek_punct("*") {
                return self.parse_export_all(start);
            }
            if self.peek_punct("{") {
                return self.parse_export_named(start, false);
            }
            if self.peek_ident_is("type") && matches!(self.nth(1), Tok::Punct("{")) {
                self.bump();
                return self.parse_export_named(start, true);
            }
            if self.peek_ident_is("default") {
                match self.nth(1).clone() {
                    Tok::Ident(next) if !DECL_KEYWORDS.contains(&next.as_str()) => {
                        self.bump();
                        let (name, name_span) = self.expect_ident_any()?;
                        self.eat_punct(";");
                        return Ok(self.finish(
                            start,
                            StmtKind::ExportDefaultName { name, name_span },
                            false,
                            false,
                        ));
                    }
                    Tok::Ident(_) => {
                        self.bump();
                        exported = true;
                        default_export = true;
                    }
                    _ => return Err(self.unexpected("a name or declaration after `export default`")),
                }
            } else {
                exported = true;
            }
        }

        self.eat_kw("declare");
        self.eat_kw("abstract");

        let kw = match self.peek() {
            Tok::Ident(s) => s.clone(),
            _ => return Err(self.unexpected("a declaration keyword")),
        };
        let kind = match kw.as_str() {
            "const" if matches!(self.nth(1), Tok::Ident(s) if s == "enum") => {
                self.consume_statement_like();
                StmtKind::Unknown { kind_name: "enum declaration".to_string() }
            }
            "const" | "let" | "var" => self.parse_var_group()?,
            "type" => self.parse_type_alias()?,
            "function" => self.parse_function()?,
            "class" => self.parse_class_like(false)?,
            "interface" => self.parse_class_like(true)?,
            "namespace" | "module" => {
                self.consume_statement_like();
                StmtKind::Unknown { kind_name: format!("{kw} declaration") }
            }
            "enum" => {
                self.consume_statement_like();
                StmtKind::Unknown { kind_name: "enum declaration".to_string() }
            }
            "global" => {
                self.consume_statement_like();
                StmtKind::Unknown { kind_name: "global augmentation".to_string() }
            }
            "if" | "for" | "while" | "do" | "switch" | "return" | "throw" | "try" | "break"
            | "continue" | "with" | "debugger" | "delete" | "new" | "void" | "typeof" => {
                self.consume_statement_like();
                StmtKind::Executable { kind_name: format!("`{kw}` statement") }
            }
            _ => {
                self.consume_statement_like();
                StmtKind::Executable { kind_name: "expression statement".to_string() }
            }
        };
        Ok(self.finish(start, kind, exported, default_export))
    }

    // ------------------------------- imports ------------------------------- //

    fn parse_import(&mut self, start: usize) -> Result<Stmt, ParseError> {
        self.bump(); // import
        if let Tok::Str(_) = self.peek() {
            let module = self.expect_str()?;
            self.eat_punct(";");
            return Ok(self.finish(
                start,
                StmtKind::Unknown { kind_name: format!("side-effect import of '{module}'") },
                false,
                false,
            ));
        }

        let mut type_only = false;
        if self.peek_ident_is("type")
            && matches!(self.nth(1), Tok::Ident(_) | Tok::Punct("{") | Tok::Punct("*"))
            && !matches!(self.nth(1), Tok::Ident(s) if s == "from")
        {
            self.bump();
            type_only = true;
        }

        let mut default = None;
        let mut namespace = None;
        let mut named = Vec::new();

        if matches!(self.peek(), Tok::Ident(_)) && !self.peek_ident_is("from") {
            default = Some(self.expect_ident_any()?.0);
            self.eat_punct(",");
        }
        if self.eat_punct("*") {
            self.expect_kw("as")?;
            namespace = Some(self.expect_ident_any()?.0);
        } else if self.eat_punct("{") {
            named = self.parse_import_specifiers()?;
        }

        self.expect_kw("from")?;
        let module = self.expect_str()?;

        if self.at_assert_clause() {
            self.consume_statement_like();
            return Ok(self.finish(
                start,
                StmtKind::Unknown { kind_name: "import with assert clause".to_string() },
                false,
                false,
            ));
        }
        self.eat_punct(";");
        Ok(self.finish(
            start,
            StmtKind::Import(ImportDecl { module, default, namespace, named, type_only }),
            false,
            false,
        ))
    }

    fn parse_import_specifiers(&mut self) -> Result<Vec<ImportSpecifier>, ParseError> {
        let mut out = Vec::new();
        loop {
            if self.eat_punct("}") {
                break;
            }
            let mut spec_type_only = false;
            if self.peek_ident_is("type") && matches!(self.nth(1), Tok::Ident(s) if s != "as") {
                self.bump();
                spec_type_only = true;
            }
            let imported = self.expect_ident_any()?.0;
            let local =
                if self.eat_kw("as") { self.expect_ident_any()?.0 } else { imported.clone() };
            out.push(ImportSpecifier { imported, local, type_only: spec_type_only });
            if !self.eat_punct(",") {
                self.expect_punct("}")?;
                break;
            }
        }
        Ok(out)
    }

    fn at_assert_clause(&self) -> bool {
        (self.peek_ident_is("assert") || self.peek_ident_is("with"))
            && matches!(self.nth(1), Tok::Punct("{"))
    }

    fn skip_assert_clause(&mut self) -> Result<bool, ParseError> {
        if !self.at_assert_clause() {
            return Ok(false);
        }
        self.bump();
        self.skip_balanced("{", "}")?;
        Ok(true)
    }

    // ------------------------------- exports ------------------------------- //

    fn parse_export_all(&mut self, start: usize) -> Result<Stmt, ParseError> {
        self.expect_punct("*")?;
        let ns = if self.eat_kw("as") { Some(self.expect_ident_any()?.0) } else { None };
        self.expect_kw("from")?;
        let module = self.expect_str()?;
        let asserts = self.skip_assert_clause()?;
        self.eat_punct(";");
        Ok(self.finish(start, StmtKind::ExportAll { module, ns, asserts }, false, false))
    }

    fn parse_export_named(&mut self, start: usize, all_type: bool) -> Result<Stmt, ParseError> {
        self.expect_punct("{")?;
        let mut specifiers = Vec::new();
        loop {
            if self.eat_punct("}") {
                break;
            }
            let mut spec_type_only = all_type;
            if self.peek_ident_is("type") && matches!(self.nth(1), Tok::Ident(s) if s != "as") {
                self.bump();
                spec_type_only = true;
            }
            let local = self.expect_ident_any()?.0;
            let exported =
                if self.eat_kw("as") { self.expect_ident_any()?.0 } else { local.clone() };
            specifiers.push(ExportSpecifier { local, exported, type_only: spec_type_only });
            if !self.eat_punct(",") {
                self.expect_punct("}")?;
                break;
            }
        }
        let module = if self.eat_kw("from") { Some(self.expect_str()?) } else { None };
        let asserts = self.skip_assert_clause()?;
        self.eat_punct(";");
        Ok(self.finish(start, StmtKind::ExportNamed { specifiers, module, asserts }, false, false))
    }

    // ----------------------------- declarations ---------------------------- //

    fn parse_var_group(&mut self) -> Result<StmtKind, ParseError> {
        let keyword = match self.bump().tok {
            Tok::Ident(s) if s == "const" => VarKeyword::Const,
            Tok::Ident(s) if s == "let" => VarKeyword::Let,
            _ => VarKeyword::Var,
        };
        let mut bindings = Vec::new();
        loop {
            let b_start = self.cur_start();
            let (name, _) = self.expect_ident_any()?;
            let ty = if self.eat_punct(":") { Some(self.parse_type()?) } else { None };
            if self.peek_punct("=") {
                return Err(self.unexpected("no initializer in an ambient declaration"));
            }
            bindings.push(VarBinding { name, ty, span: Span::new(b_start, self.prev_end()) });
            if !self.eat_punct(",") {
                break;
            }
        }
        self.eat_punct(";");
        Ok(StmtKind::VarGroup { keyword, bindings })
    }

    fn parse_type_alias(&mut self) -> Result<StmtKind, ParseError> {
        self.bump(); // type
        let (name, _) = self.expect_ident_any()?;
        let type_params =
            if self.peek_punct("<") { self.parse_type_params()? } else { Vec::new() };
        self.expect_punct("=")?;
        let body = self.parse_type()?;
        self.eat_punct(";");
        Ok(StmtKind::TypeAlias(TypeAliasDecl { name, type_params, body }))
    }

    fn parse_function(&mut self) -> Result<StmtKind, ParseError> {
        self.bump(); // function
        let name = match self.peek() {
            Tok::Ident(_) => Some(self.expect_ident_any()?.0),
            _ => None,
        };
        let type_params =
            if self.peek_punct("<") { self.parse_type_params()? } else { Vec::new() };
        let params = self.parse_params()?;
        let ret = if self.eat_punct(":") { Some(Box::new(self.parse_type()?)) } else { None };
        self.eat_punct(";");
        Ok(StmtKind::Function(FunctionDecl { name, sig: FunSig { type_params, params, ret } }))
    }

    fn parse_class_like(&mut self, is_interface: bool) -> Result<StmtKind, ParseError> {
        self.bump(); // class | interface
        let name = match self.peek() {
            Tok::Ident(s) if s != "extends" && s != "implements" => {
                Some(self.expect_ident_any()?.0)
            }
            _ => None,
        };
        let type_params =
            if self.peek_punct("<") { self.parse_type_params()? } else { Vec::new() };

        let mut extends = Vec::new();
        if self.eat_kw("extends") {
            loop {
                extends.push(self.parse_heritage()?);
                if !self.eat_punct(",") {
                    break;
                }
            }
        }

        let implements_span = if self.peek_ident_is("implements") {
            let s = self.cur_start();
            while !self.peek_punct("{") && !self.at_eof() {
                self.bump();
            }
            Some(Span::new(s, self.prev_end()))
        } else {
            None
        };

        self.expect_punct("{")?;
        let members = self.parse_members()?;
        self.eat_punct(";");
        Ok(StmtKind::ClassOrInterface(ClassDecl {
            is_interface,
            name,
            type_params,
            extends,
            implements_span,
            members,
        }))
    }

    fn parse_heritage(&mut self) -> Result<Heritage, ParseError> {
        let start = self.cur_start();
        if !matches!(self.peek(), Tok::Ident(_)) {
            return Ok(Heritage::Other(self.scan_heritage_other(start)));
        }
        let name = self.parse_entity_name()?;
        if self.peek_punct("(") {
            // mixin-call base or some other expression
            self.skip_balanced("(", ")")?;
            return Ok(Heritage::Other(self.scan_heritage_other(start)));
        }
        let args = self.parse_type_args_opt()?;
        Ok(Heritage::Ref { name, args })
    }

    fn scan_heritage_other(&mut self, start: usize) -> Span {
        let mut depth = 0i32;
        loop {
            match self.peek() {
                Tok::Eof => break,
                Tok::Punct("(") | Tok::Punct("[") | Tok::Punct("<") => {
                    depth += 1;
                    self.bump();
                }
                Tok::Punct(")") | Tok::Punct("]") | Tok::Punct(">") => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                    self.bump();
                }
                Tok::Punct(",") | Tok::Punct("{") if depth == 0 => break,
                Tok::Ident(s) if s == "implements" && depth == 0 => break,
                _ => {
                    self.bump();
                }
            }
        }
        // the clause may open with a stopper token, consuming nothing
        Span::new(start, self.prev_end().max(start))
    }

    // -------------------------------- members ------------------------------ //

    /// Shared member-list parser for class bodies, interface bodies and
    /// object type literals. Expects the opening `{` to be consumed already;
    /// consumes through the closing `}`.
    fn parse_members(&mut self) -> Result<Vec<Member>, ParseError> {
        let mut members = Vec::new();
        loop {
            while self.eat_punct(";") || self.eat_punct(",") {}
            if self.eat_punct("}") {
                break;
            }
            if self.at_eof() {
                return Err(self.unexpected("`}`"));
            }
            members.push(self.parse_member()?);
        }
        Ok(members)
    }

    fn parse_member(&mut self) -> Result<Member, ParseError> {
        let start = self.cur_start();
        self.skip_member_modifiers();

        let done = |p: &Self, kind: MemberKind| {
            Ok(Member { kind, span: Span::new(start, p.prev_end()) })
        };

        if self.eat_punct("#") {
            self.expect_ident_any()?;
            self.skip_private_member_tail()?;
            return done(self, MemberKind::Private);
        }
        if self.peek_ident_is("new") && matches!(self.nth(1), Tok::Punct("(") | Tok::Punct("<")) {
            self.bump();
            self.parse_sig_rest()?;
            return done(self, MemberKind::ConstructSig);
        }
        if self.peek_punct("(") || self.peek_punct("<") {
            self.parse_sig_rest()?;
            return done(self, MemberKind::CallSig);
        }
        if self.peek_punct("[") {
            if matches!(self.nth(1), Tok::Ident(_)) && matches!(self.nth(2), Tok::Punct(":")) {
                // [key: K]: V
                self.bump();
                self.bump();
                self.bump();
                self.parse_type()?;
                self.expect_punct("]")?;
                self.expect_punct(":")?;
                self.parse_type()?;
                return done(self, MemberKind::Index);
            }
            let c_start = self.cur_start();
            self.skip_balanced("[", "]")?;
            let name = PropName::Computed(Span::new(c_start, self.prev_end()));
            return self.parse_member_after_name(start, name);
        }
        if (self.peek_ident_is("get") || self.peek_ident_is("set")) && self.nth_is_member_name(1) {
            let is_get = self.peek_ident_is("get");
            self.bump();
            let name = self.parse_prop_name()?;
            self.parse_sig_rest()?;
            return done(self, if is_get { MemberKind::Getter { name } } else {
                MemberKind::Setter { name }
            });
        }

        let name = self.parse_prop_name()?;
        if let PropName::Ident(id) = &name {
            if id == "constructor" && matches!(self.peek(), Tok::Punct("(") | Tok::Punct("<")) {
                let sig = self.parse_sig_rest()?;
                return done(self, MemberKind::Ctor { sig });
            }
        }
        self.parse_member_after_name(start, name)
    }

    fn parse_member_after_name(&mut self, start: usize, name: PropName) -> Result<Member, ParseError> {
        let optional = self.eat_punct("?");
        let kind = if self.peek_punct("(") || self.peek_punct("<") {
            let sig = self.parse_sig_rest()?;
            MemberKind::Method { name, optional, sig }
        } else {
            let ty = if self.eat_punct(":") { Some(self.parse_type()?) } else { None };
            MemberKind::Property { name, optional, ty }
        };
        Ok(Member { kind, span: Span::new(start, self.prev_end()) })
    }

    fn skip_member_modifiers(&mut self) {
        loop {
            let Tok::Ident(word) = self.peek() else { break };
            if !MEMBER_MODIFIERS.contains(&word.as_str()) {
                break;
            }
            // the word is itself the member name when member syntax follows
            if matches!(
                self.nth(1),
                Tok::Punct(":")
                    | Tok::Punct("?")
                    | Tok::Punct("(")
                    | Tok::Punct("<")
                    | Tok::Punct(";")
                    | Tok::Punct(",")
                    | Tok::Punct("}")
            ) {
                break;
            }
            self.bump();
        }
    }

    fn skip_private_member_tail(&mut self) -> Result<(), ParseError> {
        self.eat_punct("?");
        if self.peek_punct("(") || self.peek_punct("<") {
            self.parse_sig_rest()?;
        } else if self.eat_punct(":") {
            self.parse_type()?;
        }
        Ok(())
    }

    fn nth_is_member_name(&self, n: usize) -> bool {
        matches!(self.nth(n), Tok::Ident(_) | Tok::Str(_) | Tok::Num(_) | Tok::Punct("["))
    }

    fn parse_prop_name(&mut self) -> Result<PropName, ParseError> {
        match self.peek().clone() {
            Tok::Ident(s) => {
                self.bump();
                Ok(PropName::Ident(s))
            }
            Tok::Str(s) => {
                self.bump();
                Ok(PropName::Str(s))
            }
            Tok::Num(n) => {
                self.bump();
                Ok(PropName::Num(n))
            }
            _ => Err(self.unexpected("a member name")),
        }
    }

    /// Type parameters + parameter list + optional return annotation.
    fn parse_sig_rest(&mut self) -> Result<FunSig, ParseError> {
        let type_params =
            if self.peek_punct("<") { self.parse_type_params()? } else { Vec::new() };
        let params = self.parse_params()?;
        let ret = if self.eat_punct(":") { Some(Box::new(self.parse_type()?)) } else { None };
        Ok(FunSig { type_params, params, ret })
    }

    fn parse_params(&mut self) -> Result<Vec<Param>, ParseError> {
        self.expect_punct("(")?;
        let mut params = Vec::new();
        loop {
            if self.eat_punct(")") {
                break;
            }
            let p_start = self.cur_start();
            let rest = self.eat_punct("...");
            let name = match self.peek() {
                Tok::Ident(_) => Some(self.expect_ident_any()?.0),
                // destructuring patterns bind no single name
                Tok::Punct("{") => {
                    self.skip_balanced("{", "}")?;
                    None
                }
                Tok::Punct("[") => {
                    self.skip_balanced("[", "]")?;
                    None
                }
                _ => return Err(self.unexpected("a parameter name")),
            };
            let optional = self.eat_punct("?");
            let ty = if self.eat_punct(":") { Some(self.parse_type()?) } else { None };
            params.push(Param { name, optional, rest, ty, span: Span::new(p_start, self.prev_end()) });
            if !self.eat_punct(",") {
                self.expect_punct(")")?;
                break;
            }
        }
        Ok(params)
    }

    fn parse_type_params(&mut self) -> Result<Vec<TypeParam>, ParseError> {
        self.expect_punct("<")?;
        let mut out = Vec::new();
        loop {
            let (name, _) = self.expect_ident_any()?;
            let constraint = if self.eat_kw("extends") { Some(self.parse_type()?) } else { None };
            let default = if self.eat_punct("=") { Some(self.parse_type()?) } else { None };
            out.push(TypeParam { name, constraint, default });
            if !self.eat_punct(",") {
                self.expect_punct(">")?;
                break;
            }
        }
        Ok(out)
    }

    // --------------------------------- types ------------------------------- //

    fn parse_type(&mut self) -> Result<Type, ParseError> {
        let start = self.cur_start();
        self.eat_punct("|"); // tolerated leading separator
        let first = self.parse_intersect_type()?;
        if !self.peek_punct("|") {
            return Ok(first);
        }
        let mut parts = vec![first];
        while self.eat_punct("|") {
            parts.push(self.parse_intersect_type()?);
        }
        Ok(Type { kind: TypeKind::Union(parts), span: Span::new(start, self.prev_end()) })
    }

    fn parse_intersect_type(&mut self) -> Result<Type, ParseError> {
        let start = self.cur_start();
        let first = self.parse_postfix_type()?;
        if !self.peek_punct("&") {
            return Ok(first);
        }
        let mut parts = vec![first];
        while self.eat_punct("&") {
            parts.push(self.parse_postfix_type()?);
        }
        Ok(Type { kind: TypeKind::Intersect(parts), span: Span::new(start, self.prev_end()) })
    }

    fn parse_postfix_type(&mut self) -> Result<Type, ParseError> {
        let mut t = self.parse_primary_type()?;
        while self.peek_punct("[") {
            self.bump();
            if self.eat_punct("]") {
                let span = Span::new(t.span.start, self.prev_end());
                t = Type { kind: TypeKind::Array(Box::new(t)), span };
            } else {
                let index = self.parse_type()?;
                self.expect_punct("]")?;
                let span = Span::new(t.span.start, self.prev_end());
                t = Type {
                    kind: TypeKind::IndexedAccess { obj: Box::new(t), index: Box::new(index) },
                    span,
                };
            }
        }
        Ok(t)
    }

    fn parse_primary_type(&mut self) -> Result<Type, ParseError> {
        let start = self.cur_start();
        match self.peek().clone() {
            Tok::Punct("(") => {
                let checkpoint = self.pos;
                if let Ok(t) = self.parse_function_type() {
                    return Ok(t);
                }
                self.pos = checkpoint;
                self.bump();
                let inner = self.parse_type()?;
                self.expect_punct(")")?;
                Ok(Type {
                    kind: TypeKind::Paren(Box::new(inner)),
                    span: Span::new(start, self.prev_end()),
                })
            }
            Tok::Punct("<") => self.parse_function_type(),
            Tok::Punct("[") => self.parse_tuple_type(),
            Tok::Punct("{") => {
                self.bump();
                let members = self.parse_members()?;
                Ok(Type {
                    kind: TypeKind::ObjectLit(members),
                    span: Span::new(start, self.prev_end()),
                })
            }
            Tok::Punct("-") => {
                self.bump();
                let inner = self.parse_primary_type()?;
                Ok(Type {
                    kind: TypeKind::PrefixMinus(Box::new(inner)),
                    span: Span::new(start, self.prev_end()),
                })
            }
            Tok::Num(n) => {
                self.bump();
                Ok(Type { kind: TypeKind::NumberLit(n), span: Span::new(start, self.prev_end()) })
            }
            Tok::BigInt(n) => {
                self.bump();
                Ok(Type { kind: TypeKind::BigIntLit(n), span: Span::new(start, self.prev_end()) })
            }
            Tok::Str(s) => {
                self.bump();
                Ok(Type { kind: TypeKind::StringLit(s), span: Span::new(start, self.prev_end()) })
            }
            Tok::Ident(word) => self.parse_ident_type(start, &word),
            _ => Err(self.unexpected("a type")),
        }
    }

    fn parse_ident_type(&mut self, start: usize, word: &str) -> Result<Type, ParseError> {
        let keyword = match word {
            "any" => Some(KeywordTy::Any),
            "unknown" => Some(KeywordTy::Unknown),
            "never" => Some(KeywordTy::Never),
            "undefined" => Some(KeywordTy::Undefined),
            "void" => Some(KeywordTy::Void),
            "boolean" => Some(KeywordTy::Boolean),
            "number" => Some(KeywordTy::Number),
            "string" => Some(KeywordTy::String),
            "object" => Some(KeywordTy::Object),
            _ => None,
        };
        if let Some(k) = keyword {
            self.bump();
            return Ok(Type {
                kind: TypeKind::Keyword(k),
                span: Span::new(start, self.prev_end()),
            });
        }
        let simple = match word {
            "null" => Some(TypeKind::NullLit),
            "true" => Some(TypeKind::TrueLit),
            "false" => Some(TypeKind::FalseLit),
            "this" => Some(TypeKind::This),
            _ => None,
        };
        if let Some(kind) = simple {
            self.bump();
            return Ok(Type { kind, span: Span::new(start, self.prev_end()) });
        }
        match word {
            "typeof" => {
                self.bump();
                let name = self.parse_entity_name()?;
                Ok(Type {
                    kind: TypeKind::TypeofQuery(name),
                    span: Span::new(start, self.prev_end()),
                })
            }
            "keyof" => {
                self.bump();
                let operand = self.parse_postfix_type()?;
                Ok(Type {
                    kind: TypeKind::Keyof(Box::new(operand)),
                    span: Span::new(start, self.prev_end()),
                })
            }
            "unique" => {
                self.bump();
                let operand = self.parse_postfix_type()?;
                Ok(Type {
                    kind: TypeKind::Unique(Box::new(operand)),
                    span: Span::new(start, self.prev_end()),
                })
            }
            "readonly" => {
                self.bump();
                let operand = self.parse_postfix_type()?;
                Ok(Type {
                    kind: TypeKind::ReadonlyOp(Box::new(operand)),
                    span: Span::new(start, self.prev_end()),
                })
            }
            "new" => {
                // constructor function type reads like a function type
                self.bump();
                let mut t = self.parse_function_type()?;
                t.span = Span::new(start, self.prev_end());
                Ok(t)
            }
            _ => {
                let name = self.parse_entity_name()?;
                let args = self.parse_type_args_opt()?;
                Ok(Type {
                    kind: TypeKind::Ref { name, args },
                    span: Span::new(start, self.prev_end()),
                })
            }
        }
    }

    fn parse_function_type(&mut self) -> Result<Type, ParseError> {
        let start = self.cur_start();
        let type_params =
            if self.peek_punct("<") { self.parse_type_params()? } else { Vec::new() };
        let params = self.parse_params()?;
        self.expect_punct("=>")?;
        let ret = self.parse_type()?;
        Ok(Type {
            kind: TypeKind::Function(FunSig { type_params, params, ret: Some(Box::new(ret)) }),
            span: Span::new(start, self.prev_end()),
        })
    }

    fn parse_tuple_type(&mut self) -> Result<Type, ParseError> {
        let start = self.cur_start();
        self.bump(); // [
        let mut elems = Vec::new();
        if !self.eat_punct("]") {
            loop {
                if self.peek_punct("...") {
                    return Err(self.unexpected("a tuple element (rest elements unsupported)"));
                }
                // optional element label: `[x: number, y?: string]`
                if matches!(self.peek(), Tok::Ident(_)) {
                    let labeled = matches!(self.nth(1), Tok::Punct(":"))
                        || (matches!(self.nth(1), Tok::Punct("?"))
                            && matches!(self.nth(2), Tok::Punct(":")));
                    if labeled {
                        self.bump();
                        self.eat_punct("?");
                        self.bump();
                    }
                }
                let elem = self.parse_type()?;
                self.eat_punct("?");
                elems.push(elem);
                if !self.eat_punct(",") {
                    self.expect_punct("]")?;
                    break;
                }
            }
        }
        Ok(Type { kind: TypeKind::Tuple(elems), span: Span::new(start, self.prev_end()) })
    }

    fn parse_type_args_opt(&mut self) -> Result<Option<Vec<Type>>, ParseError> {
        if !self.peek_punct("<") {
            return Ok(None);
        }
        self.bump();
        let mut args = Vec::new();
        if !self.eat_punct(">") {
            loop {
                args.push(self.parse_type()?);
                if !self.eat_punct(",") {
                    self.expect_punct(">")?;
                    break;
                }
            }
        }
        Ok(Some(args))
    }

    fn parse_entity_name(&mut self) -> Result<EntityName, ParseError> {
        let start = self.cur_start();
        let (first, _) = self.expect_ident_any()?;
        let mut parts = vec![first];
        while self.peek_punct(".") && matches!(self.nth(1), Tok::Ident(_)) {
            self.bump();
            parts.push(self.expect_ident_any()?.0);
        }
        Ok(EntityName { parts, span: Span::new(start, self.prev_end()) })
    }

    /// Skip one balanced bracket group, tracking only the requested pair.
    fn skip_balanced(&mut self, open: &str, close: &str) -> Result<(), ParseError> {
        self.expect_punct(open)?;
        let mut depth = 1usize;
        while depth > 0 {
            match self.peek() {
                Tok::Eof => return Err(self.unexpected(&format!("`{close}`"))),
                Tok::Punct(p) if *p == open => {
                    depth += 1;
                    self.bump();
                }
                Tok::Punct(p) if *p == close => {
                    depth -= 1;
                    self.bump();
                }
                _ => {
                    self.bump();
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stmts(src: &str) -> Vec<Stmt> {
        parse(src).stmts
    }

    #[test]
    fn statement_spans_quote_source_verbatim() {
        let src = "declare  function f( x : number ) :\tvoid ;";
        let parsed = stmts(src);
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].span.text(src), src.trim_end_matches(' '));
    }

    #[test]
    fn one_malformed_statement_does_not_poison_siblings() {
        let src = "type A = = oops;\ndeclare const x: number;";
        let parsed = stmts(src);
        assert_eq!(parsed.len(), 2);
        assert!(matches!(parsed[0].kind, StmtKind::Unknown { .. }));
        assert!(matches!(parsed[1].kind, StmtKind::VarGroup { .. }));
    }

    #[test]
    fn import_clause_forms() {
        let src = "import React, { Component, type ReactNode as RN } from 'react';";
        let parsed = stmts(src);
        let StmtKind::Import(imp) = &parsed[0].kind else { panic!("not an import") };
        assert_eq!(imp.default.as_deref(), Some("React"));
        assert_eq!(imp.named.len(), 2);
        assert_eq!(imp.named[1].local, "RN");
        assert!(imp.named[1].type_only);
    }

    #[test]
    fn export_default_of_a_name_is_its_own_statement() {
        let parsed = stmts("declare function main(): void;\nexport default main;");
        assert!(matches!(&parsed[1].kind, StmtKind::ExportDefaultName { name, .. } if name == "main"));
    }

    #[test]
    fn interface_members_classify() {
        let src = "interface I { a: number; m?(x: string): void; [k: string]: any; get v(): number; }";
        let parsed = stmts(src);
        let StmtKind::ClassOrInterface(c) = &parsed[0].kind else { panic!("not a class-like") };
        assert!(c.is_interface);
        assert_eq!(c.members.len(), 4);
        assert!(matches!(c.members[0].kind, MemberKind::Property { .. }));
        assert!(matches!(c.members[1].kind, MemberKind::Method { optional: true, .. }));
        assert!(matches!(c.members[2].kind, MemberKind::Index));
        assert!(matches!(c.members[3].kind, MemberKind::Getter { .. }));
    }

    #[test]
    fn mixin_extends_base_is_kept_as_raw_span() {
        let src = "declare class C extends Mixin(Base) {}";
        let parsed = stmts(src);
        let StmtKind::ClassOrInterface(c) = &parsed[0].kind else { panic!("not a class") };
        let Heritage::Other(span) = &c.extends[0] else { panic!("expected raw heritage") };
        assert_eq!(span.text(src), "Mixin(Base)");
    }

    #[test]
    fn stopper_led_extends_clause_yields_an_empty_raw_heritage() {
        let src = "declare class C extends {} {}";
        let parsed = stmts(src);
        let StmtKind::ClassOrInterface(c) = &parsed[0].kind else { panic!("not a class") };
        let Heritage::Other(span) = &c.extends[0] else { panic!("expected raw heritage") };
        assert!(span.start <= span.end, "span must never invert");
        assert_eq!(span.text(src), "");
    }

    #[test]
    fn type_grammar_round_trip_shapes() {
        let src = "type T = keyof A | (string | number)[] | A.B<C>['k'];";
        let parsed = stmts(src);
        let StmtKind::TypeAlias(alias) = &parsed[0].kind else { panic!("not an alias") };
        let TypeKind::Union(parts) = &alias.body.kind else { panic!("not a union") };
        assert_eq!(parts.len(), 3);
        assert!(matches!(parts[0].kind, TypeKind::Keyof(_)));
        assert!(matches!(parts[1].kind, TypeKind::Array(_)));
        assert!(matches!(parts[2].kind, TypeKind::IndexedAccess { .. }));
    }

    #[test]
    fn function_types_and_paren_types_disambiguate() {
        let parsed = stmts("type F = (x: number) => void;\ntype P = (string);");
        let StmtKind::TypeAlias(f) = &parsed[0].kind else { panic!() };
        assert!(matches!(f.body.kind, TypeKind::Function(_)));
        let StmtKind::TypeAlias(p) = &parsed[1].kind else { panic!() };
        assert!(matches!(p.body.kind, TypeKind::Paren(_)));
    }

    #[test]
    fn namespace_and_executable_statements_classify() {
        let parsed = stmts("declare namespace N { const x: number; }\nconsole.log('hi');");
        assert!(matches!(&parsed[0].kind, StmtKind::Unknown { kind_name } if kind_name.contains("namespace")));
        assert!(matches!(&parsed[1].kind, StmtKind::Executable { .. }));
    }

    #[test]
    fn symbols_come_back_with_the_parse() {
        let parsed = parse("declare class C {}\ntype T = string;");
        assert!(parsed.symbols.carries_value("C"));
        assert!(!parsed.symbols.carries_value("T"));
    }
}

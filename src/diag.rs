//! Diagnostics and fallback emission.
//!
//! Every unconvertible construct becomes an inert placeholder node carrying
//! two comments: a single diagnostic line and the original source text
//! verbatim. Those comments are the only external error channel.

use crate::flow;

/// Tool tag used in diagnostic comment lines.
pub const TOOL: &str = "dtsflow";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Valid input we do not translate yet; an expected outcome.
    Unimplemented,
    /// Input that should not occur in declaration-only files, or a
    /// converter-internal inconsistency.
    Error,
}

impl Severity {
    pub fn label(self) -> &'static str {
        match self {
            Severity::Unimplemented => "unimplemented",
            Severity::Error => "error",
        }
    }
}

/// `dtsflow-unimplemented: <reason>` / `dtsflow-error: <reason>`.
pub fn diagnostic_line(severity: Severity, reason: &str) -> String {
    format!("{TOOL}-{}: {reason}", severity.label())
}

/// Three-way outcome for conversion steps that can fail without being fatal.
/// Rewrite macros always report through this type, never by panicking.
#[derive(Debug, Clone, PartialEq)]
pub enum Conversion<T> {
    Ok(T),
    Unimplemented(String),
    Error(String),
}

/// Internal fatal channel. Raised deep in the recursive descent, caught
/// exactly once at the enclosing statement boundary and downgraded to an
/// error placeholder there.
#[derive(Debug, Clone)]
pub struct Fatal(pub String);

// ------------------------------ placeholders ------------------------------- //

/// An inert `any` annotation usable anywhere a real type is expected, so the
/// surrounding structure still parses.
pub fn placeholder_type(severity: Severity, reason: &str, source: &str) -> flow::Ty {
    let mut ty = flow::Ty::any();
    ty.comments.push(diagnostic_line(severity, reason));
    ty.comments.push(source.to_string());
    ty
}

/// An empty statement standing in for an unconvertible one.
pub fn placeholder_stmt(severity: Severity, reason: &str, source: &str) -> flow::Stmt {
    let mut stmt = flow::Stmt::new(flow::StmtKind::Empty);
    stmt.comments.push(diagnostic_line(severity, reason));
    stmt.comments.push(source.to_string());
    stmt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_quotes_source_byte_for_byte() {
        let src = "declare function  f(x:number) :\tvoid;";
        let stmt = placeholder_stmt(Severity::Unimplemented, "test", src);
        assert_eq!(stmt.comments[0], "dtsflow-unimplemented: test");
        assert_eq!(stmt.comments[1], src, "internal whitespace must survive");
    }
}

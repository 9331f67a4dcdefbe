// Tokenizer for the declaration subset. Whole-file, comment/whitespace
// skipping; unknown characters become `Tok::Bad` tokens so a single stray
// character only poisons its own statement, not the file.

use crate::ast::Span;

#[derive(Debug, Clone, PartialEq)]
pub enum Tok {
    /// Identifier or keyword; the parser matches on the text.
    Ident(String),
    /// String literal, unescaped content.
    Str(String),
    /// Numeric literal, raw text.
    Num(String),
    /// `123n` big-integer literal, raw text without the suffix.
    BigInt(String),
    Punct(&'static str),
    Bad(char),
    Eof,
}

#[derive(Debug, Clone)]
pub struct Token {
    pub tok: Tok,
    pub span: Span,
}

pub fn lex(src: &str) -> Vec<Token> {
    let bytes = src.as_bytes();
    let mut out = Vec::new();
    let mut i = 0usize;

    while i < bytes.len() {
        let b = bytes[i];

        // whitespace
        if b.is_ascii_whitespace() {
            i += 1;
            continue;
        }
        // line comment
        if b == b'/' && bytes.get(i + 1) == Some(&b'/') {
            while i < bytes.len() && bytes[i] != b'\n' {
                i += 1;
            }
            continue;
        }
        // block comment (unterminated runs to EOF)
        if b == b'/' && bytes.get(i + 1) == Some(&b'*') {
            i += 2;
            while i < bytes.len() && !(bytes[i] == b'*' && bytes.get(i + 1) == Some(&b'/')) {
                i += 1;
            }
            i = (i + 2).min(bytes.len());
            continue;
        }

        let start = i;

        if b == b'"' || b == b'\'' {
            let quote = b;
            i += 1;
            let mut value = String::new();
            let mut closed = false;
            while i < bytes.len() {
                let c = bytes[i];
                if c == b'\\' && i + 1 < bytes.len() {
                    value.push(unescape(bytes[i + 1]));
                    i += 2;
                    continue;
                }
                if c == quote {
                    i += 1;
                    closed = true;
                    break;
                }
                // track char boundaries for multi-byte content
                let ch = src[i..].chars().next().unwrap();
                value.push(ch);
                i += ch.len_utf8();
            }
            let tok = if closed { Tok::Str(value) } else { Tok::Bad(quote as char) };
            out.push(Token { tok, span: Span::new(start, i) });
            continue;
        }

        if b.is_ascii_digit() {
            i += 1;
            while i < bytes.len() {
                let c = bytes[i];
                let prev = bytes[i - 1];
                let exponent_sign =
                    (c == b'+' || c == b'-') && (prev == b'e' || prev == b'E');
                if c.is_ascii_alphanumeric() || c == b'.' || c == b'_' || exponent_sign {
                    i += 1;
                } else {
                    break;
                }
            }
            let raw = &src[start..i];
            let tok = match raw.strip_suffix('n') {
                Some(digits) => Tok::BigInt(digits.to_string()),
                None => Tok::Num(raw.to_string()),
            };
            out.push(Token { tok, span: Span::new(start, i) });
            continue;
        }

        if is_ident_start(src[i..].chars().next().unwrap()) {
            let mut j = i;
            for ch in src[i..].chars() {
                if j == i && is_ident_start(ch) || j > i && is_ident_continue(ch) {
                    j += ch.len_utf8();
                } else {
                    break;
                }
            }
            out.push(Token {
                tok: Tok::Ident(src[i..j].to_string()),
                span: Span::new(i, j),
            });
            i = j;
            continue;
        }

        // multi-char punctuation first
        if src[i..].starts_with("=>") {
            out.push(Token { tok: Tok::Punct("=>"), span: Span::new(i, i + 2) });
            i += 2;
            continue;
        }
        if src[i..].starts_with("...") {
            out.push(Token { tok: Tok::Punct("..."), span: Span::new(i, i + 3) });
            i += 3;
            continue;
        }

        let single: Option<&'static str> = match b {
            b'(' => Some("("),
            b')' => Some(")"),
            b'{' => Some("{"),
            b'}' => Some("}"),
            b'[' => Some("["),
            b']' => Some("]"),
            b'<' => Some("<"),
            b'>' => Some(">"),
            b',' => Some(","),
            b';' => Some(";"),
            b':' => Some(":"),
            b'?' => Some("?"),
            b'.' => Some("."),
            b'=' => Some("="),
            b'|' => Some("|"),
            b'&' => Some("&"),
            b'-' => Some("-"),
            b'#' => Some("#"),
            b'*' => Some("*"),
            b'+' => Some("+"),
            b'/' => Some("/"),
            _ => None,
        };
        if let Some(p) = single {
            out.push(Token { tok: Tok::Punct(p), span: Span::new(i, i + 1) });
            i += 1;
            continue;
        }

        let ch = src[i..].chars().next().unwrap();
        out.push(Token { tok: Tok::Bad(ch), span: Span::new(i, i + ch.len_utf8()) });
        i += ch.len_utf8();
    }

    out.push(Token { tok: Tok::Eof, span: Span::new(src.len(), src.len()) });
    out
}

fn unescape(b: u8) -> char {
    match b {
        b'n' => '\n',
        b't' => '\t',
        b'r' => '\r',
        b'0' => '\0',
        other => other as char,
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<Tok> {
        lex(src).into_iter().map(|t| t.tok).collect()
    }

    #[test]
    fn basic_declaration_tokens() {
        let toks = kinds("type A = string;");
        assert_eq!(
            toks,
            vec![
                Tok::Ident("type".into()),
                Tok::Ident("A".into()),
                Tok::Punct("="),
                Tok::Ident("string".into()),
                Tok::Punct(";"),
                Tok::Eof,
            ]
        );
    }

    #[test]
    fn arrow_and_spread_are_single_tokens() {
        assert!(kinds("(...xs) => void").contains(&Tok::Punct("...")));
        assert!(kinds("() => void").contains(&Tok::Punct("=>")));
    }

    #[test]
    fn bigint_literal_keeps_digits_only() {
        assert!(kinds("type A = 10n;").contains(&Tok::BigInt("10".into())));
    }

    #[test]
    fn strings_unescape_and_span_covers_quotes() {
        let toks = lex(r#"'a\'b'"#);
        assert_eq!(toks[0].tok, Tok::Str("a'b".into()));
        assert_eq!(toks[0].span, Span::new(0, 6));
    }

    #[test]
    fn comments_are_skipped() {
        let toks = kinds("/* block */ type // line\nA");
        assert_eq!(toks.len(), 3, "two idents plus eof: {toks:?}");
    }
}

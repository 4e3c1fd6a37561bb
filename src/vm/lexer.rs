//! Lexer for the embedded dynamic-language VM
//!
//! Converts source text into a flat token stream. Every token carries its
//! 1-based line so runtime and syntax errors can point back at the source.

use crate::vm::error::VmError;
use std::fmt;

/// Token payloads.
#[derive(Debug, Clone, PartialEq)]
pub enum Tok {
    // Literals
    Number(f64),
    Str(String),
    Ident(String),

    // Keywords
    Var,
    Let,
    Const,
    Function,
    If,
    Else,
    While,
    For,
    Return,
    True,
    False,
    Null,

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    EqEq,
    EqEqEq,
    NotEq,
    NotEqEq,
    Lt,
    Le,
    Gt,
    Ge,
    AndAnd,
    OrOr,
    Bang,
    Eq,
    PlusEq,
    MinusEq,
    StarEq,
    SlashEq,
    PlusPlus,
    MinusMinus,

    // Punctuation
    Dot,
    Comma,
    Semi,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,

    Eof,
}

impl fmt::Display for Tok {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tok::Number(n) => write!(f, "{}", n),
            Tok::Str(s) => write!(f, "\"{}\"", s),
            Tok::Ident(s) => write!(f, "{}", s),
            Tok::Eof => write!(f, "<eof>"),
            other => write!(f, "{:?}", other),
        }
    }
}

/// A token plus the line it starts on.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub tok: Tok,
    pub line: usize,
}

/// Tokenize the whole source up front.
pub fn tokenize(source: &str) -> Result<Vec<Token>, VmError> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    let mut line = 1;

    while i < chars.len() {
        let c = chars[i];

        if c == '\n' {
            line += 1;
            i += 1;
            continue;
        }
        if c.is_whitespace() {
            i += 1;
            continue;
        }

        // Line comments
        if c == '/' && chars.get(i + 1) == Some(&'/') {
            while i < chars.len() && chars[i] != '\n' {
                i += 1;
            }
            continue;
        }
        // Block comments
        if c == '/' && chars.get(i + 1) == Some(&'*') {
            i += 2;
            while i < chars.len() {
                if chars[i] == '\n' {
                    line += 1;
                }
                if chars[i] == '*' && chars.get(i + 1) == Some(&'/') {
                    i += 2;
                    break;
                }
                i += 1;
            }
            continue;
        }

        // String literals
        if c == '"' || c == '\'' {
            let start_line = line;
            let quote = c;
            i += 1;
            let mut value = String::new();
            let mut closed = false;
            while i < chars.len() {
                let sc = chars[i];
                if sc == '\\' && i + 1 < chars.len() {
                    value.push(unescape(chars[i + 1]));
                    i += 2;
                    continue;
                }
                if sc == quote {
                    closed = true;
                    i += 1;
                    break;
                }
                if sc == '\n' {
                    break;
                }
                value.push(sc);
                i += 1;
            }
            if !closed {
                return Err(VmError::Syntax {
                    message: "unterminated string literal".to_string(),
                    line: start_line,
                });
            }
            tokens.push(Token {
                tok: Tok::Str(value),
                line: start_line,
            });
            continue;
        }

        // Numbers
        if c.is_ascii_digit() {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                i += 1;
            }
            let text: String = chars[start..i].iter().collect();
            let value = text.parse::<f64>().map_err(|_| VmError::Syntax {
                message: format!("invalid number literal '{}'", text),
                line,
            })?;
            tokens.push(Token {
                tok: Tok::Number(value),
                line,
            });
            continue;
        }

        // Identifiers and keywords
        if c.is_alphabetic() || c == '_' || c == '$' {
            let start = i;
            while i < chars.len()
                && (chars[i].is_alphanumeric() || chars[i] == '_' || chars[i] == '$')
            {
                i += 1;
            }
            let word: String = chars[start..i].iter().collect();
            let tok = match word.as_str() {
                "var" => Tok::Var,
                "let" => Tok::Let,
                "const" => Tok::Const,
                "function" => Tok::Function,
                "if" => Tok::If,
                "else" => Tok::Else,
                "while" => Tok::While,
                "for" => Tok::For,
                "return" => Tok::Return,
                "true" => Tok::True,
                "false" => Tok::False,
                "null" => Tok::Null,
                _ => Tok::Ident(word),
            };
            tokens.push(Token { tok, line });
            continue;
        }

        // Operators and punctuation, longest match first
        let three: String = chars[i..chars.len().min(i + 3)].iter().collect();
        let two: String = chars[i..chars.len().min(i + 2)].iter().collect();
        let (tok, len) = if three == "===" {
            (Tok::EqEqEq, 3)
        } else if three == "!==" {
            (Tok::NotEqEq, 3)
        } else {
            match two.as_str() {
                "==" => (Tok::EqEq, 2),
                "!=" => (Tok::NotEq, 2),
                "<=" => (Tok::Le, 2),
                ">=" => (Tok::Ge, 2),
                "&&" => (Tok::AndAnd, 2),
                "||" => (Tok::OrOr, 2),
                "+=" => (Tok::PlusEq, 2),
                "-=" => (Tok::MinusEq, 2),
                "*=" => (Tok::StarEq, 2),
                "/=" => (Tok::SlashEq, 2),
                "++" => (Tok::PlusPlus, 2),
                "--" => (Tok::MinusMinus, 2),
                _ => match c {
                    '+' => (Tok::Plus, 1),
                    '-' => (Tok::Minus, 1),
                    '*' => (Tok::Star, 1),
                    '/' => (Tok::Slash, 1),
                    '%' => (Tok::Percent, 1),
                    '<' => (Tok::Lt, 1),
                    '>' => (Tok::Gt, 1),
                    '!' => (Tok::Bang, 1),
                    '=' => (Tok::Eq, 1),
                    '.' => (Tok::Dot, 1),
                    ',' => (Tok::Comma, 1),
                    ';' => (Tok::Semi, 1),
                    '(' => (Tok::LParen, 1),
                    ')' => (Tok::RParen, 1),
                    '{' => (Tok::LBrace, 1),
                    '}' => (Tok::RBrace, 1),
                    '[' => (Tok::LBracket, 1),
                    ']' => (Tok::RBracket, 1),
                    other => {
                        return Err(VmError::Syntax {
                            message: format!("unexpected character '{}'", other),
                            line,
                        });
                    }
                },
            }
        };
        tokens.push(Token { tok, line });
        i += len;
    }

    tokens.push(Token {
        tok: Tok::Eof,
        line,
    });
    Ok(tokens)
}

fn unescape(c: char) -> char {
    match c {
        'n' => '\n',
        't' => '\t',
        'r' => '\r',
        '0' => '\0',
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_statement() {
        let toks = tokenize("let a = 1 + 2;").unwrap();
        let kinds: Vec<&Tok> = toks.iter().map(|t| &t.tok).collect();
        assert_eq!(
            kinds,
            vec![
                &Tok::Let,
                &Tok::Ident("a".into()),
                &Tok::Eq,
                &Tok::Number(1.0),
                &Tok::Plus,
                &Tok::Number(2.0),
                &Tok::Semi,
                &Tok::Eof
            ]
        );
    }

    #[test]
    fn tracks_lines() {
        let toks = tokenize("a\nb\nc").unwrap();
        assert_eq!(toks[0].line, 1);
        assert_eq!(toks[1].line, 2);
        assert_eq!(toks[2].line, 3);
    }

    #[test]
    fn string_escapes() {
        let toks = tokenize(r#""a\nb""#).unwrap();
        assert_eq!(toks[0].tok, Tok::Str("a\nb".into()));
    }

    #[test]
    fn unterminated_string_fails() {
        assert!(tokenize("\"abc").is_err());
    }

    #[test]
    fn triple_equals() {
        let toks = tokenize("a === b !== c").unwrap();
        assert_eq!(toks[1].tok, Tok::EqEqEq);
        assert_eq!(toks[3].tok, Tok::NotEqEq);
    }
}

//! Tokenizer for the expression/script language.

use cueflow_core::error::{CueError, Result};

/// Kind of token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Numeric literal.
    Number(f64),
    /// String literal with escapes resolved.
    Str(String),
    /// Identifier or keyword.
    Ident(String),
    /// Operator or punctuation.
    Punct(&'static str),
    /// End of input.
    Eof,
}

/// A token with its source position (1-based).
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// Kind and payload.
    pub kind: TokenKind,
    /// Line.
    pub line: usize,
    /// Column.
    pub column: usize,
}

// Longest first so `===` wins over `==` and `=`
const PUNCTUATION: &[&str] = &[
    "===", "!==", "...", "=>", "==", "!=", "<=", ">=", "&&", "||", "??", "?.", "+=", "-=", "*=",
    "/=", "%=", "++", "--", "+", "-", "*", "/", "%", "<", ">", "!", "=", "(", ")", "{", "}", "[",
    "]", ",", ".", ";", ":", "?",
];

/// Maximum source length accepted.
pub const MAX_SOURCE_LEN: usize = 64 * 1024;

struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.src[self.pos..].chars().nth(offset)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn error(&self, message: impl Into<String>) -> CueError {
        CueError::ScriptSyntax {
            line: self.line,
            column: self.column,
            message: message.into(),
        }
    }

    fn skip_trivia(&mut self) -> Result<()> {
        loop {
            match (self.peek(), self.peek_at(1)) {
                (Some(c), _) if c.is_whitespace() => {
                    self.bump();
                }
                (Some('/'), Some('/')) => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                (Some('/'), Some('*')) => {
                    self.bump();
                    self.bump();
                    loop {
                        match (self.peek(), self.peek_at(1)) {
                            (Some('*'), Some('/')) => {
                                self.bump();
                                self.bump();
                                break;
                            }
                            (Some(_), _) => {
                                self.bump();
                            }
                            (None, _) => return Err(self.error("unterminated comment")),
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn digits(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() || c == '_' {
                self.bump();
            } else {
                break;
            }
        }
    }

    fn number(&mut self) -> Result<TokenKind> {
        let start = self.pos;
        self.digits();
        // Fraction only when a digit follows, so `items[0].name` keeps its dot
        if self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
            self.digits();
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            let signed = matches!(self.peek_at(1), Some('+' | '-'));
            let digit_at = if signed { 2 } else { 1 };
            if self.peek_at(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                self.bump();
                if signed {
                    self.bump();
                }
                self.digits();
            }
        }
        let text: String = self.src[start..self.pos].chars().filter(|c| *c != '_').collect();
        text.parse::<f64>()
            .map(TokenKind::Number)
            .map_err(|_| self.error(format!("invalid number '{}'", text)))
    }

    fn string(&mut self, quote: char) -> Result<TokenKind> {
        self.bump();
        let mut out = String::new();
        loop {
            let Some(c) = self.bump() else {
                return Err(self.error("unterminated string"));
            };
            match c {
                c if c == quote => break,
                '\n' => return Err(self.error("unterminated string")),
                '\\' => {
                    let Some(escaped) = self.bump() else {
                        return Err(self.error("unterminated string"));
                    };
                    match escaped {
                        'n' => out.push('\n'),
                        't' => out.push('\t'),
                        'r' => out.push('\r'),
                        '0' => out.push('\0'),
                        'u' => {
                            let mut code = String::new();
                            for _ in 0..4 {
                                match self.bump() {
                                    Some(h) if h.is_ascii_hexdigit() => code.push(h),
                                    _ => return Err(self.error("invalid unicode escape")),
                                }
                            }
                            let ch = u32::from_str_radix(&code, 16)
                                .ok()
                                .and_then(char::from_u32)
                                .ok_or_else(|| self.error("invalid unicode escape"))?;
                            out.push(ch);
                        }
                        other => out.push(other),
                    }
                }
                other => out.push(other),
            }
        }
        Ok(TokenKind::Str(out))
    }

    fn ident(&mut self) -> TokenKind {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' || c == '$' {
                self.bump();
            } else {
                break;
            }
        }
        TokenKind::Ident(self.src[start..self.pos].to_string())
    }

    fn punct(&mut self) -> Result<TokenKind> {
        let src = self.src;
        let rest = &src[self.pos..];
        for p in PUNCTUATION {
            if rest.starts_with(p) {
                // `?.` followed by a digit is a ternary, not optional chaining
                if *p == "?." && rest[2..].starts_with(|c: char| c.is_ascii_digit()) {
                    continue;
                }
                for _ in 0..p.len() {
                    self.bump();
                }
                return Ok(TokenKind::Punct(p));
            }
        }
        Err(self.error(format!(
            "unexpected character '{}'",
            rest.chars().next().unwrap_or(' ')
        )))
    }
}

/// Tokenize source text.
pub fn tokenize(src: &str) -> Result<Vec<Token>> {
    if src.len() > MAX_SOURCE_LEN {
        return Err(CueError::ScriptSyntax {
            line: 1,
            column: 1,
            message: format!("source exceeds {} bytes", MAX_SOURCE_LEN),
        });
    }

    let mut lexer = Lexer {
        src,
        pos: 0,
        line: 1,
        column: 1,
    };
    let mut tokens = Vec::new();

    loop {
        lexer.skip_trivia()?;
        let (line, column) = (lexer.line, lexer.column);
        let kind = match lexer.peek() {
            None => TokenKind::Eof,
            Some(c) if c.is_ascii_digit() => lexer.number()?,
            Some('.') if lexer.peek_at(1).is_some_and(|c| c.is_ascii_digit()) => lexer.number()?,
            Some(c @ ('"' | '\'')) => lexer.string(c)?,
            Some('`') => return Err(lexer.error("template literals are not supported; use format()")),
            Some(c) if c.is_alphabetic() || c == '_' || c == '$' => lexer.ident(),
            Some(_) => lexer.punct()?,
        };
        let done = kind == TokenKind::Eof;
        tokens.push(Token { kind, line, column });
        if done {
            return Ok(tokens);
        }
    }
}

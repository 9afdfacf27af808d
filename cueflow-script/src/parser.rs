//! Recursive-descent parser producing [`Expr`] and [`Program`] trees.
//!
//! Binary operators use precedence climbing. Arrow functions are detected by
//! looking ahead for `ident =>` or a balanced `( ... ) =>`. Semicolons are
//! optional between statements.

use crate::ast::{
    BinaryOp, DeclKind, Expr, Lambda, LambdaBody, LogicalOp, Program, Stmt, UnaryOp,
};
use crate::lexer::{Token, TokenKind, tokenize};
use cueflow_core::error::{CueError, Result};
use serde_json::Value;
use std::rc::Rc;

/// Maximum nesting of expressions and statements.
pub const MAX_NESTING: usize = 64;

const KEYWORDS: &[&str] = &[
    "let", "const", "var", "if", "else", "while", "for", "of", "in", "break", "continue",
    "return", "throw", "function", "true", "false", "null", "undefined", "typeof", "new",
];

/// Parse a single expression. Trailing input is an error.
pub fn parse_expression(src: &str) -> Result<Expr> {
    let mut parser = Parser::new(tokenize(src)?);
    let expr = parser.expression()?;
    parser.eat(";");
    parser.expect_eof()?;
    Ok(expr)
}

/// Parse a script body.
pub fn parse_program(src: &str) -> Result<Program> {
    let mut parser = Parser::new(tokenize(src)?);
    let mut body = Vec::new();
    while !parser.at_eof() {
        body.push(parser.statement()?);
    }
    Ok(Program { body })
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

fn binary_precedence(op: &str) -> Option<u8> {
    Some(match op {
        "??" | "||" => 1,
        "&&" => 2,
        "==" | "!=" | "===" | "!==" => 3,
        "<" | "<=" | ">" | ">=" => 4,
        "+" | "-" => 5,
        "*" | "/" | "%" => 6,
        _ => return None,
    })
}

fn binary_op(op: &str) -> Option<BinaryOp> {
    Some(match op {
        "+" | "+=" => BinaryOp::Add,
        "-" | "-=" => BinaryOp::Sub,
        "*" | "*=" => BinaryOp::Mul,
        "/" | "/=" => BinaryOp::Div,
        "%" | "%=" => BinaryOp::Rem,
        "==" => BinaryOp::LooseEq,
        "!=" => BinaryOp::LooseNe,
        "===" => BinaryOp::StrictEq,
        "!==" => BinaryOp::StrictNe,
        "<" => BinaryOp::Lt,
        "<=" => BinaryOp::Le,
        ">" => BinaryOp::Gt,
        ">=" => BinaryOp::Ge,
        _ => return None,
    })
}

fn is_assignable(expr: &Expr) -> bool {
    matches!(
        expr,
        Expr::Ident(_)
            | Expr::Member {
                optional: false,
                ..
            }
            | Expr::Index {
                optional: false,
                ..
            }
    )
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    fn peek(&self) -> &Token {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[self.pos.min(last)]
    }

    fn peek_kind_at(&self, offset: usize) -> Option<&TokenKind> {
        self.tokens.get(self.pos + offset).map(|t| &t.kind)
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn at_eof(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn is_punct(&self, p: &str) -> bool {
        matches!(self.peek().kind, TokenKind::Punct(q) if q == p)
    }

    fn is_word(&self, word: &str) -> bool {
        matches!(&self.peek().kind, TokenKind::Ident(w) if w == word)
    }

    fn eat(&mut self, p: &str) -> bool {
        if self.is_punct(p) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_word(&mut self, word: &str) -> bool {
        if self.is_word(word) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn error_at(&self, token: &Token, message: impl Into<String>) -> CueError {
        CueError::ScriptSyntax {
            line: token.line,
            column: token.column,
            message: message.into(),
        }
    }

    fn unexpected(&self) -> CueError {
        let token = self.peek();
        let found = match &token.kind {
            TokenKind::Number(n) => format!("number {}", n),
            TokenKind::Str(s) => format!("string '{}'", s),
            TokenKind::Ident(w) => format!("'{}'", w),
            TokenKind::Punct(p) => format!("'{}'", p),
            TokenKind::Eof => "end of input".to_string(),
        };
        self.error_at(token, format!("unexpected {}", found))
    }

    fn expect(&mut self, p: &str) -> Result<()> {
        if self.eat(p) {
            Ok(())
        } else {
            let token = self.peek().clone();
            Err(self.error_at(&token, format!("expected '{}'", p)))
        }
    }

    fn expect_eof(&self) -> Result<()> {
        if self.at_eof() {
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    fn identifier(&mut self) -> Result<String> {
        match &self.peek().kind {
            TokenKind::Ident(name) if !KEYWORDS.contains(&name.as_str()) => {
                let name = name.clone();
                self.pos += 1;
                Ok(name)
            }
            _ => Err(self.unexpected()),
        }
    }

    /// Property names may be keywords (`obj.in`, `{default: 1}`).
    fn property_name(&mut self) -> Result<String> {
        match &self.peek().kind {
            TokenKind::Ident(name) => {
                let name = name.clone();
                self.pos += 1;
                Ok(name)
            }
            _ => Err(self.unexpected()),
        }
    }

    fn enter(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            let token = self.peek().clone();
            return Err(self.error_at(
                &token,
                format!("nesting deeper than {} levels", MAX_NESTING),
            ));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    fn end_statement(&mut self) {
        self.eat(";");
    }

    // Statements

    fn statement(&mut self) -> Result<Stmt> {
        self.enter()?;
        let stmt = self.statement_inner();
        self.leave();
        stmt
    }

    fn statement_inner(&mut self) -> Result<Stmt> {
        if self.eat(";") {
            return Ok(Stmt::Empty);
        }
        if self.is_punct("{") {
            self.advance();
            return Ok(Stmt::Block(self.block_rest()?));
        }

        let word = match &self.peek().kind {
            TokenKind::Ident(w) => Some(w.clone()),
            _ => None,
        };
        match word.as_deref() {
            Some("let" | "const" | "var") => {
                let stmt = self.declaration()?;
                self.end_statement();
                Ok(stmt)
            }
            Some("function") => self.function_declaration(),
            Some("if") => {
                self.advance();
                self.expect("(")?;
                let test = self.expression()?;
                self.expect(")")?;
                let consequent = Box::new(self.statement()?);
                let alternate = if self.eat_word("else") {
                    Some(Box::new(self.statement()?))
                } else {
                    None
                };
                Ok(Stmt::If {
                    test,
                    consequent,
                    alternate,
                })
            }
            Some("while") => {
                self.advance();
                self.expect("(")?;
                let test = self.expression()?;
                self.expect(")")?;
                let body = Box::new(self.statement()?);
                Ok(Stmt::While { test, body })
            }
            Some("for") => self.for_statement(),
            Some("break") => {
                self.advance();
                self.end_statement();
                Ok(Stmt::Break)
            }
            Some("continue") => {
                self.advance();
                self.end_statement();
                Ok(Stmt::Continue)
            }
            Some("return") => {
                self.advance();
                let value = if self.is_punct(";") || self.is_punct("}") || self.at_eof() {
                    None
                } else {
                    Some(self.expression()?)
                };
                self.end_statement();
                Ok(Stmt::Return(value))
            }
            Some("throw") => {
                self.advance();
                let value = self.expression()?;
                self.end_statement();
                Ok(Stmt::Throw(value))
            }
            _ => {
                let expr = self.expression()?;
                self.end_statement();
                Ok(Stmt::Expr(expr))
            }
        }
    }

    fn block_rest(&mut self) -> Result<Vec<Stmt>> {
        let mut body = Vec::new();
        while !self.eat("}") {
            if self.at_eof() {
                return Err(self.unexpected());
            }
            body.push(self.statement()?);
        }
        Ok(body)
    }

    fn declaration(&mut self) -> Result<Stmt> {
        let kind = match self.advance().kind {
            TokenKind::Ident(ref w) if w == "const" => DeclKind::Const,
            _ => DeclKind::Let,
        };
        let name = self.identifier()?;
        let init = if self.eat("=") {
            Some(self.expression()?)
        } else {
            None
        };
        if kind == DeclKind::Const && init.is_none() {
            let token = self.peek().clone();
            return Err(self.error_at(&token, format!("const '{}' needs an initializer", name)));
        }
        Ok(Stmt::Declare { kind, name, init })
    }

    /// `function name(a, b) { ... }` binds a constant arrow.
    fn function_declaration(&mut self) -> Result<Stmt> {
        self.advance();
        let name = self.identifier()?;
        let lambda = self.function_rest()?;
        Ok(Stmt::Declare {
            kind: DeclKind::Const,
            name,
            init: Some(Expr::Arrow(Rc::new(lambda))),
        })
    }

    fn function_rest(&mut self) -> Result<Lambda> {
        self.expect("(")?;
        let params = self.params_rest()?;
        self.expect("{")?;
        let body = self.block_rest()?;
        Ok(Lambda {
            params,
            body: LambdaBody::Block(body),
        })
    }

    fn for_statement(&mut self) -> Result<Stmt> {
        self.advance();
        self.expect("(")?;

        // for (const x of items) / for (k in obj)
        let binding_offset = match self.peek_kind_at(0) {
            Some(TokenKind::Ident(w)) if matches!(w.as_str(), "let" | "const" | "var") => 1,
            _ => 0,
        };
        if let (Some(TokenKind::Ident(name)), Some(TokenKind::Ident(keyword))) = (
            self.peek_kind_at(binding_offset),
            self.peek_kind_at(binding_offset + 1),
        ) {
            if keyword == "of" || keyword == "in" {
                let name = name.clone();
                let is_of = keyword == "of";
                self.pos += binding_offset + 2;
                let target = self.expression()?;
                self.expect(")")?;
                let body = Box::new(self.statement()?);
                return Ok(if is_of {
                    Stmt::ForOf {
                        name,
                        iterable: target,
                        body,
                    }
                } else {
                    Stmt::ForIn {
                        name,
                        object: target,
                        body,
                    }
                });
            }
        }

        let init = if self.is_punct(";") {
            None
        } else if binding_offset == 1 {
            Some(Box::new(self.declaration()?))
        } else {
            Some(Box::new(Stmt::Expr(self.expression()?)))
        };
        self.expect(";")?;
        let test = if self.is_punct(";") {
            None
        } else {
            Some(self.expression()?)
        };
        self.expect(";")?;
        let update = if self.is_punct(")") {
            None
        } else {
            Some(self.expression()?)
        };
        self.expect(")")?;
        let body = Box::new(self.statement()?);
        Ok(Stmt::For {
            init,
            test,
            update,
            body,
        })
    }

    // Expressions

    fn expression(&mut self) -> Result<Expr> {
        self.enter()?;
        let expr = self.assignment();
        self.leave();
        expr
    }

    fn arrow_ahead(&self) -> bool {
        match self.peek_kind_at(0) {
            Some(TokenKind::Ident(_)) => {
                matches!(self.peek_kind_at(1), Some(TokenKind::Punct("=>")))
            }
            Some(TokenKind::Punct("(")) => {
                let mut depth = 0usize;
                let mut offset = 0;
                while let Some(kind) = self.peek_kind_at(offset) {
                    match kind {
                        TokenKind::Punct("(") => depth += 1,
                        TokenKind::Punct(")") => {
                            depth -= 1;
                            if depth == 0 {
                                return matches!(
                                    self.peek_kind_at(offset + 1),
                                    Some(TokenKind::Punct("=>"))
                                );
                            }
                        }
                        TokenKind::Eof => return false,
                        _ => {}
                    }
                    offset += 1;
                }
                false
            }
            _ => false,
        }
    }

    fn params_rest(&mut self) -> Result<Vec<String>> {
        let mut params = Vec::new();
        while !self.eat(")") {
            params.push(self.identifier()?);
            if !self.eat(",") {
                self.expect(")")?;
                break;
            }
        }
        Ok(params)
    }

    fn arrow(&mut self) -> Result<Expr> {
        let params = if self.eat("(") {
            self.params_rest()?
        } else {
            vec![self.identifier()?]
        };
        self.expect("=>")?;
        let body = if self.eat("{") {
            LambdaBody::Block(self.block_rest()?)
        } else {
            LambdaBody::Expr(Box::new(self.expression()?))
        };
        Ok(Expr::Arrow(Rc::new(Lambda { params, body })))
    }

    fn assignment(&mut self) -> Result<Expr> {
        if self.arrow_ahead() {
            return self.arrow();
        }

        let target = self.conditional()?;
        let op = match self.peek().kind {
            TokenKind::Punct("=") => None,
            TokenKind::Punct(p @ ("+=" | "-=" | "*=" | "/=" | "%=")) => binary_op(p),
            _ => return Ok(target),
        };
        let token = self.advance();
        if !is_assignable(&target) {
            return Err(self.error_at(&token, "invalid assignment target"));
        }
        let value = self.expression()?;
        Ok(Expr::Assign {
            target: Box::new(target),
            op,
            value: Box::new(value),
        })
    }

    fn conditional(&mut self) -> Result<Expr> {
        let test = self.binary(1)?;
        if !self.eat("?") {
            return Ok(test);
        }
        let consequent = self.expression()?;
        self.expect(":")?;
        let alternate = self.expression()?;
        Ok(Expr::Conditional {
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate: Box::new(alternate),
        })
    }

    fn binary(&mut self, min_precedence: u8) -> Result<Expr> {
        let mut left = self.unary()?;
        loop {
            let TokenKind::Punct(op) = self.peek().kind else {
                break;
            };
            let Some(precedence) = binary_precedence(op) else {
                break;
            };
            if precedence < min_precedence {
                break;
            }
            self.advance();
            let right = self.binary(precedence + 1)?;
            left = match op {
                "&&" | "||" | "??" => Expr::Logical {
                    op: match op {
                        "&&" => LogicalOp::And,
                        "||" => LogicalOp::Or,
                        _ => LogicalOp::Nullish,
                    },
                    left: Box::new(left),
                    right: Box::new(right),
                },
                _ => match binary_op(op) {
                    Some(op) => Expr::Binary {
                        op,
                        left: Box::new(left),
                        right: Box::new(right),
                    },
                    None => return Err(self.unexpected()),
                },
            };
        }
        Ok(left)
    }

    fn unary(&mut self) -> Result<Expr> {
        let op = match &self.peek().kind {
            TokenKind::Punct("!") => Some(UnaryOp::Not),
            TokenKind::Punct("-") => Some(UnaryOp::Neg),
            TokenKind::Punct("+") => Some(UnaryOp::Plus),
            TokenKind::Ident(w) if w == "typeof" => Some(UnaryOp::TypeOf),
            TokenKind::Punct(p @ ("++" | "--")) => {
                let increment = *p == "++";
                let token = self.advance();
                let target = self.unary()?;
                if !is_assignable(&target) {
                    return Err(self.error_at(&token, "invalid update target"));
                }
                return Ok(Expr::Update {
                    target: Box::new(target),
                    increment,
                    prefix: true,
                });
            }
            _ => None,
        };

        let Some(op) = op else {
            return self.postfix();
        };
        self.advance();
        self.enter()?;
        let operand = self.unary();
        self.leave();
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand?),
        })
    }

    fn postfix(&mut self) -> Result<Expr> {
        let expr = self.call_member()?;
        let increment = match self.peek().kind {
            TokenKind::Punct("++") => true,
            TokenKind::Punct("--") => false,
            _ => return Ok(expr),
        };
        let token = self.advance();
        if !is_assignable(&expr) {
            return Err(self.error_at(&token, "invalid update target"));
        }
        Ok(Expr::Update {
            target: Box::new(expr),
            increment,
            prefix: false,
        })
    }

    fn arguments_rest(&mut self) -> Result<Vec<Expr>> {
        let mut args = Vec::new();
        while !self.eat(")") {
            args.push(self.expression()?);
            if !self.eat(",") {
                self.expect(")")?;
                break;
            }
        }
        Ok(args)
    }

    fn call_member(&mut self) -> Result<Expr> {
        let mut expr = self.primary()?;
        loop {
            if self.eat(".") {
                let property = self.property_name()?;
                expr = Expr::Member {
                    object: Box::new(expr),
                    property,
                    optional: false,
                };
            } else if self.eat("?.") {
                if self.eat("[") {
                    let index = self.expression()?;
                    self.expect("]")?;
                    expr = Expr::Index {
                        object: Box::new(expr),
                        index: Box::new(index),
                        optional: true,
                    };
                } else if self.eat("(") {
                    let args = self.arguments_rest()?;
                    expr = Expr::Call {
                        callee: Box::new(expr),
                        args,
                    };
                } else {
                    let property = self.property_name()?;
                    expr = Expr::Member {
                        object: Box::new(expr),
                        property,
                        optional: true,
                    };
                }
            } else if self.eat("[") {
                let index = self.expression()?;
                self.expect("]")?;
                expr = Expr::Index {
                    object: Box::new(expr),
                    index: Box::new(index),
                    optional: false,
                };
            } else if self.eat("(") {
                let args = self.arguments_rest()?;
                expr = Expr::Call {
                    callee: Box::new(expr),
                    args,
                };
            } else {
                return Ok(expr);
            }
        }
    }

    fn primary(&mut self) -> Result<Expr> {
        let token = self.advance();
        match token.kind {
            TokenKind::Number(n) => Ok(Expr::Literal(Some(cueflow_core::value::number(n)))),
            TokenKind::Str(ref s) => Ok(Expr::Literal(Some(Value::String(s.clone())))),
            TokenKind::Ident(ref word) => match word.as_str() {
                "true" => Ok(Expr::Literal(Some(Value::Bool(true)))),
                "false" => Ok(Expr::Literal(Some(Value::Bool(false)))),
                "null" => Ok(Expr::Literal(Some(Value::Null))),
                "undefined" => Ok(Expr::Literal(None)),
                "function" => Ok(Expr::Arrow(Rc::new(self.function_rest()?))),
                "new" => Err(self.error_at(&token, "'new' is not supported")),
                w if KEYWORDS.contains(&w) => {
                    Err(self.error_at(&token, format!("unexpected '{}'", w)))
                }
                _ => Ok(Expr::Ident(word.clone())),
            },
            TokenKind::Punct("(") => {
                let expr = self.expression()?;
                self.expect(")")?;
                Ok(expr)
            }
            TokenKind::Punct("[") => {
                let mut items = Vec::new();
                while !self.eat("]") {
                    items.push(self.expression()?);
                    if !self.eat(",") {
                        self.expect("]")?;
                        break;
                    }
                }
                Ok(Expr::Array(items))
            }
            TokenKind::Punct("{") => {
                let mut entries = Vec::new();
                while !self.eat("}") {
                    let key_token = self.peek().clone();
                    let key = match &key_token.kind {
                        TokenKind::Str(s) => {
                            self.advance();
                            s.clone()
                        }
                        TokenKind::Number(n) => {
                            self.advance();
                            cueflow_core::value::to_display_string(&cueflow_core::value::number(*n))
                        }
                        _ => self.property_name()?,
                    };
                    let value = if self.eat(":") {
                        self.expression()?
                    } else if matches!(key_token.kind, TokenKind::Ident(_)) {
                        // Shorthand `{name}`
                        Expr::Ident(key.clone())
                    } else {
                        return Err(self.error_at(&key_token, "expected ':'"));
                    };
                    entries.push((key, value));
                    if !self.eat(",") {
                        self.expect("}")?;
                        break;
                    }
                }
                Ok(Expr::Object(entries))
            }
            _ => {
                self.pos -= 1;
                Err(self.unexpected())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn precedence_and_associativity() {
        let expr = parse_expression("1 + 2 * 3 - 4").unwrap();
        let Expr::Binary { op, left, .. } = expr else {
            panic!("expected binary");
        };
        assert_eq!(op, BinaryOp::Sub);
        assert!(matches!(*left, Expr::Binary { op: BinaryOp::Add, .. }));
    }

    #[test]
    fn member_chains_and_calls() {
        let expr = parse_expression("state.items[0]?.name.toUpperCase()").unwrap();
        let Expr::Call { callee, args } = expr else {
            panic!("expected call");
        };
        assert!(args.is_empty());
        assert!(matches!(*callee, Expr::Member { ref property, .. } if property == "toUpperCase"));
    }

    #[test]
    fn arrows_with_expression_and_block_bodies() {
        assert!(matches!(
            parse_expression("x => x * 2").unwrap(),
            Expr::Arrow(_)
        ));
        let Expr::Arrow(lambda) = parse_expression("(a, b) => { return a + b }").unwrap() else {
            panic!("expected arrow");
        };
        assert_eq!(lambda.params, vec!["a", "b"]);
        assert!(matches!(lambda.body, LambdaBody::Block(_)));
        // A parenthesized expression is not an arrow
        assert!(matches!(
            parse_expression("(a + b) * 2").unwrap(),
            Expr::Binary { .. }
        ));
    }

    #[test]
    fn object_literal_with_shorthand_and_quoted_keys() {
        let expr = parse_expression(r#"{a: 1, "b c": 2, d}"#).unwrap();
        let Expr::Object(entries) = expr else {
            panic!("expected object");
        };
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[1].0, "b c");
        assert_eq!(entries[2].1, Expr::Ident("d".into()));
    }

    #[test]
    fn statements_without_semicolons() {
        let program = parse_program(
            "let total = 0\nfor (const x of items) { total += x }\nif (total > 3) total = 3 else total = 0",
        )
        .unwrap();
        assert_eq!(program.body.len(), 3);
        assert!(matches!(program.body[1], Stmt::ForOf { .. }));
        assert!(matches!(program.body[2], Stmt::If { alternate: Some(_), .. }));
    }

    #[test]
    fn c_style_for_and_for_in() {
        let program = parse_program("for (let i = 0; i < 3; i++) {} for (k in obj) {}").unwrap();
        assert!(matches!(program.body[0], Stmt::For { .. }));
        assert!(matches!(program.body[1], Stmt::ForIn { .. }));
    }

    #[test]
    fn function_declaration_binds_const() {
        let program = parse_program("function double(n) { return n * 2 }").unwrap();
        assert!(matches!(
            &program.body[0],
            Stmt::Declare { kind: DeclKind::Const, name, .. } if name == "double"
        ));
    }

    #[test]
    fn literals() {
        assert_eq!(parse_expression("42").unwrap(), Expr::Literal(Some(json!(42))));
        assert_eq!(parse_expression("undefined").unwrap(), Expr::Literal(None));
    }

    #[test]
    fn rejects_invalid_assignment_target() {
        let err = parse_expression("1 = 2").unwrap_err();
        assert_eq!(err.code(), "E201");
        assert!(parse_expression("a?.b = 1").is_err());
    }

    #[test]
    fn rejects_trailing_tokens_and_new() {
        assert!(parse_expression("1 2").is_err());
        assert!(parse_expression("new Date()").is_err());
    }

    #[test]
    fn keyword_errors_point_at_the_keyword() {
        let err = parse_expression("1 + new Date()").unwrap_err();
        assert!(matches!(
            err,
            CueError::ScriptSyntax { line: 1, column: 5, ref message } if message.contains("'new'")
        ));
        let err = parse_expression("2 * while").unwrap_err();
        assert!(matches!(err, CueError::ScriptSyntax { ref message, .. } if message == "unexpected 'while'"));
        assert_eq!(parse_expression("'hi'").unwrap(), Expr::Literal(Some(json!("hi"))));
    }

    #[test]
    fn nesting_limit_is_a_syntax_error() {
        let deep = format!("{}1{}", "(".repeat(200), ")".repeat(200));
        let err = parse_expression(&deep).unwrap_err();
        assert!(matches!(err, CueError::ScriptSyntax { ref message, .. } if message.contains("nesting")));

        let bangs = format!("{}true", "!".repeat(200));
        assert!(parse_expression(&bangs).is_err());
    }
}

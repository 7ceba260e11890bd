use std::{collections::HashSet, rc::Rc};

use crate::{
    ast::{
        BinaryOp, Expr, ExprKind, FunctionDecl, IfBranch, Literal, Program, Stmt, StmtKind,
        UnaryOp,
    },
    diagnostics::{Diagnostic, SourceSpan},
    lexer::{Keyword, Lexer, Token, TokenKind},
    runtime::grow_stack,
};

/// Statements, groups and operands nested deeper than this are rejected.
pub const MAX_NESTING: usize = 256;

pub fn parse_program(source: &str) -> Result<Program, Diagnostic> {
    let tokens = Lexer::new(source).tokenize();
    parse_tokens(tokens)
}

pub fn parse_tokens(tokens: Vec<Token>) -> Result<Program, Diagnostic> {
    Parser::new(tokens).parse_program()
}

struct Parser {
    tokens: Vec<Token>,
    current: usize,
    depth: usize,
}

impl Parser {
    fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map(|t| t.kind) != Some(TokenKind::Eof) {
            let end = tokens.last().map(|t| t.span).unwrap_or_default();
            tokens.push(Token {
                kind: TokenKind::Eof,
                lexeme: String::new(),
                span: SourceSpan::new(end.end, end.end, end.line.max(1)),
            });
        }
        Self {
            tokens,
            current: 0,
            depth: 0,
        }
    }

    fn parse_program(&mut self) -> Result<Program, Diagnostic> {
        let mut statements = Vec::new();
        while !self.is_at_end() {
            statements.push(self.parse_statement()?);
        }
        Ok(Program { statements })
    }

    /// Runs `parse` one nesting level deeper, on a grown stack if needed.
    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, Diagnostic>,
    ) -> Result<T, Diagnostic> {
        if self.depth >= MAX_NESTING {
            let message = format!("code is nested more than {MAX_NESTING} levels deep");
            return Err(self.error_plain(self.peek(), &message));
        }
        self.depth += 1;
        let result = grow_stack(|| parse(self));
        self.depth -= 1;
        result
    }

    fn parse_statement(&mut self) -> Result<Stmt, Diagnostic> {
        self.nested(Self::parse_statement_kind)
    }

    fn parse_statement_kind(&mut self) -> Result<Stmt, Diagnostic> {
        match self.peek().kind {
            TokenKind::Keyword(Keyword::Var) => self.parse_var_decl(),
            TokenKind::Keyword(Keyword::Let) => self.parse_let_decl(),
            TokenKind::Keyword(Keyword::Fn) => self.parse_function(),
            TokenKind::Keyword(Keyword::If) => self.parse_if(),
            TokenKind::Keyword(Keyword::While) => self.parse_while(),
            TokenKind::Keyword(Keyword::For) => self.parse_for(),
            TokenKind::Keyword(Keyword::Give) => self.parse_give(),
            TokenKind::Keyword(Keyword::Pass) => {
                let span = self.advance().span;
                self.expect_terminator()?;
                Ok(Stmt {
                    kind: StmtKind::Pass,
                    span,
                })
            }
            TokenKind::PlusPlus | TokenKind::MinusMinus => self.parse_prefix_step(),
            TokenKind::Identifier if self.is_assignment_ahead() => self.parse_assignment(),
            _ => self.parse_expression_statement(),
        }
    }

    fn is_assignment_ahead(&self) -> bool {
        matches!(
            self.peek_next().kind,
            TokenKind::Assign
                | TokenKind::PlusAssign
                | TokenKind::MinusAssign
                | TokenKind::StarAssign
                | TokenKind::SlashAssign
                | TokenKind::PercentAssign
                | TokenKind::PlusPlus
                | TokenKind::MinusMinus
        )
    }

    /// A statement ends with `.`, which may be left out at end of input or
    /// right before `;`, `elif` or `else`.
    fn expect_terminator(&mut self) -> Result<(), Diagnostic> {
        if self.matches(TokenKind::Dot) {
            return Ok(());
        }
        match self.peek().kind {
            TokenKind::Eof
            | TokenKind::Semicolon
            | TokenKind::Keyword(Keyword::Elif)
            | TokenKind::Keyword(Keyword::Else) => Ok(()),
            _ => Err(self.error(self.peek(), "expected `.` to end the statement")),
        }
    }

    fn parse_var_decl(&mut self) -> Result<Stmt, Diagnostic> {
        let start = self.consume_keyword(Keyword::Var)?.span;
        let mut bindings = Vec::new();
        loop {
            let name = self.consume_identifier("expected variable name after `var`")?;
            let initializer = if self.matches(TokenKind::Assign) {
                Some(self.parse_expression()?)
            } else {
                None
            };
            bindings.push((name.lexeme, initializer));
            if !self.matches(TokenKind::Comma) {
                break;
            }
        }
        let end = self.previous().span;
        self.expect_terminator()?;
        Ok(Stmt {
            kind: StmtKind::VarDecl { bindings },
            span: start.to(end),
        })
    }

    fn parse_let_decl(&mut self) -> Result<Stmt, Diagnostic> {
        let start = self.consume_keyword(Keyword::Let)?.span;
        let name = self.consume_identifier("expected variable name after `let`")?;
        self.consume_keyword(Keyword::Be)?;
        let value = self.parse_expression()?;
        let span = start.to(value.span);
        self.expect_terminator()?;
        Ok(Stmt {
            kind: StmtKind::LetDecl {
                name: name.lexeme,
                value,
            },
            span,
        })
    }

    fn parse_assignment(&mut self) -> Result<Stmt, Diagnostic> {
        let name = self.advance();
        let operator = self.advance();
        let op = match operator.kind {
            TokenKind::Assign => None,
            TokenKind::PlusAssign | TokenKind::PlusPlus => Some(BinaryOp::Add),
            TokenKind::MinusAssign | TokenKind::MinusMinus => Some(BinaryOp::Sub),
            TokenKind::StarAssign => Some(BinaryOp::Mul),
            TokenKind::SlashAssign => Some(BinaryOp::Div),
            _ => Some(BinaryOp::Mod),
        };
        let value = if matches!(operator.kind, TokenKind::PlusPlus | TokenKind::MinusMinus) {
            one(operator.span)
        } else {
            self.parse_expression()?
        };
        let span = name.span.to(value.span);
        self.expect_terminator()?;
        Ok(Stmt {
            kind: StmtKind::Assign {
                name: name.lexeme,
                op,
                value,
            },
            span,
        })
    }

    /// `++x.` / `--x.`
    fn parse_prefix_step(&mut self) -> Result<Stmt, Diagnostic> {
        let operator = self.advance();
        let message = format!("expected variable name after `{}`", operator.lexeme);
        let name = self.consume_identifier(&message)?;
        let op = if operator.kind == TokenKind::PlusPlus {
            BinaryOp::Add
        } else {
            BinaryOp::Sub
        };
        let span = operator.span.to(name.span);
        self.expect_terminator()?;
        Ok(Stmt {
            kind: StmtKind::Assign {
                name: name.lexeme,
                op: Some(op),
                value: one(operator.span),
            },
            span,
        })
    }

    fn parse_function(&mut self) -> Result<Stmt, Diagnostic> {
        let start = self.consume_keyword(Keyword::Fn)?.span;
        let name = self.consume_identifier("expected function name after `fn`")?;
        let _ = self.matches(TokenKind::At);
        self.consume(TokenKind::LParen, "expected `(` to open the parameter list")?;
        let mut params = Vec::new();
        let mut seen = HashSet::new();
        if !self.check(TokenKind::RParen) {
            loop {
                let param = self.consume_identifier("expected parameter name")?;
                if !seen.insert(param.lexeme.clone()) {
                    return Err(Diagnostic::syntax(format!(
                        "duplicate parameter name `{}` in function `{}`",
                        param.lexeme, name.lexeme
                    ))
                    .with_span(param.span));
                }
                params.push(param.lexeme);
                if !self.matches(TokenKind::Comma) {
                    break;
                }
            }
        }
        let close = self.consume(TokenKind::RParen, "expected `)` after parameters")?;
        if matches!(self.peek().kind, TokenKind::Dot | TokenKind::Eof) {
            self.skip_trailing_dot();
            return Ok(Stmt {
                kind: StmtKind::Function(Rc::new(FunctionDecl {
                    name: name.lexeme,
                    params,
                    body: None,
                })),
                span: start.to(close.span),
            });
        }
        self.consume(TokenKind::Colon, "expected `:` to open the function body")?;
        let body = self.parse_block(&[TokenKind::Semicolon])?;
        let end = self.consume(TokenKind::Semicolon, "expected `;` to close the function body")?;
        if body.is_empty() {
            return Err(Diagnostic::syntax(format!(
                "function `{}` has an empty body; use `pass`",
                name.lexeme
            ))
            .with_span(name.span));
        }
        self.skip_trailing_dot();
        Ok(Stmt {
            kind: StmtKind::Function(Rc::new(FunctionDecl {
                name: name.lexeme,
                params,
                body: Some(body),
            })),
            span: start.to(end.span),
        })
    }

    fn parse_if(&mut self) -> Result<Stmt, Diagnostic> {
        const BRANCH_END: [TokenKind; 3] = [
            TokenKind::Keyword(Keyword::Elif),
            TokenKind::Keyword(Keyword::Else),
            TokenKind::Semicolon,
        ];
        let start = self.consume_keyword(Keyword::If)?.span;
        let mut branches = Vec::new();
        let condition = self.parse_expression()?;
        self.consume(TokenKind::Colon, "expected `:` after `if` condition")?;
        let body = self.parse_block(&BRANCH_END)?;
        branches.push(IfBranch { condition, body });

        while self.matches_keyword(Keyword::Elif) {
            let condition = self.parse_expression()?;
            self.consume(TokenKind::Colon, "expected `:` after `elif` condition")?;
            let body = self.parse_block(&BRANCH_END)?;
            branches.push(IfBranch { condition, body });
        }

        let else_branch = if self.matches_keyword(Keyword::Else) {
            self.consume(TokenKind::Colon, "expected `:` after `else`")?;
            Some(self.parse_block(&[TokenKind::Semicolon])?)
        } else {
            None
        };
        let end = self.consume(TokenKind::Semicolon, "expected `;` to close the `if` block")?;
        self.skip_trailing_dot();
        Ok(Stmt {
            kind: StmtKind::If {
                branches,
                else_branch,
            },
            span: start.to(end.span),
        })
    }

    fn parse_while(&mut self) -> Result<Stmt, Diagnostic> {
        let start = self.consume_keyword(Keyword::While)?.span;
        let condition = self.parse_expression()?;
        self.consume(TokenKind::Colon, "expected `:` after `while` condition")?;
        let body = self.parse_block(&[TokenKind::Semicolon])?;
        let end = self.consume(TokenKind::Semicolon, "expected `;` to close the `while` block")?;
        self.skip_trailing_dot();
        Ok(Stmt {
            kind: StmtKind::While { condition, body },
            span: start.to(end.span),
        })
    }

    fn parse_for(&mut self) -> Result<Stmt, Diagnostic> {
        let start = self.consume_keyword(Keyword::For)?.span;
        let binding = self
            .consume_identifier("expected loop variable after `for`")?
            .lexeme;
        self.consume_keyword(Keyword::In)?;

        let kind = if self.matches_keyword(Keyword::Range) {
            let open = self.consume(TokenKind::LParen, "expected `(` after `range`")?;
            let (from, to, step) = if self.matches_keyword(Keyword::From) {
                let from = self.parse_expression()?;
                self.consume_keyword(Keyword::To)?;
                let to = self.parse_expression()?;
                let step = if self.matches_keyword(Keyword::Step) {
                    Some(self.parse_expression()?)
                } else {
                    None
                };
                (from, to, step)
            } else {
                (zero(open.span), self.parse_expression()?, None)
            };
            self.consume(TokenKind::RParen, "expected `)` to close `range`")?;
            self.consume(TokenKind::Colon, "expected `:` after `range(...)`")?;
            let body = self.parse_block(&[TokenKind::Semicolon])?;
            StmtKind::ForRange {
                binding,
                from,
                to,
                step,
                body,
            }
        } else {
            let iterable = self.parse_expression()?;
            self.consume(TokenKind::Colon, "expected `:` after the iterable")?;
            let body = self.parse_block(&[TokenKind::Semicolon])?;
            StmtKind::ForIn {
                binding,
                iterable,
                body,
            }
        };
        let end = self.consume(TokenKind::Semicolon, "expected `;` to close the `for` block")?;
        self.skip_trailing_dot();
        Ok(Stmt {
            kind,
            span: start.to(end.span),
        })
    }

    fn parse_give(&mut self) -> Result<Stmt, Diagnostic> {
        let start = self.consume_keyword(Keyword::Give)?.span;
        let empty_parens =
            self.check(TokenKind::LParen) && self.peek_next().kind == TokenKind::RParen;
        let value = if empty_parens {
            self.advance();
            self.advance();
            None
        } else if matches!(
            self.peek().kind,
            TokenKind::Dot
                | TokenKind::Semicolon
                | TokenKind::Eof
                | TokenKind::Keyword(Keyword::Elif)
                | TokenKind::Keyword(Keyword::Else)
        ) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        let span = start.to(self.previous().span);
        self.expect_terminator()?;
        Ok(Stmt {
            kind: StmtKind::Give(value),
            span,
        })
    }

    fn parse_expression_statement(&mut self) -> Result<Stmt, Diagnostic> {
        let expr = self.parse_expression()?;
        let span = expr.span;
        self.expect_terminator()?;
        Ok(Stmt {
            kind: StmtKind::Expr(expr),
            span,
        })
    }

    /// Statements up to (not including) one of `terminators`.
    fn parse_block(&mut self, terminators: &[TokenKind]) -> Result<Vec<Stmt>, Diagnostic> {
        let mut items = Vec::new();
        while !terminators.contains(&self.peek().kind) {
            if self.is_at_end() {
                return Err(self.error(self.peek(), "expected `;` to close the block"));
            }
            items.push(self.parse_statement()?);
        }
        Ok(items)
    }

    /// `;` already closes a block statement, but `; .` is tolerated.
    fn skip_trailing_dot(&mut self) {
        let _ = self.matches(TokenKind::Dot);
    }

    fn parse_expression(&mut self) -> Result<Expr, Diagnostic> {
        self.nested(|parser| {
            let expr = parser.parse_or()?;
            if !parser.matches_keyword(Keyword::Of) {
                return Ok(expr);
            }
            let of = parser.previous().clone();
            let receiver = parser.parse_or()?;
            match expr.kind {
                ExprKind::Call { name, args } => Ok(Expr {
                    span: expr.span.to(receiver.span),
                    kind: ExprKind::MethodCall {
                        receiver: Box::new(receiver),
                        method: name,
                        args,
                    },
                }),
                _ => {
                    let message = "`of` must follow a method call such as `upper()`";
                    Err(parser.error_plain(&of, message))
                }
            }
        })
    }

    fn parse_or(&mut self) -> Result<Expr, Diagnostic> {
        let mut expr = self.parse_and()?;
        while self.matches(TokenKind::Or) {
            let right = self.parse_and()?;
            expr = binary(BinaryOp::Or, expr, right);
        }
        Ok(expr)
    }

    fn parse_and(&mut self) -> Result<Expr, Diagnostic> {
        let mut expr = self.parse_comparison()?;
        while self.matches(TokenKind::And) {
            let right = self.parse_comparison()?;
            expr = binary(BinaryOp::And, expr, right);
        }
        Ok(expr)
    }

    fn parse_comparison(&mut self) -> Result<Expr, Diagnostic> {
        let mut expr = self.parse_term()?;
        while let Some(op) = self.comparison_operator() {
            let right = self.parse_term()?;
            expr = binary(op, expr, right);
        }
        Ok(expr)
    }

    fn comparison_operator(&mut self) -> Option<BinaryOp> {
        let op = match self.peek().kind {
            TokenKind::EqualEqual => BinaryOp::Equal,
            TokenKind::BangEqual => BinaryOp::NotEqual,
            TokenKind::Less => BinaryOp::Less,
            TokenKind::LessEqual => BinaryOp::LessEqual,
            TokenKind::Greater => BinaryOp::Greater,
            TokenKind::GreaterEqual => BinaryOp::GreaterEqual,
            TokenKind::Keyword(Keyword::Is) => {
                self.advance();
                return Some(if self.matches(TokenKind::Not) {
                    BinaryOp::NotEqual
                } else {
                    BinaryOp::Equal
                });
            }
            TokenKind::Keyword(Keyword::Points) => BinaryOp::Identical,
            TokenKind::Not if self.peek_next().kind == TokenKind::Keyword(Keyword::Points) => {
                self.advance();
                BinaryOp::NotIdentical
            }
            _ => return None,
        };
        self.advance();
        Some(op)
    }

    fn parse_term(&mut self) -> Result<Expr, Diagnostic> {
        let mut expr = self.parse_factor()?;
        loop {
            let op = if self.matches(TokenKind::Plus) {
                BinaryOp::Add
            } else if self.matches(TokenKind::Minus) {
                BinaryOp::Sub
            } else {
                break;
            };
            let right = self.parse_factor()?;
            expr = binary(op, expr, right);
        }
        Ok(expr)
    }

    fn parse_factor(&mut self) -> Result<Expr, Diagnostic> {
        let mut expr = self.parse_power()?;
        loop {
            let op = if self.matches(TokenKind::Star) {
                BinaryOp::Mul
            } else if self.matches(TokenKind::Slash) {
                BinaryOp::Div
            } else if self.matches(TokenKind::Percent) {
                BinaryOp::Mod
            } else if self.implicit_multiplication() {
                BinaryOp::Mul
            } else {
                break;
            };
            let right = self.parse_power()?;
            expr = binary(op, expr, right);
        }
        Ok(expr)
    }

    /// `2x`, `3(y)`, `(a)(b)` and `(a)b` multiply without an operator.
    fn implicit_multiplication(&self) -> bool {
        if self.current == 0 {
            return false;
        }
        let after_operand = matches!(
            self.previous().kind,
            TokenKind::Int | TokenKind::Float | TokenKind::RParen
        );
        after_operand && matches!(self.peek().kind, TokenKind::LParen | TokenKind::Identifier)
    }

    fn parse_power(&mut self) -> Result<Expr, Diagnostic> {
        let base = self.parse_unary()?;
        if self.matches(TokenKind::Caret) {
            let exponent = self.nested(Self::parse_power)?;
            return Ok(binary(BinaryOp::Pow, base, exponent));
        }
        Ok(base)
    }

    fn parse_unary(&mut self) -> Result<Expr, Diagnostic> {
        let op = if self.matches(TokenKind::Minus) {
            UnaryOp::Negate
        } else if self.matches(TokenKind::Not) {
            UnaryOp::Not
        } else {
            return self.parse_postfix();
        };
        let operator = self.previous().span;
        let operand = self.nested(Self::parse_unary)?;
        Ok(Expr {
            span: operator.to(operand.span),
            kind: ExprKind::Unary {
                op,
                expr: Box::new(operand),
            },
        })
    }

    /// A primary followed by any number of `.method(args)` calls.
    fn parse_postfix(&mut self) -> Result<Expr, Diagnostic> {
        let mut expr = self.parse_primary()?;
        while self.at_method_call() {
            self.advance();
            let method = self.advance();
            self.advance();
            let (args, close) =
                self.parse_items(TokenKind::RParen, "`)` after method arguments")?;
            expr = Expr {
                span: expr.span.to(close),
                kind: ExprKind::MethodCall {
                    receiver: Box::new(expr),
                    method: method.lexeme,
                    args,
                },
            };
        }
        Ok(expr)
    }

    /// `.` directly touching `name(` starts a method call; with any space
    /// in between it ends the statement.
    fn at_method_call(&self) -> bool {
        let (Some(dot), Some(name), Some(open)) = (
            self.tokens.get(self.current),
            self.tokens.get(self.current + 1),
            self.tokens.get(self.current + 2),
        ) else {
            return false;
        };
        dot.kind == TokenKind::Dot
            && name.kind == TokenKind::Identifier
            && open.kind == TokenKind::LParen
            && dot.span.end == name.span.start
    }

    fn parse_primary(&mut self) -> Result<Expr, Diagnostic> {
        let token = self.peek().clone();
        let literal = match token.kind {
            TokenKind::Int => Literal::Int(token.lexeme.clone()),
            TokenKind::Float => match token.lexeme.parse::<f64>() {
                Ok(value) => Literal::Float(value),
                Err(_) => return Err(self.error(&token, "malformed number literal")),
            },
            TokenKind::String => Literal::String(token.lexeme.clone()),
            TokenKind::Keyword(Keyword::True) => Literal::Bool(true),
            TokenKind::Keyword(Keyword::False) => Literal::Bool(false),
            TokenKind::Keyword(Keyword::None) => Literal::None,
            TokenKind::Identifier => return self.parse_name(),
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expression()?;
                let close = self.consume(TokenKind::RParen, "expected `)` to close the group")?;
                return Ok(Expr {
                    span: token.span.to(close.span),
                    kind: inner.kind,
                });
            }
            TokenKind::LBracket => {
                self.advance();
                let (items, close) = self.parse_items(TokenKind::RBracket, "`]` to close the list")?;
                return Ok(Expr {
                    kind: ExprKind::ListLiteral(items),
                    span: token.span.to(close),
                });
            }
            TokenKind::LBrace => {
                self.advance();
                let (items, close) = self.parse_items(TokenKind::RBrace, "`}` to close the set")?;
                return Ok(Expr {
                    kind: ExprKind::SetLiteral(items),
                    span: token.span.to(close),
                });
            }
            TokenKind::UnterminatedString => {
                return Err(self.error_plain(&token, "unterminated string literal"));
            }
            TokenKind::Unknown => {
                return Err(
                    self.error_plain(&token, &format!("unexpected character `{}`", token.lexeme))
                );
            }
            _ => return Err(self.error(&token, "expected an expression")),
        };
        self.advance();
        Ok(Expr {
            kind: ExprKind::Literal(literal),
            span: token.span,
        })
    }

    fn parse_name(&mut self) -> Result<Expr, Diagnostic> {
        let name = self.advance();
        if !self.matches(TokenKind::LParen) {
            return Ok(Expr {
                kind: ExprKind::Variable(name.lexeme),
                span: name.span,
            });
        }
        let (args, close) = self.parse_items(TokenKind::RParen, "`)` after arguments")?;
        Ok(Expr {
            kind: ExprKind::Call {
                name: name.lexeme,
                args,
            },
            span: name.span.to(close),
        })
    }

    /// Comma separated expressions up to `close`, which is consumed.
    fn parse_items(
        &mut self,
        close: TokenKind,
        expected: &str,
    ) -> Result<(Vec<Expr>, SourceSpan), Diagnostic> {
        let mut items = Vec::new();
        if !self.check(close) {
            loop {
                items.push(self.parse_expression()?);
                if !self.matches(TokenKind::Comma) {
                    break;
                }
            }
        }
        let token = self.consume(close, &format!("expected {expected}"))?;
        Ok((items, token.span))
    }

    fn matches(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn matches_keyword(&mut self, keyword: Keyword) -> bool {
        self.matches(TokenKind::Keyword(keyword))
    }

    fn consume(&mut self, kind: TokenKind, message: &str) -> Result<Token, Diagnostic> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.error(self.peek(), message))
        }
    }

    fn consume_keyword(&mut self, keyword: Keyword) -> Result<Token, Diagnostic> {
        let message = format!("expected keyword `{}`", keyword_text(keyword));
        self.consume(TokenKind::Keyword(keyword), &message)
    }

    fn consume_identifier(&mut self, message: &str) -> Result<Token, Diagnostic> {
        self.consume(TokenKind::Identifier, message)
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn advance(&mut self) -> Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous().clone()
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current.saturating_sub(1)]
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current.min(self.tokens.len() - 1)]
    }

    fn peek_next(&self) -> &Token {
        &self.tokens[(self.current + 1).min(self.tokens.len() - 1)]
    }

    fn is_at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    /// Syntax error naming what was expected and the token actually found.
    fn error(&self, token: &Token, message: &str) -> Diagnostic {
        match token.kind {
            TokenKind::UnterminatedString => self.error_plain(token, "unterminated string literal"),
            TokenKind::Unknown => {
                self.error_plain(token, &format!("unexpected character `{}`", token.lexeme))
            }
            _ => Diagnostic::syntax(format!("{message}, found {}", token.describe()))
                .with_span(token.span),
        }
    }

    fn error_plain(&self, token: &Token, message: &str) -> Diagnostic {
        Diagnostic::syntax(message.to_string()).with_span(token.span)
    }
}

fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    Expr {
        span: left.span.to(right.span),
        kind: ExprKind::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        },
    }
}

fn one(span: SourceSpan) -> Expr {
    Expr {
        kind: ExprKind::Literal(Literal::Int("1".to_string())),
        span,
    }
}

fn zero(span: SourceSpan) -> Expr {
    Expr {
        kind: ExprKind::Literal(Literal::Int("0".to_string())),
        span,
    }
}

fn keyword_text(keyword: Keyword) -> &'static str {
    match keyword {
        Keyword::Var => "var",
        Keyword::Let => "let",
        Keyword::Be => "be",
        Keyword::Fn => "fn",
        Keyword::Give => "give",
        Keyword::If => "if",
        Keyword::Elif => "elif",
        Keyword::Else => "else",
        Keyword::While => "while",
        Keyword::For => "for",
        Keyword::In => "in",
        Keyword::Range => "range",
        Keyword::From => "from",
        Keyword::To => "to",
        Keyword::Step => "step",
        Keyword::Pass => "pass",
        Keyword::Is => "is",
        Keyword::Of => "of",
        Keyword::Points => "points",
        Keyword::True => "True",
        Keyword::False => "False",
        Keyword::None => "None",
    }
}

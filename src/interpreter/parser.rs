use std::rc::Rc;

use crate::ast::{BinaryOp, BoolOp, CmpOp, ExceptHandler, Expr, ExprKind, Stmt, UnaryOp};
use crate::diagnostic::{Diagnostic, Label, Span};
use crate::lexer::{lex, layout, LexError, Token};
use crate::value::Value;

#[derive(Debug, Clone)]
pub struct ParseError {
    pub message: String,
    pub span: Span,
    eof: bool,
}

impl ParseError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
            eof: false,
        }
    }

    pub fn eof(span: Span) -> Self {
        Self {
            message: "unexpected end of input".to_string(),
            span,
            eof: true,
        }
    }

    /// True when the parse ran off the end of the token stream, the signal
    /// the interactive driver reads as "needs more lines".
    pub fn is_eof(&self) -> bool {
        self.eof
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error(self.message.clone())
            .with_code("E0101")
            .with_label(Label::primary(self.span, ""))
    }
}

/// Compilation failure: either the raw text would not tokenize or the token
/// stream would not parse.
#[derive(Debug, Clone)]
pub enum CompileError {
    Lex(LexError),
    Parse(ParseError),
}

impl CompileError {
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            CompileError::Lex(err) => err.to_diagnostic(),
            CompileError::Parse(err) => err.to_diagnostic(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            CompileError::Lex(err) => &err.message,
            CompileError::Parse(err) => &err.message,
        }
    }
}

/// Tri-state result of trial compilation in interactive mode. Incomplete is
/// ordinary control data, not a caught failure.
#[derive(Debug)]
pub enum ParseOutcome {
    Ready(Vec<Stmt>),
    Incomplete,
    Invalid(CompileError),
}

/// Compile host source text into a statement list.
pub fn parse_program(source: &str) -> Result<Vec<Stmt>, CompileError> {
    let raw = lex(source).map_err(CompileError::Lex)?;
    let tokens = layout(raw, source).map_err(CompileError::Lex)?;
    let mut parser = TokenParser::new(tokens, source.len());
    parser.parse().map_err(CompileError::Parse)
}

/// Trial-compile accumulated interactive input.
///
/// Ready means a complete executable unit. Incomplete means a valid prefix
/// of a longer construct: the parse ran out of tokens, or the unit uses an
/// indented block and the input does not yet end in a blank line (a block
/// is only executed after an empty line, the interactive convention).
pub fn parse_interactive(source: &str) -> ParseOutcome {
    let raw = match lex(source) {
        Ok(tokens) => tokens,
        Err(err) => return ParseOutcome::Invalid(CompileError::Lex(err)),
    };
    let tokens = match layout(raw, source) {
        Ok(tokens) => tokens,
        Err(err) => return ParseOutcome::Invalid(CompileError::Lex(err)),
    };
    let has_block = tokens.iter().any(|(token, _)| *token == Token::Indent);
    let mut parser = TokenParser::new(tokens, source.len());
    match parser.parse() {
        Ok(stmts) => {
            if has_block && !source.ends_with("\n\n") {
                ParseOutcome::Incomplete
            } else {
                ParseOutcome::Ready(stmts)
            }
        }
        Err(err) if err.is_eof() => ParseOutcome::Incomplete,
        Err(err) => ParseOutcome::Invalid(CompileError::Parse(err)),
    }
}

pub struct TokenParser {
    tokens: Vec<(Token, Span)>,
    current: usize,
    source_len: usize,
    fn_depth: usize,
    loop_depth: usize,
}

impl TokenParser {
    pub fn new(tokens: Vec<(Token, Span)>, source_len: usize) -> Self {
        Self {
            tokens,
            current: 0,
            source_len,
            fn_depth: 0,
            loop_depth: 0,
        }
    }

    fn current_token(&self) -> Option<&Token> {
        self.tokens.get(self.current).map(|(token, _)| token)
    }

    fn peek(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.current + n).map(|(token, _)| token)
    }

    fn current_span(&self) -> Span {
        self.tokens
            .get(self.current)
            .map(|(_, span)| *span)
            .unwrap_or_else(|| Span::new(self.source_len, self.source_len))
    }

    fn previous_span(&self) -> Span {
        if self.current > 0 {
            self.tokens[self.current - 1].1
        } else {
            Span::new(0, 0)
        }
    }

    fn at_end(&self) -> bool {
        self.current >= self.tokens.len()
    }

    fn advance(&mut self) -> Option<Token> {
        if self.current < self.tokens.len() {
            let token = self.tokens[self.current].0.clone();
            self.current += 1;
            Some(token)
        } else {
            None
        }
    }

    fn check(&self, expected: &Token) -> bool {
        matches!(self.current_token(), Some(token) if std::mem::discriminant(token) == std::mem::discriminant(expected))
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.check(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: Token) -> Result<Span, ParseError> {
        match self.current_token() {
            Some(token)
                if std::mem::discriminant(token) == std::mem::discriminant(&expected) =>
            {
                let span = self.current_span();
                self.advance();
                Ok(span)
            }
            Some(token) => Err(ParseError::new(
                format!("expected {}, found {}", expected.describe(), token.describe()),
                self.current_span(),
            )),
            None => Err(ParseError::eof(self.current_span())),
        }
    }

    fn expect_name(&mut self) -> Result<(Rc<str>, Span), ParseError> {
        match self.current_token() {
            Some(Token::Name(name)) => {
                let name: Rc<str> = Rc::from(name.as_str());
                let span = self.current_span();
                self.advance();
                Ok((name, span))
            }
            Some(token) => Err(ParseError::new(
                format!("expected identifier, found {}", token.describe()),
                self.current_span(),
            )),
            None => Err(ParseError::eof(self.current_span())),
        }
    }

    pub fn parse(&mut self) -> Result<Vec<Stmt>, ParseError> {
        let mut stmts = Vec::new();
        while !self.at_end() {
            if self.eat(&Token::Newline) {
                continue;
            }
            self.parse_line_into(&mut stmts)?;
        }
        Ok(stmts)
    }

    fn parse_line_into(&mut self, out: &mut Vec<Stmt>) -> Result<(), ParseError> {
        match self.current_token() {
            Some(Token::If) => out.push(self.parse_if()?),
            Some(Token::While) => out.push(self.parse_while()?),
            Some(Token::For) => out.push(self.parse_for()?),
            Some(Token::Def) => out.push(self.parse_def()?),
            Some(Token::Class) => out.push(self.parse_class()?),
            Some(Token::Try) => out.push(self.parse_try()?),
            Some(Token::With) => out.push(self.parse_with()?),
            Some(Token::Indent) => {
                return Err(ParseError::new("unexpected indent", self.current_span()))
            }
            None => return Err(ParseError::eof(self.current_span())),
            _ => self.parse_simple_line(out)?,
        }
        Ok(())
    }

    fn parse_simple_line(&mut self, out: &mut Vec<Stmt>) -> Result<(), ParseError> {
        loop {
            out.push(self.parse_simple_stmt()?);
            if self.eat(&Token::Semicolon) {
                if matches!(self.current_token(), Some(Token::Newline) | None) {
                    break;
                }
                continue;
            }
            break;
        }
        self.expect_line_end()
    }

    fn expect_line_end(&mut self) -> Result<(), ParseError> {
        match self.current_token() {
            Some(Token::Newline) => {
                self.advance();
                Ok(())
            }
            None => Ok(()),
            Some(token) => Err(ParseError::new(
                format!("expected end of line, found {}", token.describe()),
                self.current_span(),
            )),
        }
    }

    fn at_inline_boundary(&self) -> bool {
        matches!(
            self.current_token(),
            Some(Token::Newline)
                | Some(Token::Else)
                | Some(Token::Elif)
                | Some(Token::Except)
                | Some(Token::Finally)
                | None
        )
    }

    /// A suite is either an indented block or an inline list of simple
    /// statements. Inline suites stop (without consuming) at `else`/`elif`/
    /// `except`/`finally`, which allows the one-line conditional form.
    fn parse_suite(&mut self) -> Result<Vec<Stmt>, ParseError> {
        self.expect(Token::Colon)?;
        if self.eat(&Token::Newline) {
            match self.current_token() {
                Some(Token::Indent) => {
                    self.advance();
                }
                None => return Err(ParseError::eof(self.current_span())),
                Some(_) => {
                    return Err(ParseError::new(
                        "expected an indented block",
                        self.current_span(),
                    ))
                }
            }
            let mut stmts = Vec::new();
            loop {
                match self.current_token() {
                    Some(Token::Dedent) => {
                        self.advance();
                        break;
                    }
                    Some(Token::Newline) => {
                        self.advance();
                    }
                    None => return Err(ParseError::eof(self.current_span())),
                    _ => self.parse_line_into(&mut stmts)?,
                }
            }
            Ok(stmts)
        } else {
            let mut stmts = vec![self.parse_simple_stmt()?];
            while self.eat(&Token::Semicolon) {
                if self.at_inline_boundary() {
                    break;
                }
                stmts.push(self.parse_simple_stmt()?);
            }
            match self.current_token() {
                Some(Token::Newline) => {
                    self.advance();
                }
                Some(Token::Else) | Some(Token::Elif) | Some(Token::Except)
                | Some(Token::Finally) | None => {}
                Some(token) => {
                    return Err(ParseError::new(
                        format!("expected end of line, found {}", token.describe()),
                        self.current_span(),
                    ))
                }
            }
            Ok(stmts)
        }
    }

    fn parse_if(&mut self) -> Result<Stmt, ParseError> {
        self.expect(Token::If)?;
        let condition = self.parse_expr()?;
        let body = self.parse_suite()?;
        let mut branches = vec![(condition, body)];
        let mut else_body = None;
        loop {
            if self.eat(&Token::Elif) {
                let condition = self.parse_expr()?;
                let body = self.parse_suite()?;
                branches.push((condition, body));
            } else if self.eat(&Token::Else) {
                else_body = Some(self.parse_suite()?);
                break;
            } else {
                break;
            }
        }
        Ok(Stmt::If {
            branches,
            else_body,
        })
    }

    fn parse_while(&mut self) -> Result<Stmt, ParseError> {
        self.expect(Token::While)?;
        let condition = self.parse_expr()?;
        self.loop_depth += 1;
        let body = self.parse_suite();
        self.loop_depth -= 1;
        Ok(Stmt::While {
            condition,
            body: body?,
        })
    }

    fn parse_for(&mut self) -> Result<Stmt, ParseError> {
        self.expect(Token::For)?;
        let (target, _) = self.expect_name()?;
        self.expect(Token::In)?;
        let iterable = self.parse_testlist()?;
        self.loop_depth += 1;
        let body = self.parse_suite();
        self.loop_depth -= 1;
        Ok(Stmt::For {
            target,
            iterable,
            body: body?,
        })
    }

    fn parse_def(&mut self) -> Result<Stmt, ParseError> {
        self.expect(Token::Def)?;
        let (name, _) = self.expect_name()?;
        self.expect(Token::LParen)?;
        let mut params = Vec::new();
        while !self.check(&Token::RParen) {
            let (param, _) = self.expect_name()?;
            params.push(param);
            if !self.eat(&Token::Comma) {
                break;
            }
        }
        self.expect(Token::RParen)?;
        self.fn_depth += 1;
        let body = self.parse_suite();
        self.fn_depth -= 1;
        Ok(Stmt::Def {
            name,
            params,
            body: body?,
        })
    }

    fn parse_class(&mut self) -> Result<Stmt, ParseError> {
        self.expect(Token::Class)?;
        let (name, span) = self.expect_name()?;
        if self.eat(&Token::LParen) {
            if !self.check(&Token::RParen) {
                return Err(ParseError::new(
                    "class inheritance is not supported",
                    self.current_span(),
                ));
            }
            self.expect(Token::RParen)?;
        }
        let body = self.parse_suite()?;
        Ok(Stmt::ClassDef { name, body, span })
    }

    fn parse_try(&mut self) -> Result<Stmt, ParseError> {
        let try_span = self.expect(Token::Try)?;
        let body = self.parse_suite()?;
        let mut handlers = Vec::new();
        while self.check(&Token::Except) {
            self.advance();
            let kind = match self.current_token() {
                Some(Token::Name(_)) => Some(self.expect_name()?.0),
                _ => None,
            };
            let alias = if self.eat(&Token::As) {
                Some(self.expect_name()?.0)
            } else {
                None
            };
            let handler_body = self.parse_suite()?;
            handlers.push(ExceptHandler {
                kind,
                alias,
                body: handler_body,
            });
        }
        let finally = if self.eat(&Token::Finally) {
            Some(self.parse_suite()?)
        } else {
            None
        };
        if handlers.is_empty() && finally.is_none() {
            return Err(ParseError::new(
                "expected `except` or `finally` after `try` block",
                try_span,
            ));
        }
        Ok(Stmt::Try {
            body,
            handlers,
            finally,
        })
    }

    fn parse_with(&mut self) -> Result<Stmt, ParseError> {
        self.expect(Token::With)?;
        let context = self.parse_expr()?;
        let alias = if self.eat(&Token::As) {
            Some(self.expect_name()?.0)
        } else {
            None
        };
        let body = self.parse_suite()?;
        Ok(Stmt::With {
            context,
            alias,
            body,
        })
    }

    fn at_stmt_end(&self) -> bool {
        matches!(self.current_token(), Some(Token::Semicolon) | None) || self.at_inline_boundary()
    }

    fn parse_simple_stmt(&mut self) -> Result<Stmt, ParseError> {
        let span = self.current_span();
        match self.current_token() {
            Some(Token::Return) => {
                if self.fn_depth == 0 {
                    return Err(ParseError::new("'return' outside function", span));
                }
                self.advance();
                let value = if self.at_stmt_end() {
                    None
                } else {
                    Some(self.parse_testlist()?)
                };
                Ok(Stmt::Return { value, span })
            }
            Some(Token::Break) => {
                if self.loop_depth == 0 {
                    return Err(ParseError::new("'break' outside loop", span));
                }
                self.advance();
                Ok(Stmt::Break { span })
            }
            Some(Token::Continue) => {
                if self.loop_depth == 0 {
                    return Err(ParseError::new("'continue' not properly in loop", span));
                }
                self.advance();
                Ok(Stmt::Continue { span })
            }
            Some(Token::Pass) => {
                self.advance();
                Ok(Stmt::Pass)
            }
            Some(Token::Raise) => {
                self.advance();
                let value = if self.at_stmt_end() {
                    None
                } else {
                    Some(self.parse_expr()?)
                };
                Ok(Stmt::Raise { value, span })
            }
            Some(Token::Assert) => {
                self.advance();
                let condition = self.parse_expr()?;
                let message = if self.eat(&Token::Comma) {
                    Some(self.parse_expr()?)
                } else {
                    None
                };
                Ok(Stmt::Assert {
                    condition,
                    message,
                    span,
                })
            }
            Some(Token::Import) => {
                self.advance();
                let (module, _) = self.expect_name()?;
                let alias = if self.eat(&Token::As) {
                    Some(self.expect_name()?.0)
                } else {
                    None
                };
                Ok(Stmt::Import {
                    module,
                    alias,
                    span,
                })
            }
            Some(Token::From) => {
                self.advance();
                let (module, _) = self.expect_name()?;
                self.expect(Token::Import)?;
                let mut names = Vec::new();
                loop {
                    let (name, _) = self.expect_name()?;
                    let alias = if self.eat(&Token::As) {
                        Some(self.expect_name()?.0)
                    } else {
                        None
                    };
                    names.push((name, alias));
                    if !self.eat(&Token::Comma) {
                        break;
                    }
                }
                Ok(Stmt::FromImport {
                    module,
                    names,
                    span,
                })
            }
            Some(Token::Global) => {
                self.advance();
                let names = self.parse_name_list()?;
                Ok(Stmt::Global { names })
            }
            Some(Token::Nonlocal) => {
                if self.fn_depth == 0 {
                    return Err(ParseError::new(
                        "nonlocal declaration not allowed at module level",
                        span,
                    ));
                }
                self.advance();
                let names = self.parse_name_list()?;
                Ok(Stmt::Nonlocal { names, span })
            }
            Some(Token::Yield) => Err(ParseError::new(
                "generator expressions (`yield`) are not supported",
                span,
            )),
            None => Err(ParseError::eof(span)),
            _ => self.parse_expr_stmt(),
        }
    }

    fn parse_name_list(&mut self) -> Result<Vec<Rc<str>>, ParseError> {
        let mut names = vec![self.expect_name()?.0];
        while self.eat(&Token::Comma) {
            names.push(self.expect_name()?.0);
        }
        Ok(names)
    }

    fn parse_expr_stmt(&mut self) -> Result<Stmt, ParseError> {
        let expr = self.parse_testlist()?;
        match self.current_token() {
            Some(Token::Assign) => {
                self.validate_target(&expr)?;
                self.advance();
                let value = self.parse_testlist()?;
                if self.check(&Token::Assign) {
                    return Err(ParseError::new(
                        "chained assignment is not supported",
                        self.current_span(),
                    ));
                }
                Ok(Stmt::Assign {
                    target: expr,
                    value,
                })
            }
            Some(Token::PlusEq) | Some(Token::MinusEq) | Some(Token::StarEq)
            | Some(Token::SlashEq) => {
                self.validate_target(&expr)?;
                let op = match self.current_token() {
                    Some(Token::PlusEq) => BinaryOp::Add,
                    Some(Token::MinusEq) => BinaryOp::Sub,
                    Some(Token::StarEq) => BinaryOp::Mul,
                    _ => BinaryOp::Div,
                };
                self.advance();
                let value = self.parse_testlist()?;
                Ok(Stmt::AugAssign {
                    target: expr,
                    op,
                    value,
                })
            }
            _ => Ok(Stmt::Expr(expr)),
        }
    }

    fn validate_target(&self, expr: &Expr) -> Result<(), ParseError> {
        match &expr.kind {
            ExprKind::Name(_) | ExprKind::Index { .. } | ExprKind::Attribute { .. } => Ok(()),
            ExprKind::Tuple(_) => Err(ParseError::new(
                "unpacking assignment is not supported",
                expr.span,
            )),
            _ => Err(ParseError::new(
                "cannot assign to this expression",
                expr.span,
            )),
        }
    }

    fn starts_expr(&self) -> bool {
        matches!(
            self.current_token(),
            Some(Token::Name(_))
                | Some(Token::Number(..))
                | Some(Token::Str(_))
                | Some(Token::TrueLit)
                | Some(Token::FalseLit)
                | Some(Token::NoneLit)
                | Some(Token::LParen)
                | Some(Token::LBracket)
                | Some(Token::LBrace)
                | Some(Token::Minus)
                | Some(Token::Plus)
                | Some(Token::Not)
                | Some(Token::Lambda)
        )
    }

    /// Expression or tuple display: `a, b` builds a tuple, as does a single
    /// trailing comma.
    fn parse_testlist(&mut self) -> Result<Expr, ParseError> {
        let first = self.parse_expr()?;
        if !self.check(&Token::Comma) {
            return Ok(first);
        }
        let start = first.span;
        let mut items = vec![first];
        while self.eat(&Token::Comma) {
            if !self.starts_expr() {
                break;
            }
            items.push(self.parse_expr()?);
        }
        let span = start.merge(self.previous_span());
        Ok(Expr::new(ExprKind::Tuple(items), span))
    }

    fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        if self.check(&Token::Lambda) {
            return self.parse_lambda();
        }
        self.parse_or()
    }

    fn parse_lambda(&mut self) -> Result<Expr, ParseError> {
        let start = self.expect(Token::Lambda)?;
        let mut params = Vec::new();
        if !self.check(&Token::Colon) {
            loop {
                let (param, _) = self.expect_name()?;
                params.push(param);
                if !self.eat(&Token::Comma) {
                    break;
                }
            }
        }
        self.expect(Token::Colon)?;
        let body = self.parse_expr()?;
        let span = start.merge(body.span);
        Ok(Expr::new(
            ExprKind::Lambda {
                params,
                body: Box::new(body),
            },
            span,
        ))
    }

    fn parse_or(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_and()?;
        while self.eat(&Token::Or) {
            let right = self.parse_and()?;
            let span = left.span.merge(right.span);
            left = Expr::new(
                ExprKind::BoolOp {
                    op: BoolOp::Or,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            );
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_not()?;
        while self.eat(&Token::And) {
            let right = self.parse_not()?;
            let span = left.span.merge(right.span);
            left = Expr::new(
                ExprKind::BoolOp {
                    op: BoolOp::And,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            );
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<Expr, ParseError> {
        if self.check(&Token::Not) {
            let start = self.current_span();
            self.advance();
            let operand = self.parse_not()?;
            let span = start.merge(operand.span);
            return Ok(Expr::new(
                ExprKind::Unary {
                    op: UnaryOp::Not,
                    operand: Box::new(operand),
                },
                span,
            ));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expr, ParseError> {
        let first = self.parse_arith()?;
        let mut rest: Vec<(CmpOp, Expr)> = Vec::new();
        loop {
            let op = match self.current_token() {
                Some(Token::Eq) => CmpOp::Eq,
                Some(Token::NotEq) => CmpOp::NotEq,
                Some(Token::Less) => CmpOp::Lt,
                Some(Token::Greater) => CmpOp::Gt,
                Some(Token::LessEq) => CmpOp::LtEq,
                Some(Token::GreaterEq) => CmpOp::GtEq,
                Some(Token::In) => CmpOp::In,
                Some(Token::Not) if matches!(self.peek(1), Some(Token::In)) => {
                    self.advance();
                    CmpOp::NotIn
                }
                _ => break,
            };
            self.advance();
            let right = self.parse_arith()?;
            rest.push((op, right));
        }
        if rest.is_empty() {
            return Ok(first);
        }
        let span = first.span.merge(rest.last().map(|(_, e)| e.span).unwrap());
        Ok(Expr::new(
            ExprKind::Compare {
                first: Box::new(first),
                rest,
            },
            span,
        ))
    }

    fn parse_arith(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_term()?;
        loop {
            let op = match self.current_token() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_term()?;
            let span = left.span.merge(right.span);
            left = Expr::new(
                ExprKind::Binary {
                    left: Box::new(left),
                    op,
                    right: Box::new(right),
                },
                span,
            );
        }
        Ok(left)
    }

    fn parse_term(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_factor()?;
        loop {
            let op = match self.current_token() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                Some(Token::DoubleSlash) => BinaryOp::FloorDiv,
                Some(Token::Percent) => BinaryOp::Mod,
                _ => break,
            };
            self.advance();
            let right = self.parse_factor()?;
            let span = left.span.merge(right.span);
            left = Expr::new(
                ExprKind::Binary {
                    left: Box::new(left),
                    op,
                    right: Box::new(right),
                },
                span,
            );
        }
        Ok(left)
    }

    fn parse_factor(&mut self) -> Result<Expr, ParseError> {
        let op = match self.current_token() {
            Some(Token::Minus) => Some(UnaryOp::Neg),
            Some(Token::Plus) => Some(UnaryOp::Pos),
            _ => None,
        };
        if let Some(op) = op {
            let start = self.current_span();
            self.advance();
            let operand = self.parse_factor()?;
            let span = start.merge(operand.span);
            return Ok(Expr::new(
                ExprKind::Unary {
                    op,
                    operand: Box::new(operand),
                },
                span,
            ));
        }
        self.parse_power()
    }

    fn parse_power(&mut self) -> Result<Expr, ParseError> {
        let base = self.parse_postfix()?;
        if self.eat(&Token::DoubleStar) {
            let exponent = self.parse_factor()?;
            let span = base.span.merge(exponent.span);
            return Ok(Expr::new(
                ExprKind::Binary {
                    left: Box::new(base),
                    op: BinaryOp::Pow,
                    right: Box::new(exponent),
                },
                span,
            ));
        }
        Ok(base)
    }

    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_atom()?;
        loop {
            if self.eat(&Token::LParen) {
                let mut args = Vec::new();
                while !self.check(&Token::RParen) {
                    args.push(self.parse_expr()?);
                    if !self.eat(&Token::Comma) {
                        break;
                    }
                }
                self.expect(Token::RParen)?;
                let span = expr.span.merge(self.previous_span());
                expr = Expr::new(
                    ExprKind::Call {
                        callee: Box::new(expr),
                        args,
                    },
                    span,
                );
            } else if self.eat(&Token::LBracket) {
                let index = self.parse_expr()?;
                self.expect(Token::RBracket)?;
                let span = expr.span.merge(self.previous_span());
                expr = Expr::new(
                    ExprKind::Index {
                        object: Box::new(expr),
                        index: Box::new(index),
                    },
                    span,
                );
            } else if self.eat(&Token::Dot) {
                let (name, name_span) = self.expect_name()?;
                let span = expr.span.merge(name_span);
                expr = Expr::new(
                    ExprKind::Attribute {
                        object: Box::new(expr),
                        name,
                    },
                    span,
                );
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn parse_atom(&mut self) -> Result<Expr, ParseError> {
        let span = self.current_span();
        match self.current_token().cloned() {
            Some(Token::Number(value, is_float)) => {
                self.advance();
                Ok(Expr::new(
                    ExprKind::Literal(Value::Number(value, is_float)),
                    span,
                ))
            }
            Some(Token::Str(text)) => {
                self.advance();
                Ok(Expr::new(ExprKind::Literal(Value::str(text)), span))
            }
            Some(Token::TrueLit) => {
                self.advance();
                Ok(Expr::new(ExprKind::Literal(Value::Bool(true)), span))
            }
            Some(Token::FalseLit) => {
                self.advance();
                Ok(Expr::new(ExprKind::Literal(Value::Bool(false)), span))
            }
            Some(Token::NoneLit) => {
                self.advance();
                Ok(Expr::new(ExprKind::Literal(Value::None), span))
            }
            Some(Token::Name(name)) => {
                self.advance();
                Ok(Expr::new(ExprKind::Name(Rc::from(name.as_str())), span))
            }
            Some(Token::LParen) => {
                self.advance();
                if self.eat(&Token::RParen) {
                    let span = span.merge(self.previous_span());
                    return Ok(Expr::new(ExprKind::Tuple(Vec::new()), span));
                }
                let inner = self.parse_testlist()?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            Some(Token::LBracket) => {
                self.advance();
                let mut elements = Vec::new();
                while !self.check(&Token::RBracket) {
                    elements.push(self.parse_expr()?);
                    if !self.eat(&Token::Comma) {
                        break;
                    }
                }
                self.expect(Token::RBracket)?;
                let span = span.merge(self.previous_span());
                Ok(Expr::new(ExprKind::List(elements), span))
            }
            Some(Token::LBrace) => {
                self.advance();
                if self.eat(&Token::RBrace) {
                    let span = span.merge(self.previous_span());
                    return Ok(Expr::new(ExprKind::Dict(Vec::new()), span));
                }
                let first = self.parse_expr()?;
                if self.eat(&Token::Colon) {
                    let value = self.parse_expr()?;
                    let mut entries = vec![(first, value)];
                    while self.eat(&Token::Comma) {
                        if self.check(&Token::RBrace) {
                            break;
                        }
                        let key = self.parse_expr()?;
                        self.expect(Token::Colon)?;
                        entries.push((key, self.parse_expr()?));
                    }
                    self.expect(Token::RBrace)?;
                    let span = span.merge(self.previous_span());
                    Ok(Expr::new(ExprKind::Dict(entries), span))
                } else {
                    let mut elements = vec![first];
                    while self.eat(&Token::Comma) {
                        if self.check(&Token::RBrace) {
                            break;
                        }
                        elements.push(self.parse_expr()?);
                    }
                    self.expect(Token::RBrace)?;
                    let span = span.merge(self.previous_span());
                    Ok(Expr::new(ExprKind::Set(elements), span))
                }
            }
            Some(token) => Err(ParseError::new(
                format!("unexpected {}", token.describe()),
                span,
            )),
            None => Err(ParseError::eof(span)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Vec<Stmt> {
        parse_program(source).expect("parse failed")
    }

    #[test]
    fn test_expression_statement() {
        let stmts = parse("1 + 2\n");
        assert_eq!(stmts.len(), 1);
        assert!(matches!(stmts[0], Stmt::Expr(_)));
    }

    #[test]
    fn test_assignment_forms() {
        assert!(matches!(parse("x = 1\n")[0], Stmt::Assign { .. }));
        assert!(matches!(parse("x += 1\n")[0], Stmt::AugAssign { .. }));
        assert!(matches!(parse("a[0] = 1\n")[0], Stmt::Assign { .. }));
        assert!(matches!(parse("a.b = 1\n")[0], Stmt::Assign { .. }));
        assert!(parse_program("1 = 2\n").is_err());
        assert!(parse_program("a, b = 1, 2\n").is_err());
    }

    #[test]
    fn test_if_with_indented_block() {
        let stmts = parse("if x:\n    y = 1\nelse:\n    y = 2\n");
        match &stmts[0] {
            Stmt::If {
                branches,
                else_body,
            } => {
                assert_eq!(branches.len(), 1);
                assert!(else_body.is_some());
            }
            other => panic!("expected if, got {:?}", other),
        }
    }

    #[test]
    fn test_inline_if_else_on_one_line() {
        let stmts = parse("if True: f(1) else: f(2)\n");
        match &stmts[0] {
            Stmt::If {
                branches,
                else_body,
            } => {
                assert_eq!(branches.len(), 1);
                assert_eq!(else_body.as_ref().unwrap().len(), 1);
            }
            other => panic!("expected if, got {:?}", other),
        }
    }

    #[test]
    fn test_elif_chain() {
        let stmts = parse("if a:\n    f(1)\nelif b:\n    f(2)\nelse:\n    f(3)\n");
        match &stmts[0] {
            Stmt::If { branches, .. } => assert_eq!(branches.len(), 2),
            other => panic!("expected if, got {:?}", other),
        }
    }

    #[test]
    fn test_def_inline_body() {
        let stmts = parse("def double(x): return x * 2\n");
        match &stmts[0] {
            Stmt::Def { name, params, body } => {
                assert_eq!(name.as_ref(), "double");
                assert_eq!(params.len(), 1);
                assert_eq!(body.len(), 1);
            }
            other => panic!("expected def, got {:?}", other),
        }
    }

    #[test]
    fn test_return_outside_function_rejected() {
        assert!(parse_program("return 1\n").is_err());
    }

    #[test]
    fn test_break_outside_loop_rejected() {
        assert!(parse_program("break\n").is_err());
    }

    #[test]
    fn test_chained_comparison() {
        let stmts = parse("1 < x < 10\n");
        match &stmts[0] {
            Stmt::Expr(expr) => match &expr.kind {
                ExprKind::Compare { rest, .. } => assert_eq!(rest.len(), 2),
                other => panic!("expected comparison, got {:?}", other),
            },
            other => panic!("expected expression, got {:?}", other),
        }
    }

    #[test]
    fn test_try_except_finally() {
        let stmts = parse(
            "try:\n    f()\nexcept TypeError as e:\n    g(e)\nfinally:\n    h()\n",
        );
        match &stmts[0] {
            Stmt::Try {
                handlers, finally, ..
            } => {
                assert_eq!(handlers.len(), 1);
                assert_eq!(handlers[0].kind.as_deref(), Some("TypeError"));
                assert_eq!(handlers[0].alias.as_deref(), Some("e"));
                assert!(finally.is_some());
            }
            other => panic!("expected try, got {:?}", other),
        }
    }

    #[test]
    fn test_try_requires_handler_or_finally() {
        assert!(parse_program("try:\n    f()\n").is_err());
    }

    #[test]
    fn test_yield_is_rejected() {
        assert!(parse_program("def g():\n    yield 1\n").is_err());
    }

    #[test]
    fn test_interactive_complete_single_line() {
        assert!(matches!(
            parse_interactive("print(1)\n"),
            ParseOutcome::Ready(_)
        ));
    }

    #[test]
    fn test_interactive_inline_compound_is_ready() {
        assert!(matches!(
            parse_interactive("if True: f(1) else: f(2)\n"),
            ParseOutcome::Ready(_)
        ));
    }

    #[test]
    fn test_interactive_open_block_is_incomplete() {
        assert!(matches!(
            parse_interactive("if x:\n"),
            ParseOutcome::Incomplete
        ));
        assert!(matches!(
            parse_interactive("def f(x):\n"),
            ParseOutcome::Incomplete
        ));
    }

    #[test]
    fn test_interactive_block_waits_for_blank_line() {
        assert!(matches!(
            parse_interactive("if x:\n    f(1)\n"),
            ParseOutcome::Incomplete
        ));
        assert!(matches!(
            parse_interactive("if x:\n    f(1)\n\n"),
            ParseOutcome::Ready(_)
        ));
    }

    #[test]
    fn test_interactive_open_bracket_is_incomplete() {
        assert!(matches!(
            parse_interactive("f(1,\n"),
            ParseOutcome::Incomplete
        ));
        assert!(matches!(
            parse_interactive("x = [1,\n"),
            ParseOutcome::Incomplete
        ));
    }

    #[test]
    fn test_interactive_syntax_error_is_invalid() {
        assert!(matches!(
            parse_interactive("1 +\n"),
            ParseOutcome::Invalid(_)
        ));
        assert!(matches!(
            parse_interactive(")\n"),
            ParseOutcome::Invalid(_)
        ));
    }

    #[test]
    fn test_interactive_empty_input_is_ready() {
        match parse_interactive("\n") {
            ParseOutcome::Ready(stmts) => assert!(stmts.is_empty()),
            other => panic!("expected ready, got {:?}", other),
        }
    }
}

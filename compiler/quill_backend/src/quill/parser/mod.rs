//! Recursive-descent parser for Quill.
//!
//! Recovers from errors at statement, member and item boundaries so one
//! submission reports every independent syntax error, not just the first.
//! A tree produced alongside errors is incomplete and must not be emitted.

mod cursor;

use quill_ir::Span;
use quill_stack::ensure_sufficient_stack;

use super::ast::{
    CompilationUnit, ExprKind, Expression, Import, Member, MemberKind, Param, Statement,
    StmtKind, TypeDecl,
};
use super::lexer::{tokenize, Token};
use super::{ErrorCode, Problem};
use crate::LanguageVersion;
use cursor::Cursor;

/// Deepest nesting the parser accepts.
///
/// Parentheses and blocks add a level each, and so does every `+` in a
/// chain, since the chain becomes a left-deep tree that lowering and
/// evaluation walk recursively.
const MAX_NESTING: usize = 512;

/// Marker for a parse failure that has already been recorded as a problem.
struct Reported;

type PResult<T> = Result<T, Reported>;

/// Parse a Quill unit.
pub fn parse(source: &str, version: LanguageVersion) -> (CompilationUnit, Vec<Problem>) {
    let (tokens, problems) = tokenize(source);
    let mut parser = Parser {
        cursor: Cursor::new(&tokens),
        problems,
        version,
        depth: 0,
    };
    let unit = parser.unit();
    (unit, parser.problems)
}

struct Parser<'a> {
    cursor: Cursor<'a>,
    problems: Vec<Problem>,
    version: LanguageVersion,
    depth: usize,
}

impl Parser<'_> {
    fn report(&mut self, code: ErrorCode, span: Span, message: impl Into<String>) -> Reported {
        self.problems.push(Problem::new(code, span, message));
        Reported
    }

    /// Claim one nesting level, or report Q1009 at `span` if none is left.
    fn descend(&mut self, span: Span) -> PResult<()> {
        if self.depth >= MAX_NESTING {
            let message = format!("nesting exceeds the limit of {MAX_NESTING} levels");
            return Err(self.report(ErrorCode::Q1009, span, message));
        }
        self.depth += 1;
        Ok(())
    }

    /// Run `f` one level deeper, growing the stack when it runs low.
    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> PResult<T>) -> PResult<T> {
        let saved = self.depth;
        let span = self.cursor.current().span;
        let result = self
            .descend(span)
            .and_then(|()| ensure_sufficient_stack(|| f(self)));
        self.depth = saved;
        result
    }

    fn expect(&mut self, expected: &Token) -> PResult<Span> {
        if self.cursor.check(expected) {
            return Ok(self.cursor.bump().span);
        }
        let found = self.cursor.current();
        let (span, message) = (found.span, format!("expected {expected}, found {}", found.token));
        Err(self.report(ErrorCode::Q1003, span, message))
    }

    fn expect_ident(&mut self) -> PResult<(String, Span)> {
        let current = self.cursor.current();
        if let Token::Ident(name) = &current.token {
            let out = (name.clone(), current.span);
            self.cursor.bump();
            return Ok(out);
        }
        let (span, message) = (
            current.span,
            format!("expected identifier, found {}", current.token),
        );
        Err(self.report(ErrorCode::Q1003, span, message))
    }

    // Items

    fn unit(&mut self) -> CompilationUnit {
        let mut unit = CompilationUnit::default();
        while !self.cursor.at_eof() {
            match self.cursor.current().token {
                Token::Import => match self.import() {
                    Ok(import) => unit.imports.push(import),
                    Err(Reported) => self.recover_item(),
                },
                Token::Pub | Token::Type => match self.type_decl() {
                    Ok(decl) => unit.types.push(decl),
                    Err(Reported) => self.recover_item(),
                },
                _ => {
                    let current = self.cursor.current();
                    let message =
                        format!("expected `import` or type declaration, found {}", current.token);
                    let span = current.span;
                    self.report(ErrorCode::Q1004, span, message);
                    self.cursor.bump();
                    self.recover_item();
                }
            }
        }
        unit
    }

    /// Skip to the next token that can start an item.
    fn recover_item(&mut self) {
        while !self.cursor.at_eof()
            && !matches!(
                self.cursor.current().token,
                Token::Import | Token::Pub | Token::Type
            )
        {
            self.cursor.bump();
        }
    }

    fn import(&mut self) -> PResult<Import> {
        let start = self.expect(&Token::Import)?;
        let (name, _) = self.expect_ident()?;
        let end = self.expect(&Token::Semi)?;
        Ok(Import {
            name,
            span: start.merge(end),
        })
    }

    fn type_decl(&mut self) -> PResult<TypeDecl> {
        let exported = self.cursor.eat(&Token::Pub);
        self.expect(&Token::Type)?;
        let (name, name_span) = self.expect_ident()?;
        self.expect(&Token::LBrace)?;

        let mut members = Vec::new();
        while !self.cursor.check(&Token::RBrace) && !self.cursor.at_eof() {
            match self.member() {
                Ok(member) => members.push(member),
                Err(Reported) => self.recover_member(),
            }
        }
        self.expect(&Token::RBrace)?;

        Ok(TypeDecl {
            name,
            name_span,
            exported,
            members,
        })
    }

    // Members

    /// Skip to the next `new`, `fn` or the closing brace of the type.
    ///
    /// Nested braces are skipped whole so a broken method body does not
    /// end the enclosing type early.
    fn recover_member(&mut self) {
        let mut depth = 0usize;
        loop {
            match self.cursor.current().token {
                Token::Eof => return,
                Token::New | Token::Fn if depth == 0 => return,
                Token::RBrace if depth == 0 => return,
                Token::LBrace => depth += 1,
                Token::RBrace => depth -= 1,
                _ => {}
            }
            self.cursor.bump();
        }
    }

    fn member(&mut self) -> PResult<Member> {
        let current = self.cursor.current();
        let (kind, name, name_span) = match &current.token {
            Token::New => {
                let span = self.cursor.bump().span;
                (MemberKind::Constructor, "new".to_string(), span)
            }
            Token::Fn => {
                self.cursor.bump();
                let (name, span) = self.expect_ident()?;
                (MemberKind::Method, name, span)
            }
            other => {
                let (span, message) = (
                    current.span,
                    format!("expected `new` or `fn`, found {other}"),
                );
                self.cursor.bump();
                return Err(self.report(ErrorCode::Q1005, span, message));
            }
        };
        let params = self.params()?;
        let body = self.block()?;
        Ok(Member {
            kind,
            name,
            name_span,
            params,
            body,
        })
    }

    fn params(&mut self) -> PResult<Vec<Param>> {
        self.expect(&Token::LParen)?;
        let mut params = Vec::new();
        if !self.cursor.check(&Token::RParen) {
            loop {
                let (name, span) = self.expect_ident()?;
                params.push(Param { name, span });
                if !self.cursor.eat(&Token::Comma) {
                    break;
                }
            }
        }
        self.expect(&Token::RParen)?;
        Ok(params)
    }

    // Statements

    fn block(&mut self) -> PResult<Vec<Statement>> {
        self.nested(Self::block_inner)
    }

    fn block_inner(&mut self) -> PResult<Vec<Statement>> {
        self.expect(&Token::LBrace)?;
        let mut stmts = Vec::new();
        while !self.cursor.check(&Token::RBrace) && !self.cursor.at_eof() {
            match self.statement() {
                Ok(stmt) => stmts.push(stmt),
                Err(Reported) => self.recover_statement(),
            }
        }
        self.expect(&Token::RBrace)?;
        Ok(stmts)
    }

    /// Skip past the next `;`, or up to a `}` at the current nesting level.
    fn recover_statement(&mut self) {
        let mut depth = 0usize;
        loop {
            match self.cursor.current().token {
                Token::Eof => return,
                Token::Semi if depth == 0 => {
                    self.cursor.bump();
                    return;
                }
                Token::RBrace if depth == 0 => return,
                Token::LBrace => depth += 1,
                Token::RBrace => depth -= 1,
                _ => {}
            }
            self.cursor.bump();
        }
    }

    fn statement(&mut self) -> PResult<Statement> {
        let start = self.cursor.current().span;
        let kind = match self.cursor.current().token {
            Token::Return => {
                self.cursor.bump();
                let value = if self.cursor.check(&Token::Semi) {
                    None
                } else {
                    Some(self.expression()?)
                };
                self.expect(&Token::Semi)?;
                StmtKind::Return(value)
            }
            Token::Fail => {
                self.cursor.bump();
                let message = self.expression()?;
                self.expect(&Token::Semi)?;
                StmtKind::Fail(message)
            }
            Token::Loop => {
                self.cursor.bump();
                if !self.version.is_preview() {
                    self.report(
                        ErrorCode::Q1008,
                        start,
                        "`loop` requires language version `preview`",
                    );
                }
                StmtKind::Loop(self.block()?)
            }
            Token::SelfKw => {
                self.cursor.bump();
                self.expect(&Token::Dot)?;
                let (field, _) = self.expect_ident()?;
                self.expect(&Token::Eq)?;
                let value = self.expression()?;
                self.expect(&Token::Semi)?;
                StmtKind::SetField { field, value }
            }
            ref other => {
                let message = format!("expected statement, found {other}");
                return Err(self.report(ErrorCode::Q1006, start, message));
            }
        };
        Ok(Statement {
            kind,
            span: start.merge(self.cursor.previous_span()),
        })
    }

    // Expressions

    fn expression(&mut self) -> PResult<Expression> {
        self.nested(Self::expression_inner)
    }

    /// Each `+` claims a level that stays held until the chain ends.
    fn expression_inner(&mut self) -> PResult<Expression> {
        let mut lhs = self.primary()?;
        while self.cursor.check(&Token::Plus) {
            let plus = self.cursor.bump().span;
            self.descend(plus)?;
            let rhs = self.primary()?;
            let span = lhs.span.merge(rhs.span);
            lhs = Expression {
                kind: ExprKind::Add(Box::new(lhs), Box::new(rhs)),
                span,
            };
        }
        Ok(lhs)
    }

    fn primary(&mut self) -> PResult<Expression> {
        let current = self.cursor.current();
        let span = current.span;
        let kind = match &current.token {
            Token::Str(text) => {
                let kind = ExprKind::Str(text.clone());
                self.cursor.bump();
                kind
            }
            Token::Int(digits) => {
                let parsed = digits.parse::<i64>();
                let digits = digits.clone();
                self.cursor.bump();
                match parsed {
                    Ok(value) => ExprKind::Int(value),
                    Err(_) => {
                        let message = format!("integer literal `{digits}` is too large");
                        return Err(self.report(ErrorCode::Q1007, span, message));
                    }
                }
            }
            Token::True => {
                self.cursor.bump();
                ExprKind::Bool(true)
            }
            Token::False => {
                self.cursor.bump();
                ExprKind::Bool(false)
            }
            Token::NoneKw => {
                self.cursor.bump();
                ExprKind::None
            }
            Token::SelfKw => {
                self.cursor.bump();
                self.expect(&Token::Dot)?;
                let (field, _) = self.expect_ident()?;
                ExprKind::Field(field)
            }
            Token::Ident(name) => {
                let name = name.clone();
                self.cursor.bump();
                if self.cursor.eat(&Token::Dot) {
                    let (member, _) = self.expect_ident()?;
                    ExprKind::Path {
                        library: name,
                        member,
                    }
                } else {
                    ExprKind::Name(name)
                }
            }
            Token::LParen => {
                self.cursor.bump();
                let inner = self.expression()?;
                let end = self.expect(&Token::RParen)?;
                return Ok(Expression {
                    kind: inner.kind,
                    span: span.merge(end),
                });
            }
            other => {
                let message = format!("expected expression, found {other}");
                return Err(self.report(ErrorCode::Q1006, span, message));
            }
        };
        Ok(Expression {
            kind,
            span: span.merge(self.cursor.previous_span()),
        })
    }
}

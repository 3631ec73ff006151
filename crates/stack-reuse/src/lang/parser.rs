use std::iter::Peekable;

use super::{
    ast::{Block, Builtin, Expression, Statement},
    interner::Interner,
    lexer::{tokenize, Spanned, Token},
};
use crate::Diagnostic;

/// Parses a whole program: a single block and nothing after it.
pub(super) fn parse(source: &str, interner: &mut Interner) -> Result<Block, Diagnostic> {
    let tokens = tokenize(source)?;
    let mut parser = Parser {
        tokens: tokens.into_iter().peekable(),
        interner,
        line: 1,
    };
    let block = parser.block()?;
    if let Some(trailing) = parser.tokens.next() {
        return Err(parser.unexpected(Some(trailing)));
    }
    Ok(block)
}

struct Parser<'a, I: Iterator<Item = Spanned>> {
    tokens: Peekable<I>,
    interner: &'a mut Interner,
    line: usize,
}

impl<I: Iterator<Item = Spanned>> Parser<'_, I> {
    fn next(&mut self) -> Option<Token> {
        let spanned = self.tokens.next()?;
        self.line = spanned.line;
        Some(spanned.token)
    }

    fn peek(&mut self) -> Option<&Token> {
        self.tokens.peek().map(|spanned| &spanned.token)
    }

    fn expect(&mut self, expected: &Token) -> Result<(), Diagnostic> {
        match self.next() {
            Some(token) if token == *expected => Ok(()),
            other => Err(self.error(format!(
                "expected {}, found {}",
                expected.describe(),
                describe(other.as_ref())
            ))),
        }
    }

    fn error(&self, message: String) -> Diagnostic {
        Diagnostic::error(format!("line {}: {message}", self.line))
    }

    fn unexpected(&mut self, token: Option<Spanned>) -> Diagnostic {
        if let Some(spanned) = &token {
            self.line = spanned.line;
        }
        let token = token.map(|spanned| spanned.token);
        self.error(format!("unexpected {}", describe(token.as_ref())))
    }

    fn block(&mut self) -> Result<Block, Diagnostic> {
        self.expect(&Token::LeftBrace)?;
        let mut statements = vec![];
        loop {
            if self.peek() == Some(&Token::RightBrace) {
                self.next();
                return Ok(Block { statements });
            }
            statements.push(self.statement()?);
        }
    }

    fn statement(&mut self) -> Result<Statement, Diagnostic> {
        match self.peek() {
            Some(Token::Let) => {
                self.next();
                let name = self.identifier()?;
                let name = self.interner.intern(&name);
                let value = if self.peek() == Some(&Token::ColonEquals) {
                    self.next();
                    Some(self.expression()?)
                } else {
                    None
                };
                Ok(Statement::Let { name, value })
            }
            Some(Token::If) => {
                self.next();
                let condition = self.expression()?;
                let body = self.block()?;
                Ok(Statement::If { condition, body })
            }
            Some(Token::LeftBrace) => Ok(Statement::Block(self.block()?)),
            Some(Token::Identifier(_)) => {
                let name = self.identifier()?;
                if self.peek() == Some(&Token::ColonEquals) {
                    self.next();
                    let name = self.interner.intern(&name);
                    let value = self.expression()?;
                    Ok(Statement::Assign { name, value })
                } else {
                    Ok(Statement::Expression(self.expression_after_identifier(name)?))
                }
            }
            Some(_) => Ok(Statement::Expression(self.expression()?)),
            None => Err(self.error("unexpected end of input".into())),
        }
    }

    fn identifier(&mut self) -> Result<String, Diagnostic> {
        match self.next() {
            Some(Token::Identifier(name)) => Ok(name),
            other => Err(self.error(format!(
                "expected identifier, found {}",
                describe(other.as_ref())
            ))),
        }
    }

    fn expression(&mut self) -> Result<Expression, Diagnostic> {
        match self.next() {
            Some(Token::Number(value)) => Ok(Expression::Literal(value)),
            Some(Token::Identifier(name)) => self.expression_after_identifier(name),
            other => Err(self.error(format!(
                "expected expression, found {}",
                describe(other.as_ref())
            ))),
        }
    }

    fn expression_after_identifier(&mut self, name: String) -> Result<Expression, Diagnostic> {
        if self.peek() != Some(&Token::LeftParen) {
            return Ok(Expression::Identifier(self.interner.intern(&name)));
        }
        self.next();

        let builtin = Builtin::from_name(&name)
            .ok_or_else(|| self.error(format!("function `{name}` not found")))?;
        let mut arguments = vec![];
        if self.peek() == Some(&Token::RightParen) {
            self.next();
        } else {
            loop {
                arguments.push(self.expression()?);
                match self.next() {
                    Some(Token::Comma) => {}
                    Some(Token::RightParen) => break,
                    other => {
                        return Err(self.error(format!(
                            "expected `,` or `)`, found {}",
                            describe(other.as_ref())
                        )))
                    }
                }
            }
        }
        Ok(Expression::Call { builtin, arguments })
    }
}

fn describe(token: Option<&Token>) -> String {
    token.map_or_else(|| "end of input".into(), Token::describe)
}

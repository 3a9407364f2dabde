use crate::ast::{
    Expr, ExprCall, ExprInfix, ExprLiteral, ExprLogic, ExprPrefix, ExprS, ExprVariable, OpInfix,
    OpLogic, OpPrefix, Program, Span, Stmt, StmtAssign, StmtBlock, StmtExpr, StmtFor, StmtFun,
    StmtIf, StmtKas, StmtReturn, StmtS, StmtSay, StmtWhile,
};
use crate::lexer::{Token, TokenKind};

use doro_common::error::{Error, ErrorS, ParseError};

use std::mem;
use std::rc::Rc;

type Result<T, E = ErrorS> = std::result::Result<T, E>;

/// How deeply expressions and blocks may nest. Each level of nesting costs
/// several stack frames here and in the interpreter.
pub const MAX_NESTING: usize = 100;

/// Recursive-descent parser over a lexed token sequence.
///
/// Expression rules, from loosest to tightest binding:
///
/// ```text
/// or             -> and ( "or" and )*
/// and            -> not ( "and" not )*
/// not            -> "not" not | equality
/// equality       -> relational ( ( "==" | "!=" ) relational )*
/// relational     -> additive ( ( "<" | ">" | "<=" | ">=" ) additive )*
/// additive       -> multiplicative ( ( "+" | "-" ) multiplicative )*
/// multiplicative -> unary ( ( "*" | "/" | "%" ) unary )*
/// unary          -> ( "-" | "+" ) unary | call
/// call           -> primary ( "(" arguments? ")" )*
/// primary        -> NUMBER | STRING | "true" | "false" | "nil" | IDENTIFIER | "(" or ")"
/// ```
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if !matches!(tokens.last(), Some(Token { kind: TokenKind::Eof, .. })) {
            let (end, line, column) = tokens
                .last()
                .map(|token| (token.span.end, token.line, token.column + token.lexeme.chars().count()))
                .unwrap_or((0, 1, 1));
            tokens.push(Token { kind: TokenKind::Eof, lexeme: String::new(), span: end..end, line, column });
        }
        Self { tokens, pos: 0, depth: 0 }
    }

    pub fn parse(mut self) -> Result<Program> {
        let mut stmts = Vec::new();
        loop {
            self.skip_separators();
            if self.at(&TokenKind::Eof) {
                break;
            }
            stmts.push(self.stmt()?);
        }
        Ok(Program { stmts })
    }

    fn stmt(&mut self) -> Result<StmtS> {
        let start = self.peek().span.start;
        let stmt = match self.peek().kind.clone() {
            TokenKind::Kas => Stmt::Kas(self.stmt_kas()?),
            TokenKind::Say => {
                self.advance();
                Stmt::Say(StmtSay { value: self.expr()? })
            }
            TokenKind::If => Stmt::If(Box::new(self.stmt_if()?)),
            TokenKind::While => Stmt::While(Box::new(self.stmt_while()?)),
            TokenKind::For => Stmt::For(Box::new(self.stmt_for()?)),
            TokenKind::Fun => Stmt::Fun(Rc::new(self.stmt_fun()?)),
            TokenKind::Return => Stmt::Return(self.stmt_return()?),
            TokenKind::LtBrace => Stmt::Block(self.block()?),
            TokenKind::Identifier(_) if self.peek_next().kind == TokenKind::Equal => {
                Stmt::Assign(self.stmt_assign()?)
            }
            _ => Stmt::Expr(StmtExpr { value: self.expr()? }),
        };
        Ok((stmt, start..self.prev_end()))
    }

    fn stmt_kas(&mut self) -> Result<StmtKas> {
        self.expect(TokenKind::Kas)?;
        let (name, _) = self.identifier()?;
        self.expect(TokenKind::Equal)?;
        let value = self.expr()?;
        Ok(StmtKas { name, value })
    }

    fn stmt_assign(&mut self) -> Result<StmtAssign> {
        let (name, _) = self.identifier()?;
        self.expect(TokenKind::Equal)?;
        let value = self.expr()?;
        Ok(StmtAssign { name, value })
    }

    fn stmt_if(&mut self) -> Result<StmtIf> {
        self.expect(TokenKind::If)?;
        let cond = self.condition()?;
        let then = self.block()?;
        let else_ = if self.eat(&TokenKind::Else) {
            if !(self.at(&TokenKind::If) || self.at(&TokenKind::LtBrace)) {
                return Err(
                    self.unexpected(vec![TokenKind::LtBrace.to_string(), TokenKind::If.to_string()])
                );
            }
            self.enter()?;
            let else_ = self.stmt()?;
            self.depth -= 1;
            Some(else_)
        } else {
            None
        };
        Ok(StmtIf { cond, then, else_ })
    }

    fn stmt_while(&mut self) -> Result<StmtWhile> {
        self.expect(TokenKind::While)?;
        let cond = self.condition()?;
        let body = self.block()?;
        Ok(StmtWhile { cond, body })
    }

    fn stmt_for(&mut self) -> Result<StmtFor> {
        self.expect(TokenKind::For)?;
        self.expect(TokenKind::LtParen)?;
        let (var, _) = self.identifier()?;
        self.expect(TokenKind::Equal)?;
        let start = self.expr()?;
        self.expect(TokenKind::To)?;
        let end = self.expr()?;
        let step = if self.eat(&TokenKind::Step) { Some(self.expr()?) } else { None };
        self.expect(TokenKind::RtParen)?;
        let body = self.block()?;
        Ok(StmtFor { var, start, end, step, body })
    }

    fn stmt_fun(&mut self) -> Result<StmtFun> {
        self.expect(TokenKind::Fun)?;
        let (name, _) = self.identifier()?;
        self.expect(TokenKind::LtParen)?;
        let mut params = Vec::new();
        if !self.at(&TokenKind::RtParen) {
            loop {
                params.push(self.identifier()?.0);
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RtParen)?;
        let body = self.block()?;
        Ok(StmtFun { name, params, body })
    }

    fn stmt_return(&mut self) -> Result<StmtReturn> {
        let keyword = self.expect(TokenKind::Return)?;
        let next = self.peek();
        // A bare `return` ends at a closing brace, a separator, or the end of its line.
        let bare = matches!(next.kind, TokenKind::RtBrace | TokenKind::Semicolon | TokenKind::Eof)
            || next.line > keyword.line;
        let value = if bare { None } else { Some(self.expr()?) };
        Ok(StmtReturn { value })
    }

    fn block(&mut self) -> Result<StmtBlock> {
        self.enter()?;
        self.expect(TokenKind::LtBrace)?;
        let mut stmts = Vec::new();
        loop {
            self.skip_separators();
            if self.eat(&TokenKind::RtBrace) {
                break;
            }
            if self.at(&TokenKind::Eof) {
                return Err(self.unexpected(vec![TokenKind::RtBrace.to_string()]));
            }
            stmts.push(self.stmt()?);
        }
        self.depth -= 1;
        Ok(StmtBlock { stmts })
    }

    /// A parenthesized `if`/`while` condition.
    fn condition(&mut self) -> Result<ExprS> {
        self.expect(TokenKind::LtParen)?;
        let cond = self.expr()?;
        self.expect(TokenKind::RtParen)?;
        Ok(cond)
    }

    fn expr(&mut self) -> Result<ExprS> {
        self.enter()?;
        let expr = self.expr_or()?;
        self.depth -= 1;
        Ok(expr)
    }

    fn expr_or(&mut self) -> Result<ExprS> {
        let depth = self.depth;
        let mut lt = self.expr_and()?;
        while self.eat(&TokenKind::Or) {
            // Each operator in a chain adds a level to the tree.
            self.enter()?;
            let rt = self.expr_and()?;
            lt = logic(lt, OpLogic::Or, rt);
        }
        self.depth = depth;
        Ok(lt)
    }

    fn expr_and(&mut self) -> Result<ExprS> {
        let depth = self.depth;
        let mut lt = self.expr_not()?;
        while self.eat(&TokenKind::And) {
            // Each operator in a chain adds a level to the tree.
            self.enter()?;
            let rt = self.expr_not()?;
            lt = logic(lt, OpLogic::And, rt);
        }
        self.depth = depth;
        Ok(lt)
    }

    fn expr_not(&mut self) -> Result<ExprS> {
        if self.at(&TokenKind::Not) {
            self.enter()?;
            let start = self.advance().span.start;
            let rt = self.expr_not()?;
            self.depth -= 1;
            return Ok(prefix(start, OpPrefix::Not, rt));
        }
        self.expr_equality()
    }

    fn expr_equality(&mut self) -> Result<ExprS> {
        let depth = self.depth;
        let mut lt = self.expr_relational()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::EqualEqual => OpInfix::Equal,
                TokenKind::BangEqual => OpInfix::NotEqual,
                _ => break,
            };
            self.advance();
            self.enter()?;
            let rt = self.expr_relational()?;
            lt = infix(lt, op, rt);
        }
        self.depth = depth;
        Ok(lt)
    }

    fn expr_relational(&mut self) -> Result<ExprS> {
        let depth = self.depth;
        let mut lt = self.expr_additive()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Less => OpInfix::Less,
                TokenKind::LessEqual => OpInfix::LessEqual,
                TokenKind::Greater => OpInfix::Greater,
                TokenKind::GreaterEqual => OpInfix::GreaterEqual,
                _ => break,
            };
            self.advance();
            self.enter()?;
            let rt = self.expr_additive()?;
            lt = infix(lt, op, rt);
        }
        self.depth = depth;
        Ok(lt)
    }

    fn expr_additive(&mut self) -> Result<ExprS> {
        let depth = self.depth;
        let mut lt = self.expr_multiplicative()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Plus => OpInfix::Add,
                TokenKind::Minus => OpInfix::Subtract,
                _ => break,
            };
            self.advance();
            self.enter()?;
            let rt = self.expr_multiplicative()?;
            lt = infix(lt, op, rt);
        }
        self.depth = depth;
        Ok(lt)
    }

    fn expr_multiplicative(&mut self) -> Result<ExprS> {
        let depth = self.depth;
        let mut lt = self.expr_unary()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Asterisk => OpInfix::Multiply,
                TokenKind::Slash => OpInfix::Divide,
                TokenKind::Percent => OpInfix::Modulo,
                _ => break,
            };
            self.advance();
            self.enter()?;
            let rt = self.expr_unary()?;
            lt = infix(lt, op, rt);
        }
        self.depth = depth;
        Ok(lt)
    }

    fn expr_unary(&mut self) -> Result<ExprS> {
        let op = match self.peek().kind {
            TokenKind::Minus => OpPrefix::Negate,
            TokenKind::Plus => OpPrefix::Plus,
            _ => return self.expr_call(),
        };
        self.enter()?;
        let start = self.advance().span.start;
        let rt = self.expr_unary()?;
        self.depth -= 1;
        Ok(prefix(start, op, rt))
    }

    fn expr_call(&mut self) -> Result<ExprS> {
        let mut expr = self.expr_primary()?;
        // An argument list must open on the line its callee ends on, so that a
        // parenthesized expression on the next line starts a new statement.
        while self.at(&TokenKind::LtParen) && self.peek().line == self.prev().line {
            self.advance();
            let mut args = Vec::new();
            if !self.at(&TokenKind::RtParen) {
                loop {
                    args.push(self.expr()?);
                    if !self.eat(&TokenKind::Comma) {
                        break;
                    }
                }
            }
            let end = self.expect(TokenKind::RtParen)?.span.end;
            let span = expr.1.start..end;
            expr = (Expr::Call(Box::new(ExprCall { callee: expr, args })), span);
        }
        Ok(expr)
    }

    fn expr_primary(&mut self) -> Result<ExprS> {
        let literal = match self.peek().kind.clone() {
            TokenKind::Number(number) => ExprLiteral::Number(number),
            TokenKind::String(string) => ExprLiteral::String(string),
            TokenKind::True => ExprLiteral::Bool(true),
            TokenKind::False => ExprLiteral::Bool(false),
            TokenKind::Nil => ExprLiteral::Nil,
            TokenKind::Identifier(name) => {
                let span = self.advance().span;
                return Ok((Expr::Variable(ExprVariable { name }), span));
            }
            TokenKind::LtParen => {
                let start = self.advance().span.start;
                let (expr, _) = self.expr()?;
                let end = self.expect(TokenKind::RtParen)?.span.end;
                return Ok((expr, start..end));
            }
            _ => return Err(self.unexpected(vec!["expression".to_string()])),
        };
        let span = self.advance().span;
        Ok((Expr::Literal(literal), span))
    }

    fn identifier(&mut self) -> Result<(String, Span)> {
        match self.peek().kind.clone() {
            TokenKind::Identifier(name) => Ok((name, self.advance().span)),
            _ => Err(self.unexpected(vec!["identifier".to_string()])),
        }
    }

    fn enter(&mut self) -> Result<()> {
        if self.depth >= MAX_NESTING {
            let e = ParseError::NestingLimit { limit: MAX_NESTING };
            return Err((Error::ParseError(e), self.peek().span.clone()));
        }
        self.depth += 1;
        Ok(())
    }

    fn skip_separators(&mut self) {
        while self.eat(&TokenKind::Semicolon) {}
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn peek_next(&self) -> &Token {
        &self.tokens[(self.pos + 1).min(self.tokens.len() - 1)]
    }

    fn prev(&self) -> &Token {
        &self.tokens[self.pos.saturating_sub(1)]
    }

    fn prev_end(&self) -> usize {
        self.prev().span.end
    }

    /// Compares token kinds, ignoring any payload.
    fn at(&self, kind: &TokenKind) -> bool {
        mem::discriminant(&self.peek().kind) == mem::discriminant(kind)
    }

    /// Consumes the current token. The trailing `Eof` is never consumed.
    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        let found = self.at(kind);
        if found {
            self.advance();
        }
        found
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token> {
        if self.at(&kind) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(vec![kind.to_string()]))
        }
    }

    fn unexpected(&self, expected: Vec<String>) -> ErrorS {
        let token = self.peek();
        let e = match token.kind {
            TokenKind::Eof => ParseError::UnrecognizedEof { expected },
            _ => ParseError::UnrecognizedToken { token: token.lexeme.clone(), expected },
        };
        (Error::ParseError(e), token.span.clone())
    }
}

fn infix(lt: ExprS, op: OpInfix, rt: ExprS) -> ExprS {
    let span = lt.1.start..rt.1.end;
    (Expr::Infix(Box::new(ExprInfix { lt, op, rt })), span)
}

fn logic(lt: ExprS, op: OpLogic, rt: ExprS) -> ExprS {
    let span = lt.1.start..rt.1.end;
    (Expr::Logic(Box::new(ExprLogic { lt, op, rt })), span)
}

fn prefix(start: usize, op: OpPrefix, rt: ExprS) -> ExprS {
    let span = start..rt.1.end;
    (Expr::Prefix(Box::new(ExprPrefix { op, rt })), span)
}

pub use doro_common::types::{Span, Spanned};

use std::fmt::{self, Display, Formatter};
use std::rc::Rc;

pub type StmtS = Spanned<Stmt>;
pub type ExprS = Spanned<Expr>;

#[derive(Debug, Default, PartialEq)]
pub struct Program {
    pub stmts: Vec<StmtS>,
}

#[derive(Debug, PartialEq)]
pub enum Stmt {
    Assign(StmtAssign),
    Block(StmtBlock),
    Expr(StmtExpr),
    For(Box<StmtFor>),
    Fun(Rc<StmtFun>),
    If(Box<StmtIf>),
    Kas(StmtKas),
    Return(StmtReturn),
    Say(StmtSay),
    While(Box<StmtWhile>),
}

/// Overwrites an existing binding; never declares one.
#[derive(Debug, PartialEq)]
pub struct StmtAssign {
    pub name: String,
    pub value: ExprS,
}

#[derive(Debug, Default, PartialEq)]
pub struct StmtBlock {
    pub stmts: Vec<StmtS>,
}

/// An expression statement evaluates an expression and discards the result.
#[derive(Debug, PartialEq)]
pub struct StmtExpr {
    pub value: ExprS,
}

/// `for (var = start to end step step) { body }`
#[derive(Debug, PartialEq)]
pub struct StmtFor {
    pub var: String,
    pub start: ExprS,
    pub end: ExprS,
    pub step: Option<ExprS>,
    pub body: StmtBlock,
}

#[derive(Debug, PartialEq)]
pub struct StmtFun {
    pub name: String,
    pub params: Vec<String>,
    pub body: StmtBlock,
}

#[derive(Debug, PartialEq)]
pub struct StmtIf {
    pub cond: ExprS,
    pub then: StmtBlock,
    /// Either a [`Stmt::Block`] or, for `else if`, a nested [`Stmt::If`].
    pub else_: Option<StmtS>,
}

/// Declares a variable in the innermost scope.
#[derive(Debug, PartialEq)]
pub struct StmtKas {
    pub name: String,
    pub value: ExprS,
}

#[derive(Debug, PartialEq)]
pub struct StmtReturn {
    pub value: Option<ExprS>,
}

#[derive(Debug, PartialEq)]
pub struct StmtSay {
    pub value: ExprS,
}

#[derive(Debug, PartialEq)]
pub struct StmtWhile {
    pub cond: ExprS,
    pub body: StmtBlock,
}

#[derive(Debug, PartialEq)]
pub enum Expr {
    Call(Box<ExprCall>),
    Infix(Box<ExprInfix>),
    Literal(ExprLiteral),
    Logic(Box<ExprLogic>),
    Prefix(Box<ExprPrefix>),
    Variable(ExprVariable),
}

#[derive(Debug, PartialEq)]
pub struct ExprCall {
    pub callee: ExprS,
    pub args: Vec<ExprS>,
}

#[derive(Debug, PartialEq)]
pub enum ExprLiteral {
    Nil,
    Bool(bool),
    Number(f64),
    String(String),
}

#[derive(Debug, PartialEq)]
pub struct ExprInfix {
    pub lt: ExprS,
    pub op: OpInfix,
    pub rt: ExprS,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OpInfix {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Equal,
    NotEqual,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
}

impl Display for OpInfix {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let op = match self {
            OpInfix::Add => "+",
            OpInfix::Subtract => "-",
            OpInfix::Multiply => "*",
            OpInfix::Divide => "/",
            OpInfix::Modulo => "%",
            OpInfix::Equal => "==",
            OpInfix::NotEqual => "!=",
            OpInfix::Greater => ">",
            OpInfix::GreaterEqual => ">=",
            OpInfix::Less => "<",
            OpInfix::LessEqual => "<=",
        };
        write!(f, "{op}")
    }
}

/// Short-circuiting logical operators.
#[derive(Debug, PartialEq)]
pub struct ExprLogic {
    pub lt: ExprS,
    pub op: OpLogic,
    pub rt: ExprS,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OpLogic {
    And,
    Or,
}

#[derive(Debug, PartialEq)]
pub struct ExprPrefix {
    pub op: OpPrefix,
    pub rt: ExprS,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OpPrefix {
    Negate,
    Plus,
    Not,
}

impl Display for OpPrefix {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let op = match self {
            OpPrefix::Negate => "-",
            OpPrefix::Plus => "+",
            OpPrefix::Not => "not",
        };
        write!(f, "{op}")
    }
}

#[derive(Debug, Eq, PartialEq)]
pub struct ExprVariable {
    pub name: String,
}

use crate::env::Env;
use crate::io::Io;
use crate::object::{Callable, Function, Native, Object};

use doro_common::error::{Error, Result, RuntimeError};
use doro_syntax::ast::{
    Expr, ExprLiteral, ExprS, OpInfix, OpLogic, OpPrefix, Program, Span, Stmt, StmtS,
};
use log::debug;

/// Calls nested deeper than this fail instead of exhausting the host stack.
pub const MAX_CALL_DEPTH: usize = 100;

/// How control leaves a statement.
#[derive(Debug, PartialEq)]
pub enum Flow {
    Normal,
    /// A `return` is unwinding to the nearest enclosing call.
    Return(Object),
}

#[derive(Debug)]
pub struct Interpreter<I> {
    globals: Env,
    io: I,
    depth: usize,
}

impl<I: Io> Interpreter<I> {
    pub fn new(io: I) -> Self {
        Self { globals: Self::new_globals(), io, depth: 0 }
    }

    fn new_globals() -> Env {
        let mut globals = Env::default();
        for native in Native::ALL {
            globals.define(native.name(), native.clone().into());
        }
        globals
    }

    /// Runs a program in the global scope. Bindings persist across calls, so
    /// an interactive session can run one line at a time.
    pub fn run(&mut self, program: &Program) -> Result<()> {
        debug!("running program with {} statement(s)", program.stmts.len());
        let globals = &mut self.globals.clone();
        for stmt in &program.stmts {
            self.run_stmt(globals, stmt)?;
        }
        Ok(())
    }

    pub fn globals(&self) -> &Env {
        &self.globals
    }

    /// Drops every user binding.
    pub fn reset(&mut self) {
        self.globals = Self::new_globals();
        self.depth = 0;
    }

    pub fn io(&mut self) -> &mut I {
        &mut self.io
    }

    pub fn into_io(self) -> I {
        self.io
    }

    pub(crate) fn enter_call(&mut self, span: &Span) -> Result<()> {
        if self.depth >= MAX_CALL_DEPTH {
            return Err((
                Error::RuntimeError(RuntimeError::RecursionLimit { limit: MAX_CALL_DEPTH }),
                span.clone(),
            ));
        }
        self.depth += 1;
        Ok(())
    }

    pub(crate) fn exit_call(&mut self) {
        self.depth -= 1;
    }

    /// Runs statements in `env` until they finish or one of them returns.
    pub(crate) fn run_stmts(&mut self, env: &mut Env, stmts: &[StmtS]) -> Result<Flow> {
        for stmt in stmts {
            if let Flow::Return(object) = self.run_stmt(env, stmt)? {
                return Ok(Flow::Return(object));
            }
        }
        Ok(Flow::Normal)
    }

    fn run_stmt(&mut self, env: &mut Env, stmt_s: &StmtS) -> Result<Flow> {
        let (stmt, span) = stmt_s;
        match stmt {
            Stmt::Assign(assign) => {
                let value = self.run_expr(env, &assign.value)?;
                if !env.assign(&assign.name, value) {
                    return Err(undefined(&assign.name, span));
                }
                Ok(Flow::Normal)
            }
            Stmt::Block(block) => {
                let env = &mut Env::with_parent(env);
                self.run_stmts(env, &block.stmts)
            }
            Stmt::Expr(expr) => {
                self.run_expr(env, &expr.value)?;
                Ok(Flow::Normal)
            }
            Stmt::For(for_) => {
                let start = self.run_loop_bound(env, &for_.start, "start")?;
                let end = self.run_loop_bound(env, &for_.end, "end")?;
                let step = match &for_.step {
                    Some(step_s) => {
                        let step = self.run_loop_bound(env, step_s, "step")?;
                        if step == 0.0 {
                            return Err((
                                Error::RuntimeError(RuntimeError::ZeroStep),
                                step_s.1.clone(),
                            ));
                        }
                        step
                    }
                    None => 1.0,
                };

                let env = &mut Env::with_parent(env);
                let mut current = start;
                while (step > 0.0 && current <= end) || (step < 0.0 && current >= end) {
                    env.define(&for_.var, Object::Number(current));
                    if let Flow::Return(object) = self.run_stmts(env, &for_.body.stmts)? {
                        return Ok(Flow::Return(object));
                    }
                    current += step;
                }
                Ok(Flow::Normal)
            }
            Stmt::Fun(fun) => {
                let function = Function::new(fun, env);
                env.define(&fun.name, function.into());
                Ok(Flow::Normal)
            }
            Stmt::If(if_) => {
                let cond = self.run_expr(env, &if_.cond)?;
                if cond.bool() {
                    self.run_stmts(env, &if_.then.stmts)
                } else {
                    match &if_.else_ {
                        // Branches share the enclosing scope.
                        Some((Stmt::Block(block), _)) => self.run_stmts(env, &block.stmts),
                        Some(else_) => self.run_stmt(env, else_),
                        None => Ok(Flow::Normal),
                    }
                }
            }
            Stmt::Kas(kas) => {
                let value = self.run_expr(env, &kas.value)?;
                env.define(&kas.name, value);
                Ok(Flow::Normal)
            }
            Stmt::Return(return_) => {
                if self.depth == 0 {
                    return Err((
                        Error::RuntimeError(RuntimeError::ReturnOutsideFunction),
                        span.clone(),
                    ));
                }
                let object = match &return_.value {
                    Some(value) => self.run_expr(env, value)?,
                    None => Object::Nil,
                };
                Ok(Flow::Return(object))
            }
            Stmt::Say(say) => {
                let value = self.run_expr(env, &say.value)?;
                self.io.output(&value.to_string()).map_err(|e| {
                    (
                        Error::RuntimeError(RuntimeError::WriteError { reason: e.to_string() }),
                        span.clone(),
                    )
                })?;
                Ok(Flow::Normal)
            }
            Stmt::While(while_) => {
                while self.run_expr(env, &while_.cond)?.bool() {
                    if let Flow::Return(object) = self.run_stmts(env, &while_.body.stmts)? {
                        return Ok(Flow::Return(object));
                    }
                }
                Ok(Flow::Normal)
            }
        }
    }

    fn run_loop_bound(&mut self, env: &mut Env, expr_s: &ExprS, bound: &str) -> Result<f64> {
        match self.run_expr(env, expr_s)? {
            Object::Number(number) => Ok(number),
            object => Err((
                Error::RuntimeError(RuntimeError::InvalidLoopBound {
                    bound: bound.to_string(),
                    type_: object.type_(),
                }),
                expr_s.1.clone(),
            )),
        }
    }

    fn run_expr(&mut self, env: &mut Env, expr_s: &ExprS) -> Result<Object> {
        let (expr, span) = expr_s;
        match expr {
            Expr::Call(call) => {
                let callee = self.run_expr(env, &call.callee)?;
                let args = call
                    .args
                    .iter()
                    .map(|arg| self.run_expr(env, arg))
                    .collect::<Result<Vec<_>>>()?;
                callee.call(self, args, span)
            }
            Expr::Infix(infix) => {
                let lt = self.run_expr(env, &infix.lt)?;
                let rt = self.run_expr(env, &infix.rt)?;
                run_infix(infix.op, lt, rt, span)
            }
            Expr::Literal(literal) => Ok(match literal {
                ExprLiteral::Nil => Object::Nil,
                ExprLiteral::Bool(bool) => Object::Bool(*bool),
                ExprLiteral::Number(number) => Object::Number(*number),
                ExprLiteral::String(string) => Object::String(string.clone()),
            }),
            Expr::Logic(logic) => {
                let lt = self.run_expr(env, &logic.lt)?.bool();
                let result = match logic.op {
                    OpLogic::And => lt && self.run_expr(env, &logic.rt)?.bool(),
                    OpLogic::Or => lt || self.run_expr(env, &logic.rt)?.bool(),
                };
                Ok(Object::Bool(result))
            }
            Expr::Prefix(prefix) => {
                let rt = self.run_expr(env, &prefix.rt)?;
                match (prefix.op, rt) {
                    (OpPrefix::Negate, Object::Number(number)) => Ok(Object::Number(-number)),
                    (OpPrefix::Plus, Object::Number(number)) => Ok(Object::Number(number)),
                    (OpPrefix::Not, rt) => Ok(Object::Bool(!rt.bool())),
                    (op, rt) => Err((
                        Error::RuntimeError(RuntimeError::UnsupportedOperandPrefix {
                            op: op.to_string(),
                            rt_type: rt.type_(),
                        }),
                        span.clone(),
                    )),
                }
            }
            Expr::Variable(var) => env.get(&var.name).ok_or_else(|| undefined(&var.name, span)),
        }
    }
}

fn run_infix(op: OpInfix, lt: Object, rt: Object, span: &Span) -> Result<Object> {
    let error = |e| Err((Error::RuntimeError(e), span.clone()));
    match (op, lt, rt) {
        (OpInfix::Add, Object::Number(a), Object::Number(b)) => Ok(Object::Number(a + b)),
        (OpInfix::Add, a @ Object::String(_), b) | (OpInfix::Add, a, b @ Object::String(_)) => {
            Ok(Object::String(format!("{a}{b}")))
        }
        (OpInfix::Subtract, Object::Number(a), Object::Number(b)) => Ok(Object::Number(a - b)),
        (OpInfix::Multiply, Object::Number(a), Object::Number(b)) => Ok(Object::Number(a * b)),
        (OpInfix::Divide, Object::Number(_), Object::Number(b)) if b == 0.0 => {
            error(RuntimeError::DivisionByZero)
        }
        (OpInfix::Divide, Object::Number(a), Object::Number(b)) => Ok(Object::Number(a / b)),
        (OpInfix::Modulo, Object::Number(_), Object::Number(b)) if b == 0.0 => {
            error(RuntimeError::ModuloByZero)
        }
        (OpInfix::Modulo, Object::Number(a), Object::Number(b)) => {
            // Floored: the result takes the sign of the divisor.
            let rem = a % b;
            Ok(Object::Number(if rem != 0.0 && (rem < 0.0) != (b < 0.0) { rem + b } else { rem }))
        }
        (OpInfix::Less, Object::Number(a), Object::Number(b)) => Ok(Object::Bool(a < b)),
        (OpInfix::LessEqual, Object::Number(a), Object::Number(b)) => Ok(Object::Bool(a <= b)),
        (OpInfix::Greater, Object::Number(a), Object::Number(b)) => Ok(Object::Bool(a > b)),
        (OpInfix::GreaterEqual, Object::Number(a), Object::Number(b)) => Ok(Object::Bool(a >= b)),
        (OpInfix::Equal, a, b) => Ok(Object::Bool(a == b)),
        (OpInfix::NotEqual, a, b) => Ok(Object::Bool(a != b)),
        (op, a, b) => error(RuntimeError::UnsupportedOperandInfix {
            op: op.to_string(),
            lt_type: a.type_(),
            rt_type: b.type_(),
        }),
    }
}

fn undefined(name: &str, span: &Span) -> (Error, Span) {
    (Error::RuntimeError(RuntimeError::UndefinedVariable { name: name.to_string() }), span.clone())
}

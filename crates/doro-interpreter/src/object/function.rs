use crate::env::Env;
use crate::interpreter::Flow;
use crate::io::Io;
use crate::object::{Callable, Object};
use crate::Interpreter;

use doro_common::error::Result;
use doro_common::types::Span;
use doro_syntax::ast::{StmtFun, StmtS};
use gc::{Finalize, Gc, Trace};
use log::trace;

use std::fmt::{self, Debug, Display, Formatter};
use std::ops::Deref;
use std::rc::Rc;

/// A user-defined function closed over the scope it was declared in.
#[derive(Clone, Finalize, Trace)]
pub struct Function(Gc<FunctionImpl>);

impl Function {
    pub fn new(decl: &Rc<StmtFun>, env: &Env) -> Self {
        Function(Gc::new(FunctionImpl { decl: Rc::clone(decl), env: env.clone() }))
    }

    pub fn params(&self) -> &[String] {
        &self.decl.params
    }

    pub fn stmts(&self) -> &[StmtS] {
        &self.decl.body.stmts
    }
}

impl Callable for Function {
    fn arity(&self) -> usize {
        self.decl.params.len()
    }

    fn name(&self) -> &str {
        &self.decl.name
    }

    fn call_unchecked<I: Io>(
        &self,
        interpreter: &mut Interpreter<I>,
        args: Vec<Object>,
        span: &Span,
    ) -> Result<Object> {
        trace!("calling {}() with {} argument(s)", self.name(), args.len());

        // Parameters live in a fresh scope whose parent is the closure, not the caller.
        let env = &mut Env::with_parent(&self.env);
        for (param, arg) in self.params().iter().zip(args) {
            env.define(param, arg);
        }

        interpreter.enter_call(span)?;
        let flow = interpreter.run_stmts(env, self.stmts());
        interpreter.exit_call();

        Ok(match flow? {
            Flow::Return(object) => object,
            Flow::Normal => Object::Nil,
        })
    }
}

impl Debug for Function {
    // The closure environment usually contains the function itself.
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function").field("name", &self.name()).finish_non_exhaustive()
    }
}

impl Display for Function {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "<fun {}>", self.name())
    }
}

impl Deref for Function {
    type Target = FunctionImpl;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Eq for Function {}

impl From<Function> for Object {
    fn from(function: Function) -> Self {
        Object::Function(function)
    }
}

impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        Gc::ptr_eq(&self.0, &other.0)
    }
}

#[derive(Finalize, Trace)]
pub struct FunctionImpl {
    #[unsafe_ignore_trace]
    pub decl: Rc<StmtFun>,
    pub env: Env,
}

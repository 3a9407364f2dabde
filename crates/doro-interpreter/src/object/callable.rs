use doro_common::error::{Error, Result, RuntimeError};
use doro_common::types::Span;

use crate::io::Io;
use crate::object::Object;
use crate::Interpreter;

pub trait Callable {
    fn arity(&self) -> usize;

    fn name(&self) -> &str;

    fn call_unchecked<I: Io>(
        &self,
        interpreter: &mut Interpreter<I>,
        args: Vec<Object>,
        span: &Span,
    ) -> Result<Object>;

    fn call<I: Io>(
        &self,
        interpreter: &mut Interpreter<I>,
        args: Vec<Object>,
        span: &Span,
    ) -> Result<Object> {
        let exp_args = self.arity();
        let got_args = args.len();
        if exp_args != got_args {
            return Err((
                Error::RuntimeError(RuntimeError::ArityMismatch {
                    name: self.name().to_string(),
                    exp_args,
                    got_args,
                }),
                span.clone(),
            ));
        }
        self.call_unchecked(interpreter, args, span)
    }
}

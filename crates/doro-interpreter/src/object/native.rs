use crate::io::Io;
use crate::object::{Callable, Object};
use crate::Interpreter;

use doro_common::error::{Error, Result, RuntimeError};
use doro_common::types::Span;
use gc::{Finalize, Trace};

use std::fmt::{self, Display, Formatter};

/// Built-in functions bound in every global scope.
#[derive(Clone, Debug, Eq, Finalize, Trace, PartialEq)]
pub enum Native {
    /// `input(prompt)`: asks the host for a line of text.
    Input,
}

impl Native {
    pub const ALL: &'static [Native] = &[Native::Input];
}

impl Callable for Native {
    fn arity(&self) -> usize {
        match self {
            Native::Input => 1,
        }
    }

    fn name(&self) -> &str {
        match self {
            Native::Input => "input",
        }
    }

    fn call_unchecked<I: Io>(
        &self,
        interpreter: &mut Interpreter<I>,
        args: Vec<Object>,
        span: &Span,
    ) -> Result<Object> {
        match self {
            Native::Input => {
                let prompt = args.first().map(Object::to_string).unwrap_or_default();
                let response = interpreter.io().input(&prompt).map_err(|e| {
                    (
                        Error::RuntimeError(RuntimeError::ReadError { reason: e.to_string() }),
                        span.clone(),
                    )
                })?;
                Ok(Object::String(response))
            }
        }
    }
}

impl Display for Native {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "<native {}>", self.name())
    }
}

impl From<Native> for Object {
    fn from(native: Native) -> Self {
        Object::Native(native)
    }
}

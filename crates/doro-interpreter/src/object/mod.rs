mod callable;
mod function;
mod native;

use std::fmt::{self, Display, Formatter};

pub use callable::Callable;
use doro_common::error::{Error, Result, RuntimeError};
use doro_common::types::Span;
pub use function::Function;
use gc::{Finalize, Trace};
pub use native::Native;

use crate::io::Io;
use crate::Interpreter;

#[derive(Clone, Debug, Finalize, Trace)]
pub enum Object {
    Bool(bool),
    Function(Function),
    Native(Native),
    Nil,
    Number(f64),
    String(String),
}

impl Object {
    /// Truthiness: `false` and nil are falsy, everything else is truthy.
    pub fn bool(&self) -> bool {
        !matches!(self, Object::Nil | Object::Bool(false))
    }

    pub fn type_(&self) -> String {
        match self {
            Object::Bool(_) => "bool".to_string(),
            Object::Function(_) | Object::Native(_) => "function".to_string(),
            Object::Nil => "nil".to_string(),
            Object::Number(_) => "number".to_string(),
            Object::String(_) => "string".to_string(),
        }
    }

    pub fn call<I: Io>(
        &self,
        interpreter: &mut Interpreter<I>,
        args: Vec<Object>,
        span: &Span,
    ) -> Result<Object> {
        match &self {
            Object::Function(function) => function.call(interpreter, args, span),
            Object::Native(native) => native.call(interpreter, args, span),
            object => Err((
                Error::RuntimeError(RuntimeError::NotCallable { type_: object.type_() }),
                span.clone(),
            )),
        }
    }
}

impl Display for Object {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Object::Bool(bool) => write!(f, "{}", bool),
            Object::Function(function) => write!(f, "{}", function),
            Object::Native(native) => write!(f, "{}", native),
            Object::Nil => write!(f, "nil"),
            // Whole numbers print without a trailing ".0", and zero never
            // carries a sign.
            Object::Number(number) if *number == 0.0 => write!(f, "0"),
            Object::Number(number) => write!(f, "{}", number),
            Object::String(string) => write!(f, "{}", string),
        }
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Object::Bool(b1), Object::Bool(b2)) => b1 == b2,
            (Object::Function(f1), Object::Function(f2)) => f1 == f2,
            (Object::Native(n1), Object::Native(n2)) => n1 == n2,
            (Object::Nil, Object::Nil) => true,
            (Object::Number(n1), Object::Number(n2)) => n1 == n2,
            (Object::String(s1), Object::String(s2)) => s1 == s2,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn render_numbers() {
        assert_eq!(Object::Number(18.0).to_string(), "18");
        assert_eq!(Object::Number(-2.5).to_string(), "-2.5");
        assert_eq!(Object::Number(0.1 + 0.2).to_string(), "0.30000000000000004");
        assert_eq!(Object::Number(-0.0).to_string(), "0");
        assert_eq!(Object::Number(0.0 * -1.0).to_string(), "0");
    }

    #[test]
    fn truthiness() {
        assert!(Object::Number(0.0).bool());
        assert!(Object::String(String::new()).bool());
        assert!(!Object::Bool(false).bool());
        assert!(!Object::Nil.bool());
    }

    #[test]
    fn equality_across_types_is_false() {
        assert_ne!(Object::Number(1.0), Object::String("1".to_string()));
        assert_ne!(Object::Bool(false), Object::Nil);
        assert_eq!(Object::Nil, Object::Nil);
    }
}

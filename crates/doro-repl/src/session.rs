use anyhow::{Context, Result};
use doro_common::error::report_err;
use doro_interpreter::object::Object;
use doro_interpreter::{Interpreter, Io};
use termcolor::WriteColor;

/// Session commands that are not part of the language.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Meta {
    /// Lists the global bindings.
    Vars,
    /// Forgets every binding.
    Clear,
    Exit,
    /// Prints a syntax summary.
    Help,
}

const HELP: &[&str] = &[
    "statements:",
    "  kas name = value          declare a variable",
    "  name = value              assign to an existing variable",
    "  say value                 print a value",
    "  if (cond) { } else { }    branch; `else if` chains",
    "  while (cond) { }          loop while cond is truthy",
    "  for (i = 1 to 10 step 2) { }",
    "  fun name(a, b) { return a + b }",
    "operators:",
    "  + - * / %  == != < > <= >=  and or not  -x +x  (expr)",
    "builtins:",
    "  input(prompt)             read a line of text",
    "commands: vars, clear, help, exit",
];

impl Meta {
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim() {
            "vars" => Some(Meta::Vars),
            "clear" => Some(Meta::Clear),
            "exit" | "quit" => Some(Meta::Exit),
            "help" => Some(Meta::Help),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Outcome {
    Continue,
    Exit,
}

/// An interactive session. Globals persist from one submission to the next.
pub struct Session<I> {
    interpreter: Interpreter<I>,
}

impl<I: Io> Session<I> {
    pub fn new(io: I) -> Self {
        Self { interpreter: Interpreter::new(io) }
    }

    /// Runs one submission, reporting language errors to `stderr`.
    pub fn eval(&mut self, line: &str, stderr: &mut dyn WriteColor) -> Result<Outcome> {
        match Meta::parse(line) {
            Some(Meta::Vars) => {
                for (name, value) in self.interpreter.globals().bindings() {
                    if matches!(value, Object::Native(_)) {
                        continue;
                    }
                    let text = match value {
                        Object::String(ref string) => format!("{name} = {string:?}"),
                        value => format!("{name} = {value}"),
                    };
                    self.interpreter.io().output(&text).context("could not list variables")?;
                }
            }
            Some(Meta::Clear) => self.interpreter.reset(),
            Some(Meta::Exit) => return Ok(Outcome::Exit),
            Some(Meta::Help) => {
                for line in HELP {
                    self.interpreter.io().output(line).context("could not print help")?;
                }
            }
            None => {
                let result =
                    doro_syntax::parse(line).and_then(|program| self.interpreter.run(&program));
                if let Err(e) = result {
                    report_err(stderr, "<stdin>", line, &e).context("could not report error")?;
                }
            }
        }
        Ok(Outcome::Continue)
    }

    pub fn into_io(self) -> I {
        self.interpreter.into_io()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use termcolor::NoColor;

    use std::io;

    #[derive(Default)]
    struct Recorder(Vec<String>);

    impl Io for Recorder {
        fn output(&mut self, text: &str) -> io::Result<()> {
            self.0.push(text.to_string());
            Ok(())
        }

        fn input(&mut self, _: &str) -> io::Result<String> {
            Err(io::ErrorKind::UnexpectedEof.into())
        }
    }

    #[test]
    fn parse_meta() {
        assert_eq!(Meta::parse(" vars "), Some(Meta::Vars));
        assert_eq!(Meta::parse("clear"), Some(Meta::Clear));
        assert_eq!(Meta::parse("quit"), Some(Meta::Exit));
        assert_eq!(Meta::parse("help"), Some(Meta::Help));
        assert_eq!(Meta::parse("say vars"), None);
    }

    #[test]
    fn globals_persist_until_cleared() {
        let mut session = Session::new(Recorder::default());
        let mut stderr = NoColor::new(Vec::new());

        for line in ["kas name = \"doro\"", "kas n = 2", "n = n + 1", "vars", "clear", "vars"] {
            assert_eq!(session.eval(line, &mut stderr).unwrap(), Outcome::Continue);
        }
        assert_eq!(session.eval("say n", &mut stderr).unwrap(), Outcome::Continue);
        assert_eq!(session.eval("exit", &mut stderr).unwrap(), Outcome::Exit);

        let stderr = String::from_utf8(stderr.into_inner()).unwrap();
        assert!(stderr.contains("undefined variable \"n\""), "{stderr}");
        assert_eq!(session.into_io().0, ["n = 3", "name = \"doro\""]);
    }

    #[test]
    fn help_lists_the_syntax() {
        let mut session = Session::new(Recorder::default());
        let mut stderr = NoColor::new(Vec::new());
        assert_eq!(session.eval("help", &mut stderr).unwrap(), Outcome::Continue);

        let output = session.into_io().0;
        assert_eq!(output.len(), HELP.len());
        assert!(output.iter().any(|line| line.contains("kas name = value")));
        assert!(output.iter().any(|line| line.contains("input(prompt)")));
        assert!(stderr.into_inner().is_empty());
    }

    #[test]
    fn errors_do_not_end_the_session() {
        let mut session = Session::new(Recorder::default());
        let mut stderr = NoColor::new(Vec::new());

        session.eval("say 1 +", &mut stderr).unwrap();
        session.eval("say 1 / 0", &mut stderr).unwrap();
        session.eval("say \"still here\"", &mut stderr).unwrap();

        let stderr = String::from_utf8(stderr.into_inner()).unwrap();
        assert!(stderr.contains("expected expression, found end of input"), "{stderr}");
        assert!(stderr.contains("division by zero"), "{stderr}");
        assert_eq!(session.into_io().0, ["still here"]);
    }
}

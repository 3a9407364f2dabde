use crate::types::Span;

use codespan_reporting::diagnostic::{Diagnostic, Label};
use codespan_reporting::files::{self, Files, SimpleFile};
use codespan_reporting::term;
use termcolor::WriteColor;
use thiserror::Error;

use std::fmt::{self, Display, Formatter};

pub type Result<T, E = ErrorS> = std::result::Result<T, E>;
pub type ErrorS = (Error, Span);

#[remain::sorted]
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum Error {
    #[error("LexError: {0}")]
    LexError(LexError),
    #[error("ParseError: {0}")]
    ParseError(ParseError),
    #[error("RuntimeError: {0}")]
    RuntimeError(RuntimeError),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::LexError(_) => ErrorKind::LexError,
            Error::ParseError(_) => ErrorKind::ParseError,
            Error::RuntimeError(_) => ErrorKind::RuntimeError,
        }
    }

    /// The error message without its kind prefix.
    pub fn message(&self) -> String {
        match self {
            Error::LexError(e) => e.to_string(),
            Error::ParseError(e) => e.to_string(),
            Error::RuntimeError(e) => e.to_string(),
        }
    }
}

impl AsDiagnostic for Error {
    fn as_diagnostic(&self, span: &Span) -> Diagnostic<()> {
        let diagnostic = Diagnostic::error()
            .with_code(self.kind().to_string())
            .with_message(self.message())
            .with_labels(vec![Label::primary((), span.clone())]);
        match self {
            Error::ParseError(
                ParseError::UnrecognizedEof { expected } | ParseError::UnrecognizedToken { expected, .. },
            ) => diagnostic.with_notes(vec![format!("expected: {}", one_of(expected))]),
            _ => diagnostic,
        }
    }
}

#[remain::sorted]
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum LexError {
    #[error("malformed number {lexeme:?}")]
    MalformedNumber { lexeme: String },
    #[error("unexpected character {character:?}")]
    UnexpectedCharacter { character: char },
    #[error("unterminated string")]
    UnterminatedString,
}

#[remain::sorted]
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ParseError {
    #[error("nesting exceeds the limit of {limit} levels")]
    NestingLimit { limit: usize },
    #[error("expected {}, found end of input", one_of(.expected))]
    UnrecognizedEof { expected: Vec<String> },
    #[error("expected {}, found {token:?}", one_of(.expected))]
    UnrecognizedToken { token: String, expected: Vec<String> },
}

#[remain::sorted]
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum RuntimeError {
    #[error("{name}() takes {exp_args} arguments but {got_args} were given")]
    ArityMismatch { name: String, exp_args: usize, got_args: usize },
    #[error("division by zero")]
    DivisionByZero,
    #[error("for-loop {bound} must be a number, not {type_:?}")]
    InvalidLoopBound { bound: String, type_: String },
    #[error("modulo by zero")]
    ModuloByZero,
    #[error("{type_:?} object is not callable")]
    NotCallable { type_: String },
    #[error("unable to read input: {reason}")]
    ReadError { reason: String },
    #[error("maximum recursion depth of {limit} exceeded")]
    RecursionLimit { limit: usize },
    #[error(r#""return" outside function"#)]
    ReturnOutsideFunction,
    #[error("undefined variable {name:?}")]
    UndefinedVariable { name: String },
    #[error("unsupported operand type(s) for {op}: {lt_type:?} and {rt_type:?}")]
    UnsupportedOperandInfix { op: String, lt_type: String, rt_type: String },
    #[error("unsupported operand type for {op}: {rt_type:?}")]
    UnsupportedOperandPrefix { op: String, rt_type: String },
    #[error("unable to write output: {reason}")]
    WriteError { reason: String },
    #[error("for-loop step cannot be zero")]
    ZeroStep,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    LexError,
    ParseError,
    RuntimeError,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::LexError => "LexError",
            ErrorKind::ParseError => "ParseError",
            ErrorKind::RuntimeError => "RuntimeError",
        };
        f.write_str(name)
    }
}

/// A positioned error, as handed to callers outside the core.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Report {
    pub kind: ErrorKind,
    /// 1-based.
    pub line: usize,
    /// 1-based, counted in characters.
    pub column: usize,
    pub message: String,
}

impl Report {
    pub fn new(source: &str, (error, span): &ErrorS) -> Self {
        let (line, column) = position(source, span.start);
        Self { kind: error.kind(), line, column, message: error.message() }
    }
}

impl Display for Report {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}:{}: {}", self.kind, self.line, self.column, self.message)
    }
}

impl std::error::Error for Report {}

/// Converts a byte offset into a 1-based `(line, column)` pair.
pub fn position(source: &str, offset: usize) -> (usize, usize) {
    let file = SimpleFile::new("", source);
    let offset = offset.min(source.len());
    let line_index = file.line_index((), offset).unwrap_or_default();
    let line = file.line_number((), line_index).unwrap_or(1);
    let column = file.column_number((), line_index, offset).unwrap_or(1);
    (line, column)
}

trait AsDiagnostic {
    fn as_diagnostic(&self, span: &Span) -> Diagnostic<()>;
}

fn one_of(tokens: &[String]) -> String {
    let (token_last, tokens) = match tokens.split_last() {
        Some((token_last, &[])) => return token_last.to_string(),
        Some((token_last, tokens)) => (token_last, tokens),
        None => return "nothing".to_string(),
    };

    let mut output = String::new();
    for token in tokens {
        output.push_str(token);
        output.push_str(", ");
    }
    output.push_str("or ");
    output.push_str(token_last);
    output
}

pub fn report_err(
    writer: &mut dyn WriteColor,
    name: &str,
    source: &str,
    (e, span): &ErrorS,
) -> Result<(), files::Error> {
    let file = SimpleFile::new(name, source);
    let config = term::Config::default();
    let diagnostic = e.as_diagnostic(span);
    term::emit(writer, &config, &file, &diagnostic)
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn position_counts_lines_and_chars() {
        let source = "kas x = 1\nsay ä + y";
        assert_eq!(position(source, 0), (1, 1));
        assert_eq!(position(source, 10), (2, 1));
        // "ä" is two bytes wide but a single column.
        assert_eq!(position(source, 17), (2, 7));
        assert_eq!(position(source, source.len()), (2, 10));
    }

    #[test]
    fn report_strips_kind_prefix() {
        let error = (Error::RuntimeError(RuntimeError::DivisionByZero), 4..9);
        let report = Report::new("say 1 / 0", &error);
        assert_eq!(
            report,
            Report {
                kind: ErrorKind::RuntimeError,
                line: 1,
                column: 5,
                message: "division by zero".to_string(),
            }
        );
        assert_eq!(report.to_string(), "RuntimeError at 1:5: division by zero");
    }

    #[test]
    fn expected_tokens_are_joined() {
        let e = ParseError::UnrecognizedToken {
            token: "}".to_string(),
            expected: vec!["identifier".to_string(), "number".to_string(), "\"(\"".to_string()],
        };
        assert_eq!(e.to_string(), r#"expected identifier, number, or "(", found "}""#);
    }

    #[test]
    fn diagnostic_is_rendered() {
        let source = "say 1 +";
        let error = (
            Error::ParseError(ParseError::UnrecognizedEof { expected: vec!["expression".to_string()] }),
            7..7,
        );
        let mut writer = termcolor::NoColor::new(Vec::new());
        report_err(&mut writer, "main.doro", source, &error).unwrap();
        let output = String::from_utf8(writer.into_inner()).unwrap();
        assert!(output.contains("error[ParseError]: expected expression, found end of input"));
        assert!(output.contains("main.doro:1:8"));
    }
}

pub mod ast;
pub mod lexer;
pub mod parser;

use crate::ast::Program;
use crate::lexer::tokenize;
use crate::parser::Parser;

use doro_common::error::{Error, ErrorS, LexError, ParseError};

/// Lexes and parses `source`, stopping at the first error.
pub fn parse(source: &str) -> Result<Program, ErrorS> {
    let tokens = tokenize(source)?;
    Parser::new(tokens).parse()
}

/// Returns `false` if `source` only fails to parse because it ends too early.
pub fn is_complete(source: &str) -> bool {
    !matches!(
        parse(source),
        Err((
            Error::ParseError(ParseError::UnrecognizedEof { .. })
                | Error::LexError(LexError::UnterminatedString),
            _
        ))
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incomplete_input() {
        assert!(!is_complete("fun f() {"));
        assert!(!is_complete("say \"multi"));
        assert!(!is_complete("kas x = (1 +"));
    }

    #[test]
    fn complete_input() {
        assert!(is_complete("say 1"));
        assert!(is_complete(""));
        // Errors that more input cannot fix are reported right away.
        assert!(is_complete("say )"));
        assert!(is_complete("say @"));
    }
}

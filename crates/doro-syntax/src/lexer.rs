use doro_common::error::{Error, ErrorS, LexError};
use doro_common::types::Span;
use logos::Logos;

use std::fmt::{self, Display, Formatter};
use std::num::ParseFloatError;

/// A token together with the text it was read from and its position.
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub span: Span,
    /// 1-based.
    pub line: usize,
    /// 1-based, counted in characters.
    pub column: usize,
}

pub struct Lexer<'a> {
    inner: logos::Lexer<'a, TokenKind>,
    source: &'a str,
    cursor: usize,
    line: usize,
    line_start: usize,
    done: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            inner: TokenKind::lexer(source),
            source,
            cursor: 0,
            line: 1,
            line_start: 0,
            done: false,
        }
    }

    /// Moves the line tracking forward to `offset` and returns its position.
    fn locate(&mut self, offset: usize) -> (usize, usize) {
        for (idx, c) in self.source[self.cursor..offset].char_indices() {
            if c == '\n' {
                self.line += 1;
                self.line_start = self.cursor + idx + 1;
            }
        }
        self.cursor = offset;
        let column = self.source[self.line_start..offset].chars().count() + 1;
        (self.line, column)
    }

    fn error(&self, span: Span) -> ErrorS {
        let slice = &self.source[span.start..];
        let e = match slice.chars().next() {
            Some('"' | '\'') => LexError::UnterminatedString,
            Some(c) if c.is_ascii_digit() => {
                LexError::MalformedNumber { lexeme: self.inner.slice().to_string() }
            }
            Some(character) => LexError::UnexpectedCharacter { character },
            None => unreachable!("lexer reported an error past the end of input"),
        };
        (Error::LexError(e), span)
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<Token, ErrorS>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let kind = match self.inner.next() {
            Some(TokenKind::Error) => {
                // Lexing does not recover: the first error ends the stream.
                self.done = true;
                return Some(Err(self.error(self.inner.span())));
            }
            Some(kind) => kind,
            None => {
                self.done = true;
                let end = self.source.len();
                let (line, column) = self.locate(end);
                return Some(Ok(Token {
                    kind: TokenKind::Eof,
                    lexeme: String::new(),
                    span: end..end,
                    line,
                    column,
                }));
            }
        };

        let span = self.inner.span();
        let (line, column) = self.locate(span.start);
        Some(Ok(Token { kind, lexeme: self.inner.slice().to_string(), span, line, column }))
    }
}

/// Lexes the whole source, failing on the first invalid input.
///
/// On success the last token is always [`TokenKind::Eof`].
pub fn tokenize(source: &str) -> Result<Vec<Token>, ErrorS> {
    Lexer::new(source).collect()
}

#[derive(Clone, Debug, Logos, PartialEq)]
pub enum TokenKind {
    // Punctuation.
    #[token("(")]
    LtParen,
    #[token(")")]
    RtParen,
    #[token("{")]
    LtBrace,
    #[token("}")]
    RtBrace,
    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,

    // Single-character operators.
    #[token("-")]
    Minus,
    #[token("+")]
    Plus,
    #[token("*")]
    Asterisk,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,

    // One or two character operators.
    #[token("!=")]
    BangEqual,
    #[token("=")]
    Equal,
    #[token("==")]
    EqualEqual,
    #[token(">")]
    Greater,
    #[token(">=")]
    GreaterEqual,
    #[token("<")]
    Less,
    #[token("<=")]
    LessEqual,

    // Literals.
    #[regex("[a-zA-Z_][a-zA-Z0-9_]*", lex_identifier)]
    Identifier(String),
    #[regex(r#""([^"\\]|\\.)*""#, lex_string)]
    #[regex(r#"'([^'\\]|\\.)*'"#, lex_string)]
    String(String),
    #[regex(r"[0-9]+(\.[0-9]*)*", lex_number)]
    Number(f64),

    // Keywords.
    #[token("and")]
    And,
    #[token("else")]
    Else,
    #[token("false")]
    False,
    #[token("for")]
    For,
    #[token("fun")]
    Fun,
    #[token("if")]
    If,
    #[token("kas")]
    Kas,
    #[token("nil")]
    Nil,
    #[token("not")]
    Not,
    #[token("or")]
    Or,
    #[token("return")]
    Return,
    #[token("say")]
    Say,
    #[token("step")]
    Step,
    #[token("to")]
    To,
    #[token("true")]
    True,
    #[token("while")]
    While,

    /// Terminal token, produced once after the last real token.
    Eof,

    #[regex(r"#[^\n]*", logos::skip)]
    #[regex(r"[ \r\n\t\f]+", logos::skip)]
    #[error]
    Error,
}

impl TokenKind {
    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            TokenKind::And
                | TokenKind::Else
                | TokenKind::For
                | TokenKind::Fun
                | TokenKind::If
                | TokenKind::Kas
                | TokenKind::Not
                | TokenKind::Or
                | TokenKind::Return
                | TokenKind::Say
                | TokenKind::Step
                | TokenKind::To
                | TokenKind::While
        )
    }

    /// Literal constants: booleans and nil.
    pub fn is_constant(&self) -> bool {
        matches!(self, TokenKind::False | TokenKind::Nil | TokenKind::True)
    }

    pub fn is_operator(&self) -> bool {
        matches!(
            self,
            TokenKind::Minus
                | TokenKind::Plus
                | TokenKind::Asterisk
                | TokenKind::Slash
                | TokenKind::Percent
                | TokenKind::BangEqual
                | TokenKind::Equal
                | TokenKind::EqualEqual
                | TokenKind::Greater
                | TokenKind::GreaterEqual
                | TokenKind::Less
                | TokenKind::LessEqual
        )
    }
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::LtParen => r#""(""#,
            TokenKind::RtParen => r#"")""#,
            TokenKind::LtBrace => r#""{""#,
            TokenKind::RtBrace => r#""}""#,
            TokenKind::Comma => r#"",""#,
            TokenKind::Semicolon => r#"";""#,
            TokenKind::Minus => r#""-""#,
            TokenKind::Plus => r#""+""#,
            TokenKind::Asterisk => r#""*""#,
            TokenKind::Slash => r#""/""#,
            TokenKind::Percent => r#""%""#,
            TokenKind::BangEqual => r#""!=""#,
            TokenKind::Equal => r#""=""#,
            TokenKind::EqualEqual => r#""==""#,
            TokenKind::Greater => r#"">""#,
            TokenKind::GreaterEqual => r#"">=""#,
            TokenKind::Less => r#""<""#,
            TokenKind::LessEqual => r#""<=""#,
            TokenKind::Identifier(_) => "identifier",
            TokenKind::String(_) => "string",
            TokenKind::Number(_) => "number",
            TokenKind::And => r#""and""#,
            TokenKind::Else => r#""else""#,
            TokenKind::False => r#""false""#,
            TokenKind::For => r#""for""#,
            TokenKind::Fun => r#""fun""#,
            TokenKind::If => r#""if""#,
            TokenKind::Kas => r#""kas""#,
            TokenKind::Nil => r#""nil""#,
            TokenKind::Not => r#""not""#,
            TokenKind::Or => r#""or""#,
            TokenKind::Return => r#""return""#,
            TokenKind::Say => r#""say""#,
            TokenKind::Step => r#""step""#,
            TokenKind::To => r#""to""#,
            TokenKind::True => r#""true""#,
            TokenKind::While => r#""while""#,
            TokenKind::Eof => "end of input",
            TokenKind::Error => "invalid input",
        };
        f.write_str(name)
    }
}

fn lex_number(lexer: &mut logos::Lexer<TokenKind>) -> Result<f64, ParseFloatError> {
    let slice = lexer.slice();
    slice.parse::<f64>()
}

fn lex_string(lexer: &mut logos::Lexer<TokenKind>) -> String {
    let slice = lexer.slice();
    unescape(&slice[1..slice.len() - 1])
}

fn lex_identifier(lexer: &mut logos::Lexer<TokenKind>) -> String {
    let slice = lexer.slice();
    slice.to_string()
}

fn unescape(raw: &str) -> String {
    let mut output = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            output.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => output.push('\n'),
            Some('t') => output.push('\t'),
            Some('r') => output.push('\r'),
            Some(c @ ('\\' | '"' | '\'')) => output.push(c),
            Some(c) => {
                output.push('\\');
                output.push(c);
            }
            None => output.push('\\'),
        }
    }
    output
}

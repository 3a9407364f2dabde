mod session;

pub use crate::session::{Meta, Outcome, Session};

use anyhow::{Context, Result};
use doro_interpreter::Console;
use doro_syntax::lexer::{Lexer, Token, TokenKind};
use nu_ansi_term::{Color, Style};
use reedline::{
    EditCommand, Emacs, FileBackedHistory, KeyCode, KeyModifiers, PromptEditMode,
    PromptHistorySearch, Reedline, ReedlineEvent, Signal, StyledText, ValidationResult,
};
use termcolor::{ColorChoice, StandardStream};

use std::borrow::Cow;
use std::fs;
use std::iter::Peekable;

/// Reads, runs and reports submissions until the user leaves.
pub fn run() -> Result<()> {
    let mut editor = editor()?;
    let mut session = Session::new(Console::stdio());
    let stderr = StandardStream::stderr(ColorChoice::Auto);
    let mut stderr = stderr.lock();

    loop {
        match editor.read_line(&Prompt).context("could not read line")? {
            Signal::Success(line) => {
                if session.eval(&line, &mut stderr)? == Outcome::Exit {
                    break;
                }
            }
            Signal::CtrlD => break,
            // Ctrl-C only discards the current line.
            _ => {}
        }
    }
    Ok(())
}

pub fn editor() -> Result<Reedline> {
    let mut keybindings = reedline::default_emacs_keybindings();
    keybindings.add_binding(
        KeyModifiers::ALT,
        KeyCode::Enter,
        ReedlineEvent::Edit(vec![EditCommand::InsertNewline]),
    );

    let data_dir = dirs::data_dir().context("could not find data directory")?.join("doro");
    fs::create_dir_all(&data_dir)
        .with_context(|| format!("could not create data directory: {}", data_dir.display()))?;
    let history_path = data_dir.join("history.txt");
    let history = Box::new(
        FileBackedHistory::with_file(10000, history_path.clone())
            .with_context(|| format!("could not open history file: {}", history_path.display()))?,
    );

    let editor = Reedline::create()
        .with_edit_mode(Box::new(Emacs::new(keybindings)))
        .with_highlighter(Box::new(Highlighter))
        .with_history(history)
        .with_validator(Box::new(Validator));
    Ok(editor)
}

/// What a piece of source text is drawn as.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Class {
    Comment,
    Constant,
    Function,
    Keyword,
    Operator,
    Punctuation,
    String,
    Text,
    Variable,
}

impl Class {
    // Color scheme inspired by base16-google-dark, with each color replaced
    // by its high-intensity variant, since the standard colors can be harder
    // to read on some terminals.
    fn fg(self) -> Color {
        match self {
            Class::Comment => Color::DarkGray,
            Class::Constant => Color::LightCyan,
            Class::Function => Color::LightBlue,
            Class::Keyword => Color::LightPurple,
            Class::Operator | Class::Punctuation | Class::Text => Color::LightGray,
            Class::String => Color::LightGreen,
            Class::Variable => Color::LightRed,
        }
    }
}

/// Colors input by token class, using the same lexer as the interpreter.
pub struct Highlighter;

impl Highlighter {
    /// Splits `line` into classified pieces that together cover all of it.
    pub fn classify(line: &str) -> Vec<(Class, &str)> {
        let mut pieces = Vec::new();
        let mut tokens = Lexer::new(line).peekable();
        let mut prev = TokenKind::Eof;
        let mut prev_end = 0;

        while let Some(Ok(token)) = tokens.next() {
            if token.kind == TokenKind::Eof {
                break;
            }
            push_gap(&mut pieces, &line[prev_end..token.span.start]);
            let class = token_class(&token.kind, &prev, &mut tokens);
            pieces.push((class, &line[token.span.clone()]));
            prev_end = token.span.end;
            prev = token.kind;
        }

        // Whatever the lexer could not handle, such as a string still being typed.
        let rest = &line[prev_end..];
        match rest.trim_start().chars().next() {
            Some('"' | '\'') => {
                let start = rest.len() - rest.trim_start().len();
                push_gap(&mut pieces, &rest[..start]);
                pieces.push((Class::String, &rest[start..]));
            }
            _ => push_gap(&mut pieces, rest),
        }
        pieces
    }
}

impl reedline::Highlighter for Highlighter {
    fn highlight(&self, line: &str, _: usize) -> StyledText {
        let mut output = StyledText::new();
        for (class, text) in Self::classify(line) {
            output.push((Style::new().fg(class.fg()), text.to_string()));
        }
        output
    }
}

fn token_class<I>(kind: &TokenKind, prev: &TokenKind, tokens: &mut Peekable<I>) -> Class
where
    I: Iterator<Item = doro_common::error::Result<Token>>,
{
    match kind {
        TokenKind::Identifier(_) => {
            let called = matches!(tokens.peek(), Some(Ok(Token { kind: TokenKind::LtParen, .. })));
            if called || *prev == TokenKind::Fun {
                Class::Function
            } else {
                Class::Variable
            }
        }
        TokenKind::Number(_) => Class::Constant,
        TokenKind::String(_) => Class::String,
        kind if kind.is_constant() => Class::Constant,
        kind if kind.is_keyword() => Class::Keyword,
        kind if kind.is_operator() => Class::Operator,
        _ => Class::Punctuation,
    }
}

/// Text between tokens: whitespace, possibly followed by a comment.
fn push_gap<'a>(pieces: &mut Vec<(Class, &'a str)>, gap: &'a str) {
    let (text, comment) = gap.split_at(gap.find('#').unwrap_or(gap.len()));
    if !text.is_empty() {
        pieces.push((Class::Text, text));
    }
    if !comment.is_empty() {
        pieces.push((Class::Comment, comment));
    }
}

struct Validator;

impl reedline::Validator for Validator {
    fn validate(&self, line: &str) -> ValidationResult {
        if doro_syntax::is_complete(line) {
            ValidationResult::Complete
        } else {
            ValidationResult::Incomplete
        }
    }
}

pub struct Prompt;

impl reedline::Prompt for Prompt {
    fn render_prompt_left(&self) -> Cow<str> {
        Cow::Borrowed(">>> ")
    }

    fn render_prompt_right(&self) -> Cow<str> {
        Cow::Borrowed("")
    }

    fn render_prompt_indicator(&self, _: PromptEditMode) -> Cow<str> {
        Cow::Borrowed("")
    }

    fn render_prompt_multiline_indicator(&self) -> Cow<str> {
        Cow::Borrowed("... ")
    }

    fn render_prompt_history_search_indicator(&self, _: PromptHistorySearch) -> Cow<str> {
        Cow::Borrowed("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn classify_statement() {
        let exp = vec![
            (Class::Keyword, "kas"),
            (Class::Text, " "),
            (Class::Variable, "total"),
            (Class::Text, " "),
            (Class::Operator, "="),
            (Class::Text, " "),
            (Class::Function, "sum"),
            (Class::Punctuation, "("),
            (Class::Constant, "1"),
            (Class::Punctuation, ","),
            (Class::Text, " "),
            (Class::Constant, "true"),
            (Class::Punctuation, ")"),
            (Class::Text, " "),
            (Class::Comment, "# note"),
        ];
        assert_eq!(exp, Highlighter::classify("kas total = sum(1, true) # note"));
    }

    #[test]
    fn classify_declaration_and_strings() {
        let exp = vec![
            (Class::Keyword, "fun"),
            (Class::Text, " "),
            (Class::Function, "greet"),
            (Class::Text, " "),
            (Class::Punctuation, "{"),
            (Class::Text, " "),
            (Class::Keyword, "say"),
            (Class::Text, " "),
            (Class::String, "'hi'"),
        ];
        assert_eq!(exp, Highlighter::classify("fun greet { say 'hi'"));
    }

    #[test]
    fn classify_unfinished_string() {
        let exp = vec![
            (Class::Keyword, "say"),
            (Class::Text, " "),
            (Class::String, "\"still typing"),
        ];
        assert_eq!(exp, Highlighter::classify("say \"still typing"));
    }

    #[test]
    fn classify_covers_input() {
        for line in ["", "say 1 +", "x = @ 2", "# only a comment", "for (i = 1 to 3 step 2) {}"] {
            let text = Highlighter::classify(line).into_iter().map(|(_, text)| text).collect::<String>();
            assert_eq!(line, text);
        }
    }
}

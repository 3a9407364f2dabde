use crate::logger;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use doro_common::error::{report_err, ErrorS};
use doro_interpreter::object::Object;
use doro_interpreter::{Console, Interpreter};
use log::LevelFilter;
use termcolor::{ColorChoice, StandardStream};

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[clap(about, author, disable_help_subcommand = true, propagate_version = true, version)]
pub struct Cmd {
    /// Log evaluator activity to stderr
    #[clap(long, global = true)]
    trace: bool,
    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Check a file for syntax errors without running it
    Check { path: PathBuf },
    /// Start an interactive session (the default)
    #[cfg(feature = "repl")]
    Repl,
    /// Run a file
    Run {
        path: PathBuf,
        /// Print token and statement counts before running, and the final
        /// global variables after
        #[clap(long)]
        details: bool,
    },
}

impl Cmd {
    pub fn run(&self) -> Result<ExitCode> {
        if self.trace {
            logger::init(LevelFilter::Trace)?;
        }
        match &self.command {
            Some(Command::Check { path }) => check(path),
            Some(Command::Run { path, details }) => run(path, *details),
            #[cfg(feature = "repl")]
            Some(Command::Repl) | None => {
                doro_repl::run()?;
                Ok(ExitCode::SUCCESS)
            }
            #[cfg(not(feature = "repl"))]
            None => anyhow::bail!("no command given, and this build has no REPL"),
        }
    }
}

fn check(path: &Path) -> Result<ExitCode> {
    let source = read(path)?;
    match doro_syntax::parse(&source) {
        Ok(_) => Ok(ExitCode::SUCCESS),
        Err(e) => report(path, &source, &e),
    }
}

fn run(path: &Path, details: bool) -> Result<ExitCode> {
    let source = read(path)?;
    let program = match doro_syntax::parse(&source) {
        Ok(program) => program,
        Err(e) => return report(path, &source, &e),
    };
    if details {
        // Parsing succeeded, so lexing cannot fail here.
        let tokens = doro_syntax::lexer::tokenize(&source).map_or(0, |tokens| tokens.len());
        eprintln!("tokens: {tokens}");
        eprintln!("statements: {}", program.stmts.len());
    }

    let mut interpreter = Interpreter::new(Console::stdio());
    let result = interpreter.run(&program);
    if details {
        eprintln!("variables:");
        for (name, value) in interpreter.globals().bindings() {
            if !matches!(value, Object::Native(_)) {
                eprintln!("  {name} = {value}");
            }
        }
    }
    match result {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(e) => report(path, &source, &e),
    }
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("could not read file: {}", path.display()))
}

fn report(path: &Path, source: &str, e: &ErrorS) -> Result<ExitCode> {
    let stderr = StandardStream::stderr(ColorChoice::Auto);
    let mut stderr = stderr.lock();
    report_err(&mut stderr, &path.display().to_string(), source, e)
        .context("could not report error")?;
    Ok(ExitCode::FAILURE)
}

#[cfg(test)]
mod tests {
    use super::*;

    use clap::CommandFactory;

    #[test]
    fn verify_cmd() {
        Cmd::command().debug_assert();
    }

    #[test]
    fn run_accepts_details() {
        let cmd = Cmd::try_parse_from(["doro", "run", "--details", "main.doro"]).unwrap();
        match cmd.command {
            Some(Command::Run { path, details }) => {
                assert_eq!(path, PathBuf::from("main.doro"));
                assert!(details);
            }
            command => panic!("unexpected command: {command:?}"),
        }

        let cmd = Cmd::try_parse_from(["doro", "run", "main.doro"]).unwrap();
        assert!(matches!(cmd.command, Some(Command::Run { details: false, .. })));
    }
}

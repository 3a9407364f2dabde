pub mod env;
pub mod interpreter;
pub mod io;
pub mod object;

pub use crate::interpreter::{Flow, Interpreter, MAX_CALL_DEPTH};
pub use crate::io::{Console, Io};
pub use doro_common::error::Report;

/// Lexes and parses `source` without running it.
pub fn check_syntax(source: &str) -> Result<(), Report> {
    doro_syntax::parse(source).map(drop).map_err(|e| Report::new(source, &e))
}

/// Parses `source` and runs it against a fresh global scope.
pub fn run<I: Io>(source: &str, io: I) -> Result<(), Report> {
    let program = doro_syntax::parse(source).map_err(|e| Report::new(source, &e))?;
    Interpreter::new(io).run(&program).map_err(|e| Report::new(source, &e))
}

#[cfg(test)]
mod tests {
    use super::*;

    use doro_common::error::ErrorKind;
    use pretty_assertions::assert_eq;

    use std::collections::VecDeque;

    #[derive(Debug, Default)]
    struct Recorder {
        inputs: VecDeque<String>,
        prompts: Vec<String>,
        output: Vec<String>,
    }

    impl Recorder {
        fn with_inputs(inputs: &[&str]) -> Self {
            Self { inputs: inputs.iter().map(|s| s.to_string()).collect(), ..Self::default() }
        }
    }

    impl Io for Recorder {
        fn output(&mut self, text: &str) -> std::io::Result<()> {
            self.output.push(text.to_string());
            Ok(())
        }

        fn input(&mut self, prompt: &str) -> std::io::Result<String> {
            self.prompts.push(prompt.to_string());
            self.inputs.pop_front().ok_or_else(|| std::io::ErrorKind::UnexpectedEof.into())
        }
    }

    fn output(source: &str) -> Vec<String> {
        let mut recorder = Recorder::default();
        if let Err(e) = run(source, &mut recorder) {
            panic!("{e}");
        }
        recorder.output
    }

    fn error(source: &str) -> Report {
        run(source, Recorder::default()).unwrap_err()
    }

    #[test]
    fn block_shadows_then_restores() {
        assert_eq!(output("kas x = 1; { kas x = 2; say x } say x"), ["2", "1"]);
    }

    #[test]
    fn branches_share_enclosing_scope() {
        assert_eq!(output("if (true) { kas y = 3 } say y"), ["3"]);
    }

    #[test]
    fn assignment_updates_nearest_binding() {
        let source = "
            kas count = 0
            fun bump() { count = count + 1 }
            bump()
            bump()
            say count
        ";
        assert_eq!(output(source), ["2"]);
    }

    #[test]
    fn closures_see_later_mutation() {
        let source = "
            kas greeting = \"hi\"
            fun greet() { return greeting }
            greeting = \"hello\"
            say greet()
        ";
        assert_eq!(output(source), ["hello"]);
    }

    #[test]
    fn closures_capture_their_scope() {
        let source = "
            fun counter() {
                kas n = 0
                fun next() {
                    n = n + 1
                    return n
                }
                return next
            }
            kas c = counter()
            c()
            say c()
        ";
        assert_eq!(output(source), ["2"]);
    }

    #[test]
    fn for_counts_down_with_negative_step() {
        assert_eq!(output("for (i = 5 to 1 step -1) { say i }"), ["5", "4", "3", "2", "1"]);
    }

    #[test]
    fn for_without_step_counts_up() {
        assert_eq!(output("for (i = 1 to 3) { say i }"), ["1", "2", "3"]);
        assert!(output("for (i = 3 to 1) { say i }").is_empty());
    }

    #[test]
    fn for_rejects_zero_step() {
        let report = error("for (i = 1 to 3 step 0) { say i }");
        assert_eq!(report.kind, ErrorKind::RuntimeError);
        assert_eq!(report.message, "for-loop step cannot be zero");
    }

    #[test]
    fn for_variable_is_scoped_to_the_loop() {
        let report = error("for (i = 1 to 2) { } say i");
        assert_eq!(report.message, "undefined variable \"i\"");
    }

    #[test]
    fn concatenation_coerces_either_side() {
        let source = "
            say \"Age: \" + 18
            say 18 + \"Age: \"
            say \"ok: \" + true + \" \" + nil
            say 1.5 + \"\"
        ";
        assert_eq!(output(source), ["Age: 18", "18Age: ", "ok: true nil", "1.5"]);
    }

    #[test]
    fn arithmetic() {
        let source = "
            say 1 + 2 * 3
            say (1 + 2) * 3
            say 7 / 2
            say 7 % 3
            say -7 % 3
            say -(2 - 5)
        ";
        assert_eq!(output(source), ["7", "9", "3.5", "1", "2", "3"]);
    }

    #[test]
    fn factorial() {
        let source = "
            fun fact(n) {
                if (n <= 1) { return 1 }
                return n * fact(n - 1)
            }
            for (i = 0 to 10) { say fact(i) }
        ";
        let expected =
            ["1", "1", "2", "6", "24", "120", "720", "5040", "40320", "362880", "3628800"];
        assert_eq!(output(source), expected);
    }

    #[test]
    fn return_unwinds_loops() {
        let source = "
            fun first_over(limit) {
                kas i = 0
                while (true) {
                    i = i + 1
                    if (i > limit) { return i }
                }
            }
            say first_over(4)
        ";
        assert_eq!(output(source), ["5"]);
    }

    #[test]
    fn bare_return_yields_nil() {
        assert_eq!(output("fun f() { return } say f()"), ["nil"]);
    }

    #[test]
    fn arity_mismatch() {
        let report = error("fun add(a, b) { return a + b }\nadd(1)");
        assert_eq!(report.kind, ErrorKind::RuntimeError);
        assert_eq!((report.line, report.column), (2, 1));
        assert_eq!(report.message, "add() takes 2 arguments but 1 were given");
    }

    #[test]
    fn input_prompts_once() {
        let mut recorder = Recorder::with_inputs(&["Ava"]);
        let source = "kas name = input(\"Enter name:\")\nsay \"Welcome, \" + name";
        run(source, &mut recorder).unwrap();
        assert_eq!(recorder.prompts, ["Enter name:"]);
        assert_eq!(recorder.output, ["Welcome, Ava"]);
    }

    #[test]
    fn input_on_closed_stream() {
        let report = error("say input(\"> \")");
        assert_eq!(report.kind, ErrorKind::RuntimeError);
        assert!(report.message.starts_with("unable to read input"), "{}", report.message);
    }

    #[test]
    fn return_outside_function() {
        let report = error("say 1\nreturn 2");
        assert_eq!(report.kind, ErrorKind::RuntimeError);
        assert_eq!((report.line, report.column), (2, 1));
    }

    #[test]
    fn division_by_zero_is_positioned() {
        let report = error("kas x = 1\nsay x / 0");
        assert_eq!(report.to_string(), "RuntimeError at 2:5: division by zero");
        assert_eq!(error("say 1 % 0").message, "modulo by zero");
    }

    #[test]
    fn assignment_to_undefined() {
        let report = error("y = 1");
        assert_eq!(report.to_string(), "RuntimeError at 1:1: undefined variable \"y\"");
    }

    #[test]
    fn logic_short_circuits() {
        let source = "
            say false and missing
            say true or missing
            say 1 and \"x\"
            say not nil
        ";
        assert_eq!(output(source), ["false", "true", "true", "true"]);
    }

    #[test]
    fn ordering_requires_numbers() {
        let report = error("say \"a\" < 1");
        assert_eq!(report.kind, ErrorKind::RuntimeError);
        assert_eq!(report.message, "unsupported operand type(s) for <: \"string\" and \"number\"");
    }

    #[test]
    fn equality_across_types() {
        assert_eq!(output("say 1 == \"1\"\nsay nil == nil\nsay 2 != 3"), ["false", "true", "true"]);
    }

    #[test]
    fn calling_a_number() {
        assert_eq!(error("kas x = 3\nx()").message, "\"number\" object is not callable");
    }

    #[test]
    fn output_stops_at_the_error() {
        let mut recorder = Recorder::default();
        let report = run("say 1\nsay missing\nsay 3", &mut recorder).unwrap_err();
        assert_eq!(report.line, 2);
        assert_eq!(recorder.output, ["1"]);
    }

    #[test]
    fn check_syntax_agrees_with_run() {
        for source in ["say 1 +", "kas = 2", "say \"open", "say 1.2.3", "say @", "if (x) {"] {
            let checked = check_syntax(source).unwrap_err();
            let ran = error(source);
            assert_eq!(checked, ran, "{source}");
        }
        assert_eq!(check_syntax("say missing"), Ok(()));
    }

    #[test]
    fn deep_nesting_is_reported() {
        let source = format!("say {}1{}", "(".repeat(10_000), ")".repeat(10_000));
        let report = check_syntax(&source).unwrap_err();
        assert_eq!(report.kind, ErrorKind::ParseError);
        assert_eq!((report.line, report.column), (1, 105));
        assert_eq!(report, error(&source));
    }

    #[test]
    fn nesting_below_limit_runs_on_a_small_stack() {
        let source = format!("say {}1", "-".repeat(90));
        let handle = std::thread::Builder::new()
            .stack_size(2 * 1024 * 1024)
            .spawn(move || output(&source))
            .unwrap();
        assert_eq!(handle.join().unwrap(), ["1"]);
    }

    #[test]
    fn recursion_limit() {
        // Deep recursion needs more stack than a test thread gets by default.
        let handle = std::thread::Builder::new()
            .stack_size(64 * 1024 * 1024)
            .spawn(|| error("fun f(n) { return f(n + 1) }\nf(0)"))
            .unwrap();
        let report = handle.join().unwrap();
        assert_eq!(report.kind, ErrorKind::RuntimeError);
        assert_eq!(report.message, format!("maximum recursion depth of {MAX_CALL_DEPTH} exceeded"));
    }

    #[test]
    fn interpreter_keeps_globals_between_runs() {
        let mut interpreter = Interpreter::new(Recorder::default());
        interpreter.run(&doro_syntax::parse("kas x = 40").unwrap()).unwrap();
        interpreter.run(&doro_syntax::parse("say x + 2").unwrap()).unwrap();
        assert_eq!(interpreter.io().output, ["42"]);

        interpreter.reset();
        assert!(interpreter.run(&doro_syntax::parse("say x").unwrap()).is_err());
    }
}

//! REPL (Read-Eval-Print Loop) for pseudocode

use crate::interp::{Interpreter, InterpreterOptions, Value};
use crate::lexer::{TokenKind, tokenize};
use crate::parser::parse_source;
use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, Result as RlResult};
use std::path::PathBuf;

const PROMPT: &str = ">>> ";
const CONTINUATION_PROMPT: &str = "... ";
const HISTORY_FILE: &str = ".cambridge_history";

/// Words the REPL handles itself instead of evaluating
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplCommand {
    Exit,
    Help,
    Clear,
}

impl ReplCommand {
    /// Recognise a command line in any letter case
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim().to_ascii_uppercase().as_str() {
            "EXIT" | "QUIT" => Some(ReplCommand::Exit),
            "HELP" => Some(ReplCommand::Help),
            "CLEAR" => Some(ReplCommand::Clear),
            _ => None,
        }
    }
}

/// Change in block nesting caused by one line
///
/// Counts opening keywords (IF, WHILE, FOR, REPEAT, CASE, PROCEDURE,
/// FUNCTION, CLASS, record TYPE) against their closing keywords. The FOR in
/// `OPENFILE f FOR READ` and the one-line `TYPE T = ...` forms do not open.
pub fn block_delta(line: &str) -> i32 {
    let kinds: Vec<TokenKind> = tokenize(line)
        .into_iter()
        .map(|t| t.kind)
        .filter(|k| !matches!(k, TokenKind::Eof | TokenKind::Newline))
        .collect();

    let mut delta = 0;
    for (i, kind) in kinds.iter().enumerate() {
        delta += match kind {
            TokenKind::If
            | TokenKind::While
            | TokenKind::Repeat
            | TokenKind::Case
            | TokenKind::Procedure
            | TokenKind::Function
            | TokenKind::Class => 1,
            TokenKind::For if !kinds[..i].contains(&TokenKind::OpenFile) => 1,
            TokenKind::Type if !kinds[i..].contains(&TokenKind::Eq) => 1,
            TokenKind::EndIf
            | TokenKind::EndWhile
            | TokenKind::Next
            | TokenKind::Until
            | TokenKind::EndCase
            | TokenKind::EndProcedure
            | TokenKind::EndFunction
            | TokenKind::EndClass
            | TokenKind::EndType => -1,
            _ => 0,
        };
    }
    delta
}

/// Outcome of evaluating one complete chunk of input
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    /// Nothing worth printing
    Quiet,
    /// Rendering of a non-NULL result
    Value(String),
    /// Parse or runtime error messages, one per line
    Failed(Vec<String>),
}

/// Interpreter plus the multi-line input buffer
pub struct Session {
    interpreter: Interpreter,
    options: InterpreterOptions,
    buffer: String,
    depth: i32,
}

impl Session {
    pub fn new(options: InterpreterOptions) -> Self {
        Self::with_interpreter(Interpreter::with_options(options.clone()), options)
    }

    /// Use a preconfigured interpreter, e.g. one with redirected I/O
    pub fn with_interpreter(interpreter: Interpreter, options: InterpreterOptions) -> Self {
        Session {
            interpreter,
            options,
            buffer: String::new(),
            depth: 0,
        }
    }

    /// True while an unfinished block is being collected
    pub fn is_continuing(&self) -> bool {
        !self.buffer.is_empty()
    }

    pub fn prompt(&self) -> &'static str {
        if self.is_continuing() {
            CONTINUATION_PROMPT
        } else {
            PROMPT
        }
    }

    /// Add a line; returns the accumulated source once every block is closed
    pub fn push_line(&mut self, line: &str) -> Option<String> {
        if line.trim().is_empty() && !self.is_continuing() {
            return None;
        }
        self.buffer.push_str(line);
        self.buffer.push('\n');
        self.depth += block_delta(line);
        if self.depth > 0 {
            return None;
        }
        self.depth = 0;
        Some(std::mem::take(&mut self.buffer))
    }

    /// Parse and run `source` against the persistent global scope
    pub fn eval(&mut self, source: &str) -> Evaluation {
        let (program, errors) = parse_source(source);
        if !errors.is_empty() {
            return Evaluation::Failed(
                errors.iter().map(|e| format!("Parse error: {e}")).collect(),
            );
        }
        match self.interpreter.run(&program) {
            Ok(Value::Null) => Evaluation::Quiet,
            Ok(value) => Evaluation::Value(value.to_string()),
            Err(err) => Evaluation::Failed(vec![err.to_string()]),
        }
    }

    /// Drop every binding and any half-entered block
    pub fn clear(&mut self) {
        self.interpreter = Interpreter::with_options(self.options.clone());
        self.buffer.clear();
        self.depth = 0;
    }
}

/// REPL state
pub struct Repl {
    editor: DefaultEditor,
    session: Session,
    history_path: Option<PathBuf>,
}

impl Repl {
    /// Create a new REPL
    pub fn new(options: InterpreterOptions) -> RlResult<Self> {
        let mut editor = DefaultEditor::new()?;
        let history_path = history_path();
        if let Some(path) = &history_path {
            if editor.load_history(path).is_err() {
                tracing::debug!(path = %path.display(), "no REPL history loaded");
            }
        }

        Ok(Repl {
            editor,
            session: Session::new(options),
            history_path,
        })
    }

    /// Run the REPL
    pub fn run(&mut self) -> RlResult<()> {
        println!("Cambridge Pseudocode v{}", env!("CARGO_PKG_VERSION"));
        println!("Based on Cambridge International AS & A Level Computer Science 9618");
        println!("Type 'EXIT' to quit, 'HELP' for help");

        loop {
            match self.editor.readline(self.session.prompt()) {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        let _ = self.editor.add_history_entry(line.as_str());
                    }

                    if !self.session.is_continuing() {
                        match ReplCommand::parse(&line) {
                            Some(ReplCommand::Exit) => {
                                println!("Goodbye!");
                                break;
                            }
                            Some(ReplCommand::Help) => {
                                print_help();
                                continue;
                            }
                            Some(ReplCommand::Clear) => {
                                self.session.clear();
                                println!("Environment cleared.");
                                continue;
                            }
                            None => {}
                        }
                    }

                    if let Some(source) = self.session.push_line(&line) {
                        match self.session.eval(&source) {
                            Evaluation::Quiet => {}
                            Evaluation::Value(text) => println!("{text}"),
                            Evaluation::Failed(messages) => {
                                for message in messages {
                                    eprintln!("{message}");
                                }
                            }
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!("\nGoodbye!");
                    break;
                }
                Err(err) => {
                    eprintln!("Error: {err}");
                    break;
                }
            }
        }

        if let Some(path) = &self.history_path {
            if let Err(err) = self.editor.save_history(path) {
                tracing::debug!(path = %path.display(), %err, "could not save REPL history");
            }
        }
        Ok(())
    }
}

fn print_help() {
    println!(
        "
REPL Commands:
  EXIT, QUIT    Exit the REPL
  HELP          Show this help
  CLEAR         Clear the environment

Syntax Reference:
  Variables:    DECLARE x : INTEGER
  Constants:    CONSTANT PI = 3.14159
  Assignment:   x <- 5  or  x ← 5

  Selection:    IF condition THEN ... ELSE ... ENDIF
                CASE OF x ... ENDCASE

  Iteration:    FOR i <- 1 TO 10 ... NEXT i
                WHILE condition ... ENDWHILE
                REPEAT ... UNTIL condition

  Procedures:   PROCEDURE Name(params) ... ENDPROCEDURE
  Functions:    FUNCTION Name(params) RETURNS type ... ENDFUNCTION

  I/O:          INPUT x
                OUTPUT \"Hello\", x

  Files:        OPENFILE \"file.txt\" FOR READ/WRITE/APPEND
                READFILE \"file.txt\", variable
                WRITEFILE \"file.txt\", data
                CLOSEFILE \"file.txt\"

Built-in Functions:
  String:       LENGTH, LEFT, RIGHT, MID, LCASE, UCASE, TO_UPPER, TO_LOWER
  Numeric:      INT, RAND, RANDOM, ROUND, ABS, SQRT, POW
  Conversion:   ASC, CHR, NUM_TO_STR, STR_TO_NUM, IS_NUM
  Date:         DAY, MONTH, YEAR, DAYINDEX, SETDATE, NOW
  File:         EOF
"
    );
}

/// `CAMBRIDGE_HISTORY`, else `.cambridge_history` in the home directory
fn history_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os("CAMBRIDGE_HISTORY") {
        return Some(PathBuf::from(path));
    }
    dirs_home().map(|h| h.join(HISTORY_FILE))
}

/// Get home directory
fn dirs_home() -> Option<PathBuf> {
    #[cfg(windows)]
    {
        std::env::var("USERPROFILE").ok().map(PathBuf::from)
    }
    #[cfg(not(windows))]
    {
        std::env::var("HOME").ok().map(PathBuf::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interp::CapturedOutput;
    use std::io::Cursor;

    fn session() -> (Session, CapturedOutput) {
        let output = CapturedOutput::new();
        let options = InterpreterOptions::default();
        let interp = Interpreter::with_options(options.clone())
            .with_io(Box::new(Cursor::new(Vec::new())), Box::new(output.clone()));
        (Session::with_interpreter(interp, options), output)
    }

    #[test]
    fn test_commands_any_case() {
        assert_eq!(ReplCommand::parse("exit"), Some(ReplCommand::Exit));
        assert_eq!(ReplCommand::parse("  QUIT "), Some(ReplCommand::Exit));
        assert_eq!(ReplCommand::parse("Help"), Some(ReplCommand::Help));
        assert_eq!(ReplCommand::parse("CLEAR"), Some(ReplCommand::Clear));
        assert_eq!(ReplCommand::parse("OUTPUT 1"), None);
    }

    #[test]
    fn test_block_delta_openers_and_closers() {
        assert_eq!(block_delta("IF x > 1 THEN"), 1);
        assert_eq!(block_delta("ENDIF"), -1);
        assert_eq!(block_delta("FOR i <- 1 TO 3"), 1);
        assert_eq!(block_delta("NEXT i"), -1);
        assert_eq!(block_delta("PROCEDURE Greet()"), 1);
        assert_eq!(block_delta("OUTPUT 1"), 0);
    }

    #[test]
    fn test_block_delta_ignores_single_line_forms() {
        assert_eq!(block_delta("OPENFILE \"a.txt\" FOR READ"), 0);
        assert_eq!(block_delta("TYPE Season = (Spring, Summer)"), 0);
        assert_eq!(block_delta("TYPE Point"), 1);
        assert_eq!(block_delta("// IF inside a comment"), 0);
    }

    #[test]
    fn test_push_line_waits_for_nested_blocks() {
        let (mut session, _) = session();
        assert_eq!(session.push_line("FOR i <- 1 TO 2"), None);
        assert_eq!(session.prompt(), CONTINUATION_PROMPT);
        assert_eq!(session.push_line("  IF i = 2 THEN"), None);
        assert_eq!(session.push_line("    OUTPUT i"), None);
        assert_eq!(session.push_line("  ENDIF"), None);
        let source = session.push_line("NEXT i").expect("block complete");
        assert_eq!(source.lines().count(), 5);
        assert_eq!(session.prompt(), PROMPT);
    }

    #[test]
    fn test_blank_line_outside_block_is_skipped() {
        let (mut session, _) = session();
        assert_eq!(session.push_line("   "), None);
        assert!(!session.is_continuing());
    }

    #[test]
    fn test_eval_prints_non_null_results() {
        let (mut session, output) = session();
        assert_eq!(session.eval("DECLARE x : INTEGER"), Evaluation::Quiet);
        assert_eq!(session.eval("x <- 6 * 7"), Evaluation::Value("42".to_string()));
        assert_eq!(session.eval("OUTPUT x"), Evaluation::Quiet);
        assert_eq!(output.contents(), "42\n");
    }

    #[test]
    fn test_eval_reports_errors_and_keeps_state() {
        let (mut session, _) = session();
        session.eval("DECLARE total : INTEGER");
        match session.eval("total <- 1 DIV 0") {
            Evaluation::Failed(messages) => assert!(messages[0].contains("division by zero")),
            other => panic!("expected failure, got {other:?}"),
        }
        match session.eval("IF THEN") {
            Evaluation::Failed(messages) => assert!(messages[0].starts_with("Parse error: ")),
            other => panic!("expected parse failure, got {other:?}"),
        }
        assert_eq!(session.eval("total"), Evaluation::Value("0".to_string()));
    }

    #[test]
    fn test_clear_forgets_bindings() {
        let (mut session, _) = session();
        session.eval("DECLARE x : INTEGER");
        session.push_line("WHILE TRUE");
        session.clear();
        assert!(!session.is_continuing());
        assert!(matches!(session.eval("x"), Evaluation::Failed(_)));
    }

    #[test]
    fn test_stdin_session_leaves_stdin_to_the_editor() {
        let mut session = Session::new(InterpreterOptions::default());
        session.clear();
        // rustyline takes this lock itself when stdin is not a terminal
        let lock = std::io::stdin().lock();
        drop(lock);
        assert_eq!(session.eval("1 + 1"), Evaluation::Value("2".to_string()));
    }

    #[test]
    fn test_history_path_prefers_environment() {
        if std::env::var_os("CAMBRIDGE_HISTORY").is_none() {
            if let Some(path) = history_path() {
                assert!(path.ends_with(HISTORY_FILE));
            }
        }
    }
}

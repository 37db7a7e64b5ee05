use std::borrow::Cow;
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::rc::Rc;
use std::thread;

use clap::Parser;
use log::info;
use minilisp::config::MAX_EVAL_DEPTH;
use minilisp::{Config, Error, Interpreter, LambdaLifetime, TokenKind, tokenize};
use rustyline::error::ReadlineError;
use rustyline::highlight::{CmdKind, Highlighter};
use rustyline::history::DefaultHistory;
use rustyline::validate::{ValidationContext, ValidationResult, Validator};
use rustyline::{Cmd, Completer, Context, Editor, EventHandler, KeyCode, KeyEvent, Modifiers};
use rustyline::{Helper, Highlighter, Hinter, Validator};

#[derive(Parser, Debug)]
#[command(name = "minilisp", version, about = "Evaluate minilisp expressions")]
struct Args {
    /// Script to run instead of starting the REPL
    script: Option<PathBuf>,

    /// Maximum number of nested function calls before evaluation is abandoned
    #[arg(long, default_value_t = MAX_EVAL_DEPTH)]
    max_depth: usize,

    /// Keep lambda functions registered after their first call
    #[arg(long)]
    persistent_lambdas: bool,

    /// File used to persist REPL history
    #[arg(long, default_value = "minilisp_history.txt")]
    history: PathBuf,
}

impl Args {
    fn config(&self) -> Config {
        let lifetime = if self.persistent_lambdas {
            LambdaLifetime::Persistent
        } else {
            LambdaLifetime::OneShot
        };
        Config::default()
            .with_max_eval_depth(self.max_depth)
            .with_lambda_lifetime(lifetime)
    }
}

// Only the space character separates tokens, so line breaks typed into the
// REPL or found in scripts are folded into spaces before reading.
fn normalize(input: &str) -> String {
    input.replace(['\n', '\r', '\t'], " ")
}

fn report(error: &Error, source_id: &str, input: &str) {
    let printed = match error {
        Error::Parse(e) => e.report(source_id, input),
        Error::Eval(e) => e.report(source_id, input),
    };
    if printed.is_err() {
        eprintln!("Error: {}", error);
    }
}

struct MinilispCompleter {
    interpreter: Rc<RefCell<Interpreter>>,
}

impl rustyline::completion::Completer for MinilispCompleter {
    type Candidate = String;
    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<String>)> {
        let Ok(tokens) = tokenize(&line[..pos]) else {
            return Ok((pos, vec![]));
        };
        match tokens.last() {
            Some(token) if token.span.end == pos => {
                if let TokenKind::Text(prefix) = &token.kind {
                    let candidates = self
                        .interpreter
                        .borrow()
                        .environment()
                        .defined_names()
                        .into_iter()
                        .filter(|name| name.starts_with(prefix.as_str()))
                        .collect();
                    return Ok((token.span.start, candidates));
                }
                Ok((pos, vec![]))
            }
            _ => Ok((pos, vec![])),
        }
    }
}

#[derive(Completer, Helper, Highlighter, Hinter, Validator)]
struct ReplHelper {
    #[rustyline(Validator)]
    validator: ParenValidator,
    #[rustyline(Highlighter)]
    highlighter: ParenHighlighter,
    #[rustyline(Completer)]
    completer: MinilispCompleter,
}

struct ParenValidator;

impl Validator for ParenValidator {
    fn validate(&self, ctx: &mut ValidationContext) -> rustyline::Result<ValidationResult> {
        let mut open = 0usize;
        for (i, c) in ctx.input().char_indices() {
            match c {
                '(' => open += 1,
                ')' if open == 0 => {
                    return Ok(ValidationResult::Invalid(Some(format!(
                        "  - Unmatched ')' at position {}",
                        i
                    ))));
                }
                ')' => open -= 1,
                _ => {}
            }
        }
        if open > 0 {
            Ok(ValidationResult::Incomplete)
        } else {
            Ok(ValidationResult::Valid(None))
        }
    }
}

struct ParenHighlighter;

impl Highlighter for ParenHighlighter {
    fn highlight<'l>(&self, line: &'l str, pos: usize) -> Cow<'l, str> {
        // (index in line, index in highlighted output) of each open paren
        let mut stack: Vec<(usize, usize)> = Vec::new();
        let mut highlighted = String::with_capacity(line.len());
        let cursor = pos.checked_sub(1);

        for (i, c) in line.char_indices() {
            match c {
                '(' => {
                    stack.push((i, highlighted.len()));
                    highlighted.push(c);
                }
                ')' => match stack.pop() {
                    Some((open_idx, open_pos)) => {
                        if cursor == Some(open_idx) || cursor == Some(i) {
                            highlighted.push_str("\x1b[34m)\x1b[0m"); // Blue for matching parens
                            highlighted.replace_range(open_pos..=open_pos, "\x1b[1;34m(\x1b[0m");
                        } else {
                            highlighted.push(c);
                        }
                    }
                    None => highlighted.push_str("\x1b[31m)\x1b[0m"), // Red for unmatched
                },
                _ => highlighted.push(c),
            }
        }

        Cow::Owned(highlighted)
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _kind: CmdKind) -> bool {
        true
    }
}

fn run_script(path: &Path, config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let source = fs::read_to_string(path)?;
    let input = normalize(&source);
    let source_id = path.display().to_string();
    info!("running script {}", source_id);

    let mut interpreter = Interpreter::with_config(config);
    if let Err(e) = interpreter.eval_all_str(&input) {
        report(&e, &source_id, &input);
        std::process::exit(1);
    }
    Ok(())
}

fn run_repl(args: &Args) -> rustyline::Result<()> {
    println!("minilisp REPL v{}", env!("CARGO_PKG_VERSION"));
    println!("Type 'exit' or press Ctrl-D to quit.");

    let interpreter = Rc::new(RefCell::new(Interpreter::with_config(args.config())));
    let h = ReplHelper {
        highlighter: ParenHighlighter,
        validator: ParenValidator,
        completer: MinilispCompleter {
            interpreter: interpreter.clone(),
        },
    };
    let config = rustyline::config::Config::builder()
        .edit_mode(rustyline::EditMode::Emacs)
        .build();
    let mut rl: Editor<ReplHelper, DefaultHistory> = Editor::with_config(config)?;
    rl.set_helper(Some(h));
    rl.bind_sequence(
        KeyEvent(KeyCode::Char('s'), Modifiers::CTRL),
        EventHandler::Simple(Cmd::Newline),
    );
    if rl.load_history(&args.history).is_err() {
        println!("No previous history.");
    }

    loop {
        match rl.readline("minilisp> ") {
            Ok(line) => {
                rl.add_history_entry(line.as_str())?;
                let input = normalize(line.trim());
                if input.is_empty() {
                    continue;
                }
                if input.eq_ignore_ascii_case("exit") {
                    break;
                }

                match interpreter.borrow_mut().eval_str(&input) {
                    Ok(value) => println!("{}", value),
                    Err(e) => report(&e, "REPL", &input),
                }
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl-C
                println!("Interrupted. Type 'exit' or Ctrl-D to quit.");
            }
            Err(ReadlineError::Eof) => {
                // Ctrl-D
                println!("\nExiting.");
                break;
            }
            Err(err) => {
                eprintln!("Readline Error: {:?}", err);
                break;
            }
        }
    }
    rl.save_history(&args.history)
}

// Evaluation recurses on the host stack; this leaves room for the default
// call limit in unoptimized builds.
const INTERPRETER_STACK_SIZE: usize = 64 * 1024 * 1024;

fn run(args: &Args) -> ExitCode {
    let result: Result<(), Box<dyn std::error::Error>> = match &args.script {
        Some(path) => run_script(path, args.config()),
        None => run_repl(args).map_err(Into::into),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    let worker = thread::Builder::new()
        .name("minilisp".to_string())
        .stack_size(INTERPRETER_STACK_SIZE)
        .spawn(move || run(&args));
    match worker {
        Ok(handle) => handle.join().unwrap_or(ExitCode::FAILURE),
        Err(e) => {
            eprintln!("Error: could not start interpreter thread: {}", e);
            ExitCode::FAILURE
        }
    }
}

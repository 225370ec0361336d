//! Interactive session loop: a line-buffered two-state driver over the
//! translator, trial compilation, and the execution engine.

use std::io::{self, BufRead, Write};

use crate::diagnostic::render_diagnostics;
use crate::interpreter::error::ExitRequest;
use crate::interpreter::parser::{parse_interactive, ParseOutcome};
use crate::session::{Execution, Session};

pub const PRIMARY_PROMPT: &str = ">>> ";
pub const CONTINUATION_PROMPT: &str = "... ";

/// Trimmed-line literals that end the session, matched exactly.
pub const EXIT_SENTINELS: &[&str] = &["sair()", "exit()", "quit()"];

/// Loop state: reading the first line of a unit, or buffering continuation
/// lines of an incomplete one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplState {
    Primary,
    Continuation,
}

/// What one fed line produced.
#[derive(Debug)]
pub enum LineResult {
    /// Exit sentinel; the session is over.
    Exit,
    /// The buffered input is a valid prefix of a longer unit.
    Pending,
    /// A complete unit ran; captures are ready to print.
    Executed(Execution),
    /// The buffered input was rejected; the rendered diagnostic is ready to
    /// print and the buffer has been reset.
    SyntaxError(String),
    /// Executed code requested termination.
    Terminated(ExitRequest),
}

pub struct Repl {
    session: Session,
    pending: Vec<String>,
}

impl Repl {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            pending: Vec::new(),
        }
    }

    pub fn state(&self) -> ReplState {
        if self.pending.is_empty() {
            ReplState::Primary
        } else {
            ReplState::Continuation
        }
    }

    /// Prompt text is a pure function of state.
    pub fn prompt(&self) -> &'static str {
        match self.state() {
            ReplState::Primary => PRIMARY_PROMPT,
            ReplState::Continuation => CONTINUATION_PROMPT,
        }
    }

    /// Feed one input line (without its trailing newline) through the
    /// incremental-input protocol.
    pub fn feed(&mut self, line: &str) -> LineResult {
        if EXIT_SENTINELS.contains(&line.trim()) {
            return LineResult::Exit;
        }
        self.pending.push(line.to_string());
        let candidate = format!("{}\n", self.pending.join("\n"));
        let translated = self.session.translator().translate(&candidate);
        match parse_interactive(&translated) {
            ParseOutcome::Incomplete => LineResult::Pending,
            ParseOutcome::Invalid(err) => {
                self.pending.clear();
                let rendered = render_diagnostics(
                    &translated,
                    "<entrada>",
                    &[err.to_diagnostic()],
                    false,
                );
                LineResult::SyntaxError(rendered)
            }
            ParseOutcome::Ready(_) => {
                self.pending.clear();
                match self.session.execute_interactive(&candidate, "<entrada>") {
                    Ok(execution) => LineResult::Executed(execution),
                    Err(request) => LineResult::Terminated(request),
                }
            }
        }
    }
}

/// Drive the loop over stdin/stdout/stderr until end of input, an exit
/// sentinel, or a termination request (which is returned, not swallowed).
pub fn run(session: Session) -> Option<ExitRequest> {
    let mut repl = Repl::new(session);
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("{}", repl.prompt());
        io::stdout().flush().ok();
        let line = match lines.next() {
            Some(Ok(line)) => line,
            Some(Err(_)) | None => {
                println!();
                return None;
            }
        };
        match repl.feed(&line) {
            LineResult::Exit => return None,
            LineResult::Pending => {}
            LineResult::Executed(execution) => {
                print!("{}", execution.stdout);
                io::stdout().flush().ok();
                eprint!("{}", execution.stderr);
            }
            LineResult::SyntaxError(rendered) => {
                eprint!("{}", rendered);
            }
            LineResult::Terminated(request) => return Some(request),
        }
    }
}

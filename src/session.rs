//! A session: one persistent namespace plus the execution boundary around
//! the translator and the host engine.

use std::rc::Rc;

use crate::diagnostic::render_diagnostics;
use crate::extensions;
use crate::interpreter::builtins::mathmod;
use crate::interpreter::error::{ExitRequest, Fault};
use crate::interpreter::parser::parse_program;
use crate::interpreter::{Environment, Interpreter};
use crate::translate::Translator;
use crate::value::Value;

/// Structured failure descriptor of one execution.
#[derive(Debug, Clone)]
pub struct Failure {
    /// Fault kind name (`TypeError`, `SyntaxError`, …).
    pub kind: String,
    pub message: String,
    /// The rendered trace, as appended to the stderr capture.
    pub trace: String,
}

/// Result of one execution: call-scoped captures plus an optional failure.
/// Ordinary faults never escape `execute`; they land here.
#[derive(Debug, Clone)]
pub struct Execution {
    pub stdout: String,
    pub stderr: String,
    pub failure: Option<Failure>,
}

impl Execution {
    pub fn succeeded(&self) -> bool {
        self.failure.is_none()
    }
}

/// A session owns the namespace every execution runs against. Definitions
/// made in one call are visible in the next for the lifetime of the
/// session; a fresh session has no residue.
pub struct Session {
    namespace: Environment,
    translator: Translator,
}

impl Session {
    pub fn new() -> Self {
        let translator = Translator::new();
        let namespace = Environment::new();
        let vocab = translator.vocabulary();
        for (alias, host) in vocab.builtin_aliases() {
            namespace.set(*alias, Value::Builtin(Rc::from(*host)));
        }
        for (name, value) in vocab.constants() {
            namespace.set(*name, Value::float(*value));
        }
        namespace.set("math", mathmod::module());
        // The graphics extension is optional; its absence never aborts
        // session creation.
        if let Some(gfx) = extensions::graphics_module() {
            namespace.set(extensions::GRAPHICS_MODULE, gfx);
        }
        namespace.set("__name__", Value::str("__main__"));
        Self {
            namespace,
            translator,
        }
    }

    pub fn translator(&self) -> &Translator {
        &self.translator
    }

    /// One-shot execution of localized source text. The only condition that
    /// propagates is an explicit termination request; captured output from
    /// a terminated call is discarded with it.
    pub fn execute(&mut self, source: &str, label: &str) -> Result<Execution, ExitRequest> {
        self.run(source, label, false)
    }

    /// Like [`Session::execute`], but echoes non-None expression statement
    /// values, the way the interactive session presents results.
    pub fn execute_interactive(
        &mut self,
        source: &str,
        label: &str,
    ) -> Result<Execution, ExitRequest> {
        self.run(source, label, true)
    }

    fn run(&mut self, source: &str, label: &str, echo: bool) -> Result<Execution, ExitRequest> {
        let translated = self.translator.translate(source);
        let stmts = match parse_program(&translated) {
            Ok(stmts) => stmts,
            Err(err) => {
                let trace =
                    render_diagnostics(&translated, label, &[err.to_diagnostic()], false);
                return Ok(Execution {
                    stdout: String::new(),
                    stderr: trace.clone(),
                    failure: Some(Failure {
                        kind: "SyntaxError".to_string(),
                        message: err.message().to_string(),
                        trace,
                    }),
                });
            }
        };

        let mut interp = if echo {
            Interpreter::with_echo(self.namespace.clone())
        } else {
            Interpreter::new(self.namespace.clone())
        };
        match interp.run(&stmts) {
            Ok(()) => Ok(Execution {
                stdout: interp.take_stdout(),
                stderr: String::new(),
                failure: None,
            }),
            Err(Fault::Error(err)) => {
                let trace =
                    render_diagnostics(&translated, label, &[err.to_diagnostic()], false);
                Ok(Execution {
                    stdout: interp.take_stdout(),
                    stderr: trace.clone(),
                    failure: Some(Failure {
                        kind: err.kind.name().to_string(),
                        message: err.message.clone(),
                        trace,
                    }),
                })
            }
            Err(Fault::Exit(request)) => Err(request),
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

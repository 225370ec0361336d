use crate::diagnostic::{Diagnostic, Label, Span};

/// The ordinary runtime fault taxonomy. Kind names follow the host
/// language so `except` clauses can match on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Name,
    Type,
    Value,
    ZeroDivision,
    Index,
    Key,
    Attribute,
    Import,
    Assertion,
    Recursion,
    /// A fault raised explicitly by user code.
    Raised,
}

impl ErrorKind {
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::Name => "NameError",
            ErrorKind::Type => "TypeError",
            ErrorKind::Value => "ValueError",
            ErrorKind::ZeroDivision => "ZeroDivisionError",
            ErrorKind::Index => "IndexError",
            ErrorKind::Key => "KeyError",
            ErrorKind::Attribute => "AttributeError",
            ErrorKind::Import => "ImportError",
            ErrorKind::Assertion => "AssertionError",
            ErrorKind::Recursion => "RecursionError",
            ErrorKind::Raised => "Exception",
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ErrorKind::Name => "E0201",
            ErrorKind::Type => "E0202",
            ErrorKind::Value => "E0203",
            ErrorKind::ZeroDivision => "E0204",
            ErrorKind::Index => "E0205",
            ErrorKind::Key => "E0206",
            ErrorKind::Attribute => "E0207",
            ErrorKind::Import => "E0208",
            ErrorKind::Assertion => "E0209",
            ErrorKind::Recursion => "E0210",
            ErrorKind::Raised => "E0211",
        }
    }
}

#[derive(Debug, Clone)]
pub struct RuntimeError {
    pub kind: ErrorKind,
    pub message: String,
    pub span: Span,
}

impl RuntimeError {
    pub fn new(kind: ErrorKind, message: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            message: message.into(),
            span,
        }
    }

    pub fn name_error(name: &str, span: Span) -> Self {
        Self::new(
            ErrorKind::Name,
            format!("name '{}' is not defined", name),
            span,
        )
    }

    pub fn type_error(message: impl Into<String>, span: Span) -> Self {
        Self::new(ErrorKind::Type, message, span)
    }

    pub fn value_error(message: impl Into<String>, span: Span) -> Self {
        Self::new(ErrorKind::Value, message, span)
    }

    pub fn zero_division(span: Span) -> Self {
        Self::new(ErrorKind::ZeroDivision, "division by zero", span)
    }

    pub fn index_error(message: impl Into<String>, span: Span) -> Self {
        Self::new(ErrorKind::Index, message, span)
    }

    pub fn key_error(key: &str, span: Span) -> Self {
        Self::new(ErrorKind::Key, format!("'{}'", key), span)
    }

    pub fn attribute_error(type_name: &str, attr: &str, span: Span) -> Self {
        Self::new(
            ErrorKind::Attribute,
            format!("'{}' object has no attribute '{}'", type_name, attr),
            span,
        )
    }

    pub fn import_error(module: &str, span: Span) -> Self {
        Self::new(
            ErrorKind::Import,
            format!("no module named '{}'", module),
            span,
        )
    }

    /// Fill in the call-site span when a builtin reported a fault without
    /// position information.
    pub fn or_span(mut self, span: Span) -> Self {
        if self.span.is_dummy() {
            self.span = span;
        }
        self
    }

    /// Whether an `except <name>` clause catches this fault. `Exception`
    /// catches every ordinary fault.
    pub fn matches_handler(&self, handler: &str) -> bool {
        handler == "Exception" || handler == self.kind.name()
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        let mut diag = Diagnostic::error(format!("{}: {}", self.kind.name(), self.message))
            .with_code(self.kind.code());
        if !self.span.is_dummy() {
            diag = diag.with_label(Label::primary(self.span, ""));
        }
        diag
    }
}

impl std::fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind.name(), self.message)
    }
}

impl std::error::Error for RuntimeError {}

/// The one condition allowed to escape an execution: an explicit request to
/// end the session, carrying the process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitRequest {
    pub code: i32,
}

/// Everything that can unwind out of evaluation. Ordinary faults are caught
/// by `except` handlers and by the execution boundary; exit requests pass
/// through both.
#[derive(Debug, Clone)]
pub enum Fault {
    Error(RuntimeError),
    Exit(ExitRequest),
}

impl From<RuntimeError> for Fault {
    fn from(err: RuntimeError) -> Self {
        Fault::Error(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handler_matching() {
        let err = RuntimeError::zero_division(Span::dummy());
        assert!(err.matches_handler("ZeroDivisionError"));
        assert!(err.matches_handler("Exception"));
        assert!(!err.matches_handler("TypeError"));
    }

    #[test]
    fn test_or_span_only_fills_dummy() {
        let err = RuntimeError::type_error("boom", Span::dummy()).or_span(Span::new(3, 5));
        assert_eq!(err.span, Span::new(3, 5));
        let err = RuntimeError::type_error("boom", Span::new(1, 2)).or_span(Span::new(3, 5));
        assert_eq!(err.span, Span::new(1, 2));
    }
}

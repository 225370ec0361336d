use std::fmt;

/// A source span representing a range of bytes in the source code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn dummy() -> Self {
        Self { start: 0, end: 0 }
    }

    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    pub fn is_dummy(&self) -> bool {
        self.start == 0 && self.end == 0
    }
}

/// Severity level for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// A label pointing to a specific span in the source
#[derive(Debug, Clone)]
pub struct Label {
    pub span: Span,
    pub message: String,
}

impl Label {
    pub fn primary(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
        }
    }
}

/// A complete diagnostic message
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: Option<String>,
    pub message: String,
    pub labels: Vec<Label>,
    pub notes: Vec<String>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code: None,
            message: message.into(),
            labels: Vec::new(),
            notes: Vec::new(),
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_label(mut self, label: Label) -> Self {
        self.labels.push(label);
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.notes.push(format!("help: {}", help.into()));
        self
    }
}

/// Computes line and column (both 1-based) from a byte offset
pub fn line_col(source: &str, offset: usize) -> (usize, usize) {
    let mut line = 1;
    let mut col = 1;
    for (i, ch) in source.char_indices() {
        if i >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }
    (line, col)
}

fn line_content(source: &str, line_num: usize) -> Option<&str> {
    source.lines().nth(line_num.saturating_sub(1))
}

/// Diagnostic renderer for Rust-like error output
pub struct DiagnosticRenderer<'a> {
    source: &'a str,
    file_name: &'a str,
    use_color: bool,
}

impl<'a> DiagnosticRenderer<'a> {
    pub fn new(source: &'a str, file_name: &'a str, use_color: bool) -> Self {
        Self {
            source,
            file_name,
            use_color,
        }
    }

    /// Render a diagnostic to a string
    pub fn render(&self, diagnostic: &Diagnostic) -> String {
        let mut output = String::new();

        let severity_str = match diagnostic.severity {
            Severity::Error => self.style_red_bold("error"),
            Severity::Warning => self.style_yellow_bold("warning"),
        };
        if let Some(code) = &diagnostic.code {
            output.push_str(&format!(
                "{}[{}]: {}\n",
                severity_str,
                code,
                self.style_bold(&diagnostic.message)
            ));
        } else {
            output.push_str(&format!(
                "{}: {}\n",
                severity_str,
                self.style_bold(&diagnostic.message)
            ));
        }

        for label in &diagnostic.labels {
            self.render_label(&mut output, label);
        }

        for note in &diagnostic.notes {
            output.push_str(&format!("  {} {}\n", self.style_blue("="), note));
        }

        output
    }

    fn render_label(&self, output: &mut String, label: &Label) {
        let (line, col) = line_col(self.source, label.span.start);
        let content = match line_content(self.source, line) {
            Some(c) => c,
            None => return,
        };

        output.push_str(&format!(
            "  {} {}:{}:{}\n",
            self.style_blue("-->"),
            self.file_name,
            line,
            col
        ));

        let line_str = line.to_string();
        let gutter = " ".repeat(line_str.len() + 1);
        output.push_str(&format!("{}{}\n", gutter, self.style_blue("|")));
        output.push_str(&format!(
            "{} {} {}\n",
            self.style_blue(&line_str),
            self.style_blue("|"),
            content
        ));

        let (end_line, end_col) = line_col(
            self.source,
            label.span.end.saturating_sub(1).max(label.span.start),
        );
        let underline_len = if end_line == line && end_col >= col {
            end_col - col + 1
        } else {
            1
        };
        let underline = format!(
            "{}{}",
            " ".repeat(col.saturating_sub(1)),
            "^".repeat(underline_len)
        );
        if label.message.is_empty() {
            output.push_str(&format!(
                "{}{} {}\n",
                gutter,
                self.style_blue("|"),
                self.style_red(&underline)
            ));
        } else {
            output.push_str(&format!(
                "{}{} {} {}\n",
                gutter,
                self.style_blue("|"),
                self.style_red(&underline),
                self.style_red(&label.message)
            ));
        }
    }

    // Color helpers
    fn style_red(&self, s: &str) -> String {
        if self.use_color {
            format!("\x1b[31m{}\x1b[0m", s)
        } else {
            s.to_string()
        }
    }

    fn style_red_bold(&self, s: &str) -> String {
        if self.use_color {
            format!("\x1b[1;31m{}\x1b[0m", s)
        } else {
            s.to_string()
        }
    }

    fn style_yellow_bold(&self, s: &str) -> String {
        if self.use_color {
            format!("\x1b[1;33m{}\x1b[0m", s)
        } else {
            s.to_string()
        }
    }

    fn style_blue(&self, s: &str) -> String {
        if self.use_color {
            format!("\x1b[34m{}\x1b[0m", s)
        } else {
            s.to_string()
        }
    }

    fn style_bold(&self, s: &str) -> String {
        if self.use_color {
            format!("\x1b[1m{}\x1b[0m", s)
        } else {
            s.to_string()
        }
    }
}

/// Render multiple diagnostics
pub fn render_diagnostics(
    source: &str,
    file_name: &str,
    diagnostics: &[Diagnostic],
    use_color: bool,
) -> String {
    let renderer = DiagnosticRenderer::new(source, file_name, use_color);
    let mut output = String::new();
    for diagnostic in diagnostics {
        output.push_str(&renderer.render(diagnostic));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_col() {
        let source = "x = 5\ny = 10";
        assert_eq!(line_col(source, 0), (1, 1));
        assert_eq!(line_col(source, 4), (1, 5));
        assert_eq!(line_col(source, 6), (2, 1));
        assert_eq!(line_col(source, 10), (2, 5));
    }

    #[test]
    fn test_span_merge() {
        let merged = Span::new(5, 10).merge(Span::new(8, 15));
        assert_eq!(merged.start, 5);
        assert_eq!(merged.end, 15);
    }

    #[test]
    fn test_diagnostic_rendering() {
        let source = "x = \n";
        let diagnostic = Diagnostic::error("expected expression")
            .with_code("E0101")
            .with_label(Label::primary(Span::new(4, 5), "expected expression here"));

        let renderer = DiagnosticRenderer::new(source, "<string>", false);
        let output = renderer.render(&diagnostic);

        assert!(output.contains("error[E0101]"));
        assert!(output.contains("expected expression"));
        assert!(output.contains("<string>:1:5"));
    }
}

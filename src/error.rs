use ariadne::{Color, Config, Fmt, IndexType, Label, Report, ReportKind, Source};
use std::io::{self, Write};
use std::path::PathBuf;
use thiserror::Error;

/// Byte range into the source plus the 1-based line it starts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: usize,
}

impl Span {
    pub fn new(start: usize, end: usize, line: usize) -> Self {
        Self { start, end, line }
    }

    /// Covers `self` through `other`, keeping the line of `self`.
    pub fn to(&self, other: &Span) -> Self {
        Self {
            start: self.start,
            end: other.end.max(self.end),
            line: self.line,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Lex,
    Parse,
    Static,
    Runtime,
}

impl ErrorKind {
    /// The category printed in front of every diagnostic.
    pub fn category(&self) -> &'static str {
        match self {
            ErrorKind::Lex | ErrorKind::Parse => "PARSE",
            ErrorKind::Static | ErrorKind::Runtime => "RUNTIME",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportStyle {
    /// `<CATEGORY> ERROR: <line> <message>`
    #[default]
    Plain,
    /// Annotated source snippet rendered by ariadne.
    Pretty,
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("{} ERROR: {} {}", .kind.category(), .span.line, .message)]
pub struct PolyError {
    pub kind: ErrorKind,
    pub span: Span,
    pub message: String,
    pub help: Option<String>,
}

impl PolyError {
    pub fn new(kind: ErrorKind, span: Span, message: String) -> Self {
        Self {
            kind,
            span,
            message,
            help: None,
        }
    }

    pub fn new_with_help(kind: ErrorKind, span: Span, message: String, help: String) -> Self {
        Self {
            kind,
            span,
            message,
            help: Some(help),
        }
    }

    pub fn lex_error(span: Span, message: String) -> Self {
        Self::new(ErrorKind::Lex, span, message)
    }

    pub fn parse_error(span: Span, message: String) -> Self {
        Self::new(ErrorKind::Parse, span, message)
    }

    pub fn parse_error_with_help(span: Span, message: String, help: String) -> Self {
        Self::new_with_help(ErrorKind::Parse, span, message, help)
    }

    pub fn static_error(span: Span, message: String) -> Self {
        Self::new(ErrorKind::Static, span, message)
    }

    pub fn runtime_error(span: Span, message: String) -> Self {
        Self::new(ErrorKind::Runtime, span, message)
    }

    pub fn line(&self) -> usize {
        self.span.line
    }

    pub fn report<W: Write>(
        &self,
        source: &str,
        filename: Option<&str>,
        style: ReportStyle,
        out: &mut W,
    ) -> io::Result<()> {
        match style {
            ReportStyle::Plain => writeln!(out, "{}", self),
            ReportStyle::Pretty => self.report_pretty(source, filename, out),
        }
    }

    fn report_pretty<W: Write>(
        &self,
        source: &str,
        filename: Option<&str>,
        out: &mut W,
    ) -> io::Result<()> {
        let filename = filename.unwrap_or("<stdin>");

        let color = match self.kind {
            ErrorKind::Lex => Color::Red,
            ErrorKind::Parse => Color::Yellow,
            ErrorKind::Static => Color::Cyan,
            ErrorKind::Runtime => Color::Magenta,
        };

        let kind_str = match self.kind {
            ErrorKind::Lex => "Lexical Error",
            ErrorKind::Parse => "Parse Error",
            ErrorKind::Static => "Static Error",
            ErrorKind::Runtime => "Runtime Error",
        };

        // End-of-input spans sit one past the last byte.
        let start = self.span.start.min(source.len());
        let end = self.span.end.clamp(start, source.len());

        // Spans are byte offsets.
        let mut report_builder = Report::build(ReportKind::Error, filename, start)
            .with_config(Config::default().with_index_type(IndexType::Byte))
            .with_message(format!(
                "{} (line {}): {}",
                kind_str.fg(color),
                self.span.line,
                self.message
            ))
            .with_label(
                Label::new((filename, start..end))
                    .with_message(&self.message)
                    .with_color(color),
            );

        if let Some(ref help_text) = self.help {
            report_builder =
                report_builder.with_note(format!("{}: {}", "help".fg(Color::Cyan), help_text));
        }

        report_builder
            .finish()
            .write((filename, Source::from(source)), out)
    }
}

/// Errors recorded by one phase. Stands in for a global error counter: each
/// phase owns one and the runner adds them up.
#[derive(Debug, Default)]
pub struct Diagnostics {
    errors: Vec<PolyError>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, error: PolyError) {
        tracing::debug!(kind = ?error.kind, line = error.span.line, message = %error.message, "diagnostic");
        self.errors.push(error);
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PolyError> {
        self.errors.iter()
    }

    /// Hands over everything recorded so far and starts empty again.
    pub fn take(&mut self) -> Vec<PolyError> {
        std::mem::take(&mut self.errors)
    }
}

/// Failures of the command-line surface, outside any program text.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Too many file names")]
    TooManyFiles,
    #[error("Could not open {}: {source}", .path.display())]
    CouldNotOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("error reading standard input: {0}")]
    Stdin(#[source] io::Error),
    #[error("error writing output: {0}")]
    Output(#[from] io::Error),
}

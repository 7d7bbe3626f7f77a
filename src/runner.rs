use crate::checker::StaticChecker;
use crate::error::{PolyError, ReportStyle};
use crate::evaluator::Evaluator;
use crate::parser::Parser;
use std::io::{self, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Parse, check and evaluate.
    #[default]
    Run,
    /// Parse and check only.
    Check,
    /// Print the parsed tree instead of running it.
    DumpAst,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    pub mode: Mode,
    pub style: ReportStyle,
}

/// What one run produced, for deciding the exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Whether parsing produced a program at all.
    pub parsed: bool,
    pub parse_errors: usize,
    pub static_errors: usize,
    pub runtime_errors: usize,
}

impl RunSummary {
    pub fn error_count(&self) -> usize {
        self.parse_errors + self.static_errors + self.runtime_errors
    }

    pub fn succeeded(&self) -> bool {
        self.parsed && self.error_count() == 0
    }
}

/// Runs one source text. Print output and diagnostics both go to `out`, in
/// the order they happen.
pub fn run<W: Write>(
    source: &str,
    filename: Option<&str>,
    out: &mut W,
    options: RunOptions,
) -> io::Result<RunSummary> {
    let emit = |errors: Vec<PolyError>, out: &mut W| -> io::Result<usize> {
        for error in &errors {
            error.report(source, filename, options.style, out)?;
        }
        Ok(errors.len())
    };

    let mut summary = RunSummary {
        parsed: false,
        parse_errors: 0,
        static_errors: 0,
        runtime_errors: 0,
    };

    // Parsing
    let mut parser = Parser::new(source);
    let program = parser.parse();
    summary.parse_errors = emit(parser.take_diagnostics(), &mut *out)?;

    let Some(program) = program else {
        return Ok(summary);
    };
    summary.parsed = true;

    if options.mode == Mode::DumpAst {
        writeln!(out, "{:#?}", program)?;
        return Ok(summary);
    }
    if summary.parse_errors > 0 {
        return Ok(summary);
    }

    // Static checks
    let mut checker = StaticChecker::new();
    checker.check(&program);
    summary.static_errors = emit(checker.take_diagnostics(), &mut *out)?;

    if options.mode == Mode::Check {
        return Ok(summary);
    }

    // Evaluation, one statement at a time so diagnostics land next to the
    // output of the statement that caused them.
    let mut evaluator = Evaluator::new(&mut *out);
    for statement in program.statements() {
        evaluator.evaluate(statement)?;
        let errors = evaluator.take_diagnostics();
        summary.runtime_errors += emit(errors, &mut **evaluator.output())?;
    }

    tracing::debug!(?summary, "run finished");
    Ok(summary)
}

use crate::checker::StaticChecker;
use crate::error::{PolyError, ReportStyle};
use crate::evaluator::Evaluator;
use crate::parser::Parser;
use std::io::{self, BufRead, Write};

/// Line-at-a-time session. Bindings and the set of defined names persist
/// between lines.
pub fn start(style: ReportStyle) -> io::Result<()> {
    println!("polyc {}", env!("CARGO_PKG_VERSION"));
    println!("Type 'exit' or press Ctrl+D to quit");
    println!();

    let mut checker = StaticChecker::new();
    let mut evaluator = Evaluator::new(io::stdout());
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("> ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            // EOF reached (Ctrl+D or piped input ended)
            println!();
            break;
        };
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "exit" || line == "quit" {
            println!("Goodbye!");
            break;
        }

        run_repl_command(line, &mut checker, &mut evaluator, style)?;
    }

    Ok(())
}

fn run_repl_command<W: Write>(
    source: &str,
    checker: &mut StaticChecker,
    evaluator: &mut Evaluator<W>,
    style: ReportStyle,
) -> io::Result<()> {
    let mut parser = Parser::new(source);
    let program = parser.parse();
    let parse_errors = parser.take_diagnostics();
    if !parse_errors.is_empty() {
        return report(&parse_errors, source, style, evaluator.output());
    }
    let Some(program) = program else {
        return Ok(());
    };

    checker.check(&program);
    report(&checker.take_diagnostics(), source, style, evaluator.output())?;

    for statement in program.statements() {
        evaluator.evaluate(statement)?;
        let errors = evaluator.take_diagnostics();
        report(&errors, source, style, evaluator.output())?;
    }
    Ok(())
}

fn report<W: Write>(
    errors: &[PolyError],
    source: &str,
    style: ReportStyle,
    out: &mut W,
) -> io::Result<()> {
    for error in errors {
        error.report(source, None, style, out)?;
    }
    Ok(())
}

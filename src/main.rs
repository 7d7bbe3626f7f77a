use clap::{Arg, ArgAction, Command};
use polyc::{CliError, Mode, ReportStyle, RunOptions};
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    polyc::init_tracing();

    let matches = Command::new("polyc")
        .about("Interpreter for a small polynomial language")
        .arg(
            Arg::new("files")
                .help("The program to run; reads standard input when absent")
                .value_name("FILE")
                .num_args(0..)
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("interactive")
                .short('i')
                .long("interactive")
                .help("Start a line-at-a-time session")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("check")
                .long("check")
                .help("Parse and check the program without running it")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("dump-ast")
                .long("dump-ast")
                .help("Print the parsed tree instead of running it")
                .action(ArgAction::SetTrue)
                .conflicts_with("check"),
        )
        .arg(
            Arg::new("pretty")
                .long("pretty")
                .help("Show diagnostics as annotated source snippets")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let style = if matches.get_flag("pretty") {
        ReportStyle::Pretty
    } else {
        ReportStyle::Plain
    };

    if matches.get_flag("interactive") {
        return match polyc::start_repl(style) {
            Ok(()) => ExitCode::SUCCESS,
            Err(error) => {
                eprintln!("{}", CliError::Output(error));
                ExitCode::FAILURE
            }
        };
    }

    let mode = if matches.get_flag("check") {
        Mode::Check
    } else if matches.get_flag("dump-ast") {
        Mode::DumpAst
    } else {
        Mode::Run
    };

    let files: Vec<PathBuf> = matches
        .get_many::<String>("files")
        .map(|files| files.map(PathBuf::from).collect())
        .unwrap_or_default();

    match run(&files, RunOptions { mode, style }) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => {
            eprintln!("Program failed!");
            ExitCode::FAILURE
        }
        Err(error) => {
            eprintln!("{}", error);
            ExitCode::FAILURE
        }
    }
}

/// `Ok(false)` when the program itself failed.
fn run(files: &[PathBuf], options: RunOptions) -> Result<bool, CliError> {
    let (source, filename) = match files {
        [] => {
            let mut source = String::new();
            io::stdin()
                .read_to_string(&mut source)
                .map_err(CliError::Stdin)?;
            (source, None)
        }
        [path] => {
            let source = fs::read_to_string(path).map_err(|source| CliError::CouldNotOpen {
                path: path.clone(),
                source,
            })?;
            (source, Some(path.display().to_string()))
        }
        _ => return Err(CliError::TooManyFiles),
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let summary = polyc::run(&source, filename.as_deref(), &mut out, options)?;
    Ok(summary.succeeded())
}

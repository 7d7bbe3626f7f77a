// polyc: interpreter for a small polynomial language
//
// Programs are sequences of `set <name> <expr>;` and `print <expr>;`
// statements over integers, floats, strings and polynomials written as
// coefficient lists, e.g. `print {1, 0, -2}[3];`.

// Public modules
pub mod ast;
pub mod checker;
pub mod error;
pub mod evaluator;
pub mod lexer;
pub mod parser;
pub mod repl;
pub mod runner;
pub mod token_stream;
pub mod value;

use std::sync::Once;

// Re-export commonly used items
pub use ast::{BinaryOp, Node};
pub use checker::StaticChecker;
pub use error::{CliError, Diagnostics, ErrorKind, PolyError, ReportStyle, Span};
pub use evaluator::{Evaluator, SymbolTable};
pub use lexer::{LexError, Lexer, Token, TokenKind};
pub use parser::Parser;
pub use runner::{run, Mode, RunOptions, RunSummary};
pub use token_stream::TokenStream;
pub use value::{Value, ValueType};

// Re-export main functions
pub use repl::start as start_repl;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Safe to call more than once. Enable with `RUST_LOG=polyc=debug` or
/// `RUST_LOG=polyc=trace`.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        // Only initialize if RUST_LOG is set
        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
                .with(filter)
                .init();
        }
    });
}

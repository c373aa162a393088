// tinyj: parse a source file and dump the tables the front end built

use clap::Parser as _;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use tinyj::constants::{MAX_SCOPE_ENTRIES, MAX_SYMBOL_ENTRIES};
use tinyj::{Dialect, ParseOptions, Parser};

#[derive(clap::Parser)]
#[command(name = "tinyj")]
#[command(about = "One-pass tinyj front end: prints the AST, symbol, location and string tables")]
#[command(version)]
struct Cli {
    /// Source file to parse
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Entry grammar
    #[arg(short, long, value_enum, default_value_t = Dialect::Program)]
    dialect: Dialect,

    /// Symbol table capacity
    #[arg(long, default_value_t = MAX_SYMBOL_ENTRIES)]
    max_symbols: usize,

    /// Scope table capacity
    #[arg(long, default_value_t = MAX_SCOPE_ENTRIES)]
    max_scopes: usize,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let source = match fs::read_to_string(&cli.input) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error: cannot read '{}': {}", cli.input.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let options = ParseOptions::new()
        .with_dialect(cli.dialect)
        .with_max_symbols(cli.max_symbols)
        .with_max_scopes(cli.max_scopes);

    let mut parser = match Parser::new(&source, options) {
        Ok(parser) => parser,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let root = match parser.parse() {
        Ok(root) => root,
        Err(e) => {
            for diagnostic in parser.session().diagnostics.iter() {
                eprintln!("{}", diagnostic);
            }
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let session = parser.into_session();
    println!("{}\n", session.ast.render(root));
    println!("{}", session.symbols.display(&session.types));
    println!("{}", session.symbols.locations());
    println!("{}", session.strings);

    for diagnostic in session.diagnostics.iter() {
        eprintln!("{}", diagnostic);
    }
    if session.has_errors() {
        eprintln!("{} error(s)", session.diagnostics.len());
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

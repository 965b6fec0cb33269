//! Command-line front end for `expr-engine`: concatenates argv with no
//! separator, evaluates with a fresh empty context, and prints the result
//! or the error.

use clap::Parser;
use expr_engine::{evaluate, Context, Error};

#[derive(Parser)]
#[command(name = "expr-cli", about = "Evaluate a BASIC-flavored infix expression")]
struct Cli {
    /// Expression source, given as one or more argv words concatenated
    /// with no separator.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    words: Vec<String>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    if cli.words.is_empty() {
        eprintln!("usage: expr-cli <expression>");
        std::process::exit(1);
    }
    let source = cli.words.concat();

    let mut ctx = Context::new();
    match evaluate(&source, &mut ctx) {
        Ok(value) => {
            println!("{}", value.to_str());
            std::process::exit(0);
        }
        Err(Error::Syntax(err)) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
        Err(Error::Runtime(err)) => {
            let code = err.code.code();
            eprintln!("{code} - {err}");
            std::process::exit(code);
        }
    }
}

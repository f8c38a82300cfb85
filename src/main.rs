use std::process::ExitCode;

use clap::Parser;

use lucene_filter::clickhouse;
use lucene_filter::error::{self, QueryError};
use lucene_filter::logging::{self, LogLevel};
use lucene_filter::parser;
use lucene_filter::scanner;
use lucene_filter::schema::Schema;

#[derive(Parser)]
#[command(name = "lucene-filter")]
#[command(about = "Compiles a Lucene-style query into a ClickHouse filter expression")]
struct Cli {
    /// Query to compile, e.g. 'status:active AND age:>21'
    query: String,

    /// Print the parsed tree instead of the filter
    #[arg(long)]
    ast: bool,

    /// Print the token stream and stop
    #[arg(long)]
    tokens: bool,

    /// trace, debug, info, warn or error (default: $LUCENE_FILTER_LOG, then warn)
    #[arg(long)]
    log_level: Option<LogLevel>,

    /// Field name that matches against the whole row
    #[arg(long, default_value = "_source")]
    source_field: String,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = LogLevel::resolve(cli.log_level).unwrap_or_else(|err| {
        eprintln!("{}", err);
        LogLevel::default()
    });
    logging::init_logging(level);

    if cli.tokens {
        for token in scanner::scan_all(&cli.query) {
            println!("{:?} {:?} {:?}", token.variant, token.lexeme, token.span);
        }
        return ExitCode::SUCCESS
    }

    let schema = Schema { source_field: cli.source_field, ..Schema::default() };
    match run(&cli.query, schema, cli.ast, true) {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(_) => ExitCode::FAILURE,
    }
}

/// Parses `source` and renders it, or its tree when `ast` is set.
pub fn run(source: &str, schema: Schema, ast: bool, print_error: bool) -> Result<String, QueryError> {
    let result = parser::parse(source).and_then(|expr| {
        if ast {
            return Ok(format!("{:#?}", expr))
        }
        Ok(clickhouse::dialect(schema).render(&expr)?)
    });

    if print_error {
        if let Err(err) = &result {
            if error::print_error(source, err).is_err() {
                eprintln!("{}", err);
            }
        }
    }

    result
}

//! Compiles Lucene-style query strings into ClickHouse filter expressions.
//!
//! ```text
//! status:active AND age:>21
//! ```
//! becomes
//! ```text
//! (lowerUTF8(strings.value[indexOf(strings.name,'status')]) like lowerUTF8('active')) AND (numbers.value[indexOf(numbers.name,'age')] > 21)
//! ```

use std::sync::OnceLock;

pub mod clickhouse;
pub mod error;
pub mod expr;
pub mod logging;
pub mod parser;
pub mod render;
pub mod scanner;
pub mod schema;
pub mod token_type;
pub mod validate;

pub use error::QueryError;
pub use expr::Expr;
pub use render::Dialect;
pub use schema::Schema;

static CLICKHOUSE: OnceLock<Dialect> = OnceLock::new();

/// Parses and validates a query.
pub fn parse(source: &str) -> Result<Expr, QueryError> {
    parser::parse(source)
}

/// Renders a parsed query for ClickHouse with the default schema.
pub fn render(expr: &Expr) -> Result<String, QueryError> {
    let dialect = CLICKHOUSE.get_or_init(|| clickhouse::dialect(Schema::default()));
    Ok(dialect.render(expr)?)
}

/// `parse` followed by `render`.
pub fn to_filter(source: &str) -> Result<String, QueryError> {
    render(&parse(source)?)
}

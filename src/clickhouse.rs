//! ClickHouse render functions over the typed side-array layout described by `Schema`.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::RenderError;
use crate::expr::{Comparison, Operator};
use crate::render::{self, Dialect, Fragment, RenderFn, Shape, quote};
use crate::schema::{Family, Schema};

type SchemaFn = fn(&Schema, &Fragment, &Fragment) -> Result<String, RenderError>;

/// The ClickHouse dialect for `schema`. Boost and fuzzy stay unregistered.
pub fn dialect(schema: Schema) -> Dialect {
    let schema = Arc::new(schema);
    let bind = |render: SchemaFn| -> RenderFn {
        let schema = Arc::clone(&schema);
        Box::new(move |left: &Fragment, right: &Fragment| render(&schema, left, right))
    };

    let mut fns: HashMap<Operator, RenderFn> = HashMap::new();
    fns.insert(Operator::Literal, Box::new(literal));
    fns.insert(Operator::Equals, bind(equals));
    fns.insert(Operator::Like, bind(like));
    fns.insert(Operator::Regexp, bind(regexp));
    fns.insert(Operator::In, bind(is_in));
    fns.insert(Operator::Range, bind(range));
    fns.insert(Operator::Greater, bind(greater));
    fns.insert(Operator::GreaterEq, bind(greater_eq));
    fns.insert(Operator::Less, bind(less));
    fns.insert(Operator::LessEq, bind(less_eq));
    Dialect::new("clickhouse", fns)
}

fn literal(left: &Fragment, right: &Fragment) -> Result<String, RenderError> {
    if left.text.contains('\0') {
        return Err(RenderError::NullByte(left.text.clone()))
    }
    render::literal(left, right)
}

/// Plain values compare through `like` with `%` and `_` escaped, so only wildcards glob.
fn equals(schema: &Schema, left: &Fragment, right: &Fragment) -> Result<String, RenderError> {
    if is_source(schema, left) {
        return Ok(source_match(schema, &quote(&to_regex(&raw_text(right), false))))
    }
    match family_of(right) {
        Some(Family::Text) => Ok(format!(
            "{} like {}",
            schema.normalized(&schema.column(Family::Text, &left.text)),
            schema.normalized(&escape_like(&right.text)),
        )),
        Some(family) => Ok(format!("{} = {}", schema.column(family, &left.text), right.text)),
        None => Err(unsupported(left, right)),
    }
}

fn like(schema: &Schema, left: &Fragment, right: &Fragment) -> Result<String, RenderError> {
    if is_source(schema, left) {
        return Ok(source_match(schema, &quote(&to_regex(&raw_text(right), true))))
    }
    if !right.is_textual() {
        return Err(unsupported(left, right))
    }
    let pattern = escape_like(&right.text).replace('*', "%").replace('?', "_");
    Ok(format!(
        "{} like {}",
        schema.normalized(&schema.column(Family::Text, &left.text)),
        schema.normalized(&pattern),
    ))
}

fn regexp(schema: &Schema, left: &Fragment, right: &Fragment) -> Result<String, RenderError> {
    if is_source(schema, left) {
        return Ok(source_match(schema, &as_text(right)))
    }
    Ok(format!(
        "match({},{})",
        schema.normalized(&schema.column(Family::Text, &left.text)),
        schema.normalized(&as_text(right)),
    ))
}

/// Keyed off the first member. Mixed lists fall back to comparing text.
fn is_in(schema: &Schema, left: &Fragment, right: &Fragment) -> Result<String, RenderError> {
    reject_source(schema, left, Operator::In)?;
    let first = right.items.first().ok_or_else(|| RenderError::EmptyList(left.text.clone()))?;
    let family = family_of(first).ok_or_else(|| unsupported(left, first))?;
    if right.items.iter().all(|item| family_of(item) == Some(family)) {
        return Ok(format!("{} IN {}", schema.column(family, &left.text), right.text))
    }
    let members: Vec<String> = right.items.iter().map(as_text).collect();
    Ok(format!("{} IN ({})", schema.column(Family::Text, &left.text), members.join(", ")))
}

/// Integer bounds render as is, other numbers with two decimals, anything else as text.
/// `BETWEEN` is inclusive, so an exclusive text range renders the same as an inclusive one.
fn range(schema: &Schema, left: &Fragment, right: &Fragment) -> Result<String, RenderError> {
    reject_source(schema, left, Operator::Range)?;
    let inclusive = match right.shape {
        Shape::Range { inclusive } => inclusive,
        _ => return Err(RenderError::MalformedRange(right.text.clone())),
    };
    let [min, max] = right.items.as_slice() else {
        return Err(RenderError::MalformedRange(right.text.clone()))
    };
    let lower = (min.shape != Shape::Unbounded).then_some(min);
    let upper = (max.shape != Shape::Unbounded).then_some(max);
    let bounds = || lower.into_iter().chain(upper);

    if bounds().all(|b| b.shape == Shape::Integer) {
        let column = schema.column(Family::Numeric, &left.text);
        let text = |b: &Fragment| b.text.clone();
        return sides(left, &column, lower.map(text), upper.map(text), inclusive)
    }
    if bounds().all(Fragment::is_numeric) {
        let column = schema.column(Family::Numeric, &left.text);
        let lower = lower.map(two_decimals).transpose()?;
        let upper = upper.map(two_decimals).transpose()?;
        return sides(left, &column, lower, upper, inclusive)
    }
    let column = schema.column(Family::Text, &left.text);
    match (lower, upper) {
        (Some(min), Some(max)) => Ok(format!("{} BETWEEN {} AND {}", column, as_text(min), as_text(max))),
        _ => sides(left, &column, lower.map(as_text), upper.map(as_text), inclusive),
    }
}

fn greater(schema: &Schema, left: &Fragment, right: &Fragment) -> Result<String, RenderError> {
    compare(schema, Comparison::Greater, left, right)
}

fn greater_eq(schema: &Schema, left: &Fragment, right: &Fragment) -> Result<String, RenderError> {
    compare(schema, Comparison::GreaterEq, left, right)
}

fn less(schema: &Schema, left: &Fragment, right: &Fragment) -> Result<String, RenderError> {
    compare(schema, Comparison::Less, left, right)
}

fn less_eq(schema: &Schema, left: &Fragment, right: &Fragment) -> Result<String, RenderError> {
    compare(schema, Comparison::LessEq, left, right)
}

fn compare(schema: &Schema, op: Comparison, left: &Fragment, right: &Fragment) -> Result<String, RenderError> {
    reject_source(schema, left, op.operator())?;
    if !right.is_numeric() {
        return Err(RenderError::NonNumericComparison { field: left.text.clone(), value: right.text.clone() })
    }
    Ok(format!("{} {} {}", schema.column(Family::Numeric, &left.text), op.symbol(), right.text))
}

fn sides(
    left: &Fragment,
    column: &str,
    lower: Option<String>,
    upper: Option<String>,
    inclusive: bool,
) -> Result<String, RenderError> {
    let (ge, le) = if inclusive { (">=", "<=") } else { (">", "<") };
    match (lower, upper) {
        (Some(min), Some(max)) => Ok(format!("{column} {ge} {min} AND {column} {le} {max}")),
        (Some(min), None) => Ok(format!("{column} {ge} {min}")),
        (None, Some(max)) => Ok(format!("{column} {le} {max}")),
        (None, None) => Err(RenderError::UnboundedRange(left.text.clone())),
    }
}

fn two_decimals(bound: &Fragment) -> Result<String, RenderError> {
    bound
        .text
        .parse::<f64>()
        .map(|x| format!("{x:.2}"))
        .map_err(|_| RenderError::MalformedRange(bound.text.clone()))
}

fn family_of(fragment: &Fragment) -> Option<Family> {
    match fragment.shape {
        Shape::Integer | Shape::Float => Some(Family::Numeric),
        Shape::Boolean => Some(Family::Boolean),
        Shape::Text | Shape::Wild | Shape::Regexp => Some(Family::Text),
        _ => None,
    }
}

fn is_source(schema: &Schema, field: &Fragment) -> bool {
    field.text == quote(&schema.source_field)
}

fn reject_source(schema: &Schema, field: &Fragment, operator: Operator) -> Result<(), RenderError> {
    if is_source(schema, field) {
        return Err(RenderError::SourceField { field: field.text.clone(), operator })
    }
    Ok(())
}

/// `pattern` is a quoted regular expression matched against the whole row.
fn source_match(schema: &Schema, pattern: &str) -> String {
    format!("match({}, {})", schema.normalized(&schema.source_column), schema.normalized(pattern))
}

/// Regular expression matching `text` literally, or as a glob with `*` and `?` when `glob` is set.
fn to_regex(text: &str, glob: bool) -> String {
    let mut pattern = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '*' if glob => pattern.push_str(".*"),
            '?' if glob => pattern.push('.'),
            '\\' | '.' | '+' | '*' | '?' | '(' | ')' | '[' | ']' | '{' | '}' | '^' | '$' | '|' => {
                pattern.push('\\');
                pattern.push(c);
            }
            _ => pattern.push(c),
        }
    }
    pattern
}

/// The value before quoting: undoes `quote` on textual fragments.
fn raw_text(value: &Fragment) -> String {
    if !value.is_textual() {
        return value.text.clone()
    }
    let text = value.text.as_str();
    let inner = text.strip_prefix('\'').and_then(|t| t.strip_suffix('\'')).unwrap_or(text);
    inner.replace("''", "'").replace("\\\\", "\\")
}

/// Rendered value as a string literal; numbers and booleans get quoted.
fn as_text(value: &Fragment) -> String {
    if value.is_textual() {
        value.text.clone()
    } else {
        quote(&value.text)
    }
}

// works on quoted text: `\\` inside a string literal reaches LIKE as a single backslash
fn escape_like(text: &str) -> String {
    text.replace('\\', "\\\\").replace('%', "\\\\%").replace('_', "\\\\_")
}

fn unsupported(field: &Fragment, value: &Fragment) -> RenderError {
    RenderError::UnsupportedValue { field: field.text.clone(), value: value.text.clone() }
}

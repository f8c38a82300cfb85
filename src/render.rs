//! Bottom-up rendering of a validated tree into filter text.
//!
//! A `Dialect` maps every `Operator` to a render function taking the already rendered left and
//! right operands. Operands travel as `Fragment`s, which keep the type the parser gave a literal,
//! so a dialect can pick a column family without re-parsing text.

use std::collections::HashMap;

use strum::IntoEnumIterator;
use tracing::{debug, trace};

use crate::error::RenderError;
use crate::expr::{Bound, Expr, Literal, Operator};

/// What a rendered fragment stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Integer,
    Float,
    Boolean,
    Text,
    Wild,
    Regexp,
    /// `*` as a range bound.
    Unbounded,
    Range { inclusive: bool },
    List,
    /// Output of an operator: a predicate, a connective or a modifier.
    Clause,
    /// Unused right operand of a unary operator.
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub text: String,
    pub shape: Shape,
    /// Bounds of a range, members of a list.
    pub items: Vec<Fragment>,
}

impl Fragment {
    pub fn new(text: impl Into<String>, shape: Shape) -> Self {
        Fragment { text: text.into(), shape, items: Vec::new() }
    }

    pub fn empty() -> Self {
        Fragment::new("", Shape::Empty)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self.shape, Shape::Integer | Shape::Float)
    }

    pub fn is_textual(&self) -> bool {
        matches!(self.shape, Shape::Text | Shape::Wild | Shape::Regexp)
    }

    // clauses nested in a connective are parenthesized, plain literals are not
    fn grouped(self) -> Fragment {
        match self.shape {
            Shape::Clause => Fragment::new(format!("({})", self.text), Shape::Clause),
            _ => self,
        }
    }
}

/// Single quotes `text` as a SQL string literal. Backslashes are escaped and embedded quotes doubled.
pub fn quote(text: &str) -> String {
    format!("'{}'", text.replace('\\', "\\\\").replace('\'', "''"))
}

pub type RenderFn = Box<dyn Fn(&Fragment, &Fragment) -> Result<String, RenderError> + Send + Sync>;

/// A named table of render functions, fixed once built.
pub struct Dialect {
    name: &'static str,
    fns: HashMap<Operator, RenderFn>,
}

impl Dialect {
    /// Builds the table from `overrides`, falling back to the shared functions for the
    /// connectives, modifiers and literals. Operators left without a function are unsupported.
    pub fn new(name: &'static str, mut overrides: HashMap<Operator, RenderFn>) -> Self {
        let fns = Operator::iter()
            .filter_map(|op| overrides.remove(&op).or_else(|| shared(op)).map(|render| (op, render)))
            .collect();
        Dialect { name, fns }
    }

    #[cfg(test)]
    pub fn supports(&self, op: Operator) -> bool {
        self.fns.contains_key(&op)
    }

    pub fn render(&self, expr: &Expr) -> Result<String, RenderError> {
        debug!(dialect = self.name, expr = %expr, "rendering");
        Ok(self.fragment(expr)?.text)
    }

    fn apply(&self, op: Operator, left: &Fragment, right: &Fragment) -> Result<String, RenderError> {
        trace!(dialect = self.name, operator = %op, left = %left.text, right = %right.text, "dispatch");
        let render = self.fns.get(&op).ok_or(RenderError::UnsupportedOperator(op))?;
        render(left, right)
    }

    fn fragment(&self, expr: &Expr) -> Result<Fragment, RenderError> {
        match expr {
            Expr::Literal(literal) => self.leaf(literal_fragment(literal)),
            Expr::Wild(text) => self.leaf(Fragment::new(text.as_str(), Shape::Wild)),
            Expr::Regexp(text) => self.leaf(Fragment::new(text.as_str(), Shape::Regexp)),
            Expr::Equals { term, value, .. } => {
                let missing = RenderError::MissingOperand(Operator::Equals);
                let term = term.as_deref().ok_or(missing.clone())?;
                let value = value.as_deref().ok_or(missing)?;
                let op = match value {
                    Expr::Literal(_) => Operator::Equals,
                    Expr::Wild(_) => Operator::Like,
                    Expr::Regexp(_) => Operator::Regexp,
                    Expr::Range { .. } => Operator::Range,
                    Expr::List(_) => Operator::In,
                    Expr::Compare { op, .. } => op.operator(),
                    other => {
                        return Err(RenderError::UnsupportedValue { field: term.to_string(), value: other.to_string() })
                    }
                };
                let field = self.leaf(Fragment::new(term, Shape::Text))?;
                let value = self.fragment(value)?;
                self.clause(op, &field, &value)
            }
            Expr::And { left, right } => self.connective(Operator::And, left, right),
            Expr::Or { left, right } => self.connective(Operator::Or, left, right),
            Expr::Not(sub) => self.unary(Operator::Not, sub),
            Expr::Must(sub) => self.unary(Operator::Must, sub),
            Expr::MustNot(sub) => self.unary(Operator::MustNot, sub),
            Expr::Boost { expr, .. } => self.unary(Operator::Boost, expr),
            Expr::Fuzzy { expr, .. } => self.unary(Operator::Fuzzy, expr),
            Expr::Range { min, max, inclusive } => {
                let min = self.bound(min.as_ref())?;
                let max = self.bound(max.as_ref())?;
                let text = if *inclusive {
                    format!("[{}, {}]", min.text, max.text)
                } else {
                    format!("({}, {})", min.text, max.text)
                };
                Ok(Fragment { text, shape: Shape::Range { inclusive: *inclusive }, items: vec![min, max] })
            }
            Expr::Compare { op, value } => {
                let value = value.as_ref().ok_or(RenderError::MissingOperand(op.operator()))?;
                self.leaf(literal_fragment(value))
            }
            Expr::List(literals) => {
                let items = literals
                    .iter()
                    .map(|literal| self.leaf(literal_fragment(literal)))
                    .collect::<Result<Vec<_>, _>>()?;
                let joined: Vec<&str> = items.iter().map(|item| item.text.as_str()).collect();
                let members = Fragment { text: joined.join(", "), shape: Shape::List, items };
                let text = self.apply(Operator::List, &members, &Fragment::empty())?;
                Ok(Fragment { text, ..members })
            }
        }
    }

    fn leaf(&self, fragment: Fragment) -> Result<Fragment, RenderError> {
        let text = self.apply(Operator::Literal, &fragment, &Fragment::empty())?;
        Ok(Fragment { text, ..fragment })
    }

    fn bound(&self, bound: Option<&Bound>) -> Result<Fragment, RenderError> {
        match bound.ok_or(RenderError::MissingOperand(Operator::Range))? {
            Bound::Unbounded => Ok(Fragment::new("*", Shape::Unbounded)),
            Bound::Value(literal) => self.leaf(literal_fragment(literal)),
        }
    }

    fn operand(&self, op: Operator, slot: &Option<Box<Expr>>) -> Result<Fragment, RenderError> {
        let expr = slot.as_deref().ok_or(RenderError::MissingOperand(op))?;
        self.fragment(expr)
    }

    fn connective(&self, op: Operator, left: &Option<Box<Expr>>, right: &Option<Box<Expr>>) -> Result<Fragment, RenderError> {
        let left = self.operand(op, left)?.grouped();
        let right = self.operand(op, right)?.grouped();
        self.clause(op, &left, &right)
    }

    fn unary(&self, op: Operator, sub: &Option<Box<Expr>>) -> Result<Fragment, RenderError> {
        let sub = self.operand(op, sub)?;
        self.clause(op, &sub, &Fragment::empty())
    }

    fn clause(&self, op: Operator, left: &Fragment, right: &Fragment) -> Result<Fragment, RenderError> {
        Ok(Fragment::new(self.apply(op, left, right)?, Shape::Clause))
    }
}

/// Raw text of a literal, tagged with its parsed type. Quoting is left to the `Literal` function.
fn literal_fragment(literal: &Literal) -> Fragment {
    match literal {
        Literal::Integer(i) => Fragment::new(i.to_string(), Shape::Integer),
        Literal::Float(x) => Fragment::new(x.to_string(), Shape::Float),
        Literal::Boolean(b) => Fragment::new(b.to_string(), Shape::Boolean),
        Literal::Text(text) => Fragment::new(text.as_str(), Shape::Text),
    }
}

fn shared(op: Operator) -> Option<RenderFn> {
    let render: RenderFn = match op {
        Operator::Literal => Box::new(literal),
        Operator::And => Box::new(and),
        Operator::Or => Box::new(or),
        Operator::Not | Operator::MustNot => Box::new(not),
        Operator::Must => Box::new(pass),
        Operator::List => Box::new(list),
        _ => return None,
    };
    Some(render)
}

/// Quotes textual literals, emits numbers and booleans as they are.
pub fn literal(left: &Fragment, _: &Fragment) -> Result<String, RenderError> {
    if left.is_textual() {
        Ok(quote(&left.text))
    } else {
        Ok(left.text.clone())
    }
}

fn and(left: &Fragment, right: &Fragment) -> Result<String, RenderError> {
    Ok(format!("{} AND {}", left.text, right.text))
}

fn or(left: &Fragment, right: &Fragment) -> Result<String, RenderError> {
    Ok(format!("{} OR {}", left.text, right.text))
}

fn not(left: &Fragment, _: &Fragment) -> Result<String, RenderError> {
    Ok(format!("NOT({})", left.text))
}

fn pass(left: &Fragment, _: &Fragment) -> Result<String, RenderError> {
    Ok(left.text.clone())
}

fn list(left: &Fragment, _: &Fragment) -> Result<String, RenderError> {
    Ok(format!("({})", left.text))
}

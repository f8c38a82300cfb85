use std::fmt;

/// Every kind of node a dialect may be asked to render. Dialects register one render
/// function per operator; the walker looks them up by this key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display, strum_macros::EnumIter)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Operator {
    Literal,
    Equals,
    Like,
    Regexp,
    In,
    List,
    Greater,
    GreaterEq,
    Less,
    LessEq,
    Range,
    And,
    Or,
    Not,
    Must,
    MustNot,
    Boost,
    Fuzzy,
}

/// A literal value, typed when it is parsed. The type picks the column family at render time.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Text(String),
}

impl Literal {
    /// Types a bareword: integers first, then finite floats, then booleans, else text.
    pub fn classify(text: &str) -> Literal {
        if let Ok(i) = text.parse::<i64>() {
            return Literal::Integer(i)
        }
        if Self::looks_numeric(text) {
            if let Ok(f) = text.parse::<f64>() {
                if f.is_finite() {
                    return Literal::Float(f)
                }
            }
        }
        // single letters stay text: `e:f` compares against the string 'f'
        match text {
            "true" | "TRUE" | "True" => Literal::Boolean(true),
            "false" | "FALSE" | "False" => Literal::Boolean(false),
            _ => Literal::Text(text.to_string()),
        }
    }

    pub fn text(text: impl Into<String>) -> Literal {
        Literal::Text(text.into())
    }

    // keeps "inf", "NaN" and friends out of the float family
    fn looks_numeric(text: &str) -> bool {
        let digits = text.strip_prefix(['+', '-']).unwrap_or(text);
        digits.starts_with(|c: char| c.is_ascii_digit())
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Literal::Integer(i) => write!(f, "{}", i),
            Literal::Float(x) => write!(f, "{}", x),
            Literal::Boolean(b) => write!(f, "{}", b),
            Literal::Text(s) => write!(f, "{}", s),
        }
    }
}

/// One end of a range. `*` in the query means the side is open.
#[derive(Debug, Clone, PartialEq)]
pub enum Bound {
    Unbounded,
    Value(Literal),
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Bound::Unbounded => write!(f, "*"),
            Bound::Value(literal) => write!(f, "{}", literal),
        }
    }
}

/// `field:>10` and friends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Greater,
    GreaterEq,
    Less,
    LessEq,
}

impl Comparison {
    pub fn operator(self) -> Operator {
        match self {
            Comparison::Greater => Operator::Greater,
            Comparison::GreaterEq => Operator::GreaterEq,
            Comparison::Less => Operator::Less,
            Comparison::LessEq => Operator::LessEq,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Comparison::Greater => ">",
            Comparison::GreaterEq => ">=",
            Comparison::Less => "<",
            Comparison::LessEq => "<=",
        }
    }
}

type Slot = Option<Box<Expr>>;

/// The syntax tree. Slots are optional while the parser assembles a node through `insert`;
/// the validator guarantees they are filled before a tree is rendered.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),
    /// Literal holding the glob metacharacters `*` or `?`.
    Wild(String),
    /// Regular expression text without the delimiting slashes.
    Regexp(String),
    Equals {
        term: Option<String>,
        value: Slot,
        is_must: bool,
        is_must_not: bool,
    },
    And { left: Slot, right: Slot },
    Or { left: Slot, right: Slot },
    Not(Slot),
    Must(Slot),
    MustNot(Slot),
    Range {
        min: Option<Bound>,
        max: Option<Bound>,
        inclusive: bool,
    },
    Compare { op: Comparison, value: Option<Literal> },
    /// Parenthesized OR-chain of values on the right of a field, rendered as `IN`.
    List(Vec<Literal>),
    Boost { expr: Slot, power: f32 },
    Fuzzy { expr: Slot, distance: u32 },
}

impl Expr {
    pub fn lit(literal: Literal) -> Expr {
        Expr::Literal(literal)
    }

    pub fn text(text: impl Into<String>) -> Expr {
        Expr::Literal(Literal::text(text))
    }

    pub fn wild(text: impl Into<String>) -> Expr {
        Expr::Wild(text.into())
    }

    pub fn regexp(text: impl Into<String>) -> Expr {
        Expr::Regexp(text.into())
    }

    pub fn eq(term: impl Into<String>, value: Expr) -> Expr {
        Expr::Equals { term: Some(term.into()), value: Some(Box::new(value)), is_must: false, is_must_not: false }
    }

    /// An `Equals` waiting for its term and value, remembering a pending `+` or `-`.
    pub fn pending_equals(is_must: bool, is_must_not: bool) -> Expr {
        Expr::Equals { term: None, value: None, is_must, is_must_not }
    }

    pub fn and(left: Expr, right: Expr) -> Expr {
        Expr::And { left: Some(Box::new(left)), right: Some(Box::new(right)) }
    }

    pub fn or(left: Expr, right: Expr) -> Expr {
        Expr::Or { left: Some(Box::new(left)), right: Some(Box::new(right)) }
    }

    pub fn not(sub: Expr) -> Expr {
        Expr::Not(Some(Box::new(sub)))
    }

    pub fn must(sub: Expr) -> Expr {
        Expr::Must(Some(Box::new(sub)))
    }

    pub fn must_not(sub: Expr) -> Expr {
        Expr::MustNot(Some(Box::new(sub)))
    }

    pub fn range(min: Bound, max: Bound, inclusive: bool) -> Expr {
        Expr::Range { min: Some(min), max: Some(max), inclusive }
    }

    pub fn compare(op: Comparison, value: Literal) -> Expr {
        Expr::Compare { op, value: Some(value) }
    }

    pub fn boost(sub: Expr, power: f32) -> Expr {
        Expr::Boost { expr: Some(Box::new(sub)), power }
    }

    pub fn fuzzy(sub: Expr, distance: u32) -> Expr {
        Expr::Fuzzy { expr: Some(Box::new(sub)), distance }
    }

    pub fn operator(&self) -> Operator {
        match self {
            Expr::Literal(_) | Expr::Wild(_) | Expr::Regexp(_) => Operator::Literal,
            Expr::Equals { .. } => Operator::Equals,
            Expr::And { .. } => Operator::And,
            Expr::Or { .. } => Operator::Or,
            Expr::Not(_) => Operator::Not,
            Expr::Must(_) => Operator::Must,
            Expr::MustNot(_) => Operator::MustNot,
            Expr::Range { .. } => Operator::Range,
            Expr::Compare { op, .. } => op.operator(),
            Expr::List(_) => Operator::List,
            Expr::Boost { .. } => Operator::Boost,
            Expr::Fuzzy { .. } => Operator::Fuzzy,
        }
    }

    /// Accepts a newly parsed expression: fills the next empty slot of `self`, or, when `self`
    /// is already complete, joins both in an `And` (implicit conjunction).
    pub fn insert(self, e: Expr) -> Result<Expr, String> {
        match self {
            Expr::Literal(_) | Expr::Wild(_) | Expr::Regexp(_) => match e {
                pending @ Expr::Equals { term: None, .. } => pending.insert(self),
                other => Ok(Expr::and(self, other)),
            },
            Expr::Equals { term: None, value, is_must, is_must_not } => match e {
                Expr::Literal(literal) => Ok(Expr::Equals { term: Some(literal.to_string()), value, is_must, is_must_not }),
                other => Err(format!("an equals expression must have a literal as a term, found {}", other.operator())),
            },
            Expr::Equals { term: Some(term), value: None, is_must, is_must_not } => {
                let equals = Expr::Equals { term: Some(term), value: Some(Box::new(e)), is_must: false, is_must_not: false };
                // the modifier covers exactly this field/value pair
                if is_must {
                    Ok(Expr::must(equals))
                } else if is_must_not {
                    Ok(Expr::must_not(equals))
                } else {
                    Ok(equals)
                }
            }
            Expr::And { left: None, right } => Ok(Expr::And { left: Some(Box::new(e)), right }),
            Expr::And { left, right: None } => Ok(Expr::And { left, right: Some(Box::new(e)) }),
            Expr::Or { left: None, right } => Ok(Expr::Or { left: Some(Box::new(e)), right }),
            Expr::Or { left, right: None } => Ok(Expr::Or { left, right: Some(Box::new(e)) }),
            Expr::Not(None) => Ok(Expr::not(e)),
            Expr::Must(None) => Ok(Expr::must(e)),
            Expr::MustNot(None) => Ok(Expr::must_not(e)),
            Expr::Range { min: None, .. } => Err("a range needs a minimum before TO".to_string()),
            Expr::Range { min, max: None, inclusive } => {
                let max = match e {
                    Expr::Literal(literal) => Bound::Value(literal),
                    Expr::Wild(text) if text == "*" => Bound::Unbounded,
                    Expr::Wild(text) => Bound::Value(Literal::Text(text)),
                    other => return Err(format!("unable to use {} as the maximum of a range", other.operator())),
                };
                Ok(Expr::Range { min, max: Some(max), inclusive })
            }
            Expr::Compare { op, value: None } => match e {
                Expr::Literal(literal) => Ok(Expr::compare(op, literal)),
                other => Err(format!("unable to compare against {}", other.operator())),
            },
            Expr::List(mut items) => match e {
                Expr::Literal(literal) => {
                    items.push(literal);
                    Ok(Expr::List(items))
                }
                other => Ok(Expr::and(Expr::List(items), other)),
            },
            complete => Ok(Expr::and(complete, e)),
        }
    }

    /// The literals of a value group that is a pure OR-chain of plain literals, in order.
    pub fn value_list(&self) -> Option<Vec<Literal>> {
        match self {
            Expr::Literal(literal) => Some(vec![literal.clone()]),
            Expr::Or { left: Some(left), right: Some(right) } => {
                let mut items = left.value_list()?;
                items.extend(right.value_list()?);
                Some(items)
            }
            _ => None,
        }
    }

    /// Applies `term` to every value in a group: `a:(b AND c*)` becomes `a:b AND a:c*`.
    pub fn distribute(self, term: &str) -> Result<Expr, String> {
        let apply = |slot: Slot| -> Result<Slot, String> {
            slot.map(|sub| sub.distribute(term).map(Box::new)).transpose()
        };
        match self {
            value @ (Expr::Literal(_) | Expr::Wild(_) | Expr::Regexp(_)) => Ok(Expr::eq(term, value)),
            Expr::And { left, right } => Ok(Expr::And { left: apply(left)?, right: apply(right)? }),
            Expr::Or { left, right } => Ok(Expr::Or { left: apply(left)?, right: apply(right)? }),
            Expr::Not(sub) => Ok(Expr::Not(apply(sub)?)),
            Expr::Must(sub) => Ok(Expr::Must(apply(sub)?)),
            Expr::MustNot(sub) => Ok(Expr::MustNot(apply(sub)?)),
            Expr::Boost { expr, power } => Ok(Expr::Boost { expr: apply(expr)?, power }),
            Expr::Fuzzy { expr, distance } => Ok(Expr::Fuzzy { expr: apply(expr)?, distance }),
            other => Err(format!("a value group on field {} may only contain values, found {}", term, other.operator())),
        }
    }
}

struct SlotDisplay<'a>(&'a Slot);

impl fmt::Display for SlotDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.0 {
            Some(expr) => write!(f, "{}", expr),
            None => write!(f, "?"),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expr::Literal(literal) => write!(f, "{}", literal),
            Expr::Wild(text) => write!(f, "{}", text),
            Expr::Regexp(text) => write!(f, "/{}/", text),
            Expr::Equals { term, value, .. } => {
                write!(f, "{} = {}", term.as_deref().unwrap_or("?"), SlotDisplay(value))
            }
            Expr::And { left, right } => write!(f, "({}) AND ({})", SlotDisplay(left), SlotDisplay(right)),
            Expr::Or { left, right } => write!(f, "({}) OR ({})", SlotDisplay(left), SlotDisplay(right)),
            Expr::Not(sub) => write!(f, "NOT({})", SlotDisplay(sub)),
            Expr::Must(sub) => write!(f, "+{}", SlotDisplay(sub)),
            Expr::MustNot(sub) => write!(f, "-{}", SlotDisplay(sub)),
            Expr::Range { min, max, inclusive } => {
                let (open, close) = if *inclusive { ('[', ']') } else { ('{', '}') };
                let show = |b: &Option<Bound>| b.as_ref().map_or("?".to_string(), Bound::to_string);
                write!(f, "{}{} TO {}{}", open, show(min), show(max), close)
            }
            Expr::Compare { op, value } => match value {
                Some(value) => write!(f, "{}{}", op.symbol(), value),
                None => write!(f, "{}?", op.symbol()),
            },
            Expr::List(items) => {
                let items: Vec<String> = items.iter().map(Literal::to_string).collect();
                write!(f, "({})", items.join(" OR "))
            }
            Expr::Boost { expr, power } => write!(f, "Boost({}^{})", SlotDisplay(expr), power),
            Expr::Fuzzy { expr, distance } => write!(f, "Fuzzy({}~{})", SlotDisplay(expr), distance),
        }
    }
}

use crate::error::StructureError;
use crate::expr::{Expr, Operator};

/// Checks that every node of a parsed tree is complete and that `+`/`-` are not stacked.
/// Runs once after parsing; a tree that passes is renderable.
pub fn validate(expr: &Expr) -> Result<(), StructureError> {
    match expr {
        Expr::Literal(_) | Expr::Wild(_) | Expr::Regexp(_) => Ok(()),
        Expr::Equals { term, value, .. } => {
            let term_missing = term.as_deref().is_none_or(str::is_empty);
            match value {
                Some(value) if !term_missing => validate(value),
                _ => Err(incomplete(Operator::Equals, "operator must have both sides of the expression")),
            }
        }
        Expr::And { left: Some(left), right: Some(right) } | Expr::Or { left: Some(left), right: Some(right) } => {
            validate(left)?;
            validate(right)
        }
        Expr::And { .. } => Err(incomplete(Operator::And, "clause must have two sides")),
        Expr::Or { .. } => Err(incomplete(Operator::Or, "clause must have two sides")),
        Expr::Not(sub) => match sub {
            Some(sub) => validate(sub),
            None => Err(incomplete(Operator::Not, "expression must have a sub expression to negate")),
        },
        Expr::Must(sub) => modifier(Operator::Must, sub.as_deref()),
        Expr::MustNot(sub) => modifier(Operator::MustNot, sub.as_deref()),
        Expr::Range { min: Some(_), max: Some(_), .. } => Ok(()),
        Expr::Range { .. } => Err(incomplete(Operator::Range, "clause must have a min and a max")),
        Expr::Compare { op, value } => match value {
            Some(_) => Ok(()),
            None => Err(incomplete(op.operator(), "comparison must have a value")),
        },
        Expr::List(items) if items.is_empty() => Err(incomplete(Operator::List, "value list must not be empty")),
        Expr::List(_) => Ok(()),
        Expr::Boost { expr, .. } => match expr {
            Some(sub) => validate(sub),
            None => Err(incomplete(Operator::Boost, "expression must have a subexpression")),
        },
        Expr::Fuzzy { expr, .. } => match expr {
            Some(sub) => validate(sub),
            None => Err(incomplete(Operator::Fuzzy, "expression must have a subexpression")),
        },
    }
}

fn modifier(operator: Operator, sub: Option<&Expr>) -> Result<(), StructureError> {
    let sub = sub.ok_or_else(|| incomplete(operator, "expression must have a sub expression"))?;
    match sub {
        Expr::Must(_) | Expr::MustNot(_) => Err(StructureError::NestedModifier {
            outer: operator,
            inner: if operator == Operator::Must { Operator::MustNot } else { Operator::Must },
        }),
        _ => validate(sub),
    }
}

fn incomplete(operator: Operator, message: &'static str) -> StructureError {
    StructureError::Incomplete { operator, message }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{Bound, Comparison, Literal};

    #[test]
    fn test_valid_trees() {
        let cases = vec![
            Expr::text("a"),
            Expr::eq("a", Expr::text("b")),
            Expr::and(Expr::eq("a", Expr::wild("b*")), Expr::not(Expr::text("c"))),
            Expr::must_not(Expr::eq("a", Expr::range(Bound::Unbounded, Bound::Value(Literal::Integer(5)), true))),
            Expr::eq("a", Expr::List(vec![Literal::text("x")])),
            Expr::eq("a", Expr::compare(Comparison::Greater, Literal::Integer(1))),
            Expr::boost(Expr::fuzzy(Expr::text("a"), 1), 2.0),
        ];
        for case in cases {
            assert!(validate(&case).is_ok(), "Expected {} to be valid", case);
        }
    }

    #[test]
    fn test_incomplete_trees() {
        let cases = vec![
            (Expr::pending_equals(false, false), Operator::Equals),
            (Expr::Equals { term: Some(String::new()), value: Some(Box::new(Expr::text("b"))), is_must: false, is_must_not: false }, Operator::Equals),
            (Expr::And { left: Some(Box::new(Expr::text("a"))), right: None }, Operator::And),
            (Expr::Or { left: None, right: None }, Operator::Or),
            (Expr::Not(None), Operator::Not),
            (Expr::Must(None), Operator::Must),
            (Expr::MustNot(None), Operator::MustNot),
            (Expr::Range { min: Some(Bound::Unbounded), max: None, inclusive: true }, Operator::Range),
            (Expr::Compare { op: Comparison::Less, value: None }, Operator::Less),
            (Expr::eq("a", Expr::List(vec![])), Operator::List),
            (Expr::Boost { expr: None, power: 1.0 }, Operator::Boost),
            (Expr::Fuzzy { expr: None, distance: 1 }, Operator::Fuzzy),
        ];
        for (case, operator) in cases {
            match validate(&case) {
                Err(StructureError::Incomplete { operator: got, .. }) => assert_eq!(got, operator, "{}", case),
                other => panic!("Expected incomplete {} for {}, got {:?}", operator, case, other),
            }
        }
    }

    #[test]
    fn test_nested_modifiers() {
        let must_must_not = Expr::must(Expr::must_not(Expr::text("a")));
        assert_eq!(
            validate(&must_must_not),
            Err(StructureError::NestedModifier { outer: Operator::Must, inner: Operator::MustNot })
        );
        let must_not_must = Expr::must_not(Expr::must(Expr::text("a")));
        assert!(validate(&must_not_must).is_err());
        // a modifier below a connective is fine
        let spaced = Expr::must(Expr::and(Expr::must_not(Expr::text("a")), Expr::text("b")));
        assert!(validate(&spaced).is_ok());
    }

    #[test]
    fn test_error_is_found_deep_in_the_tree() {
        let deep = Expr::or(Expr::text("a"), Expr::and(Expr::text("b"), Expr::Not(None)));
        assert!(matches!(validate(&deep), Err(StructureError::Incomplete { operator: Operator::Not, .. })));
    }
}

/// A recursive descent parser for Lucene-style query strings.
///
/// Grammar, lowest precedence first:
///
/// or_group   -> and_group ( "OR" and_group )*
/// and_group  -> unary ( "AND"? unary )*
/// unary      -> "NOT" unary | ( "+" | "-" ) primary suffix* | primary suffix*
/// primary    -> field | LITERAL | QUOTED | REGEXP | "(" or_group ")"
/// field      -> ( LITERAL | QUOTED ) ( ":" | "=" ) value
/// value      -> LITERAL | QUOTED | REGEXP | comparison | range | "(" or_group ")"
/// comparison -> ( ">" | ">=" | "<" | "<=" ) ( LITERAL | QUOTED )
/// range      -> ( "[" | "{" ) bound "TO" bound ( "]" | "}" )
/// suffix     -> "^" NUMBER? | "~" NUMBER?
///
/// In value, bound, comparison and suffix position a `+`/`-` glued to a number is its sign.
///
/// Ex.: "status:active AND age:>21", "a:(foo OR bar) -b:[* TO 5}", "title:quick~2"

use tracing::debug;

use crate::error::{QueryError, StructureError};
use crate::expr::{Bound, Comparison, Expr, Literal as Lit};
use crate::scanner::{Scanner, Token};
use crate::token_type::TokenType::{self, *};
use crate::validate::validate;

/// Parses and validates `source`. Either a complete tree or the first error comes back.
pub fn parse(source: &str) -> Result<Expr, QueryError> {
    Parser::new(source).parse()
}

pub struct Parser<'a> {
    scanner: Scanner<'a>,
    tokens: Vec<Token>, // every token scanned so far, kept for lookahead and backtracking
    current: usize,
    depth: usize, // open parentheses
}

impl<'a> Parser<'a> {

    pub fn new(source: &'a str) -> Self {
        Parser {
            scanner: Scanner::new(source),
            tokens: Vec::new(),
            current: 0,
            depth: 0,
        }
    }

    pub fn parse(&mut self) -> Result<Expr, QueryError> {
        if self.check(End)? {
            return Err(self.error("empty query"))
        }

        let expr = self.or_group()?;

        let token = self.peek()?.clone();
        match token.variant {
            End => {},
            RightParen => return Err(self.error("unbalanced closing paren")),
            _ => return Err(self.error(format!("unexpected '{}'", token.lexeme))),
        }
        if self.depth != 0 {
            return Err(StructureError::UnbalancedGroup { depth: self.depth }.into())
        }

        validate(&expr)?;
        debug!(tree = %expr, "parsed query");
        Ok(expr)
    }

    /// Matches production: or_group -> and_group ( "OR" and_group )*
    fn or_group(&mut self) -> Result<Expr, QueryError> {
        let mut left = self.and_group()?;
        while self.match_token(&[Or])?.is_some() {
            if !self.peek()?.variant.starts_clause() {
                return Err(self.error("incomplete OR: expected an expression after OR"))
            }
            let right = self.and_group()?;
            left = Expr::or(left, right);
        }
        Ok(left)
    }

    /// Matches production: and_group -> unary ( "AND"? unary )*
    /// Two clauses side by side are joined as if AND stood between them.
    fn and_group(&mut self) -> Result<Expr, QueryError> {
        let mut left = self.unary()?;
        loop {
            if self.match_token(&[And])?.is_some() {
                if !self.peek()?.variant.starts_clause() {
                    return Err(self.error("incomplete AND: expected an expression after AND"))
                }
                let right = self.unary()?;
                left = Expr::and(left, right);
            } else if self.peek()?.variant.starts_clause() {
                let right = self.unary()?;
                left = left.insert(right).map_err(|m| self.error(m))?;
            } else {
                break
            }
        }
        Ok(left)
    }

    /// Matches production: unary -> "NOT" unary | ( "+" | "-" ) primary suffix* | primary suffix*
    fn unary(&mut self) -> Result<Expr, QueryError> {
        match self.peek()?.variant {
            Not => {
                self.advance()?;
                if !self.peek()?.variant.starts_clause() {
                    return Err(self.error("NOT must be followed by an expression"))
                }
                let sub = self.unary()?;
                Expr::Not(None).insert(sub).map_err(|m| self.error(m))
            }
            Plus => {
                self.advance()?;
                self.modified(true, false)
            }
            Minus => {
                self.advance()?;
                self.modified(false, true)
            }
            _ => {
                let primary = self.primary(false, false)?;
                self.suffixes(primary)
            }
        }
    }

    /// The clause after a `+` or `-`.
    fn modified(&mut self, is_must: bool, is_must_not: bool) -> Result<Expr, QueryError> {
        if matches!(self.peek()?.variant, Plus | Minus) {
            // stacked modifiers parse, the validator rejects them
            let inner = self.unary()?;
            return Ok(wrap_modifier(inner, is_must, is_must_not))
        }
        let primary = self.primary(is_must, is_must_not)?;
        self.suffixes(primary)
    }

    /// Matches production: primary -> field | LITERAL | QUOTED | REGEXP | "(" or_group ")"
    fn primary(&mut self, is_must: bool, is_must_not: bool) -> Result<Expr, QueryError> {
        let token = self.advance()?;
        let expr = match token.variant {
            Literal => {
                if self.check(Separator)? {
                    return self.field(token, is_must, is_must_not)
                }
                literal_expr(&token)
            }
            Quoted => {
                // "a b":c names a field with a space in it
                if self.check(Separator)? {
                    return self.field(token, is_must, is_must_not)
                }
                Expr::lit(Lit::Text(token.lexeme))
            }
            Regexp => Expr::Regexp(token.lexeme),
            LeftParen => match self.group()? {
                Some(expr) => expr,
                None => return Err(StructureError::EmptyGroup.into()),
            },
            Separator => return Err(error_at(&token, format!("invalid syntax: can't start expression with '{}'", token.lexeme))),
            RightParen if self.depth == 0 => return Err(error_at(&token, "unbalanced closing paren")),
            RightParen => return Err(error_at(&token, "expected an expression before ')'")),
            Caret | Tilde => return Err(error_at(&token, format!("'{}' must follow another expression", token.lexeme))),
            End => return Err(error_at(&token, "incomplete expression: unexpected end of input")),
            _ => return Err(error_at(&token, format!("unexpected '{}'", token.lexeme))),
        };
        Ok(wrap_modifier(expr, is_must, is_must_not))
    }

    /// Matches production: field -> ( LITERAL | QUOTED ) ( ":" | "=" ) value
    /// A pending `+`/`-` is handed to the `Equals` so it covers this pair only.
    fn field(&mut self, term: Token, is_must: bool, is_must_not: bool) -> Result<Expr, QueryError> {
        self.advance()?; // consume separator
        let equals = Expr::text(term.lexeme.clone())
            .insert(Expr::pending_equals(is_must, is_must_not))
            .map_err(|m| error_at(&term, m))?;

        let token = self.value_token()?;
        let value = match token.variant {
            Literal => literal_expr(&token),
            Quoted => Expr::lit(Lit::Text(token.lexeme.clone())),
            Regexp => Expr::Regexp(token.lexeme.clone()),
            Greater | GreaterEqual | Less | LessEqual => self.comparison(&token)?,
            LeftSquare => self.range(true)?,
            LeftCurly => self.range(false)?,
            LeftParen => match self.group()? {
                None => Expr::List(Vec::new()), // left for the validator to reject
                Some(group) => match group.value_list() {
                    Some(items) => Expr::List(items),
                    None => {
                        let distributed = group.distribute(&term.lexeme).map_err(|m| error_at(&token, m))?;
                        return Ok(wrap_modifier(distributed, is_must, is_must_not))
                    }
                },
            },
            End => return Err(error_at(&token, format!("incomplete field expression: expected a value after '{}'", term.lexeme))),
            _ => return Err(error_at(&token, format!("unexpected '{}' after field '{}'", token.lexeme, term.lexeme))),
        };

        equals.insert(value).map_err(|m| error_at(&token, m))
    }

    /// Parses the inside of a parenthesized group. The '(' is already consumed.
    /// Returns `None` for an empty group.
    fn group(&mut self) -> Result<Option<Expr>, QueryError> {
        self.depth += 1;
        if self.match_token(&[RightParen])?.is_some() {
            self.depth -= 1;
            return Ok(None)
        }

        let expr = self.or_group()?;

        let token = self.value_token()?;
        match token.variant {
            RightParen => {
                self.depth -= 1;
                Ok(Some(expr))
            }
            End => Err(StructureError::UnbalancedGroup { depth: self.depth }.into()),
            _ => Err(error_at(&token, format!("expected ')' but found '{}'", token.lexeme))),
        }
    }

    /// Matches production: comparison -> ( ">" | ">=" | "<" | "<=" ) ( LITERAL | QUOTED )
    fn comparison(&mut self, operator: &Token) -> Result<Expr, QueryError> {
        let op = match operator.variant {
            Greater => Comparison::Greater,
            GreaterEqual => Comparison::GreaterEq,
            Less => Comparison::Less,
            _ => Comparison::LessEq,
        };

        let token = self.value_token()?;
        let value = match token.variant {
            Literal if !token.wild => Lit::classify(&token.lexeme),
            Quoted => Lit::Text(token.lexeme.clone()),
            _ => return Err(error_at(&token, format!("'{}' must be followed by a value", operator.lexeme))),
        };
        Expr::Compare { op, value: None }
            .insert(Expr::lit(value))
            .map_err(|m| error_at(&token, m))
    }

    /// Matches production: range -> ( "[" | "{" ) bound "TO" bound ( "]" | "}" )
    /// The opening bracket is already consumed and decides inclusivity.
    fn range(&mut self, inclusive: bool) -> Result<Expr, QueryError> {
        let token = self.advance()?;
        let min = match token.variant {
            Literal => bound(&token),
            Quoted => Bound::Value(Lit::Text(token.lexeme)),
            _ => return Err(error_at(&token, "incomplete range: expected a lower bound")),
        };

        // no other reading exists between the bounds, so TO is accepted in any case
        let token = self.value_token()?;
        let is_to = token.variant == To || (token.variant == Literal && token.lexeme.eq_ignore_ascii_case("to"));
        if !is_to {
            return Err(error_at(&token, "the TO keyword must follow the lower bound of a range"))
        }

        let token = self.advance()?;
        let max = match token.variant {
            Literal => literal_expr(&token),
            Quoted => Expr::lit(Lit::Text(token.lexeme.clone())),
            _ => return Err(error_at(&token, "incomplete range: expected an upper bound")),
        };
        let range = Expr::Range { min: Some(min), max: None, inclusive }
            .insert(max)
            .map_err(|m| error_at(&token, m))?;

        let token = self.advance()?;
        match (inclusive, token.variant) {
            (true, RightSquare) | (false, RightCurly) => Ok(range),
            (true, RightCurly) => Err(error_at(&token, "range opened with '[' must close with ']'")),
            (false, RightSquare) => Err(error_at(&token, "range opened with '{' must close with '}'")),
            _ => Err(error_at(&token, "unterminated range: expected ']' or '}'")),
        }
    }

    /// Matches production: suffix -> "^" NUMBER? | "~" NUMBER?
    fn suffixes(&mut self, mut expr: Expr) -> Result<Expr, QueryError> {
        loop {
            if self.match_token(&[Caret])?.is_some() {
                let power = match self.suffix_number()? {
                    None => 1.0,
                    Some((_, Lit::Integer(i))) if i > 0 => i as f32,
                    Some((_, Lit::Float(f))) if f > 0.0 => f as f32,
                    Some((token, _)) => return Err(error_at(&token, "term boost must be followed by a positive number")),
                };
                expr = Expr::boost(expr, power);
            } else if self.match_token(&[Tilde])?.is_some() {
                let distance = match self.suffix_number()? {
                    None => 1,
                    Some((token, Lit::Integer(i))) => match u32::try_from(i) {
                        Ok(d) if d > 0 => d,
                        _ => return Err(error_at(&token, "fuzzy distance must be a positive integer")),
                    },
                    Some((token, _)) => return Err(error_at(&token, "fuzzy distance must be a positive integer")),
                };
                expr = Expr::fuzzy(expr, distance);
            } else {
                return Ok(expr)
            }
        }
    }

    /// Takes the number after `^` or `~`. Anything else is put back, it starts the next clause.
    fn suffix_number(&mut self) -> Result<Option<(Token, Lit)>, QueryError> {
        let mark = self.current;
        let token = self.value_token()?;
        if token.variant == Literal {
            let literal = Lit::classify(&token.lexeme);
            if matches!(literal, Lit::Integer(_) | Lit::Float(_)) {
                return Ok(Some((token, literal)))
            }
        }
        self.current = mark;
        Ok(None)
    }

    /// Takes the next token in value position, folding a sign written directly in front of a
    /// number into it: `b:<=-20`. At the start of a clause `+`/`-` stay modifiers.
    fn value_token(&mut self) -> Result<Token, QueryError> {
        let sign = self.advance()?;
        if !matches!(sign.variant, Plus | Minus) {
            return Ok(sign)
        }
        let next = self.peek()?;
        let signed_number = next.variant == Literal
            && next.span.start == sign.span.end
            && next.lexeme.starts_with(|c: char| c.is_ascii_digit());
        if !signed_number {
            return Ok(sign)
        }
        let number = self.advance()?;
        Ok(Token {
            variant: Literal,
            lexeme: format!("{}{}", sign.lexeme, number.lexeme),
            span: sign.span.start..number.span.end,
            wild: number.wild,
        })
    }

    /// Scans until the buffer holds the current token. Lex errors surface here.
    fn fill(&mut self) -> Result<(), QueryError> {
        while self.current >= self.tokens.len() {
            let token = self.scanner.next_token();
            if token.variant == Error {
                return Err(QueryError::lex(token.lexeme, token.span))
            }
            self.tokens.push(token);
        }
        Ok(())
    }

    fn peek(&mut self) -> Result<&Token, QueryError> {
        self.fill()?;
        Ok(&self.tokens[self.current])
    }

    /// Returns the current token and moves past it. The end token is never moved past.
    fn advance(&mut self) -> Result<Token, QueryError> {
        let token = self.peek()?.clone();
        if token.variant != End {
            self.current += 1;
        }
        Ok(token)
    }

    fn check(&mut self, token_type: TokenType) -> Result<bool, QueryError> {
        Ok(self.peek()?.variant == token_type)
    }

    fn match_token(&mut self, token_types: &[TokenType]) -> Result<Option<Token>, QueryError> {
        for token_type in token_types {
            if self.check(*token_type)? {
                return self.advance().map(Some)
            }
        }
        Ok(None)
    }

    /// Creates a syntax error pointing at the current token.
    fn error(&self, message: impl Into<String>) -> QueryError {
        let span = self.tokens
            .get(self.current)
            .or(self.tokens.last())
            .map_or(0..0, |token| token.span.clone());
        QueryError::syntax(message, span)
    }
}

fn error_at(token: &Token, message: impl Into<String>) -> QueryError {
    QueryError::syntax(message, token.span.clone())
}

/// Digits make an integer, an unescaped `*` or `?` a wildcard, anything else a typed literal.
fn literal_expr(token: &Token) -> Expr {
    if token.wild {
        Expr::Wild(token.lexeme.clone())
    } else {
        Expr::lit(Lit::classify(&token.lexeme))
    }
}

fn bound(token: &Token) -> Bound {
    match literal_expr(token) {
        Expr::Wild(text) if text == "*" => Bound::Unbounded,
        Expr::Literal(literal) => Bound::Value(literal),
        _ => Bound::Value(Lit::Text(token.lexeme.clone())),
    }
}

fn wrap_modifier(expr: Expr, is_must: bool, is_must_not: bool) -> Expr {
    if is_must {
        Expr::must(expr)
    } else if is_must_not {
        Expr::must_not(expr)
    } else {
        expr
    }
}

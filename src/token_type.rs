#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum TokenType {
    LeftParen, RightParen, // ()
    LeftSquare, RightSquare, // []
    LeftCurly, RightCurly, // {}
    Separator, // ':' or '='
    Greater, GreaterEqual,
    Less, LessEqual,
    And, Or, Not, To,
    Plus, Minus, // must, must not
    Caret, Tilde, // boost, fuzzy
    Literal,
    Quoted,
    Regexp,
    Error,
    End,
}

impl TokenType {
    /// True for tokens that may begin a unary expression.
    pub fn starts_clause(self) -> bool {
        matches!(
            self,
            TokenType::Literal
                | TokenType::Quoted
                | TokenType::Regexp
                | TokenType::LeftParen
                | TokenType::Not
                | TokenType::Plus
                | TokenType::Minus
        )
    }
}

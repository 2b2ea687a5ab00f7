use super::Value;
use std::fmt;

/// A parsed visibility condition.
///
/// The grammar is flat: a condition is either a single operand or
/// one comparison between two operands. There is no nesting, no logical
/// connectives and no arithmetic.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    // Equality
    Equal(Box<Expression>, Box<Expression>),
    NotEqual(Box<Expression>, Box<Expression>),

    // Ordering
    GreaterThan(Box<Expression>, Box<Expression>),
    GreaterThanOrEqual(Box<Expression>, Box<Expression>),
    SmallerThan(Box<Expression>, Box<Expression>),
    SmallerThanOrEqual(Box<Expression>, Box<Expression>),

    // Leaf nodes
    Literal(Value),
    /// A bare word that is neither a number nor a keyword.
    Identifier(String),
}

/// The comparison operators understood by the condition grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    StrictEqual,
    StrictNotEqual,
    GreaterThan,
    GreaterThanOrEqual,
    SmallerThan,
    SmallerThanOrEqual,
}

impl Comparison {
    pub fn symbol(self) -> &'static str {
        match self {
            Comparison::StrictEqual => "===",
            Comparison::StrictNotEqual => "!==",
            Comparison::GreaterThan => ">",
            Comparison::GreaterThanOrEqual => ">=",
            Comparison::SmallerThan => "<",
            Comparison::SmallerThanOrEqual => "<=",
        }
    }

    pub fn is_equality(self) -> bool {
        matches!(self, Comparison::StrictEqual | Comparison::StrictNotEqual)
    }

    /// Builds the expression node for `left <op> right`.
    pub fn apply(self, left: Expression, right: Expression) -> Expression {
        let (l, r) = (Box::new(left), Box::new(right));
        match self {
            Comparison::StrictEqual => Expression::Equal(l, r),
            Comparison::StrictNotEqual => Expression::NotEqual(l, r),
            Comparison::GreaterThan => Expression::GreaterThan(l, r),
            Comparison::GreaterThanOrEqual => Expression::GreaterThanOrEqual(l, r),
            Comparison::SmallerThan => Expression::SmallerThan(l, r),
            Comparison::SmallerThanOrEqual => Expression::SmallerThanOrEqual(l, r),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Equal(l, r) => write!(f, "{} === {}", l, r),
            Expression::NotEqual(l, r) => write!(f, "{} !== {}", l, r),
            Expression::GreaterThan(l, r) => write!(f, "{} > {}", l, r),
            Expression::GreaterThanOrEqual(l, r) => write!(f, "{} >= {}", l, r),
            Expression::SmallerThan(l, r) => write!(f, "{} < {}", l, r),
            Expression::SmallerThanOrEqual(l, r) => write!(f, "{} <= {}", l, r),
            Expression::Literal(v) => write!(f, "{}", v),
            Expression::Identifier(name) => write!(f, "{}", name),
        }
    }
}

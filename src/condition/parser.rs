use crate::ast::{Comparison, Expression, Value, parse_number};
use crate::error::ConditionError;
use crate::scope::Scope;
use crate::template::{has_placeholder, resolve_template};

/// Lexical tokens of the condition grammar.
#[derive(Debug, Clone, PartialEq)]
enum Token {
    Str(String),
    Number(f64),
    Word(String),
    Op(Comparison),
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Str(s) => format!("\"{}\"", s),
            Token::Number(n) => Value::Number(*n).to_string(),
            Token::Word(w) => w.clone(),
            Token::Op(op) => op.symbol().to_string(),
        }
    }
}

const EQUALITY: [(&str, Comparison); 2] = [
    ("===", Comparison::StrictEqual),
    ("!==", Comparison::StrictNotEqual),
];

// Two-character operators must be tried before their one-character prefixes.
const ORDERING: [(&str, Comparison); 4] = [
    (">=", Comparison::GreaterThanOrEqual),
    ("<=", Comparison::SmallerThanOrEqual),
    (">", Comparison::GreaterThan),
    ("<", Comparison::SmallerThan),
];

// Loose equality is not part of the grammar.
const LOOSE: [(&str, Comparison); 2] = [
    ("==", Comparison::StrictEqual),
    ("!=", Comparison::StrictNotEqual),
];

/// Result of scanning condition text for an operator outside quotes.
enum Scan {
    Operator(usize, Comparison),
    Unterminated,
    Clean,
}

/// Locates the comparison operator of a condition, ignoring quoted text.
///
/// Equality operators take precedence: if the text holds `===` or `!==`
/// anywhere, that occurrence is the split point even if an ordering operator
/// appears earlier.
pub fn find_operator(text: &str) -> Option<(usize, Comparison)> {
    match scan_for(text, &EQUALITY) {
        Scan::Operator(offset, op) => Some((offset, op)),
        _ => match scan_for(text, &ORDERING) {
            Scan::Operator(offset, op) => Some((offset, op)),
            _ => None,
        },
    }
}

/// Offset of a `==` or `!=` outside quoted text, when no strict operator is present.
pub fn find_loose_equality(text: &str) -> Option<usize> {
    match scan_for(text, &LOOSE) {
        Scan::Operator(offset, _) => Some(offset),
        _ => None,
    }
}

/// True when a quote opened in `text` is never closed.
pub fn has_unterminated_quote(text: &str) -> bool {
    matches!(scan_for(text, &[]), Scan::Unterminated)
}

fn scan_for(text: &str, operators: &[(&str, Comparison)]) -> Scan {
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (offset, c) in text.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        if c == '"' || c == '\'' {
            quote = Some(c);
            continue;
        }
        let rest = &text[offset..];
        if let Some((_, op)) = operators.iter().find(|(sym, _)| rest.starts_with(sym)) {
            return Scan::Operator(offset, *op);
        }
    }
    if quote.is_some() {
        Scan::Unterminated
    } else {
        Scan::Clean
    }
}

/// One side of a comparison.
enum Operand {
    /// Authored text without placeholders, read by the operand grammar.
    Authored(String),
    /// A quoted operand with placeholders; the authored quotes are stripped.
    Quoted(String),
    /// Substituted text with no authored quotes around it.
    Substituted(String),
}

impl Operand {
    fn read(raw: &str, scope: &Scope) -> Self {
        let trimmed = raw.trim();
        if !has_placeholder(trimmed) {
            Operand::Authored(trimmed.to_string())
        } else if is_quoted(trimmed) {
            Operand::Quoted(resolve_template(&trimmed[1..trimmed.len() - 1], scope))
        } else {
            Operand::Substituted(resolve_template(trimmed, scope).trim().to_string())
        }
    }

    /// Text that reads as a string when compared for equality against a string literal.
    fn bare_text(&self) -> Option<&str> {
        match self {
            Operand::Authored(text) if !is_quoted(text) && parse_number(text).is_none() => {
                Some(text.as_str())
            }
            Operand::Substituted(text) if parse_number(text).is_none() => Some(text.as_str()),
            _ => None,
        }
    }

    fn into_expression(self) -> Result<Expression, ConditionError> {
        match self {
            Operand::Authored(text) => parse_operand(&text),
            Operand::Quoted(text) => Ok(Expression::Literal(Value::Str(text))),
            Operand::Substituted(text) => Ok(substituted_literal(text)),
        }
    }
}

/// Substituted data is never tokenized: quotes and operators inside it are content.
fn substituted_literal(text: String) -> Expression {
    if let Some(n) = parse_number(&text) {
        return Expression::Literal(Value::Number(n));
    }
    let keyword = match text.as_str() {
        "true" => Some(Value::Bool(true)),
        "false" => Some(Value::Bool(false)),
        "null" => Some(Value::Null),
        "undefined" => Some(Value::Undefined),
        _ => None,
    };
    Expression::Literal(keyword.unwrap_or(Value::Str(text)))
}

fn split_at_operator(text: &str) -> Result<(&str, Comparison, &str), ConditionError> {
    let (offset, op) = find_operator(text).ok_or_else(|| ConditionError::UnexpectedToken {
        text: text.to_string(),
        found: "end of input".to_string(),
        expected: "a comparison operator".to_string(),
    })?;
    Ok((&text[..offset], op, &text[offset + op.symbol().len()..]))
}

fn build(op: Comparison, left: Operand, right: Operand) -> Result<Expression, ConditionError> {
    let right = right.into_expression()?;
    // A bare left side compared against a string literal is itself a string.
    let as_string = left
        .bare_text()
        .filter(|_| op.is_equality() && matches!(right, Expression::Literal(Value::Str(_))))
        .map(str::to_string);
    let left = match as_string {
        Some(text) => Expression::Literal(Value::Str(text)),
        None => left.into_expression()?,
    };
    Ok(op.apply(left, right))
}

/// Parses a resolved condition of the form `left <op> right`.
pub fn parse_condition(text: &str) -> Result<Expression, ConditionError> {
    let (left, op, right) = split_at_operator(text)?;
    build(
        op,
        Operand::Authored(left.trim().to_string()),
        Operand::Authored(right.trim().to_string()),
    )
}

/// Parses an unresolved condition, substituting placeholders per operand.
///
/// The operator is located in the authored text, so quotes or operators that
/// arrive through scope data cannot move the split point.
pub fn parse_template_condition(
    expression: &str,
    scope: &Scope,
) -> Result<Expression, ConditionError> {
    let (left, op, right) = split_at_operator(expression)?;
    build(op, Operand::read(left, scope), Operand::read(right, scope))
}

/// Parses text that must contain exactly one operand.
fn parse_operand(text: &str) -> Result<Expression, ConditionError> {
    let mut tokens = tokenize(text)?.into_iter();
    let first = tokens.next().ok_or_else(|| ConditionError::UnexpectedToken {
        text: text.to_string(),
        found: "end of input".to_string(),
        expected: "an operand".to_string(),
    })?;
    if let Some(extra) = tokens.next() {
        return Err(ConditionError::UnexpectedToken {
            text: text.to_string(),
            found: extra.describe(),
            expected: "end of input".to_string(),
        });
    }

    match first {
        Token::Str(s) => Ok(Expression::Literal(Value::Str(s))),
        Token::Number(n) => Ok(Expression::Literal(Value::Number(n))),
        Token::Word(word) => Ok(match word.as_str() {
            "true" => Expression::Literal(Value::Bool(true)),
            "false" => Expression::Literal(Value::Bool(false)),
            "null" => Expression::Literal(Value::Null),
            "undefined" => Expression::Literal(Value::Undefined),
            _ => Expression::Identifier(word),
        }),
        op @ Token::Op(_) => Err(ConditionError::UnexpectedToken {
            text: text.to_string(),
            found: op.describe(),
            expected: "an operand".to_string(),
        }),
    }
}

fn is_quoted(text: &str) -> bool {
    let t = text.trim();
    t.len() >= 2
        && ((t.starts_with('"') && t.ends_with('"')) || (t.starts_with('\'') && t.ends_with('\'')))
}

fn is_operator_char(c: char) -> bool {
    matches!(c, '=' | '!' | '<' | '>')
}

fn tokenize(text: &str) -> Result<Vec<Token>, ConditionError> {
    let mut tokens = Vec::new();
    let mut chars = text.char_indices().peekable();

    while let Some(&(offset, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else if c == '"' || c == '\'' {
            chars.next();
            tokens.push(Token::Str(read_string(text, c, &mut chars)?));
        } else if is_operator_char(c) {
            let rest = &text[offset..];
            let (symbol, op) = EQUALITY
                .iter()
                .chain(ORDERING.iter())
                .find(|(sym, _)| rest.starts_with(sym))
                .ok_or_else(|| ConditionError::UnexpectedCharacter {
                    text: text.to_string(),
                    found: c,
                    offset,
                })?;
            for _ in 0..symbol.len() {
                chars.next();
            }
            tokens.push(Token::Op(*op));
        } else {
            let mut word = String::new();
            while let Some(&(_, c)) = chars.peek() {
                if c.is_whitespace() || c == '"' || c == '\'' || is_operator_char(c) {
                    break;
                }
                word.push(c);
                chars.next();
            }
            tokens.push(match parse_number(&word) {
                Some(n) => Token::Number(n),
                None => Token::Word(word),
            });
        }
    }
    Ok(tokens)
}

fn read_string(
    text: &str,
    quote: char,
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
) -> Result<String, ConditionError> {
    let mut value = String::new();
    while let Some((_, c)) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some((_, 'n')) => value.push('\n'),
                Some((_, 't')) => value.push('\t'),
                Some((_, escaped)) => value.push(escaped),
                None => break,
            },
            c if c == quote => return Ok(value),
            c => value.push(c),
        }
    }
    Err(ConditionError::UnterminatedString(text.to_string()))
}

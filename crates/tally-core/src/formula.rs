//! # Formula Module
//!
//! The arithmetic micro-language operators type into numeric fields.
//!
//! ## Evaluation Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  raw "=12*3 + (4/2)"                                                    │
//! │       │                                                                 │
//! │       ▼  starts with '=' after trim?  ── no ──► return raw unchanged    │
//! │       │                                                                 │
//! │       ▼  filter: keep 0-9 + - * / ( ) . and spaces                      │
//! │  "12*3 + (4/2)"                                                         │
//! │       │                                                                 │
//! │       ▼  empty / whitespace only?      ── yes ─► return raw unchanged   │
//! │       │                                                                 │
//! │       ▼  tokenize + recursive descent                                   │
//! │  38.0                                                                   │
//! │       │                                                                 │
//! │       ▼  parse error or non-finite?    ── yes ─► return raw unchanged   │
//! │       │                                                                 │
//! │       ▼  round to cents, minimal form                                   │
//! │  "38"                                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The character filter is the security boundary: after filtering no
//! identifier or call can be expressed, only numbers, the four operators and
//! parentheses.
//!
//! ## Grammar
//! ```text
//! expr   := term   (('+' | '-') term)*
//! term   := factor (('*' | '/') factor)*
//! factor := ('+' | '-') factor | NUMBER | '(' expr ')'
//! ```
//!
//! ## Usage
//! ```rust
//! use tally_core::formula::evaluate;
//!
//! assert_eq!(evaluate("=2+2*3"), "8");
//! assert_eq!(evaluate("=7/2"), "3.5");
//! assert_eq!(evaluate("=10/0"), "=10/0");
//! assert_eq!(evaluate("plain"), "plain");
//! ```

use thiserror::Error;
use tracing::debug;

use crate::amount::{format_amount, round_to_cents};
use crate::value::FORMULA_PREFIX;

/// Evaluates a field's text on commit.
///
/// Text that is not a formula passes through unchanged, so this can be
/// called unconditionally whenever a field loses focus. A formula that
/// cannot be evaluated to a finite number also comes back unchanged.
pub fn evaluate(raw: &str) -> String {
    let trimmed = raw.trim();
    let Some(body) = trimmed.strip_prefix(FORMULA_PREFIX) else {
        return raw.to_string();
    };

    let filtered = filter_expression(body);
    if filtered.trim().is_empty() {
        debug!(raw, "formula empty after filtering, keeping raw text");
        return raw.to_string();
    }

    match evaluate_expression(&filtered) {
        Ok(value) => {
            // Scaling to cents can overflow near f64::MAX.
            let rounded = round_to_cents(value);
            if rounded.is_finite() {
                format_amount(rounded)
            } else {
                debug!(raw, %value, "formula result is not finite, keeping raw text");
                raw.to_string()
            }
        }
        Err(err) => {
            debug!(raw, %err, "formula failed to parse, keeping raw text");
            raw.to_string()
        }
    }
}

/// Keeps only the characters the micro-language allows.
pub fn filter_expression(body: &str) -> String {
    body.chars()
        .filter(|c| {
            c.is_ascii_digit() || matches!(c, '+' | '-' | '*' | '/' | '(' | ')' | '.' | ' ')
        })
        .collect()
}

/// Evaluates an already-filtered arithmetic expression.
///
/// Division by zero is not an error here: it yields an infinite or `NaN`
/// result that [`evaluate`] rejects.
pub fn evaluate_expression(expr: &str) -> Result<f64, FormulaError> {
    let tokens = tokenize(expr)?;
    let mut parser = Parser {
        tokens: &tokens,
        pos: 0,
        depth: 0,
    };
    let value = parser.expr()?;
    if parser.pos != tokens.len() {
        return Err(FormulaError::TrailingInput { position: parser.pos });
    }
    Ok(value)
}

// =============================================================================
// Errors
// =============================================================================

/// Deepest nesting of parentheses and unary signs the parser accepts.
pub const MAX_NESTING_DEPTH: usize = 64;

/// Why a filtered expression could not be evaluated.
///
/// Never surfaced to the operator; [`evaluate`] turns every variant into a
/// raw-text fallback.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormulaError {
    /// A run of digits and dots that is not a number (e.g. `1.2.3`, `.`).
    #[error("malformed number literal '{0}'")]
    BadNumber(String),

    /// The expression ended where an operand was expected.
    #[error("expression ended unexpectedly")]
    UnexpectedEnd,

    /// A token appeared where an operand was expected.
    #[error("unexpected token at position {position}")]
    UnexpectedToken { position: usize },

    /// Tokens remain after a complete expression (e.g. `1 2`, `2(3)`).
    #[error("trailing input at position {position}")]
    TrailingInput { position: usize },

    /// A character outside the micro-language reached the tokenizer.
    #[error("invalid character '{0}'")]
    InvalidChar(char),

    /// Parentheses or unary signs nest deeper than [`MAX_NESTING_DEPTH`].
    #[error("expression nests deeper than {max} levels")]
    TooDeep { max: usize },
}

// =============================================================================
// Tokenizer
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Number(f64),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

fn tokenize(expr: &str) -> Result<Vec<Token>, FormulaError> {
    let mut tokens = Vec::new();
    let mut chars = expr.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            ' ' => {
                chars.next();
            }
            '0'..='9' | '.' => {
                let mut literal = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_digit() || d == '.' {
                        literal.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let value = literal
                    .parse::<f64>()
                    .map_err(|_| FormulaError::BadNumber(literal.clone()))?;
                tokens.push(Token::Number(value));
            }
            _ => {
                let token = match c {
                    '+' => Token::Plus,
                    '-' => Token::Minus,
                    '*' => Token::Star,
                    '/' => Token::Slash,
                    '(' => Token::LParen,
                    ')' => Token::RParen,
                    other => return Err(FormulaError::InvalidChar(other)),
                };
                tokens.push(token);
                chars.next();
            }
        }
    }

    Ok(tokens)
}

// =============================================================================
// Parser
// =============================================================================

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    depth: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.peek();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expr(&mut self) -> Result<f64, FormulaError> {
        let mut value = self.term()?;
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.pos += 1;
                    value += self.term()?;
                }
                Some(Token::Minus) => {
                    self.pos += 1;
                    value -= self.term()?;
                }
                _ => return Ok(value),
            }
        }
    }

    fn term(&mut self) -> Result<f64, FormulaError> {
        let mut value = self.factor()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.pos += 1;
                    value *= self.factor()?;
                }
                Some(Token::Slash) => {
                    self.pos += 1;
                    value /= self.factor()?;
                }
                _ => return Ok(value),
            }
        }
    }

    fn factor(&mut self) -> Result<f64, FormulaError> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(FormulaError::TooDeep {
                max: MAX_NESTING_DEPTH,
            });
        }
        self.depth += 1;
        let result = self.operand();
        self.depth -= 1;
        result
    }

    fn operand(&mut self) -> Result<f64, FormulaError> {
        let position = self.pos;
        match self.advance() {
            Some(Token::Number(v)) => Ok(v),
            Some(Token::Plus) => self.factor(),
            Some(Token::Minus) => Ok(-self.factor()?),
            Some(Token::LParen) => {
                let value = self.expr()?;
                match self.advance() {
                    Some(Token::RParen) => Ok(value),
                    Some(_) => Err(FormulaError::UnexpectedToken { position: self.pos - 1 }),
                    None => Err(FormulaError::UnexpectedEnd),
                }
            }
            Some(_) => Err(FormulaError::UnexpectedToken { position }),
            None => Err(FormulaError::UnexpectedEnd),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precedence() {
        assert_eq!(evaluate("=2+2*3"), "8");
        assert_eq!(evaluate("=(2+2)*3"), "12");
        assert_eq!(evaluate("=10-4-3"), "3");
        assert_eq!(evaluate("=100/10/2"), "5");
    }

    #[test]
    fn test_fraction_formatting() {
        assert_eq!(evaluate("=7/2"), "3.5");
        assert_eq!(evaluate("=6/2"), "3");
        assert_eq!(evaluate("=1/3"), "0.33");
        assert_eq!(evaluate("=0.1+0.2"), "0.3");
    }

    #[test]
    fn test_non_formula_passes_through() {
        assert_eq!(evaluate("plain"), "plain");
        assert_eq!(evaluate("12"), "12");
        assert_eq!(evaluate(""), "");
        assert_eq!(evaluate(" 5 "), " 5 ");
    }

    #[test]
    fn test_leading_whitespace_before_prefix() {
        assert_eq!(evaluate("  =3*3"), "9");
    }

    #[test]
    fn test_division_by_zero_keeps_raw() {
        assert_eq!(evaluate("=10/0"), "=10/0");
        assert_eq!(evaluate("=0/0"), "=0/0");
    }

    #[test]
    fn test_filtered_to_empty_keeps_raw() {
        assert_eq!(evaluate("=DROP TABLE"), "=DROP TABLE");
        assert_eq!(evaluate("="), "=");
        assert_eq!(evaluate("=   "), "=   ");
    }

    #[test]
    fn test_identifiers_are_stripped() {
        // Letters vanish before parsing; what remains is plain arithmetic.
        assert_eq!(evaluate("=Math.max(2)*3"), "=Math.max(2)*3");
        assert_eq!(evaluate("=2x+3y"), "5");
        assert_eq!(evaluate("=alert(1)"), "1");
    }

    #[test]
    fn test_malformed_expressions_keep_raw() {
        assert_eq!(evaluate("=1+"), "=1+");
        assert_eq!(evaluate("=(1+2"), "=(1+2");
        assert_eq!(evaluate("=1 2"), "=1 2");
        assert_eq!(evaluate("=2(3)"), "=2(3)");
        assert_eq!(evaluate("=1.2.3"), "=1.2.3");
        assert_eq!(evaluate("=()"), "=()");
        assert_eq!(evaluate("=*5"), "=*5");
    }

    #[test]
    fn test_unary_signs() {
        assert_eq!(evaluate("=-3+5"), "2");
        assert_eq!(evaluate("=-(2*3)"), "-6");
        assert_eq!(evaluate("=+4"), "4");
        assert_eq!(evaluate("=2*-3"), "-6");
    }

    #[test]
    fn test_decimal_literals() {
        assert_eq!(evaluate("=.5*4"), "2");
        assert_eq!(evaluate("=1.25+1.25"), "2.5");
    }

    #[test]
    fn test_evaluate_expression_errors() {
        assert_eq!(evaluate_expression(""), Err(FormulaError::UnexpectedEnd));
        assert!(matches!(
            evaluate_expression("1 2"),
            Err(FormulaError::TrailingInput { position: 1 })
        ));
        assert!(matches!(evaluate_expression("."), Err(FormulaError::BadNumber(_))));
        assert!(matches!(evaluate_expression("a"), Err(FormulaError::InvalidChar('a'))));
    }

    #[test]
    fn test_deep_nesting_keeps_raw() {
        let nested = format!("={}1{}", "(".repeat(5_000), ")".repeat(5_000));
        assert_eq!(evaluate(&nested), nested);

        let signs = format!("={}1", "-".repeat(5_000));
        assert_eq!(evaluate(&signs), signs);
    }

    #[test]
    fn test_nesting_limit() {
        let within = format!("{}1{}", "(".repeat(10), ")".repeat(10));
        assert_eq!(evaluate_expression(&within), Ok(1.0));

        let beyond = format!(
            "{}1{}",
            "(".repeat(MAX_NESTING_DEPTH),
            ")".repeat(MAX_NESTING_DEPTH)
        );
        assert_eq!(
            evaluate_expression(&beyond),
            Err(FormulaError::TooDeep {
                max: MAX_NESTING_DEPTH
            })
        );
    }

    #[test]
    fn test_overflow_when_rounding_keeps_raw() {
        let huge = format!("=1{}", "0".repeat(307));
        assert_eq!(evaluate(&huge), huge);
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            FormulaError::InvalidChar('a').to_string(),
            "invalid character 'a'"
        );
        assert_eq!(
            FormulaError::TooDeep { max: 64 }.to_string(),
            "expression nests deeper than 64 levels"
        );
    }

    #[test]
    fn test_filter_expression() {
        assert_eq!(filter_expression("12 * abc(3)"), "12 * (3)");
        assert_eq!(filter_expression("1,000+2"), "1000+2");
    }
}

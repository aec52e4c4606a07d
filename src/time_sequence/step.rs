//! Evaluation of the step keys of abstract time instants, such as `k-1/2`.
//!
//! The grammar is the usual one for arithmetic over numbers and identifiers:
//!
//! ```text
//! expr   := term (('+' | '-') term)*
//! term   := factor (('*' | '/') factor)*
//! factor := ('+' | '-') factor | number | identifier | '(' expr ')'
//! ```
use crate::error::{DerivationError, DerivationResult};
use std::iter::Peekable;
use std::str::Chars;

/// Evaluates a step key with the given values bound to its identifiers.
pub fn evaluate_step_key(key: &str, bindings: &[(&str, f64)]) -> DerivationResult<f64> {
    let mut parser = StepParser {
        key,
        chars: key.chars().peekable(),
        bindings,
    };
    let value = parser.expr()?;
    parser.skip_whitespace();
    match parser.chars.next() {
        None => Ok(value),
        Some(c) => Err(parser.error(&format!("unexpected character '{}'", c))),
    }
}

struct StepParser<'a> {
    key: &'a str,
    chars: Peekable<Chars<'a>>,
    bindings: &'a [(&'a str, f64)],
}

impl<'a> StepParser<'a> {
    fn error(&self, reason: &str) -> DerivationError {
        DerivationError::InvalidRepresentation(format!("cannot evaluate step key \"{}\": {}", self.key, reason))
    }

    fn skip_whitespace(&mut self) {
        while self.chars.peek().map_or(false, |c| c.is_whitespace()) {
            self.chars.next();
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.skip_whitespace();
        self.chars.peek().copied()
    }

    fn expr(&mut self) -> DerivationResult<f64> {
        let mut value = self.term()?;
        while let Some(op) = self.peek().filter(|c| *c == '+' || *c == '-') {
            self.chars.next();
            let rhs = self.term()?;
            value = if op == '+' { value + rhs } else { value - rhs };
        }
        Ok(value)
    }

    fn term(&mut self) -> DerivationResult<f64> {
        let mut value = self.factor()?;
        while let Some(op) = self.peek().filter(|c| *c == '*' || *c == '/') {
            self.chars.next();
            let rhs = self.factor()?;
            value = if op == '*' {
                value * rhs
            } else if rhs == 0.0 {
                return Err(self.error("division by zero"));
            } else {
                value / rhs
            };
        }
        Ok(value)
    }

    fn factor(&mut self) -> DerivationResult<f64> {
        match self.peek() {
            Some('+') => {
                self.chars.next();
                self.factor()
            }
            Some('-') => {
                self.chars.next();
                Ok(-self.factor()?)
            }
            Some('(') => {
                self.chars.next();
                let value = self.expr()?;
                match self.peek() {
                    Some(')') => {
                        self.chars.next();
                        Ok(value)
                    }
                    _ => Err(self.error("unbalanced parenthesis")),
                }
            }
            Some(c) if c.is_ascii_digit() || c == '.' => self.number(),
            Some(c) if c.is_alphabetic() || c == '_' => self.identifier(),
            Some(c) => Err(self.error(&format!("unexpected character '{}'", c))),
            None => Err(self.error("unexpected end of key")),
        }
    }

    fn number(&mut self) -> DerivationResult<f64> {
        let mut text = String::new();
        while let Some(&c) = self.chars.peek() {
            if c.is_ascii_digit() || c == '.' {
                text.push(c);
                self.chars.next();
            } else {
                break;
            }
        }
        text.parse::<f64>()
            .map_err(|err| self.error(&format!("failed to parse {} as f64: {}", text, err)))
    }

    fn identifier(&mut self) -> DerivationResult<f64> {
        let mut name = String::new();
        while let Some(&c) = self.chars.peek() {
            if c.is_alphanumeric() || c == '_' {
                name.push(c);
                self.chars.next();
            } else {
                break;
            }
        }
        self.bindings
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, value)| *value)
            .ok_or_else(|| {
                DerivationError::InvalidTimeInstant(format!("step variable {} in \"{}\" is not bound", name, self.key))
            })
    }
}

// Copyright 2024 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Infix arithmetic expression evaluation.
//!
//! The evaluator makes two passes over its input. The first pass
//! scans the raw string into a token list, the second runs a
//! recursive descent over the tokens with one grammar rule per
//! precedence tier (`+ -` bind looser than `* /`, parentheses
//! group). Both passes are pure, all state lives on the call stack,
//! so the evaluator is safe to call from any number of threads.

use std::{fmt, iter::Peekable, str::Chars, vec};

/// Everything that can go wrong while evaluating an expression.
///
/// Malformed input is always reported as one of these kinds, the
/// evaluator never panics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Empty input, a dangling operator, or any other structural
    /// problem not covered by a more specific kind.
    InvalidExpression,
    /// A divisor evaluated to exactly zero.
    DivisionByZero,
    /// Unbalanced `(`/`)`.
    MismatchedParentheses,
    /// An operator-shaped character that is not one of `+ - * /`.
    UnknownOperator,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidExpression => write!(f, "expression is not valid"),
            Self::DivisionByZero => write!(f, "division by zero"),
            Self::MismatchedParentheses => write!(f, "mismatched parentheses"),
            Self::UnknownOperator => write!(f, "unknown operator"),
        }
    }
}

impl std::error::Error for Error {}

/// A single lexical unit of an expression.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Num(f64),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

/// Evaluate an infix arithmetic expression.
///
/// Supports `+ - * /` with the usual precedence and left
/// associativity, parenthesized groups, and unsigned decimal
/// number literals. All arithmetic happens in `f64`.
///
/// # Errors
///
/// Returns the [`Error`] kind describing why the expression was
/// rejected. Division by zero is caught at the moment the divisor
/// has been evaluated, so `1/(2-2)` is rejected just like `1/0`.
pub fn evaluate(input: &str) -> Result<f64, Error> {
    let tokens = tokenize(input)?;
    let mut parser = Parser { tokens: tokens.into_iter().peekable(), depth: 0 };

    let value = parser.expr()?;
    match parser.tokens.next() {
        None => Ok(value),
        Some(Token::RParen) => Err(Error::MismatchedParentheses),
        Some(_) => Err(Error::InvalidExpression),
    }
}

/// Scan the raw input into tokens, skipping ascii whitespace.
///
/// Every character lands in exactly one token or gets the whole
/// scan rejected, nothing is silently dropped.
fn tokenize(input: &str) -> Result<Vec<Token>, Error> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_ascii_whitespace() => {
                chars.next();
            }
            '0'..='9' => tokens.push(number(&mut chars)?),
            '+' => {
                chars.next();
                tokens.push(Token::Plus);
            }
            '-' => {
                chars.next();
                tokens.push(Token::Minus);
            }
            '*' => {
                chars.next();
                tokens.push(Token::Star);
            }
            '/' => {
                chars.next();
                tokens.push(Token::Slash);
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            '^' | '%' | '!' | '&' | '|' | '<' | '>' | '=' | '~' | '?' => {
                return Err(Error::UnknownOperator)
            }
            _ => return Err(Error::InvalidExpression),
        }
    }

    Ok(tokens)
}

/// Scan a number literal: one or more digits, optionally followed
/// by a decimal point and more digits.
///
/// The decimal point is only consumed when a digit follows it, so
/// the second dot of `1.2.3` and the trailing dot of `2.` are left
/// for the main scan loop to reject.
fn number(chars: &mut Peekable<Chars>) -> Result<Token, Error> {
    let mut literal = String::new();
    while let Some(c) = chars.peek() {
        if !c.is_ascii_digit() {
            break;
        }
        literal.push(*c);
        chars.next();
    }

    let mut lookahead = chars.clone();
    if lookahead.next() == Some('.') && lookahead.next().is_some_and(|c| c.is_ascii_digit()) {
        literal.push('.');
        chars.next();
        while let Some(c) = chars.peek() {
            if !c.is_ascii_digit() {
                break;
            }
            literal.push(*c);
            chars.next();
        }
    }

    literal.parse().map(Token::Num).map_err(|_| Error::InvalidExpression)
}

/// The recursive descent state. The grammar rules call each other,
/// the token cursor and the open paren count are the only bits that
/// need to be threaded through.
struct Parser {
    tokens: Peekable<vec::IntoIter<Token>>,
    depth: usize,
}

impl Parser {
    // expr := term (('+' | '-') term)*
    fn expr(&mut self) -> Result<f64, Error> {
        let mut value = self.term()?;
        while let Some(op) = self.tokens.next_if(|t| matches!(t, Token::Plus | Token::Minus)) {
            let rhs = self.term()?;
            match op {
                Token::Plus => value += rhs,
                _ => value -= rhs,
            }
        }
        Ok(value)
    }

    // term := primary (('*' | '/') primary)*
    fn term(&mut self) -> Result<f64, Error> {
        let mut value = self.primary()?;
        while let Some(op) = self.tokens.next_if(|t| matches!(t, Token::Star | Token::Slash)) {
            let rhs = self.primary()?;
            match op {
                Token::Star => value *= rhs,
                _ => {
                    if rhs == 0.0 {
                        return Err(Error::DivisionByZero);
                    }
                    value /= rhs;
                }
            }
        }
        Ok(value)
    }

    // primary := number | '(' expr ')'
    fn primary(&mut self) -> Result<f64, Error> {
        match self.tokens.next() {
            Some(Token::Num(n)) => Ok(n),
            Some(Token::LParen) => {
                self.depth += 1;
                let value = self.expr()?;
                match self.tokens.next() {
                    Some(Token::RParen) => {
                        self.depth -= 1;
                        Ok(value)
                    }
                    None => Err(Error::MismatchedParentheses),
                    Some(_) => Err(Error::InvalidExpression),
                }
            }
            // A closer with no open group to match is a paren
            // problem, a closer right after an operator or at the
            // start of a group is a structural one.
            Some(Token::RParen) if self.depth == 0 => Err(Error::MismatchedParentheses),
            _ => Err(Error::InvalidExpression),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn calculates() {
        let cases = vec![
            ("1+1", 2.0),
            ("20+20", 40.0),
            ("(2+2)*2", 8.0),
            ("2+2*2", 6.0),
            ("2+2*3", 8.0),
            ("1/2", 0.5),
            ("(((1/2 + 3/2) * 15 - 1) * 84) / 2 - 5 * 220", 118.0),
            ("(2 + 2 * 18 / 3 - 5) * 0", 0.0),
            ("3.5 + 1.25", 4.75),
            ("10 - 2 - 3", 5.0),
            ("100 / 10 / 2", 5.0),
        ];

        for (expression, want) in cases {
            match evaluate(expression) {
                Ok(got) => assert_eq!(got, want, "wrong value for {expression}"),
                Err(err) => panic!("{expression} should evaluate, got {err}"),
            }
        }
    }

    #[test]
    fn ignores_whitespace() {
        assert_eq!(evaluate("1+1"), evaluate(" 1 + 1 "));
        assert_eq!(evaluate("(2+2)*2"), evaluate("( 2 + 2 )\t* 2"));
    }

    #[test]
    fn repeated_calls_match() {
        let expression = "(((1/2 + 3/2) * 15 - 1) * 84) / 2 - 5 * 220";
        assert_eq!(evaluate(expression), evaluate(expression));
    }

    #[test]
    fn rejects_invalid_expressions() {
        let cases = vec![
            "",
            "   ",
            "1+1*",
            "2 + 4 *",
            "2+2**2",
            "((2+2-*(2",
            "-5",
            "+1",
            "()",
            "(2+)",
            "(2 3)",
            "2 3",
            "abc",
            "2 + x",
            "1.2.3",
            "2.",
            ".5",
        ];

        for expression in cases {
            assert_eq!(
                evaluate(expression),
                Err(Error::InvalidExpression),
                "wrong classification for {expression:?}"
            );
        }
    }

    #[test]
    fn rejects_division_by_zero() {
        assert_eq!(evaluate("1/0"), Err(Error::DivisionByZero));
        assert_eq!(evaluate("1 / 0"), Err(Error::DivisionByZero));
        assert_eq!(evaluate("1/(2-2)"), Err(Error::DivisionByZero));
        // the zero divisor is noticed before the trailing operator
        assert_eq!(evaluate("1/0/"), Err(Error::DivisionByZero));
    }

    #[test]
    fn rejects_mismatched_parentheses() {
        let cases = vec!["2 + 2 * (2 * 3", "(1+1", "2)", ")2(", "(1+1))"];

        for expression in cases {
            assert_eq!(
                evaluate(expression),
                Err(Error::MismatchedParentheses),
                "wrong classification for {expression:?}"
            );
        }
    }

    #[test]
    fn rejects_unknown_operators() {
        let cases = vec!["2 ^ 4", "2 + 2 ^ 2", "7 % 3", "1 & 1", "2 = 2"];

        for expression in cases {
            assert_eq!(
                evaluate(expression),
                Err(Error::UnknownOperator),
                "wrong classification for {expression:?}"
            );
        }
    }

    #[test]
    fn error_messages_are_stable() {
        assert_eq!(Error::InvalidExpression.to_string(), "expression is not valid");
        assert_eq!(Error::DivisionByZero.to_string(), "division by zero");
        assert_eq!(Error::MismatchedParentheses.to_string(), "mismatched parentheses");
        assert_eq!(Error::UnknownOperator.to_string(), "unknown operator");
    }
}

use rust_decimal::Decimal;
use thiserror::Error;

use crate::expr::{CmpOp, CompiledPattern, Expr, Predicate};

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("condition is empty")]
    Empty,
    #[error("unexpected character '{0}' at byte {1}")]
    UnexpectedChar(char, usize),
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("expected a field name, found {0}")]
    ExpectedField(String),
    #[error("expected an operator after '{0}'")]
    ExpectedOperator(String),
    #[error("unknown operator '{0}'")]
    UnknownOperator(String),
    #[error("expected a value, found {0}")]
    ExpectedValue(String),
    #[error("expected ')' to close a group")]
    UnbalancedParen,
    #[error("'in' expects a quoted comma-separated list")]
    InExpectsList,
    #[error("numeric comparison needs a numeric literal, got '{0}'")]
    NonNumericLiteral(String),
    #[error("invalid regex '{pattern}': {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("unexpected trailing input near {0}")]
    Trailing(String),
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Word(String),
    Str(String),
    LParen,
    RParen,
    EqEq,
    Gt,
    Lt,
    Ge,
    Le,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Word(w) => format!("'{w}'"),
            Token::Str(s) => format!("\"{s}\""),
            Token::LParen => "'('".to_string(),
            Token::RParen => "')'".to_string(),
            Token::EqEq => "'=='".to_string(),
            Token::Gt => "'>'".to_string(),
            Token::Lt => "'<'".to_string(),
            Token::Ge => "'>='".to_string(),
            Token::Le => "'<='".to_string(),
        }
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '.' | '-')
}

fn tokenize(input: &str) -> Result<Vec<Token>, ParseError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(pos, c)) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            '=' => {
                chars.next();
                match chars.peek() {
                    Some(&(_, '=')) => {
                        chars.next();
                        tokens.push(Token::EqEq);
                    }
                    _ => return Err(ParseError::UnexpectedChar('=', pos)),
                }
            }
            '>' => {
                chars.next();
                if matches!(chars.peek(), Some(&(_, '='))) {
                    chars.next();
                    tokens.push(Token::Ge);
                } else {
                    tokens.push(Token::Gt);
                }
            }
            '<' => {
                chars.next();
                if matches!(chars.peek(), Some(&(_, '='))) {
                    chars.next();
                    tokens.push(Token::Le);
                } else {
                    tokens.push(Token::Lt);
                }
            }
            '"' => {
                chars.next();
                let mut value = String::new();
                let mut closed = false;
                while let Some((_, c)) = chars.next() {
                    match c {
                        '"' => {
                            closed = true;
                            break;
                        }
                        // Only quotes and backslashes escape; anything else
                        // (regex classes like \d) passes through untouched.
                        '\\' => match chars.next() {
                            Some((_, '"')) => value.push('"'),
                            Some((_, '\\')) => value.push('\\'),
                            Some((_, other)) => {
                                value.push('\\');
                                value.push(other);
                            }
                            None => return Err(ParseError::UnterminatedString),
                        },
                        other => value.push(other),
                    }
                }
                if !closed {
                    return Err(ParseError::UnterminatedString);
                }
                tokens.push(Token::Str(value));
            }
            c if is_word_char(c) => {
                let mut word = String::new();
                while let Some(&(_, c)) = chars.peek() {
                    if is_word_char(c) {
                        word.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Word(word));
            }
            other => return Err(ParseError::UnexpectedChar(other, pos)),
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn at_keyword(&self, keyword: &str) -> bool {
        matches!(self.peek(), Some(Token::Word(w)) if w.eq_ignore_ascii_case(keyword))
    }

    fn parse_or(&mut self) -> Result<Expr, ParseError> {
        let mut parts = vec![self.parse_and()?];
        while self.at_keyword("or") {
            self.next();
            parts.push(self.parse_and()?);
        }
        Ok(if parts.len() == 1 {
            parts.pop().unwrap()
        } else {
            Expr::Or(parts)
        })
    }

    fn parse_and(&mut self) -> Result<Expr, ParseError> {
        let mut parts = vec![self.parse_primary()?];
        while self.at_keyword("and") {
            self.next();
            parts.push(self.parse_primary()?);
        }
        Ok(if parts.len() == 1 {
            parts.pop().unwrap()
        } else {
            Expr::And(parts)
        })
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        if matches!(self.peek(), Some(Token::LParen)) {
            self.next();
            let inner = self.parse_or()?;
            match self.next() {
                Some(Token::RParen) => Ok(inner),
                _ => Err(ParseError::UnbalancedParen),
            }
        } else {
            self.parse_predicate().map(Expr::Comparison)
        }
    }

    fn parse_predicate(&mut self) -> Result<Predicate, ParseError> {
        let field = match self.next() {
            Some(Token::Word(w))
                if !w.eq_ignore_ascii_case("and") && !w.eq_ignore_ascii_case("or") =>
            {
                w
            }
            Some(other) => return Err(ParseError::ExpectedField(other.describe())),
            None => return Err(ParseError::ExpectedField("end of input".to_string())),
        };

        let op_token = self
            .next()
            .ok_or_else(|| ParseError::ExpectedOperator(field.clone()))?;

        let op = match &op_token {
            Token::EqEq => CmpOp::Equals(self.string_value(&op_token)?),
            Token::Gt => CmpOp::Gt(self.numeric_value()?),
            Token::Lt => CmpOp::Lt(self.numeric_value()?),
            Token::Ge => CmpOp::Ge(self.numeric_value()?),
            Token::Le => CmpOp::Le(self.numeric_value()?),
            Token::Word(w) => match w.to_ascii_lowercase().as_str() {
                "equals" => CmpOp::Equals(self.string_value(&op_token)?),
                "contains" => CmpOp::Contains(self.string_value(&op_token)?),
                "startswith" => CmpOp::StartsWith(self.string_value(&op_token)?),
                "endswith" => CmpOp::EndsWith(self.string_value(&op_token)?),
                "regex" => {
                    let pattern = self.string_value(&op_token)?;
                    let compiled = CompiledPattern::new(&pattern)
                        .map_err(|source| ParseError::InvalidRegex { pattern, source })?;
                    CmpOp::Regex(compiled)
                }
                "in" => match self.next() {
                    Some(Token::Str(list)) => CmpOp::In(
                        list.split(',')
                            .map(|item| item.trim().to_string())
                            .filter(|item| !item.is_empty())
                            .collect(),
                    ),
                    _ => return Err(ParseError::InExpectsList),
                },
                other => return Err(ParseError::UnknownOperator(other.to_string())),
            },
            other => return Err(ParseError::UnknownOperator(other.describe())),
        };

        Ok(Predicate { field, op })
    }

    /// String and bare-word literals are both accepted as comparison values;
    /// numbers compare as their canonical text.
    fn string_value(&mut self, op: &Token) -> Result<String, ParseError> {
        match self.next() {
            Some(Token::Str(s)) => Ok(s),
            Some(Token::Word(w)) => Ok(w),
            Some(other) => Err(ParseError::ExpectedValue(other.describe())),
            None => Err(ParseError::ExpectedValue(format!(
                "end of input after {}",
                op.describe()
            ))),
        }
    }

    fn numeric_value(&mut self) -> Result<Decimal, ParseError> {
        let raw = match self.next() {
            Some(Token::Word(w)) => w,
            Some(Token::Str(s)) => s,
            Some(other) => return Err(ParseError::ExpectedValue(other.describe())),
            None => return Err(ParseError::ExpectedValue("end of input".to_string())),
        };
        raw.parse()
            .map_err(|_| ParseError::NonNumericLiteral(raw.clone()))
    }
}

/// Compile a condition's text into its expression tree.
pub fn parse(input: &str) -> Result<Expr, ParseError> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(ParseError::Empty);
    }
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.parse_or()?;
    match parser.peek() {
        None => Ok(expr),
        Some(token) => Err(ParseError::Trailing(token.describe())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use augeo_core::FieldValue;
    use std::collections::BTreeMap;

    fn fields(pairs: &[(&str, &str)]) -> BTreeMap<String, FieldValue> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), FieldValue::Text(v.to_string())))
            .collect()
    }

    #[test]
    fn single_equals_predicate() {
        let expr = parse("currency equals \"USD\"").unwrap();
        assert!(expr.eval(&fields(&[("currency", "USD")])));
        assert!(!expr.eval(&fields(&[("currency", "EUR")])));
    }

    #[test]
    fn double_equals_is_an_alias() {
        let expr = parse("trade_type == \"A\"").unwrap();
        assert!(expr.eval(&fields(&[("trade_type", "A")])));
    }

    #[test]
    fn amount_and_currency_condition() {
        // The worked example from the design discussion.
        let expr = parse("amount > 1000000 AND currency == \"USD\"").unwrap();
        assert!(expr.eval(&fields(&[("amount", "2000000"), ("currency", "USD")])));
        assert!(!expr.eval(&fields(&[("amount", "500000"), ("currency", "USD")])));
    }

    #[test]
    fn and_binds_tighter_than_or() {
        // a OR b AND c  ==  a OR (b AND c)
        let expr = parse("x == \"1\" OR y == \"1\" AND z == \"1\"").unwrap();
        assert!(expr.eval(&fields(&[("x", "1"), ("y", "0"), ("z", "0")])));
        assert!(expr.eval(&fields(&[("x", "0"), ("y", "1"), ("z", "1")])));
        assert!(!expr.eval(&fields(&[("x", "0"), ("y", "1"), ("z", "0")])));
    }

    #[test]
    fn parentheses_override_precedence() {
        // (a OR b) AND c
        let expr = parse("(x == \"1\" OR y == \"1\") AND z == \"1\"").unwrap();
        assert!(expr.eval(&fields(&[("x", "1"), ("y", "0"), ("z", "1")])));
        assert!(!expr.eval(&fields(&[("x", "1"), ("y", "0"), ("z", "0")])));
    }

    #[test]
    fn keywords_are_case_insensitive() {
        let expr = parse("x == \"1\" and y == \"1\"").unwrap();
        assert!(expr.eval(&fields(&[("x", "1"), ("y", "1")])));
    }

    #[test]
    fn in_operator_splits_and_trims() {
        let expr = parse("currency in \"USD, EUR,GBP\"").unwrap();
        assert!(expr.eval(&fields(&[("currency", "EUR")])));
        assert!(expr.eval(&fields(&[("currency", "GBP")])));
        assert!(!expr.eval(&fields(&[("currency", "CHF")])));
    }

    #[test]
    fn in_rejects_unquoted_operand() {
        assert!(matches!(
            parse("currency in USD"),
            Err(ParseError::InExpectsList)
        ));
    }

    #[test]
    fn regex_operator_compiles_at_parse_time() {
        let expr = parse("description regex \"FEE \\d+\"").unwrap();
        assert!(expr.eval(&fields(&[("description", "FEE 42")])));
        assert!(!expr.eval(&fields(&[("description", "MONTHLY FEE 42 EXTRA")])));
    }

    #[test]
    fn invalid_regex_is_a_parse_error() {
        assert!(matches!(
            parse("description regex \"(unclosed\""),
            Err(ParseError::InvalidRegex { .. })
        ));
    }

    #[test]
    fn numeric_operator_requires_numeric_literal() {
        assert!(matches!(
            parse("amount > \"lots\""),
            Err(ParseError::NonNumericLiteral(_))
        ));
    }

    #[test]
    fn bare_word_values_are_accepted() {
        let expr = parse("currency equals USD").unwrap();
        assert!(expr.eval(&fields(&[("currency", "USD")])));
    }

    #[test]
    fn empty_input_is_an_error() {
        assert!(matches!(parse(""), Err(ParseError::Empty)));
        assert!(matches!(parse("   "), Err(ParseError::Empty)));
    }

    #[test]
    fn trailing_tokens_are_an_error() {
        assert!(matches!(
            parse("x == \"1\" y == \"2\""),
            Err(ParseError::Trailing(_))
        ));
    }

    #[test]
    fn unbalanced_paren_is_an_error() {
        assert!(matches!(
            parse("(x == \"1\" AND y == \"2\""),
            Err(ParseError::UnbalancedParen)
        ));
    }

    #[test]
    fn single_equals_is_rejected() {
        assert!(matches!(
            parse("currency = \"USD\""),
            Err(ParseError::UnexpectedChar('=', _))
        ));
    }

    #[test]
    fn unknown_word_operator_is_rejected() {
        assert!(matches!(
            parse("currency matches \"USD\""),
            Err(ParseError::UnknownOperator(_))
        ));
    }

    #[test]
    fn missing_field_evaluates_false_not_error() {
        let expr = parse("no_such_field == \"1\"").unwrap();
        assert!(!expr.eval(&fields(&[("x", "1")])));
    }
}

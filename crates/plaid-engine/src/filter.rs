//! Value filter expressions.
//!
//! A filter restricts the combinations a value takes part in by testing the
//! value *indices* currently selected on other dimensions:
//!
//! ```text
//! Wrap==1 AND (Size!=0 OR Font==2)
//! ```
//!
//! `AND` and `OR` have equal precedence and fold left to right; use
//! parentheses to group.

use std::fmt;

/// Deepest parenthesis nesting a filter may use.
pub const MAX_DEPTH: usize = 32;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FilterError {
    #[error("filter is empty")]
    Empty,

    #[error("unexpected end of filter at position {position}, expected {expected}")]
    UnexpectedEnd {
        position: usize,
        expected: &'static str,
    },

    #[error("unexpected '{found}' at position {position}, expected {expected}")]
    UnexpectedToken {
        position: usize,
        found: String,
        expected: &'static str,
    },

    #[error("'{op}' at position {position} must be followed by '='")]
    IncompleteOperator { position: usize, op: char },

    #[error("unknown dimension '{name}' at position {position}")]
    UnknownDimension { position: usize, name: String },

    #[error("value index '{text}' at position {position} is not a number")]
    InvalidIndex { position: usize, text: String },

    #[error("parentheses nested deeper than {} at position {position}", MAX_DEPTH)]
    TooDeep { position: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Equal,
    NotEqual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

/// A compiled filter, with dimension names resolved to positions.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterExpr {
    Compare {
        dimension: usize,
        op: CompareOp,
        index: usize,
    },
    Logical {
        op: LogicalOp,
        left: Box<FilterExpr>,
        right: Box<FilterExpr>,
    },
}

impl FilterExpr {
    /// Evaluate against the value index selected on each dimension.
    pub fn eval(&self, indexes: &[usize]) -> bool {
        match self {
            FilterExpr::Compare {
                dimension,
                op,
                index,
            } => {
                let equal = indexes.get(*dimension) == Some(index);
                match op {
                    CompareOp::Equal => equal,
                    CompareOp::NotEqual => !equal,
                }
            }
            FilterExpr::Logical { op, left, right } => match op {
                LogicalOp::And => left.eval(indexes) && right.eval(indexes),
                LogicalOp::Or => left.eval(indexes) || right.eval(indexes),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Number(String),
    Op(CompareOp),
    Logical(LogicalOp),
    Open,
    Close,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Ident(s) | Token::Number(s) => f.write_str(s),
            Token::Op(CompareOp::Equal) => f.write_str("=="),
            Token::Op(CompareOp::NotEqual) => f.write_str("!="),
            Token::Logical(LogicalOp::And) => f.write_str("AND"),
            Token::Logical(LogicalOp::Or) => f.write_str("OR"),
            Token::Open => f.write_str("("),
            Token::Close => f.write_str(")"),
        }
    }
}

fn is_word_char(c: char) -> bool {
    !c.is_whitespace() && !matches!(c, '(' | ')' | '=' | '!')
}

fn tokenize(filter: &str) -> Result<Vec<(usize, Token)>, FilterError> {
    let mut tokens = Vec::new();
    let mut chars = filter.char_indices().peekable();

    while let Some(&(pos, c)) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' => {
                chars.next();
                tokens.push((pos, Token::Open));
            }
            ')' => {
                chars.next();
                tokens.push((pos, Token::Close));
            }
            '=' | '!' => {
                chars.next();
                match chars.next() {
                    Some((_, '=')) => {}
                    _ => return Err(FilterError::IncompleteOperator { position: pos, op: c }),
                }
                let op = if c == '=' {
                    CompareOp::Equal
                } else {
                    CompareOp::NotEqual
                };
                tokens.push((pos, Token::Op(op)));
            }
            _ => {
                let mut word = String::new();
                while let Some(&(_, c)) = chars.peek() {
                    if !is_word_char(c) {
                        break;
                    }
                    word.push(c);
                    chars.next();
                }
                let token = match word.as_str() {
                    "AND" => Token::Logical(LogicalOp::And),
                    "OR" => Token::Logical(LogicalOp::Or),
                    _ if word.chars().all(|c| c.is_ascii_digit()) => Token::Number(word),
                    _ => Token::Ident(word),
                };
                tokens.push((pos, token));
            }
        }
    }

    Ok(tokens)
}

struct Parser<'a> {
    tokens: Vec<(usize, Token)>,
    cursor: usize,
    end: usize,
    depth: usize,
    dimension_names: &'a [&'a str],
}

impl Parser<'_> {
    fn peek(&self) -> Option<&(usize, Token)> {
        self.tokens.get(self.cursor)
    }

    fn advance(&mut self, expected: &'static str) -> Result<(usize, Token), FilterError> {
        let next = self
            .tokens
            .get(self.cursor)
            .cloned()
            .ok_or(FilterError::UnexpectedEnd {
                position: self.end,
                expected,
            })?;
        self.cursor += 1;
        Ok(next)
    }

    fn expr(&mut self) -> Result<FilterExpr, FilterError> {
        let mut left = self.primary()?;
        while let Some((_, Token::Logical(op))) = self.peek() {
            let op = *op;
            self.cursor += 1;
            let right = self.primary()?;
            left = FilterExpr::Logical {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn primary(&mut self) -> Result<FilterExpr, FilterError> {
        const EXPECTED: &str = "a comparison or '('";
        let (pos, token) = self.advance(EXPECTED)?;
        match token {
            Token::Open => {
                if self.depth >= MAX_DEPTH {
                    return Err(FilterError::TooDeep { position: pos });
                }
                self.depth += 1;
                let inner = self.expr()?;
                self.depth -= 1;
                match self.advance("')'")? {
                    (_, Token::Close) => Ok(inner),
                    (pos, other) => Err(FilterError::UnexpectedToken {
                        position: pos,
                        found: other.to_string(),
                        expected: "')'",
                    }),
                }
            }
            Token::Ident(name) => {
                let dimension = self
                    .dimension_names
                    .iter()
                    .position(|n| *n == name)
                    .ok_or(FilterError::UnknownDimension {
                        position: pos,
                        name: name.clone(),
                    })?;
                let op = match self.advance("'==' or '!='")? {
                    (_, Token::Op(op)) => op,
                    (pos, other) => {
                        return Err(FilterError::UnexpectedToken {
                            position: pos,
                            found: other.to_string(),
                            expected: "'==' or '!='",
                        })
                    }
                };
                let index = match self.advance("a value index")? {
                    (pos, Token::Number(text)) => text
                        .parse::<usize>()
                        .map_err(|_| FilterError::InvalidIndex { position: pos, text })?,
                    (pos, other) => {
                        return Err(FilterError::InvalidIndex {
                            position: pos,
                            text: other.to_string(),
                        })
                    }
                };
                Ok(FilterExpr::Compare {
                    dimension,
                    op,
                    index,
                })
            }
            other => Err(FilterError::UnexpectedToken {
                position: pos,
                found: other.to_string(),
                expected: EXPECTED,
            }),
        }
    }
}

/// Compile a filter against the engine's dimension names.
pub fn compile(filter: &str, dimension_names: &[&str]) -> Result<FilterExpr, FilterError> {
    let tokens = tokenize(filter)?;
    if tokens.is_empty() {
        return Err(FilterError::Empty);
    }

    let mut parser = Parser {
        tokens,
        cursor: 0,
        end: filter.len(),
        depth: 0,
        dimension_names,
    };
    let expr = parser.expr()?;
    if let Some((pos, token)) = parser.peek() {
        return Err(FilterError::UnexpectedToken {
            position: *pos,
            found: token.to_string(),
            expected: "AND, OR or end of filter",
        });
    }
    Ok(expr)
}

use crate::alphabet::CharClass;
#[cfg(test)]
use serde::Serialize;
use std::fmt::{Display, Formatter};

#[derive(Debug, PartialEq)]
pub(crate) enum TokenParsingErr {
    EscapedNothing(usize),
    InvalidCharacterClass(usize),
}

#[derive(Copy, Clone, PartialEq, Debug)]
#[cfg_attr(test, derive(Serialize))]
pub(crate) enum Token {
    Literal(char),
    Class(CharClass),
    Star,
    Plus,
    QuestionMark,
    Pipe,
    LParen,
    RParen,
}

impl Token {
    pub fn is_quantifier(&self) -> bool {
        matches!(self, Token::Star | Token::Plus | Token::QuestionMark)
    }
}

/// Tokens paired with the char index they start at in the original pattern.
#[derive(Clone, Debug)]
pub(crate) struct TokenSequence {
    tokens: Vec<(usize, Token)>,
    pos: usize,
    end: usize,
}

impl TokenSequence {
    pub fn new(tokens: Vec<(usize, Token)>, end: usize) -> Self {
        Self {
            tokens,
            pos: 0,
            end,
        }
    }

    /// Pattern position of the next token, or the pattern length once exhausted.
    pub fn cur_pos(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map_or(self.end, |(position, _)| *position)
    }

    pub fn peek_enumerated(&self) -> Option<(usize, &Token)> {
        self.tokens
            .get(self.pos)
            .map(|(position, token)| (*position, token))
    }

    pub fn next_enumerated(&mut self) -> Option<(usize, Token)> {
        let next = self.tokens.get(self.pos).copied()?;
        self.pos += 1;
        Some(next)
    }

    pub fn peek(&self) -> Option<&Token> {
        self.peek_enumerated().map(|(_index, token)| token)
    }

    pub fn next(&mut self) -> Option<Token> {
        self.next_enumerated().map(|(_index, token)| token)
    }

    #[cfg(test)]
    pub fn collect(&mut self) -> Vec<Token> {
        let mut res = Vec::new();
        while let Some(tok) = self.next() {
            res.push(tok);
        }
        res
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Literal(c) => write!(f, "{c}"),
            Token::Class(class) => write!(f, "{class}"),
            Token::Star => write!(f, "*"),
            Token::Plus => write!(f, "+"),
            Token::QuestionMark => write!(f, "?"),
            Token::Pipe => write!(f, "|"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
        }
    }
}

impl From<char> for Token {
    fn from(value: char) -> Self {
        match value {
            '*' => Token::Star,
            '+' => Token::Plus,
            '?' => Token::QuestionMark,
            '(' => Token::LParen,
            ')' => Token::RParen,
            '|' => Token::Pipe,
            _ => Token::Literal(value),
        }
    }
}

/// A char that survived whitespace stripping.
#[derive(Copy, Clone)]
struct Significant {
    pos: usize,
    value: char,
    escaped: bool,
}

fn read_class(body: &[Significant]) -> Option<CharClass> {
    if body.iter().any(|c| c.escaped) {
        return None;
    }
    let chars: Vec<char> = body.iter().map(|c| c.value).collect();
    match chars.split_last() {
        Some((']', inner)) => CharClass::from_body(inner),
        _ => None,
    }
}

impl TryFrom<&str> for TokenSequence {
    type Error = TokenParsingErr;

    fn try_from(pattern: &str) -> Result<Self, Self::Error> {
        let mut significant = Vec::with_capacity(pattern.len());
        let mut pattern_iter = pattern.chars().enumerate();
        let mut end = 0;

        while let Some((pos, cur)) = pattern_iter.next() {
            end = pos + 1;
            if cur == '\\' {
                if let Some((escaped_pos, escaped)) = pattern_iter.next() {
                    end = escaped_pos + 1;
                    significant.push(Significant {
                        pos,
                        value: escaped,
                        escaped: true,
                    });
                } else {
                    return Err(TokenParsingErr::EscapedNothing(pos));
                }
            } else if !cur.is_whitespace() {
                significant.push(Significant {
                    pos,
                    value: cur,
                    escaped: false,
                });
            }
        }

        let mut tokens = Vec::with_capacity(significant.len());
        let mut i = 0;
        while let Some(&cur) = significant.get(i) {
            if cur.escaped {
                tokens.push((cur.pos, Token::Literal(cur.value)));
                i += 1;
            } else if cur.value == '[' {
                // the class body is the next four significant chars, e.g. `0-9]`
                let class = significant.get(i + 1..i + 5).and_then(read_class);
                match class {
                    Some(class) => tokens.push((cur.pos, Token::Class(class))),
                    None => return Err(TokenParsingErr::InvalidCharacterClass(cur.pos)),
                }
                i += 5;
            } else {
                tokens.push((cur.pos, Token::from(cur.value)));
                i += 1;
            }
        }

        Ok(TokenSequence::new(tokens, end))
    }
}

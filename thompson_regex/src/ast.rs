#[cfg(test)]
use serde::Serialize;

use crate::alphabet::CharClass;
use crate::token::{Token, TokenParsingErr, TokenSequence};
use log::debug;
use std::mem;
use thiserror::Error;

/// Deepest group nesting the parser accepts.
pub const MAX_GROUP_DEPTH: usize = 250;

struct AstParser {
    seq: TokenSequence,
    depth: usize,
}

impl AstParser {
    pub fn parse(seq: TokenSequence) -> Result<RegexAstNode, SyntaxError> {
        let mut parser = Self { seq, depth: 0 };

        let parsed_ast = parser.parse_alternation()?;

        // alternation and concatenation only stop early on a `)` without a matching `(`
        if let Some((pos, _)) = parser.seq.next_enumerated() {
            Err(SyntaxError::new(
                SyntaxErrorKind::UnexpectedClosingParenthesis,
                pos,
            ))
        } else {
            Ok(parsed_ast)
        }
    }

    fn parse_alternation(&mut self) -> Result<RegexAstNode, SyntaxError> {
        let mut lefts = Vec::new();
        let mut last = self.parse_concatenation()?;

        while let Some(Token::Pipe) = self.seq.peek() {
            self.seq.next();

            if matches!(self.seq.peek(), None | Some(Token::RParen)) {
                return Err(self.error_here(SyntaxErrorKind::EmptyAlternative));
            }
            let next = self.parse_concatenation()?;
            lefts.push(mem::replace(&mut last, next));
        }

        // a|b|c is a|(b|c)
        Ok(lefts.into_iter().rev().fold(last, |right, left| {
            RegexAstNode::Union(Box::new(left), Box::new(right))
        }))
    }

    fn parse_concatenation(&mut self) -> Result<RegexAstNode, SyntaxError> {
        let mut left_node = self.parse_quantifier()?;

        while self
            .seq
            .peek()
            .is_some_and(|t| !matches!(t, Token::Pipe | Token::RParen))
        {
            let right_node = self.parse_quantifier()?;
            left_node = RegexAstNode::Concat(Box::new(left_node), Box::new(right_node));
        }

        Ok(left_node)
    }

    fn map_quantifier(node: RegexAstNode, quantifier: Token) -> RegexAstNode {
        match quantifier {
            Token::Star => RegexAstNode::Star(Box::new(node)),
            Token::Plus => RegexAstNode::Plus(Box::new(node)),
            _ => RegexAstNode::Optional(Box::new(node)),
        }
    }

    fn parse_quantifier(&mut self) -> Result<RegexAstNode, SyntaxError> {
        let mut node = self.parse_literal_or_group()?;

        if let Some(&next_token) = self.seq.peek() {
            if next_token.is_quantifier() {
                self.seq.next();
                node = Self::map_quantifier(node, next_token);
            }
        }
        Ok(node)
    }

    fn parse_literal_or_group(&mut self) -> Result<RegexAstNode, SyntaxError> {
        let cur_pos = self.seq.cur_pos();
        match self.seq.next() {
            Some(Token::Literal(c)) => Ok(RegexAstNode::Literal(c)),
            Some(Token::Class(class)) => Ok(RegexAstNode::Class(class)),
            Some(Token::LParen) => {
                if self.depth == MAX_GROUP_DEPTH {
                    return Err(SyntaxError::new(SyntaxErrorKind::NestingTooDeep, cur_pos));
                }
                match self.seq.peek() {
                    Some(Token::RParen) => {
                        return Err(SyntaxError::new(SyntaxErrorKind::EmptyGroup, cur_pos));
                    }
                    None => {
                        return Err(SyntaxError::new(
                            SyntaxErrorKind::UnbalancedParenthesis,
                            cur_pos,
                        ));
                    }
                    _ => {}
                }
                self.depth += 1;
                let nested_expr = self.parse_alternation()?;
                self.depth -= 1;
                match self.seq.next() {
                    Some(Token::RParen) => Ok(nested_expr),
                    _ => Err(SyntaxError::new(
                        SyntaxErrorKind::UnbalancedParenthesis,
                        cur_pos,
                    )),
                }
            }
            Some(Token::Star) | Some(Token::Plus) | Some(Token::QuestionMark) => {
                Err(SyntaxError::new(SyntaxErrorKind::NothingToRepeat, cur_pos))
            }
            Some(Token::Pipe) => Err(SyntaxError::new(SyntaxErrorKind::EmptyAlternative, cur_pos)),
            Some(Token::RParen) => Err(SyntaxError::new(
                SyntaxErrorKind::UnexpectedClosingParenthesis,
                cur_pos,
            )),
            None => Err(SyntaxError::new(
                SyntaxErrorKind::UnexpectedEndOfExpression,
                cur_pos,
            )),
        }
    }

    fn error_here(&self, kind: SyntaxErrorKind) -> SyntaxError {
        SyntaxError::new(kind, self.seq.cur_pos())
    }
}

#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(test, derive(Serialize))]
pub enum RegexAstNode {
    Literal(char),
    Class(CharClass),
    Union(Box<RegexAstNode>, Box<RegexAstNode>),
    Concat(Box<RegexAstNode>, Box<RegexAstNode>),
    Star(Box<RegexAstNode>),
    Optional(Box<RegexAstNode>),
    Plus(Box<RegexAstNode>),
}

impl RegexAstNode {
    pub fn new(pattern: &str) -> Result<Self, SyntaxError> {
        let sequence = TokenSequence::try_from(pattern)?;
        let ast = AstParser::parse(sequence)?;
        debug!("parsed pattern {pattern:?}");
        Ok(ast)
    }

    fn take_children(&mut self, into: &mut Vec<RegexAstNode>) {
        let leaf = || RegexAstNode::Literal('\0');
        match self {
            RegexAstNode::Literal(_) | RegexAstNode::Class(_) => {}
            RegexAstNode::Union(left, right) | RegexAstNode::Concat(left, right) => {
                into.push(mem::replace(&mut **left, leaf()));
                into.push(mem::replace(&mut **right, leaf()));
            }
            RegexAstNode::Star(inner)
            | RegexAstNode::Optional(inner)
            | RegexAstNode::Plus(inner) => {
                into.push(mem::replace(&mut **inner, leaf()));
            }
        }
    }
}

// Iterative: a concatenation chain is as deep as the pattern is long.
impl Drop for RegexAstNode {
    fn drop(&mut self) {
        let mut pending = Vec::new();
        self.take_children(&mut pending);
        while let Some(mut node) = pending.pop() {
            node.take_children(&mut pending);
        }
    }
}

impl TryFrom<&str> for RegexAstNode {
    type Error = SyntaxError;

    fn try_from(pattern: &str) -> Result<Self, Self::Error> {
        Self::new(pattern)
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Error)]
#[cfg_attr(test, derive(Serialize))]
pub enum SyntaxErrorKind {
    #[error("unclosed parenthesis")]
    UnbalancedParenthesis,
    #[error("unexpected ')'")]
    UnexpectedClosingParenthesis,
    #[error("'\\' escapes nothing")]
    TrailingEscape,
    #[error("empty alternative")]
    EmptyAlternative,
    #[error("empty group")]
    EmptyGroup,
    #[error("unknown character class, expected [0-9], [a-z] or [A-Z]")]
    InvalidCharacterClass,
    #[error("quantifier has nothing to repeat")]
    NothingToRepeat,
    #[error("unexpected end of expression")]
    UnexpectedEndOfExpression,
    #[error("groups nested too deep")]
    NestingTooDeep,
}

/// The only error the pipeline can raise. `position` is a char index into the pattern.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Error)]
#[cfg_attr(test, derive(Serialize))]
#[error("{kind} at position {position}")]
pub struct SyntaxError {
    position: usize,
    kind: SyntaxErrorKind,
}

impl SyntaxError {
    pub fn new(kind: SyntaxErrorKind, position: usize) -> Self {
        SyntaxError { position, kind }
    }

    pub fn kind(&self) -> SyntaxErrorKind {
        self.kind
    }

    pub fn position(&self) -> usize {
        self.position
    }
}

impl From<TokenParsingErr> for SyntaxError {
    fn from(value: TokenParsingErr) -> Self {
        match value {
            TokenParsingErr::EscapedNothing(pos) => {
                SyntaxError::new(SyntaxErrorKind::TrailingEscape, pos)
            }
            TokenParsingErr::InvalidCharacterClass(pos) => {
                SyntaxError::new(SyntaxErrorKind::InvalidCharacterClass, pos)
            }
        }
    }
}

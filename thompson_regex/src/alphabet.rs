#[cfg(test)]
use serde::Serialize;
use std::fmt::{Display, Formatter};
use std::ops::RangeInclusive;

/// Label of an NFA transition. `Epsilon` is never part of an alphabet.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Symbol {
    Char(char),
    Epsilon,
}

impl Symbol {
    pub fn is_epsilon(&self) -> bool {
        matches!(self, Symbol::Epsilon)
    }

    pub fn as_char(&self) -> Option<char> {
        match self {
            Symbol::Char(c) => Some(*c),
            Symbol::Epsilon => None,
        }
    }
}

impl From<char> for Symbol {
    fn from(value: char) -> Self {
        Symbol::Char(value)
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Symbol::Char(c) => write!(f, "{c}"),
            Symbol::Epsilon => write!(f, "ε"),
        }
    }
}

/// The bracketed shorthands understood by the parser.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(test, derive(Serialize))]
pub enum CharClass {
    Digit,
    Lower,
    Upper,
}

impl CharClass {
    pub const ALL: [CharClass; 3] = [CharClass::Digit, CharClass::Lower, CharClass::Upper];

    fn range(&self) -> RangeInclusive<char> {
        match self {
            CharClass::Digit => '0'..='9',
            CharClass::Lower => 'a'..='z',
            CharClass::Upper => 'A'..='Z',
        }
    }

    pub fn symbols(&self) -> impl Iterator<Item = char> {
        self.range()
    }

    pub fn contains(&self, c: char) -> bool {
        self.range().contains(&c)
    }

    /// Spelling inside the brackets, e.g. `0-9` for `[0-9]`.
    pub fn body(&self) -> &'static str {
        match self {
            CharClass::Digit => "0-9",
            CharClass::Lower => "a-z",
            CharClass::Upper => "A-Z",
        }
    }

    pub fn from_body(body: &[char]) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|class| class.body().chars().eq(body.iter().copied()))
    }
}

impl Display for CharClass {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.body())
    }
}

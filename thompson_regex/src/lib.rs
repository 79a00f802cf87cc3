//! Regular expressions compiled to a DFA: pattern → AST → Thompson NFA → subset construction.
//!
//! Supported syntax: literals, `\` escapes, `[0-9]`, `[a-z]`, `[A-Z]`, `|`, concatenation,
//! `*`, `?` and `+`, with parentheses for grouping. Unescaped whitespace is ignored.

pub use alphabet::{CharClass, Symbol};
pub use ast::{MAX_GROUP_DEPTH, RegexAstNode, SyntaxError, SyntaxErrorKind};
pub use dfa::{Dfa, MissingTransition};
pub use nfa::Nfa;

use log::debug;
use std::collections::BTreeSet;

mod alphabet;
mod ast;
mod dfa;
mod nfa;
mod thompson;
mod token;

pub fn parse(pattern: &str) -> Result<RegexAstNode, SyntaxError> {
    RegexAstNode::new(pattern)
}

pub fn compile(ast: &RegexAstNode) -> Nfa<usize> {
    ast.thompson()
}

pub fn determinize<S: Ord + Clone>(nfa: &Nfa<S>) -> Dfa<BTreeSet<S>> {
    nfa.subset_construction()
}

pub fn accept<S: Ord + Clone>(dfa: &Dfa<S>, word: &str) -> bool {
    dfa.accept(word)
}

/// A pattern run through the whole pipeline, ready for exact matching.
#[derive(Clone, Debug)]
pub struct Regex {
    dfa: Dfa<BTreeSet<usize>>,
}

impl Regex {
    pub fn new(pattern: &str) -> Result<Self, SyntaxError> {
        let nfa = compile(&parse(pattern)?);
        debug!("compiled {pattern:?} into an NFA of {} states", nfa.states().len());
        let dfa = determinize(&nfa);

        Ok(Self { dfa })
    }

    pub fn is_exact_match(&self, s: &str) -> bool {
        self.dfa.accept(s)
    }

    pub fn dfa(&self) -> &Dfa<BTreeSet<usize>> {
        &self.dfa
    }
}

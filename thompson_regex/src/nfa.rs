use crate::alphabet::Symbol;
use crate::dfa::Dfa;
use log::{debug, trace};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt::{Display, Formatter};
use std::mem;

/// Nondeterministic automaton over `char` with epsilon moves.
///
/// The builder methods keep the automaton closed: every state that appears in a
/// transition or in the accepting set is also in `states`, and every `Symbol::Char`
/// used by a transition is part of the alphabet.
#[derive(Clone, PartialEq, Debug)]
pub struct Nfa<S> {
    alphabet: BTreeSet<char>,
    states: BTreeSet<S>,
    start: S,
    transitions: BTreeMap<S, BTreeMap<Symbol, BTreeSet<S>>>,
    accepting: BTreeSet<S>,
}

impl<S: Ord + Clone> Nfa<S> {
    pub fn new(start: S) -> Self {
        Nfa {
            alphabet: BTreeSet::new(),
            states: BTreeSet::from([start.clone()]),
            start,
            transitions: BTreeMap::new(),
            accepting: BTreeSet::new(),
        }
    }

    pub fn add_state(&mut self, state: S) {
        self.states.insert(state);
    }

    /// Adds `from --symbol--> to`, keeping whatever targets the pair already had.
    pub fn add_transition(&mut self, from: S, symbol: Symbol, to: S) {
        if let Symbol::Char(c) = symbol {
            self.alphabet.insert(c);
        }
        self.states.insert(from.clone());
        self.states.insert(to.clone());
        self.transitions
            .entry(from)
            .or_default()
            .entry(symbol)
            .or_default()
            .insert(to);
    }

    pub fn set_accepting(&mut self, state: S) {
        self.states.insert(state.clone());
        self.accepting.insert(state);
    }

    /// Empties the accepting set and returns what it held. The states stay.
    pub fn take_accepting(&mut self) -> BTreeSet<S> {
        mem::take(&mut self.accepting)
    }

    /// Copies every state, transition and symbol of `other` into `self`.
    /// Start and accepting states of `other` are left to the caller.
    pub fn absorb(&mut self, other: Nfa<S>) {
        self.alphabet.extend(other.alphabet);
        self.states.extend(other.states);
        for (from, by_symbol) in other.transitions {
            let own = self.transitions.entry(from).or_default();
            for (symbol, targets) in by_symbol {
                own.entry(symbol).or_default().extend(targets);
            }
        }
    }

    pub fn alphabet(&self) -> &BTreeSet<char> {
        &self.alphabet
    }

    pub fn states(&self) -> &BTreeSet<S> {
        &self.states
    }

    pub fn start(&self) -> &S {
        &self.start
    }

    pub fn accepting(&self) -> &BTreeSet<S> {
        &self.accepting
    }

    pub fn is_accepting(&self, state: &S) -> bool {
        self.accepting.contains(state)
    }

    pub fn targets(&self, state: &S, symbol: Symbol) -> Option<&BTreeSet<S>> {
        self.transitions.get(state)?.get(&symbol)
    }

    pub fn transitions(&self) -> impl Iterator<Item = (&S, Symbol, &BTreeSet<S>)> {
        self.transitions.iter().flat_map(|(from, by_symbol)| {
            by_symbol
                .iter()
                .map(move |(symbol, targets)| (from, *symbol, targets))
        })
    }

    /// Relabels every state through `f`. `f` must be injective for the result
    /// to accept the same language.
    pub fn remap_states<T: Ord + Clone>(&self, f: impl Fn(&S) -> T) -> Nfa<T> {
        Nfa {
            alphabet: self.alphabet.clone(),
            states: self.states.iter().map(&f).collect(),
            start: f(&self.start),
            transitions: self
                .transitions
                .iter()
                .map(|(from, by_symbol)| {
                    let by_symbol: BTreeMap<Symbol, BTreeSet<T>> = by_symbol
                        .iter()
                        .map(|(symbol, targets)| (*symbol, targets.iter().map(&f).collect()))
                        .collect();
                    (f(from), by_symbol)
                })
                .collect(),
            accepting: self.accepting.iter().map(&f).collect(),
        }
    }

    /// States reachable from `state` through epsilon moves only, `state` included.
    pub fn epsilon_closure(&self, state: &S) -> BTreeSet<S> {
        let mut reachable = BTreeSet::from([state.clone()]);
        let mut stack = vec![state.clone()];

        while let Some(cur) = stack.pop() {
            if let Some(targets) = self.targets(&cur, Symbol::Epsilon) {
                for target in targets {
                    if reachable.insert(target.clone()) {
                        stack.push(target.clone());
                    }
                }
            }
        }

        reachable
    }

    fn step(&self, subset: &BTreeSet<S>, c: char) -> BTreeSet<S> {
        subset
            .iter()
            .filter_map(|state| self.targets(state, Symbol::Char(c)))
            .flatten()
            .flat_map(|target| self.epsilon_closure(target))
            .collect()
    }

    /// Subset construction. Every reachable set of NFA states becomes one DFA state;
    /// the empty set is kept as an ordinary dead state so the result is total over
    /// the alphabet.
    pub fn subset_construction(&self) -> Dfa<BTreeSet<S>> {
        let start = self.epsilon_closure(&self.start);
        let mut dfa = Dfa::new(self.alphabet.clone(), start.clone());

        let mut seen = BTreeSet::from([start.clone()]);
        let mut queue = VecDeque::from([start]);

        while let Some(subset) = queue.pop_front() {
            if !subset.is_disjoint(&self.accepting) {
                dfa.set_accepting(subset.clone());
            }

            for &c in &self.alphabet {
                let next = self.step(&subset, c);
                if seen.insert(next.clone()) {
                    trace!("discovered DFA state #{}: {} NFA states", seen.len() - 1, next.len());
                    queue.push_back(next.clone());
                }
                dfa.add_transition(subset.clone(), c, next);
            }
        }

        debug!(
            "subset construction: {} NFA states -> {} DFA states over {} symbols",
            self.states.len(),
            dfa.states().len(),
            self.alphabet.len()
        );
        dfa
    }
}

impl Display for Nfa<usize> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for state in &self.states {
            let marker = if *state == self.start { ">" } else { " " };
            if self.is_accepting(state) {
                writeln!(f, "{marker}(({state}))")?;
            } else {
                writeln!(f, "{marker}({state})")?;
            }
            if let Some(by_symbol) = self.transitions.get(state) {
                for (symbol, targets) in by_symbol {
                    let targets: Vec<String> = targets.iter().map(|t| t.to_string()).collect();
                    writeln!(f, "    --{symbol}--> {}", targets.join(", "))?;
                }
            }
        }
        Ok(())
    }
}

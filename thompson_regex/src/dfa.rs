use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Display, Formatter};

/// What [`Dfa::accept`] does when the current state has no transition for an
/// input symbol that does belong to the alphabet.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub enum MissingTransition {
    /// Ignore the symbol and keep the current state.
    #[default]
    Stay,
    /// Reject the word, the conventional stuck state.
    Reject,
}

/// Deterministic automaton. The transition function may be partial.
#[derive(Clone, PartialEq, Debug)]
pub struct Dfa<S> {
    alphabet: BTreeSet<char>,
    states: BTreeSet<S>,
    start: S,
    transitions: BTreeMap<S, BTreeMap<char, S>>,
    accepting: BTreeSet<S>,
    on_missing: MissingTransition,
}

impl<S: Ord + Clone> Dfa<S> {
    pub fn new(alphabet: BTreeSet<char>, start: S) -> Self {
        Dfa {
            alphabet,
            states: BTreeSet::from([start.clone()]),
            start,
            transitions: BTreeMap::new(),
            accepting: BTreeSet::new(),
            on_missing: MissingTransition::default(),
        }
    }

    pub fn with_missing_transition(mut self, policy: MissingTransition) -> Self {
        self.on_missing = policy;
        self
    }

    pub fn missing_transition(&self) -> MissingTransition {
        self.on_missing
    }

    /// Sets `from --c--> to`, replacing any previous target of `(from, c)`.
    pub fn add_transition(&mut self, from: S, c: char, to: S) {
        self.alphabet.insert(c);
        self.states.insert(from.clone());
        self.states.insert(to.clone());
        self.transitions.entry(from).or_default().insert(c, to);
    }

    pub fn set_accepting(&mut self, state: S) {
        self.states.insert(state.clone());
        self.accepting.insert(state);
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

    pub fn next_state(&self, state: &S, c: char) -> Option<&S> {
        self.transitions.get(state)?.get(&c)
    }

    pub fn accept(&self, word: &str) -> bool {
        let mut state = &self.start;
        for c in word.chars() {
            if !self.alphabet.contains(&c) {
                return false;
            }
            match self.next_state(state, c) {
                Some(next) => state = next,
                None => {
                    if self.on_missing == MissingTransition::Reject {
                        return false;
                    }
                }
            }
        }
        self.is_accepting(state)
    }

    pub fn remap_states<T: Ord + Clone>(&self, f: impl Fn(&S) -> T) -> Dfa<T> {
        Dfa {
            alphabet: self.alphabet.clone(),
            states: self.states.iter().map(&f).collect(),
            start: f(&self.start),
            transitions: self
                .transitions
                .iter()
                .map(|(from, by_char)| {
                    let by_char: BTreeMap<char, T> =
                        by_char.iter().map(|(c, to)| (*c, f(to))).collect();
                    (f(from), by_char)
                })
                .collect(),
            accepting: self.accepting.iter().map(&f).collect(),
            on_missing: self.on_missing,
        }
    }

    /// Relabels states to their rank in `states`, so the result uses `0..states().len()`.
    pub fn renumbered(&self) -> Dfa<usize> {
        self.remap_states(|state| self.states.range::<S, _>(..state).count())
    }
}

impl Display for Dfa<usize> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for state in &self.states {
            let marker = if *state == self.start { ">" } else { " " };
            if self.is_accepting(state) {
                writeln!(f, "{marker}(({state}))")?;
            } else {
                writeln!(f, "{marker}({state})")?;
            }
            if let Some(by_char) = self.transitions.get(state) {
                for (c, to) in by_char {
                    writeln!(f, "    --{c}--> {to}")?;
                }
            }
        }
        Ok(())
    }
}

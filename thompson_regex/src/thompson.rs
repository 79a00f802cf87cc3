use crate::alphabet::{CharClass, Symbol};
use crate::ast::RegexAstNode;
use crate::nfa::Nfa;

// Every fragment numbers its states `0..=max` and has its start at 0; combinators
// shift children out of each other's way with `remap_states` before merging.

fn max_state(nfa: &Nfa<usize>) -> usize {
    nfa.states().last().copied().unwrap_or(0)
}

fn shifted(nfa: &Nfa<usize>, offset: usize) -> Nfa<usize> {
    nfa.remap_states(|state| state + offset)
}

fn from_char(c: char) -> Nfa<usize> {
    let mut nfa = Nfa::new(0);
    nfa.add_transition(0, Symbol::Char(c), 1);
    nfa.set_accepting(1);
    nfa
}

fn from_class(class: CharClass) -> Nfa<usize> {
    let mut nfa = Nfa::new(0);
    for c in class.symbols() {
        nfa.add_transition(0, Symbol::Char(c), 1);
    }
    nfa.set_accepting(1);
    nfa
}

fn concatenate(mut left: Nfa<usize>, right: &Nfa<usize>) -> Nfa<usize> {
    let right = shifted(right, max_state(&left) + 1);
    let right_start = *right.start();
    let right_accepting = right.accepting().clone();

    // the left accepting states now lead into `right` and stop accepting
    for state in left.take_accepting() {
        left.add_transition(state, Symbol::Epsilon, right_start);
    }
    left.absorb(right);
    for state in right_accepting {
        left.set_accepting(state);
    }
    left
}

/// Lays out the right-nested union `lefts[0] | (lefts[1] | (... | last))` in one
/// pass. Union `i` gets a fresh start right before `lefts[i]` and a fresh accept
/// after everything nested inside it, so inner accepts come first.
fn alternate(lefts: &[Nfa<usize>], last: &Nfa<usize>) -> Nfa<usize> {
    let Some(innermost) = lefts.len().checked_sub(1) else {
        return last.clone();
    };

    let mut nfa = Nfa::new(0);
    let mut offset = 0;
    let mut exits = Vec::with_capacity(lefts.len() + 1);
    for left in lefts {
        let union_start = offset;
        let left = shifted(left, union_start + 1);
        offset = max_state(&left) + 1;
        nfa.add_transition(union_start, Symbol::Epsilon, *left.start());
        nfa.add_transition(union_start, Symbol::Epsilon, offset);
        exits.push(left.accepting().clone());
        nfa.absorb(left);
    }
    let last = shifted(last, offset);
    let end = max_state(&last) + 1;
    exits.push(last.accepting().clone());
    nfa.absorb(last);

    let accept_of = |union: usize| end + innermost - union;
    for (i, exit) in exits.into_iter().enumerate() {
        for state in exit {
            nfa.add_transition(state, Symbol::Epsilon, accept_of(i.min(innermost)));
        }
    }
    for union in 1..=innermost {
        nfa.add_transition(accept_of(union), Symbol::Epsilon, accept_of(union - 1));
    }
    nfa.set_accepting(accept_of(0));
    nfa
}

/// Shared shape of `*`, `?` and `+`: fresh start 0, the child shifted to 1,
/// fresh accept after the child.
fn wrap(inner: &Nfa<usize>, skip: bool, repeat: bool) -> Nfa<usize> {
    let inner = shifted(inner, 1);
    let inner_start = *inner.start();
    let new_accept = max_state(&inner) + 1;
    let old_accepting = inner.accepting().clone();

    let mut nfa = Nfa::new(0);
    nfa.absorb(inner);
    nfa.add_transition(0, Symbol::Epsilon, inner_start);
    if skip {
        nfa.add_transition(0, Symbol::Epsilon, new_accept);
    }

    for state in old_accepting {
        nfa.add_transition(state, Symbol::Epsilon, new_accept);
        if repeat {
            nfa.add_transition(state, Symbol::Epsilon, inner_start);
        }
    }
    nfa.set_accepting(new_accept);
    nfa
}

impl RegexAstNode {
    /// Thompson's construction. The result always numbers its states `0..=max`
    /// with the start state at 0.
    ///
    /// Concatenation and union chains are walked in a loop, so recursion only
    /// follows group nesting.
    pub fn thompson(&self) -> Nfa<usize> {
        match self {
            RegexAstNode::Literal(c) => from_char(*c),
            RegexAstNode::Class(class) => from_class(*class),
            RegexAstNode::Concat(..) => {
                let mut rights = Vec::new();
                let mut head = self;
                while let RegexAstNode::Concat(left, right) = head {
                    rights.push(right.as_ref());
                    head = left.as_ref();
                }
                rights
                    .into_iter()
                    .rev()
                    .fold(head.thompson(), |nfa, right| concatenate(nfa, &right.thompson()))
            }
            RegexAstNode::Union(..) => {
                let mut lefts = Vec::new();
                let mut tail = self;
                while let RegexAstNode::Union(left, right) = tail {
                    lefts.push(left.thompson());
                    tail = right.as_ref();
                }
                alternate(&lefts, &tail.thompson())
            }
            RegexAstNode::Star(inner) => wrap(&inner.thompson(), true, true),
            RegexAstNode::Optional(inner) => wrap(&inner.thompson(), true, false),
            RegexAstNode::Plus(inner) => wrap(&inner.thompson(), false, true),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;
    use std::collections::BTreeSet;

    fn lit(c: char) -> Box<RegexAstNode> {
        Box::new(RegexAstNode::Literal(c))
    }

    fn accepts(ast: &RegexAstNode, s: &str) -> bool {
        ast.thompson().subset_construction().accept(s)
    }

    fn is_contiguous(nfa: &Nfa<usize>) -> bool {
        nfa.states().iter().copied().eq(0..nfa.states().len())
    }

    mod from_char {
        use super::*;

        #[test]
        fn literal_is_two_states_and_one_transition() {
            // when
            let nfa = RegexAstNode::Literal('a').thompson();

            // then
            assert_eq!(nfa.states(), &BTreeSet::from([0, 1]));
            assert_eq!(nfa.start(), &0);
            assert_eq!(nfa.accepting(), &BTreeSet::from([1]));
            assert_eq!(nfa.targets(&0, Symbol::Char('a')), Some(&BTreeSet::from([1])));
            assert_eq!(nfa.transitions().count(), 1);
        }

        #[test]
        fn should_match_char_and_dont_any_other() {
            for i in 32..=126u8 {
                // build nfa for each char
                let pattern_char = i as char;
                let ast = RegexAstNode::Literal(pattern_char);

                // should match the same char
                assert!(accepts(&ast, &pattern_char.to_string()));

                // shouldn't match any other one
                for x in 32..=126u8 {
                    if i != x {
                        assert!(!accepts(&ast, &(x as char).to_string()));
                    }
                }
            }
        }
    }

    mod from_class {
        use super::*;

        #[rstest]
        #[case(CharClass::Digit, 10)]
        #[case(CharClass::Lower, 26)]
        #[case(CharClass::Upper, 26)]
        fn class_converges_on_one_accepting_state(
            #[case] class: CharClass,
            #[case] symbols: usize,
        ) {
            // when
            let nfa = RegexAstNode::Class(class).thompson();

            // then
            assert_eq!(nfa.states().len(), 2);
            assert_eq!(nfa.alphabet().len(), symbols);
            assert_eq!(nfa.transitions().count(), symbols);
            assert!(
                nfa.transitions()
                    .all(|(from, _, to)| *from == 0 && to == &BTreeSet::from([1]))
            );
        }
    }

    mod concatenate {
        use super::*;

        #[test]
        fn right_is_shifted_after_left() {
            // given: >(0) --a--> (1) -ε-> (2) --b--> ((3))
            let ast = RegexAstNode::Concat(lit('a'), lit('b'));

            // when
            let nfa = ast.thompson();

            // then
            assert_eq!(nfa.states(), &BTreeSet::from([0, 1, 2, 3]));
            assert_eq!(nfa.accepting(), &BTreeSet::from([3]));
            assert_eq!(nfa.targets(&1, Symbol::Epsilon), Some(&BTreeSet::from([2])));
            assert_eq!(nfa.targets(&2, Symbol::Char('b')), Some(&BTreeSet::from([3])));
        }

        #[test]
        fn long_literal_chain_compiles() {
            // given
            let pattern = "ab".repeat(6000);
            let ast = RegexAstNode::new(&pattern).unwrap();

            // when
            let nfa = ast.thompson();

            // then
            assert_eq!(nfa.states().len(), 4 * 6000);
            assert!(is_contiguous(&nfa));
            assert_eq!(nfa.accepting(), &BTreeSet::from([4 * 6000 - 1]));
            assert!(nfa.subset_construction().accept(&pattern));
        }

        #[rstest]
        #[case('a', 'b', "ab", true)]
        #[case('1', '2', "12", true)]
        #[case('z', 'z', "zz", true)]
        #[case('a', 'b', "a", false)]
        #[case('a', 'b', "abc", false)]
        #[case('a', 'b', "", false)]
        #[case('a', 'b', "ba", false)]
        #[case('a', 'b', "aa", false)]
        fn should_match_concatenated_string(
            #[case] char1: char,
            #[case] char2: char,
            #[case] input: &str,
            #[case] expected: bool,
        ) {
            //given
            let ast = RegexAstNode::Concat(lit(char1), lit(char2));

            //when
            let matched = accepts(&ast, input);

            //then
            assert_eq!(matched, expected);
        }
    }

    mod alternate {
        use super::*;

        #[test]
        fn union_gets_fresh_start_and_accept() {
            // when
            let nfa = RegexAstNode::Union(lit('a'), lit('b')).thompson();

            // then
            assert_eq!(nfa.states(), &BTreeSet::from([0, 1, 2, 3, 4, 5]));
            assert_eq!(nfa.targets(&0, Symbol::Epsilon), Some(&BTreeSet::from([1, 3])));
            assert_eq!(nfa.targets(&2, Symbol::Epsilon), Some(&BTreeSet::from([5])));
            assert_eq!(nfa.targets(&4, Symbol::Epsilon), Some(&BTreeSet::from([5])));
            assert_eq!(nfa.accepting(), &BTreeSet::from([5]));
        }

        #[test]
        fn chained_union_nests_to_the_right() {
            // given: a | (b | c)
            let ast = RegexAstNode::new("a|b|c").unwrap();

            // when
            let nfa = ast.thompson();

            // then: inner union spans 3..=8, outer accept is 9
            assert_eq!(nfa.states().len(), 10);
            assert_eq!(nfa.targets(&0, Symbol::Epsilon), Some(&BTreeSet::from([1, 3])));
            assert_eq!(nfa.targets(&3, Symbol::Epsilon), Some(&BTreeSet::from([4, 6])));
            assert_eq!(nfa.targets(&2, Symbol::Epsilon), Some(&BTreeSet::from([9])));
            assert_eq!(nfa.targets(&5, Symbol::Epsilon), Some(&BTreeSet::from([8])));
            assert_eq!(nfa.targets(&7, Symbol::Epsilon), Some(&BTreeSet::from([8])));
            assert_eq!(nfa.targets(&8, Symbol::Epsilon), Some(&BTreeSet::from([9])));
            assert_eq!(nfa.accepting(), &BTreeSet::from([9]));
        }

        #[test]
        fn long_union_chain_compiles() {
            // given
            let alternatives: Vec<String> = (0..6000).map(|i| (i % 10).to_string()).collect();
            let ast = RegexAstNode::new(&alternatives.join("|")).unwrap();

            // when
            let nfa = ast.thompson();

            // then: two states per literal, a start and an accept per union
            assert_eq!(nfa.states().len(), 4 * 6000 - 2);
            assert!(is_contiguous(&nfa));
            assert_eq!(nfa.accepting().len(), 1);
        }

        #[rstest]
        #[case('a', 'b', "a", true)]
        #[case('a', 'b', "b", true)]
        #[case('z', 'z', "z", true)]
        #[case('a', 'b', "c", false)]
        #[case('a', 'b', "ab", false)]
        #[case('a', 'b', "bb", false)]
        #[case('a', 'b', "", false)]
        fn should_match_alternate_string(
            #[case] char1: char,
            #[case] char2: char,
            #[case] input: &str,
            #[case] expected: bool,
        ) {
            //given
            let ast = RegexAstNode::Union(lit(char1), lit(char2));

            //when
            let matched = accepts(&ast, input);

            //then
            assert_eq!(matched, expected);
        }
    }

    mod kleene_star {
        use super::*;

        #[test]
        fn star_loops_back_and_can_skip() {
            // when
            let nfa = RegexAstNode::Star(lit('a')).thompson();

            // then: 0 -ε-> {1, 3}, 1 --a--> 2, 2 -ε-> {1, 3}
            assert_eq!(nfa.targets(&0, Symbol::Epsilon), Some(&BTreeSet::from([1, 3])));
            assert_eq!(nfa.targets(&2, Symbol::Epsilon), Some(&BTreeSet::from([1, 3])));
            assert_eq!(nfa.accepting(), &BTreeSet::from([3]));
        }

        #[rstest]
        #[case('a', "", true)]
        #[case('a', "a", true)]
        #[case('c', "ccccc", true)]
        #[case('a', "b", false)]
        #[case('a', "aaab", false)]
        #[case('a', "baaa", false)]
        fn should_match_kleene_star_string(
            #[case] nfa_char: char,
            #[case] input: &str,
            #[case] expected: bool,
        ) {
            //given
            let ast = RegexAstNode::Star(lit(nfa_char));

            //when
            let matched = accepts(&ast, input);

            //then
            assert_eq!(matched, expected);
        }

        #[rstest]
        #[case("", true)]
        #[case("abba", true)]
        #[case("010", false)]
        #[case("abc", false)]
        fn should_match_alternation_with_kleene_star(#[case] input: &str, #[case] expected: bool) {
            // given: build (a|b)*
            let ast = RegexAstNode::Star(Box::new(RegexAstNode::Union(lit('a'), lit('b'))));

            // when
            let matched = accepts(&ast, input);

            // then
            assert_eq!(matched, expected);
        }
    }

    mod zero_or_one {
        use super::*;

        #[test]
        fn optional_has_no_loop_back() {
            // when
            let nfa = RegexAstNode::Optional(lit('a')).thompson();

            // then
            assert_eq!(nfa.targets(&0, Symbol::Epsilon), Some(&BTreeSet::from([1, 3])));
            assert_eq!(nfa.targets(&2, Symbol::Epsilon), Some(&BTreeSet::from([3])));
        }

        #[rstest]
        #[case('a', "", true)]
        #[case('a', "a", true)]
        #[case('a', "aa", false)]
        #[case('a', "b", false)]
        #[case('a', "ab", false)]
        fn should_match_zero_or_one(
            #[case] nfa_char: char,
            #[case] input: &str,
            #[case] expected: bool,
        ) {
            // given
            let ast = RegexAstNode::Optional(lit(nfa_char));

            // when
            let matched = accepts(&ast, input);

            // then
            assert_eq!(matched, expected);
        }
    }

    mod one_or_more {
        use super::*;

        #[test]
        fn plus_cannot_skip_the_first_pass() {
            // when
            let nfa = RegexAstNode::Plus(lit('a')).thompson();

            // then
            assert_eq!(nfa.targets(&0, Symbol::Epsilon), Some(&BTreeSet::from([1])));
            assert_eq!(nfa.targets(&2, Symbol::Epsilon), Some(&BTreeSet::from([1, 3])));
        }

        #[rstest]
        #[case('a', "a", true)]
        #[case('1', "1111", true)]
        #[case('a', "", false)]
        #[case('a', "aaab", false)]
        #[case('@', "@@.@@", false)]
        fn should_match_one_or_more(
            #[case] nfa_char: char,
            #[case] input: &str,
            #[case] expected: bool,
        ) {
            // given
            let ast = RegexAstNode::Plus(lit(nfa_char));

            // when
            let matched = accepts(&ast, input);

            // then
            assert_eq!(matched, expected);
        }
    }

    #[rstest]
    #[case("a")]
    #[case("[0-9]")]
    #[case("ab|c")]
    #[case("(a|b)*c")]
    #[case("a?b+(c|[A-Z])*")]
    #[case("((a*)*)+")]
    fn compiled_states_are_contiguous_from_zero(#[case] pattern: &str) {
        // when
        let nfa = RegexAstNode::new(pattern).unwrap().thompson();

        // then
        assert_eq!(nfa.start(), &0);
        assert!(is_contiguous(&nfa));
        assert!(nfa.accepting().iter().all(|s| nfa.states().contains(s)));
    }

    #[test]
    fn deeply_nested_groups_compile() {
        // given
        let pattern = format!("{}a{}", "(".repeat(200), ")*".repeat(200));
        let ast = RegexAstNode::new(&pattern).unwrap();

        // when
        let nfa = ast.thompson();

        // then
        assert_eq!(nfa.states().len(), 2 + 2 * 200);
        assert!(accepts(&ast, ""));
        assert!(accepts(&ast, "aaa"));
        assert!(!accepts(&ast, "ab"));
    }

    #[test]
    fn nested_stars_do_not_overwrite_each_other() {
        // given: (a*b*)* must keep both inner loops
        let ast = RegexAstNode::new("(a*b*)*").unwrap();

        // when && then
        for word in ["", "a", "b", "ab", "ba", "aabba", "bbbab"] {
            assert!(accepts(&ast, word), "{word} should match");
        }
        assert!(!accepts(&ast, "abc"));
    }
}

// tests/grammar_expansion.rs
mod common;

use common::MeanRandom;
use symbios_tree::{PcgRandom, RuleSet, expand};

#[test]
fn test_single_rule_doubles() {
    // F=FF applied twice on "F": F -> FF -> FFFF.
    let rules = RuleSet::parse("F=FF");
    let mut rng = PcgRandom::seeded(1);
    assert_eq!(expand("F", &rules, 2, false, &mut rng), "FFFF");
}

#[test]
fn test_empty_rule_set_returns_axiom() {
    let rules = RuleSet::new();
    let mut rng = PcgRandom::seeded(2);
    for iterations in 0..6 {
        assert_eq!(expand("F[+X]A-C", &rules, iterations, true, &mut rng), "F[+X]A-C");
    }
}

#[test]
fn test_empty_axiom_expands_to_nothing() {
    let rules = RuleSet::parse("F=FF\nX=F[<X][>X]");
    let mut rng = PcgRandom::seeded(3);
    assert_eq!(expand("", &rules, 5, true, &mut rng), "");
}

#[test]
fn test_zero_iterations_is_identity() {
    let rules = RuleSet::parse("X=F[<X][>X]");
    let mut rng = PcgRandom::seeded(4);
    assert_eq!(expand("X", &rules, 0, false, &mut rng), "X");
}

#[test]
fn test_binary_tree_expansion() {
    let rules = RuleSet::parse("X=F[<X][>X]");
    let mut rng = MeanRandom;
    assert_eq!(expand("X", &rules, 1, false, &mut rng), "F[<X][>X]");
    assert_eq!(
        expand("X", &rules, 2, false, &mut rng),
        "F[<F[<X][>X]][>F[<X][>X]]"
    );

    // Every pass adds one F per X and doubles the X count: 2^n - 1 segments.
    let codes = expand("X", &rules, 3, false, &mut rng);
    assert_eq!(codes.len(), 57);
    assert_eq!(codes.matches('F').count(), 7);
    assert_eq!(codes.matches('X').count(), 8);
}

#[test]
fn test_deterministic_rules_ignore_the_rng() {
    let rules = RuleSet::parse("F=F[+F]F\nX=F-[[X]+X]+F[+FX]-X");
    let a = expand("X", &rules, 4, false, &mut PcgRandom::seeded(10));
    let b = expand("X", &rules, 4, false, &mut PcgRandom::seeded(99));
    assert_eq!(a, b);
}

#[test]
fn test_stochastic_is_reproducible_per_seed() {
    let rules = RuleSet::parse("X=F[<X]\nX=F[>X]\nX=F[<X][>X]");
    let a = expand("X", &rules, 5, true, &mut PcgRandom::seeded(42));
    let b = expand("X", &rules, 5, true, &mut PcgRandom::seeded(42));
    assert_eq!(a, b);
}

#[test]
fn test_length_grows_with_iterations() {
    let rules = RuleSet::parse("F=F[+F]F\nX=F[<X]\nX=FX");
    let mut rng = PcgRandom::seeded(8);
    let mut previous = 0;
    for iterations in 0..5 {
        let len = expand("X", &rules, iterations, true, &mut rng).len();
        assert!(len >= previous, "length shrank at iteration {iterations}");
        previous = len;
    }
}

#[test]
fn test_symbols_without_rules_stay_terminal() {
    let rules = RuleSet::parse("A=AC");
    let mut rng = PcgRandom::seeded(0);
    // C has no rule, so the C introduced by A is never rewritten.
    assert_eq!(expand("A", &rules, 3, false, &mut rng), "ACCC");
}

//! Production rules and axiom expansion.
//!
//! Only the four advance symbols `F`, `X`, `A` and `C` are rewritable. Each
//! iteration rewrites them class by class in that fixed order, sweeping the
//! string once per class, so text inserted for a class is not rewritten again
//! until the next iteration.

use crate::error::TreeError;
use crate::random::RandomSource;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// Rewritable symbols in the order they are processed within one iteration.
pub const ADVANCE_SYMBOLS: [char; 4] = ['F', 'X', 'A', 'C'];

/// Expansion stops starting new iterations once the string grows past this.
pub const MAX_EXPANSION_LEN: usize = 1 << 22;

/// Returns true for `F`, `X`, `A` and `C`.
pub fn is_advance_symbol(c: char) -> bool {
    ADVANCE_SYMBOLS.contains(&c)
}

fn slot(symbol: char) -> Option<usize> {
    ADVANCE_SYMBOLS.iter().position(|&s| s == symbol)
}

/// Candidate replacements for each advance symbol.
///
/// A symbol with several candidates is stochastic; candidates keep the order
/// in which they were added.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
    candidates: [Vec<String>; 4],
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses newline-separated `<symbol>=<replacement>` lines.
    ///
    /// Lines without `=` or whose left side is not one of the advance symbols
    /// are skipped with a warning. Blank lines are ignored silently.
    pub fn parse(text: &str) -> Self {
        let mut rules = Self::new();
        for (line_no, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            let Some((lhs, rhs)) = line.split_once('=') else {
                warn!("rule line {}: missing '=' in {:?}, skipped", line_no + 1, line);
                continue;
            };
            let mut chars = lhs.trim().chars();
            match (chars.next(), chars.next()) {
                (Some(symbol), None) if is_advance_symbol(symbol) => {
                    rules.push_candidate(symbol, rhs.trim());
                }
                _ => warn!(
                    "rule line {}: {:?} is not a rewritable symbol, skipped",
                    line_no + 1,
                    lhs.trim()
                ),
            }
        }
        rules
    }

    /// Adds one candidate replacement for `symbol`.
    pub fn add(&mut self, symbol: char, replacement: impl Into<String>) -> Result<(), TreeError> {
        if !is_advance_symbol(symbol) {
            return Err(TreeError::UnknownSymbol(symbol));
        }
        self.push_candidate(symbol, replacement);
        Ok(())
    }

    /// Builder form of [`add`](Self::add).
    pub fn with_rule(
        mut self,
        symbol: char,
        replacement: impl Into<String>,
    ) -> Result<Self, TreeError> {
        self.add(symbol, replacement)?;
        Ok(self)
    }

    fn push_candidate(&mut self, symbol: char, replacement: impl Into<String>) {
        if let Some(idx) = slot(symbol) {
            self.candidates[idx].push(replacement.into());
        }
    }

    /// Candidates registered for `symbol`; empty for symbols without rules.
    pub fn candidates(&self, symbol: char) -> &[String] {
        match slot(symbol) {
            Some(idx) => &self.candidates[idx],
            None => &[],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.iter().all(Vec::is_empty)
    }

    /// Total number of candidate rules across all symbols.
    pub fn len(&self) -> usize {
        self.candidates.iter().map(Vec::len).sum()
    }
}

/// Expands `axiom` through `rules` for `iterations` passes.
///
/// With `stochastic` set, a symbol with several candidates gets an
/// independent uniform pick per occurrence. Without it the first candidate is
/// always used. Symbols without candidates stay as literal terminals.
pub fn expand<R: RandomSource + ?Sized>(
    axiom: &str,
    rules: &RuleSet,
    iterations: u32,
    stochastic: bool,
    rng: &mut R,
) -> String {
    let mut current = axiom.to_owned();
    if current.is_empty() || rules.is_empty() {
        return current;
    }

    for iteration in 0..iterations {
        if current.len() > MAX_EXPANSION_LEN {
            warn!(
                "expansion stopped after {} of {} iterations: {} symbols exceeds the limit",
                iteration,
                iterations,
                current.len()
            );
            break;
        }
        for symbol in ADVANCE_SYMBOLS {
            let candidates = rules.candidates(symbol);
            if candidates.is_empty() || !current.contains(symbol) {
                continue;
            }
            current = rewrite_class(&current, symbol, candidates, stochastic, rng);
        }
    }

    debug!(
        "expanded axiom {:?} over {} iterations into {} symbols",
        axiom,
        iterations,
        current.len()
    );
    current
}

/// One left-to-right sweep replacing every occurrence of `symbol`.
fn rewrite_class<R: RandomSource + ?Sized>(
    input: &str,
    symbol: char,
    candidates: &[String],
    stochastic: bool,
    rng: &mut R,
) -> String {
    let mut out = String::with_capacity(input.len() * 2);
    for c in input.chars() {
        if c != symbol {
            out.push(c);
            continue;
        }
        let pick = if stochastic && candidates.len() > 1 {
            rng.choose(candidates.len())
        } else {
            0
        };
        out.push_str(&candidates[pick]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::PcgRandom;

    #[test]
    fn test_parse_skips_malformed_lines() {
        let rules = RuleSet::parse("F=FF\nnot a rule\nQ=FF\n\nX = F[+X]\r\nFX=F");
        assert_eq!(rules.candidates('F'), ["FF".to_string()]);
        assert_eq!(rules.candidates('X'), ["F[+X]".to_string()]);
        assert!(rules.candidates('A').is_empty());
        assert_eq!(rules.len(), 2);
    }

    #[test]
    fn test_parse_keeps_alternatives_in_order() {
        let rules = RuleSet::parse("X=F[<X]\nX=F[>X]\nX=FX");
        assert_eq!(rules.candidates('X').len(), 3);
        assert_eq!(rules.candidates('X')[2], "FX");
    }

    #[test]
    fn test_add_rejects_non_advance_symbol() {
        let mut rules = RuleSet::new();
        assert!(matches!(rules.add('+', "F"), Err(TreeError::UnknownSymbol('+'))));
        assert!(rules.add('C', "CC").is_ok());
    }

    #[test]
    fn test_class_order_is_f_then_x() {
        // X becomes F in the X pass, after the F pass already ran.
        let rules = RuleSet::new()
            .with_rule('F', "FF")
            .and_then(|r| r.with_rule('X', "F"))
            .unwrap();
        let mut rng = PcgRandom::seeded(0);
        assert_eq!(expand("X", &rules, 1, false, &mut rng), "F");
        assert_eq!(expand("X", &rules, 2, false, &mut rng), "FF");
    }

    #[test]
    fn test_inserted_text_is_not_rewritten_in_same_sweep() {
        let rules = RuleSet::parse("F=FF");
        let mut rng = PcgRandom::seeded(0);
        assert_eq!(expand("F", &rules, 1, false, &mut rng), "FF");
        assert_eq!(expand("F", &rules, 2, false, &mut rng), "FFFF");
    }

    #[test]
    fn test_non_stochastic_uses_first_candidate() {
        let rules = RuleSet::parse("F=F+\nF=F-");
        let mut rng = PcgRandom::seeded(11);
        assert_eq!(expand("F", &rules, 2, false, &mut rng), "F++");
    }

    #[test]
    fn test_stochastic_draws_every_candidate() {
        let rules = RuleSet::parse("A=+\nA=-");
        let mut rng = PcgRandom::seeded(5);
        let out = expand(&"A".repeat(200), &rules, 1, true, &mut rng);
        assert_eq!(out.len(), 200);
        assert!(out.contains('+'));
        assert!(out.contains('-'));
        assert!(!out.contains('A'));
    }
}

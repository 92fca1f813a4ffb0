// tests/common/mod.rs
#![allow(dead_code)]

use symbios_tree::{PcgRandom, RandomSource};

/// Every normal draw lands exactly on its mean and every choice is the first
/// candidate. Angles are exact and every leaf roll succeeds.
pub struct MeanRandom;

impl RandomSource for MeanRandom {
    fn uniform(&mut self) -> f32 {
        0.0
    }

    fn choose(&mut self, _len: usize) -> usize {
        0
    }

    fn normal(&mut self, mean: f32, _std_dev: f32) -> f32 {
        mean
    }
}

/// Normal draws land `offset` above the mean. An offset of 1.5 floors every
/// leaf roll to 1, so no leaves are emitted.
pub struct OffsetRandom(pub f32);

impl RandomSource for OffsetRandom {
    fn uniform(&mut self) -> f32 {
        0.0
    }

    fn choose(&mut self, _len: usize) -> usize {
        0
    }

    fn normal(&mut self, mean: f32, _std_dev: f32) -> f32 {
        mean + self.0
    }
}

const MOVES: [char; 11] = ['F', 'X', 'A', 'C', '+', '-', '^', '&', '<', '>', '|'];

/// Random instruction string with balanced brackets.
pub fn balanced_codes(rng: &mut PcgRandom, len: usize, max_depth: usize) -> String {
    let mut out = String::with_capacity(len + max_depth);
    let mut depth = 0usize;
    for _ in 0..len {
        let roll = rng.uniform();
        if roll < 0.15 && depth < max_depth {
            out.push('[');
            depth += 1;
        } else if roll < 0.3 && depth > 0 {
            out.push(']');
            depth -= 1;
        } else {
            out.push(MOVES[rng.choose(MOVES.len())]);
        }
    }
    out.extend(std::iter::repeat_n(']', depth));
    out
}

pub fn count_advances(codes: &str) -> usize {
    codes.chars().filter(|c| matches!(c, 'F' | 'X' | 'A' | 'C')).count()
}

/// Number of `]` directly preceded by an advance symbol.
pub fn count_tip_pops(codes: &str) -> usize {
    let chars: Vec<char> = codes.chars().collect();
    chars
        .windows(2)
        .filter(|w| matches!(w[0], 'F' | 'X' | 'A' | 'C') && w[1] == ']')
        .count()
}

//! Text hashing with the cellular automaton, plus the pluggable hash seam
//! used by Merkle trees and blocks.
//!
//! Encoding rules:
//! - Every input byte contributes its 8 bits, most significant first.
//! - Shorter than 256 bits: append a single `1` then zero-pad to 256.
//! - Longer than 256 bits: XOR-fold, `state[i % 256] ^= bit[i]`. The fold is
//!   lossy and carries no length, so distinct long inputs can collide before
//!   the automaton runs.
//! - Exactly 256 bits: used as-is, with no padding bit.

use crate::automaton::{BitState, CellularAutomaton, Rule, STATE_BITS};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Rule used when none is configured.
pub const DEFAULT_RULE: u8 = 30;
/// Generations run when none is configured.
pub const DEFAULT_STEPS: usize = 100;
/// Length of a hex digest of a 256-bit state.
pub const DIGEST_HEX_LEN: usize = STATE_BITS / 4;

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

/// Converts input bytes into the initial automaton state.
pub fn encode(input: impl AsRef<[u8]>) -> BitState {
    let bytes = input.as_ref();
    let bit_len = bytes.len() * 8;
    let mut cells = [false; STATE_BITS];

    let bits = bytes
        .iter()
        .flat_map(|byte| (0..8).rev().map(move |shift| (byte >> shift) & 1 == 1));

    if bit_len > STATE_BITS {
        for (i, bit) in bits.enumerate() {
            cells[i % STATE_BITS] ^= bit;
        }
    } else {
        for (cell, bit) in cells.iter_mut().zip(bits) {
            *cell = bit;
        }
        if bit_len < STATE_BITS {
            cells[bit_len] = true;
        }
    }

    BitState::from_cells(cells)
}

/// Packs each group of 4 cells into one lowercase hex nibble, most
/// significant cell first.
pub fn decode(state: &BitState) -> String {
    state
        .cells()
        .chunks(4)
        .map(|nibble| {
            let value = nibble
                .iter()
                .fold(0usize, |acc, &bit| (acc << 1) | bit as usize);
            HEX_DIGITS[value] as char
        })
        .collect()
}

/// `decode(evolve^steps(encode(input)))`. Zero steps returns the encoding.
pub fn ca_hash(input: impl AsRef<[u8]>, rule: Rule, steps: usize) -> String {
    let mut automaton = CellularAutomaton::new(rule, encode(input));
    automaton.run(steps);
    decode(automaton.state())
}

/// A hash primitive producing a hex digest from text.
pub trait HashFunction {
    fn digest(&self, input: &str) -> String;
}

/// The primitives a chain can be configured with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "algorithm", rename_all = "snake_case")]
pub enum HashAlgorithm {
    Cellular { rule: u8, steps: usize },
    Sha256,
}

impl HashAlgorithm {
    pub fn cellular(rule: u8, steps: usize) -> Self {
        HashAlgorithm::Cellular { rule, steps }
    }
}

impl Default for HashAlgorithm {
    fn default() -> Self {
        HashAlgorithm::Cellular {
            rule: DEFAULT_RULE,
            steps: DEFAULT_STEPS,
        }
    }
}

impl HashFunction for HashAlgorithm {
    fn digest(&self, input: &str) -> String {
        match *self {
            HashAlgorithm::Cellular { rule, steps } => ca_hash(input, Rule::new(rule), steps),
            HashAlgorithm::Sha256 => hex::encode(Sha256::digest(input.as_bytes())),
        }
    }
}

/// Adapts a plain closure into a [`HashFunction`].
#[derive(Debug, Clone, Copy)]
pub struct FnHash<F>(pub F);

impl<F> HashFunction for FnHash<F>
where
    F: Fn(&str) -> String,
{
    fn digest(&self, input: &str) -> String {
        (self.0)(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abc_fixture_without_evolution() {
        // "abc" = 0x61 0x62 0x63, then the padding bit as 0x80.
        let expected = format!("616263{}{}", "80", "0".repeat(56));
        assert_eq!(ca_hash("abc", Rule::new(30), 0), expected);
    }

    #[test]
    fn test_empty_input_is_single_padding_bit() {
        let expected = format!("8{}", "0".repeat(63));
        assert_eq!(ca_hash("", Rule::new(30), 0), expected);
    }

    #[test]
    fn test_exactly_256_bits_gets_no_padding() {
        let input = "A".repeat(32);
        assert_eq!(ca_hash(&input, Rule::new(30), 0), "41".repeat(32));
    }

    #[test]
    fn test_long_input_is_xor_folded() {
        // 33 bytes: the 33rd byte folds onto the first.
        let mut input = "A".repeat(32);
        input.push('C');
        let expected = format!("02{}", "41".repeat(31));
        assert_eq!(ca_hash(&input, Rule::new(30), 0), expected);
    }

    #[test]
    fn test_fold_collisions_are_preserved() {
        // Two 64-byte inputs whose halves XOR to the same state collide.
        let a = format!("{}{}", "a".repeat(32), "b".repeat(32));
        let b = format!("{}{}", "b".repeat(32), "a".repeat(32));
        assert_ne!(a, b);
        assert_eq!(encode(&a), encode(&b));
        assert_eq!(
            ca_hash(&a, Rule::new(30), DEFAULT_STEPS),
            ca_hash(&b, Rule::new(30), DEFAULT_STEPS)
        );
    }

    #[test]
    fn test_zero_steps_is_encode_then_decode() {
        let long = "x".repeat(100);
        for text in ["", "abc", "Hello, World!", long.as_str()] {
            assert_eq!(ca_hash(text, Rule::new(110), 0), decode(&encode(text)));
        }
    }

    #[test]
    fn test_digest_is_64_lowercase_hex() {
        let inputs = ["", "a", "Hello, World!", "Blockchain with Cellular Automaton"];
        for rule in [0u8, 30, 90, 110, 255] {
            for steps in [0usize, 1, 17, 100] {
                for input in inputs {
                    let digest = ca_hash(input, Rule::new(rule), steps);
                    assert_eq!(digest.len(), DIGEST_HEX_LEN);
                    assert!(digest.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f')));
                    assert_eq!(digest, ca_hash(input, Rule::new(rule), steps));
                }
            }
        }
    }

    #[test]
    fn test_different_inputs_give_different_digests() {
        let h1 = ca_hash("Hello, World!", Rule::new(30), 100);
        let h2 = ca_hash("Hello, World?", Rule::new(30), 100);
        let h3 = ca_hash("Blockchain with Cellular Automaton", Rule::new(30), 100);
        assert_ne!(h1, h2);
        assert_ne!(h1, h3);
        assert_ne!(h2, h3);
    }

    #[test]
    fn test_rule_30_pins_leading_nibble_high() {
        // Under rule 30 the leftmost cell becomes `c | r` and then stays 1,
        // so these digests never start with '0'.
        for i in 0..20 {
            let digest = ca_hash(format!("block-{}", i), Rule::new(30), DEFAULT_STEPS);
            assert!(digest.as_bytes()[0] >= b'8', "{}", digest);
        }
    }

    #[test]
    fn test_single_bit_flips_spread_through_digest() {
        let rule = Rule::new(DEFAULT_RULE);
        let mut flipped_bits = 0usize;
        let mut trials = 0usize;

        for i in 0..6 {
            let text = format!("transaction-{:03}:alice:bob:{}", i, i * 37);
            let base = encode(&text);
            let mut ca = CellularAutomaton::new(rule, base);
            ca.run(DEFAULT_STEPS);
            let base_out = *ca.state();

            let bytes = text.as_bytes();
            for bit in (0..bytes.len() * 8).step_by(11) {
                let mut changed = bytes.to_vec();
                changed[bit / 8] ^= 1 << (7 - bit % 8);
                let mut ca = CellularAutomaton::new(rule, encode(&changed));
                ca.run(DEFAULT_STEPS);
                let distance = base_out.hamming_distance(ca.state());
                assert!(distance > 0, "flip at bit {} of {:?} left digest unchanged", bit, text);
                flipped_bits += distance;
                trials += 1;
            }
        }

        let mean = flipped_bits as f64 / (trials * STATE_BITS) as f64;
        assert!(mean > 0.15 && mean < 0.85, "mean changed fraction {}", mean);
    }

    #[test]
    fn test_sha256_algorithm_matches_reference() {
        assert_eq!(
            HashAlgorithm::Sha256.digest("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_cellular_algorithm_delegates_to_ca_hash() {
        let algorithm = HashAlgorithm::cellular(90, 12);
        assert_eq!(algorithm.digest("abc"), ca_hash("abc", Rule::new(90), 12));
        assert_eq!(HashAlgorithm::default(), HashAlgorithm::cellular(30, 100));
    }

    #[test]
    fn test_fn_hash_adapter() {
        let upper = FnHash(|s: &str| s.to_uppercase());
        assert_eq!(upper.digest("ab"), "AB");
    }
}

//! Consensus strategies for finalizing blocks.
//!
//! A chain picks one strategy at construction. Proof of work searches for a
//! nonce whose block hash meets a leading-zero target; proof of stake draws a
//! validator with probability proportional to stake, using a generator owned
//! by the strategy.

use crate::blockchain::{Block, StakeRegistry, Stakeholder};
use crate::error::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Validator recorded when no stakeholder can be drawn, and on the
/// proof-of-stake genesis block.
pub const SYSTEM_VALIDATOR: &str = "System";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsensusKind {
    #[default]
    ProofOfWork,
    ProofOfStake,
}

/// Nonce search against `difficulty` leading hex zeros.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProofOfWork {
    difficulty: usize,
}

impl ProofOfWork {
    pub fn new(difficulty: usize) -> Self {
        ProofOfWork { difficulty }
    }

    pub fn difficulty(&self) -> usize {
        self.difficulty
    }

    /// Mines `block` in place. The search is unbounded.
    pub fn finalize_block(&self, block: &mut Block) -> Result<Duration> {
        block.mine(self.difficulty)
    }
}

/// Stake-weighted validator selection.
#[derive(Debug, Clone)]
pub struct ProofOfStake {
    registry: StakeRegistry,
    rng: StdRng,
}

impl ProofOfStake {
    /// Seeds the selection generator from system entropy.
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Reproducible selection sequence, mainly for tests and simulations.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        ProofOfStake {
            registry: StakeRegistry::new(),
            rng,
        }
    }

    pub fn add_stakeholder(&mut self, address: impl Into<String>, stake: f64) -> Result<()> {
        self.registry.add(address, stake)
    }

    pub fn registry(&self) -> &StakeRegistry {
        &self.registry
    }

    pub fn stakeholders(&self) -> &[Stakeholder] {
        self.registry.stakeholders()
    }

    pub fn total_stake(&self) -> f64 {
        self.registry.total_stake()
    }

    pub fn is_known_validator(&self, address: &str) -> bool {
        address == SYSTEM_VALIDATOR || self.registry.contains(address)
    }

    /// Draws `r` uniformly from `[0, total_stake)` and returns the first
    /// stakeholder whose cumulative stake reaches `r`.
    pub fn select_validator(&mut self) -> String {
        if self.registry.is_empty() {
            return SYSTEM_VALIDATOR.to_string();
        }

        let total = self.registry.total_stake();
        let point = if total > 0.0 {
            self.rng.gen_range(0.0..total)
        } else {
            0.0
        };

        let validator = self
            .registry
            .locate(point)
            .map(|stakeholder| stakeholder.address.clone())
            .unwrap_or_else(|| SYSTEM_VALIDATOR.to_string());
        debug!("Selected validator {} (draw {:.3} of {:.3})", validator, point, total);
        validator
    }

    pub fn finalize_block(&mut self, block: &mut Block) -> Result<Duration> {
        let validator = self.select_validator();
        block.validate(&validator)
    }
}

impl Default for ProofOfStake {
    fn default() -> Self {
        Self::new()
    }
}

/// The strategy a chain finalizes its blocks with.
#[derive(Debug, Clone)]
pub enum Consensus {
    ProofOfWork(ProofOfWork),
    ProofOfStake(ProofOfStake),
}

impl Consensus {
    /// `difficulty` is ignored for proof of stake.
    pub fn new(kind: ConsensusKind, difficulty: usize) -> Self {
        match kind {
            ConsensusKind::ProofOfWork => Consensus::ProofOfWork(ProofOfWork::new(difficulty)),
            ConsensusKind::ProofOfStake => Consensus::ProofOfStake(ProofOfStake::new()),
        }
    }

    pub fn kind(&self) -> ConsensusKind {
        match self {
            Consensus::ProofOfWork(_) => ConsensusKind::ProofOfWork,
            Consensus::ProofOfStake(_) => ConsensusKind::ProofOfStake,
        }
    }

    pub fn difficulty(&self) -> Option<usize> {
        match self {
            Consensus::ProofOfWork(pow) => Some(pow.difficulty()),
            Consensus::ProofOfStake(_) => None,
        }
    }

    pub fn stake(&self) -> Option<&ProofOfStake> {
        match self {
            Consensus::ProofOfStake(pos) => Some(pos),
            Consensus::ProofOfWork(_) => None,
        }
    }

    /// Mines or validates `block` and hands it back with the time spent.
    pub fn finalize_block(&mut self, mut block: Block) -> Result<(Block, Duration)> {
        let elapsed = match self {
            Consensus::ProofOfWork(pow) => pow.finalize_block(&mut block)?,
            Consensus::ProofOfStake(pos) => pos.finalize_block(&mut block)?,
        };
        Ok((block, elapsed))
    }

    /// Genesis skips the search: proof of stake stamps it with the system
    /// validator and proof of work accepts it unmined.
    pub fn finalize_genesis(&self, mut block: Block) -> Result<Block> {
        if let Consensus::ProofOfStake(_) = self {
            block.validate(SYSTEM_VALIDATOR)?;
        }
        Ok(block)
    }
}

impl From<ProofOfWork> for Consensus {
    fn from(pow: ProofOfWork) -> Self {
        Consensus::ProofOfWork(pow)
    }
}

impl From<ProofOfStake> for Consensus {
    fn from(pos: ProofOfStake) -> Self {
        Consensus::ProofOfStake(pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::BlockState;
    use crate::error::ChainError;
    use crate::hash::HashAlgorithm;
    use crate::transaction::Transaction;
    use std::collections::HashMap;

    fn sample_block() -> Block {
        Block::with_timestamp(
            1,
            1_700_000_000,
            vec![Transaction::new("tx0", "alice", "bob", 5.0)],
            "0".repeat(64),
            HashAlgorithm::Sha256,
        )
    }

    #[test]
    fn test_stake_weighted_selection_converges() {
        let mut pos = ProofOfStake::with_seed(7);
        for (address, stake) in [("A", 100.0), ("B", 200.0), ("C", 50.0), ("D", 150.0)] {
            pos.add_stakeholder(address, stake).unwrap();
        }

        let draws = 20_000;
        let mut counts: HashMap<String, usize> = HashMap::new();
        for _ in 0..draws {
            *counts.entry(pos.select_validator()).or_default() += 1;
        }

        for (address, stake) in [("A", 100.0), ("B", 200.0), ("C", 50.0), ("D", 150.0)] {
            let observed = counts.get(address).copied().unwrap_or(0) as f64 / draws as f64;
            let expected = stake / 500.0;
            assert!(
                (observed - expected).abs() < 0.02,
                "{} drawn {:.4}, expected {:.4}",
                address,
                observed,
                expected
            );
        }
    }

    #[test]
    fn test_huge_stakes_keep_selection_total() {
        let mut pos = ProofOfStake::with_seed(4);
        pos.add_stakeholder("A", f64::MAX).unwrap();
        assert!(matches!(pos.add_stakeholder("B", f64::MAX), Err(ChainError::InvalidStake(_))));
        assert!(pos.total_stake().is_finite());
        for _ in 0..100 {
            assert_eq!(pos.select_validator(), "A");
        }
    }

    #[test]
    fn test_no_stakeholders_selects_system() {
        let mut pos = ProofOfStake::with_seed(1);
        assert_eq!(pos.select_validator(), SYSTEM_VALIDATOR);
        assert!(pos.is_known_validator(SYSTEM_VALIDATOR));
        assert!(!pos.is_known_validator("Mallory"));
    }

    #[test]
    fn test_zero_total_stake_selects_first() {
        let mut pos = ProofOfStake::with_seed(1);
        pos.add_stakeholder("Idle", 0.0).unwrap();
        pos.add_stakeholder("AlsoIdle", 0.0).unwrap();
        assert_eq!(pos.select_validator(), "Idle");
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = ProofOfStake::with_seed(99);
        let mut b = ProofOfStake::with_seed(99);
        for pos in [&mut a, &mut b] {
            pos.add_stakeholder("A", 1.0).unwrap();
            pos.add_stakeholder("B", 3.0).unwrap();
        }
        let left: Vec<String> = (0..50).map(|_| a.select_validator()).collect();
        let right: Vec<String> = (0..50).map(|_| b.select_validator()).collect();
        assert_eq!(left, right);
    }

    #[test]
    fn test_zero_difficulty_accepts_first_hash() {
        let mut consensus = Consensus::from(ProofOfWork::new(0));
        let provisional = sample_block().hash().to_string();
        let (block, _) = consensus.finalize_block(sample_block()).unwrap();
        assert_eq!(block.nonce(), 0);
        assert_eq!(block.hash(), provisional);
        assert_eq!(block.state(), BlockState::Mined);
    }

    #[test]
    fn test_proof_of_stake_stamps_validator() {
        let mut pos = ProofOfStake::with_seed(3);
        pos.add_stakeholder("Alice", 10.0).unwrap();
        let mut consensus = Consensus::from(pos);
        let (block, _) = consensus.finalize_block(sample_block()).unwrap();
        assert_eq!(block.validator(), Some("Alice"));
        assert_eq!(block.nonce(), 0);
        assert_eq!(block.state(), BlockState::Validated);
        assert_eq!(block.hash(), block.calculate_hash());
    }

    #[test]
    fn test_block_is_finalized_at_most_once() {
        let mut consensus = Consensus::from(ProofOfWork::new(0));
        let (mut block, _) = consensus.finalize_block(sample_block()).unwrap();
        assert_eq!(block.validate("Alice"), Err(ChainError::BlockAlreadyFinalized(1)));
        assert_eq!(block.mine(0), Err(ChainError::BlockAlreadyFinalized(1)));
    }

    #[test]
    fn test_genesis_finalization() {
        let genesis = Block::with_timestamp(0, 0, Vec::new(), "0", HashAlgorithm::default());

        let pow = Consensus::new(ConsensusKind::ProofOfWork, 4);
        let accepted = pow.finalize_genesis(genesis.clone()).unwrap();
        assert_eq!(accepted.state(), BlockState::Created);
        assert_eq!(accepted.hash(), genesis.hash());

        let pos = Consensus::new(ConsensusKind::ProofOfStake, 0);
        let validated = pos.finalize_genesis(genesis).unwrap();
        assert_eq!(validated.validator(), Some(SYSTEM_VALIDATOR));
        assert_eq!(pos.kind(), ConsensusKind::ProofOfStake);
        assert_eq!(pos.difficulty(), None);
    }
}

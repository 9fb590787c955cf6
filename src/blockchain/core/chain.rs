use crate::config::Config;
use crate::consensus::{Consensus, ConsensusKind};
use crate::error::ChainError;
use crate::hash::{HashAlgorithm, HashFunction};
use crate::merkle::MerkleTree;
use crate::transaction::Transaction;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use super::state::Stakeholder;
use super::validation::{audit_chain, verify_chain};

/// `previous_hash` of the genesis block.
pub const GENESIS_PREVIOUS_HASH: &str = "0";

/// Lifecycle of a block. `Mined` and `Validated` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockState {
    Created,
    Mined,
    Validated,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Block {
    pub(crate) index: u64,
    pub(crate) timestamp: i64,
    pub(crate) previous_hash: String,
    pub(crate) merkle_root: String,
    pub(crate) transactions: Vec<Transaction>,
    pub(crate) nonce: u64,
    pub(crate) validator: String,
    pub(crate) hash: String,
    pub(crate) hash_algorithm: HashAlgorithm,
    pub(crate) state: BlockState,
}

impl Block {
    pub fn new(
        index: u64,
        transactions: Vec<Transaction>,
        previous_hash: impl Into<String>,
        hash_algorithm: HashAlgorithm,
    ) -> Self {
        let timestamp = chrono::Utc::now().timestamp();
        Self::with_timestamp(index, timestamp, transactions, previous_hash, hash_algorithm)
    }

    /// Like [`Block::new`] with a caller-supplied timestamp (seconds since
    /// the Unix epoch), for reproducible digests.
    pub fn with_timestamp(
        index: u64,
        timestamp: i64,
        transactions: Vec<Transaction>,
        previous_hash: impl Into<String>,
        hash_algorithm: HashAlgorithm,
    ) -> Self {
        let merkle_root = MerkleTree::root_of(&transactions, &hash_algorithm);

        let mut block = Block {
            index,
            timestamp,
            previous_hash: previous_hash.into(),
            merkle_root,
            transactions,
            nonce: 0,
            validator: String::new(),
            hash: String::new(),
            hash_algorithm,
            state: BlockState::Created,
        };
        block.hash = block.calculate_hash();
        block
    }

    /// Digest of `index ++ timestamp ++ previous_hash ++ merkle_root ++ nonce
    /// ++ validator`. The field unused by the active consensus still takes
    /// part at its default value.
    pub fn calculate_hash(&self) -> String {
        let input = format!(
            "{}{}{}{}{}{}",
            self.index, self.timestamp, self.previous_hash, self.merkle_root, self.nonce, self.validator
        );
        self.hash_algorithm.digest(&input)
    }

    pub fn calculate_merkle_root(&self) -> String {
        MerkleTree::root_of(&self.transactions, &self.hash_algorithm)
    }

    /// Increments the nonce until the hash starts with `difficulty` `'0'`
    /// characters. There is no iteration bound: with a skewed hash primitive
    /// this may never return. Difficulty 0 accepts the provisional hash.
    pub fn mine(&mut self, difficulty: usize) -> Result<Duration, ChainError> {
        self.ensure_created()?;
        let start = Instant::now();

        while leading_zeros(&self.hash) < difficulty {
            self.nonce += 1;
            self.hash = self.calculate_hash();
        }

        self.state = BlockState::Mined;
        let elapsed = start.elapsed();
        debug!(
            "Block {} mined after {} nonce increments in {:?}: {}",
            self.index, self.nonce, elapsed, self.hash
        );
        Ok(elapsed)
    }

    /// Records the validator and recomputes the hash once.
    pub fn validate(&mut self, validator: &str) -> Result<Duration, ChainError> {
        self.ensure_created()?;
        let start = Instant::now();

        self.validator = validator.to_string();
        self.hash = self.calculate_hash();

        self.state = BlockState::Validated;
        let elapsed = start.elapsed();
        debug!("Block {} validated by {}: {}", self.index, self.validator, self.hash);
        Ok(elapsed)
    }

    fn ensure_created(&self) -> Result<(), ChainError> {
        match self.state {
            BlockState::Created => Ok(()),
            BlockState::Mined | BlockState::Validated => {
                Err(ChainError::BlockAlreadyFinalized(self.index))
            }
        }
    }

    pub fn meets_difficulty(&self, difficulty: usize) -> bool {
        leading_zeros(&self.hash) >= difficulty
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn previous_hash(&self) -> &str {
        &self.previous_hash
    }

    pub fn merkle_root(&self) -> &str {
        &self.merkle_root
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    /// `None` until the block is validated under proof of stake.
    pub fn validator(&self) -> Option<&str> {
        if self.validator.is_empty() {
            None
        } else {
            Some(&self.validator)
        }
    }

    pub fn hash_algorithm(&self) -> HashAlgorithm {
        self.hash_algorithm
    }

    pub fn state(&self) -> BlockState {
        self.state
    }
}

/// Count of leading `'0'` hex characters.
pub fn leading_zeros(hash: &str) -> usize {
    hash.bytes().take_while(|&b| b == b'0').count()
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Block #{} [", self.index)?;
        writeln!(f, "  Timestamp: {}", self.timestamp)?;
        writeln!(f, "  Previous Hash: {}", self.previous_hash)?;
        writeln!(f, "  Merkle Root: {}", self.merkle_root)?;
        writeln!(f, "  Transactions: {}", self.transactions.len())?;
        for tx in self.transactions.iter().take(3) {
            writeln!(f, "    {}", tx)?;
        }
        if self.transactions.len() > 3 {
            writeln!(f, "    ... and {} more transactions", self.transactions.len() - 3)?;
        }
        match self.validator() {
            Some(validator) => writeln!(f, "  Validator: {}", validator)?,
            None => writeln!(f, "  Nonce: {}", self.nonce)?,
        }
        writeln!(f, "  Hash: {}", self.hash)?;
        writeln!(f, "]")
    }
}

/// An ordered chain of blocks finalized through one consensus strategy.
#[derive(Debug, Clone)]
pub struct Blockchain {
    blocks: Vec<Block>,
    consensus: Consensus,
    hash_algorithm: HashAlgorithm,
}

impl Blockchain {
    /// Create a new `Blockchain` with its genesis block. `difficulty` only
    /// applies to proof of work.
    pub fn new(
        kind: ConsensusKind,
        difficulty: usize,
        hash_algorithm: HashAlgorithm,
    ) -> Result<Self, ChainError> {
        Self::with_consensus(Consensus::new(kind, difficulty), hash_algorithm)
    }

    /// Create a new `Blockchain` around an already configured strategy.
    pub fn with_consensus(
        consensus: Consensus,
        hash_algorithm: HashAlgorithm,
    ) -> Result<Self, ChainError> {
        let genesis_block = Self::create_genesis_block(&consensus, hash_algorithm)?;
        info!(
            "Genesis block created ({:?}, {:?}): {}",
            consensus.kind(),
            hash_algorithm,
            genesis_block.hash
        );

        Ok(Blockchain {
            blocks: vec![genesis_block],
            consensus,
            hash_algorithm,
        })
    }

    /// Build a chain from configuration and register its stakeholders.
    pub fn from_config(config: &Config) -> Result<Self, ChainError> {
        let mut blockchain =
            Self::with_consensus(config.consensus.build(), config.hash.algorithm()?)?;
        for stakeholder in &config.stakeholders {
            blockchain.add_stakeholder(stakeholder.address.clone(), stakeholder.stake)?;
        }
        Ok(blockchain)
    }

    fn create_genesis_block(
        consensus: &Consensus,
        hash_algorithm: HashAlgorithm,
    ) -> Result<Block, ChainError> {
        let genesis_block = Block::new(0, Vec::new(), GENESIS_PREVIOUS_HASH, hash_algorithm);
        consensus.finalize_genesis(genesis_block)
    }

    /// Builds the next block on top of the tip, finalizes it through the
    /// active consensus and appends it. Returns the mining/validation time.
    pub fn add_block(&mut self, transactions: Vec<Transaction>) -> Result<Duration, ChainError> {
        let (index, previous_hash) = {
            let last_block = self.latest_block();
            (last_block.index + 1, last_block.hash.clone())
        };

        let block = Block::new(index, transactions, previous_hash, self.hash_algorithm);
        let (block, elapsed) = self.consensus.finalize_block(block)?;

        info!(
            "Appended block {} with {} transactions in {} ms: {}",
            block.index,
            block.transactions.len(),
            elapsed.as_millis(),
            block.hash
        );
        self.blocks.push(block);
        Ok(elapsed)
    }

    pub fn add_stakeholder(
        &mut self,
        address: impl Into<String>,
        stake: f64,
    ) -> Result<(), ChainError> {
        match &mut self.consensus {
            Consensus::ProofOfStake(pos) => {
                let address = address.into();
                pos.add_stakeholder(address.clone(), stake)?;
                info!("Registered stakeholder {} with stake {}", address, stake);
                Ok(())
            }
            Consensus::ProofOfWork(_) => Err(ChainError::StakingUnsupported),
        }
    }

    /// Fail-fast linkage and hash check over the whole chain.
    pub fn is_chain_valid(&self) -> bool {
        self.verify().is_ok()
    }

    /// Same check as [`Blockchain::is_chain_valid`], reporting the first
    /// violation found.
    pub fn verify(&self) -> Result<(), ChainError> {
        verify_chain(&self.blocks)
    }

    /// Deeper check: indices, Merkle roots, proof-of-work targets and
    /// validator membership on top of linkage and hashes.
    pub fn audit(&self) -> Result<(), ChainError> {
        audit_chain(&self.blocks, &self.consensus)
    }

    pub fn chain(&self) -> &[Block] {
        &self.blocks
    }

    pub fn latest_block(&self) -> &Block {
        // The genesis block is pushed at construction and blocks are never removed.
        &self.blocks[self.blocks.len() - 1]
    }

    /// Index of the tip block.
    pub fn height(&self) -> u64 {
        self.latest_block().index
    }

    pub fn consensus(&self) -> &Consensus {
        &self.consensus
    }

    pub fn consensus_kind(&self) -> ConsensusKind {
        self.consensus.kind()
    }

    pub fn difficulty(&self) -> Option<usize> {
        self.consensus.difficulty()
    }

    pub fn hash_algorithm(&self) -> HashAlgorithm {
        self.hash_algorithm
    }

    pub fn stakeholders(&self) -> &[Stakeholder] {
        self.consensus.stake().map(|pos| pos.stakeholders()).unwrap_or(&[])
    }

    pub fn total_stake(&self) -> f64 {
        self.consensus.stake().map_or(0.0, |pos| pos.total_stake())
    }
}

impl fmt::Display for Blockchain {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "===== Blockchain State =====")?;
        match self.hash_algorithm {
            HashAlgorithm::Cellular { rule, steps } => {
                writeln!(f, "Hash Algorithm: Cellular Automaton (Rule {}, {} steps)", rule, steps)?
            }
            HashAlgorithm::Sha256 => writeln!(f, "Hash Algorithm: SHA-256")?,
        }
        match &self.consensus {
            Consensus::ProofOfWork(pow) => {
                writeln!(f, "Consensus: Proof of Work")?;
                writeln!(f, "Difficulty: {}", pow.difficulty())?;
            }
            Consensus::ProofOfStake(pos) => {
                writeln!(f, "Consensus: Proof of Stake")?;
                writeln!(f, "Stakeholders: {}", pos.stakeholders().len())?;
                writeln!(f, "Total Stake: {}", pos.total_stake())?;
            }
        }
        writeln!(f, "Block Count: {}", self.blocks.len())?;
        writeln!(f)?;
        for block in &self.blocks {
            write!(f, "{}", block)?;
        }
        writeln!(f, "============================")
    }
}

//! Error types for CellChain

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum ChainError {
    RuleOutOfRange(u32),
    InvalidStake(String),
    DuplicateStakeholder(String),
    EmptyAddress,
    StakingUnsupported,
    BlockAlreadyFinalized(u64),
    BrokenLink { index: u64 },
    HashMismatch { index: u64 },
    InvalidMerkleRoot { index: u64 },
    InvalidProofOfWork { index: u64, difficulty: usize },
    UnknownValidator { index: u64, validator: String },
    IndexGap { expected: u64, found: u64 },
    EmptyChain,
    ConfigError(String),
    IoError(String),
}

impl fmt::Display for ChainError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ChainError::RuleOutOfRange(rule) => {
                write!(f, "Rule number {} is outside 0..=255", rule)
            }
            ChainError::InvalidStake(msg) => write!(f, "Invalid stake: {}", msg),
            ChainError::DuplicateStakeholder(address) => {
                write!(f, "Stakeholder {} is already registered", address)
            }
            ChainError::EmptyAddress => write!(f, "Stakeholder address must not be empty"),
            ChainError::StakingUnsupported => {
                write!(f, "Stakeholders can only be registered on a proof-of-stake chain")
            }
            ChainError::BlockAlreadyFinalized(index) => {
                write!(f, "Block {} has already been mined or validated", index)
            }
            ChainError::BrokenLink { index } => {
                write!(f, "Invalid previous hash in block {}", index)
            }
            ChainError::HashMismatch { index } => write!(f, "Invalid hash in block {}", index),
            ChainError::InvalidMerkleRoot { index } => {
                write!(f, "Merkle root mismatch in block {}", index)
            }
            ChainError::InvalidProofOfWork { index, difficulty } => write!(
                f,
                "Block {} hash does not have {} leading zeros",
                index, difficulty
            ),
            ChainError::UnknownValidator { index, validator } => {
                write!(f, "Block {} validated by unknown address {}", index, validator)
            }
            ChainError::IndexGap { expected, found } => {
                write!(f, "Invalid block index. Expected {}, but got {}", expected, found)
            }
            ChainError::EmptyChain => write!(f, "Chain has no genesis block"),
            ChainError::ConfigError(msg) => write!(f, "Config error: {}", msg),
            ChainError::IoError(msg) => write!(f, "IO error: {}", msg),
        }
    }
}

impl std::error::Error for ChainError {}

impl From<std::io::Error> for ChainError {
    fn from(err: std::io::Error) -> Self {
        ChainError::IoError(err.to_string())
    }
}

impl From<toml::de::Error> for ChainError {
    fn from(err: toml::de::Error) -> Self {
        ChainError::ConfigError(err.to_string())
    }
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, ChainError>;

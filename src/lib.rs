//! CellChain - a minimal ledger hashed by a one-dimensional cellular automaton
//!
//! # Architecture
//!
//! The crate is organized into logical modules:
//!
//! ## Hashing
//! - [`automaton`] - Rule tables and 256-cell state evolution
//! - [`hash`] - Text encoding, the automaton hash and the pluggable hash seam
//! - [`merkle`] - Merkle tree commitments over ordered leaves
//!
//! ## Core Blockchain
//! - [`blockchain`] - Blocks, chain management, stake table and validation
//! - [`transaction`] - Transaction type
//!
//! ## Consensus
//! - [`consensus`] - Proof-of-work mining and proof-of-stake validator selection
//!
//! ## Configuration & Utilities
//! - [`config`] - Configuration management
//! - [`error`] - Error types

#![forbid(unsafe_code)]

// ============================================================================
// Hashing
// ============================================================================
pub mod automaton;
pub mod hash;
pub mod merkle;

// ============================================================================
// Core Blockchain
// ============================================================================
pub mod blockchain;
pub mod transaction;

// ============================================================================
// Consensus
// ============================================================================
pub mod consensus;

// ============================================================================
// Configuration & Utilities
// ============================================================================
pub mod config;
pub mod error;

pub use blockchain::{Block, BlockState, Blockchain, Stakeholder};
pub use consensus::{Consensus, ConsensusKind, ProofOfStake, ProofOfWork};
pub use error::{ChainError, Result};
pub use hash::{ca_hash, HashAlgorithm, HashFunction};
pub use merkle::MerkleTree;
pub use transaction::Transaction;

use crate::consensus::Consensus;
use crate::error::ChainError;
use tracing::warn;

use super::chain::{Block, GENESIS_PREVIOUS_HASH};

/// Walks blocks 1..n checking `previous_hash` linkage, then that the stored
/// hash matches a recomputation. Stops at the first violation; the error
/// carries the position of the offending block.
pub fn verify_chain(blocks: &[Block]) -> Result<(), ChainError> {
    for (i, pair) in blocks.windows(2).enumerate() {
        let (previous, current) = (&pair[0], &pair[1]);
        let position = (i + 1) as u64;

        if current.previous_hash != previous.hash {
            warn!("Invalid previous hash in block {}", position);
            return Err(ChainError::BrokenLink { index: position });
        }

        if current.hash != current.calculate_hash() {
            warn!("Invalid hash in block {}", position);
            return Err(ChainError::HashMismatch { index: position });
        }
    }
    Ok(())
}

/// Full structural audit, also fail-fast:
/// - the chain starts with a genesis block pointing at `"0"`;
/// - indices increase by exactly one;
/// - every Merkle root and hash recomputes;
/// - proof-of-work blocks after genesis meet the difficulty target;
/// - proof-of-stake validators are registered or the system validator.
pub fn audit_chain(blocks: &[Block], consensus: &Consensus) -> Result<(), ChainError> {
    let genesis = blocks.first().ok_or(ChainError::EmptyChain)?;
    if genesis.previous_hash != GENESIS_PREVIOUS_HASH {
        return Err(ChainError::BrokenLink { index: 0 });
    }

    for (position, block) in blocks.iter().enumerate() {
        let expected = position as u64;
        if block.index != expected {
            return Err(ChainError::IndexGap {
                expected,
                found: block.index,
            });
        }
        audit_block(block, consensus)?;
    }

    verify_chain(blocks)
}

fn audit_block(block: &Block, consensus: &Consensus) -> Result<(), ChainError> {
    let index = block.index;

    if block.merkle_root != block.calculate_merkle_root() {
        return Err(ChainError::InvalidMerkleRoot { index });
    }
    if block.hash != block.calculate_hash() {
        return Err(ChainError::HashMismatch { index });
    }

    match consensus {
        Consensus::ProofOfWork(pow) => {
            // Genesis is accepted unmined.
            if index > 0 && !block.meets_difficulty(pow.difficulty()) {
                return Err(ChainError::InvalidProofOfWork {
                    index,
                    difficulty: pow.difficulty(),
                });
            }
        }
        Consensus::ProofOfStake(pos) => {
            let validator = block.validator().unwrap_or_default();
            if !pos.is_known_validator(validator) {
                return Err(ChainError::UnknownValidator {
                    index,
                    validator: validator.to_string(),
                });
            }
        }
    }

    Ok(())
}

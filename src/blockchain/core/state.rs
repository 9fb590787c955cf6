use crate::error::ChainError;
use serde::{Deserialize, Serialize};

/// An address holding stake. Addresses are unique within a registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stakeholder {
    pub address: String,
    pub stake: f64,
}

impl Stakeholder {
    pub fn new(address: impl Into<String>, stake: f64) -> Self {
        Stakeholder {
            address: address.into(),
            stake,
        }
    }
}

/// Stakeholders in insertion order, with a running total.
#[derive(Debug, Clone, Default)]
pub struct StakeRegistry {
    stakeholders: Vec<Stakeholder>,
    total_stake: f64,
}

impl StakeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, address: impl Into<String>, stake: f64) -> Result<(), ChainError> {
        let address = address.into();
        if address.is_empty() {
            return Err(ChainError::EmptyAddress);
        }
        if !stake.is_finite() || stake < 0.0 {
            return Err(ChainError::InvalidStake(format!(
                "{} must stake a finite, non-negative amount, got {}",
                address, stake
            )));
        }
        if self.contains(&address) {
            return Err(ChainError::DuplicateStakeholder(address));
        }

        // Selection draws from [0, total), which needs a finite total.
        let total_stake = self.total_stake + stake;
        if !total_stake.is_finite() {
            return Err(ChainError::InvalidStake(format!(
                "adding {} for {} overflows the total stake",
                stake, address
            )));
        }

        self.total_stake = total_stake;
        self.stakeholders.push(Stakeholder { address, stake });
        Ok(())
    }

    pub fn contains(&self, address: &str) -> bool {
        self.stakeholders.iter().any(|s| s.address == address)
    }

    pub fn get(&self, address: &str) -> Option<&Stakeholder> {
        self.stakeholders.iter().find(|s| s.address == address)
    }

    pub fn stakeholders(&self) -> &[Stakeholder] {
        &self.stakeholders
    }

    pub fn total_stake(&self) -> f64 {
        self.total_stake
    }

    pub fn len(&self) -> usize {
        self.stakeholders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stakeholders.is_empty()
    }

    /// First stakeholder whose cumulative stake reaches `point`, walking in
    /// insertion order. Falls back to the first stakeholder if accumulated
    /// rounding leaves `point` uncovered; `None` only when empty.
    pub fn locate(&self, point: f64) -> Option<&Stakeholder> {
        let mut cumulative = 0.0;
        for stakeholder in &self.stakeholders {
            cumulative += stakeholder.stake;
            if point <= cumulative {
                return Some(stakeholder);
            }
        }
        self.stakeholders.first()
    }
}

//! Configuration management for CellChain

use crate::automaton::Rule;
use crate::blockchain::Stakeholder;
use crate::consensus::{Consensus, ConsensusKind, ProofOfStake, ProofOfWork};
use crate::error::{ChainError, Result};
use crate::hash::{HashAlgorithm, DEFAULT_RULE, DEFAULT_STEPS};
use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub hash: HashConfig,
    #[serde(default)]
    pub consensus: ConsensusConfig,
    #[serde(default)]
    pub stakeholders: Vec<Stakeholder>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlgorithmName {
    #[default]
    Cellular,
    Sha256,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HashConfig {
    #[serde(default)]
    pub algorithm: AlgorithmName,
    /// Kept wide so out-of-range values reach validation instead of failing
    /// to parse.
    #[serde(default = "default_rule")]
    pub rule: u32,
    #[serde(default = "default_steps")]
    pub steps: usize,
}

impl Default for HashConfig {
    fn default() -> Self {
        Self {
            algorithm: AlgorithmName::default(),
            rule: default_rule(),
            steps: default_steps(),
        }
    }
}

impl HashConfig {
    pub fn algorithm(&self) -> Result<HashAlgorithm> {
        match self.algorithm {
            AlgorithmName::Cellular => {
                let rule = Rule::try_from_number(self.rule)?;
                Ok(HashAlgorithm::cellular(rule.number(), self.steps))
            }
            AlgorithmName::Sha256 => Ok(HashAlgorithm::Sha256),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConsensusConfig {
    #[serde(default)]
    pub kind: ConsensusKind,
    #[serde(default = "default_difficulty")]
    pub difficulty: usize,
    /// Fixed seed for validator selection; entropy when absent.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            kind: ConsensusKind::default(),
            difficulty: default_difficulty(),
            seed: None,
        }
    }
}

impl ConsensusConfig {
    pub fn build(&self) -> Consensus {
        match self.kind {
            ConsensusKind::ProofOfWork => ProofOfWork::new(self.difficulty).into(),
            ConsensusKind::ProofOfStake => match self.seed {
                Some(seed) => ProofOfStake::with_seed(seed).into(),
                None => ProofOfStake::new().into(),
            },
        }
    }
}

impl Config {
    pub fn from_toml_str(config_str: &str) -> Result<Self> {
        let config: Config = toml::from_str(config_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate critical values
    pub fn validate(&self) -> Result<()> {
        self.hash.algorithm()?;

        if !self.stakeholders.is_empty() && self.consensus.kind != ConsensusKind::ProofOfStake {
            return Err(ChainError::ConfigError(
                "stakeholders are only allowed with consensus.kind = \"proof_of_stake\"".to_string(),
            ));
        }

        for stakeholder in &self.stakeholders {
            if stakeholder.address.is_empty() {
                return Err(ChainError::ConfigError(
                    "stakeholder address must not be empty".to_string(),
                ));
            }
        }

        Ok(())
    }
}

/// Reads `path`, falling back to defaults when the file does not exist.
pub fn load_config(path: impl AsRef<Path>) -> Result<Config> {
    match fs::read_to_string(path.as_ref()) {
        Ok(config_str) => Config::from_toml_str(&config_str),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(Config::default()),
        Err(e) => Err(e.into()),
    }
}

fn default_rule() -> u32 {
    DEFAULT_RULE as u32
}

fn default_steps() -> usize {
    DEFAULT_STEPS
}

fn default_difficulty() -> usize {
    4
}

//! Integration tests for building chains from configuration files

use cellchain::config::load_config;
use cellchain::{Blockchain, ChainError, ConsensusKind, HashAlgorithm, Transaction};
use std::fs;
use tempfile::TempDir;

/// Helper to get test directory
fn get_test_dir() -> Result<TempDir, Box<dyn std::error::Error>> {
    Ok(TempDir::new()?)
}

#[test]
fn test_stake_chain_from_config_file() -> Result<(), Box<dyn std::error::Error>> {
    let temp_dir = get_test_dir()?;
    let path = temp_dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
[hash]
rule = 90
steps = 50

[consensus]
kind = "proof_of_stake"
seed = 2024

[[stakeholders]]
address = "Alice"
stake = 100.0

[[stakeholders]]
address = "Bob"
stake = 300.0
"#,
    )?;

    let config = load_config(&path)?;
    let mut chain = Blockchain::from_config(&config)?;

    assert_eq!(chain.consensus_kind(), ConsensusKind::ProofOfStake);
    assert_eq!(chain.hash_algorithm(), HashAlgorithm::cellular(90, 50));
    assert_eq!(chain.total_stake(), 400.0);

    chain.add_block(vec![Transaction::new("tx0", "Alice", "Bob", 1.0)])?;
    assert!(chain.is_chain_valid());
    chain.audit()?;

    Ok(())
}

#[test]
fn test_default_config_builds_proof_of_work_chain() -> Result<(), Box<dyn std::error::Error>> {
    let temp_dir = get_test_dir()?;
    let config = load_config(temp_dir.path().join("missing.toml"))?;
    let chain = Blockchain::from_config(&config)?;

    assert_eq!(chain.consensus_kind(), ConsensusKind::ProofOfWork);
    assert_eq!(chain.difficulty(), Some(4));
    assert_eq!(chain.hash_algorithm(), HashAlgorithm::default());
    assert_eq!(chain.chain().len(), 1);

    Ok(())
}

#[test]
fn test_duplicate_stakeholder_in_config_fails() -> Result<(), Box<dyn std::error::Error>> {
    let temp_dir = get_test_dir()?;
    let path = temp_dir.path().join("config.toml");
    fs::write(
        &path,
        "[consensus]\nkind = \"proof_of_stake\"\n\n[[stakeholders]]\naddress = \"A\"\nstake = 1.0\n\n[[stakeholders]]\naddress = \"A\"\nstake = 2.0\n",
    )?;

    let config = load_config(&path)?;
    let result = Blockchain::from_config(&config);
    assert!(matches!(result, Err(ChainError::DuplicateStakeholder(ref a)) if a == "A"));

    Ok(())
}

#[test]
fn test_out_of_range_rule_in_file_fails() -> Result<(), Box<dyn std::error::Error>> {
    let temp_dir = get_test_dir()?;
    let path = temp_dir.path().join("config.toml");
    fs::write(&path, "[hash]\nrule = 256\n")?;

    assert_eq!(load_config(&path).unwrap_err(), ChainError::RuleOutOfRange(256));

    Ok(())
}

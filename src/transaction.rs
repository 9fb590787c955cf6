//! Ledger transactions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A value transfer between two addresses. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    id: String,
    sender: String,
    receiver: String,
    amount: f64,
}

impl Transaction {
    pub fn new(
        id: impl Into<String>,
        sender: impl Into<String>,
        receiver: impl Into<String>,
        amount: f64,
    ) -> Self {
        Transaction {
            id: id.into(),
            sender: sender.into(),
            receiver: receiver.into(),
            amount,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn sender(&self) -> &str {
        &self.sender
    }

    pub fn receiver(&self) -> &str {
        &self.receiver
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    /// The hash input for this transaction: `id:sender:receiver:amount`.
    pub fn canonical_string(&self) -> String {
        format!("{}:{}:{}:{}", self.id, self.sender, self.receiver, self.amount)
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}: {} -> {} ({})",
            self.id, self.sender, self.receiver, self.amount
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_string_joins_fields() {
        let tx = Transaction::new("tx7", "0xabc123", "0xdef456", 250.0);
        assert_eq!(tx.canonical_string(), "tx7:0xabc123:0xdef456:250");

        let fractional = Transaction::new("tx8", "a", "b", 12.5);
        assert_eq!(fractional.canonical_string(), "tx8:a:b:12.5");
    }

    #[test]
    fn test_display_summary() {
        let tx = Transaction::new("tx1", "alice", "bob", 3.0);
        assert_eq!(tx.to_string(), "tx1: alice -> bob (3)");
    }
}

//! Merkle tree over ordered leaf items, stored as an array of levels.
//!
//! Behavior:
//! - An empty item list yields `hash("empty_merkle_root")` and no levels.
//! - Parents hash the *string concatenation* of their children's hex digests.
//! - A level with an odd count pairs its trailing node with itself.
//! - `verify` is a linear scan over the leaf digests; `proof` offers a
//!   sibling-path inclusion proof on top of that.

use crate::hash::HashFunction;
use crate::transaction::Transaction;
use std::borrow::Cow;

/// Input hashed in place of a root when there are no leaves.
pub const EMPTY_MERKLE_SEED: &str = "empty_merkle_root";

/// Anything that can be committed to as a Merkle leaf.
pub trait MerkleLeaf {
    fn leaf_data(&self) -> Cow<'_, str>;
}

impl MerkleLeaf for str {
    fn leaf_data(&self) -> Cow<'_, str> {
        Cow::Borrowed(self)
    }
}

impl MerkleLeaf for String {
    fn leaf_data(&self) -> Cow<'_, str> {
        Cow::Borrowed(self.as_str())
    }
}

impl MerkleLeaf for Transaction {
    fn leaf_data(&self) -> Cow<'_, str> {
        Cow::Owned(self.canonical_string())
    }
}

impl<T: MerkleLeaf + ?Sized> MerkleLeaf for &T {
    fn leaf_data(&self) -> Cow<'_, str> {
        (**self).leaf_data()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleTree {
    /// `levels[0]` are the leaf digests, the last level holds the root.
    levels: Vec<Vec<String>>,
    root: String,
}

impl MerkleTree {
    pub fn build<T, H>(items: &[T], hasher: &H) -> Self
    where
        T: MerkleLeaf,
        H: HashFunction + ?Sized,
    {
        if items.is_empty() {
            return MerkleTree {
                levels: Vec::new(),
                root: hasher.digest(EMPTY_MERKLE_SEED),
            };
        }

        let leaves: Vec<String> = items
            .iter()
            .map(|item| hasher.digest(&item.leaf_data()))
            .collect();

        let mut levels = vec![leaves];
        while let Some(current) = levels.last().filter(|level| level.len() > 1) {
            let next: Vec<String> = current
                .chunks(2)
                .map(|pair| {
                    let left = &pair[0];
                    let right = pair.get(1).unwrap_or(left);
                    hash_pair(hasher, left, right)
                })
                .collect();
            levels.push(next);
        }

        let root = levels
            .last()
            .and_then(|level| level.first())
            .cloned()
            .unwrap_or_default();

        MerkleTree { levels, root }
    }

    /// Convenience for callers that only need the commitment.
    pub fn root_of<T, H>(items: &[T], hasher: &H) -> String
    where
        T: MerkleLeaf,
        H: HashFunction + ?Sized,
    {
        Self::build(items, hasher).root
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn leaves(&self) -> &[String] {
        self.levels.first().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn levels(&self) -> &[Vec<String>] {
        &self.levels
    }

    pub fn len(&self) -> usize {
        self.leaves().len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// O(n) membership check: rehash `item` and look for it among the leaves.
    pub fn verify<T, H>(&self, item: &T, hasher: &H) -> bool
    where
        T: MerkleLeaf + ?Sized,
        H: HashFunction + ?Sized,
    {
        let digest = hasher.digest(&item.leaf_data());
        self.leaves().iter().any(|leaf| *leaf == digest)
    }

    /// Sibling path from leaf `index` up to the root.
    pub fn proof(&self, index: usize) -> Option<MerkleProof> {
        if index >= self.len() {
            return None;
        }

        let mut steps = Vec::with_capacity(self.levels.len().saturating_sub(1));
        let mut position = index;
        for level in &self.levels[..self.levels.len() - 1] {
            let step = if position % 2 == 0 {
                // A trailing node with no right neighbor is paired with itself.
                let sibling = level.get(position + 1).unwrap_or(&level[position]);
                ProofStep::Right(sibling.clone())
            } else {
                ProofStep::Left(level[position - 1].clone())
            };
            steps.push(step);
            position /= 2;
        }

        Some(MerkleProof {
            leaf_index: index,
            steps,
        })
    }
}

fn hash_pair<H: HashFunction + ?Sized>(hasher: &H, left: &str, right: &str) -> String {
    let mut combined = String::with_capacity(left.len() + right.len());
    combined.push_str(left);
    combined.push_str(right);
    hasher.digest(&combined)
}

/// One level of an inclusion proof: the sibling digest and the side it sits on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProofStep {
    Left(String),
    Right(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleProof {
    pub leaf_index: usize,
    pub steps: Vec<ProofStep>,
}

impl MerkleProof {
    pub fn verify<T, H>(&self, item: &T, root: &str, hasher: &H) -> bool
    where
        T: MerkleLeaf + ?Sized,
        H: HashFunction + ?Sized,
    {
        let mut current = hasher.digest(&item.leaf_data());
        for step in &self.steps {
            current = match step {
                ProofStep::Left(sibling) => hash_pair(hasher, sibling, &current),
                ProofStep::Right(sibling) => hash_pair(hasher, &current, sibling),
            };
        }
        current == root
    }
}

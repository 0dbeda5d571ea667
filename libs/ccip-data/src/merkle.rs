//! Merkle multi-proofs over message leaves.
//!
//! Mirrors the on-chain verifier: internal nodes hash their children in
//! sorted order behind a domain separator, and a proof is a list of sibling
//! hashes plus one flag per internal node saying whether its second input
//! comes from the leaves/computed hashes or from the proof.

use alloy_primitives::{keccak256, B256, U256};

use crate::hashing::INTERNAL_DOMAIN_SEPARATOR;

pub const MAX_NUMBER_TREE_LEAVES: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MerkleError {
    NoLeaves,
    TooManyLeaves(usize),
    /// Indices to prove must be strictly increasing and within the leaves
    InvalidIndices,
    /// Proof does not have the shape the leaves require
    InvalidProof(&'static str),
}

impl core::fmt::Display for MerkleError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            MerkleError::NoLeaves => write!(f, "Cannot build a tree without leaves"),
            MerkleError::TooManyLeaves(n) => {
                write!(f, "{} leaves exceed the maximum of {}", n, MAX_NUMBER_TREE_LEAVES)
            }
            MerkleError::InvalidIndices => write!(f, "Proof indices must be sorted, unique and in range"),
            MerkleError::InvalidProof(reason) => write!(f, "Invalid proof: {}", reason),
        }
    }
}

impl std::error::Error for MerkleError {}

pub fn hash_internal(a: B256, b: B256) -> B256 {
    let (lo, hi) = if a < b { (a, b) } else { (b, a) };
    let mut preimage = [0u8; 96];
    preimage[..32].copy_from_slice(INTERNAL_DOMAIN_SEPARATOR.as_slice());
    preimage[32..64].copy_from_slice(lo.as_slice());
    preimage[64..].copy_from_slice(hi.as_slice());
    keccak256(preimage)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Proof {
    pub hashes: Vec<B256>,
    pub source_flags: Vec<bool>,
}

impl Proof {
    /// Packs the flags into the `proofFlagBits` word, flag `i` at bit `i`.
    pub fn flag_bits(&self) -> U256 {
        self.source_flags
            .iter()
            .enumerate()
            .filter(|(_, flag)| **flag)
            .fold(U256::ZERO, |bits, (i, _)| bits | (U256::from(1) << i))
    }

    /// Rebuilds a proof for `leaf_count` leaves from its on-chain form.
    pub fn from_flag_bits(hashes: Vec<B256>, flag_bits: U256, leaf_count: usize) -> Self {
        let total = (leaf_count + hashes.len()).saturating_sub(1);
        let source_flags = (0..total).map(|i| flag_bits.bit(i)).collect();
        Self { hashes, source_flags }
    }
}

/// Tree over at most 256 leaves. Odd layers are padded with the zero hash.
#[derive(Debug, Clone)]
pub struct MerkleMultiTree {
    layers: Vec<Vec<B256>>,
    leaf_count: usize,
}

impl MerkleMultiTree {
    pub fn new(leaves: &[B256]) -> Result<Self, MerkleError> {
        if leaves.is_empty() {
            return Err(MerkleError::NoLeaves);
        }
        if leaves.len() > MAX_NUMBER_TREE_LEAVES {
            return Err(MerkleError::TooManyLeaves(leaves.len()));
        }

        let mut layers = Vec::new();
        let mut layer = leaves.to_vec();
        while layer.len() > 1 {
            if layer.len() % 2 != 0 {
                layer.push(B256::ZERO);
            }
            let next = layer
                .chunks_exact(2)
                .map(|pair| hash_internal(pair[0], pair[1]))
                .collect();
            layers.push(layer);
            layer = next;
        }
        layers.push(layer);
        Ok(Self {
            layers,
            leaf_count: leaves.len(),
        })
    }

    pub fn root(&self) -> B256 {
        self.layers
            .last()
            .and_then(|layer| layer.first())
            .copied()
            .unwrap_or_default()
    }

    /// Multi-proof for the leaves at `indices`, which must be strictly
    /// increasing.
    pub fn prove(&self, indices: &[usize]) -> Result<Proof, MerkleError> {
        let sorted = indices.windows(2).all(|w| w[0] < w[1]);
        if indices.is_empty() || !sorted || indices.iter().any(|&i| i >= self.leaf_count) {
            return Err(MerkleError::InvalidIndices);
        }

        let mut proof = Proof::default();
        let mut indices = indices.to_vec();
        for layer in &self.layers[..self.layers.len() - 1] {
            let mut parents = Vec::with_capacity(indices.len());
            let mut j = 0;
            while j < indices.len() {
                let index = indices[j];
                parents.push(index / 2);
                let sibling = index ^ 1;
                if j + 1 < indices.len() && indices[j + 1] == sibling {
                    j += 1;
                    proof.source_flags.push(true);
                } else {
                    proof.hashes.push(layer[sibling]);
                    proof.source_flags.push(false);
                }
                j += 1;
            }
            indices = parents;
        }
        Ok(proof)
    }
}

/// Recomputes the root from `leaves` and `proof`, rejecting proofs the
/// on-chain verifier would reject.
pub fn compute_root(leaves: &[B256], proof: &Proof) -> Result<B256, MerkleError> {
    if leaves.is_empty() {
        return Err(MerkleError::NoLeaves);
    }
    if leaves.len() > MAX_NUMBER_TREE_LEAVES {
        return Err(MerkleError::TooManyLeaves(leaves.len()));
    }
    let total_hashes = leaves.len() + proof.hashes.len() - 1;
    if total_hashes > MAX_NUMBER_TREE_LEAVES {
        return Err(MerkleError::InvalidProof("too many hashes"));
    }
    if total_hashes != proof.source_flags.len() {
        return Err(MerkleError::InvalidProof("flag count does not match"));
    }
    if total_hashes == 0 {
        return Ok(leaves[0]);
    }

    let mut hashes = vec![B256::ZERO; total_hashes];
    let (mut leaf_pos, mut hash_pos, mut proof_pos) = (0, 0, 0);

    for i in 0..total_hashes {
        let next_computed = |leaf_pos: &mut usize, hash_pos: &mut usize| -> Result<B256, MerkleError> {
            if *leaf_pos < leaves.len() {
                *leaf_pos += 1;
                return Ok(leaves[*leaf_pos - 1]);
            }
            // Only hashes computed in earlier steps may be consumed
            if *hash_pos >= i {
                return Err(MerkleError::InvalidProof("hash position exceeded"));
            }
            *hash_pos += 1;
            Ok(hashes[*hash_pos - 1])
        };

        let a = next_computed(&mut leaf_pos, &mut hash_pos)?;
        let b = if proof.source_flags[i] {
            next_computed(&mut leaf_pos, &mut hash_pos)?
        } else {
            let b = *proof
                .hashes
                .get(proof_pos)
                .ok_or(MerkleError::InvalidProof("proof hashes exhausted"))?;
            proof_pos += 1;
            b
        };
        hashes[i] = hash_internal(a, b);
    }

    if hash_pos != total_hashes - 1 || leaf_pos != leaves.len() || proof_pos != proof.hashes.len() {
        return Err(MerkleError::InvalidProof("not every input was consumed"));
    }
    Ok(hashes[total_hashes - 1])
}

//! Leaf hashing for the message commitment tree.
//!
//! The layout of each version must match the on-chain merkle construction
//! bit for bit, otherwise no proof built from these leaves verifies.

mod v1_0_0;
mod v1_2_0;

use alloy_primitives::{keccak256, Address, FixedBytes, B256};
use alloy_sol_types::SolValue;

pub use v1_0_0::{LeafHasherV1_0_0, LEAF_PREFIX_V1_0_0};
pub use v1_2_0::{LeafHasherV1_2_0, LEAF_PREFIX_V1_2_0};

use crate::types::EVM2EVMMessage;

/// First word of every leaf preimage
pub const LEAF_DOMAIN_SEPARATOR: FixedBytes<1> = FixedBytes::ZERO;

/// First word of every internal node preimage
pub const INTERNAL_DOMAIN_SEPARATOR: B256 = B256::with_last_byte(1);

pub trait LeafHasher: Send + Sync + core::fmt::Debug {
    fn hash_leaf(&self, msg: &EVM2EVMMessage) -> B256;
}

/// Hash of the lane identity, shared by every leaf of the lane.
pub fn meta_data_hash(prefix: B256, source_chain_selector: u64, dest_chain_selector: u64, on_ramp: Address) -> B256 {
    keccak256((prefix, source_chain_selector, dest_chain_selector, on_ramp).abi_encode_params())
}

pub(crate) fn token_amounts_hash(msg: &EVM2EVMMessage) -> B256 {
    let token_amounts: Vec<(Address, alloy_primitives::U256)> =
        msg.token_amounts.iter().map(|ta| (ta.token, ta.amount)).collect();
    keccak256(token_amounts.abi_encode())
}

use alloy_primitives::{keccak256, Address, B256};
use alloy_sol_types::SolValue;

use super::{meta_data_hash, token_amounts_hash, LeafHasher, LEAF_DOMAIN_SEPARATOR};
use crate::types::EVM2EVMMessage;

/// Hashed into the lane metadata of every 1.0.0 leaf
pub const LEAF_PREFIX_V1_0_0: &str = "EVM2EVMMessageEvent";

/// Leaf hasher for 1.0.0 and 1.1.0 on-ramps: fixed-size fields are laid out
/// individually in the preimage.
#[derive(Debug, Clone)]
pub struct LeafHasherV1_0_0 {
    meta_data_hash: B256,
}

impl LeafHasherV1_0_0 {
    pub fn new(source_chain_selector: u64, dest_chain_selector: u64, on_ramp: Address) -> Self {
        Self {
            meta_data_hash: meta_data_hash(
                keccak256(LEAF_PREFIX_V1_0_0),
                source_chain_selector,
                dest_chain_selector,
                on_ramp,
            ),
        }
    }
}

impl LeafHasher for LeafHasherV1_0_0 {
    fn hash_leaf(&self, msg: &EVM2EVMMessage) -> B256 {
        let preimage = (
            LEAF_DOMAIN_SEPARATOR,
            self.meta_data_hash,
            msg.sequence_number,
            msg.nonce,
            msg.sender,
            msg.receiver,
            keccak256(&msg.data),
            token_amounts_hash(msg),
            msg.gas_limit,
            msg.strict,
            msg.fee_token,
            msg.fee_token_amount,
        )
            .abi_encode_params();
        keccak256(preimage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashing::fixtures::*;

    #[test]
    fn test_known_leaf_hash() {
        let hasher = LeafHasherV1_0_0::new(SOURCE, DEST, ON_RAMP);
        assert_eq!(
            hasher.hash_leaf(&message()),
            alloy_primitives::b256!("ca8d675ed12b335dac34e9430ab634a196a2f095ee8cd28f694d77d2fed4d356")
        );
    }

    #[test]
    fn test_ignores_source_token_data() {
        let hasher = LeafHasherV1_0_0::new(SOURCE, DEST, ON_RAMP);
        let msg = message();
        let mut without = msg.clone();
        without.source_token_data.clear();
        assert_eq!(hasher.hash_leaf(&msg), hasher.hash_leaf(&without));
    }

    #[test]
    fn test_every_field_is_committed() {
        let hasher = LeafHasherV1_0_0::new(SOURCE, DEST, ON_RAMP);
        let base = hasher.hash_leaf(&message());

        let mut msg = message();
        msg.nonce += 1;
        assert_ne!(hasher.hash_leaf(&msg), base);

        let mut msg = message();
        msg.strict = true;
        assert_ne!(hasher.hash_leaf(&msg), base);

        let mut msg = message();
        msg.token_amounts.clear();
        assert_ne!(hasher.hash_leaf(&msg), base);

        // Lane identity is part of the leaf
        let other_lane = LeafHasherV1_0_0::new(SOURCE, DEST + 1, ON_RAMP);
        assert_ne!(other_lane.hash_leaf(&message()), base);
    }
}

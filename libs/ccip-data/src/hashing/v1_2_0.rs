use alloy_primitives::{keccak256, Address, B256};
use alloy_sol_types::SolValue;

use super::{meta_data_hash, token_amounts_hash, LeafHasher, LEAF_DOMAIN_SEPARATOR};
use crate::types::EVM2EVMMessage;

pub const LEAF_PREFIX_V1_2_0: &str = "EVM2EVMMessageHashV2";

/// Leaf hasher for 1.2.0 on-ramps.
///
/// Fixed-size fields are hashed together into a single word and the source
/// token data list is committed as well.
#[derive(Debug, Clone)]
pub struct LeafHasherV1_2_0 {
    meta_data_hash: B256,
}

impl LeafHasherV1_2_0 {
    pub fn new(source_chain_selector: u64, dest_chain_selector: u64, on_ramp: Address) -> Self {
        Self {
            meta_data_hash: meta_data_hash(
                keccak256(LEAF_PREFIX_V1_2_0),
                source_chain_selector,
                dest_chain_selector,
                on_ramp,
            ),
        }
    }

    fn fixed_size_values_hash(msg: &EVM2EVMMessage) -> B256 {
        keccak256(
            (
                msg.sender,
                msg.receiver,
                msg.sequence_number,
                msg.gas_limit,
                msg.strict,
                msg.nonce,
                msg.fee_token,
                msg.fee_token_amount,
            )
                .abi_encode_params(),
        )
    }
}

impl LeafHasher for LeafHasherV1_2_0 {
    fn hash_leaf(&self, msg: &EVM2EVMMessage) -> B256 {
        let preimage = (
            LEAF_DOMAIN_SEPARATOR,
            self.meta_data_hash,
            Self::fixed_size_values_hash(msg),
            keccak256(&msg.data),
            token_amounts_hash(msg),
            keccak256(msg.source_token_data.abi_encode()),
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
        let hasher = LeafHasherV1_2_0::new(SOURCE, DEST, ON_RAMP);
        assert_eq!(
            hasher.hash_leaf(&message()),
            alloy_primitives::b256!("0dc378556c6d10ffb7acee04473d14d453fde03d8308eae20d6259b880dece5f")
        );
    }

    #[test]
    fn test_commits_source_token_data() {
        let hasher = LeafHasherV1_2_0::new(SOURCE, DEST, ON_RAMP);
        let msg = message();
        let mut without = msg.clone();
        without.source_token_data.clear();
        assert_ne!(hasher.hash_leaf(&msg), hasher.hash_leaf(&without));
    }

    #[test]
    fn test_message_id_is_not_committed() {
        let hasher = LeafHasherV1_2_0::new(SOURCE, DEST, ON_RAMP);
        let mut msg = message();
        let base = hasher.hash_leaf(&msg);
        msg.message_id = B256::repeat_byte(0xff);
        msg.hash = B256::repeat_byte(0xee);
        assert_eq!(hasher.hash_leaf(&msg), base);
    }

    #[test]
    fn test_fixed_size_fields_are_committed() {
        let hasher = LeafHasherV1_2_0::new(SOURCE, DEST, ON_RAMP);
        let base = hasher.hash_leaf(&message());

        let mut msg = message();
        msg.fee_token_amount += alloy_primitives::U256::from(1);
        assert_ne!(hasher.hash_leaf(&msg), base);

        let mut msg = message();
        msg.sequence_number += 1;
        assert_ne!(hasher.hash_leaf(&msg), base);
    }
}

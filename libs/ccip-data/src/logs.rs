use alloy_sol_types::SolEvent;
use common::event_cache::Log;

use crate::errors::{CcipDataError, Result};
use crate::types::{Event, TxMeta};

/// Decodes a raw stored log as event `E`.
pub fn decode_event<E: SolEvent>(log: &Log) -> Result<E> {
    E::decode_raw_log(log.topics.iter().copied(), &log.data)
        .map_err(|e| CcipDataError::Abi(format!("decoding {} at {:?}: {}", E::SIGNATURE, log.id(), e)))
}

/// Parses every log with `parse`. A single failure fails the whole batch,
/// after every failure has been logged.
pub fn parse_logs<T, F>(logs: &[Log], parse: F) -> Result<Vec<Event<T>>>
where
    F: Fn(&Log) -> Result<T>,
{
    let mut events = Vec::with_capacity(logs.len());
    let mut failed = 0;

    for log in logs {
        match parse(log) {
            Ok(data) => events.push(Event {
                data,
                meta: TxMeta::from_log(log),
            }),
            Err(e) => {
                failed += 1;
                tracing::error!(
                    address = %log.address,
                    tx_hash = %log.tx_hash,
                    log_index = log.log_index,
                    error = %e,
                    "Unable to parse log"
                );
            }
        }
    }

    if failed > 0 {
        return Err(CcipDataError::LogParse {
            failed,
            total: logs.len(),
        });
    }
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutils::event_log;
    use alloy_primitives::{Address, U256};
    use common::interfaces::price_registry_v1_2_0::PriceRegistryV1_2_0;

    #[test]
    fn test_parse_logs_fails_whole_batch() {
        let registry = Address::repeat_byte(7);
        let event = PriceRegistryV1_2_0::UsdPerTokenUpdated {
            token: Address::repeat_byte(1),
            value: U256::from(5),
            timestamp: U256::from(100),
        };
        let good = event_log(registry, &event, 10, 0);
        let mut bad = event_log(registry, &event, 11, 0);
        bad.data = Default::default();

        let parsed = parse_logs(std::slice::from_ref(&good), decode_event::<PriceRegistryV1_2_0::UsdPerTokenUpdated>)
            .unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].data.value, U256::from(5));
        assert_eq!(parsed[0].meta.block_number, 10);

        let err = parse_logs(&[good, bad], decode_event::<PriceRegistryV1_2_0::UsdPerTokenUpdated>).err();
        assert_eq!(err, Some(CcipDataError::LogParse { failed: 1, total: 2 }));
    }
}

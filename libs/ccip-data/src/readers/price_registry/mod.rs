//! Price registry readers.

mod v1_0_0;
mod v1_2_0;

pub use v1_0_0::{filters, PriceRegistryReaderV1_0_0};
pub use v1_2_0::PriceRegistryReaderV1_2_0;

pub const COMMIT_PRICE_UPDATES: &str = "Commit price updates";
pub const FEE_TOKEN_ADDED: &str = "Fee token added";
pub const FEE_TOKEN_REMOVED: &str = "Fee token removed";

/// Topic of `UsdPerUnitGasUpdated` holding the destination chain selector.
pub(crate) const GAS_UPDATE_DEST_CHAIN_TOPIC: usize = 1;

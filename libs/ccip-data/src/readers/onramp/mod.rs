//! On-ramp readers.

mod v1_0_0;
mod v1_1_0;
mod v1_2_0;

pub use v1_0_0::{filters as filters_v1_0_0, OnRampReaderV1_0_0};
pub use v1_1_0::{filters as filters_v1_1_0, OnRampReaderV1_1_0};
pub use v1_2_0::{filters as filters_v1_2_0, OnRampReaderV1_2_0};

pub const COMMIT_CCIP_SENDS: &str = "Commit ccip sends";
pub const CONFIG_CHANGED: &str = "Config changed";

//! Contract type and version detection through `typeAndVersion()`.

use std::str::FromStr;

use alloy_primitives::Address;
use common::interfaces::type_and_version::ITypeAndVersion;
use semver::Version;

use crate::caller::{call_contract, ContractCaller};
use crate::errors::{CcipDataError, Result};

pub const V1_0_0: &str = "1.0.0";
pub const V1_1_0: &str = "1.1.0";
pub const V1_2_0: &str = "1.2.0";

/// What a lane contract is, independent of its schema version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContractType {
    /// Send side, emits messages on the source chain
    OnRamp,
    /// Receive side, executes messages on the destination chain
    OffRamp,
    /// Stores committed merkle roots on the destination chain
    CommitStore,
    PriceRegistry,
}

impl ContractType {
    /// Name the contract reports in its self-description string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ContractType::OnRamp => "EVM2EVMOnRamp",
            ContractType::OffRamp => "EVM2EVMOffRamp",
            ContractType::CommitStore => "CommitStore",
            ContractType::PriceRegistry => "PriceRegistry",
        }
    }
}

impl core::fmt::Display for ContractType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContractType {
    type Err = CcipDataError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "EVM2EVMOnRamp" => Ok(ContractType::OnRamp),
            "EVM2EVMOffRamp" => Ok(ContractType::OffRamp),
            "CommitStore" => Ok(ContractType::CommitStore),
            "PriceRegistry" => Ok(ContractType::PriceRegistry),
            other => Err(CcipDataError::MalformedVersionString(other.to_string())),
        }
    }
}

/// Contracts that predate `typeAndVersion()` return an empty string.
const UNKNOWN_TYPE_AND_VERSION: &str = "Unknown 0.0.0";

/// Splits `"<Type> <major.minor.patch>"` on its first space.
pub fn split_type_and_version(type_and_version: &str) -> Result<(&str, &str)> {
    let s = if type_and_version.is_empty() {
        UNKNOWN_TYPE_AND_VERSION
    } else {
        type_and_version
    };
    let mut parts = s.splitn(2, ' ');
    match (parts.next(), parts.next()) {
        (Some(contract_type), Some(version)) if !contract_type.is_empty() && !version.is_empty() => {
            Ok((contract_type, version))
        }
        _ => Err(CcipDataError::MalformedVersionString(type_and_version.to_string())),
    }
}

pub fn parse_version(version: &str) -> Result<Version> {
    Version::parse(version.trim()).map_err(|e| CcipDataError::InvalidVersion {
        version: version.to_string(),
        reason: e.to_string(),
    })
}

/// Validates a self-description string against the expected contract type
/// and returns its version.
pub fn verify_type_and_version_str(type_and_version: &str, expected: ContractType) -> Result<Version> {
    let (contract_type, version) = split_type_and_version(type_and_version)?;
    if contract_type != expected.as_str() {
        return Err(CcipDataError::UnexpectedContractType {
            expected,
            got: contract_type.to_string(),
        });
    }
    parse_version(version)
}

pub async fn read_type_and_version(caller: &dyn ContractCaller, address: Address) -> Result<String> {
    call_contract(caller, address, &ITypeAndVersion::typeAndVersionCall {}).await
}

/// Reads `typeAndVersion()` from `address` and checks it against `expected`.
pub async fn verify_type_and_version(
    caller: &dyn ContractCaller,
    address: Address,
    expected: ContractType,
) -> Result<Version> {
    let type_and_version = read_type_and_version(caller, address).await?;
    let version = verify_type_and_version_str(&type_and_version, expected)?;
    tracing::debug!(%address, contract_type = %expected, %version, "Detected contract version");
    Ok(version)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split() {
        assert_eq!(split_type_and_version("CommitStore 1.2.0").unwrap(), ("CommitStore", "1.2.0"));
        assert_eq!(split_type_and_version("").unwrap(), ("Unknown", "0.0.0"));
        assert!(matches!(
            split_type_and_version("blah"),
            Err(CcipDataError::MalformedVersionString(s)) if s == "blah"
        ));
        assert!(split_type_and_version("CommitStore ").is_err());
    }

    #[test]
    fn test_type_mismatch_names_both() {
        let err = verify_type_and_version_str("EVM2EVMOffRamp 1.0.0", ContractType::CommitStore).unwrap_err();
        assert_eq!(
            err,
            CcipDataError::UnexpectedContractType {
                expected: ContractType::CommitStore,
                got: "EVM2EVMOffRamp".to_string(),
            }
        );
    }

    #[test]
    fn test_invalid_version() {
        let err = verify_type_and_version_str("CommitStore not-a-version", ContractType::CommitStore).unwrap_err();
        assert!(matches!(err, CcipDataError::InvalidVersion { .. }));
    }

    #[test]
    fn test_contract_type_round_trip() {
        for t in [
            ContractType::OnRamp,
            ContractType::OffRamp,
            ContractType::CommitStore,
            ContractType::PriceRegistry,
        ] {
            assert_eq!(t.as_str().parse::<ContractType>().unwrap(), t);
        }
        assert!("Router".parse::<ContractType>().is_err());
    }

    #[test]
    fn test_version_string_form() {
        assert_eq!(parse_version("1.2.0").unwrap().to_string(), V1_2_0);
    }
}

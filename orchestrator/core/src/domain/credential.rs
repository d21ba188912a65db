// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Wallet Credentials, Chain Networks and Transaction Hashes
//!
//! Value objects for the identity side of the agent lifecycle:
//!
//! - [`Credential`]: the wallet address bound to one lifecycle manager
//!   (`0x` + 40 hex characters, compared case-insensitively).
//! - [`ChainNetwork`]: the two supported registry networks and their
//!   hardcoded RPC endpoints / registry contract addresses.
//! - [`RegistryBinding`]: everything a registry client needs to connect.
//! - [`TransactionHash`]: normalized `0x` + 64 hex registration receipts.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Address prefix shared by wallets and transaction hashes.
pub const HEX_PREFIX: &str = "0x";

/// Number of hex digits following the prefix in a wallet address.
pub const ADDRESS_HEX_LEN: usize = 40;

/// Number of hex digits following the prefix in a transaction hash.
pub const TX_HASH_HEX_LEN: usize = 64;

/// Owner value the registry reports for names nobody has claimed.
pub const UNOWNED_SENTINEL: &str = "0x0000000000000000000000000000000000000000";

/// Registry contract deployed on BSC testnet.
const TESTNET_REGISTRY_CONTRACT: &str = "0x100E3F8c5285df46A8B9edF6b38B8f90F1C32B7b";

/// Registry contract used for mainnet. The registry has a single deployment
/// address today; it is kept per network so the two can diverge.
const MAINNET_REGISTRY_CONTRACT: &str = "0x100E3F8c5285df46A8B9edF6b38B8f90F1C32B7b";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    #[error("wallet address is not set")]
    Missing,

    #[error("wallet address must start with '0x', got: {0}")]
    MissingPrefix(String),

    #[error("wallet address must be 42 characters (0x + 40 hex chars), got length: {0}")]
    InvalidLength(usize),

    #[error("wallet address must contain only hexadecimal characters after '0x', got: {0}")]
    NonHex(String),
}

/// Wallet address that owns registered agent names.
///
/// The original casing is preserved for display; equality against other
/// addresses goes through [`Credential::matches`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Credential(String);

impl Credential {
    pub fn parse(raw: &str) -> Result<Self, CredentialError> {
        if raw.is_empty() {
            return Err(CredentialError::Missing);
        }
        let Some(body) = raw.strip_prefix(HEX_PREFIX) else {
            return Err(CredentialError::MissingPrefix(raw.to_string()));
        };
        if raw.len() != HEX_PREFIX.len() + ADDRESS_HEX_LEN {
            return Err(CredentialError::InvalidLength(raw.len()));
        }
        if !body.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(CredentialError::NonHex(raw.to_string()));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive comparison against an address reported by the registry.
    pub fn matches(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other)
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Credential {
    type Error = CredentialError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Credential> for String {
    fn from(value: Credential) -> Self {
        value.0
    }
}

/// Interpret a raw registry owner lookup.
///
/// Returns `None` when the name is unowned: the registry reports either an
/// empty value or the zero-address sentinel.
pub fn owner_from_lookup(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(UNOWNED_SENTINEL) {
        None
    } else {
        Some(trimmed)
    }
}

/// Registry network selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ChainNetwork {
    #[default]
    BscTestnet,
    BscMainnet,
}

impl ChainNetwork {
    /// Pure lookup. Anything that is not the testnet selector resolves to
    /// mainnet.
    pub fn from_selector(selector: &str) -> Self {
        match selector.trim().to_ascii_lowercase().as_str() {
            "bsc-testnet" => Self::BscTestnet,
            _ => Self::BscMainnet,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BscTestnet => "bsc-testnet",
            Self::BscMainnet => "bsc-mainnet",
        }
    }

    pub fn rpc_endpoint(&self) -> &'static str {
        match self {
            Self::BscTestnet => "https://bsc-testnet-rpc.publicnode.com",
            Self::BscMainnet => "https://bsc-dataseed.binance.org",
        }
    }

    pub fn contract_address(&self) -> &'static str {
        match self {
            Self::BscTestnet => TESTNET_REGISTRY_CONTRACT,
            Self::BscMainnet => MAINNET_REGISTRY_CONTRACT,
        }
    }
}

impl fmt::Display for ChainNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Connection parameters handed to an identity registry connector.
#[derive(Clone)]
pub struct RegistryBinding {
    pub wallet: Credential,
    pub secret_key: String,
    pub network: ChainNetwork,
    pub rpc_endpoint: String,
    pub contract_address: String,
}

impl RegistryBinding {
    pub fn new(wallet: Credential, secret_key: String, network: ChainNetwork) -> Self {
        Self {
            wallet,
            secret_key,
            network,
            rpc_endpoint: network.rpc_endpoint().to_string(),
            contract_address: network.contract_address().to_string(),
        }
    }
}

impl fmt::Debug for RegistryBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryBinding")
            .field("wallet", &self.wallet)
            .field("secret_key", &"**********")
            .field("network", &self.network)
            .field("rpc_endpoint", &self.rpc_endpoint)
            .field("contract_address", &self.contract_address)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransactionHashError {
    #[error("registry returned an empty transaction hash")]
    Empty,

    #[error("registry returned a malformed transaction hash: {0}")]
    Malformed(String),
}

/// Registration receipt: `0x` followed by 64 hex digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionHash(String);

impl TransactionHash {
    /// Receipt reported when no transaction was submitted.
    pub fn placeholder() -> Self {
        Self(format!("{}{}", HEX_PREFIX, "0".repeat(TX_HASH_HEX_LEN)))
    }

    /// Validate a hash returned by the registry, adding the prefix if the
    /// client omitted it.
    pub fn normalize(raw: &str) -> Result<Self, TransactionHashError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(TransactionHashError::Empty);
        }
        let normalized = if trimmed.starts_with(HEX_PREFIX) {
            trimmed.to_string()
        } else {
            format!("{}{}", HEX_PREFIX, trimmed)
        };
        let body = &normalized[HEX_PREFIX.len()..];
        if body.len() != TX_HASH_HEX_LEN || !body.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(TransactionHashError::Malformed(raw.to_string()));
        }
        Ok(Self(normalized))
    }

    pub fn is_placeholder(&self) -> bool {
        self.0[HEX_PREFIX.len()..].chars().all(|c| c == '0')
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransactionHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_mixed_case_address() {
        let credential = Credential::parse("0xAbCdEf0123456789abcdef0123456789ABCDEF01").unwrap();
        assert_eq!(credential.as_str(), "0xAbCdEf0123456789abcdef0123456789ABCDEF01");
    }

    #[test]
    fn test_rejects_malformed_addresses() {
        assert_eq!(Credential::parse(""), Err(CredentialError::Missing));
        assert!(matches!(
            Credential::parse("1x0000000000000000000000000000000000000000"),
            Err(CredentialError::MissingPrefix(_))
        ));
        assert_eq!(
            Credential::parse("0x1234"),
            Err(CredentialError::InvalidLength(6))
        );
        assert!(matches!(
            Credential::parse("0xg000000000000000000000000000000000000000"),
            Err(CredentialError::NonHex(_))
        ));
    }

    #[test]
    fn test_matches_ignores_case() {
        let credential = Credential::parse("0xabcdef0123456789abcdef0123456789abcdef01").unwrap();
        assert!(credential.matches("0xABCDEF0123456789ABCDEF0123456789ABCDEF01"));
        assert!(!credential.matches(UNOWNED_SENTINEL));
    }

    #[test]
    fn test_owner_from_lookup_filters_sentinel() {
        assert_eq!(owner_from_lookup(""), None);
        assert_eq!(owner_from_lookup(UNOWNED_SENTINEL), None);
        assert_eq!(
            owner_from_lookup("0x1111111111111111111111111111111111111111"),
            Some("0x1111111111111111111111111111111111111111")
        );
    }

    #[test]
    fn test_network_selector_falls_back_to_mainnet() {
        assert_eq!(ChainNetwork::from_selector("bsc-testnet"), ChainNetwork::BscTestnet);
        assert_eq!(ChainNetwork::from_selector("BSC-TESTNET"), ChainNetwork::BscTestnet);
        assert_eq!(ChainNetwork::from_selector("bsc-mainnet"), ChainNetwork::BscMainnet);
        assert_eq!(ChainNetwork::from_selector("ropsten"), ChainNetwork::BscMainnet);
        assert_eq!(
            ChainNetwork::BscTestnet.rpc_endpoint(),
            "https://bsc-testnet-rpc.publicnode.com"
        );
        assert_eq!(
            ChainNetwork::BscMainnet.rpc_endpoint(),
            "https://bsc-dataseed.binance.org"
        );
    }

    #[test]
    fn test_binding_debug_masks_secret() {
        let wallet = Credential::parse(UNOWNED_SENTINEL).unwrap();
        let binding = RegistryBinding::new(wallet, "super-secret".into(), ChainNetwork::BscTestnet);
        let rendered = format!("{:?}", binding);
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("bsc-testnet-rpc"));
    }

    #[test]
    fn test_placeholder_hash() {
        let hash = TransactionHash::placeholder();
        assert_eq!(hash.as_str().len(), 66);
        assert!(hash.is_placeholder());
    }

    #[test]
    fn test_normalize_adds_prefix() {
        let body = "ab".repeat(32);
        let hash = TransactionHash::normalize(&body).unwrap();
        assert_eq!(hash.as_str(), format!("0x{}", body));
        assert!(!hash.is_placeholder());
    }

    #[test]
    fn test_normalize_rejects_bad_hashes() {
        assert_eq!(TransactionHash::normalize("  "), Err(TransactionHashError::Empty));
        assert!(matches!(
            TransactionHash::normalize("0xdeadbeef"),
            Err(TransactionHashError::Malformed(_))
        ));
        assert!(matches!(
            TransactionHash::normalize(&"z".repeat(64)),
            Err(TransactionHashError::Malformed(_))
        ));
    }
}

//! # Value Objects
//!
//! Small immutable types shared by every pipeline stage.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Ledger height identifying a snapshot.
pub type Slot = u64;

/// Lamports granted to the faucet in the rebuilt snapshot.
pub const FAUCET_LAMPORTS: u64 = 500_000_000_000_000_000;

/// Length of an ed25519 public key in bytes.
pub const PUBKEY_LEN: usize = 32;

/// Roles that need a keypair before the snapshot can be rebuilt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KeyRole {
    /// Account pre-funded with the faucet lamports.
    Faucet,
    /// Bootstrap validator node identity.
    Identity,
    /// Bootstrap validator vote account.
    Vote,
    /// Bootstrap validator stake account.
    Stake,
}

impl KeyRole {
    /// All roles in provisioning order.
    pub const ALL: [KeyRole; 4] = [
        KeyRole::Faucet,
        KeyRole::Identity,
        KeyRole::Vote,
        KeyRole::Stake,
    ];

    /// File name of the keypair at its default location.
    pub fn file_name(&self) -> &'static str {
        match self {
            KeyRole::Faucet => "faucet.json",
            KeyRole::Identity => "identity.json",
            KeyRole::Vote => "vote-account.json",
            KeyRole::Stake => "stake-account.json",
        }
    }

    /// Whether a caller may supply an existing keypair for this role.
    ///
    /// Vote and stake accounts are always freshly generated.
    pub fn accepts_override(&self) -> bool {
        matches!(self, KeyRole::Faucet | KeyRole::Identity)
    }

    /// Short lowercase name used in logs and errors.
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyRole::Faucet => "faucet",
            KeyRole::Identity => "identity",
            KeyRole::Vote => "vote",
            KeyRole::Stake => "stake",
        }
    }
}

impl fmt::Display for KeyRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a provisioned keypair came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Provenance {
    /// Copied verbatim from a caller-supplied file.
    Reused,
    /// Freshly generated during this run.
    Generated,
}

/// Proof-of-history tick policy written into the genesis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TickMode {
    /// Wall-clock sleep between ticks, no hashing. Local clusters only.
    #[default]
    Sleep,
}

impl TickMode {
    /// Value passed to `--hashes-per-tick`.
    pub fn as_arg(&self) -> &'static str {
        match self {
            TickMode::Sleep => "sleep",
        }
    }
}

/// Pipeline stage, used to attribute errors and log lines.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    Configuration,
    WorkspaceLock,
    Fetch,
    SlotExtraction,
    KeyProvisioning,
    GenesisMutation,
    SnapshotBuild,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Configuration => "configuration",
            Stage::WorkspaceLock => "workspace-lock",
            Stage::Fetch => "fetch",
            Stage::SlotExtraction => "slot-extraction",
            Stage::KeyProvisioning => "key-provisioning",
            Stage::GenesisMutation => "genesis-mutation",
            Stage::SnapshotBuild => "snapshot-build",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ed25519 public key, displayed and serialized as base58.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pubkey([u8; PUBKEY_LEN]);

impl Pubkey {
    /// Create from raw bytes.
    pub fn new(bytes: [u8; PUBKEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Get raw bytes.
    pub fn as_bytes(&self) -> &[u8; PUBKEY_LEN] {
        &self.0
    }

    /// Base58 form, as accepted by the ledger tool.
    pub fn to_base58(&self) -> String {
        bs58::encode(self.0).into_string()
    }
}

impl fmt::Display for Pubkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base58())
    }
}

impl fmt::Debug for Pubkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pubkey({})", self.to_base58())
    }
}

/// Error parsing a base58 public key.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParsePubkeyError {
    #[error("invalid base58: {0}")]
    InvalidBase58(String),
    #[error("expected 32 bytes, got {0}")]
    InvalidLength(usize),
}

impl FromStr for Pubkey {
    type Err = ParsePubkeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|e| ParsePubkeyError::InvalidBase58(e.to_string()))?;
        let bytes: [u8; PUBKEY_LEN] = bytes
            .try_into()
            .map_err(|v: Vec<u8>| ParsePubkeyError::InvalidLength(v.len()))?;
        Ok(Self(bytes))
    }
}

impl Serialize for Pubkey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base58())
    }
}

impl<'de> Deserialize<'de> for Pubkey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_file_names_are_distinct() {
        let mut names: Vec<_> = KeyRole::ALL.iter().map(|r| r.file_name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 4);
    }

    #[test]
    fn test_only_faucet_and_identity_accept_override() {
        assert!(KeyRole::Faucet.accepts_override());
        assert!(KeyRole::Identity.accepts_override());
        assert!(!KeyRole::Vote.accepts_override());
        assert!(!KeyRole::Stake.accepts_override());
    }

    #[test]
    fn test_tick_mode_arg() {
        assert_eq!(TickMode::default().as_arg(), "sleep");
    }

    #[test]
    fn test_pubkey_base58_parse() {
        let key = Pubkey::new([7u8; PUBKEY_LEN]);
        let parsed: Pubkey = key.to_base58().parse().unwrap();
        assert_eq!(parsed, key);
    }

    #[test]
    fn test_pubkey_rejects_short_input() {
        let short = bs58::encode([1u8; 16]).into_string();
        assert_eq!(
            short.parse::<Pubkey>(),
            Err(ParsePubkeyError::InvalidLength(16))
        );
    }

    #[test]
    fn test_pubkey_serializes_as_string() {
        let key = Pubkey::new([0u8; PUBKEY_LEN]);
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, format!("\"{}\"", key.to_base58()));
    }

    #[test]
    fn test_faucet_lamports_constant() {
        assert_eq!(FAUCET_LAMPORTS, 500_000_000_000_000_000);
    }
}

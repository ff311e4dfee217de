//! # Domain Entities
//!
//! Artifacts handed from one pipeline stage to the next.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::value_objects::{KeyRole, Provenance, Pubkey, Slot, TickMode};

/// Genesis and snapshot archives staged by the fetcher.
///
/// `slot` stays `None` until slot extraction pins it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SnapshotArchive {
    /// Staged genesis archive.
    pub genesis_path: PathBuf,
    /// Staged snapshot archive.
    pub snapshot_path: PathBuf,
    /// Slot encoded in the snapshot name.
    pub slot: Option<Slot>,
}

impl SnapshotArchive {
    /// Create an archive pair with no slot pinned yet.
    pub fn new(genesis_path: PathBuf, snapshot_path: PathBuf) -> Self {
        Self {
            genesis_path,
            snapshot_path,
            slot: None,
        }
    }

    /// Directory both archives were staged into.
    pub fn ledger_dir(&self) -> Option<&std::path::Path> {
        self.snapshot_path.parent()
    }
}

/// A keypair file resolved for one role.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keypair {
    /// Role this keypair fills.
    pub role: KeyRole,
    /// Location of the keypair file at its default path.
    pub file_path: PathBuf,
    /// Public key, cached so later stages never re-read the file.
    pub public_key: Pubkey,
    /// Whether the file was copied from an override or generated.
    pub provenance: Provenance,
}

/// The three public keys registered for the bootstrap validator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootstrapPubkeys {
    /// Node identity.
    pub identity: Pubkey,
    /// Vote account.
    pub vote: Pubkey,
    /// Stake account.
    pub stake: Pubkey,
}

/// One keypair per role, the pipeline's in-memory key cache.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProvisionedKeys {
    pub faucet: Keypair,
    pub identity: Keypair,
    pub vote: Keypair,
    pub stake: Keypair,
}

impl ProvisionedKeys {
    /// Keypair for a role.
    pub fn get(&self, role: KeyRole) -> &Keypair {
        match role {
            KeyRole::Faucet => &self.faucet,
            KeyRole::Identity => &self.identity,
            KeyRole::Vote => &self.vote,
            KeyRole::Stake => &self.stake,
        }
    }

    /// Iterate in provisioning order.
    pub fn iter(&self) -> impl Iterator<Item = &Keypair> {
        KeyRole::ALL.into_iter().map(move |role| self.get(role))
    }

    /// Identity, vote and stake public keys.
    pub fn bootstrap_pubkeys(&self) -> BootstrapPubkeys {
        BootstrapPubkeys {
            identity: self.identity.public_key,
            vote: self.vote.public_key,
            stake: self.stake.public_key,
        }
    }
}

/// Parameters for rewriting the staged genesis.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenesisConfig {
    /// Ledger directory holding the staged genesis archive.
    pub ledger_dir: PathBuf,
    /// Directory the patched `genesis.tar.bz2` is written to.
    pub output_dir: PathBuf,
    /// Tick policy to write.
    pub tick_mode: TickMode,
}

/// Parameters for emitting the bootstrap snapshot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SnapshotParams {
    /// Ledger directory holding the staged genesis and snapshot.
    ///
    /// This is the fetched `latest-snapshot/` ledger, not the bootstrap
    /// directory: the rebuilt snapshot is rooted at the fetched bank, and the
    /// sleep tick mode is re-applied on the command line instead of being read
    /// from the rewritten genesis.
    pub ledger_dir: PathBuf,
    /// Slot the new snapshot is rooted at.
    pub slot: Slot,
    /// Faucet keypair file passed as `--faucet-pubkey`.
    pub faucet_keypair_path: PathBuf,
    /// Faucet public key, for logging and the final report.
    pub faucet_pubkey: Pubkey,
    /// Lamports granted to the faucet.
    pub faucet_lamports: u64,
    /// Bootstrap validator keys.
    pub bootstrap: BootstrapPubkeys,
    /// Tick policy.
    pub tick_mode: TickMode,
    /// Directory the tool writes the snapshot into.
    pub output_dir: PathBuf,
}

/// Terminal artifact: a bootable genesis + snapshot pair.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootstrapSnapshot {
    /// Bootstrap validator ledger directory.
    pub ledger_dir: PathBuf,
    /// Slot the snapshot is rooted at.
    pub slot: Slot,
    /// Faucet public key.
    pub faucet_pubkey: Pubkey,
    /// Lamports granted to the faucet.
    pub faucet_lamports: u64,
    /// Bootstrap validator keys.
    pub bootstrap_pubkeys: BootstrapPubkeys,
    /// Rebuilt snapshot archive.
    pub snapshot_path: PathBuf,
    /// Patched genesis archive.
    pub genesis_path: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keypair(role: KeyRole, byte: u8) -> Keypair {
        Keypair {
            role,
            file_path: PathBuf::from(role.file_name()),
            public_key: Pubkey::new([byte; 32]),
            provenance: Provenance::Generated,
        }
    }

    fn keys() -> ProvisionedKeys {
        ProvisionedKeys {
            faucet: keypair(KeyRole::Faucet, 1),
            identity: keypair(KeyRole::Identity, 2),
            vote: keypair(KeyRole::Vote, 3),
            stake: keypair(KeyRole::Stake, 4),
        }
    }

    #[test]
    fn test_archive_starts_unpinned() {
        let archive = SnapshotArchive::new(
            PathBuf::from("/s/genesis.tar.bz2"),
            PathBuf::from("/s/snapshot-1-a.tar.bz2"),
        );
        assert_eq!(archive.slot, None);
        assert_eq!(archive.ledger_dir(), Some(std::path::Path::new("/s")));
    }

    #[test]
    fn test_get_by_role() {
        let keys = keys();
        for role in KeyRole::ALL {
            assert_eq!(keys.get(role).role, role);
        }
    }

    #[test]
    fn test_iter_order() {
        let roles: Vec<_> = keys().iter().map(|k| k.role).collect();
        assert_eq!(roles, KeyRole::ALL.to_vec());
    }

    #[test]
    fn test_bootstrap_pubkeys_excludes_faucet() {
        let pubkeys = keys().bootstrap_pubkeys();
        assert_eq!(pubkeys.identity, Pubkey::new([2; 32]));
        assert_eq!(pubkeys.vote, Pubkey::new([3; 32]));
        assert_eq!(pubkeys.stake, Pubkey::new([4; 32]));
    }

    #[test]
    fn test_snapshot_report_json() {
        let snapshot = BootstrapSnapshot {
            ledger_dir: PathBuf::from("/cfg/bootstrap-validator"),
            slot: 12345,
            faucet_pubkey: Pubkey::new([1; 32]),
            faucet_lamports: 500_000_000_000_000_000,
            bootstrap_pubkeys: keys().bootstrap_pubkeys(),
            snapshot_path: PathBuf::from("/cfg/bootstrap-validator/snapshot-12345-x.tar.bz2"),
            genesis_path: PathBuf::from("/cfg/bootstrap-validator/genesis.tar.bz2"),
        };
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["slot"], 12345);
        assert_eq!(json["faucet_pubkey"], Pubkey::new([1; 32]).to_base58());
        let back: BootstrapSnapshot = serde_json::from_value(json).unwrap();
        assert_eq!(back, snapshot);
    }
}

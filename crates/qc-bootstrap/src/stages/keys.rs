//! # Key Provisioning
//!
//! Resolves one keypair per role at its default path:
//!
//! - override given → validated, then copied verbatim (`Reused`)
//! - no override → generated through the `KeyGenerator` port (`Generated`)
//!
//! Overrides are read and validated before anything is written, so a bad
//! override leaves every default path untouched. The bootstrap-validator
//! directory is reset on every run; the faucet keypair lives outside it and
//! is overwritten in place.

use std::collections::HashSet;
use std::path::Path;

use tracing::{info, warn};
use zeroize::Zeroize;

use super::reset_dir;
use crate::config::{KeyOverrides, WorkspaceConfig};
use crate::domain::keyfile::{pubkey_from_contents, read_pubkey, write_keypair_file};
use crate::domain::{
    BootstrapError, KeyRole, Keypair, ProvisionedKeys, Provenance, Pubkey, Stage,
};
use crate::ports::KeyGenerator;

/// Override contents held in memory between validation and copy.
struct LoadedOverride {
    role: KeyRole,
    contents: Vec<u8>,
    public_key: Pubkey,
}

impl Drop for LoadedOverride {
    fn drop(&mut self) {
        self.contents.zeroize();
    }
}

/// Provisions the four keypairs the bootstrap snapshot needs.
pub struct KeyProvisioner<'a, K: ?Sized> {
    keygen: &'a K,
    workspace: &'a WorkspaceConfig,
}

impl<'a, K> KeyProvisioner<'a, K>
where
    K: KeyGenerator + ?Sized,
{
    pub fn new(keygen: &'a K, workspace: &'a WorkspaceConfig) -> Self {
        Self { keygen, workspace }
    }

    /// Resolve every role and return the cached public keys.
    ///
    /// # Errors
    ///
    /// `BootstrapError::KeyProvision` for an unreadable or corrupt override,
    /// a generated file that fails validation, or duplicate public keys.
    pub async fn provision(&self, overrides: &KeyOverrides) -> Result<ProvisionedKeys, BootstrapError> {
        let loaded = Self::load_overrides(overrides)?;

        reset_dir(&self.workspace.bootstrap_dir(), Stage::KeyProvisioning)?;

        let mut resolved = Vec::with_capacity(KeyRole::ALL.len());
        for role in KeyRole::ALL {
            let keypair = match loaded.iter().find(|o| o.role == role) {
                Some(over) => self.reuse(over)?,
                None => self.generate(role).await?,
            };
            info!(
                stage = %Stage::KeyProvisioning,
                role = %keypair.role,
                pubkey = %keypair.public_key,
                provenance = ?keypair.provenance,
                "Keypair ready"
            );
            resolved.push(keypair);
        }

        ensure_distinct(&resolved)?;

        let mut resolved = resolved.into_iter();
        let mut next = || {
            resolved
                .next()
                .ok_or_else(|| BootstrapError::Config("keypair count mismatch".to_string()))
        };
        Ok(ProvisionedKeys {
            faucet: next()?,
            identity: next()?,
            vote: next()?,
            stake: next()?,
        })
    }

    fn load_overrides(overrides: &KeyOverrides) -> Result<Vec<LoadedOverride>, BootstrapError> {
        let mut loaded = Vec::new();
        for role in KeyRole::ALL.into_iter().filter(KeyRole::accepts_override) {
            let Some(path) = overrides.get(role) else {
                continue;
            };
            let mut contents = std::fs::read(path)
                .map_err(|e| BootstrapError::key(role, path, format!("cannot read override: {}", e)))?;
            match pubkey_from_contents(&contents) {
                Ok(public_key) => loaded.push(LoadedOverride {
                    role,
                    contents,
                    public_key,
                }),
                Err(e) => {
                    contents.zeroize();
                    return Err(BootstrapError::key(role, path, e.to_string()));
                }
            }
        }
        Ok(loaded)
    }

    fn reuse(&self, over: &LoadedOverride) -> Result<Keypair, BootstrapError> {
        let path = self.workspace.keypair_path(over.role);
        ensure_parent(over.role, &path)?;
        write_keypair_file(&path, &over.contents)
            .map_err(|e| BootstrapError::key(over.role, &path, e.to_string()))?;

        Ok(Keypair {
            role: over.role,
            file_path: path,
            public_key: over.public_key,
            provenance: Provenance::Reused,
        })
    }

    async fn generate(&self, role: KeyRole) -> Result<Keypair, BootstrapError> {
        let path = self.workspace.keypair_path(role);
        ensure_parent(role, &path)?;
        self.keygen.generate(role, &path).await?;

        let public_key = read_pubkey(&path).map_err(|e| {
            warn!(%role, path = %path.display(), error = %e, "Generated keypair failed validation");
            BootstrapError::key(role, &path, format!("generated file is invalid: {}", e))
        })?;

        Ok(Keypair {
            role,
            file_path: path,
            public_key,
            provenance: Provenance::Generated,
        })
    }
}

fn ensure_parent(role: KeyRole, path: &Path) -> Result<(), BootstrapError> {
    match path.parent() {
        Some(parent) => std::fs::create_dir_all(parent)
            .map_err(|e| BootstrapError::key(role, parent, e.to_string())),
        None => Ok(()),
    }
}

fn ensure_distinct(keys: &[Keypair]) -> Result<(), BootstrapError> {
    let mut seen: HashSet<Pubkey> = HashSet::new();
    for key in keys {
        if !seen.insert(key.public_key) {
            let first = keys
                .iter()
                .find(|k| k.public_key == key.public_key)
                .map(|k| k.role)
                .unwrap_or(key.role);
            return Err(BootstrapError::key(
                key.role,
                &key.file_path,
                format!("public key {} already used by {}", key.public_key, first),
            ));
        }
    }
    Ok(())
}

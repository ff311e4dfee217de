//! # Keypair Generators
//!
//! - `ExternalKeygen`: runs `<keygen> new --no-passphrase [-f] -s -o <path>`
//! - `NativeKeygen`: generates an ed25519 key in-process and writes the same
//!   file format

use std::ffi::OsString;
use std::fs;
use std::path::Path;

use async_trait::async_trait;
use ed25519_dalek::SigningKey;
use zeroize::Zeroize;

use super::process::run_tool;
use crate::config::ToolCommand;
use crate::domain::keyfile::{encode_keypair, pubkey_of, write_keypair_file};
use crate::domain::{BootstrapError, KeyRole, Stage};
use crate::ports::KeyGenerator;

/// Keygen binary invoked as a child process.
#[derive(Clone, Debug)]
pub struct ExternalKeygen {
    command: ToolCommand,
}

impl ExternalKeygen {
    pub fn new(command: ToolCommand) -> Self {
        Self { command }
    }
}

/// Arguments for `new`.
///
/// The faucet keypair sits outside the reset bootstrap directory and may
/// survive from an earlier run, so it is force-overwritten.
pub fn keygen_args(role: KeyRole, path: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["new".into(), "--no-passphrase".into()];
    if role == KeyRole::Faucet {
        args.push("-f".into());
    }
    args.push("-s".into());
    args.push("-o".into());
    args.push(path.as_os_str().to_os_string());
    args
}

#[async_trait]
impl KeyGenerator for ExternalKeygen {
    async fn generate(&self, role: KeyRole, path: &Path) -> Result<(), BootstrapError> {
        run_tool(
            &self.command,
            "new",
            keygen_args(role, path),
            Stage::KeyProvisioning,
        )
        .await
    }
}

/// In-process ed25519 key generation.
#[derive(Clone, Copy, Debug, Default)]
pub struct NativeKeygen;

#[async_trait]
impl KeyGenerator for NativeKeygen {
    async fn generate(&self, role: KeyRole, path: &Path) -> Result<(), BootstrapError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| BootstrapError::key(role, parent, e.to_string()))?;
        }

        let key = SigningKey::generate(&mut rand::rngs::OsRng);
        let mut encoded = encode_keypair(&key);
        let written = write_keypair_file(path, encoded.as_bytes());
        encoded.zeroize();
        written.map_err(|e| BootstrapError::key(role, path, e.to_string()))?;

        tracing::debug!(%role, pubkey = %pubkey_of(&key), path = %path.display(), "Generated keypair");
        Ok(())
    }
}

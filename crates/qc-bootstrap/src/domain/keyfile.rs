//! # Keypair Files
//!
//! Codec for on-disk keypair files.
//!
//! A keypair file is a JSON array of 64 integers: the 32-byte ed25519 secret
//! seed followed by the 32-byte public key. A file is valid only when the
//! stored public key matches the one derived from the seed.
//!
//! Secret material read from disk is zeroized once decoded.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use ed25519_dalek::SigningKey;
use thiserror::Error;
use zeroize::Zeroize;

use super::value_objects::Pubkey;

/// Length of a serialized keypair (seed + public key).
pub const KEYPAIR_LEN: usize = 64;

/// Keypair file errors.
#[derive(Debug, Error)]
pub enum KeypairFileError {
    /// File could not be read.
    #[error("cannot read {}: {source}", .path.display())]
    Unreadable {
        /// File path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Contents are not a JSON array of bytes.
    #[error("not a keypair file: {0}")]
    Malformed(String),

    /// Array has the wrong number of bytes.
    #[error("expected {expected} bytes, got {actual}")]
    InvalidLength {
        /// Required length.
        expected: usize,
        /// Length found.
        actual: usize,
    },

    /// Stored public key is not derived from the stored seed.
    #[error("public key does not match secret key")]
    Mismatch,
}

/// Decode keypair file contents into a signing key.
pub fn decode_keypair(contents: &[u8]) -> Result<SigningKey, KeypairFileError> {
    let mut bytes: Vec<u8> =
        serde_json::from_slice(contents).map_err(|e| KeypairFileError::Malformed(e.to_string()))?;

    if bytes.len() != KEYPAIR_LEN {
        let actual = bytes.len();
        bytes.zeroize();
        return Err(KeypairFileError::InvalidLength {
            expected: KEYPAIR_LEN,
            actual,
        });
    }

    let mut raw = [0u8; KEYPAIR_LEN];
    raw.copy_from_slice(&bytes);
    bytes.zeroize();

    let key = SigningKey::from_keypair_bytes(&raw).map_err(|_| KeypairFileError::Mismatch);
    raw.zeroize();
    key
}

/// Encode a signing key in keypair file format.
pub fn encode_keypair(key: &SigningKey) -> String {
    let mut raw = key.to_keypair_bytes();
    let body = raw
        .iter()
        .map(|b| b.to_string())
        .collect::<Vec<_>>()
        .join(",");
    raw.zeroize();
    format!("[{}]", body)
}

/// Public key of a signing key.
pub fn pubkey_of(key: &SigningKey) -> Pubkey {
    Pubkey::new(key.verifying_key().to_bytes())
}

/// Validate keypair file contents and return the public key.
pub fn pubkey_from_contents(contents: &[u8]) -> Result<Pubkey, KeypairFileError> {
    decode_keypair(contents).map(|key| pubkey_of(&key))
}

/// Read and validate a keypair file, returning its public key.
pub fn read_pubkey(path: &Path) -> Result<Pubkey, KeypairFileError> {
    let mut contents = fs::read(path).map_err(|source| KeypairFileError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;
    let result = pubkey_from_contents(&contents);
    contents.zeroize();
    result
}

/// Write keypair file contents readable by the owner only.
///
/// Truncates an existing file and tightens its mode, which `open` alone
/// leaves untouched.
pub fn write_keypair_file(path: &Path, contents: &[u8]) -> io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
    }
    file.write_all(contents)?;
    file.sync_all()
}

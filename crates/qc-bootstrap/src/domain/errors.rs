//! # Domain Errors
//!
//! Error types for the bootstrap pipeline.
//!
//! Every error is fatal to the run. Each variant names the stage it came
//! from and the artifact involved so the operator knows what to fix.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use super::value_objects::{KeyRole, Stage};

/// Failure to recover a slot from staged snapshot archives.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SlotParseError {
    /// No `snapshot-*.tar.bz2` file is staged.
    #[error("no snapshot archive found in {}", .dir.display())]
    NoCandidates {
        /// Directory that was listed.
        dir: PathBuf,
    },

    /// More than one snapshot archive is staged.
    #[error("ambiguous snapshot selection in {}: {candidates:?}", .dir.display())]
    Ambiguous {
        /// Directory that was listed.
        dir: PathBuf,
        /// Every matching file name.
        candidates: Vec<String>,
    },

    /// File name does not follow `snapshot-<slot>-<hash>.tar.bz2`.
    #[error("unparseable snapshot filename {file_name:?}: {reason}")]
    Malformed {
        /// Offending base name.
        file_name: String,
        /// What part of the pattern failed.
        reason: &'static str,
    },
}

/// Errors that abort a bootstrap run.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Remote artifact unreachable, rejected, or empty after download.
    #[error("fetch failed for {artifact}: {reason}")]
    Fetch {
        /// Requested or staged artifact name.
        artifact: String,
        /// Underlying cause.
        reason: String,
    },

    /// Snapshot slot could not be determined.
    #[error(transparent)]
    Parse(#[from] SlotParseError),

    /// A supplied keypair is unreadable or corrupt, or provisioning failed.
    #[error("cannot provision {role} keypair at {}: {reason}", .path.display())]
    KeyProvision {
        /// Role being provisioned.
        role: KeyRole,
        /// Override or default path involved.
        path: PathBuf,
        /// Underlying cause.
        reason: String,
    },

    /// An external tool could not be spawned or exited non-zero.
    #[error("{tool} failed during {stage}: {reason}")]
    ToolInvocation {
        /// Stage that invoked the tool.
        stage: Stage,
        /// Tool and subcommand, e.g. `solana-ledger-tool create-snapshot`.
        tool: String,
        /// Exit status and stderr excerpt, or spawn error.
        reason: String,
    },

    /// Another run holds the workspace lock.
    #[error("{}", locked_message(.path, .pid))]
    WorkspaceLocked {
        /// Lock file path.
        path: PathBuf,
        /// PID recorded by the holder, when readable.
        pid: Option<u32>,
    },

    /// Filesystem operation failed.
    #[error("{stage}: {context}: {source}")]
    Io {
        /// Stage performing the operation.
        stage: Stage,
        /// What was being done.
        context: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
}

fn locked_message(path: &std::path::Path, pid: &Option<u32>) -> String {
    match pid {
        Some(pid) => format!(
            "workspace already in use by process {} ({})",
            pid,
            path.display()
        ),
        None => format!("workspace already in use ({})", path.display()),
    }
}

impl BootstrapError {
    /// Stage the error is attributed to.
    pub fn stage(&self) -> Stage {
        match self {
            BootstrapError::Fetch { .. } => Stage::Fetch,
            BootstrapError::Parse(_) => Stage::SlotExtraction,
            BootstrapError::KeyProvision { .. } => Stage::KeyProvisioning,
            BootstrapError::ToolInvocation { stage, .. } => *stage,
            BootstrapError::WorkspaceLocked { .. } => Stage::WorkspaceLock,
            BootstrapError::Io { stage, .. } => *stage,
            BootstrapError::Config(_) => Stage::Configuration,
        }
    }

    /// Build an [`BootstrapError::Io`] with context.
    pub fn io(stage: Stage, context: impl Into<String>, source: io::Error) -> Self {
        BootstrapError::Io {
            stage,
            context: context.into(),
            source,
        }
    }

    pub(crate) fn fetch(artifact: impl Into<String>, reason: impl Into<String>) -> Self {
        BootstrapError::Fetch {
            artifact: artifact.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn key(role: KeyRole, path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        BootstrapError::KeyProvision {
            role,
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn tool(stage: Stage, tool: impl Into<String>, reason: impl Into<String>) -> Self {
        BootstrapError::ToolInvocation {
            stage,
            tool: tool.into(),
            reason: reason.into(),
        }
    }
}

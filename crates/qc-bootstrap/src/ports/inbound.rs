//! # Inbound Ports
//!
//! API trait defining what the bootstrap pipeline offers its callers.

use async_trait::async_trait;

use crate::domain::{BootstrapError, BootstrapSnapshot};

/// Bootstrap pipeline API - inbound port.
#[async_trait]
pub trait BootstrapApi: Send + Sync {
    /// Run every stage in order and return the rebuilt snapshot.
    ///
    /// Working directories are reset on every run; a failed run leaves no
    /// usable snapshot and must be restarted from the fetch.
    async fn run(&self) -> Result<BootstrapSnapshot, BootstrapError>;
}

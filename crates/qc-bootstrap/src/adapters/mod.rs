//! # Adapters
//!
//! Production implementations of the outbound ports, plus the workspace
//! lock and process runner they share.

pub mod http;
pub mod keygen;
pub mod ledger_tool;
pub mod lock;
pub mod process;

pub use http::HttpArtifactSource;
pub use keygen::{ExternalKeygen, NativeKeygen};
pub use ledger_tool::ExternalLedgerTool;
pub use lock::WorkspaceLock;

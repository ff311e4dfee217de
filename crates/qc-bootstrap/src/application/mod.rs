//! # Application Layer
//!
//! Service orchestrating the bootstrap stages.

pub mod service;

pub use service::BootstrapPipeline;

//! FIRDS Common Library
//!
//! Shared plumbing for the FIRDS workspace members:
//!
//! - **Logging**: `tracing` subscriber setup driven by `LOG_*` variables
//! - **Checksums**: SHA-256 digests of produced tables
//!
//! # Example
//!
//! ```no_run
//! use firds_common::checksum::sha256_hex;
//! use firds_common::logging::{init_logging, LogConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let _guard = init_logging(&LogConfig::from_env()?)?;
//!     tracing::info!(checksum = %sha256_hex(b"Id,FullNm\n"), "Table ready");
//!     Ok(())
//! }
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod checksum;
pub mod logging;

pub use logging::{init_logging, LogConfig, LogGuard};

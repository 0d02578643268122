//! FIRDS Ingest Library
//!
//! Turns the latest ESMA FIRDS `DLTINS` publication into a CSV table in
//! object storage.
//!
//! # Stages
//!
//! - **Feed**: parse the register's file-list response ([`feed`])
//! - **Locator**: pick the first `DLTINS` file ([`locator`])
//! - **Extractor**: pull the XML member out of the downloaded zip ([`extractor`])
//! - **Transformer**: flatten `FinInstrmGnlAttrbts` elements ([`transformer`])
//! - **Table**: serialize records as CSV ([`table`])
//!
//! [`pipeline::FirdsPipeline`] runs them in order against a [`fetch::Fetch`]
//! source and an [`storage::ObjectSink`] destination, and [`handler::handle`]
//! wraps one run per invocation.
//!
//! # Example
//!
//! ```no_run
//! use firds_ingest::{config::IngestConfig, handler};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = IngestConfig::from_env()?;
//!     let response = handler::handle(&serde_json::json!({}), &config).await?;
//!     println!("{}", response.body);
//!     Ok(())
//! }
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod config;
pub mod error;
pub mod extractor;
pub mod feed;
pub mod fetch;
pub mod handler;
pub mod locator;
pub mod models;
pub mod pipeline;
pub mod storage;
pub mod table;
pub mod transformer;

pub use error::{IngestError, Result};

//! # NOID Minter
//!
//! Mints opaque, check-digit protected identifiers ("NOIDs") for repository
//! objects and maps each identifier to a bucketed storage path.
//!
//! - **Templates**: `.reeddeeddk`-style templates describe the identifier
//!   shape; see [`domain::template`]
//! - **Minting**: [`Minter`] walks the template's sequence, skips identifiers
//!   the object store already has, and persists its position first
//! - **Paths**: [`PathResolver`] hashes identifiers into a fixed-depth
//!   directory tree and translates between identifiers and URIs
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                          noid-minter                             │
//! ├──────────────────────────────────────────────────────────────────┤
//! │  ┌────────────┐   ┌────────────┐   ┌─────────────┐               │
//! │  │  Minter    │ → │  Template  │   │ StateStore  │ ← file/memory │
//! │  │ (service)  │ → │  (domain)  │   │ ObjectStore │ ← repository  │
//! │  └────────────┘   └────────────┘   └─────────────┘               │
//! │  ┌──────────────┐   ┌──────────────────────────┐                 │
//! │  │ PathResolver │ ← │ Settings (process-wide)  │                 │
//! │  └──────────────┘   └──────────────────────────┘                 │
//! └──────────────────────────────────────────────────────────────────┘
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

pub mod config;
pub mod domain;
pub mod error;
pub mod service;
pub mod storage;

pub use config::{AppConfig, ObservabilityConfig, Settings};
pub use domain::{MinterState, Template};
pub use error::{NoidError, Result};
pub use service::{Minter, PathResolver};
pub use storage::{
    FileStateStore, MemoryObjectStore, MemoryStateStore, ObjectStore, StateStore, StateTransaction,
};

/// Initialize logging based on configuration.
///
/// `RUST_LOG` takes precedence over the configured level. Does nothing if a
/// global subscriber is already installed.
pub fn init_logging(config: &ObservabilityConfig) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    let result = if config.log_format == "json" {
        subscriber.with(fmt::layer().json()).try_init()
    } else {
        subscriber.with(fmt::layer()).try_init()
    };

    if result.is_ok() {
        tracing::info!(
            version = env!("CARGO_PKG_VERSION"),
            format = %config.log_format,
            "Logging initialized"
        );
    }
}

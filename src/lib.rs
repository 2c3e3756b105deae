// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::match_wildcard_for_single_variants)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # tap-simphony
//!
//! A Singer tap extracting point-of-sale data from the Oracle Simphony
//! Business Intelligence API.
//!
//! ## Features
//!
//! - **PKCE sign-in**: authorize, sign in and token exchange against the identity provider
//! - **Business date windows**: guest checks are read one business date at a time up to yesterday
//! - **Dimension streams**: menu items, taxes, revenue centers, workstations and tender media
//! - **Incremental sync**: bookmarks on the guest check open time
//! - **Exact decimals**: currency amounts keep the precision they arrive with
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tap_simphony::{engine, output::JsonLinesSink, state::StateManager, streams::Stream, TapConfig};
//!
//! #[tokio::main]
//! async fn main() -> tap_simphony::Result<()> {
//!     let config = TapConfig::from_file("config.json")?;
//!     let state = StateManager::from_file("state.json")?;
//!     let mut sink = JsonLinesSink::stdout();
//!
//!     engine::run(&config, state, &[Stream::GuestChecks], &mut sink).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                          CLI / Runner                           │
//! │        spec        check        discover        read            │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────┬───────────┬───────┴───────┬───────────┬─────────────┐
//! │   Auth   │   HTTP    │   Paginate    │  Streams  │   Output    │
//! ├──────────┼───────────┼───────────────┼───────────┼─────────────┤
//! │ PKCE     │ POST JSON │ Business date │ Catalog   │ SCHEMA      │
//! │ Sign in  │ Retry     │ Next page     │ Schemas   │ RECORD      │
//! │ Token    │ Rate Limit│ token         │ Bookmarks │ STATE       │
//! └──────────┴───────────┴───────────────┴───────────┴─────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Identity provider handshake
pub mod auth;

/// HTTP client with retry and rate limiting
pub mod http;

/// Pagination strategies
pub mod pagination;

/// Response decoding
pub mod decode;

/// Bookmarks and state persistence
pub mod state;

/// Singer messages and sinks
pub mod output;

/// Stream catalog
pub mod streams;

/// Stream JSON schemas
pub mod schema;

/// Main execution engine
pub mod engine;

/// Tap configuration
pub mod config;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use config::TapConfig;
pub use error::{Error, Result};
pub use types::*;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");

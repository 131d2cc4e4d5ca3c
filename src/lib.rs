//! # fcgi-client
//!
//! A blocking FastCGI client with:
//! - Bit-exact codec for variable lengths, name-value pairs and records
//! - Typed builders for every record kind
//! - A single-exchange connection driver over TCP or Unix sockets
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Caller                               │
//! │            (params, stdin)  ▲  (stdout, stderr)              │
//! └──────────────────┬──────────┼───────────────────────────────┘
//!                    │          │
//! ┌──────────────────▼──────────┴───────────────────────────────┐
//! │                     Client / Session                         │
//! │          (one exchange at a time, request id counter)        │
//! └──────────────────┬──────────▲───────────────────────────────┘
//!                    │          │
//!          ┌─────────▼───┐  ┌───┴──────────┐
//!          │  Messages   │  │   Streams    │
//!          │ (builders)  │  │ (filter/join)│
//!          └─────────┬───┘  └───▲──────────┘
//!                    │          │
//!          ┌─────────▼──────────┴─────────┐
//!          │    Record (8-byte framing)   │
//!          │  NameValuePair / VarLength   │
//!          └─────────┬──────────▲─────────┘
//!                    ▼          │
//!          ┌──────────────────────────────┐
//!          │   Connection (TCP / Unix)    │
//!          └──────────────────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod network;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{FcgiError, Result};
pub use config::{ClientConfig, Transport};
pub use network::{run_once, Client, Exchange, ExchangeState};
pub use protocol::{NameValuePair, Record, RecordType, Role};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of fcgi-client
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

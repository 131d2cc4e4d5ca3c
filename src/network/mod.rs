//! Network Module
//!
//! Connection handling and the exchange driver.
//!
//! ## Architecture
//! - One connection per client, TCP or Unix domain socket
//! - One outstanding exchange per connection, serialized by a lock
//! - Requests written as a single buffer, responses read record by record

mod client;
mod connection;

pub use client::{run_once, Client, Exchange, ExchangeState, RequestIdCounter, Session};
pub use connection::Connection;

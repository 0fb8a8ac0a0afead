//! End-to-end test harness for the Pantos multichain client.
//!
//! The harness brings up Dockerized contract, service-node and validator-node
//! stacks via their `make` targets, resolves the generated per-stack
//! credentials and environment files, and drives the client library through
//! transfer scenarios. All protocol logic lives behind the [`client`] seam;
//! this crate only orchestrates.

pub mod chain;
pub mod client;
pub mod env;
pub mod error;
pub mod keystore;
pub mod poller;
pub mod runner;
pub mod setup;
pub mod stack;
pub mod testing;
pub mod transfer;

pub use error::{Error, Result};

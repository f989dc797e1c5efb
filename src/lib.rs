//! Library root: exposes the chaincode, world-state backends and runner
//! plumbing to the binary and to integration tests.

pub mod config;
pub mod contract;
pub mod error;
pub mod ledger;
pub mod logger;

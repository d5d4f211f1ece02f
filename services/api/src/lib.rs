//! tramdoc API server library.
//!
//! The crate ships the `tramdoc-api` binary; the library surface exists so
//! the router can be driven from integration tests.

pub mod api;
pub mod config;
pub mod db;
pub mod state;

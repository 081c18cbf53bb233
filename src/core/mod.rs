//! Core library components.
//!
//! Provider adapters, persisted state and the sync engine. Nothing in here
//! prints; the CLI renders results.

pub mod binding;
pub mod config;
pub mod constants;
pub mod domain;
pub mod provider;
pub mod registry;
pub mod storage;
pub mod sync;
pub mod types;

//! CLI subcommand implementations.

pub mod cache;
pub mod common;
pub mod export;
pub mod fetch;
pub mod search;

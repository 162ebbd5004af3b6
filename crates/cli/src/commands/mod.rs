//! Subcommand implementations.

pub mod accounts;
pub mod copy;
pub mod launch;
pub mod stores;

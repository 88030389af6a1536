//! Command implementations for the scimp CLI.

pub mod config;
pub mod helpers;
pub mod invoke;
pub mod serve;

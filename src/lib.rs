//! sqlcli - an interactive SQL shell with psql-style backslash commands.
//!
//! This library exposes the core modules for use by the binary and tests.

pub mod commands;
pub mod completion;
pub mod database;
pub mod error;
pub mod logging;
pub mod special;

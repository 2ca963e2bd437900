//! CLI command implementations.

pub mod common;
pub mod console;
pub mod curves;
pub mod init;
pub mod render;
pub mod states;

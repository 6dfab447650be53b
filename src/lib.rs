// ABOUTME: Library root for charmhand - stages local Juju charms and drives the juju CLI.
// ABOUTME: The main binary is in main.rs.

pub mod config_file;
pub mod deploy;
pub mod error;
pub mod juju;
pub mod repository;

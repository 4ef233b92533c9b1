//! Library half of the `roster` binary: configuration and maintenance commands

pub mod commands;
pub mod config;

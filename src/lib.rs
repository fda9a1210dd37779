//! Core library for the `perfana-cli` tool.
//!
//! This crate provides the building blocks used by the binary: CLI argument
//! types, the YAML profile, the Perfana HTTP client and the run domain
//! types. The primary user-facing interface is the `perfana-cli`
//! command-line application; library APIs may evolve as the CLI grows.
pub mod args;
pub mod client;
pub mod config;
pub mod domain;
pub mod error;

//! # tenc
//!
//! Command-line front end for `tenc-core`: input readers, output encoders,
//! configuration and the CLI commands that tie them together.

pub mod cli;
pub mod config;
pub mod encoders;
pub mod sources;

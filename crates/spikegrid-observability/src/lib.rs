// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # spikegrid-observability
//!
//! Logging setup shared by every Spikegrid crate, with per-crate debug flags.
//!
//! ## Features
//! - `file-logging`: daily rotating log files in a timestamped run folder

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod config;
pub mod init;

// Re-export commonly used items
pub use cli::*;
pub use config::*;
pub use init::*;

/// Known Spikegrid crate names for debug flags
pub const KNOWN_CRATES: &[&str] = &[
    "spikegrid",
    "spikegrid-config",
    "spikegrid-npu-neural",
    "spikegrid-npu-runtime",
    "spikegrid-npu-engine",
];

// Copyright 2025 Wealthz Project
// SPDX-License-Identifier: AGPL-3.0-or-later

//! # Configuration module.
//!
//! Layered settings loading: environment variables (prefix `DUCKLAKE`,
//! nested delimiter `__`) over an optional JSON/YAML/TOML settings file.
//!

mod build;
mod params;

pub use build::build_settings;
pub use params::Params;

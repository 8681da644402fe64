// Copyright 2025 Wealthz Project
// SPDX-License-Identifier: AGPL-3.0-or-later

//! # Wealthz node errors.
//!
//! This module contains the different errors that can be returned by the Wealthz node.
//!

use thiserror::Error;

/// Wealthz node errors.
#[derive(Error, Debug, Clone)]
pub enum NodeError {
    /// Invalid parameter.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
    /// Secrets error.
    #[error("Secrets error: {0}")]
    Secrets(String),
    /// Fetch error.
    #[error("Fetch error: {0}")]
    Fetch(String),
    /// Transform error.
    #[error("Transform error: {0}")]
    Transform(String),
    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

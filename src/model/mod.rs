// Copyright 2025 Wealthz Project
// SPDX-License-Identifier: AGPL-3.0-or-later

//! # Model module.
//!
//! Pipeline documents and the in-memory frame exchanged between stages.
//!

pub mod frame;
pub mod pipeline;

pub use frame::{Cell, Frame};
pub use pipeline::{
    Column, ColumnType, Datasource, Engine, EngineType, EtlPipeline, ReplicationType, Transform,
    GOOGLE_CREDENTIALS_FILENAME,
};

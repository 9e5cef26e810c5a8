// SPDX-FileCopyrightText: 2026 Riflett Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! On-device persistence for the Riflett memory store.
//!
//! Provides the SQLite row backend (legacy and modern client shapes behind
//! one `execute` contract), embedded migrations, typed memory row
//! statements, and a file-backed flat key-value store.

pub mod database;
pub mod flat;
pub mod migrations;
pub mod queries;

pub use database::{IN_MEMORY, RowBackend, Rows};
pub use flat::FileKeyValueStore;

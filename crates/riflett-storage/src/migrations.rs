// SPDX-FileCopyrightText: 2026 Riflett Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedded schema migrations using refinery.
//!
//! SQL files under `migrations/` are compiled into the binary and applied
//! whenever a backend is opened.

use riflett_core::RiflettError;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Apply pending migrations; refinery records them in `refinery_schema_history`.
pub fn run_migrations(conn: &mut rusqlite::Connection) -> Result<(), RiflettError> {
    embedded::migrations::runner()
        .run(conn)
        .map_err(RiflettError::storage)?;
    Ok(())
}

/// Same as [`run_migrations`] with the error flattened for use inside a
/// `tokio_rusqlite` call, whose error type must be `Send + 'static`.
pub(crate) fn run_migrations_io(conn: &mut rusqlite::Connection) -> Result<(), std::io::Error> {
    embedded::migrations::runner()
        .run(conn)
        .map(|_| ())
        .map_err(|e| std::io::Error::other(e.to_string()))
}

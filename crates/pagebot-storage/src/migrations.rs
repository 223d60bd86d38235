// SPDX-FileCopyrightText: 2026 Pagebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedded database migrations using refinery.
//!
//! SQL migration files are compiled into the binary at build time via
//! `embed_migrations!`. Migrations run automatically on database open.

use pagebot_core::PagebotError;
use tracing::info;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Run all pending migrations on the connection's worker thread.
///
/// Refinery tracks applied migrations in its own `refinery_schema_history` table.
pub async fn run_migrations(conn: &tokio_rusqlite::Connection) -> Result<(), PagebotError> {
    let applied = conn
        .call(|conn| {
            embedded::migrations::runner()
                .run(conn)
                .map(|report| report.applied_migrations().len())
                .map_err(|e| e.to_string())
        })
        .await
        .map_err(|e: tokio_rusqlite::Error<String>| PagebotError::Storage {
            source: format!("migration failed: {e}").into(),
        })?;

    if applied > 0 {
        info!(applied, "applied database migrations");
    }
    Ok(())
}

// SPDX-FileCopyrightText: 2026 Pagebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Page lookups. Pages are administered elsewhere; the engine only reads them.

use pagebot_core::PagebotError;
use pagebot_core::types::{Page, ProviderKeys};
use rusqlite::params;

use crate::database::{Database, map_tr_err, now};

const PAGE_COLUMNS: &str = "id, owner_id, external_id, name, access_token, is_active, \
                            ai_enabled, ai_prompt, ai_config";

fn page_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Page> {
    let ai_config: String = row.get(8)?;
    let ai_keys = serde_json::from_str::<ProviderKeys>(&ai_config).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "ignoring malformed page ai_config");
        ProviderKeys::default()
    });
    Ok(Page {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        external_id: row.get(2)?,
        name: row.get(3)?,
        access_token: row.get(4)?,
        is_active: row.get(5)?,
        ai_enabled: row.get(6)?,
        ai_prompt: row.get(7)?,
        ai_keys,
    })
}

async fn get_by(db: &Database, column: &'static str, value: &str) -> Result<Option<Page>, PagebotError> {
    let value = value.to_string();
    db.connection()
        .call(move |conn| {
            let sql = format!("SELECT {PAGE_COLUMNS} FROM pages WHERE {column} = ?1");
            match conn.query_row(&sql, params![value], page_from_row) {
                Ok(page) => Ok(Some(page)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Get a page by its internal ID.
pub async fn get_page(db: &Database, id: &str) -> Result<Option<Page>, PagebotError> {
    get_by(db, "id", id).await
}

/// Get a page by the channel-side identifier.
pub async fn get_page_by_external_id(
    db: &Database,
    external_id: &str,
) -> Result<Option<Page>, PagebotError> {
    get_by(db, "external_id", external_id).await
}

/// Insert a page.
pub async fn create_page(db: &Database, page: &Page) -> Result<(), PagebotError> {
    let page = page.clone();
    let ai_config = serde_json::to_string(&page.ai_keys).map_err(|e| PagebotError::Storage {
        source: Box::new(e),
    })?;
    let ts = now();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO pages (id, owner_id, external_id, name, access_token, is_active,
                                    ai_enabled, ai_prompt, ai_config, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    page.id,
                    page.owner_id,
                    page.external_id,
                    page.name,
                    page.access_token,
                    page.is_active,
                    page.ai_enabled,
                    page.ai_prompt,
                    ai_config,
                    ts,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

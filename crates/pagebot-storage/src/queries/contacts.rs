// SPDX-FileCopyrightText: 2026 Pagebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-contact variables and tags.

use pagebot_core::PagebotError;
use pagebot_core::types::UserVariable;
use rusqlite::params;

use crate::database::{Database, map_tr_err, now};

/// Upsert a variable (last write wins).
pub async fn set_variable(
    db: &Database,
    page_id: &str,
    user_id: &str,
    key: &str,
    value: &str,
) -> Result<(), PagebotError> {
    let (page_id, user_id, key, value) = (
        page_id.to_string(),
        user_id.to_string(),
        key.to_string(),
        value.to_string(),
    );
    let ts = now();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO user_variables (page_id, user_id, key, value, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(page_id, user_id, key) DO UPDATE SET
                    value = excluded.value,
                    updated_at = excluded.updated_at",
                params![page_id, user_id, key, value, ts],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// All variables of a contact, ordered by key.
pub async fn list_variables(
    db: &Database,
    page_id: &str,
    user_id: &str,
) -> Result<Vec<UserVariable>, PagebotError> {
    let page_id = page_id.to_string();
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT key, value FROM user_variables
                 WHERE page_id = ?1 AND user_id = ?2 ORDER BY key",
            )?;
            let rows = stmt.query_map(params![page_id, user_id], |row| {
                Ok(UserVariable {
                    key: row.get(0)?,
                    value: row.get(1)?,
                })
            })?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}

/// Insert a tag unless present. Returns whether a row was added.
pub async fn add_tag(
    db: &Database,
    page_id: &str,
    user_id: &str,
    tag: &str,
) -> Result<bool, PagebotError> {
    let (page_id, user_id, tag) = (page_id.to_string(), user_id.to_string(), tag.to_string());
    let ts = now();
    db.connection()
        .call(move |conn| {
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO user_tags (page_id, user_id, tag, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![page_id, user_id, tag, ts],
            )?;
            Ok(inserted == 1)
        })
        .await
        .map_err(map_tr_err)
}

/// All tags of a contact in the order they were added.
pub async fn list_tags(
    db: &Database,
    page_id: &str,
    user_id: &str,
) -> Result<Vec<String>, PagebotError> {
    let page_id = page_id.to_string();
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT tag FROM user_tags WHERE page_id = ?1 AND user_id = ?2 ORDER BY rowid",
            )?;
            let rows = stmt.query_map(params![page_id, user_id], |row| row.get(0))?;
            rows.collect::<Result<Vec<String>, _>>()
        })
        .await
        .map_err(map_tr_err)
}

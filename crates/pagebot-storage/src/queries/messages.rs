// SPDX-FileCopyrightText: 2026 Pagebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Append-only message log.

use pagebot_core::PagebotError;
use pagebot_core::types::{Channel, MessageEntry, Role, StoredMessage};
use rusqlite::params;

use crate::database::{Database, map_tr_err, now};
use crate::queries::conversations::channel_from_sql;

fn message_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<StoredMessage> {
    let role: String = row.get(3)?;
    let role = role.parse::<Role>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(StoredMessage {
        id: row.get(0)?,
        page_id: row.get(1)?,
        user_id: row.get(2)?,
        role,
        content: row.get(4)?,
        channel: channel_from_sql(5, row.get(5)?)?,
        created_at: row.get(6)?,
    })
}

/// Append a message and return its row id.
pub async fn append_message(db: &Database, entry: &MessageEntry) -> Result<i64, PagebotError> {
    let entry = entry.clone();
    let ts = now();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO messages (page_id, user_id, role, content, channel, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    entry.page_id,
                    entry.user_id,
                    entry.role.to_string(),
                    entry.content,
                    entry.channel.to_string(),
                    ts,
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(map_tr_err)
}

/// The newest `limit` messages of a contact across channels, oldest first.
pub async fn recent_messages(
    db: &Database,
    page_id: &str,
    user_id: &str,
    limit: usize,
) -> Result<Vec<StoredMessage>, PagebotError> {
    let page_id = page_id.to_string();
    let user_id = user_id.to_string();
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let mut messages = db
        .connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, page_id, user_id, role, content, channel, created_at
                 FROM messages WHERE page_id = ?1 AND user_id = ?2
                 ORDER BY id DESC LIMIT ?3",
            )?;
            let rows = stmt.query_map(params![page_id, user_id, limit], message_from_row)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)?;
    messages.reverse();
    Ok(messages)
}

/// Full transcript of a contact on one channel, oldest first.
pub async fn list_messages(
    db: &Database,
    page_id: &str,
    user_id: &str,
    channel: Channel,
) -> Result<Vec<StoredMessage>, PagebotError> {
    let page_id = page_id.to_string();
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, page_id, user_id, role, content, channel, created_at
                 FROM messages WHERE page_id = ?1 AND user_id = ?2 AND channel = ?3
                 ORDER BY id",
            )?;
            let rows = stmt.query_map(
                params![page_id, user_id, channel.to_string()],
                message_from_row,
            )?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}

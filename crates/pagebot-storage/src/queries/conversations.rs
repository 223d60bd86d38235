// SPDX-FileCopyrightText: 2026 Pagebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation cursors keyed by (page, user, channel).

use pagebot_core::PagebotError;
use pagebot_core::types::{Channel, Conversation, ConversationKey};
use rusqlite::params;

use crate::database::{Database, map_tr_err, now};

/// Get the cursor for a key.
pub async fn get_conversation(
    db: &Database,
    key: &ConversationKey,
) -> Result<Option<Conversation>, PagebotError> {
    let key = key.clone();
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                "SELECT flow_id, state, last_interaction FROM conversations
                 WHERE page_id = ?1 AND user_id = ?2 AND channel = ?3",
                params![key.page_id, key.user_id, key.channel.to_string()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, Option<String>>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            );
            match result {
                Ok((flow_id, state, last_interaction)) => Ok(Some(Conversation {
                    key,
                    flow_id,
                    state,
                    last_interaction,
                })),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Create or replace the cursor for a key.
pub async fn start_conversation(
    db: &Database,
    key: &ConversationKey,
    flow_id: &str,
    state: Option<&str>,
) -> Result<(), PagebotError> {
    let key = key.clone();
    let flow_id = flow_id.to_string();
    let state = state.map(str::to_string);
    let ts = now();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO conversations (page_id, user_id, channel, flow_id, state, last_interaction)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(page_id, user_id, channel) DO UPDATE SET
                    flow_id = excluded.flow_id,
                    state = excluded.state,
                    last_interaction = excluded.last_interaction",
                params![
                    key.page_id,
                    key.user_id,
                    key.channel.to_string(),
                    flow_id,
                    state,
                    ts,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Compare-and-set on the cursor position.
///
/// `IS` treats two NULLs as equal, so an unset state can be matched too.
pub async fn update_conversation_state_if(
    db: &Database,
    key: &ConversationKey,
    expected: Option<&str>,
    new_state: Option<&str>,
) -> Result<bool, PagebotError> {
    let key = key.clone();
    let expected = expected.map(str::to_string);
    let new_state = new_state.map(str::to_string);
    let ts = now();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE conversations SET state = ?5, last_interaction = ?6
                 WHERE page_id = ?1 AND user_id = ?2 AND channel = ?3 AND state IS ?4",
                params![
                    key.page_id,
                    key.user_id,
                    key.channel.to_string(),
                    expected,
                    new_state,
                    ts,
                ],
            )?;
            Ok(changed == 1)
        })
        .await
        .map_err(map_tr_err)
}

/// Delete every cursor of a user on a page, across channels.
pub async fn delete_conversations(
    db: &Database,
    page_id: &str,
    user_id: &str,
) -> Result<usize, PagebotError> {
    let page_id = page_id.to_string();
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "DELETE FROM conversations WHERE page_id = ?1 AND user_id = ?2",
                params![page_id, user_id],
            )
        })
        .await
        .map_err(map_tr_err)
}

/// Parse a stored channel name.
pub(crate) fn channel_from_sql(idx: usize, value: String) -> rusqlite::Result<Channel> {
    value.parse::<Channel>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

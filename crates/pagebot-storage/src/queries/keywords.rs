// SPDX-FileCopyrightText: 2026 Pagebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Keyword rules, kept in insertion order.

use pagebot_core::PagebotError;
use pagebot_core::types::{KeywordRule, MatchType};
use rusqlite::params;

use crate::database::{Database, map_tr_err, now};

/// List a page's keyword rules in the order they were added.
pub async fn list_keywords(db: &Database, page_id: &str) -> Result<Vec<KeywordRule>, PagebotError> {
    let page_id = page_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, page_id, keyword, match_type, flow_id
                 FROM keywords WHERE page_id = ?1 ORDER BY rowid",
            )?;
            let rows = stmt.query_map(params![page_id], |row| {
                let match_type: String = row.get(3)?;
                let match_type = match_type.parse::<MatchType>().map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        3,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })?;
                Ok(KeywordRule {
                    id: row.get(0)?,
                    page_id: row.get(1)?,
                    keyword: row.get(2)?,
                    match_type,
                    flow_id: row.get(4)?,
                })
            })?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}

/// Append a keyword rule; it is evaluated after every existing rule.
pub async fn add_keyword(db: &Database, rule: &KeywordRule) -> Result<(), PagebotError> {
    let rule = rule.clone();
    let ts = now();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO keywords (id, page_id, keyword, match_type, flow_id, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    rule.id,
                    rule.page_id,
                    rule.keyword,
                    rule.match_type.to_string(),
                    rule.flow_id,
                    ts,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Remove a keyword rule.
pub async fn delete_keyword(db: &Database, id: &str) -> Result<(), PagebotError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute("DELETE FROM keywords WHERE id = ?1", params![id])?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

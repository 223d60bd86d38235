// SPDX-FileCopyrightText: 2026 Pagebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Page activity summary.

use std::collections::HashMap;

use chrono::{Days, Utc};
use pagebot_core::PagebotError;
use pagebot_core::types::{AnalyticsSummary, DailyCount};
use rusqlite::params;

use crate::database::{Database, map_tr_err};

/// Totals plus one entry per day for the trailing `days` days (today included).
///
/// Days with no traffic are reported with a zero count.
pub async fn analytics(db: &Database, page_id: &str, days: u32) -> Result<AnalyticsSummary, PagebotError> {
    let today = Utc::now().date_naive();
    let first_day = today
        .checked_sub_days(Days::new(u64::from(days.saturating_sub(1))))
        .unwrap_or(today);
    let since = first_day.format("%Y-%m-%d").to_string();
    let page_id = page_id.to_string();

    let (total_messages, active_users, total_flows, per_day) = db
        .connection()
        .call(move |conn| {
            let total_messages: i64 = conn.query_row(
                "SELECT COUNT(*) FROM messages WHERE page_id = ?1",
                params![page_id],
                |row| row.get(0),
            )?;
            let active_users: i64 = conn.query_row(
                "SELECT COUNT(DISTINCT user_id) FROM messages WHERE page_id = ?1",
                params![page_id],
                |row| row.get(0),
            )?;
            let total_flows: i64 = conn.query_row(
                "SELECT COUNT(*) FROM flows WHERE page_id = ?1",
                params![page_id],
                |row| row.get(0),
            )?;
            let mut stmt = conn.prepare(
                "SELECT substr(created_at, 1, 10) AS day, COUNT(*)
                 FROM messages WHERE page_id = ?1 AND substr(created_at, 1, 10) >= ?2
                 GROUP BY day",
            )?;
            let rows = stmt.query_map(params![page_id, since], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?;
            let per_day = rows.collect::<Result<HashMap<_, _>, _>>()?;
            Ok((total_messages, active_users, total_flows, per_day))
        })
        .await
        .map_err(map_tr_err)?;

    let messages_over_time = first_day
        .iter_days()
        .take_while(|day| *day <= today)
        .map(|day| {
            let date = day.format("%Y-%m-%d").to_string();
            let count = per_day.get(&date).copied().unwrap_or(0);
            DailyCount { date, count }
        })
        .collect();

    Ok(AnalyticsSummary {
        total_messages,
        active_users,
        total_flows,
        messages_over_time,
    })
}

// SPDX-FileCopyrightText: 2026 Pagebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Flow records. Node and edge graphs are stored as JSON text.

use pagebot_core::PagebotError;
use pagebot_core::types::FlowRecord;
use rusqlite::params;

use crate::database::{Database, map_tr_err, now};

const FLOW_COLUMNS: &str = "id, page_id, name, nodes, edges, is_active, is_default";

fn flow_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<FlowRecord> {
    let nodes: String = row.get(3)?;
    let edges: String = row.get(4)?;
    // Unparseable graphs surface as Null and are rejected when the graph is loaded.
    Ok(FlowRecord {
        id: row.get(0)?,
        page_id: row.get(1)?,
        name: row.get(2)?,
        nodes: serde_json::from_str(&nodes).unwrap_or(serde_json::Value::Null),
        edges: serde_json::from_str(&edges).unwrap_or(serde_json::Value::Null),
        is_active: row.get(5)?,
        is_default: row.get(6)?,
    })
}

/// Get a flow by ID.
pub async fn get_flow(db: &Database, id: &str) -> Result<Option<FlowRecord>, PagebotError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let sql = format!("SELECT {FLOW_COLUMNS} FROM flows WHERE id = ?1");
            match conn.query_row(&sql, params![id], flow_from_row) {
                Ok(flow) => Ok(Some(flow)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// List all flows of a page, oldest first.
pub async fn list_flows(db: &Database, page_id: &str) -> Result<Vec<FlowRecord>, PagebotError> {
    let page_id = page_id.to_string();
    db.connection()
        .call(move |conn| {
            let sql =
                format!("SELECT {FLOW_COLUMNS} FROM flows WHERE page_id = ?1 ORDER BY created_at, rowid");
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params![page_id], flow_from_row)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}

/// The page's flow flagged both default and active.
pub async fn find_default_flow(
    db: &Database,
    page_id: &str,
) -> Result<Option<FlowRecord>, PagebotError> {
    let page_id = page_id.to_string();
    db.connection()
        .call(move |conn| {
            let sql = format!(
                "SELECT {FLOW_COLUMNS} FROM flows
                 WHERE page_id = ?1 AND is_default = 1 AND is_active = 1
                 ORDER BY updated_at DESC LIMIT 1"
            );
            match conn.query_row(&sql, params![page_id], flow_from_row) {
                Ok(flow) => Ok(Some(flow)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Insert a flow, or replace its content and flags if it exists.
pub async fn save_flow(db: &Database, flow: &FlowRecord) -> Result<(), PagebotError> {
    let flow = flow.clone();
    let nodes = flow.nodes.to_string();
    let edges = flow.edges.to_string();
    let ts = now();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO flows (id, page_id, name, nodes, edges, is_active, is_default,
                                    created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
                 ON CONFLICT(id) DO UPDATE SET
                    name = excluded.name,
                    nodes = excluded.nodes,
                    edges = excluded.edges,
                    is_active = excluded.is_active,
                    is_default = excluded.is_default,
                    updated_at = excluded.updated_at",
                params![
                    flow.id,
                    flow.page_id,
                    flow.name,
                    nodes,
                    edges,
                    flow.is_active,
                    flow.is_default,
                    ts,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Make `flow_id` the page's only active flow.
///
/// Both updates run in one transaction so a page never has two active flows.
pub async fn activate_flow(db: &Database, page_id: &str, flow_id: &str) -> Result<(), PagebotError> {
    let page_id = page_id.to_string();
    let flow_id = flow_id.to_string();
    let missing = flow_id.clone();
    let ts = now();
    let updated = db
        .connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "UPDATE flows SET is_active = 0, updated_at = ?2 WHERE page_id = ?1 AND id != ?3",
                params![page_id, ts, flow_id],
            )?;
            let updated = tx.execute(
                "UPDATE flows SET is_active = 1, updated_at = ?2 WHERE page_id = ?1 AND id = ?3",
                params![page_id, ts, flow_id],
            )?;
            if updated == 0 {
                tx.rollback()?;
            } else {
                tx.commit()?;
            }
            Ok(updated)
        })
        .await
        .map_err(map_tr_err)?;

    if updated == 0 {
        return Err(PagebotError::NotFound {
            kind: "flow",
            id: missing,
        });
    }
    Ok(())
}

// SPDX-FileCopyrightText: 2026 Pagebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tenant records and the usage counter.

use pagebot_core::PagebotError;
use pagebot_core::types::Tenant;
use rusqlite::params;

use crate::database::{Database, map_tr_err, now};

/// Insert a tenant.
pub async fn create_tenant(db: &Database, tenant: &Tenant) -> Result<(), PagebotError> {
    let tenant = tenant.clone();
    let ts = now();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO tenants (id, email, name, plan, message_count, last_reset, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
                params![
                    tenant.id,
                    tenant.email,
                    tenant.name,
                    tenant.plan,
                    tenant.message_count,
                    ts,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Get a tenant by ID.
pub async fn get_tenant(db: &Database, id: &str) -> Result<Option<Tenant>, PagebotError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                "SELECT id, email, name, plan, message_count FROM tenants WHERE id = ?1",
                params![id],
                |row| {
                    Ok(Tenant {
                        id: row.get(0)?,
                        email: row.get(1)?,
                        name: row.get(2)?,
                        plan: row.get(3)?,
                        message_count: row.get(4)?,
                    })
                },
            );
            match result {
                Ok(tenant) => Ok(Some(tenant)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Atomically add one to the usage counter, returning the new value.
pub async fn increment_usage(db: &Database, tenant_id: &str) -> Result<i64, PagebotError> {
    let tenant_id = tenant_id.to_string();
    let missing = tenant_id.clone();
    let count = db
        .connection()
        .call(move |conn| {
            let result = conn.query_row(
                "UPDATE tenants SET message_count = message_count + 1
                 WHERE id = ?1 RETURNING message_count",
                params![tenant_id],
                |row| row.get::<_, i64>(0),
            );
            match result {
                Ok(count) => Ok(Some(count)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)?;

    count.ok_or(PagebotError::NotFound {
        kind: "tenant",
        id: missing,
    })
}

/// Zero the usage counter and stamp the reset time.
pub async fn reset_usage(db: &Database, tenant_id: &str) -> Result<(), PagebotError> {
    let tenant_id = tenant_id.to_string();
    let ts = now();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE tenants SET message_count = 0, last_reset = ?2 WHERE id = ?1",
                params![tenant_id, ts],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

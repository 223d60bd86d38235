// SPDX-FileCopyrightText: 2026 Pagebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness backed by a temporary SQLite database.
//!
//! `TestHarness` owns a migrated database in a temp directory plus seeding
//! helpers for tenants, pages, flows, and keywords.

use std::sync::Arc;

use pagebot_config::PagebotConfig;
use pagebot_config::model::StorageConfig;
use pagebot_core::types::{FlowRecord, KeywordRule, MatchType, Page, ProviderKeys, Tenant};
use pagebot_core::{PagebotError, PluginAdapter, StorageAdapter};
use pagebot_storage::SqliteStorage;
use serde_json::Value;

/// A migrated database in a temp directory. Dropping the harness deletes it.
pub struct TestHarness {
    storage: Arc<SqliteStorage>,
    config: PagebotConfig,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a harness, panicking if the database cannot be set up.
    pub async fn new() -> Self {
        match Self::try_new().await {
            Ok(harness) => harness,
            Err(e) => panic!("failed to build test harness: {e}"),
        }
    }

    pub async fn try_new() -> Result<Self, PagebotError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| PagebotError::Storage { source: e.into() })?;
        let storage_config = StorageConfig {
            database_path: temp_dir
                .path()
                .join("test.db")
                .to_string_lossy()
                .into_owned(),
            wal_mode: true,
        };
        let storage = SqliteStorage::new(storage_config.clone());
        storage.initialize().await?;

        let config = PagebotConfig {
            storage: storage_config,
            ..PagebotConfig::default()
        };

        Ok(Self {
            storage: Arc::new(storage),
            config,
            _temp_dir: temp_dir,
        })
    }

    pub fn storage(&self) -> Arc<dyn StorageAdapter + Send + Sync> {
        self.storage.clone()
    }

    /// Default configuration pointing at the harness database.
    pub fn config(&self) -> PagebotConfig {
        self.config.clone()
    }

    /// A tenant on `plan` with `used` messages counted.
    pub fn tenant(id: &str, plan: &str, used: i64) -> Tenant {
        Tenant {
            id: id.to_string(),
            email: format!("{id}@example.com"),
            name: format!("Tenant {id}"),
            plan: plan.to_string(),
            message_count: used,
        }
    }

    /// An active, AI-enabled page with external id `ext-{id}`.
    pub fn page(id: &str, owner_id: &str) -> Page {
        Page {
            id: id.to_string(),
            owner_id: owner_id.to_string(),
            external_id: format!("ext-{id}"),
            name: format!("Page {id}"),
            is_active: true,
            ai_enabled: true,
            ai_prompt: Some("You are the shop assistant.".to_string()),
            ai_keys: ProviderKeys::default(),
            access_token: Some(format!("token-{id}")),
        }
    }

    pub async fn insert_tenant(&self, tenant: &Tenant) {
        if let Err(e) = self.storage.create_tenant(tenant).await {
            panic!("seeding tenant {}: {e}", tenant.id);
        }
    }

    /// Insert a page, creating a Starter owner tenant if none exists.
    pub async fn insert_page(&self, page: &Page) {
        let owner = self.storage.get_tenant(&page.owner_id).await;
        if matches!(owner, Ok(None)) {
            self.insert_tenant(&Self::tenant(&page.owner_id, "Starter", 0))
                .await;
        }
        if let Err(e) = self.storage.create_page(page).await {
            panic!("seeding page {}: {e}", page.id);
        }
    }

    /// Insert an active flow.
    pub async fn insert_flow(
        &self,
        page_id: &str,
        flow_id: &str,
        nodes: Value,
        edges: Value,
        is_default: bool,
    ) -> FlowRecord {
        let record = FlowRecord {
            id: flow_id.to_string(),
            page_id: page_id.to_string(),
            name: format!("Flow {flow_id}"),
            is_active: true,
            is_default,
            nodes,
            edges,
        };
        if let Err(e) = self.storage.save_flow(&record).await {
            panic!("seeding flow {flow_id}: {e}");
        }
        record
    }

    pub async fn insert_keyword(
        &self,
        id: &str,
        page_id: &str,
        keyword: &str,
        match_type: MatchType,
        flow_id: &str,
    ) {
        let rule = KeywordRule {
            id: id.to_string(),
            page_id: page_id.to_string(),
            keyword: keyword.to_string(),
            match_type,
            flow_id: flow_id.to_string(),
        };
        if let Err(e) = self.storage.add_keyword(&rule).await {
            panic!("seeding keyword {id}: {e}");
        }
    }
}

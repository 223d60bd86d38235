// SPDX-FileCopyrightText: 2026 Pagebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the StorageAdapter trait.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use pagebot_config::model::StorageConfig;
use pagebot_core::types::{
    AnalyticsSummary, Channel, Conversation, ConversationKey, FlowRecord, KeywordRule,
    MessageEntry, Page, StoredMessage, Tenant, UserVariable,
};
use pagebot_core::{AdapterType, HealthStatus, PagebotError, PluginAdapter, StorageAdapter};

use crate::database::{Database, map_tr_err};
use crate::queries;

/// SQLite-backed storage adapter.
///
/// Wraps a [`Database`] handle and delegates all query operations to the
/// typed query modules. The database is opened on the first call to
/// [`StorageAdapter::initialize`].
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// Create a new SqliteStorage with the given configuration.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    fn db(&self) -> Result<&Database, PagebotError> {
        self.db.get().ok_or_else(|| PagebotError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }

    async fn checkpoint(&self) -> Result<(), PagebotError> {
        if let Some(db) = self.db.get() {
            db.connection()
                .call(|conn| -> Result<(), rusqlite::Error> {
                    conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                    Ok(())
                })
                .await
                .map_err(map_tr_err)?;
            debug!("WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, PagebotError> {
        let db = self.db()?;
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), PagebotError> {
        self.checkpoint().await
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), PagebotError> {
        let db = Database::open(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| PagebotError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), PagebotError> {
        self.db()?;
        self.checkpoint().await
    }

    // --- Tenants ---

    async fn get_tenant(&self, id: &str) -> Result<Option<Tenant>, PagebotError> {
        queries::tenants::get_tenant(self.db()?, id).await
    }

    async fn create_tenant(&self, tenant: &Tenant) -> Result<(), PagebotError> {
        queries::tenants::create_tenant(self.db()?, tenant).await
    }

    async fn increment_usage(&self, tenant_id: &str) -> Result<i64, PagebotError> {
        queries::tenants::increment_usage(self.db()?, tenant_id).await
    }

    async fn reset_usage(&self, tenant_id: &str) -> Result<(), PagebotError> {
        queries::tenants::reset_usage(self.db()?, tenant_id).await
    }

    // --- Pages ---

    async fn get_page(&self, id: &str) -> Result<Option<Page>, PagebotError> {
        queries::pages::get_page(self.db()?, id).await
    }

    async fn get_page_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<Page>, PagebotError> {
        queries::pages::get_page_by_external_id(self.db()?, external_id).await
    }

    async fn create_page(&self, page: &Page) -> Result<(), PagebotError> {
        queries::pages::create_page(self.db()?, page).await
    }

    // --- Flows ---

    async fn get_flow(&self, id: &str) -> Result<Option<FlowRecord>, PagebotError> {
        queries::flows::get_flow(self.db()?, id).await
    }

    async fn list_flows(&self, page_id: &str) -> Result<Vec<FlowRecord>, PagebotError> {
        queries::flows::list_flows(self.db()?, page_id).await
    }

    async fn find_default_flow(
        &self,
        page_id: &str,
    ) -> Result<Option<FlowRecord>, PagebotError> {
        queries::flows::find_default_flow(self.db()?, page_id).await
    }

    async fn save_flow(&self, flow: &FlowRecord) -> Result<(), PagebotError> {
        queries::flows::save_flow(self.db()?, flow).await
    }

    async fn activate_flow(&self, page_id: &str, flow_id: &str) -> Result<(), PagebotError> {
        queries::flows::activate_flow(self.db()?, page_id, flow_id).await
    }

    // --- Keywords ---

    async fn list_keywords(&self, page_id: &str) -> Result<Vec<KeywordRule>, PagebotError> {
        queries::keywords::list_keywords(self.db()?, page_id).await
    }

    async fn add_keyword(&self, rule: &KeywordRule) -> Result<(), PagebotError> {
        queries::keywords::add_keyword(self.db()?, rule).await
    }

    async fn delete_keyword(&self, id: &str) -> Result<(), PagebotError> {
        queries::keywords::delete_keyword(self.db()?, id).await
    }

    // --- Conversations ---

    async fn get_conversation(
        &self,
        key: &ConversationKey,
    ) -> Result<Option<Conversation>, PagebotError> {
        queries::conversations::get_conversation(self.db()?, key).await
    }

    async fn start_conversation(
        &self,
        key: &ConversationKey,
        flow_id: &str,
        state: Option<&str>,
    ) -> Result<(), PagebotError> {
        queries::conversations::start_conversation(self.db()?, key, flow_id, state).await
    }

    async fn update_conversation_state_if(
        &self,
        key: &ConversationKey,
        expected: Option<&str>,
        new_state: Option<&str>,
    ) -> Result<bool, PagebotError> {
        queries::conversations::update_conversation_state_if(self.db()?, key, expected, new_state)
            .await
    }

    async fn delete_conversations(
        &self,
        page_id: &str,
        user_id: &str,
    ) -> Result<usize, PagebotError> {
        queries::conversations::delete_conversations(self.db()?, page_id, user_id).await
    }

    // --- Contact data ---

    async fn set_variable(
        &self,
        page_id: &str,
        user_id: &str,
        key: &str,
        value: &str,
    ) -> Result<(), PagebotError> {
        queries::contacts::set_variable(self.db()?, page_id, user_id, key, value).await
    }

    async fn list_variables(
        &self,
        page_id: &str,
        user_id: &str,
    ) -> Result<Vec<UserVariable>, PagebotError> {
        queries::contacts::list_variables(self.db()?, page_id, user_id).await
    }

    async fn add_tag(
        &self,
        page_id: &str,
        user_id: &str,
        tag: &str,
    ) -> Result<bool, PagebotError> {
        queries::contacts::add_tag(self.db()?, page_id, user_id, tag).await
    }

    async fn list_tags(&self, page_id: &str, user_id: &str) -> Result<Vec<String>, PagebotError> {
        queries::contacts::list_tags(self.db()?, page_id, user_id).await
    }

    // --- Message log ---

    async fn append_message(&self, entry: &MessageEntry) -> Result<i64, PagebotError> {
        queries::messages::append_message(self.db()?, entry).await
    }

    async fn recent_messages(
        &self,
        page_id: &str,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<StoredMessage>, PagebotError> {
        queries::messages::recent_messages(self.db()?, page_id, user_id, limit).await
    }

    async fn list_messages(
        &self,
        page_id: &str,
        user_id: &str,
        channel: Channel,
    ) -> Result<Vec<StoredMessage>, PagebotError> {
        queries::messages::list_messages(self.db()?, page_id, user_id, channel).await
    }

    // --- Analytics ---

    async fn analytics(&self, page_id: &str, days: u32) -> Result<AnalyticsSummary, PagebotError> {
        queries::analytics::analytics(self.db()?, page_id, days).await
    }
}

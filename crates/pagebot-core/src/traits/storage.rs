// SPDX-FileCopyrightText: 2026 Pagebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter trait for persistence backends (SQLite, etc.).

use async_trait::async_trait;

use crate::error::PagebotError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{
    AnalyticsSummary, Channel, Conversation, ConversationKey, FlowRecord, KeywordRule,
    MessageEntry, Page, StoredMessage, Tenant, UserVariable,
};

/// Adapter for storage and persistence backends.
///
/// Every method is individually atomic. Nothing here spans records in a
/// transaction; callers tolerate partial failure between calls.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Initializes the storage backend (migrations, connection, etc.).
    async fn initialize(&self) -> Result<(), PagebotError>;

    /// Closes the storage backend, flushing pending writes.
    async fn close(&self) -> Result<(), PagebotError>;

    // --- Tenants ---

    async fn get_tenant(&self, id: &str) -> Result<Option<Tenant>, PagebotError>;

    async fn create_tenant(&self, tenant: &Tenant) -> Result<(), PagebotError>;

    /// Adds one to the tenant's usage counter and returns the new value.
    async fn increment_usage(&self, tenant_id: &str) -> Result<i64, PagebotError>;

    /// Administrative reset of the usage counter.
    async fn reset_usage(&self, tenant_id: &str) -> Result<(), PagebotError>;

    // --- Pages ---

    async fn get_page(&self, id: &str) -> Result<Option<Page>, PagebotError>;

    async fn get_page_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<Page>, PagebotError>;

    async fn create_page(&self, page: &Page) -> Result<(), PagebotError>;

    // --- Flows ---

    async fn get_flow(&self, id: &str) -> Result<Option<FlowRecord>, PagebotError>;

    async fn list_flows(&self, page_id: &str) -> Result<Vec<FlowRecord>, PagebotError>;

    /// The flow flagged both default and active for a page, if any.
    async fn find_default_flow(&self, page_id: &str)
    -> Result<Option<FlowRecord>, PagebotError>;

    /// Inserts or replaces a flow.
    async fn save_flow(&self, flow: &FlowRecord) -> Result<(), PagebotError>;

    /// Marks one flow active and every other flow of the page inactive.
    async fn activate_flow(&self, page_id: &str, flow_id: &str) -> Result<(), PagebotError>;

    // --- Keywords ---

    /// Keyword rules of a page in insertion order.
    async fn list_keywords(&self, page_id: &str) -> Result<Vec<KeywordRule>, PagebotError>;

    async fn add_keyword(&self, rule: &KeywordRule) -> Result<(), PagebotError>;

    async fn delete_keyword(&self, id: &str) -> Result<(), PagebotError>;

    // --- Conversations ---

    async fn get_conversation(
        &self,
        key: &ConversationKey,
    ) -> Result<Option<Conversation>, PagebotError>;

    /// Creates (or replaces) the conversation cursor for a key.
    async fn start_conversation(
        &self,
        key: &ConversationKey,
        flow_id: &str,
        state: Option<&str>,
    ) -> Result<(), PagebotError>;

    /// Moves the cursor to `new_state` only if it still reads `expected`.
    ///
    /// Returns `false` when the stored state differs or the row is gone.
    async fn update_conversation_state_if(
        &self,
        key: &ConversationKey,
        expected: Option<&str>,
        new_state: Option<&str>,
    ) -> Result<bool, PagebotError>;

    /// Deletes every conversation of a user on a page, across channels.
    async fn delete_conversations(
        &self,
        page_id: &str,
        user_id: &str,
    ) -> Result<usize, PagebotError>;

    // --- Contact data ---

    /// Upserts a variable; the last write wins.
    async fn set_variable(
        &self,
        page_id: &str,
        user_id: &str,
        key: &str,
        value: &str,
    ) -> Result<(), PagebotError>;

    async fn list_variables(
        &self,
        page_id: &str,
        user_id: &str,
    ) -> Result<Vec<UserVariable>, PagebotError>;

    /// Adds a tag if absent; returns whether it was newly added.
    async fn add_tag(&self, page_id: &str, user_id: &str, tag: &str)
    -> Result<bool, PagebotError>;

    async fn list_tags(&self, page_id: &str, user_id: &str) -> Result<Vec<String>, PagebotError>;

    // --- Message log ---

    async fn append_message(&self, entry: &MessageEntry) -> Result<i64, PagebotError>;

    /// The newest `limit` messages of a user on a page, oldest first.
    async fn recent_messages(
        &self,
        page_id: &str,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<StoredMessage>, PagebotError>;

    /// Every message of a user on one channel, oldest first.
    async fn list_messages(
        &self,
        page_id: &str,
        user_id: &str,
        channel: Channel,
    ) -> Result<Vec<StoredMessage>, PagebotError>;

    // --- Analytics ---

    /// Activity summary with per-day counts for the trailing `days` days.
    async fn analytics(&self, page_id: &str, days: u32)
    -> Result<AnalyticsSummary, PagebotError>;
}

// SPDX-FileCopyrightText: 2026 Pagebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `pagebot keywords` and `pagebot usage`.

use pagebot_core::types::{KeywordRule, MatchType};
use pagebot_core::{PagebotError, StorageAdapter};
use tracing::info;

/// One line per keyword rule of a page, in evaluation order.
pub async fn keyword_listing(
    storage: &dyn StorageAdapter,
    page_id: &str,
) -> Result<Vec<String>, PagebotError> {
    require_page(storage, page_id).await?;
    let rules = storage.list_keywords(page_id).await?;
    if rules.is_empty() {
        return Ok(vec![format!("page {page_id} has no keywords")]);
    }
    Ok(rules
        .iter()
        .map(|r| {
            format!(
                "{:<36} {:<8} {:<24} -> {}",
                r.id,
                r.match_type.to_string(),
                r.keyword,
                r.flow_id
            )
        })
        .collect())
}

/// Add a keyword rule routing into one of the page's flows.
pub async fn add_keyword(
    storage: &dyn StorageAdapter,
    page_id: &str,
    keyword: &str,
    match_type: MatchType,
    flow_id: &str,
) -> Result<KeywordRule, PagebotError> {
    require_page(storage, page_id).await?;
    pagebot_router::check_keyword(keyword, match_type).map_err(PagebotError::Config)?;

    let owned_by_page = storage
        .get_flow(flow_id)
        .await?
        .is_some_and(|f| f.page_id == page_id);
    if !owned_by_page {
        return Err(PagebotError::NotFound {
            kind: "flow",
            id: flow_id.to_string(),
        });
    }

    let rule = KeywordRule {
        id: uuid::Uuid::new_v4().to_string(),
        page_id: page_id.to_string(),
        keyword: keyword.to_string(),
        match_type,
        flow_id: flow_id.to_string(),
    };
    storage.add_keyword(&rule).await?;
    info!(
        page_id,
        rule_id = rule.id.as_str(),
        flow_id,
        match_type = %match_type,
        "keyword added"
    );
    Ok(rule)
}

/// Delete a keyword rule of a page.
pub async fn delete_keyword(
    storage: &dyn StorageAdapter,
    page_id: &str,
    rule_id: &str,
) -> Result<(), PagebotError> {
    require_page(storage, page_id).await?;
    let exists = storage
        .list_keywords(page_id)
        .await?
        .iter()
        .any(|r| r.id == rule_id);
    if !exists {
        return Err(PagebotError::NotFound {
            kind: "keyword",
            id: rule_id.to_string(),
        });
    }
    storage.delete_keyword(rule_id).await?;
    info!(page_id, rule_id, "keyword deleted");
    Ok(())
}

/// Zero a tenant's message counter.
pub async fn reset_usage(storage: &dyn StorageAdapter, tenant_id: &str) -> Result<i64, PagebotError> {
    let tenant = storage
        .get_tenant(tenant_id)
        .await?
        .ok_or_else(|| PagebotError::NotFound {
            kind: "tenant",
            id: tenant_id.to_string(),
        })?;
    storage.reset_usage(tenant_id).await?;
    info!(tenant_id, previous = tenant.message_count, "usage reset");
    Ok(tenant.message_count)
}

pub(crate) async fn require_page(
    storage: &dyn StorageAdapter,
    page_id: &str,
) -> Result<(), PagebotError> {
    match storage.get_page(page_id).await? {
        Some(_) => Ok(()),
        None => Err(PagebotError::NotFound {
            kind: "page",
            id: page_id.to_string(),
        }),
    }
}

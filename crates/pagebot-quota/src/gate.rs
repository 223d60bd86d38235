// SPDX-FileCopyrightText: 2026 Pagebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message quota enforcement.
//!
//! The gate checks a tenant's stored usage counter against the ceiling for
//! its plan before any work is done for an inbound event, and increments the
//! counter once per billable outbound message. It emits a `tracing::warn`
//! when usage crosses 80% of the ceiling and when an event is dropped.

use std::sync::Arc;

use pagebot_config::model::QuotaConfig;
use pagebot_core::types::{Plan, Tenant};
use pagebot_core::{PagebotError, StorageAdapter};
use tracing::{debug, warn};

/// Outcome of a quota check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admitted,
    /// The tenant is at or over its ceiling; the event must be dropped.
    Exhausted { used: i64, ceiling: i64 },
}

impl Admission {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Admission::Admitted)
    }
}

/// Enforces per-plan message ceilings.
pub struct QuotaGate {
    config: QuotaConfig,
    storage: Arc<dyn StorageAdapter + Send + Sync>,
}

impl QuotaGate {
    pub fn new(config: QuotaConfig, storage: Arc<dyn StorageAdapter + Send + Sync>) -> Self {
        Self { config, storage }
    }

    /// Ceiling for a plan tier; unknown tiers get the `unknown` ceiling.
    pub fn ceiling(&self, plan: Option<Plan>) -> i64 {
        match plan {
            Some(Plan::Starter) => self.config.starter,
            Some(Plan::Business) => self.config.business,
            Some(Plan::Pro) => self.config.pro,
            None => self.config.unknown,
        }
    }

    /// Check whether `tenant` may be served.
    pub fn admit(&self, tenant: &Tenant) -> Admission {
        let ceiling = self.ceiling(tenant.plan_tier());
        let used = tenant.message_count;
        if used >= ceiling {
            warn!(
                tenant_id = tenant.id.as_str(),
                plan = tenant.plan.as_str(),
                used,
                ceiling,
                "message quota exhausted, dropping event"
            );
            return Admission::Exhausted { used, ceiling };
        }
        Admission::Admitted
    }

    /// Count one billable outbound message against `tenant`.
    ///
    /// Returns the new usage count.
    pub async fn record_outbound(&self, tenant: &Tenant) -> Result<i64, PagebotError> {
        let used = self.storage.increment_usage(&tenant.id).await?;
        let ceiling = self.ceiling(tenant.plan_tier());
        if crossed_soft_limit(used, ceiling) {
            warn!(
                tenant_id = tenant.id.as_str(),
                used,
                ceiling,
                "approaching message quota (80%+)"
            );
        } else {
            debug!(tenant_id = tenant.id.as_str(), used, ceiling, "usage recorded");
        }
        Ok(used)
    }
}

/// True when `used` is the first count at or above 80% of `ceiling`.
fn crossed_soft_limit(used: i64, ceiling: i64) -> bool {
    let at_or_over = |n: i64| n * 5 >= ceiling * 4;
    ceiling > 0 && at_or_over(used) && !at_or_over(used - 1)
}

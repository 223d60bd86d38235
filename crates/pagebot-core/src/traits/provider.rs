// SPDX-FileCopyrightText: 2026 Pagebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider adapter trait for generative text services (OpenAI, Anthropic, Gemini).

use async_trait::async_trait;

use crate::error::PagebotError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ProviderRequest, ProviderResponse};

/// Adapter for a generative text provider.
///
/// The credential travels with each request so that callers can rotate
/// keys per call.
#[async_trait]
pub trait ProviderAdapter: PluginAdapter {
    /// Sends a completion request and returns the generated text.
    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, PagebotError>;
}

// SPDX-FileCopyrightText: 2026 Pagebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Channel adapter trait for outbound delivery (Messenger, webchat).

use async_trait::async_trait;

use crate::error::PagebotError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{Channel, MessageId, OutboundMessage};

/// Adapter delivering engine output to one transport.
///
/// The engine only reports the result of `send` in its logs; a failed
/// delivery never stops a flow from advancing.
#[async_trait]
pub trait ChannelAdapter: PluginAdapter {
    /// The transport this adapter delivers to.
    fn channel(&self) -> Channel;

    /// Delivers a payload to a recipient.
    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, PagebotError>;
}

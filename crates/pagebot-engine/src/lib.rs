// SPDX-FileCopyrightText: 2026 Pagebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inbound event orchestration for Pagebot.
//!
//! The [`Engine`] ties together the quota gate, keyword router, flow
//! interpreter, and AI dispatcher. Channels feed it [`InboundEvent`]s and
//! register adapters for outbound delivery.
//!
//! [`InboundEvent`]: pagebot_core::types::InboundEvent

mod effects;
pub mod engine;
pub mod locks;
pub mod outbox;

pub use engine::{DropReason, Engine, EventOutcome};
pub use locks::{ConversationGuard, ConversationLocks};
pub use outbox::{Outbox, Recipient};

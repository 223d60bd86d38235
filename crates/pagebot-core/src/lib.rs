// SPDX-FileCopyrightText: 2026 Pagebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Pagebot chat-automation engine.
//!
//! This crate provides the trait definitions, error type, and domain types
//! shared by every other crate in the workspace. Storage, channel and
//! provider implementations plug in through the traits defined here.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::PagebotError;
pub use types::{AdapterType, Channel, HealthStatus, MessageId, OutboundPayload, Role};

// Re-export all adapter traits at crate root.
pub use traits::{ChannelAdapter, PluginAdapter, ProviderAdapter, StorageAdapter};

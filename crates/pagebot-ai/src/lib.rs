// SPDX-FileCopyrightText: 2026 Pagebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! AI replies for Pagebot.
//!
//! Used both as the top-level fallback when no flow handles a message and
//! inline from `ai_response` flow nodes.

pub mod context;
pub mod dispatcher;
pub mod family;
pub mod keys;

pub use dispatcher::{AiDispatcher, AiReply, AiRequest, Providers};
pub use family::ProviderFamily;
pub use keys::KeyRotator;

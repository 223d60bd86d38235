// SPDX-FileCopyrightText: 2026 Pagebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for Pagebot.
//!
//! Serves the Messenger webhook, the webchat widget API, page analytics,
//! and a health check, all backed by a shared [`pagebot_engine::Engine`].

pub mod handlers;
pub mod server;
pub mod webchat;

pub use server::{GatewayState, router, start_server};
pub use webchat::WebchatChannel;

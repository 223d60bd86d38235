// SPDX-FileCopyrightText: 2026 Pagebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Facebook Messenger support for Pagebot.
//!
//! Decodes webhook deliveries into engine events, verifies their
//! signatures, and sends replies through the Graph API.

pub mod channel;
pub mod client;
pub mod webhook;

pub use channel::MessengerChannel;
pub use client::{GraphClient, message_body};
pub use webhook::{
    SIGNATURE_HEADER, WebhookPayload, sign, verify_signature, verify_subscription,
};

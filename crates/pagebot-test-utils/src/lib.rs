// SPDX-FileCopyrightText: 2026 Pagebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Pagebot.
//!
//! Provides mock adapters and a temp-database harness for deterministic
//! tests without network access.

pub mod harness;
pub mod mock_channel;
pub mod mock_provider;

pub use harness::TestHarness;
pub use mock_channel::MockChannel;
pub use mock_provider::{MockProvider, RecordedRequest};

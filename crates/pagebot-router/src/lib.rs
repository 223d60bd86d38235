// SPDX-FileCopyrightText: 2026 Pagebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Keyword routing for Pagebot.
//!
//! Maps inbound text to a flow via a page's ordered keyword rules. A match
//! restarts the contact's conversation in the rule's flow.

pub mod keyword;

pub use keyword::{KeywordRouter, RouteMatch, check_keyword};

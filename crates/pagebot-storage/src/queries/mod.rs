// SPDX-FileCopyrightText: 2026 Pagebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query functions, one module per record kind.

pub mod analytics;
pub mod contacts;
pub mod conversations;
pub mod flows;
pub mod keywords;
pub mod messages;
pub mod pages;
pub mod tenants;

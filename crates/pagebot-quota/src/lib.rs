// SPDX-FileCopyrightText: 2026 Pagebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-tenant message quotas for Pagebot.

pub mod gate;

pub use gate::{Admission, QuotaGate};

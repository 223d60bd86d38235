// SPDX-FileCopyrightText: 2026 Pagebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Flow graphs for Pagebot.
//!
//! A flow is a directed graph of nodes authored in the dashboard and stored
//! as JSON. This crate validates that JSON into a [`FlowGraph`], renders the
//! payloads sending nodes produce, and walks graphs with the bounded
//! [`Interpreter`].

pub mod graph;
pub mod interpreter;
pub mod render;
pub mod templates;

pub use graph::{Edge, FlowError, FlowGraph, Node, NodeKind};
pub use interpreter::{Halt, Interpreter, NodeEffects, PassOutcome};
pub use render::payload_for;
pub use templates::FlowTemplate;

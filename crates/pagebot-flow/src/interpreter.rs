// SPDX-FileCopyrightText: 2026 Pagebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded flow interpreter.
//!
//! One pass walks the graph from a starting node, executing each node it
//! moves onto, until it reaches a wait node, runs out of edges, or hits the
//! step bound. Side effects go through [`NodeEffects`]; the interpreter
//! itself touches no storage or network.

use async_trait::async_trait;
use pagebot_core::OutboundPayload;
use pagebot_core::types::AiOverrides;
use tracing::{debug, warn};

use crate::graph::{FlowGraph, NodeKind};
use crate::render::payload_for;

/// Side effects a pass may perform.
///
/// Implementations handle their own failures; a pass always runs to
/// completion.
#[async_trait]
pub trait NodeEffects: Send {
    /// Deliver a rendered payload.
    async fn send(&mut self, node_id: &str, payload: OutboundPayload);

    /// Upsert a contact variable.
    async fn set_variable(&mut self, key: &str, value: &str);

    /// Add a contact tag if absent.
    async fn add_tag(&mut self, tag: &str);

    /// Produce and deliver an AI reply, then let the pass continue.
    async fn ai_response(&mut self, node_id: &str, overrides: &AiOverrides, text: &str);
}

/// Why a pass stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Halt {
    /// Stopped on a wait node; the next message resumes there.
    Waiting,
    /// No outgoing edge from the current node.
    DeadEnd,
    /// The step bound was reached.
    StepLimit,
}

/// Result of one pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassOutcome {
    /// Node to persist as the conversation state.
    pub position: String,
    /// Number of nodes moved onto and executed.
    pub steps: usize,
    pub halt: Halt,
}

/// Walks flow graphs with a fixed step bound.
#[derive(Debug, Clone, Copy)]
pub struct Interpreter {
    max_steps: usize,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_STEPS)
    }
}

impl Interpreter {
    pub const DEFAULT_MAX_STEPS: usize = 20;

    pub fn new(max_steps: usize) -> Self {
        Self { max_steps }
    }

    pub fn max_steps(&self) -> usize {
        self.max_steps
    }

    /// Run one pass starting at `start`.
    ///
    /// The start node itself is not executed: it is either the trigger or a
    /// wait node that already ran on the previous pass.
    pub async fn run_pass(
        &self,
        graph: &FlowGraph,
        start: &str,
        text: &str,
        effects: &mut dyn NodeEffects,
    ) -> PassOutcome {
        let mut position = start.to_string();
        let mut steps = 0;

        while steps < self.max_steps {
            let Some(node) = graph.next(&position, text) else {
                debug!(flow_id = graph.id(), node_id = %position, steps, "flow reached a dead end");
                return PassOutcome {
                    position,
                    steps,
                    halt: Halt::DeadEnd,
                };
            };
            steps += 1;
            position = node.id.clone();
            debug!(flow_id = graph.id(), node_id = %node.id, kind = node.kind.type_name(), "executing node");

            match &node.kind {
                NodeKind::SetVariable { key, value } => {
                    if !key.is_empty() && !value.is_empty() {
                        effects.set_variable(key, value).await;
                    }
                }
                NodeKind::AddTag { tag } => {
                    if !tag.is_empty() {
                        effects.add_tag(tag).await;
                    }
                }
                NodeKind::AiResponse(overrides) => {
                    effects.ai_response(&node.id, overrides, text).await;
                }
                // Branching happens in the step function.
                NodeKind::Trigger | NodeKind::Condition { .. } => {}
                kind => {
                    if let Some(payload) = payload_for(kind) {
                        effects.send(&node.id, payload).await;
                    }
                }
            }

            if node.kind.is_wait() {
                return PassOutcome {
                    position,
                    steps,
                    halt: Halt::Waiting,
                };
            }
        }

        warn!(flow_id = graph.id(), node_id = %position, max_steps = self.max_steps, "flow pass hit the step limit");
        PassOutcome {
            position,
            steps,
            halt: Halt::StepLimit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[derive(Default)]
    struct Recorder {
        sent: Vec<(String, OutboundPayload)>,
        variables: Vec<(String, String)>,
        tags: Vec<String>,
        ai_calls: Vec<(String, String)>,
    }

    #[async_trait]
    impl NodeEffects for Recorder {
        async fn send(&mut self, node_id: &str, payload: OutboundPayload) {
            self.sent.push((node_id.to_string(), payload));
        }

        async fn set_variable(&mut self, key: &str, value: &str) {
            self.variables.push((key.to_string(), value.to_string()));
        }

        async fn add_tag(&mut self, tag: &str) {
            self.tags.push(tag.to_string());
        }

        async fn ai_response(&mut self, node_id: &str, _overrides: &AiOverrides, text: &str) {
            self.ai_calls.push((node_id.to_string(), text.to_string()));
        }
    }

    fn graph(nodes: serde_json::Value, edges: serde_json::Value) -> FlowGraph {
        FlowGraph::from_parts("f", &nodes, &edges).unwrap()
    }

    fn texts(rec: &Recorder) -> Vec<String> {
        rec.sent.iter().map(|(_, p)| p.transcript()).collect()
    }

    #[tokio::test]
    async fn entering_sends_until_wait_node() {
        let g = graph(
            json!([
                {"id": "t", "type": "trigger"},
                {"id": "m", "type": "message", "data": {"label": "Hi"}},
                {"id": "in", "type": "input", "data": {"label": "reply?"}},
                {"id": "after", "type": "message", "data": {"label": "never yet"}}
            ]),
            json!([
                {"source": "t", "target": "m"},
                {"source": "m", "target": "in"},
                {"source": "in", "target": "after"}
            ]),
        );
        let mut rec = Recorder::default();
        let outcome = Interpreter::default()
            .run_pass(&g, "t", "anything", &mut rec)
            .await;

        assert_eq!(texts(&rec), ["Hi", "reply?"]);
        assert_eq!(outcome.position, "in");
        assert_eq!(outcome.halt, Halt::Waiting);
        assert_eq!(outcome.steps, 2);
    }

    #[tokio::test]
    async fn resuming_at_wait_node_branches_on_new_text() {
        let g = graph(
            json!([
                {"id": "t", "type": "trigger"},
                {"id": "in", "type": "input", "data": {"label": "Type yes"}},
                {"id": "c", "type": "condition", "data": {"label": "yes"}},
                {"id": "y", "type": "message", "data": {"label": "Great"}},
                {"id": "n", "type": "message", "data": {"label": "Ok"}}
            ]),
            json!([
                {"source": "t", "target": "in"},
                {"source": "in", "target": "c"},
                {"source": "c", "target": "y", "sourceHandle": "true"},
                {"source": "c", "target": "n", "sourceHandle": "false"}
            ]),
        );
        let mut rec = Recorder::default();
        let outcome = Interpreter::default()
            .run_pass(&g, "in", "Yes please", &mut rec)
            .await;
        assert_eq!(texts(&rec), ["Great"]);
        assert_eq!(outcome.position, "y");
        assert_eq!(outcome.halt, Halt::DeadEnd);
    }

    #[tokio::test]
    async fn side_effect_nodes_do_not_send() {
        let g = graph(
            json!([
                {"id": "t", "type": "trigger"},
                {"id": "v", "type": "set_variable", "data": {"key": "plan", "value": "gold"}},
                {"id": "empty", "type": "set_variable", "data": {"key": "plan"}},
                {"id": "tag", "type": "add_tag", "data": {"tag": "lead"}},
                {"id": "ai", "type": "ai_response", "data": {"prompt": "Summarize"}},
                {"id": "m", "type": "message", "data": {"label": "done"}}
            ]),
            json!([
                {"source": "t", "target": "v"},
                {"source": "v", "target": "empty"},
                {"source": "empty", "target": "tag"},
                {"source": "tag", "target": "ai"},
                {"source": "ai", "target": "m"}
            ]),
        );
        let mut rec = Recorder::default();
        let outcome = Interpreter::default().run_pass(&g, "t", "hello", &mut rec).await;

        assert_eq!(rec.variables, [("plan".to_string(), "gold".to_string())]);
        assert_eq!(rec.tags, ["lead"]);
        assert_eq!(rec.ai_calls, [("ai".to_string(), "hello".to_string())]);
        assert_eq!(texts(&rec), ["done"]);
        assert_eq!(outcome.steps, 5);
        assert_eq!(outcome.position, "m");
    }

    #[tokio::test]
    async fn quick_replies_and_buttons_are_wait_states() {
        for kind in ["quick_replies", "buttons"] {
            let g = graph(
                json!([
                    {"id": "t", "type": "trigger"},
                    {"id": "w", "type": kind, "data": {"label": "Choose"}},
                    {"id": "m", "type": "message", "data": {"label": "after"}}
                ]),
                json!([{"source": "t", "target": "w"}, {"source": "w", "target": "m"}]),
            );
            let mut rec = Recorder::default();
            let outcome = Interpreter::default().run_pass(&g, "t", "", &mut rec).await;
            assert_eq!(outcome.position, "w", "{kind}");
            assert_eq!(outcome.halt, Halt::Waiting);
            assert_eq!(rec.sent.len(), 1);
        }
    }

    #[tokio::test]
    async fn cycle_is_cut_at_step_bound() {
        let g = graph(
            json!([
                {"id": "t", "type": "trigger"},
                {"id": "a", "type": "message", "data": {"label": "a"}},
                {"id": "b", "type": "message", "data": {"label": "b"}}
            ]),
            json!([
                {"source": "t", "target": "a"},
                {"source": "a", "target": "b"},
                {"source": "b", "target": "a"}
            ]),
        );
        let mut rec = Recorder::default();
        let outcome = Interpreter::default().run_pass(&g, "t", "", &mut rec).await;
        assert_eq!(outcome.steps, 20);
        assert_eq!(outcome.halt, Halt::StepLimit);
        assert_eq!(rec.sent.len(), 20);
    }

    #[tokio::test]
    async fn dead_end_at_start_makes_no_moves() {
        let g = graph(json!([{"id": "t", "type": "trigger"}]), json!([]));
        let mut rec = Recorder::default();
        let outcome = Interpreter::default().run_pass(&g, "t", "hi", &mut rec).await;
        assert_eq!(outcome.steps, 0);
        assert_eq!(outcome.position, "t");
        assert_eq!(outcome.halt, Halt::DeadEnd);
    }

    const KINDS: &[&str] = &[
        "message",
        "image",
        "condition",
        "set_variable",
        "add_tag",
        "ai_response",
        "input",
        "quick_replies",
        "buttons",
    ];

    fn arbitrary_flow() -> impl Strategy<Value = FlowGraph> {
        (1usize..25)
            .prop_flat_map(|n| {
                (
                    prop::collection::vec(0..KINDS.len(), n),
                    prop::collection::vec(
                        (0..=n, 0..=n, prop::option::of(prop::bool::ANY)),
                        0..(n * 3),
                    ),
                )
            })
            .prop_map(|(kinds, edges)| {
                let mut nodes = vec![json!({"id": "n0", "type": "trigger"})];
                for (i, k) in kinds.iter().enumerate() {
                    nodes.push(json!({
                        "id": format!("n{}", i + 1),
                        "type": KINDS[*k],
                        "data": {"label": "x", "key": "k", "value": "v", "tag": "t"}
                    }));
                }
                let edges: Vec<_> = edges
                    .into_iter()
                    .map(|(s, t, handle)| {
                        json!({
                            "source": format!("n{s}"),
                            "target": format!("n{t}"),
                            "sourceHandle": handle.map(|h| h.to_string()),
                        })
                    })
                    .collect();
                FlowGraph::from_parts("prop", &json!(nodes), &json!(edges)).unwrap()
            })
    }

    proptest! {
        #[test]
        fn every_pass_terminates_within_bound(g in arbitrary_flow(), text in "[a-z ]{0,8}") {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let mut rec = Recorder::default();
            let outcome = rt.block_on(Interpreter::default().run_pass(&g, "n0", &text, &mut rec));

            prop_assert!(outcome.steps <= Interpreter::DEFAULT_MAX_STEPS);
            prop_assert!(rec.sent.len() <= outcome.steps);
            prop_assert!(g.contains(&outcome.position));
            if outcome.halt == Halt::Waiting {
                prop_assert!(g.node(&outcome.position).unwrap().kind.is_wait());
            }
            if outcome.steps < Interpreter::DEFAULT_MAX_STEPS {
                prop_assert_ne!(outcome.halt, Halt::StepLimit);
            }
        }
    }
}

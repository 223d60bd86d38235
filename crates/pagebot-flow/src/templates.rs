// SPDX-FileCopyrightText: 2026 Pagebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Built-in starter flows.

use serde::Serialize;
use serde_json::{Value, json};

/// A starter flow a page owner can copy.
#[derive(Debug, Clone, Serialize)]
pub struct FlowTemplate {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub nodes: Value,
    pub edges: Value,
}

/// All built-in templates in display order.
pub fn all() -> Vec<FlowTemplate> {
    vec![blank(), welcome(), lead_gen(), support()]
}

/// Look up a template by id.
pub fn get(id: &str) -> Option<FlowTemplate> {
    all().into_iter().find(|t| t.id == id)
}

fn trigger() -> Value {
    json!({"id": "start", "type": "trigger", "data": {"label": "Start Trigger"}})
}

fn node(id: &str, kind: &str, label: &str) -> Value {
    json!({"id": id, "type": kind, "data": {"label": label}})
}

fn edge(id: &str, source: &str, target: &str) -> Value {
    json!({"id": id, "source": source, "target": target})
}

fn branch(id: &str, source: &str, handle: &str, target: &str) -> Value {
    json!({"id": id, "source": source, "sourceHandle": handle, "target": target})
}

fn blank() -> FlowTemplate {
    FlowTemplate {
        id: "blank",
        name: "Blank Flow",
        description: "Start from scratch with a single trigger.",
        nodes: json!([trigger()]),
        edges: json!([]),
    }
}

fn welcome() -> FlowTemplate {
    FlowTemplate {
        id: "welcome",
        name: "Welcome Message",
        description: "Greet new users and introduce your bot.",
        nodes: json!([
            trigger(),
            node("msg-1", "message", "Hi there! Welcome to our bot. 👋"),
            node("msg-2", "message", "How can we help you today?"),
        ]),
        edges: json!([edge("e1", "start", "msg-1"), edge("e2", "msg-1", "msg-2")]),
    }
}

fn lead_gen() -> FlowTemplate {
    FlowTemplate {
        id: "lead-gen",
        name: "Lead Generation",
        description: "Collect user email and qualify leads.",
        nodes: json!([
            trigger(),
            node("msg-1", "message", "Hi! Interested in our exclusive guide?"),
            node("input-1", "input", "Please type \"yes\" to continue."),
            node("cond-1", "condition", "yes"),
            node("msg-yes", "message", "Great! What is your email address?"),
            node("input-email", "input", "Type your email below:"),
            node("msg-thanks", "message", "Thanks! We sent it to your inbox."),
            node("msg-no", "message", "No problem! Let us know if you change your mind."),
        ]),
        edges: json!([
            edge("e1", "start", "msg-1"),
            edge("e2", "msg-1", "input-1"),
            edge("e3", "input-1", "cond-1"),
            branch("e4", "cond-1", "true", "msg-yes"),
            branch("e5", "cond-1", "false", "msg-no"),
            edge("e6", "msg-yes", "input-email"),
            edge("e7", "input-email", "msg-thanks"),
        ]),
    }
}

fn support() -> FlowTemplate {
    FlowTemplate {
        id: "support",
        name: "Customer Support",
        description: "Route support queries effectively.",
        nodes: json!([
            trigger(),
            node("msg-1", "message", "Welcome to Support! How can we help?"),
            node("input-1", "input", "Reply \"order\" for status or \"agent\" for help."),
            node("cond-order", "condition", "order"),
            node("msg-order", "message", "Please provide your Order ID."),
            node("cond-agent", "condition", "agent"),
            node("msg-agent", "message", "Connecting you to an agent..."),
        ]),
        edges: json!([
            edge("e1", "start", "msg-1"),
            edge("e2", "msg-1", "input-1"),
            edge("e3", "input-1", "cond-order"),
            branch("e4", "cond-order", "true", "msg-order"),
            branch("e5", "cond-order", "false", "cond-agent"),
            branch("e6", "cond-agent", "true", "msg-agent"),
        ]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::FlowGraph;
    use crate::interpreter::{Halt, Interpreter, NodeEffects};
    use async_trait::async_trait;
    use pagebot_core::OutboundPayload;
    use pagebot_core::types::AiOverrides;

    #[derive(Default)]
    struct Sent(Vec<String>);

    #[async_trait]
    impl NodeEffects for Sent {
        async fn send(&mut self, _node_id: &str, payload: OutboundPayload) {
            self.0.push(payload.transcript());
        }
        async fn set_variable(&mut self, _key: &str, _value: &str) {}
        async fn add_tag(&mut self, _tag: &str) {}
        async fn ai_response(&mut self, _node_id: &str, _o: &AiOverrides, _text: &str) {}
    }

    #[test]
    fn every_template_is_a_valid_flow() {
        for template in all() {
            let graph = FlowGraph::from_parts(template.id, &template.nodes, &template.edges)
                .unwrap_or_else(|e| panic!("{}: {e}", template.id));
            assert_eq!(graph.trigger().unwrap().id, "start");
        }
    }

    #[test]
    fn lookup_by_id() {
        assert_eq!(get("support").unwrap().name, "Customer Support");
        assert!(get("missing").is_none());
    }

    #[tokio::test]
    async fn lead_gen_walkthrough() {
        let t = get("lead-gen").unwrap();
        let graph = FlowGraph::from_parts(t.id, &t.nodes, &t.edges).unwrap();
        let interpreter = Interpreter::default();

        let mut sent = Sent::default();
        let first = interpreter.run_pass(&graph, "start", "hello", &mut sent).await;
        assert_eq!(first.position, "input-1");
        assert_eq!(
            sent.0,
            ["Hi! Interested in our exclusive guide?", "Please type \"yes\" to continue."]
        );

        let mut sent = Sent::default();
        let second = interpreter.run_pass(&graph, &first.position, "YES!", &mut sent).await;
        assert_eq!(second.position, "input-email");
        assert_eq!(second.halt, Halt::Waiting);

        let mut sent = Sent::default();
        let third = interpreter
            .run_pass(&graph, &second.position, "a@b.c", &mut sent)
            .await;
        assert_eq!(sent.0, ["Thanks! We sent it to your inbox."]);
        assert_eq!(third.halt, Halt::DeadEnd);
    }

    #[tokio::test]
    async fn support_routes_to_agent_through_false_branch() {
        let t = get("support").unwrap();
        let graph = FlowGraph::from_parts(t.id, &t.nodes, &t.edges).unwrap();
        let mut sent = Sent::default();
        let outcome = Interpreter::default()
            .run_pass(&graph, "input-1", "I need an agent", &mut sent)
            .await;
        assert_eq!(sent.0, ["Connecting you to an agent..."]);
        assert_eq!(outcome.position, "msg-agent");
    }
}

// SPDX-FileCopyrightText: 2026 Pagebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Validated flow graphs.
//!
//! Stored flows are JSON blobs written by the editor. [`FlowGraph`] parses
//! them once into a closed [`NodeKind`] sum type and checks structural
//! invariants, so the interpreter never meets an unknown node type or a
//! dangling edge mid-pass.

use std::collections::HashMap;

use pagebot_core::PagebotError;
use pagebot_core::types::{AiOverrides, FlowRecord};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Reasons a stored flow cannot be loaded or entered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlowError {
    #[error("malformed flow graph: {0}")]
    Malformed(String),

    #[error("duplicate node id `{0}`")]
    DuplicateNode(String),

    #[error("edge `{edge}` references unknown node `{node}`")]
    DanglingEdge { edge: String, node: String },

    #[error("flow has {0} trigger nodes, expected at most one")]
    MultipleTriggers(usize),

    #[error("node `{id}` has unknown type `{kind}`")]
    UnknownNodeType { id: String, kind: String },

    #[error("flow has no trigger node")]
    NoTrigger,
}

impl FlowError {
    /// Attach the flow id for reporting through the shared error type.
    pub fn into_pagebot(self, flow_id: &str) -> PagebotError {
        PagebotError::Flow {
            flow_id: flow_id.to_string(),
            message: self.to_string(),
        }
    }
}

/// Typed node payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Trigger,
    Message { text: String },
    Image { url: Option<String> },
    QuickReplies { text: String, replies: Vec<String> },
    Buttons { text: String, buttons: Vec<String> },
    Input { text: String },
    Condition { label: String },
    SetVariable { key: String, value: String },
    AddTag { tag: String },
    AiResponse(AiOverrides),
}

impl NodeKind {
    /// Whether the interpreter stops after executing this node.
    pub fn is_wait(&self) -> bool {
        matches!(
            self,
            Self::QuickReplies { .. } | Self::Buttons { .. } | Self::Input { .. }
        )
    }

    /// The serialized `type` tag.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Trigger => "trigger",
            Self::Message { .. } => "message",
            Self::Image { .. } => "image",
            Self::QuickReplies { .. } => "quick_replies",
            Self::Buttons { .. } => "buttons",
            Self::Input { .. } => "input",
            Self::Condition { .. } => "condition",
            Self::SetVariable { .. } => "set_variable",
            Self::AddTag { .. } => "add_tag",
            Self::AiResponse(_) => "ai_response",
        }
    }
}

/// A node with its stable id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub id: String,
    pub kind: NodeKind,
}

/// A directed transition; `source_handle` only matters out of condition nodes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Edge {
    #[serde(default)]
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default, rename = "sourceHandle")]
    pub source_handle: Option<String>,
}

#[derive(Deserialize)]
struct RawNode {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Value,
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct NodeData {
    label: Option<String>,
    url: Option<String>,
    replies: Vec<String>,
    buttons: Vec<String>,
    key: Option<String>,
    value: Option<String>,
    tag: Option<String>,
}

fn parse_node(raw: RawNode) -> Result<Node, FlowError> {
    let data_value = if raw.data.is_null() {
        Value::Object(Default::default())
    } else {
        raw.data
    };
    let malformed = |e: serde_json::Error| FlowError::Malformed(format!("node `{}`: {e}", raw.id));

    let kind = if raw.kind == "ai_response" {
        NodeKind::AiResponse(serde_json::from_value(data_value).map_err(malformed)?)
    } else {
        let data: NodeData = serde_json::from_value(data_value).map_err(malformed)?;
        let label = data.label.unwrap_or_default();
        match raw.kind.as_str() {
            "trigger" => NodeKind::Trigger,
            "message" => NodeKind::Message { text: label },
            "image" => NodeKind::Image { url: data.url },
            "quick_replies" => NodeKind::QuickReplies {
                text: label,
                replies: data.replies,
            },
            "buttons" => NodeKind::Buttons {
                text: label,
                buttons: data.buttons,
            },
            "input" => NodeKind::Input { text: label },
            "condition" => NodeKind::Condition { label },
            "set_variable" => NodeKind::SetVariable {
                key: data.key.unwrap_or_default(),
                value: data.value.unwrap_or_default(),
            },
            "add_tag" => NodeKind::AddTag {
                tag: data.tag.unwrap_or_default(),
            },
            other => {
                return Err(FlowError::UnknownNodeType {
                    id: raw.id,
                    kind: other.to_string(),
                });
            }
        }
    };
    Ok(Node { id: raw.id, kind })
}

/// A flow after validation.
#[derive(Debug, Clone)]
pub struct FlowGraph {
    id: String,
    nodes: Vec<Node>,
    index: HashMap<String, usize>,
    edges: Vec<Edge>,
    trigger: Option<usize>,
}

impl FlowGraph {
    /// Parse and validate a stored flow.
    pub fn from_record(record: &FlowRecord) -> Result<Self, FlowError> {
        Self::from_parts(&record.id, &record.nodes, &record.edges)
    }

    /// Parse and validate node and edge JSON arrays.
    ///
    /// Node ids must be unique, every edge endpoint must exist, and at most
    /// one trigger may be present. A graph without a trigger loads but
    /// cannot be entered.
    pub fn from_parts(id: &str, nodes: &Value, edges: &Value) -> Result<Self, FlowError> {
        let raw_nodes: Vec<RawNode> = serde_json::from_value(nodes.clone())
            .map_err(|e| FlowError::Malformed(format!("nodes: {e}")))?;
        let edges: Vec<Edge> = serde_json::from_value(edges.clone())
            .map_err(|e| FlowError::Malformed(format!("edges: {e}")))?;

        let nodes = raw_nodes
            .into_iter()
            .map(parse_node)
            .collect::<Result<Vec<_>, _>>()?;

        let mut index = HashMap::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            if index.insert(node.id.clone(), i).is_some() {
                return Err(FlowError::DuplicateNode(node.id.clone()));
            }
        }

        for edge in &edges {
            for endpoint in [&edge.source, &edge.target] {
                if !index.contains_key(endpoint) {
                    return Err(FlowError::DanglingEdge {
                        edge: edge.id.clone(),
                        node: endpoint.clone(),
                    });
                }
            }
        }

        let triggers: Vec<usize> = nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.kind == NodeKind::Trigger)
            .map(|(i, _)| i)
            .collect();
        if triggers.len() > 1 {
            return Err(FlowError::MultipleTriggers(triggers.len()));
        }

        Ok(Self {
            id: id.to_string(),
            nodes,
            index,
            edges,
            trigger: triggers.first().copied(),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// The entry node.
    pub fn trigger(&self) -> Result<&Node, FlowError> {
        self.trigger
            .map(|i| &self.nodes[i])
            .ok_or(FlowError::NoTrigger)
    }

    /// Step function: the node reached from `current` given the inbound text.
    ///
    /// Condition nodes follow the `"true"` edge when their label occurs in
    /// the text (case-insensitive), otherwise the `"false"` edge. Every other
    /// node follows its first outgoing edge. `None` ends the flow.
    pub fn next(&self, current: &str, text: &str) -> Option<&Node> {
        let node = self.node(current)?;
        let edge = match &node.kind {
            NodeKind::Condition { label } => {
                let handle = if text.to_lowercase().contains(&label.to_lowercase()) {
                    "true"
                } else {
                    "false"
                };
                self.edges
                    .iter()
                    .find(|e| e.source == current && e.source_handle.as_deref() == Some(handle))
            }
            _ => self.edges.iter().find(|e| e.source == current),
        }?;
        self.node(&edge.target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn branching() -> FlowGraph {
        FlowGraph::from_parts(
            "f",
            &json!([
                {"id": "t", "type": "trigger", "position": {"x": 0, "y": 0}, "data": {"label": "Start"}},
                {"id": "c", "type": "condition", "data": {"label": "yes"}},
                {"id": "y", "type": "message", "data": {"label": "Great"}},
                {"id": "n", "type": "message", "data": {"label": "Too bad"}}
            ]),
            &json!([
                {"id": "e1", "source": "t", "target": "c"},
                {"id": "e2", "source": "c", "target": "y", "sourceHandle": "true"},
                {"id": "e3", "source": "c", "target": "n", "sourceHandle": "false"}
            ]),
        )
        .unwrap()
    }

    #[test]
    fn condition_matches_case_insensitive_substring() {
        let graph = branching();
        assert_eq!(graph.next("c", "Yes please").unwrap().id, "y");
        assert_eq!(graph.next("c", "OH YES").unwrap().id, "y");
        assert_eq!(graph.next("c", "nope").unwrap().id, "n");
    }

    #[test]
    fn missing_branch_edge_ends_flow() {
        let graph = FlowGraph::from_parts(
            "f",
            &json!([
                {"id": "c", "type": "condition", "data": {"label": "yes"}},
                {"id": "y", "type": "message", "data": {"label": "ok"}}
            ]),
            &json!([{"id": "e", "source": "c", "target": "y", "sourceHandle": "true"}]),
        )
        .unwrap();
        assert!(graph.next("c", "no thanks").is_none());
        assert_eq!(graph.next("c", "yes").unwrap().id, "y");
    }

    #[test]
    fn plain_nodes_follow_first_edge() {
        let graph = branching();
        assert_eq!(graph.next("t", "anything").unwrap().id, "c");
        assert!(graph.next("y", "anything").is_none());
        assert!(graph.next("ghost", "anything").is_none());
    }

    #[test]
    fn rejects_duplicate_ids() {
        let err = FlowGraph::from_parts(
            "f",
            &json!([{"id": "a", "type": "trigger"}, {"id": "a", "type": "message"}]),
            &json!([]),
        )
        .unwrap_err();
        assert_eq!(err, FlowError::DuplicateNode("a".into()));
    }

    #[test]
    fn rejects_dangling_edges() {
        let err = FlowGraph::from_parts(
            "f",
            &json!([{"id": "a", "type": "trigger"}]),
            &json!([{"id": "e1", "source": "a", "target": "b"}]),
        )
        .unwrap_err();
        assert!(matches!(err, FlowError::DanglingEdge { node, .. } if node == "b"));
    }

    #[test]
    fn rejects_unknown_types_and_second_trigger() {
        let err = FlowGraph::from_parts(
            "f",
            &json!([{"id": "a", "type": "teleport"}]),
            &json!([]),
        )
        .unwrap_err();
        assert!(matches!(err, FlowError::UnknownNodeType { .. }));

        let err = FlowGraph::from_parts(
            "f",
            &json!([{"id": "a", "type": "trigger"}, {"id": "b", "type": "trigger"}]),
            &json!([]),
        )
        .unwrap_err();
        assert_eq!(err, FlowError::MultipleTriggers(2));
    }

    #[test]
    fn non_array_graph_is_malformed() {
        let err = FlowGraph::from_parts("f", &Value::Null, &json!([])).unwrap_err();
        assert!(matches!(err, FlowError::Malformed(_)));
    }

    #[test]
    fn graph_without_trigger_loads_but_cannot_be_entered() {
        let graph = FlowGraph::from_parts(
            "f",
            &json!([{"id": "m", "type": "message", "data": {"label": "hi"}}]),
            &json!([]),
        )
        .unwrap();
        assert_eq!(graph.trigger().unwrap_err(), FlowError::NoTrigger);
        assert_eq!(
            FlowError::NoTrigger.into_pagebot("f").to_string(),
            "flow f: flow has no trigger node"
        );
    }

    #[test]
    fn ai_response_node_reads_overrides() {
        let graph = FlowGraph::from_parts(
            "f",
            &json!([{"id": "ai", "type": "ai_response", "data": {
                "label": "AI", "model": "claude-3-haiku", "fallbackMessage": "Oops"
            }}]),
            &json!([]),
        )
        .unwrap();
        match &graph.node("ai").unwrap().kind {
            NodeKind::AiResponse(o) => {
                assert_eq!(o.model.as_deref(), Some("claude-3-haiku"));
                assert_eq!(o.fallback_message.as_deref(), Some("Oops"));
            }
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn null_source_handle_is_accepted() {
        let graph = FlowGraph::from_parts(
            "f",
            &json!([{"id": "a", "type": "trigger"}, {"id": "b", "type": "input"}]),
            &json!([{"id": "e", "source": "a", "target": "b", "sourceHandle": null}]),
        )
        .unwrap();
        assert!(graph.node("b").unwrap().kind.is_wait());
        assert_eq!(graph.next("a", "").unwrap().id, "b");
    }
}

// SPDX-FileCopyrightText: 2026 Pagebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Payload rendering for sending nodes.

use pagebot_core::OutboundPayload;

use crate::graph::NodeKind;

/// Image shown when an image node has no URL.
pub const DEFAULT_IMAGE_URL: &str = "https://picsum.photos/400/300";

/// Channels render at most this many buttons in one template.
pub const MAX_BUTTONS: usize = 3;

/// The payload a node sends, or `None` for nodes that send nothing.
///
/// Empty reply or button lists fall back to the defaults.
pub fn payload_for(kind: &NodeKind) -> Option<OutboundPayload> {
    match kind {
        NodeKind::Message { text } | NodeKind::Input { text } => {
            Some(OutboundPayload::Text { text: text.clone() })
        }
        NodeKind::Image { url } => Some(OutboundPayload::Image {
            url: url
                .as_deref()
                .filter(|u| !u.trim().is_empty())
                .unwrap_or(DEFAULT_IMAGE_URL)
                .to_string(),
        }),
        NodeKind::QuickReplies { text, replies } => Some(OutboundPayload::QuickReplies {
            text: text.clone(),
            replies: if replies.is_empty() {
                vec!["Yes".to_string(), "No".to_string()]
            } else {
                replies.clone()
            },
        }),
        NodeKind::Buttons { text, buttons } => Some(OutboundPayload::Buttons {
            text: text.clone(),
            buttons: if buttons.is_empty() {
                vec!["Click Here".to_string()]
            } else {
                buttons.iter().take(MAX_BUTTONS).cloned().collect()
            },
        }),
        NodeKind::Trigger
        | NodeKind::Condition { .. }
        | NodeKind::SetVariable { .. }
        | NodeKind::AddTag { .. }
        | NodeKind::AiResponse(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_without_url_uses_placeholder() {
        let payload = payload_for(&NodeKind::Image { url: None }).unwrap();
        assert_eq!(
            payload,
            OutboundPayload::Image {
                url: DEFAULT_IMAGE_URL.into()
            }
        );
    }

    #[test]
    fn quick_replies_default_to_yes_no() {
        let payload = payload_for(&NodeKind::QuickReplies {
            text: "Continue?".into(),
            replies: vec![],
        })
        .unwrap();
        match payload {
            OutboundPayload::QuickReplies { replies, .. } => assert_eq!(replies, ["Yes", "No"]),
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[test]
    fn buttons_are_truncated_to_three() {
        let payload = payload_for(&NodeKind::Buttons {
            text: "Pick".into(),
            buttons: vec!["a".into(), "b".into(), "c".into(), "d".into()],
        })
        .unwrap();
        match payload {
            OutboundPayload::Buttons { buttons, .. } => assert_eq!(buttons, ["a", "b", "c"]),
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[test]
    fn default_button_is_click_here() {
        let payload = payload_for(&NodeKind::Buttons {
            text: "Pick".into(),
            buttons: vec![],
        })
        .unwrap();
        assert_eq!(payload.transcript(), "Pick [Buttons: Click Here]");
    }

    #[test]
    fn side_effect_nodes_send_nothing() {
        assert!(payload_for(&NodeKind::Trigger).is_none());
        assert!(
            payload_for(&NodeKind::SetVariable {
                key: "k".into(),
                value: "v".into()
            })
            .is_none()
        );
        assert!(payload_for(&NodeKind::Condition { label: "x".into() }).is_none());
    }
}

// SPDX-FileCopyrightText: 2026 Pagebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prompt context assembly.

use pagebot_core::types::{ChatTurn, Role, StoredMessage, UserVariable};

/// System instruction: the base prompt followed by the contact's variables,
/// tags, and an optional knowledge base.
pub fn system_instruction(
    base: &str,
    variables: &[UserVariable],
    tags: &[String],
    knowledge_base: Option<&str>,
) -> String {
    let mut context = String::new();
    if !variables.is_empty() {
        context.push_str("\nUser Variables:\n");
        for var in variables {
            context.push_str(&format!("{}: {}\n", var.key, var.value));
        }
    }
    if !tags.is_empty() {
        context.push_str(&format!("\nUser Tags: {}", tags.join(", ")));
    }
    if let Some(kb) = knowledge_base.filter(|kb| !kb.trim().is_empty()) {
        context.push_str(&format!("\nKnowledge Base:\n{kb}"));
    }

    if context.is_empty() {
        base.to_string()
    } else {
        format!("{base}\n{context}")
    }
}

/// Chat turns from the logged history plus the current user turn.
///
/// The inbound message is logged before dispatch. When it is still the last
/// turn it is not repeated; otherwise the user turn is appended so the
/// conversation always ends on the user.
pub fn conversation_turns(history: &[StoredMessage], user_turn: &str) -> Vec<ChatTurn> {
    let mut turns: Vec<ChatTurn> = history
        .iter()
        .map(|m| ChatTurn {
            role: m.role,
            content: m.content.clone(),
        })
        .collect();

    let already_logged = turns
        .last()
        .is_some_and(|t| t.role == Role::User && t.content == user_turn);
    if !already_logged && !user_turn.is_empty() {
        turns.push(ChatTurn {
            role: Role::User,
            content: user_turn.to_string(),
        });
    }
    turns
}

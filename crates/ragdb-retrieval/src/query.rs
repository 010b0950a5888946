//! Query extraction from conversation history.

use ragdb_core::types::{Message, Role};

/// Join the text of the last `max_turns` human turns, in chronological
/// order. Assistant and system turns never contribute; the search
/// intent stays with what the user actually asked. `max_turns == 0` or
/// beyond the number of available human turns means all of them.
/// Whitespace-only turns are dropped before the window is applied, so a
/// blank trailing turn falls back to the previous non-blank one.
pub fn extract_query(history: &[Message], max_turns: usize) -> String {
    let human: Vec<&str> = history
        .iter()
        .filter(|m| m.role == Role::Human)
        .map(|m| m.content.trim())
        .filter(|content| !content.is_empty())
        .collect();
    if human.is_empty() {
        return String::new();
    }
    let take = if max_turns == 0 || max_turns > human.len() {
        human.len()
    } else {
        max_turns
    };
    human[human.len() - take..].join("\n")
}

/// The most recent human turn, the default query for all strategies.
pub fn latest_query(history: &[Message]) -> String {
    extract_query(history, 1)
}

/// Render recent human and assistant turns as role-labeled lines for
/// use as expansion context. The final `exclude_last_n` turns are
/// dropped first so the just-extracted query is not duplicated; of the
/// rest, the last `max_messages` rendered turns are kept
/// (`max_messages == 0` keeps all).
pub fn format_context(history: &[Message], max_messages: usize, exclude_last_n: usize) -> String {
    let end = history.len().saturating_sub(exclude_last_n);
    let mut lines: Vec<String> = history[..end]
        .iter()
        .filter(|m| m.role != Role::System)
        .filter(|m| !m.content.trim().is_empty())
        .map(|m| {
            let label = match m.role {
                Role::Human => "Human",
                Role::Assistant => "Assistant",
                Role::System => unreachable!(),
            };
            format!("{label}: {}", m.content.trim())
        })
        .collect();
    if max_messages > 0 && lines.len() > max_messages {
        lines.drain(..lines.len() - max_messages);
    }
    lines.join("\n")
}

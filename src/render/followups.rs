//! Follow-up suggestions to actionable items
//!
//! Each suggested question becomes one actionable item. Selecting an item
//! must behave exactly like the user typing that text and submitting it;
//! the chat loop feeds the selected text back into
//! `SessionController::ask` verbatim.

/// The follow-up actions block attached after answer content
#[derive(Debug, Clone, PartialEq)]
pub struct FollowUpsBlock {
    /// One item per suggested question, in service order
    pub items: Vec<String>,
}

/// Build the follow-ups block, or `None` when there are no suggestions
pub fn format_follow_ups(follow_ups: &[String]) -> Option<FollowUpsBlock> {
    if follow_ups.is_empty() {
        return None;
    }

    Some(FollowUpsBlock {
        items: follow_ups.to_vec(),
    })
}

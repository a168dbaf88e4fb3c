//! Folding of normalized stream items into the visible transcript.

use crate::types::{DisplayMessage, NormalizedItem};

/// Fold `incoming` into `current` and return the next transcript.
///
/// Every item becomes an assistant entry with a fresh id, except a text item
/// that follows an assistant text entry: that one is concatenated onto the
/// previous entry, which keeps its id. Items are folded in order against the
/// growing result, so a button between two texts prevents the merge.
/// `current` is never modified.
pub fn reduce(current: &[DisplayMessage], incoming: Vec<NormalizedItem>) -> Vec<DisplayMessage> {
    let mut next = Vec::with_capacity(current.len() + incoming.len());
    next.extend_from_slice(current);
    for item in incoming {
        fold_item(&mut next, item);
    }
    next
}

fn fold_item(transcript: &mut Vec<DisplayMessage>, item: NormalizedItem) {
    if let NormalizedItem::Text { content: delta } = &item {
        if let Some(last) = transcript.last_mut() {
            if last.is_assistant_text() {
                if let NormalizedItem::Text { content } = &mut last.kind {
                    content.push_str(delta);
                    return;
                }
            }
        }
    }
    transcript.push(DisplayMessage::assistant(item));
}

/// Append a locally echoed user message. Never merges.
pub fn push_user(current: &[DisplayMessage], text: impl Into<String>) -> Vec<DisplayMessage> {
    let mut next = current.to_vec();
    next.push(DisplayMessage::user(text));
    next
}

/// Append a standalone assistant notice (e.g. a connectivity warning). Never merges.
pub fn push_notice(current: &[DisplayMessage], text: impl Into<String>) -> Vec<DisplayMessage> {
    let mut next = current.to_vec();
    next.push(DisplayMessage::assistant(NormalizedItem::text(text)));
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;

    fn button(label: &str) -> NormalizedItem {
        NormalizedItem::Button {
            label: label.into(),
            action: "#".into(),
            style_class: None,
        }
    }

    #[test]
    fn consecutive_text_merges_into_one_entry() {
        let out = reduce(
            &[],
            vec![NormalizedItem::text("Hel"), NormalizedItem::text("lo")],
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].text_content(), Some("Hello"));
        assert_eq!(out[0].role, Role::Assistant);
    }

    #[test]
    fn button_blocks_merging() {
        let out = reduce(
            &[],
            vec![
                NormalizedItem::text("Hel"),
                button("Go"),
                NormalizedItem::text("lo"),
            ],
        );
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].text_content(), Some("Hel"));
        assert_eq!(out[1].kind.kind_name(), "button");
        assert_eq!(out[2].text_content(), Some("lo"));
    }

    #[test]
    fn merge_spans_calls_and_keeps_id() {
        let first = reduce(&[], vec![NormalizedItem::text("Buon")]);
        let second = reduce(&first, vec![NormalizedItem::text("giorno")]);
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].id, first[0].id);
        assert_eq!(second[0].text_content(), Some("Buongiorno"));
        // the previous transcript is untouched
        assert_eq!(first[0].text_content(), Some("Buon"));
    }

    #[test]
    fn text_after_user_message_is_appended() {
        let start = push_user(&[], "ciao");
        let out = reduce(&start, vec![NormalizedItem::text("Ciao!")]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].role, Role::User);
        assert_eq!(out[1].role, Role::Assistant);
    }

    #[test]
    fn buttons_never_merge_with_each_other() {
        let out = reduce(&[], vec![button("a"), button("b")]);
        assert_eq!(out.len(), 2);
        assert_ne!(out[0].id, out[1].id);
    }

    #[test]
    fn empty_incoming_returns_equal_transcript() {
        let start = push_user(&[], "x");
        assert_eq!(reduce(&start, Vec::new()), start);
    }

    #[test]
    fn user_echo_and_notice_never_merge() {
        let start = reduce(&[], vec![NormalizedItem::text("partial")]);
        let with_notice = push_notice(&start, "offline");
        assert_eq!(with_notice.len(), 2);
        let with_user = push_user(&with_notice, "retry");
        assert_eq!(with_user.len(), 3);
        assert_eq!(with_user[2].role, Role::User);
    }
}

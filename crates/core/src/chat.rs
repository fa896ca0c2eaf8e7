use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::ids::ChatId;
use crate::message::Message;

pub const DEFAULT_CHAT_TITLE: &str = "New Chat";
const TITLE_WORD_LIMIT: usize = 6;
const TITLE_ELLIPSIS: &str = "...";

/// Where the current title of a chat came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleOrigin {
    Placeholder,
    Derived,
    Renamed,
}

/// One conversation thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chat {
    pub id: ChatId,
    pub title: String,
    pub title_origin: TitleOrigin,
    pub timestamp: DateTime<Utc>,
    /// Shared with published snapshots; copied only when appended to while shared.
    pub messages: Arc<Vec<Message>>,
}

impl Chat {
    pub fn new(id: ChatId) -> Self {
        Self {
            id,
            title: DEFAULT_CHAT_TITLE.to_string(),
            title_origin: TitleOrigin::Placeholder,
            timestamp: Utc::now(),
            messages: Arc::default(),
        }
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    pub fn has_placeholder_title(&self) -> bool {
        self.title_origin == TitleOrigin::Placeholder
    }

    /// Appends `message`, deriving the title from it when it is the first one.
    pub(crate) fn push_message(&mut self, message: Message) {
        Arc::make_mut(&mut self.messages).push(message);

        if self.messages.len() == 1 && self.has_placeholder_title() {
            self.title = derive_title(&self.messages[0].content);
            self.title_origin = TitleOrigin::Derived;
        }
    }

    pub(crate) fn rename(&mut self, title: String) {
        self.title = title;
        self.title_origin = TitleOrigin::Renamed;
    }
}

/// First six words of `first_message`, with an ellipsis when more words follow.
pub fn derive_title(first_message: &str) -> String {
    let words = first_message.split_whitespace().collect::<Vec<_>>();
    if words.is_empty() {
        return DEFAULT_CHAT_TITLE.to_string();
    }

    let mut title = words
        .iter()
        .take(TITLE_WORD_LIMIT)
        .copied()
        .collect::<Vec<_>>()
        .join(" ");

    if words.len() > TITLE_WORD_LIMIT {
        title.push_str(TITLE_ELLIPSIS);
    }

    title
}

/// Sidebar age label: whole elapsed days, not calendar days.
pub fn relative_day_label(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let days = (now - then).num_days().max(0);

    match days {
        0 => "Today".to_string(),
        1 => "Yesterday".to_string(),
        2..=6 => format!("{days} days ago"),
        _ => then.format("%Y-%m-%d").to_string(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    #[test]
    fn title_keeps_first_six_words_and_marks_truncation() {
        assert_eq!(
            derive_title("Tell me a joke about cats today please"),
            "Tell me a joke about cats..."
        );
        assert_eq!(
            derive_title("What is the capital of France"),
            "What is the capital of France"
        );
        assert_eq!(derive_title("  spaced   out\nwords "), "spaced out words");
        assert_eq!(derive_title("   "), DEFAULT_CHAT_TITLE);
    }

    #[test]
    fn only_the_first_message_names_the_chat() {
        let mut chat = Chat::new(ChatId::new_v7());
        chat.push_message(Message::user("first question here"));
        chat.push_message(Message::assistant("a long answer that should not matter"));

        assert_eq!(chat.title, "first question here");
        assert_eq!(chat.title_origin, TitleOrigin::Derived);
        assert_eq!(chat.message_count(), chat.messages.len());
    }

    #[test]
    fn renamed_chat_is_never_auto_titled() {
        let mut chat = Chat::new(ChatId::new_v7());
        chat.rename("Draft".to_string());
        chat.push_message(Message::user("What is the capital of France and why?"));

        assert_eq!(chat.title, "Draft");
        assert_eq!(chat.title_origin, TitleOrigin::Renamed);
    }

    #[test]
    fn day_labels_follow_elapsed_days() {
        let now = Utc.with_ymd_and_hms(2024, 5, 20, 12, 0, 0).unwrap();

        assert_eq!(relative_day_label(now - Duration::hours(3), now), "Today");
        assert_eq!(relative_day_label(now - Duration::hours(30), now), "Yesterday");
        assert_eq!(relative_day_label(now - Duration::days(4), now), "4 days ago");
        assert_eq!(relative_day_label(now - Duration::days(9), now), "2024-05-11");
        assert_eq!(relative_day_label(now + Duration::hours(1), now), "Today");
    }
}

use ingpt_core::{ChatId, MessageId, Notice};

/// Emitted when a sidebar row is clicked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChatSelected {
    pub chat_id: ChatId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewChatClicked;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeleteChatClicked {
    pub chat_id: ChatId,
}

/// Emitted when an inline rename is confirmed. `title` is untrimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameChatSubmitted {
    pub chat_id: ChatId,
    pub title: String,
}

/// Emitted when the user submits a prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submit {
    pub content: String,
}

/// Emitted when the user asks to halt the in-flight reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stop;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CopyMessageClicked {
    pub message_id: MessageId,
}

/// Emitted when a suggested question card is clicked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionPicked {
    pub text: String,
}

/// Forwarded to the shell so it can raise a toast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoticeRaised {
    pub notice: Notice,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowTitleChanged {
    pub title: String,
}

impl Submit {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

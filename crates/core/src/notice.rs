/// How a notice is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoticeLevel {
    Success,
    /// Error that goes away on its own.
    Transient,
    /// Error that stays until dismissed.
    Blocking,
}

/// User-visible toast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Transient,
            message: message.into(),
        }
    }

    pub fn blocking(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Blocking,
            message: message.into(),
        }
    }
}

pub const CHAT_DELETED: &str = "Chat deleted";
pub const CHAT_RENAMED: &str = "Chat renamed";
pub const MESSAGE_COPIED: &str = "Message copied to clipboard";
pub const REQUEST_FAILED: &str = "Failed to generate response. Please try again.";

use std::fmt;

use uuid::Uuid;

// Every opaque id shares one shape so chats and messages can never be mixed up.
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new(raw: Uuid) -> Self {
                Self(raw)
            }

            pub fn new_v7() -> Self {
                Self(Uuid::now_v7())
            }

            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(formatter, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(value: Uuid) -> Self {
                Self::new(value)
            }
        }
    };
}

define_id!(
    /// Stable identifier for one chat thread.
    ChatId
);
define_id!(
    /// Stable identifier for one message.
    MessageId
);

/// Identifier for one accepted `send`. Never reused within a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GenerationSessionId(pub u64);

impl GenerationSessionId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

/// Routing key for provider responses and playback ticks.
///
/// Events whose target differs from the controller's active target are stale
/// and must be dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GenerationTarget {
    pub chat_id: ChatId,
    pub session_id: GenerationSessionId,
}

impl GenerationTarget {
    pub const fn new(chat_id: ChatId, session_id: GenerationSessionId) -> Self {
        Self {
            chat_id,
            session_id,
        }
    }
}

//! Chat state for InGPT: the in-memory store, the generation lifecycle,
//! typing playback, scroll following and the runtime that ties them together.

pub mod chat;
pub mod clipboard;
pub mod error;
pub mod generation;
pub mod ids;
pub mod message;
pub mod notice;
pub mod playback;
pub mod runtime;
pub mod scroll;
pub mod session;
pub mod settings;
pub mod store;

pub use chat::{Chat, DEFAULT_CHAT_TITLE, TitleOrigin, derive_title, relative_day_label};
pub use clipboard::{
    ClipboardBackend, ClipboardError, ClipboardResult, SystemClipboard, copy_with_fallback,
};
pub use error::GenerationError;
pub use generation::{
    GenerationController, GenerationRejection, GenerationState, StoppedGeneration,
};
pub use ids::{ChatId, GenerationSessionId, GenerationTarget, MessageId};
pub use message::{Message, Role};
pub use notice::{Notice, NoticeLevel};
pub use playback::{DEFAULT_TYPING_INTERVAL, TypingPlayback};
pub use runtime::{ChangeReason, ChatCommand, ChatHandle, ChatRuntime, ChatUpdate};
pub use scroll::{ScrollCoordinator, ScrollDirective, ScrollOrigin, ViewportMetrics};
pub use session::{
    APP_WINDOW_TITLE, ChatSession, ChatSummary, GenerationView, ProviderStatus,
    SUGGESTED_QUESTIONS, SessionSnapshot,
};
pub use settings::{AppSettings, SettingsError, SettingsStore, ThemePreference};
pub use store::SessionStore;

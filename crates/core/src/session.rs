use std::sync::Arc;

use chrono::{DateTime, Utc};
use ingpt_llm::ProviderResult;
use tokio_util::sync::CancellationToken;

use crate::chat::{Chat, DEFAULT_CHAT_TITLE};
use crate::error::{GenerationError, provider_display_name};
use crate::generation::{GenerationController, GenerationState, StoppedGeneration};
use crate::ids::{ChatId, GenerationTarget, MessageId};
use crate::message::Message;
use crate::notice::{CHAT_DELETED, CHAT_RENAMED, MESSAGE_COPIED, Notice};
use crate::store::SessionStore;

pub const APP_WINDOW_TITLE: &str = "InGPT - AI Assistant";
const WINDOW_TITLE_SUFFIX: &str = " - InGPT";

/// Prompts offered on an empty conversation.
pub const SUGGESTED_QUESTIONS: [&str; 6] = [
    "What is artificial intelligence?",
    "How does machine learning work?",
    "Write a Python function to sort a list",
    "Explain quantum computing in simple terms",
    "What are the benefits of renewable energy?",
    "How to create a responsive website?",
];

/// Whether a credential is available for the configured provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderStatus {
    pub provider_name: String,
    pub configured: bool,
}

impl ProviderStatus {
    pub fn configured(provider_id: &str) -> Self {
        Self {
            provider_name: provider_display_name(provider_id),
            configured: true,
        }
    }

    pub fn missing_credential(provider_id: &str) -> Self {
        Self {
            provider_name: provider_display_name(provider_id),
            configured: false,
        }
    }
}

/// Outbound call the runtime must issue for an accepted send.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub target: GenerationTarget,
    pub prompt: String,
    pub cancel: CancellationToken,
}

/// Playback the runtime must start for a received response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackRequest {
    pub target: GenerationTarget,
    pub full_text: String,
}

#[derive(Debug, Clone)]
pub enum SendOutcome {
    Ignored,
    ConfigurationError,
    Dispatched(GenerationRequest),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseOutcome {
    /// Stale or cancelled; nothing changed.
    Ignored,
    Play(PlaybackRequest),
    /// Empty response; back to idle with nothing committed.
    Finished,
    Failed,
}

/// Sidebar row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatSummary {
    pub id: ChatId,
    pub title: String,
    pub timestamp: DateTime<Utc>,
    pub message_count: usize,
}

impl From<&Chat> for ChatSummary {
    fn from(chat: &Chat) -> Self {
        Self {
            id: chat.id,
            title: chat.title.clone(),
            timestamp: chat.timestamp,
            message_count: chat.message_count(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum GenerationView {
    #[default]
    Idle,
    Waiting {
        chat_id: ChatId,
    },
    Playing {
        chat_id: ChatId,
        partial: String,
    },
}

impl GenerationView {
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Idle)
    }

    pub fn chat_id(&self) -> Option<ChatId> {
        match self {
            Self::Idle => None,
            Self::Waiting { chat_id } | Self::Playing { chat_id, .. } => Some(*chat_id),
        }
    }
}

/// Read-only copy of everything the shell renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub chats: Vec<ChatSummary>,
    pub active_chat_id: Option<ChatId>,
    pub messages: Arc<Vec<Message>>,
    pub generation: GenerationView,
    pub sidebar_open: bool,
    pub window_title: String,
    pub provider: ProviderStatus,
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        ChatSession::new(ProviderStatus::missing_credential("")).snapshot()
    }
}

/// Process-wide chat state. Every mutation goes through here.
#[derive(Debug)]
pub struct ChatSession {
    store: SessionStore,
    generation: GenerationController,
    sidebar_open: bool,
    provider: ProviderStatus,
    notices: Vec<Notice>,
}

impl ChatSession {
    pub fn new(provider: ProviderStatus) -> Self {
        Self {
            store: SessionStore::new(),
            generation: GenerationController::new(),
            sidebar_open: true,
            provider,
            notices: Vec::new(),
        }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn generation_state(&self) -> &GenerationState {
        self.generation.state()
    }

    pub fn is_generating(&self) -> bool {
        !self.generation.is_idle()
    }

    pub fn provider_status(&self) -> &ProviderStatus {
        &self.provider
    }

    pub fn set_provider_status(&mut self, status: ProviderStatus) {
        self.provider = status;
    }

    /// Emptiness is checked before the credential.
    pub fn send(&mut self, text: &str) -> SendOutcome {
        if text.trim().is_empty() || self.is_generating() {
            return SendOutcome::Ignored;
        }

        if !self.provider.configured {
            let error = GenerationError::Configuration {
                stage: "send",
                provider_name: self.provider.provider_name.clone(),
            };
            tracing::warn!(%error, "send rejected");
            self.notices.extend(error.notice());
            return SendOutcome::ConfigurationError;
        }

        let chat_id = match self.store.active_chat_id() {
            Some(chat_id) => chat_id,
            None => {
                let chat_id = self.store.create_chat();
                self.store.set_active(Some(chat_id));
                chat_id
            }
        };

        let (target, cancel) = match self.generation.begin(chat_id) {
            Ok(started) => started,
            Err(rejection) => {
                tracing::warn!(?rejection, "generation could not start");
                return SendOutcome::Ignored;
            }
        };

        self.store.append_message(chat_id, Message::user(text));
        tracing::info!(%chat_id, session_id = target.session_id.0, "generation started");

        SendOutcome::Dispatched(GenerationRequest {
            target,
            prompt: text.to_string(),
            cancel,
        })
    }

    pub fn on_response(
        &mut self,
        target: GenerationTarget,
        result: ProviderResult<String>,
    ) -> ResponseOutcome {
        if !self.generation.accepts(target) {
            tracing::debug!(session_id = target.session_id.0, "late response dropped");
            return ResponseOutcome::Ignored;
        }

        match result {
            Ok(full_text) if full_text.is_empty() => {
                let _ = self.generation.response_arrived(target, full_text);
                let _ = self.generation.complete(target);
                tracing::info!(session_id = target.session_id.0, "empty response, nothing committed");
                ResponseOutcome::Finished
            }
            Ok(full_text) => match self.generation.response_arrived(target, full_text.clone()) {
                Ok(()) => ResponseOutcome::Play(PlaybackRequest { target, full_text }),
                Err(rejection) => {
                    tracing::warn!(?rejection, "response arrived outside waiting state");
                    ResponseOutcome::Ignored
                }
            },
            Err(error) => {
                let error = GenerationError::from_provider("await-response", error);
                let _ = self.generation.fail(target);
                match error.notice() {
                    Some(notice) => {
                        tracing::error!(%error, "generation failed");
                        self.notices.push(notice);
                        ResponseOutcome::Failed
                    }
                    None => ResponseOutcome::Ignored,
                }
            }
        }
    }

    pub fn on_playback_partial(&mut self, target: GenerationTarget, prefix: &str) -> bool {
        self.generation.partial(target, prefix).is_ok()
    }

    /// Commits the full response to the chat that owns the generation.
    pub fn on_playback_complete(&mut self, target: GenerationTarget) -> bool {
        match self.generation.complete(target) {
            Ok(full_text) => {
                if !full_text.is_empty() {
                    self.store
                        .append_message(target.chat_id, Message::assistant(full_text));
                }
                tracing::info!(chat_id = %target.chat_id, "generation completed");
                true
            }
            Err(rejection) => {
                tracing::debug!(?rejection, "stale playback completion dropped");
                false
            }
        }
    }

    /// Cancels the live generation, keeping any revealed text as the reply.
    pub fn stop(&mut self) -> Option<StoppedGeneration> {
        let stopped = self.generation.stop()?;

        if let Some(partial) = &stopped.partial {
            self.store
                .append_message(stopped.target.chat_id, Message::assistant(partial.clone()));
        }
        tracing::info!(
            chat_id = %stopped.target.chat_id,
            committed_partial = stopped.partial.is_some(),
            "generation stopped"
        );

        Some(stopped)
    }

    pub fn select_chat(&mut self, chat_id: ChatId) -> bool {
        if !self.store.contains(chat_id) {
            tracing::warn!(%chat_id, "selection of unknown chat ignored");
            return false;
        }

        self.stop();
        self.store.set_active(Some(chat_id));
        true
    }

    pub fn new_chat(&mut self) -> ChatId {
        self.stop();
        let chat_id = self.store.create_chat();
        self.store.set_active(Some(chat_id));
        chat_id
    }

    pub fn delete_chat(&mut self, chat_id: ChatId) -> bool {
        if !self.store.contains(chat_id) {
            tracing::warn!(%chat_id, "delete of unknown chat ignored");
            return false;
        }

        if self
            .generation
            .active_target()
            .is_some_and(|target| target.chat_id == chat_id)
        {
            self.stop();
        }

        self.store.delete_chat(chat_id);
        self.notices.push(Notice::success(CHAT_DELETED));
        true
    }

    /// Blank titles are ignored.
    pub fn rename_chat(&mut self, chat_id: ChatId, title: &str) -> bool {
        let title = title.trim();
        if title.is_empty() || !self.store.contains(chat_id) {
            return false;
        }

        self.store.rename_chat(chat_id, title);
        self.notices.push(Notice::success(CHAT_RENAMED));
        true
    }

    /// Returns the text to place on the clipboard.
    pub fn copy_message(&mut self, message_id: MessageId) -> Option<String> {
        let content = self.store.find_message(message_id)?.content.clone();
        self.notices.push(Notice::success(MESSAGE_COPIED));
        Some(content)
    }

    pub fn toggle_sidebar(&mut self) -> bool {
        self.sidebar_open = !self.sidebar_open;
        self.sidebar_open
    }

    pub fn sidebar_open(&self) -> bool {
        self.sidebar_open
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub fn window_title(&self) -> String {
        match self.store.active_chat() {
            Some(chat) if chat.title != DEFAULT_CHAT_TITLE => {
                format!("{}{WINDOW_TITLE_SUFFIX}", chat.title)
            }
            _ => APP_WINDOW_TITLE.to_string(),
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let generation = match self.generation.state() {
            GenerationState::Idle => GenerationView::Idle,
            GenerationState::Waiting(target) => GenerationView::Waiting {
                chat_id: target.chat_id,
            },
            GenerationState::Playing {
                target, partial, ..
            } => GenerationView::Playing {
                chat_id: target.chat_id,
                partial: partial.clone(),
            },
        };

        SessionSnapshot {
            chats: self
                .store
                .list_chats()
                .iter()
                .map(ChatSummary::from)
                .collect(),
            active_chat_id: self.store.active_chat_id(),
            messages: self.store.shared_active_messages(),
            generation,
            sidebar_open: self.sidebar_open,
            window_title: self.window_title(),
            provider: self.provider.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use ingpt_llm::ProviderError;

    use super::*;
    use crate::message::Role;
    use crate::notice::{NoticeLevel, REQUEST_FAILED};

    fn session() -> ChatSession {
        ChatSession::new(ProviderStatus::configured("gemini"))
    }

    fn dispatch(session: &mut ChatSession, text: &str) -> GenerationRequest {
        match session.send(text) {
            SendOutcome::Dispatched(request) => request,
            other => panic!("send should dispatch, got {other:?}"),
        }
    }

    fn play(session: &mut ChatSession, request: &GenerationRequest, text: &str) {
        let outcome = session.on_response(request.target, Ok(text.to_string()));
        assert_eq!(
            outcome,
            ResponseOutcome::Play(PlaybackRequest {
                target: request.target,
                full_text: text.to_string(),
            })
        );
    }

    fn active_contents(session: &ChatSession) -> Vec<(Role, String)> {
        session
            .store()
            .active_messages()
            .iter()
            .map(|message| (message.role, message.content.clone()))
            .collect()
    }

    #[test]
    fn successful_send_appends_user_then_assistant() {
        let mut session = session();
        let request = dispatch(&mut session, "What is Rust?");
        assert_eq!(request.prompt, "What is Rust?");

        play(&mut session, &request, "A language.");
        for end in 1..="A language.".len() {
            assert!(session.on_playback_partial(request.target, &"A language."[..end]));
        }
        assert!(session.on_playback_complete(request.target));

        assert_eq!(
            active_contents(&session),
            vec![
                (Role::User, "What is Rust?".to_string()),
                (Role::Assistant, "A language.".to_string()),
            ]
        );
        assert!(!session.is_generating());
        assert_eq!(session.window_title(), "What is Rust? - InGPT");
    }

    #[test]
    fn blank_send_is_a_no_op() {
        let mut session = session();
        let chat_id = session.new_chat();

        assert!(matches!(session.send("   \n\t"), SendOutcome::Ignored));
        assert_eq!(session.store().chat(chat_id).map(Chat::message_count), Some(0));
        assert!(!session.is_generating());
    }

    #[test]
    fn send_while_generating_is_ignored() {
        let mut session = session();
        dispatch(&mut session, "first");

        assert!(matches!(session.send("second"), SendOutcome::Ignored));
        assert_eq!(session.store().active_messages().len(), 1);
    }

    #[test]
    fn missing_credential_blocks_before_anything_is_appended() {
        let mut session = ChatSession::new(ProviderStatus::missing_credential("gemini"));

        assert!(matches!(session.send("hello"), SendOutcome::ConfigurationError));
        assert!(session.store().list_chats().is_empty());

        let notices = session.drain_notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Blocking);
        assert!(notices[0].message.contains("Gemini API key not configured"));

        assert!(matches!(session.send("  "), SendOutcome::Ignored));
        assert!(session.drain_notices().is_empty());
    }

    #[test]
    fn stop_while_playing_commits_the_revealed_prefix() {
        let mut session = session();
        let request = dispatch(&mut session, "greet me");
        play(&mut session, &request, "Hello world");
        assert!(session.on_playback_partial(request.target, "Hello wor"));

        let stopped = session.stop();

        assert!(request.cancel.is_cancelled());
        assert_eq!(
            stopped.and_then(|stopped| stopped.partial),
            Some("Hello wor".to_string())
        );
        assert_eq!(
            active_contents(&session).last(),
            Some(&(Role::Assistant, "Hello wor".to_string()))
        );
        assert!(matches!(session.generation_state(), GenerationState::Idle));
    }

    #[test]
    fn stop_while_waiting_commits_nothing_and_drops_late_response() {
        let mut session = session();
        let request = dispatch(&mut session, "slow question");

        session.stop();
        let late = session.on_response(request.target, Ok("too late".to_string()));

        assert_eq!(late, ResponseOutcome::Ignored);
        assert_eq!(active_contents(&session).len(), 1);
        assert!(!session.is_generating());
    }

    #[test]
    fn stop_before_any_reveal_commits_nothing() {
        let mut session = session();
        let request = dispatch(&mut session, "question");
        play(&mut session, &request, "answer");

        session.stop();

        assert_eq!(active_contents(&session).len(), 1);
    }

    #[test]
    fn switching_chats_stops_and_commits_into_the_prior_chat() {
        let mut session = session();
        let other = session.new_chat();
        let first = session.new_chat();
        let request = dispatch(&mut session, "tell me something");
        play(&mut session, &request, "Hello world");
        session.on_playback_partial(request.target, "Hello");

        assert!(session.select_chat(other));

        let first_chat = session.store().chat(first).map(|chat| chat.messages.clone());
        assert_eq!(
            first_chat
                .unwrap_or_default()
                .last()
                .map(|message| message.content.clone()),
            Some("Hello".to_string())
        );
        assert_eq!(session.store().active_chat_id(), Some(other));
        assert!(!session.is_generating());
        assert!(!session.on_playback_complete(request.target));
    }

    #[test]
    fn failed_request_raises_transient_notice_without_reply() {
        let mut session = session();
        let request = dispatch(&mut session, "question");

        let outcome = session.on_response(
            request.target,
            Err(ProviderError::EmptyCompletion {
                stage: "extract-completion-text",
                model_id: "gemini-1.5-flash".to_string(),
            }),
        );

        assert_eq!(outcome, ResponseOutcome::Failed);
        assert_eq!(active_contents(&session).len(), 1);
        assert_eq!(session.drain_notices(), vec![Notice::transient(REQUEST_FAILED)]);
        assert!(!session.is_generating());
        assert!(matches!(session.send("retry"), SendOutcome::Dispatched(_)));
    }

    #[test]
    fn empty_response_commits_nothing() {
        let mut session = session();
        let request = dispatch(&mut session, "question");

        assert_eq!(
            session.on_response(request.target, Ok(String::new())),
            ResponseOutcome::Finished
        );
        assert_eq!(active_contents(&session).len(), 1);
        assert!(!session.is_generating());
    }

    #[test]
    fn renamed_title_survives_later_messages() {
        let mut session = session();
        let chat_id = session.new_chat();

        assert!(session.rename_chat(chat_id, "  Draft  "));
        let request = dispatch(&mut session, "Tell me a joke about cats today please");
        session.stop();
        drop(request);

        assert_eq!(
            session.store().chat(chat_id).map(|chat| chat.title.as_str()),
            Some("Draft")
        );
        assert!(!session.rename_chat(chat_id, "   "));
        assert_eq!(session.drain_notices(), vec![Notice::success(CHAT_RENAMED)]);
    }

    #[test]
    fn first_message_names_a_fresh_chat() {
        let mut session = session();
        dispatch(&mut session, "Tell me a joke about cats today please");

        assert_eq!(
            session.store().active_chat().map(|chat| chat.title.as_str()),
            Some("Tell me a joke about cats...")
        );
        assert_eq!(session.window_title(), "Tell me a joke about cats... - InGPT");
    }

    #[test]
    fn deleting_the_generating_chat_stops_first() {
        let mut session = session();
        let request = dispatch(&mut session, "question");
        let chat_id = request.target.chat_id;

        assert!(session.delete_chat(chat_id));

        assert!(request.cancel.is_cancelled());
        assert!(!session.is_generating());
        assert_eq!(session.store().active_chat_id(), None);
        assert_eq!(session.window_title(), APP_WINDOW_TITLE);
        assert_eq!(session.drain_notices(), vec![Notice::success(CHAT_DELETED)]);
    }

    #[test]
    fn copy_returns_content_and_confirms() {
        let mut session = session();
        let request = dispatch(&mut session, "copy me");
        let message_id = session.store().active_messages()[0].id;
        drop(request);

        assert_eq!(session.copy_message(message_id), Some("copy me".to_string()));
        assert_eq!(session.drain_notices(), vec![Notice::success(MESSAGE_COPIED)]);
        assert_eq!(session.copy_message(MessageId::new_v7()), None);
    }

    #[test]
    fn snapshot_reflects_generation_and_sidebar() {
        let mut session = session();
        assert!(session.snapshot().sidebar_open);
        assert!(!session.toggle_sidebar());

        let request = dispatch(&mut session, "question");
        play(&mut session, &request, "answer");
        session.on_playback_partial(request.target, "ans");

        let snapshot = session.snapshot();
        assert!(!snapshot.sidebar_open);
        assert_eq!(snapshot.chats.len(), 1);
        assert_eq!(snapshot.chats[0].message_count, 1);
        assert_eq!(
            snapshot.generation,
            GenerationView::Playing {
                chat_id: request.target.chat_id,
                partial: "ans".to_string(),
            }
        );
    }

    #[test]
    fn selecting_or_creating_a_chat_keeps_the_sidebar() {
        let mut session = session();
        let first = session.new_chat();
        assert!(session.sidebar_open());

        session.new_chat();
        assert!(session.select_chat(first));
        assert!(session.sidebar_open());

        assert!(!session.toggle_sidebar());
        session.new_chat();
        assert!(session.select_chat(first));
        assert!(!session.sidebar_open());
    }

    #[test]
    fn playback_snapshots_share_the_message_list() {
        let mut session = session();
        let request = dispatch(&mut session, "question");
        play(&mut session, &request, "answer");

        session.on_playback_partial(request.target, "a");
        let first = session.snapshot();
        session.on_playback_partial(request.target, "an");
        let second = session.snapshot();
        assert!(Arc::ptr_eq(&first.messages, &second.messages));

        assert!(session.on_playback_complete(request.target));
        let committed = session.snapshot();
        assert!(!Arc::ptr_eq(&first.messages, &committed.messages));
        assert_eq!(first.messages.len(), 1);
        assert_eq!(committed.messages.len(), 2);
    }
}

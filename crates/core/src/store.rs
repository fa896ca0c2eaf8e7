use std::sync::Arc;

use crate::chat::Chat;
use crate::ids::{ChatId, MessageId};
use crate::message::Message;

/// In-memory chat threads plus the active selection. Lives as long as the process.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    // Newest first.
    chats: Vec<Chat>,
    active: Option<ChatId>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty "New Chat" thread at the top of the list and returns its id.
    pub fn create_chat(&mut self) -> ChatId {
        let id = ChatId::new_v7();
        self.chats.insert(0, Chat::new(id));
        tracing::debug!(chat_id = %id, "chat created");
        id
    }

    pub fn append_message(&mut self, chat_id: ChatId, message: Message) {
        let Some(chat) = self.chat_mut(chat_id) else {
            tracing::warn!(%chat_id, "append to unknown chat ignored");
            return;
        };

        chat.push_message(message);
    }

    pub fn rename_chat(&mut self, chat_id: ChatId, title: impl Into<String>) {
        let Some(chat) = self.chat_mut(chat_id) else {
            tracing::warn!(%chat_id, "rename of unknown chat ignored");
            return;
        };

        chat.rename(title.into());
    }

    /// Removes the chat. Deleting the active chat clears the selection.
    pub fn delete_chat(&mut self, chat_id: ChatId) {
        let before = self.chats.len();
        self.chats.retain(|chat| chat.id != chat_id);

        if self.chats.len() == before {
            tracing::warn!(%chat_id, "delete of unknown chat ignored");
            return;
        }

        if self.active == Some(chat_id) {
            self.active = None;
        }
    }

    pub fn list_chats(&self) -> &[Chat] {
        &self.chats
    }

    pub fn chat(&self, chat_id: ChatId) -> Option<&Chat> {
        self.chats.iter().find(|chat| chat.id == chat_id)
    }

    pub fn contains(&self, chat_id: ChatId) -> bool {
        self.chat(chat_id).is_some()
    }

    pub fn active_chat_id(&self) -> Option<ChatId> {
        self.active
    }

    pub fn active_chat(&self) -> Option<&Chat> {
        self.active.and_then(|id| self.chat(id))
    }

    pub fn set_active(&mut self, chat_id: Option<ChatId>) {
        match chat_id {
            Some(id) if !self.contains(id) => {
                tracing::warn!(chat_id = %id, "selection of unknown chat ignored");
            }
            other => self.active = other,
        }
    }

    pub fn active_messages(&self) -> &[Message] {
        self.active_chat()
            .map(|chat| chat.messages.as_slice())
            .unwrap_or_default()
    }

    /// The active thread's messages without copying them.
    pub fn shared_active_messages(&self) -> Arc<Vec<Message>> {
        self.active_chat()
            .map(|chat| Arc::clone(&chat.messages))
            .unwrap_or_default()
    }

    pub fn find_message(&self, message_id: MessageId) -> Option<&Message> {
        self.chats
            .iter()
            .flat_map(|chat| chat.messages.iter())
            .find(|message| message.id == message_id)
    }

    fn chat_mut(&mut self, chat_id: ChatId) -> Option<&mut Chat> {
        self.chats.iter_mut().find(|chat| chat.id == chat_id)
    }
}

use std::sync::Arc;

use gpui::*;
use gpui_component::{ActiveTheme, v_flex};
use gpui_tokio_bridge::Tokio;
use ingpt_core::{
    ChangeReason, ChatCommand, ChatHandle, ChatRuntime, ChatUpdate, SessionSnapshot,
    SettingsStore, SystemClipboard, copy_with_fallback,
};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::chat::events::{
    ChatSelected, CopyMessageClicked, DeleteChatClicked, NewChatClicked, NoticeRaised,
    RenameChatSubmitted, Stop, Submit, SuggestionPicked, WindowTitleChanged,
};
use crate::chat::{ChatSidebar, MessageInput, MessageList};
use crate::clipboard::GpuiClipboard;

/// Parent coordinator: forwards child intents to the chat runtime and fans
/// published snapshots back out to the sidebar, message list and input.
pub struct ChatView {
    sidebar: Entity<ChatSidebar>,
    message_list: Entity<MessageList>,
    message_input: Entity<MessageInput>,
    handle: ChatHandle,
    snapshot: Arc<SessionSnapshot>,
    runtime_task: Option<Task<Result<(), gpui_tokio_bridge::JoinError>>>,
    update_reader_task: Option<Task<()>>,
}

impl EventEmitter<NoticeRaised> for ChatView {}
impl EventEmitter<WindowTitleChanged> for ChatView {}

impl ChatView {
    pub fn new(
        settings_store: Arc<SettingsStore>,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) -> Self {
        let sidebar = cx.new(|cx| ChatSidebar::new(window, cx));
        let message_list = cx.new(MessageList::new);
        let message_input = cx.new(|cx| MessageInput::new(window, cx));
        let (runtime, handle, updates) = ChatRuntime::new(settings_store);

        cx.subscribe(&sidebar, |this, _, event: &ChatSelected, _cx| {
            this.dispatch(ChatCommand::SelectChat(event.chat_id));
        })
        .detach();

        cx.subscribe(&sidebar, |this, _, _event: &NewChatClicked, _cx| {
            this.dispatch(ChatCommand::NewChat);
        })
        .detach();

        cx.subscribe(&sidebar, |this, _, event: &DeleteChatClicked, _cx| {
            this.dispatch(ChatCommand::DeleteChat(event.chat_id));
        })
        .detach();

        cx.subscribe(&sidebar, |this, _, event: &RenameChatSubmitted, _cx| {
            this.dispatch(ChatCommand::RenameChat {
                chat_id: event.chat_id,
                title: event.title.clone(),
            });
        })
        .detach();

        cx.subscribe(&message_input, |this, _, event: &Submit, _cx| {
            this.dispatch(ChatCommand::Send(event.content.clone()));
        })
        .detach();

        cx.subscribe(&message_input, |this, _, _event: &Stop, _cx| {
            this.dispatch(ChatCommand::Stop);
        })
        .detach();

        cx.subscribe(&message_list, |this, _, event: &CopyMessageClicked, _cx| {
            this.dispatch(ChatCommand::CopyMessage(event.message_id));
        })
        .detach();

        cx.subscribe_in(
            &message_list,
            window,
            |this, _, event: &SuggestionPicked, window, cx| {
                this.message_input.update(cx, |input, cx| {
                    input.set_text(&event.text, window, cx);
                });
            },
        )
        .detach();

        let snapshot = handle.snapshot();
        let mut this = Self {
            sidebar,
            message_list,
            message_input,
            handle,
            snapshot,
            runtime_task: None,
            update_reader_task: None,
        };

        this.runtime_task = Some(Tokio::spawn(cx, runtime.run()));
        this.spawn_update_reader(updates, cx);
        this.apply_snapshot(ChangeReason::ChatSwitched, cx);
        this
    }

    pub fn sidebar(&self) -> &Entity<ChatSidebar> {
        &self.sidebar
    }

    pub fn sidebar_open(&self) -> bool {
        self.snapshot.sidebar_open
    }

    pub fn provider_label(&self) -> String {
        let provider = &self.snapshot.provider;
        if provider.configured {
            provider.provider_name.clone()
        } else {
            format!("{} (no API key)", provider.provider_name)
        }
    }

    pub fn new_chat(&mut self) {
        self.dispatch(ChatCommand::NewChat);
    }

    pub fn toggle_sidebar(&mut self) {
        self.dispatch(ChatCommand::ToggleSidebar);
    }

    pub fn reload_settings(&mut self) {
        self.dispatch(ChatCommand::ReloadSettings);
    }

    fn dispatch(&self, command: ChatCommand) {
        if !self.handle.send(command) {
            tracing::error!("chat runtime is no longer running; command dropped");
        }
    }

    fn spawn_update_reader(
        &mut self,
        mut updates: UnboundedReceiver<ChatUpdate>,
        cx: &mut Context<Self>,
    ) {
        self.update_reader_task = Some(cx.spawn(async move |this, cx| {
            while let Some(update) = updates.recv().await {
                if this
                    .update(cx, |this, cx| this.handle_update(update, cx))
                    .is_err()
                {
                    break;
                }
            }

            tracing::debug!("chat update stream closed");
        }));
    }

    fn handle_update(&mut self, update: ChatUpdate, cx: &mut Context<Self>) {
        match update {
            ChatUpdate::Changed(reason) => self.apply_snapshot(reason, cx),
            ChatUpdate::Notice(notice) => cx.emit(NoticeRaised { notice }),
            ChatUpdate::CopyText(text) => {
                let mut primary = GpuiClipboard::new(cx);
                match copy_with_fallback(&mut primary, &mut SystemClipboard, &text) {
                    Ok(backend) => tracing::debug!(backend, "message copied"),
                    Err(error) => tracing::error!(%error, "message copy failed"),
                }
            }
        }
    }

    fn apply_snapshot(&mut self, reason: ChangeReason, cx: &mut Context<Self>) {
        let snapshot = self.handle.snapshot();
        let title_changed = snapshot.window_title != self.snapshot.window_title;

        self.sidebar.update(cx, |sidebar, cx| {
            sidebar.apply_snapshot(&snapshot, cx);
        });
        self.message_list.update(cx, |list, cx| {
            list.apply_snapshot(&snapshot, reason, cx);
        });
        self.message_input.update(cx, |input, cx| {
            input.set_generating(snapshot.generation.is_active(), cx);
        });

        if title_changed || reason == ChangeReason::ChatSwitched {
            cx.emit(WindowTitleChanged {
                title: snapshot.window_title.clone(),
            });
        }

        self.snapshot = snapshot;
        cx.notify();
    }
}

impl Render for ChatView {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let theme = cx.theme();

        v_flex()
            .id("chat-view")
            .relative()
            .size_full()
            .min_h_0()
            .overflow_hidden()
            .bg(theme.background)
            .child(
                div()
                    .id("chat-view-message-list")
                    .flex_1()
                    .min_h_0()
                    .child(self.message_list.clone()),
            )
            .child(
                div()
                    .id("chat-view-message-input")
                    .flex_shrink_0()
                    .w_full()
                    .border_t_1()
                    .border_color(theme.border)
                    .child(self.message_input.clone()),
            )
    }
}

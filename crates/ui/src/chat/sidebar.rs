use chrono::Utc;
use gpui::prelude::FluentBuilder as _;
use gpui::*;
use gpui_component::{
    ActiveTheme, IconName, Sizable,
    button::{Button, ButtonVariants},
    h_flex,
    input::{Input, InputEvent, InputState},
    label::Label,
    list::ListItem,
    v_flex,
};
use ingpt_core::{ChatId, ChatSummary, SessionSnapshot, relative_day_label};

use crate::chat::events::{ChatSelected, DeleteChatClicked, NewChatClicked, RenameChatSubmitted};

const SIDEBAR_TITLE: &str = "Chat History";
const EMPTY_HISTORY_LABEL: &str = "No chats yet";

pub struct ChatSidebar {
    chats: Vec<ChatSummary>,
    active_chat_id: Option<ChatId>,
    editing_chat_id: Option<ChatId>,
    rename_input: Entity<InputState>,
    scroll_handle: ScrollHandle,
}

impl EventEmitter<ChatSelected> for ChatSidebar {}
impl EventEmitter<NewChatClicked> for ChatSidebar {}
impl EventEmitter<DeleteChatClicked> for ChatSidebar {}
impl EventEmitter<RenameChatSubmitted> for ChatSidebar {}

impl ChatSidebar {
    pub fn new(window: &mut Window, cx: &mut Context<Self>) -> Self {
        let rename_input = cx.new(|cx| InputState::new(window, cx));

        cx.subscribe_in(
            &rename_input,
            window,
            |this, _, event: &InputEvent, window, cx| {
                if let InputEvent::PressEnter { .. } = event {
                    this.save_rename(window, cx);
                }
            },
        )
        .detach();

        Self {
            chats: Vec::new(),
            active_chat_id: None,
            editing_chat_id: None,
            rename_input,
            scroll_handle: ScrollHandle::new(),
        }
    }

    pub fn apply_snapshot(&mut self, snapshot: &SessionSnapshot, cx: &mut Context<Self>) {
        self.chats = snapshot.chats.clone();
        self.active_chat_id = snapshot.active_chat_id;

        // A chat deleted mid-edit drops the edit.
        if self
            .editing_chat_id
            .is_some_and(|editing| !self.chats.iter().any(|chat| chat.id == editing))
        {
            self.editing_chat_id = None;
        }

        cx.notify();
    }

    fn select_chat(&mut self, chat_id: ChatId, cx: &mut Context<Self>) {
        if self.editing_chat_id == Some(chat_id) {
            return;
        }

        cx.emit(ChatSelected { chat_id });
    }

    fn start_rename(
        &mut self,
        chat_id: ChatId,
        title: String,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) {
        self.editing_chat_id = Some(chat_id);
        self.rename_input.update(cx, |state, cx| {
            state.set_value(title, window, cx);
            state.focus(window, cx);
        });
        cx.notify();
    }

    /// Empty or whitespace-only titles leave the chat untouched.
    fn save_rename(&mut self, window: &mut Window, cx: &mut Context<Self>) {
        let Some(chat_id) = self.editing_chat_id.take() else {
            return;
        };

        let title = self.rename_input.read(cx).value().to_string();
        if !title.trim().is_empty() {
            cx.emit(RenameChatSubmitted { chat_id, title });
        }

        self.rename_input.update(cx, |state, cx| {
            state.set_value("", window, cx);
        });
        cx.notify();
    }

    fn cancel_rename(&mut self, cx: &mut Context<Self>) {
        if self.editing_chat_id.take().is_some() {
            cx.notify();
        }
    }

    fn render_toolbar(&mut self, cx: &mut Context<Self>) -> impl IntoElement {
        h_flex()
            .w_full()
            .min_w_0()
            .items_center()
            .justify_between()
            .gap_2()
            .px_3()
            .pt(px(8.))
            .pb_2()
            .child(Label::new(SIDEBAR_TITLE).text_sm())
            .child(
                Button::new("new-chat")
                    .small()
                    .primary()
                    .icon(IconName::Plus)
                    .child("New Chat")
                    .on_click(cx.listener(|_, _, _window, cx| {
                        cx.emit(NewChatClicked);
                    })),
            )
    }

    fn render_empty_state(&mut self, cx: &mut Context<Self>) -> AnyElement {
        let theme = cx.theme();

        v_flex()
            .flex_1()
            .items_center()
            .justify_center()
            .px_4()
            .child(
                Label::new(EMPTY_HISTORY_LABEL)
                    .text_sm()
                    .text_color(theme.foreground.opacity(0.55)),
            )
            .into_any_element()
    }

    fn render_rename_row(&mut self, index: usize, cx: &mut Context<Self>) -> AnyElement {
        h_flex()
            .id(("chat-rename", index))
            .w_full()
            .px_2()
            .py_1()
            .gap_1()
            .items_center()
            .on_key_down(cx.listener(|this, event: &KeyDownEvent, _window, cx| {
                if event.keystroke.key == "escape" {
                    this.cancel_rename(cx);
                    cx.stop_propagation();
                }
            }))
            .child(div().flex_1().min_w_0().child(Input::new(&self.rename_input).small()))
            .child(
                Button::new(("chat-rename-save", index))
                    .ghost()
                    .xsmall()
                    .icon(IconName::Check)
                    .on_click(cx.listener(|this, _, window, cx| {
                        this.save_rename(window, cx);
                    })),
            )
            .child(
                Button::new(("chat-rename-cancel", index))
                    .ghost()
                    .xsmall()
                    .icon(IconName::Close)
                    .on_click(cx.listener(|this, _, _window, cx| {
                        this.cancel_rename(cx);
                    })),
            )
            .into_any_element()
    }

    fn render_chat_row(
        &mut self,
        index: usize,
        chat: &ChatSummary,
        now: chrono::DateTime<Utc>,
        cx: &mut Context<Self>,
    ) -> AnyElement {
        let chat_id = chat.id;
        let title = chat.title.clone();
        let is_selected = self.active_chat_id == Some(chat_id);
        let details = format!(
            "{} messages · {}",
            chat.message_count,
            relative_day_label(chat.timestamp, now)
        );
        let theme = cx.theme();
        let muted = theme.muted_foreground;

        ListItem::new(("chat", index))
            .w_full()
            .px_3()
            .py_2()
            .rounded_md()
            .selected(is_selected)
            .on_click(cx.listener(move |this, _event: &ClickEvent, _window, cx| {
                this.select_chat(chat_id, cx);
            }))
            .child(
                h_flex()
                    .w_full()
                    .gap_1()
                    .items_center()
                    .child(
                        v_flex()
                            .flex_1()
                            .min_w_0()
                            .child(
                                div()
                                    .truncate()
                                    .child(Label::new(title.clone()).text_sm()),
                            )
                            .child(Label::new(details).text_xs().text_color(muted)),
                    )
                    .child(
                        Button::new(("chat-rename-start", index))
                            .ghost()
                            .xsmall()
                            .child("Rename")
                            .on_click(cx.listener(move |this, _, window, cx| {
                                cx.stop_propagation();
                                this.start_rename(chat_id, title.clone(), window, cx);
                            })),
                    )
                    .child(
                        Button::new(("chat-delete", index))
                            .ghost()
                            .xsmall()
                            .icon(IconName::Delete)
                            .on_click(cx.listener(move |_, _, _window, cx| {
                                cx.stop_propagation();
                                cx.emit(DeleteChatClicked { chat_id });
                            })),
                    ),
            )
            .into_any_element()
    }

    fn render_history_list(&mut self, cx: &mut Context<Self>) -> AnyElement {
        if self.chats.is_empty() {
            return self.render_empty_state(cx);
        }

        let now = Utc::now();
        let editing = self.editing_chat_id;
        let chats = self.chats.clone();
        let rows = chats
            .iter()
            .enumerate()
            .map(|(index, chat)| {
                if editing == Some(chat.id) {
                    self.render_rename_row(index, cx)
                } else {
                    self.render_chat_row(index, chat, now, cx)
                }
            })
            .collect::<Vec<_>>();

        div()
            .id("chat-history")
            .flex_1()
            .min_h_0()
            .overflow_y_scroll()
            .track_scroll(&self.scroll_handle)
            .child(v_flex().w_full().gap_1().px_2().children(rows))
            .into_any_element()
    }
}

impl Render for ChatSidebar {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let theme = cx.theme();
        let has_chats = !self.chats.is_empty();

        v_flex()
            .size_full()
            .min_w_0()
            .overflow_hidden()
            .bg(theme.background)
            .child(self.render_toolbar(cx))
            .child(self.render_history_list(cx))
            .when(has_chats, |el| el.pb_2())
    }
}

use std::sync::Arc;

use gpui::prelude::FluentBuilder as _;
use gpui::*;
use gpui_component::{
    ActiveTheme, IconName, Sizable,
    button::{Button, ButtonVariants},
    h_flex,
    label::Label,
    text::TextView,
    v_flex,
};
use ingpt_core::{
    ChangeReason, ChatId, GenerationView, Message, MessageId, SUGGESTED_QUESTIONS,
    SessionSnapshot,
};

use crate::chat::events::{CopyMessageClicked, SuggestionPicked};
use crate::chat::scroll_manager::ScrollManager;

const CONTENT_MAX_WIDTH: Pixels = px(760.);
const USER_BUBBLE_MAX_WIDTH: Pixels = px(540.);
const MARKDOWN_SAFE_FALLBACK_THRESHOLD_BYTES: usize = 128 * 1024;
const ASSISTANT_NAME: &str = "InGPT";
const EMPTY_STATE_GREETING: &str = "Hello! How can I help you today?";
const EMPTY_STATE_DESCRIPTION: &str = "I'm here to assist you with questions, provide information, help with coding, and much more.";
const WAITING_LABEL: &str = "Thinking...";

pub struct MessageList {
    messages: Arc<Vec<Message>>,
    generation: GenerationView,
    active_chat_id: Option<ChatId>,
    scroll_manager: ScrollManager,
}

impl EventEmitter<CopyMessageClicked> for MessageList {}
impl EventEmitter<SuggestionPicked> for MessageList {}

impl MessageList {
    pub fn new(_cx: &mut Context<Self>) -> Self {
        Self {
            messages: Arc::default(),
            generation: GenerationView::Idle,
            active_chat_id: None,
            scroll_manager: ScrollManager::new(),
        }
    }

    pub fn apply_snapshot(
        &mut self,
        snapshot: &SessionSnapshot,
        reason: ChangeReason,
        cx: &mut Context<Self>,
    ) {
        self.messages = Arc::clone(&snapshot.messages);
        self.generation = snapshot.generation.clone();
        self.active_chat_id = snapshot.active_chat_id;

        match reason {
            ChangeReason::GenerationStarted => self.scroll_manager.generation_started(),
            ChangeReason::ChatSwitched => self.scroll_manager.chat_switched(),
            _ => {}
        }
        cx.notify();
    }

    /// The in-flight reply is shown only inside the chat that requested it.
    fn visible_generation(&self) -> Option<&GenerationView> {
        match self.generation.chat_id() {
            Some(chat_id) if Some(chat_id) == self.active_chat_id => Some(&self.generation),
            _ => None,
        }
    }

    fn render_empty_state(&self, cx: &mut Context<Self>) -> AnyElement {
        let theme = cx.theme();

        v_flex()
            .id("message-list-empty")
            .size_full()
            .items_center()
            .justify_center()
            .gap_3()
            .px_6()
            .child(Label::new(EMPTY_STATE_GREETING).text_xl())
            .child(
                Label::new(EMPTY_STATE_DESCRIPTION)
                    .text_sm()
                    .text_color(theme.muted_foreground),
            )
            .child(
                h_flex()
                    .flex_wrap()
                    .justify_center()
                    .gap_2()
                    .pt_4()
                    .max_w(CONTENT_MAX_WIDTH)
                    .children(SUGGESTED_QUESTIONS.iter().enumerate().map(|(index, question)| {
                        let text = (*question).to_string();
                        Button::new(("suggestion", index))
                            .outline()
                            .small()
                            .child(*question)
                            .on_click(cx.listener(move |_, _, _window, cx| {
                                cx.emit(SuggestionPicked { text: text.clone() });
                            }))
                    })),
            )
            .into_any_element()
    }

    fn render_message_row(
        &self,
        message: &Message,
        index: usize,
        cx: &mut Context<Self>,
    ) -> AnyElement {
        let message_id = message.id;
        let copy_button = Button::new(("copy-message", index))
            .ghost()
            .xsmall()
            .icon(IconName::Copy)
            .on_click(cx.listener(move |_, _, _window, cx| {
                cx.emit(CopyMessageClicked { message_id });
            }));
        let timestamp = message.timestamp.with_timezone(&chrono::Local).format("%H:%M");
        let theme = cx.theme();

        if message.is_user() {
            return v_flex()
                .w_full()
                .items_end()
                .gap_1()
                .child(
                    div()
                        .max_w(USER_BUBBLE_MAX_WIDTH)
                        .px_3()
                        .py_2()
                        .rounded_lg()
                        .bg(theme.primary)
                        .text_color(theme.primary_foreground)
                        .child(Label::new(message.content.clone()).text_sm()),
                )
                .child(
                    h_flex()
                        .gap_1()
                        .items_center()
                        .child(
                            Label::new(timestamp.to_string())
                                .text_xs()
                                .text_color(theme.muted_foreground),
                        )
                        .child(copy_button),
                )
                .into_any_element();
        }

        v_flex()
            .w_full()
            .gap_2()
            .child(
                Label::new(ASSISTANT_NAME)
                    .text_xs()
                    .text_color(theme.foreground.opacity(0.5)),
            )
            .child(render_markdown(message.id, &message.content))
            .child(
                h_flex()
                    .gap_1()
                    .items_center()
                    .child(
                        Label::new(timestamp.to_string())
                            .text_xs()
                            .text_color(theme.muted_foreground),
                    )
                    .child(copy_button),
            )
            .into_any_element()
    }

    fn render_generation_row(&self, cx: &mut Context<Self>) -> Option<AnyElement> {
        let theme = cx.theme();

        match self.visible_generation()? {
            GenerationView::Idle => None,
            GenerationView::Waiting { .. } => Some(
                h_flex()
                    .id("message-list-waiting")
                    .w_full()
                    .gap_2()
                    .items_center()
                    .child(div().size(px(8.)).rounded_full().bg(theme.primary))
                    .child(
                        Label::new(WAITING_LABEL)
                            .text_sm()
                            .text_color(theme.foreground.opacity(0.65)),
                    )
                    .into_any_element(),
            ),
            GenerationView::Playing { partial, .. } => Some(
                v_flex()
                    .id("message-list-typing")
                    .w_full()
                    .gap_2()
                    .child(
                        Label::new(ASSISTANT_NAME)
                            .text_xs()
                            .text_color(theme.foreground.opacity(0.5)),
                    )
                    .child(
                        TextView::markdown("typing-markdown", partial.clone()).selectable(true),
                    )
                    .into_any_element(),
            ),
        }
    }
}

fn render_markdown(message_id: MessageId, content: &str) -> AnyElement {
    if content.len() > MARKDOWN_SAFE_FALLBACK_THRESHOLD_BYTES {
        // Oversized payloads fall back to plain text.
        return Label::new(content.to_string()).text_sm().into_any_element();
    }

    let markdown_id = ElementId::Name(SharedString::from(format!(
        "assistant-markdown-{message_id}"
    )));

    TextView::markdown(markdown_id, content.to_string())
        .selectable(true)
        .into_any_element()
}

impl Render for MessageList {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        self.scroll_manager.update_follow_state();
        self.scroll_manager.apply_pending_scroll();

        if self.messages.is_empty() && self.visible_generation().is_none() {
            return self.render_empty_state(cx);
        }

        let rows = self
            .messages
            .iter()
            .enumerate()
            .map(|(index, message)| self.render_message_row(message, index, cx))
            .collect::<Vec<_>>();
        let generation_row = self.render_generation_row(cx);

        div()
            .id("message-list")
            .size_full()
            .min_h_0()
            .overflow_y_scroll()
            .track_scroll(self.scroll_manager.handle())
            .on_scroll_wheel(cx.listener(|this, _: &ScrollWheelEvent, _window, cx| {
                this.scroll_manager.mark_user_scroll();
                cx.notify();
            }))
            .child(
                v_flex()
                    .w_full()
                    .max_w(CONTENT_MAX_WIDTH)
                    .mx_auto()
                    .gap_4()
                    .px_4()
                    .py_3()
                    .children(rows)
                    .when_some(generation_row, |list, row| list.child(row)),
            )
            .into_any_element()
    }
}

use std::sync::Arc;

use arc_swap::ArcSwap;
use ingpt_llm::{GenerateRequest, LlmProvider, ProviderError, ProviderResult, create_provider};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::generation::GenerationState;
use crate::ids::{ChatId, GenerationTarget, MessageId};
use crate::notice::Notice;
use crate::playback::TypingPlayback;
use crate::session::{
    ChatSession, GenerationRequest, PlaybackRequest, ProviderStatus, ResponseOutcome,
    SendOutcome, SessionSnapshot,
};
use crate::settings::{AppSettings, SettingsStore};

/// User intent sent from the shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    Send(String),
    Stop,
    SelectChat(ChatId),
    NewChat,
    DeleteChat(ChatId),
    RenameChat { chat_id: ChatId, title: String },
    CopyMessage(MessageId),
    ToggleSidebar,
    ReloadSettings,
    Shutdown,
}

/// Why a new snapshot was published.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeReason {
    GenerationStarted,
    ResponseReceived,
    PlaybackProgress,
    MessagesChanged,
    ChatSwitched,
    ChatsChanged,
    SidebarToggled,
    SettingsReloaded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatUpdate {
    Changed(ChangeReason),
    Notice(Notice),
    /// Text the shell should place on the clipboard.
    CopyText(String),
}

enum RuntimeEvent {
    Command(ChatCommand),
    Response {
        target: GenerationTarget,
        result: ProviderResult<String>,
    },
    PlaybackPartial {
        target: GenerationTarget,
        prefix: String,
    },
    PlaybackComplete {
        target: GenerationTarget,
    },
}

enum Step {
    Changed(ChangeReason),
    Unchanged,
    Shutdown,
}

/// Cloneable sender for commands plus read access to the latest snapshot.
#[derive(Clone)]
pub struct ChatHandle {
    commands: UnboundedSender<ChatCommand>,
    snapshot: Arc<ArcSwap<SessionSnapshot>>,
}

impl ChatHandle {
    /// Returns false once the runtime has stopped.
    pub fn send(&self, command: ChatCommand) -> bool {
        self.commands.send(command).is_ok()
    }

    pub fn snapshot(&self) -> Arc<SessionSnapshot> {
        self.snapshot.load_full()
    }
}

/// Single consumer that applies commands, responses and playback ticks to the session in arrival order.
pub struct ChatRuntime {
    session: ChatSession,
    settings_store: Option<Arc<SettingsStore>>,
    provider: Option<Arc<dyn LlmProvider>>,
    model_id: String,
    playback: TypingPlayback,
    playing: Option<GenerationTarget>,
    commands: UnboundedReceiver<ChatCommand>,
    events_tx: UnboundedSender<RuntimeEvent>,
    events_rx: UnboundedReceiver<RuntimeEvent>,
    updates: UnboundedSender<ChatUpdate>,
    snapshot: Arc<ArcSwap<SessionSnapshot>>,
}

impl ChatRuntime {
    /// Builds a runtime whose provider follows `settings_store`.
    pub fn new(
        settings_store: Arc<SettingsStore>,
    ) -> (Self, ChatHandle, UnboundedReceiver<ChatUpdate>) {
        let settings = settings_store.settings();
        let provider = resolve_provider(&settings);
        Self::build(&settings, provider, Some(settings_store))
    }

    /// Builds a runtime around an explicit provider. `None` means no credential.
    pub fn with_provider(
        settings: &AppSettings,
        provider: Option<Arc<dyn LlmProvider>>,
    ) -> (Self, ChatHandle, UnboundedReceiver<ChatUpdate>) {
        Self::build(settings, provider, None)
    }

    fn build(
        settings: &AppSettings,
        provider: Option<Arc<dyn LlmProvider>>,
        settings_store: Option<Arc<SettingsStore>>,
    ) -> (Self, ChatHandle, UnboundedReceiver<ChatUpdate>) {
        let (commands_tx, commands) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (updates, updates_rx) = mpsc::unbounded_channel();

        let session = ChatSession::new(provider_status(settings, provider.is_some()));
        let snapshot = Arc::new(ArcSwap::from_pointee(session.snapshot()));

        let runtime = Self {
            session,
            settings_store,
            provider,
            model_id: settings.model.clone(),
            playback: TypingPlayback::new(settings.typing_interval()),
            playing: None,
            commands,
            events_tx,
            events_rx,
            updates,
            snapshot: snapshot.clone(),
        };
        let handle = ChatHandle {
            commands: commands_tx,
            snapshot,
        };

        (runtime, handle, updates_rx)
    }

    /// Runs until `Shutdown` arrives or every handle is dropped.
    pub async fn run(mut self) {
        tracing::info!(model_id = %self.model_id, "chat runtime started");

        loop {
            let event = tokio::select! {
                command = self.commands.recv() => match command {
                    Some(command) => RuntimeEvent::Command(command),
                    None => break,
                },
                Some(event) = self.events_rx.recv() => event,
            };

            let step = self.handle(event);
            self.reconcile_playback();

            match step {
                Step::Changed(reason) => self.publish(reason),
                Step::Unchanged => {}
                Step::Shutdown => {
                    self.flush_notices();
                    break;
                }
            }
            self.flush_notices();
        }

        self.playback.cancel();
        tracing::info!("chat runtime stopped");
    }

    fn handle(&mut self, event: RuntimeEvent) -> Step {
        match event {
            RuntimeEvent::Command(command) => self.handle_command(command),
            RuntimeEvent::Response { target, result } => {
                match self.session.on_response(target, result) {
                    ResponseOutcome::Play(request) => {
                        self.start_playback(request);
                        Step::Changed(ChangeReason::ResponseReceived)
                    }
                    ResponseOutcome::Finished | ResponseOutcome::Failed => {
                        Step::Changed(ChangeReason::MessagesChanged)
                    }
                    ResponseOutcome::Ignored => Step::Unchanged,
                }
            }
            RuntimeEvent::PlaybackPartial { target, prefix } => {
                if self.session.on_playback_partial(target, &prefix) {
                    Step::Changed(ChangeReason::PlaybackProgress)
                } else {
                    Step::Unchanged
                }
            }
            RuntimeEvent::PlaybackComplete { target } => {
                if self.session.on_playback_complete(target) {
                    Step::Changed(ChangeReason::MessagesChanged)
                } else {
                    Step::Unchanged
                }
            }
        }
    }

    fn handle_command(&mut self, command: ChatCommand) -> Step {
        match command {
            ChatCommand::Send(text) => match self.session.send(&text) {
                SendOutcome::Dispatched(request) => {
                    self.dispatch(request);
                    Step::Changed(ChangeReason::GenerationStarted)
                }
                SendOutcome::Ignored | SendOutcome::ConfigurationError => Step::Unchanged,
            },
            ChatCommand::Stop => match self.session.stop() {
                Some(_) => Step::Changed(ChangeReason::MessagesChanged),
                None => Step::Unchanged,
            },
            ChatCommand::SelectChat(chat_id) => {
                if self.session.select_chat(chat_id) {
                    Step::Changed(ChangeReason::ChatSwitched)
                } else {
                    Step::Unchanged
                }
            }
            ChatCommand::NewChat => {
                self.session.new_chat();
                Step::Changed(ChangeReason::ChatSwitched)
            }
            ChatCommand::DeleteChat(chat_id) => {
                if self.session.delete_chat(chat_id) {
                    Step::Changed(ChangeReason::ChatsChanged)
                } else {
                    Step::Unchanged
                }
            }
            ChatCommand::RenameChat { chat_id, title } => {
                if self.session.rename_chat(chat_id, &title) {
                    Step::Changed(ChangeReason::ChatsChanged)
                } else {
                    Step::Unchanged
                }
            }
            ChatCommand::CopyMessage(message_id) => {
                if let Some(text) = self.session.copy_message(message_id) {
                    let _ = self.updates.send(ChatUpdate::CopyText(text));
                }
                Step::Unchanged
            }
            ChatCommand::ToggleSidebar => {
                self.session.toggle_sidebar();
                Step::Changed(ChangeReason::SidebarToggled)
            }
            ChatCommand::ReloadSettings => {
                self.reload_settings();
                Step::Changed(ChangeReason::SettingsReloaded)
            }
            ChatCommand::Shutdown => {
                self.session.stop();
                Step::Shutdown
            }
        }
    }

    fn dispatch(&self, request: GenerationRequest) {
        let GenerationRequest {
            target,
            prompt,
            cancel,
        } = request;
        let events = self.events_tx.clone();

        let Some(provider) = self.provider.clone() else {
            let _ = events.send(RuntimeEvent::Response {
                target,
                result: Err(ProviderError::MissingApiKey {
                    stage: "dispatch-generation",
                    provider_id: self.session.provider_status().provider_name.clone(),
                }),
            });
            return;
        };

        let generate = GenerateRequest::new(self.model_id.clone(), prompt);
        tracing::debug!(
            provider_id = provider.id(),
            model_id = %generate.model_id,
            "dispatching completion request"
        );
        tokio::spawn(async move {
            let result = provider.generate(generate, cancel).await;
            let _ = events.send(RuntimeEvent::Response { target, result });
        });
    }

    fn start_playback(&mut self, request: PlaybackRequest) {
        let PlaybackRequest { target, full_text } = request;
        let partial_events = self.events_tx.clone();
        let complete_events = self.events_tx.clone();

        self.playing = Some(target);
        self.playback.start(
            full_text,
            move |prefix| {
                let _ = partial_events.send(RuntimeEvent::PlaybackPartial {
                    target,
                    prefix: prefix.to_string(),
                });
            },
            move || {
                let _ = complete_events.send(RuntimeEvent::PlaybackComplete { target });
            },
        );
    }

    /// Playback may only run while the session is playing that same target.
    fn reconcile_playback(&mut self) {
        let live = match self.session.generation_state() {
            GenerationState::Playing { target, .. } => Some(*target),
            GenerationState::Idle | GenerationState::Waiting(_) => None,
        };

        if self.playing.is_some() && self.playing != live {
            self.playback.cancel();
            self.playing = None;
        }
    }

    fn reload_settings(&mut self) {
        let Some(store) = &self.settings_store else {
            tracing::warn!("settings reload requested without a settings store");
            return;
        };

        let settings = store.reload();
        self.provider = resolve_provider(&settings);
        self.model_id = settings.model.clone();
        self.playback.set_interval(settings.typing_interval());
        self.session
            .set_provider_status(provider_status(&settings, self.provider.is_some()));

        tracing::info!(
            provider_id = %settings.provider_id,
            model_id = %settings.model,
            configured = self.provider.is_some(),
            "settings reloaded"
        );
    }

    fn publish(&mut self, reason: ChangeReason) {
        self.snapshot.store(Arc::new(self.session.snapshot()));
        let _ = self.updates.send(ChatUpdate::Changed(reason));
    }

    fn flush_notices(&mut self) {
        for notice in self.session.drain_notices() {
            let _ = self.updates.send(ChatUpdate::Notice(notice));
        }
    }
}

fn provider_status(settings: &AppSettings, has_provider: bool) -> ProviderStatus {
    if has_provider {
        ProviderStatus::configured(&settings.provider_id)
    } else {
        ProviderStatus::missing_credential(&settings.provider_id)
    }
}

fn resolve_provider(settings: &AppSettings) -> Option<Arc<dyn LlmProvider>> {
    let config = settings.to_provider_config()?;

    match create_provider(config) {
        Ok(provider) => Some(provider),
        Err(error) => {
            tracing::warn!(%error, provider_id = %settings.provider_id, "provider unavailable");
            None
        }
    }
}

use tokio_util::sync::CancellationToken;

use crate::ids::{ChatId, GenerationSessionId, GenerationTarget};

/// Lifecycle of the single in-flight generation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum GenerationState {
    #[default]
    Idle,
    Waiting(GenerationTarget),
    Playing {
        target: GenerationTarget,
        full_text: String,
        partial: String,
    },
}

impl GenerationState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn active_target(&self) -> Option<GenerationTarget> {
        match self {
            Self::Idle => None,
            Self::Waiting(target) | Self::Playing { target, .. } => Some(*target),
        }
    }

    /// Partial text revealed so far, only while playing.
    pub fn partial(&self) -> Option<&str> {
        match self {
            Self::Playing { partial, .. } => Some(partial),
            Self::Idle | Self::Waiting(_) => None,
        }
    }
}

/// Rejection reason for illegal generation transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationRejection {
    AlreadyActive {
        active: GenerationTarget,
    },
    NoActiveGeneration,
    TargetMismatch {
        active: GenerationTarget,
        attempted: GenerationTarget,
    },
    NotWaiting(GenerationTarget),
    NotPlaying(GenerationTarget),
}

pub type GenerationTransitionResult<T> = Result<T, GenerationRejection>;

/// What `stop` resolved. `partial` is set only when playback had revealed text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoppedGeneration {
    pub target: GenerationTarget,
    pub partial: Option<String>,
}

/// Owns the generation state and the cancellation token of the outbound call.
#[derive(Debug, Default)]
pub struct GenerationController {
    state: GenerationState,
    next_session: u64,
    cancel: Option<CancellationToken>,
}

impl GenerationController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &GenerationState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state.is_idle()
    }

    pub fn active_target(&self) -> Option<GenerationTarget> {
        self.state.active_target()
    }

    /// True when an event tagged with `target` belongs to the live generation.
    pub fn accepts(&self, target: GenerationTarget) -> bool {
        self.active_target() == Some(target)
    }

    /// Idle -> Waiting with a fresh session id and cancellation token.
    pub fn begin(
        &mut self,
        chat_id: ChatId,
    ) -> GenerationTransitionResult<(GenerationTarget, CancellationToken)> {
        if let Some(active) = self.active_target() {
            return Err(GenerationRejection::AlreadyActive { active });
        }

        self.next_session += 1;
        let target = GenerationTarget::new(chat_id, GenerationSessionId::new(self.next_session));
        let cancel = CancellationToken::new();

        self.cancel = Some(cancel.clone());
        self.state = GenerationState::Waiting(target);

        Ok((target, cancel))
    }

    /// Waiting -> Playing once the full response text is known.
    pub fn response_arrived(
        &mut self,
        target: GenerationTarget,
        full_text: String,
    ) -> GenerationTransitionResult<()> {
        self.check_target(target)?;
        if !matches!(self.state, GenerationState::Waiting(_)) {
            return Err(GenerationRejection::NotWaiting(target));
        }

        self.state = GenerationState::Playing {
            target,
            full_text,
            partial: String::new(),
        };
        Ok(())
    }

    pub fn partial(
        &mut self,
        target: GenerationTarget,
        prefix: &str,
    ) -> GenerationTransitionResult<()> {
        self.check_target(target)?;
        match &mut self.state {
            GenerationState::Playing { partial, .. } => {
                partial.clear();
                partial.push_str(prefix);
                Ok(())
            }
            GenerationState::Idle | GenerationState::Waiting(_) => {
                Err(GenerationRejection::NotPlaying(target))
            }
        }
    }

    /// Playing -> Idle, handing back the full text to commit.
    pub fn complete(&mut self, target: GenerationTarget) -> GenerationTransitionResult<String> {
        self.check_target(target)?;
        match std::mem::take(&mut self.state) {
            GenerationState::Playing { full_text, .. } => {
                self.cancel = None;
                Ok(full_text)
            }
            other => {
                self.state = other;
                Err(GenerationRejection::NotPlaying(target))
            }
        }
    }

    /// Waiting -> Idle after a request failure.
    pub fn fail(&mut self, target: GenerationTarget) -> GenerationTransitionResult<()> {
        self.check_target(target)?;
        if !matches!(self.state, GenerationState::Waiting(_)) {
            return Err(GenerationRejection::NotWaiting(target));
        }

        self.state = GenerationState::Idle;
        self.cancel = None;
        Ok(())
    }

    /// Cancels the outbound token and returns to Idle from any active state.
    pub fn stop(&mut self) -> Option<StoppedGeneration> {
        if let Some(cancel) = self.cancel.take() {
            cancel.cancel();
        }

        match std::mem::take(&mut self.state) {
            GenerationState::Idle => None,
            GenerationState::Waiting(target) => Some(StoppedGeneration {
                target,
                partial: None,
            }),
            GenerationState::Playing {
                target, partial, ..
            } => Some(StoppedGeneration {
                target,
                partial: (!partial.is_empty()).then_some(partial),
            }),
        }
    }

    fn check_target(&self, target: GenerationTarget) -> GenerationTransitionResult<()> {
        match self.active_target() {
            None => Err(GenerationRejection::NoActiveGeneration),
            Some(active) if active != target => Err(GenerationRejection::TargetMismatch {
                active,
                attempted: target,
            }),
            Some(_) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn begin(controller: &mut GenerationController) -> (GenerationTarget, CancellationToken) {
        match controller.begin(ChatId::new_v7()) {
            Ok(started) => started,
            Err(rejection) => panic!("begin should succeed: {rejection:?}"),
        }
    }

    #[test]
    fn full_lifecycle_returns_to_idle() {
        let mut controller = GenerationController::new();
        let (target, _) = begin(&mut controller);

        assert_eq!(controller.state(), &GenerationState::Waiting(target));
        assert_eq!(
            controller.response_arrived(target, "Hello".to_string()),
            Ok(())
        );
        assert_eq!(controller.partial(target, "Hel"), Ok(()));
        assert_eq!(controller.state().partial(), Some("Hel"));
        assert_eq!(controller.complete(target), Ok("Hello".to_string()));
        assert!(controller.is_idle());
    }

    #[test]
    fn second_begin_is_rejected_while_active() {
        let mut controller = GenerationController::new();
        let (target, _) = begin(&mut controller);

        match controller.begin(ChatId::new_v7()) {
            Err(rejection) => assert_eq!(
                rejection,
                GenerationRejection::AlreadyActive { active: target }
            ),
            Ok(_) => panic!("second begin must be rejected"),
        }
    }

    #[test]
    fn session_ids_are_never_reused() {
        let mut controller = GenerationController::new();
        let (first, _) = begin(&mut controller);
        controller.stop();
        let (second, _) = begin(&mut controller);

        assert_ne!(first.session_id, second.session_id);
        assert!(!controller.accepts(first));
        assert!(controller.accepts(second));
    }

    #[test]
    fn stop_while_waiting_cancels_token_without_partial() {
        let mut controller = GenerationController::new();
        let (target, cancel) = begin(&mut controller);

        let stopped = controller.stop();

        assert!(cancel.is_cancelled());
        assert_eq!(
            stopped,
            Some(StoppedGeneration {
                target,
                partial: None
            })
        );
        assert!(controller.is_idle());
    }

    #[test]
    fn stop_while_playing_returns_revealed_prefix() {
        let mut controller = GenerationController::new();
        let (target, _) = begin(&mut controller);
        let _ = controller.response_arrived(target, "Hello world".to_string());
        let _ = controller.partial(target, "Hello wor");

        let stopped = controller.stop();

        assert_eq!(
            stopped.and_then(|stopped| stopped.partial),
            Some("Hello wor".to_string())
        );
        assert_eq!(controller.stop(), None);
    }

    #[test]
    fn stale_events_are_rejected() {
        let mut controller = GenerationController::new();
        let (stale, _) = begin(&mut controller);
        controller.stop();

        assert_eq!(
            controller.response_arrived(stale, "late".to_string()),
            Err(GenerationRejection::NoActiveGeneration)
        );

        let (live, _) = begin(&mut controller);
        assert_eq!(
            controller.fail(stale),
            Err(GenerationRejection::TargetMismatch {
                active: live,
                attempted: stale,
            })
        );
        assert_eq!(
            controller.complete(live),
            Err(GenerationRejection::NotPlaying(live))
        );
        assert_eq!(controller.state(), &GenerationState::Waiting(live));
    }
}

use std::time::Duration;

use tokio_util::sync::CancellationToken;

pub const DEFAULT_TYPING_INTERVAL: Duration = Duration::from_millis(10);

/// Reveals a finished response one character at a time on a fixed interval.
///
/// Only the liveness token of the current run is kept. Starting a new run
/// cancels the previous one, and every step checks its token before it
/// reports anything.
#[derive(Debug)]
pub struct TypingPlayback {
    interval: Duration,
    current: Option<CancellationToken>,
}

impl TypingPlayback {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            current: None,
        }
    }

    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    /// Spawns a reveal run on the current tokio runtime.
    ///
    /// `on_partial` receives each revealed prefix, `on_complete` fires once
    /// after the last one. Neither fires for a run that was cancelled.
    pub fn start<P, C>(&mut self, full_text: String, mut on_partial: P, on_complete: C)
    where
        P: FnMut(&str) + Send + 'static,
        C: FnOnce() + Send + 'static,
    {
        self.cancel();

        let token = CancellationToken::new();
        self.current = Some(token.clone());
        let interval = self.interval;

        tokio::spawn(async move {
            let boundaries = full_text
                .char_indices()
                .map(|(start, ch)| start + ch.len_utf8())
                .collect::<Vec<_>>();

            for end in boundaries {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => return,
                    _ = tokio::time::sleep(interval) => {}
                }

                if token.is_cancelled() {
                    return;
                }
                on_partial(&full_text[..end]);
            }

            if token.is_cancelled() {
                return;
            }
            on_complete();
            // Marks the run as finished so `is_running` turns false.
            token.cancel();
        });
    }

    /// Stops the live run. Returns false when nothing was running.
    pub fn cancel(&mut self) -> bool {
        match self.current.take() {
            Some(token) if !token.is_cancelled() => {
                token.cancel();
                true
            }
            _ => false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.current
            .as_ref()
            .is_some_and(|token| !token.is_cancelled())
    }
}

impl Default for TypingPlayback {
    fn default() -> Self {
        Self::new(DEFAULT_TYPING_INTERVAL)
    }
}

impl Drop for TypingPlayback {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc;

    use super::*;

    #[derive(Debug, PartialEq, Eq)]
    enum Tick {
        Partial(String),
        Complete,
    }

    fn start_recording(
        playback: &mut TypingPlayback,
        text: &str,
        sender: mpsc::UnboundedSender<Tick>,
    ) {
        let complete_sender = sender.clone();
        playback.start(
            text.to_string(),
            move |prefix| {
                let _ = sender.send(Tick::Partial(prefix.to_string()));
            },
            move || {
                let _ = complete_sender.send(Tick::Complete);
            },
        );
    }

    fn drain(receiver: &mut mpsc::UnboundedReceiver<Tick>) -> Vec<Tick> {
        let mut ticks = Vec::new();
        while let Ok(tick) = receiver.try_recv() {
            ticks.push(tick);
        }
        ticks
    }

    #[tokio::test(start_paused = true)]
    async fn emits_one_partial_per_character_then_completes() {
        let (sender, mut receiver) = mpsc::unbounded_channel();
        let mut playback = TypingPlayback::default();

        start_recording(&mut playback, "héy", sender);
        assert!(playback.is_running());
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(
            drain(&mut receiver),
            vec![
                Tick::Partial("h".to_string()),
                Tick::Partial("hé".to_string()),
                Tick::Partial("héy".to_string()),
                Tick::Complete,
            ]
        );
        assert!(!playback.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn restarted_run_never_reports() {
        let (old_sender, mut old_receiver) = mpsc::unbounded_channel();
        let (new_sender, mut new_receiver) = mpsc::unbounded_channel();
        let mut playback = TypingPlayback::default();

        start_recording(&mut playback, "abandoned", old_sender);
        start_recording(&mut playback, "ok", new_sender);
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert!(drain(&mut old_receiver).is_empty());
        assert_eq!(
            drain(&mut new_receiver),
            vec![
                Tick::Partial("o".to_string()),
                Tick::Partial("ok".to_string()),
                Tick::Complete,
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn restart_mid_run_silences_the_old_run() {
        let (old_sender, mut old_receiver) = mpsc::unbounded_channel();
        let (new_sender, mut new_receiver) = mpsc::unbounded_channel();
        let mut playback = TypingPlayback::new(Duration::from_millis(10));

        start_recording(&mut playback, "abandoned", old_sender);
        tokio::time::sleep(Duration::from_millis(25)).await;
        assert_eq!(
            drain(&mut old_receiver),
            vec![Tick::Partial("a".to_string()), Tick::Partial("ab".to_string())]
        );

        playback.set_interval(Duration::from_millis(5));
        start_recording(&mut playback, "ok", new_sender);
        tokio::time::sleep(Duration::from_millis(12)).await;
        assert_eq!(
            drain(&mut new_receiver),
            vec![
                Tick::Partial("o".to_string()),
                Tick::Partial("ok".to_string()),
                Tick::Complete,
            ]
        );

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(drain(&mut old_receiver).is_empty());
        assert!(!playback.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_keeps_last_prefix_and_skips_completion() {
        let (sender, mut receiver) = mpsc::unbounded_channel();
        let mut playback = TypingPlayback::new(Duration::from_millis(10));

        start_recording(&mut playback, "Hello", sender);
        tokio::time::sleep(Duration::from_millis(25)).await;
        assert!(playback.cancel());
        tokio::time::sleep(Duration::from_secs(1)).await;

        let ticks = drain(&mut receiver);
        assert_eq!(
            ticks,
            vec![Tick::Partial("H".to_string()), Tick::Partial("He".to_string())]
        );
        assert!(!playback.cancel());
    }

    #[tokio::test(start_paused = true)]
    async fn empty_text_completes_immediately() {
        let (sender, mut receiver) = mpsc::unbounded_channel();
        let mut playback = TypingPlayback::default();

        start_recording(&mut playback, "", sender);
        tokio::time::sleep(Duration::from_millis(1)).await;

        assert_eq!(drain(&mut receiver), vec![Tick::Complete]);
    }
}

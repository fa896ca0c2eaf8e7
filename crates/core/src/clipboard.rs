use arboard::Clipboard;
use snafu::{ResultExt, Snafu};

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ClipboardError {
    #[snafu(display("clipboard '{backend}' unavailable on `{stage}`: {message}"))]
    Unavailable {
        stage: &'static str,
        backend: &'static str,
        message: String,
    },
    #[snafu(display("failed to open system clipboard on `{stage}`, {source}"))]
    SystemInit {
        stage: &'static str,
        source: arboard::Error,
    },
    #[snafu(display("failed to set system clipboard text on `{stage}`, {source}"))]
    SystemWrite {
        stage: &'static str,
        source: arboard::Error,
    },
}

impl ClipboardError {
    /// Used by shell backends that cannot confirm a write.
    pub fn unavailable(stage: &'static str, backend: &'static str, message: impl Into<String>) -> Self {
        Self::Unavailable {
            stage,
            backend,
            message: message.into(),
        }
    }
}

pub type ClipboardResult<T> = Result<T, ClipboardError>;

/// Somewhere text can be copied to.
pub trait ClipboardBackend {
    fn name(&self) -> &'static str;
    fn write_text(&mut self, text: &str) -> ClipboardResult<()>;
}

/// OS clipboard through `arboard`. Opened per write since the handle is not `Send` on every platform.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClipboard;

impl ClipboardBackend for SystemClipboard {
    fn name(&self) -> &'static str {
        "system"
    }

    fn write_text(&mut self, text: &str) -> ClipboardResult<()> {
        let mut clipboard = Clipboard::new().context(SystemInitSnafu {
            stage: "open-system-clipboard",
        })?;
        clipboard.set_text(text).context(SystemWriteSnafu {
            stage: "set-system-clipboard-text",
        })
    }
}

/// Tries `primary`, then `fallback`. Returns the name of the backend that took the text.
pub fn copy_with_fallback(
    primary: &mut dyn ClipboardBackend,
    fallback: &mut dyn ClipboardBackend,
    text: &str,
) -> ClipboardResult<&'static str> {
    match primary.write_text(text) {
        Ok(()) => Ok(primary.name()),
        Err(primary_error) => {
            tracing::warn!(
                backend = primary.name(),
                error = %primary_error,
                "primary clipboard failed, trying fallback"
            );
            match fallback.write_text(text) {
                Ok(()) => Ok(fallback.name()),
                Err(fallback_error) => {
                    tracing::error!(
                        backend = fallback.name(),
                        error = %fallback_error,
                        "fallback clipboard failed"
                    );
                    Err(fallback_error)
                }
            }
        }
    }
}

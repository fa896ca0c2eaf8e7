use gpui::{App, ClipboardItem};
use ingpt_core::{ClipboardBackend, ClipboardError, ClipboardResult};

/// The window system clipboard as exposed by GPUI.
pub struct GpuiClipboard<'a> {
    cx: &'a mut App,
}

impl<'a> GpuiClipboard<'a> {
    pub fn new(cx: &'a mut App) -> Self {
        Self { cx }
    }
}

impl ClipboardBackend for GpuiClipboard<'_> {
    fn name(&self) -> &'static str {
        "gpui"
    }

    fn write_text(&mut self, text: &str) -> ClipboardResult<()> {
        self.cx
            .write_to_clipboard(ClipboardItem::new_string(text.to_string()));

        // Read back to confirm the write landed.
        let written = self
            .cx
            .read_from_clipboard()
            .and_then(|item| item.text())
            .is_some_and(|current| current == text);

        if written {
            Ok(())
        } else {
            Err(ClipboardError::unavailable(
                "write_text",
                self.name(),
                "clipboard contents did not match after write",
            ))
        }
    }
}

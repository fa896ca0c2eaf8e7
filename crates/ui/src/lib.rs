#![deny(unsafe_code)]

/// InGPT desktop shell.
///
/// Chat state lives in `ingpt-core`; this crate renders it with GPUI and gpui-component.
pub mod app;
/// Sidebar, message list and input wired to the chat runtime.
pub mod chat;
pub mod clipboard;

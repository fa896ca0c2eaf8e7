use std::sync::Arc;

use gpui::*;
use gpui_component::Root;
use gpui_component::notification::NotificationList;

use ingpt::app::{
    ChatAppShell, NewChat, Quit, ReloadSettings, ToggleSidebar, ToggleTheme, apply_theme,
};
use ingpt_core::SettingsStore;

/// Application entry point.
///
/// Loads settings (file then environment), applies the stored theme, registers
/// shell shortcuts and opens the main window wrapped in a gpui-component `Root`.
fn main() {
    tracing_subscriber::fmt::init();

    let app = Application::new().with_assets(gpui_component_assets::Assets);

    app.run(|cx| {
        gpui_tokio_bridge::init(cx);

        // Required before any Root usage.
        gpui_component::init(cx);

        let settings_store = Arc::new(SettingsStore::load());
        apply_theme(settings_store.settings().theme_mode, None, cx);

        cx.on_action(|_: &Quit, cx| {
            cx.quit();
        });

        cx.bind_keys([
            KeyBinding::new("cmd-q", Quit, None),
            KeyBinding::new("cmd-n", NewChat, None),
            KeyBinding::new("cmd-b", ToggleSidebar, None),
            KeyBinding::new("cmd-shift-t", ToggleTheme, None),
            KeyBinding::new("cmd-r", ReloadSettings, None),
        ]);

        cx.spawn(async move |cx| {
            cx.update(|cx| {
                let options = WindowOptions {
                    window_bounds: Some(WindowBounds::Windowed(Bounds::centered(
                        None,
                        size(px(1200.), px(800.)),
                        cx,
                    ))),
                    titlebar: Some(TitlebarOptions {
                        appears_transparent: true,
                        traffic_light_position: Some(point(px(9.), px(9.))),
                        ..Default::default()
                    }),
                    #[cfg(any(target_os = "linux", target_os = "freebsd"))]
                    window_decorations: Some(WindowDecorations::Client),
                    #[cfg(not(any(target_os = "linux", target_os = "freebsd")))]
                    window_decorations: None,
                    ..Default::default()
                };

                let opened = cx.open_window(options, |window, cx| {
                    let notification_list = cx.new(|cx| NotificationList::new(window, cx));
                    let shell = cx.new(|cx| {
                        ChatAppShell::new(notification_list, settings_store.clone(), window, cx)
                    });

                    cx.new(|cx| Root::new(shell, window, cx))
                });

                match opened {
                    Ok(_) => cx.activate(true),
                    Err(error) => {
                        tracing::error!(%error, "failed to open main window");
                        cx.quit();
                    }
                }
            })
        })
        .detach();
    });
}

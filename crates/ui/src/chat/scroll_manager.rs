use gpui::{Pixels, ScrollHandle, point};
use ingpt_core::{ScrollCoordinator, ScrollDirective, ScrollOrigin, ViewportMetrics};

/// Small delta used to ignore floating-point scroll jitter.
const SCROLL_DELTA_EPSILON: f32 = 1.0;

/// Binds the message list's scroll handle to the follow-the-tail policy.
pub struct ScrollManager {
    scroll_handle: ScrollHandle,
    coordinator: ScrollCoordinator,
    user_scrolled: bool,
    last_scroll_top: f32,
}

impl ScrollManager {
    pub fn new() -> Self {
        Self {
            scroll_handle: ScrollHandle::new(),
            coordinator: ScrollCoordinator::new(),
            user_scrolled: false,
            last_scroll_top: 0.0,
        }
    }

    pub fn handle(&self) -> &ScrollHandle {
        &self.scroll_handle
    }

    pub fn generation_started(&mut self) {
        self.coordinator.on_generation_started();
    }

    pub fn chat_switched(&mut self) {
        self.coordinator.on_chat_switched();
    }

    /// Marks that the next layout pass follows a wheel or drag from the user.
    pub fn mark_user_scroll(&mut self) {
        self.user_scrolled = true;
    }

    pub fn update_follow_state(&mut self) {
        let metrics = self.metrics();

        if self.user_scrolled && moved_beyond_jitter(self.last_scroll_top, metrics.scroll_top) {
            self.coordinator.observe_scroll(ScrollOrigin::User, metrics);
        }

        self.user_scrolled = false;
        self.last_scroll_top = metrics.scroll_top;
    }

    /// Pins to the tail when following or when a pin was forced. Runs after
    /// `update_follow_state` in the same frame.
    pub fn apply_pending_scroll(&mut self) -> bool {
        if self.coordinator.take_directive() == ScrollDirective::Stay {
            return false;
        }

        // GPUI uses negative Y offsets for scrolling down.
        let max_offset = self.scroll_handle.max_offset().height;
        let current_x = self.scroll_handle.offset().x;
        let target_y = if max_offset > Pixels::ZERO {
            -max_offset
        } else {
            Pixels::ZERO
        };
        self.scroll_handle.set_offset(point(current_x, target_y));

        let metrics = ViewportMetrics::new(f32::from(max_offset).max(0.0), f32::from(max_offset));
        self.coordinator
            .observe_scroll(ScrollOrigin::Programmatic, metrics);
        self.last_scroll_top = metrics.scroll_top;
        true
    }

    fn metrics(&self) -> ViewportMetrics {
        let scroll_top = -f32::from(self.scroll_handle.offset().y);
        let max_scroll_top = f32::from(self.scroll_handle.max_offset().height);
        ViewportMetrics::new(scroll_top.max(0.0), max_scroll_top.max(0.0))
    }
}

impl Default for ScrollManager {
    fn default() -> Self {
        Self::new()
    }
}

fn moved_beyond_jitter(last_scroll_top: f32, scroll_top: f32) -> bool {
    (scroll_top - last_scroll_top).abs() > SCROLL_DELTA_EPSILON
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sub_pixel_jitter_is_not_a_user_scroll() {
        assert!(!moved_beyond_jitter(400.0, 400.6));
        assert!(!moved_beyond_jitter(400.0, 399.2));
        assert!(moved_beyond_jitter(400.0, 380.0));
    }

    #[test]
    fn render_order_lets_a_scroll_away_cancel_the_pin() {
        let mut coordinator = ScrollCoordinator::new();

        // update_follow_state observes the wheel, then apply_pending_scroll decides.
        coordinator.observe_scroll(ScrollOrigin::User, ViewportMetrics::new(120.0, 900.0));
        assert_eq!(coordinator.take_directive(), ScrollDirective::Stay);

        coordinator.on_chat_switched();
        assert_eq!(coordinator.take_directive(), ScrollDirective::PinToBottom);
    }
}

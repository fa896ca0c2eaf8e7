/// Distance from the tail, in pixels, that still counts as "at the bottom".
pub const AUTO_FOLLOW_THRESHOLD: f32 = 10.0;

/// Who moved the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollOrigin {
    User,
    Programmatic,
}

/// Viewport position in positive pixels measured from the top of the list.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ViewportMetrics {
    pub scroll_top: f32,
    pub max_scroll_top: f32,
}

impl ViewportMetrics {
    pub const fn new(scroll_top: f32, max_scroll_top: f32) -> Self {
        Self {
            scroll_top,
            max_scroll_top,
        }
    }

    pub fn distance_from_bottom(&self) -> f32 {
        (self.max_scroll_top - self.scroll_top).max(0.0)
    }

    pub fn is_near_bottom(&self, threshold: f32) -> bool {
        self.max_scroll_top <= 0.0 || self.distance_from_bottom() <= threshold
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirective {
    PinToBottom,
    Stay,
}

/// Tracks whether the message list should keep following new content.
#[derive(Debug, Clone)]
pub struct ScrollCoordinator {
    auto_follow: bool,
    pending_pin: bool,
    threshold: f32,
}

impl ScrollCoordinator {
    pub fn new() -> Self {
        Self::with_threshold(AUTO_FOLLOW_THRESHOLD)
    }

    pub fn with_threshold(threshold: f32) -> Self {
        Self {
            auto_follow: true,
            pending_pin: false,
            threshold,
        }
    }

    pub fn is_following(&self) -> bool {
        self.auto_follow
    }

    pub fn on_generation_started(&mut self) {
        self.auto_follow = true;
        self.pending_pin = true;
    }

    /// Switching threads always lands on the newest message.
    pub fn on_chat_switched(&mut self) {
        self.auto_follow = true;
        self.pending_pin = true;
    }

    /// Programmatic moves never pause following; user moves toggle it by position.
    pub fn observe_scroll(&mut self, origin: ScrollOrigin, metrics: ViewportMetrics) {
        if origin == ScrollOrigin::Programmatic {
            return;
        }

        let at_bottom = metrics.is_near_bottom(self.threshold);
        if self.auto_follow != at_bottom {
            tracing::trace!(
                follow = at_bottom,
                distance = metrics.distance_from_bottom(),
                "auto-follow changed by user scroll"
            );
        }
        self.auto_follow = at_bottom;
    }

    /// Decides the frame's scroll. Must run after the frame's user scroll is observed.
    pub fn take_directive(&mut self) -> ScrollDirective {
        let pin = self.auto_follow || self.pending_pin;
        self.pending_pin = false;

        if pin {
            ScrollDirective::PinToBottom
        } else {
            ScrollDirective::Stay
        }
    }
}

impl Default for ScrollCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn follows_by_default() {
        let mut scroll = ScrollCoordinator::new();
        assert!(scroll.is_following());
        assert_eq!(scroll.take_directive(), ScrollDirective::PinToBottom);
    }

    #[test]
    fn user_scrolling_up_pauses_and_returning_resumes() {
        let mut scroll = ScrollCoordinator::new();

        scroll.observe_scroll(ScrollOrigin::User, ViewportMetrics::new(200.0, 800.0));
        assert!(!scroll.is_following());
        assert_eq!(scroll.take_directive(), ScrollDirective::Stay);

        scroll.observe_scroll(ScrollOrigin::User, ViewportMetrics::new(795.0, 800.0));
        assert!(scroll.is_following());
        assert_eq!(scroll.take_directive(), ScrollDirective::PinToBottom);
    }

    #[test]
    fn programmatic_scroll_never_pauses() {
        let mut scroll = ScrollCoordinator::new();
        scroll.observe_scroll(
            ScrollOrigin::Programmatic,
            ViewportMetrics::new(0.0, 800.0),
        );
        assert!(scroll.is_following());
    }

    #[test]
    fn new_generation_and_chat_switch_force_a_pin() {
        let mut scroll = ScrollCoordinator::new();
        scroll.observe_scroll(ScrollOrigin::User, ViewportMetrics::new(0.0, 800.0));

        scroll.on_generation_started();
        assert!(scroll.is_following());

        scroll.observe_scroll(ScrollOrigin::User, ViewportMetrics::new(0.0, 800.0));
        scroll.on_chat_switched();
        assert_eq!(scroll.take_directive(), ScrollDirective::PinToBottom);
    }

    #[test]
    fn scroll_away_after_a_content_change_is_honoured() {
        let mut scroll = ScrollCoordinator::new();

        // Content changed while following; the user scrolls up before the frame.
        scroll.observe_scroll(ScrollOrigin::User, ViewportMetrics::new(300.0, 800.0));
        assert_eq!(scroll.take_directive(), ScrollDirective::Stay);
        assert_eq!(scroll.take_directive(), ScrollDirective::Stay);
    }

    #[test]
    fn forced_pin_survives_a_scroll_away_once() {
        let mut scroll = ScrollCoordinator::new();

        scroll.on_generation_started();
        scroll.observe_scroll(ScrollOrigin::User, ViewportMetrics::new(0.0, 800.0));
        assert!(!scroll.is_following());
        assert_eq!(scroll.take_directive(), ScrollDirective::PinToBottom);
        assert_eq!(scroll.take_directive(), ScrollDirective::Stay);
    }

    #[test]
    fn short_lists_count_as_bottom() {
        assert!(ViewportMetrics::new(0.0, 0.0).is_near_bottom(AUTO_FOLLOW_THRESHOLD));
        assert!(!ViewportMetrics::new(0.0, 11.0).is_near_bottom(AUTO_FOLLOW_THRESHOLD));
    }
}

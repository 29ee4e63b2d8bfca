use serde::Serialize;

use crate::panel::{ContentInputs, ContentType, SheetHeight};

/// Tabs of the panel when no domain content is forced on it
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PanelTab {
    #[default]
    Explore,
    Journal,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PanelState {
    pub sheet_height: SheetHeight,
    pub content_type: ContentType,
    /// The user chose the current height; automatic sizing stays out of the way
    pub manual_override: bool,
    pub active_tab: PanelTab,
}

impl PanelState {
    pub fn is_open(&self) -> bool {
        self.content_type.is_open()
    }
}

/// Follow-up required by [`DisclosureArbitrator::close_content`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CloseAction {
    /// The panel collapsed; its data stays
    Collapse,
    /// The place selection must be cleared by its owner
    ClearPlace,
    /// The active tab moved back to exploring; annotations stay
    SwitchTab,
}

/// Scroll or wheel intent, independent of the input device
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScrollDirection {
    /// Upward swipe or wheel: reveal more panel
    Expand,
    /// Downward swipe or wheel: reveal more map
    Collapse,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScrollOutcome {
    /// The panel changed height; the content must not scroll
    Consumed(SheetHeight),
    /// The content scrolls normally
    Delivered,
}

#[derive(Clone, Copy, Debug)]
struct Drag {
    start_y: f64,
    from: SheetHeight,
}

/// Sole writer of [`PanelState`]
#[derive(Debug)]
pub struct DisclosureArbitrator {
    state: PanelState,
    drag_threshold_px: f64,
    drag: Option<Drag>,
}

impl DisclosureArbitrator {
    pub fn new(drag_threshold_px: f64) -> Self {
        Self {
            state: PanelState::default(),
            drag_threshold_px,
            drag: None,
        }
    }

    pub fn state(&self) -> PanelState {
        self.state
    }

    /// Re-derives the content type from the domain stores and applies the
    /// automatic height rules. Returns the new content type.
    pub fn recompute(&mut self, inputs: &ContentInputs) -> ContentType {
        let previous = self.state.content_type;
        let next = ContentType::derive(inputs);
        if next == previous {
            return next;
        }

        self.state.content_type = next;

        if next == ContentType::None {
            self.state.sheet_height = SheetHeight::Peek;
            self.state.manual_override = false;
            return next;
        }

        if next == ContentType::Annotations {
            self.state.active_tab = PanelTab::Journal;
        }

        if !self.state.manual_override && !previous.is_same_context(next) {
            self.state.sheet_height = next.initial_height();
            self.state.manual_override = false;
        }

        tracing::debug!(
            from = previous.as_str(),
            to = next.as_str(),
            height = ?self.state.sheet_height,
            "Panel content changed"
        );
        next
    }

    /// Caller-initiated height change; disables automatic sizing
    pub fn set_height(&mut self, height: SheetHeight) {
        self.state.sheet_height = height;
        self.state.manual_override = true;
    }

    pub fn set_active_tab(&mut self, tab: PanelTab) {
        self.state.active_tab = tab;
    }

    // ---- Drag ----

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn begin_drag(&mut self, y: f64) {
        self.drag = Some(Drag {
            start_y: y,
            from: self.state.sheet_height,
        });
    }

    /// Live translation of the panel in pixels, positive downwards
    pub fn drag_to(&self, y: f64) -> f64 {
        match self.drag {
            Some(drag) if y.is_finite() => y - drag.start_y,
            _ => 0.0,
        }
    }

    /// Settles the drag on a height: one step per gesture past the threshold,
    /// otherwise back where it started
    pub fn end_drag(&mut self, y: f64) -> SheetHeight {
        let Some(drag) = self.drag.take() else {
            return self.state.sheet_height;
        };

        let delta = if y.is_finite() { y - drag.start_y } else { 0.0 };
        if delta > self.drag_threshold_px {
            self.set_height(drag.from.step_down());
        } else if delta < -self.drag_threshold_px {
            self.set_height(drag.from.step_up());
        } else {
            self.state.sheet_height = drag.from;
        }

        self.state.sheet_height
    }

    // ---- Scroll ----

    pub fn scroll(&mut self, direction: ScrollDirection, content_at_top: bool) -> ScrollOutcome {
        let height = self.state.sheet_height;
        match direction {
            ScrollDirection::Expand if height != SheetHeight::Full => {
                self.set_height(height.step_up());
                ScrollOutcome::Consumed(self.state.sheet_height)
            }
            ScrollDirection::Collapse if height == SheetHeight::Full && content_at_top => {
                self.set_height(SheetHeight::Half);
                ScrollOutcome::Consumed(SheetHeight::Half)
            }
            _ => ScrollOutcome::Delivered,
        }
    }

    // ---- Closing ----

    /// Closes whatever currently owns the panel. Returns `None` when closed already.
    pub fn close_content(&mut self) -> Option<CloseAction> {
        match self.state.content_type {
            ContentType::None => None,
            ContentType::Route | ContentType::NearbyRoutes => {
                self.state.sheet_height = SheetHeight::Peek;
                Some(CloseAction::Collapse)
            }
            ContentType::GeoInfo => Some(CloseAction::ClearPlace),
            ContentType::Annotations => {
                self.state.active_tab = PanelTab::Explore;
                Some(CloseAction::SwitchTab)
            }
        }
    }

    /// Height back to peek with automatic sizing restored. Domain stores are
    /// cleared by the caller, followed by a [`recompute`](Self::recompute).
    pub fn reset(&mut self) {
        self.drag = None;
        self.state.sheet_height = SheetHeight::Peek;
        self.state.manual_override = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROUTE: ContentInputs = ContentInputs {
        has_selected_route: true,
        has_nearby: true,
        has_selected_place: false,
        has_annotations: false,
    };
    const NEARBY: ContentInputs = ContentInputs {
        has_selected_route: false,
        has_nearby: true,
        has_selected_place: false,
        has_annotations: false,
    };
    const PLACE: ContentInputs = ContentInputs {
        has_selected_route: false,
        has_nearby: false,
        has_selected_place: true,
        has_annotations: false,
    };
    const ANNOTATIONS: ContentInputs = ContentInputs {
        has_selected_route: false,
        has_nearby: false,
        has_selected_place: false,
        has_annotations: true,
    };

    fn arbitrator() -> DisclosureArbitrator {
        DisclosureArbitrator::new(80.0)
    }

    #[test]
    fn test_new_content_opens_at_initial_height() {
        let mut panel = arbitrator();

        assert_eq!(panel.recompute(&PLACE), ContentType::GeoInfo);
        assert_eq!(panel.state().sheet_height, SheetHeight::Peek);

        assert_eq!(panel.recompute(&NEARBY), ContentType::NearbyRoutes);
        assert_eq!(panel.state().sheet_height, SheetHeight::Half);
        assert!(panel.state().is_open());
    }

    #[test]
    fn test_same_context_swap_keeps_height_and_override() {
        let mut panel = arbitrator();
        panel.recompute(&NEARBY);
        panel.set_height(SheetHeight::Full);

        panel.recompute(&ROUTE);
        assert_eq!(panel.state().sheet_height, SheetHeight::Full);
        assert!(panel.state().manual_override);

        panel.recompute(&NEARBY);
        assert_eq!(panel.state().sheet_height, SheetHeight::Full);
        assert!(panel.state().manual_override);
    }

    #[test]
    fn test_same_context_swap_without_override() {
        let mut panel = arbitrator();
        panel.recompute(&NEARBY);
        panel.begin_drag(500.0);
        panel.end_drag(520.0);
        assert!(!panel.state().manual_override);

        panel.recompute(&ROUTE);
        assert_eq!(panel.state().sheet_height, SheetHeight::Half);
        assert!(!panel.state().manual_override);
    }

    #[test]
    fn test_manual_override_survives_content_change() {
        let mut panel = arbitrator();
        panel.recompute(&PLACE);
        panel.set_height(SheetHeight::Full);

        panel.recompute(&ANNOTATIONS);
        assert_eq!(panel.state().sheet_height, SheetHeight::Full);
        assert_eq!(panel.state().active_tab, PanelTab::Journal);
    }

    #[test]
    fn test_closing_to_none_resets_height_and_override() {
        let mut panel = arbitrator();
        panel.recompute(&ROUTE);
        panel.set_height(SheetHeight::Full);

        assert_eq!(panel.recompute(&ContentInputs::default()), ContentType::None);
        assert_eq!(panel.state().sheet_height, SheetHeight::Peek);
        assert!(!panel.state().manual_override);
        assert!(!panel.state().is_open());
    }

    #[test]
    fn test_drag_past_threshold_steps_down() {
        let mut panel = arbitrator();
        panel.recompute(&NEARBY);

        panel.begin_drag(400.0);
        assert_eq!(panel.drag_to(450.0), 50.0);
        assert_eq!(panel.end_drag(500.0), SheetHeight::Peek);
        assert!(panel.state().manual_override);
        assert!(!panel.is_dragging());
    }

    #[test]
    fn test_short_drag_reverts() {
        let mut panel = arbitrator();
        panel.recompute(&NEARBY);

        panel.begin_drag(400.0);
        assert_eq!(panel.end_drag(450.0), SheetHeight::Half);
        assert!(!panel.state().manual_override);
    }

    #[test]
    fn test_upward_drag_steps_one_level() {
        let mut panel = arbitrator();
        panel.recompute(&PLACE);

        panel.begin_drag(700.0);
        assert_eq!(panel.end_drag(300.0), SheetHeight::Half);
    }

    #[test]
    fn test_scroll_expands_until_full() {
        let mut panel = arbitrator();
        panel.recompute(&PLACE);

        assert_eq!(
            panel.scroll(ScrollDirection::Expand, true),
            ScrollOutcome::Consumed(SheetHeight::Half)
        );
        assert_eq!(
            panel.scroll(ScrollDirection::Expand, false),
            ScrollOutcome::Consumed(SheetHeight::Full)
        );
        assert_eq!(panel.scroll(ScrollDirection::Expand, true), ScrollOutcome::Delivered);
    }

    #[test]
    fn test_scroll_collapses_only_at_top() {
        let mut panel = arbitrator();
        panel.recompute(&NEARBY);
        panel.set_height(SheetHeight::Full);

        assert_eq!(panel.scroll(ScrollDirection::Collapse, false), ScrollOutcome::Delivered);
        assert_eq!(
            panel.scroll(ScrollDirection::Collapse, true),
            ScrollOutcome::Consumed(SheetHeight::Half)
        );
        assert_eq!(panel.scroll(ScrollDirection::Collapse, true), ScrollOutcome::Delivered);
    }

    #[test]
    fn test_close_content_per_type() {
        let mut panel = arbitrator();
        assert_eq!(panel.close_content(), None);

        panel.recompute(&ROUTE);
        assert_eq!(panel.close_content(), Some(CloseAction::Collapse));
        assert_eq!(panel.state().sheet_height, SheetHeight::Peek);
        assert_eq!(panel.state().content_type, ContentType::Route);

        panel.recompute(&PLACE);
        assert_eq!(panel.close_content(), Some(CloseAction::ClearPlace));

        panel.recompute(&ANNOTATIONS);
        assert_eq!(panel.close_content(), Some(CloseAction::SwitchTab));
        assert_eq!(panel.state().active_tab, PanelTab::Explore);
    }
}

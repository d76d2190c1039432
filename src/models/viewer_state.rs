// Zoom and pinch-gesture state for the viewer window.
//
// Kept apart from any widget handles so the window code only translates
// toolkit events into these calls and applies the returned values back to
// the widget tree. Everything here is testable without GTK.

/// Zoom percentage floor, shared by the gesture and keyboard paths.
pub const MIN_ZOOM: f64 = 1.0;
/// Zoom percentage at which a page is shown at its natural size.
const DEFAULT_ZOOM: f64 = 100.0;

/// Pinch-gesture phase. The transient start values only exist while a
/// gesture is active, so inconsistent partial state is unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureState {
    Idle,
    Active {
        start_zoom: f64,
        start_offset: (f64, f64),
        fixed_point: (f64, f64),
    },
}

#[derive(Debug)]
pub struct ViewerState {
    zoom: f64,
    gesture: GestureState,
}

impl ViewerState {
    pub fn new() -> Self {
        Self {
            zoom: DEFAULT_ZOOM,
            gesture: GestureState::Idle,
        }
    }

    /// Current zoom percentage.
    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Uniform draw scale applied to the page's natural size.
    pub fn scale_factor(&self) -> f64 {
        self.zoom / 100.0
    }

    pub fn reset_zoom(&mut self) {
        self.zoom = DEFAULT_ZOOM;
    }

    pub fn gesture_active(&self) -> bool {
        matches!(self.gesture, GestureState::Active { .. })
    }

    /// Starts a pinch gesture around `fixed_point` (screen space) with the
    /// scroll position `start_offset`. No visual change yet.
    pub fn begin_gesture(&mut self, fixed_point: (f64, f64), start_offset: (f64, f64)) {
        self.gesture = GestureState::Active {
            start_zoom: self.zoom,
            start_offset,
            fixed_point,
        };
    }

    /// Applies a pinch scale factor relative to the gesture start and
    /// returns the scroll offsets that keep the fixed point stationary on
    /// screen, or `None` when no gesture is active.
    pub fn apply_gesture_scale(&mut self, factor: f64) -> Option<(f64, f64)> {
        let GestureState::Active {
            start_zoom,
            start_offset,
            fixed_point,
        } = self.gesture
        else {
            return None;
        };

        self.zoom = (factor * start_zoom).max(MIN_ZOOM);
        let ratio = self.zoom / start_zoom;
        let offset_x = (fixed_point.0 + start_offset.0) * ratio - fixed_point.0;
        let offset_y = (fixed_point.1 + start_offset.1) * ratio - fixed_point.1;
        Some((offset_x, offset_y))
    }

    /// Finishes the gesture; the last applied zoom is retained.
    pub fn end_gesture(&mut self) {
        self.gesture = GestureState::Idle;
    }

    /// Aborts the gesture and reverts any in-progress scaling, so the whole
    /// gesture is a no-op on zoom.
    pub fn cancel_gesture(&mut self) {
        if let GestureState::Active { start_zoom, .. } = self.gesture {
            self.zoom = start_zoom;
        }
        self.gesture = GestureState::Idle;
    }

    /// Keyboard zoom path, in percentage points. Clamped to the same floor
    /// as the gesture path.
    pub fn adjust_zoom(&mut self, delta: f64) {
        self.zoom = (self.zoom + delta).max(MIN_ZOOM);
    }
}

impl Default for ViewerState {
    fn default() -> Self {
        Self::new()
    }
}

/// Wraps a page index after a relative navigation step: stepping past the
/// last page lands on the first and vice versa.
pub fn wrap_index(current: usize, delta: isize, len: usize) -> usize {
    assert!(len > 0, "page list must not be empty");
    (current as isize + delta).rem_euclid(len as isize) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn navigation_wraps_in_both_directions() {
        assert_eq!(wrap_index(3, 1, 4), 0);
        assert_eq!(wrap_index(0, -1, 4), 3);
        assert_eq!(wrap_index(1, 1, 4), 2);
        assert_eq!(wrap_index(2, -1, 4), 1);
    }

    #[test]
    fn single_page_always_wraps_to_itself() {
        assert_eq!(wrap_index(0, 1, 1), 0);
        assert_eq!(wrap_index(0, -1, 1), 0);
    }

    #[test]
    #[should_panic(expected = "page list must not be empty")]
    fn empty_page_list_is_a_precondition_violation() {
        wrap_index(0, 1, 0);
    }

    #[test]
    fn gesture_scale_keeps_fixed_point_stationary() {
        let mut state = ViewerState::new();
        state.begin_gesture((30.0, 40.0), (10.0, 20.0));

        let (ox, oy) = state.apply_gesture_scale(2.0).unwrap();
        // new_offset = (fixed + start_offset) * (zoom / start_zoom) - fixed
        assert!((ox - ((30.0 + 10.0) * 2.0 - 30.0)).abs() < 1e-9);
        assert!((oy - ((40.0 + 20.0) * 2.0 - 40.0)).abs() < 1e-9);
        assert!((state.zoom() - 200.0).abs() < 1e-9);
    }

    #[test]
    fn gesture_cancel_round_trips_zoom() {
        let mut state = ViewerState::new();
        state.adjust_zoom(37.0);
        let before = state.zoom();

        state.begin_gesture((5.0, 5.0), (0.0, 0.0));
        state.apply_gesture_scale(3.5);
        state.cancel_gesture();

        assert_eq!(state.zoom(), before);
        assert!(!state.gesture_active());
    }

    #[test]
    fn gesture_end_retains_the_scaled_zoom() {
        let mut state = ViewerState::new();
        state.begin_gesture((0.0, 0.0), (0.0, 0.0));
        state.apply_gesture_scale(0.5);
        state.end_gesture();

        assert!((state.zoom() - 50.0).abs() < 1e-9);
        assert!(!state.gesture_active());
    }

    #[test]
    fn gesture_zoom_clamps_to_floor() {
        let mut state = ViewerState::new();
        state.begin_gesture((0.0, 0.0), (0.0, 0.0));
        state.apply_gesture_scale(0.001);
        assert_eq!(state.zoom(), MIN_ZOOM);
    }

    #[test]
    fn scale_outside_a_gesture_is_ignored() {
        let mut state = ViewerState::new();
        assert_eq!(state.apply_gesture_scale(2.0), None);
        assert_eq!(state.zoom(), 100.0);
    }

    #[test]
    fn keyboard_zoom_shares_the_gesture_floor() {
        let mut state = ViewerState::new();
        state.adjust_zoom(-99.0);
        assert_eq!(state.zoom(), MIN_ZOOM);
        state.adjust_zoom(-1.0);
        assert_eq!(state.zoom(), MIN_ZOOM);
        state.adjust_zoom(1.0);
        assert_eq!(state.zoom(), MIN_ZOOM + 1.0);
    }

    #[test]
    fn scale_factor_tracks_zoom_percentage() {
        let mut state = ViewerState::new();
        assert!((state.scale_factor() - 1.0).abs() < 1e-9);
        state.adjust_zoom(-50.0);
        assert!((state.scale_factor() - 0.5).abs() < 1e-9);
    }
}

//! Transport display helpers: time formatting, progress math, and the
//! seek-bar layout/hit-testing used by the pointer handler.

/// Format a duration in seconds as `M:SS`.
///
/// Non-finite or negative input (e.g. duration before a track is loaded)
/// renders as the placeholder `0:00` instead of propagating NaN.
pub fn format_time(seconds: f32) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "0:00".to_string();
    }
    let total = seconds as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

/// Fraction of the track already played, hardened against zero, negative,
/// or non-finite durations. Always in [0, 1].
pub fn progress_fraction(position: f32, duration: f32) -> f32 {
    if !duration.is_finite() || duration <= 0.0 || !position.is_finite() {
        return 0.0;
    }
    (position / duration).clamp(0.0, 1.0)
}

/// Pixel layout of the horizontal seek bar, anchored to the bottom edge of
/// the viewport.
#[derive(Debug, Clone)]
pub struct ProgressBar {
    /// Horizontal inset from both window edges (pixels)
    pub margin: f32,

    /// Bar thickness (pixels)
    pub height: f32,

    /// Distance from the window bottom to the bar top (pixels)
    pub bottom_offset: f32,

    /// Extra vertical slop accepted around the bar when hit-testing clicks
    pub hit_slop: f32,
}

impl Default for ProgressBar {
    fn default() -> Self {
        Self {
            margin: 24.0,
            height: 6.0,
            bottom_offset: 28.0,
            hit_slop: 8.0,
        }
    }
}

impl ProgressBar {
    /// Bar rectangle as `(x, y, width, height)` for the given viewport.
    pub fn rect(&self, viewport_width: f32, viewport_height: f32) -> (f32, f32, f32, f32) {
        let width = (viewport_width - 2.0 * self.margin).max(0.0);
        (
            self.margin,
            viewport_height - self.bottom_offset,
            width,
            self.height,
        )
    }

    /// Whether a pointer position should count as a click on the bar.
    pub fn contains(&self, x: f32, y: f32, viewport_width: f32, viewport_height: f32) -> bool {
        let (bx, by, bw, bh) = self.rect(viewport_width, viewport_height);
        x >= bx && x <= bx + bw && y >= by - self.hit_slop && y <= by + bh + self.hit_slop
    }

    /// Map a click X coordinate to a track fraction in [0, 1].
    pub fn fraction_at(&self, x: f32, viewport_width: f32) -> f32 {
        let (bx, _, bw, _) = self.rect(viewport_width, 0.0);
        if bw <= 0.0 {
            return 0.0;
        }
        ((x - bx) / bw).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_time_basic() {
        assert_eq!(format_time(65.0), "1:05");
        assert_eq!(format_time(0.0), "0:00");
        assert_eq!(format_time(59.9), "0:59");
        assert_eq!(format_time(600.0), "10:00");
    }

    #[test]
    fn test_format_time_degenerate_inputs() {
        assert_eq!(format_time(f32::NAN), "0:00");
        assert_eq!(format_time(f32::INFINITY), "0:00");
        assert_eq!(format_time(f32::NEG_INFINITY), "0:00");
        assert_eq!(format_time(-3.0), "0:00");
    }

    #[test]
    fn test_progress_fraction_guards() {
        assert_eq!(progress_fraction(10.0, 0.0), 0.0);
        assert_eq!(progress_fraction(10.0, f32::NAN), 0.0);
        assert_eq!(progress_fraction(f32::NAN, 100.0), 0.0);
        assert_eq!(progress_fraction(50.0, 100.0), 0.5);
        // Position past the end clamps rather than overflowing the bar.
        assert_eq!(progress_fraction(150.0, 100.0), 1.0);
    }

    #[test]
    fn test_midpoint_click_maps_to_half() {
        let bar = ProgressBar::default();
        let viewport_width = 1280.0;
        let (bx, _, bw, _) = bar.rect(viewport_width, 720.0);

        let fraction = bar.fraction_at(bx + bw / 2.0, viewport_width);
        assert!((fraction - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_click_fraction_clamps_outside_bar() {
        let bar = ProgressBar::default();
        assert_eq!(bar.fraction_at(0.0, 1280.0), 0.0);
        assert_eq!(bar.fraction_at(1280.0, 1280.0), 1.0);
    }

    #[test]
    fn test_hit_test_respects_slop() {
        let bar = ProgressBar::default();
        let (bx, by, bw, bh) = bar.rect(1280.0, 720.0);

        assert!(bar.contains(bx + bw / 2.0, by + bh / 2.0, 1280.0, 720.0));
        assert!(bar.contains(bx, by - bar.hit_slop, 1280.0, 720.0));
        assert!(!bar.contains(bx + bw / 2.0, by - bar.hit_slop - 1.0, 1280.0, 720.0));
        assert!(!bar.contains(bx - 1.0, by, 1280.0, 720.0));
    }
}

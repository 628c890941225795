/// Geometry of the materialization window, in source units (pixels for a
/// scroll container).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    /// Current boundary position (scroll offset).
    pub position: u64,
    /// Size of the visible window.
    pub height: u64,
    /// Known total extent of the content.
    pub extent: u64,
}

impl Viewport {
    pub fn new(position: u64, height: u64, extent: u64) -> Self {
        Self {
            position,
            height,
            extent,
        }
    }

    /// Furthest position the boundary can reach.
    pub fn max_position(&self) -> u64 {
        self.extent.saturating_sub(self.height)
    }

    pub fn at_end(&self, tolerance: u64) -> bool {
        self.position.saturating_add(tolerance) >= self.max_position()
    }

    /// Advance by `fraction` of the window height, capped at the maximum position.
    pub fn step(&self, fraction: f64) -> u64 {
        let raw = (self.height as f64 * fraction).round().max(1.0) as u64;
        raw.min(self.max_position().saturating_sub(self.position))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_is_a_fraction_of_the_window() {
        let viewport = Viewport::new(0, 1000, 10_000);
        assert_eq!(viewport.step(0.85), 850);
    }

    #[test]
    fn step_is_capped_at_the_extent() {
        let viewport = Viewport::new(8_900, 1000, 10_000);
        assert_eq!(viewport.step(0.85), 100);
        assert!(!viewport.at_end(2));

        let end = Viewport::new(9_000, 1000, 10_000);
        assert_eq!(end.step(0.85), 0);
        assert!(end.at_end(0));
    }

    #[test]
    fn tolerance_absorbs_subpixel_rounding() {
        let viewport = Viewport::new(8_999, 1000, 10_000);
        assert!(!viewport.at_end(0));
        assert!(viewport.at_end(2));
    }
}

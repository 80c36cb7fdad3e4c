// src/sizer.rs

//! Derives grid dimensions from the surface size and the current pixel
//! size, forcing both axes to even cell counts.
//!
//! Even parity is required downstream: glider stamps are symmetric 3x3
//! edits and the original layout keeps even spacing for them. The surface
//! size is read at call time by the caller and passed in, never cached
//! here.

use log::{debug, trace};

use crate::engine::GridSize;
use crate::params::Observable;

pub struct ViewportSizer {
    /// Width of the gap between adjacent cells, in surface pixels.
    border: u16,
}

impl ViewportSizer {
    pub fn new(border: u16) -> Self {
        ViewportSizer { border }
    }

    /// Computes `(rows, cols)` for a surface of `width_px` x `height_px`,
    /// flooring each axis to the nearest even count:
    /// `2 * floor(extent / (pixel_size + border) / 2)`.
    pub fn grid_dimensions(&self, width_px: u32, height_px: u32, pixel_size: u16) -> GridSize {
        let stride = (pixel_size as u32 + self.border as u32).max(1);
        let cols = 2 * (width_px / stride / 2);
        let rows = 2 * (height_px / stride / 2);
        trace!(
            "sizer: {}x{} px at stride {} -> {} rows x {} cols",
            width_px,
            height_px,
            stride,
            rows,
            cols
        );
        GridSize::new(rows.min(u16::MAX as u32) as u16, cols.min(u16::MAX as u32) as u16)
    }

    /// Recomputes dimensions and writes them into the dimensions parameter
    /// only if the value actually changed. The suppression avoids needless
    /// engine rebuilds when a resize nets out to the same cell count.
    ///
    /// Returns `true` if the parameter was written.
    pub fn apply(
        &self,
        width_px: u32,
        height_px: u32,
        pixel_size: u16,
        dimensions: &Observable<GridSize>,
    ) -> bool {
        let next = self.grid_dimensions(width_px, height_px, pixel_size);
        let current = dimensions.get();
        if next == current {
            trace!("sizer: dimensions unchanged at {:?}, write suppressed", current);
            return false;
        }
        debug!("sizer: dimensions {:?} -> {:?}", current, next);
        dimensions.set(next);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn dimensions_are_always_even() {
        let sizer = ViewportSizer::new(1);
        for width in [0u32, 1, 7, 80, 81, 199, 640] {
            for height in [0u32, 1, 23, 24, 57, 480] {
                for pixel_size in [1u16, 2, 3, 5] {
                    let size = sizer.grid_dimensions(width, height, pixel_size);
                    assert_eq!(size.rows % 2, 0, "rows odd for {}x{}@{}", width, height, pixel_size);
                    assert_eq!(size.cols % 2, 0, "cols odd for {}x{}@{}", width, height, pixel_size);
                }
            }
        }
    }

    #[test]
    fn matches_the_floor_to_even_formula() {
        let sizer = ViewportSizer::new(1);
        // 80 px wide at pixel size 3 => stride 4 => floor(80/4/2)*2 = 20.
        let size = sizer.grid_dimensions(80, 46, 3);
        assert_eq!(size.cols, 20);
        assert_eq!(size.rows, 10);
    }

    #[test]
    fn tiny_surfaces_collapse_to_zero() {
        let sizer = ViewportSizer::new(1);
        let size = sizer.grid_dimensions(3, 3, 3);
        assert_eq!(size, GridSize::new(0, 0));
    }

    #[test]
    fn extreme_pixel_sizes_collapse_without_wrapping() {
        let sizer = ViewportSizer::new(u16::MAX);
        assert_eq!(sizer.grid_dimensions(640, 480, u16::MAX), GridSize::new(0, 0));
    }

    #[test]
    fn apply_suppresses_redundant_writes() {
        let sizer = ViewportSizer::new(1);
        let dimensions = Observable::new("dimensions", GridSize::default());
        assert!(sizer.apply(80, 46, 3, &dimensions));
        // A resize that nets out to the same cell count must not notify.
        assert!(!sizer.apply(81, 47, 3, &dimensions));
        assert_eq!(dimensions.get(), GridSize::new(10, 20));
    }
}

//! Window/viewport/global-scale coordinate transform.
//!
//! Map mode is recorded but not applied beyond providing the window/viewport extents; no
//! map-mode-specific axis flipping happens here, matching the source this crate is based on.

use crate::header::Placeable;

/// Virtual canvas extent (in metafile units) used for both axes when no placeable header is
/// present.
const DEFAULT_EXTENT: f64 = 1000.0;

/// Composes map-mode window/viewport origins and extents with a global scaling factor into X and
/// Y coordinate transforms.
#[derive(Debug, Clone, Copy)]
pub struct CoordinateEngine {
    pub window_org: (i32, i32),
    pub window_ext: (i32, i32),
    pub viewport_org: (i32, i32),
    pub viewport_ext: (i32, i32),
    pub map_mode: u16,
    pub scaling: f64,
}

impl CoordinateEngine {
    #[must_use]
    pub fn new(scaling: f64) -> Self {
        Self {
            window_org: (0, 0),
            window_ext: (1, 1),
            viewport_org: (0, 0),
            viewport_ext: (1, 1),
            map_mode: 1,
            scaling,
        }
    }

    /// Maps a signed device X coordinate through the window/viewport transform, then the global
    /// scale. Falls back to a bare scaled value when the window extent is zero, guarding the
    /// division.
    #[must_use]
    pub fn scale_x(&self, x: i16) -> f64 {
        let x = f64::from(x);
        if self.window_ext.0 != 0 {
            ((x - f64::from(self.window_org.0)) * f64::from(self.viewport_ext.0)
                / f64::from(self.window_ext.0)
                + f64::from(self.viewport_org.0))
                * self.scaling
        } else {
            x * self.scaling
        }
    }

    #[must_use]
    pub fn scale_y(&self, y: i16) -> f64 {
        let y = f64::from(y);
        if self.window_ext.1 != 0 {
            ((y - f64::from(self.window_org.1)) * f64::from(self.viewport_ext.1)
                / f64::from(self.window_ext.1)
                + f64::from(self.viewport_org.1))
                * self.scaling
        } else {
            y * self.scaling
        }
    }

    /// Maps a displacement (not a position) along X through the same ratio `scale_x` applies,
    /// without the window/viewport origin translation. Used for extents like a rounded-rect
    /// corner radius, where `scale_x(a) - scale_x(b) == extent_x(a - b)`.
    #[must_use]
    pub fn extent_x(&self, dx: i16) -> f64 {
        let dx = f64::from(dx);
        if self.window_ext.0 != 0 {
            dx * f64::from(self.viewport_ext.0) / f64::from(self.window_ext.0) * self.scaling
        } else {
            dx * self.scaling
        }
    }

    #[must_use]
    pub fn extent_y(&self, dy: i16) -> f64 {
        let dy = f64::from(dy);
        if self.window_ext.1 != 0 {
            dy * f64::from(self.viewport_ext.1) / f64::from(self.window_ext.1) * self.scaling
        } else {
            dy * self.scaling
        }
    }
}

/// Computes the global scaling factor and the resulting output canvas size in pixels.
///
/// Without a placeable header, the canvas defaults to 1000x1000 metafile units at a scaling of
/// 1. With one, the default scaling converts metafile units to 96-dpi CSS pixels; supplying
/// `img_width`/`img_height` overrides that with the matching ratio, or the smaller of the two
/// ratios when both are given, to preserve aspect.
#[must_use]
pub fn compute_scale(
    placeable: Option<&Placeable>,
    img_width: u32,
    img_height: u32,
) -> (f64, f64, f64) {
    let Some(placeable) = placeable else {
        return (1.0, DEFAULT_EXTENT, DEFAULT_EXTENT);
    };

    let raw_width = f64::from(placeable.bounds.width().unsigned_abs());
    let raw_height = f64::from(placeable.bounds.height().unsigned_abs());

    let scaling = match (img_width, img_height) {
        (0, 0) => 96.0 / f64::from(placeable.inch.max(1)),
        (w, 0) => f64::from(w) / raw_width,
        (0, h) => f64::from(h) / raw_height,
        (w, h) => {
            let ratio_w = f64::from(w) / raw_width;
            let ratio_h = f64::from(h) / raw_height;
            ratio_w.min(ratio_h)
        }
    };

    (scaling, raw_width * scaling, raw_height * scaling)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Rect16;

    #[test]
    fn scale_is_affine_in_the_coordinate() {
        let mut engine = CoordinateEngine::new(2.0);
        engine.window_ext = (500, 500);
        engine.viewport_ext = (1000, 1000);

        let c1 = 100i16;
        let c2 = 300i16;
        let delta = engine.scale_x(c1) - engine.scale_x(c2);
        let expected = f64::from(c1 - c2) * (1000.0 / 500.0) * 2.0;
        assert!((delta - expected).abs() < 1e-9);
    }

    #[test]
    fn zero_extent_falls_back_to_raw_times_scaling() {
        let mut engine = CoordinateEngine::new(3.0);
        engine.window_ext = (0, 500);
        assert!((engine.scale_x(10) - 30.0).abs() < 1e-9);
    }

    #[test]
    fn placeable_default_scale_uses_96_dpi() {
        let placeable = Placeable { bounds: Rect16::new(0, 0, 1000, 1000), inch: 1440 };
        let (scaling, width, height) = compute_scale(Some(&placeable), 0, 0);
        assert!((scaling - 96.0 / 1440.0).abs() < 1e-9);
        assert!((width - 1000.0 * scaling).abs() < 1e-9);
        assert!((height - 1000.0 * scaling).abs() < 1e-9);
    }

    #[test]
    fn both_dimensions_given_uses_smaller_ratio() {
        let placeable = Placeable { bounds: Rect16::new(0, 0, 1000, 500), inch: 1440 };
        let (scaling, ..) = compute_scale(Some(&placeable), 500, 1000);
        // ratio_w = 500/1000 = 0.5, ratio_h = 1000/500 = 2.0 -> smaller is 0.5
        assert!((scaling - 0.5).abs() < 1e-9);
    }

    #[test]
    fn no_placeable_defaults_to_1000_square_unscaled() {
        let (scaling, width, height) = compute_scale(None, 0, 0);
        assert_eq!(scaling, 1.0);
        assert_eq!(width, 1000.0);
        assert_eq!(height, 1000.0);
    }
}

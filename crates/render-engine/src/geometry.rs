//! Crop and fit geometry for placing a source image into a target canvas.
//!
//! All functions here are pure. Zero dimensions are a caller bug and panic.

use photostamp_photo_model::FitMode;

/// A fractional rectangle in pixel space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

/// A rectangle snapped to whole pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Full-size rectangle at the origin.
    pub fn full(width: u32, height: u32) -> Self {
        Self::new(0.0, 0.0, width as f64, height as f64)
    }

    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }

    pub fn aspect(&self) -> f64 {
        self.w / self.h
    }

    /// Round to whole pixels, clamped inside `bounds_w`×`bounds_h` and at
    /// least 1×1.
    pub fn snap(&self, bounds_w: u32, bounds_h: u32) -> PixelRect {
        let max_x = bounds_w.saturating_sub(1);
        let max_y = bounds_h.saturating_sub(1);
        let x = (self.x.round().max(0.0) as u32).min(max_x);
        let y = (self.y.round().max(0.0) as u32).min(max_y);
        let width = (self.w.round().max(1.0) as u32).clamp(1, (bounds_w - x).max(1));
        let height = (self.h.round().max(1.0) as u32).clamp(1, (bounds_h - y).max(1));
        PixelRect {
            x,
            y,
            width,
            height,
        }
    }
}

/// Where a source is sampled from and drawn to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitPlacement {
    /// Region of the source image to sample.
    pub src: Rect,
    /// Region of the target canvas to draw into.
    pub dst: Rect,
}

/// Largest centered region of the source with the target aspect ratio.
///
/// # Panics
///
/// Panics if any dimension is zero.
pub fn compute_cover_crop(source_w: u32, source_h: u32, target_w: u32, target_h: u32) -> Rect {
    assert!(
        source_w > 0 && source_h > 0 && target_w > 0 && target_h > 0,
        "cover crop needs non-zero dimensions"
    );
    let (sw, sh) = (source_w as f64, source_h as f64);
    let target_ratio = target_w as f64 / target_h as f64;
    let source_ratio = sw / sh;

    if source_ratio > target_ratio {
        let w = sh * target_ratio;
        Rect::new((sw - w) / 2.0, 0.0, w, sh)
    } else {
        let h = sw / target_ratio;
        Rect::new(0.0, (sh - h) / 2.0, sw, h)
    }
}

/// Placement of a source inside a target canvas.
///
/// `Contain` keeps the whole source and letterboxes; `Cover` fills the
/// target and crops the source.
///
/// # Panics
///
/// Panics if any dimension is zero.
pub fn compute_fit_rect(
    source_w: u32,
    source_h: u32,
    target_w: u32,
    target_h: u32,
    mode: FitMode,
) -> FitPlacement {
    match mode {
        FitMode::Cover => FitPlacement {
            src: compute_cover_crop(source_w, source_h, target_w, target_h),
            dst: Rect::full(target_w, target_h),
        },
        FitMode::Contain => {
            assert!(
                source_w > 0 && source_h > 0 && target_w > 0 && target_h > 0,
                "contain fit needs non-zero dimensions"
            );
            let (tw, th) = (target_w as f64, target_h as f64);
            let source_ratio = source_w as f64 / source_h as f64;
            let (w, h) = if source_ratio > tw / th {
                (tw, tw / source_ratio)
            } else {
                (th * source_ratio, th)
            };
            FitPlacement {
                src: Rect::full(source_w, source_h),
                dst: Rect::new((tw - w) / 2.0, (th - h) / 2.0, w, h),
            }
        }
    }
}

//! Text rasterisation into coverage masks.
//!
//! A TrueType face is used when one is configured or an installed Thai
//! font is found. Otherwise text falls back to the built-in 8×8 bitmap
//! face, which covers Basic Latin only; other characters render as `?`.

use std::path::Path;

use font8x8::{UnicodeFonts, BASIC_FONTS};
use image::GrayImage;
use photostamp_common::{FontConfig, PhotostampError, PhotostampResult};
use rusttype::{point, Font, Scale};

const THAI_PROBE_CHAR: char = 'ก';

/// Installed fonts tried, in order, when no font is configured.
const SYSTEM_THAI_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/noto/NotoSansThai-Regular.ttf",
    "/usr/share/fonts/noto/NotoSansThai-Regular.ttf",
    "/usr/share/fonts/google-noto/NotoSansThai-Regular.ttf",
    "/usr/share/fonts/truetype/tlwg/Garuda.ttf",
    "/usr/share/fonts/truetype/tlwg/Loma.ttf",
    "/usr/share/fonts/TTF/Garuda.ttf",
    "/Library/Fonts/Arial Unicode.ttf",
    "C:\\Windows\\Fonts\\tahoma.ttf",
];

/// Font used for overlay text.
pub enum OverlayFont {
    TrueType(Font<'static>),
    Bitmap,
}

impl std::fmt::Debug for OverlayFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl Default for OverlayFont {
    fn default() -> Self {
        Self::builtin()
    }
}

impl OverlayFont {
    pub fn builtin() -> Self {
        Self::Bitmap
    }

    /// Load a TrueType/OpenType font file.
    pub fn load(path: &Path) -> PhotostampResult<Self> {
        if !path.exists() {
            return Err(PhotostampError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let bytes = std::fs::read(path)?;
        Self::from_bytes(bytes)
            .ok_or_else(|| PhotostampError::render(format!("Unparsable font: {}", path.display())))
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Option<Self> {
        Font::try_from_vec(bytes).map(Self::TrueType)
    }

    /// The configured font. Without one, the first installed system font
    /// with Thai coverage; the built-in face when neither loads.
    pub fn from_config(config: &FontConfig) -> Self {
        let Some(path) = &config.path else {
            return Self::first_with_thai(SYSTEM_THAI_FONTS.iter().map(Path::new))
                .unwrap_or_else(Self::builtin);
        };
        match Self::load(path) {
            Ok(font) => {
                tracing::info!(path = %path.display(), "Loaded overlay font");
                font
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Falling back to built-in font");
                Self::builtin()
            }
        }
    }

    /// First font among `candidates` that loads and has Thai glyphs.
    pub fn first_with_thai<'p>(candidates: impl IntoIterator<Item = &'p Path>) -> Option<Self> {
        candidates.into_iter().find_map(|path| {
            let font = Self::load(path).ok()?;
            if !font.has_glyph(THAI_PROBE_CHAR) {
                tracing::debug!(path = %path.display(), "Font lacks Thai glyphs");
                return None;
            }
            tracing::info!(path = %path.display(), "Using system overlay font");
            Some(font)
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::TrueType(_) => "truetype",
            Self::Bitmap => "builtin-8x8",
        }
    }

    /// Whether `ch` has a real glyph in this font.
    pub fn has_glyph(&self, ch: char) -> bool {
        match self {
            Self::TrueType(font) => font.glyph(ch).id().0 != 0,
            Self::Bitmap => BASIC_FONTS.get(ch).is_some(),
        }
    }

    /// Distinct characters of `text` this font would replace, in order of
    /// first appearance. Whitespace is never reported.
    pub fn missing_glyphs(&self, text: &str) -> Vec<char> {
        let mut missing = Vec::new();
        for ch in text.chars() {
            if !ch.is_whitespace() && !self.has_glyph(ch) && !missing.contains(&ch) {
                missing.push(ch);
            }
        }
        missing
    }

    /// Advance width of `text` at `px` pixels.
    pub fn measure(&self, text: &str, px: f64) -> f64 {
        match self {
            Self::TrueType(font) => {
                let scale = Scale::uniform(px as f32);
                font.layout(text, scale, point(0.0, 0.0))
                    .last()
                    .map(|g| g.position().x + g.unpositioned().h_metrics().advance_width)
                    .unwrap_or(0.0) as f64
            }
            Self::Bitmap => (text.chars().count() as u32 * bitmap_cell(px)) as f64,
        }
    }

    /// Draw `text` into `mask` with its top-left corner at (`left`, `top`).
    ///
    /// Coverage is max-combined with what the mask already holds; pixels
    /// outside the mask are dropped.
    pub fn draw_line(&self, mask: &mut GrayImage, text: &str, px: f64, left: f64, top: f64) {
        match self {
            Self::TrueType(font) => draw_truetype(font, mask, text, px, left, top),
            Self::Bitmap => draw_bitmap(mask, text, px, left, top),
        }
    }
}

fn bitmap_cell(px: f64) -> u32 {
    px.round().max(1.0) as u32
}

fn plot(mask: &mut GrayImage, x: i64, y: i64, value: u8) {
    if x < 0 || y < 0 || x >= mask.width() as i64 || y >= mask.height() as i64 {
        return;
    }
    let pixel = mask.get_pixel_mut(x as u32, y as u32);
    pixel.0[0] = pixel.0[0].max(value);
}

fn draw_truetype(font: &Font<'static>, mask: &mut GrayImage, text: &str, px: f64, left: f64, top: f64) {
    let scale = Scale::uniform(px as f32);
    let ascent = font.v_metrics(scale).ascent;
    for glyph in font.layout(text, scale, point(left as f32, top as f32 + ascent)) {
        if let Some(bb) = glyph.pixel_bounding_box() {
            glyph.draw(|gx, gy, coverage| {
                let value = (coverage.clamp(0.0, 1.0) * 255.0).round() as u8;
                plot(
                    mask,
                    bb.min.x as i64 + gx as i64,
                    bb.min.y as i64 + gy as i64,
                    value,
                );
            });
        }
    }
}

fn draw_bitmap(mask: &mut GrayImage, text: &str, px: f64, left: f64, top: f64) {
    let cell = bitmap_cell(px);
    let origin_x = left.round() as i64;
    let origin_y = top.round() as i64;

    for (i, ch) in text.chars().enumerate() {
        let glyph = BASIC_FONTS
            .get(ch)
            .or_else(|| BASIC_FONTS.get('?'))
            .unwrap_or([0; 8]);
        let cell_x = origin_x + (i as u32 * cell) as i64;
        // Nearest-neighbour upscale of the 8×8 glyph to a cell×cell box.
        for ty in 0..cell {
            let bits = glyph[(ty * 8 / cell) as usize];
            for tx in 0..cell {
                if (bits >> (tx * 8 / cell)) & 1 == 1 {
                    plot(mask, cell_x + tx as i64, origin_y + ty as i64, 255);
                }
            }
        }
    }
}

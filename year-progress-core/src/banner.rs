//! Banner image: a 1500x500 RGB canvas with a centered two-tone progress bar
//! and the percentage written underneath in a display font.
//!
//! The font is loaded from disk once per run and is required: a missing or
//! unreadable font file is a fatal [`RenderError`], there is no fallback face.

use std::fmt;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use ab_glyph::{Font, FontVec, PxScale};
use image::{ImageFormat, Rgb, RgbImage};
use imageproc::drawing::{draw_text_mut, text_size};
use tracing::{debug, error, info};

use crate::contract::ImageRenderer;
use crate::text_bar::format_percentage;

pub const BANNER_WIDTH: u32 = 1500;
pub const BANNER_HEIGHT: u32 = 500;

/// File name of the display font shipped next to the executable.
pub const DEFAULT_FONT_FILE: &str = "pacifico.ttf";

struct BannerStyle;

impl BannerStyle {
    const BACKGROUND: Rgb<u8> = Rgb([60, 130, 245]);
    const FILLED: Rgb<u8> = Rgb([255, 255, 255]);
    const EMPTY: Rgb<u8> = Rgb([200, 200, 200]);
    const CAPTION: Rgb<u8> = Rgb([255, 255, 255]);
    const BAR_WIDTH: u32 = 1100;
    const BAR_THICKNESS: u32 = 15;
    const CORNER_RADIUS: f64 = 5.0;
    const FONT_SIZE: f32 = 64.0;
    const CAPTION_GAP: i64 = 20;
}

#[derive(Debug)]
pub enum RenderError {
    /// Font file missing or unreadable.
    FontLoad {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Font file read but not a usable font.
    FontParse { path: PathBuf, reason: String },
    /// PNG encoding failed.
    Encode(image::ImageError),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::FontLoad { path, source } => {
                write!(f, "failed to load font {}: {}", path.display(), source)
            }
            RenderError::FontParse { path, reason } => {
                write!(f, "invalid font {}: {}", path.display(), reason)
            }
            RenderError::Encode(e) => write!(f, "png encoding error: {}", e),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::FontLoad { source, .. } => Some(source),
            RenderError::Encode(e) => Some(e),
            RenderError::FontParse { .. } => None,
        }
    }
}

impl From<image::ImageError> for RenderError {
    fn from(e: image::ImageError) -> Self {
        RenderError::Encode(e)
    }
}

/// `pacifico.ttf` in the directory of the running executable.
pub fn default_font_path() -> std::io::Result<PathBuf> {
    let exe = std::env::current_exe()?;
    let dir = exe.parent().unwrap_or_else(|| Path::new("."));
    Ok(dir.join(DEFAULT_FONT_FILE))
}

pub fn load_font(path: &Path) -> Result<FontVec, RenderError> {
    let bytes = std::fs::read(path).map_err(|source| {
        error!(error = ?source, path = %path.display(), "Failed to read font file");
        RenderError::FontLoad {
            path: path.to_path_buf(),
            source,
        }
    })?;
    let font = FontVec::try_from_vec(bytes).map_err(|e| {
        error!(error = %e, path = %path.display(), "Font file is not a valid font");
        RenderError::FontParse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }
    })?;
    info!(path = %path.display(), "Loaded banner font");
    Ok(font)
}

/// Renders the full banner (bar and caption) with a loaded font.
pub struct BannerRenderer {
    font: FontVec,
}

impl BannerRenderer {
    pub fn new(font: FontVec) -> Self {
        Self { font }
    }

    pub fn from_path(path: &Path) -> Result<Self, RenderError> {
        load_font(path).map(Self::new)
    }

    pub fn render(&self, progress: f64) -> RgbImage {
        let mut canvas = paint_bar(progress);
        let caption = format_percentage(progress);

        let scale = caption_scale(&self.font);
        let (text_width, _) = text_size(scale, &self.font, &caption);
        let x = (i64::from(BANNER_WIDTH) - i64::from(text_width)) / 2;
        let y = bar_geometry().bottom + BannerStyle::CAPTION_GAP;

        draw_text_mut(
            &mut canvas,
            BannerStyle::CAPTION,
            x as i32,
            y as i32,
            scale,
            &self.font,
            &caption,
        );
        debug!(progress, caption = %caption, text_width, "Rendered banner caption");
        canvas
    }
}

/// Scale giving the caption 64 pixels per em. `PxScale` measures the
/// ascent-to-descent height, which is usually taller than the em square.
pub fn caption_scale(font: &impl Font) -> PxScale {
    match font.units_per_em() {
        Some(units_per_em) if units_per_em > 0.0 => {
            PxScale::from(BannerStyle::FONT_SIZE * font.height_unscaled() / units_per_em)
        }
        _ => PxScale::from(BannerStyle::FONT_SIZE),
    }
}

impl ImageRenderer for BannerRenderer {
    fn render_png(&self, progress: f64) -> Result<Vec<u8>, RenderError> {
        encode_png(&self.render(progress))
    }
}

pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>, RenderError> {
    let mut output = Cursor::new(Vec::new());
    image.write_to(&mut output, ImageFormat::Png)?;
    Ok(output.into_inner())
}

/// Background and bar without the caption; needs no font.
pub fn paint_bar(progress: f64) -> RgbImage {
    let mut canvas = RgbImage::from_pixel(BANNER_WIDTH, BANNER_HEIGHT, BannerStyle::BACKGROUND);
    let bar = bar_geometry();
    let filled_width = (f64::from(BannerStyle::BAR_WIDTH) * progress / 100.0).floor() as i64;
    let split = bar.left + filled_width;

    fill_rounded_rect(
        &mut canvas,
        Rect { left: bar.left, top: bar.top, right: split, bottom: bar.bottom },
        BannerStyle::CORNER_RADIUS,
        Corners::LEFT,
        BannerStyle::FILLED,
    );
    fill_rounded_rect(
        &mut canvas,
        Rect { left: split, top: bar.top, right: bar.right, bottom: bar.bottom },
        BannerStyle::CORNER_RADIUS,
        Corners::RIGHT,
        BannerStyle::EMPTY,
    );
    canvas
}

/// Half-open pixel rectangle: `left..right` by `top..bottom`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Rect {
    left: i64,
    top: i64,
    right: i64,
    bottom: i64,
}

fn bar_geometry() -> Rect {
    let left = i64::from((BANNER_WIDTH - BannerStyle::BAR_WIDTH) / 2);
    let top = i64::from((BANNER_HEIGHT - BannerStyle::BAR_THICKNESS) / 2);
    Rect {
        left,
        top,
        right: left + i64::from(BannerStyle::BAR_WIDTH),
        bottom: top + i64::from(BannerStyle::BAR_THICKNESS),
    }
}

#[derive(Debug, Clone, Copy)]
struct Corners {
    top_left: bool,
    top_right: bool,
    bottom_right: bool,
    bottom_left: bool,
}

impl Corners {
    const LEFT: Corners = Corners {
        top_left: true,
        top_right: false,
        bottom_right: false,
        bottom_left: true,
    };
    const RIGHT: Corners = Corners {
        top_left: false,
        top_right: true,
        bottom_right: true,
        bottom_left: false,
    };
}

/// Fill `rect` clipped to the canvas, rounding the selected corners.
/// The radius shrinks to half the shorter side when the rect is too small.
fn fill_rounded_rect(canvas: &mut RgbImage, rect: Rect, radius: f64, corners: Corners, color: Rgb<u8>) {
    if rect.right <= rect.left || rect.bottom <= rect.top {
        return;
    }
    let width = (rect.right - rect.left) as f64;
    let height = (rect.bottom - rect.top) as f64;
    let r = radius.min(width / 2.0).min(height / 2.0);

    let (left, top) = (rect.left as f64, rect.top as f64);
    let (right, bottom) = (rect.right as f64, rect.bottom as f64);

    let x_range = rect.left.max(0)..rect.right.min(i64::from(canvas.width()));
    let y_range = rect.top.max(0)..rect.bottom.min(i64::from(canvas.height()));

    for y in y_range {
        let py = y as f64 + 0.5;
        for x in x_range.clone() {
            let px = x as f64 + 0.5;

            let corner = match (px < left + r, px > right - r, py < top + r, py > bottom - r) {
                (true, _, true, _) if corners.top_left => Some((left + r, top + r)),
                (true, _, _, true) if corners.bottom_left => Some((left + r, bottom - r)),
                (false, true, true, _) if corners.top_right => Some((right - r, top + r)),
                (false, true, _, true) if corners.bottom_right => Some((right - r, bottom - r)),
                _ => None,
            };
            if let Some((cx, cy)) = corner {
                if (px - cx).hypot(py - cy) > r {
                    continue;
                }
            }
            canvas.put_pixel(x as u32, y as u32, color);
        }
    }
}

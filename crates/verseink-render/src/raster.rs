//! CPU raster backing store with per-tool compositing.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, Rgba, RgbaImage};
use peniko::{BlendMode, Compose, Mix};
use thiserror::Error;
use verseink_core::stroke::InkColor;

/// Raster codec errors (legacy payload decode, PNG export).
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("not a base64 image data URL")]
    InvalidDataUrl,
    #[error("base64 decode failed: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("image codec error: {0}")]
    Image(#[from] image::ImageError),
}

/// Anti-aliased coverage for one segment, accumulated before compositing.
///
/// Overlapping dabs take the maximum coverage, so a segment composites onto
/// the surface exactly once and never self-darkens under multiply.
#[derive(Debug)]
pub struct CoverageMask {
    x0: i32,
    y0: i32,
    width: u32,
    height: u32,
    coverage: Vec<f32>,
}

impl CoverageMask {
    /// Mask spanning the given pixel-space bounds (inclusive of the padding
    /// the caller applied).
    pub fn from_bounds(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        let x0 = min_x.floor() as i32;
        let y0 = min_y.floor() as i32;
        let width = ((max_x.ceil() as i32 - x0).max(0) as u32).saturating_add(1);
        let height = ((max_y.ceil() as i32 - y0).max(0) as u32).saturating_add(1);
        Self {
            x0,
            y0,
            width,
            height,
            coverage: vec![0.0; (width as usize) * (height as usize)],
        }
    }

    /// Stamp a round dab centered at (`cx`, `cy`) with the given radius,
    /// feathering one pixel at the rim.
    pub fn stamp_dab(&mut self, cx: f64, cy: f64, radius: f64) {
        let r = radius.max(0.5);
        let lo_x = ((cx - r - 1.0).floor() as i32 - self.x0).max(0);
        let hi_x = ((cx + r + 1.0).ceil() as i32 - self.x0).min(self.width as i32 - 1);
        let lo_y = ((cy - r - 1.0).floor() as i32 - self.y0).max(0);
        let hi_y = ((cy + r + 1.0).ceil() as i32 - self.y0).min(self.height as i32 - 1);

        for y in lo_y..=hi_y {
            for x in lo_x..=hi_x {
                let px = (self.x0 + x) as f64 + 0.5;
                let py = (self.y0 + y) as f64 + 0.5;
                let dist = ((px - cx).powi(2) + (py - cy).powi(2)).sqrt();
                let cov = (r + 0.5 - dist).clamp(0.0, 1.0) as f32;
                if cov > 0.0 {
                    let idx = y as usize * self.width as usize + x as usize;
                    self.coverage[idx] = self.coverage[idx].max(cov);
                }
            }
        }
    }

    fn iter_covered(&self) -> impl Iterator<Item = (i32, i32, f32)> + '_ {
        (0..self.height).flat_map(move |y| {
            (0..self.width).filter_map(move |x| {
                let cov = self.coverage[y as usize * self.width as usize + x as usize];
                (cov > 0.0).then_some((self.x0 + x as i32, self.y0 + y as i32, cov))
            })
        })
    }
}

/// The persistent raster surface, in physical pixels, straight alpha.
///
/// Exclusively owned by the surface manager; no other component retains
/// pixel references across frames.
#[derive(Debug, Clone)]
pub struct RasterSurface {
    pixels: RgbaImage,
}

impl RasterSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: RgbaImage::new(width, height),
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Alpha channel at a pixel, zero outside the surface.
    pub fn alpha_at(&self, x: u32, y: u32) -> u8 {
        if x < self.width() && y < self.height() {
            self.pixels.get_pixel(x, y)[3]
        } else {
            0
        }
    }

    /// Reset every pixel to transparent.
    pub fn clear(&mut self) {
        for px in self.pixels.pixels_mut() {
            *px = Rgba([0, 0, 0, 0]);
        }
    }

    /// Composite one segment's coverage onto the surface.
    pub fn composite_mask(
        &mut self,
        mask: &CoverageMask,
        color: InkColor,
        opacity: f32,
        blend: BlendMode,
    ) {
        let (w, h) = (self.width() as i32, self.height() as i32);
        for (x, y, cov) in mask.iter_covered() {
            if x < 0 || y < 0 || x >= w || y >= h {
                continue;
            }
            let a_src = (opacity * cov).clamp(0.0, 1.0);
            let dst = self.pixels.get_pixel_mut(x as u32, y as u32);
            blend_pixel(dst, color, a_src, blend);
        }
    }

    /// Source-over blit of a decoded image at the origin, clipped to the
    /// surface (the legacy-format one-shot raster path).
    pub fn blit(&mut self, src: &RgbaImage) {
        let w = src.width().min(self.width());
        let h = src.height().min(self.height());
        for y in 0..h {
            for x in 0..w {
                let s = src.get_pixel(x, y);
                let sa = s[3] as f32 / 255.0;
                if sa <= 0.0 {
                    continue;
                }
                let color = InkColor::new(s[0], s[1], s[2]);
                let dst = self.pixels.get_pixel_mut(x, y);
                blend_pixel(dst, color, sa, BlendMode::new(Mix::Normal, Compose::SrcOver));
            }
        }
    }

    /// Decode a `data:image/...;base64,` payload and blit it.
    pub fn blit_data_url(&mut self, data: &str) -> Result<(), CodecError> {
        let decoded = decode_data_url(data)?;
        self.blit(&decoded);
        Ok(())
    }

    /// Encode the surface as a PNG.
    pub fn encode_png(&self) -> Result<Vec<u8>, CodecError> {
        let mut out = Vec::new();
        PngEncoder::new(&mut out).write_image(
            self.pixels.as_raw(),
            self.width(),
            self.height(),
            ExtendedColorType::Rgba8,
        )?;
        Ok(out)
    }

    /// Copy of the surface with alpha scaled by `opacity` (the read-only
    /// faint replay presentation).
    pub fn faded(&self, opacity: f32) -> RgbaImage {
        let opacity = opacity.clamp(0.0, 1.0);
        let mut out = self.pixels.clone();
        for px in out.pixels_mut() {
            px[3] = (px[3] as f32 * opacity).round() as u8;
        }
        out
    }
}

/// Blend one source contribution into a destination pixel (straight alpha).
fn blend_pixel(dst: &mut Rgba<u8>, color: InkColor, a_src: f32, blend: BlendMode) {
    let da = dst[3] as f32 / 255.0;

    if blend.compose == Compose::DestOut {
        let a_out = da * (1.0 - a_src);
        dst[3] = (a_out * 255.0).round() as u8;
        if dst[3] == 0 {
            *dst = Rgba([0, 0, 0, 0]);
        }
        return;
    }

    let dr = dst[0] as f32 / 255.0;
    let dg = dst[1] as f32 / 255.0;
    let db = dst[2] as f32 / 255.0;
    let sr = color.r as f32 / 255.0;
    let sg = color.g as f32 / 255.0;
    let sb = color.b as f32 / 255.0;

    // Multiply mixes against the backdrop; where the backdrop is transparent
    // it acts as white, leaving the source color unchanged.
    let (cr, cg, cb) = if blend.mix == Mix::Multiply {
        (
            sr * (dr * da + 1.0 - da),
            sg * (dg * da + 1.0 - da),
            sb * (db * da + 1.0 - da),
        )
    } else {
        (sr, sg, sb)
    };

    let a_out = a_src + da * (1.0 - a_src);
    if a_out <= 0.0 {
        *dst = Rgba([0, 0, 0, 0]);
        return;
    }
    let over = |c_src: f32, c_dst: f32| {
        (((c_src * a_src + c_dst * da * (1.0 - a_src)) / a_out) * 255.0)
            .round()
            .clamp(0.0, 255.0) as u8
    };
    dst[0] = over(cr, dr);
    dst[1] = over(cg, dg);
    dst[2] = over(cb, db);
    dst[3] = (a_out * 255.0).round() as u8;
}

/// Decode a `data:image/...;base64,` URL into an RGBA image.
fn decode_data_url(data: &str) -> Result<RgbaImage, CodecError> {
    let (header, payload) = data.split_once(',').ok_or(CodecError::InvalidDataUrl)?;
    if !header.starts_with("data:image/") || !header.ends_with(";base64") {
        return Err(CodecError::InvalidDataUrl);
    }
    let bytes = STANDARD.decode(payload.trim())?;
    Ok(image::load_from_memory(&bytes)?.to_rgba8())
}

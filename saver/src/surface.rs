//! Presentation surface
//!
//! The drawable target the host composites. It holds exactly one visual
//! source at a time (blank, poster or live frame) and scales it to the host's
//! bounds on demand. Only the playback core mutates it.

use crate::video::FrameRef;
use anyhow::{Context, Result};
use common::{Bounds, ScaleMode, SurfaceSource};
use image::{ImageBuffer, Rgba, RgbaImage};
use std::sync::Arc;

const BACKGROUND: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// What the surface is currently showing
#[derive(Debug, Clone, Default)]
pub enum SurfaceContent {
    #[default]
    Blank,
    Poster(FrameRef),
    Live(FrameRef),
}

impl SurfaceContent {
    pub fn source(&self) -> SurfaceSource {
        match self {
            Self::Blank => SurfaceSource::Blank,
            Self::Poster(_) => SurfaceSource::Poster,
            Self::Live(_) => SurfaceSource::Live,
        }
    }

    pub fn frame(&self) -> Option<&FrameRef> {
        match self {
            Self::Blank => None,
            Self::Poster(frame) | Self::Live(frame) => Some(frame),
        }
    }

    fn same_as(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Blank, Self::Blank) => true,
            (Self::Poster(a), Self::Poster(b)) | (Self::Live(a), Self::Live(b)) => {
                Arc::ptr_eq(a, b)
            }
            _ => false,
        }
    }
}

pub struct PresentationSurface {
    bounds: Bounds,
    scale_mode: ScaleMode,
    content: SurfaceContent,

    /// Content scaled to `bounds`, rebuilt lazily after any change
    composited: Option<RgbaImage>,

    /// Bumped every time the visible content or geometry changes
    revision: u64,
}

impl PresentationSurface {
    pub fn new(bounds: Bounds, scale_mode: ScaleMode) -> Self {
        Self {
            bounds,
            scale_mode,
            content: SurfaceContent::Blank,
            composited: None,
            revision: 0,
        }
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn content(&self) -> &SurfaceContent {
        &self.content
    }

    pub fn source(&self) -> SurfaceSource {
        self.content.source()
    }

    pub fn is_blank(&self) -> bool {
        matches!(self.content, SurfaceContent::Blank)
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Swap the visible source in one step
    ///
    /// Returns false when the same frame is already shown.
    pub(crate) fn present(&mut self, content: SurfaceContent) -> bool {
        if self.content.same_as(&content) {
            return false;
        }
        log::trace!(
            "Surface {:?} -> {:?}",
            self.content.source(),
            content.source()
        );
        self.content = content;
        self.invalidate();
        true
    }

    pub(crate) fn resize(&mut self, bounds: Bounds) -> bool {
        if bounds == self.bounds {
            return false;
        }
        log::info!("Surface resized {} -> {}", self.bounds, bounds);
        self.bounds = bounds;
        self.invalidate();
        true
    }

    pub(crate) fn set_scale_mode(&mut self, scale_mode: ScaleMode) {
        if scale_mode != self.scale_mode {
            self.scale_mode = scale_mode;
            self.invalidate();
        }
    }

    fn invalidate(&mut self) {
        self.composited = None;
        self.revision += 1;
    }

    /// Current content scaled to the surface bounds; `None` while blank
    pub(crate) fn composite(&mut self) -> Result<Option<&RgbaImage>> {
        let Some(frame) = self.content.frame() else {
            return Ok(None);
        };

        if self.composited.is_none() {
            let scaled = scale_image(
                frame.image(),
                self.bounds.width,
                self.bounds.height,
                self.scale_mode,
            )?;
            self.composited = Some(scaled);
        }

        Ok(self.composited.as_ref())
    }
}

/// Scale/fit an image to the target dimensions
pub fn scale_image(
    image: &RgbaImage,
    target_width: u32,
    target_height: u32,
    mode: ScaleMode,
) -> Result<RgbaImage> {
    if image.dimensions() == (target_width, target_height) && mode != ScaleMode::Tile {
        return Ok(image.clone());
    }

    match mode {
        ScaleMode::Center => Ok(center_image(image, target_width, target_height)),
        ScaleMode::Fill => fill_image(image, target_width, target_height),
        ScaleMode::Fit => fit_image(image, target_width, target_height),
        ScaleMode::Stretch => resize_image_fast(image, target_width, target_height),
        ScaleMode::Tile => Ok(tile_image(image, target_width, target_height)),
    }
}

/// Center image without scaling
fn center_image(image: &RgbaImage, target_width: u32, target_height: u32) -> RgbaImage {
    let mut output = ImageBuffer::from_pixel(target_width, target_height, BACKGROUND);
    let (img_width, img_height) = image.dimensions();

    let x_offset = (i64::from(target_width) - i64::from(img_width)) / 2;
    let y_offset = (i64::from(target_height) - i64::from(img_height)) / 2;

    image::imageops::overlay(&mut output, image, x_offset, y_offset);
    output
}

/// Scale to fill entire surface (may crop)
fn fill_image(image: &RgbaImage, target_width: u32, target_height: u32) -> Result<RgbaImage> {
    let (img_width, img_height) = image.dimensions();
    let target_ratio = target_width as f32 / target_height as f32;
    let img_ratio = img_width as f32 / img_height as f32;

    let (scale_width, scale_height) = if target_ratio > img_ratio {
        // Target is wider, scale to width
        let scale = target_width as f32 / img_width as f32;
        (target_width, ((img_height as f32 * scale) as u32).max(target_height))
    } else {
        // Target is taller, scale to height
        let scale = target_height as f32 / img_height as f32;
        (((img_width as f32 * scale) as u32).max(target_width), target_height)
    };

    let resized = resize_image_fast(image, scale_width, scale_height)?;

    if scale_width == target_width && scale_height == target_height {
        return Ok(resized);
    }

    let x_offset = (scale_width - target_width) / 2;
    let y_offset = (scale_height - target_height) / 2;

    Ok(
        image::imageops::crop_imm(&resized, x_offset, y_offset, target_width, target_height)
            .to_image(),
    )
}

/// Scale to fit within surface (may have letterboxing)
fn fit_image(image: &RgbaImage, target_width: u32, target_height: u32) -> Result<RgbaImage> {
    let (img_width, img_height) = image.dimensions();
    let target_ratio = target_width as f32 / target_height as f32;
    let img_ratio = img_width as f32 / img_height as f32;

    let (scale_width, scale_height) = if target_ratio > img_ratio {
        // Target is wider than image, scale to height
        let scale = target_height as f32 / img_height as f32;
        (((img_width as f32 * scale) as u32).max(1), target_height)
    } else {
        // Target is taller than image (or same), scale to width
        let scale = target_width as f32 / img_width as f32;
        (target_width, ((img_height as f32 * scale) as u32).max(1))
    };

    log::debug!(
        "Fit mode: {}x{} -> {}x{} inside {}x{}",
        img_width,
        img_height,
        scale_width,
        scale_height,
        target_width,
        target_height
    );

    let resized = resize_image_fast(image, scale_width, scale_height)?;

    let mut output = ImageBuffer::from_pixel(target_width, target_height, BACKGROUND);
    let x_offset = target_width.saturating_sub(scale_width) / 2;
    let y_offset = target_height.saturating_sub(scale_height) / 2;
    image::imageops::overlay(&mut output, &resized, x_offset as i64, y_offset as i64);

    Ok(output)
}

/// Tile the image
fn tile_image(image: &RgbaImage, target_width: u32, target_height: u32) -> RgbaImage {
    let mut output = ImageBuffer::from_pixel(target_width, target_height, BACKGROUND);
    let (img_width, img_height) = image.dimensions();

    let tiles_x = target_width.div_ceil(img_width);
    let tiles_y = target_height.div_ceil(img_height);

    for ty in 0..tiles_y {
        for tx in 0..tiles_x {
            let x = tx * img_width;
            let y = ty * img_height;
            image::imageops::overlay(&mut output, image, x as i64, y as i64);
        }
    }

    output
}

/// Fast image resizing using fast_image_resize
fn resize_image_fast(image: &RgbaImage, target_width: u32, target_height: u32) -> Result<RgbaImage> {
    use fast_image_resize as fr;

    let (src_width, src_height) = image.dimensions();

    let src = fr::images::Image::from_vec_u8(
        TryInto::try_into(src_width)?,
        TryInto::try_into(src_height)?,
        image.as_raw().clone(),
        fr::PixelType::U8x4,
    )
    .context("Failed to create source image")?;

    let mut dst = fr::images::Image::new(
        TryInto::try_into(target_width)?,
        TryInto::try_into(target_height)?,
        fr::PixelType::U8x4,
    );

    let mut resizer = fr::Resizer::new();
    resizer
        .resize(
            &src,
            &mut dst,
            &fr::ResizeOptions::new()
                .resize_alg(fr::ResizeAlg::Convolution(fr::FilterType::Lanczos3)),
        )
        .context("Failed to resize image")?;

    ImageBuffer::from_raw(target_width, target_height, dst.into_vec())
        .context("Failed to create output image buffer")
}

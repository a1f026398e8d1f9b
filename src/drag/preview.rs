//! Drag image handling
//!
//! A [`DragImage`] is a bitmap plus the scale it was rendered at, so a 2x
//! snapshot still occupies the source's logical size on screen. When the
//! caller supplies no image, the source element is snapshotted and faded
//! around the point where the pointer went down.

use image::{GrayImage, Luma, RgbaImage};

use crate::config::DragConfig;
use crate::layout::{Point, Rect, Size};

/// An image with the scale it was rendered at
#[derive(Debug, Clone, PartialEq)]
pub struct DragImage {
    image: RgbaImage,
    scale: f32,
}

impl DragImage {
    pub fn new(image: RgbaImage, scale: f32) -> Self {
        Self {
            image,
            scale: if scale > 0.0 { scale } else { 1.0 },
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn is_empty(&self) -> bool {
        self.image.width() == 0 || self.image.height() == 0
    }

    /// Logical size, i.e. pixel size divided by scale
    pub fn logical_size(&self) -> Size {
        Size::new(
            self.image.width() as f32 / self.scale,
            self.image.height() as f32 / self.scale,
        )
    }

    /// Logical bounds anchored at the origin
    pub fn scaled_bounds(&self) -> Rect {
        Rect::from_origin_size(Point::zero(), self.logical_size())
    }

    /// Pointer position within the image for a caller-supplied image
    ///
    /// An explicit offset is clamped into the image; without one the image is
    /// centred on the pointer.
    pub fn resolve_offset(&self, offset: Option<Point>) -> Point {
        let bounds = self.scaled_bounds();
        match offset {
            Some(offset) => bounds.constrained_point(offset),
            None => bounds.centre(),
        }
    }
}

/// Build a translucent, radially faded preview from a snapshot of the source
///
/// `snapshot` must have been rendered at `config.preview_scale`;
/// `pointer_in_source` is the pointer-down point in the source's local space.
/// Returns the preview and the pointer position within it.
pub fn synthesize_preview(
    mut snapshot: RgbaImage,
    pointer_in_source: Point,
    config: &DragConfig,
) -> (DragImage, Point) {
    let scale = config.preview_scale;

    for pixel in snapshot.pixels_mut() {
        pixel[3] = (pixel[3] as f32 * config.preview_alpha).round() as u8;
    }

    let pixel_bounds = Rect::new(0.0, 0.0, snapshot.width() as f32, snapshot.height() as f32);
    let clipped = pixel_bounds
        .scaled(1.0 / scale)
        .constrained_point(pointer_in_source);

    let mask = radial_fade_mask(
        snapshot.width(),
        snapshot.height(),
        clipped.scaled(scale),
        config.fade_radius * scale,
        config.fade_solid_fraction,
    );

    for (x, y, pixel) in snapshot.enumerate_pixels_mut() {
        let coverage = mask.get_pixel(x, y)[0] as f32 / 255.0;
        pixel[3] = (pixel[3] as f32 * coverage).round() as u8;
    }

    (DragImage::new(snapshot, scale), clipped)
}

/// Single-channel mask: opaque within `solid_fraction * radius` of `centre`,
/// then fading linearly to transparent at `radius`
pub fn radial_fade_mask(
    width: u32,
    height: u32,
    centre: Point,
    radius: f32,
    solid_fraction: f32,
) -> GrayImage {
    let solid = radius * solid_fraction;
    let ramp = (radius - solid).max(f32::EPSILON);

    GrayImage::from_fn(width, height, |x, y| {
        let pixel_centre = Point::new(x as f32 + 0.5, y as f32 + 0.5);
        let distance = pixel_centre.distance_squared_from(centre).sqrt();

        let coverage = if distance <= solid {
            1.0
        } else if distance >= radius {
            0.0
        } else {
            1.0 - (distance - solid) / ramp
        };

        Luma([(coverage * 255.0).round() as u8])
    })
}

//! Snapshot rendering consumed by drag preview synthesis

use image::{Rgba, RgbaImage};

use crate::component::{ElementId, ElementTree};
use crate::layout::{Point, Rect};

/// Renders an element (and its visible children) into an image
pub trait SnapshotRenderer {
    /// Render `element` at `scale` pixels per logical unit, `None` if it cannot be drawn
    fn snapshot(&self, tree: &ElementTree, element: ElementId, scale: f32) -> Option<RgbaImage>;
}

/// Paints each element's fill colour as a flat rectangle
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatRenderer;

impl FlatRenderer {
    fn paint(
        &self,
        tree: &ElementTree,
        id: ElementId,
        origin: Point,
        scale: f32,
        canvas: &mut RgbaImage,
    ) {
        let Some(element) = tree.get(id) else {
            return;
        };
        if !element.is_visible() {
            return;
        }

        let bounds = element.bounds().with_origin(origin);
        if let Some(fill) = element.fill() {
            fill_rect(canvas, bounds.scaled(scale), fill);
        }

        for child in element.children() {
            if let Some(child_element) = tree.get(*child) {
                let child_origin = origin + child_element.bounds().origin;
                self.paint(tree, *child, child_origin, scale, canvas);
            }
        }
    }
}

impl SnapshotRenderer for FlatRenderer {
    fn snapshot(&self, tree: &ElementTree, element: ElementId, scale: f32) -> Option<RgbaImage> {
        let bounds = tree.get(element)?.bounds();
        let width = (bounds.width() * scale).round().max(1.0) as u32;
        let height = (bounds.height() * scale).round().max(1.0) as u32;

        let mut canvas = RgbaImage::new(width, height);
        self.paint(tree, element, Point::zero(), scale, &mut canvas);
        Some(canvas)
    }
}

fn fill_rect(canvas: &mut RgbaImage, rect: Rect, colour: Rgba<u8>) {
    let x0 = rect.x().max(0.0).round() as u32;
    let y0 = rect.y().max(0.0).round() as u32;
    let x1 = (rect.max_x().round().max(0.0) as u32).min(canvas.width());
    let y1 = (rect.max_y().round().max(0.0) as u32).min(canvas.height());

    for y in y0..y1 {
        for x in x0..x1 {
            canvas.put_pixel(x, y, colour);
        }
    }
}

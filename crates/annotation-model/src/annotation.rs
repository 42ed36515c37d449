//! Committed image stamp annotations and the per-page collection that owns them
//!
//! All coordinates are stored in page space:
//! - Origin (0, 0) at bottom-left of page
//! - X increases to the right
//! - Y increases upward
//! - Units are in points (1/72 inch)

use crate::content::StampImage;
use crate::geometry::{Rect, Transform};
use crate::graphics::{DisplayBox, GraphicsContext};

/// Unique identifier for an annotation
///
/// Generated using UUID v4; written to the PDF as the annotation name.
pub type AnnotationId = uuid::Uuid;

/// Image stamp baked into a page
///
/// `rotation` is the angle the user applied on screen (clockwise in the y-down
/// overlay). Page space is vertically flipped, so drawing negates it.
#[derive(Debug, Clone)]
pub struct ImageAnnotation {
    id: AnnotationId,
    bounds: Rect,
    rotation: f32,
    image: StampImage,
}

impl ImageAnnotation {
    /// Create a new annotation with generated ID
    pub fn new(bounds: Rect, image: StampImage) -> Self {
        Self::with_id(AnnotationId::new_v4(), bounds, image)
    }

    /// Create an annotation with a specific ID
    pub fn with_id(id: AnnotationId, bounds: Rect, image: StampImage) -> Self {
        Self { id, bounds: bounds.standardized(), rotation: 0.0, image }
    }

    pub fn id(&self) -> AnnotationId {
        self.id
    }

    /// Unrotated page-space bounds the image is drawn into
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn set_bounds(&mut self, bounds: Rect) {
        self.bounds = bounds.standardized();
    }

    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn set_rotation(&mut self, radians: f32) {
        self.rotation = radians;
    }

    pub fn image(&self) -> &StampImage {
        &self.image
    }

    /// Page-space transform applied to the bounds when drawing
    pub fn draw_transform(&self) -> Transform {
        Transform::rotation_about(self.bounds.center(), -self.rotation)
    }

    /// Axis-aligned page-space area covered once the rotation is applied
    pub fn appearance_rect(&self) -> Rect {
        self.draw_transform().apply_rect(self.bounds)
    }

    /// Paint the stamp: rotate about the bounds' center, then draw the image into the bounds
    pub fn draw(&self, display_box: DisplayBox, ctx: &mut dyn GraphicsContext) {
        log::trace!("drawing annotation {} in {:?}", self.id, display_box);

        let mid_x = self.bounds.mid_x();
        let mid_y = self.bounds.mid_y();

        ctx.save_state();
        ctx.translate(mid_x, mid_y);
        ctx.rotate(-self.rotation);
        ctx.translate(-mid_x, -mid_y);

        if !self.image.is_empty() {
            ctx.draw_image(&self.image, self.bounds);
        }

        ctx.restore_state();
    }
}

/// Committed annotations of a single page, in insertion (paint) order
#[derive(Debug, Clone, Default)]
pub struct PageAnnotations {
    page_index: u32,
    annotations: Vec<ImageAnnotation>,
}

impl PageAnnotations {
    pub fn new(page_index: u32) -> Self {
        Self { page_index, annotations: Vec::new() }
    }

    pub fn page_index(&self) -> u32 {
        self.page_index
    }

    pub fn add(&mut self, annotation: ImageAnnotation) {
        self.annotations.push(annotation);
    }

    /// Remove an annotation by ID
    pub fn remove(&mut self, id: AnnotationId) -> Option<ImageAnnotation> {
        let index = self.annotations.iter().position(|annotation| annotation.id() == id)?;
        Some(self.annotations.remove(index))
    }

    pub fn get(&self, id: AnnotationId) -> Option<&ImageAnnotation> {
        self.annotations.iter().find(|annotation| annotation.id() == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ImageAnnotation> {
        self.annotations.iter()
    }

    pub fn as_slice(&self) -> &[ImageAnnotation] {
        &self.annotations
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    /// Paint every annotation in order
    pub fn draw_all(&self, display_box: DisplayBox, ctx: &mut dyn GraphicsContext) {
        for annotation in &self.annotations {
            annotation.draw(display_box, ctx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use crate::graphics::{DrawCommand, RecordingContext};
    use image::{Rgba, RgbaImage};
    use std::f32::consts::FRAC_PI_4;

    fn stamp_image() -> StampImage {
        StampImage::from_rgba(RgbaImage::from_pixel(4, 4, Rgba([255, 0, 0, 255])))
            .expect("non-empty image")
    }

    #[test]
    fn test_draw_rotates_negated_angle_about_midpoint() {
        let mut annotation = ImageAnnotation::new(Rect::new(100.0, 200.0, 100.0, 100.0), stamp_image());
        annotation.set_rotation(FRAC_PI_4);

        let mut ctx = RecordingContext::new();
        annotation.draw(DisplayBox::MediaBox, &mut ctx);

        assert_eq!(
            &ctx.commands()[..4],
            &[
                DrawCommand::SaveState,
                DrawCommand::Translate { dx: 150.0, dy: 250.0 },
                DrawCommand::Rotate { radians: -FRAC_PI_4 },
                DrawCommand::Translate { dx: -150.0, dy: -250.0 },
            ]
        );
        assert_eq!(ctx.commands().last(), Some(&DrawCommand::RestoreState));
        assert_eq!(ctx.depth(), 0);

        let ctm = ctx.last_image_transform().expect("image drawn");
        let midpoint = ctm.apply(Point::new(150.0, 250.0));
        assert!(midpoint.distance_to(&Point::new(150.0, 250.0)) < 1e-3);
        assert!((ctm.rotation_angle() + FRAC_PI_4).abs() < 1e-5);
    }

    #[test]
    fn test_appearance_rect_covers_rotated_bounds() {
        let mut annotation = ImageAnnotation::new(Rect::new(0.0, 0.0, 100.0, 100.0), stamp_image());
        assert!(annotation.appearance_rect().approx_eq(&annotation.bounds(), 1e-3));

        annotation.set_rotation(FRAC_PI_4);
        let rect = annotation.appearance_rect();
        assert!(rect.width() > 141.0 && rect.width() < 142.0);
        assert!(rect.center().distance_to(&Point::new(50.0, 50.0)) < 1e-3);
    }

    #[test]
    fn test_bounds_are_standardized() {
        let annotation = ImageAnnotation::new(Rect::new(10.0, 10.0, -4.0, 6.0), stamp_image());
        assert_eq!(annotation.bounds(), Rect::new(6.0, 10.0, 4.0, 6.0));
    }

    #[test]
    fn test_page_annotations_add_remove() {
        let mut page = PageAnnotations::new(0);
        let first = ImageAnnotation::new(Rect::new(0.0, 0.0, 10.0, 10.0), stamp_image());
        let second = ImageAnnotation::new(Rect::new(20.0, 0.0, 10.0, 10.0), stamp_image());
        let first_id = first.id();

        page.add(first);
        page.add(second);
        assert_eq!(page.len(), 2);
        assert!(page.get(first_id).is_some());

        let removed = page.remove(first_id).expect("annotation present");
        assert_eq!(removed.id(), first_id);
        assert_eq!(page.len(), 1);
        assert!(page.remove(first_id).is_none());
    }

    #[test]
    fn test_draw_all_paints_in_insertion_order() {
        let mut page = PageAnnotations::new(3);
        page.add(ImageAnnotation::new(Rect::new(0.0, 0.0, 10.0, 10.0), stamp_image()));
        page.add(ImageAnnotation::new(Rect::new(50.0, 0.0, 10.0, 10.0), stamp_image()));

        let mut ctx = RecordingContext::new();
        page.draw_all(DisplayBox::CropBox, &mut ctx);

        let drawn: Vec<Rect> = ctx
            .commands()
            .iter()
            .filter_map(|command| match command {
                DrawCommand::DrawImage { rect, .. } => Some(*rect),
                _ => None,
            })
            .collect();
        assert_eq!(drawn, vec![Rect::new(0.0, 0.0, 10.0, 10.0), Rect::new(50.0, 0.0, 10.0, 10.0)]);
    }
}

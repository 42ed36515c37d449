//! The draggable, resizable, rotatable proxy for a pending annotation
//!
//! A sticker keeps its geometry in overlay space as center + unrotated size +
//! rotation angle. After every change it re-derives the page-space bounds of
//! its content through the host's [`CoordinateSpaces`], so a live preview
//! annotation (when one is attached) always matches what is on screen.

use crate::config::EditorConfig;
use crate::gesture::GesturePhase;
use crate::handle::{layout_handles, Handle, HandleDrag, HandleType, HandleUpdate};
use crate::space::CoordinateSpaces;
use annotation_model::{
    AnnotationId, ImageAnnotation, Point, Rect, Size, StampImage, StickerContent, Transform,
};

/// What a sticker-local point landed on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StickerHit {
    Handle(HandleType),
    Body,
}

#[derive(Debug, Clone)]
pub struct Sticker {
    content: StickerContent,
    center: Point,
    size: Size,
    rotation: f32,
    scale_factor: f32,
    initial_size: Size,
    selected: bool,
    handles: [Handle; 8],
    config: EditorConfig,
    live_annotation: Option<ImageAnnotation>,
    rotation_start: f32,
    pinch_start_scale: f32,
    handle_drag: Option<HandleDrag>,
}

impl Sticker {
    /// Sticker occupying `frame` (overlay space, unrotated)
    pub fn new(content: StickerContent, frame: Rect, config: EditorConfig) -> Self {
        let frame = frame.standardized();
        let handles = layout_handles(frame.size, &config, false);

        Self {
            content,
            center: frame.center(),
            size: frame.size,
            rotation: 0.0,
            scale_factor: 1.0,
            initial_size: frame.size,
            selected: false,
            handles,
            config,
            live_annotation: None,
            rotation_start: 0.0,
            pinch_start_scale: 1.0,
            handle_drag: None,
        }
    }

    /// Image sticker sized from the image's aspect-fit into the overlay, centered in it
    pub fn new_image(image: StampImage, overlay_bounds: Rect, config: EditorConfig) -> Self {
        let size = frame_for_image(image.size(), overlay_bounds.size, config.initial_size_fraction);
        let frame = Rect::from_center(overlay_bounds.center(), size);
        Self::new(StickerContent::Image(image), frame, config)
    }

    pub fn content(&self) -> &StickerContent {
        &self.content
    }

    pub fn center(&self) -> Point {
        self.center
    }

    /// Unrotated size of the sticker bounds
    pub fn size(&self) -> Size {
        self.size
    }

    /// Bounds in sticker-local coordinates
    pub fn bounds(&self) -> Rect {
        Rect { origin: Point::ZERO, size: self.size }
    }

    /// Unrotated frame in overlay space
    pub fn frame(&self) -> Rect {
        Rect::from_center(self.center, self.size)
    }

    /// Area the image occupies: the frame inset by the content margin
    pub fn content_frame(&self) -> Rect {
        self.frame().inset(self.config.content_inset, self.config.content_inset)
    }

    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn scale_factor(&self) -> f32 {
        self.scale_factor
    }

    /// Size captured when the current scale gesture began
    pub fn initial_size(&self) -> Size {
        self.initial_size
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    pub fn handles(&self) -> &[Handle; 8] {
        &self.handles
    }

    pub fn handle(&self, handle_type: HandleType) -> Option<&Handle> {
        self.handles.iter().find(|handle| handle.handle_type == handle_type)
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn live_annotation(&self) -> Option<&ImageAnnotation> {
        self.live_annotation.as_ref()
    }

    pub fn active_handle_drag(&self) -> Option<&HandleDrag> {
        self.handle_drag.as_ref()
    }

    /// Sticker-local → overlay: rotation about the sticker's own center
    pub fn transform(&self) -> Transform {
        Transform::translation(-self.size.width / 2.0, -self.size.height / 2.0)
            .then(&Transform::rotation(self.rotation))
            .then(&Transform::translation(self.center.x, self.center.y))
    }

    pub fn local_to_overlay(&self, point: Point) -> Point {
        self.transform().apply(point)
    }

    pub fn overlay_to_local(&self, point: Point) -> Point {
        // rotation plus translation is always invertible
        self.transform().inverse().unwrap_or(Transform::IDENTITY).apply(point)
    }

    pub fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
        for handle in &mut self.handles {
            handle.visible = selected;
        }
    }

    pub fn toggle_selection(&mut self) {
        self.set_selected(!self.selected);
    }

    /// Recompute handle frames for the current size
    pub fn layout(&mut self) {
        self.handles = layout_handles(self.size, &self.config, self.selected);
    }

    /// Hit-test a sticker-local point: visible handles win over the body,
    /// even where they overhang the sticker's bounds
    pub fn hit_test(&self, point: Point) -> Option<StickerHit> {
        for handle_type in HandleType::ALL {
            if self.handle(handle_type).is_some_and(|handle| handle.hit_test(point)) {
                return Some(StickerHit::Handle(handle_type));
            }
        }

        self.bounds().contains(point).then_some(StickerHit::Body)
    }

    pub fn hit_test_overlay(&self, point: Point) -> Option<StickerHit> {
        self.hit_test(self.overlay_to_local(point))
    }

    /// Page-space bounds of the content frame
    pub fn page_bounds(&self, spaces: &dyn CoordinateSpaces) -> Rect {
        spaces.overlay_rect_to_page(self.content_frame())
    }

    /// Mirror the current geometry into the live preview, if there is one
    pub fn update_annotation_bounds(&mut self, spaces: &dyn CoordinateSpaces) {
        let bounds = self.page_bounds(spaces);
        if let Some(annotation) = self.live_annotation.as_mut() {
            annotation.set_bounds(bounds);
            annotation.set_rotation(self.rotation);
            log::trace!("live annotation {} bounds {:?}", annotation.id(), bounds);
        }
    }

    /// Attach a page-space preview that follows every manipulation until commit
    pub fn begin_live_preview(&mut self, spaces: &dyn CoordinateSpaces) -> Option<AnnotationId> {
        let annotation = self.make_annotation(spaces)?;
        let id = annotation.id();
        self.live_annotation = Some(annotation);
        Some(id)
    }

    /// Materialize a committed annotation from the current geometry.
    ///
    /// Only image content produces one.
    pub fn make_annotation(&self, spaces: &dyn CoordinateSpaces) -> Option<ImageAnnotation> {
        let image = self.content.as_image()?;
        let mut annotation = ImageAnnotation::new(self.page_bounds(spaces), image.clone());
        annotation.set_rotation(self.rotation);
        Some(annotation)
    }

    /// Single-touch drag by an incremental `translation`, keeping part of the sticker on screen
    pub fn pan(
        &mut self,
        phase: GesturePhase,
        translation: Point,
        overlay_size: Size,
        spaces: &dyn CoordinateSpaces,
    ) {
        if !self.selected || phase != GesturePhase::Changed {
            return;
        }

        let margin = self.config.min_visible_fraction.max(0.0);
        let (w, h) = (self.size.width, self.size.height);

        let min_x = -margin * w;
        let max_x = overlay_size.width + margin * w;
        let min_y = -margin * h;
        let max_y = overlay_size.height + margin * h;

        let proposed = self.center.offset(translation.x, translation.y);
        self.center = Point::new(proposed.x.max(min_x).min(max_x), proposed.y.max(min_y).min(max_y));

        log::trace!("pan to {:?}", self.center);
        self.update_annotation_bounds(spaces);
    }

    pub fn rotate(&mut self, phase: GesturePhase, rotation: f32, spaces: &dyn CoordinateSpaces) {
        match phase {
            GesturePhase::Began => self.rotation_start = self.rotation,
            GesturePhase::Changed => self.apply_rotation(self.rotation_start + rotation, spaces),
            _ => {}
        }
    }

    /// Set the absolute rotation angle
    pub fn apply_rotation(&mut self, radians: f32, spaces: &dyn CoordinateSpaces) {
        self.rotation = radians;
        self.update_annotation_bounds(spaces);
    }

    /// Pinch-to-scale; inert unless enabled in the config
    pub fn pinch(&mut self, phase: GesturePhase, scale: f32, spaces: &dyn CoordinateSpaces) {
        if !self.config.pinch_to_scale {
            return;
        }

        match phase {
            GesturePhase::Began => {
                self.pinch_start_scale = self.scale_factor;
                self.initial_size = self.size;
            }
            GesturePhase::Changed => {
                if !scale.is_finite() || scale <= 0.0 {
                    return;
                }
                self.scale_factor = self.pinch_start_scale * scale;
                self.update_size_for_scale(scale, spaces);
            }
            _ => {}
        }
    }

    /// Resize to `initial_size × scale` around the unchanged center
    pub fn update_size_for_scale(&mut self, scale: f32, spaces: &dyn CoordinateSpaces) {
        self.size = self.initial_size.scaled(scale);
        self.layout();
        self.update_annotation_bounds(spaces);
    }

    /// Drag on one of the handles; `location` is the touch in overlay space
    pub fn handle_pan(
        &mut self,
        handle_type: HandleType,
        phase: GesturePhase,
        location: Point,
        spaces: &dyn CoordinateSpaces,
    ) {
        match phase {
            GesturePhase::Began => {
                let Some(handle) = self.handle(handle_type) else {
                    return;
                };
                let handle_position = self.local_to_overlay(handle.center());

                self.initial_size = self.size;
                self.handle_drag = Some(HandleDrag {
                    handle_type,
                    initial_size: self.size,
                    initial_center: self.center,
                    initial_scale_factor: self.scale_factor,
                    initial_handle_position: handle_position,
                    initial_touch: location,
                    initial_rotation: self.rotation,
                });
            }
            GesturePhase::Changed => {
                let Some(drag) = self.handle_drag else {
                    return;
                };

                match drag.update(location, self.config.min_edge_extent) {
                    HandleUpdate::Scale { ratio, scale_factor } => {
                        self.scale_factor = scale_factor;
                        self.update_size_for_scale(ratio, spaces);
                    }
                    HandleUpdate::Resize { size, center } => {
                        self.size = size;
                        self.center = center;
                        self.layout();
                        self.update_annotation_bounds(spaces);
                    }
                    HandleUpdate::Rejected => {
                        log::debug!("{:?} drag to {:?} rejected", handle_type, location);
                        self.update_annotation_bounds(spaces);
                    }
                }
            }
            GesturePhase::Ended | GesturePhase::Cancelled | GesturePhase::Failed => {
                self.handle_drag = None;
            }
        }
    }
}

/// Size of a new image sticker: aspect-fit `image` into `container`, then take `fraction` of it
pub fn frame_for_image(image: Size, container: Size, fraction: f32) -> Size {
    let (Some(image_aspect), Some(view_aspect)) = (image.aspect_ratio(), container.aspect_ratio())
    else {
        return Size::ZERO;
    };
    if image_aspect <= 0.0 {
        return Size::ZERO;
    }

    let fitted = if view_aspect > image_aspect {
        Size::new(container.height * image_aspect, container.height)
    } else {
        Size::new(container.width, container.width / image_aspect)
    };

    fitted.scaled(fraction)
}

//! Transparent editing layer placed over a rendered page
//!
//! Owns at most one active sticker and routes gestures to it. A tap away from
//! the sticker commits it into the host's page model.

use crate::config::EditorConfig;
use crate::gesture::{GestureEvent, GesturePhase};
use crate::handle::HandleType;
use crate::space::{AnnotationSink, CoordinateSpaces};
use crate::sticker::{Sticker, StickerHit};
use annotation_model::{AnnotationId, Point, Rect, StampImage};

/// Result of hit-testing an overlay-space point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTarget {
    Handle(HandleType),
    Sticker,
    Overlay,
}

impl From<Option<StickerHit>> for HitTarget {
    fn from(hit: Option<StickerHit>) -> Self {
        match hit {
            Some(StickerHit::Handle(handle_type)) => HitTarget::Handle(handle_type),
            Some(StickerHit::Body) => HitTarget::Sticker,
            None => HitTarget::Overlay,
        }
    }
}

/// Pan in progress, bound to whatever was under the touch at `Began`
#[derive(Debug, Clone, Copy, PartialEq)]
enum ActivePan {
    Handle(HandleType),
    Sticker { last_location: Point },
}

#[derive(Debug, Clone)]
pub struct Overlay {
    bounds: Rect,
    config: EditorConfig,
    sticker: Option<Sticker>,
    active_pan: Option<ActivePan>,
}

impl Overlay {
    pub fn new(bounds: Rect, config: EditorConfig) -> Self {
        Self { bounds: bounds.standardized(), config, sticker: None, active_pan: None }
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn set_bounds(&mut self, bounds: Rect) {
        self.bounds = bounds.standardized();
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn sticker(&self) -> Option<&Sticker> {
        self.sticker.as_ref()
    }

    pub fn sticker_mut(&mut self) -> Option<&mut Sticker> {
        self.sticker.as_mut()
    }

    pub fn has_active_sticker(&self) -> bool {
        self.sticker.is_some()
    }

    /// Begin adding an image annotation: a pre-selected sticker centered in the overlay
    pub fn add_pending_annotation(&mut self, image: StampImage) -> &mut Sticker {
        let sticker = Sticker::new_image(image, self.bounds, self.config.clone());
        self.add_sticker(sticker)
    }

    pub fn add_image(&mut self, image: StampImage) -> &mut Sticker {
        self.add_pending_annotation(image)
    }

    /// Make `sticker` the active one, replacing any existing sticker
    pub fn add_sticker(&mut self, mut sticker: Sticker) -> &mut Sticker {
        if self.sticker.is_some() {
            log::debug!("replacing active sticker without committing it");
        }

        sticker.set_selected(true);
        self.active_pan = None;
        self.sticker.insert(sticker)
    }

    /// Remove the active sticker without committing it
    pub fn discard(&mut self) -> Option<Sticker> {
        self.active_pan = None;
        self.sticker.take()
    }

    pub fn hit_test(&self, location: Point) -> HitTarget {
        match &self.sticker {
            Some(sticker) => sticker.hit_test_overlay(location).into(),
            None => HitTarget::Overlay,
        }
    }

    /// Materialize the active sticker into the host's page model and clear it.
    ///
    /// Returns the id of the committed annotation; non-image content commits nothing.
    pub fn commit<H>(&mut self, host: &mut H) -> Option<AnnotationId>
    where
        H: CoordinateSpaces + AnnotationSink,
    {
        self.active_pan = None;
        let mut sticker = self.sticker.take()?;

        sticker.update_annotation_bounds(&*host);
        let annotation = match sticker.live_annotation() {
            Some(live) => Some(live.clone()),
            None => sticker.make_annotation(&*host),
        };

        let Some(annotation) = annotation else {
            log::debug!("discarding {} sticker on commit", sticker.content().kind_name());
            return None;
        };

        let id = annotation.id();
        log::debug!(
            "committing annotation {} at {:?} rotated {}",
            id,
            annotation.bounds(),
            annotation.rotation()
        );
        host.add_annotation(annotation);
        Some(id)
    }

    /// Single tap: toggles selection on the sticker or one of its visible
    /// handles, commits anywhere else
    pub fn handle_tap<H>(&mut self, location: Point, host: &mut H) -> Option<AnnotationId>
    where
        H: CoordinateSpaces + AnnotationSink,
    {
        match self.hit_test(location) {
            HitTarget::Handle(_) | HitTarget::Sticker => {
                if let Some(sticker) = self.sticker.as_mut() {
                    sticker.toggle_selection();
                }
                None
            }
            HitTarget::Overlay => self.commit(host),
        }
    }

    /// Route one recognizer callback; returns the id of an annotation committed by it
    pub fn dispatch<H>(&mut self, event: GestureEvent, host: &mut H) -> Option<AnnotationId>
    where
        H: CoordinateSpaces + AnnotationSink,
    {
        match event {
            GestureEvent::Tap { location } => return self.handle_tap(location, host),
            GestureEvent::Pan { phase, location } => self.pan(phase, location, &*host),
            GestureEvent::Rotation { phase, rotation } => {
                if let Some(sticker) = self.sticker.as_mut() {
                    sticker.rotate(phase, rotation, &*host);
                }
            }
            GestureEvent::Pinch { phase, scale } => {
                if let Some(sticker) = self.sticker.as_mut() {
                    sticker.pinch(phase, scale, &*host);
                }
            }
        }
        None
    }

    fn pan(&mut self, phase: GesturePhase, location: Point, spaces: &dyn CoordinateSpaces) {
        let overlay_size = self.bounds.size;

        if phase == GesturePhase::Began {
            self.active_pan = match self.hit_test(location) {
                HitTarget::Handle(handle_type) => Some(ActivePan::Handle(handle_type)),
                HitTarget::Sticker => Some(ActivePan::Sticker { last_location: location }),
                HitTarget::Overlay => None,
            };
        }

        let (Some(active), Some(sticker)) = (self.active_pan, self.sticker.as_mut()) else {
            return;
        };

        match active {
            ActivePan::Handle(handle_type) => sticker.handle_pan(handle_type, phase, location, spaces),
            ActivePan::Sticker { last_location } => {
                let translation = Point::new(location.x - last_location.x, location.y - last_location.y);
                sticker.pan(phase, translation, overlay_size, spaces);
                self.active_pan = Some(ActivePan::Sticker { last_location: location });
            }
        }

        if phase.is_terminal() {
            self.active_pan = None;
        }
    }
}

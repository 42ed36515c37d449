//! Drawing seam between committed annotations and whatever renders the page
//!
//! The page renderer hands an annotation a [`GraphicsContext`] during paint. The
//! PDF engine implements it by emitting content-stream operators; tests use
//! [`RecordingContext`] to observe what an annotation asked for.

use crate::content::StampImage;
use crate::geometry::{Point, Rect, Transform};

/// Which page box the host is rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayBox {
    #[default]
    MediaBox,
    CropBox,
}

/// Minimal state-machine style drawing surface in page space (y-up)
pub trait GraphicsContext {
    fn save_state(&mut self);
    fn restore_state(&mut self);
    fn translate(&mut self, dx: f32, dy: f32);
    /// Counter-clockwise rotation in a y-up space
    fn rotate(&mut self, radians: f32);
    /// Draw `image` scaled to fill `rect` in the current user space
    fn draw_image(&mut self, image: &StampImage, rect: Rect);
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    SaveState,
    RestoreState,
    Translate { dx: f32, dy: f32 },
    Rotate { radians: f32 },
    DrawImage { rect: Rect, ctm: Transform },
}

/// Records draw calls and tracks the current transformation matrix
#[derive(Debug, Default)]
pub struct RecordingContext {
    commands: Vec<DrawCommand>,
    ctm: Transform,
    stack: Vec<Transform>,
}

impl RecordingContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn current_transform(&self) -> Transform {
        self.ctm
    }

    /// Depth of unmatched `save_state` calls
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Where a user-space point of the last drawn image lands on the page
    pub fn last_image_transform(&self) -> Option<Transform> {
        self.commands.iter().rev().find_map(|command| match command {
            DrawCommand::DrawImage { ctm, .. } => Some(*ctm),
            _ => None,
        })
    }

    /// Page-space position of `point` under the current transform
    pub fn map(&self, point: Point) -> Point {
        self.ctm.apply(point)
    }
}

impl GraphicsContext for RecordingContext {
    fn save_state(&mut self) {
        self.stack.push(self.ctm);
        self.commands.push(DrawCommand::SaveState);
    }

    fn restore_state(&mut self) {
        if let Some(saved) = self.stack.pop() {
            self.ctm = saved;
        }
        self.commands.push(DrawCommand::RestoreState);
    }

    fn translate(&mut self, dx: f32, dy: f32) {
        self.ctm = Transform::translation(dx, dy).then(&self.ctm);
        self.commands.push(DrawCommand::Translate { dx, dy });
    }

    fn rotate(&mut self, radians: f32) {
        self.ctm = Transform::rotation(radians).then(&self.ctm);
        self.commands.push(DrawCommand::Rotate { radians });
    }

    fn draw_image(&mut self, _image: &StampImage, rect: Rect) {
        self.commands.push(DrawCommand::DrawImage { rect, ctm: self.ctm });
    }
}

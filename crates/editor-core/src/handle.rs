//! Sticker manipulation handles
//!
//! Eight handles sit on the sticker's selection border: four corner handles that
//! scale the sticker uniformly about its center, and four edge handles that
//! resize a single axis while the opposite edge stays put. Handle frames are in
//! sticker-local coordinates (origin at the sticker's unrotated top-left) and
//! deliberately overhang the sticker's bounds.

use crate::config::EditorConfig;
use annotation_model::{Point, Rect, Size};

/// Type of manipulation handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandleType {
    /// Corner handles scale uniformly from the center
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,

    /// Edge handles for resizing in one dimension
    TopEdge,
    BottomEdge,
    LeftEdge,
    RightEdge,
}

impl HandleType {
    pub const CORNERS: [HandleType; 4] =
        [HandleType::TopLeft, HandleType::TopRight, HandleType::BottomLeft, HandleType::BottomRight];

    pub const EDGES: [HandleType; 4] =
        [HandleType::TopEdge, HandleType::BottomEdge, HandleType::LeftEdge, HandleType::RightEdge];

    /// Corners first, then edges; this is also the hit-test order
    pub const ALL: [HandleType; 8] = [
        HandleType::TopLeft,
        HandleType::TopRight,
        HandleType::BottomLeft,
        HandleType::BottomRight,
        HandleType::TopEdge,
        HandleType::BottomEdge,
        HandleType::LeftEdge,
        HandleType::RightEdge,
    ];

    pub fn is_corner(self) -> bool {
        matches!(self, Self::TopLeft | Self::TopRight | Self::BottomLeft | Self::BottomRight)
    }
}

/// A laid-out handle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Handle {
    pub handle_type: HandleType,
    /// Frame in sticker-local coordinates
    pub frame: Rect,
    pub corner_radius: f32,
    pub visible: bool,
}

impl Handle {
    /// Check if a sticker-local point hits this handle
    pub fn hit_test(&self, point: Point) -> bool {
        self.visible && self.frame.contains(point)
    }

    pub fn center(&self) -> Point {
        self.frame.center()
    }
}

/// Lay out all eight handles for a sticker of `size`
///
/// Corner handles are squares centered on the corners. Edge handles are capsules
/// centered on the edge midpoints, shifted so they straddle the selection border.
pub fn layout_handles(size: Size, config: &EditorConfig, visible: bool) -> [Handle; 8] {
    HandleType::ALL.map(|handle_type| Handle {
        handle_type,
        frame: handle_frame(handle_type, size, config),
        corner_radius: if handle_type.is_corner() {
            config.corner_handle_size / 2.0
        } else {
            config.edge_handle_corner_radius
        },
        visible,
    })
}

fn handle_frame(handle_type: HandleType, size: Size, config: &EditorConfig) -> Rect {
    let corner = config.corner_handle_size;
    let long = config.edge_handle_length;
    let short = config.edge_handle_thickness;
    let border = config.border_width;
    let (w, h) = (size.width, size.height);

    match handle_type {
        HandleType::TopLeft => Rect::new(-corner / 2.0, -corner / 2.0, corner, corner),
        HandleType::TopRight => Rect::new(w - corner / 2.0, -corner / 2.0, corner, corner),
        HandleType::BottomLeft => Rect::new(-corner / 2.0, h - corner / 2.0, corner, corner),
        HandleType::BottomRight => Rect::new(w - corner / 2.0, h - corner / 2.0, corner, corner),
        HandleType::TopEdge => Rect::new((w - long) / 2.0, -(short - border) / 2.0, long, short),
        HandleType::BottomEdge => {
            Rect::new((w - long) / 2.0, h - (short + border) / 2.0, long, short)
        }
        HandleType::LeftEdge => Rect::new(-(short - border) / 2.0, (h - long) / 2.0, short, long),
        HandleType::RightEdge => {
            Rect::new(w - (short + border) / 2.0, (h - long) / 2.0, short, long)
        }
    }
}

/// Outcome of one `Changed` callback on a handle drag
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HandleUpdate {
    /// Uniform scale relative to the size at drag start
    Scale { ratio: f32, scale_factor: f32 },
    /// Single-axis resize with the opposite edge kept in place
    Resize { size: Size, center: Point },
    /// Degenerate or too-small result; geometry stays as it is
    Rejected,
}

/// Active handle drag, captured at `Began`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandleDrag {
    pub handle_type: HandleType,
    /// Sticker size at drag start
    pub initial_size: Size,
    /// Sticker center at drag start, overlay space
    pub initial_center: Point,
    pub initial_scale_factor: f32,
    /// Handle center at drag start, overlay space
    pub initial_handle_position: Point,
    /// Touch location at drag start, overlay space
    pub initial_touch: Point,
    /// Sticker rotation at drag start, radians
    pub initial_rotation: f32,
}

impl HandleDrag {
    /// Geometry update for the touch now at `location` (overlay space)
    pub fn update(&self, location: Point, min_edge_extent: f32) -> HandleUpdate {
        // Delta from the touch at drag start
        let delta_x = location.x - self.initial_touch.x;
        let delta_y = location.y - self.initial_touch.y;
        let center = self.initial_center;
        let size = self.initial_size;

        match self.handle_type {
            HandleType::TopLeft
            | HandleType::TopRight
            | HandleType::BottomLeft
            | HandleType::BottomRight => {
                let initial_distance = center.distance_to(&self.initial_handle_position);
                if initial_distance <= f32::EPSILON {
                    log::debug!("ignoring corner drag: handle starts on the sticker center");
                    return HandleUpdate::Rejected;
                }

                let ratio = center.distance_to(&location) / initial_distance;
                if !ratio.is_finite() || ratio <= 0.0 {
                    return HandleUpdate::Rejected;
                }

                HandleUpdate::Scale { ratio, scale_factor: self.initial_scale_factor * ratio }
            }

            HandleType::TopEdge | HandleType::BottomEdge => {
                let (_, local_dy) = self.to_local(delta_x, delta_y);
                let height = if self.handle_type == HandleType::TopEdge {
                    size.height - local_dy
                } else {
                    size.height + local_dy
                };
                if height <= min_edge_extent {
                    return HandleUpdate::Rejected;
                }
                HandleUpdate::Resize {
                    size: Size::new(size.width, height),
                    center: self.shift_center(0.0, local_dy / 2.0),
                }
            }

            HandleType::LeftEdge | HandleType::RightEdge => {
                let (local_dx, _) = self.to_local(delta_x, delta_y);
                let width = if self.handle_type == HandleType::LeftEdge {
                    size.width - local_dx
                } else {
                    size.width + local_dx
                };
                if width <= min_edge_extent {
                    return HandleUpdate::Rejected;
                }
                HandleUpdate::Resize {
                    size: Size::new(width, size.height),
                    center: self.shift_center(local_dx / 2.0, 0.0),
                }
            }
        }
    }

    /// Rotate an overlay-space delta into the sticker's unrotated axes
    fn to_local(&self, dx: f32, dy: f32) -> (f32, f32) {
        let (sin, cos) = self.initial_rotation.sin_cos();
        (dx * cos + dy * sin, -dx * sin + dy * cos)
    }

    /// Initial center moved by a sticker-local offset
    fn shift_center(&self, local_x: f32, local_y: f32) -> Point {
        let (sin, cos) = self.initial_rotation.sin_cos();
        Point::new(
            self.initial_center.x + local_x * cos - local_y * sin,
            self.initial_center.y + local_x * sin + local_y * cos,
        )
    }
}

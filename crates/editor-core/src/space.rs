//! Coordinate pipeline between the editing overlay and PDF page space
//!
//! Three spaces are involved:
//! - overlay space: the transparent editing layer, y-down, origin top-left
//! - page-view space: the view that displays the rendered page, y-down
//! - page space: the PDF page itself, y-up, origin bottom-left, in points
//!
//! Sticker geometry lives in overlay space; committed annotations live in page
//! space. Rects go overlay → page view → page one stage at a time.

use annotation_model::{ImageAnnotation, PageAnnotations, Point, Rect, Size};

/// Rect conversions supplied by the page-rendering host
pub trait CoordinateSpaces {
    fn overlay_to_view(&self, rect: Rect) -> Rect;
    fn view_to_overlay(&self, rect: Rect) -> Rect;
    fn view_to_page(&self, rect: Rect) -> Rect;
    fn page_to_view(&self, rect: Rect) -> Rect;

    /// Overlay space → page-view space → page space
    fn overlay_rect_to_page(&self, rect: Rect) -> Rect {
        self.view_to_page(self.overlay_to_view(rect))
    }

    /// Page space → page-view space → overlay space
    fn page_rect_to_overlay(&self, rect: Rect) -> Rect {
        self.view_to_overlay(self.page_to_view(rect))
    }
}

/// Receives committed annotations (the host's page model)
pub trait AnnotationSink {
    fn add_annotation(&mut self, annotation: ImageAnnotation);
}

impl AnnotationSink for PageAnnotations {
    fn add_annotation(&mut self, annotation: ImageAnnotation) {
        self.add(annotation);
    }
}

/// How a single page is laid out inside the page view, and where the overlay sits
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageViewport {
    /// Overlay's top-left corner in page-view coordinates
    pub overlay_origin: Point,
    /// Page's top-left corner in page-view coordinates
    pub page_origin: Point,
    /// Page-view points per page point
    pub scale: f32,
    /// Page size in page points
    pub page_size: Size,
    /// Overlay size in overlay points
    pub overlay_size: Size,
}

impl PageViewport {
    pub fn new(
        overlay_origin: Point,
        page_origin: Point,
        scale: f32,
        page_size: Size,
        overlay_size: Size,
    ) -> Self {
        let scale = if scale.is_finite() && scale > 0.0 { scale } else { 1.0 };
        Self { overlay_origin, page_origin, scale, page_size, overlay_size }
    }

    /// Aspect-fit `page_size` centered in a view of `view_size`; the overlay covers the page.
    pub fn fit(view_size: Size, page_size: Size) -> Self {
        let scale = if view_size.is_empty() || page_size.is_empty() {
            1.0
        } else {
            (view_size.width / page_size.width).min(view_size.height / page_size.height)
        };

        let displayed = page_size.scaled(scale);
        let page_origin = Point::new(
            (view_size.width - displayed.width) / 2.0,
            (view_size.height - displayed.height) / 2.0,
        );

        Self::new(page_origin, page_origin, scale, page_size, displayed)
    }

    /// Overlay bounds in its own coordinate space
    pub fn overlay_bounds(&self) -> Rect {
        Rect { origin: Point::ZERO, size: self.overlay_size }
    }

    pub fn view_point_to_page(&self, point: Point) -> Point {
        Point::new(
            (point.x - self.page_origin.x) / self.scale,
            self.page_size.height - (point.y - self.page_origin.y) / self.scale,
        )
    }

    pub fn page_point_to_view(&self, point: Point) -> Point {
        Point::new(
            point.x * self.scale + self.page_origin.x,
            (self.page_size.height - point.y) * self.scale + self.page_origin.y,
        )
    }
}

impl CoordinateSpaces for PageViewport {
    fn overlay_to_view(&self, rect: Rect) -> Rect {
        Rect { origin: rect.origin.offset(self.overlay_origin.x, self.overlay_origin.y), ..rect }
    }

    fn view_to_overlay(&self, rect: Rect) -> Rect {
        Rect { origin: rect.origin.offset(-self.overlay_origin.x, -self.overlay_origin.y), ..rect }
    }

    fn view_to_page(&self, rect: Rect) -> Rect {
        let rect = rect.standardized();
        let top_left = self.view_point_to_page(Point::new(rect.min_x(), rect.min_y()));
        let bottom_right = self.view_point_to_page(Point::new(rect.max_x(), rect.max_y()));
        Rect::from_corners(top_left, bottom_right)
    }

    fn page_to_view(&self, rect: Rect) -> Rect {
        let rect = rect.standardized();
        let bottom_left = self.page_point_to_view(Point::new(rect.min_x(), rect.min_y()));
        let top_right = self.page_point_to_view(Point::new(rect.max_x(), rect.max_y()));
        Rect::from_corners(bottom_left, top_right)
    }
}

/// One page being edited: its layout plus its committed annotations
#[derive(Debug, Clone)]
pub struct PageSession {
    pub viewport: PageViewport,
    pub annotations: PageAnnotations,
}

impl PageSession {
    pub fn new(page_index: u32, viewport: PageViewport) -> Self {
        Self { viewport, annotations: PageAnnotations::new(page_index) }
    }
}

impl CoordinateSpaces for PageSession {
    fn overlay_to_view(&self, rect: Rect) -> Rect {
        self.viewport.overlay_to_view(rect)
    }

    fn view_to_overlay(&self, rect: Rect) -> Rect {
        self.viewport.view_to_overlay(rect)
    }

    fn view_to_page(&self, rect: Rect) -> Rect {
        self.viewport.view_to_page(rect)
    }

    fn page_to_view(&self, rect: Rect) -> Rect {
        self.viewport.page_to_view(rect)
    }
}

impl AnnotationSink for PageSession {
    fn add_annotation(&mut self, annotation: ImageAnnotation) {
        self.annotations.add(annotation);
    }
}

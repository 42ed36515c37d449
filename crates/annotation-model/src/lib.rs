//! Annotation data model
//!
//! Geometry primitives, sticker content kinds, committed image stamps and the
//! graphics seam they draw through.

pub mod annotation;
pub mod content;
pub mod error;
pub mod geometry;
pub mod graphics;

pub use annotation::{AnnotationId, ImageAnnotation, PageAnnotations};
pub use content::{Color, StampImage, StickerContent};
pub use error::ModelError;
pub use geometry::{Point, Rect, Size, Transform};
pub use graphics::{DisplayBox, DrawCommand, GraphicsContext, RecordingContext};

//! Interactive editing core: the overlay, its sticker and the sticker's handles
//!
//! Everything here is synchronous and driven by [`GestureEvent`]s. Geometry is
//! kept in overlay space and mirrored into page space through the host's
//! [`CoordinateSpaces`].

pub mod config;
pub mod gesture;
pub mod handle;
pub mod overlay;
pub mod space;
pub mod sticker;

pub use config::{ConfigError, EditorConfig};
pub use gesture::{GestureEvent, GesturePhase};
pub use handle::{layout_handles, Handle, HandleDrag, HandleType, HandleUpdate};
pub use overlay::{HitTarget, Overlay};
pub use space::{AnnotationSink, CoordinateSpaces, PageSession, PageViewport};
pub use sticker::{frame_for_image, Sticker, StickerHit};

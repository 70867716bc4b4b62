//! Adwaita Animated Widgets
//!
//! Layout containers driven by the animation engine:
//!
//! - **CarouselBox**: swipeable pages with animated reveal, snap points and
//!   position compensation when pages come and go
//! - **AdaptivePreview**: device-sized preview with spring-animated rotation
//!   and fit-to-viewport scaling

pub mod adaptive_preview;
pub mod carousel_box;
pub mod presets;

pub use adaptive_preview::{
    fit_scale, shortest_rotation_target, triangle_wave, AdaptivePreview, PreviewTransform,
    ScreenRotation, TransformSink, MAX_SCALE, MIN_SCALE,
};
pub use carousel_box::CarouselBox;
pub use presets::{DevicePreset, ShellPreset};

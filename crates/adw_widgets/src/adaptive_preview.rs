//! Adaptive preview
//!
//! Shows content at the screen size of a mobile device, scaled down to fit the
//! available space and rotated in quarter turns.
//!
//! Rotation is animated with a spring whose value is the screen angle in
//! degrees, counterclockwise. The content is laid out for the final
//! orientation straight away and drawn turned by whatever part of the rotation
//! is still left, so it spins into place. The scale follows the instantaneous
//! angle through a triangle wave: it is the upright fit at multiples of 180°,
//! the sideways fit at odd multiples of 90° and blends in between.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use adw_animation::{lerp, AnimationState, AnimationTarget, SpringAnimation, SpringParams};
use adw_core::{Affine2D, Host, Orientation, Widget};

use crate::presets::{DevicePreset, ShellPreset};

/// Smallest scale applied when scaling to fit
pub const MIN_SCALE: f64 = 0.25;
/// Largest scale applied when scaling to fit
pub const MAX_SCALE: f64 = 1.0;

/// Screen orientation in quarter turns
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ScreenRotation {
    #[default]
    Rotate0,
    Rotate90,
    Rotate180,
    Rotate270,
}

impl ScreenRotation {
    pub fn degrees(self) -> f64 {
        match self {
            ScreenRotation::Rotate0 => 0.0,
            ScreenRotation::Rotate90 => 90.0,
            ScreenRotation::Rotate180 => 180.0,
            ScreenRotation::Rotate270 => 270.0,
        }
    }

    /// Whether width and height are swapped
    pub fn is_sideways(self) -> bool {
        matches!(self, ScreenRotation::Rotate90 | ScreenRotation::Rotate270)
    }

    /// One quarter turn counterclockwise
    pub fn left(self) -> Self {
        match self {
            ScreenRotation::Rotate0 => ScreenRotation::Rotate90,
            ScreenRotation::Rotate90 => ScreenRotation::Rotate180,
            ScreenRotation::Rotate180 => ScreenRotation::Rotate270,
            ScreenRotation::Rotate270 => ScreenRotation::Rotate0,
        }
    }

    /// One quarter turn clockwise
    pub fn right(self) -> Self {
        match self {
            ScreenRotation::Rotate0 => ScreenRotation::Rotate270,
            ScreenRotation::Rotate90 => ScreenRotation::Rotate0,
            ScreenRotation::Rotate180 => ScreenRotation::Rotate90,
            ScreenRotation::Rotate270 => ScreenRotation::Rotate180,
        }
    }
}

/// Angle to animate to so that going from `current` to `target` takes at
/// most half a turn
///
/// `current` is normalized into `[0, 360)` first; the result is `target`
/// moved by a full turn when that is shorter.
pub fn shortest_rotation_target(current: f64, target: f64) -> f64 {
    let current = current.rem_euclid(360.0);
    let target = target.rem_euclid(360.0);

    if target - current > 180.0 {
        target - 360.0
    } else if current - target > 180.0 {
        target + 360.0
    } else {
        target
    }
}

/// 0 at multiples of 180°, 1 at odd multiples of 90°, linear in between
pub fn triangle_wave(degrees: f64) -> f64 {
    let x = degrees / 180.0;
    2.0 * (x - (x + 0.5).floor()).abs()
}

/// Scale fitting a `child_width` x `child_height` box into `width` x
/// `height`, clamped to [`MIN_SCALE`, `MAX_SCALE`]
pub fn fit_scale(width: i32, height: i32, child_width: i32, child_height: i32) -> f64 {
    if child_width <= 0 || child_height <= 0 {
        return MAX_SCALE;
    }
    let scale = (f64::from(width) / f64::from(child_width)).min(f64::from(height) / f64::from(child_height));
    scale.clamp(MIN_SCALE, MAX_SCALE)
}

/// Placement of the previewed screen inside the preview
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PreviewTransform {
    /// Width the content is laid out at
    pub width: i32,
    /// Height the content is laid out at
    pub height: i32,
    pub scale: f64,
    /// Animated screen angle in degrees
    pub angle: f64,
    /// Maps content coordinates into the preview
    pub transform: Affine2D,
}

/// Receives the content transform on every layout and rotation frame
pub trait TransformSink {
    fn apply_transform(&self, transform: &PreviewTransform);
}

impl TransformSink for Widget {
    fn apply_transform(&self, transform: &PreviewTransform) {
        self.allocate(transform.width, transform.height, transform.transform);
    }
}

#[derive(Clone, Debug)]
struct PreviewState {
    screen_width: i32,
    screen_height: i32,
    top_bar_height: i32,
    bottom_bar_height: i32,
    device_preset: DevicePreset,
    shell_preset: ShellPreset,
    rotation: ScreenRotation,
    /// Where the rotation spring is heading
    target_angle: f64,
    angle: f64,
    scale_to_fit: bool,
    viewport: Option<(i32, i32)>,
}

impl Default for PreviewState {
    fn default() -> Self {
        let device = DevicePreset::default();
        let shell = ShellPreset::default();
        let (screen_width, screen_height) = device.size().unwrap_or((360, 720));
        let (top_bar_height, bottom_bar_height) = shell.bars().unwrap_or((0, 0));

        Self {
            screen_width,
            screen_height,
            top_bar_height,
            bottom_bar_height,
            device_preset: device,
            shell_preset: shell,
            rotation: ScreenRotation::Rotate0,
            target_angle: 0.0,
            angle: 0.0,
            scale_to_fit: true,
            viewport: None,
        }
    }
}

impl PreviewState {
    fn screen_size(&self) -> (i32, i32) {
        if self.rotation.is_sideways() {
            (self.screen_height, self.screen_width)
        } else {
            (self.screen_width, self.screen_height)
        }
    }

    fn compute_transform(&self, width: i32, height: i32) -> PreviewTransform {
        let (child_width, child_height) = self.screen_size();

        let scale = if self.scale_to_fit {
            let upright = fit_scale(width, height, self.screen_width, self.screen_height);
            let sideways = fit_scale(width, height, self.screen_height, self.screen_width);
            lerp(upright, sideways, triangle_wave(self.angle))
        } else {
            1.0
        };

        let remaining = self.angle - self.target_angle;
        let transform = Affine2D::translation((f64::from(width) / 2.0).round(), (f64::from(height) / 2.0).round())
            .then(&Affine2D::rotation_degrees(-remaining))
            .then(&Affine2D::scale(scale, scale))
            .then(&Affine2D::translation(
                -(f64::from(child_width) / 2.0).round(),
                -(f64::from(child_height) / 2.0).round(),
            ));

        PreviewTransform {
            width: child_width,
            height: child_height,
            scale,
            angle: self.angle,
            transform,
        }
    }
}

struct PreviewShared {
    widget: Rc<Widget>,
    state: RefCell<PreviewState>,
    sink: RefCell<Option<Rc<dyn TransformSink>>>,
    rotation_animation: SpringAnimation,
}

impl PreviewShared {
    fn set_angle(&self, angle: f64) {
        self.state.borrow_mut().angle = angle;
        self.refresh();
    }

    /// Recompute the transform for the last viewport and push it to the sink
    fn refresh(&self) -> Option<PreviewTransform> {
        let transform = {
            let state = self.state.borrow();
            let (width, height) = state.viewport?;
            state.compute_transform(width, height)
        };

        let sink = self.sink.borrow().clone();
        if let Some(sink) = sink {
            sink.apply_transform(&transform);
        }
        self.widget.queue_allocate();
        Some(transform)
    }
}

/// Device-sized, rotatable preview of some content
#[derive(Clone)]
pub struct AdaptivePreview {
    shared: Rc<PreviewShared>,
}

impl AdaptivePreview {
    /// Create a preview hosted by `widget`, rotating with the widget's
    /// configured spring
    pub fn new(widget: Rc<Widget>) -> Self {
        let spring = widget.settings().spring;

        let shared = Rc::new_cyclic(|weak: &Weak<PreviewShared>| {
            let weak = weak.clone();
            let target = AnimationTarget::callback(move |angle| {
                if let Some(shared) = weak.upgrade() {
                    shared.set_angle(angle);
                }
            });

            let rotation_animation =
                SpringAnimation::new(&widget, 0.0, 0.0, SpringParams::from(&spring), target);
            rotation_animation.set_epsilon(spring.epsilon);

            PreviewShared {
                widget: widget.clone(),
                state: RefCell::new(PreviewState::default()),
                sink: RefCell::new(None),
                rotation_animation,
            }
        });

        Self { shared }
    }

    pub fn widget(&self) -> &Rc<Widget> {
        &self.shared.widget
    }

    /// The spring driving the screen angle
    pub fn rotation_animation(&self) -> &SpringAnimation {
        &self.shared.rotation_animation
    }

    /// Lay `content` out on every transform change
    pub fn set_content(&self, content: Rc<Widget>) {
        self.set_transform_sink(content);
    }

    pub fn set_transform_sink(&self, sink: Rc<dyn TransformSink>) {
        *self.shared.sink.borrow_mut() = Some(sink);
        self.shared.refresh();
    }

    // =========================================================================
    // Screen
    // =========================================================================

    pub fn device_preset(&self) -> DevicePreset {
        self.shared.state.borrow().device_preset
    }

    /// Switch to a device preset. `Custom` keeps the current size.
    pub fn set_device_preset(&self, preset: DevicePreset) {
        {
            let mut state = self.shared.state.borrow_mut();
            state.device_preset = preset;
            if let Some((width, height)) = preset.size() {
                state.screen_width = width;
                state.screen_height = height;
            }
        }
        self.shared.refresh();
    }

    /// Unrotated screen size
    pub fn set_screen_size(&self, width: i32, height: i32) {
        assert!(width > 0 && height > 0, "screen size must be positive");
        {
            let mut state = self.shared.state.borrow_mut();
            state.screen_width = width;
            state.screen_height = height;
            state.device_preset = DevicePreset::matching(width, height);
        }
        self.shared.refresh();
    }

    /// Screen size as currently oriented
    pub fn screen_size(&self) -> (i32, i32) {
        self.shared.state.borrow().screen_size()
    }

    pub fn shell_preset(&self) -> ShellPreset {
        self.shared.state.borrow().shell_preset
    }

    /// Switch to a shell preset. `Custom` keeps the current bars.
    pub fn set_shell_preset(&self, preset: ShellPreset) {
        let mut state = self.shared.state.borrow_mut();
        state.shell_preset = preset;
        if let Some((top, bottom)) = preset.bars() {
            state.top_bar_height = top;
            state.bottom_bar_height = bottom;
        }
    }

    pub fn set_bar_heights(&self, top_bar: i32, bottom_bar: i32) {
        assert!(top_bar >= 0 && bottom_bar >= 0, "bar heights must not be negative");
        let mut state = self.shared.state.borrow_mut();
        state.top_bar_height = top_bar;
        state.bottom_bar_height = bottom_bar;
        state.shell_preset = ShellPreset::matching(top_bar, bottom_bar);
    }

    pub fn bar_heights(&self) -> (i32, i32) {
        let state = self.shared.state.borrow();
        (state.top_bar_height, state.bottom_bar_height)
    }

    /// Space left for the application between the shell bars
    pub fn content_size(&self) -> (i32, i32) {
        let state = self.shared.state.borrow();
        let (width, height) = state.screen_size();
        let available = height - state.top_bar_height - state.bottom_bar_height;
        (width, available.max(0))
    }

    // =========================================================================
    // Rotation
    // =========================================================================

    pub fn rotation(&self) -> ScreenRotation {
        self.shared.state.borrow().rotation
    }

    /// Current, possibly mid-animation, screen angle in degrees
    pub fn angle(&self) -> f64 {
        self.shared.state.borrow().angle
    }

    /// Angle the rotation is heading to
    pub fn target_angle(&self) -> f64 {
        self.shared.state.borrow().target_angle
    }

    /// Turn the screen to `rotation` along the shorter way
    ///
    /// A rotation already in flight keeps its velocity. With reduced motion
    /// the screen turns immediately.
    pub fn rotate_to(&self, rotation: ScreenRotation) {
        let animation = &self.shared.rotation_animation;
        let velocity = if animation.state() == AnimationState::Playing {
            animation.velocity()
        } else {
            0.0
        };

        let (from, to) = {
            let mut state = self.shared.state.borrow_mut();
            let from = state.angle.rem_euclid(360.0);
            let to = shortest_rotation_target(from, rotation.degrees());
            state.rotation = rotation;
            state.target_angle = to;
            (from, to)
        };

        tracing::debug!("AdaptivePreview: rotating from {}° to {}°", from, to);

        animation.set_value_from(from);
        animation.set_value_to(to);
        animation.set_initial_velocity(velocity);
        animation.reset();

        if self.shared.widget.reduced_motion() {
            animation.skip();
        } else {
            animation.play();
        }
    }

    pub fn rotate_left(&self) {
        self.rotate_to(self.rotation().left());
    }

    pub fn rotate_right(&self) {
        self.rotate_to(self.rotation().right());
    }

    // =========================================================================
    // Layout
    // =========================================================================

    pub fn scale_to_fit(&self) -> bool {
        self.shared.state.borrow().scale_to_fit
    }

    /// Scale the screen down to fit when the preview is too small
    pub fn set_scale_to_fit(&self, scale_to_fit: bool) {
        self.shared.state.borrow_mut().scale_to_fit = scale_to_fit;
        self.shared.refresh();
    }

    /// Minimum and natural size along `orientation`
    pub fn measure(&self, orientation: Orientation) -> (i32, i32) {
        let state = self.shared.state.borrow();
        let (width, height) = state.screen_size();
        let natural = match orientation {
            Orientation::Horizontal => width,
            Orientation::Vertical => height,
        };
        let factor = if state.scale_to_fit { MIN_SCALE } else { 1.0 };
        ((f64::from(natural) * factor).round() as i32, natural)
    }

    /// Place the screen in a `width` x `height` viewport
    pub fn allocate(&self, width: i32, height: i32) -> PreviewTransform {
        self.shared.state.borrow_mut().viewport = Some((width, height));

        match self.shared.refresh() {
            Some(transform) => transform,
            None => self.shared.state.borrow().compute_transform(width, height),
        }
    }

    /// Transform for the last allocated viewport
    pub fn transform(&self) -> Option<PreviewTransform> {
        let state = self.shared.state.borrow();
        state.viewport.map(|(width, height)| state.compute_transform(width, height))
    }
}

impl fmt::Debug for AdaptivePreview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.borrow();
        f.debug_struct("AdaptivePreview")
            .field("device", &state.device_preset)
            .field("shell", &state.shell_preset)
            .field("rotation", &state.rotation)
            .field("angle", &state.angle)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adw_core::ManualFrameClock;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn preview() -> (Rc<ManualFrameClock>, AdaptivePreview) {
        let clock = Rc::new(ManualFrameClock::new());
        let widget = Widget::with_name("preview", clock.clone());
        widget.map();
        (clock, AdaptivePreview::new(widget))
    }

    #[test]
    fn test_triangle_wave() {
        assert!(approx(triangle_wave(0.0), 0.0));
        assert!(approx(triangle_wave(45.0), 0.5));
        assert!(approx(triangle_wave(90.0), 1.0));
        assert!(approx(triangle_wave(180.0), 0.0));
        assert!(approx(triangle_wave(-90.0), 1.0));
        assert!(approx(triangle_wave(270.0), 1.0));
    }

    #[test]
    fn test_shortest_rotation_target() {
        assert_eq!(shortest_rotation_target(10.0, 270.0), -90.0);
        assert_eq!(shortest_rotation_target(350.0, 10.0), 370.0);
        assert_eq!(shortest_rotation_target(0.0, 180.0), 180.0);
        assert_eq!(shortest_rotation_target(-90.0, 0.0), 360.0);
        assert_eq!(shortest_rotation_target(90.0, 180.0), 180.0);
    }

    #[test]
    fn test_rotation_steps_wrap() {
        assert_eq!(ScreenRotation::Rotate270.left(), ScreenRotation::Rotate0);
        assert_eq!(ScreenRotation::Rotate0.right(), ScreenRotation::Rotate270);
        assert!(ScreenRotation::Rotate90.is_sideways());
    }

    #[test]
    fn test_fit_scale_is_clamped() {
        assert!(approx(fit_scale(400, 400, 360, 720), 400.0 / 720.0));
        assert_eq!(fit_scale(50, 50, 360, 720), MIN_SCALE);
        assert_eq!(fit_scale(4000, 4000, 360, 720), MAX_SCALE);
    }

    #[test]
    fn test_scale_blends_through_rotation() {
        let mut state = PreviewState::default();
        // upright fits at 400/720, sideways would fit at 800/720 clamped to 1
        let upright = 400.0 / 720.0;
        assert!(approx(state.compute_transform(800, 400).scale, upright));

        state.angle = 45.0;
        state.target_angle = 90.0;
        assert!(approx(state.compute_transform(800, 400).scale, (upright + 1.0) / 2.0));

        state.angle = 90.0;
        state.rotation = ScreenRotation::Rotate90;
        let transform = state.compute_transform(800, 400);
        assert!(approx(transform.scale, 1.0));
        assert_eq!((transform.width, transform.height), (720, 360));
    }

    #[test]
    fn test_reduced_motion_rotates_immediately() {
        let (clock, preview) = preview();
        preview.widget().set_reduced_motion(true);

        preview.rotate_left();
        assert_eq!(preview.angle(), 90.0);
        assert_eq!(preview.screen_size(), (720, 360));
        assert!(!clock.has_tick_callbacks());
    }

    #[test]
    fn test_measure_allows_shrinking_to_min_scale() {
        let (_clock, preview) = preview();
        assert_eq!(preview.measure(Orientation::Horizontal), (90, 360));
        preview.set_scale_to_fit(false);
        assert_eq!(preview.measure(Orientation::Vertical), (720, 720));
    }
}

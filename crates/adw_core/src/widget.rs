//! Widget host
//!
//! [`Host`] is everything an animation needs from the widget it runs on: a
//! frame clock, the mapped state, the animation settings and an unmap
//! notification. [`Widget`] is a headless implementation that also carries
//! what a layout container needs from its children (measurement, expand
//! flags, visibility) and records the allocation it was given.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::frame_clock::FrameClock;
use crate::geometry::Affine2D;
use crate::settings::Settings;
use crate::signal::{HandlerId, Signal};

/// Layout axis
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Orientation {
    #[default]
    Horizontal,
    Vertical,
}

/// Reading direction, mirrors horizontal layouts when right-to-left
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TextDirection {
    #[default]
    Ltr,
    Rtl,
}

/// What an animation needs from the widget it is attached to
pub trait Host {
    /// The frame clock, or `None` while the widget is not realized
    fn frame_clock(&self) -> Option<Rc<dyn FrameClock>>;

    /// Whether the widget is mapped (visible on screen)
    fn is_mapped(&self) -> bool;

    /// Whether animations are enabled for this widget
    fn enable_animations(&self) -> bool;

    /// Whether the platform asks for reduced motion
    fn reduced_motion(&self) -> bool;

    /// Call `handler` when the widget gets unmapped
    fn connect_unmap(&self, handler: Box<dyn FnMut(&())>) -> HandlerId;

    fn disconnect_unmap(&self, id: HandlerId);

    /// Ask for a new layout pass
    fn queue_allocate(&self) {}
}

/// Size and transform given to a widget by its parent
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Allocation {
    pub width: i32,
    pub height: i32,
    pub transform: Affine2D,
}

#[derive(Clone, Copy, Debug, Default)]
struct Measurement {
    minimum: i32,
    natural: i32,
}

/// A headless widget
pub struct Widget {
    name: String,
    frame_clock: Rc<dyn FrameClock>,
    settings: RefCell<Settings>,
    realized: Cell<bool>,
    mapped: Cell<bool>,
    visible: Cell<bool>,
    hexpand: Cell<bool>,
    vexpand: Cell<bool>,
    direction: Cell<TextDirection>,
    width: Cell<Measurement>,
    height: Cell<Measurement>,
    allocation: Cell<Option<Allocation>>,
    allocate_requests: Cell<u32>,
    unmap: Signal<()>,
}

impl Widget {
    /// Create an unrealized, unmapped widget driven by `frame_clock`
    pub fn new(frame_clock: Rc<dyn FrameClock>) -> Rc<Self> {
        Self::with_name("widget", frame_clock)
    }

    pub fn with_name(name: impl Into<String>, frame_clock: Rc<dyn FrameClock>) -> Rc<Self> {
        Rc::new(Self {
            name: name.into(),
            frame_clock,
            settings: RefCell::new(Settings::default()),
            realized: Cell::new(false),
            mapped: Cell::new(false),
            visible: Cell::new(true),
            hexpand: Cell::new(false),
            vexpand: Cell::new(false),
            direction: Cell::new(TextDirection::Ltr),
            width: Cell::new(Measurement::default()),
            height: Cell::new(Measurement::default()),
            allocation: Cell::new(None),
            allocate_requests: Cell::new(0),
            unmap: Signal::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    pub fn realize(&self) {
        self.realized.set(true);
    }

    pub fn unrealize(&self) {
        self.unmap();
        self.realized.set(false);
    }

    pub fn is_realized(&self) -> bool {
        self.realized.get()
    }

    /// Map the widget, realizing it first if needed
    pub fn map(&self) {
        self.realized.set(true);
        self.mapped.set(true);
    }

    /// Unmap the widget and notify unmap observers
    pub fn unmap(&self) {
        if !self.mapped.replace(false) {
            return;
        }
        tracing::debug!("Widget '{}' unmapped", self.name);
        self.unmap.emit(&());
    }

    // =========================================================================
    // Settings
    // =========================================================================

    pub fn settings(&self) -> Settings {
        self.settings.borrow().clone()
    }

    pub fn set_settings(&self, settings: Settings) {
        *self.settings.borrow_mut() = settings;
    }

    pub fn set_enable_animations(&self, enable: bool) {
        self.settings.borrow_mut().enable_animations = enable;
    }

    pub fn set_reduced_motion(&self, reduced: bool) {
        self.settings.borrow_mut().reduced_motion = reduced;
    }

    // =========================================================================
    // Layout
    // =========================================================================

    pub fn is_visible(&self) -> bool {
        self.visible.get()
    }

    pub fn set_visible(&self, visible: bool) {
        self.visible.set(visible);
    }

    pub fn hexpand(&self) -> bool {
        self.hexpand.get()
    }

    pub fn set_hexpand(&self, expand: bool) {
        self.hexpand.set(expand);
    }

    pub fn vexpand(&self) -> bool {
        self.vexpand.get()
    }

    pub fn set_vexpand(&self, expand: bool) {
        self.vexpand.set(expand);
    }

    pub fn direction(&self) -> TextDirection {
        self.direction.get()
    }

    pub fn set_direction(&self, direction: TextDirection) {
        self.direction.set(direction);
    }

    /// Set the minimum and natural size along `orientation`
    pub fn set_measurement(&self, orientation: Orientation, minimum: i32, natural: i32) {
        let m = Measurement {
            minimum,
            natural: natural.max(minimum),
        };
        match orientation {
            Orientation::Horizontal => self.width.set(m),
            Orientation::Vertical => self.height.set(m),
        }
    }

    /// Set the same minimum and natural size on both axes
    pub fn set_size(&self, width: i32, height: i32) {
        self.set_measurement(Orientation::Horizontal, width, width);
        self.set_measurement(Orientation::Vertical, height, height);
    }

    /// Minimum and natural size along `orientation`
    pub fn measure(&self, orientation: Orientation, _for_size: i32) -> (i32, i32) {
        let m = match orientation {
            Orientation::Horizontal => self.width.get(),
            Orientation::Vertical => self.height.get(),
        };
        (m.minimum, m.natural)
    }

    /// Give the widget its size and position
    pub fn allocate(&self, width: i32, height: i32, transform: Affine2D) {
        self.allocation.set(Some(Allocation {
            width,
            height,
            transform,
        }));
    }

    pub fn allocation(&self) -> Option<Allocation> {
        self.allocation.get()
    }

    /// Number of relayouts requested so far
    pub fn allocate_requests(&self) -> u32 {
        self.allocate_requests.get()
    }
}

impl Host for Widget {
    fn frame_clock(&self) -> Option<Rc<dyn FrameClock>> {
        self.realized.get().then(|| self.frame_clock.clone())
    }

    fn is_mapped(&self) -> bool {
        self.mapped.get()
    }

    fn enable_animations(&self) -> bool {
        self.settings.borrow().enable_animations
    }

    fn reduced_motion(&self) -> bool {
        self.settings.borrow().reduced_motion
    }

    fn connect_unmap(&self, handler: Box<dyn FnMut(&())>) -> HandlerId {
        self.unmap.connect_boxed(handler)
    }

    fn disconnect_unmap(&self, id: HandlerId) {
        self.unmap.disconnect(id);
    }

    fn queue_allocate(&self) {
        self.allocate_requests.set(self.allocate_requests.get() + 1);
    }
}

impl fmt::Debug for Widget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Widget")
            .field("name", &self.name)
            .field("realized", &self.realized.get())
            .field("mapped", &self.mapped.get())
            .field("visible", &self.visible.get())
            .field("allocation", &self.allocation.get())
            .finish()
    }
}

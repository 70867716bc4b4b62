//! Carousel box
//!
//! Lays out pages along one axis and scrolls between them. The scroll
//! `position` is unitless: one unit is one page.
//!
//! Every page carries a reveal factor in `[0, 1]` that grows from 0 when the
//! page is inserted and shrinks back to 0 when it is removed. Removed pages
//! stay in the list, detached from their widget, until they have shrunk away.
//! While pages before the focused one grow or shrink, the position is shifted
//! by the same amount so the focused page does not move on screen.
//!
//! Snap points are cumulative reveal factors minus one: with three fully
//! revealed pages they are `0, 1, 2`.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use adw_animation::{ease, lerp, Easing};
use adw_core::{
    Affine2D, FrameClock, HandlerId, Host, Orientation, Signal, TextDirection, TickCallbackId,
    TickControl, Widget,
};
use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Handle to a page entry
    struct ChildKey;
}

/// Ease-out-cubic transition between two values over a fixed time window
#[derive(Clone, Copy, Debug, PartialEq)]
struct Transition {
    start_time: i64,
    end_time: i64,
    start_value: f64,
    end_value: f64,
}

impl Transition {
    fn new(now: i64, duration_ms: u32, start_value: f64, end_value: f64) -> Self {
        Self {
            start_time: now,
            end_time: now + i64::from(duration_ms),
            start_value,
            end_value,
        }
    }

    fn value_at(&self, now: i64) -> f64 {
        let duration = self.end_time - self.start_time;
        if duration <= 0 {
            return self.end_value;
        }
        let now = now.min(self.end_time);
        let t = (now - self.start_time) as f64 / duration as f64;
        lerp(self.start_value, self.end_value, ease(Easing::EaseOutCubic, t))
    }

    fn is_done(&self, now: i64) -> bool {
        now >= self.end_time
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Lifecycle {
    Adding,
    Active,
    Removing,
}

struct ChildInfo {
    /// `None` once the page has been removed
    widget: Option<Rc<Widget>>,
    position: i32,
    visible: bool,
    size: f64,
    snap_point: f64,
    lifecycle: Lifecycle,
    shift_position: bool,
    resize: Option<Transition>,
}

impl ChildInfo {
    fn is_adding(&self) -> bool {
        self.lifecycle == Lifecycle::Adding
    }

    fn is_removing(&self) -> bool {
        self.lifecycle == Lifecycle::Removing
    }

    fn holds(&self, widget: &Rc<Widget>) -> bool {
        self.widget.as_ref().is_some_and(|w| Rc::ptr_eq(w, widget))
    }
}

struct ScrollAnimation {
    transition: Transition,
    destination: ChildKey,
}

struct CarouselState {
    children: SlotMap<ChildKey, ChildInfo>,
    /// Page order, removing pages included
    order: Vec<ChildKey>,
    distance: f64,
    position: f64,
    spacing: u32,
    orientation: Orientation,
    reveal_duration: u32,
    scroll: Option<ScrollAnimation>,
    tick: Option<(Rc<dyn FrameClock>, TickCallbackId)>,
}

impl CarouselState {
    fn find(&self, widget: &Rc<Widget>) -> Option<ChildKey> {
        self.order
            .iter()
            .copied()
            .find(|&key| self.children[key].holds(widget))
    }

    fn find_or_panic(&self, widget: &Rc<Widget>, operation: &str) -> ChildKey {
        match self.find(widget) {
            Some(key) => key,
            None => panic!("CarouselBox::{operation}: widget '{}' is not a page", widget.name()),
        }
    }

    fn index_of(&self, key: ChildKey) -> usize {
        self.order.iter().position(|&k| k == key).unwrap_or(self.order.len())
    }

    /// Index of `widget` among pages that are not being removed
    fn page_index(&self, widget: &Rc<Widget>) -> Option<usize> {
        self.order
            .iter()
            .map(|&key| &self.children[key])
            .filter(|child| !child.is_removing())
            .position(|child| child.holds(widget))
    }

    /// Position in `order` of the `n`th page that is not being removed
    fn nth_index(&self, n: usize) -> Option<usize> {
        self.order
            .iter()
            .enumerate()
            .filter(|&(_, &key)| !self.children[key].is_removing())
            .nth(n)
            .map(|(i, _)| i)
    }

    fn n_pages(&self) -> usize {
        self.children.values().filter(|c| !c.is_removing()).count()
    }

    /// The page whose snap point is closest to `position`; ties go to the
    /// first page in order
    fn closest_child_at(&self, position: f64, count_adding: bool, count_removing: bool) -> Option<ChildKey> {
        let mut closest: Option<(ChildKey, f64)> = None;

        for &key in &self.order {
            let child = &self.children[key];
            if child.is_adding() && !count_adding {
                continue;
            }
            if child.is_removing() && !count_removing {
                continue;
            }

            let distance = (child.snap_point - position).abs();
            if closest.map_or(true, |(_, best)| best > distance) {
                closest = Some((key, distance));
            }
        }

        closest.map(|(key, _)| key)
    }

    fn update_snap_points(&mut self) {
        let mut snap_point = 0.0;
        for &key in &self.order {
            let child = &mut self.children[key];
            child.snap_point = snap_point + child.size - 1.0;
            snap_point += child.size;
        }
    }

    fn range(&self) -> (f64, f64) {
        let upper = self.order.last().map_or(0.0, |&key| self.children[key].snap_point);
        (0.0, upper)
    }

    fn clamp_position(&mut self, position: f64) {
        let (lower, upper) = self.range();
        self.position = position.max(lower).min(upper.max(lower));
    }

    /// Shift the position when the focused page is at or after `key`
    fn update_shift_position_flag(&mut self, key: ChildKey) {
        // A focused page that is being removed still counts
        let Some(closest) = self.closest_child_at(self.position, false, true) else {
            return;
        };

        let animating_index = self.index_of(key);
        let closest_index = self.index_of(closest);
        self.children[key].shift_position = closest_index >= animating_index;
    }

    fn set_position(&mut self, position: f64) {
        self.clamp_position(position);

        let animating: Vec<ChildKey> = self
            .order
            .iter()
            .copied()
            .filter(|&key| self.children[key].lifecycle != Lifecycle::Active)
            .collect();
        for key in animating {
            self.update_shift_position_flag(key);
        }
    }

    fn complete_child_animation(&mut self, key: ChildKey) {
        match self.children[key].lifecycle {
            Lifecycle::Adding => self.children[key].lifecycle = Lifecycle::Active,
            Lifecycle::Removing => {
                self.children.remove(key);
                self.order.retain(|&k| k != key);
            }
            Lifecycle::Active => {}
        }
        self.update_snap_points();
    }

    fn is_idle(&self) -> bool {
        self.scroll.is_none() && self.children.values().all(|c| c.resize.is_none())
    }
}

struct Shared {
    widget: Rc<Widget>,
    state: RefCell<CarouselState>,
    position_shifted: Signal<f64>,
    animation_stopped: Signal<()>,
}

impl Drop for Shared {
    fn drop(&mut self) {
        if let Some((clock, id)) = self.state.get_mut().tick.take() {
            clock.remove_tick_callback(id);
        }
    }
}

/// Scrolling page container with animated page reveal
#[derive(Clone)]
pub struct CarouselBox {
    shared: Rc<Shared>,
}

impl CarouselBox {
    /// Create an empty carousel hosted by `widget`
    ///
    /// Spacing and reveal duration start from the widget's carousel settings.
    pub fn new(widget: Rc<Widget>) -> Self {
        let settings = widget.settings().carousel;
        Self {
            shared: Rc::new(Shared {
                widget,
                state: RefCell::new(CarouselState {
                    children: SlotMap::with_key(),
                    order: Vec::new(),
                    distance: 0.0,
                    position: 0.0,
                    spacing: settings.spacing,
                    orientation: Orientation::Horizontal,
                    reveal_duration: settings.reveal_duration_ms,
                    scroll: None,
                    tick: None,
                }),
                position_shifted: Signal::new(),
                animation_stopped: Signal::new(),
            }),
        }
    }

    /// The host widget
    pub fn widget(&self) -> &Rc<Widget> {
        &self.shared.widget
    }

    // =========================================================================
    // Signals
    // =========================================================================

    /// Called with the delta whenever the position is shifted to compensate
    /// for pages growing, shrinking or moving
    pub fn connect_position_shifted<F>(&self, mut handler: F) -> HandlerId
    where
        F: FnMut(f64) + 'static,
    {
        self.shared.position_shifted.connect(move |delta| handler(*delta))
    }

    /// Called when a scroll finishes, including scrolls that jump
    pub fn connect_animation_stopped<F>(&self, mut handler: F) -> HandlerId
    where
        F: FnMut() + 'static,
    {
        self.shared.animation_stopped.connect(move |_| handler())
    }

    // =========================================================================
    // Pages
    // =========================================================================

    /// Insert `widget` before the `position`th page, or at the end when
    /// `position` is negative or past the last page
    ///
    /// # Panics
    ///
    /// Panics if `widget` already is a page.
    pub fn insert(&self, widget: &Rc<Widget>, position: i32) {
        let key = {
            let mut state = self.shared.state.borrow_mut();
            assert!(
                state.find(widget).is_none(),
                "CarouselBox::insert: widget '{}' already is a page",
                widget.name()
            );

            let key = state.children.insert(ChildInfo {
                widget: Some(widget.clone()),
                position: 0,
                visible: false,
                size: 0.0,
                snap_point: 0.0,
                lifecycle: Lifecycle::Adding,
                shift_position: false,
                resize: None,
            });

            let index = usize::try_from(position).ok().and_then(|n| state.nth_index(n));
            match index {
                Some(index) => state.order.insert(index, key),
                None => state.order.push(key),
            }
            state.update_snap_points();

            tracing::debug!("CarouselBox: inserted '{}' at {}", widget.name(), position);
            key
        };

        self.shared.widget.queue_allocate();
        let duration = self.reveal_duration();
        self.animate_child(key, 1.0, duration);
    }

    /// Move `widget` so it becomes the `position`th page, or the last page
    /// when `position` is negative or out of range
    ///
    /// The position is shifted so the focused page stays in place.
    ///
    /// # Panics
    ///
    /// Panics if `widget` is not a page.
    pub fn reorder(&self, widget: &Rc<Widget>, position: i32) {
        let delta = {
            let mut state = self.shared.state.borrow_mut();
            let key = state.find_or_panic(widget, "reorder");
            let old_page = state.page_index(widget).unwrap_or(0);
            let n_pages = state.n_pages();

            let new_page = match usize::try_from(position) {
                Ok(p) if p < n_pages => p,
                _ => n_pages.saturating_sub(1),
            };
            if new_page == old_page {
                return;
            }

            let closest = state.closest_child_at(state.position, true, true);
            let closest_before = closest.map(|k| state.children[k].snap_point);

            state.order.retain(|&k| k != key);
            match state.nth_index(new_page) {
                Some(index) => state.order.insert(index, key),
                None => state.order.push(key),
            }
            state.update_snap_points();

            tracing::debug!("CarouselBox: moved '{}' from {} to {}", widget.name(), old_page, new_page);

            match (closest, closest_before) {
                (Some(closest), Some(before)) => state.children[closest].snap_point - before,
                _ => 0.0,
            }
        };

        self.shared.widget.queue_allocate();
        if delta != 0.0 {
            self.shift_position(delta);
        }
    }

    /// Remove `widget`, shrinking its page away over the reveal duration
    ///
    /// # Panics
    ///
    /// Panics if `widget` is not a page.
    pub fn remove(&self, widget: &Rc<Widget>) {
        let key = {
            let mut state = self.shared.state.borrow_mut();
            let key = state.find_or_panic(widget, "remove");
            let child = &mut state.children[key];
            child.lifecycle = Lifecycle::Removing;
            child.widget = None;
            child.visible = false;

            tracing::debug!("CarouselBox: removing '{}'", widget.name());
            key
        };

        self.shared.widget.queue_allocate();
        let duration = self.reveal_duration();
        self.animate_child(key, 0.0, duration);
    }

    pub fn n_pages(&self) -> usize {
        self.shared.state.borrow().n_pages()
    }

    /// The `n`th page
    ///
    /// # Panics
    ///
    /// Panics if `n` is out of range.
    pub fn nth_page(&self, n: usize) -> Rc<Widget> {
        let state = self.shared.state.borrow();
        let index = state.nth_index(n);
        let widget = index.and_then(|i| state.children[state.order[i]].widget.clone());
        match widget {
            Some(widget) => widget,
            None => panic!("CarouselBox::nth_page: index {n} out of range"),
        }
    }

    /// Pages in order, excluding pages being removed
    pub fn pages(&self) -> Vec<Rc<Widget>> {
        let state = self.shared.state.borrow();
        state
            .order
            .iter()
            .filter_map(|&key| state.children[key].widget.clone())
            .collect()
    }

    /// Index of `widget` among the pages, if it is one
    pub fn page_index(&self, widget: &Rc<Widget>) -> Option<usize> {
        self.shared.state.borrow().page_index(widget)
    }

    /// Whether `widget` overlapped the viewport at the last allocation
    pub fn is_page_visible(&self, widget: &Rc<Widget>) -> bool {
        let state = self.shared.state.borrow();
        state
            .find(widget)
            .is_some_and(|key| state.children[key].visible)
    }

    /// Offset along the axis `widget` got at the last allocation
    pub fn page_offset(&self, widget: &Rc<Widget>) -> Option<i32> {
        let state = self.shared.state.borrow();
        state.find(widget).map(|key| state.children[key].position)
    }

    // =========================================================================
    // Position
    // =========================================================================

    pub fn position(&self) -> f64 {
        self.shared.state.borrow().position
    }

    /// Scroll to `position`, clamped to [`CarouselBox::range`]
    pub fn set_position(&self, position: f64) {
        self.shared.state.borrow_mut().set_position(position);
        self.shared.widget.queue_allocate();
    }

    /// Distance between two pages in pixels, as of the last allocation
    pub fn distance(&self) -> f64 {
        self.shared.state.borrow().distance
    }

    /// Snap point of every page, in order. Never empty.
    pub fn snap_points(&self) -> Vec<f64> {
        let state = self.shared.state.borrow();
        if state.order.is_empty() {
            return vec![0.0];
        }
        state.order.iter().map(|&key| state.children[key].snap_point).collect()
    }

    /// Lowest and highest reachable position
    pub fn range(&self) -> (f64, f64) {
        self.shared.state.borrow().range()
    }

    /// Snap point closest to the current position
    pub fn closest_snap_point(&self) -> f64 {
        let state = self.shared.state.borrow();
        state
            .closest_child_at(state.position, true, true)
            .map_or(0.0, |key| state.children[key].snap_point)
    }

    /// The page closest to `position`
    pub fn page_at_position(&self, position: f64) -> Option<Rc<Widget>> {
        let state = self.shared.state.borrow();
        let (lower, upper) = state.range();
        let position = position.max(lower).min(upper.max(lower));

        state
            .closest_child_at(position, true, false)
            .and_then(|key| state.children[key].widget.clone())
    }

    /// Index of the page closest to the current position
    pub fn current_page_index(&self) -> Option<usize> {
        let page = self.page_at_position(self.position())?;
        self.page_index(&page)
    }

    // =========================================================================
    // Properties
    // =========================================================================

    pub fn spacing(&self) -> u32 {
        self.shared.state.borrow().spacing
    }

    pub fn set_spacing(&self, spacing: u32) {
        let changed = {
            let mut state = self.shared.state.borrow_mut();
            std::mem::replace(&mut state.spacing, spacing) != spacing
        };
        if changed {
            self.shared.widget.queue_allocate();
        }
    }

    /// Reveal animation duration in ms
    pub fn reveal_duration(&self) -> u32 {
        self.shared.state.borrow().reveal_duration
    }

    pub fn set_reveal_duration(&self, duration_ms: u32) {
        self.shared.state.borrow_mut().reveal_duration = duration_ms;
    }

    pub fn orientation(&self) -> Orientation {
        self.shared.state.borrow().orientation
    }

    pub fn set_orientation(&self, orientation: Orientation) {
        let changed = {
            let mut state = self.shared.state.borrow_mut();
            std::mem::replace(&mut state.orientation, orientation) != orientation
        };
        if changed {
            self.shared.widget.queue_allocate();
        }
    }

    // =========================================================================
    // Scrolling
    // =========================================================================

    /// Scroll to `widget` over `duration_ms`
    ///
    /// The animation follows the page if it moves while scrolling. Jumps
    /// immediately when the duration is zero, animations are off, reduced
    /// motion is requested or the box has no frame clock.
    ///
    /// # Panics
    ///
    /// Panics if `widget` is not a page.
    pub fn scroll_to(&self, widget: &Rc<Widget>, duration_ms: u32) {
        let host = &self.shared.widget;
        let (key, target) = {
            let state = self.shared.state.borrow();
            let key = state.find_or_panic(widget, "scroll_to");
            (key, state.children[key].snap_point)
        };

        self.stop_animation();

        let clock = host.frame_clock();
        let clock = match clock {
            Some(clock) if duration_ms > 0 && host.enable_animations() && !host.reduced_motion() => clock,
            _ => {
                self.set_position(target);
                self.shared.animation_stopped.emit(&());
                return;
            }
        };

        {
            let mut state = self.shared.state.borrow_mut();
            let now = clock.frame_time() / 1000;
            state.scroll = Some(ScrollAnimation {
                transition: Transition::new(now, duration_ms, state.position, target),
                destination: key,
            });
            tracing::debug!(
                "CarouselBox: scrolling from {} to {} over {}ms",
                state.position,
                target,
                duration_ms
            );
        }
        self.ensure_tick(clock);
    }

    /// Scroll to the `index`th page using the configured scroll duration
    pub fn scroll_to_page(&self, index: usize) {
        let page = self.nth_page(index);
        let duration = self.shared.widget.settings().carousel.scroll_duration_ms;
        self.scroll_to(&page, duration);
    }

    /// Whether a scroll animation is running
    pub fn is_animating(&self) -> bool {
        self.shared.state.borrow().scroll.is_some()
    }

    /// Cancel the scroll animation, leaving the position where it is
    pub fn stop_animation(&self) {
        self.shared.state.borrow_mut().scroll = None;
    }

    // =========================================================================
    // Layout
    // =========================================================================

    /// Minimum and natural size: the largest visible page along
    /// `orientation`
    pub fn measure(&self, orientation: Orientation, for_size: i32) -> (i32, i32) {
        let state = self.shared.state.borrow();
        state
            .order
            .iter()
            .filter_map(|&key| state.children[key].widget.as_ref())
            .filter(|widget| widget.is_visible())
            .map(|widget| widget.measure(orientation, for_size))
            .fold((0, 0), |(min, nat), (m, n)| (min.max(m), nat.max(n)))
    }

    /// Lay out the pages in a `width` x `height` viewport
    pub fn allocate(&self, width: i32, height: i32) {
        let mut state = self.shared.state.borrow_mut();
        let orientation = state.orientation;

        let mut size = 0;
        for &key in &state.order {
            let Some(widget) = state.children[key].widget.as_ref() else {
                continue;
            };
            let child_size = match orientation {
                Orientation::Horizontal => {
                    let (min, nat) = widget.measure(orientation, height);
                    if widget.hexpand() {
                        min.max(width)
                    } else {
                        min.max(nat)
                    }
                }
                Orientation::Vertical => {
                    let (min, nat) = widget.measure(orientation, width);
                    if widget.vexpand() {
                        min.max(height)
                    } else {
                        min.max(nat)
                    }
                }
            };
            size = size.max(child_size);
        }

        state.distance = f64::from(size) + f64::from(state.spacing);
        state.update_snap_points();

        let (child_width, child_height) = match orientation {
            Orientation::Horizontal => (size, height),
            Orientation::Vertical => (width, size),
        };

        if !self.shared.widget.is_realized() {
            return;
        }

        let is_rtl = self.shared.widget.direction() == TextDirection::Rtl;
        let scrolled = state.distance * state.position;
        let offset = match orientation {
            Orientation::Vertical => scrolled - f64::from(height - child_height) / 2.0,
            Orientation::Horizontal if is_rtl => -scrolled + f64::from(width - child_width) / 2.0,
            Orientation::Horizontal => scrolled - f64::from(width - child_width) / 2.0,
        };
        let mut cursor = -offset;

        let distance = state.distance;
        let keys = state.order.clone();
        for key in keys {
            let child = &mut state.children[key];

            if let Some(widget) = child.widget.clone() {
                if !widget.is_visible() {
                    continue;
                }

                child.position = cursor as i32;
                let (transform, extent, viewport) = match orientation {
                    Orientation::Vertical => (
                        Affine2D::translation(0.0, f64::from(child.position)),
                        child_height,
                        height,
                    ),
                    Orientation::Horizontal => (
                        Affine2D::translation(f64::from(child.position), 0.0),
                        child_width,
                        width,
                    ),
                };
                child.visible = child.position < viewport && child.position + extent > 0;
                widget.allocate(child_width, child_height, transform);
            }

            let step = distance * child.size;
            if orientation == Orientation::Horizontal && is_rtl {
                cursor -= step;
            } else {
                cursor += step;
            }
        }
    }

    // =========================================================================
    // Animation
    // =========================================================================

    fn shift_position(&self, delta: f64) {
        let position = self.position();
        self.set_position(position + delta);
        self.shared.position_shifted.emit(&delta);
    }

    /// Animate the reveal factor of `key` towards `value`
    fn animate_child(&self, key: ChildKey, value: f64, duration_ms: u32) {
        let host = &self.shared.widget;
        let clock = {
            let mut state = self.shared.state.borrow_mut();
            state.children[key].resize = None;
            state.update_shift_position_flag(key);

            let animate = host.is_realized()
                && duration_ms > 0
                && host.enable_animations()
                && !host.reduced_motion();
            if animate {
                host.frame_clock()
            } else {
                None
            }
        };

        let Some(clock) = clock else {
            let (delta, shift) = {
                let mut state = self.shared.state.borrow_mut();
                let child = &mut state.children[key];
                let delta = value - child.size;
                child.size = value;
                let shift = child.shift_position;
                state.update_snap_points();
                (delta, shift)
            };

            if shift && delta != 0.0 {
                self.shift_position(delta);
            }
            self.shared.state.borrow_mut().complete_child_animation(key);
            host.queue_allocate();
            return;
        };

        {
            let mut state = self.shared.state.borrow_mut();
            let now = clock.frame_time() / 1000;
            let child = &mut state.children[key];
            child.resize = Some(Transition::new(now, duration_ms, child.size, value));
        }
        self.ensure_tick(clock);
    }

    fn ensure_tick(&self, clock: Rc<dyn FrameClock>) {
        if self.shared.state.borrow().tick.is_some() {
            return;
        }

        let weak: Weak<Shared> = Rc::downgrade(&self.shared);
        let id = clock.add_tick_callback(Box::new(move |frame_time| match weak.upgrade() {
            Some(shared) => CarouselBox { shared }.tick(frame_time),
            None => TickControl::Remove,
        }));
        self.shared.state.borrow_mut().tick = Some((clock, id));
    }

    fn tick(&self, frame_time: i64) -> TickControl {
        let now = frame_time / 1000;

        let position_shift = {
            let mut state = self.shared.state.borrow_mut();
            let mut shift = 0.0;
            let mut completed = Vec::new();

            for key in state.order.clone() {
                let child = &mut state.children[key];
                let Some(resize) = child.resize else {
                    continue;
                };

                let delta = resize.value_at(now) - child.size;
                child.size += delta;
                if child.shift_position {
                    shift += delta;
                }
                if resize.is_done(now) {
                    child.resize = None;
                    completed.push(key);
                }
            }

            state.update_snap_points();
            for key in completed {
                state.complete_child_animation(key);
            }

            if shift != 0.0 {
                let position = state.position + shift;
                state.clamp_position(position);
            }
            shift
        };

        if position_shift != 0.0 {
            self.shared.position_shifted.emit(&position_shift);
        }

        let scroll_finished = {
            let mut state = self.shared.state.borrow_mut();
            match state.scroll.take() {
                Some(mut scroll) => match state.children.get(scroll.destination) {
                    Some(destination) => {
                        scroll.transition.end_value = destination.snap_point;
                        let value = scroll.transition.value_at(now);
                        let done = scroll.transition.is_done(now);
                        if !done {
                            state.scroll = Some(scroll);
                        }
                        state.set_position(value);
                        done
                    }
                    // Destination freed mid-scroll
                    None => true,
                },
                None => false,
            }
        };

        if scroll_finished {
            self.shared.animation_stopped.emit(&());
        }

        self.shared.widget.queue_allocate();

        let mut state = self.shared.state.borrow_mut();
        if state.is_idle() {
            state.tick = None;
            TickControl::Remove
        } else {
            TickControl::Continue
        }
    }
}

impl fmt::Debug for CarouselBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.borrow();
        f.debug_struct("CarouselBox")
            .field("n_pages", &state.n_pages())
            .field("position", &state.position)
            .field("distance", &state.distance)
            .field("animating", &state.scroll.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adw_core::ManualFrameClock;

    fn carousel(n: usize) -> (Rc<ManualFrameClock>, CarouselBox, Vec<Rc<Widget>>) {
        let clock = Rc::new(ManualFrameClock::new());
        let host = Widget::with_name("carousel", clock.clone());
        host.map();
        let carousel = CarouselBox::new(host);

        let pages: Vec<_> = (0..n)
            .map(|i| {
                let page = Widget::with_name(format!("page{i}"), clock.clone());
                page.set_size(200, 100);
                carousel.insert(&page, -1);
                page
            })
            .collect();
        (clock, carousel, pages)
    }

    #[test]
    fn test_transition_eases_out() {
        let transition = Transition::new(100, 200, 0.0, 1.0);
        assert_eq!(transition.value_at(100), 0.0);
        assert!(transition.value_at(200) > 0.5);
        assert_eq!(transition.value_at(300), 1.0);
        assert_eq!(transition.value_at(1000), 1.0);
        assert!(transition.is_done(300));
    }

    #[test]
    fn test_snap_points_are_cumulative() {
        let (_clock, carousel, _pages) = carousel(3);
        assert_eq!(carousel.snap_points(), vec![0.0, 1.0, 2.0]);
        assert_eq!(carousel.range(), (0.0, 2.0));
        assert_eq!(CarouselBox::new(carousel.widget().clone()).snap_points(), vec![0.0]);
    }

    #[test]
    fn test_position_is_clamped_to_range() {
        let (_clock, carousel, _pages) = carousel(3);
        carousel.set_position(7.0);
        assert_eq!(carousel.position(), 2.0);
        carousel.set_position(-1.0);
        assert_eq!(carousel.position(), 0.0);
    }

    #[test]
    fn test_closest_child_prefers_first_on_tie() {
        let (_clock, carousel, pages) = carousel(3);
        carousel.set_position(0.5);
        assert!(Rc::ptr_eq(&carousel.page_at_position(0.5).unwrap(), &pages[0]));
        assert_eq!(carousel.closest_snap_point(), 0.0);
    }

    #[test]
    fn test_insert_at_index() {
        let (clock, carousel, pages) = carousel(2);
        let page = Widget::with_name("inserted", clock);
        carousel.insert(&page, 1);

        assert_eq!(carousel.page_index(&page), Some(1));
        assert_eq!(carousel.page_index(&pages[1]), Some(2));
        assert_eq!(carousel.n_pages(), 3);
    }

    #[test]
    fn test_reorder_keeps_focused_page() {
        let (_clock, carousel, pages) = carousel(4);
        carousel.set_position(2.0);

        let shifts = Rc::new(RefCell::new(Vec::new()));
        let s = shifts.clone();
        carousel.connect_position_shifted(move |delta| s.borrow_mut().push(delta));

        // Moving a page from before the focused one to after it
        carousel.reorder(&pages[0], 3);
        assert_eq!(carousel.page_index(&pages[0]), Some(3));
        assert_eq!(carousel.position(), 1.0);
        assert!(Rc::ptr_eq(&carousel.page_at_position(carousel.position()).unwrap(), &pages[2]));
        assert_eq!(*shifts.borrow(), vec![-1.0]);

        // Moving the focused page itself follows it
        carousel.reorder(&pages[2], 0);
        assert_eq!(carousel.position(), 0.0);
        assert!(Rc::ptr_eq(&carousel.page_at_position(0.0).unwrap(), &pages[2]));

        // Moving entirely after the focused page changes nothing
        carousel.reorder(&pages[3], -1);
        assert_eq!(carousel.position(), 0.0);
        assert_eq!(shifts.borrow().len(), 2);
    }

    #[test]
    fn test_remove_without_animation_frees_entry() {
        let (_clock, carousel, pages) = carousel(3);
        carousel.set_position(2.0);
        carousel.remove(&pages[0]);

        assert_eq!(carousel.n_pages(), 2);
        assert_eq!(carousel.snap_points(), vec![0.0, 1.0]);
        assert_eq!(carousel.position(), 1.0);
        assert_eq!(carousel.page_index(&pages[0]), None);
    }

    #[test]
    #[should_panic(expected = "is not a page")]
    fn test_remove_unknown_widget_panics() {
        let (clock, carousel, _pages) = carousel(1);
        carousel.remove(&Widget::new(clock));
    }

    #[test]
    fn test_measure_takes_largest_page() {
        let (_clock, carousel, pages) = carousel(2);
        pages[1].set_size(320, 50);
        assert_eq!(carousel.measure(Orientation::Horizontal, -1), (320, 320));
        assert_eq!(carousel.measure(Orientation::Vertical, -1), (100, 100));
    }

    #[test]
    fn test_allocate_lays_pages_along_axis() {
        let (_clock, carousel, pages) = carousel(3);
        carousel.set_spacing(10);
        carousel.set_position(1.0);
        carousel.allocate(200, 100);

        assert_eq!(carousel.distance(), 210.0);
        assert_eq!(carousel.page_offset(&pages[0]), Some(-210));
        assert_eq!(carousel.page_offset(&pages[1]), Some(0));
        assert_eq!(carousel.page_offset(&pages[2]), Some(210));
        assert!(!carousel.is_page_visible(&pages[0]));
        assert!(carousel.is_page_visible(&pages[1]));

        let allocation = pages[2].allocation().unwrap();
        assert_eq!((allocation.width, allocation.height), (200, 100));
        assert_eq!(allocation.transform.translation_part().x, 210.0);
    }

    #[test]
    fn test_allocate_mirrors_in_rtl() {
        let (_clock, carousel, pages) = carousel(2);
        carousel.widget().set_direction(TextDirection::Rtl);
        carousel.allocate(200, 100);

        assert_eq!(carousel.page_offset(&pages[0]), Some(0));
        assert_eq!(carousel.page_offset(&pages[1]), Some(-200));
    }

    #[test]
    fn test_scroll_to_jumps_without_frame_clock_time() {
        let (clock, carousel, pages) = carousel(3);
        let stopped = Rc::new(std::cell::Cell::new(0));
        let s = stopped.clone();
        carousel.connect_animation_stopped(move || s.set(s.get() + 1));

        carousel.scroll_to(&pages[2], 0);
        assert_eq!(carousel.position(), 2.0);
        assert_eq!(stopped.get(), 1);
        assert!(!clock.has_tick_callbacks());
    }
}

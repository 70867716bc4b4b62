//! Playback lifecycle driven through a manual frame clock

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use adw_animation::{
    AnimationDuration, AnimationState, AnimationTarget, Easing, SpringAnimation, SpringParams,
    TimedAnimation,
};
use adw_core::{ManualFrameClock, Widget};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn mapped_widget() -> (Rc<ManualFrameClock>, Rc<Widget>) {
    init_tracing();
    let clock = Rc::new(ManualFrameClock::new());
    let widget = Widget::new(clock.clone());
    widget.map();
    (clock, widget)
}

fn linear(widget: &Rc<Widget>, from: f64, to: f64, duration_ms: u32) -> (TimedAnimation, Rc<Cell<f64>>) {
    let value = Rc::new(Cell::new(f64::NAN));
    let animation = TimedAnimation::new(widget, from, to, duration_ms, AnimationTarget::cell(value.clone()));
    animation.set_easing(Easing::Linear);
    (animation, value)
}

fn record_done(animation: &TimedAnimation) -> Rc<RefCell<Vec<AnimationState>>> {
    let log = Rc::new(RefCell::new(Vec::new()));
    let l = log.clone();
    animation.connect_done(move |state| l.borrow_mut().push(state));
    log
}

#[test]
fn test_linear_animation_reaches_midpoint_and_end() {
    let (clock, widget) = mapped_widget();
    let (animation, value) = linear(&widget, 0.0, 10.0, 1000);

    animation.play();
    assert_eq!(animation.state(), AnimationState::Playing);
    assert_eq!(clock.n_tick_callbacks(), 1);

    clock.advance(500);
    assert!((value.get() - 5.0).abs() < 1e-9);
    assert!((animation.value() - 5.0).abs() < 1e-9);

    clock.advance(500);
    assert_eq!(value.get(), 10.0);
    assert_eq!(animation.state(), AnimationState::Finished);
    assert_eq!(clock.n_tick_callbacks(), 0);
}

#[test]
fn test_disabled_animations_finish_synchronously() {
    let (clock, widget) = mapped_widget();
    widget.set_enable_animations(false);
    let (animation, value) = linear(&widget, 0.0, 10.0, 1000);
    let done = record_done(&animation);

    animation.play();

    assert_eq!(value.get(), 10.0);
    assert_eq!(animation.state(), AnimationState::Finished);
    assert_eq!(clock.n_tick_callbacks(), 0);
    assert_eq!(*done.borrow(), vec![AnimationState::Finished]);
}

#[test]
fn test_unmapped_host_finishes_synchronously() {
    init_tracing();
    let clock = Rc::new(ManualFrameClock::new());
    let widget = Widget::new(clock.clone());
    let (animation, value) = linear(&widget, 3.0, -3.0, 400);

    animation.play();

    assert_eq!(value.get(), -3.0);
    assert_eq!(animation.state(), AnimationState::Finished);
    assert!(!clock.has_tick_callbacks());
}

#[test]
fn test_zero_duration_finishes_synchronously() {
    let (clock, widget) = mapped_widget();
    let (animation, value) = linear(&widget, 0.0, 1.0, 0);

    animation.play();

    assert_eq!(value.get(), 1.0);
    assert_eq!(animation.state(), AnimationState::Finished);
    assert!(!clock.has_tick_callbacks());
}

#[test]
fn test_zero_duration_repeating_forever_still_finishes_synchronously() {
    let (clock, widget) = mapped_widget();
    let (animation, value) = linear(&widget, 0.0, 10.0, 0);
    animation.set_repeat_count(0);
    assert_eq!(animation.estimate_duration(), AnimationDuration::Millis(0));
    let done = record_done(&animation);

    animation.play();

    assert_eq!(value.get(), 10.0);
    assert_eq!(animation.state(), AnimationState::Finished);
    assert_eq!(clock.n_tick_callbacks(), 0);
    assert_eq!(*done.borrow(), vec![AnimationState::Finished]);
}

#[test]
fn test_ignoring_the_setting_still_animates() {
    let (clock, widget) = mapped_widget();
    widget.set_enable_animations(false);
    let (animation, value) = linear(&widget, 0.0, 10.0, 1000);
    animation.set_follow_enable_animations_setting(false);

    animation.play();
    assert_eq!(animation.state(), AnimationState::Playing);

    clock.advance(250);
    assert!((value.get() - 2.5).abs() < 1e-9);
}

#[test]
fn test_pause_and_resume_keep_progress() {
    let (clock, widget) = mapped_widget();
    let (animation, value) = linear(&widget, 0.0, 10.0, 1000);

    animation.play();
    clock.advance(250);
    animation.pause();
    assert_eq!(animation.state(), AnimationState::Paused);
    assert!(!clock.has_tick_callbacks());

    clock.advance(1000);
    assert!((value.get() - 2.5).abs() < 1e-9);

    animation.resume();
    assert_eq!(animation.state(), AnimationState::Playing);
    clock.advance(250);
    assert!((value.get() - 5.0).abs() < 1e-9);
}

#[test]
fn test_pause_and_resume_outside_their_states_are_ignored() {
    let (clock, widget) = mapped_widget();
    let (animation, _value) = linear(&widget, 0.0, 10.0, 1000);

    animation.pause();
    assert_eq!(animation.state(), AnimationState::Idle);

    animation.play();
    animation.resume();
    assert_eq!(animation.state(), AnimationState::Playing);
    assert_eq!(clock.n_tick_callbacks(), 1);
}

#[test]
fn test_stop_cancels_once_and_keeps_value() {
    let (clock, widget) = mapped_widget();
    let (animation, value) = linear(&widget, 0.0, 10.0, 1000);
    let done = record_done(&animation);

    animation.play();
    clock.advance(300);
    animation.stop();
    animation.stop();
    animation.skip();

    assert_eq!(animation.state(), AnimationState::Canceled);
    assert!((value.get() - 3.0).abs() < 1e-9);
    assert!(!clock.has_tick_callbacks());
    assert_eq!(*done.borrow(), vec![AnimationState::Canceled]);

    clock.advance(1000);
    assert!((value.get() - 3.0).abs() < 1e-9);
}

#[test]
fn test_stop_from_inside_a_frame() {
    let (clock, widget) = mapped_widget();
    let (animation, value) = linear(&widget, 0.0, 10.0, 1000);
    let done = record_done(&animation);

    let handle = animation.clone();
    animation.connect_value_changed(move |value| {
        if value >= 5.0 {
            handle.stop();
        }
    });

    animation.play();
    clock.run_frames(10, 100);

    assert_eq!(animation.state(), AnimationState::Canceled);
    assert!((value.get() - 5.0).abs() < 1e-9);
    assert_eq!(*done.borrow(), vec![AnimationState::Canceled]);
    assert!(!clock.has_tick_callbacks());
}

#[test]
fn test_unmap_cancels_a_playing_animation() {
    let (clock, widget) = mapped_widget();
    let (animation, _value) = linear(&widget, 0.0, 10.0, 1000);
    let done = record_done(&animation);

    animation.play();
    clock.advance(100);
    widget.unmap();

    assert_eq!(animation.state(), AnimationState::Canceled);
    assert!(!clock.has_tick_callbacks());
    assert_eq!(*done.borrow(), vec![AnimationState::Canceled]);
}

#[test]
fn test_skip_jumps_to_end() {
    let (clock, widget) = mapped_widget();
    let (animation, value) = linear(&widget, 0.0, 10.0, 1000);
    let done = record_done(&animation);

    animation.play();
    clock.advance(100);
    animation.skip();

    assert_eq!(value.get(), 10.0);
    assert_eq!(animation.state(), AnimationState::Finished);
    assert_eq!(*done.borrow(), vec![AnimationState::Finished]);
}

#[test]
fn test_reset_restores_start_without_notifying() {
    let (clock, widget) = mapped_widget();
    let (animation, value) = linear(&widget, 2.0, 10.0, 1000);
    let done = record_done(&animation);

    animation.play();
    clock.advance(500);
    animation.reset();

    assert_eq!(animation.state(), AnimationState::Idle);
    assert_eq!(value.get(), 2.0);
    assert!(done.borrow().is_empty());
    assert!(!clock.has_tick_callbacks());
}

#[test]
fn test_play_restarts_a_finished_animation() {
    let (clock, widget) = mapped_widget();
    let (animation, value) = linear(&widget, 0.0, 10.0, 1000);
    let done = record_done(&animation);

    animation.play();
    clock.advance(1000);
    assert_eq!(animation.state(), AnimationState::Finished);

    animation.play();
    assert_eq!(animation.state(), AnimationState::Playing);
    clock.advance(100);
    assert!((value.get() - 1.0).abs() < 1e-9);

    clock.advance(900);
    assert_eq!(*done.borrow(), vec![AnimationState::Finished, AnimationState::Finished]);
}

#[test]
fn test_alternating_repeats_end_on_start_value() {
    let (clock, widget) = mapped_widget();
    let (animation, value) = linear(&widget, 0.0, 100.0, 100);
    animation.set_repeat_count(2);
    animation.set_alternate(true);
    assert_eq!(animation.estimate_duration(), AnimationDuration::Millis(200));

    animation.play();
    clock.advance(150);
    assert!((value.get() - 50.0).abs() < 1e-9);

    clock.advance(50);
    assert_eq!(value.get(), 0.0);
    assert_eq!(animation.state(), AnimationState::Finished);
}

#[test]
fn test_infinite_repeat_never_finishes() {
    let (clock, widget) = mapped_widget();
    let (animation, _value) = linear(&widget, 0.0, 1.0, 100);
    animation.set_repeat_count(0);
    assert!(animation.estimate_duration().is_infinite());

    animation.play();
    clock.run_frames(100, 50);
    assert_eq!(animation.state(), AnimationState::Playing);
}

#[test]
fn test_dropping_the_animation_releases_the_frame_callback() {
    let (clock, widget) = mapped_widget();
    let (animation, _value) = linear(&widget, 0.0, 1.0, 1000);

    animation.play();
    assert!(clock.has_tick_callbacks());

    drop(animation);
    assert!(!clock.has_tick_callbacks());
    clock.advance(16);
}

#[test]
fn test_value_changed_follows_the_target() {
    let (clock, widget) = mapped_widget();
    let (animation, value) = linear(&widget, 0.0, 10.0, 1000);

    let seen = Rc::new(RefCell::new(Vec::new()));
    let s = seen.clone();
    let v = value.clone();
    animation.connect_value_changed(move |emitted| {
        // The target is written before observers run
        assert_eq!(v.get(), emitted);
        s.borrow_mut().push(emitted);
    });

    animation.play();
    clock.run_frames(4, 250);

    assert_eq!(seen.borrow().len(), 4);
    assert_eq!(seen.borrow().last().copied(), Some(10.0));
}

#[test]
fn test_critical_spring_settles_on_target() {
    let (clock, widget) = mapped_widget();
    let value = Rc::new(Cell::new(f64::NAN));
    let animation = SpringAnimation::new(
        &widget,
        0.0,
        1.0,
        SpringParams::new(1.0, 1.0, 100.0),
        AnimationTarget::cell(value.clone()),
    );

    animation.play();
    for _ in 0..300 {
        clock.advance(16);
        assert!(value.get().is_finite());
    }
    clock.advance(5000);

    assert_eq!(animation.state(), AnimationState::Finished);
    assert!((value.get() - 1.0).abs() < animation.epsilon());
    assert_eq!(animation.velocity(), 0.0);
    assert!(!clock.has_tick_callbacks());
}

#[test]
fn test_spring_is_frame_rate_independent() {
    let (coarse_clock, coarse_widget) = mapped_widget();
    let (fine_clock, fine_widget) = mapped_widget();
    let params = SpringParams::new(0.4, 1.0, 300.0);

    let coarse = SpringAnimation::new(&coarse_widget, 0.0, 100.0, params, AnimationTarget::none());
    let fine = SpringAnimation::new(&fine_widget, 0.0, 100.0, params, AnimationTarget::none());
    coarse.play();
    fine.play();

    coarse_clock.run_frames(4, 60);
    fine_clock.run_frames(30, 8);

    assert!((coarse.value() - fine.value()).abs() < 1e-9);
}

#[test]
fn test_clamped_spring_stops_at_first_arrival() {
    let (clock, widget) = mapped_widget();
    let animation = SpringAnimation::new(&widget, 0.0, 1.0, SpringParams::new(0.1, 1.0, 400.0), AnimationTarget::none());
    animation.set_clamp(true);

    let max = Rc::new(Cell::new(f64::MIN));
    let m = max.clone();
    animation.connect_value_changed(move |value| m.set(m.get().max(value)));

    animation.play();
    clock.run_until_idle(16, 1000);

    assert_eq!(animation.state(), AnimationState::Finished);
    assert_eq!(max.get(), 1.0);
}

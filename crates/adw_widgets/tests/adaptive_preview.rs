//! Adaptive preview rotation driven by the spring on a manual frame clock

use std::rc::Rc;

use adw_animation::AnimationState;
use adw_core::{ManualFrameClock, Point, Widget};
use adw_widgets::{AdaptivePreview, ScreenRotation};
use tracing_subscriber::EnvFilter;

const FRAME_MS: u64 = 16;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn preview() -> (Rc<ManualFrameClock>, AdaptivePreview, Rc<Widget>) {
    init_tracing();
    let clock = Rc::new(ManualFrameClock::new());
    let widget = Widget::with_name("preview", clock.clone());
    widget.map();

    let preview = AdaptivePreview::new(widget);
    let content = Widget::with_name("content", clock.clone());
    preview.set_content(content.clone());
    (clock, preview, content)
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

fn content_center(content: &Widget) -> Point {
    let allocation = content.allocation().unwrap();
    allocation.transform.transform_point(Point {
        x: f64::from(allocation.width / 2),
        y: f64::from(allocation.height / 2),
    })
}

#[test]
fn test_rotation_takes_the_short_way() {
    let (clock, preview, _content) = preview();

    preview.rotate_to(ScreenRotation::Rotate270);
    assert_eq!(preview.target_angle(), -90.0);
    assert_eq!(preview.rotation_animation().state(), AnimationState::Playing);

    clock.run_frames(5, FRAME_MS);
    let angle = preview.angle();
    assert!(angle < 0.0 && angle > -90.0, "angle {angle}");

    clock.run_until_idle(FRAME_MS, 1000);
    assert!(approx(preview.angle(), -90.0));
    assert_eq!(preview.rotation_animation().state(), AnimationState::Finished);
    assert_eq!(preview.screen_size(), (720, 360));
}

#[test]
fn test_rotating_back_unwinds() {
    let (clock, preview, _content) = preview();

    preview.rotate_right();
    clock.run_until_idle(FRAME_MS, 1000);
    assert_eq!(preview.rotation(), ScreenRotation::Rotate270);

    preview.rotate_left();
    assert_eq!(preview.rotation(), ScreenRotation::Rotate0);
    // From 270 the nearest upright angle is a full turn
    assert_eq!(preview.target_angle(), 360.0);

    clock.run_until_idle(FRAME_MS, 1000);
    assert!(approx(preview.angle(), 360.0));
}

#[test]
fn test_content_follows_every_frame() {
    let (clock, preview, content) = preview();
    preview.allocate(800, 800);

    let allocation = content.allocation().unwrap();
    assert_eq!((allocation.width, allocation.height), (360, 720));
    let center = content_center(&content);
    assert!(approx(center.x, 400.0) && approx(center.y, 400.0));

    preview.rotate_left();
    let requests = preview.widget().allocate_requests();
    clock.run_frames(3, FRAME_MS);
    assert!(preview.widget().allocate_requests() > requests);

    // Laid out for the new orientation and turned around the viewport center
    let allocation = content.allocation().unwrap();
    assert_eq!((allocation.width, allocation.height), (720, 360));
    let center = content_center(&content);
    assert!(approx(center.x, 400.0) && approx(center.y, 400.0));

    clock.run_until_idle(FRAME_MS, 1000);
    let transform = preview.transform().unwrap();
    assert!(approx(transform.angle, 90.0));
    // Both orientations fit at full size
    assert!(approx(transform.scale, 1.0));
}

#[test]
fn test_rotation_while_rotating_keeps_moving() {
    let (clock, preview, _content) = preview();

    preview.rotate_left();
    clock.run_frames(5, FRAME_MS);
    let velocity = preview.rotation_animation().velocity();
    assert!(velocity > 0.0);

    preview.rotate_left();
    assert_eq!(preview.target_angle(), 180.0);
    assert_eq!(preview.rotation_animation().initial_velocity(), velocity);

    clock.run_until_idle(FRAME_MS, 1000);
    assert!(approx(preview.angle(), 180.0));
}

#[test]
fn test_unmapped_preview_turns_immediately() {
    let (clock, preview, _content) = preview();
    preview.widget().unmap();

    preview.rotate_to(ScreenRotation::Rotate180);
    assert_eq!(preview.angle(), 180.0);
    assert!(!clock.has_tick_callbacks());
}

#[test]
fn test_rotation_from_an_intermediate_angle_takes_the_short_way() {
    let (clock, preview, _content) = preview();

    preview.rotate_left();
    clock.run_frames(3, FRAME_MS);
    let angle = preview.angle();
    assert!(angle > 0.0 && angle < 90.0, "angle {angle}");

    // 270 is 90 the other way round from anywhere between 0 and 90
    preview.rotate_to(ScreenRotation::Rotate270);
    assert_eq!(preview.target_angle(), -90.0);
    assert_eq!(preview.rotation_animation().value_from(), angle);

    clock.run_until_idle(FRAME_MS, 1000);
    assert!(approx(preview.angle(), -90.0));
    assert_eq!(preview.rotation(), ScreenRotation::Rotate270);
}

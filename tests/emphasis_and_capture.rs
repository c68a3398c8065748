use std::time::Duration;

use futures::executor::block_on;
use paperloom::capture::RegionRasterizer;
use paperloom::coords::RenderPoint;
use paperloom::emphasis::EmphasisTimer;
use paperloom::selection::SelectionController;
use paperloom::test_utils::test_helpers::{ManualClock, SolidRaster};

#[test]
fn emphasis_clears_after_three_seconds() {
    let clock = ManualClock::new();
    let mut timer = EmphasisTimer::new(&clock, EmphasisTimer::<&ManualClock>::DEFAULT_DURATION);
    timer.arm("h1");

    clock.set_elapsed(Duration::from_millis(2999));
    timer.tick();
    assert_eq!(timer.active_id(), Some("h1"));

    clock.set_elapsed(Duration::from_millis(3001));
    timer.tick();
    assert_eq!(timer.active_id(), None);
}

fn drag(to: f64) -> paperloom::RenderRect {
    let mut controller = SelectionController::new();
    controller.start(0, RenderPoint::new(10.0, 10.0));
    controller.update(RenderPoint::new(to, to));
    controller.finish().expect("drag in progress").rect
}

#[test]
fn small_capture_drag_is_rejected() {
    let source = SolidRaster::new(400, 400, 2.0);
    let result = block_on(RegionRasterizer::default().capture(&source, drag(25.0))).unwrap();
    assert!(result.is_none());
    assert_eq!(source.rasterize_calls(), 0);
}

#[test]
fn large_enough_capture_drag_is_rasterized() {
    let source = SolidRaster::new(400, 400, 2.0);
    let blob = block_on(RegionRasterizer::default().capture(&source, drag(35.0)))
        .unwrap()
        .expect("25x25 drag should be captured");
    assert_eq!(source.rasterize_calls(), 1);
    assert_eq!((blob.width, blob.height), (50, 50));
    assert!(blob.to_data_url().starts_with("data:image/png;base64,"));
}

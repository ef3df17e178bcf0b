//! End-to-end checks of the worker pool against the in-process renderer.

use std::sync::Arc;

use raytile_core::showcase;
use raytile_renderer::{render_local, Coordinator, RenderSettings, RenderState};

fn settings(workers: usize) -> RenderSettings {
    RenderSettings {
        width: 64,
        height: 40,
        section_width: 4,
        worker_count: workers,
        ..Default::default()
    }
}

#[test]
fn test_coordinated_frame_matches_local_render() {
    let _ = env_logger::builder().is_test(true).try_init();
    let scene = Arc::new(showcase::scene());

    for workers in [1, 3, 7] {
        let expected = render_local(&scene, &settings(workers)).unwrap();

        let mut coordinator = Coordinator::new(Arc::clone(&scene), settings(workers)).unwrap();
        assert!(coordinator.request_render().unwrap());
        let frame = coordinator.wait().unwrap();

        assert_eq!(frame, &expected, "mismatch with {} workers", workers);
    }
}

#[test]
fn test_supersampled_frame_matches_local_render() {
    let scene = Arc::new(showcase::scene());
    let mut settings = settings(4);
    settings.shading.super_sampling_rate = 2;
    settings.shading.max_recursion_depth = 2;

    let expected = render_local(&scene, &settings).unwrap();
    let mut coordinator = Coordinator::new(scene, settings).unwrap();
    coordinator.request_render().unwrap();

    assert_eq!(coordinator.wait().unwrap(), &expected);
}

#[test]
fn test_settings_change_between_frames() {
    let scene = Arc::new(showcase::scene());
    let mut coordinator = Coordinator::new(Arc::clone(&scene), settings(2)).unwrap();

    coordinator.request_render().unwrap();
    coordinator.wait().unwrap();

    let mut next = settings(5);
    next.width = 32;
    next.shading.use_mirrors = false;
    coordinator.set_settings(next.clone()).unwrap();

    assert!(coordinator.request_render().unwrap());
    assert_eq!(coordinator.worker_count(), 5);
    let frame = coordinator.wait().unwrap().clone();

    assert_eq!(frame, render_local(&scene, &next).unwrap());
    assert_eq!(coordinator.state(), RenderState::Complete);
    assert_eq!(coordinator.frame_id(), 2);
}

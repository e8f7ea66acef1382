use blend_ngin::{
    camera::{Camera, CameraController, KeyResponse, Projection},
    cgmath::{Deg, InnerSpace, Vector3, Vector4},
    config,
};
use instant::Duration;
use rstest::rstest;
use winit::{event::ElementState, keyboard::KeyCode};

const EPS: f32 = 1e-4;

#[rstest]
#[case::forward(KeyCode::KeyW, Vector3::new(0.0, 0.0, -1.0))]
#[case::backward(KeyCode::KeyS, Vector3::new(0.0, 0.0, 1.0))]
#[case::left(KeyCode::KeyA, Vector3::new(-1.0, 0.0, 0.0))]
#[case::right(KeyCode::KeyD, Vector3::new(1.0, 0.0, 0.0))]
fn held_key_moves_at_camera_speed(#[case] key: KeyCode, #[case] direction: Vector3<f32>) {
    let mut camera = Camera::default();
    let start = camera.position;
    let mut controller = CameraController::new();
    assert_eq!(controller.process_key(key, ElementState::Pressed), KeyResponse::Handled);

    controller.update(&mut camera, Duration::from_millis(500));
    let moved = camera.position - start;
    assert!((moved - direction * config::SPEED * 0.5).magnitude() < EPS, "{moved:?}");

    controller.process_key(key, ElementState::Released);
    controller.update(&mut camera, Duration::from_millis(500));
    assert!((camera.position - start - moved).magnitude() < EPS);
}

#[rstest]
#[case::pressed(ElementState::Pressed, KeyResponse::CloseRequested)]
#[case::released(ElementState::Released, KeyResponse::Ignored)]
fn escape_requests_close_on_press(#[case] state: ElementState, #[case] expected: KeyResponse) {
    let mut controller = CameraController::new();
    assert_eq!(controller.process_key(KeyCode::Escape, state), expected);
}

#[rstest]
#[case::zoom_in(-10.0, 35.0)]
#[case::zoom_out(10.0, 45.0)]
#[case::too_far_in(-100.0, 1.0)]
fn scroll_changes_zoom(#[case] lines: f32, #[case] expected: f32) {
    let mut camera = Camera::default();
    CameraController::new().process_scroll(&mut camera, lines);
    assert_eq!(camera.zoom, expected);
}

#[test]
fn cursor_turns_the_camera_after_the_first_event() {
    let mut camera = Camera::default();
    let mut controller = CameraController::new();
    controller.process_cursor(&mut camera, 100.0, 100.0);
    controller.process_cursor(&mut camera, 200.0, 100.0);
    assert!((camera.yaw().0 - (config::YAW.0 + 100.0 * config::SENSITIVITY)).abs() < EPS);
    assert_eq!(camera.pitch(), Deg(0.0));
}

fn assert_orthonormal(camera: &Camera) {
    let (f, r, u) = (camera.front(), camera.right(), camera.up());
    for (a, b) in [(f, r), (f, u), (r, u)] {
        assert!(a.dot(b).abs() < 1e-5, "{f:?} {r:?} {u:?}");
    }
    for v in [f, r, u] {
        assert!((v.magnitude() - 1.0).abs() < 1e-5, "{v:?}");
    }
}

#[rstest]
#[case::level(Deg(-90.0), Deg(0.0))]
#[case::looking_up(Deg(30.0), Deg(89.0))]
#[case::looking_down(Deg(200.0), Deg(-89.0))]
#[case::beyond_the_limit(Deg(-45.0), Deg(135.0))]
fn basis_stays_orthonormal_while_looking_around(#[case] yaw: Deg<f32>, #[case] pitch: Deg<f32>) {
    let mut camera = Camera::default().with_angles(yaw, pitch);
    assert!(camera.pitch().0.abs() <= config::PITCH_LIMIT);
    assert_orthonormal(&camera);

    let offsets = [
        (1e4, 3e3),
        (-7.3, 900.0),
        (123.0, -1e6),
        (0.01, 0.02),
        (-5e5, 44.0),
        (0.0, 1e6),
    ];
    for (x, y) in offsets {
        camera.process_mouse_movement(x, y);
        assert_orthonormal(&camera);
    }
    assert_eq!(camera.pitch(), Deg(config::PITCH_LIMIT));
}

#[test]
fn projection_follows_resizes() {
    let mut projection = Projection::new(800, 600, config::Z_NEAR, config::Z_FAR);
    projection.resize(1000, 500);
    assert_eq!(projection.aspect(), 2.0);
    projection.resize(0, 500);
    assert_eq!(projection.aspect(), 2.0);
}

#[rstest]
#[case::near(config::Z_NEAR, 0.0)]
#[case::far(config::Z_FAR, 1.0)]
fn projection_maps_depth_to_wgpu_range(#[case] distance: f32, #[case] depth: f32) {
    let projection = Projection::new(800, 600, config::Z_NEAR, config::Z_FAR);
    let clip = projection.calc_matrix(config::ZOOM) * Vector4::new(0.0, 0.0, -distance, 1.0);
    assert!((clip.z / clip.w - depth).abs() < EPS);
}

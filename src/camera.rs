//! Fly-through camera.
//!
//! [`Camera`] owns the viewer state (position, yaw/pitch, zoom) and the
//! orthonormal basis derived from it. [`Projection`] turns the zoom into a
//! perspective matrix. [`CameraController`] translates winit input into the
//! `process_*` calls and remembers which movement keys are held.

use cgmath::{Deg, InnerSpace, Matrix4, Point3, Vector3, perspective};
use instant::Duration;
use winit::{event::ElementState, keyboard::KeyCode};

use crate::config;

/// wgpu clip space has z in [0, 1] while cgmath produces OpenGL's [-1, 1].
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveDirection {
    Forward,
    Backward,
    Left,
    Right,
}

#[derive(Clone, Debug)]
pub struct Camera {
    pub position: Point3<f32>,
    front: Vector3<f32>,
    up: Vector3<f32>,
    right: Vector3<f32>,
    world_up: Vector3<f32>,
    /// Degrees.
    yaw: f32,
    /// Degrees, kept inside `[-PITCH_LIMIT, PITCH_LIMIT]`.
    pitch: f32,
    /// Vertical field of view in degrees.
    pub zoom: f32,
    pub speed: f32,
    pub sensitivity: f32,
}

impl Camera {
    pub fn new<P: Into<Point3<f32>>, V: Into<Vector3<f32>>>(position: P, world_up: V) -> Self {
        let mut camera = Self {
            position: position.into(),
            front: Vector3::new(0.0, 0.0, -1.0),
            up: Vector3::unit_y(),
            right: Vector3::unit_x(),
            world_up: world_up.into(),
            yaw: config::YAW.0,
            pitch: config::PITCH.0,
            zoom: config::ZOOM,
            speed: config::SPEED,
            sensitivity: config::SENSITIVITY,
        };
        camera.update_vectors();
        camera
    }

    pub fn with_angles<Y: Into<Deg<f32>>, P: Into<Deg<f32>>>(mut self, yaw: Y, pitch: P) -> Self {
        self.yaw = yaw.into().0;
        self.pitch = pitch
            .into()
            .0
            .clamp(-config::PITCH_LIMIT, config::PITCH_LIMIT);
        self.update_vectors();
        self
    }

    pub fn front(&self) -> Vector3<f32> {
        self.front
    }

    pub fn up(&self) -> Vector3<f32> {
        self.up
    }

    pub fn right(&self) -> Vector3<f32> {
        self.right
    }

    pub fn yaw(&self) -> Deg<f32> {
        Deg(self.yaw)
    }

    pub fn pitch(&self) -> Deg<f32> {
        Deg(self.pitch)
    }

    /// View matrix looking from `position` along `front`.
    pub fn look_at(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.position, self.position + self.front, self.up)
    }

    pub fn process_keyboard(&mut self, direction: MoveDirection, delta_time: f32) {
        let velocity = self.speed * delta_time;
        match direction {
            MoveDirection::Forward => self.position += self.front * velocity,
            MoveDirection::Backward => self.position -= self.front * velocity,
            MoveDirection::Left => self.position -= self.right * velocity,
            MoveDirection::Right => self.position += self.right * velocity,
        }
    }

    pub fn process_mouse_movement(&mut self, xoffset: f32, yoffset: f32) {
        self.yaw += xoffset * self.sensitivity;
        self.pitch += yoffset * self.sensitivity;
        // past ±90° the front vector flips over the world up axis
        self.pitch = self.pitch.clamp(-config::PITCH_LIMIT, config::PITCH_LIMIT);
        self.update_vectors();
    }

    pub fn process_mouse_scroll(&mut self, yoffset: f32) {
        self.zoom = (self.zoom + yoffset).clamp(config::ZOOM_MIN, config::ZOOM_MAX);
    }

    /// Rebuilds the basis from yaw/pitch/world-up. Never integrated incrementally.
    fn update_vectors(&mut self) {
        let (sin_yaw, cos_yaw) = self.yaw.to_radians().sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch.to_radians().sin_cos();
        self.front = Vector3::new(cos_yaw * cos_pitch, sin_pitch, sin_yaw * cos_pitch).normalize();
        self.right = self.front.cross(self.world_up).normalize();
        self.up = self.right.cross(self.front).normalize();
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(config::CAMERA_START, config::WORLD_UP)
    }
}

/// Perspective parameters that don't depend on the camera.
#[derive(Clone, Debug)]
pub struct Projection {
    aspect: f32,
    znear: f32,
    zfar: f32,
}

impl Projection {
    pub fn new(width: u32, height: u32, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: width as f32 / height.max(1) as f32,
            znear,
            zfar,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    /// Projection for a vertical field of view of `zoom` degrees.
    pub fn calc_matrix(&self, zoom: f32) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * perspective(Deg(zoom), self.aspect, self.znear, self.zfar)
    }
}

/// What the controller wants from the frame loop after a key event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyResponse {
    Handled,
    Ignored,
    CloseRequested,
}

/// Input bookkeeping between winit events and [`Camera`].
#[derive(Debug, Default)]
pub struct CameraController {
    forward: bool,
    backward: bool,
    left: bool,
    right: bool,
    last_cursor: Option<(f32, f32)>,
}

impl CameraController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn process_key(&mut self, key: KeyCode, state: ElementState) -> KeyResponse {
        let pressed = state.is_pressed();
        match key {
            KeyCode::Escape if pressed => KeyResponse::CloseRequested,
            KeyCode::KeyW | KeyCode::ArrowUp => {
                self.forward = pressed;
                KeyResponse::Handled
            }
            KeyCode::KeyS | KeyCode::ArrowDown => {
                self.backward = pressed;
                KeyResponse::Handled
            }
            KeyCode::KeyA | KeyCode::ArrowLeft => {
                self.left = pressed;
                KeyResponse::Handled
            }
            KeyCode::KeyD | KeyCode::ArrowRight => {
                self.right = pressed;
                KeyResponse::Handled
            }
            _ => KeyResponse::Ignored,
        }
    }

    /// Feeds an absolute cursor position. The first event only records the
    /// position so the view doesn't jump when the cursor enters the window.
    pub fn process_cursor(&mut self, camera: &mut Camera, x: f64, y: f64) {
        let (x, y) = (x as f32, y as f32);
        if let Some((last_x, last_y)) = self.last_cursor.replace((x, y)) {
            // window y grows downwards
            camera.process_mouse_movement(x - last_x, last_y - y);
        }
    }

    pub fn process_scroll(&mut self, camera: &mut Camera, yoffset: f32) {
        camera.process_mouse_scroll(yoffset);
    }

    /// Applies held movement keys for the elapsed frame time.
    pub fn update(&self, camera: &mut Camera, dt: Duration) {
        let dt = dt.as_secs_f32();
        let held = [
            (self.forward, MoveDirection::Forward),
            (self.backward, MoveDirection::Backward),
            (self.left, MoveDirection::Left),
            (self.right, MoveDirection::Right),
        ];
        for (_, direction) in held.into_iter().filter(|(down, _)| *down) {
            camera.process_keyboard(direction, dt);
        }
    }
}

/// Orbit camera, projection and pointer drag handling
use nalgebra::{Matrix4, Point3, Vector2, Vector3, Vector4};

use crate::config::CameraConfig;

/// Projection mode for rendering
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProjectionMode {
    Orthographic,
    Perspective,
}

impl ProjectionMode {
    pub fn toggled(self) -> Self {
        match self {
            ProjectionMode::Orthographic => ProjectionMode::Perspective,
            ProjectionMode::Perspective => ProjectionMode::Orthographic,
        }
    }
}

/// Camera orbiting a target point at a yaw/pitch/zoom, with a screen-space
/// pan applied after the look-at.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub yaw: f32,
    pub pitch: f32,
    pub zoom: f32,
    pub pan: Vector3<f32>,
    pub aspect: f32,
    pub mode: ProjectionMode,
    config: CameraConfig,
}

impl Camera {
    pub fn new(config: CameraConfig, width: u32, height: u32) -> Self {
        Self {
            yaw: config.yaw,
            pitch: config.pitch,
            zoom: config.zoom,
            pan: Vector3::zeros(),
            aspect: aspect_ratio(width, height),
            mode: ProjectionMode::Perspective,
            config,
        }
    }

    pub fn config(&self) -> &CameraConfig {
        &self.config
    }

    pub fn target(&self) -> Point3<f32> {
        self.config.target
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.aspect = aspect_ratio(width, height);
    }

    /// Set yaw and pitch in degrees; pitch is clamped
    pub fn set_rotation(&mut self, yaw: f32, pitch: f32) {
        self.yaw = yaw;
        let limit = self.config.pitch_limit;
        self.pitch = pitch.clamp(-limit, limit);
    }

    pub fn set_zoom(&mut self, distance: f32) {
        self.zoom = distance.clamp(self.config.min_zoom, self.config.max_zoom);
    }

    pub fn set_pan(&mut self, x: f32, y: f32) {
        self.pan = Vector3::new(x, y, 0.0);
    }

    /// Restore the configured yaw, pitch and zoom and drop the pan
    pub fn reset(&mut self) {
        self.yaw = self.config.yaw;
        self.pitch = self.config.pitch;
        self.zoom = self.config.zoom;
        self.pan = Vector3::zeros();
    }

    /// Orbit by a pointer drag in pixels
    pub fn orbit(&mut self, dx: f32, dy: f32) {
        self.set_rotation(
            self.yaw + dx * self.config.yaw_per_pixel,
            self.pitch + dy * self.config.pitch_per_pixel,
        );
    }

    /// Pan by a pointer drag in pixels
    pub fn pan_by(&mut self, dx: f32, dy: f32) {
        let step = self.config.pan_per_pixel;
        self.pan.x -= dx * step;
        self.pan.y += dy * step;
    }

    /// Zoom by a wheel delta
    pub fn wheel(&mut self, delta: f32) {
        self.set_zoom(self.zoom + delta * self.config.zoom_per_wheel_unit);
    }

    /// `target + zoom * (cos p sin y, sin p, cos p cos y)`
    pub fn eye(&self) -> Point3<f32> {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        let offset = Vector3::new(pitch.cos() * yaw.sin(), pitch.sin(), pitch.cos() * yaw.cos());
        self.config.target + offset * self.zoom
    }

    /// Create the view matrix (camera transformation)
    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::new_translation(&-self.pan)
            * Matrix4::look_at_rh(&self.eye(), &self.config.target, &Vector3::y())
    }

    /// Create the projection matrix
    pub fn projection_matrix(&self) -> Matrix4<f32> {
        match self.mode {
            ProjectionMode::Perspective => Matrix4::new_perspective(
                self.aspect,
                self.config.fov_y.to_radians(),
                self.config.near,
                self.config.far,
            ),
            ProjectionMode::Orthographic => {
                let height = self.zoom;
                let width = height * self.aspect;
                Matrix4::new_orthographic(
                    -width / 2.0,
                    width / 2.0,
                    -height / 2.0,
                    height / 2.0,
                    self.config.near,
                    self.config.far,
                )
            }
        }
    }

    /// Project a 3D point to 2D screen space
    pub fn project_to_screen(
        &self,
        point: &Point3<f32>,
        model_matrix: &Matrix4<f32>,
        width: u32,
        height: u32,
    ) -> Option<(f32, f32, f32)> {
        let mvp = self.projection_matrix() * self.view_matrix() * model_matrix;
        project_with(&mvp, point, width, height)
    }
}

/// Map `point` through a full model-view-projection matrix into a
/// `width x height` viewport. Returns `(x, y, depth)` with depth in
/// normalized device units, or `None` outside the view volume.
pub fn project_with(
    mvp: &Matrix4<f32>,
    point: &Point3<f32>,
    width: u32,
    height: u32,
) -> Option<(f32, f32, f32)> {
    let clip = mvp * Vector4::new(point.x, point.y, point.z, 1.0);

    // Behind the eye, or degenerate
    if clip.w <= 1e-6 {
        return None;
    }

    let ndc = clip.xyz() / clip.w;
    if ndc.iter().any(|c| !(-1.0..=1.0).contains(c)) {
        return None;
    }

    let screen_x = (ndc.x + 1.0) * 0.5 * width as f32;
    let screen_y = (1.0 - ndc.y) * 0.5 * height as f32;

    Some((screen_x, screen_y, ndc.z))
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(CameraConfig::default(), 800, 600)
    }
}

fn aspect_ratio(width: u32, height: u32) -> f32 {
    width.max(1) as f32 / height.max(1) as f32
}

/// Which drag gesture is in progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragMode {
    Orbit,
    Pan,
}

/// Pointer state between press and release
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerDrag {
    active: Option<DragMode>,
    last: Vector2<f32>,
}

impl PointerDrag {
    /// Button 0 orbits, button 2 pans; anything else is ignored
    pub fn down(&mut self, button: i16, x: f32, y: f32) {
        self.active = match button {
            0 => Some(DragMode::Orbit),
            2 => Some(DragMode::Pan),
            _ => None,
        };
        self.last = Vector2::new(x, y);
    }

    /// Apply the movement since the last event to `camera`
    pub fn moved(&mut self, camera: &mut Camera, x: f32, y: f32) {
        let Some(mode) = self.active else {
            return;
        };
        let current = Vector2::new(x, y);
        let delta = current - self.last;
        self.last = current;
        match mode {
            DragMode::Orbit => camera.orbit(delta.x, delta.y),
            DragMode::Pan => camera.pan_by(delta.x, delta.y),
        }
    }

    pub fn up(&mut self) {
        self.active = None;
    }

    pub fn is_dragging(&self) -> bool {
        self.active.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camera_creation() {
        let camera = Camera::new(CameraConfig::socket(), 800, 600);
        assert_eq!(camera.mode, ProjectionMode::Perspective);
        assert!((camera.aspect - 800.0 / 600.0).abs() < 1e-6);
        assert_eq!(camera.yaw, -45.0);
    }

    #[test]
    fn test_eye_on_orbit_sphere() {
        let camera = Camera::new(CameraConfig::door(), 800, 600);
        let distance = (camera.eye() - camera.target()).norm();
        assert!((distance - 8.0).abs() < 1e-4);
    }

    #[test]
    fn test_eye_straight_ahead() {
        let mut camera = Camera::new(CameraConfig::default(), 100, 100);
        camera.set_rotation(0.0, 0.0);
        assert!((camera.eye() - Point3::new(0.0, 0.0, 5.0)).norm() < 1e-5);
    }

    #[test]
    fn test_pitch_and_zoom_clamped() {
        let mut camera = Camera::new(CameraConfig::door(), 800, 600);
        camera.orbit(0.0, 1000.0);
        assert_eq!(camera.pitch, 89.0);
        camera.set_zoom(100.0);
        assert_eq!(camera.zoom, 15.0);
        camera.wheel(-10_000.0);
        assert_eq!(camera.zoom, 3.0);
    }

    #[test]
    fn test_socket_drag_direction() {
        let mut camera = Camera::new(CameraConfig::socket(), 800, 600);
        camera.orbit(10.0, 0.0);
        assert_eq!(camera.yaw, -50.0);

        let mut door = Camera::new(CameraConfig::door(), 800, 600);
        door.orbit(10.0, 0.0);
        assert_eq!(door.yaw, 50.0);
    }

    #[test]
    fn test_reset_restores_defaults() {
        let mut camera = Camera::new(CameraConfig::socket(), 800, 600);
        camera.orbit(40.0, 40.0);
        camera.pan_by(10.0, 10.0);
        camera.reset();
        assert_eq!(camera.yaw, -45.0);
        assert_eq!(camera.pitch, 30.0);
        assert_eq!(camera.pan, Vector3::zeros());
    }

    #[test]
    fn test_target_projects_to_center() {
        let camera = Camera::new(CameraConfig::door(), 800, 600);
        let (x, y, _) = camera
            .project_to_screen(&camera.target(), &Matrix4::identity(), 800, 600)
            .unwrap();
        assert!((x - 400.0).abs() < 1e-2);
        assert!((y - 300.0).abs() < 1e-2);
    }

    #[test]
    fn test_point_behind_eye_rejected() {
        let mut camera = Camera::new(CameraConfig::default(), 800, 600);
        camera.set_rotation(0.0, 0.0);
        let behind = Point3::new(0.0, 0.0, 20.0);
        assert!(camera
            .project_to_screen(&behind, &Matrix4::identity(), 800, 600)
            .is_none());
    }

    #[test]
    fn test_pointer_drag_pans_with_right_button() {
        let mut camera = Camera::new(CameraConfig::socket(), 800, 600);
        let mut drag = PointerDrag::default();
        drag.down(2, 100.0, 100.0);
        drag.moved(&mut camera, 110.0, 90.0);
        assert!((camera.pan.x + 0.1).abs() < 1e-6);
        assert!((camera.pan.y + 0.1).abs() < 1e-6);
        drag.up();
        drag.moved(&mut camera, 500.0, 500.0);
        assert!((camera.pan.x + 0.1).abs() < 1e-6);
    }
}

//! Compiled-in dimensions, colors, joint limits and camera defaults

use nalgebra::{Point3, Vector3};

use crate::geometry::Rgba;
use crate::joint::JointDomain;

/// Floor socket dimensions and appearance
#[derive(Debug, Clone, PartialEq)]
pub struct SocketConfig {
    pub base_width: f32,
    pub base_depth: f32,
    pub base_height: f32,
    pub bevel: f32,
    pub base_color: Rgba,
    pub base_back_color: Rgba,

    pub recess_thickness: f32,
    pub recess_color: Rgba,

    pub button_size: Vector3<f32>,
    /// Distance of the button from the front edge of the base
    pub button_inset: f32,
    pub button_color: Rgba,
    pub indicator_width: f32,
    pub indicator_height: f32,
    pub indicator_color: Rgba,

    pub cover_width: f32,
    pub cover_depth: f32,
    /// Wedge height as a fraction of the cover depth
    pub wedge_height_ratio: f32,
    pub cover_thickness: f32,
    /// Drop of the closed cover below the top of the base
    pub cover_sink: f32,
    pub body_color: Rgba,

    pub back_panel_scale: (f32, f32),
    pub back_panel_thickness: f32,
    /// Added to the body color for the back panel
    pub back_panel_tint: f32,

    /// Fractions along the sloped edges that bound the socket panel
    pub panel_span: (f32, f32),
    pub panel_lift: f32,
    pub panel_color: Rgba,

    pub hole_radius: f32,
    pub hole_segments: u32,
    pub hole_separation: f32,
    /// Fraction across the panel where the hole pair is centered
    pub hole_center: f32,
    pub hole_lift: f32,
    pub hole_color: Rgba,

    pub cover_domain: JointDomain,
    /// Rendered rotation is `base_angle - θ`
    pub base_angle: f32,
    pub open_target: f32,
    pub speed: f32,
    pub lighting_enabled: bool,
}

impl SocketConfig {
    pub fn wedge_height(&self) -> f32 {
        self.cover_depth * self.wedge_height_ratio
    }

    pub fn back_panel_color(&self) -> Rgba {
        let [r, g, b, _] = self.body_color;
        let tint = self.back_panel_tint;
        [(r + tint).min(1.0), (g + tint).min(1.0), (b + tint).min(1.0), 1.0]
    }
}

impl Default for SocketConfig {
    fn default() -> Self {
        let base_width = 2.0;
        let base_depth = 1.6;
        Self {
            base_width,
            base_depth,
            base_height: 0.2,
            bevel: 0.1,
            base_color: [0.75, 0.75, 0.78, 1.0],
            base_back_color: [0.6, 0.6, 0.65, 1.0],
            recess_thickness: 0.02,
            recess_color: [0.4, 0.4, 0.4, 1.0],
            button_size: Vector3::new(0.5, 0.02, 0.15),
            button_inset: 0.2,
            button_color: [0.6, 0.6, 0.6, 1.0],
            indicator_width: 0.1,
            indicator_height: 0.07,
            indicator_color: [0.3, 0.3, 0.3, 1.0],
            cover_width: base_width - 0.6,
            cover_depth: base_depth - 0.4,
            wedge_height_ratio: 0.9,
            cover_thickness: 0.02,
            cover_sink: 0.1,
            body_color: [0.5, 0.5, 0.5, 1.0],
            back_panel_scale: (1.2, 1.05),
            back_panel_thickness: 0.05,
            back_panel_tint: 0.3,
            panel_span: (0.15, 0.85),
            panel_lift: 0.01,
            panel_color: [0.95, 0.95, 0.95, 1.0],
            hole_radius: 0.04,
            hole_segments: 15,
            hole_separation: 0.1,
            hole_center: 0.7,
            hole_lift: 0.005,
            hole_color: [0.1, 0.1, 0.1, 1.0],
            cover_domain: JointDomain::new(0.0, 85.0),
            base_angle: 90.0,
            open_target: 85.0,
            speed: 2.5,
            lighting_enabled: false,
        }
    }
}

/// Folding door dimensions and appearance
#[derive(Debug, Clone, PartialEq)]
pub struct DoorConfig {
    pub panel_width: f32,
    pub panel_height: f32,
    pub panel_thickness: f32,
    pub frame_width: f32,
    pub gap: f32,
    /// Fixed wall point panel 1 hangs from, x and z; y is half the height
    pub wall_x: f32,
    pub wall_z: f32,

    pub frame_color: Rgba,
    pub frame_segments: u32,
    /// Radius of the edge tubes relative to the frame width
    pub frame_radius_ratio: f32,
    /// Spacing of paired horizontal bars relative to the edge tube radius
    pub bar_gap_ratio: f32,
    /// Horizontal bar radius relative to the edge tube radius
    pub bar_radius_ratio: f32,

    pub fill_colors: [Rgba; 3],
    /// Fill slab thickness relative to the panel thickness
    pub fill_thickness_ratio: f32,

    pub hinge_radius: f32,
    pub hinge_height: f32,
    pub hinge_segments: u32,
    /// Knuckle centers as fractions of the panel height from its bottom
    pub hinge_heights: [f32; 2],

    pub leg_radius: f32,
    pub leg_height: f32,
    pub leg_segments: u32,
    pub leg_inset: f32,

    pub domains: [JointDomain; 4],
    pub open_targets: [f32; 4],
    pub fold_targets: [f32; 4],
    pub speed: f32,
    pub lighting_enabled: bool,
}

impl DoorConfig {
    pub fn frame_radius(&self) -> f32 {
        self.frame_width * self.frame_radius_ratio
    }

    pub fn bar_gap(&self) -> f32 {
        self.frame_radius() * self.bar_gap_ratio
    }

    pub fn bar_radius(&self) -> f32 {
        self.frame_radius() * self.bar_radius_ratio
    }

    /// Offset from one panel's pivot to the next
    pub fn link_offset(&self) -> Vector3<f32> {
        Vector3::new(self.panel_width + self.gap, 0.0, 0.0)
    }

    pub fn wall_point(&self) -> Vector3<f32> {
        Vector3::new(self.wall_x, self.panel_height / 2.0, self.wall_z)
    }
}

impl Default for DoorConfig {
    fn default() -> Self {
        let wide = JointDomain::new(-170.0, 170.0);
        let one_sided = JointDomain::new(0.0, 170.0);
        Self {
            panel_width: 0.8,
            panel_height: 2.8,
            panel_thickness: 0.05,
            frame_width: 0.08,
            gap: 0.02,
            wall_x: -2.0,
            wall_z: 0.0,
            frame_color: [0.98, 0.94, 0.85, 1.0],
            frame_segments: 16,
            frame_radius_ratio: 0.5,
            bar_gap_ratio: 1.8,
            bar_radius_ratio: 0.65,
            fill_colors: [
                [0.85, 0.75, 0.60, 1.0],
                [0.35, 0.25, 0.15, 1.0],
                [0.85, 0.75, 0.60, 1.0],
            ],
            fill_thickness_ratio: 0.8,
            hinge_radius: 0.06,
            hinge_height: 0.18,
            hinge_segments: 12,
            hinge_heights: [0.4, 0.8],
            leg_radius: 0.04,
            leg_height: 0.18,
            leg_segments: 16,
            leg_inset: 0.1,
            domains: [wide, one_sided, wide, one_sided],
            open_targets: [90.0; 4],
            fold_targets: [0.0, 170.0, -170.0, 170.0],
            speed: 1.5,
            lighting_enabled: true,
        }
    }
}

/// Orbit camera defaults and limits
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraConfig {
    pub yaw: f32,
    pub pitch: f32,
    pub zoom: f32,
    pub target: Point3<f32>,
    pub min_zoom: f32,
    pub max_zoom: f32,
    /// Degrees of yaw per pixel of horizontal drag; the sign picks the
    /// drag direction
    pub yaw_per_pixel: f32,
    pub pitch_per_pixel: f32,
    pub pan_per_pixel: f32,
    pub zoom_per_wheel_unit: f32,
    pub pitch_limit: f32,
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
}

impl CameraConfig {
    pub fn socket() -> Self {
        Self {
            yaw: -45.0,
            pitch: 30.0,
            zoom: 5.0,
            target: Point3::origin(),
            min_zoom: 1.0,
            max_zoom: 20.0,
            yaw_per_pixel: -0.5,
            ..Self::default()
        }
    }

    pub fn door() -> Self {
        Self {
            yaw: 45.0,
            pitch: 20.0,
            zoom: 8.0,
            target: Point3::new(0.0, 2.0, 0.0),
            min_zoom: 3.0,
            max_zoom: 15.0,
            yaw_per_pixel: 0.5,
            ..Self::default()
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.0,
            zoom: 5.0,
            target: Point3::origin(),
            min_zoom: 1.0,
            max_zoom: 20.0,
            yaw_per_pixel: 0.5,
            pitch_per_pixel: 0.5,
            pan_per_pixel: 0.01,
            zoom_per_wheel_unit: 0.01,
            pitch_limit: 89.0,
            fov_y: 45.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_socket_derived_sizes() {
        let config = SocketConfig::default();
        assert!((config.cover_width - 1.4).abs() < 1e-6);
        assert!((config.cover_depth - 1.2).abs() < 1e-6);
        assert!((config.wedge_height() - 1.08).abs() < 1e-6);
        let back = config.back_panel_color();
        assert!((back[0] - 0.8).abs() < 1e-6);
        assert_eq!(back[3], 1.0);
    }

    #[test]
    fn test_door_frame_proportions() {
        let config = DoorConfig::default();
        assert!((config.frame_radius() - 0.04).abs() < 1e-6);
        assert!((config.bar_gap() - 0.072).abs() < 1e-6);
        assert!((config.bar_radius() - 0.026).abs() < 1e-6);
        assert!((config.link_offset().x - 0.82).abs() < 1e-6);
    }

    #[test]
    fn test_fold_targets_in_domain() {
        let config = DoorConfig::default();
        for (domain, target) in config.domains.iter().zip(config.fold_targets) {
            assert!(domain.contains(target));
        }
    }
}

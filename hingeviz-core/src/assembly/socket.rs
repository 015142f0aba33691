use nalgebra::{Point3, Vector3};

use crate::animation::AnimationKind;
use crate::assembly::{Assembly, AssemblyKind, Part};
use crate::config::{CameraConfig, SocketConfig};
use crate::geometry::GeometryBuffers;
use crate::joint::{Joint, SingleHinge};
use crate::primitives::{self, HoledPanel};

/// Pop-up floor socket: a fixed bevelled frame with a wedge cover that
/// swings up about its rear edge
#[derive(Debug, Clone, PartialEq)]
pub struct FloorSocket {
    config: SocketConfig,
    hinge: SingleHinge,
}

impl FloorSocket {
    pub fn new(config: SocketConfig) -> Self {
        let joint = Joint::new("cover", -Vector3::x_axis(), config.cover_domain);
        let hinge = SingleHinge::new(
            joint,
            Point3::new(0.0, 0.0, config.cover_depth / 2.0),
            Vector3::new(0.0, config.base_height / 2.0, 0.0),
            config.base_angle,
        );
        Self { config, hinge }
    }

    pub fn config(&self) -> &SocketConfig {
        &self.config
    }

    pub fn hinge(&self) -> &SingleHinge {
        &self.hinge
    }

    fn base_parts(&self, parts: &mut Vec<Part>) {
        let c = &self.config;
        let top = c.base_height / 2.0;

        let mut frame = GeometryBuffers::new();
        primitives::bevelled_frame(
            &mut frame,
            Point3::origin(),
            c.base_width,
            c.base_depth,
            c.base_height,
            c.bevel,
            c.base_color,
            c.base_back_color,
        );
        parts.push(Part::fixed("base frame", frame));

        let mut recess = GeometryBuffers::new();
        primitives::cuboid(
            &mut recess,
            Point3::new(0.0, top - c.recess_thickness / 2.0, 0.0),
            c.base_width - 2.0 * c.bevel,
            c.recess_thickness,
            c.base_depth - 2.0 * c.bevel,
            c.recess_color,
        );
        parts.push(Part::fixed("recess", recess));

        let button_z = -c.base_depth / 2.0 + c.button_inset;
        let mut button = GeometryBuffers::new();
        primitives::cuboid(
            &mut button,
            Point3::new(0.0, top, button_z),
            c.button_size.x,
            c.button_size.y,
            c.button_size.z,
            c.button_color,
        );
        parts.push(Part::fixed("button", button));

        // just above the button face
        let mut indicator = GeometryBuffers::new();
        primitives::indicator_triangle(
            &mut indicator,
            Point3::new(0.0, top + c.button_size.y / 2.0 + 0.001, button_z),
            c.indicator_width,
            c.indicator_height,
            c.indicator_color,
        );
        parts.push(Part::fixed("indicator", indicator));
    }

    fn closed_cover(&self) -> Part {
        let c = &self.config;
        let mut cover = GeometryBuffers::new();
        primitives::cuboid(
            &mut cover,
            Point3::new(0.0, c.base_height / 2.0 - c.cover_sink, 0.0),
            c.cover_width,
            c.cover_thickness,
            c.cover_depth,
            c.base_color,
        );
        Part::fixed("cover", cover)
    }

    /// Wedge, back panel and socket face in hinge-local space
    fn open_cover(&self) -> Part {
        let c = &self.config;
        let (width, depth, height) = (c.cover_width, c.cover_depth, c.wedge_height());
        let mut mesh = GeometryBuffers::new();

        primitives::wedge(&mut mesh, width, depth, height, c.body_color);

        let (scale_w, scale_h) = c.back_panel_scale;
        let panel_height = height * scale_h;
        primitives::cuboid(
            &mut mesh,
            Point3::new(0.0, panel_height / 2.0, depth / 2.0 + c.back_panel_thickness / 2.0),
            width * scale_w,
            panel_height,
            c.back_panel_thickness,
            c.back_panel_color(),
        );

        mesh_socket_face(&mut mesh, c, width, depth, height);
        Part::jointed("cover", self.hinge.transform(), mesh)
    }
}

/// White socket face on the sloped side of the wedge with its hole pair
fn mesh_socket_face(mesh: &mut GeometryBuffers, c: &SocketConfig, width: f32, depth: f32, height: f32) {
    let (w2, d2) = (width / 2.0, depth / 2.0);
    // sloped edges run from the front bottom corners to the back top corners
    let left = (Point3::new(-w2, 0.0, -d2), Point3::new(-w2, height, d2));
    let right = (Point3::new(w2, 0.0, -d2), Point3::new(w2, height, d2));
    let along = |(from, to): (Point3<f32>, Point3<f32>), t: f32| from + (to - from) * t;

    let (low, high) = c.panel_span;
    let bottom_left = along(left, low);
    let bottom_right = along(right, low);
    let top_left = along(left, high);
    let top_right = along(right, high);

    let bottom = bottom_left + (bottom_right - bottom_left) * c.hole_center;
    let top = top_left + (top_right - top_left) * c.hole_center;
    let center = bottom + (top - bottom) * 0.5;
    let across = (bottom_right - bottom_left).normalize() * c.hole_separation;

    // seen from in front of the slope +x is on the viewer's left
    let panel = HoledPanel {
        corners: [bottom_right, bottom_left, top_left, top_right],
        color: c.panel_color,
        lift: c.panel_lift,
        holes: vec![center - across, center + across],
        hole_radius: c.hole_radius,
        hole_segments: c.hole_segments,
        hole_color: c.hole_color,
        hole_lift: c.hole_lift,
    };
    primitives::panel_with_holes(mesh, &panel);
}

impl Default for FloorSocket {
    fn default() -> Self {
        Self::new(SocketConfig::default())
    }
}

impl Assembly for FloorSocket {
    fn kind(&self) -> AssemblyKind {
        AssemblyKind::Socket
    }

    fn joints(&self) -> &[Joint] {
        std::slice::from_ref(self.hinge.joint())
    }

    fn joints_mut(&mut self) -> &mut [Joint] {
        std::slice::from_mut(self.hinge.joint_mut())
    }

    fn parts(&self) -> Vec<Part> {
        let mut parts = Vec::with_capacity(5);
        self.base_parts(&mut parts);
        // at rest the wedge would lie flat inside the recess
        parts.push(if self.hinge.is_closed() {
            self.closed_cover()
        } else {
            self.open_cover()
        });
        parts
    }

    fn animation_targets(&self, kind: AnimationKind) -> Option<Vec<f32>> {
        match kind {
            AnimationKind::Open => Some(vec![self.config.open_target]),
            AnimationKind::Close => Some(vec![0.0]),
            AnimationKind::Fold => None,
        }
    }

    fn animation_speed(&self) -> f32 {
        self.config.speed
    }

    fn camera(&self) -> CameraConfig {
        CameraConfig::socket()
    }

    fn lighting_enabled(&self) -> bool {
        self.config.lighting_enabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::triangle_area;

    fn cover(socket: &FloorSocket) -> Part {
        socket
            .parts()
            .into_iter()
            .find(|part| part.name == "cover")
            .unwrap()
    }

    #[test]
    fn test_closed_cover_is_flat_box() {
        let socket = FloorSocket::default();
        let cover = cover(&socket);
        assert!(!cover.jointed);
        assert_eq!(cover.mesh.vertex_count(), 8);
        assert_eq!(cover.mesh.triangle_count(), 12);
    }

    #[test]
    fn test_open_cover_has_wedge_panel_and_holes() {
        let mut socket = FloorSocket::default();
        socket.set_joint(0, 40.0).unwrap();
        let cover = cover(&socket);
        assert!(cover.jointed);
        // wedge 6, back panel 8, face 4, two discs of 15 segments
        assert_eq!(cover.mesh.vertex_count(), 6 + 8 + 4 + 2 * 17);
    }

    #[test]
    fn test_socket_face_points_out_of_slope() {
        let socket = FloorSocket::default();
        let c = socket.config();
        let mut mesh = GeometryBuffers::new();
        mesh_socket_face(&mut mesh, c, c.cover_width, c.cover_depth, c.wedge_height());
        let normal = mesh.normals()[0];
        assert!(normal.y > 0.0);
        assert!(normal.z < 0.0);
        assert!(normal.x.abs() < 1e-6);
    }

    #[test]
    fn test_holes_sit_in_front_of_face() {
        let socket = FloorSocket::default();
        let c = socket.config();
        let mut mesh = GeometryBuffers::new();
        mesh_socket_face(&mut mesh, c, c.cover_width, c.cover_depth, c.wedge_height());
        let normal = mesh.normals()[0];
        let face = mesh.positions()[0];
        let hub = mesh.positions()[4];
        let offset = (hub - face).dot(&normal);
        assert!((offset - c.hole_lift).abs() < 1e-5);
    }

    #[test]
    fn test_static_parts_have_area_at_limits() {
        let mut socket = FloorSocket::default();
        for angle in [0.0, 85.0] {
            socket.set_joint(0, angle).unwrap();
            for part in socket.parts().iter().filter(|p| !p.jointed) {
                for [a, b, c] in part.mesh.triangles() {
                    assert!(triangle_area(&a, &b, &c) > 0.0, "{}", part.name);
                }
            }
        }
    }

    #[test]
    fn test_fully_open_wedge_stands_on_hinge() {
        let mut socket = FloorSocket::default();
        socket.set_joint(0, 85.0).unwrap();
        let cover = cover(&socket);
        let hinge_point = Point3::new(0.0, 0.0, socket.config().cover_depth / 2.0);
        let world = cover.transform.transform_point(&hinge_point);
        assert!((world - Point3::new(0.0, 0.1, 0.6)).norm() < 1e-5);
        assert!((socket.hinge().render_angle() - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_fold_unsupported() {
        let socket = FloorSocket::default();
        assert!(socket.animation_targets(AnimationKind::Fold).is_none());
        assert_eq!(socket.animation_targets(AnimationKind::Open), Some(vec![85.0]));
    }
}

//! Elementary solids appended to a [`GeometryBuffers`].
//!
//! Every builder appends its vertices and triangle indices to the target
//! buffers and returns the index of its first vertex. Shapes are authored in
//! whatever space the caller hands in; jointed parts build them in local part
//! space with the pivot at an edge, and the composer moves them afterwards.
//! Triangles wind counter-clockwise seen from outside.

use std::f32::consts::TAU;

use nalgebra::{Point2, Point3, Vector3};

use crate::geometry::{face_normal, GeometryBuffers, Rgba, Vertex};

/// Principal axis of a cylinder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CylinderAxis {
    /// Along +x
    Horizontal,
    /// Along +y
    Vertical,
}

impl CylinderAxis {
    /// `(axis, u, v)` with `u x v = axis`; radial direction at angle `a` is
    /// `cos(a) u + sin(a) v`.
    fn frame(self) -> (Vector3<f32>, Vector3<f32>, Vector3<f32>) {
        match self {
            CylinderAxis::Horizontal => (Vector3::x(), Vector3::y(), Vector3::z()),
            CylinderAxis::Vertical => (Vector3::y(), Vector3::z(), Vector3::x()),
        }
    }
}

/// Which cylinder ends get a cap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Caps {
    Both,
    Start,
    End,
    None,
}

impl Caps {
    fn start(self) -> bool {
        matches!(self, Caps::Both | Caps::Start)
    }

    fn end(self) -> bool {
        matches!(self, Caps::Both | Caps::End)
    }
}

/// Parameters for [`cylinder`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CylinderSpec {
    /// Center of the start cap
    pub start: Point3<f32>,
    pub length: f32,
    pub radius: f32,
    pub segments: u32,
    pub color: Rgba,
    pub axis: CylinderAxis,
    pub caps: Caps,
}

/// Parameters for [`panel_with_holes`]
#[derive(Debug, Clone, PartialEq)]
pub struct HoledPanel {
    /// Corners counter-clockwise as seen from the front
    pub corners: [Point3<f32>; 4],
    pub color: Rgba,
    /// Offset of the panel along its normal
    pub lift: f32,
    /// Hole centers on the un-lifted panel plane
    pub holes: Vec<Point3<f32>>,
    pub hole_radius: f32,
    pub hole_segments: u32,
    pub hole_color: Rgba,
    /// Extra offset of the hole discs beyond `lift`
    pub hole_lift: f32,
}

impl HoledPanel {
    /// Unit normal from the cross product of the two diagonals
    pub fn normal(&self) -> Vector3<f32> {
        let [c0, c1, c2, c3] = self.corners;
        (c2 - c0)
            .cross(&(c3 - c1))
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(Vector3::z)
    }

    /// Vertices appended by [`panel_with_holes`]
    pub fn vertex_count(&self) -> usize {
        4 + self.holes.len() * (self.hole_segments as usize + 2)
    }
}

/// Axis-aligned box with 8 shared corners and 12 triangles.
///
/// Vertex normals point along the corner diagonals.
pub fn cuboid(
    buffers: &mut GeometryBuffers,
    center: Point3<f32>,
    width: f32,
    height: f32,
    depth: f32,
    color: Rgba,
) -> u32 {
    let start = buffers.next_index();
    let half = Vector3::new(width / 2.0, height / 2.0, depth / 2.0);

    // bottom front, top front, bottom back, top back
    const SIGNS: [[f32; 3]; 8] = [
        [-1.0, -1.0, 1.0],
        [1.0, -1.0, 1.0],
        [1.0, 1.0, 1.0],
        [-1.0, 1.0, 1.0],
        [-1.0, -1.0, -1.0],
        [1.0, -1.0, -1.0],
        [1.0, 1.0, -1.0],
        [-1.0, 1.0, -1.0],
    ];
    for [sx, sy, sz] in SIGNS {
        let sign = Vector3::new(sx, sy, sz);
        buffers.push_vertex(Vertex::new(
            center + sign.component_mul(&half),
            sign.normalize(),
            color,
            Point2::new((sx + 1.0) / 2.0, (sy + 1.0) / 2.0),
        ));
    }

    const FACES: [u32; 36] = [
        0, 1, 2, 0, 2, 3, // front
        5, 4, 7, 5, 7, 6, // back
        4, 0, 3, 4, 3, 7, // left
        1, 5, 6, 1, 6, 2, // right
        3, 2, 6, 3, 6, 7, // top
        4, 5, 1, 4, 1, 0, // bottom
    ];
    for tri in FACES.chunks_exact(3) {
        buffers.push_triangle(start + tri[0], start + tri[1], start + tri[2]);
    }
    start
}

/// One quad with a flat normal and `0..1` texture coordinates.
///
/// `corners` go counter-clockwise seen from the side `normal` faces.
pub fn quad(buffers: &mut GeometryBuffers, corners: [Point3<f32>; 4], normal: Vector3<f32>, color: Rgba) -> u32 {
    const UV: [[f32; 2]; 4] = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];

    let start = buffers.next_index();
    for (corner, [u, v]) in corners.into_iter().zip(UV) {
        buffers.push_vertex(Vertex::new(corner, normal, color, Point2::new(u, v)));
    }
    buffers.push_triangle(start, start + 1, start + 2);
    buffers.push_triangle(start, start + 2, start + 3);
    start
}

/// Box made of six independent quads (24 vertices) with flat face normals.
///
/// `origin` is the minimum x/y corner; the slab is centered on `origin.z`.
pub fn slab(
    buffers: &mut GeometryBuffers,
    origin: Point3<f32>,
    width: f32,
    height: f32,
    thickness: f32,
    color: Rgba,
) -> u32 {
    let (x0, y0) = (origin.x, origin.y);
    let (x1, y1) = (origin.x + width, origin.y + height);
    let (zf, zb) = (origin.z + thickness / 2.0, origin.z - thickness / 2.0);
    let v = [
        Point3::new(x0, y0, zf),
        Point3::new(x1, y0, zf),
        Point3::new(x1, y1, zf),
        Point3::new(x0, y1, zf),
        Point3::new(x0, y0, zb),
        Point3::new(x1, y0, zb),
        Point3::new(x1, y1, zb),
        Point3::new(x0, y1, zb),
    ];

    let start = quad(buffers, [v[0], v[1], v[2], v[3]], Vector3::z(), color);
    quad(buffers, [v[5], v[4], v[7], v[6]], -Vector3::z(), color);
    quad(buffers, [v[3], v[2], v[6], v[7]], Vector3::y(), color);
    quad(buffers, [v[4], v[5], v[1], v[0]], -Vector3::y(), color);
    quad(buffers, [v[1], v[5], v[6], v[2]], Vector3::x(), color);
    quad(buffers, [v[4], v[0], v[3], v[7]], -Vector3::x(), color);
    start
}

/// Flat indicator triangle lying in the horizontal plane, apex toward -z
pub fn indicator_triangle(
    buffers: &mut GeometryBuffers,
    center: Point3<f32>,
    base_width: f32,
    base_height: f32,
    color: Rgba,
) -> u32 {
    let half_w = base_width / 2.0;
    let half_h = base_height / 2.0;
    let up = Vector3::y();

    let apex = buffers.push_vertex(Vertex::new(
        center - Vector3::new(0.0, 0.0, half_h),
        up,
        color,
        Point2::new(0.5, 1.0),
    ));
    buffers.push_vertex(Vertex::new(
        center + Vector3::new(-half_w, 0.0, half_h),
        up,
        color,
        Point2::new(0.0, 0.0),
    ));
    buffers.push_vertex(Vertex::new(
        center + Vector3::new(half_w, 0.0, half_h),
        up,
        color,
        Point2::new(1.0, 0.0),
    ));
    buffers.push_triangle(apex, apex + 1, apex + 2);
    apex
}

/// Truncated-pyramid frame: four outer corners at floor level, four inner
/// corners `bevel` in from them at the top. The back (-z) corners take
/// `back_color`.
#[allow(clippy::too_many_arguments)]
pub fn bevelled_frame(
    buffers: &mut GeometryBuffers,
    center: Point3<f32>,
    width: f32,
    depth: f32,
    height: f32,
    bevel: f32,
    top_color: Rgba,
    back_color: Rgba,
) -> u32 {
    let start = buffers.next_index();
    let first_index = buffers.index_count();

    let (w2, d2, h2) = (width / 2.0, depth / 2.0, height / 2.0);
    let (bw, bd) = (w2 - bevel, d2 - bevel);
    let corners = [
        Vector3::new(-w2, -h2, d2),
        Vector3::new(w2, -h2, d2),
        Vector3::new(w2, -h2, -d2),
        Vector3::new(-w2, -h2, -d2),
        Vector3::new(-bw, h2, bd),
        Vector3::new(bw, h2, bd),
        Vector3::new(bw, h2, -bd),
        Vector3::new(-bw, h2, -bd),
    ];
    for (i, offset) in corners.into_iter().enumerate() {
        let color = match i {
            2 | 3 | 6 | 7 => back_color,
            _ => top_color,
        };
        let uv = Point2::new((offset.x + w2) / width, (offset.z + d2) / depth);
        buffers.push_vertex(Vertex::new(center + offset, Vector3::y(), color, uv));
    }

    const FACES: [u32; 36] = [
        4, 5, 6, 4, 6, 7, // top
        0, 1, 5, 0, 5, 4, // front bevel
        1, 2, 6, 1, 6, 5, // right bevel
        2, 3, 7, 2, 7, 6, // back bevel
        3, 0, 4, 3, 4, 7, // left bevel
        0, 3, 2, 0, 2, 1, // bottom
    ];
    for tri in FACES.chunks_exact(3) {
        buffers.push_triangle(start + tri[0], start + tri[1], start + tri[2]);
    }
    buffers.smooth_normals(start, first_index);
    start
}

/// Triangular prism with its rectangular base on `y = 0`, its vertical face
/// at the back edge `z = depth / 2` and its sloped face rising from the front
/// edge. Centered on x and z.
pub fn wedge(buffers: &mut GeometryBuffers, width: f32, depth: f32, height: f32, color: Rgba) -> u32 {
    let start = buffers.next_index();
    let first_index = buffers.index_count();

    let (w2, d2) = (width / 2.0, depth / 2.0);
    let corners = [
        Point3::new(-w2, 0.0, -d2),
        Point3::new(w2, 0.0, -d2),
        Point3::new(w2, 0.0, d2),
        Point3::new(-w2, 0.0, d2),
        Point3::new(-w2, height, d2),
        Point3::new(w2, height, d2),
    ];
    for corner in corners {
        let uv = Point2::new((corner.x + w2) / width, (corner.z + d2) / depth);
        buffers.push_vertex(Vertex::new(corner, Vector3::y(), color, uv));
    }

    const FACES: [u32; 24] = [
        0, 1, 2, 0, 2, 3, // bottom
        3, 2, 5, 3, 5, 4, // back
        0, 4, 5, 0, 5, 1, // sloped top
        0, 3, 4, 1, 5, 2, // sides
    ];
    for tri in FACES.chunks_exact(3) {
        buffers.push_triangle(start + tri[0], start + tri[1], start + tri[2]);
    }
    buffers.smooth_normals(start, first_index);
    start
}

/// Triangle fan disc around `center` in the plane spanned by `u` and `v`.
///
/// Winds so that its face normal is `u x v`, or the reverse when `flip`.
#[allow(clippy::too_many_arguments)]
fn disc(
    buffers: &mut GeometryBuffers,
    center: Point3<f32>,
    u: &Vector3<f32>,
    v: &Vector3<f32>,
    radius: f32,
    segments: u32,
    normal: Vector3<f32>,
    color: Rgba,
    flip: bool,
) -> u32 {
    let hub = buffers.push_vertex(Vertex::new(center, normal, color, Point2::new(0.5, 0.5)));
    for i in 0..=segments {
        let angle = i as f32 / segments as f32 * TAU;
        let (sin, cos) = angle.sin_cos();
        buffers.push_vertex(Vertex::new(
            center + (u * cos + v * sin) * radius,
            normal,
            color,
            Point2::new(0.5 + 0.5 * cos, 0.5 + 0.5 * sin),
        ));
    }
    for i in 0..segments {
        let (a, b) = (hub + 1 + i, hub + 2 + i);
        if flip {
            buffers.push_triangle(hub, b, a);
        } else {
            buffers.push_triangle(hub, a, b);
        }
    }
    hub
}

/// Cylinder of `segments` flat-shaded side quads plus optional fan caps
pub fn cylinder(buffers: &mut GeometryBuffers, spec: &CylinderSpec) -> u32 {
    let first = buffers.next_index();
    let (axis, u, v) = spec.axis.frame();
    let end = spec.start + axis * spec.length;
    let segments = spec.segments.max(3);

    let radial = |i: u32| {
        let angle = i as f32 / segments as f32 * TAU;
        u * angle.cos() + v * angle.sin()
    };

    for i in 0..segments {
        let (r1, r2) = (radial(i), radial(i + 1));
        let normal = ((r1 + r2) / 2.0).normalize();
        let (s1, s2) = (i as f32 / segments as f32, (i + 1) as f32 / segments as f32);
        let base = buffers.push_vertex(Vertex::new(spec.start + r1 * spec.radius, normal, spec.color, Point2::new(s1, 0.0)));
        buffers.push_vertex(Vertex::new(spec.start + r2 * spec.radius, normal, spec.color, Point2::new(s2, 0.0)));
        buffers.push_vertex(Vertex::new(end + r2 * spec.radius, normal, spec.color, Point2::new(s2, 1.0)));
        buffers.push_vertex(Vertex::new(end + r1 * spec.radius, normal, spec.color, Point2::new(s1, 1.0)));
        buffers.push_triangle(base, base + 1, base + 2);
        buffers.push_triangle(base, base + 2, base + 3);
    }

    if spec.caps.start() {
        disc(buffers, spec.start, &u, &v, spec.radius, segments, -axis, spec.color, true);
    }
    if spec.caps.end() {
        disc(buffers, end, &u, &v, spec.radius, segments, axis, spec.color, false);
    }
    first
}

/// Quad panel lifted along its normal, with opaque hole discs lifted further
pub fn panel_with_holes(buffers: &mut GeometryBuffers, panel: &HoledPanel) -> u32 {
    let normal = panel.normal();
    let lift = normal * panel.lift;
    let [c0, c1, c2, c3] = panel.corners;

    let start = quad(buffers, [c0 + lift, c1 + lift, c2 + lift, c3 + lift], normal, panel.color);

    let right = (c1 - c0).try_normalize(f32::EPSILON).unwrap_or_else(Vector3::x);
    let up = (c3 - c0).try_normalize(f32::EPSILON).unwrap_or_else(Vector3::y);
    let hole_lift = normal * (panel.lift + panel.hole_lift);
    for center in &panel.holes {
        disc(
            buffers,
            *center + hole_lift,
            &right,
            &up,
            panel.hole_radius,
            panel.hole_segments,
            normal,
            panel.hole_color,
            false,
        );
    }
    start
}

/// Vertex count of [`cylinder`] for the given segment count and caps
pub fn cylinder_vertex_count(segments: u32, caps: Caps) -> usize {
    let segments = segments.max(3) as usize;
    let cap = segments + 2;
    4 * segments + cap * (caps.start() as usize + caps.end() as usize)
}

/// Outward-facing check used by the tests: every triangle's geometric normal
/// points away from `inside`.
pub fn faces_point_away(buffers: &GeometryBuffers, inside: &Point3<f32>) -> bool {
    buffers.triangles().all(|[a, b, c]| {
        let n = face_normal(&a, &b, &c);
        let centroid = Point3::from((a.coords + b.coords + c.coords) / 3.0);
        n.dot(&(centroid - inside)) > 0.0
    })
}

//! Geometry buffers shared by the primitive builder, the assembly composer
//! and the render backends

use std::ops::Range;

use nalgebra::{Matrix4, Point2, Point3, Vector3};

use crate::error::{HingevizError, Result};
use crate::transform::Transform;

/// RGBA color with components in `0.0..=1.0`
pub type Rgba = [f32; 4];

/// A vertex with every attribute the backends consume
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: Point3<f32>,
    pub normal: Vector3<f32>,
    pub color: Rgba,
    pub texcoord: Point2<f32>,
}

impl Vertex {
    pub fn new(position: Point3<f32>, normal: Vector3<f32>, color: Rgba, texcoord: Point2<f32>) -> Self {
        Self {
            position,
            normal,
            color,
            texcoord,
        }
    }
}

/// Unit normal of the triangle `a, b, c` under counter-clockwise winding.
///
/// Degenerate triangles yield the zero vector instead of NaNs.
pub fn face_normal(a: &Point3<f32>, b: &Point3<f32>, c: &Point3<f32>) -> Vector3<f32> {
    let edge1 = b - a;
    let edge2 = c - a;
    edge1
        .cross(&edge2)
        .try_normalize(f32::EPSILON)
        .unwrap_or_else(Vector3::zeros)
}

/// Area of the triangle `a, b, c`
pub fn triangle_area(a: &Point3<f32>, b: &Point3<f32>, c: &Point3<f32>) -> f32 {
    (b - a).cross(&(c - a)).norm() * 0.5
}

/// Parallel vertex attribute sequences plus a triangle index list.
///
/// The four attribute sequences always have the same length. Grid lines, when
/// present, occupy a contiguous vertex range at the end of the buffers and are
/// drawn without indices.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeometryBuffers {
    positions: Vec<Point3<f32>>,
    colors: Vec<Rgba>,
    normals: Vec<Vector3<f32>>,
    texcoords: Vec<Point2<f32>>,
    indices: Vec<u32>,
    lines: Option<Range<u32>>,
}

impl GeometryBuffers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(vertices: usize, indices: usize) -> Self {
        Self {
            positions: Vec::with_capacity(vertices),
            colors: Vec::with_capacity(vertices),
            normals: Vec::with_capacity(vertices),
            texcoords: Vec::with_capacity(vertices),
            indices: Vec::with_capacity(indices),
            lines: None,
        }
    }

    /// Drop every vertex, index and line while keeping allocations
    pub fn clear(&mut self) {
        self.positions.clear();
        self.colors.clear();
        self.normals.clear();
        self.texcoords.clear();
        self.indices.clear();
        self.lines = None;
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn positions(&self) -> &[Point3<f32>] {
        &self.positions
    }

    pub fn colors(&self) -> &[Rgba] {
        &self.colors
    }

    pub fn normals(&self) -> &[Vector3<f32>] {
        &self.normals
    }

    pub fn texcoords(&self) -> &[Point2<f32>] {
        &self.texcoords
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Vertex range drawn as a non-indexed line list
    pub fn line_range(&self) -> Option<Range<u32>> {
        self.lines.clone()
    }

    pub fn vertex(&self, index: usize) -> Option<Vertex> {
        Some(Vertex::new(
            *self.positions.get(index)?,
            *self.normals.get(index)?,
            *self.colors.get(index)?,
            *self.texcoords.get(index)?,
        ))
    }

    /// Index the next pushed vertex will receive
    pub fn next_index(&self) -> u32 {
        self.positions.len() as u32
    }

    /// Append one vertex and return its index
    pub fn push_vertex(&mut self, vertex: Vertex) -> u32 {
        let index = self.next_index();
        self.positions.push(vertex.position);
        self.normals.push(vertex.normal);
        self.colors.push(vertex.color);
        self.texcoords.push(vertex.texcoord);
        index
    }

    /// Append one triangle referencing absolute vertex indices
    pub fn push_triangle(&mut self, a: u32, b: u32, c: u32) {
        self.indices.extend_from_slice(&[a, b, c]);
    }

    /// Append one line segment to the trailing line range.
    ///
    /// Line segments must come after all triangle geometry.
    pub fn push_line(&mut self, from: Point3<f32>, to: Point3<f32>, color: Rgba) {
        let up = Vector3::y();
        let start = self.push_vertex(Vertex::new(from, up, color, Point2::origin()));
        self.push_vertex(Vertex::new(to, up, color, Point2::new(1.0, 0.0)));
        let end = self.next_index();
        self.lines = match self.lines.take() {
            Some(range) => Some(range.start..end),
            None => Some(start..end),
        };
    }

    /// Iterate triangle corner positions, skipping triangles with an
    /// out-of-range index
    pub fn triangles(&self) -> impl Iterator<Item = [Point3<f32>; 3]> + '_ {
        let corner = move |i: u32| self.positions.get(i as usize).copied();
        self.indices
            .chunks_exact(3)
            .filter_map(move |tri| Some([corner(tri[0])?, corner(tri[1])?, corner(tri[2])?]))
    }

    /// Line-list indices tracing the three edges of every triangle
    pub fn edge_indices(&self) -> Vec<u32> {
        self.indices
            .chunks_exact(3)
            .flat_map(|tri| [tri[0], tri[1], tri[1], tri[2], tri[2], tri[0]])
            .collect()
    }

    /// Mean of all vertex positions
    pub fn centroid(&self) -> Option<Point3<f32>> {
        if self.positions.is_empty() {
            return None;
        }
        let sum = self
            .positions
            .iter()
            .fold(Vector3::zeros(), |acc, p| acc + p.coords);
        Some(Point3::from(sum / self.positions.len() as f32))
    }

    /// Append `local`, moving every position and normal through `transform`.
    ///
    /// Normals only see the upper-left 3x3 block and are re-normalized.
    pub fn append_transformed(&mut self, local: &GeometryBuffers, transform: &Matrix4<f32>) {
        let offset = self.next_index();
        let linear = Transform::normal_block(transform);

        self.positions
            .extend(local.positions.iter().map(|p| transform.transform_point(p)));
        self.normals
            .extend(local.normals.iter().map(|n| Transform::apply_normal(&linear, n)));
        self.colors.extend_from_slice(&local.colors);
        self.texcoords.extend_from_slice(&local.texcoords);
        self.indices.extend(local.indices.iter().map(|i| i + offset));
    }

    /// Replace the normals of the vertices in `first_vertex..` with the
    /// area-weighted sum of the face normals of the triangles in
    /// `first_index..` that touch them.
    pub(crate) fn smooth_normals(&mut self, first_vertex: u32, first_index: usize) {
        let first = first_vertex as usize;
        for normal in &mut self.normals[first..] {
            *normal = Vector3::zeros();
        }
        for tri in self.indices[first_index..].chunks_exact(3) {
            let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            let weighted = (self.positions[b] - self.positions[a])
                .cross(&(self.positions[c] - self.positions[a]));
            for corner in [a, b, c] {
                if corner >= first {
                    self.normals[corner] += weighted;
                }
            }
        }
        for normal in &mut self.normals[first..] {
            *normal = normal.try_normalize(f32::EPSILON).unwrap_or_else(Vector3::y);
        }
    }

    /// Check the attribute-length and index-range invariants
    pub fn validate(&self) -> Result<()> {
        let vertex_count = self.positions.len();
        if self.colors.len() != vertex_count
            || self.normals.len() != vertex_count
            || self.texcoords.len() != vertex_count
        {
            return Err(HingevizError::BufferLengthMismatch {
                positions: vertex_count,
                colors: self.colors.len(),
                normals: self.normals.len(),
                texcoords: self.texcoords.len(),
            });
        }
        if self.indices.len() % 3 != 0 {
            return Err(HingevizError::IncompleteTriangle(self.indices.len()));
        }
        if let Some((slot, &index)) = self
            .indices
            .iter()
            .enumerate()
            .find(|&(_, &index)| index as usize >= vertex_count)
        {
            return Err(HingevizError::IndexOutOfRange {
                slot,
                index,
                vertex_count,
            });
        }
        if let Some(lines) = &self.lines {
            if lines.end as usize != vertex_count {
                return Err(HingevizError::IndexOutOfRange {
                    slot: 0,
                    index: lines.end,
                    vertex_count,
                });
            }
        }
        Ok(())
    }

    /// Positions as `x, y, z, w` floats
    pub fn flat_positions(&self) -> Vec<f32> {
        self.positions
            .iter()
            .flat_map(|p| [p.x, p.y, p.z, 1.0])
            .collect()
    }

    pub fn flat_colors(&self) -> Vec<f32> {
        self.colors.iter().flatten().copied().collect()
    }

    pub fn flat_normals(&self) -> Vec<f32> {
        self.normals.iter().flat_map(|n| [n.x, n.y, n.z]).collect()
    }

    pub fn flat_texcoords(&self) -> Vec<f32> {
        self.texcoords.iter().flat_map(|t| [t.x, t.y]).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_triangle() -> GeometryBuffers {
        let mut buffers = GeometryBuffers::new();
        let color = [1.0, 0.0, 0.0, 1.0];
        let n = Vector3::z();
        let a = buffers.push_vertex(Vertex::new(Point3::new(0.0, 0.0, 0.0), n, color, Point2::origin()));
        let b = buffers.push_vertex(Vertex::new(Point3::new(1.0, 0.0, 0.0), n, color, Point2::origin()));
        let c = buffers.push_vertex(Vertex::new(Point3::new(0.0, 1.0, 0.0), n, color, Point2::origin()));
        buffers.push_triangle(a, b, c);
        buffers
    }

    #[test]
    fn test_face_normal_ccw() {
        let n = face_normal(
            &Point3::new(0.0, 0.0, 0.0),
            &Point3::new(1.0, 0.0, 0.0),
            &Point3::new(0.0, 1.0, 0.0),
        );
        assert!((n - Vector3::z()).norm() < 1e-6);
    }

    #[test]
    fn test_degenerate_face_normal_is_zero() {
        let p = Point3::new(1.0, 1.0, 1.0);
        assert_eq!(face_normal(&p, &p, &p), Vector3::zeros());
    }

    #[test]
    fn test_append_transformed_offsets_indices() {
        let local = unit_triangle();
        let mut world = unit_triangle();
        world.append_transformed(&local, &Transform::translation_matrix(0.0, 0.0, 5.0));

        assert_eq!(world.vertex_count(), 6);
        assert_eq!(&world.indices()[3..], &[3, 4, 5]);
        assert!((world.positions()[3].z - 5.0).abs() < 1e-6);
        // translation never reaches normals
        assert!((world.normals()[3] - Vector3::z()).norm() < 1e-6);
        world.validate().unwrap();
    }

    #[test]
    fn test_rotated_normals_stay_unit() {
        let local = unit_triangle();
        let mut world = GeometryBuffers::new();
        let m = Transform::rotation_about(&Vector3::x_axis(), 90.0) * Transform::scale_matrix(2.0, 2.0, 2.0);
        world.append_transformed(&local, &m);
        for n in world.normals() {
            assert!((n.norm() - 1.0).abs() < 1e-5);
        }
        assert!((world.normals()[0] - Vector3::new(0.0, -1.0, 0.0)).norm() < 1e-5);
    }

    #[test]
    fn test_validate_rejects_bad_index() {
        let mut buffers = unit_triangle();
        buffers.push_triangle(0, 1, 7);
        assert_eq!(
            buffers.validate(),
            Err(HingevizError::IndexOutOfRange {
                slot: 5,
                index: 7,
                vertex_count: 3
            })
        );
    }

    #[test]
    fn test_triangles_skip_bad_index() {
        let mut buffers = unit_triangle();
        buffers.push_triangle(0, 1, 999);
        let triangles: Vec<_> = buffers.triangles().collect();
        assert_eq!(triangles.len(), 1);
        assert_eq!(triangles[0][1], Point3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_lines_extend_one_range() {
        let mut buffers = unit_triangle();
        let gray = [0.7, 0.7, 0.7, 1.0];
        buffers.push_line(Point3::origin(), Point3::new(1.0, 0.0, 0.0), gray);
        buffers.push_line(Point3::origin(), Point3::new(0.0, 0.0, 1.0), gray);
        assert_eq!(buffers.line_range(), Some(3..7));
        assert_eq!(buffers.index_count(), 3);
        buffers.validate().unwrap();
    }

    #[test]
    fn test_flat_arrays_match_vertex_count() {
        let buffers = unit_triangle();
        assert_eq!(buffers.flat_positions().len(), 12);
        assert_eq!(buffers.flat_colors().len(), 12);
        assert_eq!(buffers.flat_normals().len(), 9);
        assert_eq!(buffers.flat_texcoords().len(), 6);
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut buffers = unit_triangle();
        buffers.push_line(Point3::origin(), Point3::new(1.0, 0.0, 0.0), [1.0; 4]);
        buffers.clear();
        assert!(buffers.is_empty());
        assert_eq!(buffers.line_range(), None);
        assert_eq!(buffers, GeometryBuffers::new());
    }

    #[test]
    fn test_edge_indices_trace_each_triangle() {
        let buffers = unit_triangle();
        assert_eq!(buffers.edge_indices(), vec![0, 1, 1, 2, 2, 0]);
    }
}

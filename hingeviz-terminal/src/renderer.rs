/// ASCII rasterizer backend for terminal rendering
use crossterm::{
    cursor,
    style::{Color, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};
use hingeviz_core::projection::project_with;
use hingeviz_core::{
    DrawCall, GeometryBuffers, LightingUniforms, RenderBackend, Result, Rgba, TextureImage, TextureSampling,
    TransformUniforms,
};
use nalgebra::{Matrix4, Point3, Vector3};
use std::io::Write;
use std::ops::Range;

/// Character luminosity ramp for depth/shading (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Wireframe edges and grid lines
const EDGE_CHAR: char = '+';
const GRID_CHAR: char = '.';

/// Lines lose depth ties against the surfaces they lie on
const LINE_DEPTH_BIAS: f32 = 1e-4;

/// Floor applied to headlight shading when lighting is off
const UNLIT_AMBIENT: f32 = 0.15;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Cell {
    character: char,
    color: Color,
}

const BLANK: Cell = Cell {
    character: ' ',
    color: Color::Reset,
};

/// Screen-space vertex: column, row, normalized depth
type ScreenPoint = (f32, f32, f32);

/// Render backend that rasterizes uploaded geometry into terminal cells
pub struct AsciiBackend {
    width: usize,
    height: usize,
    depth_buffer: Vec<f32>,
    cells: Vec<Cell>,
    positions: Vec<Point3<f32>>,
    normals: Vec<Vector3<f32>>,
    colors: Vec<Rgba>,
    indices: Vec<u32>,
    edge_indices: Vec<u32>,
    transforms: TransformUniforms,
    lighting: Option<LightingUniforms>,
    texture_tint: [f32; 3],
    texture_enabled: bool,
}

impl AsciiBackend {
    pub fn new(width: usize, height: usize) -> Self {
        let size = width * height;
        Self {
            width,
            height,
            depth_buffer: vec![f32::INFINITY; size],
            cells: vec![BLANK; size],
            positions: Vec::new(),
            normals: Vec::new(),
            colors: Vec::new(),
            indices: Vec::new(),
            edge_indices: Vec::new(),
            transforms: TransformUniforms::new(Matrix4::identity(), Matrix4::identity()),
            lighting: None,
            texture_tint: [1.0; 3],
            texture_enabled: false,
        }
    }

    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Reallocate the cell grid; uploaded geometry is kept
    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.depth_buffer = vec![f32::INFINITY; width * height];
        self.cells = vec![BLANK; width * height];
    }

    pub fn clear(&mut self) {
        self.depth_buffer.fill(f32::INFINITY);
        self.cells.fill(BLANK);
    }

    /// Character at a cell, `None` off screen
    pub fn char_at(&self, x: usize, y: usize) -> Option<char> {
        self.cell(x, y).map(|cell| cell.character)
    }

    pub fn color_at(&self, x: usize, y: usize) -> Option<Color> {
        self.cell(x, y).map(|cell| cell.color)
    }

    /// Number of cells holding something other than a blank
    pub fn coverage(&self) -> usize {
        self.cells.iter().filter(|cell| cell.character != ' ').count()
    }

    fn cell(&self, x: usize, y: usize) -> Option<&Cell> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.cells.get(y * self.width + x)
    }

    fn mvp(&self) -> Matrix4<f32> {
        self.transforms.projection * self.transforms.model_view
    }

    fn project(&self, mvp: &Matrix4<f32>, index: u32) -> Option<ScreenPoint> {
        let position = self.positions.get(index as usize)?;
        project_with(mvp, position, self.width as u32, self.height as u32)
    }

    fn draw_triangles(&mut self, index_count: usize) {
        let mvp = self.mvp();
        let count = index_count.min(self.indices.len());
        for start in (0..count - count % 3).step_by(3) {
            let tri = [self.indices[start], self.indices[start + 1], self.indices[start + 2]];
            self.render_triangle(&mvp, tri);
        }
    }

    fn render_triangle(&mut self, mvp: &Matrix4<f32>, tri: [u32; 3]) {
        // Project vertices to screen space
        let mut screen_coords = [(0.0, 0.0, 0.0); 3];
        for (slot, &index) in screen_coords.iter_mut().zip(&tri) {
            match self.project(mvp, index) {
                Some(point) => *slot = point,
                None => return, // Triangle is clipped
            }
        }

        let intensity = self.shade(tri);

        // Map brightness to character; lit geometry never renders blank
        let steps = (LUMINOSITY_RAMP.len() - 2) as f32;
        let char_index = 1 + (intensity * steps) as usize;
        let character = LUMINOSITY_RAMP[char_index.min(LUMINOSITY_RAMP.len() - 1)];
        let color = self.cell_color(&tri, intensity);

        self.rasterize_triangle(&screen_coords, Cell { character, color });
    }

    /// Lambert intensity in `[0, 1]` from the averaged vertex normals
    fn shade(&self, tri: [u32; 3]) -> f32 {
        let (normal_sum, position_sum) = tri.iter().fold(
            (Vector3::<f32>::zeros(), Vector3::<f32>::zeros()),
            |(n, p), &i| {
                let i = i as usize;
                (n + self.normals[i], p + self.positions[i].coords)
            },
        );
        let Some(normal) = (self.transforms.normal_matrix * normal_sum).try_normalize(1e-6) else {
            return UNLIT_AMBIENT;
        };

        match self.lighting.filter(|lighting| lighting.enabled) {
            Some(lighting) => {
                let centroid = Point3::from(position_sum / 3.0);
                let eye_position = self.transforms.model_view.transform_point(&centroid);
                let to_light = Point3::from(lighting.light_position) - eye_position;
                let lambert = to_light
                    .try_normalize(1e-6)
                    .map_or(0.0, |dir| normal.dot(&dir).max(0.0));
                let ambient = mean(lighting.ambient);
                let diffuse = mean(lighting.diffuse);
                (ambient + diffuse * lambert).clamp(0.0, 1.0)
            }
            // Headlight along the view direction
            None => normal.z.max(0.0).max(UNLIT_AMBIENT),
        }
    }

    fn cell_color(&self, tri: &[u32; 3], intensity: f32) -> Color {
        let mut rgb = [0.0f32; 3];
        for &i in tri {
            let color = self.colors[i as usize];
            for (channel, value) in rgb.iter_mut().zip(color) {
                *channel += value / 3.0;
            }
        }
        if self.texture_enabled {
            for (channel, tint) in rgb.iter_mut().zip(self.texture_tint) {
                *channel *= tint;
            }
        }
        rgb_color(rgb, intensity)
    }

    fn rasterize_triangle(&mut self, coords: &[ScreenPoint; 3], cell: Cell) {
        let (v0, v1, v2) = (coords[0], coords[1], coords[2]);

        // Bounding box
        let min_x = v0.0.min(v1.0).min(v2.0).floor() as i32;
        let max_x = v0.0.max(v1.0).max(v2.0).ceil() as i32;
        let min_y = v0.1.min(v1.1).min(v2.1).floor() as i32;
        let max_y = v0.1.max(v1.1).max(v2.1).ceil() as i32;

        // Clip to screen bounds
        let min_x = min_x.max(0);
        let max_x = max_x.min(self.width as i32 - 1);
        let min_y = min_y.max(0);
        let max_y = max_y.min(self.height as i32 - 1);

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let px = x as f32 + 0.5;
                let py = y as f32 + 0.5;

                if let Some((w0, w1, w2)) = barycentric((v0.0, v0.1), (v1.0, v1.1), (v2.0, v2.1), (px, py)) {
                    if w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0 {
                        let depth = w0 * v0.2 + w1 * v1.2 + w2 * v2.2;
                        self.plot(x, y, depth, cell);
                    }
                }
            }
        }
    }

    fn draw_edges(&mut self, index_count: usize) {
        let mvp = self.mvp();
        let count = index_count.min(self.edge_indices.len());
        for start in (0..count - count % 2).step_by(2) {
            let (a, b) = (self.edge_indices[start], self.edge_indices[start + 1]);
            self.render_line(&mvp, a, b, EDGE_CHAR);
        }
    }

    fn draw_lines(&mut self, range: Range<u32>) {
        let mvp = self.mvp();
        let end = range.end.min(self.positions.len() as u32);
        for a in (range.start..end).step_by(2) {
            if a + 1 < end {
                self.render_line(&mvp, a, a + 1, GRID_CHAR);
            }
        }
    }

    /// DDA line between two uploaded vertices
    fn render_line(&mut self, mvp: &Matrix4<f32>, a: u32, b: u32, character: char) {
        let (Some(from), Some(to)) = (self.project(mvp, a), self.project(mvp, b)) else {
            return;
        };
        let color = self.cell_color(&[a, b, b], 1.0);
        let cell = Cell { character, color };

        let (dx, dy) = (to.0 - from.0, to.1 - from.1);
        let steps = dx.abs().max(dy.abs()).ceil().max(1.0) as usize;
        for step in 0..=steps {
            let t = step as f32 / steps as f32;
            let x = from.0 + dx * t;
            let y = from.1 + dy * t;
            let depth = from.2 + (to.2 - from.2) * t - LINE_DEPTH_BIAS;
            self.plot(x.floor() as i32, y.floor() as i32, depth, cell);
        }
    }

    fn plot(&mut self, x: i32, y: i32, depth: f32, cell: Cell) {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return;
        }
        let idx = y as usize * self.width + x as usize;
        if depth < self.depth_buffer[idx] {
            self.depth_buffer[idx] = depth;
            self.cells[idx] = cell;
        }
    }

    /// Write the cell grid starting at the top-left corner
    pub fn present<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        let mut current = None;
        for y in 0..self.height {
            writer.queue(cursor::MoveTo(0, y as u16))?;
            for cell in &self.cells[y * self.width..(y + 1) * self.width] {
                if current != Some(cell.color) {
                    writer.queue(SetForegroundColor(cell.color))?;
                    current = Some(cell.color);
                }
                writer.queue(Print(cell.character))?;
            }
        }
        writer.queue(ResetColor)?;
        Ok(())
    }
}

impl RenderBackend for AsciiBackend {
    fn begin_frame(&mut self) -> Result<()> {
        self.clear();
        Ok(())
    }

    fn upload_buffers(&mut self, buffers: &GeometryBuffers) -> Result<()> {
        self.positions = buffers.positions().to_vec();
        self.normals = buffers.normals().to_vec();
        self.colors = buffers.colors().to_vec();
        self.indices = buffers.indices().to_vec();
        self.edge_indices = buffers.edge_indices();
        log::trace!(
            "ascii backend holds {} vertices, {} indices",
            self.positions.len(),
            self.indices.len()
        );
        Ok(())
    }

    fn set_transform_uniforms(&mut self, uniforms: &TransformUniforms) -> Result<()> {
        self.transforms = *uniforms;
        Ok(())
    }

    fn set_lighting_uniforms(&mut self, uniforms: &LightingUniforms) -> Result<()> {
        self.lighting = Some(*uniforms);
        Ok(())
    }

    /// Cells are too coarse to sample, so the image contributes its mean color
    fn set_texture(&mut self, image: &TextureImage, _sampling: TextureSampling) -> Result<()> {
        self.texture_tint = mean_color(image);
        Ok(())
    }

    fn set_texture_enabled(&mut self, enabled: bool) -> Result<()> {
        self.texture_enabled = enabled;
        Ok(())
    }

    fn draw(&mut self, call: DrawCall) -> Result<()> {
        match call {
            DrawCall::Triangles { index_count } => self.draw_triangles(index_count),
            DrawCall::Edges { index_count } => self.draw_edges(index_count),
            DrawCall::Lines(range) => self.draw_lines(range),
        }
        Ok(())
    }
}

fn mean(values: [f32; 3]) -> f32 {
    values.iter().sum::<f32>() / 3.0
}

fn mean_color(image: &TextureImage) -> [f32; 3] {
    let pixel_count = image.pixels().len() / 4;
    if pixel_count == 0 {
        return [1.0; 3];
    }
    let mut sum = [0u64; 3];
    for pixel in image.pixels().chunks_exact(4) {
        for (total, &value) in sum.iter_mut().zip(pixel) {
            *total += u64::from(value);
        }
    }
    sum.map(|total| total as f32 / (pixel_count as f32 * 255.0))
}

fn rgb_color(rgb: [f32; 3], intensity: f32) -> Color {
    let [r, g, b] = rgb.map(|channel| ((channel * intensity).clamp(0.0, 1.0) * 255.0).round() as u8);
    Color::Rgb { r, g, b }
}

/// Calculate barycentric coordinates for a point in a triangle
fn barycentric(v0: (f32, f32), v1: (f32, f32), v2: (f32, f32), p: (f32, f32)) -> Option<(f32, f32, f32)> {
    let denom = (v1.1 - v2.1) * (v0.0 - v2.0) + (v2.0 - v1.0) * (v0.1 - v2.1);

    if denom.abs() < 1e-6 {
        return None;
    }

    let w0 = ((v1.1 - v2.1) * (p.0 - v2.0) + (v2.0 - v1.0) * (p.1 - v2.1)) / denom;
    let w1 = ((v2.1 - v0.1) * (p.0 - v2.0) + (v0.0 - v2.0) * (p.1 - v2.1)) / denom;
    let w2 = 1.0 - w0 - w1;

    Some((w0, w1, w2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hingeviz_core::{AssemblyKind, Session, Vertex};
    use nalgebra::Point2;

    fn facing_triangle(buffers: &mut GeometryBuffers, z: f32, color: Rgba) {
        let base = buffers.next_index();
        for (x, y) in [(-0.5, -0.5), (0.5, -0.5), (0.0, 0.5)] {
            buffers.push_vertex(Vertex::new(Point3::new(x, y, z), Vector3::z(), color, Point2::origin()));
        }
        buffers.push_triangle(base, base + 1, base + 2);
    }

    #[test]
    fn test_barycentric_degenerate() {
        assert!(barycentric((0.0, 0.0), (1.0, 1.0), (2.0, 2.0), (0.5, 0.5)).is_none());
    }

    #[test]
    fn test_headlit_triangle_fills_center() {
        let mut buffers = GeometryBuffers::new();
        facing_triangle(&mut buffers, 0.0, [1.0, 1.0, 1.0, 1.0]);

        let mut backend = AsciiBackend::new(40, 20);
        backend.upload_buffers(&buffers).unwrap();
        backend.draw(DrawCall::Triangles { index_count: 3 }).unwrap();

        assert_eq!(backend.char_at(20, 10), Some('@'));
        assert_eq!(backend.char_at(0, 0), Some(' '));
        assert!(backend.char_at(40, 0).is_none());
    }

    #[test]
    fn test_depth_buffer_keeps_nearest() {
        let mut buffers = GeometryBuffers::new();
        facing_triangle(&mut buffers, -0.5, [0.0, 0.0, 1.0, 1.0]);
        facing_triangle(&mut buffers, 0.5, [1.0, 0.0, 0.0, 1.0]);

        let mut backend = AsciiBackend::new(40, 20);
        backend.upload_buffers(&buffers).unwrap();
        backend.draw(DrawCall::Triangles { index_count: 6 }).unwrap();

        assert_eq!(backend.color_at(20, 10), Some(Color::Rgb { r: 0, g: 0, b: 255 }));
    }

    #[test]
    fn test_light_behind_surface_dims_it() {
        let mut buffers = GeometryBuffers::new();
        facing_triangle(&mut buffers, 0.0, [1.0, 1.0, 1.0, 1.0]);

        let mut backend = AsciiBackend::new(40, 20);
        backend.upload_buffers(&buffers).unwrap();
        backend
            .set_lighting_uniforms(&LightingUniforms {
                ambient: [0.2; 3],
                diffuse: [1.0; 3],
                specular: [1.0; 3],
                light_position: [0.0, 0.0, -5.0],
                shininess: 50.0,
                enabled: true,
            })
            .unwrap();
        backend.draw(DrawCall::Triangles { index_count: 3 }).unwrap();

        let dimmed = backend.char_at(20, 10).unwrap();
        assert_ne!(dimmed, '@');
        assert_ne!(dimmed, ' ');
    }

    #[test]
    fn test_line_range_draws_dda() {
        let mut buffers = GeometryBuffers::new();
        buffers.push_line(Point3::new(-0.5, 0.0, 0.0), Point3::new(0.5, 0.0, 0.0), [1.0; 4]);
        let range = buffers.line_range().unwrap();

        let mut backend = AsciiBackend::new(40, 20);
        backend.upload_buffers(&buffers).unwrap();
        backend.draw(DrawCall::Lines(range)).unwrap();

        for x in 11..29 {
            assert_eq!(backend.char_at(x, 10), Some(GRID_CHAR), "column {x}");
        }
        assert_eq!(backend.char_at(5, 10), Some(' '));
    }

    #[test]
    fn test_edges_outline_without_filling() {
        let mut buffers = GeometryBuffers::new();
        facing_triangle(&mut buffers, 0.0, [1.0; 4]);

        let mut backend = AsciiBackend::new(40, 20);
        backend.upload_buffers(&buffers).unwrap();
        backend.draw(DrawCall::Edges { index_count: 6 }).unwrap();

        assert_eq!(backend.char_at(20, 15), Some(EDGE_CHAR));
        assert_eq!(backend.char_at(20, 10), Some(' '));
    }

    #[test]
    fn test_session_frame_draws_socket() {
        let mut session = Session::new(AssemblyKind::Socket, 80, 48);
        let mut backend = AsciiBackend::new(80, 24);
        session.frame(&mut backend).unwrap();
        assert!(backend.coverage() > 0);

        backend.begin_frame().unwrap();
        assert_eq!(backend.coverage(), 0);
    }
}

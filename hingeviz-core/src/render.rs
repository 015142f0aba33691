//! Boundary between the session and whatever draws its buffers

use std::ops::Range;

use nalgebra::{Matrix3, Matrix4};

use crate::error::Result;
use crate::geometry::GeometryBuffers;
use crate::lighting::LightingUniforms;
use crate::texture::{TextureImage, TextureSampling};
use crate::transform::Transform;

/// One draw submitted after the buffers are bound
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawCall {
    /// The first `index_count` triangle indices
    Triangles { index_count: usize },
    /// Triangle edges as an indexed line list of `index_count` indices
    Edges { index_count: usize },
    /// Non-indexed line list over a vertex range
    Lines(Range<u32>),
}

/// Per-frame matrices
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformUniforms {
    pub model_view: Matrix4<f32>,
    pub projection: Matrix4<f32>,
    pub normal_matrix: Matrix3<f32>,
}

impl TransformUniforms {
    /// Derives the normal matrix from `model_view`
    pub fn new(model_view: Matrix4<f32>, projection: Matrix4<f32>) -> Self {
        Self {
            model_view,
            projection,
            normal_matrix: Transform::normal_matrix(&model_view),
        }
    }
}

/// A renderer the session can drive
pub trait RenderBackend {
    /// Clear the target before any draws
    fn begin_frame(&mut self) -> Result<()> {
        Ok(())
    }

    /// Replace the GPU-side (or backend-side) copy of the geometry
    fn upload_buffers(&mut self, buffers: &GeometryBuffers) -> Result<()>;

    fn set_transform_uniforms(&mut self, uniforms: &TransformUniforms) -> Result<()>;

    fn set_lighting_uniforms(&mut self, uniforms: &LightingUniforms) -> Result<()>;

    fn set_texture(&mut self, image: &TextureImage, sampling: TextureSampling) -> Result<()>;

    fn set_texture_enabled(&mut self, enabled: bool) -> Result<()>;

    fn draw(&mut self, call: DrawCall) -> Result<()>;

    /// Present whatever was drawn
    fn end_frame(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Backend that draws nothing and remembers what it was asked to do
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameRecorder {
    pub uploads: usize,
    pub vertex_count: usize,
    pub index_count: usize,
    pub texture_uploads: usize,
    pub texture_enabled: bool,
    pub transforms: Option<TransformUniforms>,
    pub lighting: Option<LightingUniforms>,
    pub draws: Vec<DrawCall>,
}

impl RenderBackend for FrameRecorder {
    fn begin_frame(&mut self) -> Result<()> {
        self.draws.clear();
        Ok(())
    }

    fn upload_buffers(&mut self, buffers: &GeometryBuffers) -> Result<()> {
        self.uploads += 1;
        self.vertex_count = buffers.vertex_count();
        self.index_count = buffers.index_count();
        Ok(())
    }

    fn set_transform_uniforms(&mut self, uniforms: &TransformUniforms) -> Result<()> {
        self.transforms = Some(*uniforms);
        Ok(())
    }

    fn set_lighting_uniforms(&mut self, uniforms: &LightingUniforms) -> Result<()> {
        self.lighting = Some(*uniforms);
        Ok(())
    }

    fn set_texture(&mut self, _image: &TextureImage, _sampling: TextureSampling) -> Result<()> {
        self.texture_uploads += 1;
        Ok(())
    }

    fn set_texture_enabled(&mut self, enabled: bool) -> Result<()> {
        self.texture_enabled = enabled;
        Ok(())
    }

    fn draw(&mut self, call: DrawCall) -> Result<()> {
        self.draws.push(call);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    #[test]
    fn test_uniforms_derive_normal_matrix() {
        let model_view = Matrix4::new_nonuniform_scaling(&Vector3::new(1.0, 4.0, 1.0));
        let uniforms = TransformUniforms::new(model_view, Matrix4::identity());
        assert!((uniforms.normal_matrix[(1, 1)] - 0.25).abs() < 1e-6);
    }
}

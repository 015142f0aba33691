//! Per-session state and the command API every front end drives.
//!
//! A [`Session`] owns one assembly plus its camera, animation, lighting,
//! texture and display state. Commands only mutate state and raise the dirty
//! flag; [`Session::frame`] ticks the animations, rebuilds the buffers at most
//! once and issues the draws.

use nalgebra::Vector3;

use crate::animation::{AnimationKind, AnimationState, Animator, AutoRotation};
use crate::assembly::{compose, Assembly, AssemblyKind};
use crate::error::{HingevizError, Result};
use crate::geometry::GeometryBuffers;
use crate::lighting::Lighting;
use crate::projection::{Camera, PointerDrag, ProjectionMode};
use crate::render::{DrawCall, RenderBackend, TransformUniforms};
use crate::texture::{TextureImage, TextureSlot};
use crate::transform::{Axis, ObjectTransform, RotationState};

/// Display switches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayToggles {
    pub grid: bool,
    pub wireframe: bool,
    pub texture: bool,
    pub lighting: bool,
}

/// Counters describing what one [`Session::frame`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameStats {
    pub rebuilt: bool,
    pub uploaded: bool,
    pub vertex_count: usize,
    pub triangle_count: usize,
    pub draw_calls: usize,
}

pub struct Session {
    assembly: Box<dyn Assembly>,
    animator: Animator,
    auto_rotation: AutoRotation,
    object: ObjectTransform,
    camera: Camera,
    pointer: PointerDrag,
    lighting: Lighting,
    texture: TextureSlot,
    toggles: DisplayToggles,
    buffers: GeometryBuffers,
    scratch: GeometryBuffers,
    dirty: bool,
    needs_upload: bool,
}

impl Session {
    pub fn new(kind: AssemblyKind, width: u32, height: u32) -> Self {
        Self::with_assembly(kind.create(), width, height)
    }

    pub fn with_assembly(assembly: Box<dyn Assembly>, width: u32, height: u32) -> Self {
        let lit = assembly.lighting_enabled();
        let grid = assembly.kind() == AssemblyKind::Socket;
        let camera = Camera::new(assembly.camera(), width, height);
        let animator = Animator::new(assembly.animation_speed());
        log::debug!("session started for {}", assembly.name());
        Self {
            assembly,
            animator,
            auto_rotation: AutoRotation::default(),
            object: ObjectTransform::default(),
            camera,
            pointer: PointerDrag::default(),
            lighting: Lighting::new(lit),
            texture: TextureSlot::new(),
            toggles: DisplayToggles {
                grid,
                wireframe: false,
                texture: lit,
                lighting: lit,
            },
            buffers: GeometryBuffers::new(),
            scratch: GeometryBuffers::new(),
            dirty: true,
            needs_upload: false,
        }
    }

    pub fn assembly(&self) -> &dyn Assembly {
        self.assembly.as_ref()
    }

    pub fn kind(&self) -> AssemblyKind {
        self.assembly.kind()
    }

    /// Buffers from the last successful rebuild
    pub fn buffers(&self) -> &GeometryBuffers {
        &self.buffers
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn lighting(&self) -> &Lighting {
        &self.lighting
    }

    pub fn lighting_mut(&mut self) -> &mut Lighting {
        &mut self.lighting
    }

    pub fn toggles(&self) -> DisplayToggles {
        self.toggles
    }

    pub fn object(&self) -> &ObjectTransform {
        &self.object
    }

    pub fn animation_state(&self) -> AnimationState {
        self.animator.state()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn joint_values(&self) -> Vec<f32> {
        self.assembly.joint_values()
    }

    pub fn joint_count(&self) -> usize {
        self.assembly.joints().len()
    }

    // Joints and animation

    /// Set one joint (clamped into its domain) and mark the geometry dirty.
    /// Returns the applied angle.
    pub fn set_joint_angle(&mut self, joint: usize, degrees: f32) -> Result<f32> {
        let applied = self.assembly.set_joint(joint, degrees)?;
        self.dirty = true;
        Ok(applied)
    }

    /// Rebuild now instead of waiting for the next frame
    pub fn trigger_rebuild(&mut self) -> Result<()> {
        self.dirty = false;
        compose(self.assembly.as_ref(), self.toggles.grid, &mut self.scratch)?;
        std::mem::swap(&mut self.buffers, &mut self.scratch);
        self.needs_upload = true;
        Ok(())
    }

    pub fn start_animation(&mut self, kind: AnimationKind) -> Result<()> {
        let Some(targets) = self.assembly.animation_targets(kind) else {
            log::warn!("{} rejected {kind:?}", self.assembly.name());
            return Err(HingevizError::UnsupportedAnimation {
                assembly: self.assembly.name(),
                kind,
            });
        };
        self.animator.start(kind, &targets, self.assembly.joints());
        Ok(())
    }

    pub fn stop_animation(&mut self) {
        self.animator.stop();
    }

    /// Cancel any animation and put every joint back at rest
    pub fn reset_joints(&mut self) {
        self.animator.stop();
        self.assembly.reset_joints();
        self.dirty = true;
    }

    /// Advance joint animation and auto-rotation by one frame
    pub fn tick(&mut self) {
        if self.animator.tick(self.assembly.joints_mut()) {
            self.dirty = true;
        }
        self.auto_rotation.tick(&mut self.object.rotation);
    }

    // Camera

    pub fn set_camera_rotation(&mut self, yaw: f32, pitch: f32) {
        self.camera.set_rotation(yaw, pitch);
    }

    pub fn set_zoom(&mut self, distance: f32) {
        self.camera.set_zoom(distance);
    }

    pub fn set_pan(&mut self, x: f32, y: f32) {
        self.camera.set_pan(x, y);
    }

    pub fn pan_by(&mut self, dx: f32, dy: f32) {
        self.camera.pan_by(dx, dy);
    }

    pub fn orbit(&mut self, dx: f32, dy: f32) {
        self.camera.orbit(dx, dy);
    }

    pub fn reset_view(&mut self) {
        self.camera.reset();
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.camera.set_viewport(width, height);
    }

    pub fn toggle_projection(&mut self) {
        self.camera.mode = self.camera.mode.toggled();
    }

    pub fn set_projection(&mut self, mode: ProjectionMode) {
        self.camera.mode = mode;
    }

    pub fn pointer_down(&mut self, button: i16, x: f32, y: f32) {
        self.pointer.down(button, x, y);
    }

    pub fn pointer_move(&mut self, x: f32, y: f32) {
        self.pointer.moved(&mut self.camera, x, y);
    }

    pub fn pointer_up(&mut self) {
        self.pointer.up();
    }

    pub fn wheel(&mut self, delta: f32) {
        self.camera.wheel(delta);
    }

    // Display

    pub fn toggle_grid(&mut self) -> bool {
        self.toggles.grid = !self.toggles.grid;
        self.dirty = true;
        self.toggles.grid
    }

    pub fn toggle_wireframe(&mut self) -> bool {
        self.toggles.wireframe = !self.toggles.wireframe;
        self.toggles.wireframe
    }

    pub fn toggle_texture(&mut self) -> bool {
        self.toggles.texture = !self.toggles.texture;
        self.toggles.texture
    }

    pub fn toggle_lighting(&mut self) -> bool {
        self.toggles.lighting = !self.toggles.lighting;
        self.lighting.enabled = self.toggles.lighting;
        self.toggles.lighting
    }

    pub fn reset_lighting(&mut self) {
        self.lighting.reset();
    }

    /// Hand over the outcome of an asynchronous texture load
    pub fn texture_loaded(&mut self, result: Result<TextureImage>) {
        self.texture.complete(result);
    }

    // Object transform

    pub fn set_object_rotation(&mut self, x: f32, y: f32, z: f32) {
        self.object.rotation = RotationState::new(x, y, z);
    }

    pub fn set_object_scale(&mut self, x: f32, y: f32, z: f32) {
        self.object.scale = Vector3::new(x, y, z);
    }

    pub fn start_auto_rotation(&mut self, axis: Axis) {
        self.auto_rotation.start(axis);
    }

    pub fn stop_auto_rotation(&mut self) {
        self.auto_rotation.stop();
    }

    pub fn reset_object_transform(&mut self) {
        self.object = ObjectTransform::default();
    }

    // Frame

    /// Tick, rebuild if dirty, upload if rebuilt, then draw.
    ///
    /// A failed rebuild is logged and the previous buffers stay on screen.
    /// Backend failures propagate.
    pub fn frame(&mut self, backend: &mut dyn RenderBackend) -> Result<FrameStats> {
        self.tick();

        let mut stats = FrameStats::default();
        if self.dirty {
            match self.trigger_rebuild() {
                Ok(()) => stats.rebuilt = true,
                Err(err) => log::error!("rebuild of {} aborted: {err}", self.assembly.name()),
            }
        }

        backend.begin_frame()?;
        if self.needs_upload {
            backend.upload_buffers(&self.buffers)?;
            self.needs_upload = false;
            stats.uploaded = true;
        }
        if let Some(image) = self.texture.take_update() {
            backend.set_texture(image, image.sampling())?;
        }

        let view = self.camera.view_matrix();
        let model_view = view * self.object.model_matrix();
        backend.set_transform_uniforms(&TransformUniforms::new(model_view, self.camera.projection_matrix()))?;
        backend.set_lighting_uniforms(&self.lighting.uniforms(&view))?;
        backend.set_texture_enabled(self.toggles.texture)?;

        for call in self.draw_calls() {
            backend.draw(call)?;
            stats.draw_calls += 1;
        }
        backend.end_frame()?;

        stats.vertex_count = self.buffers.vertex_count();
        stats.triangle_count = self.buffers.triangle_count();
        Ok(stats)
    }

    fn draw_calls(&self) -> Vec<DrawCall> {
        let mut calls = Vec::with_capacity(2);
        let index_count = self.buffers.index_count();
        if index_count > 0 {
            calls.push(if self.toggles.wireframe {
                DrawCall::Edges {
                    index_count: index_count * 2,
                }
            } else {
                DrawCall::Triangles { index_count }
            });
        }
        if let Some(lines) = self.buffers.line_range() {
            calls.push(DrawCall::Lines(lines));
        }
        calls
    }
}

//! Hinged assemblies and the composer that flattens them into one set of
//! world-space buffers

mod folding_door;
mod socket;

pub use folding_door::FoldingDoor;
pub use socket::FloorSocket;

use std::fmt;
use std::str::FromStr;

use nalgebra::{Matrix4, Point3};

use crate::animation::AnimationKind;
use crate::config::CameraConfig;
use crate::error::{HingevizError, Result};
use crate::geometry::{GeometryBuffers, Rgba};
use crate::joint::Joint;

/// Grid lines per side of the origin
pub const GRID_HALF_LINES: i32 = 10;
pub const GRID_STEP: f32 = 0.5;
pub const GRID_COLOR: Rgba = [0.7, 0.7, 0.7, 1.0];

/// Which device is being visualized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssemblyKind {
    Socket,
    Door,
}

impl AssemblyKind {
    pub fn name(self) -> &'static str {
        match self {
            AssemblyKind::Socket => "socket",
            AssemblyKind::Door => "door",
        }
    }

    /// Build the assembly with its default configuration
    pub fn create(self) -> Box<dyn Assembly> {
        match self {
            AssemblyKind::Socket => Box::new(FloorSocket::default()),
            AssemblyKind::Door => Box::new(FoldingDoor::default()),
        }
    }
}

impl fmt::Display for AssemblyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AssemblyKind {
    type Err = HingevizError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "socket" | "floor-socket" => Ok(AssemblyKind::Socket),
            "door" | "folding-door" | "folding-doors" => Ok(AssemblyKind::Door),
            _ => Err(HingevizError::UnknownName {
                what: "assembly",
                name: s.to_string(),
                expected: "socket or door",
            }),
        }
    }
}

/// A rigid body of the assembly: local-space mesh plus the matrix that
/// places it in the world
#[derive(Debug, Clone, PartialEq)]
pub struct Part {
    pub name: String,
    pub transform: Matrix4<f32>,
    pub mesh: GeometryBuffers,
    pub jointed: bool,
}

impl Part {
    /// Part whose mesh is already in world space
    pub fn fixed(name: impl Into<String>, mesh: GeometryBuffers) -> Self {
        Self {
            name: name.into(),
            transform: Matrix4::identity(),
            mesh,
            jointed: false,
        }
    }

    pub fn jointed(name: impl Into<String>, transform: Matrix4<f32>, mesh: GeometryBuffers) -> Self {
        Self {
            name: name.into(),
            transform,
            mesh,
            jointed: true,
        }
    }

    /// Centroid of the mesh after the part transform
    pub fn world_centroid(&self) -> Option<Point3<f32>> {
        self.mesh
            .centroid()
            .map(|c| self.transform.transform_point(&c))
    }
}

/// A device made of parts connected by hinge joints
pub trait Assembly {
    fn kind(&self) -> AssemblyKind;

    fn name(&self) -> &'static str {
        self.kind().name()
    }

    fn joints(&self) -> &[Joint];

    fn joints_mut(&mut self) -> &mut [Joint];

    /// Every part, with transforms derived from the current joint angles
    fn parts(&self) -> Vec<Part>;

    /// Joint targets for `kind`, or `None` if the assembly cannot do it
    fn animation_targets(&self, kind: AnimationKind) -> Option<Vec<f32>>;

    /// Degrees per frame
    fn animation_speed(&self) -> f32;

    fn camera(&self) -> CameraConfig;

    fn lighting_enabled(&self) -> bool;

    /// Set joint `index`, clamping into its domain. Returns the applied angle.
    fn set_joint(&mut self, index: usize, degrees: f32) -> Result<f32> {
        let joints = self.joints_mut();
        let count = joints.len();
        joints
            .get_mut(index)
            .map(|joint| joint.set(degrees))
            .ok_or(HingevizError::UnknownJoint { index, count })
    }

    fn joint_values(&self) -> Vec<f32> {
        self.joints().iter().map(Joint::value).collect()
    }

    fn reset_joints(&mut self) {
        for joint in self.joints_mut() {
            joint.set(0.0);
        }
    }
}

/// Regenerate `out` from scratch: every part moved into the world, then the
/// floor grid when `grid` is set. Fails if the result breaks the buffer
/// invariants.
pub fn compose(assembly: &dyn Assembly, grid: bool, out: &mut GeometryBuffers) -> Result<()> {
    out.clear();
    for part in assembly.parts() {
        out.append_transformed(&part.mesh, &part.transform);
    }
    if grid {
        append_grid(out);
    }
    out.validate()?;
    log::debug!(
        "composed {}: {} vertices, {} triangles",
        assembly.name(),
        out.vertex_count(),
        out.triangle_count()
    );
    Ok(())
}

/// Floor grid on `y = 0`: lines parallel to x, then lines parallel to z
pub fn append_grid(buffers: &mut GeometryBuffers) {
    let extent = GRID_HALF_LINES as f32 * GRID_STEP;
    for i in -GRID_HALF_LINES..=GRID_HALF_LINES {
        let z = i as f32 * GRID_STEP;
        buffers.push_line(Point3::new(-extent, 0.0, z), Point3::new(extent, 0.0, z), GRID_COLOR);
    }
    for i in -GRID_HALF_LINES..=GRID_HALF_LINES {
        let x = i as f32 * GRID_STEP;
        buffers.push_line(Point3::new(x, 0.0, -extent), Point3::new(x, 0.0, extent), GRID_COLOR);
    }
}

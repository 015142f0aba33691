//! hingeviz core library - hinged assembly geometry and session state
//!
//! This library provides the renderer-independent part of the viewers:
//! procedural primitives, hinge joints, the socket and folding door
//! assemblies, joint animation, the orbit camera, lighting and texture
//! state, and the session that drives a [`RenderBackend`].

pub mod animation;
pub mod assembly;
pub mod config;
pub mod error;
pub mod geometry;
pub mod joint;
pub mod lighting;
pub mod primitives;
pub mod projection;
pub mod render;
pub mod session;
pub mod texture;
pub mod transform;

// Re-export commonly used types
pub use animation::{AnimationKind, AnimationState};
pub use assembly::{Assembly, AssemblyKind, FloorSocket, FoldingDoor, Part};
pub use error::{HingevizError, Result};
pub use geometry::{GeometryBuffers, Rgba, Vertex};
pub use joint::{Joint, JointDomain};
pub use lighting::{parse_hex_color, Lighting, LightingUniforms};
pub use projection::{Camera, ProjectionMode};
pub use render::{DrawCall, FrameRecorder, RenderBackend, TransformUniforms};
pub use session::{DisplayToggles, FrameStats, Session};
pub use texture::{TextureImage, TextureSampling, TextureSlot};
pub use transform::{Axis, RotationState, Transform};

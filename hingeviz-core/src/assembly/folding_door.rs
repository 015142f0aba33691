use nalgebra::{Matrix4, Point3, Vector3};

use crate::animation::AnimationKind;
use crate::assembly::{Assembly, AssemblyKind, Part};
use crate::config::{CameraConfig, DoorConfig};
use crate::geometry::GeometryBuffers;
use crate::joint::{HingeChain, Joint};
use crate::primitives::{self, Caps, CylinderAxis, CylinderSpec};

const JOINT_NAMES: [&str; 4] = ["panel 1", "panel 2", "panel 3", "panel 4"];

/// Four tubular-frame panels hung from a wall point, each hinged to the
/// right edge of the one before it
#[derive(Debug, Clone, PartialEq)]
pub struct FoldingDoor {
    config: DoorConfig,
    chain: HingeChain,
    panel_mesh: GeometryBuffers,
    knuckle_mesh: GeometryBuffers,
}

impl FoldingDoor {
    pub fn new(config: DoorConfig) -> Self {
        let joints = JOINT_NAMES
            .iter()
            .zip(config.domains)
            .map(|(&name, domain)| Joint::new(name, Vector3::y_axis(), domain))
            .collect();
        let chain = HingeChain::new(
            Matrix4::new_translation(&config.wall_point()),
            joints,
            config.link_offset(),
            Vector3::new(config.panel_width, 0.0, 0.0),
        );
        // panel-local meshes never change with the angles
        let panel_mesh = panel_mesh(&config);
        let knuckle_mesh = knuckle_mesh(&config);
        Self {
            config,
            chain,
            panel_mesh,
            knuckle_mesh,
        }
    }

    pub fn config(&self) -> &DoorConfig {
        &self.config
    }

    pub fn chain(&self) -> &HingeChain {
        &self.chain
    }
}

impl Default for FoldingDoor {
    fn default() -> Self {
        Self::new(DoorConfig::default())
    }
}

/// One panel in its own frame: pivot edge on `x = 0`, vertically centered,
/// legs hanging below
fn panel_mesh(c: &DoorConfig) -> GeometryBuffers {
    let (w, h) = (c.panel_width, c.panel_height);
    let (bar_gap, bar_radius) = (c.bar_gap(), c.bar_radius());
    let mut mesh = GeometryBuffers::new();

    let tube = |start: Point3<f32>, length: f32, radius: f32, axis: CylinderAxis| CylinderSpec {
        start,
        length,
        radius,
        segments: c.frame_segments,
        color: c.frame_color,
        axis,
        caps: Caps::Both,
    };

    // paired bars at the bottom, middle and top
    for center in [-h / 2.0, 0.0, h / 2.0] {
        for offset in [bar_gap / 2.0, -bar_gap / 2.0] {
            let bar = tube(Point3::new(0.0, center + offset, 0.0), w, bar_radius, CylinderAxis::Horizontal);
            primitives::cylinder(&mut mesh, &bar);
        }
    }
    for x in [0.0, w] {
        let edge = tube(Point3::new(x, -h / 2.0, 0.0), h, c.frame_radius(), CylinderAxis::Vertical);
        primitives::cylinder(&mut mesh, &edge);
    }

    let section = w / 3.0;
    let thickness = c.panel_thickness * c.fill_thickness_ratio;
    let top_start = bar_gap / 2.0 + bar_radius;
    let rows = [(top_start, h / 2.0 - top_start), (-h / 2.0, h / 2.0 - top_start)];
    for (y, height) in rows {
        for (i, color) in c.fill_colors.iter().enumerate() {
            let origin = Point3::new(i as f32 * section, y, 0.0);
            primitives::slab(&mut mesh, origin, section, height, thickness, *color);
        }
    }

    for x in [c.leg_inset, w - c.leg_inset] {
        let leg = CylinderSpec {
            start: Point3::new(x, -h / 2.0 - c.leg_height, 0.0),
            length: c.leg_height,
            radius: c.leg_radius,
            segments: c.leg_segments,
            color: c.frame_color,
            axis: CylinderAxis::Vertical,
            caps: Caps::Start,
        };
        primitives::cylinder(&mut mesh, &leg);
    }
    mesh
}

/// The two open knuckle sleeves joining a pair of panels, centered on the
/// shared hinge line
fn knuckle_mesh(c: &DoorConfig) -> GeometryBuffers {
    let h = c.panel_height;
    let mut mesh = GeometryBuffers::new();
    for fraction in c.hinge_heights {
        let center = -h / 2.0 + fraction * h;
        let sleeve = CylinderSpec {
            start: Point3::new(0.0, center - c.hinge_height / 2.0, 0.0),
            length: c.hinge_height,
            radius: c.hinge_radius,
            segments: c.hinge_segments,
            color: c.frame_color,
            axis: CylinderAxis::Vertical,
            caps: Caps::None,
        };
        primitives::cylinder(&mut mesh, &sleeve);
    }
    mesh
}

impl Assembly for FoldingDoor {
    fn kind(&self) -> AssemblyKind {
        AssemblyKind::Door
    }

    fn joints(&self) -> &[Joint] {
        self.chain.joints()
    }

    fn joints_mut(&mut self) -> &mut [Joint] {
        self.chain.joints_mut()
    }

    fn parts(&self) -> Vec<Part> {
        let panels = self
            .chain
            .link_transforms()
            .into_iter()
            .enumerate()
            .map(|(k, transform)| Part::jointed(format!("panel {}", k + 1), transform, self.panel_mesh.clone()));
        let knuckles = self
            .chain
            .knuckle_transforms()
            .into_iter()
            .enumerate()
            .map(|(k, transform)| {
                Part::jointed(format!("hinge {}-{}", k + 1, k + 2), transform, self.knuckle_mesh.clone())
            });
        panels.chain(knuckles).collect()
    }

    fn animation_targets(&self, kind: AnimationKind) -> Option<Vec<f32>> {
        let targets = match kind {
            AnimationKind::Open => self.config.open_targets,
            AnimationKind::Close => [0.0; 4],
            AnimationKind::Fold => self.config.fold_targets,
        };
        Some(targets.to_vec())
    }

    fn animation_speed(&self) -> f32 {
        self.config.speed
    }

    fn camera(&self) -> CameraConfig {
        CameraConfig::door()
    }

    fn lighting_enabled(&self) -> bool {
        self.config.lighting_enabled
    }
}

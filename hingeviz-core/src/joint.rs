//! Hinge joints and the two joint topologies the assemblies use: a single
//! pivot with a base-angle offset, and a serial chain where every link hangs
//! off its predecessor.

use nalgebra::{Matrix4, Point3, Unit, Vector3};

use crate::transform::Transform;

/// Angles within this many degrees of the rest value count as "at rest"
pub const REST_EPSILON: f32 = 1e-3;

/// Closed interval of legal joint angles, in degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointDomain {
    pub min: f32,
    pub max: f32,
}

impl JointDomain {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub fn clamp(&self, degrees: f32) -> f32 {
        degrees.clamp(self.min, self.max)
    }

    pub fn contains(&self, degrees: f32) -> bool {
        (self.min..=self.max).contains(&degrees)
    }
}

/// A named rotational degree of freedom
#[derive(Debug, Clone, PartialEq)]
pub struct Joint {
    name: &'static str,
    axis: Unit<Vector3<f32>>,
    domain: JointDomain,
    value: f32,
}

impl Joint {
    /// Create a joint at its rest angle (0, or the nearest domain bound)
    pub fn new(name: &'static str, axis: Unit<Vector3<f32>>, domain: JointDomain) -> Self {
        Self {
            name,
            axis,
            domain,
            value: domain.clamp(0.0),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn axis(&self) -> &Unit<Vector3<f32>> {
        &self.axis
    }

    pub fn domain(&self) -> JointDomain {
        self.domain
    }

    /// Current angle in degrees
    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn rest_value(&self) -> f32 {
        self.domain.clamp(0.0)
    }

    /// Set the angle, clamping silently into the domain. Returns the applied
    /// angle.
    pub fn set(&mut self, degrees: f32) -> f32 {
        let clamped = if degrees.is_nan() {
            self.value
        } else {
            self.domain.clamp(degrees)
        };
        if clamped != degrees {
            log::trace!("joint {} clamped {degrees} to {clamped}", self.name);
        }
        self.value = clamped;
        clamped
    }

    pub fn is_at_rest(&self) -> bool {
        (self.value - self.rest_value()).abs() <= REST_EPSILON
    }

    /// Pivot rotation by the current angle about the line through `pivot`
    pub fn rotation(&self, pivot: &Point3<f32>) -> Matrix4<f32> {
        Transform::pivot_rotation(pivot, &self.axis, self.value)
    }
}

/// One joint whose rendered rotation is `base_angle - value`, pivoting about
/// a hinge line and then seated at a fixed offset.
///
/// The socket cover uses this: at `value == 0` the wedge is rotated a full
/// `base_angle` down into the floor, at the domain maximum it stands nearly
/// upright.
#[derive(Debug, Clone, PartialEq)]
pub struct SingleHinge {
    joint: Joint,
    pivot: Point3<f32>,
    seat: Vector3<f32>,
    base_angle: f32,
}

impl SingleHinge {
    pub fn new(joint: Joint, pivot: Point3<f32>, seat: Vector3<f32>, base_angle: f32) -> Self {
        Self {
            joint,
            pivot,
            seat,
            base_angle,
        }
    }

    pub fn joint(&self) -> &Joint {
        &self.joint
    }

    pub fn joint_mut(&mut self) -> &mut Joint {
        &mut self.joint
    }

    pub fn pivot(&self) -> Point3<f32> {
        self.pivot
    }

    pub fn seat(&self) -> Vector3<f32> {
        self.seat
    }

    /// Angle actually applied about the hinge axis
    pub fn render_angle(&self) -> f32 {
        self.base_angle - self.joint.value()
    }

    pub fn is_closed(&self) -> bool {
        self.joint.is_at_rest()
    }

    /// `T(seat) * T(pivot) * R(render_angle) * T(-pivot)`
    pub fn transform(&self) -> Matrix4<f32> {
        Matrix4::new_translation(&self.seat)
            * Transform::pivot_rotation(&self.pivot, self.joint.axis(), self.render_angle())
    }
}

/// Serial chain of joints. Link `k` is `link[k-1] * T(link_offset) * R(θk)`;
/// link 0 hangs off the fixed `root`.
#[derive(Debug, Clone, PartialEq)]
pub struct HingeChain {
    root: Matrix4<f32>,
    joints: Vec<Joint>,
    link_offset: Vector3<f32>,
    knuckle_offset: Vector3<f32>,
}

impl HingeChain {
    pub fn new(
        root: Matrix4<f32>,
        joints: Vec<Joint>,
        link_offset: Vector3<f32>,
        knuckle_offset: Vector3<f32>,
    ) -> Self {
        Self {
            root,
            joints,
            link_offset,
            knuckle_offset,
        }
    }

    pub fn root(&self) -> &Matrix4<f32> {
        &self.root
    }

    pub fn joints(&self) -> &[Joint] {
        &self.joints
    }

    pub fn joints_mut(&mut self) -> &mut [Joint] {
        &mut self.joints
    }

    pub fn len(&self) -> usize {
        self.joints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }

    /// Full world transform of every link, recomputed from the current angles
    pub fn link_transforms(&self) -> Vec<Matrix4<f32>> {
        let attach = Matrix4::new_translation(&self.link_offset);
        let mut parent = self.root;
        self.joints
            .iter()
            .enumerate()
            .map(|(k, joint)| {
                let rotation = joint.rotation(&Point3::origin());
                let local = if k == 0 { rotation } else { attach * rotation };
                parent *= local;
                parent
            })
            .collect()
    }

    /// Transforms of the knuckles joining link `k` to link `k + 1`
    pub fn knuckle_transforms(&self) -> Vec<Matrix4<f32>> {
        let offset = Matrix4::new_translation(&self.knuckle_offset);
        let links = self.link_transforms();
        links
            .iter()
            .take(links.len().saturating_sub(1))
            .map(|link| link * offset)
            .collect()
    }
}

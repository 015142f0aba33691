//! Joint animation state machine and automatic object rotation

use std::fmt;
use std::str::FromStr;

use crate::error::HingevizError;
use crate::joint::Joint;
use crate::transform::{Axis, RotationState};

/// Joints within this many degrees of their targets have arrived
pub const ARRIVAL_EPSILON: f32 = 0.5;

/// Degrees per frame for automatic object rotation
pub const AUTO_ROTATION_SPEED: f32 = 2.0;

/// Animation requested by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnimationKind {
    Open,
    Close,
    Fold,
}

impl AnimationKind {
    pub fn name(self) -> &'static str {
        match self {
            AnimationKind::Open => "open",
            AnimationKind::Close => "close",
            AnimationKind::Fold => "fold",
        }
    }
}

impl fmt::Display for AnimationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AnimationKind {
    type Err = HingevizError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "open" => Ok(AnimationKind::Open),
            "close" => Ok(AnimationKind::Close),
            "fold" => Ok(AnimationKind::Fold),
            _ => Err(HingevizError::UnknownName {
                what: "animation",
                name: s.to_string(),
                expected: "open, close or fold",
            }),
        }
    }
}

/// Current animation phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnimationState {
    #[default]
    Idle,
    Opening,
    Closing,
    Folding,
}

impl AnimationState {
    pub fn name(self) -> &'static str {
        match self {
            AnimationState::Idle => "idle",
            AnimationState::Opening => "opening",
            AnimationState::Closing => "closing",
            AnimationState::Folding => "folding",
        }
    }
}

impl From<AnimationKind> for AnimationState {
    fn from(kind: AnimationKind) -> Self {
        match kind {
            AnimationKind::Open => AnimationState::Opening,
            AnimationKind::Close => AnimationState::Closing,
            AnimationKind::Fold => AnimationState::Folding,
        }
    }
}

/// Steps joints toward per-joint targets at a fixed speed
#[derive(Debug, Clone, PartialEq)]
pub struct Animator {
    state: AnimationState,
    targets: Vec<f32>,
    speed: f32,
}

impl Animator {
    /// `speed` is in degrees per tick
    pub fn new(speed: f32) -> Self {
        Self {
            state: AnimationState::Idle,
            targets: Vec::new(),
            speed,
        }
    }

    pub fn state(&self) -> AnimationState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == AnimationState::Idle
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn targets(&self) -> &[f32] {
        &self.targets
    }

    /// Begin animating toward `targets`, clamped into each joint's domain.
    /// Cancels whatever was running.
    pub fn start(&mut self, kind: AnimationKind, targets: &[f32], joints: &[Joint]) {
        self.targets = joints
            .iter()
            .zip(targets)
            .map(|(joint, &target)| joint.domain().clamp(target))
            .collect();
        let next = AnimationState::from(kind);
        log::debug!("animation {:?} -> {:?} targets {:?}", self.state, next, self.targets);
        self.state = next;
    }

    pub fn stop(&mut self) {
        if self.state != AnimationState::Idle {
            log::debug!("animation {:?} stopped", self.state);
        }
        self.state = AnimationState::Idle;
        self.targets.clear();
    }

    /// Advance one frame. Returns true if any joint angle changed.
    pub fn tick(&mut self, joints: &mut [Joint]) -> bool {
        if self.is_idle() {
            return false;
        }

        let mut changed = false;
        for (joint, &target) in joints.iter_mut().zip(&self.targets) {
            let step = (target - joint.value()).clamp(-self.speed, self.speed);
            if step != 0.0 {
                joint.set(joint.value() + step);
                changed = true;
            }
        }

        let arrived = joints
            .iter()
            .zip(&self.targets)
            .all(|(joint, &target)| (target - joint.value()).abs() <= ARRIVAL_EPSILON);
        if arrived {
            for (joint, &target) in joints.iter_mut().zip(&self.targets) {
                if joint.value() != target {
                    joint.set(target);
                    changed = true;
                }
            }
            log::debug!("animation {:?} arrived", self.state);
            self.state = AnimationState::Idle;
            self.targets.clear();
        }
        changed
    }
}

/// Optional free spin of the whole object about one axis
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AutoRotation {
    axis: Option<Axis>,
}

impl AutoRotation {
    pub fn axis(&self) -> Option<Axis> {
        self.axis
    }

    pub fn start(&mut self, axis: Axis) {
        self.axis = Some(axis);
    }

    pub fn stop(&mut self) {
        self.axis = None;
    }

    /// Advance `rotation` by one frame; returns true if it moved
    pub fn tick(&self, rotation: &mut RotationState) -> bool {
        match self.axis {
            Some(axis) => {
                rotation.spin(axis, AUTO_ROTATION_SPEED);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::joint::JointDomain;
    use nalgebra::Vector3;

    #[test]
    fn test_kind_names_round_trip() {
        for kind in [AnimationKind::Open, AnimationKind::Close, AnimationKind::Fold] {
            assert_eq!(kind.to_string().parse::<AnimationKind>(), Ok(kind));
        }
        assert_eq!("FOLD".parse::<AnimationKind>(), Ok(AnimationKind::Fold));
        let err = "spin".parse::<AnimationKind>().unwrap_err();
        assert!(matches!(err, HingevizError::UnknownName { what: "animation", .. }));
        assert_eq!(
            err.to_string(),
            "unknown animation \"spin\" (expected open, close or fold)"
        );
    }

    fn panels() -> Vec<Joint> {
        [(-170.0, 170.0), (0.0, 170.0), (-170.0, 170.0), (0.0, 170.0)]
            .into_iter()
            .map(|(min, max)| Joint::new("panel", Vector3::y_axis(), JointDomain::new(min, max)))
            .collect()
    }

    fn run_to_idle(animator: &mut Animator, joints: &mut [Joint]) -> usize {
        let mut ticks = 0;
        while !animator.is_idle() {
            animator.tick(joints);
            ticks += 1;
            assert!(ticks < 10_000, "animation never settled");
        }
        ticks
    }

    #[test]
    fn test_open_ends_exactly_on_target() {
        let mut joints = panels();
        let mut animator = Animator::new(1.5);
        animator.start(AnimationKind::Open, &[90.0; 4], &joints);
        assert_eq!(animator.state(), AnimationState::Opening);

        run_to_idle(&mut animator, &mut joints);
        for joint in &joints {
            assert_eq!(joint.value(), 90.0);
        }
    }

    #[test]
    fn test_step_never_overshoots() {
        let mut joints = vec![Joint::new("cover", Vector3::x_axis(), JointDomain::new(0.0, 85.0))];
        let mut animator = Animator::new(2.5);
        animator.start(AnimationKind::Open, &[85.0], &joints);
        let mut previous = 0.0;
        while !animator.is_idle() {
            animator.tick(&mut joints);
            let value = joints[0].value();
            assert!(value >= previous && value <= 85.0);
            assert!(value - previous <= 2.5 + 1e-4);
            previous = value;
        }
        assert_eq!(previous, 85.0);
    }

    #[test]
    fn test_targets_clamped_into_domain() {
        let joints = panels();
        let mut animator = Animator::new(1.5);
        animator.start(AnimationKind::Fold, &[0.0, 200.0, -200.0, -10.0], &joints);
        assert_eq!(animator.targets(), &[0.0, 170.0, -170.0, 0.0]);
    }

    #[test]
    fn test_fold_leaves_first_panel_alone() {
        let mut joints = panels();
        let mut animator = Animator::new(1.5);
        animator.start(AnimationKind::Fold, &[0.0, 170.0, -170.0, 170.0], &joints);
        while !animator.is_idle() {
            animator.tick(&mut joints);
            assert_eq!(joints[0].value(), 0.0);
        }
        let values: Vec<f32> = joints.iter().map(Joint::value).collect();
        assert_eq!(values, vec![0.0, 170.0, -170.0, 170.0]);
    }

    #[test]
    fn test_stop_freezes_angles() {
        let mut joints = panels();
        let mut animator = Animator::new(1.5);
        animator.start(AnimationKind::Open, &[90.0; 4], &joints);
        animator.tick(&mut joints);
        animator.stop();
        assert!(!animator.tick(&mut joints));
        assert_eq!(joints[0].value(), 1.5);
    }

    #[test]
    fn test_idle_tick_reports_clean() {
        let mut joints = panels();
        let mut animator = Animator::new(1.5);
        assert!(!animator.tick(&mut joints));
    }

    #[test]
    fn test_auto_rotation_wraps() {
        let mut rotation = RotationState::new(0.0, 0.0, 359.0);
        let mut auto = AutoRotation::default();
        assert!(!auto.tick(&mut rotation));
        auto.start(Axis::Z);
        assert!(auto.tick(&mut rotation));
        assert!((rotation.z - 1.0).abs() < 1e-4);
    }
}

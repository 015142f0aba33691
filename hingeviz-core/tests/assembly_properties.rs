use hingeviz_core::animation::AnimationKind;
use hingeviz_core::assembly::{compose, Assembly, AssemblyKind, FoldingDoor, Part};
use hingeviz_core::config::CameraConfig;
use hingeviz_core::geometry::{triangle_area, GeometryBuffers, Vertex};
use hingeviz_core::joint::{Joint, JointDomain};
use hingeviz_core::render::FrameRecorder;
use hingeviz_core::session::Session;
use hingeviz_core::AnimationState;
use nalgebra::{Matrix4, Point2, Point3, Vector3};
use proptest::prelude::*;

fn assert_valid(buffers: &GeometryBuffers) {
    let n = buffers.vertex_count();
    assert_eq!(buffers.colors().len(), n);
    assert_eq!(buffers.normals().len(), n);
    assert_eq!(buffers.texcoords().len(), n);
    assert!(buffers.indices().iter().all(|&i| (i as usize) < n));
}

proptest! {
    #[test]
    fn socket_buffers_valid_for_any_angle(angle in 0.0f32..=85.0) {
        let mut session = Session::new(AssemblyKind::Socket, 640, 480);
        session.set_joint_angle(0, angle).unwrap();
        session.trigger_rebuild().unwrap();
        assert_valid(session.buffers());
    }

    #[test]
    fn door_buffers_valid_for_any_angles(
        a in -170.0f32..=170.0,
        b in 0.0f32..=170.0,
        c in -170.0f32..=170.0,
        d in 0.0f32..=170.0,
    ) {
        let mut session = Session::new(AssemblyKind::Door, 640, 480);
        for (joint, angle) in [a, b, c, d].into_iter().enumerate() {
            session.set_joint_angle(joint, angle).unwrap();
        }
        session.trigger_rebuild().unwrap();
        assert_valid(session.buffers());
        prop_assert_eq!(session.joint_values(), vec![a, b, c, d]);
    }

    #[test]
    fn first_panel_swing_is_rigid(theta in -170.0f32..=170.0) {
        let rest = FoldingDoor::default();
        let mut swung = FoldingDoor::default();
        swung.set_joint(0, theta).unwrap();

        // rotation about the wall hinge line
        let wall = Vector3::new(-2.0, 1.4, 0.0);
        let motion = Matrix4::new_translation(&wall)
            * Matrix4::from_axis_angle(&Vector3::y_axis(), theta.to_radians())
            * Matrix4::new_translation(&-wall);

        let before = rest.parts();
        let after = swung.parts();
        for (old, new) in before.iter().zip(&after) {
            let expected = motion.transform_point(&old.world_centroid().unwrap());
            let actual = new.world_centroid().unwrap();
            prop_assert!((expected - actual).norm() < 1e-4, "{} moved non-rigidly", new.name);
        }

        // relative transforms between neighbours are untouched
        for k in 1..4 {
            let relative_rest = before[k - 1].transform.try_inverse().unwrap() * before[k].transform;
            let relative_swung = after[k - 1].transform.try_inverse().unwrap() * after[k].transform;
            prop_assert!((relative_rest - relative_swung).norm() < 1e-4);
        }
    }
}

#[test]
fn rebuild_is_idempotent() {
    let mut session = Session::new(AssemblyKind::Door, 640, 480);
    session.set_joint_angle(2, -45.0).unwrap();
    session.trigger_rebuild().unwrap();
    let first = session.buffers().clone();
    session.trigger_rebuild().unwrap();
    assert_eq!(&first, session.buffers());
}

#[test]
fn static_parts_never_degenerate_at_limits() {
    for kind in [AssemblyKind::Socket, AssemblyKind::Door] {
        let mut assembly = kind.create();
        let picks: [fn(JointDomain) -> f32; 2] = [|d| d.min, |d| d.max];
        for pick in picks {
            let limits: Vec<f32> = assembly.joints().iter().map(|j| pick(j.domain())).collect();
            for (index, angle) in limits.into_iter().enumerate() {
                assembly.set_joint(index, angle).unwrap();
            }
            let mut buffers = GeometryBuffers::new();
            compose(assembly.as_ref(), false, &mut buffers).unwrap();
            for part in assembly.parts().iter().filter(|p| !p.jointed) {
                for [a, b, c] in part.mesh.triangles() {
                    assert!(triangle_area(&a, &b, &c) > 0.0, "{} in {kind}", part.name);
                }
            }
        }
    }
}

#[test]
fn opening_door_settles_exactly() {
    let mut session = Session::new(AssemblyKind::Door, 640, 480);
    let mut backend = FrameRecorder::default();
    session.start_animation(AnimationKind::Open).unwrap();
    let mut frames = 0;
    while session.animation_state() != AnimationState::Idle {
        session.frame(&mut backend).unwrap();
        frames += 1;
        assert!(frames < 1000);
    }
    assert_eq!(session.joint_values(), vec![90.0; 4]);
}

#[test]
fn fold_keeps_first_panel_still() {
    let mut session = Session::new(AssemblyKind::Door, 640, 480);
    let panel_one = |session: &Session| {
        session
            .assembly()
            .parts()
            .into_iter()
            .next()
            .map(|part| part.transform)
            .unwrap()
    };
    let start = panel_one(&session);
    session.start_animation(AnimationKind::Fold).unwrap();
    while session.animation_state() != AnimationState::Idle {
        session.tick();
        assert_eq!(panel_one(&session), start);
    }
    assert_eq!(session.joint_values(), vec![0.0, 170.0, -170.0, 170.0]);
}

#[test]
fn closed_socket_cover_is_a_flat_box() {
    let session = Session::new(AssemblyKind::Socket, 640, 480);
    let parts = session.assembly().parts();
    let cover = parts.iter().find(|p| p.name == "cover").unwrap();
    assert_eq!(cover.mesh.vertex_count(), 8);
}

/// Assembly whose only triangle points past the end of the buffers once its
/// joint moves
struct BrokenAssembly {
    joint: Joint,
}

impl Assembly for BrokenAssembly {
    fn kind(&self) -> AssemblyKind {
        AssemblyKind::Socket
    }

    fn joints(&self) -> &[Joint] {
        std::slice::from_ref(&self.joint)
    }

    fn joints_mut(&mut self) -> &mut [Joint] {
        std::slice::from_mut(&mut self.joint)
    }

    fn parts(&self) -> Vec<Part> {
        let mut mesh = GeometryBuffers::new();
        let color = [1.0; 4];
        for p in [Point3::origin(), Point3::new(1.0, 0.0, 0.0), Point3::new(0.0, 1.0, 0.0)] {
            mesh.push_vertex(Vertex::new(p, Vector3::z(), color, Point2::origin()));
        }
        mesh.push_triangle(0, 1, if self.joint.value() > 0.0 { 999 } else { 2 });
        vec![Part::fixed("triangle", mesh)]
    }

    fn animation_targets(&self, _kind: AnimationKind) -> Option<Vec<f32>> {
        None
    }

    fn animation_speed(&self) -> f32 {
        1.0
    }

    fn camera(&self) -> CameraConfig {
        CameraConfig::default()
    }

    fn lighting_enabled(&self) -> bool {
        false
    }
}

#[test]
fn failed_rebuild_keeps_previous_buffers() {
    let assembly = BrokenAssembly {
        joint: Joint::new("test", Vector3::x_axis(), JointDomain::new(0.0, 10.0)),
    };
    let mut session = Session::with_assembly(Box::new(assembly), 640, 480);
    let mut backend = FrameRecorder::default();
    session.frame(&mut backend).unwrap();
    let good = session.buffers().clone();
    assert_eq!(good.index_count(), 3);

    session.set_joint_angle(0, 5.0).unwrap();
    assert!(session.trigger_rebuild().is_err());
    assert_eq!(session.buffers(), &good);

    // the frame loop logs and carries on with the old geometry
    session.set_joint_angle(0, 6.0).unwrap();
    let stats = session.frame(&mut backend).unwrap();
    assert!(!stats.rebuilt);
    assert_eq!(backend.uploads, 1);
}

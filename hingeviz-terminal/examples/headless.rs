/// Example: drive an animation without a terminal and print buffer stats
///
/// Usage: cargo run --example headless -- [socket|door] [open|close|fold]
use anyhow::Context;
use hingeviz_core::{AnimationKind, AnimationState, AssemblyKind, FrameRecorder, Session};
use std::env;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().collect();
    let kind: AssemblyKind = args
        .get(1)
        .map(String::as_str)
        .unwrap_or("door")
        .parse()?;
    let animation: AnimationKind = args
        .get(2)
        .map(String::as_str)
        .unwrap_or("open")
        .parse()?;

    let mut session = Session::new(kind, 800, 600);
    let mut backend = FrameRecorder::default();
    session.frame(&mut backend)?;
    session
        .start_animation(animation)
        .with_context(|| format!("{kind} cannot {animation}"))?;

    println!("frame  rebuilt  vertices  triangles  joints");
    let mut frame = 0;
    while session.animation_state() != AnimationState::Idle {
        let stats = session.frame(&mut backend)?;
        frame += 1;
        let joints: Vec<String> = session.joint_values().iter().map(|v| format!("{v:.1}")).collect();
        println!(
            "{frame:5}  {:7}  {:8}  {:9}  {}",
            stats.rebuilt,
            stats.vertex_count,
            stats.triangle_count,
            joints.join(" ")
        );
    }
    println!("settled after {frame} frames, {} uploads", backend.uploads);
    Ok(())
}

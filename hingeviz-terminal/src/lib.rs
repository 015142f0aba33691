/// Interactive terminal viewer for the hinged assemblies
use clap::Parser;
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self, ClearType},
};
use hingeviz_core::{AnimationKind, AssemblyKind, Session};
use std::io::{self, stdout, Write};
use std::time::{Duration, Instant};

pub mod renderer;

pub use renderer::AsciiBackend;

/// Degrees per arrow key press
const ORBIT_STEP: f32 = 5.0;
/// Zoom distance per `+`/`-` press
const ZOOM_STEP: f32 = 0.5;
/// Degrees per `[`/`]` press
const JOINT_STEP: f32 = 5.0;

/// Terminal cells are roughly twice as tall as they are wide
const CELL_ASPECT: u32 = 2;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(author, version, about = "ASCII viewer for hinged assemblies", long_about = None)]
pub struct Cli {
    /// Assembly to load: socket or door
    #[arg(short, long, default_value = "socket")]
    pub assembly: AssemblyKind,

    /// Target frames per second
    #[arg(long, default_value_t = 30)]
    pub fps: u32,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Main application struct for terminal rendering
pub struct TerminalApp {
    session: Session,
    backend: AsciiBackend,
    selected_joint: usize,
    frame_time: Duration,
    running: bool,
    last_frame: Instant,
    frame_count: u32,
    fps: f32,
}

impl TerminalApp {
    /// Size the viewer to the current terminal
    pub fn new(kind: AssemblyKind, target_fps: u32) -> io::Result<Self> {
        let (width, height) = terminal::size()?;
        Ok(Self::with_size(kind, target_fps, width as usize, height as usize))
    }

    pub fn with_size(kind: AssemblyKind, target_fps: u32, width: usize, height: usize) -> Self {
        Self {
            session: Session::new(kind, width as u32, height as u32 * CELL_ASPECT),
            backend: AsciiBackend::new(width, height),
            selected_joint: 0,
            frame_time: Duration::from_millis(1000 / u64::from(target_fps.max(1))),
            running: true,
            last_frame: Instant::now(),
            frame_count: 0,
            fps: 0.0,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn run(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(stdout(), terminal::EnterAlternateScreen, cursor::Hide)?;

        let result = self.main_loop();

        // Cleanup
        terminal::disable_raw_mode()?;
        execute!(stdout(), terminal::LeaveAlternateScreen, cursor::Show)?;

        result
    }

    fn main_loop(&mut self) -> io::Result<()> {
        while self.running {
            let frame_start = Instant::now();

            while event::poll(Duration::from_millis(0))? {
                self.handle_event(event::read()?);
            }

            self.render()?;

            self.frame_count += 1;
            let elapsed = frame_start.elapsed();
            if elapsed < self.frame_time {
                std::thread::sleep(self.frame_time - elapsed);
            }

            let now = Instant::now();
            if (now - self.last_frame).as_secs() >= 1 {
                self.fps = self.frame_count as f32 / (now - self.last_frame).as_secs_f32();
                self.frame_count = 0;
                self.last_frame = now;
            }
        }

        Ok(())
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(key) if key.kind != KeyEventKind::Release => self.handle_key(key),
            Event::Resize(width, height) => {
                self.backend.resize(width as usize, height as usize);
                self.session
                    .set_viewport(u32::from(width), u32::from(height) * CELL_ASPECT);
            }
            _ => {}
        }
    }

    /// Apply one key press to the session
    pub fn handle_key(&mut self, KeyEvent { code, .. }: KeyEvent) {
        let camera = self.session.camera();
        let (yaw, pitch, zoom) = (camera.yaw, camera.pitch, camera.zoom);

        match code {
            KeyCode::Char('q') | KeyCode::Esc => self.running = false,
            KeyCode::Char('w') | KeyCode::Up => self.session.set_camera_rotation(yaw, pitch + ORBIT_STEP),
            KeyCode::Char('s') | KeyCode::Down => self.session.set_camera_rotation(yaw, pitch - ORBIT_STEP),
            KeyCode::Char('a') | KeyCode::Left => self.session.set_camera_rotation(yaw - ORBIT_STEP, pitch),
            KeyCode::Char('d') | KeyCode::Right => self.session.set_camera_rotation(yaw + ORBIT_STEP, pitch),
            KeyCode::Char('+') | KeyCode::Char('=') => self.session.set_zoom(zoom - ZOOM_STEP),
            KeyCode::Char('-') => self.session.set_zoom(zoom + ZOOM_STEP),
            KeyCode::Char('o') => self.animate(AnimationKind::Open),
            KeyCode::Char('c') => self.animate(AnimationKind::Close),
            KeyCode::Char('f') => self.animate(AnimationKind::Fold),
            KeyCode::Char('x') => self.session.stop_animation(),
            KeyCode::Char('r') => {
                self.session.reset_joints();
                self.session.reset_view();
            }
            KeyCode::Char('g') => {
                self.session.toggle_grid();
            }
            KeyCode::Char('m') => {
                self.session.toggle_wireframe();
            }
            KeyCode::Char('p') => self.session.toggle_projection(),
            KeyCode::Char(digit @ '1'..='4') => {
                let joint = digit as usize - '1' as usize;
                if joint < self.session.joint_count() {
                    self.selected_joint = joint;
                }
            }
            KeyCode::Char('[') => self.nudge_joint(-JOINT_STEP),
            KeyCode::Char(']') => self.nudge_joint(JOINT_STEP),
            _ => {}
        }
    }

    fn animate(&mut self, kind: AnimationKind) {
        if let Err(err) = self.session.start_animation(kind) {
            log::debug!("ignoring {kind} key: {err}");
        }
    }

    fn nudge_joint(&mut self, delta: f32) {
        let Some(&current) = self.session.joint_values().get(self.selected_joint) else {
            return;
        };
        if let Err(err) = self.session.set_joint_angle(self.selected_joint, current + delta) {
            log::warn!("{err}");
        }
    }

    fn render(&mut self) -> io::Result<()> {
        self.session
            .frame(&mut self.backend)
            .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;

        let mut stdout = stdout();
        self.backend.present(&mut stdout)?;

        queue!(
            stdout,
            cursor::MoveTo(0, 0),
            terminal::Clear(ClearType::CurrentLine),
            SetForegroundColor(Color::Yellow),
            Print(self.status_line()),
            ResetColor,
            cursor::MoveTo(0, 1),
            terminal::Clear(ClearType::CurrentLine),
            SetForegroundColor(Color::DarkYellow),
            Print("WASD/Arrows=Orbit +/-=Zoom O/C/F=Open/Close/Fold X=Stop R=Reset G=Grid M=Wire P=Proj 1-4 [ ]=Joint Q=Quit"),
            ResetColor
        )?;

        stdout.flush()?;
        Ok(())
    }

    /// Assembly, joint values, animation state and frame rate
    pub fn status_line(&self) -> String {
        let joints = self
            .session
            .assembly()
            .joints()
            .iter()
            .enumerate()
            .map(|(i, joint)| {
                let marker = if i == self.selected_joint { '>' } else { ' ' };
                format!("{marker}{}={:.1}", joint.name(), joint.value())
            })
            .collect::<Vec<_>>()
            .join(" ");
        format!(
            "{} | {} | {} | FPS: {:.1}",
            self.session.kind(),
            joints,
            self.session.animation_state().name(),
            self.fps
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;
    use hingeviz_core::AnimationState;

    fn press(app: &mut TerminalApp, code: KeyCode) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    #[test]
    fn test_cli_parses_assembly() {
        let cli = Cli::try_parse_from(["hingeviz-terminal", "--assembly", "door", "--fps", "60"]).unwrap();
        assert_eq!(cli.assembly, AssemblyKind::Door);
        assert_eq!(cli.fps, 60);
        assert!(!cli.verbose);

        assert!(Cli::try_parse_from(["hingeviz-terminal", "--assembly", "window"]).is_err());
    }

    #[test]
    fn test_joint_keys_adjust_selected_joint() {
        let mut app = TerminalApp::with_size(AssemblyKind::Door, 30, 80, 24);
        press(&mut app, KeyCode::Char('3'));
        press(&mut app, KeyCode::Char(']'));
        press(&mut app, KeyCode::Char(']'));
        assert_eq!(app.session().joint_values(), vec![0.0, 0.0, 10.0, 0.0]);

        // the socket has a single joint
        let mut socket = TerminalApp::with_size(AssemblyKind::Socket, 30, 80, 24);
        press(&mut socket, KeyCode::Char('2'));
        press(&mut socket, KeyCode::Char(']'));
        assert_eq!(socket.session().joint_values(), vec![5.0]);
    }

    #[test]
    fn test_animation_and_quit_keys() {
        let mut app = TerminalApp::with_size(AssemblyKind::Socket, 30, 80, 24);
        press(&mut app, KeyCode::Char('o'));
        assert_eq!(app.session().animation_state(), AnimationState::Opening);
        press(&mut app, KeyCode::Char('f'));
        assert_eq!(app.session().animation_state(), AnimationState::Opening);
        press(&mut app, KeyCode::Char('x'));
        assert_eq!(app.session().animation_state(), AnimationState::Idle);

        press(&mut app, KeyCode::Esc);
        assert!(!app.is_running());
    }

    #[test]
    fn test_orbit_and_zoom_keys() {
        let mut app = TerminalApp::with_size(AssemblyKind::Door, 30, 80, 24);
        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Char('+'));
        let camera = app.session().camera();
        assert_eq!(camera.yaw, 50.0);
        assert_eq!(camera.zoom, 7.5);

        press(&mut app, KeyCode::Char('r'));
        assert_eq!(app.session().camera().yaw, 45.0);
    }

    #[test]
    fn test_status_line_marks_selection() {
        let mut app = TerminalApp::with_size(AssemblyKind::Door, 30, 80, 24);
        press(&mut app, KeyCode::Char('2'));
        let status = app.status_line();
        assert!(status.starts_with("door"));
        assert!(status.contains(">panel 2=0.0"));
        assert!(status.contains("idle"));
    }
}

/// hingeviz terminal viewer
///
/// Renders the floor socket or folding door as shaded ASCII.
/// Controls:
///   - WASD / Arrow Keys: Orbit the camera
///   - +/-: Zoom
///   - O/C/F: Open, close, fold; X stops
///   - 1-4 then [ / ]: Move a joint by 5 degrees
///   - Q/ESC: Quit
use anyhow::Context;
use clap::Parser;
use hingeviz_terminal::{Cli, TerminalApp};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; redirect it when running on the alternate screen
    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    log::info!("starting {} viewer at {} fps", cli.assembly, cli.fps);

    let mut app = TerminalApp::new(cli.assembly, cli.fps).context("terminal size unavailable")?;
    app.run().context("terminal viewer failed")?;

    Ok(())
}

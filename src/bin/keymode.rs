// Keymode CLI
// Loads settings, installs the default profile and feeds chords typed on stdin
// through the engine, printing what the host would be asked to do

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use parking_lot::Mutex;

use keymode_core::chord::OutputChord;
use keymode_core::host::{CommandRunner, ImeControl, InputSink, ThreadScheduler, WindowMover};
use keymode_core::movement::{Point, VirtualCursor};
use keymode_core::settings::default_settings_content;
use keymode_core::window::FixedWindow;
use keymode_core::{
    install, BindingResolver, ChordSpec, Host, HostCommand, KeymapEngine, ModeContext,
    MonitorEdge, MovementController, Profile, ProfileConfig, Settings, WindowInfo,
};

/// Mode-driven keymap engine, driven from the terminal
#[derive(Parser, Debug)]
#[command(name = "keymode")]
#[command(version)]
#[command(about = "Mode-driven keymaps with user modifiers and keyboard pointer movement", long_about = None)]
struct Args {
    /// TOML settings file (defaults to ~/.config/keymode/settings.toml)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Validate settings and exit
    #[arg(long)]
    check_config: bool,

    /// Print every table of the profile and exit
    #[arg(long)]
    list_keymaps: bool,

    /// Print a commented default settings file and exit
    #[arg(long)]
    print_default_settings: bool,

    /// Title of the simulated foreground window
    #[arg(long, value_name = "TITLE")]
    title: Option<String>,

    /// Executable name of the simulated foreground window
    #[arg(long, value_name = "EXE")]
    exe: Option<String>,

    /// Class name of the simulated foreground window
    #[arg(long, value_name = "CLASS")]
    class: Option<String>,
}

/// Host that reports requests on stdout instead of acting on them
#[derive(Default)]
struct ConsoleHost {
    injected: Mutex<u64>,
}

impl ConsoleHost {
    fn injected(&self) -> u64 {
        *self.injected.lock()
    }
}

impl InputSink for ConsoleHost {
    fn send_chord(&self, chord: &OutputChord) {
        *self.injected.lock() += 1;
        println!("  -> send {}", chord);
    }
}

impl ImeControl for ConsoleHost {
    fn set_ime_status(&self, open: bool) {
        println!("  -> ime {}", if open { "on" } else { "off" });
    }
}

impl WindowMover for ConsoleHost {
    fn move_window(&self, dx: i32, dy: i32) {
        println!("  -> move window by ({}, {})", dx, dy);
    }

    fn move_to_monitor_edge(&self, edge: MonitorEdge) {
        println!("  -> move window to {} edge", edge);
    }
}

impl CommandRunner for ConsoleHost {
    fn run_command(&self, command: HostCommand) {
        println!("  -> command {}", command);
    }
}

fn load_settings(args: &Args) -> Result<Settings> {
    match &args.config {
        Some(path) => Settings::from_file(path)
            .with_context(|| format!("failed to load settings from {}", path.display())),
        None => Settings::load_default().context("failed to load default settings"),
    }
}

/// Everything built from one load of the settings
struct Session {
    settings: Settings,
    engine: KeymapEngine,
    mode: ModeContext,
    profile: Profile,
    movement: Option<Arc<MovementController>>,
}

impl Session {
    fn start(settings: Settings, host: Host, cursor: &VirtualCursor) -> Result<Self> {
        let movement = if settings.movement_enabled() {
            let controller = MovementController::spawn(settings.movement().clone(), cursor.clone())
                .context("failed to start movement worker")?;
            Some(Arc::new(controller))
        } else {
            None
        };

        let mode = ModeContext::with_mode(settings.initial_mode());
        let mut engine = KeymapEngine::new(host);
        let profile = install(
            &mut engine,
            &mode,
            &ProfileConfig::from(&settings),
            movement.clone(),
        )
        .context("failed to install profile")?;

        Ok(Self {
            settings,
            engine,
            mode,
            profile,
            movement,
        })
    }

    /// Re-read the settings file and install a fresh profile.
    ///
    /// The running session is kept when the new settings are rejected.
    fn reload(&mut self, cursor: &VirtualCursor) -> Result<()> {
        let mut settings = self.settings.clone();
        settings.reload().context("failed to reload settings")?;
        let next = Session::start(settings, self.engine.host().clone(), cursor)?;
        self.shutdown();
        *self = next;
        log::info!("settings reloaded");
        Ok(())
    }

    fn shutdown(&self) {
        if let Some(controller) = &self.movement {
            controller.shutdown();
        }
    }
}

fn print_keymaps(engine: &KeymapEngine, profile: &Profile) {
    for (id, keymap) in engine.keymaps() {
        let state = if engine.is_active(id) { "active" } else { "inactive" };
        println!("[{}] {} bindings, {}", keymap.name(), keymap.len(), state);
        for (chord, binding) in keymap.iter() {
            println!("  {:<20} {}", chord.to_string(), binding);
        }
    }
    for lister in &profile.listers {
        println!("[clipboard: {}]", lister.name);
        for item in &lister.items {
            println!("  {}", item.label());
        }
    }
}

/// One stdin line: a chord such as `U1-c`, `D-U1-A-i` or `U-Slash`, or a
/// `:`-command
fn handle_line(
    line: &str,
    session: &mut Session,
    window: &FixedWindow,
    cursor: &VirtualCursor,
) -> Result<bool> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(true);
    }

    if let Some(command) = line.strip_prefix(':') {
        let (name, rest) = command.split_once(' ').unwrap_or((command, ""));
        match name {
            "quit" | "q" => return Ok(false),
            "mode" => println!("mode: {}", session.mode.current()),
            "cursor" => {
                use keymode_core::movement::CursorDriver;
                let Point { x, y } = cursor.position();
                println!("cursor: ({}, {})", x, y);
            }
            "title" => {
                let title = rest.trim();
                if title.is_empty() {
                    window.clear();
                } else {
                    window.set(WindowInfo::titled(title));
                }
                session.engine.update_keymap();
                println!("title: {:?}", title);
            }
            "reload" => {
                session.reload(cursor)?;
                println!("reloaded; mode: {}", session.mode.current());
            }
            "active" => {
                let engine = &session.engine;
                let names: Vec<&str> = engine
                    .active_keymaps()
                    .iter()
                    .filter_map(|id| engine.keymap(*id))
                    .map(|k| k.name())
                    .collect();
                println!("active: {}", names.join(", "));
            }
            _ => bail!("unknown command ':{}'", name),
        }
        return Ok(true);
    }

    let chord: ChordSpec = line.parse().with_context(|| format!("bad chord '{}'", line))?;
    let engine = &mut session.engine;
    for event in engine.chord_events(&chord)? {
        let outcome = engine.dispatch(event);
        log::debug!("{} -> {:?}", event, outcome);
        println!("{:<12} {:?}", event.to_string(), outcome);
    }
    Ok(true)
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if args.print_default_settings {
        print!("{}", default_settings_content());
        return Ok(());
    }

    let settings = load_settings(&args)?;
    if args.check_config {
        println!("Configuration is valid");
        return Ok(());
    }

    let console = Arc::new(ConsoleHost::default());
    let window = FixedWindow::new();
    window.set(WindowInfo::with_details(
        args.exe.clone(),
        args.class.clone(),
        Some(args.title.clone().unwrap_or_default()),
    ));
    let host = Host {
        input: console.clone(),
        ime: console.clone(),
        scheduler: Arc::new(ThreadScheduler),
        windows: Arc::new(window.clone()),
        mover: console.clone(),
        commands: console.clone(),
    };

    let cursor = VirtualCursor::new(Point::new(0, 0));
    let mut session = Session::start(settings, host, &cursor)?;

    if args.list_keymaps {
        print_keymaps(&session.engine, &session.profile);
        session.shutdown();
        return Ok(());
    }

    log::info!("reading chords from stdin (:quit to exit)");
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line.context("failed to read stdin")?;
        match handle_line(&line, &mut session, &window, &cursor) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => eprintln!("error: {:#}", e),
        }
        io::stdout().flush().context("failed to flush stdout")?;
    }

    session.shutdown();
    log::info!("injected {} chords", console.injected());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parsing() {
        let args = Args::parse_from(["keymode", "--config", "/tmp/test.toml"]);

        assert_eq!(args.config, Some(PathBuf::from("/tmp/test.toml")));
        assert!(!args.verbose);
        assert!(!args.check_config);
        assert!(!args.list_keymaps);
        assert!(args.title.is_none());
    }

    #[test]
    fn test_args_with_options() {
        let args = Args::parse_from([
            "keymode",
            "-v",
            "--list-keymaps",
            "--title",
            "Notepad",
            "--exe",
            "notepad.exe",
        ]);

        assert!(args.verbose);
        assert!(args.list_keymaps);
        assert_eq!(args.title.as_deref(), Some("Notepad"));
        assert_eq!(args.exe.as_deref(), Some("notepad.exe"));
        assert!(args.class.is_none());
    }

    fn console_host(console: &Arc<ConsoleHost>, window: &FixedWindow) -> Host {
        Host {
            input: console.clone(),
            ime: console.clone(),
            scheduler: Arc::new(ThreadScheduler),
            windows: Arc::new(window.clone()),
            mover: console.clone(),
            commands: console.clone(),
        }
    }

    fn without_movement() -> Settings {
        Settings::from_toml("[movement]\nenabled = false\n").unwrap()
    }

    #[test]
    fn test_handle_line_switches_mode() {
        let console = Arc::new(ConsoleHost::default());
        let window = FixedWindow::new();
        let cursor = VirtualCursor::default();
        let mut session =
            Session::start(without_movement(), console_host(&console, &window), &cursor).unwrap();

        assert!(handle_line("U1-c", &mut session, &window, &cursor).unwrap());
        assert!(session.mode.is_cursor());
        assert!(handle_line("j", &mut session, &window, &cursor).unwrap());
        assert_eq!(console.injected(), 1);
        assert!(handle_line("what-is-this", &mut session, &window, &cursor).is_err());
        assert!(!handle_line(":quit", &mut session, &window, &cursor).unwrap());
    }

    #[test]
    fn test_reload_reinstalls_profile() {
        let path = std::env::temp_dir().join(format!("keymode-cli-{}.toml", std::process::id()));
        std::fs::write(&path, "[movement]\nenabled = false\n").unwrap();

        let console = Arc::new(ConsoleHost::default());
        let window = FixedWindow::new();
        let cursor = VirtualCursor::default();
        let settings = Settings::from_file(&path).unwrap();
        let mut session =
            Session::start(settings, console_host(&console, &window), &cursor).unwrap();
        assert!(handle_line("U1-t", &mut session, &window, &cursor).unwrap());
        assert!(session.mode.is_test());

        std::fs::write(
            &path,
            "[mode]\ninitial = \"cursor\"\n[movement]\nenabled = false\n",
        )
        .unwrap();
        assert!(handle_line(":reload", &mut session, &window, &cursor).unwrap());
        assert!(session.mode.is_cursor());
        assert_eq!(session.engine.keymaps().count(), 5);

        // A broken file keeps the running profile
        std::fs::write(&path, "[mode]\ninitial = \"nope\"\n").unwrap();
        assert!(handle_line(":reload", &mut session, &window, &cursor).is_err());
        assert!(session.mode.is_cursor());

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_reload_needs_a_settings_file() {
        let console = Arc::new(ConsoleHost::default());
        let window = FixedWindow::new();
        let cursor = VirtualCursor::default();
        let mut session =
            Session::start(without_movement(), console_host(&console, &window), &cursor).unwrap();
        assert!(handle_line(":reload", &mut session, &window, &cursor).is_err());
    }
}

use std::env;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::mpsc;

use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use log::{info, warn};
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::app::App;
use crate::backend::DesktopEngines;
use crate::library::load_library;
use crate::mpris::ControlCmd;
use crate::player::Coordinator;

mod event_loop;
mod mpris_sync;
mod settings;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let settings = settings::load_settings();

    let mut source: Option<String> = None;
    for arg in env::args().skip(1) {
        match arg.as_str() {
            "--dump-config" => {
                print!("{}", settings.to_toml()?);
                return Ok(());
            }
            _ => source = Some(arg),
        }
    }

    match crate::logging::init(&settings.logging) {
        Ok(path) => info!("legato starting, logging to {}", path.display()),
        Err(e) => eprintln!("legato: logging disabled: {e}"),
    }

    let source = match source {
        Some(s) => PathBuf::from(s),
        None => env::current_dir()?,
    };
    let tracks = load_library(&source, &settings.library)?;
    info!("loaded {} tracks from {}", tracks.len(), source.display());

    let engines = Rc::new(DesktopEngines::new());
    let mut coordinator = Coordinator::new(&settings, engines.clone());
    coordinator.load(tracks.clone());

    let mut app = App::new(tracks);
    app.follow_playback = settings.ui.follow_playback;
    app.set_source_label(source.display().to_string());

    let (control_tx, control_rx) = mpsc::channel::<ControlCmd>();
    let mpris = crate::mpris::spawn_mpris(control_tx.clone());

    let initial = coordinator
        .playback_handle()
        .lock()
        .map(|info| info.clone())
        .unwrap_or_default();
    mpris_sync::update_mpris(&mpris, &app, &initial);

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let run_result = {
        let mut state = event_loop::EventLoopState::new(&initial);
        let mut session = event_loop::Session {
            settings: &settings,
            coordinator: &mut coordinator,
            engines: &engines,
            app: &mut app,
            mpris: &mpris,
        };
        event_loop::run(
            &mut terminal,
            &mut session,
            &control_tx,
            &control_rx,
            &mut state,
        )
    };

    if let Err(e) = &run_result {
        warn!("event loop failed: {e}");
    }
    coordinator.shutdown();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    run_result
}

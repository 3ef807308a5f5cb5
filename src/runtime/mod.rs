use std::path::PathBuf;
use std::sync::mpsc;

use clap::{Parser, Subcommand};
use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{info, warn};

use crate::app::App;
use crate::audio::AudioPlayer;
use crate::config::Settings;
use crate::library::{LibraryStore, SongId};
use crate::remote::{ChannelConfig, ControlCmd, RemoteChannel};

mod commands;
mod event_loop;
mod logging;
mod settings;

#[cfg(test)]
mod tests;

/// Terminal music player that can be driven by a gesture remote.
#[derive(Parser, Debug)]
#[command(name = "handwave")]
#[command(version, about)]
pub struct Cli {
    /// WebSocket URL of the gesture command source
    #[arg(long, global = true, env = "HANDWAVE_ENDPOINT")]
    endpoint: Option<String>,

    /// Do not connect to the gesture command source
    #[arg(long, global = true)]
    no_remote: bool,

    /// Song database to use instead of the configured one
    #[arg(long, global = true, value_name = "PATH")]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Command {
    /// Import audio files, or directories of them, into the library
    Import {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// List the songs in the library
    List,
    /// Remove a song from the library
    Remove { id: SongId },
    /// Print the effective settings as TOML
    Config,
}

impl Cli {
    /// Fold command line overrides into the loaded settings.
    fn apply_overrides(&self, settings: &mut Settings) {
        if let Some(endpoint) = &self.endpoint {
            settings.remote.endpoint = endpoint.clone();
        }
        if self.no_remote {
            settings.remote.enabled = false;
        }
        if let Some(database) = &self.database {
            settings.library.database_path = Some(database.clone());
        }
    }
}

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match &cli.command {
        None => {
            if let Some(path) = logging::init_file() {
                eprintln!("handwave: logging to {}", path.display());
            }
        }
        Some(_) => logging::init_stderr(),
    }

    let mut settings = settings::load_settings();
    cli.apply_overrides(&mut settings);

    match cli.command {
        None => play(&settings),
        Some(Command::Config) => commands::print_config(&settings),
        Some(command) => {
            let store = open_store(&settings)?;
            match command {
                Command::Import { paths } => commands::import(&paths, &settings, &store),
                Command::List => commands::list(&store),
                Command::Remove { id } => commands::remove(id, &store),
                Command::Config => Ok(()),
            }
        }
    }
}

fn open_store(settings: &Settings) -> Result<LibraryStore, Box<dyn std::error::Error>> {
    let path = settings
        .database_path()
        .ok_or("cannot determine where to keep the library; pass --database")?;
    Ok(LibraryStore::open(&path)?)
}

/// Run the interactive player until the user (or the remote) quits.
fn play(settings: &Settings) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store(settings)?;
    let mut audio_player = AudioPlayer::new(settings.audio.clone());
    let mut app = App::new(settings.ui.show_playlist);
    // The event loop loads the library right after its first frame.
    app.request_reload();

    let (control_tx, control_rx) = mpsc::channel::<ControlCmd>();
    let mut remote = RemoteChannel::new(ChannelConfig::from(&settings.remote), control_tx.clone());
    if settings.remote.enabled {
        info!(endpoint = remote.endpoint(), "starting remote channel");
        remote.start();
    } else {
        warn!("remote channel disabled");
    }

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let run_result = event_loop::run(
        &mut terminal,
        settings,
        &mut app,
        &store,
        &mut audio_player,
        &remote,
        &control_tx,
        &control_rx,
    );

    remote.stop();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    run_result
}

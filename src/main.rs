mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use rand::{rngs::StdRng, SeedableRng};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    path::PathBuf,
};
use tracing::info;

use typrace::{
    app_dirs::AppDirs,
    config::{ConfigStore, FileConfigStore, RaceConfig},
    input::{command_for, dispatch, Flow},
    logging,
    opponents::RandomSteps,
    passage::FixedPassage,
    runtime::{CrosstermEventSource, FixedTicker, RaceEvent, Runner},
    timing::SystemClock,
    SessionController,
};

/// typing race against simulated opponents, with live accuracy and wpm
#[derive(Parser, Debug, Clone)]
#[clap(version, about)]
pub struct Cli {
    /// join a session by id instead of creating one
    #[clap(short = 'j', long)]
    join: Option<String>,

    /// custom passage to race on
    #[clap(short = 'p', long)]
    passage: Option<String>,

    /// countdown length in seconds
    #[clap(short = 'c', long)]
    countdown: Option<u32>,

    /// number of simulated opponents
    #[clap(short = 'o', long)]
    opponents: Option<usize>,

    /// your name on the track
    #[clap(short = 'n', long)]
    name: Option<String>,

    /// write logs to this file instead of the default state directory
    #[clap(long)]
    log_file: Option<PathBuf>,

    /// do not write a log file
    #[clap(long)]
    no_log: bool,

    /// remember the countdown, opponents and name given on this command line
    #[clap(long)]
    save_config: bool,
}

impl Cli {
    fn apply(&self, mut config: RaceConfig) -> RaceConfig {
        if let Some(secs) = self.countdown {
            config.countdown_secs = secs;
        }
        if let Some(n) = self.opponents {
            config.opponent_count = n;
        }
        if let Some(ref name) = self.name {
            config.player_name = name.clone();
        }
        config.sanitized()
    }
}

pub struct App {
    pub controller: SessionController,
}

impl App {
    pub fn new(cli: &Cli, config: RaceConfig) -> typrace::Result<Self> {
        let mut controller = match cli.passage {
            Some(ref passage) => SessionController::new(
                config,
                Box::new(FixedPassage(passage.clone())),
                Box::new(RandomSteps(StdRng::from_entropy())),
                Box::new(SystemClock),
            ),
            None => SessionController::from_config(config)?,
        };

        if let Some(ref id) = cli.join {
            controller.join_session(id);
        }

        Ok(Self { controller })
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let store = FileConfigStore::new();
    let config = cli.apply(store.load());
    if cli.save_config {
        store.save(&config)?;
    }

    let _log_guard = if cli.no_log {
        None
    } else {
        let path = cli.log_file.clone().unwrap_or_else(AppDirs::log_path);
        Some(logging::init_logging(&path)?)
    };
    info!(?config, "starting");

    let mut app = App::new(&cli, config)?;

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(CrosstermEventSource::new(), FixedTicker::default());

    loop {
        terminal.draw(|f| ui::draw(app, f))?;

        match runner.step() {
            RaceEvent::Tick | RaceEvent::Resize => {}
            RaceEvent::Key(key) => {
                let command = command_for(&key, app.controller.current_state().phase);
                if dispatch(&mut app.controller, command) == Flow::Quit {
                    break;
                }
            }
        }

        app.controller.pump();
    }

    info!(phase = %app.controller.current_state().phase, "quit");
    Ok(())
}

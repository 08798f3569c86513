use std::{
    error::Error,
    io::{self, stdin},
    path::PathBuf,
    sync::Arc,
    time::Instant,
};

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use focuswriter::{
    app::App,
    app_dirs::AppDirs,
    auth::SqliteAuthProvider,
    config::{Config, ConfigStore, FileConfigStore},
    extract::{DocumentExtractor, TextExtractor},
    keymap::{self, KeyAction},
    library::Library,
    logging,
    runtime::{CrosstermEventSource, FixedTicker, Runner},
    ui,
    upload::spawn_extraction,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use tracing::{info, warn};

/// distraction-free typing practice on your own documents
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Practice typing on built-in texts or on your own documents (txt, md, html, pdf), one page at a time, with live WPM and accuracy."
)]
pub struct Cli {
    /// characters per page
    #[clap(short = 'p', long)]
    page_size: Option<usize>,

    /// milliseconds to wait before moving past a finished page
    #[clap(long)]
    advance_delay_ms: Option<u64>,

    /// start with the dark theme
    #[clap(long)]
    dark: bool,

    /// account database to use instead of the one in the state directory
    #[clap(long)]
    db_path: Option<PathBuf>,

    /// log file to use instead of the one in the state directory
    #[clap(long)]
    log_path: Option<PathBuf>,

    /// log level: off, error, warn, info, debug or trace
    #[clap(long, default_value = "info")]
    log_level: String,
}

impl Cli {
    /// Command line flags take precedence over the saved config.
    fn apply(&self, mut config: Config) -> Config {
        if let Some(page_size) = self.page_size {
            config.page_size = page_size;
        }
        if let Some(delay) = self.advance_delay_ms {
            config.advance_delay_ms = delay;
        }
        if self.dark {
            config.dark_theme = true;
        }
        config
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let level = match logging::parse_level(&cli.log_level) {
        Ok(level) => level,
        Err(err) => Cli::command().error(ErrorKind::InvalidValue, err).exit(),
    };
    if let Some(log_path) = cli.log_path.clone().or_else(AppDirs::log_path) {
        if let Err(err) = logging::init(&log_path, level) {
            eprintln!("focuswriter: logging disabled: {err}");
        }
    }

    let store = FileConfigStore::new();
    let config = cli.apply(store.load());
    let db_path = cli
        .db_path
        .clone()
        .or_else(AppDirs::db_path)
        .ok_or("could not determine a state directory")?;
    let auth = SqliteAuthProvider::open(&db_path)?;
    let library = Library::with_defaults()?;
    info!(db = %db_path.display(), page_size = config.page_size, "starting");

    let mut app = App::new(config, Box::new(auth), library);

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen,)?;
    terminal.show_cursor()?;

    if let Err(err) = store.save(&app.preferences(store.load())) {
        warn!(%err, path = %store.path().display(), "could not save preferences");
    }

    result
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(CrosstermEventSource::new(), FixedTicker::default());
    let extractor: Arc<dyn TextExtractor> = Arc::new(DocumentExtractor);

    // first frame shows the loading screen while the session is restored
    terminal.draw(|f| ui::draw(f, app, Instant::now()))?;
    app.restore_session();

    loop {
        terminal.draw(|f| ui::draw(f, app, Instant::now()))?;

        match keymap::dispatch(app, runner.step(), Instant::now()) {
            KeyAction::None => {}
            KeyAction::Quit => break,
            KeyAction::StartUpload(request) => {
                spawn_extraction(request, Arc::clone(&extractor), runner.sender());
            }
        }
    }

    info!("exiting");
    Ok(())
}

mod app;
mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser, Subcommand};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    io::{self, stdin, BufRead, Write},
    path::PathBuf,
    time::Duration,
};

use liftlog::{
    app_dirs::AppDirs,
    backup::{export_to, import_from, LocalBackup},
    clock::SystemClock,
    config::{CompletionMode, FileSettingsStore, SettingsStore},
    display::TICK_MS,
    format::format_duration,
    history::{kpis, reps_to_string, HistoryFilter},
    logging,
    notifier::CompletionNotifier,
    runtime::{AppEvent, CrosstermEventSource, LazyTicker, Runner},
    store::Store,
};

use crate::app::{App, Flow};

/// Slow wake-up while no timer runs, so a missed key never stalls the loop
const IDLE_TICK_MS: u64 = 5_000;

/// terminal workout logger with per-exercise timers and rest countdowns
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Log workouts from a configurable plan, time each exercise, count down rest between sets and browse your history. Run without a subcommand to open the logger."
)]
pub struct Cli {
    /// database file (defaults to the state directory)
    #[clap(long, global = true)]
    db: Option<PathBuf>,

    /// settings file (defaults to the config directory)
    #[clap(long, global = true)]
    config: Option<PathBuf>,

    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// write plan and sessions to a JSON file
    Export { path: PathBuf },

    /// replace plan and sessions with the contents of a JSON export
    Import {
        path: PathBuf,

        /// skip the overwrite confirmation
        #[clap(long)]
        yes: bool,
    },

    /// copy the latest local backup to a file
    Backup { path: PathBuf },

    /// print saved sessions
    History {
        /// only sessions of this workout
        #[clap(short, long)]
        workout: Option<String>,

        /// case-insensitive text in comments or exercise names
        #[clap(short, long)]
        search: Option<String>,
    },

    /// show or change rest completion settings
    Settings {
        #[clap(long, value_enum)]
        mode: Option<CompletionMode>,

        /// seconds; 0 turns completion notifications off
        #[clap(long)]
        duration: Option<f64>,
    },
}

impl Cli {
    fn open_store(&self) -> Result<Store, Box<dyn Error>> {
        let mut store = match &self.db {
            Some(path) => Store::open(path)?,
            None => Store::open_default()?,
        };
        store.ensure_default_plan()?;
        Ok(store)
    }

    fn settings_store(&self) -> FileSettingsStore {
        match &self.config {
            Some(path) => FileSettingsStore::with_path(path),
            None => FileSettingsStore::new(),
        }
    }

    /// The backup sits next to a custom database, otherwise in the state dir
    fn local_backup(&self) -> Option<LocalBackup> {
        match &self.db {
            Some(path) => Some(LocalBackup::new(path.with_file_name("backup.json"))),
            None => LocalBackup::default_location(),
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let _log_guard = logging::init(AppDirs::log_dir().as_deref());

    let mut store = cli.open_store()?;
    let settings_store = cli.settings_store();
    let backup = cli.local_backup();

    if let Some(command) = cli.command.clone() {
        let mut stdout = io::stdout().lock();
        let mut input = stdin().lock();
        return run_command(command, &mut store, &settings_store, backup.as_ref(), &mut input, &mut stdout);
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let mut app = App::new(
        store,
        Box::new(settings_store),
        backup,
        CompletionNotifier::terminal(),
        Box::new(SystemClock::new()),
    )?;

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
    let ticker = LazyTicker::new(Duration::from_millis(TICK_MS), Duration::from_millis(IDLE_TICK_MS));
    let runner = Runner::new(CrosstermEventSource::new(), ticker);

    terminal.draw(|f| ui::draw(app, f))?;

    loop {
        let event = if app.display.is_active() {
            runner.step()
        } else {
            runner.step_idle()
        };

        match event {
            AppEvent::Tick => {
                if app.on_tick() {
                    terminal.draw(|f| ui::draw(app, f))?;
                }
            }
            AppEvent::Resize => {
                terminal.draw(|f| ui::draw(app, f))?;
            }
            AppEvent::Key(key) => {
                if app.on_input(key) == Flow::Quit {
                    break;
                }
                terminal.draw(|f| ui::draw(app, f))?;
            }
        }
    }

    Ok(())
}

fn run_command(
    command: Command,
    store: &mut Store,
    settings_store: &dyn SettingsStore,
    backup: Option<&LocalBackup>,
    input: &mut dyn BufRead,
    out: &mut dyn Write,
) -> Result<(), Box<dyn Error>> {
    match command {
        Command::Export { path } => {
            let payload = export_to(store, &path)?;
            writeln!(
                out,
                "Exported {} plan rows and {} sessions to {}",
                payload.config.len(),
                payload.sessions.len(),
                path.display()
            )?;
        }
        Command::Import { path, yes } => {
            if !yes && !confirm(input, out, "Import will overwrite current config AND sessions. Continue?")? {
                writeln!(out, "Import cancelled")?;
                return Ok(());
            }
            let payload = import_from(store, &path)?;
            if let Some(backup) = backup {
                backup.refresh(store);
            }
            writeln!(
                out,
                "Imported {} plan rows and {} sessions",
                payload.config.len(),
                payload.sessions.len()
            )?;
        }
        Command::Backup { path } => {
            let Some(backup) = backup else {
                return Err("no backup location available".into());
            };
            backup.copy_to(&path)?;
            writeln!(out, "Backup copied to {}", path.display())?;
        }
        Command::History { workout, search } => {
            let filter = HistoryFilter {
                workout,
                query: search.unwrap_or_default(),
            };
            print_history(store, &filter, out)?;
        }
        Command::Settings { mode, duration } => {
            let mut settings = settings_store.load();
            let changed = mode.is_some() || duration.is_some();
            if let Some(mode) = mode {
                settings.completion_mode = mode;
            }
            if let Some(duration) = duration {
                if !duration.is_finite() || duration < 0.0 {
                    return Err(format!("invalid duration: {duration}").into());
                }
                settings.completion_duration_sec = duration;
            }
            if changed {
                settings_store.save(&settings)?;
            }
            writeln!(out, "mode: {}", settings.completion_mode)?;
            writeln!(out, "duration: {} s", settings.completion_duration_sec)?;
        }
    }
    Ok(())
}

fn confirm(input: &mut dyn BufRead, out: &mut dyn Write, question: &str) -> io::Result<bool> {
    write!(out, "{question} [y/N] ")?;
    out.flush()?;
    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

fn print_history(store: &Store, filter: &HistoryFilter, out: &mut dyn Write) -> Result<(), Box<dyn Error>> {
    let sessions = store.sessions()?;
    let k = kpis(&sessions);
    writeln!(
        out,
        "{} sessions · {} workouts · last {} · avg pain {}",
        k.sessions,
        k.workouts,
        k.last_date.as_deref().unwrap_or("—"),
        k.avg_pain.map_or_else(|| "—".to_string(), |p| format!("{p:.2}"))
    )?;

    let shown = filter.apply(&sessions);
    if shown.is_empty() {
        writeln!(out, "No sessions yet.")?;
    }
    for session in shown {
        writeln!(
            out,
            "\n{} · {} (pain max {}, total {})",
            session.date_iso,
            session.workout,
            session.max_pain(),
            session.total_time_ms.map_or_else(|| "—".to_string(), format_duration)
        )?;
        if !session.comment.is_empty() {
            writeln!(out, "  {}", session.comment)?;
        }
        for item in &session.items {
            writeln!(
                out,
                "  {} ({}) sets {} · reps {} · pain {}{}",
                item.exercise,
                item.target,
                item.sets_done.map_or_else(|| "—".to_string(), |d| d.to_string()),
                reps_to_string(&item.reps_by_set),
                item.pain_0_to_5,
                if item.comment.is_empty() {
                    String::new()
                } else {
                    format!(" · {}", item.comment)
                }
            )?;
        }
    }
    Ok(())
}

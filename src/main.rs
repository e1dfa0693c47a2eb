mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use mulquiz::{
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore},
    leaderboard::{Leaderboard, Scoreboard},
    runtime::{ChannelTickScheduler, CrosstermEventSource, FixedTicker, QuizEvent, Runner},
    store::{KvStore, MemoryStore, SqliteStore},
    Game, Phase, QuizError,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use std::{
    error::Error,
    fs::{self, OpenOptions},
    io::{self, stdin, Write},
    path::PathBuf,
    sync::Mutex,
    time::{Duration, Instant},
};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

const TICK_RATE_MS: u64 = 100;
const MAX_ANSWER_LEN: usize = 6;
const MAX_NAME_LEN: usize = 20;

/// timed multiplication quiz with a persisted top-3 leaderboard
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Answer multiplication problems (2-9 × 2-9) until you reach the target number of correct answers. The fastest three rounds are kept on a local leaderboard."
)]
pub struct Cli {
    /// number of correct answers needed to finish a round
    #[clap(short = 't', long)]
    target: Option<u32>,

    /// path of the score database
    #[clap(long)]
    db: Option<PathBuf>,

    /// path of the config file
    #[clap(long)]
    config: Option<PathBuf>,

    /// print the leaderboard and exit
    #[clap(long)]
    scores: bool,
}

impl Cli {
    /// CLI flags win over the config file
    fn apply(&self, mut config: Config) -> Config {
        if let Some(target) = self.target {
            config.target_correct = target;
        }
        if let Some(ref db) = self.db {
            config.db_path = Some(db.clone());
        }
        config
    }

    fn config_store(&self) -> FileConfigStore {
        self.config
            .as_ref()
            .map(FileConfigStore::with_path)
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Screen {
    Start,
    Quiz,
    Results,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Feedback {
    pub message: String,
    pub positive: bool,
    pub until: Instant,
}

pub struct App {
    pub game: Game,
    pub screen: Screen,
    pub answer: String,
    pub name: String,
    pub feedback: Option<Feedback>,
    pub notice: Option<String>,
    pub results_at: Option<Instant>,
    feedback_delay: Duration,
    finish_delay: Duration,
}

impl App {
    pub fn new(game: Game, config: &Config) -> Self {
        Self {
            game,
            screen: Screen::Start,
            answer: String::new(),
            name: String::new(),
            feedback: None,
            notice: None,
            results_at: None,
            feedback_delay: Duration::from_millis(config.feedback_delay_ms),
            finish_delay: Duration::from_millis(config.finish_delay_ms),
        }
    }

    /// Handles one key press; returns true when the app should quit
    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) -> bool {
        if key.code == KeyCode::Esc
            || (key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c'))
        {
            return true;
        }

        match self.screen {
            Screen::Start => match key.code {
                KeyCode::Enter | KeyCode::Char(' ') => self.start_round(),
                KeyCode::Char('q') => return true,
                _ => {}
            },
            Screen::Quiz => {
                // Answers are frozen while the finish delay runs
                if self.game.phase() != Phase::Running {
                    return false;
                }
                match key.code {
                    KeyCode::Enter => self.submit(now),
                    KeyCode::Tab => self.skip(now),
                    KeyCode::Backspace => {
                        self.answer.pop();
                    }
                    KeyCode::Char(c) if self.answer.chars().count() < MAX_ANSWER_LEN => {
                        self.answer.push(c)
                    }
                    _ => {}
                }
            }
            Screen::Results => {
                let awaiting_name = self
                    .game
                    .last_result()
                    .is_some_and(|attempt| attempt.awaiting_name());

                if awaiting_name {
                    match key.code {
                        KeyCode::Enter => self.save_name(),
                        // saving is optional
                        KeyCode::Tab => self.restart(),
                        KeyCode::Backspace => {
                            self.name.pop();
                        }
                        KeyCode::Char(c) if self.name.chars().count() < MAX_NAME_LEN => {
                            self.name.push(c)
                        }
                        _ => {}
                    }
                } else {
                    match key.code {
                        KeyCode::Char('r') => self.restart(),
                        KeyCode::Enter => self.start_round(),
                        KeyCode::Char('q') => return true,
                        _ => {}
                    }
                }
            }
        }

        false
    }

    /// Expires feedback and shows results once their delays have passed
    pub fn on_pulse(&mut self, now: Instant) {
        if self.feedback.as_ref().is_some_and(|f| now >= f.until) {
            self.feedback = None;
        }

        if self.results_at.is_some_and(|at| now >= at) {
            self.results_at = None;
            self.feedback = None;
            self.screen = Screen::Results;
        }
    }

    fn start_round(&mut self) {
        match self.game.start() {
            Ok(_) => {
                self.screen = Screen::Quiz;
                self.answer.clear();
                self.name.clear();
                self.feedback = None;
                self.notice = None;
            }
            Err(e) => debug!(error = %e, "start ignored"),
        }
    }

    fn submit(&mut self, now: Instant) {
        match self.game.submit_answer(&self.answer) {
            Ok(outcome) => {
                self.show_feedback(outcome.feedback(), outcome.is_correct(), now);
                if outcome.finished.is_some() {
                    self.results_at = Some(now + self.finish_delay);
                }
            }
            Err(QuizError::InvalidInput { .. }) => {
                self.show_feedback("Please enter a number!".to_string(), false, now);
            }
            Err(e) => debug!(error = %e, "answer ignored"),
        }
        self.answer.clear();
    }

    fn skip(&mut self, now: Instant) {
        match self.game.skip() {
            Ok(outcome) => self.show_feedback(outcome.feedback(), false, now),
            Err(e) => debug!(error = %e, "skip ignored"),
        }
        self.answer.clear();
    }

    fn save_name(&mut self) {
        match self.game.record_attempt(&self.name) {
            Ok(entry) => {
                self.notice = Some(format!(
                    "Congratulations {}! Your score has been saved! 🎉",
                    entry.name
                ));
                self.name.clear();
            }
            Err(QuizError::InvalidName) => {
                self.notice = Some("Please enter your name!".to_string());
            }
            Err(e) => debug!(error = %e, "save ignored"),
        }
    }

    fn restart(&mut self) {
        match self.game.restart() {
            Ok(()) => {
                self.screen = Screen::Start;
                self.notice = None;
                self.name.clear();
            }
            Err(e) => debug!(error = %e, "restart ignored"),
        }
    }

    fn show_feedback(&mut self, message: String, positive: bool, now: Instant) {
        self.feedback = Some(Feedback {
            message,
            positive,
            until: now + self.feedback_delay,
        });
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let config_store = cli.config_store();
    if !config_store.exists() {
        let _ = config_store.save(&Config::default());
    }
    let config = cli.apply(config_store.load());

    if cli.scores {
        let scoreboard = Scoreboard::load(open_store(&config));
        write_scores(scoreboard.leaderboard(), &mut io::stdout())?;
        return Ok(());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    init_logging();

    let events = CrosstermEventSource::new();
    let scheduler = ChannelTickScheduler::new(events.sender());
    let game = Game::new(config.target_correct, open_store(&config), Box::new(scheduler));
    let runner = Runner::new(events, FixedTicker::new(Duration::from_millis(TICK_RATE_MS)));
    let mut app = App::new(game, &config);

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app, &runner);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen,)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &Runner<CrosstermEventSource, FixedTicker>,
) -> Result<(), Box<dyn Error>> {
    terminal.draw(|f| ui(app, f))?;

    loop {
        match runner.step() {
            QuizEvent::Key(key) => {
                if app.handle_key(key, Instant::now()) {
                    break;
                }
            }
            QuizEvent::Tick | QuizEvent::Pulse => app.on_pulse(Instant::now()),
            QuizEvent::Resize => {}
        }

        terminal.draw(|f| ui(app, f))?;
    }

    Ok(())
}

/// Score database from config, falling back to memory when it cannot be opened
fn open_store(config: &Config) -> Box<dyn KvStore> {
    let opened = match config.db_path {
        Some(ref path) => SqliteStore::open(path),
        None => SqliteStore::new(),
    };

    match opened {
        Ok(store) => Box::new(store),
        Err(e) => {
            warn!(error = %e, "score database unavailable, scores will not be kept");
            Box::new(MemoryStore::new())
        }
    }
}

fn write_scores<W: Write>(board: &Leaderboard, out: &mut W) -> io::Result<()> {
    if board.is_empty() {
        return writeln!(out, "No high scores yet!");
    }

    for (index, entry) in board.entries().iter().enumerate() {
        writeln!(
            out,
            "#{} {:<20} {} {:>3}% {}",
            index + 1,
            entry.name,
            entry.time_string,
            entry.accuracy_percent,
            entry.date
        )?;
    }
    Ok(())
}

/// Logs go to a file because the terminal belongs to the TUI
fn init_logging() {
    let Some(path) = AppDirs::log_path() else {
        return;
    };
    if let Some(parent) = path.parent() {
        if fs::create_dir_all(parent).is_err() {
            return;
        }
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };

    let filter = EnvFilter::try_from_env("MULQUIZ_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init();
}

fn ui(app: &mut App, f: &mut Frame) {
    f.render_widget(&*app, f.area());
}

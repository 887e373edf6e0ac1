pub mod app_dirs;
pub mod catalog;
pub mod config;
pub mod duel;
pub mod history;
pub mod runtime;
pub mod session;
pub mod timer;
pub mod ui;

use crate::{
    catalog::Catalog,
    config::{Config, ConfigStore, FileConfigStore},
    duel::{Duel, SessionEvent},
    history::{append_result_log, DuelRecord, HistoryDb},
    runtime::{GameEvent, IntervalTask},
    session::{InvalidLevel, Level, SessionConfig},
};
use chrono::Local;
use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    sync::mpsc,
    thread,
    time::Duration,
};

const TICK_RATE_MS: u64 = 1000;

/// terminal quiz duel with timed rounds
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A terminal quiz duel: answer wattage questions against the clock, one long round on level 1 or five quick rounds on level 2, with local duel history."
)]
pub struct Cli {
    /// opponent name shown in the header
    #[clap(short = 'o', long)]
    opponent: Option<String>,

    /// difficulty level: 1 = one 60s round, 2 = five 10s rounds
    #[clap(short = 'l', long)]
    level: Option<u8>,

    /// player name shown in the header
    #[clap(short = 'p', long)]
    player: Option<String>,
}

/// CLI flags win over the stored config.
fn resolve_session(cli: &Cli, stored: &Config) -> Result<SessionConfig, InvalidLevel> {
    let level = Level::from_number(cli.level.unwrap_or(stored.level))?;
    Ok(SessionConfig {
        player_name: cli
            .player
            .clone()
            .unwrap_or_else(|| stored.player_name.clone()),
        opponent_name: cli
            .opponent
            .clone()
            .unwrap_or_else(|| stored.opponent_name.clone()),
        level,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppState {
    Playing,
    Results,
}

#[derive(Debug)]
pub struct App {
    pub cli: Option<Cli>,
    pub duel: Duel,
    pub state: AppState,
    pub status: Option<String>,
    pub leave_requested: bool,
    pub final_score: Option<u32>,
    pub best_score: Option<u32>,
    pub recent: Vec<DuelRecord>,
}

impl App {
    pub fn new(cli: Cli) -> Result<Self, Box<dyn Error>> {
        let stored = FileConfigStore::new().load();
        let session = resolve_session(&cli, &stored)?;
        let rounds = session.level.settings().total_rounds as usize;
        let questions = Catalog::builtin().draw(rounds);
        let duel = Duel::new(session, questions)?;

        Ok(Self {
            cli: Some(cli),
            duel,
            state: AppState::Playing,
            status: None,
            leave_requested: false,
            final_score: None,
            best_score: None,
            recent: Vec::new(),
        })
    }

    /// New duel against the same opponent with freshly drawn questions.
    pub fn reset(&mut self) -> Result<(), Box<dyn Error>> {
        let cli = self.cli.clone().unwrap();
        *self = App::new(cli)?;
        Ok(())
    }

    /// Move queued engine events into view state.
    pub fn drain_events(&mut self) {
        while let Some(ev) = self.duel.poll_event() {
            match ev {
                SessionEvent::TimeExpired => {
                    self.status = Some("Zeit abgelaufen!".to_string());
                }
                SessionEvent::RoundOutcome { message, .. } => {
                    self.status = Some(match self.status.take() {
                        Some(s) if s == "Zeit abgelaufen!" => {
                            format!("Zeit abgelaufen! {message}")
                        }
                        _ => message,
                    });
                }
                SessionEvent::ExitRequested => {
                    self.leave_requested = true;
                }
                SessionEvent::Finished { score } => {
                    self.finish(score);
                }
            }
        }
    }

    fn finish(&mut self, score: u32) {
        self.final_score = Some(score);
        self.state = AppState::Results;

        let record = DuelRecord {
            opponent: self.duel.config.opponent_name.clone(),
            level: self.duel.config.level.number(),
            score,
            total_rounds: self.duel.settings.total_rounds,
            timestamp: Local::now(),
        };
        if let Ok(db) = HistoryDb::new() {
            let _ = db.record(&record);
            self.best_score = db.best_score(record.level).ok().flatten();
            self.recent = db.recent(5).unwrap_or_default();
        }
        let _ = append_result_log(&record);
    }

    fn toggle_by_number(&mut self, n: u32) {
        let id = self
            .duel
            .question()
            .options
            .get((n - 1) as usize)
            .map(|o| o.id.clone());
        if let Some(id) = id {
            self.duel.toggle_option(&id);
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let mut app = match App::new(cli) {
        Ok(app) => app,
        Err(e) => {
            let mut cmd = Cli::command();
            cmd.error(ErrorKind::InvalidValue, e.to_string()).exit();
        }
    };

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen,)?;
    terminal.show_cursor()?;

    res
}

#[derive(Debug)]
enum ExitType {
    Lobby,
    New,
    Quit,
}

fn start_tui<B: Backend>(
    terminal: &mut Terminal<B>,
    mut app: &mut App,
) -> Result<(), Box<dyn Error>> {
    let (game_events, ticker) = get_game_events();

    loop {
        let mut exit_type: ExitType = ExitType::Quit;
        terminal.draw(|f| ui(app, f))?;

        loop {
            let app = &mut app;

            match game_events.recv()? {
                GameEvent::Tick => {
                    if app.state == AppState::Playing {
                        app.duel.on_tick();
                        app.drain_events();
                        terminal.draw(|f| ui(app, f))?;
                    }
                }
                GameEvent::Resize => {
                    terminal.draw(|f| ui(app, f))?;
                }
                GameEvent::Key(key) => {
                    match app.state {
                        AppState::Playing => match key.code {
                            KeyCode::Esc => {
                                app.duel.request_exit();
                                app.drain_events();
                            }
                            KeyCode::Enter => {
                                app.duel.submit();
                                app.drain_events();
                            }
                            KeyCode::Char(c) => {
                                if key.modifiers.contains(KeyModifiers::CONTROL)
                                    && key.code == KeyCode::Char('c')
                                // ctrl+c to quit
                                {
                                    break;
                                }
                                if let Some(n) = c.to_digit(10) {
                                    if (1..=4).contains(&n) {
                                        app.toggle_by_number(n);
                                    }
                                }
                            }
                            _ => {}
                        },
                        AppState::Results => match key.code {
                            KeyCode::Esc | KeyCode::Char('q') => {
                                break;
                            }
                            KeyCode::Char('n') => {
                                exit_type = ExitType::New;
                                break;
                            }
                            _ => {}
                        },
                    }
                    terminal.draw(|f| ui(app, f))?;
                }
            }

            if app.leave_requested {
                exit_type = ExitType::Lobby;
                break;
            }
        }

        match exit_type {
            ExitType::New => {
                app.reset()?;
            }
            ExitType::Lobby | ExitType::Quit => {
                break;
            }
        }
    }

    ticker.cancel();
    Ok(())
}

fn get_game_events() -> (mpsc::Receiver<GameEvent>, IntervalTask) {
    let (tx, rx) = mpsc::channel();

    let ticker = IntervalTask::spawn(Duration::from_millis(TICK_RATE_MS), tx.clone());

    thread::spawn(move || loop {
        let evt = match event::read() {
            Ok(Event::Key(key)) => Some(GameEvent::Key(key)),
            Ok(Event::Resize(_, _)) => Some(GameEvent::Resize),
            Ok(_) => None,
            Err(_) => break,
        };

        if let Some(evt) = evt {
            if tx.send(evt).is_err() {
                break;
            }
        }
    });

    (rx, ticker)
}

fn ui(app: &mut App, f: &mut Frame) {
    f.render_widget(&*app, f.area());
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn cli(level: u8) -> Cli {
        Cli {
            opponent: Some("Opponent 2".to_string()),
            level: Some(level),
            player: Some("Spieler 1".to_string()),
        }
    }

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::parse_from(["wattquiz"]);

        assert_eq!(cli.opponent, None);
        assert_eq!(cli.level, None);
        assert_eq!(cli.player, None);
    }

    #[test]
    fn test_cli_flags() {
        let cli = Cli::parse_from(["wattquiz", "-o", "Blitz-Bot", "-l", "2", "-p", "Marta"]);
        assert_eq!(cli.opponent.as_deref(), Some("Blitz-Bot"));
        assert_eq!(cli.level, Some(2));
        assert_eq!(cli.player.as_deref(), Some("Marta"));

        let cli = Cli::parse_from(["wattquiz", "--opponent", "X", "--level", "1"]);
        assert_eq!(cli.opponent.as_deref(), Some("X"));
        assert_eq!(cli.level, Some(1));
    }

    #[test]
    fn test_resolve_session_cli_wins() {
        let stored = Config {
            player_name: "Gespeichert".into(),
            opponent_name: "Alt".into(),
            level: 1,
        };
        let session = resolve_session(&cli(2), &stored).unwrap();

        assert_eq!(session.player_name, "Spieler 1");
        assert_eq!(session.opponent_name, "Opponent 2");
        assert_eq!(session.level, Level::Two);
    }

    #[test]
    fn test_resolve_session_falls_back_to_stored() {
        let stored = Config {
            player_name: "Gespeichert".into(),
            opponent_name: "Alt".into(),
            level: 2,
        };
        let bare = Cli {
            opponent: None,
            level: None,
            player: None,
        };
        let session = resolve_session(&bare, &stored).unwrap();

        assert_eq!(session.player_name, "Gespeichert");
        assert_eq!(session.opponent_name, "Alt");
        assert_eq!(session.level, Level::Two);
    }

    #[test]
    fn test_resolve_session_rejects_bad_level() {
        let stored = Config::default();
        assert_eq!(
            resolve_session(&cli(9), &stored).unwrap_err(),
            InvalidLevel(9)
        );
    }

    #[test]
    fn test_app_new_level_one() {
        let app = App::new(cli(1)).unwrap();

        assert_eq!(app.state, AppState::Playing);
        assert_eq!(app.duel.remaining_seconds(), 60);
        assert_eq!(app.duel.round_label(), None);
        assert!(app.cli.is_some());
    }

    #[test]
    fn test_app_new_level_two() {
        let app = App::new(cli(2)).unwrap();

        assert_eq!(app.duel.remaining_seconds(), 10);
        assert_eq!(app.duel.round_label().as_deref(), Some("Runde 1 / 5"));
    }

    #[test]
    fn test_app_new_rejects_invalid_level() {
        assert!(App::new(cli(3)).is_err());
    }

    #[test]
    fn test_toggle_by_number() {
        let mut app = App::new(cli(2)).unwrap();

        app.toggle_by_number(1);
        let first = app.duel.question().options[0].id.clone();
        assert!(app.duel.is_selected(&first));

        app.toggle_by_number(1);
        assert!(!app.duel.is_selected(&first));

        // Out-of-range numbers are ignored
        app.toggle_by_number(9);
        assert_eq!(app.duel.selected_count(), 0);
    }

    #[test]
    fn test_drain_events_sets_outcome_status() {
        let mut app = App::new(cli(2)).unwrap();

        app.duel.submit();
        app.drain_events();

        let status = app.status.clone().unwrap();
        assert!(status.contains("0 Punkte erzielt"));
        assert!(!app.leave_requested);
    }

    #[test]
    fn test_drain_events_merges_timeout_notice() {
        let mut app = App::new(cli(2)).unwrap();

        for _ in 0..10 {
            app.duel.on_tick();
        }
        app.drain_events();

        let status = app.status.clone().unwrap();
        assert!(status.starts_with("Zeit abgelaufen!"));
        assert!(status.contains("0 Punkte erzielt"));
    }

    #[test]
    fn test_drain_events_exit_request() {
        let mut app = App::new(cli(2)).unwrap();

        app.duel.request_exit();
        app.drain_events();

        assert!(app.leave_requested);
        assert_eq!(app.state, AppState::Playing);
        assert_eq!(app.final_score, None);
    }

    #[test]
    fn test_finished_duel_moves_to_results() {
        let mut app = App::new(cli(1)).unwrap();

        app.duel.submit();
        app.drain_events();

        assert_eq!(app.state, AppState::Results);
        assert_eq!(app.final_score, Some(0));
    }

    #[test]
    fn test_app_reset_starts_fresh() {
        let mut app = App::new(cli(2)).unwrap();

        app.toggle_by_number(2);
        app.duel.submit();
        app.drain_events();
        assert_eq!(app.duel.round_index(), 2);

        app.reset().unwrap();

        assert_eq!(app.state, AppState::Playing);
        assert_eq!(app.duel.round_index(), 1);
        assert_eq!(app.duel.score(), 0);
        assert_eq!(app.status, None);
    }

    #[test]
    fn test_app_state_variants() {
        assert_eq!(AppState::Playing, AppState::Playing);
        assert_ne!(AppState::Playing, AppState::Results);

        let state = AppState::Results;
        assert_eq!(state.clone(), AppState::Results);
    }

    #[test]
    fn test_exit_type_debug() {
        assert_eq!(format!("{:?}", ExitType::Lobby), "Lobby");
        assert_eq!(format!("{:?}", ExitType::New), "New");
        assert_eq!(format!("{:?}", ExitType::Quit), "Quit");
    }

    #[test]
    fn test_tick_rate_constant() {
        // The engine counts whole seconds per tick
        assert_eq!(TICK_RATE_MS, 1000);

        const _: () = assert!(TICK_RATE_MS > 0);
    }

    #[test]
    fn test_get_game_events_ticks() {
        let (rx, ticker) = get_game_events();

        let result = rx.recv_timeout(Duration::from_millis(1500));
        match result {
            Ok(GameEvent::Tick) => {}
            Ok(_) => panic!("Expected tick event, got different event type"),
            Err(_) => {
                // Timeout is acceptable in test environment due to timing variations
            }
        }

        ticker.cancel();
        drop(rx);
    }

    #[test]
    fn test_ui_renders_play_view() {
        use ratatui::{backend::TestBackend, Terminal};

        let mut app = App::new(cli(2)).unwrap();

        let backend = TestBackend::new(80, 24);
        let mut terminal = Terminal::new(backend).unwrap();

        terminal.draw(|f| ui(&mut app, f)).unwrap();

        let buffer = terminal.backend().buffer();
        let content: String = buffer.content.iter().map(|c| c.symbol()).collect();
        assert!(content.contains("Runde 1 / 5"));
        assert!(content.contains("10s"));
        assert!(content.contains("Spieler 1"));
        assert!(content.contains("Opponent 2"));
    }

    #[test]
    fn test_ui_level_one_shows_total_time() {
        use ratatui::{backend::TestBackend, Terminal};

        let mut app = App::new(cli(1)).unwrap();

        let backend = TestBackend::new(80, 24);
        let mut terminal = Terminal::new(backend).unwrap();

        terminal.draw(|f| ui(&mut app, f)).unwrap();

        let buffer = terminal.backend().buffer();
        let content: String = buffer.content.iter().map(|c| c.symbol()).collect();
        assert!(content.contains("Gesamtzeit"));
        assert!(content.contains("60s"));
        assert!(!content.contains("Runde 1 /"));
    }

    #[test]
    fn test_ui_renders_results_view() {
        use ratatui::{backend::TestBackend, Terminal};

        let mut app = App::new(cli(1)).unwrap();
        app.duel.submit();
        app.drain_events();
        assert_eq!(app.state, AppState::Results);

        let backend = TestBackend::new(80, 24);
        let mut terminal = Terminal::new(backend).unwrap();

        terminal.draw(|f| ui(&mut app, f)).unwrap();

        let buffer = terminal.backend().buffer();
        let content: String = buffer.content.iter().map(|c| c.symbol()).collect();
        assert!(content.contains("Duell beendet"));
    }

    #[test]
    fn test_ui_marks_selected_options() {
        use ratatui::{backend::TestBackend, Terminal};

        let mut app = App::new(cli(2)).unwrap();
        app.toggle_by_number(1);

        let backend = TestBackend::new(80, 24);
        let mut terminal = Terminal::new(backend).unwrap();

        terminal.draw(|f| ui(&mut app, f)).unwrap();

        let buffer = terminal.backend().buffer();
        let content: String = buffer.content.iter().map(|c| c.symbol()).collect();
        assert!(content.contains("[x]"));
    }

    #[test]
    fn test_game_event_clone() {
        use crossterm::event::KeyEvent;

        let key_event = KeyEvent::new(KeyCode::Char('1'), KeyModifiers::NONE);
        let game_event = GameEvent::Key(key_event);
        let cloned_event = game_event.clone();

        match (game_event, cloned_event) {
            (GameEvent::Key(original), GameEvent::Key(cloned)) => {
                assert_eq!(original.code, cloned.code);
                assert_eq!(original.modifiers, cloned.modifiers);
            }
            _ => panic!("Events should match"),
        }
    }
}

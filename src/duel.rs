use std::collections::{HashSet, VecDeque};
use std::error::Error;
use std::fmt;

use crate::catalog::Question;
use crate::session::{LevelSettings, SessionConfig};
use crate::timer::Countdown;

/// Events produced by the engine for the surrounding view to consume. The
/// engine holds no reference to the terminal or navigation; it queues these
/// and the caller drains them with [`Duel::poll_event`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    RoundOutcome {
        round: u32,
        points: u32,
        message: String,
    },
    TimeExpired,
    ExitRequested,
    Finished {
        score: u32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Active,
    Ended,
}

/// One timed question-answer cycle. Lives for exactly one round; replaced on
/// advance, dropped on session end.
#[derive(Debug, Clone)]
pub struct Round {
    pub index: u32,
    pub question: Question,
    selected: HashSet<String>,
    submitted: bool,
}

impl Round {
    fn new(index: u32, question: Question) -> Self {
        Self {
            index,
            question,
            selected: HashSet::new(),
            submitted: false,
        }
    }
}

/// represents a duel session being played by the user
#[derive(Debug)]
pub struct Duel {
    pub config: SessionConfig,
    pub settings: LevelSettings,
    questions: Vec<Question>,
    round: Round,
    countdown: Countdown,
    score: u32,
    phase: Phase,
    events: VecDeque<SessionEvent>,
}

impl Duel {
    /// Validates the setup and starts round 1 with a fresh countdown. On any
    /// contract violation nothing is armed and an error comes back instead.
    pub fn new(config: SessionConfig, questions: Vec<Question>) -> Result<Self, SetupError> {
        let settings = config.level.settings();

        if questions.is_empty() {
            return Err(SetupError::NoQuestions);
        }
        if questions.len() < settings.total_rounds as usize {
            return Err(SetupError::NotEnoughQuestions {
                need: settings.total_rounds as usize,
                have: questions.len(),
            });
        }
        for (i, q) in questions.iter().enumerate() {
            let number = i + 1;
            if q.options.is_empty() {
                return Err(SetupError::MissingOptions { question: number });
            }
            if let Some(id) = q.duplicate_option_ids().into_iter().next() {
                return Err(SetupError::DuplicateOptionId {
                    question: number,
                    id,
                });
            }
            if q.correct.is_empty() {
                return Err(SetupError::NoCorrectAnswer { question: number });
            }
            if let Some(id) = q.correct.iter().find(|id| !q.has_option(id)) {
                return Err(SetupError::UnknownCorrectId {
                    question: number,
                    id: id.clone(),
                });
            }
        }

        let mut questions = questions;
        questions.truncate(settings.total_rounds as usize);

        let first = Round::new(1, questions[0].clone());
        Ok(Self {
            config,
            settings,
            questions,
            round: first,
            countdown: Countdown::start(settings.per_round_seconds),
            score: 0,
            phase: Phase::Active,
            events: VecDeque::new(),
        })
    }

    /// One second elapsed. Reaching zero forces submission of whatever is
    /// currently selected, exactly once.
    pub fn on_tick(&mut self) {
        if self.phase != Phase::Active {
            return;
        }
        if self.countdown.tick() {
            self.events.push_back(SessionEvent::TimeExpired);
            self.submit_round();
        }
    }

    /// Symmetric toggle of an answer option. Ignored after submission, after
    /// the session ended, and for ids the round does not offer.
    pub fn toggle_option(&mut self, id: &str) {
        if self.phase != Phase::Active || self.round.submitted {
            return;
        }
        if !self.round.question.has_option(id) {
            return;
        }
        if !self.round.selected.remove(id) {
            self.round.selected.insert(id.to_string());
        }
    }

    /// Manual submission via the submit action. The timeout path goes through
    /// the same routine, so the human/timer race scores at most once.
    pub fn submit(&mut self) {
        self.submit_round();
    }

    fn submit_round(&mut self) {
        if self.phase != Phase::Active || self.round.submitted {
            return;
        }
        self.round.submitted = true;
        self.countdown.cancel();

        let correct = self.round.selected == self.round.question.correct_ids();
        let points = if correct { 1 } else { 0 };
        self.score += points;
        self.events.push_back(SessionEvent::RoundOutcome {
            round: self.round.index,
            points,
            message: format!("Runde {}: {} Punkte erzielt", self.round.index, points),
        });

        if self.round.index < self.settings.total_rounds {
            self.start_round(self.round.index + 1);
        } else {
            self.phase = Phase::Ended;
            self.events
                .push_back(SessionEvent::Finished { score: self.score });
        }
    }

    fn start_round(&mut self, index: u32) {
        let question = self.questions[(index - 1) as usize].clone();
        self.round = Round::new(index, question);
        self.countdown = Countdown::start(self.settings.per_round_seconds);
    }

    /// Back-to-lobby. Stops the countdown, emits one exit signal, leaves the
    /// score as it is. No-op once the session is terminal.
    pub fn request_exit(&mut self) {
        if self.phase == Phase::Ended {
            return;
        }
        self.countdown.cancel();
        self.phase = Phase::Ended;
        self.events.push_back(SessionEvent::ExitRequested);
    }

    pub fn poll_event(&mut self) -> Option<SessionEvent> {
        self.events.pop_front()
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn has_ended(&self) -> bool {
        self.phase == Phase::Ended
    }

    pub fn round_index(&self) -> u32 {
        self.round.index
    }

    pub fn question(&self) -> &Question {
        &self.round.question
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.round.selected.contains(id)
    }

    pub fn selected_count(&self) -> usize {
        self.round.selected.len()
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.countdown.remaining()
    }

    /// Timer display, zero-padded to two digits ("09s").
    pub fn timer_label(&self) -> String {
        self.countdown.label()
    }

    /// "Runde i / n" while the level shows a round counter, otherwise None
    /// (level 1 renders the total time header instead).
    pub fn round_label(&self) -> Option<String> {
        if self.settings.show_round_counter {
            Some(format!(
                "Runde {} / {}",
                self.round.index, self.settings.total_rounds
            ))
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupError {
    NoQuestions,
    NotEnoughQuestions { need: usize, have: usize },
    MissingOptions { question: usize },
    DuplicateOptionId { question: usize, id: String },
    NoCorrectAnswer { question: usize },
    UnknownCorrectId { question: usize, id: String },
}

impl fmt::Display for SetupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetupError::NoQuestions => write!(f, "no questions supplied"),
            SetupError::NotEnoughQuestions { need, have } => {
                write!(f, "need {need} questions, got {have}")
            }
            SetupError::MissingOptions { question } => {
                write!(f, "question {question} has no answer options")
            }
            SetupError::DuplicateOptionId { question, id } => {
                write!(f, "question {question} repeats option id {id}")
            }
            SetupError::NoCorrectAnswer { question } => {
                write!(f, "question {question} marks no option as correct")
            }
            SetupError::UnknownCorrectId { question, id } => {
                write!(f, "question {question} marks unknown option {id} as correct")
            }
        }
    }
}

impl Error for SetupError {}

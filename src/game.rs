use tracing::debug;

use crate::clock::Clock;
use crate::error::QuizError;
use crate::leaderboard::{HighscoreEntry, Leaderboard, Scoreboard};
use crate::problem::{Problem, QuestionGenerator};
use crate::runtime::TickScheduler;
use crate::session::{AnswerOutcome, FinalStats, Phase, Session, SessionStats};
use crate::store::KvStore;

/// A finished round and whether it still waits for a name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinishedAttempt {
    pub stats: FinalStats,
    pub is_new_record: bool,
    pub saved: bool,
}

impl FinishedAttempt {
    pub fn awaiting_name(&self) -> bool {
        self.is_new_record && !self.saved
    }
}

/// Everything the presentation layer talks to
pub struct Game {
    session: Session,
    scoreboard: Scoreboard,
    last_result: Option<FinishedAttempt>,
}

impl Game {
    pub fn new(
        target_correct: u32,
        store: Box<dyn KvStore>,
        scheduler: Box<dyn TickScheduler>,
    ) -> Self {
        Self {
            session: Session::new(target_correct, scheduler),
            scoreboard: Scoreboard::load(store),
            last_result: None,
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.session = self.session.with_clock(clock);
        self.scoreboard = self.scoreboard.with_clock(clock);
        self
    }

    pub fn with_generator(mut self, generator: QuestionGenerator) -> Self {
        self.session = self.session.with_generator(generator);
        self
    }

    pub fn phase(&self) -> Phase {
        self.session.phase()
    }

    pub fn current_problem(&self) -> Option<&Problem> {
        self.session.current_problem()
    }

    pub fn stats(&self) -> &SessionStats {
        self.session.stats()
    }

    pub fn target_correct(&self) -> u32 {
        self.session.target_correct()
    }

    pub fn elapsed_display(&self) -> String {
        self.session.elapsed_display()
    }

    pub fn leaderboard(&self) -> &Leaderboard {
        self.scoreboard.leaderboard()
    }

    pub fn last_result(&self) -> Option<&FinishedAttempt> {
        self.last_result.as_ref()
    }

    /// Advances a fixed clock on both the session and the scoreboard
    pub fn advance_clock(&mut self, delta: chrono::Duration) {
        self.session.clock_mut().advance(delta);
        self.scoreboard.clock_mut().advance(delta);
    }

    pub fn start(&mut self) -> Result<&Problem, QuizError> {
        self.last_result = None;
        self.session.start()
    }

    pub fn submit_answer(&mut self, raw_input: &str) -> Result<AnswerOutcome, QuizError> {
        let outcome = self.session.submit_answer(raw_input)?;
        if let Some(stats) = outcome.finished {
            self.on_finished(stats);
        }
        Ok(outcome)
    }

    pub fn skip(&mut self) -> Result<AnswerOutcome, QuizError> {
        self.session.skip()
    }

    pub fn restart(&mut self) -> Result<(), QuizError> {
        self.session.restart()?;
        self.last_result = None;
        Ok(())
    }

    /// Saves the pending record under `name`
    pub fn record_attempt(&mut self, name: &str) -> Result<HighscoreEntry, QuizError> {
        let attempt = match self.last_result {
            Some(attempt) if self.phase() == Phase::Finished && attempt.awaiting_name() => attempt,
            _ => return Err(QuizError::NoPendingRecord),
        };

        let entry = self.scoreboard.record_attempt(
            name,
            attempt.stats.elapsed_millis,
            attempt.stats.correct_count,
            attempt.stats.wrong_count,
        )?;

        self.last_result = Some(FinishedAttempt {
            saved: true,
            ..attempt
        });
        Ok(entry)
    }

    fn on_finished(&mut self, stats: FinalStats) {
        let is_new_record = self.scoreboard.is_record_candidate(stats.elapsed_millis);
        debug!(is_new_record, "evaluated finished round");

        self.last_result = Some(FinishedAttempt {
            stats,
            is_new_record,
            saved: false,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leaderboard::LEADERBOARD_KEY;
    use crate::runtime::ManualTickScheduler;
    use crate::store::MemoryStore;
    use assert_matches::assert_matches;
    use chrono::{DateTime, Duration, Utc};

    fn test_game(target: u32, store: MemoryStore) -> (Game, ManualTickScheduler) {
        let scheduler = ManualTickScheduler::new();
        let start = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap();
        let game = Game::new(target, Box::new(store), Box::new(scheduler.clone()))
            .with_clock(Clock::fixed(start))
            .with_generator(QuestionGenerator::seeded(11));
        (game, scheduler)
    }

    fn play_round(game: &mut Game, wrong: u32, millis: i64) {
        game.start().unwrap();
        for _ in 0..wrong {
            game.skip().unwrap();
        }
        game.advance_clock(Duration::milliseconds(millis));
        while game.phase() == Phase::Running {
            let expected = game.current_problem().unwrap().expected();
            game.submit_answer(&expected.to_string()).unwrap();
        }
    }

    #[test]
    fn test_finished_round_on_empty_board_is_record() {
        let (mut game, scheduler) = test_game(20, MemoryStore::new());

        play_round(&mut game, 2, 65_000);

        let attempt = game.last_result().copied().unwrap();
        assert_eq!(attempt.stats.elapsed_millis, 65_000);
        assert!(attempt.is_new_record);
        assert!(attempt.awaiting_name());
        assert_eq!(scheduler.active(), 0);

        let entry = game.record_attempt("Ana").unwrap();
        assert_eq!(entry.accuracy_percent, 91);
        assert_eq!(entry.time_string, "01:05");
        assert_eq!(game.leaderboard().entries(), &[entry]);
        assert!(!game.last_result().unwrap().awaiting_name());
    }

    #[test]
    fn test_record_cannot_be_saved_twice() {
        let (mut game, _) = test_game(1, MemoryStore::new());
        play_round(&mut game, 0, 1_000);

        game.record_attempt("Ana").unwrap();
        assert_matches!(game.record_attempt("Ana"), Err(QuizError::NoPendingRecord));
        assert_eq!(game.leaderboard().len(), 1);
    }

    #[test]
    fn test_blank_name_keeps_record_pending() {
        let store = MemoryStore::new();
        let (mut game, _) = test_game(1, store.clone());
        play_round(&mut game, 0, 1_000);

        assert_matches!(game.record_attempt("  "), Err(QuizError::InvalidName));
        assert!(game.leaderboard().is_empty());
        assert_eq!(store.get(LEADERBOARD_KEY).unwrap(), None);
        assert!(game.last_result().unwrap().awaiting_name());

        game.record_attempt("Ana").unwrap();
        assert_eq!(game.leaderboard().len(), 1);
    }

    #[test]
    fn test_slow_round_on_full_board_is_not_record() {
        let store = MemoryStore::new();
        let (mut game, _) = test_game(1, store.clone());
        for (name, millis) in [("a", 10_000), ("b", 20_000), ("c", 30_000)] {
            play_round(&mut game, 0, millis);
            game.record_attempt(name).unwrap();
        }

        play_round(&mut game, 0, 45_000);

        assert!(!game.last_result().unwrap().is_new_record);
        assert_matches!(game.record_attempt("slow"), Err(QuizError::NoPendingRecord));
        assert_eq!(game.leaderboard().len(), 3);
    }

    #[test]
    fn test_record_requires_finished_round() {
        let (mut game, _) = test_game(20, MemoryStore::new());
        assert_matches!(game.record_attempt("Ana"), Err(QuizError::NoPendingRecord));

        game.start().unwrap();
        assert_matches!(game.record_attempt("Ana"), Err(QuizError::NoPendingRecord));
    }

    #[test]
    fn test_restart_keeps_leaderboard() {
        let (mut game, _) = test_game(1, MemoryStore::new());
        play_round(&mut game, 1, 2_000);
        game.record_attempt("Ana").unwrap();

        game.restart().unwrap();

        assert_eq!(game.phase(), Phase::Idle);
        assert!(game.last_result().is_none());
        assert_eq!(game.stats().total_answered(), 0);
        assert_eq!(game.elapsed_display(), "00:00");
        assert_eq!(game.leaderboard().len(), 1);
    }

    #[test]
    fn test_leaderboard_loaded_from_store() {
        let store = MemoryStore::new();
        {
            let (mut game, _) = test_game(1, store.clone());
            play_round(&mut game, 0, 3_000);
            game.record_attempt("Ana").unwrap();
        }

        let (game, _) = test_game(1, store);
        assert_eq!(game.leaderboard().entries()[0].name, "Ana");
    }

    #[test]
    fn test_invalid_input_passes_through() {
        let (mut game, _) = test_game(20, MemoryStore::new());
        game.start().unwrap();

        assert_matches!(game.submit_answer("abc"), Err(QuizError::InvalidInput { .. }));
        assert_eq!(game.stats().total_answered(), 0);
    }
}

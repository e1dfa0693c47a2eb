use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::clock::{millis_between, Clock};
use crate::error::QuizError;
use crate::problem::{Problem, QuestionGenerator};
use crate::runtime::{TickHandle, TickScheduler, TICK_PERIOD};
use crate::util::{accuracy_percent, format_mm_ss, parse_leading_int};

/// Correct answers needed to finish a round unless configured otherwise
pub const DEFAULT_TARGET_CORRECT: u32 = 20;

/// Coarse lifecycle stage of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Phase {
    Idle,
    Running,
    Finished,
}

impl Phase {
    pub fn can_transition_to(self, to: Phase) -> bool {
        matches!(
            (self, to),
            (Phase::Idle, Phase::Running)
                | (Phase::Finished, Phase::Running)
                | (Phase::Running, Phase::Finished)
                | (Phase::Finished, Phase::Idle)
        )
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SessionStats {
    pub correct_count: u32,
    pub wrong_count: u32,
    pub started_at: Option<DateTime<Utc>>,
}

impl SessionStats {
    pub fn total_answered(&self) -> u32 {
        self.correct_count + self.wrong_count
    }
}

/// Result of a completed round, handed to the scoreboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinalStats {
    pub elapsed_millis: u64,
    pub correct_count: u32,
    pub wrong_count: u32,
}

impl FinalStats {
    pub fn total_answered(&self) -> u32 {
        self.correct_count + self.wrong_count
    }

    pub fn accuracy_percent(&self) -> u8 {
        accuracy_percent(self.correct_count, self.wrong_count).unwrap_or(0)
    }

    pub fn time_string(&self) -> String {
        format_mm_ss(self.elapsed_millis)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Correct,
    Wrong,
    Skipped,
}

/// What happened to the problem that was on screen
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerOutcome {
    pub verdict: Verdict,
    pub problem: Problem,
    pub finished: Option<FinalStats>,
}

impl AnswerOutcome {
    pub fn feedback(&self) -> String {
        let p = &self.problem;
        match self.verdict {
            Verdict::Correct => "Correct! 🎉".to_string(),
            Verdict::Wrong => format!("Wrong! {} = {}", p, p.expected()),
            Verdict::Skipped => format!("Skipped! {} = {}", p, p.expected()),
        }
    }

    pub fn is_correct(&self) -> bool {
        self.verdict == Verdict::Correct
    }
}

/// One player's quiz: problems, counters, phase and timing
pub struct Session {
    phase: Phase,
    current_problem: Option<Problem>,
    stats: SessionStats,
    target_correct: u32,
    generator: QuestionGenerator,
    clock: Clock,
    scheduler: Box<dyn TickScheduler>,
    tick: Option<Box<dyn TickHandle>>,
    final_stats: Option<FinalStats>,
}

impl Session {
    pub fn new(target_correct: u32, scheduler: Box<dyn TickScheduler>) -> Self {
        Self {
            phase: Phase::Idle,
            current_problem: None,
            stats: SessionStats::default(),
            target_correct: target_correct.max(1),
            generator: QuestionGenerator::new(),
            clock: Clock::System,
            scheduler,
            tick: None,
            final_stats: None,
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_generator(mut self, generator: QuestionGenerator) -> Self {
        self.generator = generator;
        self
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn current_problem(&self) -> Option<&Problem> {
        self.current_problem.as_ref()
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn target_correct(&self) -> u32 {
        self.target_correct
    }

    pub fn final_stats(&self) -> Option<&FinalStats> {
        self.final_stats.as_ref()
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut Clock {
        &mut self.clock
    }

    pub fn is_ticking(&self) -> bool {
        self.tick.is_some()
    }

    /// Live while running, frozen once finished, zero when idle
    pub fn elapsed_millis(&self) -> u64 {
        match (self.phase, self.stats.started_at) {
            (Phase::Running, Some(start)) => millis_between(start, self.clock.now()),
            (Phase::Finished, _) => self.final_stats.map_or(0, |s| s.elapsed_millis),
            _ => 0,
        }
    }

    pub fn elapsed_display(&self) -> String {
        format_mm_ss(self.elapsed_millis())
    }

    pub fn start(&mut self) -> Result<&Problem, QuizError> {
        self.transition(Phase::Running)?;

        self.stats = SessionStats {
            started_at: Some(self.clock.now()),
            ..SessionStats::default()
        };
        self.final_stats = None;
        self.tick = Some(self.scheduler.schedule(TICK_PERIOD));

        Ok(self.next_problem())
    }

    pub fn submit_answer(&mut self, raw_input: &str) -> Result<AnswerOutcome, QuizError> {
        let problem = self.running_problem("submit_answer")?;

        let answer = parse_leading_int(raw_input).ok_or_else(|| QuizError::InvalidInput {
            input: raw_input.to_string(),
        })?;

        if problem.is_answered_by(answer) {
            self.stats.correct_count = self.stats.correct_count.saturating_add(1);
            debug!(correct = self.stats.correct_count, %problem, "correct answer");

            if self.stats.correct_count >= self.target_correct {
                let final_stats = self.finish()?;
                return Ok(AnswerOutcome {
                    verdict: Verdict::Correct,
                    problem,
                    finished: Some(final_stats),
                });
            }

            self.next_problem();
            Ok(AnswerOutcome {
                verdict: Verdict::Correct,
                problem,
                finished: None,
            })
        } else {
            self.stats.wrong_count = self.stats.wrong_count.saturating_add(1);
            debug!(wrong = self.stats.wrong_count, %problem, answer, "wrong answer");

            self.next_problem();
            Ok(AnswerOutcome {
                verdict: Verdict::Wrong,
                problem,
                finished: None,
            })
        }
    }

    pub fn skip(&mut self) -> Result<AnswerOutcome, QuizError> {
        let problem = self.running_problem("skip")?;

        self.stats.wrong_count = self.stats.wrong_count.saturating_add(1);
        debug!(wrong = self.stats.wrong_count, %problem, "skipped");

        self.next_problem();
        Ok(AnswerOutcome {
            verdict: Verdict::Skipped,
            problem,
            finished: None,
        })
    }

    pub fn restart(&mut self) -> Result<(), QuizError> {
        self.transition(Phase::Idle)?;

        self.stats = SessionStats::default();
        self.current_problem = None;
        self.final_stats = None;
        Ok(())
    }

    fn finish(&mut self) -> Result<FinalStats, QuizError> {
        self.transition(Phase::Finished)?;

        if let Some(mut tick) = self.tick.take() {
            tick.cancel();
        }

        let elapsed_millis = self
            .stats
            .started_at
            .map_or(0, |start| millis_between(start, self.clock.now()));

        let final_stats = FinalStats {
            elapsed_millis,
            correct_count: self.stats.correct_count,
            wrong_count: self.stats.wrong_count,
        };
        self.final_stats = Some(final_stats);
        self.current_problem = None;

        info!(
            time = %final_stats.time_string(),
            correct = final_stats.correct_count,
            wrong = final_stats.wrong_count,
            "round finished"
        );
        Ok(final_stats)
    }

    /// The only place `phase` changes
    fn transition(&mut self, to: Phase) -> Result<(), QuizError> {
        if !self.phase.can_transition_to(to) {
            return Err(QuizError::InvalidPhaseTransition {
                from: self.phase,
                to,
            });
        }

        debug!(from = %self.phase, to = %to, "phase transition");
        self.phase = to;
        Ok(())
    }

    fn running_problem(&self, operation: &'static str) -> Result<Problem, QuizError> {
        match (self.phase, self.current_problem) {
            (Phase::Running, Some(problem)) => Ok(problem),
            (phase, _) => Err(QuizError::WrongPhase { operation, phase }),
        }
    }

    fn next_problem(&mut self) -> &Problem {
        self.current_problem.insert(self.generator.generate())
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(mut tick) = self.tick.take() {
            tick.cancel();
        }
    }
}

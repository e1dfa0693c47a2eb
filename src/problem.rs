use rand::{rngs::StdRng, Rng, SeedableRng};
use std::fmt;
use std::ops::RangeInclusive;

/// Inclusive range both operands are drawn from
pub const OPERAND_RANGE: RangeInclusive<i64> = 2..=9;

/// A single multiplication question
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Problem {
    operand_a: i64,
    operand_b: i64,
    expected: i64,
}

impl Problem {
    pub fn new(operand_a: i64, operand_b: i64) -> Self {
        Self {
            operand_a,
            operand_b,
            expected: operand_a * operand_b,
        }
    }

    pub fn operand_a(&self) -> i64 {
        self.operand_a
    }

    pub fn operand_b(&self) -> i64 {
        self.operand_b
    }

    pub fn expected(&self) -> i64 {
        self.expected
    }

    pub fn is_answered_by(&self, answer: i64) -> bool {
        answer == self.expected
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} × {}", self.operand_a, self.operand_b)
    }
}

/// Produces problems with operands drawn uniformly from [`OPERAND_RANGE`]
#[derive(Debug)]
pub struct QuestionGenerator {
    rng: StdRng,
}

impl QuestionGenerator {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic generator, used by tests
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn generate(&mut self) -> Problem {
        let a = self.rng.gen_range(OPERAND_RANGE);
        let b = self.rng.gen_range(OPERAND_RANGE);
        Problem::new(a, b)
    }
}

impl Default for QuestionGenerator {
    fn default() -> Self {
        Self::new()
    }
}

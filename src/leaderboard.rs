use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::clock::Clock;
use crate::error::{QuizError, StoreError};
use crate::store::KvStore;
use crate::util::{accuracy_percent, format_mm_ss};

/// Storage key of the persisted leaderboard blob
pub const LEADERBOARD_KEY: &str = "multiplicationHighscores";

/// Number of ranked entries kept
pub const LEADERBOARD_SIZE: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HighscoreEntry {
    pub name: String,
    #[serde(alias = "time")]
    pub elapsed_millis: u64,
    pub time_string: String,
    #[serde(alias = "accuracy")]
    pub accuracy_percent: u8,
    pub date: String,
}

/// Best attempts, fastest first, never more than [`LEADERBOARD_SIZE`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Leaderboard {
    entries: Vec<HighscoreEntry>,
}

impl Leaderboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sorts and truncates arbitrary entries into a valid board
    pub fn from_entries(entries: Vec<HighscoreEntry>) -> Self {
        let mut board = Self::new();
        for entry in entries {
            board.insert(entry);
        }
        board
    }

    pub fn entries(&self) -> &[HighscoreEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True while the board has room or `elapsed_millis` beats the last place
    pub fn is_record_candidate(&self, elapsed_millis: u64) -> bool {
        if self.entries.len() < LEADERBOARD_SIZE {
            return true;
        }
        self.entries
            .get(LEADERBOARD_SIZE - 1)
            .is_some_and(|last| elapsed_millis < last.elapsed_millis)
    }

    /// Adds an entry, keeping ties in insertion order
    pub fn insert(&mut self, entry: HighscoreEntry) {
        self.entries.push(entry);
        self.entries.sort_by_key(|e| e.elapsed_millis);
        self.entries.truncate(LEADERBOARD_SIZE);
    }

    /// 1-based rank of an entry equal to `entry`, if it made the board
    pub fn rank_of(&self, entry: &HighscoreEntry) -> Option<usize> {
        self.entries.iter().position(|e| e == entry).map(|i| i + 1)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.entries)
    }

    /// Parses a persisted blob; `None` when it is not a list of entries
    pub fn from_json(blob: &str) -> Option<Self> {
        serde_json::from_str::<Vec<HighscoreEntry>>(blob)
            .ok()
            .map(Self::from_entries)
    }
}

/// Leaderboard bound to a key-value store, persisted after every change
pub struct Scoreboard {
    board: Leaderboard,
    store: Box<dyn KvStore>,
    clock: Clock,
}

impl Scoreboard {
    /// Loads the board from `store`, starting empty on any failure
    pub fn load(store: Box<dyn KvStore>) -> Self {
        let board = match store.get(LEADERBOARD_KEY) {
            Ok(Some(blob)) => Leaderboard::from_json(&blob).unwrap_or_else(|| {
                warn!("stored leaderboard is malformed, starting empty");
                Leaderboard::new()
            }),
            Ok(None) => Leaderboard::new(),
            Err(e) => {
                warn!(error = %e, "could not read leaderboard, starting empty");
                Leaderboard::new()
            }
        };

        Self {
            board,
            store,
            clock: Clock::System,
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn clock_mut(&mut self) -> &mut Clock {
        &mut self.clock
    }

    pub fn leaderboard(&self) -> &Leaderboard {
        &self.board
    }

    pub fn is_record_candidate(&self, elapsed_millis: u64) -> bool {
        self.board.is_record_candidate(elapsed_millis)
    }

    pub fn record_attempt(
        &mut self,
        name: &str,
        elapsed_millis: u64,
        correct_count: u32,
        wrong_count: u32,
    ) -> Result<HighscoreEntry, QuizError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(QuizError::InvalidName);
        }

        let entry = HighscoreEntry {
            name: name.to_string(),
            elapsed_millis,
            time_string: format_mm_ss(elapsed_millis),
            accuracy_percent: accuracy_percent(correct_count, wrong_count).unwrap_or(0),
            date: self.clock.local_date(),
        };

        self.board.insert(entry.clone());
        self.persist();

        info!(
            rank = self.board.rank_of(&entry),
            name = %entry.name,
            time = %entry.time_string,
            accuracy = entry.accuracy_percent,
            "recorded attempt"
        );
        Ok(entry)
    }

    fn persist(&self) {
        let result = self
            .board
            .to_json()
            .map_err(StoreError::from)
            .and_then(|blob| self.store.set(LEADERBOARD_KEY, &blob));

        if let Err(e) = result {
            warn!(error = %e, "could not save leaderboard");
        }
    }
}

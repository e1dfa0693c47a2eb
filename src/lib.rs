// Library surface for the quiz core, shared by the TUI binary and integration tests.
// Keep this free of terminal rendering; that lives in the binary.
pub mod app_dirs;
pub mod clock;
pub mod config;
pub mod error;
pub mod game;
pub mod leaderboard;
pub mod problem;
pub mod runtime;
pub mod session;
pub mod store;
pub mod util;

pub use error::{QuizError, StoreError};
pub use game::{FinishedAttempt, Game};
pub use session::Phase;

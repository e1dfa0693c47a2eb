use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEvent, KeyEventKind};

/// Period of the elapsed-time tick while a round is running
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Everything the TUI loop reacts to. `Tick` only flows while a round is
/// running; `Pulse` is the runner timing out and drives feedback expiry.
#[derive(Clone, Debug)]
pub enum QuizEvent {
    Key(KeyEvent),
    Resize,
    /// Elapsed-time tick from a scheduled [`TickHandle`]
    Tick,
    /// No event arrived within the runner's interval
    Pulse,
}

/// Queue the runner drains: terminal input plus scheduled round ticks
pub trait QuizEventSource: Send + 'static {
    /// Err(Timeout) when nothing was queued within `timeout`
    fn recv_timeout(&self, timeout: Duration) -> Result<QuizEvent, RecvTimeoutError>;
}

/// Reads crossterm input on a background thread; tick schedulers share its queue via [`Self::sender`]
pub struct CrosstermEventSource {
    tx: Sender<QuizEvent>,
    rx: Receiver<QuizEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        let keys = tx.clone();

        thread::spawn(move || loop {
            match event::read() {
                // Windows reports both press and release
                Ok(CtEvent::Key(key)) if key.kind != KeyEventKind::Release => {
                    if keys.send(QuizEvent::Key(key)).is_err() {
                        break;
                    }
                }
                Ok(CtEvent::Resize(_, _)) => {
                    if keys.send(QuizEvent::Resize).is_err() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(_) => break,
            }
        });

        Self { tx, rx }
    }

    /// Sender feeding the same queue, for tick schedulers
    pub fn sender(&self) -> Sender<QuizEvent> {
        self.tx.clone()
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl QuizEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<QuizEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// How long the runner waits before reporting a `Pulse`
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Channel-fed source for driving a game without a terminal
pub struct TestEventSource {
    rx: Receiver<QuizEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<QuizEvent>) -> Self {
        Self { rx }
    }
}

impl QuizEventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<QuizEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Hands the TUI loop one event per call
pub struct Runner<E: QuizEventSource, T: Ticker> {
    event_source: E,
    ticker: T,
}

impl<E: QuizEventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
        }
    }

    /// A closed queue also reads as `Pulse`, so the loop keeps redrawing
    pub fn step(&self) -> QuizEvent {
        match self.event_source.recv_timeout(self.ticker.interval()) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                QuizEvent::Pulse
            }
        }
    }
}

/// A running repeating tick; stops for good once cancelled
pub trait TickHandle {
    fn cancel(&mut self);
    fn is_cancelled(&self) -> bool;
}

/// Starts repeating tick tasks for the session
pub trait TickScheduler {
    fn schedule(&self, period: Duration) -> Box<dyn TickHandle>;
}

/// Spawns a thread that pushes [`QuizEvent::Tick`] into an event channel
#[derive(Debug, Clone)]
pub struct ChannelTickScheduler {
    tx: Sender<QuizEvent>,
}

impl ChannelTickScheduler {
    pub fn new(tx: Sender<QuizEvent>) -> Self {
        Self { tx }
    }
}

impl TickScheduler for ChannelTickScheduler {
    fn schedule(&self, period: Duration) -> Box<dyn TickHandle> {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);
        let tx = self.tx.clone();

        thread::spawn(move || loop {
            thread::sleep(period);
            if flag.load(Ordering::SeqCst) || tx.send(QuizEvent::Tick).is_err() {
                break;
            }
        });

        Box::new(ThreadTickHandle { stop })
    }
}

struct ThreadTickHandle {
    stop: Arc<AtomicBool>,
}

impl TickHandle for ThreadTickHandle {
    fn cancel(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    fn is_cancelled(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }
}

impl Drop for ThreadTickHandle {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
    }
}

/// Scheduler that only counts schedules and cancellations
#[derive(Debug, Clone, Default)]
pub struct ManualTickScheduler {
    scheduled: Arc<AtomicUsize>,
    cancelled: Arc<AtomicUsize>,
}

impl ManualTickScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scheduled(&self) -> usize {
        self.scheduled.load(Ordering::SeqCst)
    }

    pub fn cancelled(&self) -> usize {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Ticks scheduled and not yet cancelled
    pub fn active(&self) -> usize {
        self.scheduled() - self.cancelled()
    }
}

impl TickScheduler for ManualTickScheduler {
    fn schedule(&self, _period: Duration) -> Box<dyn TickHandle> {
        self.scheduled.fetch_add(1, Ordering::SeqCst);
        Box::new(ManualTickHandle {
            cancelled: Arc::clone(&self.cancelled),
            done: false,
        })
    }
}

struct ManualTickHandle {
    cancelled: Arc<AtomicUsize>,
    done: bool,
}

impl TickHandle for ManualTickHandle {
    fn cancel(&mut self) {
        if !self.done {
            self.done = true;
            self.cancelled.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn is_cancelled(&self) -> bool {
        self.done
    }
}

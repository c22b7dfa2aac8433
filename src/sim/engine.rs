/// The game engine: owns the level, grid, cursor, path, score and
/// countdown, and applies every transition rule.
///
/// ## Phases
///   Playing ──wrong──▶ MistakeFlash ──▶ Playing (reset unless bottom row)
///   Playing ──timeout─▶ TimeExpiredFlash ──▶ Playing (same path, 30s)
///   Playing ──row 0──▶ LevelCompleteCelebration ──▶ LevelTransitionOverlay ──▶ Playing (next level)
///
/// Every phase other than Playing locks input. Phase ends are deferred
/// callbacks on the engine's scheduler, stamped with the attempt
/// generation; anything that supersedes an attempt bumps the generation
/// and cancels what it replaced.
///
/// The engine never reads wall time. The host feeds elapsed time into
/// `update`, and commands plus `update` return the events they caused.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::domain::grid::{bottom_row, cols_for_level, Coord, SafePath, VisitedSet, ROWS};
use crate::domain::path::{PathSource, RandomPaths};
use crate::domain::reward;
use super::event::{GameEvent, ResetCause};
use super::schedule::{Handle, Scheduler};
use super::snapshot::{Overlay, Snapshot};
use super::timer::{LevelTimer, TimerSignal};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Playing,
    MistakeFlash,
    TimeExpiredFlash,
    LevelCompleteCelebration,
    LevelTransitionOverlay,
}

/// Durations for every timed part of the game.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Timing {
    pub level_seconds: u32,
    pub mistake_flash_ms: u64,
    pub expiry_penalty_ms: u64,
    pub blink_interval_ms: u64,
    pub celebration_ms: u64,
    pub overlay_ms: u64,
}

impl Default for Timing {
    fn default() -> Self {
        Timing {
            level_seconds: 30,
            mistake_flash_ms: 300,
            expiry_penalty_ms: 3000,
            blink_interval_ms: 200,
            celebration_ms: 2000,
            overlay_ms: 1100,
        }
    }
}

/// Scheduled re-entries into the state machine.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Deferred {
    /// Carries the timer generation, not the attempt generation.
    TimerTick(u64),
    MistakeFlashEnd(u64),
    ExpiryPenaltyEnd(u64),
    BlinkToggle(u64),
    OverlayDismiss(u64),
}

/// Celebration progress.
#[derive(Clone, Copy, Debug)]
struct Blink {
    on: bool,
    elapsed_ms: u64,
}

/// Reward computed at the moment the top row is confirmed,
/// shown once the blink finishes.
#[derive(Clone, Debug)]
struct Cleared {
    headline: &'static str,
    flawless: bool,
}

pub struct GameEngine {
    timing: Timing,
    paths: Box<dyn PathSource>,
    rng: StdRng,
    sched: Scheduler<Deferred>,
    timer: LevelTimer,
    /// Handles of non-timer callbacks that may still be queued.
    pending: Vec<Handle>,
    generation: u64,

    phase: Phase,
    level: u32,
    cols: usize,
    path: SafePath,
    visited: VisitedSet,
    cursor: Coord,
    mistakes_in_level: u32,
    score: u32,
    start_row_safe_col: Option<usize>,

    wrong_flash: Option<Coord>,
    blink: Option<Blink>,
    cleared: Option<Cleared>,
    overlay: Option<Overlay>,
    status: String,
}

impl GameEngine {
    /// Engine with random paths. `seed` makes paths and messages reproducible.
    pub fn new(timing: Timing, seed: Option<u64>) -> Self {
        let mut rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        let paths = RandomPaths::new(StdRng::seed_from_u64(rng.gen()));
        Self::with_paths(timing, Box::new(paths), rng)
    }

    pub fn with_paths(timing: Timing, paths: Box<dyn PathSource>, rng: StdRng) -> Self {
        let level_seconds = timing.level_seconds;
        let mut engine = GameEngine {
            timing,
            paths,
            rng,
            sched: Scheduler::new(),
            timer: LevelTimer::new(level_seconds),
            pending: Vec::new(),
            generation: 0,
            phase: Phase::Playing,
            level: 1,
            cols: cols_for_level(1),
            path: SafePath::from_cols([0; ROWS]),
            visited: VisitedSet::new(),
            cursor: Coord::new(bottom_row(), 0),
            mistakes_in_level: 0,
            score: 0,
            start_row_safe_col: None,
            wrong_flash: None,
            blink: None,
            cleared: None,
            overlay: None,
            status: String::new(),
        };
        let mut events = Vec::new();
        engine.start_level(1, &mut events);
        engine
    }

    // ── Queries ──

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn input_locked(&self) -> bool {
        self.phase != Phase::Playing
    }

    /// Known bottom-row answer under the cursor, not yet confirmed
    /// this attempt. Lateral moves are suppressed while this holds.
    pub fn bottom_locked(&self) -> bool {
        self.cursor.row == bottom_row()
            && self.start_row_safe_col == Some(self.cursor.col)
            && !self.visited.contains(self.cursor)
    }

    pub fn snapshot(&self) -> Snapshot {
        let blinking = match self.blink {
            Some(_) => self.path.cells().collect(),
            None => Vec::new(),
        };
        Snapshot {
            phase: self.phase,
            level: self.level,
            rows: ROWS,
            cols: self.cols,
            cursor: self.cursor,
            visited: self.visited.cells().collect(),
            wrong_flash: self.wrong_flash,
            blinking,
            blink_on: self.blink.map_or(false, |b| b.on),
            input_locked: self.input_locked(),
            remaining_seconds: self.timer.remaining(),
            timer_bucket: self.timer.bucket(),
            timer_flashing: self.timer.is_expired(),
            mistakes_in_level: self.mistakes_in_level,
            score: self.score,
            status: self.status.clone(),
            overlay: self.overlay.clone(),
        }
    }

    // ── Commands ──

    pub fn move_left(&mut self) {
        if self.input_locked() || self.bottom_locked() {
            return;
        }
        self.cursor.col = self.cursor.col.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        if self.input_locked() || self.bottom_locked() {
            return;
        }
        self.cursor.col = (self.cursor.col + 1).min(self.cols - 1);
    }

    pub fn move_up(&mut self) {
        if self.input_locked() {
            return;
        }
        if self.visited.row_cleared(self.cursor.row) && self.cursor.row > 0 {
            self.cursor.row -= 1;
        }
    }

    /// Select the cell under the cursor.
    pub fn select_cell(&mut self) -> Vec<GameEvent> {
        let at = self.cursor;
        self.select_cell_at(at.row, at.col)
    }

    /// Direct tap on a cell. Only the active row accepts taps.
    pub fn select_cell_at(&mut self, row: usize, col: usize) -> Vec<GameEvent> {
        let mut events = Vec::new();
        if self.input_locked() || row != self.cursor.row || col >= self.cols {
            return events;
        }
        if col != self.cursor.col {
            if self.bottom_locked() {
                return events;
            }
            self.cursor.col = col;
        }

        let at = self.cursor;
        if self.path.contains(at) {
            self.accept(at, &mut events);
        } else {
            self.reject(at, &mut events);
        }
        events
    }

    /// Advance the engine clock, firing every callback that falls due.
    pub fn update(&mut self, elapsed: Duration) -> Vec<GameEvent> {
        let mut events = Vec::new();
        let until = self.sched.now_ms() + elapsed.as_millis() as u64;
        while let Some(action) = self.sched.pop_due(until) {
            self.fire(action, &mut events);
        }
        self.sched.advance_to(until);
        events
    }

    // ── Selection outcomes ──

    fn accept(&mut self, at: Coord, events: &mut Vec<GameEvent>) {
        log::debug!("level {}: correct ({}, {})", self.level, at.row, at.col);
        events.push(GameEvent::CorrectGuess { row: at.row, col: at.col });
        if at.row == bottom_row() {
            self.start_row_safe_col = Some(at.col);
        }
        self.visited.insert(at);
        if at.row == 0 {
            self.begin_level_complete(events);
        } else {
            self.cursor.row -= 1;
        }
    }

    fn reject(&mut self, at: Coord, events: &mut Vec<GameEvent>) {
        self.mistakes_in_level += 1;
        log::debug!(
            "level {}: wrong ({}, {}), {} mistakes",
            self.level, at.row, at.col, self.mistakes_in_level
        );
        events.push(GameEvent::WrongGuess { row: at.row, col: at.col });
        self.wrong_flash = Some(at);
        self.phase = Phase::MistakeFlash;
        let gen = self.generation;
        self.defer(self.timing.mistake_flash_ms, Deferred::MistakeFlashEnd(gen));
    }

    // ── Deferred handling ──

    fn fire(&mut self, action: Deferred, events: &mut Vec<GameEvent>) {
        match action {
            Deferred::TimerTick(timer_gen) => {
                let signal = self.timer.on_tick(&mut self.sched, timer_gen, Deferred::TimerTick);
                if signal == Some(TimerSignal::Expired) {
                    self.begin_expiry(events);
                }
            }
            Deferred::MistakeFlashEnd(gen) if self.is_current(gen, Phase::MistakeFlash) => {
                let flashed = self.wrong_flash.take();
                self.phase = Phase::Playing;
                if flashed.map_or(false, |c| c.row != bottom_row()) {
                    self.reset_attempt(ResetCause::Mistake, events);
                }
            }
            Deferred::ExpiryPenaltyEnd(gen) if self.is_current(gen, Phase::TimeExpiredFlash) => {
                self.status.clear();
                self.reset_attempt(ResetCause::TimeExpired, events);
                self.start_timer();
                self.phase = Phase::Playing;
            }
            Deferred::BlinkToggle(gen) if self.is_current(gen, Phase::LevelCompleteCelebration) => {
                self.step_blink();
            }
            Deferred::OverlayDismiss(gen) if self.is_current(gen, Phase::LevelTransitionOverlay) => {
                let next = self.level + 1;
                self.start_level(next, events);
            }
            stale => log::trace!("dropping stale {:?}", stale),
        }
    }

    fn is_current(&self, gen: u64, phase: Phase) -> bool {
        gen == self.generation && self.phase == phase
    }

    fn defer(&mut self, delay_ms: u64, action: Deferred) {
        let sched = &self.sched;
        self.pending.retain(|h| sched.is_pending(*h));
        let handle = self.sched.schedule(delay_ms, action);
        self.pending.push(handle);
    }

    /// Cancel every non-timer callback and invalidate anything that
    /// slips through.
    fn supersede(&mut self) {
        for handle in self.pending.drain(..) {
            self.sched.cancel(handle);
        }
        self.generation += 1;
    }

    fn start_timer(&mut self) {
        self.timer.start(&mut self.sched, self.timing.level_seconds, Deferred::TimerTick);
    }

    // ── Expiry ──

    fn begin_expiry(&mut self, events: &mut Vec<GameEvent>) {
        log::info!("level {}: time expired", self.level);
        self.supersede();
        self.wrong_flash = None;
        self.phase = Phase::TimeExpiredFlash;
        self.status = "Time's up!".to_string();
        events.push(GameEvent::TimeExpired);
        let gen = self.generation;
        self.defer(self.timing.expiry_penalty_ms, Deferred::ExpiryPenaltyEnd(gen));
    }

    /// Retry the same path from the bottom row.
    fn reset_attempt(&mut self, cause: ResetCause, events: &mut Vec<GameEvent>) {
        self.supersede();
        self.visited.clear();
        self.wrong_flash = None;
        self.cursor = Coord::new(bottom_row(), self.start_row_safe_col.unwrap_or(0));
        log::debug!("level {}: attempt reset ({:?})", self.level, cause);
        events.push(GameEvent::AttemptReset { cause });
    }

    // ── Level completion ──

    fn begin_level_complete(&mut self, events: &mut Vec<GameEvent>) {
        self.supersede();
        self.phase = Phase::LevelCompleteCelebration;

        let flawless = self.mistakes_in_level == 0;
        let category = reward::pick_category(self.timer.remaining(), self.mistakes_in_level);
        let headline = reward::pick_message(category, &mut self.rng);
        let delta = reward::score_delta(self.level, flawless);
        self.score += delta;
        self.timer.cancel(&mut self.sched);

        self.status = if flawless {
            format!("+{delta} pts (Flawless!)")
        } else {
            format!("+{delta} pts")
        };
        log::info!(
            "level {} cleared: +{} ({} mistakes, {}s left), score {}",
            self.level, delta, self.mistakes_in_level, self.timer.remaining(), self.score
        );
        events.push(GameEvent::LevelComplete { level: self.level, delta, flawless });

        self.cleared = Some(Cleared { headline, flawless });
        self.blink = Some(Blink { on: true, elapsed_ms: 0 });
        let gen = self.generation;
        self.defer(self.timing.blink_interval_ms, Deferred::BlinkToggle(gen));
    }

    fn step_blink(&mut self) {
        let interval = self.timing.blink_interval_ms;
        let Some(blink) = self.blink.as_mut() else { return };
        blink.on = !blink.on;
        blink.elapsed_ms += interval;
        let gen = self.generation;
        if blink.elapsed_ms < self.timing.celebration_ms {
            self.defer(interval, Deferred::BlinkToggle(gen));
            return;
        }

        self.blink = None;
        let (headline, flawless) = match self.cleared.take() {
            Some(c) => (c.headline, c.flawless),
            None => ("Level cleared!", false),
        };
        self.overlay = Some(Overlay {
            lines: [
                headline.to_string(),
                format!("Level {} Passed!", self.level),
                format!("Prepare for Level {}!", self.level + 1),
            ],
            flawless,
        });
        self.phase = Phase::LevelTransitionOverlay;
        self.defer(self.timing.overlay_ms, Deferred::OverlayDismiss(gen));
    }

    fn start_level(&mut self, level: u32, events: &mut Vec<GameEvent>) {
        self.supersede();
        self.level = level;
        self.cols = cols_for_level(level);
        self.path = self.paths.next_path(self.cols);
        self.visited.clear();
        self.cursor = Coord::new(bottom_row(), 0);
        self.mistakes_in_level = 0;
        self.start_row_safe_col = None;
        self.wrong_flash = None;
        self.blink = None;
        self.cleared = None;
        self.overlay = None;
        self.status.clear();
        self.start_timer();
        self.phase = Phase::Playing;
        log::info!("level {} started ({} cols)", level, self.cols);
        events.push(GameEvent::LevelStarted { level, cols: self.cols });
    }
}

#[cfg(test)]
impl GameEngine {
    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn cursor(&self) -> Coord {
        self.cursor
    }

    pub fn path(&self) -> &SafePath {
        &self.path
    }

    pub fn visited(&self) -> &VisitedSet {
        &self.visited
    }

    pub fn mistakes_in_level(&self) -> u32 {
        self.mistakes_in_level
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.timer.remaining()
    }

    pub fn start_row_safe_col(&self) -> Option<usize> {
        self.start_row_safe_col
    }
}
